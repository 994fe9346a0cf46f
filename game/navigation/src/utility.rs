//! Costs of getting through doors and buildings, shared by grid jobs and region checks

use crate::map::{FactionId, Factions};
use crate::request::PathFinderCostTuning;
use crate::traverse::{TraverseMode, TraverseParms};
use crate::IMPASSABLE;

/// What the pathfinder needs to know about a door
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub struct DoorInfo {
    pub open: bool,
    pub ticks_to_open: u32,
    pub faction: Option<FactionId>,
    pub hit_points: u32,
    pub destroyable: bool,
    pub player_owned: bool,
}

/// Unowned doors open for anyone, owned ones for anyone not hostile to the owner
pub fn can_open(door: &DoorInfo, opener: Option<FactionId>, factions: &Factions) -> bool {
    match (door.faction, opener) {
        (None, _) => true,
        (Some(_), None) => false,
        (Some(owner), Some(opener)) => !factions.is_hostile(owner, opener),
    }
}

pub fn can_destroy(mode: TraverseMode, destroyable: bool, player_owned: bool) -> bool {
    mode.can_destroy() && destroyable && (!mode.only_player_owned() || player_owned)
}

/// Extra cost of passing through a door, None if it blocks the traverser
pub fn door_cost(
    door: &DoorInfo,
    parms: &TraverseParms,
    factions: &Factions,
    tuning: &PathFinderCostTuning,
) -> Option<u32> {
    if door.open || parms.mode == TraverseMode::PassDoors {
        return Some(0);
    }

    if parms.mode.blocks_closed_doors() {
        return None;
    }

    if can_open(door, parms.faction, factions) {
        return Some(door.ticks_to_open);
    }

    let bashable = if parms.mode == TraverseMode::ByPawn {
        parms.can_bash_doors && door.destroyable
    } else {
        can_destroy(parms.mode, door.destroyable, door.player_owned)
    };

    bashable.then(|| door_bash_cost(door.hit_points, tuning))
}

pub fn door_bash_cost(hit_points: u32, tuning: &PathFinderCostTuning) -> u32 {
    let cost = tuning.cost_blocked_door as f32
        + hit_points as f32 * tuning.cost_blocked_door_per_hit_point;
    clamp_cost(cost)
}

pub fn wall_bash_cost(hit_points: u32, natural: bool, tuning: &PathFinderCostTuning) -> u32 {
    let mut cost = tuning.cost_blocked_wall_base as f32
        + hit_points as f32 * tuning.cost_blocked_wall_extra_per_hit_point;
    if natural {
        cost += tuning.cost_blocked_wall_extra_for_natural_walls as f32;
    }
    clamp_cost(cost)
}

fn clamp_cost(cost: f32) -> u32 {
    (cost.max(0.0) as u32).min(IMPASSABLE - 1)
}
