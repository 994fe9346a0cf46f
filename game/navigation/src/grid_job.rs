use grid::{BitGrid, CellGrid};
use unit::map::CellIndices;

use crate::cost::{BuildingSource, PathFinderDataSource};
use crate::map::Factions;
use crate::request::{CustomCostProvider, PathFinderCostTuning};
use crate::settings::PathingSettings;
use crate::traverse::{Danger, TraverseParms};
use crate::utility::{can_destroy, door_cost, wall_bash_cost};
use crate::IMPASSABLE;

/// Everything a grid job reads, already narrowed down to one request
pub struct GridJobParams<'a> {
    pub indices: CellIndices,
    pub settings: &'a PathingSettings,
    pub parms: TraverseParms,
    pub tuning: PathFinderCostTuning,
    pub factions: &'a Factions,

    /// Normal, fence-blocked or flying
    pub direct: &'a CellGrid<u32>,
    /// Drafted or undrafted
    pub perceptual: &'a CellGrid<u32>,
    pub water: &'a BitGrid,
    pub fences: &'a BitGrid,
    pub buildings: &'a BuildingSource,
    pub fog: &'a BitGrid,
    pub persistent_danger: &'a BitGrid,
    pub darkness: &'a BitGrid,

    pub faction_costs: Option<&'a CellGrid<u32>>,
    pub allowed_area: Option<&'a BitGrid>,
    pub avoid_grid: Option<&'a CellGrid<u8>>,
    pub lord_walk_grid: Option<&'a BitGrid>,
    pub custom: Option<&'a dyn CustomCostProvider>,
    pub extra_sources: &'a [Box<dyn PathFinderDataSource>],
}

/// Folds every cost source into a single cost per cell for one set of traverse parms
pub struct PathGridJob<'a> {
    params: GridJobParams<'a>,
}

impl<'a> PathGridJob<'a> {
    pub fn new(params: GridJobParams<'a>) -> Self {
        Self { params }
    }

    /// Splits the grid into disjoint chunks computed on scoped threads
    pub fn run(&self, threads: usize) -> CellGrid<u32> {
        let dims = self.params.indices.dims();
        let n = self.params.indices.num_grid_cells();
        let mut out = CellGrid::filled(dims, IMPASSABLE);

        let threads = threads.max(1);
        let chunk_size = self
            .params
            .settings
            .grid_chunk_size
            .max((n + threads - 1) / threads)
            .max(1);

        if threads == 1 || n <= chunk_size {
            for (idx, cost) in out.iter_mut().enumerate() {
                *cost = self.cost_at(idx);
            }
            return out;
        }

        let result = crossbeam::scope(|scope| {
            for (i, chunk) in out.chunks_mut(chunk_size).enumerate() {
                scope.spawn(move |_| {
                    let base = i * chunk_size;
                    for (j, cost) in chunk.iter_mut().enumerate() {
                        *cost = self.cost_at(base + j);
                    }
                });
            }
        });

        if let Err(panic) = result {
            std::panic::resume_unwind(panic);
        }

        out
    }

    /// [IMPASSABLE] if the cell can't be entered
    pub fn cost_at(&self, idx: usize) -> u32 {
        let p = &self.params;
        let parms = &p.parms;
        let settings = p.settings;
        let buildings = p.buildings;
        let water = p.water.get(idx);

        let mut cost = 0u32;
        let mut bashing = false;

        // passability
        if buildings.is_building(idx) {
            if !can_destroy(
                parms.mode,
                buildings.is_destroyable(idx),
                buildings.is_player_owned(idx),
            ) {
                return IMPASSABLE;
            }

            cost += wall_bash_cost(
                buildings.hit_points(idx),
                buildings.is_natural(idx),
                &p.tuning,
            );
            bashing = true;
        } else if let Some(door) = buildings.door(idx) {
            match door_cost(door, parms, p.factions, &p.tuning) {
                Some(door_cost) => cost += door_cost,
                None => return IMPASSABLE,
            }
        }

        if water && !parms.mode.can_pass_water() {
            return IMPASSABLE;
        }

        if parms.fence_blocked && p.fences.get(idx) {
            let can_bash = parms.can_bash_fences
                || can_destroy(
                    parms.mode,
                    buildings.is_destroyable(idx),
                    buildings.is_player_owned(idx),
                );
            if !can_bash || !buildings.is_destroyable(idx) {
                return IMPASSABLE;
            }

            cost += settings.fence_bash_cost;
            bashing = true;
        }

        // cost folding
        let water_override = p.tuning.water_cost_override.filter(|_| water);
        let direct = water_override.unwrap_or(p.direct[idx]);
        if direct >= IMPASSABLE {
            // bashed through instead
            if !bashing {
                return IMPASSABLE;
            }
        } else {
            cost += direct;
        }

        if water_override.is_none() {
            cost += p.perceptual[idx];
        }

        if let Some(avoid) = p.avoid_grid {
            cost += avoid[idx] as u32 * settings.avoid_grid_multiplier;
        }

        if let Some(area) = p.allowed_area {
            if !area.get(idx) {
                cost += settings.area_penalty;
            }
        }

        if let Some(faction_costs) = p.faction_costs {
            let own_target = parms
                .target_buildable
                .map_or(false, |rect| rect.contains(p.indices.index_to_cell(idx)));
            if !own_target {
                cost += faction_costs[idx];
            }
        }

        // charged once, whether avoided explicitly or just too dangerous
        let persistent = p.persistent_danger.get(idx);
        let dark = p.darkness.get(idx);
        let danger = if persistent {
            Danger::Deadly
        } else if dark {
            Danger::Some
        } else {
            Danger::None
        };
        let avoided = (parms.avoid_persistent_danger && persistent)
            || (parms.avoid_darkness_danger && dark);
        if avoided || danger > parms.max_danger {
            cost += settings.danger_penalty;
        }

        if let Some(walk_grid) = p.lord_walk_grid {
            if !walk_grid.get(idx) {
                cost += p.tuning.cost_off_lord_walk_grid;
            }
        }

        if parms.avoid_fog && p.fog.get(idx) {
            cost += settings.fog_penalty;
        }

        for source in p.extra_sources {
            cost = cost.saturating_add(source.cell_cost(idx));
        }

        if let Some(custom) = p.custom {
            let offset = custom.cost_offset(p.indices.index_to_cell(idx));
            cost = (cost as i64 + offset as i64).max(0) as u32;
        }

        cost.min(IMPASSABLE - 1)
    }
}
