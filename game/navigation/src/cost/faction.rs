use ahash::{AHashMap, AHashSet};
use grid::{CellGrid, GridDims};
use unit::map::CellIndices;

use crate::cost::{PathFinderDataSource, SourceContext};
use crate::map::{FactionId, Map, Thing};

/// Penalty on blueprints and frames a faction's own pawns have claimed, so they walk around
/// construction sites instead of through them
#[derive(Debug, PartialEq)]
pub struct FactionSource {
    dims: GridDims,
    costs: AHashMap<FactionId, CellGrid<u32>>,
}

impl FactionSource {
    pub fn new(indices: &CellIndices) -> Self {
        Self {
            dims: indices.dims(),
            costs: AHashMap::new(),
        }
    }

    pub fn costs(&self, faction: FactionId) -> Option<&CellGrid<u32>> {
        self.costs.get(&faction)
    }

    /// Owned by a faction that isn't hostile to the pather, and claimed by the pather's faction
    fn applies(map: &Map, thing: &Thing, faction: FactionId) -> bool {
        let owner_friendly = thing
            .faction
            .map_or(false, |owner| !map.factions().is_hostile(owner, faction));
        let claimed = map.things().is_reserved_by(thing.id, faction)
            || map.things().has_haul_enroute_by(thing.id, faction);
        thing.is_construction() && owner_friendly && claimed
    }

    fn cost_of(map: &Map, idx: usize, faction: FactionId, penalty: u32) -> u32 {
        if map
            .things()
            .at(idx)
            .any(|thing| Self::applies(map, thing, faction))
        {
            penalty
        } else {
            0
        }
    }

    fn compute_faction(&self, map: &Map, faction: FactionId, penalty: u32) -> CellGrid<u32> {
        let mut costs = CellGrid::new(self.dims);
        for thing in map.things().iter() {
            if Self::applies(map, thing, faction) {
                for cell in thing.rect.cells() {
                    costs[map.indices().index_of(cell)] = penalty;
                }
            }
        }
        costs
    }

    fn requested_factions<'a>(ctx: &SourceContext<'a>) -> impl Iterator<Item = FactionId> + 'a {
        ctx.requests.iter().filter_map(|r| r.parms().faction)
    }
}

impl PathFinderDataSource for FactionSource {
    fn name(&self) -> &'static str {
        "faction"
    }

    fn compute_all(&mut self, ctx: &SourceContext) {
        let penalty = ctx.settings.faction_blueprint_penalty;
        self.costs.clear();
        for faction in Self::requested_factions(ctx) {
            if !self.costs.contains_key(&faction) {
                let costs = self.compute_faction(ctx.map, faction, penalty);
                self.costs.insert(faction, costs);
            }
        }
    }

    fn update_incrementally(&mut self, ctx: &SourceContext, changed: &[usize]) -> bool {
        let map = ctx.map;
        let penalty = ctx.settings.faction_blueprint_penalty;

        // the whole footprint of anything on a changed cell
        let mut cells: AHashSet<usize> = changed.iter().copied().collect();
        for &idx in changed {
            for thing in map.things().at(idx) {
                cells.extend(thing.rect.cells().map(|c| map.indices().index_of(c)));
            }
        }

        let mut any = false;
        for (faction, costs) in self.costs.iter_mut() {
            for &idx in &cells {
                let cost = Self::cost_of(map, idx, *faction, penalty);
                if costs[idx] != cost {
                    costs[idx] = cost;
                    any = true;
                }
            }
        }

        for faction in Self::requested_factions(ctx) {
            if !self.costs.contains_key(&faction) {
                let costs = self.compute_faction(map, faction, penalty);
                self.costs.insert(faction, costs);
                any = true;
            }
        }

        any
    }
}
