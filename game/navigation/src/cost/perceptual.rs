use grid::CellGrid;
use unit::map::CellIndices;

use crate::cost::{PathFinderDataSource, SourceContext};
use crate::map::Map;
use crate::IMPASSABLE;

/// Cost a pawn believes a cell has beyond its real one. Undrafted pawns also avoid stepping
/// over items
#[derive(Debug, PartialEq)]
pub struct PerceptualSource {
    undrafted: CellGrid<u32>,
    drafted: CellGrid<u32>,
}

impl PerceptualSource {
    pub fn new(indices: &CellIndices) -> Self {
        Self {
            undrafted: CellGrid::new(indices.dims()),
            drafted: CellGrid::new(indices.dims()),
        }
    }

    pub fn costs(&self, drafted: bool) -> &CellGrid<u32> {
        if drafted {
            &self.drafted
        } else {
            &self.undrafted
        }
    }

    fn update_cell(&mut self, map: &Map, idx: usize) -> bool {
        let terrain = map.terrain(idx);
        let items: u32 = map.things().at(idx).map(|t| t.perceived_cost()).sum();
        let undrafted = (terrain.extra_undrafted_cost + items).min(IMPASSABLE - 1);
        let drafted = terrain.extra_drafted_cost.min(IMPASSABLE - 1);

        let changed = self.undrafted[idx] != undrafted || self.drafted[idx] != drafted;
        self.undrafted[idx] = undrafted;
        self.drafted[idx] = drafted;
        changed
    }
}

impl PathFinderDataSource for PerceptualSource {
    fn name(&self) -> &'static str {
        "perceptual"
    }

    fn compute_all(&mut self, ctx: &SourceContext) {
        for idx in 0..self.undrafted.len() {
            self.update_cell(ctx.map, idx);
        }
    }

    fn update_incrementally(&mut self, ctx: &SourceContext, changed: &[usize]) -> bool {
        let mut any = false;
        for &idx in changed {
            any |= self.update_cell(ctx.map, idx);
        }
        any
    }
}
