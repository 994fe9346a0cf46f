use grid::CellGrid;
use unit::map::CellIndices;

use crate::cost::{PathFinderDataSource, SourceContext};
use crate::map::Map;
use crate::IMPASSABLE;

/// Direct cost of entering each cell, from terrain and edifices
#[derive(Debug, PartialEq)]
pub struct PathCostSource {
    normal: CellGrid<u32>,
    /// Fences are walls
    fence_blocked: CellGrid<u32>,
    /// Only edifices block
    flying: CellGrid<u32>,
}

impl PathCostSource {
    pub fn new(indices: &CellIndices) -> Self {
        let dims = indices.dims();
        Self {
            normal: CellGrid::new(dims),
            fence_blocked: CellGrid::new(dims),
            flying: CellGrid::new(dims),
        }
    }

    pub fn normal(&self) -> &CellGrid<u32> {
        &self.normal
    }

    pub fn fence_blocked(&self) -> &CellGrid<u32> {
        &self.fence_blocked
    }

    pub fn flying(&self) -> &CellGrid<u32> {
        &self.flying
    }

    fn costs_of(map: &Map, idx: usize) -> [u32; 3] {
        let terrain = map.terrain(idx);
        let edifice = map.edifice(idx);
        let wall = edifice.map_or(false, |e| e.is_impassable());

        let normal = if terrain.impassable || wall {
            IMPASSABLE
        } else {
            (terrain.path_cost + edifice.map_or(0, |e| e.path_cost)).min(IMPASSABLE - 1)
        };

        let fence_blocked = if edifice.map_or(false, |e| e.is_fence()) {
            IMPASSABLE
        } else {
            normal
        };

        let flying = if wall { IMPASSABLE } else { 0 };

        [normal, fence_blocked, flying]
    }

    fn update_cell(&mut self, map: &Map, idx: usize) -> bool {
        let [normal, fence_blocked, flying] = Self::costs_of(map, idx);
        let changed = self.normal[idx] != normal
            || self.fence_blocked[idx] != fence_blocked
            || self.flying[idx] != flying;

        self.normal[idx] = normal;
        self.fence_blocked[idx] = fence_blocked;
        self.flying[idx] = flying;
        changed
    }
}

impl PathFinderDataSource for PathCostSource {
    fn name(&self) -> &'static str {
        "path cost"
    }

    fn compute_all(&mut self, ctx: &SourceContext) {
        for idx in 0..self.normal.len() {
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
