use grid::CellGrid;
use unit::map::{CellIndices, Direction, Directions};

use crate::map::Map;

/// Per cell, the directions that lead to an in-bounds neighbour that isn't permanently
/// impassable
pub struct CellConnections {
    indices: CellIndices,
    grid: CellGrid<Directions>,
}

impl CellConnections {
    pub fn new(map: &Map) -> Self {
        let indices = *map.indices();
        let mut conns = Self {
            indices,
            grid: CellGrid::filled(indices.dims(), Directions::empty()),
        };
        conns.recompute_all(map);
        conns
    }

    pub fn indices(&self) -> &CellIndices {
        &self.indices
    }

    #[inline]
    pub fn at(&self, idx: usize) -> Directions {
        self.grid[idx]
    }

    pub fn recompute_all(&mut self, map: &Map) {
        for idx in 0..self.grid.len() {
            self.grid[idx] = self.compute(map, idx);
        }
    }

    /// A changed cell affects the links into it from all its neighbours too
    pub fn update(&mut self, map: &Map, changed: &[usize]) {
        for &idx in changed {
            let cell = self.indices.index_to_cell(idx);
            self.grid[idx] = self.compute(map, idx);
            for dir in Direction::ALL {
                if let Some(n) = self.indices.try_index_of(cell.neighbour(dir)) {
                    self.grid[n] = self.compute(map, n);
                }
            }
        }
    }

    fn compute(&self, map: &Map, idx: usize) -> Directions {
        let cell = self.indices.index_to_cell(idx);
        let mut dirs = Directions::empty();
        for dir in Direction::ALL {
            if let Some(n) = self.indices.try_index_of(cell.neighbour(dir)) {
                if !map.is_permanently_impassable(n) {
                    dirs |= dir;
                }
            }
        }
        dirs
    }
}
