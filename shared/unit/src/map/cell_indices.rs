use grid::GridDims;

use crate::map::{Cell, CellRect};

/// Bijection between a cell and its index into flat per-cell arrays
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
pub struct CellIndices {
    width: i32,
    height: i32,
}

impl CellIndices {
    /// Panics if either dimension is 0
    pub fn new(width: u16, height: u16) -> Self {
        assert!(width > 0 && height > 0, "map must have at least one cell");
        Self {
            width: width as i32,
            height: height as i32,
        }
    }

    #[inline]
    pub fn cell_to_index(&self, x: i32, z: i32) -> usize {
        debug_assert!(self.contains(Cell::new(x, z)), "({}, {}) out of bounds", x, z);
        (z * self.width + x) as usize
    }

    #[inline]
    pub fn index_of(&self, cell: Cell) -> usize {
        self.cell_to_index(cell.x, cell.z)
    }

    /// None if out of bounds
    #[inline]
    pub fn try_index_of(&self, cell: Cell) -> Option<usize> {
        self.contains(cell).then(|| self.index_of(cell))
    }

    #[inline]
    pub fn index_to_cell(&self, index: usize) -> Cell {
        let index = index as i32;
        Cell::new(index % self.width, index / self.width)
    }

    #[inline]
    pub fn num_grid_cells(&self) -> usize {
        (self.width * self.height) as usize
    }

    #[inline]
    pub fn contains(&self, cell: Cell) -> bool {
        cell.x >= 0 && cell.z >= 0 && cell.x < self.width && cell.z < self.height
    }

    pub fn width(&self) -> i32 {
        self.width
    }

    pub fn height(&self) -> i32 {
        self.height
    }

    pub fn dims(&self) -> GridDims {
        [self.width as usize, self.height as usize]
    }

    pub fn bounds(&self) -> CellRect {
        CellRect::new(Cell::new(0, 0), Cell::new(self.width - 1, self.height - 1))
    }

    pub fn is_on_edge(&self, cell: Cell) -> bool {
        cell.x == 0 || cell.z == 0 || cell.x == self.width - 1 || cell.z == self.height - 1
    }
}
