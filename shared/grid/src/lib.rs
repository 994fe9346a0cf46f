//! Flat per-cell storage for 2D maps. Everything is indexed by `z * width + x`
pub use bit_grid::BitGrid;
pub use cell_grid::CellGrid;

mod bit_grid;
mod cell_grid;

/// Width and height of a grid in cells
pub type GridDims = [usize; 2];
