pub use cell::Cell;
pub use cell_indices::CellIndices;
pub use cell_rect::CellRect;
pub use direction::{Direction, Directions};

mod cell;
mod cell_indices;
mod cell_rect;
mod direction;
