use std::fmt::{Display, Formatter};
use std::ops::{Add, Sub};

use misc::slog_value_display;

use crate::map::Direction;

/// A cell on a map. `z` grows northwards
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Default)]
pub struct Cell {
    pub x: i32,
    pub z: i32,
}

impl Cell {
    pub const fn new(x: i32, z: i32) -> Self {
        Self { x, z }
    }

    pub fn neighbour(self, dir: Direction) -> Self {
        let (dx, dz) = dir.offset();
        Self::new(self.x + dx, self.z + dz)
    }

    /// Including diagonals, excluding self
    pub fn is_adjacent_to(self, other: Cell) -> bool {
        self != other && (self.x - other.x).abs() <= 1 && (self.z - other.z).abs() <= 1
    }

    /// Steps needed with 8-way movement
    pub fn chebyshev_distance(self, other: Cell) -> u32 {
        let dx = (self.x - other.x).unsigned_abs();
        let dz = (self.z - other.z).unsigned_abs();
        dx.max(dz)
    }
}

impl From<(i32, i32)> for Cell {
    fn from((x, z): (i32, i32)) -> Self {
        Self::new(x, z)
    }
}

impl From<Cell> for (i32, i32) {
    fn from(c: Cell) -> Self {
        (c.x, c.z)
    }
}

impl Add<(i32, i32)> for Cell {
    type Output = Cell;

    fn add(self, (x, z): (i32, i32)) -> Self::Output {
        Cell::new(self.x + x, self.z + z)
    }
}

impl Sub for Cell {
    type Output = (i32, i32);

    fn sub(self, rhs: Self) -> Self::Output {
        (self.x - rhs.x, self.z - rhs.z)
    }
}

impl Display for Cell {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "({}, {})", self.x, self.z)
    }
}

slog_value_display!(Cell);
