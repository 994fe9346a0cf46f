use std::fmt::{Display, Formatter};

use misc::slog_value_display;

use crate::map::{Cell, CellIndices};

/// Inclusive rectangle of cells
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
pub struct CellRect {
    min: Cell,
    max: Cell,
}

impl CellRect {
    /// Corners in any order
    pub fn new(a: Cell, b: Cell) -> Self {
        Self {
            min: Cell::new(a.x.min(b.x), a.z.min(b.z)),
            max: Cell::new(a.x.max(b.x), a.z.max(b.z)),
        }
    }

    pub fn single(cell: Cell) -> Self {
        Self {
            min: cell,
            max: cell,
        }
    }

    /// `size` cells wide and tall starting at `min`. Panics on a zero size
    pub fn with_size(min: Cell, (w, h): (u16, u16)) -> Self {
        assert!(w > 0 && h > 0, "rect must have at least one cell");
        Self {
            min,
            max: Cell::new(min.x + w as i32 - 1, min.z + h as i32 - 1),
        }
    }

    pub fn min(&self) -> Cell {
        self.min
    }

    pub fn max(&self) -> Cell {
        self.max
    }

    pub fn width(&self) -> i32 {
        self.max.x - self.min.x + 1
    }

    pub fn height(&self) -> i32 {
        self.max.z - self.min.z + 1
    }

    pub fn area(&self) -> usize {
        (self.width() * self.height()) as usize
    }

    pub fn is_single(&self) -> bool {
        self.min == self.max
    }

    pub fn contains(&self, cell: Cell) -> bool {
        cell.x >= self.min.x && cell.x <= self.max.x && cell.z >= self.min.z && cell.z <= self.max.z
    }

    pub fn overlaps(&self, other: &CellRect) -> bool {
        self.min.x <= other.max.x
            && other.min.x <= self.max.x
            && self.min.z <= other.max.z
            && other.min.z <= self.max.z
    }

    pub fn expanded_by(&self, n: i32) -> Self {
        Self {
            min: self.min + (-n, -n),
            max: self.max + (n, n),
        }
    }

    /// None if entirely out of bounds
    pub fn clipped_to(&self, indices: &CellIndices) -> Option<Self> {
        let bounds = indices.bounds();
        if !self.overlaps(&bounds) {
            return None;
        }

        Some(Self {
            min: Cell::new(self.min.x.max(0), self.min.z.max(0)),
            max: Cell::new(
                self.max.x.min(bounds.max.x),
                self.max.z.min(bounds.max.z),
            ),
        })
    }

    /// Row by row, starting from min
    pub fn cells(&self) -> impl Iterator<Item = Cell> + Clone {
        let (min, max) = (self.min, self.max);
        (min.z..=max.z).flat_map(move |z| (min.x..=max.x).map(move |x| Cell::new(x, z)))
    }

    /// The outer ring of cells
    pub fn edge_cells(&self) -> impl Iterator<Item = Cell> + '_ {
        self.cells().filter(move |c| {
            c.x == self.min.x || c.x == self.max.x || c.z == self.min.z || c.z == self.max.z
        })
    }

    pub fn center(&self) -> Cell {
        Cell::new(
            (self.min.x + self.max.x) / 2,
            (self.min.z + self.max.z) / 2,
        )
    }

    /// Closest cell in this rect to the given cell
    pub fn closest_cell_to(&self, cell: Cell) -> Cell {
        Cell::new(
            cell.x.clamp(self.min.x, self.max.x),
            cell.z.clamp(self.min.z, self.max.z),
        )
    }
}

impl From<Cell> for CellRect {
    fn from(cell: Cell) -> Self {
        Self::single(cell)
    }
}

impl Display for CellRect {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "[{} -> {}]", self.min, self.max)
    }
}

slog_value_display!(CellRect);
