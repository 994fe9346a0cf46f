use fixedbitset::FixedBitSet;

use crate::GridDims;

/// One bit per cell
#[derive(Clone, PartialEq, Eq)]
pub struct BitGrid {
    dims: GridDims,
    bits: FixedBitSet,
}

impl BitGrid {
    pub fn new(dims: GridDims) -> Self {
        let len = dims[0] * dims[1];
        assert_ne!(len, 0, "grid must have at least one cell");
        Self {
            dims,
            bits: FixedBitSet::with_capacity(len),
        }
    }

    pub fn dimensions(&self) -> GridDims {
        self.dims
    }

    pub fn len(&self) -> usize {
        self.bits.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bits.len() == 0
    }

    #[inline]
    pub fn get(&self, index: usize) -> bool {
        self.bits.contains(index)
    }

    /// Returns true if the bit changed
    #[inline]
    pub fn set(&mut self, index: usize, value: bool) -> bool {
        let prev = self.bits.put(index);
        if !value {
            self.bits.set(index, false);
        }
        prev != value
    }

    pub fn clear(&mut self) {
        self.bits.clear();
    }

    pub fn count_ones(&self) -> usize {
        self.bits.count_ones(..)
    }

    pub fn ones(&self) -> impl Iterator<Item = usize> + '_ {
        self.bits.ones()
    }

    /// Copies the given cells only from `other`
    pub fn copy_cells_from(&mut self, other: &BitGrid, cells: &[usize]) -> bool {
        debug_assert_eq!(self.dims, other.dims);
        let mut changed = false;
        for &idx in cells {
            changed |= self.set(idx, other.get(idx));
        }
        changed
    }
}

impl std::fmt::Debug for BitGrid {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "BitGrid({}x{}, {} set)",
            self.dims[0],
            self.dims[1],
            self.count_ones()
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn set_reports_change() {
        let mut grid = BitGrid::new([4, 4]);
        assert_eq!(grid.len(), 16);
        assert!(!grid.get(5));

        assert!(grid.set(5, true));
        assert!(!grid.set(5, true));
        assert!(grid.get(5));

        assert!(grid.set(5, false));
        assert!(!grid.set(5, false));
        assert!(!grid.get(5));
    }

    #[test]
    fn ones_and_count() {
        let mut grid = BitGrid::new([3, 3]);
        grid.set(0, true);
        grid.set(8, true);
        assert_eq!(grid.count_ones(), 2);
        assert_eq!(grid.ones().collect::<Vec<_>>(), vec![0, 8]);

        grid.clear();
        assert_eq!(grid.count_ones(), 0);
    }
}
