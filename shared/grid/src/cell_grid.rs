use std::iter::repeat_with;
use std::ops::{Deref, DerefMut, Index, IndexMut};

use serde::{Deserialize, Serialize};

use misc::{ArrayVec, Itertools};

use crate::GridDims;

#[derive(Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct CellGrid<T> {
    dims: GridDims,
    /// Never resized after creation
    data: Box<[T]>,
}

impl<T: Default> CellGrid<T> {
    pub fn new(dims: GridDims) -> Self {
        Self::filled_with(dims, T::default)
    }
}

impl<T: Clone> CellGrid<T> {
    pub fn filled(dims: GridDims, value: T) -> Self {
        Self::filled_with(dims, || value.clone())
    }

    /// Resets every cell without reallocating
    pub fn fill(&mut self, value: T) {
        self.data.iter_mut().for_each(|v| *v = value.clone());
    }
}

impl<T> CellGrid<T> {
    pub fn filled_with(dims: GridDims, f: impl FnMut() -> T) -> Self {
        let len = dims[0] * dims[1];
        assert_ne!(len, 0, "grid must have at least one cell");

        let data = repeat_with(f).take(len).collect();
        CellGrid { dims, data }
    }

    pub fn from_vec(dims: GridDims, data: Vec<T>) -> Option<Self> {
        if data.len() != dims[0] * dims[1] || data.is_empty() {
            return None;
        }

        Some(CellGrid {
            dims,
            data: data.into_boxed_slice(),
        })
    }

    #[inline]
    pub fn flatten_coords(&self, [x, z]: [usize; 2]) -> usize {
        x + self.dims[0] * z
    }

    #[inline]
    pub fn unflatten_index(&self, index: usize) -> [usize; 2] {
        let w = self.dims[0];
        [index % w, index / w]
    }

    #[inline]
    pub fn is_coord_in_range(&self, [x, z]: [usize; 2]) -> bool {
        x < self.dims[0] && z < self.dims[1]
    }

    #[inline]
    pub fn is_in_range(&self, idx: usize) -> bool {
        idx < self.data.len()
    }

    pub fn dimensions(&self) -> GridDims {
        self.dims
    }

    pub fn iter_coords(&self) -> impl Iterator<Item = ([usize; 2], &T)> + '_ {
        (0..self.dims[1])
            .cartesian_product(0..self.dims[0])
            .map(|(z, x)| [x, z])
            .zip(self.data.iter())
    }

    /// Filters out out-of-bounds neighbours. Cardinals first (N, E, S, W) then diagonals
    /// (NE, SE, SW, NW)
    pub fn neighbours(&self, index: usize) -> impl Iterator<Item = usize> + '_ {
        self.neighbours_inner(index, true)
    }

    /// Only the 4 orthogonal neighbours, filtering out out-of-bounds
    pub fn cardinal_neighbours(&self, index: usize) -> impl Iterator<Item = usize> + '_ {
        self.neighbours_inner(index, false)
    }

    fn neighbours_inner(&self, index: usize, diagonals: bool) -> impl Iterator<Item = usize> + '_ {
        // profiling shows it's better to pass around an idx and unflatten than it is to pass
        // around coords
        let [x, z] = self.unflatten_index(index);

        let x0 = Some(x);
        let xp1 = Some(x + 1);
        let xs1 = x.checked_sub(1);

        let z0 = Some(z);
        let zp1 = Some(z + 1);
        let zs1 = z.checked_sub(1);

        let mut candidates = ArrayVec::<_, 8>::from_iter([
            x0.zip(zp1),
            xp1.zip(z0),
            x0.zip(zs1),
            xs1.zip(z0),
        ]);

        if diagonals {
            candidates.extend([xp1.zip(zp1), xp1.zip(zs1), xs1.zip(zs1), xs1.zip(zp1)]);
        }

        candidates
            .into_iter()
            .flatten()
            .filter_map(move |(x, z)| {
                let coord = [x, z];
                if self.is_coord_in_range(coord) {
                    Some(self.flatten_coords(coord))
                } else {
                    None
                }
            })
    }
}

impl<T> Index<usize> for CellGrid<T> {
    type Output = T;

    fn index(&self, index: usize) -> &Self::Output {
        &self.data[index]
    }
}

impl<T> IndexMut<usize> for CellGrid<T> {
    fn index_mut(&mut self, index: usize) -> &mut Self::Output {
        &mut self.data[index]
    }
}

impl<T> Index<[usize; 2]> for CellGrid<T> {
    type Output = T;

    fn index(&self, coords: [usize; 2]) -> &Self::Output {
        self.index(self.flatten_coords(coords))
    }
}

impl<T> IndexMut<[usize; 2]> for CellGrid<T> {
    fn index_mut(&mut self, coords: [usize; 2]) -> &mut Self::Output {
        let idx = self.flatten_coords(coords);
        self.index_mut(idx)
    }
}

impl<T> AsRef<[T]> for CellGrid<T> {
    fn as_ref(&self) -> &[T] {
        &self.data
    }
}

impl<T> Deref for CellGrid<T> {
    type Target = [T];

    fn deref(&self) -> &Self::Target {
        &self.data
    }
}

impl<T> DerefMut for CellGrid<T> {
    fn deref_mut(&mut self) -> &mut Self::Target {
        &mut self.data
    }
}

impl<T> std::fmt::Debug for CellGrid<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "CellGrid({}x{})", self.dims[0], self.dims[1])
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn flatten_round_trip() {
        let grid = CellGrid::<u8>::new([5, 4]);
        assert_eq!(grid.len(), 20);
        assert_eq!(grid.flatten_coords([0, 0]), 0);
        assert_eq!(grid.flatten_coords([1, 0]), 1);
        assert_eq!(grid.flatten_coords([0, 1]), 5);

        for i in 0..grid.len() {
            assert_eq!(grid.flatten_coords(grid.unflatten_index(i)), i);
        }
    }

    #[test]
    fn iter_coords_matches_flat_order() {
        let grid = CellGrid::<()>::new([5, 4]);

        let dumb_expected = grid
            .data
            .iter()
            .enumerate()
            .map(|(i, val)| (grid.unflatten_index(i), val))
            .collect::<Vec<_>>();

        let actual = grid.iter_coords().collect::<Vec<_>>();
        assert_eq!(dumb_expected, actual);
    }

    #[test]
    fn neighbours_in_corner() {
        let grid = CellGrid::<()>::new([3, 3]);

        let mut corner = grid.neighbours(0).collect_vec();
        corner.sort_unstable();
        assert_eq!(corner, vec![1, 3, 4]);

        let mut middle = grid.neighbours(4).collect_vec();
        middle.sort_unstable();
        assert_eq!(middle, vec![0, 1, 2, 3, 5, 6, 7, 8]);

        let mut cardinal = grid.cardinal_neighbours(4).collect_vec();
        cardinal.sort_unstable();
        assert_eq!(cardinal, vec![1, 3, 5, 7]);
    }

    #[test]
    fn from_vec_checks_length() {
        assert!(CellGrid::from_vec([2, 2], vec![1, 2, 3]).is_none());
        let grid = CellGrid::from_vec([2, 2], vec![1, 2, 3, 4]).unwrap();
        assert_eq!(grid[[1, 1]], 4);
    }

    #[test]
    #[should_panic]
    fn empty_grid() {
        let _ = CellGrid::<u8>::new([0, 4]);
    }
}
