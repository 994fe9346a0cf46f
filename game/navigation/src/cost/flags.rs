use grid::BitGrid;
use unit::map::CellIndices;

use crate::cost::{update_bits, PathFinderDataSource, SourceContext};
use crate::map::Map;

macro_rules! flag_source {
    ($(#[$meta:meta])* $name:ident, $label:literal, |$map:ident, $idx:ident| $pred:expr) => {
        $(#[$meta])*
        #[derive(Debug, PartialEq)]
        pub struct $name {
            bits: BitGrid,
        }

        impl $name {
            pub fn new(indices: &CellIndices) -> Self {
                Self {
                    bits: BitGrid::new(indices.dims()),
                }
            }

            pub fn bits(&self) -> &BitGrid {
                &self.bits
            }

            fn flag($map: &Map, $idx: usize) -> bool {
                $pred
            }
        }

        impl PathFinderDataSource for $name {
            fn name(&self) -> &'static str {
                $label
            }

            fn compute_all(&mut self, ctx: &SourceContext) {
                let n = self.bits.len();
                update_bits(&mut self.bits, 0..n, |idx| Self::flag(ctx.map, idx));
            }

            fn update_incrementally(&mut self, ctx: &SourceContext, changed: &[usize]) -> bool {
                update_bits(&mut self.bits, changed.iter().copied(), |idx| {
                    Self::flag(ctx.map, idx)
                })
            }
        }
    };
}

flag_source!(
    /// Cells with any water
    WaterSource,
    "water",
    |map, idx| map.terrain(idx).water
);

flag_source!(
    /// Cells with a fence
    FenceSource,
    "fence",
    |map, idx| map.edifice(idx).map_or(false, |e| e.is_fence())
);

flag_source!(
    /// Cells under fog of war
    FogSource,
    "fog",
    |map, idx| map.is_fogged(idx)
);

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cost::tests::check_incremental;
    use crate::helpers::MapBuilder;
    use crate::map::{Edifice, Terrain};
    use unit::map::{Cell, CellRect};

    fn cells(map: &Map, cells: &[(i32, i32)]) -> Vec<usize> {
        cells
            .iter()
            .map(|&c| map.indices().index_of(Cell::from(c)))
            .collect()
    }

    #[test]
    fn water() {
        let mut map = MapBuilder::new(6, 6)
            .terrain(Cell::new(1, 1), Terrain::shallow_water())
            .build();
        check_incremental(
            &mut map,
            &[],
            |map| WaterSource::new(map.indices()),
            |map| {
                map.set_terrain(Cell::new(1, 1), Terrain::soil());
                map.set_terrain(Cell::new(4, 4), Terrain::deep_water());
                cells(map, &[(1, 1), (4, 4)])
            },
        );
    }

    #[test]
    fn fence() {
        let mut map = MapBuilder::new(6, 6).build();
        check_incremental(
            &mut map,
            &[],
            |map| FenceSource::new(map.indices()),
            |map| {
                map.spawn_building(
                    CellRect::with_size(Cell::new(0, 2), (3, 1)),
                    Edifice::fence(80),
                );
                cells(map, &[(0, 2), (1, 2), (2, 2)])
            },
        );
    }

    #[test]
    fn fog() {
        let mut map = MapBuilder::new(6, 6).build();
        check_incremental(
            &mut map,
            &[],
            |map| FogSource::new(map.indices()),
            |map| {
                map.set_fogged(Cell::new(5, 0), true);
                cells(map, &[(5, 0)])
            },
        );
    }
}
