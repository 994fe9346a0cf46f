use grid::BitGrid;
use unit::map::CellIndices;

use crate::cost::{update_bits, PathFinderDataSource, SourceContext};
use crate::map::{Map, ThingKind};

/// Cells covered by something persistently dangerous, like fire
#[derive(Debug, PartialEq)]
pub struct PersistentDangerSource {
    bits: BitGrid,
}

/// Cells too dark to be safe
#[derive(Debug, PartialEq)]
pub struct DarknessDangerSource {
    bits: BitGrid,
}

impl PersistentDangerSource {
    pub fn new(indices: &CellIndices) -> Self {
        Self {
            bits: BitGrid::new(indices.dims()),
        }
    }

    pub fn bits(&self) -> &BitGrid {
        &self.bits
    }

    fn is_dangerous(map: &Map, idx: usize) -> bool {
        map.things()
            .at(idx)
            .any(|t| t.kind == ThingKind::PersistentDanger)
    }
}

impl PathFinderDataSource for PersistentDangerSource {
    fn name(&self) -> &'static str {
        "persistent danger"
    }

    fn compute_all(&mut self, ctx: &SourceContext) {
        let n = self.bits.len();
        update_bits(&mut self.bits, 0..n, |idx| Self::is_dangerous(ctx.map, idx));
    }

    fn update_incrementally(&mut self, ctx: &SourceContext, changed: &[usize]) -> bool {
        update_bits(&mut self.bits, changed.iter().copied(), |idx| {
            Self::is_dangerous(ctx.map, idx)
        })
    }
}

impl DarknessDangerSource {
    pub fn new(indices: &CellIndices) -> Self {
        Self {
            bits: BitGrid::new(indices.dims()),
        }
    }

    pub fn bits(&self) -> &BitGrid {
        &self.bits
    }
}

impl PathFinderDataSource for DarknessDangerSource {
    fn name(&self) -> &'static str {
        "darkness danger"
    }

    fn compute_all(&mut self, ctx: &SourceContext) {
        let n = self.bits.len();
        let threshold = ctx.settings.darkness_threshold;
        update_bits(&mut self.bits, 0..n, |idx| ctx.map.glow(idx) < threshold);
    }

    fn update_incrementally(&mut self, ctx: &SourceContext, changed: &[usize]) -> bool {
        let threshold = ctx.settings.darkness_threshold;
        update_bits(&mut self.bits, changed.iter().copied(), |idx| {
            ctx.map.glow(idx) < threshold
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cost::tests::check_incremental;
    use crate::helpers::MapBuilder;
    use unit::map::{Cell, CellRect};

    #[test]
    fn fire_spreads() {
        let mut map = MapBuilder::new(8, 8).build();
        check_incremental(
            &mut map,
            &[],
            |map| PersistentDangerSource::new(map.indices()),
            |map| {
                let rect = CellRect::with_size(Cell::new(3, 3), (2, 2));
                map.spawn_thing(ThingKind::PersistentDanger, rect, None);
                let indices = *map.indices();
                rect.cells().map(|c| indices.index_of(c)).collect()
            },
        );
    }

    #[test]
    fn lights_out() {
        let mut map = MapBuilder::new(8, 8).build();
        check_incremental(
            &mut map,
            &[],
            |map| DarknessDangerSource::new(map.indices()),
            |map| {
                map.set_glow(Cell::new(1, 1), 0.1);
                map.set_glow(Cell::new(2, 1), 0.5);
                let indices = *map.indices();
                vec![
                    indices.index_of(Cell::new(1, 1)),
                    indices.index_of(Cell::new(2, 1)),
                ]
            },
        );
    }
}
