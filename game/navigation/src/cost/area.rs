use ahash::AHashMap;
use grid::{BitGrid, GridDims};
use unit::map::CellIndices;

use crate::cost::{PathFinderDataSource, SourceContext};
use crate::map::{AreaId, Map};

/// Snapshot of every area a pending request is restricted to
#[derive(Debug, PartialEq)]
pub struct AreaSource {
    dims: GridDims,
    areas: AHashMap<AreaId, BitGrid>,
}

impl AreaSource {
    pub fn new(indices: &CellIndices) -> Self {
        Self {
            dims: indices.dims(),
            areas: AHashMap::new(),
        }
    }

    /// Cells the area allows, None if no request asked for it
    pub fn allowed(&self, area: AreaId) -> Option<&BitGrid> {
        self.areas.get(&area)
    }

    fn snapshot(&self, map: &Map, area: AreaId) -> BitGrid {
        map.area(area)
            .cloned()
            .unwrap_or_else(|| BitGrid::new(self.dims))
    }
}

impl PathFinderDataSource for AreaSource {
    fn name(&self) -> &'static str {
        "area"
    }

    fn compute_all(&mut self, ctx: &SourceContext) {
        self.areas.clear();
        for area in ctx.requests.iter().filter_map(|r| r.area()) {
            if !self.areas.contains_key(&area) {
                let bits = self.snapshot(ctx.map, area);
                self.areas.insert(area, bits);
            }
        }
    }

    fn update_incrementally(&mut self, ctx: &SourceContext, changed: &[usize]) -> bool {
        let mut any = false;
        for (area, bits) in self.areas.iter_mut() {
            any |= match ctx.map.area(*area) {
                Some(current) => bits.copy_cells_from(current, changed),
                None if bits.count_ones() > 0 => {
                    bits.clear();
                    true
                }
                None => false,
            };
        }

        // newly requested areas
        for area in ctx.requests.iter().filter_map(|r| r.area()) {
            if !self.areas.contains_key(&area) {
                let bits = self.snapshot(ctx.map, area);
                self.areas.insert(area, bits);
                any = true;
            }
        }

        any
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cost::tests::check_incremental;
    use crate::helpers::MapBuilder;
    use crate::request::PathRequest;
    use unit::map::Cell;

    #[test]
    fn incremental_matches_full() {
        let mut map = MapBuilder::new(8, 8)
            .area(AreaId(3), Cell::new(1, 1))
            .area(AreaId(3), Cell::new(1, 2))
            .build();

        let requests = vec![
            PathRequest::builder(map.id(), Cell::new(0, 0), Cell::new(4, 4))
                .area(AreaId(3))
                .build(),
        ];

        check_incremental(
            &mut map,
            &requests,
            |map| AreaSource::new(map.indices()),
            |map| {
                map.set_area_cell(AreaId(3), Cell::new(1, 1), false);
                map.set_area_cell(AreaId(3), Cell::new(5, 5), true);
                let indices = *map.indices();
                vec![
                    indices.index_of(Cell::new(1, 1)),
                    indices.index_of(Cell::new(5, 5)),
                ]
            },
        );
    }

    #[test]
    fn only_requested_areas_are_kept() {
        let map = MapBuilder::new(8, 8)
            .area(AreaId(1), Cell::new(1, 1))
            .area(AreaId(2), Cell::new(1, 1))
            .build();
        let requests = vec![
            PathRequest::builder(map.id(), Cell::new(0, 0), Cell::new(4, 4))
                .area(AreaId(2))
                .build(),
        ];

        let settings = Default::default();
        let mut source = AreaSource::new(map.indices());
        source.compute_all(&SourceContext {
            map: &map,
            requests: &requests,
            settings: &settings,
        });

        assert!(source.allowed(AreaId(1)).is_none());
        let allowed = source.allowed(AreaId(2)).expect("requested");
        assert_eq!(allowed.count_ones(), 1);
    }
}
