use petgraph::unionfind::UnionFind;

use ahash::AHashMap;
use misc::*;

use crate::map::Map;
use crate::region::{RegionGrid, RegionId, RegionKind};

/// Connected regions of the same kind. Every door is a district of its own
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct DistrictId(u32);

/// Districts joined through fences
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct RoomId(u32);

slog_value_debug!(DistrictId);
slog_value_debug!(RoomId);

impl DistrictId {
    pub(crate) fn index(self) -> usize {
        self.0 as usize
    }
}

impl RoomId {
    pub(crate) fn index(self) -> usize {
        self.0 as usize
    }
}

/// Resumable count of the unroofed cells in a district
#[derive(Debug, Default, Clone)]
struct OpenRoofCursor {
    region: usize,
    cell: usize,
    count: u32,
    complete: bool,
}

#[derive(Debug, Clone)]
pub struct District {
    id: DistrictId,
    kind: RegionKind,
    regions: Vec<RegionId>,
    cell_count: usize,
    touches_map_edge: bool,
    room: RoomId,
    roof: OpenRoofCursor,
}

#[derive(Debug, Clone)]
pub struct Room {
    id: RoomId,
    districts: Vec<DistrictId>,
    cell_count: usize,
    touches_map_edge: bool,
}

impl District {
    pub fn id(&self) -> DistrictId {
        self.id
    }

    pub fn kind(&self) -> RegionKind {
        self.kind
    }

    pub fn regions(&self) -> &[RegionId] {
        &self.regions
    }

    pub fn cell_count(&self) -> usize {
        self.cell_count
    }

    pub fn touches_map_edge(&self) -> bool {
        self.touches_map_edge
    }

    pub fn room(&self) -> RoomId {
        self.room
    }

    pub(crate) fn invalidate_roof_cache(&mut self) {
        self.roof = OpenRoofCursor::default();
    }
}

impl Room {
    pub fn id(&self) -> RoomId {
        self.id
    }

    pub fn districts(&self) -> &[DistrictId] {
        &self.districts
    }

    pub fn cell_count(&self) -> usize {
        self.cell_count
    }

    /// Outdoors, as far as walls are concerned
    pub fn touches_map_edge(&self) -> bool {
        self.touches_map_edge
    }
}

impl RegionGrid {
    /// Regroups every region. District and room ids are not stable across rebuilds
    pub(crate) fn rebuild_districts(&mut self) {
        let mut ids = self.regions.keys().copied().collect_vec();
        ids.sort_unstable();

        let mut assigned = AHashMap::with_capacity(ids.len());
        let mut districts = Vec::new();
        let mut stack = Vec::new();

        for start in ids {
            if assigned.contains_key(&start) {
                continue;
            }

            let id = DistrictId(districts.len() as u32);
            let kind = self.regions[&start].kind;
            let mut members = vec![start];
            assigned.insert(start, id);

            if kind != RegionKind::Portal {
                stack.clear();
                stack.push(start);
                while let Some(current) = stack.pop() {
                    for n in self.graph.neighbors(current) {
                        if self.regions[&n].kind == kind && !assigned.contains_key(&n) {
                            assigned.insert(n, id);
                            members.push(n);
                            stack.push(n);
                        }
                    }
                }
            }

            members.sort_unstable();
            districts.push(District {
                id,
                kind,
                cell_count: members.iter().map(|r| self.regions[r].cells.len()).sum(),
                touches_map_edge: members.iter().any(|r| self.regions[r].touches_map_edge),
                regions: members,
                room: RoomId(0),
                roof: OpenRoofCursor::default(),
            });
        }

        // rooms: everything but doors merges through shared edges
        let mut union = UnionFind::new(districts.len());
        for (a, b, _) in self.graph.all_edges() {
            let (da, db) = (assigned[&a], assigned[&b]);
            let portal = |d: DistrictId| districts[d.index()].kind == RegionKind::Portal;
            if da != db && !portal(da) && !portal(db) {
                union.union(da.index(), db.index());
            }
        }

        let mut room_of_root = AHashMap::new();
        let mut rooms: Vec<Room> = Vec::new();
        for district in districts.iter_mut() {
            let root = union.find(district.id.index());
            let room_id = *room_of_root.entry(root).or_insert_with(|| {
                let id = RoomId(rooms.len() as u32);
                rooms.push(Room {
                    id,
                    districts: Vec::new(),
                    cell_count: 0,
                    touches_map_edge: false,
                });
                id
            });

            let room = &mut rooms[room_id.index()];
            room.districts.push(district.id);
            room.cell_count += district.cell_count;
            room.touches_map_edge |= district.touches_map_edge;
            district.room = room_id;
        }

        for (region, district) in assigned {
            if let Some(region) = self.regions.get_mut(&region) {
                region.district = Some(district);
            }
        }

        self.districts = districts;
        self.rooms = rooms;
    }

    /// Counts unroofed cells in the district, stopping early once `threshold` is reached.
    /// Progress is kept so the next call resumes where this one stopped, until a roof in the
    /// district changes or the regions are rebuilt
    pub fn open_roof_count_stop_at(
        &mut self,
        map: &Map,
        district: DistrictId,
        threshold: u32,
    ) -> u32 {
        let district = match self.districts.get_mut(district.index()) {
            Some(d) => d,
            None => return 0,
        };

        let cursor = &mut district.roof;
        while !cursor.complete && cursor.count < threshold {
            let region = match district
                .regions
                .get(cursor.region)
                .and_then(|r| self.regions.get(r))
            {
                Some(r) => r,
                None => {
                    cursor.complete = true;
                    break;
                }
            };

            match region.cells.get(cursor.cell) {
                Some(&idx) => {
                    if !map.is_roofed(idx) {
                        cursor.count += 1;
                    }
                    cursor.cell += 1;
                }
                None => {
                    cursor.region += 1;
                    cursor.cell = 0;
                }
            }
        }

        cursor.count
    }

    pub fn open_roof_count(&mut self, map: &Map, district: DistrictId) -> u32 {
        self.open_roof_count_stop_at(map, district, u32::MAX)
    }
}

#[cfg(test)]
mod tests {
    use crate::helpers::MapBuilder;
    use crate::region::RegionGrid;
    use unit::map::{Cell, CellRect};

    #[test]
    fn open_roof_cursor_resumes() {
        // 3 chunks of 4x4, the middle one roofed
        let mut map = MapBuilder::new(12, 4)
            .roof(CellRect::new(Cell::new(4, 0), Cell::new(7, 3)))
            .build();
        let mut grid = RegionGrid::new(&map, 4);
        let district = grid.district_at(Cell::new(0, 0)).expect("district").id();
        assert_eq!(grid.region_count(), 3);

        assert_eq!(grid.open_roof_count_stop_at(&map, district, 5), 5);
        // resumes rather than recounting
        assert_eq!(grid.open_roof_count_stop_at(&map, district, 5), 5);
        assert_eq!(grid.open_roof_count_stop_at(&map, district, 20), 20);
        assert_eq!(grid.open_roof_count(&map, district), 32);

        // stale until told otherwise
        map.set_roofed(Cell::new(0, 0), true);
        assert_eq!(grid.open_roof_count(&map, district), 32);
        grid.roof_changed(Cell::new(0, 0));
        assert_eq!(grid.open_roof_count(&map, district), 31);
    }

    #[test]
    fn rooms_know_if_outdoors() {
        let map = MapBuilder::from_ascii(
            "
            .......
            .#####.
            .#...#.
            .#####.
            .......
            ",
        )
        .build();
        let grid = RegionGrid::new(&map, 12);

        let inside = grid.room_at(Cell::new(3, 2)).expect("room");
        let outside = grid.room_at(Cell::new(0, 0)).expect("room");
        assert!(!inside.touches_map_edge());
        assert_eq!(inside.cell_count(), 3);
        assert!(outside.touches_map_edge());
        assert_ne!(inside.id(), outside.id());
    }
}
