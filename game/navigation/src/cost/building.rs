use ahash::AHashMap;
use grid::{BitGrid, CellGrid};
use unit::map::CellIndices;

use crate::cost::{PathFinderDataSource, SourceContext};
use crate::map::Map;
use crate::utility::DoorInfo;

/// Which cells hold walls, who owns them and how hard they are to bash, plus every door
#[derive(Debug, PartialEq)]
pub struct BuildingSource {
    /// Impassable edifices
    buildings: BitGrid,
    player_owned: BitGrid,
    destroyable: BitGrid,
    natural: BitGrid,
    hit_points: CellGrid<u32>,
    doors: AHashMap<usize, DoorInfo>,
}

impl BuildingSource {
    pub fn new(indices: &CellIndices) -> Self {
        let dims = indices.dims();
        Self {
            buildings: BitGrid::new(dims),
            player_owned: BitGrid::new(dims),
            destroyable: BitGrid::new(dims),
            natural: BitGrid::new(dims),
            hit_points: CellGrid::new(dims),
            doors: AHashMap::new(),
        }
    }

    pub fn buildings(&self) -> &BitGrid {
        &self.buildings
    }

    pub fn is_building(&self, idx: usize) -> bool {
        self.buildings.get(idx)
    }

    pub fn is_player_owned(&self, idx: usize) -> bool {
        self.player_owned.get(idx)
    }

    pub fn is_destroyable(&self, idx: usize) -> bool {
        self.destroyable.get(idx)
    }

    pub fn is_natural(&self, idx: usize) -> bool {
        self.natural.get(idx)
    }

    pub fn hit_points(&self, idx: usize) -> u32 {
        self.hit_points[idx]
    }

    pub fn door(&self, idx: usize) -> Option<&DoorInfo> {
        self.doors.get(&idx)
    }

    fn update_cell(&mut self, map: &Map, idx: usize) -> bool {
        let edifice = map.edifice(idx);
        let player_owned = edifice
            .and_then(|e| e.faction)
            .map_or(false, |f| map.factions().is_player(f));
        let destroyable = edifice.map_or(false, |e| e.is_destroyable());
        let hit_points = edifice.map_or(0, |e| e.hit_points);

        let mut changed = false;
        changed |= self
            .buildings
            .set(idx, edifice.map_or(false, |e| e.is_impassable()));
        changed |= self.player_owned.set(idx, player_owned);
        changed |= self.destroyable.set(idx, destroyable);
        changed |= self
            .natural
            .set(idx, edifice.map_or(false, |e| e.is_natural()));

        if self.hit_points[idx] != hit_points {
            self.hit_points[idx] = hit_points;
            changed = true;
        }

        let door = edifice.and_then(|e| {
            e.door_state().map(|door| DoorInfo {
                open: door.open,
                ticks_to_open: door.ticks_to_open,
                faction: e.faction,
                hit_points,
                destroyable,
                player_owned,
            })
        });

        let prev = match door {
            Some(door) => self.doors.insert(idx, door),
            None => self.doors.remove(&idx),
        };
        changed |= prev != door;

        changed
    }
}

impl PathFinderDataSource for BuildingSource {
    fn name(&self) -> &'static str {
        "building"
    }

    fn compute_all(&mut self, ctx: &SourceContext) {
        self.doors.clear();
        for idx in 0..self.hit_points.len() {
            self.update_cell(ctx.map, idx);
        }
    }

    fn update_incrementally(&mut self, ctx: &SourceContext, changed: &[usize]) -> bool {
        let mut any = false;
        for &idx in changed {
            any |= self.update_cell(ctx.map, idx);
        }
        any
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cost::tests::check_incremental;
    use crate::helpers::MapBuilder;
    use crate::map::{Edifice, FactionId};
    use unit::map::{Cell, CellRect};

    #[test]
    fn walls_and_doors() {
        let player = FactionId(1);
        let mut map = MapBuilder::new(8, 8)
            .player_faction(player)
            .building(
                CellRect::single(Cell::new(1, 1)),
                Edifice::wall(300).owned_by(player),
            )
            .building(CellRect::single(Cell::new(2, 1)), Edifice::door(150, 40))
            .build();

        check_incremental(
            &mut map,
            &[],
            |map| BuildingSource::new(map.indices()),
            |map| {
                map.set_hit_points(Cell::new(1, 1), 120);
                map.set_door_open(Cell::new(2, 1), true);
                map.spawn_building(
                    CellRect::single(Cell::new(5, 5)),
                    Edifice::natural_wall(1000),
                );
                let indices = *map.indices();
                [(1, 1), (2, 1), (5, 5)]
                    .iter()
                    .map(|&c| indices.index_of(Cell::from(c)))
                    .collect()
            },
        );

        let settings = Default::default();
        let mut source = BuildingSource::new(map.indices());
        source.compute_all(&SourceContext {
            map: &map,
            requests: &[],
            settings: &settings,
        });

        let idx = |x, z| map.indices().index_of(Cell::new(x, z));
        assert!(source.is_building(idx(1, 1)));
        assert!(source.is_player_owned(idx(1, 1)));
        assert_eq!(source.hit_points(idx(1, 1)), 120);
        assert!(source.is_natural(idx(5, 5)));
        assert!(!source.is_building(idx(2, 1)));
        let door = source.door(idx(2, 1)).expect("door");
        assert!(door.open);
        assert!(door.destroyable);
    }

    #[test]
    fn despawned_door_is_forgotten() {
        let mut map = MapBuilder::new(4, 4)
            .building(CellRect::single(Cell::new(2, 2)), Edifice::door(100, 30))
            .build();

        check_incremental(
            &mut map,
            &[],
            |map| BuildingSource::new(map.indices()),
            |map| {
                map.despawn_building(CellRect::single(Cell::new(2, 2)));
                vec![map.indices().index_of(Cell::new(2, 2))]
            },
        );
    }
}
