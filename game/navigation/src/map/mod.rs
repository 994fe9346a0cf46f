//! The map that paths are found across, and the events it posts when it changes

use ahash::AHashMap;
use crossbeam::channel::Receiver;
use grid::{BitGrid, CellGrid};
use misc::*;
use unit::map::{Cell, CellIndices, CellRect};

pub use edifice::{DoorState, Edifice, EdificeKind};
pub use events::{MapEvent, MapEvents};
pub use faction::{FactionId, FactionRelation, Factions};
pub use terrain::Terrain;
pub use things::{Thing, ThingId, ThingKind, ThingStore};

mod edifice;
mod events;
mod faction;
mod terrain;
mod things;

#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
pub struct MapId(pub u32);

/// Player-drawn zone that pawns can be restricted to
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct AreaId(pub u32);

/// Group of pawns acting under a shared plan
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
pub struct LordId(pub u32);

slog_value_debug!(MapId);
slog_value_debug!(AreaId);

pub struct Map {
    id: MapId,
    indices: CellIndices,
    terrain: CellGrid<Terrain>,
    edifices: CellGrid<Option<Edifice>>,
    things: ThingStore,
    factions: Factions,
    fog: BitGrid,
    roofs: BitGrid,
    glow: CellGrid<f32>,
    areas: AHashMap<AreaId, BitGrid>,
    avoid_grids: AHashMap<FactionId, CellGrid<u8>>,
    lord_walk_grids: AHashMap<LordId, BitGrid>,
    events: MapEvents,
}

impl Map {
    /// Fully lit open soil
    pub fn new(id: MapId, width: u16, height: u16) -> Self {
        let indices = CellIndices::new(width, height);
        let dims = indices.dims();
        Self {
            id,
            indices,
            terrain: CellGrid::new(dims),
            edifices: CellGrid::new(dims),
            things: ThingStore::default(),
            factions: Factions::default(),
            fog: BitGrid::new(dims),
            roofs: BitGrid::new(dims),
            glow: CellGrid::filled(dims, 1.0),
            areas: AHashMap::new(),
            avoid_grids: AHashMap::new(),
            lord_walk_grids: AHashMap::new(),
            events: MapEvents::default(),
        }
    }

    pub fn id(&self) -> MapId {
        self.id
    }

    pub fn indices(&self) -> &CellIndices {
        &self.indices
    }

    pub fn subscribe(&mut self) -> Receiver<MapEvent> {
        self.events.subscribe()
    }

    /// Posts an event that isn't the result of a mutation on this map
    pub fn post_event(&mut self, event: MapEvent) {
        self.events.post(event)
    }

    fn index_or_warn(&self, cell: Cell) -> Option<usize> {
        let idx = self.indices.try_index_of(cell);
        if idx.is_none() {
            warn!("ignoring change to out of bounds cell"; "cell" => cell, "map" => self.id);
        }
        idx
    }

    fn clip_or_warn(&self, rect: CellRect) -> Option<CellRect> {
        let clipped = rect.clipped_to(&self.indices);
        if clipped.is_none() {
            warn!("ignoring change to out of bounds rect"; "rect" => rect, "map" => self.id);
        }
        clipped
    }

    // ---- terrain

    pub fn terrain(&self, index: usize) -> &Terrain {
        &self.terrain[index]
    }

    pub fn set_terrain(&mut self, cell: Cell, terrain: Terrain) {
        let idx = some_or_return!(self.index_or_warn(cell));
        if self.terrain[idx] != terrain {
            self.terrain[idx] = terrain;
            self.events.post(MapEvent::TerrainChanged(cell));
        }
    }

    // ---- edifices

    pub fn edifice(&self, index: usize) -> Option<&Edifice> {
        self.edifices[index].as_ref()
    }

    /// Replaces any existing edifice in the rect
    pub fn spawn_building(&mut self, rect: CellRect, edifice: Edifice) {
        let rect = some_or_return!(self.clip_or_warn(rect));
        for cell in rect.cells() {
            let idx = self.indices.index_of(cell);
            self.edifices[idx] = Some(edifice.clone());
        }
        self.events.post(MapEvent::BuildingSpawned(rect));
    }

    pub fn despawn_building(&mut self, rect: CellRect) {
        let rect = some_or_return!(self.clip_or_warn(rect));
        let mut any = false;
        for cell in rect.cells() {
            let idx = self.indices.index_of(cell);
            any |= self.edifices[idx].take().is_some();
        }

        if any {
            self.events.post(MapEvent::BuildingDespawned(rect));
        }
    }

    pub fn set_hit_points(&mut self, cell: Cell, hit_points: u32) {
        let idx = some_or_return!(self.index_or_warn(cell));
        if let Some(edifice) = self.edifices[idx].as_mut() {
            if edifice.hit_points != hit_points {
                edifice.hit_points = hit_points;
                self.events.post(MapEvent::BuildingHitPointsChanged(cell));
            }
        }
    }

    pub fn set_door_open(&mut self, cell: Cell, open: bool) {
        let idx = some_or_return!(self.index_or_warn(cell));
        let door = some_or_return!(self.edifices[idx].as_mut().and_then(|e| e.door_mut()));
        if door.open != open {
            door.open = open;
            self.events.post(MapEvent::DoorStateChanged(cell));
        }
    }

    /// Neither terrain nor edifice can ever be crossed
    pub fn is_permanently_impassable(&self, index: usize) -> bool {
        self.terrain[index].impassable
            || self.edifices[index]
                .as_ref()
                .map_or(false, |e| e.is_permanently_impassable())
    }

    /// Impassable to anyone not bashing through
    pub fn is_impassable(&self, index: usize) -> bool {
        self.terrain[index].impassable
            || self.edifices[index]
                .as_ref()
                .map_or(false, |e| e.is_impassable())
    }

    // ---- things

    pub fn things(&self) -> &ThingStore {
        &self.things
    }

    pub fn spawn_thing(
        &mut self,
        kind: ThingKind,
        rect: CellRect,
        faction: Option<FactionId>,
    ) -> Option<ThingId> {
        let rect = self.clip_or_warn(rect)?;
        let thing = self.things.spawn(&self.indices, kind, rect, faction);
        self.events.post(MapEvent::ThingSpawned { thing, rect });
        Some(thing)
    }

    pub fn despawn_thing(&mut self, thing: ThingId) -> Option<Thing> {
        let despawned = self.things.despawn(&self.indices, thing)?;
        self.events.post(MapEvent::ThingDespawned {
            thing,
            rect: despawned.rect,
        });
        Some(despawned)
    }

    pub fn reserve(&mut self, thing: ThingId, faction: FactionId) {
        let rect = some_or_return!(self.things.get(thing)).rect;
        if self.things.reserve(thing, faction) {
            self.events.post(MapEvent::ReservationAdded {
                thing,
                rect,
                faction,
            });
        }
    }

    pub fn release_reservation(&mut self, thing: ThingId, faction: FactionId) {
        let rect = some_or_return!(self.things.get(thing)).rect;
        if self.things.release_reservation(thing, faction) {
            self.events.post(MapEvent::ReservationRemoved {
                thing,
                rect,
                faction,
            });
        }
    }

    pub fn add_haul_enroute(&mut self, thing: ThingId, faction: FactionId) {
        let rect = some_or_return!(self.things.get(thing)).rect;
        if self.things.add_haul_enroute(thing, faction) {
            self.events.post(MapEvent::HaulEnrouteAdded {
                thing,
                rect,
                faction,
            });
        }
    }

    pub fn release_haul_enroute(&mut self, thing: ThingId, faction: FactionId) {
        let rect = some_or_return!(self.things.get(thing)).rect;
        if self.things.release_haul_enroute(thing, faction) {
            self.events.post(MapEvent::HaulEnrouteReleased {
                thing,
                rect,
                faction,
            });
        }
    }

    // ---- factions

    pub fn factions(&self) -> &Factions {
        &self.factions
    }

    pub fn set_player_faction(&mut self, faction: FactionId) {
        self.factions.set_player(faction);
        self.events.post(MapEvent::FactionRelationsChanged);
    }

    pub fn set_relation(&mut self, a: FactionId, b: FactionId, relation: FactionRelation) {
        if self.factions.relation(a, b) != relation {
            self.factions.set_relation(a, b, relation);
            self.events.post(MapEvent::FactionRelationsChanged);
        }
    }

    pub fn remove_faction(&mut self, faction: FactionId) {
        if self.factions.remove(faction) {
            self.things.forget_faction(faction);
            self.avoid_grids.remove(&faction);
            self.events.post(MapEvent::FactionRemoved(faction));
        }
    }

    // ---- fog, roofs and light

    pub fn is_fogged(&self, index: usize) -> bool {
        self.fog.get(index)
    }

    pub fn set_fogged(&mut self, cell: Cell, fogged: bool) {
        let idx = some_or_return!(self.index_or_warn(cell));
        if self.fog.set(idx, fogged) {
            self.events.post(MapEvent::CellFogChanged(cell));
        }
    }

    /// Fogs the whole map at once
    pub fn fog_all(&mut self) {
        for idx in 0..self.indices.num_grid_cells() {
            self.fog.set(idx, true);
        }
        self.events.post(MapEvent::MapFogged);
    }

    pub fn is_roofed(&self, index: usize) -> bool {
        self.roofs.get(index)
    }

    pub fn set_roofed(&mut self, cell: Cell, roofed: bool) {
        let idx = some_or_return!(self.index_or_warn(cell));
        if self.roofs.set(idx, roofed) {
            self.events.post(MapEvent::RoofChanged(cell));
        }
    }

    /// 0 is pitch black, 1 is fully lit
    pub fn glow(&self, index: usize) -> f32 {
        self.glow[index]
    }

    pub fn set_glow(&mut self, cell: Cell, glow: f32) {
        let idx = some_or_return!(self.index_or_warn(cell));
        let glow = glow.clamp(0.0, 1.0);
        if (self.glow[idx] - glow).abs() > f32::EPSILON {
            self.glow[idx] = glow;
            self.events.post(MapEvent::PathCostRecalculate(cell));
        }
    }

    // ---- areas and per-group grids

    pub fn area(&self, area: AreaId) -> Option<&BitGrid> {
        self.areas.get(&area)
    }

    pub fn set_area_cell(&mut self, area: AreaId, cell: Cell, allowed: bool) {
        let idx = some_or_return!(self.index_or_warn(cell));
        let dims = self.indices.dims();
        let grid = self.areas.entry(area).or_insert_with(|| BitGrid::new(dims));
        if grid.set(idx, allowed) {
            self.events.post(MapEvent::AreaChanged { area, cell });
        }
    }

    pub fn avoid_grid(&self, faction: FactionId) -> Option<&CellGrid<u8>> {
        self.avoid_grids.get(&faction)
    }

    /// Read fresh by every grid job so needs no event
    pub fn set_avoid_grid(&mut self, faction: FactionId, grid: CellGrid<u8>) {
        debug_assert_eq!(grid.dimensions(), self.indices.dims());
        self.avoid_grids.insert(faction, grid);
    }

    pub fn lord_walk_grid(&self, lord: LordId) -> Option<&BitGrid> {
        self.lord_walk_grids.get(&lord)
    }

    pub fn set_lord_walk_grid(&mut self, lord: LordId, grid: BitGrid) {
        debug_assert_eq!(grid.dimensions(), self.indices.dims());
        self.lord_walk_grids.insert(lord, grid);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn mutations_post_events() {
        let mut map = Map::new(MapId(0), 8, 8);
        let rx = map.subscribe();

        let cell = Cell::new(2, 3);
        map.spawn_building(CellRect::single(cell), Edifice::wall(300));
        map.set_hit_points(cell, 300);
        map.set_hit_points(cell, 250);
        map.set_fogged(cell, true);
        map.set_fogged(cell, true);

        let events = rx.try_iter().collect_vec();
        assert_eq!(
            events,
            vec![
                MapEvent::BuildingSpawned(CellRect::single(cell)),
                MapEvent::BuildingHitPointsChanged(cell),
                MapEvent::CellFogChanged(cell),
            ]
        );
    }

    #[test]
    fn out_of_bounds_changes_are_ignored() {
        let _ = misc::logging::for_tests();
        let mut map = Map::new(MapId(0), 4, 4);
        let rx = map.subscribe();

        map.set_terrain(Cell::new(10, 10), Terrain::mud());
        assert!(map
            .spawn_thing(
                ThingKind::Blueprint,
                CellRect::single(Cell::new(-2, 1)),
                None
            )
            .is_none());
        assert_eq!(rx.try_iter().count(), 0);
    }

    #[test]
    fn permanent_impassability() {
        let mut map = Map::new(MapId(0), 4, 4);
        map.spawn_building(CellRect::single(Cell::new(0, 0)), Edifice::wall(100));
        map.spawn_building(
            CellRect::single(Cell::new(1, 0)),
            Edifice::wall(100).indestructible(),
        );
        map.set_terrain(Cell::new(2, 0), Terrain::chasm());

        let idx = |x| map.indices().index_of(Cell::new(x, 0));
        assert!(map.is_impassable(idx(0)));
        assert!(!map.is_permanently_impassable(idx(0)));
        assert!(map.is_permanently_impassable(idx(1)));
        assert!(map.is_permanently_impassable(idx(2)));
        assert!(!map.is_impassable(idx(3)));
    }
}
