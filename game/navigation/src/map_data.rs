//! Owns every cost source of a map and keeps them in step with the map's events

use std::sync::Arc;

use ahash::AHashSet;
use crossbeam::channel::Receiver;
use misc::*;
use unit::map::{Cell, CellIndices, CellRect};
use unit::Tick;

use crate::connection::CellConnections;
use crate::cost::{
    AreaSource, BuildingSource, DarknessDangerSource, FactionSource, FenceSource, FogSource,
    PathCostSource, PathFinderDataSource, PerceptualSource, PersistentDangerSource,
    SourceContext, WaterSource,
};
use crate::grid_job::GridJobParams;
use crate::map::{Map, MapEvent};
use crate::request::PathRequest;
use crate::settings::PathingSettings;

/// Changes since the last gather that affect connectivity, for the region grid to consume
#[derive(Debug, Default)]
pub struct StructureChanges {
    pub dirty: Vec<CellRect>,
    pub roofs: Vec<Cell>,
}

impl StructureChanges {
    pub fn is_empty(&self) -> bool {
        self.dirty.is_empty() && self.roofs.is_empty()
    }
}

pub struct PathFinderMapData {
    indices: CellIndices,
    settings: PathingSettings,
    events: Receiver<MapEvent>,

    path_cost: PathCostSource,
    area: AreaSource,
    perceptual: PerceptualSource,
    water: WaterSource,
    fence: FenceSource,
    fog: FogSource,
    building: BuildingSource,
    faction: FactionSource,
    persistent_danger: PersistentDangerSource,
    darkness: DarknessDangerSource,
    custom: Vec<Box<dyn PathFinderDataSource>>,

    connections: CellConnections,

    changed_cells: AHashSet<usize>,
    /// Same as `changed_cells` in insertion order
    changed_list: Vec<usize>,
    /// Expanded by one and clipped at gather time
    changed_rects: Vec<CellRect>,

    last_gather: Option<Tick>,
    needs_full: bool,
    data_changed: bool,
    structure: StructureChanges,
}

impl PathFinderMapData {
    pub fn new(map: &mut Map, settings: PathingSettings) -> Self {
        let indices = *map.indices();
        let events = map.subscribe();
        Self {
            indices,
            settings,
            events,
            path_cost: PathCostSource::new(&indices),
            area: AreaSource::new(&indices),
            perceptual: PerceptualSource::new(&indices),
            water: WaterSource::new(&indices),
            fence: FenceSource::new(&indices),
            fog: FogSource::new(&indices),
            building: BuildingSource::new(&indices),
            faction: FactionSource::new(&indices),
            persistent_danger: PersistentDangerSource::new(&indices),
            darkness: DarknessDangerSource::new(&indices),
            custom: Vec::new(),
            connections: CellConnections::new(map),
            changed_cells: AHashSet::new(),
            changed_list: Vec::new(),
            changed_rects: Vec::new(),
            last_gather: None,
            needs_full: true,
            data_changed: false,
            structure: StructureChanges::default(),
        }
    }

    /// Panics if a source with the same name is already registered
    pub fn register_source(&mut self, source: Box<dyn PathFinderDataSource>) {
        let name = source.name();
        if self.source_names().any(|existing| existing == name) {
            panic!("duplicate path data source {:?}", name);
        }

        debug!("registered path data source"; "name" => name);
        self.custom.push(source);
        self.needs_full = true;
    }

    pub fn source_names(&self) -> impl Iterator<Item = &'static str> + '_ {
        let builtin: [&dyn PathFinderDataSource; 10] = [
            &self.path_cost,
            &self.area,
            &self.perceptual,
            &self.water,
            &self.fence,
            &self.fog,
            &self.building,
            &self.faction,
            &self.persistent_danger,
            &self.darkness,
        ];
        builtin
            .into_iter()
            .chain(self.custom.iter().map(|s| s.as_ref()))
            .map(|s| s.name())
    }

    fn sources_mut(&mut self) -> Vec<&mut (dyn PathFinderDataSource + 'static)> {
        let mut sources: Vec<&mut (dyn PathFinderDataSource + 'static)> = vec![
            &mut self.path_cost,
            &mut self.area,
            &mut self.perceptual,
            &mut self.water,
            &mut self.fence,
            &mut self.fog,
            &mut self.building,
            &mut self.faction,
            &mut self.persistent_danger,
            &mut self.darkness,
        ];
        sources.extend(self.custom.iter_mut().map(|s| s.as_mut()));
        sources
    }

    fn drain_events(&mut self) {
        while let Ok(event) = self.events.try_recv() {
            if event.is_structural() {
                if let Some(rect) = event.affected_rect() {
                    self.structure.dirty.push(rect);
                }
            }

            match event {
                MapEvent::FactionRemoved(_)
                | MapEvent::FactionRelationsChanged
                | MapEvent::MapFogged => {
                    // recomputed in full even if already gathered this tick
                    self.needs_full = true;
                    self.last_gather = None;
                    continue;
                }
                MapEvent::RoofChanged(cell) => self.structure.roofs.push(cell),
                _ => {}
            }

            match event.affected_rect() {
                Some(rect) if rect.is_single() => self.add_changed_cell(rect.min()),
                Some(rect) => self.changed_rects.push(rect),
                None => {}
            }
        }
    }

    fn add_changed_cell(&mut self, cell: Cell) {
        match self.indices.try_index_of(cell) {
            Some(idx) => {
                if self.changed_cells.insert(idx) {
                    self.changed_list.push(idx);
                }
            }
            None => warn!("dropping out of bounds cell change"; "cell" => cell),
        }
    }

    /// Folds the pending rects into the changed cells
    fn flush_rects(&mut self) {
        for rect in std::mem::take(&mut self.changed_rects) {
            let clipped = match rect.expanded_by(1).clipped_to(&self.indices) {
                Some(r) => r,
                None => {
                    warn!("dropping out of bounds rect change"; "rect" => rect);
                    continue;
                }
            };

            for cell in clipped.cells() {
                let idx = self.indices.index_of(cell);
                if self.changed_cells.insert(idx) {
                    self.changed_list.push(idx);
                }
            }
        }
    }

    /// Brings every source up to date with the map. Returns false without doing anything
    /// if already gathered this tick, unless a map-wide reset happened since
    pub fn gather_data(&mut self, map: &Map, tick: Tick, requests: &[Arc<PathRequest>]) -> bool {
        self.drain_events();
        if self.last_gather == Some(tick) {
            return false;
        }

        self.flush_rects();

        let full = std::mem::take(&mut self.needs_full);
        let changed = std::mem::take(&mut self.changed_list);
        self.changed_cells.clear();

        // settings are cloned out so the sources can be borrowed mutably
        let settings = self.settings.clone();
        let ctx = SourceContext {
            map,
            requests,
            settings: &settings,
        };

        let mut sources = self.sources_mut();
        let source_count = sources.len();
        let changed_ref = &changed;
        let result = crossbeam::scope(|scope| {
            let handles = sources
                .drain(..)
                .map(|source| {
                    scope.spawn(move |_| {
                        if full {
                            source.compute_all(&ctx);
                            true
                        } else {
                            source.update_incrementally(&ctx, changed_ref)
                        }
                    })
                })
                .collect_vec();

            handles.into_iter().fold(false, |any, handle| {
                let changed = handle
                    .join()
                    .unwrap_or_else(|panic| std::panic::resume_unwind(panic));
                any | changed
            })
        });

        self.data_changed = match result {
            Ok(any) => any,
            Err(panic) => std::panic::resume_unwind(panic),
        };

        if full {
            self.connections.recompute_all(map);
        } else if !changed.is_empty() {
            self.connections.update(map, &changed);
        }

        debug!("gathered path data";
            "tick" => tick,
            "full" => full,
            "cells" => changed.len(),
            "sources" => source_count,
            "changed" => self.data_changed
        );

        self.last_gather = Some(tick);
        true
    }

    /// Makes sure the per-area and per-faction sources cover requests that arrived after
    /// this tick's gather
    pub fn prepare_requests(&mut self, map: &Map, requests: &[Arc<PathRequest>]) {
        let ctx = SourceContext {
            map,
            requests,
            settings: &self.settings,
        };
        self.area.update_incrementally(&ctx, &[]);
        self.faction.update_incrementally(&ctx, &[]);
    }

    /// Narrows the sources down to what the given request reads
    pub fn parameterize_grid_job<'a>(
        &'a self,
        map: &'a Map,
        request: &'a PathRequest,
    ) -> GridJobParams<'a> {
        let parms = *request.parms();

        let direct = if request.is_flying() {
            self.path_cost.flying()
        } else if parms.fence_blocked {
            self.path_cost.fence_blocked()
        } else {
            self.path_cost.normal()
        };

        GridJobParams {
            indices: self.indices,
            settings: &self.settings,
            parms,
            tuning: *request.tuning(),
            factions: map.factions(),
            direct,
            perceptual: self.perceptual.costs(request.is_drafted()),
            water: self.water.bits(),
            fences: self.fence.bits(),
            buildings: &self.building,
            fog: self.fog.bits(),
            persistent_danger: self.persistent_danger.bits(),
            darkness: self.darkness.bits(),
            faction_costs: parms.faction.and_then(|f| self.faction.costs(f)),
            allowed_area: request.area().and_then(|a| self.area.allowed(a)),
            avoid_grid: parms.faction.and_then(|f| map.avoid_grid(f)),
            lord_walk_grid: request
                .pawn()
                .and_then(|p| p.lord)
                .and_then(|lord| map.lord_walk_grid(lord)),
            custom: request.custom_costs().map(|c| c.as_ref()),
            extra_sources: &self.custom,
        }
    }

    /// Structural changes seen since the last call
    pub fn take_structure_changes(&mut self) -> StructureChanges {
        std::mem::take(&mut self.structure)
    }

    pub fn connections(&self) -> &CellConnections {
        &self.connections
    }

    pub fn path_costs(&self) -> &PathCostSource {
        &self.path_cost
    }

    pub fn buildings(&self) -> &BuildingSource {
        &self.building
    }

    pub fn fences(&self) -> &FenceSource {
        &self.fence
    }

    pub fn fog(&self) -> &FogSource {
        &self.fog
    }

    pub fn settings(&self) -> &PathingSettings {
        &self.settings
    }

    /// Whether the last gather changed anything
    pub fn data_changed(&self) -> bool {
        self.data_changed
    }

    pub fn last_gather(&self) -> Option<Tick> {
        self.last_gather
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::grid_job::PathGridJob;
    use crate::helpers::MapBuilder;
    use crate::map::{Edifice, MapId, Terrain};
    use crate::IMPASSABLE;
    use grid::CellGrid;
    use unit::map::Direction;

    fn request() -> Arc<PathRequest> {
        PathRequest::builder(MapId(0), Cell::new(0, 0), Cell::new(1, 1)).build()
    }

    #[test]
    fn gather_once_per_tick() {
        misc::logging::for_tests();
        let mut map = MapBuilder::new(5, 5).build();
        let mut data = PathFinderMapData::new(&mut map, PathingSettings::default());

        assert!(data.gather_data(&map, Tick(1), &[]));
        assert!(data.data_changed());
        assert!(!data.gather_data(&map, Tick(1), &[]));
        assert_eq!(data.last_gather(), Some(Tick(1)));

        // nothing happened
        assert!(data.gather_data(&map, Tick(2), &[]));
        assert!(!data.data_changed());
    }

    #[test]
    fn events_update_sources_incrementally() {
        let mut map = MapBuilder::new(6, 6).build();
        let mut data = PathFinderMapData::new(&mut map, PathingSettings::default());
        data.gather_data(&map, Tick(1), &[]);

        let cell = Cell::new(2, 3);
        let idx = map.indices().index_of(cell);
        map.spawn_building(CellRect::single(cell), Edifice::wall(100));
        map.set_terrain(Cell::new(4, 4), Terrain::chasm());

        assert!(data.gather_data(&map, Tick(2), &[]));
        assert!(data.data_changed());
        assert_eq!(data.path_costs().normal()[idx], IMPASSABLE);
        assert!(data.buildings().is_building(idx));

        // bashable walls stay connected, chasms don't
        let below = |x, z| data.connections().at(map.indices().index_of(Cell::new(x, z)));
        assert!(below(2, 2).contains(Direction::North));
        assert!(!below(4, 3).contains(Direction::North));

        let structure = data.take_structure_changes();
        assert_eq!(structure.dirty.len(), 2);
        assert!(data.take_structure_changes().is_empty());
    }

    #[test]
    fn out_of_bounds_changes_are_dropped() {
        misc::logging::for_tests();
        let mut map = MapBuilder::new(4, 4).build();
        let mut data = PathFinderMapData::new(&mut map, PathingSettings::default());
        data.gather_data(&map, Tick(1), &[]);

        map.post_event(MapEvent::PathCostRecalculate(Cell::new(10, 10)));
        map.post_event(MapEvent::ThingSpawned {
            thing: crate::map::ThingId(99),
            rect: CellRect::with_size(Cell::new(20, 20), (2, 2)),
        });

        assert!(data.gather_data(&map, Tick(2), &[]));
        assert!(!data.data_changed());
    }

    #[test]
    fn fogging_everything_recomputes_all() {
        let mut map = MapBuilder::new(4, 4).build();
        let mut data = PathFinderMapData::new(&mut map, PathingSettings::default());
        data.gather_data(&map, Tick(1), &[]);
        assert_eq!(data.fog().bits().count_ones(), 0);

        map.fog_all();
        data.gather_data(&map, Tick(2), &[]);
        assert_eq!(data.fog().bits().count_ones(), 16);
    }

    #[test]
    fn reset_events_force_a_regather_in_the_same_tick() {
        let mut map = MapBuilder::new(4, 4).build();
        let mut data = PathFinderMapData::new(&mut map, PathingSettings::default());
        assert!(data.gather_data(&map, Tick(1), &[]));

        // ordinary changes wait for the next tick
        map.set_fogged(Cell::new(0, 0), true);
        assert!(!data.gather_data(&map, Tick(1), &[]));
        assert_eq!(data.fog().bits().count_ones(), 0);

        map.fog_all();
        assert!(data.gather_data(&map, Tick(1), &[]));
        assert_eq!(data.fog().bits().count_ones(), 16);
        assert!(!data.gather_data(&map, Tick(1), &[]));
    }

    struct Mud {
        cells: CellGrid<u32>,
    }

    impl PathFinderDataSource for Mud {
        fn name(&self) -> &'static str {
            "mud"
        }

        fn compute_all(&mut self, ctx: &SourceContext) {
            self.cells.fill(0);
            self.cells[ctx.map.indices().index_of(Cell::new(1, 1))] = 9;
        }

        fn update_incrementally(&mut self, _: &SourceContext, _: &[usize]) -> bool {
            false
        }

        fn cell_cost(&self, idx: usize) -> u32 {
            self.cells[idx]
        }
    }

    #[test]
    fn custom_sources_add_to_every_grid() {
        let mut map = MapBuilder::new(3, 3).build();
        let mut data = PathFinderMapData::new(&mut map, PathingSettings::default());
        data.register_source(Box::new(Mud {
            cells: CellGrid::new(map.indices().dims()),
        }));
        assert_eq!(data.source_names().count(), 11);

        let req = request();
        data.gather_data(&map, Tick(1), &[req.clone()]);
        let grid = PathGridJob::new(data.parameterize_grid_job(&map, &req)).run(1);
        assert_eq!(grid[map.indices().index_of(Cell::new(1, 1))], 9);
        assert_eq!(grid[map.indices().index_of(Cell::new(0, 1))], 0);
    }

    #[test]
    #[should_panic(expected = "duplicate path data source")]
    fn duplicate_source_names_panic() {
        let mut map = MapBuilder::new(3, 3).build();
        let mut data = PathFinderMapData::new(&mut map, PathingSettings::default());
        let fog = FogSource::new(map.indices());
        data.register_source(Box::new(fog));
    }
}
