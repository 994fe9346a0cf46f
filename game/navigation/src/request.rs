use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::Arc;

use ahash::AHashSet;
use misc::*;
use once_cell::sync::OnceCell;
use unit::map::{Cell, CellRect};
use unit::Tick;

use crate::map::{AreaId, FactionId, LordId, Map, MapId, ThingId};
use crate::path::PawnPath;
use crate::traverse::TraverseParms;

#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct RequestId(u64);

#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
pub struct PawnId(pub u64);

slog_value_debug!(RequestId);
slog_value_debug!(PawnId);

/// Where a path should end
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum LocalTarget {
    Cell(Cell),
    Thing { thing: ThingId, rect: CellRect },
}

#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum PathEndMode {
    /// Stand inside the target
    OnCell,
    /// Stand inside or next to the target
    Touch,
}

/// The pawn a request is for
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub struct PawnInfo {
    pub id: PawnId,
    pub map: MapId,
    pub position: Cell,
    pub faction: Option<FactionId>,
    pub drafted: bool,
    pub flying: bool,
    pub lord: Option<LordId>,
}

/// Per-request cost adjustments
#[derive(Debug, Copy, Clone, PartialEq)]
pub struct PathFinderCostTuning {
    pub cost_blocked_wall_base: u32,
    pub cost_blocked_wall_extra_per_hit_point: f32,
    pub cost_blocked_wall_extra_for_natural_walls: u32,
    pub cost_blocked_door: u32,
    pub cost_blocked_door_per_hit_point: f32,
    pub cost_off_lord_walk_grid: u32,
    /// Replaces the direct and perceived cost of water cells
    pub water_cost_override: Option<u32>,
}

/// Extra cost of a cell for a single request. May be negative
pub trait CustomCostProvider: Send + Sync {
    fn cost_offset(&self, cell: Cell) -> i32;
}

#[derive(Debug, Clone, PartialEq, Error)]
pub enum RequestError {
    #[error("request is for map {request:?} but was given {map:?}")]
    WrongMap { request: MapId, map: MapId },

    #[error("pawn is on map {pawn:?} but the request is for {request:?}")]
    PawnOnOtherMap { pawn: MapId, request: MapId },

    #[error("start cell {0} is out of bounds")]
    StartOutOfBounds(Cell),

    #[error("start cell {0} can never be stood on")]
    StartImpassable(Cell),

    #[error("destination {0} is entirely outside the map")]
    DestinationOutOfBounds(CellRect),

    #[error("every destination cell is excluded")]
    NoDestinationCells,
}

#[derive(Debug, Clone, PartialEq, Error)]
pub enum PathError {
    #[error("request rejected: {0}")]
    Rejected(#[from] RequestError),

    #[error("no path to destination")]
    NoPath,

    #[error("search exhausted its expansion limit")]
    Overflow,

    #[error("request was cancelled")]
    Cancelled,

    #[error("request expired at {0}")]
    TimedOut(Tick),
}

pub type PathResult = Result<PawnPath, PathError>;

/// Cells a search may end in
#[derive(Debug, Clone)]
pub struct Destination {
    pub rect: CellRect,
    /// Indices inside `rect` that don't count
    pub excluded: AHashSet<usize>,
}

/// A single path query, shared between the requester and the path finder. Resolved exactly once
#[derive(Derivative)]
#[derivative(Debug)]
pub struct PathRequest {
    id: RequestId,
    map: MapId,
    start: Cell,
    target: LocalTarget,
    end_mode: PathEndMode,
    exact_destination: Option<Cell>,
    parms: TraverseParms,
    tuning: PathFinderCostTuning,
    pawn: Option<PawnInfo>,
    area: Option<AreaId>,
    #[derivative(Debug = "ignore")]
    custom_costs: Option<Arc<dyn CustomCostProvider>>,
    excluded: Vec<Cell>,
    created: Tick,
    deadline: Option<Tick>,
    started: OnceCell<Tick>,
    cancelled: AtomicBool,
    result: OnceCell<PathResult>,
}

pub struct PathRequestBuilder {
    map: MapId,
    start: Cell,
    target: LocalTarget,
    end_mode: PathEndMode,
    exact_destination: Option<Cell>,
    parms: TraverseParms,
    tuning: PathFinderCostTuning,
    pawn: Option<PawnInfo>,
    area: Option<AreaId>,
    custom_costs: Option<Arc<dyn CustomCostProvider>>,
    excluded: Vec<Cell>,
    created: Tick,
    deadline: Option<Tick>,
}

static NEXT_REQUEST_ID: AtomicU64 = AtomicU64::new(1);

impl Default for PathFinderCostTuning {
    fn default() -> Self {
        Self {
            cost_blocked_wall_base: 70,
            cost_blocked_wall_extra_per_hit_point: 0.2,
            cost_blocked_wall_extra_for_natural_walls: 0,
            cost_blocked_door: 50,
            cost_blocked_door_per_hit_point: 0.2,
            cost_off_lord_walk_grid: 70,
            water_cost_override: None,
        }
    }
}

impl PathFinderCostTuning {
    /// Hashable form for grouping requests that share a cost grid
    pub(crate) fn key(&self) -> [u32; 7] {
        [
            self.cost_blocked_wall_base,
            self.cost_blocked_wall_extra_per_hit_point.to_bits(),
            self.cost_blocked_wall_extra_for_natural_walls,
            self.cost_blocked_door,
            self.cost_blocked_door_per_hit_point.to_bits(),
            self.cost_off_lord_walk_grid,
            self.water_cost_override.map_or(u32::MAX, |c| c.min(u32::MAX - 1)),
        ]
    }
}

impl LocalTarget {
    pub fn rect(&self) -> CellRect {
        match self {
            LocalTarget::Cell(cell) => CellRect::single(*cell),
            LocalTarget::Thing { rect, .. } => *rect,
        }
    }
}

impl From<Cell> for LocalTarget {
    fn from(cell: Cell) -> Self {
        LocalTarget::Cell(cell)
    }
}

impl PathRequestBuilder {
    pub fn end_mode(mut self, end_mode: PathEndMode) -> Self {
        self.end_mode = end_mode;
        self
    }

    /// Overrides the target and end mode with a single cell
    pub fn exact_destination(mut self, cell: Cell) -> Self {
        self.exact_destination = Some(cell);
        self
    }

    pub fn parms(mut self, parms: TraverseParms) -> Self {
        self.parms = parms;
        self
    }

    pub fn tuning(mut self, tuning: PathFinderCostTuning) -> Self {
        self.tuning = tuning;
        self
    }

    /// Also takes the traverser's faction from the pawn if not already set
    pub fn pawn(mut self, pawn: PawnInfo) -> Self {
        if self.parms.faction.is_none() {
            self.parms.faction = pawn.faction;
        }
        self.pawn = Some(pawn);
        self
    }

    pub fn area(mut self, area: AreaId) -> Self {
        self.area = Some(area);
        self
    }

    pub fn custom_costs(mut self, provider: Arc<dyn CustomCostProvider>) -> Self {
        self.custom_costs = Some(provider);
        self
    }

    pub fn exclude(mut self, cells: impl IntoIterator<Item = Cell>) -> Self {
        self.excluded.extend(cells);
        self
    }

    pub fn created(mut self, tick: Tick) -> Self {
        self.created = tick;
        self
    }

    /// Times out if not resolved by the end of this tick
    pub fn deadline(mut self, tick: Tick) -> Self {
        self.deadline = Some(tick);
        self
    }

    pub fn build(self) -> Arc<PathRequest> {
        let id = RequestId(NEXT_REQUEST_ID.fetch_add(1, Ordering::Relaxed));
        Arc::new(PathRequest {
            id,
            map: self.map,
            start: self.start,
            target: self.target,
            end_mode: self.end_mode,
            exact_destination: self.exact_destination,
            parms: self.parms,
            tuning: self.tuning,
            pawn: self.pawn,
            area: self.area,
            custom_costs: self.custom_costs,
            excluded: self.excluded,
            created: self.created,
            deadline: self.deadline,
            started: OnceCell::new(),
            cancelled: AtomicBool::new(false),
            result: OnceCell::new(),
        })
    }
}

impl PathRequest {
    pub fn builder(map: MapId, start: Cell, target: impl Into<LocalTarget>) -> PathRequestBuilder {
        PathRequestBuilder {
            map,
            start,
            target: target.into(),
            end_mode: PathEndMode::OnCell,
            exact_destination: None,
            parms: TraverseParms::default(),
            tuning: PathFinderCostTuning::default(),
            pawn: None,
            area: None,
            custom_costs: None,
            excluded: Vec::new(),
            created: Tick::default(),
            deadline: None,
        }
    }

    pub fn id(&self) -> RequestId {
        self.id
    }

    pub fn map(&self) -> MapId {
        self.map
    }

    pub fn start(&self) -> Cell {
        self.start
    }

    pub fn target(&self) -> &LocalTarget {
        &self.target
    }

    pub fn end_mode(&self) -> PathEndMode {
        self.end_mode
    }

    pub fn parms(&self) -> &TraverseParms {
        &self.parms
    }

    pub fn tuning(&self) -> &PathFinderCostTuning {
        &self.tuning
    }

    pub fn pawn(&self) -> Option<&PawnInfo> {
        self.pawn.as_ref()
    }

    pub fn area(&self) -> Option<AreaId> {
        self.area
    }

    pub fn custom_costs(&self) -> Option<&Arc<dyn CustomCostProvider>> {
        self.custom_costs.as_ref()
    }

    pub fn created(&self) -> Tick {
        self.created
    }

    pub fn deadline(&self) -> Option<Tick> {
        self.deadline
    }

    pub fn is_expired(&self, now: Tick) -> bool {
        self.deadline.map_or(false, |deadline| now > deadline)
    }

    pub fn is_drafted(&self) -> bool {
        self.pawn.map_or(false, |p| p.drafted)
    }

    pub fn is_flying(&self) -> bool {
        self.pawn.map_or(false, |p| p.flying)
    }

    /// Cells the search may end in, None if the target is entirely off the map
    pub fn destination(&self, map: &Map) -> Option<Destination> {
        let indices = map.indices();
        let mut excluded = AHashSet::new();

        let rect = match (self.exact_destination, self.end_mode) {
            (Some(cell), _) => CellRect::single(cell),
            (None, PathEndMode::OnCell) => self.target.rect(),
            (None, PathEndMode::Touch) => {
                let target = self.target.rect();
                for cell in target.cells() {
                    if let Some(idx) = indices.try_index_of(cell) {
                        if map.is_impassable(idx) {
                            excluded.insert(idx);
                        }
                    }
                }
                target.expanded_by(1)
            }
        };

        let rect = rect.clipped_to(indices)?;
        excluded.extend(
            self.excluded
                .iter()
                .filter_map(|cell| indices.try_index_of(*cell)),
        );
        Some(Destination { rect, excluded })
    }

    pub fn validate(&self, map: &Map) -> Result<Destination, RequestError> {
        if self.map != map.id() {
            return Err(RequestError::WrongMap {
                request: self.map,
                map: map.id(),
            });
        }

        if let Some(pawn) = self.pawn.as_ref() {
            if pawn.map != self.map {
                return Err(RequestError::PawnOnOtherMap {
                    pawn: pawn.map,
                    request: self.map,
                });
            }
        }

        let start = map
            .indices()
            .try_index_of(self.start)
            .ok_or(RequestError::StartOutOfBounds(self.start))?;

        // a pawn already standing somewhere must be able to walk out
        let own_cell = self.pawn.map_or(false, |p| p.position == self.start);
        if map.is_permanently_impassable(start) && !own_cell {
            return Err(RequestError::StartImpassable(self.start));
        }

        let destination = self
            .destination(map)
            .ok_or_else(|| RequestError::DestinationOutOfBounds(self.target.rect()))?;

        let indices = map.indices();
        if destination
            .rect
            .cells()
            .all(|cell| destination.excluded.contains(&indices.index_of(cell)))
        {
            return Err(RequestError::NoDestinationCells);
        }

        Ok(destination)
    }

    pub fn cancel(&self) {
        self.cancelled.store(true, Ordering::Release);
    }

    pub fn is_cancelled(&self) -> bool {
        self.cancelled.load(Ordering::Acquire)
    }

    pub(crate) fn mark_started(&self, tick: Tick) {
        let _ = self.started.set(tick);
    }

    pub fn started(&self) -> Option<Tick> {
        self.started.get().copied()
    }

    /// Returns false if already resolved, in which case the new result is dropped
    pub(crate) fn resolve(&self, result: PathResult) -> bool {
        match &result {
            Ok(path) => {
                trace!("path found"; "request" => self.id, "cells" => path.len(), "cost" => path.cost())
            }
            Err(err) => debug!("path not found"; "request" => self.id, "reason" => %err),
        }

        let resolved = self.result.set(result).is_ok();
        if !resolved {
            warn!("request resolved more than once"; "request" => self.id);
        }
        resolved
    }

    pub fn result(&self) -> Option<&PathResult> {
        self.result.get()
    }

    pub fn is_resolved(&self) -> bool {
        self.result.get().is_some()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::helpers::MapBuilder;
    use crate::map::Edifice;

    fn pawn(map: MapId, position: Cell) -> PawnInfo {
        PawnInfo {
            id: PawnId(1),
            map,
            position,
            faction: Some(FactionId(1)),
            drafted: false,
            flying: false,
            lord: None,
        }
    }

    #[test]
    fn touch_excludes_impassable_target() {
        let map = MapBuilder::new(10, 10)
            .building(CellRect::single(Cell::new(5, 5)), Edifice::wall(100))
            .build();

        let request = PathRequest::builder(
            map.id(),
            Cell::new(0, 0),
            LocalTarget::Thing {
                thing: ThingId(1),
                rect: CellRect::single(Cell::new(5, 5)),
            },
        )
        .end_mode(PathEndMode::Touch)
        .build();

        let dest = request.validate(&map).expect("valid");
        assert_eq!(dest.rect, CellRect::new(Cell::new(4, 4), Cell::new(6, 6)));
        assert_eq!(dest.excluded.len(), 1);
        assert!(dest
            .excluded
            .contains(&map.indices().index_of(Cell::new(5, 5))));
    }

    #[test]
    fn validation_failures() {
        let map = MapBuilder::new(10, 10)
            .terrain(Cell::new(3, 3), crate::map::Terrain::chasm())
            .build();
        let id = map.id();

        let check = |request: Arc<PathRequest>| request.validate(&map).err();

        assert_eq!(
            check(PathRequest::builder(MapId(99), Cell::new(0, 0), Cell::new(1, 1)).build()),
            Some(RequestError::WrongMap {
                request: MapId(99),
                map: id
            })
        );
        assert_eq!(
            check(
                PathRequest::builder(id, Cell::new(0, 0), Cell::new(1, 1))
                    .pawn(pawn(MapId(5), Cell::new(0, 0)))
                    .build()
            ),
            Some(RequestError::PawnOnOtherMap {
                pawn: MapId(5),
                request: id
            })
        );
        assert_eq!(
            check(PathRequest::builder(id, Cell::new(-1, 0), Cell::new(1, 1)).build()),
            Some(RequestError::StartOutOfBounds(Cell::new(-1, 0)))
        );
        assert_eq!(
            check(PathRequest::builder(id, Cell::new(3, 3), Cell::new(1, 1)).build()),
            Some(RequestError::StartImpassable(Cell::new(3, 3)))
        );
        assert_eq!(
            check(PathRequest::builder(id, Cell::new(0, 0), Cell::new(50, 50)).build()),
            Some(RequestError::DestinationOutOfBounds(CellRect::single(
                Cell::new(50, 50)
            )))
        );
        assert_eq!(
            check(
                PathRequest::builder(id, Cell::new(0, 0), Cell::new(1, 1))
                    .exclude(vec![Cell::new(1, 1)])
                    .build()
            ),
            Some(RequestError::NoDestinationCells)
        );

        // the pawn is stuck there already
        assert_eq!(
            check(
                PathRequest::builder(id, Cell::new(3, 3), Cell::new(1, 1))
                    .pawn(pawn(id, Cell::new(3, 3)))
                    .build()
            ),
            None
        );
    }

    #[test]
    fn resolves_once() {
        let request = PathRequest::builder(MapId(0), Cell::new(0, 0), Cell::new(1, 1)).build();
        assert!(!request.is_resolved());
        assert!(request.resolve(Err(PathError::NoPath)));
        assert!(!request.resolve(Err(PathError::Overflow)));
        assert_eq!(request.result(), Some(&Err(PathError::NoPath)));
    }

    #[test]
    fn pawn_faction_fills_parms() {
        let request = PathRequest::builder(MapId(0), Cell::new(0, 0), Cell::new(1, 1))
            .pawn(pawn(MapId(0), Cell::new(0, 0)))
            .build();
        assert_eq!(request.parms().faction, Some(FactionId(1)));
    }

    #[test]
    fn expiry() {
        let request = PathRequest::builder(MapId(0), Cell::new(0, 0), Cell::new(1, 1))
            .deadline(Tick(10))
            .build();
        assert!(!request.is_expired(Tick(10)));
        assert!(request.is_expired(Tick(11)));
    }
}
