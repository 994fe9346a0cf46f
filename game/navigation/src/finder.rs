//! Per-map scheduler: queues requests, then resolves them all in batches once per tick

use std::sync::Arc;

use ahash::AHashMap;
use grid::CellGrid;
use misc::*;
use unit::Tick;

use crate::grid_job::PathGridJob;
use crate::map::{AreaId, LordId, Map};
use crate::map_data::PathFinderMapData;
use crate::region::RegionGrid;
use crate::request::{Destination, PathError, PathRequest, PathResult};
use crate::search::{PathFinderJob, SearchContext, SearchOutcome};
use crate::settings::PathingSettings;
use crate::traverse::TraverseParms;

/// Requests with equal keys read identical cost grids
#[derive(Debug, PartialEq, Eq, Hash)]
struct GridKey {
    parms: TraverseParms,
    drafted: bool,
    flying: bool,
    area: Option<AreaId>,
    lord: Option<LordId>,
    tuning: [u32; 7],
    /// Identity of the custom cost provider
    custom: Option<usize>,
}

impl GridKey {
    fn of(request: &PathRequest) -> Self {
        Self {
            parms: *request.parms(),
            drafted: request.is_drafted(),
            flying: request.is_flying(),
            area: request.area(),
            lord: request.pawn().and_then(|p| p.lord),
            tuning: request.tuning().key(),
            custom: request
                .custom_costs()
                .map(|c| Arc::as_ptr(c) as *const () as usize),
        }
    }
}

#[derive(Debug, Default, Copy, Clone, PartialEq, Eq)]
pub struct TickSummary {
    /// Requests resolved, found or not
    pub resolved: usize,
    /// Cost grids computed
    pub grids: usize,
    pub searches: usize,
}

struct Pending {
    request: Arc<PathRequest>,
    destination: Destination,
}

struct SearchJob<'a> {
    pending: &'a Pending,
    grid: usize,
}

pub struct PathFinder {
    data: PathFinderMapData,
    regions: RegionGrid,
    pending: Vec<Pending>,
    /// One per worker, kept between ticks
    contexts: Vec<SearchContext>,
}

impl PathFinder {
    pub fn new(map: &mut Map, settings: PathingSettings) -> Self {
        let regions = RegionGrid::new(map, settings.region_size);
        Self {
            data: PathFinderMapData::new(map, settings),
            regions,
            pending: Vec::new(),
            contexts: Vec::new(),
        }
    }

    pub fn map_data(&self) -> &PathFinderMapData {
        &self.data
    }

    pub fn map_data_mut(&mut self) -> &mut PathFinderMapData {
        &mut self.data
    }

    pub fn regions(&self) -> &RegionGrid {
        &self.regions
    }

    pub fn pending_count(&self) -> usize {
        self.pending.len()
    }

    /// Validates and queues the request until the next tick. An invalid request is resolved
    /// immediately and false returned
    pub fn queue(&mut self, map: &Map, request: Arc<PathRequest>) -> bool {
        if request.is_resolved() {
            warn!("ignoring already resolved request"; "request" => request.id());
            return false;
        }

        match request.validate(map) {
            Ok(destination) => {
                trace!("queued path request";
                    "request" => request.id(),
                    "start" => request.start(),
                    "destination" => destination.rect
                );
                self.pending.push(Pending {
                    request,
                    destination,
                });
                true
            }
            Err(err) => {
                debug!("rejected path request"; "request" => request.id(), "reason" => %err);
                request.resolve(Err(err.into()));
                false
            }
        }
    }

    /// Resolves every pending request
    pub fn tick(&mut self, map: &Map, tick: Tick) -> TickSummary {
        let mut summary = TickSummary::default();
        let mut live = Vec::with_capacity(self.pending.len());

        for pending in std::mem::take(&mut self.pending) {
            let request = &pending.request;
            if request.is_cancelled() {
                summary.resolved += request.resolve(Err(PathError::Cancelled)) as usize;
            } else if request.is_expired(tick) {
                let deadline = request.deadline().unwrap_or(tick);
                summary.resolved += request.resolve(Err(PathError::TimedOut(deadline))) as usize;
            } else {
                live.push(pending);
            }
        }

        self.process(map, tick, &live, &mut summary);

        debug!("path finder tick";
            "tick" => tick,
            "resolved" => summary.resolved,
            "grids" => summary.grids,
            "searches" => summary.searches
        );
        summary
    }

    /// Resolves a single request straight away, ignoring the queue
    pub fn find_path_now(&mut self, map: &Map, request: Arc<PathRequest>, tick: Tick) -> PathResult {
        match request.validate(map) {
            Ok(destination) => {
                let pending = [Pending {
                    request: request.clone(),
                    destination,
                }];
                self.process(map, tick, &pending, &mut TickSummary::default());
            }
            Err(err) => {
                request.resolve(Err(err.into()));
            }
        }

        request
            .result()
            .cloned()
            .unwrap_or(Err(PathError::NoPath))
    }

    fn process(&mut self, map: &Map, tick: Tick, batch: &[Pending], summary: &mut TickSummary) {
        let requests = batch.iter().map(|p| p.request.clone()).collect_vec();

        // always gathered, even without requests, so events don't pile up
        self.data.gather_data(map, tick, &requests);
        self.data.prepare_requests(map, &requests);

        let structure = self.data.take_structure_changes();
        for rect in structure.dirty {
            self.regions.mark_dirty(rect);
        }
        self.regions.rebuild_dirty(map);
        for cell in structure.roofs {
            self.regions.roof_changed(cell);
        }

        // reachability precheck and grouping
        let mut keys = AHashMap::new();
        let mut representatives: Vec<&PathRequest> = Vec::new();
        let mut jobs = Vec::with_capacity(batch.len());
        for pending in batch {
            let request = &pending.request;
            request.mark_started(tick);

            let reachable = self.regions.can_reach(
                request.start(),
                pending.destination.rect,
                request,
                self.data.buildings(),
                map.factions(),
            );
            if !reachable {
                summary.resolved += request.resolve(Err(PathError::NoPath)) as usize;
                continue;
            }

            let grid = *keys.entry(GridKey::of(request)).or_insert_with(|| {
                representatives.push(request);
                representatives.len() - 1
            });
            jobs.push(SearchJob { pending, grid });
        }

        if jobs.is_empty() {
            return;
        }

        let threads = self.data.settings().worker_threads();
        let data = &self.data;
        let grids = representatives
            .iter()
            .map(|request| PathGridJob::new(data.parameterize_grid_job(map, request)).run(threads))
            .collect_vec();
        summary.grids += grids.len();

        let workers = threads.min(jobs.len()).max(1);
        if self.contexts.len() < workers {
            self.contexts.resize_with(workers, SearchContext::new);
        }

        let results = search_all(data, &grids, &jobs, &mut self.contexts[..workers]);
        summary.searches += jobs.len();

        for (request, result) in results {
            // cancelled mid-search
            let result = if request.is_cancelled() {
                Err(PathError::Cancelled)
            } else {
                result
            };
            summary.resolved += request.resolve(result) as usize;
        }
    }
}

/// Splits the jobs evenly between workers, each with its own context
fn search_all<'a>(
    data: &PathFinderMapData,
    grids: &[CellGrid<u32>],
    jobs: &'a [SearchJob<'a>],
    contexts: &mut [SearchContext],
) -> Vec<(&'a PathRequest, PathResult)> {
    let per_worker = (jobs.len() + contexts.len() - 1) / contexts.len();

    let result = crossbeam::scope(|scope| {
        let handles = contexts
            .iter_mut()
            .zip(jobs.chunks(per_worker))
            .map(|(ctx, chunk)| {
                scope.spawn(move |_| {
                    chunk
                        .iter()
                        .map(|job| {
                            let request: &PathRequest = &job.pending.request;
                            if request.is_cancelled() {
                                return (request, Err(PathError::Cancelled));
                            }

                            let search = PathFinderJob::new(data, &grids[job.grid], request.parms());
                            let outcome =
                                search.search(request.start(), &job.pending.destination, ctx);
                            let result = match outcome {
                                SearchOutcome::Found(path) => Ok(path),
                                SearchOutcome::NotFound => Err(PathError::NoPath),
                                SearchOutcome::Overflow => Err(PathError::Overflow),
                            };
                            (request, result)
                        })
                        .collect_vec()
                })
            })
            .collect_vec();

        handles
            .into_iter()
            .flat_map(|handle| {
                handle
                    .join()
                    .unwrap_or_else(|panic| std::panic::resume_unwind(panic))
            })
            .collect_vec()
    });

    match result {
        Ok(results) => results,
        Err(panic) => std::panic::resume_unwind(panic),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::helpers::MapBuilder;
    use crate::map::{Edifice, MapId};
    use crate::request::RequestError;
    use unit::map::{Cell, CellRect};

    fn finder(map: &mut Map) -> PathFinder {
        let settings = PathingSettings {
            worker_threads: 2,
            ..PathingSettings::default()
        };
        PathFinder::new(map, settings)
    }

    fn request(start: Cell, end: Cell) -> Arc<PathRequest> {
        PathRequest::builder(MapId(0), start, end).build()
    }

    #[test]
    fn queued_requests_share_grids() {
        misc::logging::for_tests();
        let mut map = MapBuilder::new(10, 10).build();
        let mut finder = finder(&mut map);

        let a = request(Cell::new(0, 0), Cell::new(9, 9));
        let b = request(Cell::new(9, 0), Cell::new(0, 9));
        let c = request(Cell::new(5, 5), Cell::new(5, 6));
        for req in [&a, &b, &c] {
            assert!(finder.queue(&map, req.clone()));
        }
        assert_eq!(finder.pending_count(), 3);

        let summary = finder.tick(&map, Tick(1));
        assert_eq!(
            summary,
            TickSummary {
                resolved: 3,
                grids: 1,
                searches: 3
            }
        );
        assert_eq!(finder.pending_count(), 0);

        let path = a.result().expect("resolved").as_ref().expect("found");
        assert_eq!(path.cost(), 9 * 18);
        assert_eq!(a.started(), Some(Tick(1)));
        assert!(b.result().expect("resolved").is_ok());
        assert_eq!(
            c.result().expect("resolved").as_ref().map(|p| p.len()),
            Ok(2)
        );
    }

    #[test]
    fn invalid_requests_are_rejected_up_front() {
        misc::logging::for_tests();
        let mut map = MapBuilder::new(4, 4).build();
        let mut finder = finder(&mut map);

        let wrong_map = PathRequest::builder(MapId(3), Cell::new(0, 0), Cell::new(1, 1)).build();
        assert!(!finder.queue(&map, wrong_map.clone()));
        assert_eq!(
            wrong_map.result(),
            Some(&Err(PathError::Rejected(RequestError::WrongMap {
                request: MapId(3),
                map: MapId(0),
            })))
        );

        let off_map = request(Cell::new(-1, 0), Cell::new(1, 1));
        assert!(!finder.queue(&map, off_map.clone()));
        assert!(off_map.is_resolved());
        assert_eq!(finder.pending_count(), 0);

        // already resolved
        assert!(!finder.queue(&map, off_map));
    }

    #[test]
    fn cancelled_and_expired() {
        let mut map = MapBuilder::new(6, 6).build();
        let mut finder = finder(&mut map);

        let cancelled = request(Cell::new(0, 0), Cell::new(5, 5));
        let expired = PathRequest::builder(MapId(0), Cell::new(0, 0), Cell::new(5, 5))
            .deadline(Tick(4))
            .build();
        let in_time = PathRequest::builder(MapId(0), Cell::new(0, 0), Cell::new(5, 5))
            .deadline(Tick(5))
            .build();
        for req in [&cancelled, &expired, &in_time] {
            finder.queue(&map, req.clone());
        }

        cancelled.cancel();
        let summary = finder.tick(&map, Tick(5));
        assert_eq!(summary.resolved, 3);
        assert_eq!(summary.searches, 1);

        assert_eq!(cancelled.result(), Some(&Err(PathError::Cancelled)));
        assert_eq!(expired.result(), Some(&Err(PathError::TimedOut(Tick(4)))));
        assert!(in_time.result().expect("resolved").is_ok());
    }

    #[test]
    fn unreachable_skips_search() {
        let mut map = MapBuilder::from_ascii(
            "
            ..R..
            ..R..
            ",
        )
        .build();
        let mut finder = finder(&mut map);

        let req = request(Cell::new(0, 0), Cell::new(4, 1));
        finder.queue(&map, req.clone());
        let summary = finder.tick(&map, Tick(1));
        assert_eq!(summary.searches, 0);
        assert_eq!(req.result(), Some(&Err(PathError::NoPath)));
    }

    #[test]
    fn follows_map_changes() {
        let mut map = MapBuilder::new(8, 8).build();
        let mut finder = finder(&mut map);

        let first = finder.find_path_now(&map, request(Cell::new(0, 3), Cell::new(7, 3)), Tick(1));
        assert_eq!(first.map(|p| p.cost()), Ok(7 * 13));

        // wall off everything but the top row
        map.spawn_building(
            CellRect::new(Cell::new(4, 0), Cell::new(4, 6)),
            Edifice::wall(300),
        );
        let second = finder
            .find_path_now(&map, request(Cell::new(0, 3), Cell::new(7, 3)), Tick(2))
            .expect("path over the top");
        assert!(second.nodes().contains(&Cell::new(4, 7)));
        assert!(second.is_contiguous());

        // and now entirely
        map.spawn_building(CellRect::single(Cell::new(4, 7)), Edifice::wall(300));
        let third = finder.find_path_now(&map, request(Cell::new(0, 3), Cell::new(7, 3)), Tick(3));
        assert_eq!(third, Err(PathError::NoPath));
        assert!(finder.regions().room_at(Cell::new(0, 0)).is_some());
    }

    #[test]
    fn same_tick_requests_see_their_area() {
        use crate::map::AreaId;

        let mut map = MapBuilder::new(6, 6).area(AreaId(2), Cell::new(0, 0)).build();
        let mut finder = finder(&mut map);
        finder.tick(&map, Tick(1));

        // gathered already this tick, but the area still has to be snapshotted
        let req = PathRequest::builder(MapId(0), Cell::new(0, 0), Cell::new(1, 0))
            .area(AreaId(2))
            .build();
        let path = finder
            .find_path_now(&map, req, Tick(1))
            .expect("found");
        assert_eq!(path.cost(), 13 + 600);
    }
}
