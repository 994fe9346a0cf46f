//! Grid path finding over a 2D cell map. Per-cell costs are kept up to date incrementally
//! from map events, combined per traverser into a cost grid, then searched with A*.

pub use self::connection::CellConnections;
pub use self::finder::{PathFinder, TickSummary};
pub use self::grid_job::{GridJobParams, PathGridJob};
pub use self::map_data::{PathFinderMapData, StructureChanges};
pub use self::path::PawnPath;
pub use self::request::{
    CustomCostProvider, Destination, LocalTarget, PathEndMode, PathError, PathFinderCostTuning,
    PathRequest, PathRequestBuilder, PathResult, PawnId, PawnInfo, RequestError, RequestId,
};
pub use self::search::{PathFinderJob, SearchContext, SearchOutcome};
pub use self::settings::PathingSettings;
pub use self::traverse::{Danger, TraverseMode, TraverseParms};
pub use self::utility::{can_destroy, can_open, door_bash_cost, door_cost, wall_bash_cost, DoorInfo};

mod connection;
pub mod cost;
mod finder;
mod grid_job;
#[cfg(any(test, feature = "benchmarking"))]
pub mod helpers;
pub mod map;
mod map_data;
mod path;
pub mod region;
mod request;
mod search;
mod settings;
mod traverse;
mod utility;

/// Cost at or above which a cell can't be entered
pub const IMPASSABLE: u32 = 10_000;
