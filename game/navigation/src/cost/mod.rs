//! Per-cell cost and flag arrays, each maintained by one source and kept up to date with
//! map changes

use std::sync::Arc;

use grid::BitGrid;

use crate::map::Map;
use crate::request::PathRequest;
use crate::settings::PathingSettings;

pub use area::AreaSource;
pub use building::BuildingSource;
pub use danger::{DarknessDangerSource, PersistentDangerSource};
pub use faction::FactionSource;
pub use flags::{FenceSource, FogSource, WaterSource};
pub use path_cost::PathCostSource;
pub use perceptual::PerceptualSource;

mod area;
mod building;
mod danger;
mod faction;
mod flags;
mod path_cost;
mod perceptual;

/// What a source can see while computing
#[derive(Copy, Clone)]
pub struct SourceContext<'a> {
    pub map: &'a Map,
    /// Requests pending this tick, for sources that only compute what is asked for
    pub requests: &'a [Arc<PathRequest>],
    pub settings: &'a PathingSettings,
}

/// One input to the per-request cost grid. Each source owns its arrays exclusively so all
/// sources can be updated in parallel
pub trait PathFinderDataSource: Send + Sync {
    /// Unique among the sources of a map
    fn name(&self) -> &'static str;

    /// Recomputes every cell
    fn compute_all(&mut self, ctx: &SourceContext);

    /// Recomputes only the given cell indices. Returns true if anything changed
    fn update_incrementally(&mut self, ctx: &SourceContext, changed: &[usize]) -> bool;

    /// Added to the cost of the cell for every request. Built-in sources are instead read
    /// selectively by the grid job
    fn cell_cost(&self, _idx: usize) -> u32 {
        0
    }
}

/// Sets each changed bit to `pred(idx)`, returning whether any flipped
pub(crate) fn update_bits(
    bits: &mut BitGrid,
    changed: impl IntoIterator<Item = usize>,
    mut pred: impl FnMut(usize) -> bool,
) -> bool {
    let mut any = false;
    for idx in changed {
        any |= bits.set(idx, pred(idx));
    }
    any
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;

    /// Runs `mutate` on the map then checks an incremental update over the returned cells
    /// ends up identical to a fresh full computation
    pub fn check_incremental<S: PathFinderDataSource + PartialEq + std::fmt::Debug>(
        map: &mut Map,
        requests: &[Arc<PathRequest>],
        mut new_source: impl FnMut(&Map) -> S,
        mutate: impl FnOnce(&mut Map) -> Vec<usize>,
    ) {
        let settings = PathingSettings::default();
        let mut incremental = new_source(&*map);
        incremental.compute_all(&SourceContext {
            map: &*map,
            requests,
            settings: &settings,
        });

        let changed = mutate(map);
        let ctx = SourceContext {
            map: &*map,
            requests,
            settings: &settings,
        };
        assert!(
            incremental.update_incrementally(&ctx, &changed),
            "{} should report a change",
            incremental.name()
        );

        let mut full = new_source(&*map);
        full.compute_all(&ctx);
        assert_eq!(incremental, full);

        // nothing left to change
        assert!(!incremental.update_incrementally(&ctx, &changed));
    }
}
