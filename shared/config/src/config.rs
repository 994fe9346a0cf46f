use serde::Deserialize;

#[derive(Deserialize, Clone, Debug)]
pub struct Config {
    pub navigation: Navigation,
    pub regions: Regions,
    pub scheduler: Scheduler,
}

#[derive(Deserialize, Clone, Debug)]
pub struct Navigation {
    /// Cost of an orthogonal step
    pub cost_cardinal: u32,
    /// Cost of a diagonal step
    pub cost_diagonal: u32,
    /// Multiplier on the octile heuristic, >1 trades optimality for speed
    pub heuristic_strength: f32,
    /// A closed cell is only reopened if the new cost beats the old by more than
    /// `ceil(cost_cardinal * reopen_tolerance)`
    pub reopen_tolerance: f32,

    pub area_penalty: u32,
    pub fog_penalty: u32,
    pub danger_penalty: u32,
    pub faction_blueprint_penalty: u32,
    pub avoid_grid_multiplier: u32,
    pub fence_bash_cost: u32,

    /// Glow below this is dark
    pub darkness_threshold: f32,
}

#[derive(Deserialize, Clone, Debug)]
pub struct Regions {
    /// Regions never span more than this many cells along either axis
    pub region_size: u16,
}

#[derive(Deserialize, Clone, Debug)]
pub struct Scheduler {
    /// 0 to use one per cpu
    pub worker_threads: usize,
    /// Cells per task when folding per-query cost grids
    pub grid_chunk_size: usize,
}
