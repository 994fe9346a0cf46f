use misc::*;

/// Constants shared by every path search, read from config when it is loaded
#[derive(Debug, Clone, PartialEq)]
pub struct PathingSettings {
    pub cost_cardinal: u32,
    pub cost_diagonal: u32,
    pub heuristic_strength: f32,
    /// Fraction of a cardinal step a closed cell must improve by to be reopened
    pub reopen_tolerance: f32,
    pub area_penalty: u32,
    pub fog_penalty: u32,
    pub danger_penalty: u32,
    pub faction_blueprint_penalty: u32,
    pub avoid_grid_multiplier: u32,
    pub fence_bash_cost: u32,
    /// Glow below this counts as dark
    pub darkness_threshold: f32,
    pub region_size: u16,
    /// 0 for one per cpu
    pub worker_threads: usize,
    pub grid_chunk_size: usize,
}

impl Default for PathingSettings {
    fn default() -> Self {
        Self {
            cost_cardinal: 13,
            cost_diagonal: 18,
            heuristic_strength: 1.0,
            reopen_tolerance: 0.8,
            area_penalty: 600,
            fog_penalty: 600,
            danger_penalty: 800,
            faction_blueprint_penalty: 400,
            avoid_grid_multiplier: 8,
            fence_bash_cost: 60,
            darkness_threshold: 0.3,
            region_size: 12,
            worker_threads: 0,
            grid_chunk_size: 4096,
        }
    }
}

impl From<&config::Config> for PathingSettings {
    fn from(cfg: &config::Config) -> Self {
        let nav = &cfg.navigation;
        Self {
            cost_cardinal: nav.cost_cardinal,
            cost_diagonal: nav.cost_diagonal,
            heuristic_strength: nav.heuristic_strength,
            reopen_tolerance: nav.reopen_tolerance,
            area_penalty: nav.area_penalty,
            fog_penalty: nav.fog_penalty,
            danger_penalty: nav.danger_penalty,
            faction_blueprint_penalty: nav.faction_blueprint_penalty,
            avoid_grid_multiplier: nav.avoid_grid_multiplier,
            fence_bash_cost: nav.fence_bash_cost,
            darkness_threshold: nav.darkness_threshold,
            region_size: cfg.regions.region_size.max(1),
            worker_threads: cfg.scheduler.worker_threads,
            grid_chunk_size: cfg.scheduler.grid_chunk_size.max(1),
        }
    }
}

impl PathingSettings {
    /// From the global config if initialized, otherwise defaults
    pub fn from_config() -> Self {
        match config::try_get() {
            Some(cfg) => Self::from(&*cfg),
            None => {
                debug!("config not loaded, using default pathing settings");
                Self::default()
            }
        }
    }

    /// Minimum improvement in g cost for a closed cell to be reopened
    pub fn reopen_threshold(&self) -> u32 {
        (self.cost_cardinal as f32 * self.reopen_tolerance)
            .ceil()
            .max(0.0) as u32
    }

    pub fn worker_threads(&self) -> usize {
        match self.worker_threads {
            0 => num_cpus::get().max(1),
            n => n,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn reopen_threshold_rounds_up() {
        let settings = PathingSettings::default();
        // 13 * 0.8 = 10.4
        assert_eq!(settings.reopen_threshold(), 11);
    }

    #[test]
    fn defaults_match_shipped_config() {
        let cfg = config::ConfigType::String(include_str!("../../../config.ron"))
            .load()
            .expect("bad config");
        assert_eq!(PathingSettings::from(&cfg), PathingSettings::default());
    }
}
