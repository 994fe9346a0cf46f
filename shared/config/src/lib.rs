pub use crate::config::*;
pub use load::{get, init, try_get, ConfigError, ConfigType};

mod config;
mod load;
