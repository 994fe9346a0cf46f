use std::borrow::Cow;
use std::ops::Deref;
use std::path::{Path, PathBuf};
use std::sync::mpsc::channel;
use std::sync::Arc;
use std::thread;
use std::time::Duration;

use arc_swap::{ArcSwap, Guard};
use notify::{watcher, DebouncedEvent, RecursiveMode, Watcher};
use once_cell::sync::OnceCell;

use misc::*;

use crate::config::Config;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config file: {0}")]
    Io(#[from] std::io::Error),

    #[error("Failed to parse config: {0}")]
    Parsing(#[from] ron::de::Error),

    #[error("Failed to watch config file: {0}")]
    Notify(#[from] notify::Error),

    #[error("Path is not a file")]
    NotAFile,

    #[error("Config has already been initialized")]
    AlreadyInitialized,
}

type ConfigResult<T> = Result<T, ConfigError>;

pub enum ConfigType<'a> {
    String(&'a str),
    WatchedFile(&'a Path),
}

static CONFIG: OnceCell<ArcSwap<Config>> = OnceCell::new();

/// Must be called once only, and before [get]
pub fn init(cfg: ConfigType) -> ConfigResult<()> {
    if CONFIG.get().is_some() {
        return Err(ConfigError::AlreadyInitialized);
    }

    // parse config and fail early
    let config = cfg.load()?;

    if let ConfigType::WatchedFile(path) = cfg {
        start_watcher(path)?;
    }

    CONFIG
        .set(ArcSwap::from_pointee(config))
        .map_err(|_| ConfigError::AlreadyInitialized)
}

/// Panics if [init] has not been called
pub fn get() -> impl Deref<Target = Config> {
    try_get().expect("config has not been initialized")
}

pub fn try_get() -> Option<impl Deref<Target = Config>> {
    CONFIG.get().map(|cfg| Guard::into_inner(cfg.load()))
}

fn start_watcher(path: &Path) -> ConfigResult<()> {
    let path = path.to_owned();
    let watch_dir = path.parent().ok_or(ConfigError::NotAFile)?.to_owned();
    let watch_file = path.file_name().ok_or(ConfigError::NotAFile)?.to_owned();

    let (tx, rx) = channel();
    let mut watcher = watcher(tx, Duration::from_secs(1))?;
    watcher.watch(&watch_dir, RecursiveMode::NonRecursive)?;

    thread::Builder::new()
        .name("cfg-watcher".to_owned())
        .spawn(move || {
            let _watcher = watcher; // keep alive
            let is_config = |p: &PathBuf| p.file_name().map(|f| f == watch_file).unwrap_or(false);

            loop {
                let reload = match rx.recv() {
                    Ok(e) => match e {
                        DebouncedEvent::Write(ref p) if is_config(p) => true,
                        DebouncedEvent::Remove(ref p) if is_config(p) => {
                            warn!("config was deleted");
                            true
                        }
                        DebouncedEvent::Rename(ref a, ref b) if is_config(a) || is_config(b) => {
                            warn!("config was renamed");
                            true
                        }
                        _ => false,
                    },
                    Err(_) => {
                        debug!("config watcher channel closed");
                        break;
                    }
                };

                if reload {
                    info!("config was modified, reloading");
                    reload_from(&path);
                }
            }
        })?;

    Ok(())
}

fn reload_from(path: &Path) {
    let cfg = match CONFIG.get() {
        Some(cfg) => cfg,
        None => {
            // watcher started before the initial config was stored
            warn!("config reload before initialization, ignoring");
            return;
        }
    };

    match ConfigType::WatchedFile(path).load() {
        Ok(config) => {
            let new = Arc::new(config);
            let new_ptr = Arc::as_ptr(&new);

            let old = cfg.swap(new);
            let old_ptr = Arc::as_ptr(&old);

            debug!("swapped config instance"; "new" => ?new_ptr, "old" => ?old_ptr);
        }
        Err(e) => {
            warn!("failed to reload config"; "error" => %e);
        }
    }
}

impl<'a> ConfigType<'a> {
    /// Parses without installing as the global config
    pub fn load(&self) -> ConfigResult<Config> {
        let bytes = match self {
            ConfigType::String(s) => Cow::Borrowed(*s),
            ConfigType::WatchedFile(path) => {
                if !path.is_file() {
                    return Err(ConfigError::NotAFile);
                }
                let contents = std::fs::read_to_string(*path)?;
                Cow::Owned(contents)
            }
        };

        Ok(ron::de::from_str(&bytes)?)
    }
}
