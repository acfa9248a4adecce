use crate::catalog::{self, CatalogError};
use crate::models::SharedWorkout;
use dirs_next as dirs;
use std::path::{Path, PathBuf};

pub const DATA_DIR_ENV: &str = "LEAN_TIMER_DATA_DIR";
const APP_DIR: &str = "lean-timer";
const FALLBACK_DIR: &str = ".lean-timer";

/// Where the app keeps its files and which catalog it runs.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AppConfig {
    pub data_dir: PathBuf,
    pub catalog: Option<PathBuf>,
}

impl AppConfig {
    /// Resolve against the process environment and the platform data dir.
    pub fn from_env(data_dir: Option<PathBuf>, catalog: Option<PathBuf>) -> Self {
        let env_dir = std::env::var_os(DATA_DIR_ENV).map(PathBuf::from);
        Self {
            data_dir: resolve_data_dir(data_dir, env_dir, dirs::data_dir()),
            catalog,
        }
    }

    pub fn load_catalog(&self) -> Result<Vec<SharedWorkout>, CatalogError> {
        match &self.catalog {
            Some(path) => {
                log::info!("Loading catalog from {}", path.display());
                catalog::load_file(path)
            }
            None => Ok(catalog::built_in()),
        }
    }

    pub fn data_dir(&self) -> &Path {
        &self.data_dir
    }
}

/// Flag beats environment beats platform directory beats the working
/// directory. Empty values count as unset.
pub fn resolve_data_dir(
    flag: Option<PathBuf>,
    env: Option<PathBuf>,
    platform: Option<PathBuf>,
) -> PathBuf {
    let non_empty = |path: &PathBuf| !path.as_os_str().is_empty();
    flag.filter(non_empty)
        .or_else(|| env.filter(non_empty))
        .or_else(|| platform.map(|dir| dir.join(APP_DIR)))
        .unwrap_or_else(|| PathBuf::from(FALLBACK_DIR))
}
