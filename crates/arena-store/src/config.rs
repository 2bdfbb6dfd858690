use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Connection settings for the persistent store, passed to the backend
/// constructor.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StoreConfig {
    #[serde(default = "default_path")]
    pub path: PathBuf,
    #[serde(default = "default_create_if_missing")]
    pub create_if_missing: bool,
}

fn default_path() -> PathBuf {
    PathBuf::from("./arena-db")
}

fn default_create_if_missing() -> bool {
    true
}

impl Default for StoreConfig {
    fn default() -> Self {
        StoreConfig {
            path: default_path(),
            create_if_missing: default_create_if_missing(),
        }
    }
}

impl StoreConfig {
    pub fn at(path: impl Into<PathBuf>) -> Self {
        StoreConfig {
            path: path.into(),
            ..StoreConfig::default()
        }
    }
}
