use arena_store::StoreConfig;
use config::{Config, ConfigError, Environment, File};
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Runtime settings, layered: `arena.toml` (or an explicit file), then
/// `ARENA_*` environment variables with `__` between nested keys
/// (e.g. `ARENA_STORE__PATH`, `ARENA_RECONCILE__STRICT_CURSOR`).
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct AppConfig {
    #[serde(default)]
    pub store: StoreConfig,
    #[serde(default)]
    pub reconcile: ReconcileSettings,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, Default)]
pub struct ReconcileSettings {
    /// Reject a season whose cursor matches no round instead of regenerating it.
    #[serde(default)]
    pub strict_cursor: bool,
}

impl AppConfig {
    pub fn load(path: Option<&Path>) -> Result<Self, ConfigError> {
        let file = match path {
            Some(path) => File::from(path).required(true),
            None => File::with_name("arena").required(false),
        };
        let settings = Config::builder()
            .add_source(file)
            .add_source(
                Environment::with_prefix("ARENA")
                    .prefix_separator("_")
                    .separator("__"),
            )
            .build()?;
        settings.try_deserialize()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_defaults_without_sources() {
        let config = AppConfig::default();
        assert_eq!(config.store.path, std::path::PathBuf::from("./arena-db"));
        assert!(config.store.create_if_missing);
        assert!(!config.reconcile.strict_cursor);
    }

    #[test]
    fn test_load_from_explicit_file() {
        let mut file = tempfile::Builder::new().suffix(".toml").tempfile().unwrap();
        writeln!(
            file,
            "[store]\npath = \"/var/lib/arena\"\n\n[reconcile]\nstrict_cursor = true"
        )
        .unwrap();

        let config = AppConfig::load(Some(file.path())).unwrap();
        assert_eq!(config.store.path, std::path::PathBuf::from("/var/lib/arena"));
        assert!(config.store.create_if_missing);
        assert!(config.reconcile.strict_cursor);
    }

    #[test]
    fn test_missing_explicit_file_is_error() {
        let result = AppConfig::load(Some(Path::new("/nonexistent/arena.toml")));
        assert!(result.is_err());
    }
}
