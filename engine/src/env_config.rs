//! Environment configuration for the IAT server.
//!
//! | Variable | Default | Meaning |
//! |----------|---------|---------|
//! | `IAT_BASE_PATH` | `.` | Working directory; relative paths resolve against it |
//! | `IAT_PORT` | `9000` | HTTP port |
//! | `IAT_RESULTS_PATH` | `data/iat_results.csv` | Result log |
//! | `IAT_SEED` | unset | Fixed RNG seed for reproducible trial orders |
//! | `IAT_CATALOG_PATH` | unset | JSON word catalog replacing the built-in one |
//! | `IAT_LEFT_KEY` / `IAT_RIGHT_KEY` | `e` / `i` | Keys bound to the two sides |
//!
//! Unset variables fall back to their defaults; set but malformed ones are a
//! [`ConfigError`].

use std::path::PathBuf;

use crate::catalog::Catalog;
use crate::constants::{DEFAULT_LEFT_KEY, DEFAULT_PORT, DEFAULT_RESULTS_PATH, DEFAULT_RIGHT_KEY};
use crate::error::ConfigError;
use crate::presentation::KeyBindings;

/// Resolved server configuration.
#[derive(Clone, Debug)]
pub struct Config {
    pub base_path: PathBuf,
    pub port: u16,
    pub results_path: PathBuf,
    pub seed: Option<u64>,
    pub catalog_path: Option<PathBuf>,
    pub keys: KeyBindings,
}

impl Config {
    /// Read configuration from the process environment.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|var| std::env::var(var).ok())
    }

    /// Read configuration through `lookup` (variable name → value).
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let base_path = PathBuf::from(lookup("IAT_BASE_PATH").unwrap_or_else(|| ".".to_string()));

        let port = match lookup("IAT_PORT") {
            Some(v) => v.trim().parse::<u16>().map_err(|_| ConfigError::InvalidEnv {
                var: "IAT_PORT",
                value: v,
            })?,
            None => DEFAULT_PORT,
        };

        let results_path = PathBuf::from(
            lookup("IAT_RESULTS_PATH").unwrap_or_else(|| DEFAULT_RESULTS_PATH.to_string()),
        );

        let seed = match lookup("IAT_SEED") {
            Some(v) => Some(v.trim().parse::<u64>().map_err(|_| ConfigError::InvalidEnv {
                var: "IAT_SEED",
                value: v,
            })?),
            None => None,
        };

        let catalog_path = lookup("IAT_CATALOG_PATH").map(PathBuf::from);

        let keys = KeyBindings::new(
            &lookup("IAT_LEFT_KEY").unwrap_or_else(|| DEFAULT_LEFT_KEY.to_string()),
            &lookup("IAT_RIGHT_KEY").unwrap_or_else(|| DEFAULT_RIGHT_KEY.to_string()),
        )?;

        Ok(Self {
            base_path,
            port,
            results_path,
            seed,
            catalog_path,
            keys,
        })
    }

    /// The built-in catalog, or the one at `catalog_path`.
    pub fn load_catalog(&self) -> Result<Catalog, ConfigError> {
        match &self.catalog_path {
            Some(path) => Catalog::from_json_file(path),
            None => Ok(Catalog::default()),
        }
    }
}

/// Change into `base_path`. Returns the resulting working directory.
pub fn init_base_path(config: &Config) -> Result<PathBuf, ConfigError> {
    let invalid = || ConfigError::InvalidEnv {
        var: "IAT_BASE_PATH",
        value: config.base_path.display().to_string(),
    };
    std::env::set_current_dir(&config.base_path).map_err(|_| invalid())?;
    let cwd = std::env::current_dir().map_err(|_| invalid())?;
    tracing::info!(path = %cwd.display(), "working directory");
    Ok(cwd)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    use crate::types::Side;

    fn lookup(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |k: &str| map.get(k).cloned()
    }

    #[test]
    fn test_defaults() {
        let c = Config::from_lookup(lookup(&[])).unwrap();
        assert_eq!(c.port, 9000);
        assert_eq!(c.results_path, PathBuf::from("data/iat_results.csv"));
        assert_eq!(c.seed, None);
        assert!(c.catalog_path.is_none());
        assert_eq!(c.keys, KeyBindings::default());
        assert_eq!(c.load_catalog().unwrap().len(), 40);
    }

    #[test]
    fn test_overrides() {
        let c = Config::from_lookup(lookup(&[
            ("IAT_PORT", "8123"),
            ("IAT_SEED", "77"),
            ("IAT_RESULTS_PATH", "/tmp/out.csv"),
            ("IAT_LEFT_KEY", "a"),
            ("IAT_RIGHT_KEY", "l"),
        ]))
        .unwrap();
        assert_eq!(c.port, 8123);
        assert_eq!(c.seed, Some(77));
        assert_eq!(c.results_path, PathBuf::from("/tmp/out.csv"));
        assert_eq!(c.keys.side_for("l"), Some(Side::Right));
    }

    #[test]
    fn test_malformed_values() {
        let err = Config::from_lookup(lookup(&[("IAT_PORT", "http")])).unwrap_err();
        assert!(matches!(err, ConfigError::InvalidEnv { var: "IAT_PORT", .. }));
        let err = Config::from_lookup(lookup(&[("IAT_SEED", "-4")])).unwrap_err();
        assert!(matches!(err, ConfigError::InvalidEnv { var: "IAT_SEED", .. }));
        let err = Config::from_lookup(lookup(&[("IAT_LEFT_KEY", "i")])).unwrap_err();
        assert!(matches!(err, ConfigError::InvalidKeyBindings { .. }));
    }

    #[test]
    fn test_missing_catalog_file() {
        let c = Config::from_lookup(lookup(&[("IAT_CATALOG_PATH", "/nonexistent/iat.json")]))
            .unwrap();
        assert!(matches!(c.load_catalog(), Err(ConfigError::CatalogIo { .. })));
    }
}
