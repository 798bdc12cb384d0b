//! Binary configuration loaded from TOML.
//!
//! ```toml
//! log_filter = "akh_chain=debug"
//! json = false
//! explain_depth = 8
//! ```

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::{ConfigError, ConfigResult};

fn default_log_filter() -> String {
    "warn".into()
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ChainConfig {
    /// `tracing` filter directive used when `RUST_LOG` is unset.
    pub log_filter: String,
    /// Print machine-readable JSON instead of text.
    pub json: bool,
    /// Maximum support depth shown by `explain`. `None` expands fully.
    pub explain_depth: Option<usize>,
}

impl Default for ChainConfig {
    fn default() -> Self {
        Self {
            log_filter: default_log_filter(),
            json: false,
            explain_depth: None,
        }
    }
}

impl ChainConfig {
    /// Load from a TOML file. Missing keys take their defaults.
    pub fn load(path: &Path) -> ConfigResult<Self> {
        let content = std::fs::read_to_string(path).map_err(|e| ConfigError::Read {
            path: path.display().to_string(),
            source: e,
        })?;
        Self::from_toml(&content).map_err(|e| match e {
            ConfigError::Parse { message, .. } => ConfigError::Parse {
                path: path.display().to_string(),
                message,
            },
            other => other,
        })
    }

    pub fn from_toml(content: &str) -> ConfigResult<Self> {
        toml::from_str(content).map_err(|e| ConfigError::Parse {
            path: "<inline>".into(),
            message: e.to_string(),
        })
    }

    /// Load `path` if given, otherwise use defaults.
    pub fn load_or_default(path: Option<&Path>) -> ConfigResult<Self> {
        match path {
            Some(path) => Self::load(path),
            None => Ok(Self::default()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_toml_uses_defaults() {
        assert_eq!(ChainConfig::from_toml("").unwrap(), ChainConfig::default());
    }

    #[test]
    fn partial_toml_overrides_given_keys() {
        let config = ChainConfig::from_toml("json = true\nexplain_depth = 3\n").unwrap();
        assert!(config.json);
        assert_eq!(config.explain_depth, Some(3));
        assert_eq!(config.log_filter, "warn");
    }

    #[test]
    fn invalid_toml_is_an_error() {
        let err = ChainConfig::from_toml("json = maybe").unwrap_err();
        assert!(matches!(err, ConfigError::Parse { .. }));
    }

    #[test]
    fn load_reads_file_and_reports_path() {
        let dir = tempfile::TempDir::new().unwrap();
        let path = dir.path().join("chain.toml");
        std::fs::write(&path, "log_filter = \"debug\"\n").unwrap();
        assert_eq!(ChainConfig::load(&path).unwrap().log_filter, "debug");

        std::fs::write(&path, "explain_depth = \"deep\"\n").unwrap();
        let ConfigError::Parse { path: reported, .. } = ChainConfig::load(&path).unwrap_err() else {
            panic!("expected a parse error");
        };
        assert!(reported.ends_with("chain.toml"));

        assert!(matches!(
            ChainConfig::load(&dir.path().join("missing.toml")),
            Err(ConfigError::Read { .. })
        ));
    }
}
