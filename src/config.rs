//! Command-line configuration, persisted as TOML.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::ConfigError;

pub type ConfigResult<T> = std::result::Result<T, ConfigError>;

/// How the CLI prints statistics.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum OutputFormat {
    #[default]
    Table,
    Json,
}

/// Settings for the `reldata` binary.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReldataConfig {
    /// Directory scanned for knowledge graphs.
    #[serde(default = "default_input_dir")]
    pub input_dir: PathBuf,
    /// Restrict processing to one graph.
    #[serde(default)]
    pub base_name: Option<String>,
    /// Enforce unique individual names per context.
    #[serde(default = "default_true")]
    pub check_names: bool,
    /// Read several graphs at once on the rayon pool.
    #[serde(default = "default_true")]
    pub parallel: bool,
    #[serde(default)]
    pub output: OutputFormat,
}

fn default_input_dir() -> PathBuf {
    PathBuf::from(".")
}

fn default_true() -> bool {
    true
}

impl Default for ReldataConfig {
    fn default() -> Self {
        Self {
            input_dir: default_input_dir(),
            base_name: None,
            check_names: true,
            parallel: true,
            output: OutputFormat::Table,
        }
    }
}

impl ReldataConfig {
    /// Load from a TOML file. Missing fields take their defaults.
    pub fn load(path: &Path) -> ConfigResult<Self> {
        let content = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        toml::from_str(&content).map_err(|e| ConfigError::Parse {
            path: path.to_path_buf(),
            message: e.to_string(),
        })
    }

    /// Save to a TOML file, creating parent directories.
    pub fn save(&self, path: &Path) -> ConfigResult<()> {
        let content = toml::to_string_pretty(self).map_err(|e| ConfigError::Parse {
            path: path.to_path_buf(),
            message: e.to_string(),
        })?;
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent).map_err(|source| ConfigError::Write {
                path: parent.to_path_buf(),
                source,
            })?;
        }
        std::fs::write(path, content).map_err(|source| ConfigError::Write {
            path: path.to_path_buf(),
            source,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_file_yields_defaults() {
        let config: ReldataConfig = toml::from_str("").unwrap();
        assert_eq!(config, ReldataConfig::default());
    }

    #[test]
    fn save_and_load() {
        let dir = tempfile::TempDir::new().unwrap();
        let path = dir.path().join("nested").join("reldata.toml");
        let config = ReldataConfig {
            input_dir: PathBuf::from("/data/kgs"),
            base_name: Some("train".into()),
            check_names: false,
            parallel: false,
            output: OutputFormat::Json,
        };
        config.save(&path).unwrap();

        let text = std::fs::read_to_string(&path).unwrap();
        assert!(text.contains("output = \"json\""));
        assert_eq!(ReldataConfig::load(&path).unwrap(), config);
    }

    #[test]
    fn bad_toml_is_a_parse_error() {
        let dir = tempfile::TempDir::new().unwrap();
        let path = dir.path().join("reldata.toml");
        std::fs::write(&path, "parallel = \"sometimes\"").unwrap();
        assert!(matches!(ReldataConfig::load(&path), Err(ConfigError::Parse { .. })));
    }

    #[test]
    fn missing_file_is_a_read_error() {
        let err = ReldataConfig::load(Path::new("/no/such/reldata.toml")).unwrap_err();
        assert!(matches!(err, ConfigError::Read { .. }));
    }
}
