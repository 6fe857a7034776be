//! Locates the documents directory.
//!
//! ```toml
//! # ~/.config/docgraph/config.toml
//! docs_path = "~/work/architecture/docs"
//! strict_relations = true
//! ```

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Points at an alternative config file.
pub const CONFIG_ENV: &str = "DOCGRAPH_CONFIG";

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config file at {config_path}: {source}")]
    ConfigReadError {
        config_path: PathBuf,
        source: std::io::Error,
    },

    #[error("Failed to parse config file at {config_path}: {source}")]
    ConfigParseError {
        config_path: PathBuf,
        source: toml::de::Error,
    },

    #[error("No documents directory given and no config file at {config_path}")]
    NoDocsPath { config_path: PathBuf },
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Config {
    pub docs_path: PathBuf,
    /// Treat relations to unknown documents as errors in `check`.
    #[serde(default)]
    pub strict_relations: bool,
}

impl Config {
    pub fn new(docs_path: impl Into<PathBuf>) -> Self {
        Self {
            docs_path: docs_path.into(),
            strict_relations: false,
        }
    }

    pub fn load_from_path<P: AsRef<Path>>(config_path: P) -> Result<Option<Self>, ConfigError> {
        let config_path = config_path.as_ref();
        if !config_path.exists() {
            log::debug!("no config file at {}", config_path.display());
            return Ok(None);
        }

        let content = std::fs::read_to_string(config_path).map_err(|source| {
            ConfigError::ConfigReadError {
                config_path: config_path.to_path_buf(),
                source,
            }
        })?;

        let mut config: Config =
            toml::from_str(&content).map_err(|source| ConfigError::ConfigParseError {
                config_path: config_path.to_path_buf(),
                source,
            })?;

        config.docs_path = expand_path(&config.docs_path).unwrap_or(config.docs_path);

        Ok(Some(config))
    }

    pub fn load() -> Result<Option<Self>, ConfigError> {
        Self::load_from_path(Self::config_path())
    }

    /// Config for this run: the command-line directory wins over the file.
    pub fn resolve(docs_override: Option<PathBuf>) -> Result<Self, ConfigError> {
        Self::resolve_from_path(docs_override, Self::config_path())
    }

    pub fn resolve_from_path<P: AsRef<Path>>(
        docs_override: Option<PathBuf>,
        config_path: P,
    ) -> Result<Self, ConfigError> {
        let config_path = config_path.as_ref();
        let loaded = Self::load_from_path(config_path)?;
        match (docs_override, loaded) {
            (Some(docs_path), Some(config)) => Ok(Self {
                docs_path: expand_path(&docs_path).unwrap_or(docs_path),
                ..config
            }),
            (Some(docs_path), None) => Ok(Self::new(expand_path(&docs_path).unwrap_or(docs_path))),
            (None, Some(config)) => Ok(config),
            (None, None) => Err(ConfigError::NoDocsPath {
                config_path: config_path.to_path_buf(),
            }),
        }
    }

    pub fn save_to_path<P: AsRef<Path>>(&self, config_path: P) -> anyhow::Result<()> {
        let config_path = config_path.as_ref();
        if let Some(parent) = config_path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let content = toml::to_string_pretty(self)?;
        std::fs::write(config_path, content)?;
        Ok(())
    }

    pub fn save(&self) -> anyhow::Result<()> {
        self.save_to_path(Self::config_path())
    }

    /// `$DOCGRAPH_CONFIG` if set, else `~/.config/docgraph/config.toml`.
    pub fn config_path() -> PathBuf {
        if let Ok(custom) = std::env::var(CONFIG_ENV)
            && !custom.is_empty()
        {
            let custom = PathBuf::from(custom);
            return expand_path(&custom).unwrap_or(custom);
        }
        let config_dir = shellexpand::tilde("~/.config/docgraph");
        PathBuf::from(config_dir.as_ref()).join("config.toml")
    }
}

fn expand_path(path: &Path) -> Option<PathBuf> {
    let path_str = path.to_string_lossy();
    match shellexpand::full(&path_str) {
        Ok(expanded) => Some(PathBuf::from(expanded.as_ref())),
        Err(_) => None,
    }
}
