//! Site configuration (_config.yml or _config.toml)

use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Configuration errors. All of them abort a run before any document is read.
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Invalid {name}: {value} (expected a number between 0 and 1)")]
    InvalidThreshold { name: &'static str, value: f64 },

    #[error("Invalid shingle_size: must be at least 1")]
    InvalidShingleSize,

    #[error("Failed to read config {path:?}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Invalid YAML config: {0}")]
    Yaml(#[from] serde_yaml::Error),

    #[error("Invalid TOML config: {0}")]
    Toml(#[from] toml::de::Error),
}

/// Main site configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SiteConfig {
    // Site
    pub title: String,
    pub description: String,
    pub author: String,

    // Directory
    pub source_dir: String,
    pub public_dir: String,

    // Pipeline
    pub duplicates: DuplicatesConfig,
    pub publish: PublishConfig,
    pub highlight: HighlightConfig,
}

impl Default for SiteConfig {
    fn default() -> Self {
        Self {
            title: "Quire".to_string(),
            description: String::new(),
            author: String::new(),

            source_dir: "source".to_string(),
            public_dir: "public".to_string(),

            duplicates: DuplicatesConfig::default(),
            publish: PublishConfig::default(),
            highlight: HighlightConfig::default(),
        }
    }
}

impl SiteConfig {
    /// Load configuration from a file, picking the format from its extension
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let content = fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;

        let config: SiteConfig = match path.extension().and_then(|e| e.to_str()) {
            Some("toml") => toml::from_str(&content)?,
            _ => serde_yaml::from_str(&content)?,
        };
        tracing::debug!("Loaded config from {:?}", path);

        config.validate()?;
        Ok(config)
    }

    /// Find and load `_config.yml`, `_config.yaml` or `_config.toml` in `base_dir`.
    /// Falls back to defaults when none exists.
    pub fn discover<P: AsRef<Path>>(base_dir: P) -> Result<Self, ConfigError> {
        let base_dir = base_dir.as_ref();
        for name in ["_config.yml", "_config.yaml", "_config.toml"] {
            let candidate = base_dir.join(name);
            if candidate.exists() {
                return Self::load(candidate);
            }
        }
        Ok(Self::default())
    }

    /// Check every option that could otherwise fail mid-run
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.duplicates.validate()
    }
}

/// Duplicate/revision detector configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct DuplicatesConfig {
    /// Body similarity a title group must exceed to become one revision cluster
    pub threshold: f64,
    /// Title-token overlap at which two titles are considered the same essay
    pub title_threshold: f64,
    /// Number of consecutive words per shingle
    pub shingle_size: usize,
}

impl Default for DuplicatesConfig {
    fn default() -> Self {
        Self {
            threshold: 0.6,
            title_threshold: 0.8,
            shingle_size: 3,
        }
    }
}

impl DuplicatesConfig {
    pub fn validate(&self) -> Result<(), ConfigError> {
        check_ratio("duplicates.threshold", self.threshold)?;
        check_ratio("duplicates.title_threshold", self.title_threshold)?;
        if self.shingle_size == 0 {
            return Err(ConfigError::InvalidShingleSize);
        }
        Ok(())
    }
}

fn check_ratio(name: &'static str, value: f64) -> Result<(), ConfigError> {
    if value.is_finite() && (0.0..=1.0).contains(&value) {
        Ok(())
    } else {
        Err(ConfigError::InvalidThreshold { name, value })
    }
}

/// Output ordering of published documents
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SortOrder {
    #[default]
    NewestFirst,
    OldestFirst,
}

/// Publisher configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct PublishConfig {
    pub include_drafts: bool,
    pub sort_order: SortOrder,
    /// Only publish the canonical member of each revision cluster
    pub dedupe: bool,
}

impl Default for PublishConfig {
    fn default() -> Self {
        Self {
            include_drafts: false,
            sort_order: SortOrder::NewestFirst,
            dedupe: true,
        }
    }
}

/// Code highlighting configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct HighlightConfig {
    /// Highlight fenced code with syntect instead of emitting escaped text
    pub enable: bool,
    pub theme: String,
    pub line_number: bool,
}

impl Default for HighlightConfig {
    fn default() -> Self {
        Self {
            enable: false,
            theme: "base16-ocean.dark".to_string(),
            line_number: false,
        }
    }
}
