//! Configuration System
//!
//! Layered configuration for the engine: built-in defaults, a global file,
//! workspace files and `RO_*` environment variables, merged by the `config`
//! crate and deserialized into [`RoConfig`].

use crate::logging::LoggingConfig;
use crate::urls;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::{Path, PathBuf};

mod facade;
mod merge;
mod sources;

pub use facade::ConfigLoader;
pub use sources::global_file::global_config_path;

/// Root configuration structure
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RoConfig {
    /// Content root holding `<type>/<id>/` directories
    #[serde(default = "default_root")]
    pub root: PathBuf,

    /// Public base URL; absolute (`https://host/prefix`) or path-only (`/ro`)
    #[serde(default = "default_url")]
    pub url: String,

    /// Attribute cache settings
    #[serde(default)]
    pub cache: CacheConfig,

    /// Logging configuration
    #[serde(default)]
    pub logging: LoggingConfig,
}

fn default_root() -> PathBuf {
    PathBuf::from(".")
}

fn default_url() -> String {
    crate::engine::DEFAULT_URL.to_string()
}

impl Default for RoConfig {
    fn default() -> Self {
        Self {
            root: default_root(),
            url: default_url(),
            cache: CacheConfig::default(),
            logging: LoggingConfig::default(),
        }
    }
}

/// Cache backend selection
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CacheBackend {
    #[default]
    Memory,
    Sled,
}

/// Attribute cache configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CacheConfig {
    /// Off unless asked for
    #[serde(default)]
    pub enabled: bool,

    #[serde(default)]
    pub backend: CacheBackend,

    /// Sled database location; relative paths are under the content root
    #[serde(default = "default_cache_path")]
    pub path: PathBuf,
}

fn default_cache_path() -> PathBuf {
    PathBuf::from(".ro/cache")
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            backend: CacheBackend::default(),
            path: default_cache_path(),
        }
    }
}

impl CacheConfig {
    /// Cache path with relative paths resolved against `root`
    pub fn resolved_path(&self, root: &Path) -> PathBuf {
        if self.path.is_absolute() {
            self.path.clone()
        } else {
            root.join(&self.path)
        }
    }
}

/// Configuration validation errors
#[derive(Debug, Clone, PartialEq)]
pub enum ValidationError {
    Root(String),
    Url(String),
    Cache(String),
    Logging(String),
}

impl fmt::Display for ValidationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ValidationError::Root(msg) => write!(f, "Root: {}", msg),
            ValidationError::Url(msg) => write!(f, "Url: {}", msg),
            ValidationError::Cache(msg) => write!(f, "Cache: {}", msg),
            ValidationError::Logging(msg) => write!(f, "Logging: {}", msg),
        }
    }
}

impl std::error::Error for ValidationError {}

impl RoConfig {
    /// Validate the entire configuration
    pub fn validate(&self) -> Result<(), Vec<ValidationError>> {
        let mut errors = Vec::new();

        if self.root.as_os_str().is_empty() {
            errors.push(ValidationError::Root("root cannot be empty".to_string()));
        }

        if let Err(e) = urls::url_for(&self.url, &[""], &urls::UrlOptions::default()) {
            errors.push(ValidationError::Url(e.to_string()));
        }

        if self.cache.enabled
            && self.cache.backend == CacheBackend::Sled
            && self.cache.path.as_os_str().is_empty()
        {
            errors.push(ValidationError::Cache(
                "sled cache requires a path".to_string(),
            ));
        }

        if !matches!(self.logging.format.as_str(), "text" | "json") {
            errors.push(ValidationError::Logging(format!(
                "invalid format {:?}",
                self.logging.format
            )));
        }

        if errors.is_empty() {
            Ok(())
        } else {
            Err(errors)
        }
    }

    /// Resolve a relative root against the workspace it was configured in
    pub fn with_workspace(mut self, workspace: &Path) -> Self {
        if self.root.is_relative() {
            self.root = workspace.join(&self.root);
        }
        self
    }
}
