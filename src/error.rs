//! Error types for the ro node engine.

use std::path::PathBuf;
use thiserror::Error;

/// Errors raised while loading, rendering or addressing nodes
///
/// Variants carry owned strings so the error is `Clone`; a failure raised
/// inside a template render has to travel back out through the template
/// engine unchanged.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RoError {
    #[error("Not found: {0}")]
    NotFound(String),

    #[error("rendering {node} cycles on {}", .chain.join(" -> "))]
    Cycle { node: String, chain: Vec<String> },

    #[error("Malformed input: {0}")]
    MalformedInput(String),

    #[error("Failed to render {path:?}: {message}")]
    RenderFailure { path: PathBuf, message: String },

    #[error("could not expand assets via {strategies}: {message}")]
    StrategyExhausted { strategies: String, message: String },

    #[error("I/O error: {0}")]
    Io(String),

    #[error("Configuration error: {0}")]
    Config(String),
}

impl RoError {
    /// True for the recoverable "nothing matched" kind
    pub fn is_not_found(&self) -> bool {
        matches!(self, RoError::NotFound(_))
    }
}

impl From<std::io::Error> for RoError {
    fn from(err: std::io::Error) -> Self {
        RoError::Io(err.to_string())
    }
}

impl From<walkdir::Error> for RoError {
    fn from(err: walkdir::Error) -> Self {
        RoError::Io(format!("Failed to walk directory: {}", err))
    }
}

impl From<serde_yaml::Error> for RoError {
    fn from(err: serde_yaml::Error) -> Self {
        RoError::MalformedInput(format!("attributes.yml: {}", err))
    }
}

impl From<config::ConfigError> for RoError {
    fn from(err: config::ConfigError) -> Self {
        RoError::Config(err.to_string())
    }
}

/// Cache adapter errors. Never surfaced past the node; logged and swallowed.
#[derive(Debug, Error)]
pub enum CacheError {
    #[error("Cache backend error: {0}")]
    Backend(String),

    #[error("Cache entry could not be encoded: {0}")]
    Encode(String),

    #[error("Cache entry could not be decoded: {0}")]
    Decode(String),

    #[error("Cache I/O error: {0}")]
    IoError(#[from] std::io::Error),
}

impl From<sled::Error> for CacheError {
    fn from(err: sled::Error) -> Self {
        CacheError::Backend(err.to_string())
    }
}
