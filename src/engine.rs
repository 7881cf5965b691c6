//! Engine: the explicit configuration object every node is built against
//!
//! Holds the content root, the public base URL, the optional attribute cache
//! and the template renderer. Callers construct it once and share it.

use crate::config::{CacheBackend, RoConfig};
use crate::error::RoError;
use crate::path;
use crate::store::{CacheStore, MemoryCache, SledCache};
use crate::template::{Renderer, TemplateRenderer};
use std::fmt;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::info;

/// Default public base URL
pub const DEFAULT_URL: &str = "/ro";

pub struct Engine {
    root: PathBuf,
    url: String,
    cache: Option<Arc<dyn CacheStore>>,
    renderer: Arc<dyn Renderer>,
}

impl Engine {
    /// Engine over `root` with the default URL, no cache and the template renderer
    pub fn new(root: impl AsRef<Path>) -> Result<Self, RoError> {
        Ok(Self {
            root: path::canonicalize_path(root.as_ref())?,
            url: DEFAULT_URL.to_string(),
            cache: None,
            renderer: Arc::new(TemplateRenderer::new()),
        })
    }

    /// Build an engine from loaded configuration
    pub fn from_config(config: &RoConfig) -> Result<Self, RoError> {
        let mut engine = Engine::new(&config.root)?.with_url(config.url.clone());

        if config.cache.enabled {
            let cache: Arc<dyn CacheStore> = match config.cache.backend {
                CacheBackend::Memory => Arc::new(MemoryCache::new()),
                CacheBackend::Sled => {
                    let cache_path = config.cache.resolved_path(&engine.root);
                    Arc::new(SledCache::new(&cache_path).map_err(|e| {
                        RoError::Config(format!("Failed to open cache at {:?}: {}", cache_path, e))
                    })?)
                }
            };
            engine = engine.with_cache(cache);
        }

        info!(
            root = %engine.root.display(),
            url = %engine.url,
            cache = engine.cache.is_some(),
            "Engine initialized"
        );
        Ok(engine)
    }

    pub fn with_url(mut self, url: impl Into<String>) -> Self {
        self.url = url.into();
        self
    }

    pub fn with_cache(mut self, cache: Arc<dyn CacheStore>) -> Self {
        self.cache = Some(cache);
        self
    }

    pub fn without_cache(mut self) -> Self {
        self.cache = None;
        self
    }

    pub fn with_renderer(mut self, renderer: Arc<dyn Renderer>) -> Self {
        self.renderer = renderer;
        self
    }

    /// Canonical content root
    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn url(&self) -> &str {
        &self.url
    }

    pub fn cache(&self) -> Option<&Arc<dyn CacheStore>> {
        self.cache.as_ref()
    }

    pub fn renderer(&self) -> &Arc<dyn Renderer> {
        &self.renderer
    }
}

impl fmt::Debug for Engine {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Engine")
            .field("root", &self.root)
            .field("url", &self.url)
            .field("cache", &self.cache.is_some())
            .finish()
    }
}
