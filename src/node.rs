//! Node: one directory as a lazily loaded attribute record
//!
//! A [`Node`] is a cheap handle; clones share identity, state and attributes.
//! Attribute access drives the load state machine
//! (`Unloaded -> Loading -> Loaded`). A load pass that re-enters its own node
//! (a template reading another attribute) sees [`LoadState::Loading`] and
//! reads whatever the in-progress store already holds.

pub mod asset;
pub mod related;

pub use asset::Asset;

use crate::attributes::{Attributes, KeyPath, Value};
use crate::engine::Engine;
use crate::error::RoError;
use crate::fingerprint;
use crate::loader;
use crate::path;
use crate::root::Root;
use crate::urls::{self, UrlOptions};
use parking_lot::Mutex;
use serde_json::Value as Json;
use std::fmt;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Weak};
use tracing::{debug, info, instrument, warn};

/// Where a completed load got its attributes from
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoadSource {
    Disk,
    Cache,
}

/// Node load state
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoadState {
    Unloaded,
    /// A pass is running; re-entrant callers read the partial store
    Loading,
    Loaded(LoadSource),
}

impl LoadState {
    pub fn is_loaded(&self) -> bool {
        matches!(self, LoadState::Loaded(_))
    }
}

struct NodeState {
    load: LoadState,
    attributes: Attributes,
}

struct NodeInner {
    path: PathBuf,
    id: String,
    type_name: String,
    slug: String,
    engine: Arc<Engine>,
    root: Weak<Root>,
    state: Mutex<NodeState>,
}

/// Handle to a node directory
#[derive(Clone)]
pub struct Node {
    inner: Arc<NodeInner>,
}

/// Non-owning node handle held by deferred computations
#[derive(Clone)]
pub(crate) struct WeakNode(Weak<NodeInner>);

impl WeakNode {
    pub(crate) fn upgrade(&self) -> Option<Node> {
        self.0.upgrade().map(|inner| Node { inner })
    }
}

impl Node {
    /// Node for the directory at `path`, outside any root index
    pub fn new(path: impl AsRef<Path>, engine: Arc<Engine>) -> Result<Self, RoError> {
        Self::with_root(path, engine, Weak::new())
    }

    pub(crate) fn with_root(
        path: impl AsRef<Path>,
        engine: Arc<Engine>,
        root: Weak<Root>,
    ) -> Result<Self, RoError> {
        let path = path::canonicalize_path(path.as_ref())?;
        if !path.is_dir() {
            return Err(RoError::NotFound(format!(
                "{:?} is not a directory",
                path
            )));
        }

        let file_name = |p: &Path| {
            p.file_name()
                .map(|name| name.to_string_lossy().into_owned())
                .unwrap_or_default()
        };
        let id = file_name(&path);
        let type_name = path.parent().map(file_name).unwrap_or_default();
        let slug = path::slug_for(&id);

        Ok(Self {
            inner: Arc::new(NodeInner {
                path,
                id,
                type_name,
                slug,
                engine,
                root,
                state: Mutex::new(NodeState {
                    load: LoadState::Unloaded,
                    attributes: Attributes::new(),
                }),
            }),
        })
    }

    pub(crate) fn downgrade(&self) -> WeakNode {
        WeakNode(Arc::downgrade(&self.inner))
    }

    /// Canonical absolute directory path
    pub fn path(&self) -> &Path {
        &self.inner.path
    }

    pub fn id(&self) -> &str {
        &self.inner.id
    }

    /// Type derived from the parent directory, ignoring any `type` attribute
    pub fn path_type(&self) -> &str {
        &self.inner.type_name
    }

    /// Slug derived from the id, ignoring any `slug` attribute
    pub fn path_slug(&self) -> &str {
        &self.inner.slug
    }

    /// `type/id`, always from the path
    pub fn identifier(&self) -> String {
        format!("{}/{}", self.inner.type_name, self.inner.id)
    }

    /// The `type` attribute when present, otherwise the path type
    pub fn node_type(&self) -> Result<String, RoError> {
        Ok(self
            .string_field("type")?
            .unwrap_or_else(|| self.inner.type_name.clone()))
    }

    /// The `slug` attribute when present, otherwise the derived slug
    pub fn slug(&self) -> Result<String, RoError> {
        Ok(self
            .string_field("slug")?
            .unwrap_or_else(|| self.inner.slug.clone()))
    }

    fn string_field(&self, name: &str) -> Result<Option<String>, RoError> {
        Ok(self
            .field(name)?
            .and_then(|value| value.as_str().map(str::to_string)))
    }

    pub fn engine(&self) -> &Arc<Engine> {
        &self.inner.engine
    }

    /// The enclosing root index, if the node came from one that is still alive
    pub fn root(&self) -> Option<Arc<Root>> {
        self.inner.root.upgrade()
    }

    pub fn load_state(&self) -> LoadState {
        self.inner.state.lock().load
    }

    /// Drive the load state machine
    ///
    /// Returns [`LoadState::Loading`] without doing anything when called from
    /// inside this node's own load pass.
    #[instrument(skip(self), fields(node = %self))]
    pub fn load(&self) -> Result<LoadState, RoError> {
        {
            let mut state = self.inner.state.lock();
            match state.load {
                LoadState::Loaded(_) | LoadState::Loading => return Ok(state.load),
                LoadState::Unloaded => state.load = LoadState::Loading,
            }
        }

        match self.load_from_cache_or_disk() {
            Ok(source) => {
                let mut state = self.inner.state.lock();
                state.load = LoadState::Loaded(source);
                Ok(state.load)
            }
            Err(e) => {
                let mut state = self.inner.state.lock();
                state.load = LoadState::Unloaded;
                state.attributes = Attributes::new();
                Err(e)
            }
        }
    }

    /// Forget loaded attributes and load again
    pub fn reload(&self) -> Result<LoadState, RoError> {
        {
            let mut state = self.inner.state.lock();
            if state.load == LoadState::Loading {
                return Ok(LoadState::Loading);
            }
            state.load = LoadState::Unloaded;
            state.attributes = Attributes::new();
        }
        self.load()
    }

    fn load_from_cache_or_disk(&self) -> Result<LoadSource, RoError> {
        let fingerprint = fingerprint::compute(self.path())?;
        debug!(fingerprint = %fingerprint, "Computed fingerprint");

        if let Some(cache) = self.inner.engine.cache() {
            match cache.read(&fingerprint) {
                Ok(Some(cached)) => {
                    let attributes = loader::bind(self, &cached);
                    info!("Loaded from cache");
                    self.inner.state.lock().attributes = attributes;
                    return Ok(LoadSource::Cache);
                }
                Ok(None) => {}
                Err(e) => warn!(error = %e, "Cache read failed, loading from disk"),
            }
        }

        let attributes = loader::load(self)?;
        info!(keys = attributes.len(), "Loaded from disk");
        self.inner.state.lock().attributes = attributes.clone();

        if let Some(cache) = self.inner.engine.cache() {
            if let Err(e) = cache.write(&fingerprint, &attributes) {
                warn!(error = %e, "Cache write failed");
            }
        }
        Ok(LoadSource::Disk)
    }

    fn lookup(&self, key: &KeyPath) -> Option<Value> {
        self.inner.state.lock().attributes.get(key)
    }

    /// The full attribute mapping, loading if needed
    pub fn attributes(&self) -> Result<Attributes, RoError> {
        self.load()?;
        Ok(self.inner.state.lock().attributes.clone())
    }

    /// Value at `key` with a deferred leaf resolved
    pub fn get(&self, key: impl Into<KeyPath>) -> Result<Option<Value>, RoError> {
        let key = key.into();
        self.load()?;
        self.lookup(&key).map(|value| value.resolve()).transpose()
    }

    /// Top-level attribute `name`
    ///
    /// A key already in the store is returned without forcing a load.
    pub fn field(&self, name: &str) -> Result<Option<Value>, RoError> {
        let key = KeyPath::new([name]);
        if let Some(value) = self.lookup(&key) {
            return value.resolve().map(Some);
        }
        self.load()?;
        self.lookup(&key).map(|value| value.resolve()).transpose()
    }

    /// `get(["assets", "source", name...])`
    pub fn source_for(&self, name: &str) -> Result<Option<Value>, RoError> {
        let mut segments = vec!["assets".to_string(), "source".to_string()];
        segments.extend(name.split('/').map(str::to_string));
        self.get(KeyPath::new(segments))
    }

    /// Node path below the configured root, with a leading `/`
    pub fn relative_path(&self) -> String {
        match path::relative_to(self.path(), self.inner.engine.root()) {
            Some(relative) => path::absolute(&[relative]),
            None => self.path().to_string_lossy().into_owned(),
        }
    }

    /// Public URL of the node
    pub fn url(&self, options: &UrlOptions) -> Result<String, RoError> {
        urls::url_for(self.inner.engine.url(), &[self.relative_path()], options)
    }

    /// Public URL of an existing file under the node
    pub fn url_for(&self, relative: &str, options: &UrlOptions) -> Result<String, RoError> {
        let target = self.path().join(relative);
        if !target.exists() {
            return Err(RoError::NotFound(format!(
                "{:?} does not exist under {}",
                relative, self
            )));
        }
        urls::url_for(
            self.inner.engine.url(),
            &[self.relative_path(), relative.to_string()],
            options,
        )
    }

    /// Identity fields merged into materialized output
    pub fn meta_attributes(&self) -> Result<serde_json::Map<String, Json>, RoError> {
        let mut meta = serde_json::Map::new();
        meta.insert("_identifier".into(), Json::from(self.identifier()));
        meta.insert("_type".into(), Json::from(self.path_type()));
        meta.insert("_id".into(), Json::from(self.id()));
        meta.insert("_url".into(), Json::from(self.url(&UrlOptions::default())?));
        meta.insert("_asset_urls".into(), Json::from(self.asset_urls()?));
        Ok(meta)
    }

    /// Every attribute resolved, plus the meta attributes
    pub fn as_json(&self) -> Result<Json, RoError> {
        let mut json = match self.attributes()?.materialize()? {
            Json::Object(map) => map,
            _ => serde_json::Map::new(),
        };
        json.extend(self.meta_attributes()?);
        Ok(Json::Object(json))
    }
}

impl PartialEq for Node {
    /// Nodes are equal when their resolved attributes are; a node that fails
    /// to load equals nothing
    fn eq(&self, other: &Self) -> bool {
        let materialized = |node: &Node| node.attributes().and_then(|a| a.materialize());
        match (materialized(self), materialized(other)) {
            (Ok(a), Ok(b)) => a == b,
            _ => false,
        }
    }
}

impl fmt::Display for Node {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.inner.type_name, self.inner.id)
    }
}

impl fmt::Debug for Node {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Node")
            .field("identifier", &self.identifier())
            .field("path", &self.inner.path)
            .field("state", &self.load_state())
            .finish()
    }
}
