//! Root: the identifier index over a content tree laid out as `<type>/<id>/`

use crate::engine::Engine;
use crate::error::RoError;
use crate::node::Node;
use parking_lot::Mutex;
use std::collections::BTreeMap;
use std::path::Path;
use std::sync::Arc;
use tracing::{debug, info};
use walkdir::WalkDir;

type Index = Arc<BTreeMap<String, Node>>;

/// Index of every node under the engine's root
pub struct Root {
    engine: Arc<Engine>,
    index: Mutex<Option<Index>>,
}

impl Root {
    pub fn new(engine: Arc<Engine>) -> Arc<Self> {
        Arc::new(Self {
            engine,
            index: Mutex::new(None),
        })
    }

    /// Root over `path` with a default engine
    pub fn open(path: impl AsRef<Path>) -> Result<Arc<Self>, RoError> {
        Ok(Self::new(Arc::new(Engine::new(path)?)))
    }

    pub fn engine(&self) -> &Arc<Engine> {
        &self.engine
    }

    pub fn path(&self) -> &Path {
        self.engine.root()
    }

    /// The identifier index, built on first use
    pub fn index(self: &Arc<Self>) -> Result<Index, RoError> {
        if let Some(index) = self.index.lock().as_ref() {
            return Ok(Arc::clone(index));
        }

        let index = Arc::new(self.build_index()?);
        info!(root = %self.path().display(), nodes = index.len(), "Indexed root");
        *self.index.lock() = Some(Arc::clone(&index));
        Ok(index)
    }

    fn build_index(self: &Arc<Self>) -> Result<BTreeMap<String, Node>, RoError> {
        let mut index = BTreeMap::new();
        let walker = WalkDir::new(self.path())
            .min_depth(1)
            .max_depth(2)
            .sort_by_file_name()
            .into_iter()
            .filter_entry(|entry| !entry.file_name().to_string_lossy().starts_with('.'));

        for entry in walker {
            let entry = entry?;
            if entry.depth() != 2 || !entry.path().is_dir() {
                continue;
            }
            let node = Node::with_root(entry.path(), Arc::clone(&self.engine), Arc::downgrade(self))?;
            debug!(identifier = %node, "Indexed node");
            index.insert(node.identifier(), node);
        }
        Ok(index)
    }

    /// Drop the index so the next lookup rescans the tree
    pub fn refresh(&self) {
        *self.index.lock() = None;
    }

    /// Node by `type/id`
    pub fn get(self: &Arc<Self>, identifier: &str) -> Result<Option<Node>, RoError> {
        Ok(self.index()?.get(identifier).cloned())
    }

    /// Node by `type/id`, missing as [`RoError::NotFound`]
    pub fn node(self: &Arc<Self>, identifier: &str) -> Result<Node, RoError> {
        self.get(identifier)?
            .ok_or_else(|| RoError::NotFound(format!("no node {:?}", identifier)))
    }

    /// Every node, ordered by identifier
    pub fn nodes(self: &Arc<Self>) -> Result<Vec<Node>, RoError> {
        Ok(self.index()?.values().cloned().collect())
    }

    /// Nodes whose path type is `type_name`
    pub fn nodes_of(self: &Arc<Self>, type_name: &str) -> Result<Vec<Node>, RoError> {
        Ok(self
            .index()?
            .values()
            .filter(|node| node.path_type() == type_name)
            .cloned()
            .collect())
    }

    /// Distinct node types, sorted
    pub fn types(self: &Arc<Self>) -> Result<Vec<String>, RoError> {
        let mut types: Vec<String> = self
            .index()?
            .values()
            .map(|node| node.path_type().to_string())
            .collect();
        types.dedup();
        Ok(types)
    }
}

impl std::fmt::Debug for Root {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Root").field("path", &self.path()).finish()
    }
}
