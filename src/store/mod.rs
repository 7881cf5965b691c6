//! Attribute Cache
//!
//! Short-circuits disk loads by fingerprint. The engine treats every cache as
//! optional and best-effort: the node logs and swallows [`CacheError`]s.

pub mod persistence;

pub use persistence::SledCache;

use crate::attributes::Attributes;
use crate::error::CacheError;
use crate::fingerprint::Fingerprint;
use parking_lot::RwLock;
use std::collections::HashMap;
use std::path::PathBuf;

/// Cache adapter interface
pub trait CacheStore: Send + Sync {
    /// A complete attribute mapping previously written under `key`
    fn read(&self, key: &Fingerprint) -> Result<Option<Attributes>, CacheError>;

    /// Store `value` under `key`, replacing any earlier entry
    fn write(&self, key: &Fingerprint, value: &Attributes) -> Result<(), CacheError>;
}

/// In-process cache
///
/// Holds one entry per node path; writing a new fingerprint for a path
/// evicts the old one. Entries keep deferred values as they are and the
/// reading node rebinds them, so values already computed are reused while
/// the rest render against the reader.
#[derive(Default)]
pub struct MemoryCache {
    entries: RwLock<HashMap<PathBuf, (String, Attributes)>>,
}

impl MemoryCache {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.entries.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn clear(&self) {
        self.entries.write().clear();
    }
}

impl CacheStore for MemoryCache {
    fn read(&self, key: &Fingerprint) -> Result<Option<Attributes>, CacheError> {
        let entries = self.entries.read();
        Ok(entries
            .get(&key.path)
            .filter(|(digest, _)| *digest == key.digest)
            .map(|(_, attributes)| attributes.clone()))
    }

    fn write(&self, key: &Fingerprint, value: &Attributes) -> Result<(), CacheError> {
        self.entries
            .write()
            .insert(key.path.clone(), (key.digest.clone(), value.clone()));
        Ok(())
    }
}
