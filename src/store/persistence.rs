//! Persistent attribute cache backed by sled

use crate::attributes::{Attributes, Value};
use crate::error::CacheError;
use crate::fingerprint::Fingerprint;
use crate::promise::Recipe;
use crate::store::CacheStore;
use serde::{Deserialize, Serialize};
use std::path::Path;
use tracing::debug;

/// Stored form of one cache entry
#[derive(Debug, Serialize, Deserialize)]
struct CachedEntry {
    digest: String,
    attributes: Vec<(String, CachedValue)>,
}

/// Stored form of one attribute value, with mappings kept in order
#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
enum CachedValue {
    Data(serde_json::Value),
    Map(Vec<(String, CachedValue)>),
    Pending(Recipe),
}

fn encode(attributes: &Attributes) -> Result<Vec<(String, CachedValue)>, CacheError> {
    attributes
        .iter()
        .map(|(name, value)| Ok((name.clone(), encode_value(value)?)))
        .collect()
}

fn encode_value(value: &Value) -> Result<CachedValue, CacheError> {
    Ok(match value {
        Value::Data(json) => CachedValue::Data(json.clone()),
        Value::Map(inner) => CachedValue::Map(encode(inner)?),
        Value::Pending(recipe) => CachedValue::Pending(recipe.clone()),
        Value::Deferred(promise) => match (promise.value(), promise.recipe()) {
            (Some(text), _) => CachedValue::Data(serde_json::Value::String(text)),
            (None, Some(recipe)) => CachedValue::Pending(recipe),
            // No recipe to store, so the value has to be computed now
            (None, None) => CachedValue::Data(serde_json::Value::String(
                promise
                    .resolve()
                    .map_err(|e| CacheError::Encode(e.to_string()))?,
            )),
        },
    })
}

fn decode(entries: Vec<(String, CachedValue)>) -> Attributes {
    let mut attributes = Attributes::new();
    for (name, cached) in entries {
        let value = match cached {
            CachedValue::Data(json) => Value::from_json(json),
            CachedValue::Map(inner) => Value::Map(decode(inner)),
            CachedValue::Pending(recipe) => Value::Pending(recipe),
        };
        attributes.insert(name, value);
    }
    attributes
}

/// Sled-based implementation of [`CacheStore`]
///
/// Values already computed are stored as data; unresolved ones are stored as
/// recipes and are not rendered on write. The reading node binds recipes back
/// into promises. Each node path keeps only its latest entry.
pub struct SledCache {
    db: sled::Db,
}

impl SledCache {
    /// Open (or create) a cache database at `path`
    pub fn new<P: AsRef<Path>>(path: P) -> Result<Self, CacheError> {
        let db = sled::open(path)?;
        Ok(Self { db })
    }

    /// Get the underlying sled database (for advanced operations)
    pub fn db(&self) -> &sled::Db {
        &self.db
    }

    /// Flush all pending writes to disk
    pub fn flush(&self) -> Result<(), CacheError> {
        self.db.flush()?;
        Ok(())
    }

    fn path_key(key: &Fingerprint) -> String {
        format!("path:{}", key.path.to_string_lossy())
    }
}

impl CacheStore for SledCache {
    fn read(&self, key: &Fingerprint) -> Result<Option<Attributes>, CacheError> {
        let Some(bytes) = self.db.get(key.cache_key().as_bytes())? else {
            return Ok(None);
        };

        let entry: CachedEntry =
            serde_json::from_slice(&bytes).map_err(|e| CacheError::Decode(e.to_string()))?;
        if entry.digest != key.digest {
            return Ok(None);
        }

        Ok(Some(decode(entry.attributes)))
    }

    fn write(&self, key: &Fingerprint, value: &Attributes) -> Result<(), CacheError> {
        let entry = CachedEntry {
            digest: key.digest.clone(),
            attributes: encode(value)?,
        };
        let bytes = serde_json::to_vec(&entry).map_err(|e| CacheError::Encode(e.to_string()))?;

        let path_key = Self::path_key(key);
        let cache_key = key.cache_key();
        if let Some(previous) = self.db.insert(path_key.as_bytes(), cache_key.as_bytes())? {
            if &*previous != cache_key.as_bytes() {
                debug!(path = %key.path.display(), "Evicting stale cache entry");
                self.db.remove(previous)?;
            }
        }
        self.db.insert(cache_key.as_bytes(), bytes)?;
        Ok(())
    }
}
