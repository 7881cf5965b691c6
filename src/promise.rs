//! Cycle-safe deferred values
//!
//! A disk-load pass creates one [`CycleContext`]. Every rendered file becomes
//! a slot in the context's arena, reachable through a cheap [`Promise`]
//! handle. Resolving a promise may resolve others (a template reading another
//! attribute of the same node); the context keeps the stack of keys being
//! resolved and reports a [`RoError::Cycle`] when a key reappears on it.
//!
//! A promise may carry the [`Recipe`] it was built from. Recipes name files,
//! not node instances, so a cached mapping can be rebound to a fresh context
//! for whichever node reads it.

use crate::attributes::KeyPath;
use crate::error::RoError;
use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;
use std::path::PathBuf;
use std::sync::Arc;
use tracing::{debug, trace};

/// A deferred attribute computation
pub type Computation = Arc<dyn Fn() -> Result<String, RoError> + Send + Sync>;

/// Node-independent description of a deferred value
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Recipe {
    /// Render a template file in the reading node's context
    Template(PathBuf),
    /// Read an `assets/source` listing verbatim
    Source(PathBuf),
}

impl Recipe {
    pub fn file(&self) -> &PathBuf {
        match self {
            Recipe::Template(file) | Recipe::Source(file) => file,
        }
    }
}

impl fmt::Display for Recipe {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Recipe::Template(file) => write!(f, "template {:?}", file),
            Recipe::Source(file) => write!(f, "source {:?}", file),
        }
    }
}

struct Slot {
    key: KeyPath,
    recipe: Option<Recipe>,
    compute: Computation,
    resolved: Option<String>,
}

#[derive(Default)]
struct Arena {
    slots: Vec<Slot>,
    by_key: HashMap<KeyPath, usize>,
    stack: Vec<KeyPath>,
}

/// Per-pass dependency tracking for one node
pub struct CycleContext {
    owner: String,
    arena: Mutex<Arena>,
}

impl CycleContext {
    /// Create a context for a load pass of the node named `owner`
    pub fn new(owner: impl Into<String>) -> Arc<Self> {
        Arc::new(Self {
            owner: owner.into(),
            arena: Mutex::new(Arena::default()),
        })
    }

    pub fn owner(&self) -> &str {
        &self.owner
    }

    /// Register a deferred computation under `key`
    ///
    /// A later registration under the same key takes over the key index; the
    /// earlier promise stays valid for whoever already holds it.
    pub fn promise<F>(self: &Arc<Self>, key: KeyPath, compute: F) -> Promise
    where
        F: Fn() -> Result<String, RoError> + Send + Sync + 'static,
    {
        self.register(key, None, Arc::new(compute))
    }

    /// [`CycleContext::promise`] for a computation described by `recipe`
    pub fn promise_from<F>(self: &Arc<Self>, key: KeyPath, recipe: Recipe, compute: F) -> Promise
    where
        F: Fn() -> Result<String, RoError> + Send + Sync + 'static,
    {
        self.register(key, Some(recipe), Arc::new(compute))
    }

    fn register(self: &Arc<Self>, key: KeyPath, recipe: Option<Recipe>, compute: Computation) -> Promise {
        let mut arena = self.arena.lock();
        let index = arena.slots.len();
        arena.slots.push(Slot {
            key: key.clone(),
            recipe,
            compute,
            resolved: None,
        });
        arena.by_key.insert(key, index);
        Promise {
            context: Arc::clone(self),
            index,
        }
    }

    /// The promise currently registered under `key`
    pub fn promise_for(self: &Arc<Self>, key: &KeyPath) -> Option<Promise> {
        let index = *self.arena.lock().by_key.get(key)?;
        Some(Promise {
            context: Arc::clone(self),
            index,
        })
    }

    /// Number of promises created during the pass
    pub fn len(&self) -> usize {
        self.arena.lock().slots.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Keys currently being resolved, outermost first
    pub fn in_progress(&self) -> Vec<KeyPath> {
        self.arena.lock().stack.clone()
    }

    /// Resolve every promise of the pass in creation order
    pub fn resolve_all(self: &Arc<Self>) -> Result<(), RoError> {
        for index in 0..self.len() {
            Promise {
                context: Arc::clone(self),
                index,
            }
            .resolve()?;
        }
        Ok(())
    }
}

impl fmt::Debug for CycleContext {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CycleContext")
            .field("owner", &self.owner)
            .field("promises", &self.len())
            .finish()
    }
}

/// Pops the in-progress stack however the computation ends
struct StackGuard<'a> {
    context: &'a CycleContext,
}

impl Drop for StackGuard<'_> {
    fn drop(&mut self) {
        self.context.arena.lock().stack.pop();
    }
}

/// Handle to one deferred, memoized, cycle-checked computation
#[derive(Clone)]
pub struct Promise {
    context: Arc<CycleContext>,
    index: usize,
}

impl Promise {
    pub fn key(&self) -> KeyPath {
        self.context.arena.lock().slots[self.index].key.clone()
    }

    pub fn is_resolved(&self) -> bool {
        self.context.arena.lock().slots[self.index].resolved.is_some()
    }

    /// The memoized value, without computing anything
    pub fn value(&self) -> Option<String> {
        self.context.arena.lock().slots[self.index].resolved.clone()
    }

    pub fn recipe(&self) -> Option<Recipe> {
        self.context.arena.lock().slots[self.index].recipe.clone()
    }

    /// Name of the node whose pass created this promise
    pub fn owner(&self) -> &str {
        self.context.owner()
    }

    /// True when both handles point at the same slot of the same pass
    pub fn same_as(&self, other: &Promise) -> bool {
        Arc::ptr_eq(&self.context, &other.context) && self.index == other.index
    }

    /// Compute the value on first call; later calls return the memoized value
    ///
    /// Failures are not memoized. No lock is held while the computation runs,
    /// so it may resolve other promises of the same context.
    pub fn resolve(&self) -> Result<String, RoError> {
        let compute = {
            let mut arena = self.context.arena.lock();
            let slot = &arena.slots[self.index];
            if let Some(value) = &slot.resolved {
                trace!(key = %slot.key, "Promise already resolved");
                return Ok(value.clone());
            }

            let key = slot.key.clone();
            let compute = Arc::clone(&slot.compute);

            if arena.stack.contains(&key) {
                let mut chain: Vec<String> = arena.stack.iter().map(ToString::to_string).collect();
                chain.push(key.to_string());
                return Err(RoError::Cycle {
                    node: self.context.owner.clone(),
                    chain,
                });
            }

            debug!(node = %self.context.owner, key = %key, depth = arena.stack.len(), "Resolving promise");
            arena.stack.push(key);
            compute
        };

        let guard = StackGuard {
            context: &self.context,
        };
        let value = compute()?;
        drop(guard);

        self.context.arena.lock().slots[self.index].resolved = Some(value.clone());
        Ok(value)
    }
}

impl fmt::Debug for Promise {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let arena = self.context.arena.lock();
        let slot = &arena.slots[self.index];
        f.debug_struct("Promise")
            .field("key", &slot.key.to_string())
            .field("resolved", &slot.resolved.is_some())
            .finish()
    }
}
