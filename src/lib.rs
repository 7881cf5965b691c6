//! ro: directory trees as lazily loaded, content-addressed records
//!
//! Each `<root>/<type>/<id>/` directory is a [`Node`]. Its attributes come
//! from an `attributes.yml` sidecar plus one template-rendered value per file,
//! rendered on first access, cycle-checked, and cached by a fingerprint of the
//! directory's contents.

pub mod attributes;
pub mod cli;
pub mod config;
pub mod engine;
pub mod error;
pub mod fingerprint;
pub mod loader;
pub mod logging;
pub mod node;
pub mod path;
pub mod promise;
pub mod rewrite;
pub mod root;
pub mod store;
pub mod template;
pub mod urls;

pub use attributes::{Attributes, KeyPath, Value};
pub use config::RoConfig;
pub use engine::Engine;
pub use error::{CacheError, RoError};
pub use fingerprint::Fingerprint;
pub use node::{Asset, LoadSource, LoadState, Node};
pub use root::Root;
pub use store::{CacheStore, MemoryCache, SledCache};
