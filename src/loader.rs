//! Attribute loader: builds a node's attribute mapping from disk
//!
//! The sidecar `attributes.yml` supplies plain data. Every other file becomes
//! a deferred value keyed by its path, rendered on first access.
//! [`bind`] gives a cached mapping fresh promises owned by the reading node.

use crate::attributes::{Attributes, KeyPath, Value};
use crate::error::RoError;
use crate::node::asset::ASSETS_DIR;
use crate::node::Node;
use crate::path;
use crate::promise::{CycleContext, Promise, Recipe};
use crate::rewrite;
use crate::urls::UrlOptions;
use serde_json::Value as Json;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::{debug, instrument};
use walkdir::WalkDir;

/// Name of the sidecar data file
pub const SIDECAR: &str = "attributes.yml";

/// Top-level keys the sidecar may not define
pub const RESERVED_KEYS: &[&str] = &[ASSETS_DIR];

/// Key under which a non-mapping sidecar document is stored
pub const WRAPPED_KEY: &str = "_";

/// Load the attribute mapping for `node` from disk
#[instrument(skip(node), fields(node = %node))]
pub fn load(node: &Node) -> Result<Attributes, RoError> {
    let mut attributes = load_sidecar(node.path())?;
    let context = CycleContext::new(node.identifier());

    for (relative, file) in attribute_files(node.path())? {
        let key = KeyPath::for_file(&relative);
        let promise = deferred(&context, node, key.clone(), Recipe::Template(file));
        attributes.set(&key, Value::Deferred(promise));
    }

    for file in source_files(node.path())? {
        let name = file
            .file_name()
            .map(|name| name.to_string_lossy().into_owned())
            .unwrap_or_default();
        let key = KeyPath::new([ASSETS_DIR, "source", name.as_str()]);
        let promise = deferred(&context, node, key.clone(), Recipe::Source(file));
        attributes.set(&key, Value::Deferred(promise));
    }

    debug!(promises = context.len(), "Scheduled attribute files");
    Ok(attributes)
}

/// Rebind a cached mapping to `node` under a new load pass
///
/// Values some earlier pass already computed become plain data; everything
/// else gets a new promise in a context owned by `node`, so renders go
/// through `node` and cycles are tracked per node and per pass.
#[instrument(skip(node, cached), fields(node = %node))]
pub fn bind(node: &Node, cached: &Attributes) -> Attributes {
    let context = CycleContext::new(node.identifier());
    let bound = bind_map(node, &context, &KeyPath::default(), cached);
    debug!(promises = context.len(), "Rebound cached attributes");
    bound
}

fn bind_map(node: &Node, context: &Arc<CycleContext>, prefix: &KeyPath, map: &Attributes) -> Attributes {
    let mut bound = Attributes::new();
    for (name, value) in map.iter() {
        let key = prefix.join(name.as_str());
        let value = match value {
            Value::Data(_) => value.clone(),
            Value::Map(inner) => Value::Map(bind_map(node, context, &key, inner)),
            Value::Pending(recipe) => Value::Deferred(deferred(context, node, key, recipe.clone())),
            Value::Deferred(promise) => rebind_promise(node, context, key, promise),
        };
        bound.insert(name.clone(), value);
    }
    bound
}

fn rebind_promise(node: &Node, context: &Arc<CycleContext>, key: KeyPath, promise: &Promise) -> Value {
    match (promise.value(), promise.recipe()) {
        (Some(text), _) => Value::string(text),
        (None, Some(recipe)) => Value::Deferred(deferred(context, node, key, recipe)),
        // Hand-built promises carry no recipe; they can only be shared
        (None, None) => Value::Deferred(promise.clone()),
    }
}

/// Parse the sidecar of the node directory `dir`
///
/// A missing or empty sidecar yields an empty mapping.
pub fn load_sidecar(dir: &Path) -> Result<Attributes, RoError> {
    let path = dir.join(SIDECAR);
    match fs::metadata(&path) {
        Ok(metadata) if metadata.is_file() && metadata.len() > 0 => {}
        _ => return Ok(Attributes::new()),
    }

    let buf = fs::read_to_string(&path)?;
    parse_sidecar(&buf)
}

/// Parse sidecar YAML into attributes
pub fn parse_sidecar(buf: &str) -> Result<Attributes, RoError> {
    let document: serde_yaml::Value = serde_yaml::from_str(buf)?;
    let json = serde_json::to_value(&document)
        .map_err(|e| RoError::MalformedInput(format!("{}: {}", SIDECAR, e)))?;

    let attributes = match json {
        Json::Object(map) => Attributes::from_json_map(map),
        other => {
            let mut wrapped = Attributes::new();
            wrapped.insert(WRAPPED_KEY, Value::from_json(other));
            wrapped
        }
    };

    if let Some(key) = RESERVED_KEYS.iter().find(|key| attributes.contains_key(key)) {
        return Err(RoError::MalformedInput(format!(
            "{} may not define the reserved key {:?}",
            SIDECAR, key
        )));
    }
    Ok(attributes)
}

/// Files that become deferred attributes, as `(relative path, absolute path)`
///
/// Skips hidden entries, the sidecar and the assets directory.
pub fn attribute_files(dir: &Path) -> Result<Vec<(String, PathBuf)>, RoError> {
    let mut files = Vec::new();
    let walker = WalkDir::new(dir)
        .min_depth(1)
        .sort_by_file_name()
        .into_iter()
        .filter_entry(|entry| {
            let name = entry.file_name().to_string_lossy();
            !name.starts_with('.') && !(entry.depth() == 1 && name == ASSETS_DIR)
        });

    for entry in walker {
        let entry = entry?;
        if !entry.path().is_file() || entry.file_name() == SIDECAR {
            continue;
        }
        if let Some(relative) = path::relative_to(entry.path(), dir) {
            files.push((relative, entry.into_path()));
        }
    }
    Ok(files)
}

/// Regular files directly under `assets/source`
fn source_files(dir: &Path) -> Result<Vec<PathBuf>, RoError> {
    let source_dir = dir.join(ASSETS_DIR).join("source");
    if !source_dir.is_dir() {
        return Ok(Vec::new());
    }
    let mut files = Vec::new();
    for entry in WalkDir::new(&source_dir)
        .min_depth(1)
        .max_depth(1)
        .sort_by_file_name()
    {
        let entry = entry?;
        let hidden = entry.file_name().to_string_lossy().starts_with('.');
        if !hidden && entry.path().is_file() && entry.file_name() != SIDECAR {
            files.push(entry.into_path());
        }
    }
    Ok(files)
}

/// Register `recipe` as a promise evaluated against `node`
fn deferred(context: &Arc<CycleContext>, node: &Node, key: KeyPath, recipe: Recipe) -> Promise {
    let weak = node.downgrade();
    let job = recipe.clone();
    context.promise_from(key, recipe, move || {
        let node = weak
            .upgrade()
            .ok_or_else(|| RoError::NotFound(format!("node for {} was dropped", job)))?;
        evaluate(&node, &job)
    })
}

/// Compute one deferred value: render and rewrite asset URLs, or read verbatim
pub fn evaluate(node: &Node, recipe: &Recipe) -> Result<String, RoError> {
    let renderer = Arc::clone(node.engine().renderer());
    match recipe {
        Recipe::Template(file) => {
            let html = renderer.render(file, node)?;
            rewrite::expand_asset_urls(&html, &|asset: &str| {
                node.url_for(asset, &UrlOptions::default())
            })
        }
        Recipe::Source(file) => renderer.render_source(file, node),
    }
}
