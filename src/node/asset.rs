//! Asset resolution: fuzzy lookup of files under a node's `assets/` directory

use crate::error::RoError;
use crate::node::Node;
use crate::path;
use crate::urls::UrlOptions;
use regex::{Regex, RegexBuilder};
use std::fmt;
use std::path::{Path, PathBuf};
use tracing::debug;
use walkdir::WalkDir;

/// Directory holding a node's assets
pub const ASSETS_DIR: &str = "assets";

/// A file under a node's `assets/` directory
#[derive(Debug, Clone)]
pub struct Asset {
    node: Node,
    path: PathBuf,
}

impl Asset {
    pub fn new(node: Node, path: PathBuf) -> Self {
        Self { node, path }
    }

    pub fn node(&self) -> &Node {
        &self.node
    }

    /// Absolute path of the asset file
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Path below the node's `assets/` directory
    pub fn relative_path(&self) -> String {
        path::relative_to(&self.path, &self.node.asset_dir())
            .unwrap_or_else(|| self.path.to_string_lossy().into_owned())
    }

    /// Path below the node directory (`assets/...`)
    pub fn node_relative_path(&self) -> String {
        path::join(&[ASSETS_DIR, self.relative_path().as_str()])
    }

    pub fn name(&self) -> String {
        self.path
            .file_name()
            .map(|name| name.to_string_lossy().into_owned())
            .unwrap_or_default()
    }

    /// Public URL of the asset
    pub fn url(&self) -> Result<String, RoError> {
        self.node
            .url_for(&self.node_relative_path(), &UrlOptions::default())
    }
}

impl fmt::Display for Asset {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.node, self.node_relative_path())
    }
}

/// Regex fragment for a requested name: metacharacters escaped, `-` and `_`
/// interchangeable
fn fuzzy_name(name: &str) -> String {
    let mut fragment = String::with_capacity(name.len());
    for c in name.chars() {
        match c {
            '_' | '-' => fragment.push_str("[_-]"),
            c => fragment.push_str(&regex::escape(c.encode_utf8(&mut [0; 4]))),
        }
    }
    fragment
}

/// Case-insensitive, anchored matcher over `/`-separated relative paths
fn matcher(pattern: &str) -> Result<Regex, RoError> {
    RegexBuilder::new(&format!("^{}$", pattern))
        .case_insensitive(true)
        .build()
        .map_err(|e| RoError::MalformedInput(format!("asset pattern {}: {}", pattern, e)))
}

impl Node {
    /// Absolute path of the node's `assets/` directory
    pub fn asset_dir(&self) -> PathBuf {
        self.path().join(ASSETS_DIR)
    }

    /// URL-side path of the assets directory
    pub fn asset_path(&self) -> String {
        path::absolute(&[self.relative_path().as_str(), ASSETS_DIR])
    }

    /// Every regular file under `assets/`, sorted
    pub fn asset_paths(&self) -> Vec<PathBuf> {
        let dir = self.asset_dir();
        if !dir.is_dir() {
            return Vec::new();
        }
        let mut paths: Vec<PathBuf> = WalkDir::new(&dir)
            .min_depth(1)
            .into_iter()
            .filter_entry(|entry| !entry.file_name().to_string_lossy().starts_with('.'))
            .filter_map(|entry| entry.ok())
            .filter(|entry| entry.path().is_file())
            .map(|entry| entry.into_path())
            .collect();
        paths.sort();
        paths
    }

    pub fn assets(&self) -> Vec<Asset> {
        self.asset_paths()
            .into_iter()
            .map(|path| Asset::new(self.clone(), path))
            .collect()
    }

    pub fn asset_urls(&self) -> Result<Vec<String>, RoError> {
        self.assets().iter().map(Asset::url).collect()
    }

    /// Resolve an asset by approximate name
    ///
    /// `profile_pic` finds `assets/profile-pic.jpg`; matching ignores case
    /// and accepts any suffix. Among several candidates the last in sorted
    /// order wins.
    pub fn asset_for(&self, name: &str) -> Result<Asset, RoError> {
        let fuzzy = fuzzy_name(&path::join(&[name]));

        // exact, exact with any suffix, then the same at any depth
        let patterns = [
            fuzzy.clone(),
            format!("{}[^/]*", fuzzy),
            format!("(?:.*/)?{}[^/]*", fuzzy),
        ];
        let matchers = patterns
            .iter()
            .map(|pattern| matcher(pattern))
            .collect::<Result<Vec<_>, _>>()?;

        let asset_dir = self.asset_dir();
        let mut candidates: Vec<(String, PathBuf)> = self
            .asset_paths()
            .into_iter()
            .filter_map(|candidate| {
                path::relative_to(&candidate, &asset_dir)
                    .filter(|relative| matchers.iter().any(|m| m.is_match(relative)))
                    .map(|relative| (relative, candidate))
            })
            .collect();
        // order by the `/`-joined relative path, not path components
        candidates.sort_by(|a, b| a.0.cmp(&b.0));
        candidates.dedup_by(|a, b| a.0 == b.0);

        debug!(node = %self, name, candidates = candidates.len(), "Resolved asset candidates");
        match candidates.pop() {
            Some((_, path)) => Ok(Asset::new(self.clone(), path)),
            None => Err(RoError::NotFound(format!(
                "no asset {:?} for {} under {:?} (tried {})",
                name,
                self,
                asset_dir,
                patterns.join(", ")
            ))),
        }
    }

    /// [`Node::asset_for`], with a missing asset as `None`
    pub fn asset_for_opt(&self, name: &str) -> Option<Asset> {
        self.asset_for(name).ok()
    }
}
