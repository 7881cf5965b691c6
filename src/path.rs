//! Path canonicalization, joining and slug utilities

use crate::error::RoError;
use std::path::{Component, Path, PathBuf};
use unicode_normalization::UnicodeNormalization;

/// Canonicalize a node directory path
///
/// Resolves symlinks and `..`, normalizes Unicode to NFC and removes
/// trailing separators so the same directory always has the same identity.
pub fn canonicalize_path(path: &Path) -> Result<PathBuf, RoError> {
    let canonical = dunce::canonicalize(path).map_err(|e| {
        RoError::NotFound(format!("Failed to canonicalize path {:?}: {}", path, e))
    })?;

    Ok(PathBuf::from(normalize_path_string(&canonical.to_string_lossy())))
}

/// Normalize a path string without filesystem access
pub fn normalize_path_string(path: &str) -> String {
    let mut result: String = path.nfc().collect();
    if result.len() > 1 {
        while result.ends_with('/') || result.ends_with('\\') {
            result.pop();
        }
    }
    result
}

/// Join path fragments with `/`
///
/// Each fragment may itself contain separators. Empty and `.` segments are
/// dropped, `..` pops the previous segment. The result carries no leading or
/// trailing slash.
pub fn join<S: AsRef<str>>(parts: &[S]) -> String {
    let mut segments: Vec<&str> = Vec::new();
    for part in parts {
        for segment in part.as_ref().split(['/', '\\']) {
            match segment {
                "" | "." => {}
                ".." => {
                    segments.pop();
                }
                s => segments.push(s),
            }
        }
    }
    segments.join("/")
}

/// Join path fragments into an absolute, `/`-rooted path
pub fn absolute<S: AsRef<str>>(parts: &[S]) -> String {
    format!("/{}", join(parts))
}

/// Express `path` relative to `base` using `/` separators
///
/// Returns `None` when `path` is not under `base`.
pub fn relative_to(path: &Path, base: &Path) -> Option<String> {
    let stripped = path.strip_prefix(base).ok()?;
    let segments: Vec<String> = stripped
        .components()
        .filter_map(|c| match c {
            Component::Normal(name) => Some(name.to_string_lossy().into_owned()),
            _ => None,
        })
        .collect();
    Some(segments.join("/"))
}

/// True when any segment of a relative path is hidden (starts with `.`)
pub fn is_hidden(relative: &str) -> bool {
    relative.split('/').any(|segment| segment.starts_with('.'))
}

/// Normalize a name into a slug: lowercase ASCII words joined by `-`
pub fn slug_for(name: &str) -> String {
    let decomposed: String = name.nfkd().filter(|c| c.is_ascii()).collect();
    let mut slug = String::with_capacity(decomposed.len());
    let mut pending_dash = false;
    for c in decomposed.chars() {
        if c.is_ascii_alphanumeric() {
            if pending_dash && !slug.is_empty() {
                slug.push('-');
            }
            pending_dash = false;
            slug.push(c.to_ascii_lowercase());
        } else {
            pending_dash = true;
        }
    }
    slug
}
