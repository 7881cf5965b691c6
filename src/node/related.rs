//! Related node resolution through the root index

use crate::attributes::Value;
use crate::error::RoError;
use crate::node::Node;
use serde_json::Value as Json;
use std::collections::HashSet;
use tracing::warn;

/// Attribute holding a node's relationships
pub const RELATED_KEY: &str = "related";

/// Split a names value into individual names
///
/// Strings split on commas and whitespace; sequences contribute each scalar.
pub fn names_of(value: &Json) -> Vec<String> {
    match value {
        Json::String(s) => s
            .split(|c: char| c == ',' || c.is_whitespace())
            .filter(|name| !name.is_empty())
            .map(str::to_string)
            .collect(),
        Json::Array(items) => items.iter().flat_map(names_of).collect(),
        Json::Number(n) => vec![n.to_string()],
        Json::Bool(b) => vec![b.to_string()],
        _ => Vec::new(),
    }
}

/// `(type, names)` for one relationship entry
fn target_of(relationship: &str, value: &Value) -> Result<(String, Vec<String>), RoError> {
    if let Some(map) = value.as_map() {
        if map.len() == 1 {
            if let Some((type_name, names)) = map.iter().next() {
                return Ok((type_name.clone(), names_of(&names.materialize()?)));
            }
        }
    }
    Ok((relationship.to_string(), names_of(&value.materialize()?)))
}

impl Node {
    /// Nodes named by the `related` attribute
    ///
    /// With a non-empty `filter` only those relationships are followed.
    /// Results follow the order relationships and names are declared in, and
    /// each node appears once.
    pub fn related<S: AsRef<str>>(&self, filter: &[S]) -> Result<Vec<Node>, RoError> {
        let Some(related) = self.get(RELATED_KEY)? else {
            return Ok(Vec::new());
        };
        let Some(relationships) = related.as_map() else {
            warn!(node = %self, "Ignoring `related` attribute that is not a mapping");
            return Ok(Vec::new());
        };

        let mut nodes: Vec<Node> = Vec::new();
        let mut seen = HashSet::new();

        for (relationship, value) in relationships.iter() {
            if !filter.is_empty() && !filter.iter().any(|f| f.as_ref() == relationship.as_str()) {
                continue;
            }

            let (type_name, names) = target_of(relationship, value)?;
            if names.is_empty() {
                continue;
            }
            let root = self.root().ok_or_else(|| {
                RoError::NotFound(format!("{} is not part of a root index", self))
            })?;

            for name in names {
                let identifier = format!("{}/{}", type_name, name);
                let Some(node) = root.get(&identifier)? else {
                    warn!(node = %self, %identifier, "Related node not found");
                    continue;
                };
                node.load()?;
                if seen.insert(node.identifier()) {
                    nodes.push(node);
                }
            }
        }

        Ok(nodes)
    }

    /// [`Node::related`] narrowed by `predicate`
    pub fn related_where<S, P>(&self, filter: &[S], predicate: P) -> Result<Vec<Node>, RoError>
    where
        S: AsRef<str>,
        P: Fn(&Node) -> bool,
    {
        Ok(self
            .related(filter)?
            .into_iter()
            .filter(|node| predicate(node))
            .collect())
    }
}
