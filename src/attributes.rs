//! Attribute store: nested, sorted mappings whose leaves may be deferred

use crate::error::RoError;
use crate::promise::{Promise, Recipe};
use indexmap::IndexMap;
use serde_json::{Map, Value as Json};
use std::fmt;

/// A segmented key into an [`Attributes`] mapping
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Default)]
pub struct KeyPath(Vec<String>);

impl KeyPath {
    pub fn new<I, S>(segments: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        KeyPath(
            segments
                .into_iter()
                .map(Into::into)
                .filter(|s: &String| !s.is_empty())
                .collect(),
        )
    }

    /// Parse `a/b` or `a.b` into `[a, b]`
    pub fn parse(raw: &str) -> Self {
        KeyPath::new(raw.split(['/', '.']))
    }

    /// Key for a file at `relative` (a `/`-separated path under the node)
    ///
    /// Directories become nested keys and the final segment loses everything
    /// from its first `.`, so `team/ara.bio.md` maps to `[team, ara]`.
    pub fn for_file(relative: &str) -> Self {
        let mut segments: Vec<&str> = relative.split('/').collect();
        if let Some(last) = segments.pop() {
            let stem = last.split_once('.').map(|(stem, _)| stem).unwrap_or(last);
            segments.push(stem);
        }
        KeyPath::new(segments)
    }

    pub fn segments(&self) -> &[String] {
        &self.0
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Append segments, returning a new path
    pub fn join<S: Into<String>>(&self, segment: S) -> Self {
        let mut segments = self.0.clone();
        segments.push(segment.into());
        KeyPath::new(segments)
    }
}

impl fmt::Display for KeyPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0.join("/"))
    }
}

impl From<&str> for KeyPath {
    fn from(raw: &str) -> Self {
        KeyPath::parse(raw)
    }
}

impl From<String> for KeyPath {
    fn from(raw: String) -> Self {
        KeyPath::parse(&raw)
    }
}

impl From<Vec<String>> for KeyPath {
    fn from(segments: Vec<String>) -> Self {
        KeyPath::new(segments)
    }
}

impl From<&[&str]> for KeyPath {
    fn from(segments: &[&str]) -> Self {
        KeyPath::new(segments.iter().copied())
    }
}

impl<const N: usize> From<[&str; N]> for KeyPath {
    fn from(segments: [&str; N]) -> Self {
        KeyPath::new(segments)
    }
}

/// One attribute value
#[derive(Debug, Clone)]
pub enum Value {
    /// Fully materialized data (scalars, sequences)
    Data(Json),
    /// Nested mapping
    Map(Attributes),
    /// A rendered file, computed on first resolution
    Deferred(Promise),
    /// A file not yet bound to any node's load pass (read back from a cache)
    Pending(Recipe),
}

impl Value {
    /// Convert JSON into a value, turning objects into nested mappings
    pub fn from_json(json: Json) -> Self {
        match json {
            Json::Object(map) => Value::Map(Attributes::from_json_map(map)),
            other => Value::Data(other),
        }
    }

    pub fn string(s: impl Into<String>) -> Self {
        Value::Data(Json::String(s.into()))
    }

    /// Resolve a deferred leaf; mappings and data come back unchanged
    pub fn resolve(&self) -> Result<Value, RoError> {
        match self {
            Value::Deferred(promise) => Ok(Value::string(promise.resolve()?)),
            Value::Pending(recipe) => Err(unbound(recipe)),
            other => Ok(other.clone()),
        }
    }

    /// Resolve everything under this value into plain JSON
    pub fn materialize(&self) -> Result<Json, RoError> {
        match self {
            Value::Data(json) => Ok(json.clone()),
            Value::Map(map) => map.materialize(),
            Value::Deferred(promise) => Ok(Json::String(promise.resolve()?)),
            Value::Pending(recipe) => Err(unbound(recipe)),
        }
    }

    pub fn is_deferred(&self) -> bool {
        matches!(self, Value::Deferred(_) | Value::Pending(_))
    }

    pub fn as_map(&self) -> Option<&Attributes> {
        match self {
            Value::Map(map) => Some(map),
            _ => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::Data(Json::String(s)) => Some(s),
            _ => None,
        }
    }
}

fn unbound(recipe: &Recipe) -> RoError {
    RoError::NotFound(format!("{} is not bound to a node", recipe))
}

/// Mapping of attribute names to values, in insertion order
///
/// Sidecar keys keep their declaration order and rendered files follow in
/// walk order. Replacing a key keeps its position.
#[derive(Debug, Clone, Default)]
pub struct Attributes(IndexMap<String, Value>);

impl Attributes {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_json_map(map: Map<String, Json>) -> Self {
        Attributes(
            map.into_iter()
                .map(|(key, value)| (key, Value::from_json(value)))
                .collect(),
        )
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn contains_key(&self, key: &str) -> bool {
        self.0.contains_key(key)
    }

    pub fn keys(&self) -> impl Iterator<Item = &String> {
        self.0.keys()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&String, &Value)> {
        self.0.iter()
    }

    pub fn insert(&mut self, key: impl Into<String>, value: Value) -> Option<Value> {
        self.0.insert(key.into(), value)
    }

    pub fn remove(&mut self, key: &str) -> Option<Value> {
        self.0.shift_remove(key)
    }

    /// Shallow merge: top-level keys of `other` replace ours
    pub fn update(&mut self, other: Attributes) {
        self.0.extend(other.0);
    }

    /// Look up a nested value. Sequences are indexed by numeric segments.
    pub fn get(&self, key: &KeyPath) -> Option<Value> {
        let (first, rest) = key.segments().split_first()?;
        let mut current = self.0.get(first)?.clone();
        for segment in rest {
            current = match current {
                Value::Map(map) => map.0.get(segment)?.clone(),
                Value::Data(json) => Value::from_json(json_child(&json, segment)?),
                Value::Deferred(_) | Value::Pending(_) => return None,
            };
        }
        Some(current)
    }

    /// Store a value at a nested key, creating mappings along the way
    ///
    /// Intermediate values that are not mappings are replaced.
    pub fn set(&mut self, key: &KeyPath, value: Value) {
        let Some((last, parents)) = key.segments().split_last() else {
            return;
        };
        let mut current = self;
        for segment in parents {
            let slot = current
                .0
                .entry(segment.clone())
                .or_insert_with(|| Value::Map(Attributes::new()));
            if !matches!(slot, Value::Map(_)) {
                *slot = Value::Map(Attributes::new());
            }
            current = match slot {
                Value::Map(map) => map,
                _ => unreachable!("slot was just replaced with a mapping"),
            };
        }
        current.0.insert(last.clone(), value);
    }

    /// Resolve every value into a JSON object
    pub fn materialize(&self) -> Result<Json, RoError> {
        let mut out = Map::new();
        for (key, value) in &self.0 {
            out.insert(key.clone(), value.materialize()?);
        }
        Ok(Json::Object(out))
    }
}

fn json_child(json: &Json, segment: &str) -> Option<Json> {
    match json {
        Json::Array(items) => items.get(segment.parse::<usize>().ok()?).cloned(),
        Json::Object(map) => map.get(segment).cloned(),
        _ => None,
    }
}
