//! Asset URL rewriting for rendered markup
//!
//! References such as `src="assets/a.png"` are replaced by the owning node's
//! absolute URL for that file. Strategies are tried in order and the first
//! success wins.

use crate::error::RoError;
use quick_xml::events::{BytesStart, Event};
use quick_xml::reader::Reader;
use quick_xml::writer::Writer;
use regex::Regex;
use std::fmt;
use std::sync::OnceLock;
use tracing::warn;

const WRAPPER: &str = "__ro__";

/// A rewrite strategy
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Strategy {
    /// Parse as XML and rewrite attribute values; fails on malformed markup
    Structured,
    /// Textual substitution of `="assets/..."` occurrences
    Lenient,
}

/// Strategies in the order they are attempted
pub const STRATEGIES: [Strategy; 2] = [Strategy::Structured, Strategy::Lenient];

impl fmt::Display for Strategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Strategy::Structured => f.write_str("structured"),
            Strategy::Lenient => f.write_str("lenient"),
        }
    }
}

impl Strategy {
    pub fn apply<F>(&self, html: &str, url_for: &F) -> Result<String, RoError>
    where
        F: Fn(&str) -> Result<String, RoError>,
    {
        match self {
            Strategy::Structured => structured(html, url_for),
            Strategy::Lenient => lenient(html, url_for),
        }
    }
}

/// Rewrite every asset reference in `html` using `url_for`
pub fn expand_asset_urls<F>(html: &str, url_for: &F) -> Result<String, RoError>
where
    F: Fn(&str) -> Result<String, RoError>,
{
    let mut last_failure = None;
    for strategy in STRATEGIES {
        match strategy.apply(html, url_for) {
            Ok(out) => return Ok(out),
            Err(e) => {
                warn!(%strategy, "Asset url expansion failed: {}", e);
                last_failure = Some(e);
            }
        }
    }

    Err(RoError::StrategyExhausted {
        strategies: STRATEGIES
            .iter()
            .map(ToString::to_string)
            .collect::<Vec<_>>()
            .join(", "),
        message: last_failure.map(|e| e.to_string()).unwrap_or_default(),
    })
}

/// Asset path of an attribute value that is exactly an asset reference
pub fn asset_reference(value: &str) -> Option<&str> {
    static RE: OnceLock<Regex> = OnceLock::new();
    let re = RE.get_or_init(|| {
        Regex::new(r"\A(?:\./)?(assets/\S+)\s*\z").expect("asset reference pattern is valid")
    });
    re.captures(value.trim())
        .and_then(|captures| captures.get(1))
        .map(|m| m.as_str())
}

fn structured<F>(html: &str, url_for: &F) -> Result<String, RoError>
where
    F: Fn(&str) -> Result<String, RoError>,
{
    let source = format!("<{WRAPPER}>{html}</{WRAPPER}>");
    let mut reader = Reader::from_str(&source);
    reader.config_mut().check_end_names = true;
    let mut writer = Writer::new(Vec::new());

    loop {
        let event = reader.read_event().map_err(|e| malformed(e))?;
        let event = match event {
            Event::Eof => break,
            Event::Start(element) => match rewrite_element(&element, url_for)? {
                Some(rewritten) => Event::Start(rewritten),
                None => Event::Start(element),
            },
            Event::Empty(element) => match rewrite_element(&element, url_for)? {
                Some(rewritten) => Event::Empty(rewritten),
                None => Event::Empty(element),
            },
            other => other,
        };
        writer.write_event(event).map_err(|e| malformed(e))?;
    }

    let out = String::from_utf8(writer.into_inner()).map_err(|e| malformed(e))?;
    let inner = out
        .trim()
        .strip_prefix(&format!("<{WRAPPER}>"))
        .and_then(|s| s.strip_suffix(&format!("</{WRAPPER}>")))
        .ok_or_else(|| RoError::MalformedInput("markup: wrapper element lost".to_string()))?;
    Ok(inner.trim().to_string())
}

fn malformed(e: impl fmt::Display) -> RoError {
    RoError::MalformedInput(format!("markup: {}", e))
}

/// Rebuild an element when any of its attributes references an asset
fn rewrite_element<F>(
    element: &BytesStart<'_>,
    url_for: &F,
) -> Result<Option<BytesStart<'static>>, RoError>
where
    F: Fn(&str) -> Result<String, RoError>,
{
    let mut attributes = Vec::new();
    let mut changed = false;

    for attribute in element.attributes() {
        let attribute =
            attribute.map_err(|e| RoError::MalformedInput(format!("markup attribute: {}", e)))?;
        let key = String::from_utf8_lossy(attribute.key.as_ref()).into_owned();
        let value = attribute
            .unescape_value()
            .map_err(|e| RoError::MalformedInput(format!("markup attribute {}: {}", key, e)))?
            .into_owned();

        let value = match asset_reference(&value) {
            Some(path) => {
                changed = true;
                url_for(path)?
            }
            None => value,
        };
        attributes.push((key, value));
    }

    if !changed {
        return Ok(None);
    }

    let mut rewritten = element.clone().into_owned();
    rewritten.clear_attributes();
    for (key, value) in &attributes {
        rewritten.push_attribute((key.as_str(), value.as_str()));
    }
    Ok(Some(rewritten))
}

fn lenient<F>(html: &str, url_for: &F) -> Result<String, RoError>
where
    F: Fn(&str) -> Result<String, RoError>,
{
    static RE: OnceLock<Regex> = OnceLock::new();
    let re = RE.get_or_init(|| {
        Regex::new(r#"\s*=\s*['"](?:\./)?(assets/[^'"\s]+)['"]"#)
            .expect("lenient asset pattern is valid")
    });

    let mut out = String::with_capacity(html.len());
    let mut last = 0;
    for captures in re.captures_iter(html) {
        let (Some(whole), Some(path)) = (captures.get(0), captures.get(1)) else {
            continue;
        };
        out.push_str(&html[last..whole.start()]);
        out.push_str("='");
        out.push_str(&url_for(path.as_str())?);
        out.push('\'');
        last = whole.end();
    }
    out.push_str(&html[last..]);
    Ok(out)
}
