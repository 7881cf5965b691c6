//! URL construction: base URL + joined path + deterministic query string

use crate::error::RoError;
use crate::path;
use url::{form_urlencoded, Url};

/// Options accepted by every URL builder
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct UrlOptions {
    /// Overrides the configured base URL
    pub base: Option<String>,
    /// Query parameters; a key may carry several values
    pub query: Vec<(String, Vec<String>)>,
    pub fragment: Option<String>,
}

impl UrlOptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_base(mut self, base: impl Into<String>) -> Self {
        self.base = Some(base.into());
        self
    }

    /// Add a query parameter (repeated keys accumulate values)
    pub fn with_query(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        let key = key.into();
        let value = value.into();
        match self.query.iter_mut().find(|(k, _)| *k == key) {
            Some((_, values)) => values.push(value),
            None => self.query.push((key, vec![value])),
        }
        self
    }

    pub fn with_fragment(mut self, fragment: impl Into<String>) -> Self {
        self.fragment = Some(fragment.into());
        self
    }
}

/// Build a URL from a base, path fragments and options
///
/// Absolute bases (`https://host/prefix`) go through [`Url`]; path-only bases
/// (`/ro`, or empty) are joined textually.
pub fn url_for<S: AsRef<str>>(
    default_base: &str,
    parts: &[S],
    options: &UrlOptions,
) -> Result<String, RoError> {
    let base = options.base.as_deref().unwrap_or(default_base);
    let joined = path::join(parts);
    let query = query_string_for(&options.query);

    match Url::parse(base) {
        Ok(mut url) => {
            let mut full_path = path::absolute(&[url.path(), joined.as_str()]);
            if full_path == "/" {
                full_path.clear();
            }
            url.set_path(&full_path);
            url.set_query(if query.is_empty() { None } else { Some(&query) });
            url.set_fragment(options.fragment.as_deref());
            Ok(url.to_string())
        }
        Err(url::ParseError::RelativeUrlWithoutBase) => {
            let mut out = path::absolute(&[base, joined.as_str()]);
            if !query.is_empty() {
                out.push('?');
                out.push_str(&query);
            }
            if let Some(fragment) = &options.fragment {
                out.push('#');
                out.push_str(fragment);
            }
            Ok(out)
        }
        Err(e) => Err(RoError::Config(format!("Invalid base url {:?}: {}", base, e))),
    }
}

/// Build a query string
///
/// Multi-valued keys expand into repeated `key=value` pairs, empty values
/// into a bare `key`. Pairs are stably ordered by their encoded length.
pub fn query_string_for(params: &[(String, Vec<String>)]) -> String {
    let mut pairs: Vec<String> = Vec::new();
    for (key, values) in params {
        for value in values {
            if value.is_empty() {
                pairs.push(escape(key));
            } else {
                pairs.push(format!("{}={}", escape(key), escape(value)));
            }
        }
    }
    pairs.sort_by_key(|pair| pair.len());
    pairs.join("&")
}

/// Form-style escaping: spaces become `+`
fn escape(value: &str) -> String {
    form_urlencoded::byte_serialize(value.as_bytes()).collect()
}
