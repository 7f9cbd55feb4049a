//! Request identity: resource path plus the query parameters that are actually present.

use std::fmt;

/// Identifies a GET for caching and deduplication.
///
/// Parameters keep insertion order; `None` values are dropped when added, so
/// `/debt/?days=` with no `days` and `/debt/` are the same key.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct RequestKey {
    path: String,
    params: Vec<(String, String)>,
}

impl RequestKey {
    /// Key for `path` (relative to the API base, e.g. `/debt/latest`) with no parameters.
    pub fn new(path: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            params: Vec::new(),
        }
    }

    /// Appends a parameter.
    pub fn param(mut self, name: impl Into<String>, value: impl ToString) -> Self {
        self.params.push((name.into(), value.to_string()));
        self
    }

    /// Appends a parameter only when `value` is present.
    pub fn opt_param<V: ToString>(self, name: impl Into<String>, value: Option<V>) -> Self {
        match value {
            Some(v) => self.param(name, v),
            None => self,
        }
    }

    pub fn path(&self) -> &str {
        &self.path
    }

    pub fn params(&self) -> &[(String, String)] {
        &self.params
    }

    /// URL-encoded query string, or `None` when there are no parameters.
    pub fn query(&self) -> Option<String> {
        if self.params.is_empty() {
            return None;
        }
        let mut ser = url::form_urlencoded::Serializer::new(String::new());
        for (k, v) in &self.params {
            ser.append_pair(k, v);
        }
        Some(ser.finish())
    }
}

impl fmt::Display for RequestKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.query() {
            Some(q) => write!(f, "{}?{}", self.path, q),
            None => f.write_str(&self.path),
        }
    }
}
