//! Ordered form parameters for POST requests.
//!
//! # Design
//! `FormParams` keeps pairs in insertion order; the server sees them in the
//! same order they were written. Parsing a `name=value&name=value` string
//! validates every pair instead of trusting positional splits: a pair without
//! `=` or with an empty name is rejected with its index. The value is
//! everything after the first `=`, so values may themselves contain `=`.
//! Empty segments (a doubled or trailing `&`) are skipped.

use thiserror::Error;

use crate::error::RestError;

/// Reasons an `api_params` string can be rejected.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ParamError {
    /// The segment has no `=` between name and value.
    #[error("pair {index} ({pair:?}) has no '=' separator")]
    MissingSeparator { index: usize, pair: String },

    /// The segment starts with `=`.
    #[error("pair {index} ({pair:?}) has an empty name")]
    EmptyName { index: usize, pair: String },
}

/// An ordered list of name/value pairs sent as a URL-encoded form body.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FormParams {
    pairs: Vec<(String, String)>,
}

impl FormParams {
    pub fn new() -> Self {
        Self::default()
    }

    /// Parse a `key1=val1&key2=val2` string. `None` and `""` both yield an
    /// empty list.
    pub fn parse(api_params: Option<&str>) -> Result<Self, ParamError> {
        let mut params = Self::new();
        let Some(raw) = api_params else {
            return Ok(params);
        };

        for (index, pair) in raw.split('&').enumerate() {
            if pair.is_empty() {
                continue;
            }
            let (name, value) = pair.split_once('=').ok_or_else(|| ParamError::MissingSeparator {
                index,
                pair: pair.to_string(),
            })?;
            if name.is_empty() {
                return Err(ParamError::EmptyName {
                    index,
                    pair: pair.to_string(),
                });
            }
            params.push(name, value);
        }
        Ok(params)
    }

    pub fn push(&mut self, name: impl Into<String>, value: impl Into<String>) {
        self.pairs.push((name.into(), value.into()));
    }

    pub fn len(&self) -> usize {
        self.pairs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.pairs.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.pairs.iter().map(|(n, v)| (n.as_str(), v.as_str()))
    }

    /// Encode as `application/x-www-form-urlencoded` UTF-8 text.
    pub fn to_form_body(&self) -> Result<String, RestError> {
        serde_urlencoded::to_string(&self.pairs).map_err(|e| RestError::Encode(e.to_string()))
    }
}

impl<K, V> FromIterator<(K, V)> for FormParams
where
    K: Into<String>,
    V: Into<String>,
{
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        let mut params = Self::new();
        for (name, value) in iter {
            params.push(name, value);
        }
        params
    }
}

impl IntoIterator for FormParams {
    type Item = (String, String);
    type IntoIter = std::vec::IntoIter<(String, String)>;

    fn into_iter(self) -> Self::IntoIter {
        self.pairs.into_iter()
    }
}
