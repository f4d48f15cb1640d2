//! Query-string representation used while mutating a `Uri`.
//!
//! # Design
//! `QueryMap` is the canonical form during manipulation: key-unique and
//! insertion-ordered, where re-inserting a key overwrites its value without
//! moving it. It is rebuilt from the raw `search` string on every read, so
//! malformed pairs disappear the first time a query method rewrites search.
//!
//! Encoding is deliberately asymmetric: `QueryMap::to_search` writes values
//! as they are, while `Uri::add_query` / `Uri::add_more_query` encode before
//! inserting.

use percent_encoding::{percent_decode_str, utf8_percent_encode, AsciiSet, NON_ALPHANUMERIC};
use serde::ser::{Serialize, SerializeMap, Serializer};

/// Everything except `A-Z a-z 0-9 - _ . ! ~ * ' ( )`.
const COMPONENT: &AsciiSet = &NON_ALPHANUMERIC
    .remove(b'-')
    .remove(b'_')
    .remove(b'.')
    .remove(b'!')
    .remove(b'~')
    .remove(b'*')
    .remove(b'\'')
    .remove(b'(')
    .remove(b')');

/// Percent-encode a single query component.
pub fn encode_component(value: &str) -> String {
    utf8_percent_encode(value, COMPONENT).to_string()
}

/// Percent-decode a single query component. `+` is left alone.
///
/// Text whose escapes do not decode to UTF-8 is returned unchanged.
pub fn decode_component(value: &str) -> String {
    match percent_decode_str(value).decode_utf8() {
        Ok(decoded) => decoded.into_owned(),
        Err(_) => value.to_string(),
    }
}

/// Key-unique, insertion-ordered query parameters.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct QueryMap {
    entries: Vec<(String, String)>,
}

impl QueryMap {
    pub fn new() -> Self {
        Self::default()
    }

    /// Parse the query part of a `search` string.
    ///
    /// Everything up to the first `?` is ignored (no `?` means no query).
    /// Pairs are split on the first `=`; pairs without one, or with an empty
    /// key, are dropped. Values are decoded, keys are not.
    pub fn parse(search: &str) -> Self {
        let mut map = QueryMap::new();
        let Some((_, query)) = search.split_once('?') else {
            return map;
        };

        for parameter in query.split('&') {
            if let Some((key, value)) = parameter.split_once('=') {
                if !key.is_empty() {
                    map.insert(key, decode_component(value));
                }
            }
        }
        map
    }

    /// Set `key`, overwriting in place if it already exists.
    pub fn insert(&mut self, key: impl Into<String>, value: impl Into<String>) {
        let key = key.into();
        let value = value.into();
        match self.entries.iter_mut().find(|(k, _)| *k == key) {
            Some(entry) => entry.1 = value,
            None => self.entries.push((key, value)),
        }
    }

    pub fn remove(&mut self, key: &str) -> Option<String> {
        let index = self.entries.iter().position(|(k, _)| k == key)?;
        Some(self.entries.remove(index).1)
    }

    pub fn get(&self, key: &str) -> Option<&str> {
        self.entries
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v.as_str())
    }

    pub fn contains_key(&self, key: &str) -> bool {
        self.get(key).is_some()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.entries.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    /// Render as `?k1=v1&k2=v2` without encoding. Empty maps render as `""`.
    pub fn to_search(&self) -> String {
        let mut search = String::new();
        for (index, (key, value)) in self.entries.iter().enumerate() {
            search.push(if index == 0 { '?' } else { '&' });
            search.push_str(key);
            search.push('=');
            search.push_str(value);
        }
        search
    }
}

impl<K: Into<String>, V: Into<String>> FromIterator<(K, V)> for QueryMap {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        let mut map = QueryMap::new();
        for (key, value) in iter {
            map.insert(key, value);
        }
        map
    }
}

impl IntoIterator for QueryMap {
    type Item = (String, String);
    type IntoIter = std::vec::IntoIter<(String, String)>;

    fn into_iter(self) -> Self::IntoIter {
        self.entries.into_iter()
    }
}

impl Serialize for QueryMap {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.entries.len()))?;
        for (key, value) in &self.entries {
            map.serialize_entry(key, value)?;
        }
        map.end()
    }
}

/// The shapes `Uri::set_search` accepts.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum QueryInput {
    /// A caller-encoded query string, with or without the leading `?`.
    Raw(String),
    /// Key/value pairs written in order, without encoding.
    Pairs(QueryMap),
}

impl QueryInput {
    pub fn is_empty(&self) -> bool {
        match self {
            QueryInput::Raw(raw) => raw.is_empty(),
            QueryInput::Pairs(pairs) => pairs.is_empty(),
        }
    }

    /// Collapse to key/value pairs. Raw strings are parsed like `search`.
    pub fn into_pairs(self) -> QueryMap {
        match self {
            QueryInput::Raw(raw) if raw.starts_with('?') => QueryMap::parse(&raw),
            QueryInput::Raw(raw) => QueryMap::parse(&format!("?{raw}")),
            QueryInput::Pairs(pairs) => pairs,
        }
    }
}

impl From<&str> for QueryInput {
    fn from(raw: &str) -> Self {
        QueryInput::Raw(raw.to_string())
    }
}

impl From<String> for QueryInput {
    fn from(raw: String) -> Self {
        QueryInput::Raw(raw)
    }
}

impl From<QueryMap> for QueryInput {
    fn from(pairs: QueryMap) -> Self {
        QueryInput::Pairs(pairs)
    }
}

impl<K: Into<String>, V: Into<String>> From<Vec<(K, V)>> for QueryInput {
    fn from(pairs: Vec<(K, V)>) -> Self {
        QueryInput::Pairs(pairs.into_iter().collect())
    }
}

impl<K: Into<String> + Clone, V: Into<String> + Clone> From<&[(K, V)]> for QueryInput {
    fn from(pairs: &[(K, V)]) -> Self {
        QueryInput::Pairs(pairs.iter().cloned().collect())
    }
}

impl<K: Into<String>, V: Into<String>, const N: usize> From<[(K, V); N]> for QueryInput {
    fn from(pairs: [(K, V); N]) -> Self {
        QueryInput::Pairs(pairs.into_iter().collect())
    }
}

impl From<serde_json::Map<String, serde_json::Value>> for QueryInput {
    fn from(object: serde_json::Map<String, serde_json::Value>) -> Self {
        QueryInput::Pairs(
            object
                .into_iter()
                .map(|(key, value)| (key, json_text(&value)))
                .collect(),
        )
    }
}

/// Objects become pairs, strings become raw queries, null clears.
impl From<serde_json::Value> for QueryInput {
    fn from(value: serde_json::Value) -> Self {
        match value {
            serde_json::Value::Object(object) => object.into(),
            serde_json::Value::Null => QueryInput::Raw(String::new()),
            serde_json::Value::String(raw) => QueryInput::Raw(raw),
            other => QueryInput::Raw(other.to_string()),
        }
    }
}

/// Text form of a JSON value as a template literal would print it.
pub(crate) fn json_text(value: &serde_json::Value) -> String {
    match value {
        serde_json::Value::String(text) => text.clone(),
        other => other.to_string(),
    }
}
