//! Mutable URL value with fluent setters.
//!
//! # Design
//! A `Uri` keeps six text fields (protocol, hostname, port, pathname,
//! search, hash). Setters normalize on write where that is cheap, getters
//! re-normalize on read, so a field written through any path reads back in
//! canonical form: `https:`, `/path`, `?k=v`, `#frag`.
//!
//! Parsing is lenient by default. `set_href` and the constructors leave the
//! previous state in place when the href does not parse; `try_set_href`,
//! `parse`, and `FromStr` expose the same parse as a `Result`.
//!
//! `Clone` copies all six fields. `reparse` is the string round-trip, which
//! drops path, query, and hash whenever protocol or host is missing.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Deserializer, Serialize, Serializer};
use url::Url;

use crate::error::UriError;
use crate::format::{collapse_slashes, format_template};
use crate::path;
use crate::query::{encode_component, QueryInput, QueryMap};

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Uri {
    protocol: String,
    hostname: String,
    port: String,
    pathname: String,
    search: String,
    hash: String,
}

impl Uri {
    /// Build from an absolute href. An unparsable href yields an empty `Uri`.
    pub fn new(href: &str) -> Self {
        Self::with_params(href, &[])
    }

    /// Build from a `%s`-style template and positional parameters.
    pub fn with_params(template: &str, params: &[&str]) -> Self {
        let mut uri = Uri::default();
        uri.set_href(template, params);
        uri
    }

    /// Strict constructor: fails instead of producing an empty `Uri`.
    pub fn parse(href: &str) -> Result<Self, UriError> {
        Self::parse_template(href, &[])
    }

    fn parse_template(template: &str, params: &[&str]) -> Result<Self, UriError> {
        if template.is_empty() {
            return Err(UriError::Empty);
        }
        let href = collapse_slashes(&format_template(template, params));
        match Url::parse(&href) {
            Ok(url) => Ok(Self::from_url(&url)),
            Err(source) => Err(UriError::Parse { href, source }),
        }
    }

    fn from_url(url: &Url) -> Self {
        Self {
            protocol: format!("{}:", url.scheme()),
            hostname: url.host_str().unwrap_or_default().to_string(),
            port: url.port().map(|p| p.to_string()).unwrap_or_default(),
            pathname: url.path().to_string(),
            search: url
                .query()
                .filter(|q| !q.is_empty())
                .map(|q| format!("?{q}"))
                .unwrap_or_default(),
            hash: url
                .fragment()
                .filter(|f| !f.is_empty())
                .map(|f| format!("#{f}"))
                .unwrap_or_default(),
        }
    }

    /// Replace every field from a freshly parsed href.
    ///
    /// On failure nothing changes and the error is only logged.
    pub fn set_href(&mut self, template: &str, params: &[&str]) -> &mut Self {
        match Self::parse_template(template, params) {
            Ok(parsed) => *self = parsed,
            Err(err) => tracing::debug!("keeping previous uri: {err}"),
        }
        self
    }

    /// Like `set_href`, but reports the parse failure. State is untouched on `Err`.
    pub fn try_set_href(&mut self, template: &str, params: &[&str]) -> Result<&mut Self, UriError> {
        *self = Self::parse_template(template, params)?;
        Ok(self)
    }

    /// Same as `to_string`: empty unless both protocol and host are set.
    pub fn href(&self) -> String {
        self.to_string()
    }

    /// String round-trip copy. See the module docs for what it drops.
    pub fn reparse(&self) -> Uri {
        Uri::new(&self.to_string())
    }

    // -----------------------------------------------------------------------
    // Protocol
    // -----------------------------------------------------------------------

    /// Accepts `https`, `https:`, `https://`, or a `UriProtocol`. Empty is ignored.
    pub fn set_protocol(&mut self, protocol: impl AsRef<str>) -> &mut Self {
        let protocol = protocol.as_ref();
        if !protocol.is_empty() {
            let protocol = protocol.replacen("//", "", 1);
            self.protocol = if protocol.ends_with(':') {
                protocol
            } else {
                format!("{protocol}:")
            };
        }
        self
    }

    /// Lower-case protocol with its trailing colon, e.g. `https:`.
    pub fn protocol(&self) -> String {
        format_protocol(&self.protocol)
    }

    /// Switch to `new` only when the current protocol equals `old`.
    pub fn replace_protocol(&mut self, old: impl AsRef<str>, new: impl AsRef<str>) -> &mut Self {
        let (old, new) = (old.as_ref(), new.as_ref());
        let current = self.protocol();
        if !current.is_empty() && !old.is_empty() && !new.is_empty() && current == format_protocol(old) {
            self.set_protocol(new);
        }
        self
    }

    // -----------------------------------------------------------------------
    // Host and port
    // -----------------------------------------------------------------------

    /// One trailing `/` is stripped. Empty input is ignored rather than clearing.
    pub fn set_host_name(&mut self, host_name: &str) -> &mut Self {
        if !host_name.is_empty() {
            self.hostname = host_name.strip_suffix('/').unwrap_or(host_name).to_string();
        }
        self
    }

    pub fn host_name(&self) -> &str {
        &self.hostname
    }

    /// Stored as decimal text; the value is not range-checked.
    pub fn set_port(&mut self, port: u32) -> &mut Self {
        self.port = port.to_string();
        self
    }

    pub fn port(&self) -> &str {
        &self.port
    }

    pub fn set_host(&mut self, host_name: &str, port: u32) -> &mut Self {
        self.set_host_name(host_name).set_port(port)
    }

    /// `hostname:port`, or just the hostname when no port is set.
    pub fn host(&self) -> String {
        if !self.hostname.is_empty() && !self.port.is_empty() {
            format!("{}:{}", self.hostname, self.port)
        } else {
            self.hostname.clone()
        }
    }

    // -----------------------------------------------------------------------
    // Path
    // -----------------------------------------------------------------------

    /// Overwrite the pathname, adding the leading `/`. Empty clears it.
    pub fn set_path_name(&mut self, path_name: &str) -> &mut Self {
        self.pathname = if path_name.is_empty() {
            String::new()
        } else {
            ensure_prefix(path_name, '/')
        };
        self
    }

    /// POSIX-join `segments` onto the current pathname. No segments, no change.
    pub fn join_path_name<S: AsRef<str>>(&mut self, segments: &[S]) -> &mut Self {
        if segments.is_empty() {
            return self;
        }
        let mut parts = Vec::with_capacity(segments.len() + 1);
        parts.push(self.pathname.as_str());
        parts.extend(segments.iter().map(AsRef::as_ref));
        let joined = path::join(&parts);
        self.set_path_name(&joined)
    }

    pub fn path_name(&self) -> &str {
        &self.pathname
    }

    /// Pathname plus search, e.g. `/users?id=3`.
    pub fn path(&self) -> String {
        let mut path = String::new();
        if !self.pathname.is_empty() {
            path.push_str(&ensure_prefix(&self.pathname, '/'));
        }
        if !self.search.is_empty() {
            path.push_str(&ensure_prefix(&self.search, '?'));
        }
        path
    }

    // -----------------------------------------------------------------------
    // Query
    // -----------------------------------------------------------------------

    /// Overwrite the search part.
    ///
    /// Raw strings are trusted as already encoded and only gain a leading
    /// `?`. Pairs are written in order, also without encoding. Empty input
    /// of either shape clears the search.
    pub fn set_search(&mut self, query: impl Into<QueryInput>) -> &mut Self {
        self.search = match query.into() {
            QueryInput::Raw(raw) if raw.is_empty() => String::new(),
            QueryInput::Raw(raw) => ensure_prefix(&raw, '?'),
            QueryInput::Pairs(pairs) => pairs.to_search(),
        };
        self
    }

    pub fn search(&self) -> &str {
        &self.search
    }

    /// Current parameters with decoded values.
    pub fn query_map(&self) -> QueryMap {
        QueryMap::parse(&self.search)
    }

    /// Current parameters as a JSON object of strings.
    pub fn query_data(&self) -> serde_json::Map<String, serde_json::Value> {
        self.query_map()
            .into_iter()
            .map(|(key, value)| (key, serde_json::Value::String(value)))
            .collect()
    }

    /// Encode `value` and set `key`, overwriting an existing entry in place.
    ///
    /// An empty key adds nothing, but search is still rewritten from the
    /// parsed map, which drops malformed pairs.
    pub fn add_query(&mut self, key: &str, value: &str) -> &mut Self {
        let mut map = self.query_map();
        if !key.is_empty() {
            map.insert(key, encode_component(value));
        }
        self.set_search(map)
    }

    /// Encode and merge many parameters at once. Existing keys are overwritten.
    ///
    /// A raw string is read as a query string first. Empty raw input is a no-op.
    pub fn add_more_query(&mut self, query: impl Into<QueryInput>) -> &mut Self {
        let query = query.into();
        if matches!(&query, QueryInput::Raw(raw) if raw.is_empty()) {
            return self;
        }
        let mut map = self.query_map();
        for (key, value) in query.into_pairs() {
            map.insert(key, encode_component(&value));
        }
        self.set_search(map)
    }

    /// Drop `key` if present and rewrite search.
    pub fn remove_query(&mut self, key: &str) -> &mut Self {
        let mut map = self.query_map();
        map.remove(key);
        self.set_search(map)
    }

    // -----------------------------------------------------------------------
    // Hash
    // -----------------------------------------------------------------------

    pub fn set_hash(&mut self, hash: &str) -> &mut Self {
        self.hash = if hash.is_empty() {
            String::new()
        } else {
            ensure_prefix(hash, '#')
        };
        self
    }

    pub fn hash(&self) -> String {
        if self.hash.is_empty() {
            String::new()
        } else {
            ensure_prefix(&self.hash, '#')
        }
    }
}

fn format_protocol(protocol: &str) -> String {
    if protocol.is_empty() {
        return String::new();
    }
    let protocol = protocol.replacen("//", "", 1);
    let protocol = if protocol.ends_with(':') {
        protocol
    } else {
        format!("{protocol}:")
    };
    protocol.to_lowercase()
}

fn ensure_prefix(value: &str, prefix: char) -> String {
    if value.starts_with(prefix) {
        value.to_string()
    } else {
        format!("{prefix}{value}")
    }
}

impl fmt::Display for Uri {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let protocol = self.protocol();
        let host = self.host();
        if protocol.is_empty() || host.is_empty() {
            return Ok(());
        }
        write!(f, "{protocol}//{host}{}{}", self.path(), self.hash())
    }
}

impl FromStr for Uri {
    type Err = UriError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Uri::parse(s)
    }
}

impl Serialize for Uri {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for Uri {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let href = String::deserialize(deserializer)?;
        Uri::parse(&href).map_err(serde::de::Error::custom)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::protocol::UriProtocol;

    #[test]
    fn parses_every_component() {
        let uri = Uri::new("HTTPS://Example.com:8443/a/b?x=1&y=2#top");
        assert_eq!(uri.protocol(), "https:");
        assert_eq!(uri.host_name(), "example.com");
        assert_eq!(uri.port(), "8443");
        assert_eq!(uri.path_name(), "/a/b");
        assert_eq!(uri.search(), "?x=1&y=2");
        assert_eq!(uri.hash(), "#top");
        assert_eq!(uri.to_string(), "https://example.com:8443/a/b?x=1&y=2#top");
    }

    #[test]
    fn default_port_is_dropped() {
        let uri = Uri::new("https://example.com:443/");
        assert_eq!(uri.port(), "");
        assert_eq!(uri.host(), "example.com");
    }

    #[test]
    fn double_slashes_collapse() {
        assert_eq!(
            Uri::new("http://example.com//api//v1").to_string(),
            "http://example.com/api/v1"
        );
    }

    #[test]
    fn template_params_are_substituted() {
        let uri = Uri::with_params("https://%s/users/%s/", &["api.example.com", "42"]);
        assert_eq!(uri.to_string(), "https://api.example.com/users/42/");
    }

    #[test]
    fn add_query_builds_encoded_search() {
        assert_eq!(
            Uri::new("https://host")
                .add_query("id", "3")
                .add_query("name", "apple")
                .to_string(),
            "https://host/?id=3&name=apple"
        );
        let mut uri = Uri::new("https://host/search");
        uri.add_query("q", "a b&c");
        assert_eq!(uri.search(), "?q=a%20b%26c");
        assert_eq!(uri.query_map().get("q"), Some("a b&c"));
    }

    #[test]
    fn add_query_overwrites_in_place() {
        let mut uri = Uri::new("https://host/?a=1&b=2");
        uri.add_query("a", "9");
        assert_eq!(uri.search(), "?a=9&b=2");
    }

    #[test]
    fn add_query_empty_key_still_normalizes() {
        let mut uri = Uri::new("https://host/?a=1&junk");
        uri.add_query("", "x");
        assert_eq!(uri.search(), "?a=1");
    }

    #[test]
    fn remove_query_clears_last_key() {
        assert_eq!(
            Uri::new("https://host/path?id=3").remove_query("id").to_string(),
            "https://host/path"
        );
    }

    #[test]
    fn remove_missing_key_is_not_an_error() {
        let mut uri = Uri::new("https://host/?a=1");
        uri.remove_query("b");
        assert_eq!(uri.search(), "?a=1");
    }

    #[test]
    fn add_more_query_merges_and_encodes() {
        let mut uri = Uri::new("https://host/?a=1");
        uri.add_more_query(vec![("b", "x y"), ("a", "2")]);
        assert_eq!(uri.search(), "?a=2&b=x%20y");

        uri.add_more_query(serde_json::json!({"page": 4}));
        assert_eq!(uri.query_map().get("page"), Some("4"));

        let before = uri.search().to_string();
        uri.add_more_query("");
        assert_eq!(uri.search(), before);
    }

    #[test]
    fn set_search_shapes() {
        let mut uri = Uri::new("https://host");
        uri.set_search("id=3");
        assert_eq!(uri.search(), "?id=3");
        uri.set_search([("q", "a b")]);
        assert_eq!(uri.search(), "?q=a b");
        uri.set_search("");
        assert_eq!(uri.search(), "");
        uri.set_search(QueryMap::new());
        assert_eq!(uri.search(), "");
    }

    #[test]
    fn query_data_is_a_json_object() {
        let uri = Uri::new("https://host/?id=3&name=%E8%98%8B%E6%9E%9C");
        let data = uri.query_data();
        assert_eq!(data["id"], "3");
        assert_eq!(data["name"], "蘋果");
    }

    #[test]
    fn json_objects_keep_their_key_order() {
        let object: serde_json::Value = serde_json::from_str(r#"{"zeta":"1","alpha":"2","mid":3}"#).unwrap();

        let mut uri = Uri::new("https://host");
        uri.set_search(object.clone());
        assert_eq!(uri.search(), "?zeta=1&alpha=2&mid=3");

        let mut merged = Uri::new("https://host/?b=0");
        merged.add_more_query(object);
        assert_eq!(merged.search(), "?b=0&zeta=1&alpha=2&mid=3");

        let data = Uri::new("https://host/?zeta=1&alpha=2").query_data();
        assert_eq!(data.keys().collect::<Vec<_>>(), ["zeta", "alpha"]);
    }

    #[test]
    fn host_and_hash_of_websocket_uri() {
        let uri = Uri::new("wss://host:8080/ws#1");
        assert_eq!(uri.host(), "host:8080");
        assert_eq!(uri.hash(), "#1");
    }

    #[test]
    fn replace_protocol_only_on_match() {
        assert_eq!(
            Uri::new("ftp://host").replace_protocol("http", "https").protocol(),
            "ftp:"
        );
        assert_eq!(
            Uri::new("http://host").replace_protocol("HTTP:", "https").protocol(),
            "https:"
        );
        assert_eq!(
            Uri::new("http://host")
                .replace_protocol(UriProtocol::Http, UriProtocol::Wss)
                .to_string(),
            "wss://host/"
        );
    }

    #[test]
    fn set_protocol_normalizes_on_read() {
        let mut uri = Uri::default();
        uri.set_protocol("HTTPS://");
        assert_eq!(uri.protocol(), "https:");
        uri.set_protocol("");
        assert_eq!(uri.protocol(), "https:");
    }

    #[test]
    fn unparsable_href_keeps_state() {
        let mut uri = Uri::new("http://a.com");
        uri.set_href("not a url", &[]);
        assert_eq!(uri.to_string(), "http://a.com/");
        assert!(uri.try_set_href("not a url", &[]).is_err());
        assert_eq!(uri.to_string(), "http://a.com/");
        assert!(matches!(Uri::parse(""), Err(UriError::Empty)));
        assert!(matches!("::".parse::<Uri>(), Err(UriError::Parse { .. })));
    }

    #[test]
    fn to_string_needs_protocol_and_host() {
        let mut uri = Uri::default();
        uri.set_path_name("api").set_hash("x");
        assert_eq!(uri.to_string(), "");
        uri.set_protocol("http");
        assert_eq!(uri.to_string(), "");
        uri.set_host("localhost", 3000);
        assert_eq!(uri.to_string(), "http://localhost:3000/api#x");
    }

    #[test]
    fn host_name_strips_one_trailing_slash() {
        let mut uri = Uri::new("http://a.com");
        uri.set_host_name("b.com/");
        assert_eq!(uri.host_name(), "b.com");
        uri.set_host_name("");
        assert_eq!(uri.host_name(), "b.com");
    }

    #[test]
    fn port_is_not_range_checked() {
        let mut uri = Uri::new("http://a.com");
        uri.set_port(70000);
        assert_eq!(uri.host(), "a.com:70000");
    }

    #[test]
    fn join_path_name_uses_posix_rules() {
        let mut uri = Uri::new("https://host/api/");
        uri.join_path_name(&["v1", "users", "..", "items"]);
        assert_eq!(uri.path_name(), "/api/v1/items");

        let mut stepwise = Uri::new("https://host/api/");
        stepwise.join_path_name(&["v1"]).join_path_name(&["users/../items"]);
        assert_eq!(stepwise.path_name(), uri.path_name());

        uri.join_path_name::<&str>(&[]);
        assert_eq!(uri.path_name(), "/api/v1/items");
    }

    #[test]
    fn join_on_empty_path_adds_slash() {
        let mut uri = Uri::default();
        uri.join_path_name(&["a", "b"]);
        assert_eq!(uri.path_name(), "/a/b");
    }

    #[test]
    fn set_path_name_and_hash_clear_on_empty() {
        let mut uri = Uri::new("https://host/p#h");
        uri.set_path_name("").set_hash("");
        assert_eq!(uri.path_name(), "");
        assert_eq!(uri.hash(), "");
        assert_eq!(uri.to_string(), "https://host");
    }

    #[test]
    fn clone_is_structural_and_reparse_is_lossy() {
        let mut unanchored = Uri::default();
        unanchored.set_path_name("/kept").set_search("a=1");
        assert_eq!(unanchored.clone(), unanchored);
        assert_eq!(unanchored.reparse(), Uri::default());

        let anchored = Uri::new("https://host:1/p?q=1#f");
        assert_eq!(anchored.clone().to_string(), anchored.to_string());
        assert_eq!(anchored.reparse().to_string(), anchored.to_string());
    }

    #[test]
    fn serde_uses_href_string() {
        let uri = Uri::new("https://host/p?q=1");
        let json = serde_json::to_string(&uri).unwrap();
        assert_eq!(json, r#""https://host/p?q=1""#);
        let back: Uri = serde_json::from_str(&json).unwrap();
        assert_eq!(back, uri);
        assert!(serde_json::from_str::<Uri>(r#""nope""#).is_err());
    }
}
