//! Error types for URI parsing and the HTTP façade.
//!
//! # Design
//! `UriError` only surfaces through the strict entry points (`Uri::parse`,
//! `Uri::try_set_href`); the lenient mutators swallow it. `ApiError` covers
//! everything the client can report about a request or a response: non-2xx
//! statuses keep the raw status and body for debugging.

/// Errors returned by the strict `Uri` constructors.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum UriError {
    /// The href (after substitution) was empty.
    #[error("empty href")]
    Empty,

    /// The href is not an absolute URL.
    #[error("invalid href '{href}': {source}")]
    Parse {
        href: String,
        source: url::ParseError,
    },
}

/// Errors returned by `HttpClient` build and parse methods.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ApiError {
    /// The server answered with a status outside 2xx.
    #[error("HTTP {status}: {body}")]
    Http { status: u16, body: String },

    /// The host could not complete the round-trip.
    #[error("transport failed: {0}")]
    Transport(String),

    /// The response body could not be deserialized into the expected type.
    #[error("deserialization failed: {0}")]
    Deserialization(String),

    /// The request payload could not be serialized.
    #[error("serialization failed: {0}")]
    Serialization(String),
}

impl ApiError {
    /// Status code carried by an `Http` error.
    pub fn status(&self) -> Option<u16> {
        match self {
            ApiError::Http { status, .. } => Some(*status),
            _ => None,
        }
    }
}
