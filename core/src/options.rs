//! Client configuration.
//!
//! # Design
//! Field names follow the JSON shape callers already use (`timeout`,
//! `strictSSL`, `retryOptions`), so a config file can be fed straight into
//! `ClientOptions::from_json`. Missing fields mean no timeout and no retry.
//!
//! Certificate checks are only relaxed by an explicit `strictSSL: false`.
//! A client built with no options at all (`ClientOptions::default()`) is
//! the one case that starts lax.

use serde::{Deserialize, Serialize};

use crate::error::ApiError;
use crate::http::RetryPolicy;

const DEFAULT_RETRY: u32 = 3;
const DEFAULT_RETRY_DELAY_MS: u64 = 100;

/// Settings applied to every request an `HttpClient` builds.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ClientOptions {
    /// Request timeout in milliseconds; `0` disables it.
    #[serde(default)]
    pub timeout: u64,
    /// Verify TLS certificates. Only `Some(false)` lets the host accept any certificate.
    #[serde(default, rename = "strictSSL", skip_serializing_if = "Option::is_none")]
    pub strict_ssl: Option<bool>,
    /// Retry is off unless this is present.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub retry_options: Option<RetryOptions>,
}

/// The no-options client: no timeout, no retry, lax certificates.
impl Default for ClientOptions {
    fn default() -> Self {
        Self {
            timeout: 0,
            strict_ssl: Some(false),
            retry_options: None,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct RetryOptions {
    pub retry: Option<u32>,
    /// Milliseconds between attempts.
    pub retry_delay: Option<u64>,
}

impl ClientOptions {
    pub fn from_json(raw: &str) -> Result<Self, ApiError> {
        serde_json::from_str(raw).map_err(|e| ApiError::Deserialization(e.to_string()))
    }

    pub fn with_timeout(mut self, timeout_ms: u64) -> Self {
        self.timeout = timeout_ms;
        self
    }

    pub fn with_strict_ssl(mut self, strict: bool) -> Self {
        self.strict_ssl = Some(strict);
        self
    }

    /// Whether requests should skip certificate verification.
    pub fn accepts_invalid_certs(&self) -> bool {
        self.strict_ssl == Some(false)
    }

    pub fn with_retry(mut self, retry: RetryOptions) -> Self {
        self.retry_options = Some(retry);
        self
    }
}

impl RetryOptions {
    pub fn policy(&self) -> RetryPolicy {
        RetryPolicy {
            retry: self.retry.unwrap_or(DEFAULT_RETRY),
            retry_delay_ms: self.retry_delay.unwrap_or(DEFAULT_RETRY_DELAY_MS),
        }
    }
}
