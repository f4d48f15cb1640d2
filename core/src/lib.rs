//! URI builder and host-does-IO HTTP façade.
//!
//! # Overview
//! [`Uri`] is a mutable URL value: build it from a template, adjust protocol,
//! host, path, query, and fragment in place, then render it with `Display`.
//! [`HttpClient`] builds `HttpRequest` values and parses `HttpResponse`
//! values without touching the network. The caller executes the actual HTTP
//! round-trip, keeping the core deterministic and testable.
//!
//! # Design
//! - Every `Uri` mutator returns `&mut Uri` so calls chain.
//! - Unparsable hrefs never panic: `Uri::set_href` keeps the previous state,
//!   `Uri::try_set_href` / `Uri::parse` report the failure.
//! - Each verb helper of the client is a `build_*` method producing plain
//!   data; `parse_response` turns the host's response back into an
//!   `HttpResponseMessage`.

pub mod client;
pub mod error;
pub mod format;
pub mod http;
pub mod options;
pub mod path;
pub mod protocol;
pub mod query;
pub mod uri;

mod multipart;

pub use client::{HttpClient, HttpResponseMessage, RequestOptions, Transport};
pub use error::{ApiError, UriError};
pub use http::{HttpMethod, HttpRequest, HttpResponse, ResponseType, RetryPolicy};
pub use multipart::{FormData, FormPart};
pub use options::{ClientOptions, RetryOptions};
pub use protocol::{ProtocolError, UriProtocol};
pub use query::{QueryInput, QueryMap};
pub use uri::Uri;
