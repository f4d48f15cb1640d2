//! Verb helpers that build requests and parse responses for the host.
//!
//! # Design
//! `HttpClient` holds only its `ClientOptions` and carries no mutable state
//! between calls. Each verb helper is a `build_*` method producing an
//! `HttpRequest`; `parse_response` consumes the host's `HttpResponse`. The
//! caller executes the actual HTTP round-trip, either directly or through
//! the `Transport` trait used by `send` / `send_with`.

use std::fmt;

use serde::de::DeserializeOwned;
use serde::Serialize;

use crate::error::ApiError;
use crate::http::{find_header, HttpMethod, HttpRequest, HttpResponse, ResponseType};
use crate::multipart::FormData;
use crate::options::ClientOptions;

const CONTENT_TYPE: &str = "content-type";
const JSON: &str = "application/json";
const FORM: &str = "application/x-www-form-urlencoded";

/// Per-request pass-through settings.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RequestOptions {
    pub headers: Vec<(String, String)>,
}

impl RequestOptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.push((name.into(), value.into()));
        self
    }
}

/// Executes requests on behalf of `HttpClient::send`.
pub trait Transport {
    type Error: fmt::Display;

    fn execute(&self, request: &HttpRequest) -> Result<HttpResponse, Self::Error>;
}

impl<F, E> Transport for F
where
    F: Fn(&HttpRequest) -> Result<HttpResponse, E>,
    E: fmt::Display,
{
    type Error = E;

    fn execute(&self, request: &HttpRequest) -> Result<HttpResponse, E> {
        self(request)
    }
}

/// Outcome of a round-trip, successful or not.
///
/// `status_code` and `status_message` are `None` when the host never got a
/// response. `error` is set for transport failures and non-2xx statuses.
#[derive(Debug, Clone, PartialEq)]
pub struct HttpResponseMessage {
    pub status_code: Option<u16>,
    pub status_message: Option<String>,
    pub headers: Vec<(String, String)>,
    /// JSON when the body parses as JSON, otherwise the text as a JSON string.
    pub body: Option<serde_json::Value>,
    pub body_raw: String,
    pub is_success: bool,
    pub error: Option<ApiError>,
    /// The body stayed with the host as a stream.
    pub is_stream: bool,
}

impl HttpResponseMessage {
    pub fn header(&self, name: &str) -> Option<&str> {
        find_header(&self.headers, name)
    }

    /// Deserialize the body, or return the recorded error.
    pub fn json<T: DeserializeOwned>(&self) -> Result<T, ApiError> {
        if let Some(err) = &self.error {
            return Err(err.clone());
        }
        let body = self.body.clone().unwrap_or(serde_json::Value::Null);
        serde_json::from_value(body).map_err(|e| ApiError::Deserialization(e.to_string()))
    }
}

/// Synchronous, stateless HTTP façade.
#[derive(Debug, Clone, Default)]
pub struct HttpClient {
    options: ClientOptions,
}

impl HttpClient {
    pub fn new(options: ClientOptions) -> Self {
        Self { options }
    }

    pub fn options(&self) -> &ClientOptions {
        &self.options
    }

    /// Build a request with client options applied.
    ///
    /// Headers from `options` come first; method, url, and body are always
    /// the ones passed here.
    pub fn build_request(
        &self,
        method: HttpMethod,
        url: impl fmt::Display,
        body: Option<String>,
        options: Option<&RequestOptions>,
    ) -> HttpRequest {
        let request = HttpRequest {
            method,
            url: url.to_string(),
            headers: options.map(|o| o.headers.clone()).unwrap_or_default(),
            body,
            response_type: ResponseType::Buffered,
            timeout_ms: (self.options.timeout > 0).then_some(self.options.timeout),
            accept_invalid_certs: self.options.accepts_invalid_certs(),
            retry: self.options.retry_options.as_ref().map(|r| r.policy()),
        };
        tracing::trace!(method = %request.method, url = %request.url, "built request");
        request
    }

    fn build_typed(
        &self,
        method: HttpMethod,
        url: impl fmt::Display,
        content_type: &str,
        body: String,
        options: Option<&RequestOptions>,
    ) -> HttpRequest {
        let mut request = self.build_request(method, url, Some(body), options);
        if request.header(CONTENT_TYPE).is_none() {
            request.headers.push((CONTENT_TYPE.to_string(), content_type.to_string()));
        }
        request
    }

    fn build_json<T: Serialize + ?Sized>(
        &self,
        method: HttpMethod,
        url: impl fmt::Display,
        data: &T,
        options: Option<&RequestOptions>,
    ) -> Result<HttpRequest, ApiError> {
        let body = to_json_body(data)?;
        Ok(self.build_typed(method, url, JSON, body, options))
    }

    fn build_form<T: Serialize + ?Sized>(
        &self,
        method: HttpMethod,
        url: impl fmt::Display,
        data: &T,
        options: Option<&RequestOptions>,
    ) -> Result<HttpRequest, ApiError> {
        let body = serde_urlencoded::to_string(data).map_err(|e| ApiError::Serialization(e.to_string()))?;
        Ok(self.build_typed(method, url, FORM, body, options))
    }

    fn build_form_data(
        &self,
        method: HttpMethod,
        url: impl fmt::Display,
        form: &FormData,
        options: Option<&RequestOptions>,
    ) -> HttpRequest {
        self.build_typed(method, url, &form.content_type(), form.encode(), options)
    }

    // -----------------------------------------------------------------------
    // GET
    // -----------------------------------------------------------------------

    pub fn build_get(&self, url: impl fmt::Display, options: Option<&RequestOptions>) -> HttpRequest {
        self.build_request(HttpMethod::Get, url, None, options)
    }

    /// GET whose body the host keeps as a stream.
    pub fn build_get_stream(&self, url: impl fmt::Display, options: Option<&RequestOptions>) -> HttpRequest {
        HttpRequest {
            response_type: ResponseType::Stream,
            ..self.build_get(url, options)
        }
    }

    // -----------------------------------------------------------------------
    // POST
    // -----------------------------------------------------------------------

    pub fn build_post(
        &self,
        url: impl fmt::Display,
        body: Option<String>,
        options: Option<&RequestOptions>,
    ) -> HttpRequest {
        self.build_request(HttpMethod::Post, url, body, options)
    }

    pub fn build_post_json<T: Serialize + ?Sized>(
        &self,
        url: impl fmt::Display,
        data: &T,
        options: Option<&RequestOptions>,
    ) -> Result<HttpRequest, ApiError> {
        self.build_json(HttpMethod::Post, url, data, options)
    }

    pub fn build_post_form<T: Serialize + ?Sized>(
        &self,
        url: impl fmt::Display,
        data: &T,
        options: Option<&RequestOptions>,
    ) -> Result<HttpRequest, ApiError> {
        self.build_form(HttpMethod::Post, url, data, options)
    }

    pub fn build_post_form_data(
        &self,
        url: impl fmt::Display,
        form: &FormData,
        options: Option<&RequestOptions>,
    ) -> HttpRequest {
        self.build_form_data(HttpMethod::Post, url, form, options)
    }

    // -----------------------------------------------------------------------
    // PUT
    // -----------------------------------------------------------------------

    pub fn build_put(
        &self,
        url: impl fmt::Display,
        body: Option<String>,
        options: Option<&RequestOptions>,
    ) -> HttpRequest {
        self.build_request(HttpMethod::Put, url, body, options)
    }

    pub fn build_put_json<T: Serialize + ?Sized>(
        &self,
        url: impl fmt::Display,
        data: &T,
        options: Option<&RequestOptions>,
    ) -> Result<HttpRequest, ApiError> {
        self.build_json(HttpMethod::Put, url, data, options)
    }

    pub fn build_put_form<T: Serialize + ?Sized>(
        &self,
        url: impl fmt::Display,
        data: &T,
        options: Option<&RequestOptions>,
    ) -> Result<HttpRequest, ApiError> {
        self.build_form(HttpMethod::Put, url, data, options)
    }

    pub fn build_put_form_data(
        &self,
        url: impl fmt::Display,
        form: &FormData,
        options: Option<&RequestOptions>,
    ) -> HttpRequest {
        self.build_form_data(HttpMethod::Put, url, form, options)
    }

    // -----------------------------------------------------------------------
    // PATCH
    // -----------------------------------------------------------------------

    pub fn build_patch(
        &self,
        url: impl fmt::Display,
        body: Option<String>,
        options: Option<&RequestOptions>,
    ) -> HttpRequest {
        self.build_request(HttpMethod::Patch, url, body, options)
    }

    pub fn build_patch_json<T: Serialize + ?Sized>(
        &self,
        url: impl fmt::Display,
        data: &T,
        options: Option<&RequestOptions>,
    ) -> Result<HttpRequest, ApiError> {
        self.build_json(HttpMethod::Patch, url, data, options)
    }

    // -----------------------------------------------------------------------
    // Responses
    // -----------------------------------------------------------------------

    /// Interpret a buffered response. Only 2xx counts as success.
    pub fn parse_response(&self, response: HttpResponse) -> HttpResponseMessage {
        let mut message = self.parse_head(&response);
        let (body, body_raw) = parse_body(response.body);
        message.body = body;
        message.body_raw = body_raw;
        if let Some(err) = &message.error {
            tracing::debug!("request failed: {err}");
        }
        message
    }

    /// Interpret the head of a streamed response; the body is ignored.
    pub fn parse_stream_response(&self, response: HttpResponse) -> HttpResponseMessage {
        HttpResponseMessage {
            is_stream: true,
            ..self.parse_head(&response)
        }
    }

    /// Record a failure where no response was received.
    pub fn parse_failure(&self, error: impl fmt::Display) -> HttpResponseMessage {
        let error = ApiError::Transport(error.to_string());
        tracing::debug!("{error}");
        HttpResponseMessage {
            status_code: None,
            status_message: None,
            headers: Vec::new(),
            body: None,
            body_raw: String::new(),
            is_success: false,
            error: Some(error),
            is_stream: false,
        }
    }

    fn parse_head(&self, response: &HttpResponse) -> HttpResponseMessage {
        let is_success = (200..300).contains(&response.status);
        let error = (!is_success).then(|| ApiError::Http {
            status: response.status,
            body: response.body.clone(),
        });
        HttpResponseMessage {
            status_code: Some(response.status),
            status_message: Some(response.status_text.clone()),
            headers: response.headers.clone(),
            body: None,
            body_raw: String::new(),
            is_success,
            error,
            is_stream: false,
        }
    }

    /// Execute `request` through `transport` and parse the outcome.
    pub fn send<T: Transport + ?Sized>(&self, transport: &T, request: &HttpRequest) -> HttpResponseMessage {
        match transport.execute(request) {
            Ok(response) if request.response_type == ResponseType::Stream => self.parse_stream_response(response),
            Ok(response) => self.parse_response(response),
            Err(err) => self.parse_failure(err),
        }
    }

    /// Callback flavour of `send`.
    pub fn send_with<T, F>(&self, transport: &T, request: &HttpRequest, callback: F)
    where
        T: Transport + ?Sized,
        F: FnOnce(HttpResponseMessage),
    {
        callback(self.send(transport, request));
    }
}

/// Serialize to JSON text. A value that serializes to a JSON string is
/// taken to be JSON text already and is parsed first.
fn to_json_body<T: Serialize + ?Sized>(data: &T) -> Result<String, ApiError> {
    let value = serde_json::to_value(data).map_err(|e| ApiError::Serialization(e.to_string()))?;
    let value = match value {
        serde_json::Value::String(text) => {
            serde_json::from_str(&text).map_err(|e| ApiError::Serialization(e.to_string()))?
        }
        other => other,
    };
    Ok(value.to_string())
}

fn parse_body(raw: String) -> (Option<serde_json::Value>, String) {
    if raw.is_empty() {
        return (None, raw);
    }
    match serde_json::from_str::<serde_json::Value>(&raw) {
        Ok(serde_json::Value::String(text)) => (Some(serde_json::Value::String(text.clone())), text),
        Ok(value) => {
            let compact = value.to_string();
            (Some(value), compact)
        }
        Err(_) => (Some(serde_json::Value::String(raw.clone())), raw),
    }
}
