//! `#[repr(C)]` types for the FFI boundary.
//!
//! # Design
//! Each type mirrors a core type but uses C-compatible representations:
//! `*mut c_char` instead of `String`, boxed slices instead of `Vec`, and
//! enums with explicit discriminants. Conversion functions live here to keep
//! `lib.rs` focused on the `extern "C"` surface.

use std::ffi::{CStr, CString};
use std::os::raw::c_char;

use http_toolkit_core::{ApiError, HttpClient, HttpMethod, HttpRequest, HttpResponse, HttpResponseMessage, ResponseType, Uri};

/// Opaque handle to a `Uri`.
pub struct FfiUri {
    pub(crate) inner: Uri,
}

/// Opaque handle to an `HttpClient`.
pub struct FfiHttpClient {
    pub(crate) inner: HttpClient,
}

/// Allocate a C string. Interior NULs yield an empty string.
pub(crate) fn c_string(s: String) -> *mut c_char {
    CString::new(s).unwrap_or_default().into_raw()
}

/// Borrow a caller string. `None` for null; invalid UTF-8 is replaced.
pub(crate) fn read_str(ptr: *const c_char) -> Option<String> {
    if ptr.is_null() {
        return None;
    }
    Some(unsafe { CStr::from_ptr(ptr) }.to_string_lossy().into_owned())
}

pub(crate) fn free_c_string(ptr: *mut c_char) {
    if !ptr.is_null() {
        drop(unsafe { CString::from_raw(ptr) });
    }
}

// ---------------------------------------------------------------------------
// Request types
// ---------------------------------------------------------------------------

/// HTTP method as a C enum.
#[repr(C)]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FfiHttpMethod {
    Get = 0,
    Post = 1,
    Put = 2,
    Patch = 3,
}

impl From<HttpMethod> for FfiHttpMethod {
    fn from(m: HttpMethod) -> Self {
        match m {
            HttpMethod::Get => FfiHttpMethod::Get,
            HttpMethod::Post => FfiHttpMethod::Post,
            HttpMethod::Put => FfiHttpMethod::Put,
            HttpMethod::Patch => FfiHttpMethod::Patch,
        }
    }
}

/// A single HTTP header as a key-value pair of C strings.
#[repr(C)]
pub struct FfiHeader {
    pub key: *mut c_char,
    pub value: *mut c_char,
}

/// An HTTP request described as C-compatible plain data.
///
/// Built by `htk_build_*` functions. The C caller executes the request,
/// honouring the timeout, certificate, and retry fields, and passes the
/// response back through `htk_parse_*`.
#[repr(C)]
pub struct FfiHttpRequest {
    pub method: FfiHttpMethod,
    pub url: *mut c_char,
    pub headers: *mut FfiHeader,
    pub headers_len: u32,
    /// Null when the request has no body.
    pub body: *mut c_char,
    /// Keep the response body as a stream and call `htk_parse_stream_response`.
    pub stream: bool,
    /// `0` means no timeout.
    pub timeout_ms: u64,
    pub accept_invalid_certs: bool,
    /// Attempts after the first; `0` disables retry.
    pub retry: u32,
    pub retry_delay_ms: u64,
}

impl FfiHttpRequest {
    /// Convert a core `HttpRequest` into a heap-allocated `FfiHttpRequest`.
    pub(crate) fn from_core(req: HttpRequest) -> *mut Self {
        let headers_len = req.headers.len() as u32;
        let headers = if req.headers.is_empty() {
            std::ptr::null_mut()
        } else {
            let headers: Box<[FfiHeader]> = req
                .headers
                .into_iter()
                .map(|(k, v)| FfiHeader {
                    key: c_string(k),
                    value: c_string(v),
                })
                .collect();
            Box::into_raw(headers) as *mut FfiHeader
        };
        let retry = req.retry.unwrap_or(http_toolkit_core::RetryPolicy {
            retry: 0,
            retry_delay_ms: 0,
        });

        Box::into_raw(Box::new(FfiHttpRequest {
            method: req.method.into(),
            url: c_string(req.url),
            headers,
            headers_len,
            body: req.body.map(c_string).unwrap_or(std::ptr::null_mut()),
            stream: req.response_type == ResponseType::Stream,
            timeout_ms: req.timeout_ms.unwrap_or(0),
            accept_invalid_certs: req.accept_invalid_certs,
            retry: retry.retry,
            retry_delay_ms: retry.retry_delay_ms,
        }))
    }

    /// Release every allocation owned by `ptr`.
    pub(crate) fn free(ptr: *mut Self) {
        let req = unsafe { Box::from_raw(ptr) };
        free_c_string(req.url);
        free_c_string(req.body);
        if !req.headers.is_null() && req.headers_len > 0 {
            let headers = unsafe {
                Box::from_raw(std::ptr::slice_from_raw_parts_mut(
                    req.headers,
                    req.headers_len as usize,
                ))
            };
            for h in headers.iter() {
                free_c_string(h.key);
                free_c_string(h.value);
            }
        }
    }
}

// ---------------------------------------------------------------------------
// Response input (caller-provided, not heap-allocated by us)
// ---------------------------------------------------------------------------

/// An HTTP response described as C-compatible plain data.
///
/// The C caller constructs this on the stack after executing a request,
/// then passes a pointer to a `htk_parse_*` function. The FFI layer reads
/// but does not free these fields. Any pointer may be null.
#[repr(C)]
pub struct FfiHttpResponse {
    pub status: u16,
    pub status_text: *const c_char,
    pub headers: *const FfiHeader,
    pub headers_len: u32,
    pub body: *const c_char,
}

impl FfiHttpResponse {
    pub(crate) fn to_core(&self) -> HttpResponse {
        let headers = if self.headers.is_null() {
            Vec::new()
        } else {
            unsafe { std::slice::from_raw_parts(self.headers, self.headers_len as usize) }
                .iter()
                .filter_map(|h| Some((read_str(h.key)?, read_str(h.value)?)))
                .collect()
        };
        HttpResponse {
            status: self.status,
            status_text: read_str(self.status_text).unwrap_or_default(),
            headers,
            body: read_str(self.body).unwrap_or_default(),
        }
    }
}

// ---------------------------------------------------------------------------
// Result types
// ---------------------------------------------------------------------------

/// Error codes returned in `FfiResult` and by fallible Uri calls.
#[repr(C)]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FfiErrorCode {
    Ok = 0,
    Http = 1,
    Transport = 2,
    Deserialization = 3,
    Serialization = 4,
    InvalidUri = 5,
    Panic = 6,
    NullArg = 7,
}

impl From<&ApiError> for FfiErrorCode {
    fn from(err: &ApiError) -> Self {
        match err {
            ApiError::Http { .. } => FfiErrorCode::Http,
            ApiError::Transport(_) => FfiErrorCode::Transport,
            ApiError::Deserialization(_) => FfiErrorCode::Deserialization,
            ApiError::Serialization(_) => FfiErrorCode::Serialization,
        }
    }
}

/// Result envelope for all parse operations.
///
/// `http_status` is `0` when no response was received. `body_raw` is the
/// body text (empty for streams); `error_message` is null on success.
#[repr(C)]
pub struct FfiResult {
    pub error_code: FfiErrorCode,
    pub error_message: *mut c_char,
    pub http_status: u16,
    pub is_success: bool,
    pub is_stream: bool,
    pub body_raw: *mut c_char,
}

impl FfiResult {
    pub(crate) fn from_message(msg: HttpResponseMessage) -> *mut Self {
        let (error_code, error_message) = match &msg.error {
            Some(err) => (FfiErrorCode::from(err), c_string(err.to_string())),
            None => (FfiErrorCode::Ok, std::ptr::null_mut()),
        };
        Box::into_raw(Box::new(FfiResult {
            error_code,
            error_message,
            http_status: msg.status_code.unwrap_or(0),
            is_success: msg.is_success,
            is_stream: msg.is_stream,
            body_raw: c_string(msg.body_raw),
        }))
    }

    fn failure(error_code: FfiErrorCode, msg: String) -> *mut Self {
        Box::into_raw(Box::new(FfiResult {
            error_code,
            error_message: c_string(msg),
            http_status: 0,
            is_success: false,
            is_stream: false,
            body_raw: std::ptr::null_mut(),
        }))
    }

    /// Build an error result for a null argument.
    pub(crate) fn null_arg(name: &str) -> *mut Self {
        Self::failure(FfiErrorCode::NullArg, format!("null argument: {name}"))
    }

    /// Build an error result for a caught panic.
    pub(crate) fn panic(msg: &str) -> *mut Self {
        Self::failure(FfiErrorCode::Panic, msg.to_string())
    }

    pub(crate) fn free(ptr: *mut Self) {
        let result = unsafe { Box::from_raw(ptr) };
        free_c_string(result.error_message);
        free_c_string(result.body_raw);
    }
}
