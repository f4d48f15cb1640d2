//! C-ABI wrapper around `http-toolkit-core`.
//!
//! # Overview
//! Exposes the `Uri` value type and the host-does-IO HTTP client through
//! `extern "C"` functions so any language with a C FFI can compose URLs,
//! build requests, and interpret responses.
//!
//! # Design
//! - Every `extern "C"` function wraps its body in `catch_unwind` so panics
//!   never cross the FFI boundary.
//! - `Uri` and `HttpClient` are opaque handles. Uri setters return `false`
//!   on a null argument; getters return an owned C string.
//! - A single `FfiResult` envelope conveys parsed responses and errors.
//! - The C caller owns all returned pointers and must call the matching
//!   `htk_*_free` / `htk_free_*` function to release them.

pub mod types;

use std::os::raw::c_char;
use std::panic::{catch_unwind, AssertUnwindSafe};
use std::ptr::null_mut;

use http_toolkit_core::{ClientOptions, HttpClient, Uri};

use types::*;

/// Run `f` on the Uri behind `uri`. `false` for null or a caught panic.
fn with_uri(uri: *mut FfiUri, f: impl FnOnce(&mut Uri)) -> bool {
    if uri.is_null() {
        return false;
    }
    catch_unwind(AssertUnwindSafe(|| f(unsafe { &mut (*uri).inner }))).is_ok()
}

/// Render something from the Uri behind `uri` as an owned C string.
fn uri_string(uri: *const FfiUri, f: impl FnOnce(&Uri) -> String) -> *mut c_char {
    if uri.is_null() {
        return null_mut();
    }
    catch_unwind(AssertUnwindSafe(|| c_string(f(unsafe { &(*uri).inner })))).unwrap_or(null_mut())
}

// ---------------------------------------------------------------------------
// Uri lifecycle
// ---------------------------------------------------------------------------

/// Create a `Uri` from an absolute href.
///
/// An unparsable href yields an empty Uri, not null. Returns null only if
/// `href` is null. Free with `htk_uri_free`.
#[unsafe(no_mangle)]
pub extern "C" fn htk_uri_new(href: *const c_char) -> *mut FfiUri {
    let Some(href) = read_str(href) else {
        return null_mut();
    };
    catch_unwind(|| Box::into_raw(Box::new(FfiUri { inner: Uri::new(&href) }))).unwrap_or(null_mut())
}

/// Create an empty `Uri`. Free with `htk_uri_free`.
#[unsafe(no_mangle)]
pub extern "C" fn htk_uri_empty() -> *mut FfiUri {
    Box::into_raw(Box::new(FfiUri { inner: Uri::default() }))
}

/// Field-by-field copy. Returns null if `uri` is null.
#[unsafe(no_mangle)]
pub extern "C" fn htk_uri_clone(uri: *const FfiUri) -> *mut FfiUri {
    if uri.is_null() {
        return null_mut();
    }
    catch_unwind(|| {
        let inner = unsafe { &(*uri).inner }.clone();
        Box::into_raw(Box::new(FfiUri { inner }))
    })
    .unwrap_or(null_mut())
}

/// Free a `Uri` created by this library. Safe to call with null.
#[unsafe(no_mangle)]
pub extern "C" fn htk_uri_free(uri: *mut FfiUri) {
    if !uri.is_null() {
        let _ = catch_unwind(|| {
            drop(unsafe { Box::from_raw(uri) });
        });
    }
}

/// Replace every field from `href`. On a parse failure the Uri is left as
/// it was and `InvalidUri` is returned.
#[unsafe(no_mangle)]
pub extern "C" fn htk_uri_set_href(uri: *mut FfiUri, href: *const c_char) -> FfiErrorCode {
    let Some(href) = read_str(href) else {
        return FfiErrorCode::NullArg;
    };
    if uri.is_null() {
        return FfiErrorCode::NullArg;
    }
    catch_unwind(AssertUnwindSafe(|| {
        match unsafe { &mut (*uri).inner }.try_set_href(&href, &[]) {
            Ok(_) => FfiErrorCode::Ok,
            Err(_) => FfiErrorCode::InvalidUri,
        }
    }))
    .unwrap_or(FfiErrorCode::Panic)
}

// ---------------------------------------------------------------------------
// Uri setters
// ---------------------------------------------------------------------------

#[unsafe(no_mangle)]
pub extern "C" fn htk_uri_set_protocol(uri: *mut FfiUri, protocol: *const c_char) -> bool {
    let Some(protocol) = read_str(protocol) else {
        return false;
    };
    with_uri(uri, |u| {
        u.set_protocol(protocol);
    })
}

/// Switch to `new_protocol` only when the current protocol is `old_protocol`.
#[unsafe(no_mangle)]
pub extern "C" fn htk_uri_replace_protocol(
    uri: *mut FfiUri,
    old_protocol: *const c_char,
    new_protocol: *const c_char,
) -> bool {
    let (Some(old), Some(new)) = (read_str(old_protocol), read_str(new_protocol)) else {
        return false;
    };
    with_uri(uri, |u| {
        u.replace_protocol(old, new);
    })
}

#[unsafe(no_mangle)]
pub extern "C" fn htk_uri_set_host_name(uri: *mut FfiUri, host_name: *const c_char) -> bool {
    let Some(host_name) = read_str(host_name) else {
        return false;
    };
    with_uri(uri, |u| {
        u.set_host_name(&host_name);
    })
}

#[unsafe(no_mangle)]
pub extern "C" fn htk_uri_set_port(uri: *mut FfiUri, port: u32) -> bool {
    with_uri(uri, |u| {
        u.set_port(port);
    })
}

#[unsafe(no_mangle)]
pub extern "C" fn htk_uri_set_path_name(uri: *mut FfiUri, path_name: *const c_char) -> bool {
    let Some(path_name) = read_str(path_name) else {
        return false;
    };
    with_uri(uri, |u| {
        u.set_path_name(&path_name);
    })
}

/// Join `len` segments onto the pathname. Fails if any segment is null.
#[unsafe(no_mangle)]
pub extern "C" fn htk_uri_join_path_name(
    uri: *mut FfiUri,
    segments: *const *const c_char,
    len: u32,
) -> bool {
    if segments.is_null() && len > 0 {
        return false;
    }
    let segments: Option<Vec<String>> = if len == 0 {
        Some(Vec::new())
    } else {
        unsafe { std::slice::from_raw_parts(segments, len as usize) }
            .iter()
            .map(|s| read_str(*s))
            .collect()
    };
    let Some(segments) = segments else {
        return false;
    };
    with_uri(uri, |u| {
        u.join_path_name(&segments);
    })
}

/// Overwrite the search with an already-encoded query string.
#[unsafe(no_mangle)]
pub extern "C" fn htk_uri_set_search(uri: *mut FfiUri, search: *const c_char) -> bool {
    let Some(search) = read_str(search) else {
        return false;
    };
    with_uri(uri, |u| {
        u.set_search(search);
    })
}

/// Set one parameter; `value` is percent-encoded.
#[unsafe(no_mangle)]
pub extern "C" fn htk_uri_add_query(uri: *mut FfiUri, key: *const c_char, value: *const c_char) -> bool {
    let (Some(key), Some(value)) = (read_str(key), read_str(value)) else {
        return false;
    };
    with_uri(uri, |u| {
        u.add_query(&key, &value);
    })
}

/// Merge parameters from a JSON object or a query string.
#[unsafe(no_mangle)]
pub extern "C" fn htk_uri_add_more_query(uri: *mut FfiUri, query: *const c_char) -> bool {
    let Some(query) = read_str(query) else {
        return false;
    };
    with_uri(uri, |u| match serde_json::from_str::<serde_json::Value>(&query) {
        Ok(value @ serde_json::Value::Object(_)) => {
            u.add_more_query(value);
        }
        _ => {
            u.add_more_query(query.as_str());
        }
    })
}

#[unsafe(no_mangle)]
pub extern "C" fn htk_uri_remove_query(uri: *mut FfiUri, key: *const c_char) -> bool {
    let Some(key) = read_str(key) else {
        return false;
    };
    with_uri(uri, |u| {
        u.remove_query(&key);
    })
}

#[unsafe(no_mangle)]
pub extern "C" fn htk_uri_set_hash(uri: *mut FfiUri, hash: *const c_char) -> bool {
    let Some(hash) = read_str(hash) else {
        return false;
    };
    with_uri(uri, |u| {
        u.set_hash(&hash);
    })
}

// ---------------------------------------------------------------------------
// Uri getters (free results with `htk_free_string`)
// ---------------------------------------------------------------------------

/// Full href; empty unless both protocol and host are set.
#[unsafe(no_mangle)]
pub extern "C" fn htk_uri_to_string(uri: *const FfiUri) -> *mut c_char {
    uri_string(uri, Uri::href)
}

#[unsafe(no_mangle)]
pub extern "C" fn htk_uri_protocol(uri: *const FfiUri) -> *mut c_char {
    uri_string(uri, Uri::protocol)
}

#[unsafe(no_mangle)]
pub extern "C" fn htk_uri_host(uri: *const FfiUri) -> *mut c_char {
    uri_string(uri, Uri::host)
}

#[unsafe(no_mangle)]
pub extern "C" fn htk_uri_host_name(uri: *const FfiUri) -> *mut c_char {
    uri_string(uri, |u| u.host_name().to_string())
}

#[unsafe(no_mangle)]
pub extern "C" fn htk_uri_port(uri: *const FfiUri) -> *mut c_char {
    uri_string(uri, |u| u.port().to_string())
}

#[unsafe(no_mangle)]
pub extern "C" fn htk_uri_path_name(uri: *const FfiUri) -> *mut c_char {
    uri_string(uri, |u| u.path_name().to_string())
}

#[unsafe(no_mangle)]
pub extern "C" fn htk_uri_path(uri: *const FfiUri) -> *mut c_char {
    uri_string(uri, Uri::path)
}

#[unsafe(no_mangle)]
pub extern "C" fn htk_uri_search(uri: *const FfiUri) -> *mut c_char {
    uri_string(uri, |u| u.search().to_string())
}

#[unsafe(no_mangle)]
pub extern "C" fn htk_uri_hash(uri: *const FfiUri) -> *mut c_char {
    uri_string(uri, Uri::hash)
}

/// Decoded query parameters as JSON object text.
#[unsafe(no_mangle)]
pub extern "C" fn htk_uri_query_json(uri: *const FfiUri) -> *mut c_char {
    uri_string(uri, |u| serde_json::Value::Object(u.query_data()).to_string())
}

// ---------------------------------------------------------------------------
// Client lifecycle
// ---------------------------------------------------------------------------

/// Create an `HttpClient`.
///
/// `options_json` may be null for defaults. Returns null if it is not a
/// valid options document. Free with `htk_client_free`.
#[unsafe(no_mangle)]
pub extern "C" fn htk_client_new(options_json: *const c_char) -> *mut FfiHttpClient {
    let options_json = read_str(options_json);
    catch_unwind(|| {
        let options = match options_json {
            Some(raw) => match ClientOptions::from_json(&raw) {
                Ok(options) => options,
                Err(_) => return null_mut(),
            },
            None => ClientOptions::default(),
        };
        Box::into_raw(Box::new(FfiHttpClient {
            inner: HttpClient::new(options),
        }))
    })
    .unwrap_or(null_mut())
}

/// Free a client created by `htk_client_new`. Safe to call with null.
#[unsafe(no_mangle)]
pub extern "C" fn htk_client_free(client: *mut FfiHttpClient) {
    if !client.is_null() {
        let _ = catch_unwind(|| {
            drop(unsafe { Box::from_raw(client) });
        });
    }
}

// ---------------------------------------------------------------------------
// Build request functions (free results with `htk_free_request`)
// ---------------------------------------------------------------------------

/// Build a request with an optional raw body and no content type.
///
/// Returns null if `client` or `url` is null.
#[unsafe(no_mangle)]
pub extern "C" fn htk_build_request(
    client: *const FfiHttpClient,
    method: FfiHttpMethod,
    url: *const c_char,
    body: *const c_char,
) -> *mut FfiHttpRequest {
    let (Some(url), body) = (read_str(url), read_str(body)) else {
        return null_mut();
    };
    if client.is_null() {
        return null_mut();
    }
    catch_unwind(|| {
        let client = unsafe { &(*client).inner };
        let req = match method {
            FfiHttpMethod::Get => client.build_get(&url, None),
            FfiHttpMethod::Post => client.build_post(&url, body, None),
            FfiHttpMethod::Put => client.build_put(&url, body, None),
            FfiHttpMethod::Patch => client.build_patch(&url, body, None),
        };
        FfiHttpRequest::from_core(req)
    })
    .unwrap_or(null_mut())
}

/// Build a GET whose response body the caller keeps as a stream.
#[unsafe(no_mangle)]
pub extern "C" fn htk_build_get_stream(client: *const FfiHttpClient, url: *const c_char) -> *mut FfiHttpRequest {
    let Some(url) = read_str(url) else {
        return null_mut();
    };
    if client.is_null() {
        return null_mut();
    }
    catch_unwind(|| FfiHttpRequest::from_core(unsafe { &(*client).inner }.build_get_stream(&url, None)))
        .unwrap_or(null_mut())
}

/// Build a POST, PUT, or PATCH with a JSON body.
///
/// Returns null for GET, for null arguments, or if `json` is not valid JSON.
#[unsafe(no_mangle)]
pub extern "C" fn htk_build_json(
    client: *const FfiHttpClient,
    method: FfiHttpMethod,
    url: *const c_char,
    json: *const c_char,
) -> *mut FfiHttpRequest {
    let (Some(url), Some(json)) = (read_str(url), read_str(json)) else {
        return null_mut();
    };
    if client.is_null() {
        return null_mut();
    }
    catch_unwind(|| {
        let client = unsafe { &(*client).inner };
        let json = json.as_str();
        let req = match method {
            FfiHttpMethod::Get => return null_mut(),
            FfiHttpMethod::Post => client.build_post_json(&url, json, None),
            FfiHttpMethod::Put => client.build_put_json(&url, json, None),
            FfiHttpMethod::Patch => client.build_patch_json(&url, json, None),
        };
        match req {
            Ok(req) => FfiHttpRequest::from_core(req),
            Err(_) => null_mut(),
        }
    })
    .unwrap_or(null_mut())
}

/// Build a POST or PUT with a urlencoded body from a flat JSON object.
///
/// Returns null for GET or PATCH, for null arguments, or if `fields_json`
/// is not a flat JSON object.
#[unsafe(no_mangle)]
pub extern "C" fn htk_build_form(
    client: *const FfiHttpClient,
    method: FfiHttpMethod,
    url: *const c_char,
    fields_json: *const c_char,
) -> *mut FfiHttpRequest {
    let (Some(url), Some(fields)) = (read_str(url), read_str(fields_json)) else {
        return null_mut();
    };
    if client.is_null() {
        return null_mut();
    }
    catch_unwind(|| {
        let client = unsafe { &(*client).inner };
        let Ok(fields) = serde_json::from_str::<serde_json::Map<String, serde_json::Value>>(&fields) else {
            return null_mut();
        };
        let req = match method {
            FfiHttpMethod::Post => client.build_post_form(&url, &fields, None),
            FfiHttpMethod::Put => client.build_put_form(&url, &fields, None),
            FfiHttpMethod::Get | FfiHttpMethod::Patch => return null_mut(),
        };
        match req {
            Ok(req) => FfiHttpRequest::from_core(req),
            Err(_) => null_mut(),
        }
    })
    .unwrap_or(null_mut())
}

// ---------------------------------------------------------------------------
// Parse response functions (free results with `htk_free_result`)
// ---------------------------------------------------------------------------

/// Interpret a buffered response. Only 2xx counts as success.
#[unsafe(no_mangle)]
pub extern "C" fn htk_parse_response(
    client: *const FfiHttpClient,
    response: *const FfiHttpResponse,
) -> *mut FfiResult {
    if client.is_null() {
        return FfiResult::null_arg("client");
    }
    if response.is_null() {
        return FfiResult::null_arg("response");
    }
    catch_unwind(|| {
        let client = unsafe { &(*client).inner };
        let resp = unsafe { &*response }.to_core();
        FfiResult::from_message(client.parse_response(resp))
    })
    .unwrap_or_else(|_| FfiResult::panic("panic in htk_parse_response"))
}

/// Interpret the head of a streamed response; the body is ignored.
#[unsafe(no_mangle)]
pub extern "C" fn htk_parse_stream_response(
    client: *const FfiHttpClient,
    response: *const FfiHttpResponse,
) -> *mut FfiResult {
    if client.is_null() {
        return FfiResult::null_arg("client");
    }
    if response.is_null() {
        return FfiResult::null_arg("response");
    }
    catch_unwind(|| {
        let client = unsafe { &(*client).inner };
        let resp = unsafe { &*response }.to_core();
        FfiResult::from_message(client.parse_stream_response(resp))
    })
    .unwrap_or_else(|_| FfiResult::panic("panic in htk_parse_stream_response"))
}

/// Record a request that never got a response. `message` may be null.
#[unsafe(no_mangle)]
pub extern "C" fn htk_parse_failure(client: *const FfiHttpClient, message: *const c_char) -> *mut FfiResult {
    if client.is_null() {
        return FfiResult::null_arg("client");
    }
    let message = read_str(message).unwrap_or_default();
    catch_unwind(|| FfiResult::from_message(unsafe { &(*client).inner }.parse_failure(&message)))
        .unwrap_or_else(|_| FfiResult::panic("panic in htk_parse_failure"))
}

// ---------------------------------------------------------------------------
// Free functions
// ---------------------------------------------------------------------------

/// Free an `FfiHttpRequest` returned by any `htk_build_*` function.
/// Safe to call with null.
#[unsafe(no_mangle)]
pub extern "C" fn htk_free_request(req: *mut FfiHttpRequest) {
    if !req.is_null() {
        let _ = catch_unwind(|| FfiHttpRequest::free(req));
    }
}

/// Free an `FfiResult` returned by any `htk_parse_*` function.
/// Safe to call with null.
#[unsafe(no_mangle)]
pub extern "C" fn htk_free_result(result: *mut FfiResult) {
    if !result.is_null() {
        let _ = catch_unwind(|| FfiResult::free(result));
    }
}

/// Free a C string allocated by this library. Safe to call with null.
#[unsafe(no_mangle)]
pub extern "C" fn htk_free_string(s: *mut c_char) {
    let _ = catch_unwind(|| free_c_string(s));
}

// ---------------------------------------------------------------------------
// Unit tests
// ---------------------------------------------------------------------------
