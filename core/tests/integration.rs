//! End-to-end requests against the live echo server.
//!
//! # Design
//! Starts the mock server on a random port, then builds every kind of
//! request with `Uri` + `HttpClient`, executes it with ureq through the
//! `Transport` trait, and checks what the server saw.

use std::time::Duration;

use http_toolkit_core::{
    ApiError, ClientOptions, FormData, FormPart, HttpClient, HttpMethod, HttpRequest, HttpResponse,
    ResponseType, Transport, Uri,
};
use mock_server::Echo;
use ureq::typestate::WithBody;

/// Executes an `HttpRequest` using ureq.
///
/// Disables ureq's automatic status-code-as-error behavior so 4xx/5xx
/// responses are returned as data rather than `Err`, letting the client
/// handle status interpretation.
struct UreqTransport;

fn with_headers<B>(mut builder: ureq::RequestBuilder<B>, headers: &[(String, String)]) -> ureq::RequestBuilder<B> {
    for (name, value) in headers {
        builder = builder.header(name.as_str(), value.as_str());
    }
    builder
}

fn send_body(
    builder: ureq::RequestBuilder<WithBody>,
    body: Option<&str>,
) -> Result<ureq::http::Response<ureq::Body>, ureq::Error> {
    match body {
        Some(body) => builder.send(body.as_bytes()),
        None => builder.send_empty(),
    }
}

impl Transport for UreqTransport {
    type Error = ureq::Error;

    fn execute(&self, req: &HttpRequest) -> Result<HttpResponse, ureq::Error> {
        let mut config = ureq::Agent::config_builder().http_status_as_error(false);
        if let Some(ms) = req.timeout_ms {
            config = config.timeout_global(Some(Duration::from_millis(ms)));
        }
        let agent = config.build().new_agent();

        let url = req.url.as_str();
        let body = req.body.as_deref();
        let mut response = match req.method {
            HttpMethod::Get => with_headers(agent.get(url), &req.headers).call(),
            HttpMethod::Post => send_body(with_headers(agent.post(url), &req.headers), body),
            HttpMethod::Put => send_body(with_headers(agent.put(url), &req.headers), body),
            HttpMethod::Patch => send_body(with_headers(agent.patch(url), &req.headers), body),
        }?;

        let status = response.status();
        let headers = response
            .headers()
            .iter()
            .map(|(k, v)| (k.as_str().to_string(), v.to_str().unwrap_or_default().to_string()))
            .collect();
        let body = match req.response_type {
            ResponseType::Stream => String::new(),
            ResponseType::Buffered => response.body_mut().read_to_string()?,
        };

        Ok(HttpResponse {
            status: status.as_u16(),
            status_text: status.canonical_reason().unwrap_or_default().to_string(),
            headers,
            body,
        })
    }
}

/// Start the echo server on a random port and return its address.
fn start_server() -> String {
    let std_listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
    let addr = std_listener.local_addr().unwrap();
    std_listener.set_nonblocking(true).unwrap();

    std::thread::spawn(move || {
        let rt = tokio::runtime::Builder::new_current_thread()
            .enable_all()
            .build()
            .unwrap();
        rt.block_on(async {
            let listener = tokio::net::TcpListener::from_std(std_listener).unwrap();
            mock_server::run(listener).await
        })
        .unwrap();
    });

    addr.to_string()
}

#[test]
fn requests_round_trip_through_echo_server() {
    let addr = start_server();
    let client = HttpClient::new(ClientOptions::default().with_timeout(5_000));

    // Step 1: GET with a templated uri, joined path, and encoded query.
    let mut uri = Uri::with_params("http://%s/echo//users", &[addr.as_str()]);
    uri.join_path_name(&["42"])
        .add_more_query([("page", "2")])
        .add_query("name", "a b");
    assert_eq!(uri.to_string(), format!("http://{addr}/echo/users/42?page=2&name=a%20b"));

    let msg = client.send(&UreqTransport, &client.build_get(&uri, None));
    assert!(msg.is_success, "{:?}", msg.error);
    assert_eq!(msg.status_code, Some(200));
    let echo: Echo = msg.json().unwrap();
    assert_eq!(echo.method, "GET");
    assert_eq!(echo.path, "/echo/users/42");
    assert_eq!(echo.query.as_deref(), Some("page=2&name=a%20b"));
    assert_eq!(
        echo.params,
        vec![
            ("page".to_string(), "2".to_string()),
            ("name".to_string(), "a b".to_string())
        ]
    );

    // Step 2: POST JSON.
    let mut items = Uri::new(&format!("http://{addr}"));
    items.set_path_name("echo/items");
    let req = client
        .build_post_json(&items, &serde_json::json!({"title": "Buy milk"}), None)
        .unwrap();
    let echo: Echo = client.send(&UreqTransport, &req).json().unwrap();
    assert_eq!(echo.method, "POST");
    assert_eq!(echo.content_type.as_deref(), Some("application/json"));
    let body: serde_json::Value = serde_json::from_str(&echo.body).unwrap();
    assert_eq!(body["title"], "Buy milk");

    // Step 3: PUT form.
    let req = client
        .build_put_form(&items, &[("user", "a b"), ("pass", "x&y")], None)
        .unwrap();
    let echo: Echo = client.send(&UreqTransport, &req).json().unwrap();
    assert_eq!(echo.method, "PUT");
    assert_eq!(echo.content_type.as_deref(), Some("application/x-www-form-urlencoded"));
    assert_eq!(echo.body, "user=a+b&pass=x%26y");

    // Step 4: POST multipart form data.
    let mut form = FormData::new();
    form.append("field", "value")
        .append_part(FormPart::file("upload", "notes.txt", "hello").with_content_type("text/plain"));
    let req = client.build_post_form_data(&items, &form, None);
    let echo: Echo = client.send(&UreqTransport, &req).json().unwrap();
    assert_eq!(echo.content_type, Some(form.content_type()));
    assert!(echo.body.contains("name=\"field\""));
    assert!(echo.body.contains("filename=\"notes.txt\""));
    assert!(echo.body.ends_with(&format!("--{}--\r\n", form.boundary())));

    // Step 5: PATCH JSON given as text.
    let req = client.build_patch_json(&items, r#"{"done":true}"#, None).unwrap();
    let echo: Echo = client.send(&UreqTransport, &req).json().unwrap();
    assert_eq!(echo.method, "PATCH");
    assert_eq!(echo.body, r#"{"done":true}"#);

    // Step 6: non-2xx status.
    let mut missing = items.clone();
    missing.set_path_name("/status/404");
    let msg = client.send(&UreqTransport, &client.build_get(&missing, None));
    assert!(!msg.is_success);
    assert_eq!(msg.status_code, Some(404));
    assert_eq!(msg.body_raw, "status 404");
    assert!(matches!(msg.error, Some(ApiError::Http { status: 404, .. })));

    // Step 7: streamed GET parses only the head.
    let msg = client.send(&UreqTransport, &client.build_get_stream(&uri, None));
    assert!(msg.is_success);
    assert!(msg.is_stream);
    assert!(msg.body.is_none());
    assert!(msg.header("content-type").is_some());

    // Step 8: callback style.
    let mut seen = None;
    client.send_with(&UreqTransport, &client.build_get(&uri, None), |msg| {
        seen = msg.status_code;
    });
    assert_eq!(seen, Some(200));
}

#[test]
fn transport_failure_has_no_status() {
    // Bind then drop to get a port nothing listens on.
    let port = {
        let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
        listener.local_addr().unwrap().port()
    };
    let client = HttpClient::default();
    let mut uri = Uri::default();
    uri.set_protocol("http").set_host("127.0.0.1", u32::from(port));

    let msg = client.send(&UreqTransport, &client.build_get(&uri, None));
    assert!(!msg.is_success);
    assert_eq!(msg.status_code, None);
    assert!(matches!(msg.error, Some(ApiError::Transport(_))));
}
