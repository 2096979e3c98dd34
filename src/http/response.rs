//! HTTP response building module
//!
//! Builders for the few response shapes the dispatcher produces.

use http_body_util::Full;
use hyper::body::Bytes;
use hyper::{Response, StatusCode};
use serde_json::json;

/// Message sent whenever a handler fails; details only go to the error log
pub const INTERNAL_SERVER_ERROR_MESSAGE: &str = "Something's up with our server here. We apologize \
for any inconvenience, but rest assured, the administrator has been notified and somebody will \
address this issue soon. Until then, please come back to this site later.";

/// Header options for a successful response
#[derive(Debug, Clone, Copy)]
pub struct SuccessHeaders<'a> {
    pub status: StatusCode,
    pub content_type: &'a str,
    pub gzip: bool,
    pub cors: bool,
    pub server_name: &'a str,
}

/// Build a successful response; HEAD requests keep headers but drop the body
pub fn build_success_response(
    body: Bytes,
    headers: &SuccessHeaders<'_>,
    is_head: bool,
) -> Response<Full<Bytes>> {
    let content_length = body.len();
    let body = if is_head { Bytes::new() } else { body };

    let mut builder = Response::builder()
        .status(headers.status)
        .header("Content-Type", headers.content_type)
        .header("Content-Length", content_length)
        .header("Server", headers.server_name);
    if headers.gzip {
        builder = builder.header("Content-Encoding", "gzip");
    }
    if headers.cors {
        builder = builder.header("Access-Control-Allow-Origin", "*");
    }

    builder.body(Full::new(body)).unwrap_or_else(|e| {
        log_build_error("200", &e);
        build_internal_error_response()
    })
}

/// Build the generic 500 response with a JSON `{"error": ...}` body
pub fn build_internal_error_response() -> Response<Full<Bytes>> {
    let body = json!({ "error": INTERNAL_SERVER_ERROR_MESSAGE }).to_string();
    Response::builder()
        .status(StatusCode::INTERNAL_SERVER_ERROR)
        .header("Content-Type", "application/json")
        .body(Full::new(Bytes::from(body)))
        .unwrap_or_else(|e| {
            log_build_error("500", &e);
            Response::new(Full::new(Bytes::from_static(b"{\"error\":\"Internal server error\"}")))
        })
}

/// Build an empty 200 response (POST placeholder)
pub fn build_empty_response() -> Response<Full<Bytes>> {
    Response::builder()
        .status(StatusCode::OK)
        .header("Content-Length", 0)
        .body(Full::new(Bytes::new()))
        .unwrap_or_else(|e| {
            log_build_error("200", &e);
            Response::new(Full::new(Bytes::new()))
        })
}

/// Build 413 Payload Too Large response
pub fn build_413_response() -> Response<Full<Bytes>> {
    Response::builder()
        .status(StatusCode::PAYLOAD_TOO_LARGE)
        .header("Content-Type", "application/json")
        .body(Full::new(Bytes::from(
            json!({ "error": "Payload Too Large" }).to_string(),
        )))
        .unwrap_or_else(|e| {
            log_build_error("413", &e);
            Response::new(Full::new(Bytes::new()))
        })
}

fn log_build_error(status: &str, error: &hyper::http::Error) {
    crate::logger::log_error(&format!("Failed to build {status} response: {error}"));
}
