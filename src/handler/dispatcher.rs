//! Request dispatch module
//!
//! Entry point for HTTP request processing: body size check, POST handling,
//! controller/action resolution and the access log line.

use crate::config::AppState;
use crate::controllers::{ActionOutput, Controller, Params};
use crate::error::Result;
use crate::http::query::{path_segments, segment};
use crate::http::{self, SuccessHeaders};
use crate::logger::{self, AccessLogEntry};
use crate::routing::{self, DEFAULT_ACTION};
use http_body_util::{BodyExt, Full};
use hyper::body::{Body, Buf, Bytes};
use hyper::header::{HeaderMap, HeaderName, CONTENT_LENGTH, REFERER, USER_AGENT};
use hyper::{Method, Request, Response, Uri};
use std::convert::Infallible;
use std::fmt::Display;
use std::net::SocketAddr;
use std::pin::pin;
use std::sync::Arc;
use std::time::Instant;

/// Response plus the `controller#action` that produced it, for the access log
pub struct Dispatched {
    pub response: Response<Full<Bytes>>,
    pub route: Option<String>,
}

/// Main entry point for HTTP request handling
pub async fn handle_request<B>(
    req: Request<B>,
    state: Arc<AppState>,
    peer_addr: SocketAddr,
) -> Result<Response<Full<Bytes>>, Infallible>
where
    B: Body,
    B::Error: Display,
{
    let started = Instant::now();
    let (parts, body) = req.into_parts();
    let mut entry = access_entry(&parts.method, &parts.uri, &parts.headers, peer_addr);
    entry.http_version = format!("{:?}", parts.version)
        .trim_start_matches("HTTP/")
        .to_string();

    let dispatched = if let Some(resp) = check_body_size(&parts.headers, state.config.http.max_body_size) {
        Dispatched {
            response: resp,
            route: None,
        }
    } else if parts.method == Method::POST {
        let response = if drain_post_body(body, state.config.http.max_body_size).await {
            http::build_empty_response()
        } else {
            http::build_413_response()
        };
        Dispatched {
            response,
            route: None,
        }
    } else {
        dispatch(&parts.method, &parts.uri, &state).await
    };

    if state.config.logging.access_log {
        entry.status = dispatched.response.status().as_u16();
        entry.body_bytes = usize::try_from(dispatched.response.body().size_hint().exact().unwrap_or(0))
            .unwrap_or(usize::MAX);
        entry.route = dispatched.route;
        entry.request_time_us = u64::try_from(started.elapsed().as_micros()).unwrap_or(u64::MAX);
        logger::log_access(&entry, &state.config.logging.access_log_format);
    }

    Ok(dispatched.response)
}

/// Resolve and invoke the controller for a non-POST request
///
/// Nothing is written for a request until its action has succeeded; any
/// failure becomes the generic 500 JSON response.
pub async fn dispatch(method: &Method, uri: &Uri, state: &AppState) -> Dispatched {
    let path = uri.path();
    let is_head = *method == Method::HEAD;

    match invoke_route(uri, state).await {
        Ok((route, output)) => {
            let headers = SuccessHeaders {
                status: output.status,
                content_type: output
                    .content_type
                    .unwrap_or_else(|| routing::content_type_for(path)),
                gzip: output.gzip,
                cors: state.config.http.enable_cors,
                server_name: &state.config.http.server_name,
            };
            Dispatched {
                response: http::build_success_response(output.body, &headers, is_head),
                route: Some(route),
            }
        }
        Err(e) => {
            logger::log_error(&format!("{method} {uri} failed: {e}"));
            Dispatched {
                response: http::build_internal_error_response(),
                route: None,
            }
        }
    }
}

async fn invoke_route(uri: &Uri, state: &AppState) -> Result<(String, ActionOutput)> {
    let path = uri.path();

    let (controller, action, params): (Controller, &str, Params) = if routing::is_static_resource(path) {
        let controller = state.routes.resolve_resource_controller().await?;
        let resource = path.trim_start_matches('/').to_string();
        (controller, DEFAULT_ACTION, Params::Resource(resource))
    } else {
        let segments = path_segments(path);
        let controller = state.routes.resolve_controller(segment(&segments, 1)).await?;
        let action = routing::resolve_action(segment(&segments, 2));
        (controller, action, Params::Query(http::parse_query(uri.query())))
    };

    let output = controller.invoke(action, params, state).await?;
    Ok((format!("{}#{action}", controller.name()), output))
}

/// Read and discard a POST body frame by frame; POST carries no behavior yet
///
/// Returns `false` as soon as the body grows past `max_body_size`, which
/// covers bodies sent without a Content-Length.
async fn drain_post_body<B>(body: B, max_body_size: u64) -> bool
where
    B: Body,
    B::Error: Display,
{
    let mut body = pin!(body);
    let mut received: u64 = 0;

    while let Some(frame) = body.frame().await {
        match frame {
            Ok(frame) => {
                let len = frame.data_ref().map_or(0, Buf::remaining);
                received = received.saturating_add(u64::try_from(len).unwrap_or(u64::MAX));
                if received > max_body_size {
                    logger::log_error(&format!(
                        "Request body too large: over {max_body_size} bytes without a matching Content-Length"
                    ));
                    return false;
                }
            }
            Err(e) => {
                logger::log_warning(&format!("Failed to read POST body: {e}"));
                return true;
            }
        }
    }

    logger::log_debug(&format!("Received POST body of {received} bytes"));
    true
}

/// Validate Content-Length header and return 413 if exceeded
fn check_body_size(headers: &HeaderMap, max_body_size: u64) -> Option<Response<Full<Bytes>>> {
    let content_length = headers.get(CONTENT_LENGTH)?;
    content_length.to_str().map_or_else(
        |_| {
            logger::log_warning("Content-Length header contains non-ASCII characters");
            None
        },
        |size_str| match size_str.parse::<u64>() {
            Ok(size) if size > max_body_size => {
                logger::log_error(&format!(
                    "Request body too large: {size} bytes (max: {max_body_size})"
                ));
                Some(http::build_413_response())
            }
            Err(_) => {
                logger::log_warning(&format!(
                    "Invalid Content-Length value: '{size_str}', skipping size check"
                ));
                None
            }
            _ => None,
        },
    )
}

fn access_entry(method: &Method, uri: &Uri, headers: &HeaderMap, peer_addr: SocketAddr) -> AccessLogEntry {
    let header = |name: HeaderName| {
        headers
            .get(name)
            .and_then(|v| v.to_str().ok())
            .map(ToString::to_string)
    };

    let mut entry = AccessLogEntry::new(peer_addr.to_string(), method.to_string(), uri.path().to_string());
    entry.query = uri.query().map(ToString::to_string);
    entry.referer = header(REFERER);
    entry.user_agent = header(USER_AGENT);
    entry
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Config;
    use crate::routing::{RouteTable, Routes};
    use crate::storage::{CensusRecord, Database, RegionFrequencyRecord, WriteOp};
    use chrono::NaiveDate;
    use hyper::StatusCode;
    use std::collections::BTreeMap;

    const ROUTES: &str = r#"
home = "geography"
geography = "geography"
"404" = "not_found"
resources = "resources"
"#;

    async fn test_state() -> Arc<AppState> {
        let config = Config::load_from("does-not-exist").unwrap();
        let db = Database::in_memory();
        db.bulk_write(
            true,
            vec![WriteOp::InsertOne(RegionFrequencyRecord {
                month_year: NaiveDate::from_ymd_opt(2015, 7, 1).unwrap(),
                region_frequency_map: BTreeMap::from([("CA".to_string(), 10), ("INT".to_string(), 2)]),
            })],
        )
        .await
        .unwrap();
        db.bulk_write(
            true,
            vec![WriteOp::InsertOne(CensusRecord {
                region: "California".to_string(),
                postal_code: "CA".to_string(),
                census_code: "06".to_string(),
                population: Some(1000),
            })],
        )
        .await
        .unwrap();

        let mut state = AppState::with_database(&config, db);
        state.routes = RouteTable::preloaded(Routes::parse(ROUTES).unwrap());
        Arc::new(state)
    }

    fn peer() -> SocketAddr {
        "127.0.0.1:50000".parse().unwrap()
    }

    async fn send(state: &Arc<AppState>, method: Method, uri: &str) -> Response<Full<Bytes>> {
        let req = Request::builder()
            .method(method)
            .uri(uri)
            .body(Full::new(Bytes::from_static(b"name=zed")))
            .unwrap();
        handle_request(req, Arc::clone(state), peer()).await.unwrap()
    }

    async fn body_json(resp: Response<Full<Bytes>>) -> serde_json::Value {
        let bytes = resp.into_body().collect().await.unwrap().to_bytes();
        serde_json::from_slice(&bytes).unwrap()
    }

    #[tokio::test]
    async fn test_filtered_map_data() {
        let state = test_state().await;
        let resp = send(
            &state,
            Method::GET,
            "/geography/getFilteredMapData?beginningYear=2015&beginningMonth=0&endingYear=2015&endingMonth=11",
        )
        .await;
        assert_eq!(resp.status(), StatusCode::OK);
        assert_eq!(resp.headers()["Content-Type"], "application/json");
        assert_eq!(resp.headers()["Access-Control-Allow-Origin"], "*");

        let body = body_json(resp).await;
        assert_eq!(body["rawData"], serde_json::json!([["INT", 2], ["CA", 10]]));
        assert_eq!(body["perCapitaData"], serde_json::json!([["CA", 100]]));
    }

    #[tokio::test]
    async fn test_unknown_controller_is_not_found() {
        let state = test_state().await;
        let resp = send(&state, Method::GET, "/martians").await;
        assert_eq!(resp.status(), StatusCode::NOT_FOUND);
        assert_eq!(resp.headers()["Content-Type"], "text/html");
    }

    #[tokio::test]
    async fn test_home_renders_geography() {
        let state = test_state().await;
        let resp = send(&state, Method::GET, "/").await;
        assert_eq!(resp.status(), StatusCode::OK);
        let bytes = resp.into_body().collect().await.unwrap().to_bytes();
        assert!(std::str::from_utf8(&bytes).unwrap().contains("startingYear"));
    }

    #[tokio::test]
    async fn test_handler_errors_become_500_json() {
        let state = test_state().await;

        let resp = send(&state, Method::GET, "/geography/getFilteredMapData?beginningYear=2015").await;
        assert_eq!(resp.status(), StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(resp.headers()["Content-Type"], "application/json");
        let body = body_json(resp).await;
        assert_eq!(body["error"], http::response::INTERNAL_SERVER_ERROR_MESSAGE);

        let resp = send(&state, Method::GET, "/geography/selfDestruct").await;
        assert_eq!(resp.status(), StatusCode::INTERNAL_SERVER_ERROR);
    }

    #[tokio::test]
    async fn test_missing_resource_is_500() {
        let state = test_state().await;
        let resp = send(&state, Method::GET, "/scripts/does/not/exist.js").await;
        assert_eq!(resp.status(), StatusCode::INTERNAL_SERVER_ERROR);
    }

    #[tokio::test]
    async fn test_post_returns_empty_ok() {
        let state = test_state().await;
        let resp = send(&state, Method::POST, "/geography/anything").await;
        assert_eq!(resp.status(), StatusCode::OK);
        let bytes = resp.into_body().collect().await.unwrap().to_bytes();
        assert!(bytes.is_empty());
    }

    #[tokio::test]
    async fn test_head_keeps_headers_drops_body() {
        let state = test_state().await;
        let resp = send(&state, Method::HEAD, "/geography").await;
        assert_eq!(resp.status(), StatusCode::OK);
        assert_ne!(resp.headers()["Content-Length"], "0");
        let bytes = resp.into_body().collect().await.unwrap().to_bytes();
        assert!(bytes.is_empty());
    }

    #[tokio::test]
    async fn test_body_too_large() {
        let state = test_state().await;
        let req = Request::builder()
            .method(Method::POST)
            .uri("/")
            .header("content-length", "999999999")
            .body(Full::new(Bytes::new()))
            .unwrap();
        let resp = handle_request(req, state, peer()).await.unwrap();
        assert_eq!(resp.status(), StatusCode::PAYLOAD_TOO_LARGE);
    }

    #[tokio::test]
    async fn test_body_too_large_without_content_length() {
        let state = test_state().await;
        let max = usize::try_from(state.config.http.max_body_size).unwrap();
        let req = Request::builder()
            .method(Method::POST)
            .uri("/")
            .body(Full::new(Bytes::from(vec![b'x'; max + 1])))
            .unwrap();
        assert!(req.headers().get(CONTENT_LENGTH).is_none());
        let resp = handle_request(req, Arc::clone(&state), peer()).await.unwrap();
        assert_eq!(resp.status(), StatusCode::PAYLOAD_TOO_LARGE);

        let req = Request::builder()
            .method(Method::POST)
            .uri("/")
            .body(Full::new(Bytes::from(vec![b'x'; max])))
            .unwrap();
        let resp = handle_request(req, state, peer()).await.unwrap();
        assert_eq!(resp.status(), StatusCode::OK);
    }
}
