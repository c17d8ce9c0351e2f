//! Request routing dispatch module
//!
//! Entry point for HTTP request processing: method validation, health probes, object
//! route matching and hand-off to the static fallback.

use crate::config::AppState;
use crate::handler::objects;
use crate::http;
use crate::logger::{self, AccessLogEntry};
use crate::routing::{RouteDecision, RouteKind};
use http_body_util::Full;
use hyper::body::{Body, Bytes};
use hyper::header::{self, HeaderValue};
use hyper::http::request::Parts;
use hyper::{Method, Request, Response, Version};
use std::convert::Infallible;
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Instant;

/// Request context encapsulating information needed for request processing
pub struct RequestContext<'a> {
    pub path: &'a str,
    pub is_head: bool,
    pub if_none_match: Option<&'a str>,
}

impl<'a> RequestContext<'a> {
    pub fn from_parts(parts: &'a Parts) -> Self {
        Self {
            path: parts.uri.path(),
            is_head: parts.method == Method::HEAD,
            if_none_match: http::header_str(parts, header::IF_NONE_MATCH),
        }
    }
}

/// Main entry point for HTTP request handling
///
/// The request body is never read; only the head takes part in routing.
pub async fn handle_request<B>(
    req: Request<B>,
    state: Arc<AppState>,
    peer_addr: SocketAddr,
) -> Result<Response<Full<Bytes>>, Infallible> {
    let started = Instant::now();
    let (parts, _body) = req.into_parts();

    let (mut response, route_kind) = dispatch(&parts, &state).await;

    if let Ok(server) = HeaderValue::from_str(&state.config.http.server_name) {
        response.headers_mut().insert(header::SERVER, server);
    }

    if state.config.logging.access_log {
        log_access(&parts, &response, route_kind, peer_addr, started, &state);
    }

    Ok(response)
}

async fn dispatch(
    parts: &Parts,
    state: &AppState,
) -> (Response<Full<Bytes>>, Option<RouteKind>) {
    // 1. Check HTTP method
    if let Some(resp) = check_http_method(&parts.method, state.config.http.enable_cors) {
        return (resp, None);
    }

    // 2. Check body size
    if let Some(resp) = check_body_size(parts, state.config.http.max_body_size) {
        return (resp, None);
    }

    let ctx = RequestContext::from_parts(parts);

    // 3. Health probes
    if let Some(resp) = check_health(&ctx, state).await {
        return (resp, None);
    }

    // 4. Object routes, then the fallback
    let decision = state.matcher.match_path(ctx.path);
    let kind = decision.kind();
    let response = match decision {
        RouteDecision::Object { route, key } => {
            objects::serve_object(&ctx, route, &key, state).await
        }
        RouteDecision::NoMatch => state.fallback.serve(parts).await,
    };
    (response, Some(kind))
}

/// Check HTTP method and return appropriate response for non-GET/HEAD methods
fn check_http_method(method: &Method, enable_cors: bool) -> Option<Response<Full<Bytes>>> {
    match method {
        &Method::GET | &Method::HEAD => None,
        &Method::OPTIONS => Some(http::build_options_response(enable_cors)),
        _ => {
            logger::log_warning(&format!("Method not allowed: {method}"));
            Some(http::build_405_response())
        }
    }
}

/// Validate Content-Length header and return 413 if exceeded
fn check_body_size(parts: &Parts, max_body_size: u64) -> Option<Response<Full<Bytes>>> {
    let content_length = parts.headers.get(header::CONTENT_LENGTH)?;
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

/// Liveness always answers; readiness asks the object store
async fn check_health(
    ctx: &RequestContext<'_>,
    state: &AppState,
) -> Option<Response<Full<Bytes>>> {
    let health = &state.config.health;
    if !health.enabled {
        return None;
    }

    if ctx.path == health.liveness_path {
        return Some(http::build_health_response(true));
    }

    if ctx.path == health.readiness_path {
        let healthy = match state.store.health_check().await {
            Ok(()) => true,
            Err(e) => {
                logger::log_warning(&format!("Readiness check failed: {e}"));
                false
            }
        };
        return Some(http::build_health_response(healthy));
    }

    None
}

fn log_access(
    parts: &Parts,
    response: &Response<Full<Bytes>>,
    route_kind: Option<RouteKind>,
    peer_addr: SocketAddr,
    started: Instant,
    state: &AppState,
) {
    let mut entry = AccessLogEntry::new(
        peer_addr.ip().to_string(),
        parts.method.to_string(),
        parts.uri.path().to_string(),
    );
    entry.query = parts.uri.query().map(ToString::to_string);
    entry.http_version = version_label(parts.version).to_string();
    entry.status = response.status().as_u16();
    entry.body_bytes = response
        .body()
        .size_hint()
        .exact()
        .and_then(|n| usize::try_from(n).ok())
        .unwrap_or(0);
    entry.referer = http::header_str(parts, header::REFERER).map(ToString::to_string);
    entry.user_agent = http::header_str(parts, header::USER_AGENT).map(ToString::to_string);
    entry.request_time_us = u64::try_from(started.elapsed().as_micros()).unwrap_or(u64::MAX);
    entry.route_kind = route_kind.map(RouteKind::as_str);

    logger::log_access(&entry, &state.config.logging.access_log_format);
}

const fn version_label(version: Version) -> &'static str {
    match version {
        Version::HTTP_09 => "0.9",
        Version::HTTP_10 => "1.0",
        Version::HTTP_2 => "2",
        Version::HTTP_3 => "3",
        _ => "1.1",
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Config;
    use crate::handler::static_files::FallbackDelegate;
    use crate::store::{
        BlobObject, FsObjectStore, Lookup, MemoryObjectStore, MockObjectStore, StoreError,
    };
    use async_trait::async_trait;
    use http_body_util::BodyExt;
    use hyper::StatusCode;
    use std::sync::Mutex;

    /// Records the request heads it receives and answers 404 like an empty bundle
    #[derive(Default)]
    struct RecordingFallback {
        seen: Mutex<Vec<(Method, String, Option<String>)>>,
    }

    #[async_trait]
    impl FallbackDelegate for RecordingFallback {
        async fn serve(&self, parts: &Parts) -> Response<Full<Bytes>> {
            let accept = parts
                .headers
                .get(header::ACCEPT)
                .and_then(|v| v.to_str().ok())
                .map(ToString::to_string);
            self.seen
                .lock()
                .unwrap()
                .push((parts.method.clone(), parts.uri.to_string(), accept));
            http::build_404_response()
        }
    }

    fn config() -> Config {
        let mut cfg = Config::load_from("does-not-exist/blobgate").unwrap();
        cfg.logging.access_log = false;
        cfg
    }

    fn state_with(
        store: Arc<dyn crate::store::ObjectStore>,
    ) -> (Arc<AppState>, Arc<RecordingFallback>) {
        let fallback = Arc::new(RecordingFallback::default());
        let state = AppState::new(config(), store, fallback.clone());
        (Arc::new(state), fallback)
    }

    fn peer() -> SocketAddr {
        "127.0.0.1:40000".parse().unwrap()
    }

    async fn send(state: &Arc<AppState>, req: Request<()>) -> Response<Full<Bytes>> {
        handle_request(req, Arc::clone(state), peer()).await.unwrap()
    }

    fn get(uri: &str) -> Request<()> {
        Request::get(uri).body(()).unwrap()
    }

    async fn body_of(resp: Response<Full<Bytes>>) -> Bytes {
        resp.into_body().collect().await.unwrap().to_bytes()
    }

    #[tokio::test]
    async fn test_image_route_maps_key() {
        let mut store = MockObjectStore::new();
        store
            .expect_get()
            .withf(|key| key == "images/foo.jpg")
            .times(1)
            .returning(|_| {
                Ok(Lookup::Found(
                    BlobObject::new(&b"B"[..])
                        .with_content_type("image/png")
                        .with_etag("\"r2\""),
                ))
            });
        let (state, fallback) = state_with(Arc::new(store));

        let resp = send(&state, get("/images/foo.jpg")).await;
        assert_eq!(resp.status(), StatusCode::OK);
        assert_eq!(resp.headers()["content-type"], "image/png");
        assert_eq!(resp.headers()["etag"], "\"r2\"");
        assert_eq!(resp.headers()["server"], "blobgate/0.1");
        assert_eq!(body_of(resp).await.as_ref(), b"B");
        assert!(fallback.seen.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_nested_photo_key() {
        let mut store = MockObjectStore::new();
        store
            .expect_get()
            .withf(|key| key == "photos/2021/a.webp")
            .returning(|_| Ok(Lookup::NotFound));
        let (state, _) = state_with(Arc::new(store));

        let resp = send(&state, get("/photos/2021/a.webp")).await;
        assert_eq!(resp.status(), StatusCode::NOT_FOUND);
        assert_eq!(body_of(resp).await.as_ref(), b"Photo not found");
    }

    #[tokio::test]
    async fn test_data_chunk_route() {
        let store = MemoryObjectStore::new().with_object(
            "data/data-0.json",
            BlobObject::new(&br#"[{"id":1,"title":"Sunset"}]"#[..]),
        );
        let (state, _) = state_with(Arc::new(store));

        let resp = send(&state, get("/data/data-0.json")).await;
        assert_eq!(resp.status(), StatusCode::OK);
        assert_eq!(resp.headers()["content-type"], "application/json");
        assert_eq!(resp.headers()["cache-control"], "public, max-age=3600");
        let value: serde_json::Value = serde_json::from_slice(&body_of(resp).await).unwrap();
        assert_eq!(value, serde_json::json!([{"id": 1, "title": "Sunset"}]));
    }

    #[tokio::test]
    async fn test_longer_prefix_is_not_captured_by_shorter() {
        let mut store = MockObjectStore::new();
        store
            .expect_get()
            .withf(|key| key == "photosdata/p-3.json")
            .times(1)
            .returning(|_| Ok(Lookup::NotFound));
        let (state, _) = state_with(Arc::new(store));

        let resp = send(&state, get("/photosdata/p-3.json")).await;
        assert_eq!(body_of(resp).await.as_ref(), b"Photo data not found");
    }

    #[tokio::test]
    async fn test_store_failure_is_generic_500() {
        let mut store = MockObjectStore::new();
        store
            .expect_get()
            .returning(|_| Err(StoreError::Unavailable("disk on fire".to_string())));
        let (state, _) = state_with(Arc::new(store));

        let resp = send(&state, get("/images/foo.jpg")).await;
        assert_eq!(resp.status(), StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(body_of(resp).await.as_ref(), b"Error loading image");
    }

    #[tokio::test]
    async fn test_unmatched_request_reaches_fallback_untouched() {
        let mut store = MockObjectStore::new();
        store.expect_get().never();
        let (state, fallback) = state_with(Arc::new(store));

        let req = Request::head("/about?tab=1")
            .header(header::ACCEPT, "text/html")
            .body(())
            .unwrap();
        let resp = send(&state, req).await;
        assert_eq!(resp.status(), StatusCode::NOT_FOUND);

        let seen = fallback.seen.lock().unwrap();
        assert_eq!(
            *seen,
            vec![(
                Method::HEAD,
                "/about?tab=1".to_string(),
                Some("text/html".to_string())
            )]
        );
    }

    #[tokio::test]
    async fn test_prefix_without_trailing_slash_falls_through() {
        let (state, fallback) = state_with(Arc::new(MemoryObjectStore::new()));
        let _ = send(&state, get("/images")).await;
        let _ = send(&state, get("/imagesfoo.jpg")).await;
        assert_eq!(fallback.seen.lock().unwrap().len(), 2);
    }

    #[tokio::test]
    async fn test_methods() {
        let (state, _) = state_with(Arc::new(MemoryObjectStore::new()));

        let post = Request::post("/images/a.jpg").body(()).unwrap();
        let resp = send(&state, post).await;
        assert_eq!(resp.status(), StatusCode::METHOD_NOT_ALLOWED);

        let options = Request::options("/images/a.jpg").body(()).unwrap();
        assert_eq!(send(&state, options).await.status(), StatusCode::NO_CONTENT);
    }

    #[tokio::test]
    async fn test_oversized_body_rejected() {
        let (state, _) = state_with(Arc::new(MemoryObjectStore::new()));
        let req = Request::get("/images/a.jpg")
            .header(header::CONTENT_LENGTH, "999999999")
            .body(())
            .unwrap();
        assert_eq!(
            send(&state, req).await.status(),
            StatusCode::PAYLOAD_TOO_LARGE
        );
    }

    #[tokio::test]
    async fn test_health_probes() {
        let (state, _) = state_with(Arc::new(MemoryObjectStore::new()));
        assert_eq!(send(&state, get("/healthz")).await.status(), StatusCode::OK);
        assert_eq!(send(&state, get("/readyz")).await.status(), StatusCode::OK);

        let mut store = MockObjectStore::new();
        store
            .expect_health_check()
            .returning(|| Err(StoreError::Unavailable("root missing".to_string())));
        let (state, _) = state_with(Arc::new(store));
        assert_eq!(
            send(&state, get("/readyz")).await.status(),
            StatusCode::SERVICE_UNAVAILABLE
        );
    }

    #[test]
    fn test_request_context_from_parts() {
        let (parts, ()) = Request::head("/images/a.jpg")
            .header(header::IF_NONE_MATCH, "\"v1\"")
            .body(())
            .unwrap()
            .into_parts();
        let ctx = RequestContext::from_parts(&parts);
        assert_eq!(ctx.path, "/images/a.jpg");
        assert!(ctx.is_head);
        assert_eq!(ctx.if_none_match, Some("\"v1\""));
    }

    #[tokio::test]
    async fn test_path_below_stored_file_is_route_404() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::create_dir_all(dir.path().join("images")).unwrap();
        std::fs::write(dir.path().join("images/foo.jpg"), b"B").unwrap();
        let (state, _) = state_with(Arc::new(FsObjectStore::new(dir.path(), true)));

        for uri in ["/images/foo.jpg/extra.jpg", "/images/foo.jpg/"] {
            let resp = send(&state, get(uri)).await;
            assert_eq!(resp.status(), StatusCode::NOT_FOUND, "{uri}");
            assert_eq!(body_of(resp).await.as_ref(), b"Image not found");
        }
    }
}
