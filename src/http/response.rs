//! HTTP response building module
//!
//! Provides builders for various HTTP status code responses, decoupled from specific business logic.

use http_body_util::Full;
use hyper::body::Bytes;
use hyper::{Response, StatusCode};

use super::range::ByteRange;

/// Build 304 Not Modified response
pub fn build_304_response(etag: &str, cache_control: &str) -> Response<Full<Bytes>> {
    Response::builder()
        .status(304)
        .header("ETag", etag)
        .header("Cache-Control", cache_control)
        .body(Full::new(Bytes::new()))
        .unwrap_or_else(|e| {
            log_build_error("304", &e);
            Response::new(Full::new(Bytes::new()))
        })
}

/// Build 404 Not Found response
pub fn build_404_response() -> Response<Full<Bytes>> {
    build_text_response(StatusCode::NOT_FOUND, "404 Not Found")
}

/// Build 405 Method Not Allowed response
pub fn build_405_response() -> Response<Full<Bytes>> {
    Response::builder()
        .status(405)
        .header("Content-Type", "text/plain")
        .header("Allow", "GET, HEAD, OPTIONS")
        .body(Full::new(Bytes::from("405 Method Not Allowed")))
        .unwrap_or_else(|e| {
            log_build_error("405", &e);
            Response::new(Full::new(Bytes::from("405 Method Not Allowed")))
        })
}

/// Build OPTIONS response (preflight request)
pub fn build_options_response(enable_cors: bool) -> Response<Full<Bytes>> {
    let mut builder = Response::builder()
        .status(204)
        .header("Allow", "GET, HEAD, OPTIONS");

    if enable_cors {
        builder = builder
            .header("Access-Control-Allow-Origin", "*")
            .header("Access-Control-Allow-Methods", "GET, HEAD, OPTIONS")
            .header("Access-Control-Allow-Headers", "Content-Type, Range, If-None-Match")
            .header("Access-Control-Max-Age", "86400");
    }

    builder.body(Full::new(Bytes::new())).unwrap_or_else(|e| {
        log_build_error("OPTIONS", &e);
        Response::new(Full::new(Bytes::new()))
    })
}

/// Build 413 Payload Too Large response
pub fn build_413_response() -> Response<Full<Bytes>> {
    build_text_response(StatusCode::PAYLOAD_TOO_LARGE, "413 Payload Too Large")
}

/// Build 416 Range Not Satisfiable response
pub fn build_416_response(file_size: usize) -> Response<Full<Bytes>> {
    Response::builder()
        .status(416)
        .header("Content-Type", "text/plain")
        .header("Content-Range", format!("bytes */{file_size}"))
        .body(Full::new(Bytes::from("Range Not Satisfiable")))
        .unwrap_or_else(|e| {
            log_build_error("416", &e);
            Response::new(Full::new(Bytes::from("Range Not Satisfiable")))
        })
}

/// Build a plain-text response with the given status
pub fn build_text_response(status: StatusCode, message: &str) -> Response<Full<Bytes>> {
    let body = Bytes::copy_from_slice(message.as_bytes());
    Response::builder()
        .status(status)
        .header("Content-Type", "text/plain; charset=utf-8")
        .header("Content-Length", body.len())
        .body(Full::new(body.clone()))
        .unwrap_or_else(|e| {
            log_build_error(status.as_str(), &e);
            Response::new(Full::new(body))
        })
}

/// Build health probe response
pub fn build_health_response(healthy: bool) -> Response<Full<Bytes>> {
    let (status, body) = if healthy {
        (StatusCode::OK, "ok")
    } else {
        (StatusCode::SERVICE_UNAVAILABLE, "unavailable")
    };

    Response::builder()
        .status(status)
        .header("Content-Type", "text/plain")
        .header("Cache-Control", "no-store")
        .body(Full::new(Bytes::from(body)))
        .unwrap_or_else(|e| {
            log_build_error("health", &e);
            Response::new(Full::new(Bytes::from(body)))
        })
}

/// Build 200 response for a stored object
///
/// `Content-Length` reflects the full payload even for HEAD requests.
pub fn build_object_response(
    data: Bytes,
    content_type: &str,
    etag: Option<&str>,
    cache_control: &str,
    is_head: bool,
) -> Response<Full<Bytes>> {
    let content_length = data.len();
    let body = if is_head { Bytes::new() } else { data };

    let mut builder = Response::builder()
        .status(200)
        .header("Content-Type", content_type)
        .header("Content-Length", content_length)
        .header("Cache-Control", cache_control);
    if let Some(etag) = etag {
        builder = builder.header("ETag", etag);
    }

    builder.body(Full::new(body)).unwrap_or_else(|e| {
        log_build_error("200", &e);
        Response::new(Full::new(Bytes::new()))
    })
}

/// Build success response with cache control and range support advertised
pub fn build_cached_response(
    data: Bytes,
    content_type: &str,
    etag: &str,
    cache_control: &str,
    is_head: bool,
) -> Response<Full<Bytes>> {
    let content_length = data.len();
    let body = if is_head { Bytes::new() } else { data };

    Response::builder()
        .status(200)
        .header("Content-Type", content_type)
        .header("Content-Length", content_length)
        .header("Accept-Ranges", "bytes")
        .header("ETag", etag)
        .header("Cache-Control", cache_control)
        .body(Full::new(body))
        .unwrap_or_else(|e| {
            log_build_error("200", &e);
            Response::new(Full::new(Bytes::new()))
        })
}

/// Build 206 Partial Content response
pub fn build_partial_response(
    data: Bytes,
    content_type: &str,
    etag: &str,
    cache_control: &str,
    range: ByteRange,
    total_size: usize,
    is_head: bool,
) -> Response<Full<Bytes>> {
    let ByteRange { start, end } = range;
    let content_length = range.length();
    let body = if is_head { Bytes::new() } else { data };

    Response::builder()
        .status(206)
        .header("Content-Type", content_type)
        .header("Content-Length", content_length)
        .header("Content-Range", format!("bytes {start}-{end}/{total_size}"))
        .header("Accept-Ranges", "bytes")
        .header("ETag", etag)
        .header("Cache-Control", cache_control)
        .body(Full::new(body))
        .unwrap_or_else(|e| {
            log_build_error("206", &e);
            Response::new(Full::new(Bytes::new()))
        })
}

/// Log response build error
fn log_build_error(status: &str, error: &hyper::http::Error) {
    crate::logger::log_error(&format!("Failed to build {status} response: {error}"));
}

#[cfg(test)]
mod tests {
    use super::*;
    use http_body_util::BodyExt;

    async fn body_bytes(resp: Response<Full<Bytes>>) -> Bytes {
        resp.into_body().collect().await.unwrap().to_bytes()
    }

    #[tokio::test]
    async fn test_text_response() {
        let resp = build_text_response(StatusCode::NOT_FOUND, "Chunk not found");
        assert_eq!(resp.status(), StatusCode::NOT_FOUND);
        assert_eq!(
            resp.headers()["content-type"],
            "text/plain; charset=utf-8"
        );
        assert_eq!(body_bytes(resp).await.as_ref(), b"Chunk not found");
    }

    #[tokio::test]
    async fn test_object_response_head_keeps_length() {
        let resp = build_object_response(
            Bytes::from_static(b"abcdef"),
            "image/png",
            Some("\"e1\""),
            "public, max-age=60",
            true,
        );
        assert_eq!(resp.status(), StatusCode::OK);
        assert_eq!(resp.headers()["content-length"], "6");
        assert_eq!(resp.headers()["etag"], "\"e1\"");
        assert!(body_bytes(resp).await.is_empty());
    }

    #[test]
    fn test_object_response_without_etag() {
        let resp = build_object_response(
            Bytes::from_static(b"[]"),
            "application/json",
            None,
            "public, max-age=3600",
            false,
        );
        assert!(resp.headers().get("etag").is_none());
        assert!(resp.headers().get("accept-ranges").is_none());
    }

    #[test]
    fn test_health_response() {
        assert_eq!(build_health_response(true).status(), StatusCode::OK);
        assert_eq!(
            build_health_response(false).status(),
            StatusCode::SERVICE_UNAVAILABLE
        );
    }

    #[test]
    fn test_options_response_cors() {
        let resp = build_options_response(true);
        assert_eq!(resp.status(), StatusCode::NO_CONTENT);
        assert_eq!(resp.headers()["access-control-allow-origin"], "*");
        assert!(build_options_response(false)
            .headers()
            .get("access-control-allow-origin")
            .is_none());
    }
}
