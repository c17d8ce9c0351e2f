//! HTTP protocol layer module
//!
//! Provides HTTP protocol-related base functionality, decoupled from specific business logic.
//! Shared by the object routes and the static asset fallback.

pub mod cache;
pub mod mime;
pub mod range;
pub mod response;

// Re-export commonly used types
pub use range::parse_range_header;
pub use response::{
    build_304_response, build_404_response, build_405_response, build_413_response,
    build_416_response, build_health_response, build_options_response, build_text_response,
};

use hyper::header::HeaderName;
use hyper::http::request::Parts;

/// Header value as text, if present and visible ASCII
pub fn header_str(parts: &Parts, name: HeaderName) -> Option<&str> {
    parts.headers.get(name).and_then(|v| v.to_str().ok())
}
