//! Object route handler
//!
//! One handler serves every object route: the route entry supplies the storage key
//! namespace, the response kind and the not-found/error messages.

use http_body_util::Full;
use hyper::body::Bytes;
use hyper::header::{HeaderValue, InvalidHeaderValue};
use hyper::{Response, StatusCode};
use thiserror::Error;

use crate::config::{AppState, CacheConfig, HttpConfig, ObjectKind, RouteConfig};
use crate::handler::router::RequestContext;
use crate::http::cache::{self, CachePolicy};
use crate::http::response::build_object_response;
use crate::http::{build_304_response, build_text_response};
use crate::logger;
use crate::store::{BlobObject, Lookup, StoreError};

/// Content type of every data chunk response
const JSON_CONTENT_TYPE: &str = "application/json";

/// Failure that ends an object request with 500
#[derive(Debug, Error)]
pub enum ObjectError {
    #[error("failed to retrieve '{key}': {source}")]
    Retrieval {
        key: String,
        #[source]
        source: StoreError,
    },

    #[error("stored document '{key}' is not valid JSON: {source}")]
    Decode {
        key: String,
        #[source]
        source: serde_json::Error,
    },

    #[error("stored {field} of '{key}' is not a valid header value: {source}")]
    InvalidMetadata {
        key: String,
        field: &'static str,
        #[source]
        source: InvalidHeaderValue,
    },
}

/// Fetch the object behind `key` and answer with the route's response policy
pub async fn serve_object(
    ctx: &RequestContext<'_>,
    route: &RouteConfig,
    key: &str,
    state: &AppState,
) -> Response<Full<Bytes>> {
    let outcome = state.store.get(key).await;
    logger::log_debug(&format!(
        "lookup '{key}' via {}: {}",
        route.prefix,
        match &outcome {
            Ok(Lookup::Found(_)) => "found",
            Ok(Lookup::NotFound) => "not found",
            Err(_) => "error",
        }
    ));
    state.responses.build(ctx, route, key, outcome)
}

/// Turns store lookups into HTTP responses
///
/// Header values are fixed at construction; building a response never touches shared
/// mutable state.
#[derive(Debug, Clone)]
pub struct ResponseBuilder {
    default_image_content_type: String,
    image_cache_control: String,
    chunk_cache_control: String,
}

impl ResponseBuilder {
    pub fn new(http: &HttpConfig, cache: &CacheConfig) -> Self {
        Self {
            default_image_content_type: http.default_image_content_type.clone(),
            image_cache_control: CachePolicy::from(cache.policy_for(ObjectKind::Image))
                .to_header_value(),
            chunk_cache_control: CachePolicy::from(cache.policy_for(ObjectKind::DataChunk))
                .to_header_value(),
        }
    }

    /// Build the response for one lookup outcome
    ///
    /// Store faults and undecodable documents are logged with their cause; the client
    /// only sees the route's generic error message.
    pub fn build(
        &self,
        ctx: &RequestContext<'_>,
        route: &RouteConfig,
        key: &str,
        outcome: Result<Lookup, StoreError>,
    ) -> Response<Full<Bytes>> {
        let result = outcome
            .map_err(|source| ObjectError::Retrieval {
                key: key.to_string(),
                source,
            })
            .and_then(|lookup| self.render(ctx, route, key, lookup));

        match result {
            Ok(response) => response,
            Err(err) => {
                logger::log_error(&format!("{}: {err}", route.prefix));
                build_text_response(StatusCode::INTERNAL_SERVER_ERROR, &route.error_message)
            }
        }
    }

    fn render(
        &self,
        ctx: &RequestContext<'_>,
        route: &RouteConfig,
        key: &str,
        lookup: Lookup,
    ) -> Result<Response<Full<Bytes>>, ObjectError> {
        let Lookup::Found(object) = lookup else {
            return Ok(build_text_response(
                StatusCode::NOT_FOUND,
                &route.not_found_message,
            ));
        };

        match route.kind {
            ObjectKind::Image => self.image_response(ctx, key, object),
            ObjectKind::DataChunk => self.chunk_response(ctx, key, &object),
        }
    }

    /// Raw bytes, stored content type, immutable caching and the stored `ETag`
    ///
    /// Stored metadata that cannot travel as a header value fails the request.
    fn image_response(
        &self,
        ctx: &RequestContext<'_>,
        key: &str,
        object: BlobObject,
    ) -> Result<Response<Full<Bytes>>, ObjectError> {
        let BlobObject {
            body,
            content_type,
            etag,
        } = object;

        let content_type = content_type
            .as_deref()
            .unwrap_or(&self.default_image_content_type);
        check_header_value(key, "content type", content_type)?;
        if let Some(etag) = etag.as_deref() {
            check_header_value(key, "etag", etag)?;
            if cache::check_etag_match(ctx.if_none_match, etag) {
                return Ok(build_304_response(etag, &self.image_cache_control));
            }
        }

        Ok(build_object_response(
            body,
            content_type,
            etag.as_deref(),
            &self.image_cache_control,
            ctx.is_head,
        ))
    }

    /// Re-serialized JSON with short-lived caching and no `ETag`
    fn chunk_response(
        &self,
        ctx: &RequestContext<'_>,
        key: &str,
        object: &BlobObject,
    ) -> Result<Response<Full<Bytes>>, ObjectError> {
        let decode_error = |source| ObjectError::Decode {
            key: key.to_string(),
            source,
        };
        let document: serde_json::Value =
            serde_json::from_slice(&object.body).map_err(decode_error)?;
        let body = serde_json::to_vec(&document).map_err(decode_error)?;

        Ok(build_object_response(
            Bytes::from(body),
            JSON_CONTENT_TYPE,
            None,
            &self.chunk_cache_control,
            ctx.is_head,
        ))
    }
}

fn check_header_value(key: &str, field: &'static str, value: &str) -> Result<(), ObjectError> {
    HeaderValue::from_str(value)
        .map(drop)
        .map_err(|source| ObjectError::InvalidMetadata {
            key: key.to_string(),
            field,
            source,
        })
}
