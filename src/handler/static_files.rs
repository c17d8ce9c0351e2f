//! Static asset fallback
//!
//! Requests no object route claims are handed to a [`FallbackDelegate`]. The default
//! delegate serves the single-page app bundle from disk.

use crate::config::AssetsConfig;
use crate::http::cache::{self, CachePolicy};
use crate::http::range::RangeOutcome;
use crate::http::{self, mime};
use crate::logger;
use async_trait::async_trait;
use http_body_util::Full;
use hyper::body::Bytes;
use hyper::header::{IF_NONE_MATCH, IF_RANGE, RANGE};
use hyper::http::request::Parts;
use hyper::Response;
use std::path::{Path, PathBuf};
use tokio::fs;

/// Downstream handler for requests outside every object route
///
/// Receives the request head exactly as the client sent it.
#[async_trait]
pub trait FallbackDelegate: Send + Sync {
    async fn serve(&self, parts: &Parts) -> Response<Full<Bytes>>;
}

/// Serves files below a directory, with index files and client-side route fallback
pub struct StaticAssets {
    dir: PathBuf,
    index_files: Vec<String>,
    spa_fallback: bool,
    cache_control: String,
}

impl StaticAssets {
    pub fn new(config: &AssetsConfig) -> Self {
        Self {
            dir: PathBuf::from(&config.dir),
            index_files: config.index_files.clone(),
            spa_fallback: config.spa_fallback,
            cache_control: CachePolicy::default().to_header_value(),
        }
    }

    /// Map a request path to a file inside the asset directory
    async fn resolve(&self, path: &str) -> Option<PathBuf> {
        let root = match fs::canonicalize(&self.dir).await {
            Ok(p) => p,
            Err(e) => {
                logger::log_warning(&format!(
                    "Static directory not found or inaccessible '{}': {e}",
                    self.dir.display()
                ));
                return None;
            }
        };

        let relative = path.trim_start_matches('/');
        let file_path = root.join(relative);

        let candidate = if relative.is_empty() || relative.ends_with('/') || is_dir(&file_path).await
        {
            self.find_index(&file_path).await
        } else {
            Some(file_path)
        };

        let matched = match candidate {
            Some(p) => fs::canonicalize(&p).await.ok(),
            None => None,
        };

        let canonical = match matched {
            Some(p) => p,
            // Unknown extension-less paths belong to the client-side router
            None if self.spa_fallback && !has_extension(relative) => {
                fs::canonicalize(self.find_index(&root).await?).await.ok()?
            }
            None => return None,
        };

        if !canonical.starts_with(&root) {
            logger::log_warning(&format!(
                "Path traversal attempt blocked: {} -> {}",
                path,
                canonical.display()
            ));
            return None;
        }

        Some(canonical)
    }

    async fn find_index(&self, dir: &Path) -> Option<PathBuf> {
        for index_file in &self.index_files {
            let candidate = dir.join(index_file);
            if fs::metadata(&candidate).await.is_ok_and(|m| m.is_file()) {
                return Some(candidate);
            }
        }
        None
    }

    /// Build the response for file content with `ETag` and Range support
    fn file_response(
        &self,
        parts: &Parts,
        data: Vec<u8>,
        content_type: &str,
    ) -> Response<Full<Bytes>> {
        let is_head = parts.method == hyper::Method::HEAD;
        let etag = cache::generate_etag(&data);
        let total_size = data.len();

        if cache::check_etag_match(http::header_str(parts, IF_NONE_MATCH), &etag) {
            return http::build_304_response(&etag, &self.cache_control);
        }

        let data = Bytes::from(data);
        let range = http::parse_range_header(
            http::header_str(parts, RANGE),
            http::header_str(parts, IF_RANGE),
            &etag,
            total_size,
        );
        match range {
            RangeOutcome::Partial(range) => {
                let body = if is_head {
                    Bytes::new()
                } else {
                    data.slice(range.start..=range.end)
                };
                http::response::build_partial_response(
                    body,
                    content_type,
                    &etag,
                    &self.cache_control,
                    range,
                    total_size,
                    is_head,
                )
            }
            RangeOutcome::NotSatisfiable => http::build_416_response(total_size),
            RangeOutcome::Full => http::response::build_cached_response(
                data,
                content_type,
                &etag,
                &self.cache_control,
                is_head,
            ),
        }
    }
}

#[async_trait]
impl FallbackDelegate for StaticAssets {
    async fn serve(&self, parts: &Parts) -> Response<Full<Bytes>> {
        let Some(file_path) = self.resolve(parts.uri.path()).await else {
            return http::build_404_response();
        };

        let content = match fs::read(&file_path).await {
            Ok(c) => c,
            Err(e) => {
                logger::log_error(&format!(
                    "Failed to read file '{}': {}",
                    file_path.display(),
                    e
                ));
                return http::build_404_response();
            }
        };

        let content_type = mime::get_content_type(file_path.extension().and_then(|e| e.to_str()));
        self.file_response(parts, content, content_type)
    }
}

async fn is_dir(path: &Path) -> bool {
    fs::metadata(path).await.is_ok_and(|m| m.is_dir())
}

/// Whether the last path segment looks like a file name
fn has_extension(relative: &str) -> bool {
    relative
        .rsplit('/')
        .next()
        .is_some_and(|segment| segment.contains('.'))
}
