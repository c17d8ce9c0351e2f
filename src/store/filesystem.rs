//! Filesystem blob store backend
//!
//! Keys map to files below a root directory. HTTP metadata lives in an optional JSON
//! sidecar next to the object (`<key>.meta.json`).

use async_trait::async_trait;
use hyper::body::Bytes;
use serde::Deserialize;
use std::io::{self, ErrorKind};
use std::path::{Component, Path, PathBuf};
use tokio::fs;

use super::{BlobObject, Lookup, ObjectStore, StoreError};
use crate::http::{cache, mime};
use crate::logger;

/// Suffix of the metadata sidecar file
pub const METADATA_SUFFIX: &str = ".meta.json";

/// Sidecar metadata, mirroring the HTTP metadata a bucket keeps per object
#[derive(Debug, Default, Deserialize)]
struct ObjectMetadata {
    #[serde(default)]
    content_type: Option<String>,
    #[serde(default)]
    etag: Option<String>,
}

/// Blob store reading objects from a local directory tree
#[derive(Debug, Clone)]
pub struct FsObjectStore {
    root: PathBuf,
    infer_content_type: bool,
}

impl FsObjectStore {
    pub fn new(root: impl Into<PathBuf>, infer_content_type: bool) -> Self {
        Self {
            root: root.into(),
            infer_content_type,
        }
    }

    /// Map a key to a path below the root
    ///
    /// Only plain path segments are accepted: `..`, `.`, and absolute keys never leave
    /// the root.
    fn resolve(&self, key: &str) -> Result<PathBuf, StoreError> {
        let relative = Path::new(key);
        if relative
            .components()
            .any(|c| !matches!(c, Component::Normal(_)))
        {
            logger::log_warning(&format!("Path traversal attempt blocked: key '{key}'"));
            return Err(StoreError::InvalidKey(key.to_string()));
        }
        Ok(self.root.join(relative))
    }

    async fn read_metadata(&self, key: &str, path: &Path) -> Result<ObjectMetadata, StoreError> {
        let mut sidecar = path.as_os_str().to_owned();
        sidecar.push(METADATA_SUFFIX);

        match fs::read(PathBuf::from(sidecar)).await {
            Ok(raw) => serde_json::from_slice(&raw).map_err(|source| StoreError::Metadata {
                key: key.to_string(),
                source,
            }),
            Err(e) if is_missing(&e) => Ok(ObjectMetadata::default()),
            Err(e) => Err(e.into()),
        }
    }
}

#[async_trait]
impl ObjectStore for FsObjectStore {
    async fn get(&self, key: &str) -> Result<Lookup, StoreError> {
        // Sidecars are metadata, not objects
        if key.ends_with(METADATA_SUFFIX) {
            return Ok(Lookup::NotFound);
        }

        let path = self.resolve(key)?;

        // Missing files and directories (e.g. the bare namespace key `data/`) are not found
        match fs::metadata(&path).await {
            Ok(meta) if meta.is_file() => {}
            Ok(_) => return Ok(Lookup::NotFound),
            Err(e) if is_missing(&e) => return Ok(Lookup::NotFound),
            Err(e) => return Err(e.into()),
        }

        let body = match fs::read(&path).await {
            Ok(data) => Bytes::from(data),
            Err(e) if is_missing(&e) => return Ok(Lookup::NotFound),
            Err(e) => return Err(e.into()),
        };

        let metadata = self.read_metadata(key, &path).await?;

        let content_type = metadata.content_type.or_else(|| {
            if self.infer_content_type {
                mime::lookup_content_type(path.extension().and_then(|e| e.to_str()))
                    .map(ToString::to_string)
            } else {
                None
            }
        });
        let etag = Some(
            metadata
                .etag
                .unwrap_or_else(|| cache::generate_etag(&body)),
        );

        Ok(Lookup::Found(BlobObject {
            body,
            content_type,
            etag,
        }))
    }

    async fn health_check(&self) -> Result<(), StoreError> {
        let meta = fs::metadata(&self.root).await?;
        if meta.is_dir() {
            Ok(())
        } else {
            Err(StoreError::Unavailable(format!(
                "store root '{}' is not a directory",
                self.root.display()
            )))
        }
    }
}

/// Absent, or reached through a path segment that is a regular file
fn is_missing(err: &io::Error) -> bool {
    matches!(err.kind(), ErrorKind::NotFound | ErrorKind::NotADirectory)
}
