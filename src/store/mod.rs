//! Object store client module
//!
//! Narrow read-only capability over a key-value blob namespace. A lookup has three
//! outcomes: the object, a first-class "not found", or a backend fault on the error
//! channel.

mod filesystem;
#[cfg(test)]
mod memory;

pub use filesystem::FsObjectStore;
#[cfg(test)]
pub use memory::MemoryObjectStore;

use async_trait::async_trait;
use hyper::body::Bytes;
#[cfg(test)]
use mockall::automock;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Invalid key: {0}")]
    InvalidKey(String),

    #[error("Corrupt metadata for {key}: {source}")]
    Metadata {
        key: String,
        #[source]
        source: serde_json::Error,
    },

    #[error("Store unavailable: {0}")]
    Unavailable(String),
}

/// A retrieved object: payload plus the HTTP metadata stored alongside it
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BlobObject {
    pub body: Bytes,
    pub content_type: Option<String>,
    /// Opaque integrity tag, already quoted for use as an `ETag`
    pub etag: Option<String>,
}

#[cfg(test)]
impl BlobObject {
    pub fn new(body: impl Into<Bytes>) -> Self {
        Self {
            body: body.into(),
            content_type: None,
            etag: None,
        }
    }

    #[must_use]
    pub fn with_content_type(mut self, content_type: impl Into<String>) -> Self {
        self.content_type = Some(content_type.into());
        self
    }

    #[must_use]
    pub fn with_etag(mut self, etag: impl Into<String>) -> Self {
        self.etag = Some(etag.into());
        self
    }
}

/// Successful lookup outcome
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Lookup {
    Found(BlobObject),
    NotFound,
}

/// Port for blob retrieval
#[cfg_attr(test, automock)]
#[async_trait]
pub trait ObjectStore: Send + Sync {
    /// Fetch the object stored under `key`
    async fn get(&self, key: &str) -> Result<Lookup, StoreError>;

    /// Report whether the backend can currently serve reads
    async fn health_check(&self) -> Result<(), StoreError>;
}
