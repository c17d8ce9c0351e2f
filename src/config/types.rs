// Configuration types module
// Defines all configuration-related data structures

use serde::{Deserialize, Serialize};

/// Main configuration structure
#[derive(Debug, Deserialize, Clone)]
pub struct Config {
    pub server: ServerConfig,
    pub logging: LoggingConfig,
    pub performance: PerformanceConfig,
    pub http: HttpConfig,
    pub store: StoreConfig,
    #[serde(default)]
    pub assets: AssetsConfig,
    #[serde(default)]
    pub health: HealthConfig,
    #[serde(default)]
    pub cache: CacheConfig,
    /// Object routes, matched in order (first match wins)
    #[serde(default = "default_routes")]
    pub routes: Vec<RouteConfig>,
}

/// Server configuration
#[derive(Debug, Deserialize, Clone)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    pub workers: Option<usize>,
}

/// Logging configuration
#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct LoggingConfig {
    pub level: String,
    pub access_log: bool,
    /// Access log format (combined, common, json, or custom pattern)
    #[serde(default = "default_access_log_format")]
    pub access_log_format: String,
    /// Access log file path (optional, stdout if not set)
    #[serde(default)]
    pub access_log_file: Option<String>,
    /// Error log file path (optional, stderr if not set)
    #[serde(default)]
    pub error_log_file: Option<String>,
}

#[allow(clippy::missing_const_for_fn)]
fn default_access_log_format() -> String {
    "combined".to_string()
}

/// Performance configuration
#[derive(Debug, Deserialize, Clone)]
pub struct PerformanceConfig {
    pub keep_alive_timeout: u64,
    pub read_timeout: u64,
    pub write_timeout: u64,
    pub max_connections: Option<u64>,
}

/// HTTP configuration
#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct HttpConfig {
    pub server_name: String,
    pub enable_cors: bool,
    pub max_body_size: u64,
    /// Content type for image objects stored without one
    pub default_image_content_type: String,
}

/// Object store backend configuration
#[derive(Debug, Deserialize, Clone)]
pub struct StoreConfig {
    /// Root directory of the blob namespace
    pub root: String,
    /// Guess a content type from the key extension when metadata has none
    pub infer_content_type: bool,
}

/// Static asset bundle served for unmatched paths
#[derive(Debug, Deserialize, Clone)]
pub struct AssetsConfig {
    #[serde(default = "default_assets_dir")]
    pub dir: String,
    #[serde(default = "default_index_files")]
    pub index_files: Vec<String>,
    /// Serve the index file for extension-less paths that match no file
    #[serde(default = "default_spa_fallback")]
    pub spa_fallback: bool,
}

#[allow(clippy::missing_const_for_fn)]
fn default_assets_dir() -> String {
    "dist".to_string()
}

#[allow(clippy::missing_const_for_fn)]
fn default_index_files() -> Vec<String> {
    vec!["index.html".to_string(), "index.htm".to_string()]
}

#[allow(clippy::missing_const_for_fn)]
fn default_spa_fallback() -> bool {
    true
}

impl Default for AssetsConfig {
    fn default() -> Self {
        Self {
            dir: default_assets_dir(),
            index_files: default_index_files(),
            spa_fallback: default_spa_fallback(),
        }
    }
}

/// Health check configuration
#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct HealthConfig {
    /// Enable health check endpoints
    #[serde(default = "default_health_enabled")]
    pub enabled: bool,
    /// Liveness probe path (default: /healthz)
    #[serde(default = "default_healthz_path")]
    pub liveness_path: String,
    /// Readiness probe path (default: /readyz)
    #[serde(default = "default_readyz_path")]
    pub readiness_path: String,
}

#[allow(clippy::missing_const_for_fn)]
fn default_health_enabled() -> bool {
    true
}

#[allow(clippy::missing_const_for_fn)]
fn default_healthz_path() -> String {
    "/healthz".to_string()
}

#[allow(clippy::missing_const_for_fn)]
fn default_readyz_path() -> String {
    "/readyz".to_string()
}

impl Default for HealthConfig {
    fn default() -> Self {
        Self {
            enabled: default_health_enabled(),
            liveness_path: default_healthz_path(),
            readiness_path: default_readyz_path(),
        }
    }
}

/// Response kind of an object route
#[derive(Debug, Deserialize, Serialize, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum ObjectKind {
    /// Binary payload passed through with its stored content type
    Image,
    /// JSON document validated by a parse/serialize round trip
    DataChunk,
}

/// One entry of the object route table
#[derive(Debug, Deserialize, Serialize, Clone, PartialEq, Eq)]
pub struct RouteConfig {
    /// URL prefix, e.g. `/images/`
    pub prefix: String,
    /// Storage namespace label prepended to the path remainder, e.g. `images/`
    pub namespace: String,
    pub kind: ObjectKind,
    pub not_found_message: String,
    pub error_message: String,
}

impl RouteConfig {
    fn new(prefix: &str, namespace: &str, kind: ObjectKind, not_found: &str, error: &str) -> Self {
        Self {
            prefix: prefix.to_string(),
            namespace: namespace.to_string(),
            kind,
            not_found_message: not_found.to_string(),
            error_message: error.to_string(),
        }
    }
}

/// The four routes of the gallery deployment
pub fn default_routes() -> Vec<RouteConfig> {
    vec![
        RouteConfig::new(
            "/images/",
            "images/",
            ObjectKind::Image,
            "Image not found",
            "Error loading image",
        ),
        RouteConfig::new(
            "/photos/",
            "photos/",
            ObjectKind::Image,
            "Photo not found",
            "Error loading photo",
        ),
        RouteConfig::new(
            "/data/",
            "data/",
            ObjectKind::DataChunk,
            "Chunk not found",
            "Error loading data",
        ),
        RouteConfig::new(
            "/photosdata/",
            "photosdata/",
            ObjectKind::DataChunk,
            "Photo data not found",
            "Error loading photo data",
        ),
    ]
}

/// Cache-Control policy for one object kind
#[derive(Debug, Deserialize, Serialize, Clone, Copy, PartialEq, Eq)]
pub struct CachePolicyConfig {
    pub max_age: u32,
    #[serde(default)]
    pub immutable: bool,
}

/// Static cache policy table, keyed by object kind
#[derive(Debug, Deserialize, Serialize, Clone, Copy, PartialEq, Eq)]
pub struct CacheConfig {
    #[serde(default = "default_image_cache")]
    pub image: CachePolicyConfig,
    #[serde(default = "default_data_chunk_cache")]
    pub data_chunk: CachePolicyConfig,
}

const fn default_image_cache() -> CachePolicyConfig {
    CachePolicyConfig {
        max_age: 31_536_000,
        immutable: true,
    }
}

const fn default_data_chunk_cache() -> CachePolicyConfig {
    CachePolicyConfig {
        max_age: 3600,
        immutable: false,
    }
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            image: default_image_cache(),
            data_chunk: default_data_chunk_cache(),
        }
    }
}

impl CacheConfig {
    pub const fn policy_for(&self, kind: ObjectKind) -> CachePolicyConfig {
        match kind {
            ObjectKind::Image => self.image,
            ObjectKind::DataChunk => self.data_chunk,
        }
    }
}
