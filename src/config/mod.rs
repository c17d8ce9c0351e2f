// Configuration module entry point
// Loads, validates and exposes the immutable application configuration

mod state;
mod types;

use std::net::SocketAddr;

// Re-export public types
pub use state::AppState;
pub use types::{
    AssetsConfig, CacheConfig, CachePolicyConfig, Config, HttpConfig, ObjectKind, RouteConfig,
};
#[cfg(test)]
pub use types::default_routes;

/// Default config file (without extension)
pub const DEFAULT_CONFIG_PATH: &str = "config";

/// Configuration loading or validation failure
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("failed to load configuration: {0}")]
    Load(#[from] config::ConfigError),

    #[error("invalid route {prefix:?}: {reason}")]
    InvalidRoute { prefix: String, reason: &'static str },

    #[error("invalid address: {0}")]
    InvalidAddress(String),
}

impl Config {
    /// Load configuration from specified file path (without extension)
    /// Default config file is "config.toml" when no path specified
    pub fn load_from(config_path: &str) -> Result<Self, ConfigError> {
        let settings = config::Config::builder()
            .add_source(config::File::with_name(config_path).required(false))
            .add_source(config::Environment::with_prefix("BLOBGATE").separator("__"))
            .set_default("server.host", "127.0.0.1")?
            .set_default("server.port", 8080)?
            .set_default("logging.level", "info")?
            .set_default("logging.access_log", true)?
            .set_default("performance.keep_alive_timeout", 75)?
            .set_default("performance.read_timeout", 30)?
            .set_default("performance.write_timeout", 30)?
            .set_default("http.server_name", "blobgate/0.1")?
            .set_default("http.enable_cors", false)?
            .set_default("http.max_body_size", 1_048_576)? // 1MB, no body is ever read
            .set_default("http.default_image_content_type", "image/jpeg")?
            .set_default("store.root", "bucket")?
            .set_default("store.infer_content_type", true)?
            .build()?;

        let cfg: Self = settings.try_deserialize()?;
        cfg.validate()?;
        Ok(cfg)
    }

    /// Check the route table for prefixes and namespaces that cannot produce usable keys
    pub fn validate(&self) -> Result<(), ConfigError> {
        for route in &self.routes {
            let reason = if !route.prefix.starts_with('/') {
                Some("prefix must start with '/'")
            } else if !route.prefix.ends_with('/') {
                Some("prefix must end with '/'")
            } else if route.namespace.is_empty() {
                Some("namespace must not be empty")
            } else if route.namespace.starts_with('/') {
                Some("namespace must not start with '/'")
            } else {
                None
            };

            if let Some(reason) = reason {
                return Err(ConfigError::InvalidRoute {
                    prefix: route.prefix.clone(),
                    reason,
                });
            }
        }
        Ok(())
    }

    pub fn get_socket_addr(&self) -> Result<SocketAddr, ConfigError> {
        format!("{}:{}", self.server.host, self.server.port)
            .parse()
            .map_err(|e| ConfigError::InvalidAddress(format!("{e}")))
    }
}
