// Application state module
// Immutable per-process state shared by every request

use std::sync::Arc;

use super::types::Config;
use crate::handler::objects::ResponseBuilder;
use crate::handler::static_files::{FallbackDelegate, StaticAssets};
use crate::routing::RouteMatcher;
use crate::store::{FsObjectStore, ObjectStore};

/// Application state
///
/// Built once at startup; requests only read from it.
pub struct AppState {
    pub config: Config,
    pub matcher: RouteMatcher,
    pub responses: ResponseBuilder,
    pub store: Arc<dyn ObjectStore>,
    pub fallback: Arc<dyn FallbackDelegate>,
}

impl AppState {
    /// Wire the state from explicit collaborators
    pub fn new(
        config: Config,
        store: Arc<dyn ObjectStore>,
        fallback: Arc<dyn FallbackDelegate>,
    ) -> Self {
        let matcher = RouteMatcher::new(config.routes.clone());
        let responses = ResponseBuilder::new(&config.http, &config.cache);
        Self {
            config,
            matcher,
            responses,
            store,
            fallback,
        }
    }

    /// Wire the filesystem store and static asset bundle named by the configuration
    pub fn from_config(config: Config) -> Self {
        let store = Arc::new(FsObjectStore::new(
            &config.store.root,
            config.store.infer_content_type,
        ));
        let fallback = Arc::new(StaticAssets::new(&config.assets));
        Self::new(config, store, fallback)
    }
}
