//! Route matching module
//!
//! Classifies a request path against the object route table and derives the storage key.

use crate::config::{ObjectKind, RouteConfig};

/// Classification of an inbound request path
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RouteKind {
    Image,
    DataChunk,
    StaticFallback,
}

impl RouteKind {
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Image => "image",
            Self::DataChunk => "data-chunk",
            Self::StaticFallback => "static-fallback",
        }
    }
}

impl From<ObjectKind> for RouteKind {
    fn from(kind: ObjectKind) -> Self {
        match kind {
            ObjectKind::Image => Self::Image,
            ObjectKind::DataChunk => Self::DataChunk,
        }
    }
}

/// Result of matching a path
#[derive(Debug, PartialEq, Eq)]
pub enum RouteDecision<'a> {
    /// Path belongs to an object route; `key` addresses the blob store
    Object { route: &'a RouteConfig, key: String },
    /// No object route applies, the static fallback serves the request
    NoMatch,
}

impl RouteDecision<'_> {
    pub fn kind(&self) -> RouteKind {
        match self {
            Self::Object { route, .. } => route.kind.into(),
            Self::NoMatch => RouteKind::StaticFallback,
        }
    }
}

/// Ordered prefix table; the first matching prefix wins
#[derive(Debug, Clone)]
pub struct RouteMatcher {
    routes: Vec<RouteConfig>,
}

impl RouteMatcher {
    pub const fn new(routes: Vec<RouteConfig>) -> Self {
        Self { routes }
    }

    /// Match `path` against the route table
    ///
    /// The key is the route's namespace label followed by the path remainder after the
    /// prefix. The remainder is passed through untouched: it may be empty, and `..`
    /// segments are left for the store backend to judge.
    pub fn match_path(&self, path: &str) -> RouteDecision<'_> {
        self.routes
            .iter()
            .find_map(|route| {
                path.strip_prefix(route.prefix.as_str())
                    .map(|rest| RouteDecision::Object {
                        route,
                        key: format!("{}{rest}", route.namespace),
                    })
            })
            .unwrap_or(RouteDecision::NoMatch)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::default_routes;

    fn matcher() -> RouteMatcher {
        RouteMatcher::new(default_routes())
    }

    fn key_of<'a>(decision: &'a RouteDecision<'_>) -> Option<&'a str> {
        match decision {
            RouteDecision::Object { key, .. } => Some(key),
            RouteDecision::NoMatch => None,
        }
    }

    #[test]
    fn test_image_routes_keep_prefix_in_key() {
        let m = matcher();
        let d = m.match_path("/images/foo.jpg");
        assert_eq!(d.kind(), RouteKind::Image);
        assert_eq!(key_of(&d), Some("images/foo.jpg"));

        let d = m.match_path("/photos/2019/beach.jpg");
        assert_eq!(d.kind(), RouteKind::Image);
        assert_eq!(key_of(&d), Some("photos/2019/beach.jpg"));
    }

    #[test]
    fn test_data_routes_use_namespace_label() {
        let m = matcher();
        let d = m.match_path("/data/data-0.json");
        assert_eq!(d.kind(), RouteKind::DataChunk);
        assert_eq!(key_of(&d), Some("data/data-0.json"));

        let d = m.match_path("/photosdata/photos-3.json");
        assert_eq!(d.kind(), RouteKind::DataChunk);
        assert_eq!(key_of(&d), Some("photosdata/photos-3.json"));
    }

    #[test]
    fn test_namespace_independent_of_prefix() {
        let mut routes = default_routes();
        routes[2].prefix = "/chunks/".to_string();
        let m = RouteMatcher::new(routes);
        assert_eq!(key_of(&m.match_path("/chunks/data-1.json")), Some("data/data-1.json"));
        assert_eq!(m.match_path("/data/data-1.json"), RouteDecision::NoMatch);
    }

    #[test]
    fn test_empty_remainder() {
        let m = matcher();
        let d = m.match_path("/data/");
        assert_eq!(d.kind(), RouteKind::DataChunk);
        assert_eq!(key_of(&d), Some("data/"));
    }

    #[test]
    fn test_prefix_requires_trailing_slash() {
        let m = matcher();
        assert_eq!(m.match_path("/data"), RouteDecision::NoMatch);
        assert_eq!(m.match_path("/images"), RouteDecision::NoMatch);
    }

    #[test]
    fn test_photosdata_not_shadowed_by_photos() {
        let m = matcher();
        let d = m.match_path("/photosdata/x.json");
        assert_eq!(d.kind(), RouteKind::DataChunk);
    }

    #[test]
    fn test_first_match_wins() {
        let mut routes = default_routes();
        let mut shadow = routes[0].clone();
        shadow.prefix = "/images/private/".to_string();
        shadow.namespace = "vault/".to_string();
        routes.push(shadow);
        let m = RouteMatcher::new(routes);
        assert_eq!(
            key_of(&m.match_path("/images/private/a.jpg")),
            Some("images/private/a.jpg")
        );
    }

    #[test]
    fn test_traversal_passed_through() {
        let m = matcher();
        assert_eq!(
            key_of(&m.match_path("/images/../secrets.txt")),
            Some("images/../secrets.txt")
        );
    }

    #[test]
    fn test_unmatched_path() {
        let m = matcher();
        let d = m.match_path("/unknown/path");
        assert_eq!(d, RouteDecision::NoMatch);
        assert_eq!(d.kind(), RouteKind::StaticFallback);
        assert_eq!(m.match_path("/"), RouteDecision::NoMatch);
    }
}
