//! Routing module
//!
//! Maps request paths to object routes:
//! - Prefix matching in configured order
//! - Storage key derivation from prefix and namespace label

mod matcher;

pub use matcher::{RouteDecision, RouteKind, RouteMatcher};
