//! Request handler module
//!
//! Responsible for request routing dispatch: object routes are answered from the blob
//! store, everything else goes to the static asset fallback.

pub mod objects;
pub mod router;
pub mod static_files;

// Re-export main entry point
pub use router::handle_request;
