//! Logger module
//!
//! Provides logging utilities for the gateway including:
//! - Server lifecycle logging
//! - Access logging with multiple formats
//! - Error and warning logging
//! - File-based logging support

mod format;
pub mod writer;

pub use format::AccessLogEntry;

use crate::config::Config;
use std::net::SocketAddr;
use writer::Level;

/// Initialize the logger with configuration
///
/// Should be called once at application startup.
pub fn init(config: &Config) -> std::io::Result<()> {
    writer::init(
        Level::parse(&config.logging.level),
        config.logging.access_log_file.as_deref(),
        config.logging.error_log_file.as_deref(),
    )
}

/// Write to info/access log
fn write_info(level: Level, message: &str) {
    match writer::get() {
        Some(w) => w.write_info(level, message),
        None => println!("{message}"),
    }
}

/// Write to error log
fn write_error(level: Level, message: &str) {
    match writer::get() {
        Some(w) => w.write_error(level, message),
        None => eprintln!("{message}"),
    }
}

/// Write to access log specifically
fn write_access(message: &str) {
    match writer::get() {
        Some(w) => w.write_access(message),
        None => println!("{message}"),
    }
}

pub fn log_server_start(addr: &SocketAddr, config: &Config) {
    write_info(Level::Info, "======================================");
    write_info(Level::Info, "blobgate started");
    write_info(Level::Info, &format!("Listening on: http://{addr}"));
    write_info(Level::Info, &format!("Log level: {}", config.logging.level));
    if let Some(workers) = config.server.workers {
        write_info(Level::Info, &format!("Worker threads: {workers}"));
    }
    write_info(Level::Info, &format!("Object store: {}", config.store.root));
    write_info(Level::Info, &format!("Static assets: {}", config.assets.dir));
    for route in &config.routes {
        write_info(
            Level::Info,
            &format!(
                "Route: {} -> {}* ({:?})",
                route.prefix, route.namespace, route.kind
            ),
        );
    }
    if let Some(ref path) = config.logging.access_log_file {
        write_info(Level::Info, &format!("Access log: {path}"));
    }
    if let Some(ref path) = config.logging.error_log_file {
        write_info(Level::Info, &format!("Error log: {path}"));
    }
    write_info(Level::Info, "======================================\n");
}

pub fn log_info(message: &str) {
    write_info(Level::Info, &format!("[INFO] {message}"));
}

pub fn log_debug(message: &str) {
    write_info(Level::Debug, &format!("[DEBUG] {message}"));
}

pub fn log_connection_accepted(peer_addr: &SocketAddr) {
    write_info(
        Level::Debug,
        &format!("[Connection] Accepted from: {peer_addr}"),
    );
}

pub fn log_connection_error(err: &impl std::fmt::Debug) {
    write_error(
        Level::Error,
        &format!("[ERROR] Failed to serve connection: {err:?}"),
    );
}

pub fn log_error(message: &str) {
    write_error(Level::Error, &format!("[ERROR] {message}"));
}

pub fn log_warning(message: &str) {
    write_error(Level::Warn, &format!("[WARN] {message}"));
}

/// Log formatted access log entry
pub fn log_access(entry: &AccessLogEntry, format: &str) {
    write_access(&entry.format(format));
}

pub fn log_shutdown() {
    write_info(Level::Info, "\n[Shutdown] Stopped accepting connections");
}
