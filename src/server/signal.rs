// Signal handling module
//
// Supported signals:
// - SIGTERM: Graceful shutdown
// - SIGINT:  Graceful shutdown (Ctrl+C)

use std::sync::Arc;
use tokio::sync::Notify;

use crate::logger;

/// Start the shutdown signal listener (Unix)
///
/// Spawns a background task that notifies `shutdown` on SIGTERM or SIGINT.
#[cfg(unix)]
#[allow(clippy::ignored_unit_patterns)]
pub fn start_signal_handler(shutdown: Arc<Notify>) {
    use tokio::signal::unix::{signal, SignalKind};

    tokio::spawn(async move {
        let (mut sigterm, mut sigint) =
            match (signal(SignalKind::terminate()), signal(SignalKind::interrupt())) {
                (Ok(term), Ok(int)) => (term, int),
                (Err(e), _) | (_, Err(e)) => {
                    logger::log_error(&format!("Failed to register signal handlers: {e}"));
                    return;
                }
            };

        logger::log_debug(&format!(
            "Signal handlers registered for process {}",
            std::process::id()
        ));

        let name = tokio::select! {
            _ = sigterm.recv() => "SIGTERM",
            _ = sigint.recv() => "SIGINT",
        };

        logger::log_info(&format!("{name} received, shutting down"));
        // notify_one stores a permit if the loop is not waiting yet
        shutdown.notify_one();
    });
}

/// Non-Unix fallback: only Ctrl+C is handled
#[cfg(not(unix))]
pub fn start_signal_handler(shutdown: Arc<Notify>) {
    tokio::spawn(async move {
        if let Ok(()) = tokio::signal::ctrl_c().await {
            logger::log_info("Ctrl+C received, shutting down");
            shutdown.notify_one();
        }
    });
}
