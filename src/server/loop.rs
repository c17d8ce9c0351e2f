// Server loop module
// Accepts connections until a shutdown is requested

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::net::TcpListener;
use tokio::sync::Notify;

use super::connection::accept_connection;
use crate::config::AppState;
use crate::logger;

/// How long in-flight connections may keep running after shutdown
const DRAIN_TIMEOUT: Duration = Duration::from_secs(5);
const DRAIN_POLL_INTERVAL: Duration = Duration::from_millis(50);

/// Run the accept loop on the current local task set
///
/// Returns once `shutdown` is notified and the active connections have drained, or the
/// drain timeout has passed.
#[allow(clippy::ignored_unit_patterns)]
pub async fn start_server_loop(
    listener: TcpListener,
    state: Arc<AppState>,
    shutdown: Arc<Notify>,
) {
    let active_connections = Arc::new(AtomicUsize::new(0));

    loop {
        tokio::select! {
            accept_result = listener.accept() => {
                match accept_result {
                    Ok((stream, peer_addr)) => {
                        accept_connection(stream, peer_addr, &state, &active_connections);
                    }
                    Err(e) => logger::log_error(&format!("Failed to accept connection: {e}")),
                }
            }

            _ = shutdown.notified() => {
                logger::log_shutdown();
                break;
            }
        }
    }

    drop(listener);
    drain_connections(&active_connections).await;
}

async fn drain_connections(active_connections: &AtomicUsize) {
    let deadline = tokio::time::Instant::now() + DRAIN_TIMEOUT;
    loop {
        let remaining = active_connections.load(Ordering::SeqCst);
        if remaining == 0 {
            return;
        }
        if tokio::time::Instant::now() >= deadline {
            logger::log_warning(&format!(
                "Shutting down with {remaining} connection(s) still open"
            ));
            return;
        }
        tokio::time::sleep(DRAIN_POLL_INTERVAL).await;
    }
}
