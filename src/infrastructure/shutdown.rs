//! Graceful Shutdown Handler
//!
//! Lets the signal handler, the HTTP server and the overload monitor agree
//! on when the process is going down.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tokio::sync::broadcast;

/// Shutdown coordinator for graceful termination.
#[derive(Clone)]
pub struct ShutdownController {
    /// Whether shutdown has been initiated
    shutdown_initiated: Arc<AtomicBool>,
    /// Broadcast channel for shutdown signal
    shutdown_tx: broadcast::Sender<()>,
}

impl ShutdownController {
    /// Create a new shutdown controller.
    pub fn new() -> Self {
        let (shutdown_tx, _) = broadcast::channel(1);
        Self {
            shutdown_initiated: Arc::new(AtomicBool::new(false)),
            shutdown_tx,
        }
    }

    /// Subscribe to shutdown notifications.
    pub fn subscribe(&self) -> broadcast::Receiver<()> {
        self.shutdown_tx.subscribe()
    }

    /// Initiate graceful shutdown. Only the first call has an effect.
    pub fn shutdown(&self) {
        if !self.shutdown_initiated.swap(true, Ordering::SeqCst) {
            tracing::info!("server is shutting down...");
            let _ = self.shutdown_tx.send(());
        }
    }

    /// Check if shutdown has been initiated.
    pub fn is_shutdown(&self) -> bool {
        self.shutdown_initiated.load(Ordering::SeqCst)
    }

    /// Resolve once shutdown has been initiated, including when that
    /// happened before this call.
    pub async fn wait(&self) {
        let mut rx = self.subscribe();
        if self.is_shutdown() {
            return;
        }
        let _ = rx.recv().await;
    }
}

impl Default for ShutdownController {
    fn default() -> Self {
        Self::new()
    }
}

/// Install signal handlers for graceful shutdown.
///
/// Completes when Ctrl+C (SIGINT) or SIGTERM is received, after initiating
/// shutdown on `controller`.
#[cfg_attr(coverage_nightly, coverage(off))]
pub async fn shutdown_signal(controller: ShutdownController) {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::error!("failed to install Ctrl+C handler: {}", e);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(e) => {
                tracing::error!("failed to install SIGTERM handler: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            tracing::info!("received Ctrl+C, initiating shutdown");
        }
        _ = terminate => {
            tracing::info!("received SIGTERM, initiating shutdown");
        }
    }

    controller.shutdown();
}

#[cfg(test)]
#[cfg_attr(coverage_nightly, coverage(off))]
mod tests {
    use super::*;
    use std::time::Duration;

    #[test]
    fn test_shutdown_controller_new() {
        let controller = ShutdownController::new();
        assert!(!controller.is_shutdown());
    }

    #[test]
    fn test_shutdown_controller_default() {
        let controller = ShutdownController::default();
        assert!(!controller.is_shutdown());
    }

    #[test]
    fn test_shutdown_initiates_once() {
        let controller = ShutdownController::new();

        controller.shutdown();
        assert!(controller.is_shutdown());

        controller.shutdown();
        assert!(controller.is_shutdown());
    }

    #[tokio::test]
    async fn test_subscribe_receives_shutdown() {
        let controller = ShutdownController::new();
        let mut rx = controller.subscribe();

        controller.shutdown();

        let result = tokio::time::timeout(Duration::from_millis(100), rx.recv()).await;
        assert!(result.is_ok());
    }

    #[tokio::test]
    async fn test_wait_after_shutdown_returns_immediately() {
        let controller = ShutdownController::new();
        controller.shutdown();

        let result = tokio::time::timeout(Duration::from_millis(100), controller.wait()).await;
        assert!(result.is_ok());
    }

    #[tokio::test]
    async fn test_wait_resolves_on_shutdown() {
        let controller = ShutdownController::new();
        let ctrl = controller.clone();
        tokio::spawn(async move {
            tokio::time::sleep(Duration::from_millis(20)).await;
            ctrl.shutdown();
        });

        let result = tokio::time::timeout(Duration::from_secs(1), controller.wait()).await;
        assert!(result.is_ok());
    }

    #[tokio::test]
    async fn test_wait_pending_without_shutdown() {
        let controller = ShutdownController::new();
        let result = tokio::time::timeout(Duration::from_millis(50), controller.wait()).await;
        assert!(result.is_err());
    }

    #[test]
    fn test_clone_shares_state() {
        let controller = ShutdownController::new();
        let cloned = controller.clone();

        cloned.shutdown();
        assert!(controller.is_shutdown());
    }
}
