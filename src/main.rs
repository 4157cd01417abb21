//! Ricky API - HTTP server with MongoDB and overload monitoring
//!
//! This is the composition root that wires together all the components.

use ricky_api::adapters::inbound::HttpServer;
use ricky_api::adapters::outbound::{
    MongoConnectionPool, SysinfoHostMetrics, TracingOverloadReporter,
};
use ricky_api::application::OverloadMonitor;
use ricky_api::config::load_config;
use ricky_api::infrastructure::{shutdown_signal, ShutdownController};
use std::sync::Arc;
use tracing_subscriber::fmt::format::FmtSpan;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load configuration from environment
    let cfg = load_config()?;

    // Setup logging
    let log_level = if cfg.debug {
        tracing::Level::DEBUG
    } else {
        tracing::Level::INFO
    };

    tracing_subscriber::fmt()
        .with_max_level(log_level)
        .with_span_events(FmtSpan::CLOSE)
        .init();

    cfg.validate()?;

    tracing::info!(
        "starting ricky-api v{} listen={}",
        env!("CARGO_PKG_VERSION"),
        cfg.listen_addr()
    );

    // ===== COMPOSITION ROOT =====

    // 1. Outbound adapters
    let pool = Arc::new(MongoConnectionPool::connect(&cfg.mongo()).await?);
    pool.spawn_connectivity_check();

    let host_metrics = Arc::new(SysinfoHostMetrics::new()?);
    let reporter = Arc::new(TracingOverloadReporter::new());

    // 2. Overload monitor
    let monitor = OverloadMonitor::new(cfg.monitor(), pool.clone(), host_metrics, reporter)?;
    monitor.start().await;

    // 3. Shutdown wiring
    let shutdown = ShutdownController::new();
    tokio::spawn(shutdown_signal(shutdown.clone()));

    // 4. Inbound adapter
    let server = HttpServer::bind(&cfg.listen_addr()).await?;
    let mut server_task = tokio::spawn(server.serve(shutdown.clone()));

    let served = tokio::select! {
        res = &mut server_task => res,
        _ = shutdown.wait() => {
            match tokio::time::timeout(cfg.shutdown_grace(), &mut server_task).await {
                Ok(res) => res,
                Err(_) => {
                    tracing::warn!(
                        "in-flight requests still running after {:?}, exiting",
                        cfg.shutdown_grace()
                    );
                    server_task.abort();
                    Ok(Ok(()))
                }
            }
        }
    };

    monitor.stop().await;
    served??;

    tracing::info!("shutdown complete");
    Ok(())
}
