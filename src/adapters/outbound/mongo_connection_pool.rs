//! MongoDB Connection Pool
//!
//! Owns the process-wide MongoDB client and implements ConnectionRegistry
//! by counting pool connections through the driver's CMAP events.

use crate::domain::errors::MonitorError;
use crate::domain::ports::ConnectionRegistry;
use mongodb::bson::doc;
use mongodb::event::cmap::{CmapEventHandler, ConnectionClosedEvent, ConnectionCreatedEvent};
use mongodb::options::ClientOptions;
use mongodb::Client;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

/// Connection settings for the MongoDB client.
#[derive(Debug, Clone)]
pub struct MongoConfig {
    /// Connection string (mongodb:// or mongodb+srv://)
    pub uri: String,
    /// Maximum connections per server in the pool
    pub max_pool_size: u32,
    /// How long to wait for a suitable server before failing an operation
    pub server_selection_timeout: Duration,
    /// Application name reported to the server
    pub app_name: Option<String>,
}

impl Default for MongoConfig {
    fn default() -> Self {
        Self {
            uri: "mongodb://localhost:27017".to_string(),
            max_pool_size: 50,
            server_selection_timeout: Duration::from_millis(5000),
            app_name: None,
        }
    }
}

/// Counts open pool connections from CMAP events.
#[derive(Debug, Default)]
pub struct ConnectionTracker {
    open: AtomicUsize,
}

impl ConnectionTracker {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of connections created and not yet closed.
    pub fn open_connections(&self) -> usize {
        self.open.load(Ordering::SeqCst)
    }

    pub fn connection_created(&self) {
        self.open.fetch_add(1, Ordering::SeqCst);
    }

    pub fn connection_closed(&self) {
        let _ = self
            .open
            .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |n| n.checked_sub(1));
    }
}

impl CmapEventHandler for ConnectionTracker {
    fn handle_connection_created_event(&self, event: ConnectionCreatedEvent) {
        tracing::trace!("mongodb connection {} created", event.connection_id);
        self.connection_created();
    }

    fn handle_connection_closed_event(&self, event: ConnectionClosedEvent) {
        tracing::trace!("mongodb connection {} closed", event.connection_id);
        self.connection_closed();
    }
}

/// MongoDB client plus its connection counter.
///
/// Created once at startup and shared by `Arc`. The driver connects lazily,
/// so construction only fails on a malformed URI or options.
pub struct MongoConnectionPool {
    client: Client,
    tracker: Arc<ConnectionTracker>,
}

impl MongoConnectionPool {
    /// Build the client from configuration.
    pub async fn connect(config: &MongoConfig) -> Result<Self, mongodb::error::Error> {
        let mut options = ClientOptions::parse(&config.uri).await?;
        options.max_pool_size = Some(config.max_pool_size);
        options.server_selection_timeout = Some(config.server_selection_timeout);
        if config.app_name.is_some() {
            options.app_name = config.app_name.clone();
        }

        let tracker = Arc::new(ConnectionTracker::new());
        let handler: Arc<dyn CmapEventHandler> = tracker.clone();
        options.cmap_event_handler = Some(handler);

        let client = Client::with_options(options)?;
        tracing::debug!(
            "mongodb client created max_pool_size={} selection_timeout={:?}",
            config.max_pool_size,
            config.server_selection_timeout
        );

        Ok(Self { client, tracker })
    }

    pub fn client(&self) -> &Client {
        &self.client
    }

    pub fn tracker(&self) -> &Arc<ConnectionTracker> {
        &self.tracker
    }

    /// Round-trip a `ping` to the server.
    pub async fn ping(&self) -> Result<(), mongodb::error::Error> {
        self.client
            .database("admin")
            .run_command(doc! { "ping": 1 }, None)
            .await?;
        Ok(())
    }

    /// Verify connectivity in the background, logging the outcome.
    ///
    /// Startup does not wait on this; an unreachable server is reported
    /// and the process keeps running.
    pub fn spawn_connectivity_check(self: &Arc<Self>) {
        let pool = self.clone();
        tokio::spawn(async move {
            match pool.ping().await {
                Ok(()) => tracing::info!("connected to MongoDB successfully"),
                Err(e) => tracing::error!("error connecting to MongoDB: {}", e),
            }
        });
    }
}

impl ConnectionRegistry for MongoConnectionPool {
    fn active_connection_count(&self) -> Result<usize, MonitorError> {
        Ok(self.tracker.open_connections())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_mongo_config_default() {
        let config = MongoConfig::default();
        assert_eq!(config.uri, "mongodb://localhost:27017");
        assert_eq!(config.max_pool_size, 50);
        assert_eq!(config.server_selection_timeout, Duration::from_secs(5));
        assert!(config.app_name.is_none());
    }

    #[test]
    fn test_tracker_counts() {
        let tracker = ConnectionTracker::new();
        assert_eq!(tracker.open_connections(), 0);

        tracker.connection_created();
        tracker.connection_created();
        assert_eq!(tracker.open_connections(), 2);

        tracker.connection_closed();
        assert_eq!(tracker.open_connections(), 1);
    }

    #[test]
    fn test_tracker_never_underflows() {
        let tracker = ConnectionTracker::new();
        tracker.connection_closed();
        assert_eq!(tracker.open_connections(), 0);
    }

    #[tokio::test]
    async fn test_connect_rejects_malformed_uri() {
        let config = MongoConfig {
            uri: "not-a-mongodb-uri".to_string(),
            ..Default::default()
        };
        assert!(MongoConnectionPool::connect(&config).await.is_err());
    }

    #[tokio::test]
    async fn test_connect_is_lazy() {
        let config = MongoConfig {
            uri: "mongodb://127.0.0.1:1".to_string(),
            app_name: Some("ricky-api-test".to_string()),
            ..Default::default()
        };
        let pool = MongoConnectionPool::connect(&config).await.unwrap();
        assert_eq!(pool.active_connection_count(), Ok(0));
    }

    #[tokio::test]
    async fn test_registry_reflects_tracker() {
        let pool = MongoConnectionPool::connect(&MongoConfig::default())
            .await
            .unwrap();
        pool.tracker().connection_created();
        assert_eq!(pool.active_connection_count(), Ok(1));
    }
}
