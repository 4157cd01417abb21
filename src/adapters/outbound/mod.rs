mod mongo_connection_pool;
mod sysinfo_host_metrics;
mod tracing_overload_reporter;

pub use mongo_connection_pool::{ConnectionTracker, MongoConfig, MongoConnectionPool};
pub use sysinfo_host_metrics::SysinfoHostMetrics;
pub use tracing_overload_reporter::TracingOverloadReporter;
