mod connection_registry;
mod host_metrics_source;
mod overload_reporter;

pub use connection_registry::ConnectionRegistry;
pub use host_metrics_source::HostMetricsSource;
pub use overload_reporter::OverloadReporter;
