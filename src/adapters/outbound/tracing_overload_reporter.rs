//! Tracing Overload Reporter
//!
//! Writes monitor events to the `tracing` log.

use crate::domain::entities::MonitorEvent;
use crate::domain::ports::OverloadReporter;

/// Reporter that logs overloads at WARN and raw samples at DEBUG.
#[derive(Debug, Default, Clone, Copy)]
pub struct TracingOverloadReporter;

impl TracingOverloadReporter {
    pub fn new() -> Self {
        Self
    }
}

impl OverloadReporter for TracingOverloadReporter {
    fn record(&self, event: MonitorEvent) {
        match event {
            MonitorEvent::Overloaded(sample) => {
                tracing::warn!(
                    "overload detected: ratio={:.6} connections={} cores={} memory_mib={:.2}",
                    sample.load_ratio,
                    sample.connection_count,
                    sample.core_count,
                    sample.resident_memory_mib
                );
            }
            MonitorEvent::Sampled(sample) => {
                tracing::debug!(
                    "load sample: connections={} cores={} memory_mib={:.2}",
                    sample.connection_count,
                    sample.core_count,
                    sample.resident_memory_mib
                );
            }
            MonitorEvent::TickSkipped { reason } => {
                tracing::debug!("load sample skipped: {}", reason);
            }
        }
    }
}
