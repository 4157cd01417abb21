//! Overload Evaluator Service
//!
//! Pure domain logic for turning raw readings into an `OverloadSample`.
//! Knows nothing about timers or where the readings come from.

use crate::domain::entities::{bytes_to_mib, OverloadSample};
use crate::domain::errors::MonitorError;
use crate::domain::ports::{ConnectionRegistry, HostMetricsSource};

/// Threshold check over connection count, cores and resident memory.
///
/// The load ratio is `connections / cores / resident MiB`, compared with a
/// strict `>` against `threshold`.
#[derive(Debug, Clone, Copy)]
pub struct OverloadEvaluator {
    threshold: f64,
}

impl OverloadEvaluator {
    /// Create an evaluator. The threshold must be finite and positive.
    pub fn new(threshold: f64) -> Result<Self, MonitorError> {
        if !threshold.is_finite() || threshold <= 0.0 {
            return Err(MonitorError::Configuration(format!(
                "max connections allowed ratio must be a positive number, got {}",
                threshold
            )));
        }
        Ok(Self { threshold })
    }

    pub fn threshold(&self) -> f64 {
        self.threshold
    }

    /// Read all metrics in order (connections, cores, memory) and evaluate.
    ///
    /// The first failing read aborts the sample.
    pub fn sample(
        &self,
        registry: &dyn ConnectionRegistry,
        host: &dyn HostMetricsSource,
    ) -> Result<OverloadSample, MonitorError> {
        let connection_count = registry.active_connection_count()?;
        let core_count = host.logical_core_count()?;
        let resident_memory_mib = bytes_to_mib(host.resident_memory_bytes()?);

        self.evaluate(connection_count, core_count, resident_memory_mib)
    }

    /// Evaluate already-collected readings.
    pub fn evaluate(
        &self,
        connection_count: usize,
        core_count: usize,
        resident_memory_mib: f64,
    ) -> Result<OverloadSample, MonitorError> {
        OverloadSample::compute(
            connection_count,
            core_count,
            resident_memory_mib,
            self.threshold,
        )
    }
}
