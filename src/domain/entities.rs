//! Domain Entities
//!
//! The per-tick overload sample and the events the monitor emits.
//! Samples are never persisted; each one lives for a single tick.

use crate::domain::errors::MonitorError;
use serde::Serialize;

const BYTES_PER_MIB: f64 = 1024.0 * 1024.0;

/// One evaluation of the process load.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct OverloadSample {
    /// Active database connections at sample time
    pub connection_count: usize,
    /// Logical CPU cores visible to the process
    pub core_count: usize,
    /// Process resident memory in MiB
    pub resident_memory_mib: f64,
    /// connection_count / core_count / resident_memory_mib
    pub load_ratio: f64,
    /// load_ratio > threshold
    pub overloaded: bool,
}

impl OverloadSample {
    /// Compute a sample from raw readings.
    ///
    /// Fails with `DegenerateComputation` when a denominator is zero or the
    /// ratio is not finite.
    pub fn compute(
        connection_count: usize,
        core_count: usize,
        resident_memory_mib: f64,
        threshold: f64,
    ) -> Result<Self, MonitorError> {
        let degenerate = || MonitorError::DegenerateComputation {
            cores: core_count,
            memory_mib: resident_memory_mib,
        };

        if core_count == 0 || resident_memory_mib.is_nan() || resident_memory_mib <= 0.0 {
            return Err(degenerate());
        }

        let load_ratio = connection_count as f64 / core_count as f64 / resident_memory_mib;
        if !load_ratio.is_finite() {
            return Err(degenerate());
        }

        Ok(Self {
            connection_count,
            core_count,
            resident_memory_mib,
            load_ratio,
            overloaded: load_ratio > threshold,
        })
    }
}

/// Convert a byte count to mebibytes.
pub fn bytes_to_mib(bytes: u64) -> f64 {
    bytes as f64 / BYTES_PER_MIB
}

/// Event delivered to an `OverloadReporter`.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum MonitorEvent {
    /// The load ratio crossed the configured threshold
    Overloaded(OverloadSample),
    /// Raw sample, recorded on every evaluated tick
    Sampled(OverloadSample),
    /// The tick could not be evaluated
    TickSkipped { reason: String },
}

impl MonitorEvent {
    pub fn is_overloaded(&self) -> bool {
        matches!(self, MonitorEvent::Overloaded(_))
    }

    pub fn sample(&self) -> Option<&OverloadSample> {
        match self {
            MonitorEvent::Overloaded(s) | MonitorEvent::Sampled(s) => Some(s),
            MonitorEvent::TickSkipped { .. } => None,
        }
    }
}
