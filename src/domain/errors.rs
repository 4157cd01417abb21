//! Monitor Errors

/// Errors raised by the overload monitor and its collaborators.
///
/// Only `Configuration` ever leaves the monitor; the other two are
/// recovered inside a tick by skipping it.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum MonitorError {
    #[error("metrics source unavailable: {0}")]
    TransientMetrics(String),

    #[error("cannot evaluate load ratio ({cores} cores, {memory_mib} MiB resident)")]
    DegenerateComputation { cores: usize, memory_mib: f64 },

    #[error("invalid monitor configuration: {0}")]
    Configuration(String),
}

impl MonitorError {
    /// Whether the error only affects the current tick.
    pub fn is_soft(&self) -> bool {
        !matches!(self, MonitorError::Configuration(_))
    }
}
