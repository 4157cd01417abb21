//! Host Metrics Port
//!
//! Defines the interface for OS/runtime introspection.

use crate::domain::errors::MonitorError;

/// Process and host metrics used by the overload monitor.
///
/// Implementations may fail transiently; callers treat any error as
/// "skip this sample" rather than a fatal condition.
pub trait HostMetricsSource: Send + Sync {
    /// Logical CPU cores visible to the process.
    fn logical_core_count(&self) -> Result<usize, MonitorError>;

    /// Resident set size of the current process, in bytes.
    fn resident_memory_bytes(&self) -> Result<u64, MonitorError>;
}
