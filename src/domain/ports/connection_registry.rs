//! Connection Registry Port
//!
//! Defines the interface for reading how many database connections are open.

use crate::domain::errors::MonitorError;

/// Source of the active database connection count.
///
/// This is an outbound port. Any connection pool can back it; the
/// overload monitor only ever reads from it.
pub trait ConnectionRegistry: Send + Sync {
    /// Number of connections currently open.
    fn active_connection_count(&self) -> Result<usize, MonitorError>;
}
