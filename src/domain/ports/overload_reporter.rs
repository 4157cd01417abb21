//! Overload Reporter Port
//!
//! Sink for everything the overload monitor observes.

use crate::domain::entities::MonitorEvent;

/// Operator-visible channel for monitor events.
///
/// Called from the monitor's background task, so implementations must not
/// block for long.
pub trait OverloadReporter: Send + Sync {
    fn record(&self, event: MonitorEvent);
}
