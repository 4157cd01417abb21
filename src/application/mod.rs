//! Application Layer
//!
//! Use cases that orchestrate domain logic over the ports.

mod overload_monitor;

pub use overload_monitor::{MonitorConfig, MonitorState, OverloadMonitor};
