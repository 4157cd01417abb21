//! Ricky API Library
//!
//! This module exposes the server components for use in integration tests
//! and as a library.

#![cfg_attr(coverage_nightly, feature(coverage_attribute))]

pub mod adapters;
pub mod application;
pub mod config;
pub mod domain;
pub mod infrastructure;

// Re-export commonly used types
pub use application::{MonitorConfig, MonitorState, OverloadMonitor};
pub use config::load_config;
pub use domain::entities::{MonitorEvent, OverloadSample};
pub use domain::errors::MonitorError;
pub use domain::ports::{ConnectionRegistry, HostMetricsSource, OverloadReporter};
pub use domain::services::OverloadEvaluator;
pub use infrastructure::ShutdownController;
