//! Domain Layer
//!
//! Overload detection types, the ports the monitor depends on, and the
//! pure evaluation logic. Nothing in here touches tokio, MongoDB or the OS.

pub mod entities;
pub mod errors;
pub mod ports;
pub mod services;

pub use entities::{MonitorEvent, OverloadSample};
pub use errors::MonitorError;
