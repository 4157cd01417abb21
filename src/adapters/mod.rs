//! Adapters Layer
//!
//! Inbound adapters drive the application (HTTP); outbound adapters
//! implement the domain ports (MongoDB, OS metrics, log sink).

pub mod inbound;
pub mod outbound;
