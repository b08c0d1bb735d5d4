//! Cubo Casa cloud API integration
//!
//! - `client`: authenticated client with retry/backoff
//! - `models`: request/response payloads
//! - `transport`: HTTP transport seam (reqwest in production)

pub mod client;
pub mod models;
pub mod transport;

#[cfg(test)]
pub mod testing;

pub use client::{Credentials, CuboClient, RetryPolicy};
pub use models::{DeviceCommand, DeviceStatusReport, RemoteStatus};
pub use transport::Transport;
