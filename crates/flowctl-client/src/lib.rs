//! flowctl client - HTTP implementations of the `FlowClient` trait
//!
//! One implementation exists per workflow-engine API generation:
//!
//! - **v1**: the split generation, an operations service (queries and
//!   deletes) plus a gateway service (cancellations and deployments), with
//!   integer keys on the wire;
//! - **v2**: the unified generation, a single service with string keys
//!   and machine-readable problem codes.
//!
//! The [`factory`] selects an implementation from configuration and wires
//! in credentials (OAuth2 client-credentials or cookie session). Error
//! classification lives entirely in this crate: the engines upstream only
//! ever see `ClientError` kinds, never HTTP status codes or message text.

#![deny(unsafe_code)]

pub mod auth;
pub mod config;
pub mod factory;

mod http;
mod v1;
mod v2;

pub use config::{ApiVersion, Config, ConfigError};
pub use factory::for_version;
