//! flowctl engine - the version-agnostic core of the CLI
//!
//! Three coupled pieces sit in this crate, all programmed against the
//! [`FlowClient`] capability trait so they never branch on the remote API
//! generation:
//!
//! - **convergence**: polls an instance until it reaches a desired state
//!   under a bounded retry/backoff budget
//! - **lineage**: reconstructs the parent/child tree of instances with
//!   cycle detection and memoized fetches
//! - **lifecycle**: composes cancel, delete and convergence into the
//!   delete-with-cancel workflow
//!
//! All remote calls are issued sequentially, one in flight at a time,
//! which bounds remote load and keeps the traversal bookkeeping lock-free.
//! Cancellation is the Rust-native kind: dropping a returned future (for
//! example through `tokio::time::timeout`) aborts the loop at its next
//! await point, so an outer deadline always intersects the policy timeout.

#![deny(unsafe_code)]

pub mod client;
pub mod convergence;
pub mod error;
pub mod lifecycle;
pub mod lineage;

#[cfg(test)]
pub(crate) mod testing;

pub use client::{ClientError, FlowClient};
pub use convergence::wait_for_state;
pub use error::EngineError;
pub use lifecycle::{cancel_if_not_terminal, delete_with_cancel, CancelOutcome};
pub use lineage::{ancestry, descendants, family, filter_orphans, Ancestry, Subtree};
