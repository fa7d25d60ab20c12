//! flowctl types - domain model for the workflow-engine client
//!
//! This crate carries the version-agnostic vocabulary shared by the engine,
//! the HTTP client implementations, and the CLI:
//!
//! - **FlowKey**: opaque identifier of a flow instance or definition
//! - **FlowState**: lifecycle state of an instance, including the `Absent`
//!   not-found sentinel used by the convergence engine
//! - **FlowInstance / FlowDefinition**: immutable snapshots fetched from the
//!   remote engine
//! - **BackoffPolicy**: the retry/delay/timeout budget for polling loops
//!
//! Nothing here performs I/O; higher layers own transport and rendering.

#![deny(unsafe_code)]

pub mod backoff;
pub mod instance;
pub mod key;
pub mod state;

pub use backoff::{BackoffPolicy, BackoffStrategy};
pub use instance::{
    ChangeStatus, DefinitionFilter, DeployResource, FlowDefinition, FlowInstance, InstanceFilter,
};
pub use key::FlowKey;
pub use state::{FlowState, StateParseError};
