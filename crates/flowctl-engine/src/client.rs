//! Capability trait for talking to the remote workflow engine
//!
//! One implementation exists per API generation (see the flowctl-client
//! crate); the engines in this crate depend only on this trait and on the
//! [`ClientError`] taxonomy. Error classification happens behind the trait:
//! implementations translate their wire-level failures into distinguished
//! kinds so callers never match on message text.

use async_trait::async_trait;
use flowctl_types::{
    ChangeStatus, DefinitionFilter, DeployResource, FlowDefinition, FlowInstance, FlowKey,
    FlowState, InstanceFilter,
};
use thiserror::Error;

/// Errors surfaced by a [`FlowClient`] implementation
#[derive(Debug, Clone, Error)]
pub enum ClientError {
    /// The resource does not exist (404-equivalent)
    #[error("not found")]
    NotFound,

    /// The engine refused the operation because the instance is not in an
    /// acceptable state (the delete precondition failure)
    #[error("invalid state: {message}")]
    InvalidState { message: String },

    /// Any other error response from the remote API
    #[error("api error (status {status}): {message}")]
    Api { status: u16, message: String },

    /// A success response whose payload could not be interpreted
    #[error("malformed response: {message}")]
    Malformed { message: String },

    /// The request never produced a response
    #[error("transport error: {message}")]
    Transport { message: String },
}

/// Client capability interface for one workflow-engine API generation.
///
/// All calls honor the caller's cancellation by being ordinary futures;
/// network-level timeouts are owned by the implementation.
#[async_trait]
pub trait FlowClient: Send + Sync {
    /// Fetch the full snapshot of one instance.
    async fn fetch_instance(&self, key: &FlowKey) -> Result<FlowInstance, ClientError>;

    /// Fetch only the current state of one instance.
    async fn fetch_state(&self, key: &FlowKey) -> Result<FlowState, ClientError>;

    /// List the direct children of an instance.
    async fn fetch_children(&self, parent: &FlowKey) -> Result<Vec<FlowInstance>, ClientError>;

    /// Request cancellation of a running instance.
    async fn cancel(&self, key: &FlowKey) -> Result<(), ClientError>;

    /// Delete an instance and its dependant data.
    async fn delete(&self, key: &FlowKey) -> Result<ChangeStatus, ClientError>;

    /// Search instances matching a filter.
    async fn search_instances(
        &self,
        filter: &InstanceFilter,
        size: i32,
    ) -> Result<Vec<FlowInstance>, ClientError>;

    /// Fetch one flow definition.
    async fn fetch_definition(&self, key: &FlowKey) -> Result<FlowDefinition, ClientError>;

    /// Search flow definitions matching a filter.
    async fn search_definitions(
        &self,
        filter: &DefinitionFilter,
        size: i32,
    ) -> Result<Vec<FlowDefinition>, ClientError>;

    /// Deploy definition resources to a tenant.
    async fn deploy_definitions(
        &self,
        tenant: &str,
        resources: &[DeployResource],
    ) -> Result<Vec<FlowDefinition>, ClientError>;
}
