//! Engine error taxonomy

use crate::client::ClientError;
use flowctl_types::FlowKey;
use std::time::Duration;
use thiserror::Error;

/// Errors produced by the convergence, lineage and lifecycle engines.
///
/// The only error the engines absorb silently is the not-found result of a
/// state poll, which convergence folds into the `Absent` state. Everything
/// else propagates, wrapped with the key and operation it occurred on.
#[derive(Debug, Error)]
pub enum EngineError {
    /// A fetched resource does not exist; fatal everywhere except inside a
    /// convergence poll
    #[error("flow instance {key} not found")]
    NotFound { key: FlowKey },

    /// The parent chain loops back on itself (malformed remote data)
    #[error("cycle detected in parent chain at key {key}")]
    CycleDetected { key: FlowKey },

    /// The convergence loop used up its attempt budget
    #[error("exceeded max retries ({attempts}) waiting for desired state")]
    RetriesExhausted { attempts: u32 },

    /// The convergence loop used up its time budget
    #[error("deadline exceeded after {waited:?} waiting for desired state")]
    DeadlineExceeded { waited: Duration },

    /// Caller contract violation: empty desired set or the ALL wildcard
    #[error("desired state set must be non-empty and must not contain ALL")]
    InvalidDesiredState,

    /// The remote refused an operation for the instance's current state
    #[error("operation refused for {key}: {message}")]
    Precondition { key: FlowKey, message: String },

    /// Waiting for cancellation during the cancel-then-delete retry failed
    #[error("waiting for cancellation of {key} during delete retry")]
    CancelWait {
        key: FlowKey,
        #[source]
        source: Box<EngineError>,
    },

    /// Any other client failure, tagged with the operation it occurred in
    #[error("{op} failed for {key}")]
    Client {
        op: &'static str,
        key: FlowKey,
        #[source]
        source: ClientError,
    },
}

impl EngineError {
    /// Wrap a client error with operation context, promoting the
    /// distinguished kinds to their own variants.
    pub(crate) fn from_client(op: &'static str, key: &FlowKey, source: ClientError) -> Self {
        match source {
            ClientError::NotFound => EngineError::NotFound { key: key.clone() },
            ClientError::InvalidState { message } => EngineError::Precondition {
                key: key.clone(),
                message,
            },
            other => EngineError::Client {
                op,
                key: key.clone(),
                source: other,
            },
        }
    }
}
