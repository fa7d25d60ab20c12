//! Lifecycle orchestrator
//!
//! Composes cancel, delete and the convergence engine into the two
//! operator workflows: cancel-unless-already-terminal, and delete with an
//! optional cancel-then-retry when the engine refuses to delete a
//! non-terminal instance.

use crate::client::{ClientError, FlowClient};
use crate::convergence::wait_for_state;
use crate::error::EngineError;
use flowctl_types::{BackoffPolicy, ChangeStatus, FlowKey, FlowState};
use tracing::{debug, info};

/// What a cancel request amounted to
#[derive(Debug, Clone, PartialEq)]
pub enum CancelOutcome {
    /// The cancellation was submitted to the engine
    Submitted,
    /// The instance was already terminal; nothing was sent
    AlreadyTerminal { state: FlowState },
}

/// Cancel an instance unless it is already in a terminal state.
///
/// With `no_state_check` set the current state is not consulted and the
/// cancel request is sent unconditionally.
pub async fn cancel_if_not_terminal<C>(
    client: &C,
    key: &FlowKey,
    no_state_check: bool,
) -> Result<CancelOutcome, EngineError>
where
    C: FlowClient + ?Sized,
{
    if !no_state_check {
        debug!(%key, "checking whether instance is in a cancellable state");
        let state = client
            .fetch_state(key)
            .await
            .map_err(|err| EngineError::from_client("fetch state", key, err))?;
        if state.is_terminal() {
            info!(%key, %state, "instance already terminal, no need to cancel");
            return Ok(CancelOutcome::AlreadyTerminal { state });
        }
    }

    client
        .cancel(key)
        .await
        .map_err(|err| EngineError::from_client("cancel", key, err))?;
    info!(%key, "cancellation submitted");
    Ok(CancelOutcome::Submitted)
}

/// Delete an instance, optionally cancelling it first when the engine
/// refuses because the instance is not yet terminal.
///
/// On a precondition failure with `with_cancel` set, the sequence is:
/// cancel (skipped if meanwhile terminal), converge-wait for
/// [`FlowState::Canceled`] under `policy`, then retry the delete exactly
/// once. A failed wait aborts with [`EngineError::CancelWait`]. Without
/// `with_cancel` the precondition failure surfaces as
/// [`EngineError::Precondition`].
pub async fn delete_with_cancel<C>(
    client: &C,
    key: &FlowKey,
    with_cancel: bool,
    policy: &BackoffPolicy,
) -> Result<ChangeStatus, EngineError>
where
    C: FlowClient + ?Sized,
{
    debug!(%key, "trying to delete instance");
    match client.delete(key).await {
        Ok(status) => {
            info!(%key, deleted = status.deleted, "instance deleted");
            Ok(status)
        }
        Err(ClientError::InvalidState { message }) if with_cancel => {
            info!(%key, %message, "instance not terminal, cancelling it first");
            cancel_if_not_terminal(client, key, false).await?;

            info!(%key, "waiting for the engine to finish the cancellation");
            wait_for_state(client, key, &[FlowState::Canceled], policy)
                .await
                .map_err(|source| EngineError::CancelWait {
                    key: key.clone(),
                    source: Box::new(source),
                })?;

            let status = client
                .delete(key)
                .await
                .map_err(|err| EngineError::from_client("delete", key, err))?;
            info!(%key, deleted = status.deleted, "instance deleted after cancel");
            Ok(status)
        }
        Err(err) => Err(EngineError::from_client("delete", key, err)),
    }
}
