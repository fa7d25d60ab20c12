//! State-convergence engine
//!
//! Polls the remote state of one instance until it matches a desired set,
//! the retry/timeout budget runs out, or the caller drops the future.

use crate::client::{ClientError, FlowClient};
use crate::error::EngineError;
use flowctl_types::{BackoffPolicy, FlowKey, FlowState};
use std::time::Duration;
use tokio::time::Instant;
use tracing::{debug, warn};

/// Wait until the instance identified by `key` reaches one of the `desired`
/// states.
///
/// Semantics:
/// - a not-found poll result is the state [`FlowState::Absent`], a valid
///   outcome that can itself satisfy the wait (waiting for an instance to
///   disappear);
/// - any other fetch error is transient: logged and retried within the
///   budget;
/// - `policy.max_retries == 0` means unlimited attempts, bounded only by
///   the policy timeout and caller cancellation;
/// - the policy timeout is enforced as an internal deadline that clamps
///   every sleep, checked before each remote call. A shorter caller
///   deadline wins automatically because dropping the future cancels the
///   loop at its next await point.
///
/// The desired set must be non-empty and must not contain the ALL wildcard;
/// callers filter that out before invoking the engine.
///
/// Returns the observed state that satisfied the wait.
pub async fn wait_for_state<C>(
    client: &C,
    key: &FlowKey,
    desired: &[FlowState],
    policy: &BackoffPolicy,
) -> Result<FlowState, EngineError>
where
    C: FlowClient + ?Sized,
{
    if desired.is_empty() || desired.contains(&FlowState::All) {
        return Err(EngineError::InvalidDesiredState);
    }

    let started = Instant::now();
    let deadline = policy.timeout().map(|t| started + t);
    let mut attempts: u32 = 0;
    let mut delay = policy.initial_delay();

    loop {
        if deadline.is_some_and(|d| Instant::now() >= d) {
            return Err(EngineError::DeadlineExceeded {
                waited: started.elapsed(),
            });
        }

        attempts += 1;
        let observed = match client.fetch_state(key).await {
            Ok(state) => Some(state),
            Err(ClientError::NotFound) => {
                debug!(%key, "instance is absent (not found)");
                Some(FlowState::Absent)
            }
            Err(err) => {
                warn!(%key, error = %err, "fetching state failed, will retry");
                None
            }
        };

        if let Some(state) = observed {
            if state.is_in(desired) {
                debug!(%key, %state, "instance reached desired state");
                return Ok(state);
            }
            debug!(%key, %state, "waiting for desired state");
        }

        if !policy.unlimited_retries() && attempts >= policy.max_retries {
            return Err(EngineError::RetriesExhausted { attempts });
        }

        let mut sleep_for = if policy.jitter { jittered(delay) } else { delay };
        if let Some(d) = deadline {
            let now = Instant::now();
            if now >= d {
                return Err(EngineError::DeadlineExceeded {
                    waited: started.elapsed(),
                });
            }
            sleep_for = sleep_for.min(d - now);
        }
        tokio::time::sleep(sleep_for).await;
        delay = policy.next_delay(delay);
    }
}

/// Scale a delay by a uniform factor in [0.5, 1.0].
///
/// Only the slept duration is jittered; the base delay advances
/// deterministically so the exponential growth invariant holds.
fn jittered(delay: Duration) -> Duration {
    use rand::Rng;
    let factor: f64 = rand::thread_rng().gen_range(0.5..=1.0);
    delay.mul_f64(factor)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{node, ScriptedFlow};
    use flowctl_types::BackoffStrategy;
    use std::sync::atomic::Ordering;

    fn policy(max_retries: u32, timeout_ms: u64) -> BackoffPolicy {
        BackoffPolicy {
            strategy: BackoffStrategy::Fixed,
            initial_delay_ms: 100,
            max_retries,
            timeout_ms,
            ..Default::default()
        }
    }

    #[tokio::test(start_paused = true)]
    async fn test_desired_state_on_first_fetch_polls_once() {
        let flow = ScriptedFlow::new().with_node(node("1", None, FlowState::Completed));

        let got = wait_for_state(
            &flow,
            &FlowKey::new("1"),
            &[FlowState::Completed],
            &policy(0, 0),
        )
        .await
        .unwrap();

        assert_eq!(got, FlowState::Completed);
        assert_eq!(flow.fetch_state_calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_retry_budget_bounds_fetch_attempts() {
        let flow = ScriptedFlow::new().with_node(node("1", None, FlowState::Active));

        let err = wait_for_state(
            &flow,
            &FlowKey::new("1"),
            &[FlowState::Completed],
            &policy(3, 0),
        )
        .await
        .unwrap_err();

        assert!(matches!(err, EngineError::RetriesExhausted { attempts: 3 }));
        assert_eq!(flow.fetch_state_calls.load(Ordering::SeqCst), 3);
    }

    #[tokio::test(start_paused = true)]
    async fn test_absent_satisfies_a_wait_for_disappearance() {
        let flow = ScriptedFlow::new(); // no node at all -> every poll is a 404

        let got = wait_for_state(&flow, &FlowKey::new("9"), &[FlowState::Absent], &policy(0, 0))
            .await
            .unwrap();

        assert_eq!(got, FlowState::Absent);
        assert_eq!(flow.fetch_state_calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_transient_fetch_errors_are_retried() {
        let flow = ScriptedFlow::new().with_states(
            "1",
            vec![
                Err(ClientError::Transport {
                    message: "connection reset".to_string(),
                }),
                Ok(FlowState::Active),
                Ok(FlowState::Completed),
            ],
        );

        let got = wait_for_state(
            &flow,
            &FlowKey::new("1"),
            &[FlowState::Completed],
            &policy(0, 0),
        )
        .await
        .unwrap();

        assert_eq!(got, FlowState::Completed);
        assert_eq!(flow.fetch_state_calls.load(Ordering::SeqCst), 3);
    }

    #[tokio::test(start_paused = true)]
    async fn test_policy_timeout_bounds_the_loop() {
        let flow = ScriptedFlow::new().with_node(node("1", None, FlowState::Active));

        let err = wait_for_state(
            &flow,
            &FlowKey::new("1"),
            &[FlowState::Completed],
            &policy(0, 550),
        )
        .await
        .unwrap_err();

        match err {
            EngineError::DeadlineExceeded { waited } => {
                assert!(waited >= Duration::from_millis(550));
            }
            other => panic!("expected DeadlineExceeded, got {other:?}"),
        }
    }

    #[tokio::test(start_paused = true)]
    async fn test_dropping_the_future_cancels_mid_sleep() {
        let flow = ScriptedFlow::new().with_node(node("1", None, FlowState::Active));
        let slow = BackoffPolicy {
            strategy: BackoffStrategy::Fixed,
            initial_delay_ms: 60_000,
            max_retries: 0,
            timeout_ms: 0,
            ..Default::default()
        };

        let outcome = tokio::time::timeout(
            Duration::from_millis(500),
            wait_for_state(&flow, &FlowKey::new("1"), &[FlowState::Completed], &slow),
        )
        .await;

        assert!(outcome.is_err(), "outer timeout must win over the sleep");
        assert_eq!(flow.fetch_state_calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_wildcard_and_empty_target_are_rejected() {
        let flow = ScriptedFlow::new().with_node(node("1", None, FlowState::Active));
        let key = FlowKey::new("1");

        let err = wait_for_state(&flow, &key, &[FlowState::All], &policy(0, 0))
            .await
            .unwrap_err();
        assert!(matches!(err, EngineError::InvalidDesiredState));

        let err = wait_for_state(&flow, &key, &[], &policy(0, 0)).await.unwrap_err();
        assert!(matches!(err, EngineError::InvalidDesiredState));

        assert_eq!(flow.fetch_state_calls.load(Ordering::SeqCst), 0);
    }

    #[test]
    fn test_jitter_stays_within_bounds() {
        let base = Duration::from_millis(1_000);
        for _ in 0..100 {
            let j = jittered(base);
            assert!(j >= base / 2 && j <= base);
        }
    }
}
