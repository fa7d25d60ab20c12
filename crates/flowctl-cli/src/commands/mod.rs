//! Command modules and shared flag packs

pub mod cancel;
pub mod delete;
pub mod deploy;
pub mod get;
pub mod wait;
pub mod walk;

use clap::Args;
use flowctl_types::{BackoffPolicy, BackoffStrategy, FlowState};

/// Backoff flags shared by every command that waits on a state.
///
/// Unset flags fall back to the config file's `[app.backoff]` section.
#[derive(Debug, Clone, Args)]
pub struct BackoffArgs {
    /// Backoff strategy: fixed|exponential
    #[arg(long, value_parser = parse_strategy)]
    pub backoff_strategy: Option<BackoffStrategy>,

    /// Initial delay between polls in milliseconds
    #[arg(long)]
    pub backoff_initial_delay_ms: Option<u64>,

    /// Maximum delay between polls in milliseconds
    #[arg(long)]
    pub backoff_max_delay_ms: Option<u64>,

    /// Exponential multiplier (>1)
    #[arg(long)]
    pub backoff_multiplier: Option<f64>,

    /// Max poll attempts (0 = unlimited)
    #[arg(long)]
    pub backoff_max_retries: Option<u32>,

    /// Overall timeout for the poll loop in milliseconds (0 = unbounded)
    #[arg(long)]
    pub backoff_timeout_ms: Option<u64>,

    /// Randomize slept delays
    #[arg(long)]
    pub backoff_jitter: bool,
}

impl BackoffArgs {
    /// Overlay these flags on the configured policy.
    pub fn apply(&self, base: &BackoffPolicy) -> BackoffPolicy {
        let mut policy = base.clone();
        if let Some(strategy) = self.backoff_strategy {
            policy.strategy = strategy;
        }
        if let Some(ms) = self.backoff_initial_delay_ms {
            policy.initial_delay_ms = ms;
        }
        if let Some(ms) = self.backoff_max_delay_ms {
            policy.max_delay_ms = ms;
        }
        if let Some(multiplier) = self.backoff_multiplier {
            policy.multiplier = multiplier;
        }
        if let Some(retries) = self.backoff_max_retries {
            policy.max_retries = retries;
        }
        if let Some(ms) = self.backoff_timeout_ms {
            policy.timeout_ms = ms;
        }
        if self.backoff_jitter {
            policy.jitter = true;
        }
        policy
    }
}

pub(crate) fn parse_state(raw: &str) -> Result<FlowState, String> {
    raw.parse().map_err(|err| format!("{err}"))
}

pub(crate) fn parse_strategy(raw: &str) -> Result<BackoffStrategy, String> {
    raw.parse().map_err(|err| format!("{err}"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_backoff_flags_overlay_config_values() {
        let args = BackoffArgs {
            backoff_strategy: Some(BackoffStrategy::Fixed),
            backoff_initial_delay_ms: Some(50),
            backoff_max_delay_ms: None,
            backoff_multiplier: None,
            backoff_max_retries: Some(7),
            backoff_timeout_ms: None,
            backoff_jitter: false,
        };
        let base = BackoffPolicy::default();

        let policy = args.apply(&base);

        assert_eq!(policy.strategy, BackoffStrategy::Fixed);
        assert_eq!(policy.initial_delay_ms, 50);
        assert_eq!(policy.max_retries, 7);
        // untouched fields keep the configured values
        assert_eq!(policy.max_delay_ms, base.max_delay_ms);
        assert_eq!(policy.timeout_ms, base.timeout_ms);
    }
}
