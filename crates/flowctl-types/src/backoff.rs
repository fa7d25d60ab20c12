//! Backoff policy for polling loops
//!
//! A pure value type: computing the next delay has no side effects and the
//! policy itself holds no attempt state. Delays are carried as milliseconds
//! so the same struct deserializes straight out of config files and flag
//! values.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use std::time::Duration;
use thiserror::Error;

/// Delay-growth strategy between polls
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BackoffStrategy {
    /// Constant delay
    Fixed,
    /// Delay multiplied per attempt, capped at the max delay
    Exponential,
}

/// Error returned when a strategy string cannot be parsed
#[derive(Debug, Error)]
#[error("unknown backoff strategy {0:?} (expected fixed or exponential)")]
pub struct StrategyParseError(pub String);

impl FromStr for BackoffStrategy {
    type Err = StrategyParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "fixed" => Ok(BackoffStrategy::Fixed),
            "exponential" => Ok(BackoffStrategy::Exponential),
            _ => Err(StrategyParseError(s.to_string())),
        }
    }
}

impl fmt::Display for BackoffStrategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            BackoffStrategy::Fixed => write!(f, "fixed"),
            BackoffStrategy::Exponential => write!(f, "exponential"),
        }
    }
}

/// Retry/delay/timeout budget for a convergence loop.
///
/// `max_retries == 0` means unlimited attempts; `timeout_ms == 0` means no
/// policy deadline. Under the exponential strategy the base delay is
/// monotonically non-decreasing and bounded by `max_delay_ms`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BackoffPolicy {
    pub strategy: BackoffStrategy,
    pub initial_delay_ms: u64,
    pub max_delay_ms: u64,
    pub multiplier: f64,
    pub max_retries: u32,
    pub timeout_ms: u64,
    /// Scale each slept delay by a random factor without touching the
    /// advancing base delay
    pub jitter: bool,
}

impl Default for BackoffPolicy {
    fn default() -> Self {
        Self {
            strategy: BackoffStrategy::Exponential,
            initial_delay_ms: 500,
            max_delay_ms: 8_000,
            multiplier: 2.0,
            max_retries: 0,
            timeout_ms: 120_000,
            jitter: false,
        }
    }
}

impl BackoffPolicy {
    pub fn initial_delay(&self) -> Duration {
        Duration::from_millis(self.initial_delay_ms)
    }

    pub fn max_delay(&self) -> Duration {
        Duration::from_millis(self.max_delay_ms)
    }

    /// Overall loop deadline; `None` when unbounded.
    pub fn timeout(&self) -> Option<Duration> {
        (self.timeout_ms > 0).then(|| Duration::from_millis(self.timeout_ms))
    }

    pub fn unlimited_retries(&self) -> bool {
        self.max_retries == 0
    }

    /// Advance the base delay per the strategy.
    pub fn next_delay(&self, current: Duration) -> Duration {
        match self.strategy {
            BackoffStrategy::Fixed => current,
            BackoffStrategy::Exponential => {
                // multipliers below 1.0 would make the delay shrink
                let factor = self.multiplier.max(1.0);
                current.mul_f64(factor).min(self.max_delay())
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fixed_strategy_keeps_delay_constant() {
        let policy = BackoffPolicy {
            strategy: BackoffStrategy::Fixed,
            initial_delay_ms: 250,
            ..Default::default()
        };
        let d = policy.initial_delay();
        assert_eq!(policy.next_delay(d), d);
        assert_eq!(policy.next_delay(policy.next_delay(d)), d);
    }

    #[test]
    fn test_exponential_strategy_grows_and_caps() {
        let policy = BackoffPolicy::default();
        let mut delay = policy.initial_delay();
        let mut previous = delay;
        for _ in 0..10 {
            delay = policy.next_delay(delay);
            assert!(delay >= previous, "delay must never shrink");
            assert!(delay <= policy.max_delay());
            previous = delay;
        }
        assert_eq!(delay, policy.max_delay());
    }

    #[test]
    fn test_multiplier_below_one_is_clamped() {
        let policy = BackoffPolicy {
            multiplier: 0.5,
            ..Default::default()
        };
        let d = Duration::from_millis(500);
        assert_eq!(policy.next_delay(d), d);
    }

    #[test]
    fn test_zero_timeout_means_unbounded() {
        let policy = BackoffPolicy {
            timeout_ms: 0,
            ..Default::default()
        };
        assert!(policy.timeout().is_none());
        assert!(BackoffPolicy::default().timeout().is_some());
    }

    #[test]
    fn test_strategy_parse() {
        assert_eq!(
            "Exponential".parse::<BackoffStrategy>().unwrap(),
            BackoffStrategy::Exponential
        );
        assert_eq!("fixed".parse::<BackoffStrategy>().unwrap(), BackoffStrategy::Fixed);
        assert!("linear".parse::<BackoffStrategy>().is_err());
    }
}
