//! Flow instance lifecycle states

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

/// Lifecycle state of a flow instance as reported by the engine.
///
/// `Absent` is a client-side sentinel for "not found" (the remote never
/// reports it); `All` is a query-only wildcard accepted by search filters
/// and rejected by the convergence engine.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum FlowState {
    Active,
    Completed,
    Canceled,
    Terminated,
    Absent,
    All,
}

/// Error returned when a state string cannot be parsed
#[derive(Debug, Error)]
#[error("unknown flow state {0:?} (expected active, completed, canceled, terminated, absent or all)")]
pub struct StateParseError(pub String);

impl FlowState {
    /// True for states from which no further transition occurs.
    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            FlowState::Completed | FlowState::Canceled | FlowState::Terminated
        )
    }

    /// Membership test against a set of acceptable states.
    pub fn is_in(&self, states: &[FlowState]) -> bool {
        states.contains(self)
    }
}

impl fmt::Display for FlowState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            FlowState::Active => "ACTIVE",
            FlowState::Completed => "COMPLETED",
            FlowState::Canceled => "CANCELED",
            FlowState::Terminated => "TERMINATED",
            FlowState::Absent => "ABSENT",
            FlowState::All => "ALL",
        };
        write!(f, "{}", s)
    }
}

impl FromStr for FlowState {
    type Err = StateParseError;

    /// Case-insensitive parse; accepts the "cancelled" spelling too.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "active" => Ok(FlowState::Active),
            "completed" => Ok(FlowState::Completed),
            "canceled" | "cancelled" => Ok(FlowState::Canceled),
            "terminated" => Ok(FlowState::Terminated),
            "absent" => Ok(FlowState::Absent),
            "all" => Ok(FlowState::All),
            _ => Err(StateParseError(s.to_string())),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_is_case_insensitive() {
        assert_eq!("ACTIVE".parse::<FlowState>().unwrap(), FlowState::Active);
        assert_eq!("completed".parse::<FlowState>().unwrap(), FlowState::Completed);
        assert_eq!("Cancelled".parse::<FlowState>().unwrap(), FlowState::Canceled);
        assert!("running".parse::<FlowState>().is_err());
    }

    #[test]
    fn test_terminal_states() {
        assert!(FlowState::Completed.is_terminal());
        assert!(FlowState::Canceled.is_terminal());
        assert!(FlowState::Terminated.is_terminal());
        assert!(!FlowState::Active.is_terminal());
        assert!(!FlowState::Absent.is_terminal());
    }

    #[test]
    fn test_serde_uses_wire_casing() {
        let json = serde_json::to_string(&FlowState::Terminated).unwrap();
        assert_eq!(json, "\"TERMINATED\"");
        let back: FlowState = serde_json::from_str("\"CANCELED\"").unwrap();
        assert_eq!(back, FlowState::Canceled);
    }
}
