//! Strongly-typed identifier for flow instances and definitions
//!
//! Keys are opaque strings wrapped in a newtype for type safety. The v1 API
//! generation hands out integer keys; those are rendered as decimal strings
//! at the client boundary so the rest of the system sees one representation.
//! "No parent" is always `Option<FlowKey>::None`; a zero value is never
//! overloaded as a sentinel.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Unique identifier for a flow instance or flow definition
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct FlowKey(String);

impl FlowKey {
    pub fn new(key: impl Into<String>) -> Self {
        Self(key.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for FlowKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<&str> for FlowKey {
    fn from(key: &str) -> Self {
        Self(key.to_string())
    }
}

impl From<String> for FlowKey {
    fn from(key: String) -> Self {
        Self(key)
    }
}

impl From<i64> for FlowKey {
    fn from(key: i64) -> Self {
        Self(key.to_string())
    }
}
