//! Flow instance and definition snapshots
//!
//! A FlowInstance is an immutable snapshot of one remote instance at fetch
//! time; re-fetching produces a new snapshot. Nothing is persisted between
//! command invocations.

use crate::{FlowKey, FlowState};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Snapshot of one flow instance
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FlowInstance {
    /// Instance key
    pub key: FlowKey,

    /// Id of the flow definition this instance runs
    pub definition_id: String,

    /// Key of the flow definition this instance runs
    pub definition_key: Option<FlowKey>,

    /// Definition version
    #[serde(skip_serializing_if = "Option::is_none")]
    pub version: Option<i32>,

    /// Definition version tag
    #[serde(skip_serializing_if = "Option::is_none")]
    pub version_tag: Option<String>,

    /// Current state at fetch time
    pub state: FlowState,

    /// Whether the instance carries an unresolved incident
    #[serde(default)]
    pub incident: bool,

    /// Key of the parent instance; `None` means this instance is a root
    #[serde(skip_serializing_if = "Option::is_none")]
    pub parent_key: Option<FlowKey>,

    /// Owning tenant
    #[serde(default)]
    pub tenant: String,

    /// Start timestamp
    #[serde(skip_serializing_if = "Option::is_none")]
    pub start_time: Option<DateTime<Utc>>,

    /// End timestamp, set once the instance is terminal
    #[serde(skip_serializing_if = "Option::is_none")]
    pub end_time: Option<DateTime<Utc>>,
}

impl FlowInstance {
    /// True when this instance has no parent.
    pub fn is_root(&self) -> bool {
        self.parent_key.is_none()
    }
}

/// Snapshot of one deployed flow definition
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FlowDefinition {
    /// Definition key
    pub key: FlowKey,

    /// Human-assigned definition id
    pub definition_id: String,

    /// Display name
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,

    /// Version number
    pub version: i32,

    /// Version tag
    #[serde(skip_serializing_if = "Option::is_none")]
    pub version_tag: Option<String>,

    /// Owning tenant
    #[serde(default)]
    pub tenant: String,
}

/// Search filter for flow instances; unset fields do not constrain the query
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InstanceFilter {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub definition_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub version: Option<i32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub version_tag: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub state: Option<FlowState>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub parent_key: Option<FlowKey>,
}

/// Search filter for flow definitions
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DefinitionFilter {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub definition_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub version: Option<i32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub version_tag: Option<String>,
}

/// Result of a delete operation
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ChangeStatus {
    /// Number of records removed by the engine
    pub deleted: i64,
    /// Engine-provided status message
    pub message: String,
}

impl std::fmt::Display for ChangeStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "deleted: {}, message: {}", self.deleted, self.message)
    }
}

/// One definition resource to deploy
#[derive(Debug, Clone, PartialEq)]
pub struct DeployResource {
    /// Resource file name, used by the engine to pick a parser
    pub name: String,
    /// Raw file content
    pub content: Vec<u8>,
}
