//! Scripted in-memory fake of [`FlowClient`] for engine tests
//!
//! Builds a small remote world from per-key nodes and child listings, with
//! optional scripted response sequences and failure injections. Every
//! operation bumps an atomic counter so tests can assert exact call counts.

use crate::client::{ClientError, FlowClient};
use async_trait::async_trait;
use flowctl_types::{
    ChangeStatus, DefinitionFilter, DeployResource, FlowDefinition, FlowInstance, FlowKey,
    FlowState, InstanceFilter,
};
use std::collections::{HashMap, VecDeque};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;

/// Build a test instance snapshot.
pub(crate) fn node(key: &str, parent: Option<&str>, state: FlowState) -> FlowInstance {
    FlowInstance {
        key: FlowKey::new(key),
        definition_id: "order-fulfilment".to_string(),
        definition_key: Some(FlowKey::new("def-1")),
        version: Some(1),
        version_tag: None,
        state,
        incident: false,
        parent_key: parent.map(FlowKey::new),
        tenant: "acme".to_string(),
        start_time: None,
        end_time: None,
    }
}

#[derive(Default)]
pub(crate) struct ScriptedFlow {
    nodes: Mutex<HashMap<FlowKey, FlowInstance>>,
    children: Mutex<HashMap<FlowKey, Vec<FlowKey>>>,
    children_errors: Mutex<HashMap<FlowKey, ClientError>>,
    states: Mutex<HashMap<FlowKey, VecDeque<Result<FlowState, ClientError>>>>,
    deletes: Mutex<VecDeque<Result<ChangeStatus, ClientError>>>,

    pub fetch_instance_calls: AtomicUsize,
    pub fetch_state_calls: AtomicUsize,
    pub fetch_children_calls: AtomicUsize,
    pub cancel_calls: AtomicUsize,
    pub delete_calls: AtomicUsize,
}

impl ScriptedFlow {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_node(self, instance: FlowInstance) -> Self {
        self.nodes
            .lock()
            .unwrap()
            .insert(instance.key.clone(), instance);
        self
    }

    pub fn with_children(self, parent: &str, children: &[&str]) -> Self {
        self.children
            .lock()
            .unwrap()
            .insert(
                FlowKey::new(parent),
                children.iter().copied().map(FlowKey::from).collect(),
            );
        self
    }

    pub fn with_children_error(self, parent: &str, error: ClientError) -> Self {
        self.children_errors
            .lock()
            .unwrap()
            .insert(FlowKey::new(parent), error);
        self
    }

    /// Script the responses of `fetch_state` for one key; the last entry
    /// repeats once the sequence is exhausted.
    pub fn with_states(self, key: &str, states: Vec<Result<FlowState, ClientError>>) -> Self {
        self.states
            .lock()
            .unwrap()
            .insert(FlowKey::new(key), states.into());
        self
    }

    pub fn with_delete_results(self, results: Vec<Result<ChangeStatus, ClientError>>) -> Self {
        *self.deletes.lock().unwrap() = results.into();
        self
    }
}

#[async_trait]
impl FlowClient for ScriptedFlow {
    async fn fetch_instance(&self, key: &FlowKey) -> Result<FlowInstance, ClientError> {
        self.fetch_instance_calls.fetch_add(1, Ordering::SeqCst);
        self.nodes
            .lock()
            .unwrap()
            .get(key)
            .cloned()
            .ok_or(ClientError::NotFound)
    }

    async fn fetch_state(&self, key: &FlowKey) -> Result<FlowState, ClientError> {
        self.fetch_state_calls.fetch_add(1, Ordering::SeqCst);
        let mut states = self.states.lock().unwrap();
        if let Some(queue) = states.get_mut(key) {
            if queue.len() > 1 {
                return queue.pop_front().unwrap();
            }
            if let Some(last) = queue.front() {
                return last.clone();
            }
        }
        self.nodes
            .lock()
            .unwrap()
            .get(key)
            .map(|n| n.state)
            .ok_or(ClientError::NotFound)
    }

    async fn fetch_children(&self, parent: &FlowKey) -> Result<Vec<FlowInstance>, ClientError> {
        self.fetch_children_calls.fetch_add(1, Ordering::SeqCst);
        if let Some(err) = self.children_errors.lock().unwrap().get(parent) {
            return Err(err.clone());
        }
        let nodes = self.nodes.lock().unwrap();
        let children = self.children.lock().unwrap();
        Ok(children
            .get(parent)
            .map(|keys| keys.iter().filter_map(|k| nodes.get(k).cloned()).collect())
            .unwrap_or_default())
    }

    async fn cancel(&self, _key: &FlowKey) -> Result<(), ClientError> {
        self.cancel_calls.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }

    async fn delete(&self, _key: &FlowKey) -> Result<ChangeStatus, ClientError> {
        self.delete_calls.fetch_add(1, Ordering::SeqCst);
        self.deletes.lock().unwrap().pop_front().unwrap_or(Ok(ChangeStatus {
            deleted: 1,
            message: "deleted".to_string(),
        }))
    }

    async fn search_instances(
        &self,
        _filter: &InstanceFilter,
        _size: i32,
    ) -> Result<Vec<FlowInstance>, ClientError> {
        Ok(self.nodes.lock().unwrap().values().cloned().collect())
    }

    async fn fetch_definition(&self, _key: &FlowKey) -> Result<FlowDefinition, ClientError> {
        Err(ClientError::NotFound)
    }

    async fn search_definitions(
        &self,
        _filter: &DefinitionFilter,
        _size: i32,
    ) -> Result<Vec<FlowDefinition>, ClientError> {
        Ok(Vec::new())
    }

    async fn deploy_definitions(
        &self,
        _tenant: &str,
        _resources: &[DeployResource],
    ) -> Result<Vec<FlowDefinition>, ClientError> {
        Ok(Vec::new())
    }
}
