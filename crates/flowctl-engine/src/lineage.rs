//! Lineage-traversal engine
//!
//! Reconstructs the parent/child tree of flow instances from the remote
//! parent-key relation. All traversals fetch sequentially, memoize every
//! node in a chain map so no key is fetched twice, and guard with a
//! visited set. Unlike convergence, any fetch error aborts the whole
//! traversal: an incomplete lineage is not a valid result for a tree view.

use crate::client::{ClientError, FlowClient};
use crate::error::EngineError;
use flowctl_types::{FlowInstance, FlowKey};
use std::collections::{HashMap, HashSet};
use tracing::debug;

/// Result of an upward walk: the hierarchy root, the start→root path, and
/// every node fetched on the way
#[derive(Debug, Clone)]
pub struct Ancestry {
    pub root: FlowKey,
    pub path: Vec<FlowKey>,
    pub chain: HashMap<FlowKey, FlowInstance>,
}

/// Result of a downward walk: keys in visit order, parent→children edges
/// (present with an empty list for leaves), and every node fetched
#[derive(Debug, Clone)]
pub struct Subtree {
    pub keys: Vec<FlowKey>,
    pub edges: HashMap<FlowKey, Vec<FlowKey>>,
    pub chain: HashMap<FlowKey, FlowInstance>,
}

/// Walk upward from `start` via parent keys until a node without a parent
/// is found.
///
/// A revisited key means the parent chain loops back on itself; the API is
/// supposed to guarantee a tree, so this is reported as
/// [`EngineError::CycleDetected`] instead of looping forever.
pub async fn ancestry<C>(client: &C, start: &FlowKey) -> Result<Ancestry, EngineError>
where
    C: FlowClient + ?Sized,
{
    let mut visited = HashSet::new();
    let mut chain = HashMap::new();
    let mut path = Vec::new();

    let mut current = start.clone();
    loop {
        if !visited.insert(current.clone()) {
            return Err(EngineError::CycleDetected { key: current });
        }

        let instance = fetch_node(client, &current).await?;
        path.push(current.clone());
        let parent = instance.parent_key.clone();
        chain.insert(current.clone(), instance);

        match parent {
            // no parent => current is the root
            None => {
                debug!(root = %current, depth = path.len(), "ancestry walk reached root");
                return Ok(Ancestry {
                    root: current,
                    path,
                    chain,
                });
            }
            Some(p) => current = p,
        }
    }
}

/// Depth-first preorder traversal of the subtree under `root`.
///
/// `visited` prevents re-expanding a subtree that was already explored,
/// which also bounds the work if the remote reports cyclic or duplicated
/// children. Nodes already present in the chain are never re-fetched.
pub async fn descendants<C>(client: &C, root: &FlowKey) -> Result<Subtree, EngineError>
where
    C: FlowClient + ?Sized,
{
    let mut visited = HashSet::new();
    let mut keys = Vec::new();
    let mut edges: HashMap<FlowKey, Vec<FlowKey>> = HashMap::new();
    let mut chain: HashMap<FlowKey, FlowInstance> = HashMap::new();

    let mut stack = vec![root.clone()];
    while let Some(current) = stack.pop() {
        if !visited.insert(current.clone()) {
            continue;
        }
        keys.push(current.clone());

        if !chain.contains_key(&current) {
            let instance = fetch_node(client, &current).await?;
            chain.insert(current.clone(), instance);
        }

        let children = client
            .fetch_children(&current)
            .await
            .map_err(|err| EngineError::from_client("list children", &current, err))?;

        // keep an entry even when there are no children (tree rendering)
        let slot = edges.entry(current.clone()).or_default();
        for child in &children {
            slot.push(child.key.clone());
        }

        // push in reverse so the stack pops children in reported order
        for child in children.into_iter().rev() {
            let key = child.key.clone();
            chain.entry(key.clone()).or_insert(child);
            stack.push(key);
        }
    }

    debug!(root = %root, nodes = keys.len(), "descendants walk finished");
    Ok(Subtree { keys, edges, chain })
}

/// The full connected tree containing `start`: ancestry up to the root,
/// then the whole subtree from there.
pub async fn family<C>(client: &C, start: &FlowKey) -> Result<Subtree, EngineError>
where
    C: FlowClient + ?Sized,
{
    let Ancestry { root, .. } = ancestry(client, start).await?;
    descendants(client, &root).await
}

/// Keep only the instances whose parent no longer exists.
///
/// Parent lookups are memoized so a set of siblings costs one fetch. A
/// not-found parent marks the child as orphaned; any other fetch error is
/// fatal.
pub async fn filter_orphans<C>(
    client: &C,
    instances: &[FlowInstance],
) -> Result<Vec<FlowInstance>, EngineError>
where
    C: FlowClient + ?Sized,
{
    let mut parent_exists: HashMap<FlowKey, bool> = HashMap::new();
    let mut orphans = Vec::new();

    for instance in instances {
        let Some(parent) = &instance.parent_key else {
            continue;
        };
        let exists = match parent_exists.get(parent) {
            Some(known) => *known,
            None => {
                let exists = match client.fetch_instance(parent).await {
                    Ok(_) => true,
                    Err(ClientError::NotFound) => false,
                    Err(err) => {
                        return Err(EngineError::from_client("fetch parent", parent, err))
                    }
                };
                parent_exists.insert(parent.clone(), exists);
                exists
            }
        };
        if !exists {
            orphans.push(instance.clone());
        }
    }
    Ok(orphans)
}

async fn fetch_node<C>(client: &C, key: &FlowKey) -> Result<FlowInstance, EngineError>
where
    C: FlowClient + ?Sized,
{
    client
        .fetch_instance(key)
        .await
        .map_err(|err| EngineError::from_client("fetch instance", key, err))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{node, ScriptedFlow};
    use flowctl_types::FlowState;
    use std::sync::atomic::Ordering;

    /// root "1" with children "2" and "3"; "2" has child "4"
    fn family_tree() -> ScriptedFlow {
        ScriptedFlow::new()
            .with_node(node("1", None, FlowState::Active))
            .with_node(node("2", Some("1"), FlowState::Active))
            .with_node(node("3", Some("1"), FlowState::Completed))
            .with_node(node("4", Some("2"), FlowState::Active))
            .with_children("1", &["2", "3"])
            .with_children("2", &["4"])
    }

    fn keys(raw: &[&str]) -> Vec<FlowKey> {
        raw.iter().copied().map(FlowKey::from).collect()
    }

    #[tokio::test]
    async fn test_ancestry_path_runs_start_to_root() {
        let flow = family_tree();

        let got = ancestry(&flow, &FlowKey::new("4")).await.unwrap();

        assert_eq!(got.root, FlowKey::new("1"));
        assert_eq!(got.path, keys(&["4", "2", "1"]));
        assert_eq!(got.chain.len(), 3);
        // depth + 1 fetches, one per node
        assert_eq!(flow.fetch_instance_calls.load(Ordering::SeqCst), 3);
    }

    #[tokio::test]
    async fn test_ancestry_of_a_root_is_itself() {
        let flow = family_tree();

        let got = ancestry(&flow, &FlowKey::new("1")).await.unwrap();

        assert_eq!(got.root, FlowKey::new("1"));
        assert_eq!(got.path, keys(&["1"]));
    }

    #[tokio::test]
    async fn test_cyclic_parent_chain_is_detected() {
        let flow = ScriptedFlow::new()
            .with_node(node("a", Some("b"), FlowState::Active))
            .with_node(node("b", Some("a"), FlowState::Active));

        let err = ancestry(&flow, &FlowKey::new("a")).await.unwrap_err();

        match err {
            EngineError::CycleDetected { key } => assert_eq!(key, FlowKey::new("a")),
            other => panic!("expected CycleDetected, got {other:?}"),
        }
        // both nodes fetched exactly once before the loop closes
        assert_eq!(flow.fetch_instance_calls.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn test_ancestry_missing_node_is_fatal() {
        let flow = family_tree();

        let err = ancestry(&flow, &FlowKey::new("ghost")).await.unwrap_err();

        assert!(matches!(err, EngineError::NotFound { .. }));
    }

    #[tokio::test]
    async fn test_descendants_visits_preorder_and_keeps_leaf_edges() {
        let flow = family_tree();

        let got = descendants(&flow, &FlowKey::new("1")).await.unwrap();

        assert_eq!(got.keys, keys(&["1", "2", "4", "3"]));
        assert_eq!(got.edges[&FlowKey::new("1")], keys(&["2", "3"]));
        assert_eq!(got.edges[&FlowKey::new("2")], keys(&["4"]));
        assert!(got.edges[&FlowKey::new("3")].is_empty());
        assert!(got.edges[&FlowKey::new("4")].is_empty());
        assert_eq!(got.chain.len(), 4);
        // children listings carry full snapshots, so only the root needs a
        // direct instance fetch
        assert_eq!(flow.fetch_instance_calls.load(Ordering::SeqCst), 1);
        assert_eq!(flow.fetch_children_calls.load(Ordering::SeqCst), 4);
    }

    #[tokio::test]
    async fn test_descendants_duplicated_child_is_expanded_once() {
        let flow = ScriptedFlow::new()
            .with_node(node("1", None, FlowState::Active))
            .with_node(node("2", Some("1"), FlowState::Active))
            .with_children("1", &["2", "2"]);

        let got = descendants(&flow, &FlowKey::new("1")).await.unwrap();

        assert_eq!(got.keys, keys(&["1", "2"]));
        assert_eq!(got.chain.len(), 2);
        let children_calls = flow.fetch_children_calls.load(Ordering::SeqCst);
        assert_eq!(children_calls, 2, "the duplicate must not be re-expanded");
    }

    #[tokio::test]
    async fn test_descendants_child_listing_error_aborts() {
        let flow = family_tree().with_children_error(
            "3",
            ClientError::Api {
                status: 500,
                message: "boom".to_string(),
            },
        );

        let err = descendants(&flow, &FlowKey::new("1")).await.unwrap_err();

        match err {
            EngineError::Client { op, key, .. } => {
                assert_eq!(op, "list children");
                assert_eq!(key, FlowKey::new("3"));
            }
            other => panic!("expected Client error, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_family_is_identical_from_any_member() {
        let flow = family_tree();
        let from_leaf = family(&flow, &FlowKey::new("4")).await.unwrap();

        let flow = family_tree();
        let from_root = family(&flow, &FlowKey::new("1")).await.unwrap();

        assert_eq!(from_leaf.keys, from_root.keys);
        assert_eq!(from_leaf.edges, from_root.edges);
    }

    #[tokio::test]
    async fn test_filter_orphans_memoizes_parent_lookups() {
        let flow = ScriptedFlow::new().with_node(node("1", None, FlowState::Active));
        let gone = [
            node("10", Some("gone"), FlowState::Active),
            node("11", Some("gone"), FlowState::Active),
            node("12", Some("1"), FlowState::Active),
            node("13", None, FlowState::Active),
        ];

        let orphans = filter_orphans(&flow, &gone).await.unwrap();

        let orphan_keys: Vec<_> = orphans.iter().map(|o| o.key.clone()).collect();
        assert_eq!(orphan_keys, keys(&["10", "11"]));
        // one lookup for "gone", one for "1", none for the root instance
        assert_eq!(flow.fetch_instance_calls.load(Ordering::SeqCst), 2);
    }
}
