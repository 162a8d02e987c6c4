//! Two-tree merge engine.
//!
//! [`merge`] combines an existing tree with an incoming one, recursing
//! key-by-key for maps and treating arrays and scalars whole. Without a
//! directive the defaults apply: maps splice, arrays append, everything
//! else replaces. A directive attached to the incoming node always wins
//! over both the default and any directive on the existing node. Inputs are
//! never mutated; the result is a fresh tree whose provenance unions both
//! sides.

use crate::directive::MergePolicy;
use crate::error::{ConfigError, ConfigResult};
use crate::node::{Node, NodeKind, NodeValue, Origin};
use crate::path::join_segments;
use crate::result_ext::IntoShared;


/// Merge `incoming` over `existing`, producing a new tree.
///
/// # Errors
///
/// Returns [`ConfigError::Conflict`] when a `fail` directive is reached,
/// identifying the offending path. Neither input is modified in that case.
///
/// # Examples
///
/// ```
/// use conflux::{Node, merge};
/// use serde_json::json;
///
/// let base = Node::from_value("base", &json!({"a": {"b": 1, "c": 2}}))?;
/// let over = Node::from_value("over", &json!({"a": {"b((replace))": 9, "d": 4}}))?;
/// let merged = merge(&base, &over)?;
/// assert_eq!(merged.to_value(), json!({"a": {"b": 9, "c": 2, "d": 4}}));
/// # Ok::<_, std::sync::Arc<conflux::ConfigError>>(())
/// ```
pub fn merge(existing: &Node, incoming: &Node) -> ConfigResult<Node> {
    let mut path = Vec::new();
    merge_nodes(&mut path, existing, incoming).into_shared()
}

fn merge_nodes(
    path: &mut Vec<String>,
    existing: &Node,
    incoming: &Node,
) -> Result<Node, ConfigError> {
    let policy = incoming
        .directives()
        .policy
        .unwrap_or_else(|| default_policy(existing, incoming));
    match policy {
        MergePolicy::Fail => Err(ConfigError::conflict(join_segments(path))),
        MergePolicy::Keep => Ok(keep_existing(existing, incoming)),
        MergePolicy::Replace | MergePolicy::Clear => Ok(take_incoming(existing, incoming)),
        MergePolicy::Splice => match (existing.kind(), incoming.kind()) {
            (NodeKind::Map, NodeKind::Map) => splice_maps(path, existing, incoming),
            _ => Ok(take_incoming(existing, incoming)),
        },
        MergePolicy::Append => match (existing.kind(), incoming.kind()) {
            (NodeKind::Array, NodeKind::Array) => Ok(concat_arrays(existing, incoming, false)),
            _ => Ok(take_incoming(existing, incoming)),
        },
        MergePolicy::Prepend => match (existing.kind(), incoming.kind()) {
            (NodeKind::Array, NodeKind::Array) => Ok(concat_arrays(existing, incoming, true)),
            _ => Ok(take_incoming(existing, incoming)),
        },
    }
}

fn default_policy(existing: &Node, incoming: &Node) -> MergePolicy {
    match (existing.kind(), incoming.kind()) {
        // An empty incoming tree contributes nothing.
        (_, NodeKind::Empty) => MergePolicy::Keep,
        (NodeKind::Map, NodeKind::Map) => MergePolicy::Splice,
        (NodeKind::Array, NodeKind::Array) => MergePolicy::Append,
        _ => MergePolicy::Replace,
    }
}

/// Union both provenance lists, existing first, deduplicated by exact
/// source+line+column.
fn union_provenance(existing: &Node, incoming: &Node) -> Vec<Origin> {
    let mut merged: Vec<Origin> = Vec::with_capacity(
        existing.provenance().len() + incoming.provenance().len(),
    );
    for origin in existing.provenance().iter().chain(incoming.provenance()) {
        if !merged.contains(origin) {
            merged.push(origin.clone());
        }
    }
    merged
}

fn keep_existing(existing: &Node, incoming: &Node) -> Node {
    let kept = existing.strip_directives();
    let secret = kept.is_secret() || incoming.is_secret();
    Node::assembled(kept.value().clone(), union_provenance(existing, incoming), secret)
}

fn take_incoming(existing: &Node, incoming: &Node) -> Node {
    let taken = incoming.strip_directives();
    Node::assembled(
        taken.value().clone(),
        union_provenance(existing, incoming),
        taken.is_secret(),
    )
}

fn splice_maps(
    path: &mut Vec<String>,
    existing: &Node,
    incoming: &Node,
) -> Result<Node, ConfigError> {
    let empty = indexmap::IndexMap::new();
    let left = existing.as_map().unwrap_or(&empty);
    let right = incoming.as_map().unwrap_or(&empty);
    let incoming_secret = incoming.is_secret();

    let mut children = indexmap::IndexMap::with_capacity(left.len() + right.len());
    for (key, child) in left {
        match right.get(key) {
            Some(overlay) => {
                path.push(key.clone());
                let merged = merge_nodes(path, child, overlay)?;
                path.pop();
                children.insert(key.clone(), merged);
            }
            None => {
                children.insert(key.clone(), child.strip_directives());
            }
        }
    }
    for (key, child) in right {
        if !left.contains_key(key) {
            let mut adopted = child.strip_directives();
            if incoming_secret {
                adopted.mark_secret();
            }
            children.insert(key.clone(), adopted);
        }
    }

    Ok(Node::assembled(
        NodeValue::Map(children),
        union_provenance(existing, incoming),
        existing.is_secret() || incoming_secret,
    ))
}

fn concat_arrays(existing: &Node, incoming: &Node, incoming_first: bool) -> Node {
    let left: Vec<Node> = existing
        .as_array()
        .unwrap_or_default()
        .iter()
        .map(Node::strip_directives)
        .collect();
    let right: Vec<Node> = incoming
        .as_array()
        .unwrap_or_default()
        .iter()
        .map(Node::strip_directives)
        .collect();
    let children = if incoming_first {
        right.into_iter().chain(left).collect()
    } else {
        left.into_iter().chain(right).collect()
    };
    Node::assembled(
        NodeValue::Array(children),
        union_provenance(existing, incoming),
        existing.is_secret() || incoming.is_secret(),
    )
}
