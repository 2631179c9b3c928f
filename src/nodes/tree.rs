//! Flat plan-node list to parent/child forest
//!
//! The forest is a disposable view: it is rebuilt from the flat list after
//! every fetch and never edited in place.

use serde::{Deserialize, Serialize};
use std::collections::{HashMap, HashSet};

use crate::error::TreeError;
use crate::model::{NodeId, PlanNode};

/// A plan node together with its ordered children
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct PlanNodeWithChildren {
    #[serde(flatten)]
    pub node: PlanNode,

    pub children: Vec<PlanNodeWithChildren>,
}

impl PlanNodeWithChildren {
    pub fn has_children(&self) -> bool {
        !self.children.is_empty()
    }

    /// Containers can always be opened; other nodes only when they have children
    pub fn is_expandable(&self) -> bool {
        self.node.node_type.is_container() || self.has_children()
    }

    /// Number of nodes in this subtree, including `self`
    pub fn subtree_len(&self) -> usize {
        1 + self
            .children
            .iter()
            .map(PlanNodeWithChildren::subtree_len)
            .sum::<usize>()
    }
}

/// Build the forest for `nodes`.
///
/// Nodes whose `parent_id` is missing or not in `nodes` become roots.
/// Siblings are stably ordered by `display_order`. Ids must be unique;
/// duplicates give unspecified parent assignment. Parent cycles are not
/// reported here: nodes on a cycle are unreachable from any root and are
/// left out. Use [`build_tree_checked`] to have them reported.
pub fn build_tree(nodes: &[PlanNode]) -> Vec<PlanNodeWithChildren> {
    let links = link(nodes);
    let mut forest: Vec<PlanNodeWithChildren> = links
        .roots
        .iter()
        .map(|&idx| materialize(nodes, &links.children, idx))
        .collect();
    sort_recursive(&mut forest);
    forest
}

/// Like [`build_tree`], but fails when any node is unreachable from a root
pub fn build_tree_checked(nodes: &[PlanNode]) -> Result<Vec<PlanNodeWithChildren>, TreeError> {
    let unreachable = unreachable_nodes(nodes);
    if !unreachable.is_empty() {
        return Err(TreeError::MalformedHierarchy {
            node_ids: unreachable,
        });
    }
    Ok(build_tree(nodes))
}

/// Ids of nodes caught in (or hanging below) a parent cycle, in input order
pub fn unreachable_nodes(nodes: &[PlanNode]) -> Vec<NodeId> {
    let links = link(nodes);
    let mut reached = vec![false; nodes.len()];
    let mut stack: Vec<usize> = links.roots.clone();
    while let Some(idx) = stack.pop() {
        if reached[idx] {
            continue;
        }
        reached[idx] = true;
        stack.extend(links.children[idx].iter().copied());
    }

    let mut seen = HashSet::new();
    nodes
        .iter()
        .zip(reached)
        .filter(|(_, reached)| !reached)
        .filter(|(node, _)| seen.insert(&node.id))
        .map(|(node, _)| node.id.clone())
        .collect()
}

/// Depth-first search for a node id
pub fn find_node<'a>(forest: &'a [PlanNodeWithChildren], id: &NodeId) -> Option<&'a PlanNodeWithChildren> {
    for node in forest {
        if &node.node.id == id {
            return Some(node);
        }
        if let Some(found) = find_node(&node.children, id) {
            return Some(found);
        }
    }
    None
}

struct Links {
    roots: Vec<usize>,
    children: Vec<Vec<usize>>,
}

fn link(nodes: &[PlanNode]) -> Links {
    let index: HashMap<&NodeId, usize> = nodes
        .iter()
        .enumerate()
        .map(|(idx, node)| (&node.id, idx))
        .collect();

    let mut roots = Vec::new();
    let mut children = vec![Vec::new(); nodes.len()];
    for (idx, node) in nodes.iter().enumerate() {
        match node.parent_id.as_ref().and_then(|parent| index.get(parent)) {
            Some(&parent) => children[parent].push(idx),
            None => roots.push(idx),
        }
    }

    Links { roots, children }
}

// Only ever entered from a root, so a cycle can never be walked into.
fn materialize(nodes: &[PlanNode], children: &[Vec<usize>], idx: usize) -> PlanNodeWithChildren {
    PlanNodeWithChildren {
        node: nodes[idx].clone(),
        children: children[idx]
            .iter()
            .map(|&child| materialize(nodes, children, child))
            .collect(),
    }
}

fn sort_recursive(siblings: &mut [PlanNodeWithChildren]) {
    siblings.sort_by_key(|n| n.node.display_order);
    for node in siblings.iter_mut() {
        if node.has_children() {
            sort_recursive(&mut node.children);
        }
    }
}
