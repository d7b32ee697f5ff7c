//! A* over the traversal network.
//!
//! - f(n) = g(n) + h(n)
//! - g(n) = accumulated edge cost from the start
//! - h(n) = straight-line distance to the goal, scaled so it never
//!   overestimates (see [`Network::heuristic`])
//!
//! Ties on f pop the smaller node id first. Neighbors are relaxed in
//! edge-id order and a predecessor is only replaced by a strictly cheaper
//! route, so the same input always yields the same path.

use super::error::RouteError;
use super::network::{Budget, Network};
use nav_types::{EdgeId, NodeId};
use std::cmp::Ordering;
use std::collections::{BTreeMap, BTreeSet, BinaryHeap};

/// A path as found by the search.
#[derive(Debug, Clone, PartialEq)]
pub(crate) struct Path {
    pub nodes: Vec<NodeId>,
    pub edges: Vec<EdgeId>,
    pub cost: f64,
}

impl Path {
    pub fn single(node: NodeId) -> Self {
        Self {
            nodes: vec![node],
            edges: Vec::new(),
            cost: 0.0,
        }
    }
}

/// Nodes and moves a search must not use.
///
/// A move is excluded by its node pair, so every parallel edge between the
/// two nodes is excluded with it.
#[derive(Debug, Clone, Default)]
pub(crate) struct Exclusions {
    pub nodes: BTreeSet<NodeId>,
    moves: BTreeMap<NodeId, BTreeSet<NodeId>>,
}

impl Exclusions {
    /// Forbid every move from `from` to `to`.
    pub fn exclude_move(&mut self, from: &NodeId, to: &NodeId) {
        self.moves.entry(from.clone()).or_default().insert(to.clone());
    }

    fn blocks(&self, from: &NodeId, to: &NodeId) -> bool {
        self.nodes.contains(to) || self.moves.get(from).is_some_and(|next| next.contains(to))
    }
}

/// Entry in the open set.
#[derive(Debug, Clone)]
struct OpenNode<'a> {
    node: &'a NodeId,
    /// f(n) = g(n) + h(n).
    f_score: f64,
    /// g(n) = cost from start to this node.
    g_score: f64,
}

impl PartialEq for OpenNode<'_> {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other) == Ordering::Equal
    }
}

impl Eq for OpenNode<'_> {}

impl PartialOrd for OpenNode<'_> {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for OpenNode<'_> {
    // Reversed on both keys: BinaryHeap is a max-heap.
    fn cmp(&self, other: &Self) -> Ordering {
        other
            .f_score
            .total_cmp(&self.f_score)
            .then_with(|| other.node.cmp(self.node))
    }
}

/// Cheapest path from `start` to `goal`, or `None` when the goal cannot be
/// reached through passable, non-excluded moves.
pub(crate) fn search<'a>(
    network: &'a Network<'_>,
    start: &'a NodeId,
    goal: &'a NodeId,
    excluded: &Exclusions,
    budget: &mut Budget,
) -> Result<Option<Path>, RouteError> {
    if start == goal {
        return Ok(Some(Path::single(start.clone())));
    }

    let mut open: BinaryHeap<OpenNode<'a>> = BinaryHeap::new();
    let mut g_scores: BTreeMap<&'a NodeId, f64> = BTreeMap::new();
    let mut came_from: BTreeMap<&'a NodeId, (&'a NodeId, &'a EdgeId)> = BTreeMap::new();
    let mut closed: BTreeSet<&'a NodeId> = BTreeSet::new();

    g_scores.insert(start, 0.0);
    open.push(OpenNode {
        node: start,
        f_score: network.heuristic(start, goal),
        g_score: 0.0,
    });

    while let Some(current) = open.pop() {
        if current.node == goal {
            let path = reconstruct(&came_from, goal, current.g_score);
            tracing::trace!(expansions = budget.used(), open = open.len(), "goal reached");
            return Ok(Some(path));
        }
        if !closed.insert(current.node) {
            continue;
        }
        budget.spend()?;

        for step in network.steps(current.node) {
            if closed.contains(step.to) || excluded.blocks(current.node, step.to) {
                continue;
            }

            let tentative = current.g_score + step.cost;
            let known = g_scores.get(step.to).copied().unwrap_or(f64::INFINITY);
            if tentative >= known {
                continue;
            }

            came_from.insert(step.to, (current.node, step.edge));
            g_scores.insert(step.to, tentative);
            open.push(OpenNode {
                node: step.to,
                f_score: tentative + network.heuristic(step.to, goal),
                g_score: tentative,
            });
        }
    }

    Ok(None)
}

fn reconstruct(
    came_from: &BTreeMap<&NodeId, (&NodeId, &EdgeId)>,
    goal: &NodeId,
    cost: f64,
) -> Path {
    let mut nodes = vec![goal.clone()];
    let mut edges = Vec::new();
    let mut node = goal;
    while let Some(&(parent, edge)) = came_from.get(node) {
        nodes.push(parent.clone());
        edges.push(edge.clone());
        node = parent;
    }
    nodes.reverse();
    edges.reverse();
    Path { nodes, edges, cost }
}
