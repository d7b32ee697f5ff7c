//! Traversal network: the graph's adjacency with costs resolved once per
//! request.

use super::error::RouteError;
use super::request::CancelToken;
use crate::cost::CostEvaluator;
use nav_types::geometry::EPSILON;
use nav_types::{Edge, EdgeId, Graph, NodeId};
use std::collections::{BTreeMap, BTreeSet, VecDeque};

/// One directed move along an edge.
#[derive(Debug, Clone, Copy)]
pub(crate) struct Step<'g> {
    pub edge: &'g EdgeId,
    pub to: &'g NodeId,
    pub cost: f64,
}

/// Adjacency lists in edge-id order. Impassable moves are pruned from
/// `passable` but kept in `structural`, which tells a blocked goal apart
/// from an unconnected one.
pub(crate) struct Network<'g> {
    graph: &'g Graph,
    passable: BTreeMap<&'g NodeId, Vec<Step<'g>>>,
    structural: BTreeMap<&'g NodeId, Vec<&'g NodeId>>,
    costs: BTreeMap<&'g EdgeId, f64>,
    heuristic_scale: f64,
}

impl<'g> Network<'g> {
    pub fn build(graph: &'g Graph, evaluator: &CostEvaluator<'_>) -> Self {
        let mut passable: BTreeMap<&NodeId, Vec<Step>> = BTreeMap::new();
        let mut structural: BTreeMap<&NodeId, Vec<&NodeId>> = BTreeMap::new();
        let mut costs = BTreeMap::new();
        // Smallest cost per unit of straight-line length; keeps the
        // heuristic consistent even when explicit distances undercut the
        // geometry.
        let mut ratio = 1.0_f64;
        // A positionless endpoint has h = 0 next to a neighbour with a full
        // estimate, which can overestimate; such graphs search without one.
        let mut positioned = true;

        for edge in graph.edges.values() {
            if edge.is_self_loop()
                || !graph.nodes.contains_key(&edge.source)
                || !graph.nodes.contains_key(&edge.target)
            {
                continue;
            }

            let cost = evaluator.edge_cost(edge);
            let direction = edge.direction_or_default();
            let moves = [
                (direction.allows_forward(), &edge.source, &edge.target),
                (direction.allows_backward(), &edge.target, &edge.source),
            ];
            for (allowed, from, to) in moves {
                if !allowed {
                    continue;
                }
                structural.entry(from).or_default().push(to);
                if cost.is_finite() {
                    passable.entry(from).or_default().push(Step {
                        edge: &edge.id,
                        to,
                        cost,
                    });
                }
            }

            if cost.is_finite() {
                costs.insert(&edge.id, cost);
                match straight_line(graph, edge) {
                    Some(length) if length > EPSILON => ratio = ratio.min(cost / length),
                    Some(_) => {}
                    None => positioned = false,
                }
            }
        }

        let heuristic_scale = if positioned {
            evaluator.heuristic_scale().min(ratio).max(0.0)
        } else {
            0.0
        };
        Self {
            graph,
            passable,
            structural,
            costs,
            heuristic_scale,
        }
    }

    pub fn steps(&self, node: &NodeId) -> &[Step<'g>] {
        self.passable.get(node).map(Vec::as_slice).unwrap_or(&[])
    }

    /// Cost of a passable edge.
    pub fn edge_cost(&self, edge: &EdgeId) -> Option<f64> {
        self.costs.get(edge).copied()
    }

    /// Scaled straight-line distance; zero when a position is missing.
    pub fn heuristic(&self, from: &NodeId, goal: &NodeId) -> f64 {
        if self.heuristic_scale == 0.0 {
            return 0.0;
        }
        let position = |id: &NodeId| self.graph.node(id).and_then(|n| n.position);
        match (position(from), position(goal)) {
            (Some(a), Some(b)) => self.heuristic_scale * a.distance(b),
            _ => 0.0,
        }
    }

    pub fn heuristic_scale(&self) -> f64 {
        self.heuristic_scale
    }

    /// Breadth-first reachability over every directed move, ignoring cost.
    pub fn structurally_reachable(&self, start: &NodeId, goal: &NodeId) -> bool {
        let mut seen: BTreeSet<&NodeId> = BTreeSet::new();
        let mut queue = VecDeque::from([start]);
        seen.insert(start);

        while let Some(node) = queue.pop_front() {
            if node == goal {
                return true;
            }
            for &next in self.structural.get(node).into_iter().flatten() {
                if seen.insert(next) {
                    queue.push_back(next);
                }
            }
        }
        false
    }
}

fn straight_line(graph: &Graph, edge: &Edge) -> Option<f64> {
    let a = graph.node(&edge.source)?.position?;
    let b = graph.node(&edge.target)?.position?;
    Some(a.distance(b))
}

/// Expansion budget and cancellation shared by every search of a request.
#[derive(Debug)]
pub(crate) struct Budget {
    limit: Option<usize>,
    used: usize,
    cancel: Option<CancelToken>,
}

impl Budget {
    pub fn new(limit: Option<usize>, cancel: Option<CancelToken>) -> Self {
        Self {
            limit,
            used: 0,
            cancel,
        }
    }

    /// Account for one node expansion.
    pub fn spend(&mut self) -> Result<(), RouteError> {
        if self.cancel.as_ref().is_some_and(CancelToken::is_cancelled) {
            return Err(RouteError::Cancelled);
        }
        if self.limit.is_some_and(|limit| self.used >= limit) {
            return Err(RouteError::BudgetExhausted {
                expansions: self.used,
            });
        }
        self.used += 1;
        Ok(())
    }

    pub fn used(&self) -> usize {
        self.used
    }
}
