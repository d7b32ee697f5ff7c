//! Yen's K-shortest loopless paths.
//!
//! Starting from the primary path, every node of the most recently accepted
//! path acts as a spur. The root prefix up to the spur is kept, the moves
//! leaving the spur along already-accepted paths with the same root are
//! excluded (parallel edges included, as are the root's other nodes), and
//! A* finds the cheapest spur path to the goal. Root + spur becomes a
//! candidate; the cheapest candidate is accepted next.

use super::astar::{search, Exclusions, Path};
use super::error::RouteError;
use super::network::{Budget, Network};
use nav_types::NodeId;
use std::cmp::Ordering;
use std::collections::BTreeSet;

/// Candidate ordered by cost, then by node sequence.
#[derive(Debug, Clone)]
struct Candidate(Path);

impl PartialEq for Candidate {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other) == Ordering::Equal
    }
}

impl Eq for Candidate {}

impl PartialOrd for Candidate {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for Candidate {
    fn cmp(&self, other: &Self) -> Ordering {
        self.0
            .cost
            .total_cmp(&other.0.cost)
            .then_with(|| self.0.nodes.cmp(&other.0.nodes))
            .then_with(|| self.0.edges.cmp(&other.0.edges))
    }
}

/// Up to `k` alternatives to `primary`, cheapest first. Every alternative
/// has a node sequence distinct from the primary and from each other.
///
/// Running out of budget ends the search early with the alternatives
/// accepted so far; cancellation is an error.
pub(crate) fn alternatives(
    network: &Network<'_>,
    primary: &Path,
    goal: &NodeId,
    k: usize,
    budget: &mut Budget,
) -> Result<Vec<Path>, RouteError> {
    let mut accepted: Vec<Path> = vec![primary.clone()];
    let mut candidates: BTreeSet<Candidate> = BTreeSet::new();
    let mut seen: BTreeSet<Vec<NodeId>> = BTreeSet::from([primary.nodes.clone()]);

    'accept: while accepted.len() <= k {
        let Some(last) = accepted.last() else {
            break;
        };
        let last = last.clone();

        for i in 0..last.nodes.len().saturating_sub(1) {
            let spur = &last.nodes[i];
            let root_nodes = &last.nodes[..=i];
            let root_edges = &last.edges[..i];

            let mut excluded = Exclusions::default();
            for path in &accepted {
                if path.nodes.len() > i + 1 && path.nodes[..=i] == *root_nodes {
                    excluded.exclude_move(spur, &path.nodes[i + 1]);
                }
            }
            excluded.nodes.extend(root_nodes[..i].iter().cloned());

            let spur_path = match search(network, spur, goal, &excluded, budget) {
                Ok(Some(path)) => path,
                Ok(None) => continue,
                Err(RouteError::BudgetExhausted { expansions }) => {
                    tracing::debug!(expansions, "budget exhausted during alternatives");
                    break 'accept;
                }
                Err(err) => return Err(err),
            };

            let root_cost: f64 = root_edges
                .iter()
                .map(|e| network.edge_cost(e).unwrap_or(f64::INFINITY))
                .sum();
            let mut nodes = root_nodes[..i].to_vec();
            nodes.extend(spur_path.nodes);
            let mut edges = root_edges.to_vec();
            edges.extend(spur_path.edges);

            if seen.insert(nodes.clone()) {
                candidates.insert(Candidate(Path {
                    nodes,
                    edges,
                    cost: root_cost + spur_path.cost,
                }));
            }
        }

        match candidates.pop_first() {
            Some(Candidate(best)) => accepted.push(best),
            None => break,
        }
    }

    tracing::debug!(
        requested = k,
        found = accepted.len() - 1,
        pending = candidates.len(),
        "alternatives search finished"
    );
    accepted.remove(0);
    Ok(accepted)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cost::{CostEvaluator, RouteContext, RoutingProfile};
    use nav_types::{Edge, Graph, Node};
    use pretty_assertions::assert_eq;

    fn diamond() -> Graph {
        let mut g = Graph::new();
        for n in ["a", "b", "c", "d"] {
            g.nodes.insert(n.into(), Node::new(n));
        }
        for (id, s, t, d) in [
            ("ab", "a", "b", 15.0),
            ("bd", "b", "d", 15.0),
            ("ac", "a", "c", 5.0),
            ("cd", "c", "d", 5.0),
            ("bc", "b", "c", 1.0),
        ] {
            g.edges.insert(id.into(), Edge::new(id, s, t).with_distance(d));
        }
        g
    }

    fn k_paths(g: &Graph, k: usize) -> Vec<(Vec<String>, f64)> {
        let profile = RoutingProfile::default_profile();
        let context = RouteContext::default();
        let evaluator = CostEvaluator::new(&profile, &context);
        let network = Network::build(g, &evaluator);
        let (a, d) = (NodeId::from("a"), NodeId::from("d"));
        let mut budget = Budget::new(None, None);
        let primary = search(&network, &a, &d, &Exclusions::default(), &mut budget)
            .unwrap()
            .unwrap();
        alternatives(&network, &primary, &d, k, &mut budget)
            .unwrap()
            .into_iter()
            .map(|p| (p.nodes.iter().map(|n| n.to_string()).collect(), p.cost))
            .collect()
    }

    #[test]
    fn alternatives_are_loopless_and_ordered() {
        let found = k_paths(&diamond(), 10);
        let s = |v: &[&str]| v.iter().map(|x| x.to_string()).collect::<Vec<_>>();
        assert_eq!(
            found,
            vec![
                (s(&["a", "b", "c", "d"]), 21.0),
                (s(&["a", "c", "b", "d"]), 21.0),
                (s(&["a", "b", "d"]), 30.0),
            ]
        );
    }

    #[test]
    fn budget_exhaustion_keeps_what_was_found() {
        let g = diamond();
        let profile = RoutingProfile::default_profile();
        let context = RouteContext::default();
        let evaluator = CostEvaluator::new(&profile, &context);
        let network = Network::build(&g, &evaluator);
        let (a, d) = (NodeId::from("a"), NodeId::from("d"));
        // The primary search takes three expansions.
        let mut budget = Budget::new(Some(4), None);
        let primary = search(&network, &a, &d, &Exclusions::default(), &mut budget)
            .unwrap()
            .unwrap();
        assert_eq!(budget.used(), 3);
        let found = alternatives(&network, &primary, &d, 3, &mut budget).unwrap();
        assert!(found.is_empty());
    }

    #[test]
    fn zero_alternatives_requested() {
        assert!(k_paths(&diamond(), 0).is_empty());
    }
}
