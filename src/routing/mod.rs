//! Pathfinding engine.
//!
//! ```text
//! RouteRequest ──► Network::build (costs resolved, impassable moves pruned)
//!                     │
//!                     ▼
//!                  A* start → goal ──► none: structural BFS decides
//!                     │                 IMPASSABLE vs NO_PATH
//!                     ▼
//!                  Yen (k alternatives, shared budget)
//!                     │
//!                     ▼
//!                  floor transitions per route ──► RouteSet
//! ```

mod astar;
mod error;
mod network;
mod request;
mod transitions;
mod yen;

pub use error::RouteError;
pub use request::{CancelToken, Route, RouteOptions, RouteRequest, RouteResponse, RouteSet};
pub use transitions::{floor_transitions, FloorTransition};

use crate::cost::{CostEvaluator, WeatherFactors};
use astar::{Exclusions, Path};
use nav_types::Graph;
use network::{Budget, Network};

/// Routes over one snapshot.
#[derive(Debug, Clone, Copy)]
pub struct Router<'g> {
    graph: &'g Graph,
    weather: WeatherFactors,
}

impl<'g> Router<'g> {
    pub fn new(graph: &'g Graph) -> Self {
        Self {
            graph,
            weather: WeatherFactors::default(),
        }
    }

    #[must_use]
    pub fn with_weather_factors(mut self, factors: WeatherFactors) -> Self {
        self.weather = factors;
        self
    }

    /// Primary route plus up to `options.alternatives` alternatives.
    ///
    /// Running out of budget while looking for alternatives keeps the
    /// primary and the alternatives found so far; cancellation always fails
    /// the whole request.
    pub fn route(&self, request: &RouteRequest) -> Result<RouteSet, RouteError> {
        for node in [&request.start, &request.goal] {
            if !self.graph.nodes.contains_key(node) {
                return Err(RouteError::NodeNotFound { node: node.clone() });
            }
        }

        let evaluator = CostEvaluator::new(&request.profile, &request.context)
            .with_weather_factors(self.weather);
        let network = Network::build(self.graph, &evaluator);
        let mut budget = Budget::new(
            request.options.max_expansions,
            request.options.cancel.clone(),
        );

        let primary = astar::search(
            &network,
            &request.start,
            &request.goal,
            &Exclusions::default(),
            &mut budget,
        )?;
        let Some(primary) = primary else {
            return Err(self.unreachable(&network, request));
        };

        let alternatives = if request.options.alternatives == 0 {
            Vec::new()
        } else {
            yen::alternatives(
                &network,
                &primary,
                &request.goal,
                request.options.alternatives,
                &mut budget,
            )?
        };

        tracing::debug!(
            start = %request.start,
            goal = %request.goal,
            profile = %request.profile.name,
            cost = primary.cost,
            alternatives = alternatives.len(),
            expansions = budget.used(),
            heuristic_scale = network.heuristic_scale(),
            "route found"
        );

        Ok(RouteSet {
            primary: self.finish(primary),
            alternatives: alternatives.into_iter().map(|p| self.finish(p)).collect(),
        })
    }

    fn unreachable(&self, network: &Network<'_>, request: &RouteRequest) -> RouteError {
        if network.structurally_reachable(&request.start, &request.goal) {
            RouteError::Impassable {
                start: request.start.clone(),
                goal: request.goal.clone(),
                profile: request.profile.name.clone(),
            }
        } else {
            RouteError::Disconnected {
                start: request.start.clone(),
                goal: request.goal.clone(),
            }
        }
    }

    fn finish(&self, path: Path) -> Route {
        let transitions = floor_transitions(self.graph, &path.nodes);
        Route {
            node_ids: path.nodes,
            edge_ids: path.edges,
            total_cost: path.cost,
            transitions,
        }
    }
}

/// Route with default weather factors.
pub fn find_route(graph: &Graph, request: &RouteRequest) -> Result<RouteSet, RouteError> {
    Router::new(graph).route(request)
}
