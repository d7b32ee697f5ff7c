//! Routing request and response shapes.

use super::error::RouteError;
use super::transitions::FloorTransition;
use crate::cost::{RouteContext, RoutingProfile};
use nav_types::{EdgeId, NodeId};
use serde::{Deserialize, Serialize};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

/// Cloneable cancellation flag. Any clone can cancel; every search holding
/// a clone stops at its next expansion.
#[derive(Debug, Clone, Default)]
pub struct CancelToken(Arc<AtomicBool>);

impl CancelToken {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.0.store(true, Ordering::Relaxed);
    }

    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::Relaxed)
    }
}

/// Search options.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RouteOptions {
    /// Number of alternative routes wanted besides the primary.
    #[serde(default)]
    pub alternatives: usize,
    /// Upper bound on node expansions, shared by every search of the
    /// request.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_expansions: Option<usize>,
    #[serde(skip)]
    pub cancel: Option<CancelToken>,
}

impl RouteOptions {
    #[must_use]
    pub fn with_alternatives(mut self, count: usize) -> Self {
        self.alternatives = count;
        self
    }

    #[must_use]
    pub fn with_max_expansions(mut self, budget: usize) -> Self {
        self.max_expansions = Some(budget);
        self
    }

    #[must_use]
    pub fn with_cancel(mut self, token: CancelToken) -> Self {
        self.cancel = Some(token);
        self
    }
}

/// One routing query.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RouteRequest {
    pub start: NodeId,
    pub goal: NodeId,
    #[serde(default)]
    pub profile: RoutingProfile,
    #[serde(default)]
    pub context: RouteContext,
    #[serde(default)]
    pub options: RouteOptions,
}

impl RouteRequest {
    /// Default profile, clear weather, no alternatives.
    pub fn new(start: impl Into<NodeId>, goal: impl Into<NodeId>) -> Self {
        Self {
            start: start.into(),
            goal: goal.into(),
            profile: RoutingProfile::default_profile(),
            context: RouteContext::default(),
            options: RouteOptions::default(),
        }
    }

    #[must_use]
    pub fn with_profile(mut self, profile: RoutingProfile) -> Self {
        self.profile = profile;
        self
    }

    #[must_use]
    pub fn with_context(mut self, context: RouteContext) -> Self {
        self.context = context;
        self
    }

    #[must_use]
    pub fn with_options(mut self, options: RouteOptions) -> Self {
        self.options = options;
        self
    }

    #[must_use]
    pub fn with_alternatives(mut self, count: usize) -> Self {
        self.options.alternatives = count;
        self
    }
}

/// A found route.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Route {
    pub node_ids: Vec<NodeId>,
    pub edge_ids: Vec<EdgeId>,
    pub total_cost: f64,
    #[serde(default)]
    pub transitions: Vec<FloorTransition>,
}

impl Route {
    pub fn uses_edge(&self, edge: &EdgeId) -> bool {
        self.edge_ids.contains(edge)
    }
}

/// Primary route plus alternatives, cheapest first.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RouteSet {
    pub primary: Route,
    #[serde(default)]
    pub alternatives: Vec<Route>,
}

/// Tagged response for callers that want data rather than `Result`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "lowercase")]
pub enum RouteResponse {
    Success {
        route: Route,
        alternatives: Vec<Route>,
    },
    Failure {
        reason: String,
        code: String,
    },
}

impl RouteResponse {
    pub fn is_success(&self) -> bool {
        matches!(self, RouteResponse::Success { .. })
    }
}

impl From<Result<RouteSet, RouteError>> for RouteResponse {
    fn from(result: Result<RouteSet, RouteError>) -> Self {
        match result {
            Ok(set) => RouteResponse::Success {
                route: set.primary,
                alternatives: set.alternatives,
            },
            Err(err) => RouteResponse::Failure {
                reason: err.to_string(),
                code: err.code().to_string(),
            },
        }
    }
}
