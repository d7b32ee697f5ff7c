//! Routing failures.

use nav_types::NodeId;
use thiserror::Error;

/// Why no route was produced.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum RouteError {
    #[error("node '{node}' not found")]
    NodeNotFound { node: NodeId },

    /// A structural path exists but the profile blocks every one of them.
    #[error("'{goal}' is not reachable from '{start}' under profile '{profile}': every connecting path is impassable")]
    Impassable {
        start: NodeId,
        goal: NodeId,
        profile: String,
    },

    /// No structural path exists at all.
    #[error("'{goal}' is not reachable from '{start}': no connecting path")]
    Disconnected { start: NodeId, goal: NodeId },

    #[error("search gave up after {expansions} node expansions")]
    BudgetExhausted { expansions: usize },

    #[error("search was cancelled")]
    Cancelled,
}

impl RouteError {
    pub fn code(&self) -> &'static str {
        match self {
            Self::NodeNotFound { .. } => "NODE_NOT_FOUND",
            Self::Impassable { .. } => "IMPASSABLE",
            Self::Disconnected { .. } => "NO_PATH",
            Self::BudgetExhausted { .. } => "BUDGET_EXHAUSTED",
            Self::Cancelled => "CANCELLED",
        }
    }

    /// Failure caused by the graph or profile rather than by search limits.
    pub fn is_unreachable(&self) -> bool {
        matches!(self, Self::Impassable { .. } | Self::Disconnected { .. })
    }
}
