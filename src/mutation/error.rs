//! Mutation rejection errors.

use nav_types::{EdgeId, NodeId, SpaceId};
use std::fmt;
use thiserror::Error;

/// Which store an entity lives in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EntityKind {
    Building,
    Floor,
    Node,
    Edge,
    Space,
}

impl EntityKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            EntityKind::Building => "building",
            EntityKind::Floor => "floor",
            EntityKind::Node => "node",
            EntityKind::Edge => "edge",
            EntityKind::Space => "space",
        }
    }
}

impl fmt::Display for EntityKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Why a mutation was rejected. The input snapshot is never modified.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum MutationError {
    /// Add with an identity that is already taken.
    #[error("{kind} '{id}' already exists")]
    DuplicateId { kind: EntityKind, id: String },

    /// Update or delete of an entity that does not exist.
    #[error("{kind} '{id}' not found")]
    NotFound { kind: EntityKind, id: String },

    /// Edge endpoint not present in the node store.
    #[error("edge '{edge}' references missing node '{node}'")]
    MissingEndpoint { edge: EdgeId, node: NodeId },

    #[error("edge '{edge}' connects node '{node}' to itself")]
    SelfLoop { edge: EdgeId, node: NodeId },

    #[error("space '{space}' has a self-intersecting polygon")]
    SelfIntersectingPolygon { space: SpaceId },

    /// Delete of an entity that others still point at.
    #[error("{kind} '{id}' is still referenced by {count} {referrer}(s)")]
    ReferenceInUse {
        kind: EntityKind,
        id: String,
        referrer: EntityKind,
        count: usize,
    },

    /// Two nodes cannot be joined vertically.
    #[error("cannot link '{lower}' below '{upper}': {reason}")]
    InvalidVerticalLink {
        lower: NodeId,
        upper: NodeId,
        reason: String,
    },
}

impl MutationError {
    /// Stable code tag for this rejection.
    pub fn code(&self) -> &'static str {
        match self {
            Self::DuplicateId { .. } => "DUPLICATE_ID",
            Self::NotFound { .. } => "NOT_FOUND",
            Self::MissingEndpoint { .. } => "MISSING_ENDPOINT",
            Self::SelfLoop { .. } => "SELF_LOOP",
            Self::SelfIntersectingPolygon { .. } => "SELF_INTERSECTING_POLYGON",
            Self::ReferenceInUse { .. } => "REFERENCE_IN_USE",
            Self::InvalidVerticalLink { .. } => "INVALID_VERTICAL_LINK",
        }
    }

    pub(crate) fn duplicate(kind: EntityKind, id: impl fmt::Display) -> Self {
        Self::DuplicateId {
            kind,
            id: id.to_string(),
        }
    }

    pub(crate) fn not_found(kind: EntityKind, id: impl fmt::Display) -> Self {
        Self::NotFound {
            kind,
            id: id.to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn codes_and_messages() {
        let err = MutationError::not_found(EntityKind::Node, "n1");
        assert_eq!(err.code(), "NOT_FOUND");
        assert_eq!(err.to_string(), "node 'n1' not found");

        let err = MutationError::ReferenceInUse {
            kind: EntityKind::Floor,
            id: "f1".into(),
            referrer: EntityKind::Node,
            count: 3,
        };
        assert_eq!(err.code(), "REFERENCE_IN_USE");
        assert_eq!(err.to_string(), "floor 'f1' is still referenced by 3 node(s)");
    }
}
