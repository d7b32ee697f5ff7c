//! Entity records and the graph snapshot.
//!
//! Every field except identity is optional: imported or hand-drawn data is
//! accepted as-is and completed later by the defaulting pipeline. Relations
//! are identities resolved through the graph's stores, never embedded
//! references.

use crate::geometry::Vec2;
use crate::ids::{BuildingId, EdgeId, FloorId, NodeId, SpaceId};
use crate::store::Store;
use crate::SCHEMA_VERSION;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Free-form key/value data carried by nodes and edges.
pub type PropertyBag = BTreeMap<String, serde_json::Value>;

// ============================================================================
// NODE
// ============================================================================

/// What a node represents physically.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NodeKind {
    Room,
    CorridorJunction,
    Staircase,
    Elevator,
    Entrance,
    OutdoorPoint,
    #[default]
    Other,
}

impl NodeKind {
    /// Staircases and elevators connect floors.
    pub fn is_vertical_connector(&self) -> bool {
        matches!(self, NodeKind::Staircase | NodeKind::Elevator)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            NodeKind::Room => "room",
            NodeKind::CorridorJunction => "corridor_junction",
            NodeKind::Staircase => "staircase",
            NodeKind::Elevator => "elevator",
            NodeKind::Entrance => "entrance",
            NodeKind::OutdoorPoint => "outdoor_point",
            NodeKind::Other => "other",
        }
    }
}

/// Weak references to the nodes directly above and below on other floors.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VerticalLinks {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub above: Option<NodeId>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub below: Option<NodeId>,
}

impl VerticalLinks {
    pub fn is_empty(&self) -> bool {
        self.above.is_none() && self.below.is_none()
    }

    /// Iterate the linked node ids.
    pub fn targets(&self) -> impl Iterator<Item = &NodeId> {
        self.above.iter().chain(self.below.iter())
    }
}

/// A traversable point in the spatial graph.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Node {
    pub id: NodeId,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub kind: Option<NodeKind>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub position: Option<Vec2>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub floor_id: Option<FloorId>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub building_id: Option<BuildingId>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub label: Option<String>,
    #[serde(default, skip_serializing_if = "VerticalLinks::is_empty")]
    pub vertical_links: VerticalLinks,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub properties: Option<PropertyBag>,
}

impl Node {
    /// Create a node with only its identity set.
    pub fn new(id: impl Into<NodeId>) -> Self {
        Self {
            id: id.into(),
            kind: None,
            position: None,
            floor_id: None,
            building_id: None,
            label: None,
            vertical_links: VerticalLinks::default(),
            properties: None,
        }
    }

    /// Builder: set kind.
    #[must_use]
    pub fn with_kind(mut self, kind: NodeKind) -> Self {
        self.kind = Some(kind);
        self
    }

    /// Builder: set position.
    #[must_use]
    pub fn at(mut self, x: f64, y: f64) -> Self {
        self.position = Some(Vec2::new(x, y));
        self
    }

    /// Builder: set owning floor.
    #[must_use]
    pub fn on_floor(mut self, floor_id: impl Into<FloorId>) -> Self {
        self.floor_id = Some(floor_id.into());
        self
    }

    /// Builder: set label.
    #[must_use]
    pub fn with_label(mut self, label: impl Into<String>) -> Self {
        self.label = Some(label.into());
        self
    }

    /// Kind, treating an absent kind as `Other`.
    pub fn kind_or_default(&self) -> NodeKind {
        self.kind.unwrap_or_default()
    }
}

// ============================================================================
// EDGE
// ============================================================================

/// Which way an edge may be traversed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EdgeDirection {
    #[default]
    Bidirectional,
    /// Source to target only.
    Forward,
    /// Target to source only.
    Backward,
}

impl EdgeDirection {
    pub fn as_str(&self) -> &'static str {
        match self {
            EdgeDirection::Bidirectional => "bidirectional",
            EdgeDirection::Forward => "forward",
            EdgeDirection::Backward => "backward",
        }
    }

    pub fn allows_forward(&self) -> bool {
        !matches!(self, EdgeDirection::Backward)
    }

    pub fn allows_backward(&self) -> bool {
        !matches!(self, EdgeDirection::Forward)
    }
}

/// A traversable connection between two nodes.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Edge {
    pub id: EdgeId,
    pub source: NodeId,
    pub target: NodeId,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub direction: Option<EdgeDirection>,
    /// Traversal distance in map units.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub distance: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub has_steps: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub is_outdoor: Option<bool>,
    /// Physical width in map units.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub width: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub is_vertical: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tags: Option<Vec<String>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub properties: Option<PropertyBag>,
}

impl Edge {
    /// Create an edge between two nodes with every optional field absent.
    pub fn new(id: impl Into<EdgeId>, source: impl Into<NodeId>, target: impl Into<NodeId>) -> Self {
        Self {
            id: id.into(),
            source: source.into(),
            target: target.into(),
            direction: None,
            distance: None,
            has_steps: None,
            is_outdoor: None,
            width: None,
            is_vertical: None,
            tags: None,
            properties: None,
        }
    }

    /// Builder: set distance.
    #[must_use]
    pub fn with_distance(mut self, distance: f64) -> Self {
        self.distance = Some(distance);
        self
    }

    /// Builder: set direction.
    #[must_use]
    pub fn with_direction(mut self, direction: EdgeDirection) -> Self {
        self.direction = Some(direction);
        self
    }

    /// Builder: mark as having steps.
    #[must_use]
    pub fn with_steps(mut self, has_steps: bool) -> Self {
        self.has_steps = Some(has_steps);
        self
    }

    /// Builder: mark as outdoor.
    #[must_use]
    pub fn outdoor(mut self, is_outdoor: bool) -> Self {
        self.is_outdoor = Some(is_outdoor);
        self
    }

    /// Builder: set width.
    #[must_use]
    pub fn with_width(mut self, width: f64) -> Self {
        self.width = Some(width);
        self
    }

    /// Builder: add a tag.
    #[must_use]
    pub fn with_tag(mut self, tag: impl Into<String>) -> Self {
        self.tags.get_or_insert_with(Vec::new).push(tag.into());
        self
    }

    pub fn direction_or_default(&self) -> EdgeDirection {
        self.direction.unwrap_or_default()
    }

    /// The endpoint opposite `node`, if `node` is an endpoint.
    pub fn other_end(&self, node: &NodeId) -> Option<&NodeId> {
        if &self.source == node {
            Some(&self.target)
        } else if &self.target == node {
            Some(&self.source)
        } else {
            None
        }
    }

    /// Endpoints as an unordered pair (smaller id first).
    pub fn unordered_pair(&self) -> (&NodeId, &NodeId) {
        if self.source <= self.target {
            (&self.source, &self.target)
        } else {
            (&self.target, &self.source)
        }
    }

    pub fn is_self_loop(&self) -> bool {
        self.source == self.target
    }

    pub fn has_tag(&self, tag: &str) -> bool {
        self.tags
            .as_ref()
            .is_some_and(|tags| tags.iter().any(|t| t == tag))
    }
}

// ============================================================================
// SPACE
// ============================================================================

/// What a space represents physically.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SpaceKind {
    Room,
    Corridor,
    Hall,
    Restroom,
    Stairwell,
    ElevatorShaft,
    Outdoor,
    #[default]
    Other,
}

/// A polygonal physical area that may contain nodes.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Space {
    pub id: SpaceId,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub kind: Option<SpaceKind>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub floor_id: Option<FloorId>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub building_id: Option<BuildingId>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub polygon: Option<Vec<Vec2>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub node_ids: Option<Vec<NodeId>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub metadata: Option<PropertyBag>,
}

impl Space {
    pub fn new(id: impl Into<SpaceId>) -> Self {
        Self {
            id: id.into(),
            kind: None,
            name: None,
            floor_id: None,
            building_id: None,
            polygon: None,
            node_ids: None,
            metadata: None,
        }
    }

    /// Builder: set boundary polygon from `(x, y)` pairs.
    #[must_use]
    pub fn with_polygon(mut self, points: &[(f64, f64)]) -> Self {
        self.polygon = Some(points.iter().map(|&(x, y)| Vec2::new(x, y)).collect());
        self
    }

    /// Builder: set owning floor.
    #[must_use]
    pub fn on_floor(mut self, floor_id: impl Into<FloorId>) -> Self {
        self.floor_id = Some(floor_id.into());
        self
    }

    /// Builder: set name.
    #[must_use]
    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }
}

// ============================================================================
// FLOOR AND BUILDING
// ============================================================================

/// Placement of a background plan image under a floor.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BackgroundImage {
    /// Image reference (path or URL); resolved by the rendering layer.
    pub source: String,
    #[serde(default)]
    pub offset: Vec2,
    #[serde(default = "default_image_scale")]
    pub scale: f64,
    /// Rotation in radians.
    #[serde(default)]
    pub rotation: f64,
    #[serde(default = "default_image_opacity")]
    pub opacity: f64,
}

fn default_image_scale() -> f64 {
    1.0
}

fn default_image_opacity() -> f64 {
    1.0
}

/// One floor of a building.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Floor {
    pub id: FloorId,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub building_id: Option<BuildingId>,
    /// 0 is the ground floor; negative levels are basements.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub level: Option<i32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub background: Option<BackgroundImage>,
}

impl Floor {
    pub fn new(id: impl Into<FloorId>) -> Self {
        Self {
            id: id.into(),
            building_id: None,
            level: None,
            name: None,
            background: None,
        }
    }

    /// Builder: set level.
    #[must_use]
    pub fn at_level(mut self, level: i32) -> Self {
        self.level = Some(level);
        self
    }

    /// Builder: set owning building.
    #[must_use]
    pub fn in_building(mut self, building_id: impl Into<BuildingId>) -> Self {
        self.building_id = Some(building_id.into());
        self
    }

    /// Display label derived from a level: `0 -> "1F"`, `-1 -> "B1"`.
    pub fn level_label(level: i32) -> String {
        if level >= 0 {
            format!("{}F", i64::from(level) + 1)
        } else {
            format!("B{}", level.unsigned_abs())
        }
    }

    /// Name if set, otherwise the level label, otherwise the id.
    pub fn display_name(&self) -> String {
        match (&self.name, self.level) {
            (Some(name), _) => name.clone(),
            (None, Some(level)) => Self::level_label(level),
            (None, None) => self.id.to_string(),
        }
    }
}

/// A building and its floors.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Building {
    pub id: BuildingId,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    /// Floors in display order.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub floor_ids: Option<Vec<FloorId>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub outline: Option<Vec<Vec2>>,
}

impl Building {
    pub fn new(id: impl Into<BuildingId>) -> Self {
        Self {
            id: id.into(),
            name: None,
            floor_ids: None,
            outline: None,
        }
    }

    /// Builder: set name.
    #[must_use]
    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    /// Builder: set floor list.
    #[must_use]
    pub fn with_floors<I, F>(mut self, floors: I) -> Self
    where
        I: IntoIterator<Item = F>,
        F: Into<FloorId>,
    {
        self.floor_ids = Some(floors.into_iter().map(Into::into).collect());
        self
    }

    pub fn has_floor(&self, floor_id: &FloorId) -> bool {
        self.floor_ids
            .as_ref()
            .is_some_and(|floors| floors.contains(floor_id))
    }
}

// ============================================================================
// GRAPH SNAPSHOT
// ============================================================================

/// Root aggregate: one immutable snapshot of the whole map.
///
/// Cloning is O(1). Each store is shared until written; see [`Store`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Graph {
    #[serde(default = "default_version")]
    pub version: String,
    #[serde(default = "Utc::now")]
    pub last_modified: DateTime<Utc>,
    #[serde(default)]
    pub buildings: Store<BuildingId, Building>,
    #[serde(default)]
    pub floors: Store<FloorId, Floor>,
    #[serde(default)]
    pub nodes: Store<NodeId, Node>,
    #[serde(default)]
    pub edges: Store<EdgeId, Edge>,
    #[serde(default)]
    pub spaces: Store<SpaceId, Space>,
}

fn default_version() -> String {
    SCHEMA_VERSION.to_string()
}

impl Default for Graph {
    fn default() -> Self {
        Self::new()
    }
}

impl Graph {
    /// Create an empty graph at the current schema version.
    pub fn new() -> Self {
        Self {
            version: default_version(),
            last_modified: Utc::now(),
            buildings: Store::new(),
            floors: Store::new(),
            nodes: Store::new(),
            edges: Store::new(),
            spaces: Store::new(),
        }
    }

    pub fn node(&self, id: &NodeId) -> Option<&Node> {
        self.nodes.get(id)
    }

    pub fn edge(&self, id: &EdgeId) -> Option<&Edge> {
        self.edges.get(id)
    }

    pub fn floor(&self, id: &FloorId) -> Option<&Floor> {
        self.floors.get(id)
    }

    /// Edges with `node` as source or target, in edge-id order.
    pub fn edges_of<'a>(&'a self, node: &'a NodeId) -> impl Iterator<Item = &'a Edge> + 'a {
        self.edges
            .values()
            .filter(move |e| &e.source == node || &e.target == node)
    }

    /// True when both graphs hold identical entity data, ignoring the
    /// timestamp.
    pub fn same_entities(&self, other: &Graph) -> bool {
        self.version == other.version
            && self.buildings == other.buildings
            && self.floors == other.floors
            && self.nodes == other.nodes
            && self.edges == other.edges
            && self.spaces == other.spaces
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn level_labels() {
        assert_eq!(Floor::level_label(0), "1F");
        assert_eq!(Floor::level_label(2), "3F");
        assert_eq!(Floor::level_label(-1), "B1");
        assert_eq!(Floor::level_label(-3), "B3");
        assert_eq!(Floor::level_label(i32::MAX), "2147483648F");
        assert_eq!(Floor::level_label(i32::MIN), "B2147483648");
    }

    #[test]
    fn partial_node_parses() {
        let node: Node = serde_json::from_str(r#"{"id":"n1"}"#).unwrap();
        assert_eq!(node, Node::new("n1"));
    }

    #[test]
    fn node_serializes_camel_case_and_skips_absent() {
        let mut node = Node::new("n1").on_floor("f1").with_kind(NodeKind::Staircase);
        node.vertical_links.above = Some(NodeId::from("n2"));
        let json = serde_json::to_value(&node).unwrap();
        assert_eq!(
            json,
            serde_json::json!({
                "id": "n1",
                "kind": "staircase",
                "floorId": "f1",
                "verticalLinks": { "above": "n2" }
            })
        );
    }

    #[test]
    fn edge_helpers() {
        let e = Edge::new("e1", "b", "a").with_tag("ramp");
        assert_eq!(e.unordered_pair(), (&NodeId::from("a"), &NodeId::from("b")));
        assert_eq!(e.other_end(&NodeId::from("a")), Some(&NodeId::from("b")));
        assert_eq!(e.other_end(&NodeId::from("z")), None);
        assert!(e.has_tag("ramp"));
        assert!(!e.is_self_loop());
    }

    #[test]
    fn direction_permissions() {
        assert!(EdgeDirection::Forward.allows_forward());
        assert!(!EdgeDirection::Forward.allows_backward());
        assert!(EdgeDirection::Backward.allows_backward());
        assert!(!EdgeDirection::Backward.allows_forward());
        assert!(EdgeDirection::Bidirectional.allows_forward());
        assert!(EdgeDirection::Bidirectional.allows_backward());
    }

    #[test]
    fn empty_graph_parses_with_defaults() {
        let graph: Graph = serde_json::from_str("{}").unwrap();
        assert_eq!(graph.version, SCHEMA_VERSION);
        assert!(graph.nodes.is_empty());
    }

    #[test]
    fn clone_shares_stores() {
        let mut graph = Graph::new();
        graph.nodes.insert(NodeId::from("a"), Node::new("a"));
        let copy = graph.clone();
        assert!(graph.nodes.ptr_eq(&copy.nodes));
        assert!(graph.same_entities(&copy));
    }
}
