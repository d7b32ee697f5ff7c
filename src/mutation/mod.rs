//! Mutation manager: the only sanctioned write path.
//!
//! Every operation takes a snapshot by reference and returns a new one. On
//! success the defaulting pipeline has already run over the result; on
//! rejection the caller still holds the untouched input.
//!
//! Updates are closures over a copy of the entity. Identity is restored
//! after the closure runs, so an update can never rename an entity.

mod error;

pub use error::{EntityKind, MutationError};

use crate::autocomplete::{autocomplete, endpoint_distance};
use nav_types::geometry::{polygon, EPSILON};
use nav_types::{
    Building, BuildingId, Edge, EdgeDirection, EdgeId, Floor, FloorId, Graph, Node, NodeId,
    NodeKind, Space, SpaceId,
};

pub type MutationResult = Result<Graph, MutationError>;

/// Log and return a rejection.
fn reject(err: MutationError) -> MutationError {
    tracing::warn!(code = err.code(), error = %err, "mutation rejected");
    err
}

/// Run the pipeline over an edited copy.
fn commit(next: Graph, operation: &'static str) -> Graph {
    let completed = autocomplete(&next);
    tracing::debug!(operation, "mutation committed");
    completed
}

// ============================================================================
// BUILDINGS
// ============================================================================

pub fn add_building(graph: &Graph, building: Building) -> MutationResult {
    if graph.buildings.contains_key(&building.id) {
        return Err(reject(MutationError::duplicate(EntityKind::Building, &building.id)));
    }
    let mut next = graph.clone();
    next.buildings.insert(building.id.clone(), building);
    Ok(commit(next, "add_building"))
}

pub fn update_building(
    graph: &Graph,
    id: &BuildingId,
    update: impl FnOnce(&mut Building),
) -> MutationResult {
    let mut building = graph
        .buildings
        .get(id)
        .cloned()
        .ok_or_else(|| reject(MutationError::not_found(EntityKind::Building, id)))?;
    update(&mut building);
    building.id = id.clone();

    let mut next = graph.clone();
    next.buildings.insert(id.clone(), building);
    Ok(commit(next, "update_building"))
}

/// Rejected while any floor still belongs to the building.
pub fn delete_building(graph: &Graph, id: &BuildingId) -> MutationResult {
    let building = graph
        .buildings
        .get(id)
        .ok_or_else(|| reject(MutationError::not_found(EntityKind::Building, id)))?;

    let listed = building.floor_ids.as_ref().map_or(0, Vec::len);
    let claiming = graph
        .floors
        .values()
        .filter(|f| f.building_id.as_ref() == Some(id))
        .filter(|f| !building.has_floor(&f.id))
        .count();
    if listed + claiming > 0 {
        return Err(reject(MutationError::ReferenceInUse {
            kind: EntityKind::Building,
            id: id.to_string(),
            referrer: EntityKind::Floor,
            count: listed + claiming,
        }));
    }

    let mut next = graph.clone();
    next.buildings.remove(id);
    Ok(commit(next, "delete_building"))
}

// ============================================================================
// FLOORS
// ============================================================================

/// Add a floor. When it names an existing building, the building's floor
/// list gains the floor.
pub fn add_floor(graph: &Graph, floor: Floor) -> MutationResult {
    if graph.floors.contains_key(&floor.id) {
        return Err(reject(MutationError::duplicate(EntityKind::Floor, &floor.id)));
    }

    let mut next = graph.clone();
    if let Some(building_id) = &floor.building_id {
        attach_floor(&mut next, building_id, &floor.id);
    }
    next.floors.insert(floor.id.clone(), floor);
    Ok(commit(next, "add_floor"))
}

fn attach_floor(graph: &mut Graph, building_id: &BuildingId, floor_id: &FloorId) {
    let Some(building) = graph.buildings.get(building_id) else {
        return;
    };
    if building.has_floor(floor_id) {
        return;
    }
    let mut building = building.clone();
    building
        .floor_ids
        .get_or_insert_with(Vec::new)
        .push(floor_id.clone());
    graph.buildings.insert(building_id.clone(), building);
}

fn detach_floor(graph: &mut Graph, floor_id: &FloorId) {
    graph.buildings = graph.buildings.map_changed(|_, building| {
        building.has_floor(floor_id).then(|| {
            let mut building = building.clone();
            if let Some(floors) = building.floor_ids.as_mut() {
                floors.retain(|f| f != floor_id);
            }
            building
        })
    });
}

/// Update a floor. Changing its building moves it between floor lists;
/// changing its level re-derives a level-derived name.
pub fn update_floor(graph: &Graph, id: &FloorId, update: impl FnOnce(&mut Floor)) -> MutationResult {
    let before = graph
        .floors
        .get(id)
        .ok_or_else(|| reject(MutationError::not_found(EntityKind::Floor, id)))?;
    let mut floor = before.clone();
    update(&mut floor);
    floor.id = id.clone();

    // A name derived from the old level follows the new one.
    let derived_name = before.level.map(Floor::level_label);
    if floor.level != before.level && floor.name == before.name && before.name == derived_name {
        floor.name = None;
    }

    let mut next = graph.clone();
    if floor.building_id != before.building_id {
        detach_floor(&mut next, id);
        if let Some(building_id) = &floor.building_id {
            attach_floor(&mut next, building_id, id);
        }
    }
    next.floors.insert(id.clone(), floor);
    Ok(commit(next, "update_floor"))
}

/// Rejected while nodes or spaces still sit on the floor. Removes the floor
/// from its building's floor list.
pub fn delete_floor(graph: &Graph, id: &FloorId) -> MutationResult {
    if !graph.floors.contains_key(id) {
        return Err(reject(MutationError::not_found(EntityKind::Floor, id)));
    }

    let on_floor = |floor: &Option<FloorId>| floor.as_ref() == Some(id);
    let nodes = graph.nodes.values().filter(|n| on_floor(&n.floor_id)).count();
    if nodes > 0 {
        return Err(reject(in_use(EntityKind::Floor, id, EntityKind::Node, nodes)));
    }
    let spaces = graph.spaces.values().filter(|s| on_floor(&s.floor_id)).count();
    if spaces > 0 {
        return Err(reject(in_use(EntityKind::Floor, id, EntityKind::Space, spaces)));
    }

    let mut next = graph.clone();
    next.floors.remove(id);
    detach_floor(&mut next, id);
    Ok(commit(next, "delete_floor"))
}

fn in_use(kind: EntityKind, id: &FloorId, referrer: EntityKind, count: usize) -> MutationError {
    MutationError::ReferenceInUse {
        kind,
        id: id.to_string(),
        referrer,
        count,
    }
}

// ============================================================================
// NODES
// ============================================================================

pub fn add_node(graph: &Graph, node: Node) -> MutationResult {
    if graph.nodes.contains_key(&node.id) {
        return Err(reject(MutationError::duplicate(EntityKind::Node, &node.id)));
    }
    let mut next = graph.clone();
    next.nodes.insert(node.id.clone(), node);
    Ok(commit(next, "add_node"))
}

/// Update a node. Moving it to another floor clears its building (unless
/// the update set one) and the vertical flag of its edges; moving its
/// position clears edge distances that were derived from the old position.
/// The pipeline then re-derives them. Explicit distances are kept.
pub fn update_node(graph: &Graph, id: &NodeId, update: impl FnOnce(&mut Node)) -> MutationResult {
    let before = graph
        .nodes
        .get(id)
        .ok_or_else(|| reject(MutationError::not_found(EntityKind::Node, id)))?;
    let mut node = before.clone();
    update(&mut node);
    node.id = id.clone();

    let refloored = node.floor_id != before.floor_id;
    let moved = node.position != before.position;
    if refloored && node.building_id == before.building_id {
        node.building_id = None;
    }

    let mut next = graph.clone();
    if refloored || moved {
        next.edges = graph.edges.map_changed(|_, edge| {
            edge.other_end(id)?;
            let stale_vertical = refloored && edge.is_vertical.is_some();
            let stale_distance = moved && is_derived_distance(graph, edge);
            (stale_vertical || stale_distance).then(|| {
                let mut edge = edge.clone();
                if stale_vertical {
                    edge.is_vertical = None;
                }
                if stale_distance {
                    edge.distance = None;
                }
                edge
            })
        });
    }
    next.nodes.insert(id.clone(), node);
    Ok(commit(next, "update_node"))
}

/// The edge's distance matches its endpoint geometry in `graph`.
fn is_derived_distance(graph: &Graph, edge: &Edge) -> bool {
    match (edge.distance, endpoint_distance(graph, edge)) {
        (Some(distance), Some(derived)) => (distance - derived).abs() <= EPSILON,
        _ => false,
    }
}

/// Delete a node together with every edge touching it. The node also
/// disappears from space membership lists and from other nodes' vertical
/// links.
pub fn delete_node(graph: &Graph, id: &NodeId) -> MutationResult {
    if !graph.nodes.contains_key(id) {
        return Err(reject(MutationError::not_found(EntityKind::Node, id)));
    }

    let mut next = graph.clone();
    next.nodes.remove(id);

    let incident: Vec<EdgeId> = graph.edges_of(id).map(|e| e.id.clone()).collect();
    for edge_id in &incident {
        next.edges.remove(edge_id);
    }

    next.spaces = next.spaces.map_changed(|_, space| {
        let members = space.node_ids.as_ref()?;
        members.contains(id).then(|| {
            let mut space = space.clone();
            if let Some(members) = space.node_ids.as_mut() {
                members.retain(|n| n != id);
            }
            space
        })
    });

    next.nodes = next.nodes.map_changed(|_, node| {
        let links = &node.vertical_links;
        (links.above.as_ref() == Some(id) || links.below.as_ref() == Some(id)).then(|| {
            let mut node = node.clone();
            let links = &mut node.vertical_links;
            if links.above.as_ref() == Some(id) {
                links.above = None;
            }
            if links.below.as_ref() == Some(id) {
                links.below = None;
            }
            node
        })
    });

    tracing::debug!(node = %id, edges = incident.len(), "node delete cascaded");
    Ok(commit(next, "delete_node"))
}

// ============================================================================
// EDGES
// ============================================================================

fn check_edge(graph: &Graph, edge: &Edge) -> Result<(), MutationError> {
    for endpoint in [&edge.source, &edge.target] {
        if !graph.nodes.contains_key(endpoint) {
            return Err(MutationError::MissingEndpoint {
                edge: edge.id.clone(),
                node: endpoint.clone(),
            });
        }
    }
    if edge.is_self_loop() {
        return Err(MutationError::SelfLoop {
            edge: edge.id.clone(),
            node: edge.source.clone(),
        });
    }
    Ok(())
}

pub fn add_edge(graph: &Graph, edge: Edge) -> MutationResult {
    if graph.edges.contains_key(&edge.id) {
        return Err(reject(MutationError::duplicate(EntityKind::Edge, &edge.id)));
    }
    check_edge(graph, &edge).map_err(reject)?;

    let mut next = graph.clone();
    next.edges.insert(edge.id.clone(), edge);
    Ok(commit(next, "add_edge"))
}

/// Update an edge. Changing an endpoint clears the derived distance and
/// vertical flag unless the update set them itself.
pub fn update_edge(graph: &Graph, id: &EdgeId, update: impl FnOnce(&mut Edge)) -> MutationResult {
    let before = graph
        .edges
        .get(id)
        .ok_or_else(|| reject(MutationError::not_found(EntityKind::Edge, id)))?;
    let mut edge = before.clone();
    update(&mut edge);
    edge.id = id.clone();

    if edge.source != before.source || edge.target != before.target {
        if edge.distance == before.distance {
            edge.distance = None;
        }
        if edge.is_vertical == before.is_vertical {
            edge.is_vertical = None;
        }
    }
    check_edge(graph, &edge).map_err(reject)?;

    let mut next = graph.clone();
    next.edges.insert(id.clone(), edge);
    Ok(commit(next, "update_edge"))
}

pub fn delete_edge(graph: &Graph, id: &EdgeId) -> MutationResult {
    if !graph.edges.contains_key(id) {
        return Err(reject(MutationError::not_found(EntityKind::Edge, id)));
    }
    let mut next = graph.clone();
    next.edges.remove(id);
    Ok(commit(next, "delete_edge"))
}

// ============================================================================
// SPACES
// ============================================================================

fn check_space(space: &Space) -> Result<(), MutationError> {
    match &space.polygon {
        Some(outline) if polygon::is_self_intersecting(outline) => {
            Err(MutationError::SelfIntersectingPolygon {
                space: space.id.clone(),
            })
        }
        _ => Ok(()),
    }
}

pub fn add_space(graph: &Graph, space: Space) -> MutationResult {
    if graph.spaces.contains_key(&space.id) {
        return Err(reject(MutationError::duplicate(EntityKind::Space, &space.id)));
    }
    check_space(&space).map_err(reject)?;

    let mut next = graph.clone();
    next.spaces.insert(space.id.clone(), space);
    Ok(commit(next, "add_space"))
}

/// Update a space. A new polygon or floor clears inferred membership unless
/// the update set it.
pub fn update_space(
    graph: &Graph,
    id: &SpaceId,
    update: impl FnOnce(&mut Space),
) -> MutationResult {
    let before = graph
        .spaces
        .get(id)
        .ok_or_else(|| reject(MutationError::not_found(EntityKind::Space, id)))?;
    let mut space = before.clone();
    update(&mut space);
    space.id = id.clone();
    check_space(&space).map_err(reject)?;

    let moved = space.polygon != before.polygon || space.floor_id != before.floor_id;
    if moved && space.node_ids == before.node_ids {
        space.node_ids = None;
    }
    if space.floor_id != before.floor_id && space.building_id == before.building_id {
        space.building_id = None;
    }

    let mut next = graph.clone();
    next.spaces.insert(id.clone(), space);
    Ok(commit(next, "update_space"))
}

pub fn delete_space(graph: &Graph, id: &SpaceId) -> MutationResult {
    if !graph.spaces.contains_key(id) {
        return Err(reject(MutationError::not_found(EntityKind::Space, id)));
    }
    let mut next = graph.clone();
    next.spaces.remove(id);
    Ok(commit(next, "delete_space"))
}

// ============================================================================
// VERTICAL LINKS
// ============================================================================

/// Options for [`link_vertical`].
#[derive(Debug, Clone, Default, PartialEq)]
pub struct VerticalLinkOptions {
    /// Identity for the connecting edge; a fresh one when absent.
    pub edge_id: Option<EdgeId>,
    /// Traversal distance of the connecting edge.
    pub distance: Option<f64>,
    /// Override for the step flag; staircases have steps by default.
    pub has_steps: Option<bool>,
}

/// Join `lower` to `upper` across floors: set `lower.above = upper`,
/// `upper.below = lower` and add a bidirectional vertical edge. Rejected
/// when either side is already linked in that direction.
pub fn link_vertical(
    graph: &Graph,
    lower: &NodeId,
    upper: &NodeId,
    options: VerticalLinkOptions,
) -> MutationResult {
    let invalid = |reason: &str| MutationError::InvalidVerticalLink {
        lower: lower.clone(),
        upper: upper.clone(),
        reason: reason.to_string(),
    };

    let lower_node = graph
        .nodes
        .get(lower)
        .ok_or_else(|| reject(MutationError::not_found(EntityKind::Node, lower)))?;
    let upper_node = graph
        .nodes
        .get(upper)
        .ok_or_else(|| reject(MutationError::not_found(EntityKind::Node, upper)))?;

    if lower == upper {
        return Err(reject(invalid("a node cannot be linked to itself")));
    }
    match (&lower_node.floor_id, &upper_node.floor_id) {
        (Some(a), Some(b)) if a == b => {
            return Err(reject(invalid("both nodes are on the same floor")));
        }
        (Some(a), Some(b)) => {
            let level = |f: &FloorId| graph.floor(f).and_then(|f| f.level);
            if let (Some(la), Some(lb)) = (level(a), level(b)) {
                if la >= lb {
                    return Err(reject(invalid("the lower node is not below the upper node")));
                }
            }
        }
        _ => return Err(reject(invalid("both nodes need a floor"))),
    }

    if lower_node.vertical_links.above.is_some() {
        return Err(reject(invalid("the lower node already has a link above")));
    }
    if upper_node.vertical_links.below.is_some() {
        return Err(reject(invalid("the upper node already has a link below")));
    }

    let edge_id = options.edge_id.unwrap_or_default();
    if graph.edges.contains_key(&edge_id) {
        return Err(reject(MutationError::duplicate(EntityKind::Edge, &edge_id)));
    }

    let is_stair = |n: &Node| n.kind == Some(NodeKind::Staircase);
    let has_steps = options
        .has_steps
        .unwrap_or_else(|| is_stair(lower_node) || is_stair(upper_node));

    let mut lower_node = lower_node.clone();
    lower_node.vertical_links.above = Some(upper.clone());
    let mut upper_node = upper_node.clone();
    upper_node.vertical_links.below = Some(lower.clone());

    let mut edge = Edge::new(edge_id.clone(), lower.clone(), upper.clone())
        .with_direction(EdgeDirection::Bidirectional)
        .with_steps(has_steps);
    edge.is_vertical = Some(true);
    edge.distance = options.distance;

    let mut next = graph.clone();
    next.nodes.insert(lower.clone(), lower_node);
    next.nodes.insert(upper.clone(), upper_node);
    next.edges.insert(edge_id, edge);
    Ok(commit(next, "link_vertical"))
}
