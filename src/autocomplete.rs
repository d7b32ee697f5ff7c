//! Defaulting / inference pipeline ("autocomplete").
//!
//! Makes partially-specified graphs usable. Three ordered stages, each a
//! pure `&Graph -> Graph` step:
//!
//! ```text
//! raw graph
//!    │
//!    ▼
//! fill_defaults      kind/position/direction/width/... where absent
//!    │
//!    ▼
//! infer_relations    floor→building, node/space building, edge isVertical
//!    │
//!    ▼
//! compute_geometry   edge distance, space membership
//!    │
//!    ▼
//! completed graph (timestamp refreshed)
//! ```
//!
//! A field is only ever filled when absent, so the pipeline is idempotent:
//! running it on its own output changes nothing but `last_modified`.
//! Entities a stage does not touch keep their shared `Arc`.

use chrono::Utc;
use nav_types::geometry::polygon;
use nav_types::{
    BuildingId, Edge, EdgeDirection, Floor, FloorId, Graph, Node, NodeId, NodeKind, PropertyBag,
    Space, SpaceKind, Vec2,
};
use std::collections::BTreeMap;

/// Default physical width of an edge, in map units.
pub const DEFAULT_EDGE_WIDTH: f64 = 1.5;

/// Default name for a building without one.
pub const DEFAULT_BUILDING_NAME: &str = "Untitled Building";

/// Default floor level.
pub const DEFAULT_FLOOR_LEVEL: i32 = 0;

/// Run the full pipeline and refresh the timestamp.
pub fn autocomplete(graph: &Graph) -> Graph {
    let (filled, defaults) = fill_defaults(graph);
    let (related, relations) = infer_relations(&filled);
    let (mut completed, derived) = compute_geometry(&related);
    completed.last_modified = Utc::now();

    tracing::debug!(
        defaults,
        relations,
        derived,
        nodes = completed.nodes.len(),
        edges = completed.edges.len(),
        "autocomplete finished"
    );
    completed
}

/// Apply `fill` to a copy of `value`; return the copy only if it differs.
fn changed<T: Clone + PartialEq>(value: &T, fill: impl FnOnce(&mut T)) -> Option<T> {
    let mut copy = value.clone();
    fill(&mut copy);
    (copy != *value).then_some(copy)
}

// ============================================================================
// STAGE 1: DEFAULT FILL
// ============================================================================

/// Fill absent fields with per-entity defaults. Returns the new graph and
/// the number of entities that changed.
pub fn fill_defaults(graph: &Graph) -> (Graph, usize) {
    let mut count = 0;
    let mut next = graph.clone();

    next.nodes = graph.nodes.map_changed(|_, node| {
        let result = changed(node, fill_node);
        count += usize::from(result.is_some());
        result
    });
    next.edges = graph.edges.map_changed(|_, edge| {
        let result = changed(edge, fill_edge);
        count += usize::from(result.is_some());
        result
    });
    next.spaces = graph.spaces.map_changed(|_, space| {
        let result = changed(space, fill_space);
        count += usize::from(result.is_some());
        result
    });
    next.floors = graph.floors.map_changed(|_, floor| {
        let result = changed(floor, fill_floor);
        count += usize::from(result.is_some());
        result
    });
    next.buildings = graph.buildings.map_changed(|_, building| {
        let result = changed(building, |b| {
            b.name.get_or_insert_with(|| DEFAULT_BUILDING_NAME.to_string());
            b.floor_ids.get_or_insert_with(Vec::new);
        });
        count += usize::from(result.is_some());
        result
    });

    (next, count)
}

fn fill_node(node: &mut Node) {
    node.kind.get_or_insert(NodeKind::Other);
    node.position.get_or_insert(Vec2::ZERO);
    node.properties.get_or_insert_with(PropertyBag::new);
}

fn fill_edge(edge: &mut Edge) {
    edge.direction.get_or_insert(EdgeDirection::Bidirectional);
    edge.width.get_or_insert(DEFAULT_EDGE_WIDTH);
    edge.has_steps.get_or_insert(false);
    edge.is_outdoor.get_or_insert(false);
    edge.tags.get_or_insert_with(Vec::new);
    edge.properties.get_or_insert_with(PropertyBag::new);
}

fn fill_space(space: &mut Space) {
    space.kind.get_or_insert(SpaceKind::Other);
    space.metadata.get_or_insert_with(PropertyBag::new);
}

fn fill_floor(floor: &mut Floor) {
    let level = *floor.level.get_or_insert(DEFAULT_FLOOR_LEVEL);
    floor.name.get_or_insert_with(|| Floor::level_label(level));
}

// ============================================================================
// STAGE 2: RELATION INFERENCE
// ============================================================================

/// Floor → building lookup built from each building's floor list.
///
/// When two buildings claim the same floor, the building with the smaller
/// id wins.
pub fn floor_building_index(graph: &Graph) -> BTreeMap<FloorId, BuildingId> {
    let mut index = BTreeMap::new();
    for (building_id, building) in graph.buildings.iter() {
        for floor_id in building.floor_ids.iter().flatten() {
            index
                .entry(floor_id.clone())
                .or_insert_with(|| building_id.clone());
        }
    }
    index
}

/// Derive building ids from floors and the vertical flag of edges.
pub fn infer_relations(graph: &Graph) -> (Graph, usize) {
    let mut count = 0;
    let mut next = graph.clone();
    let index = floor_building_index(graph);

    next.floors = graph.floors.map_changed(|floor_id, floor| {
        let result = changed(floor, |f| {
            if f.building_id.is_none() {
                f.building_id = index.get(floor_id).cloned();
            }
        });
        count += usize::from(result.is_some());
        result
    });

    // Resolve against the floors just updated.
    let building_of = |floor_id: &Option<FloorId>| -> Option<BuildingId> {
        let floor_id = floor_id.as_ref()?;
        index
            .get(floor_id)
            .cloned()
            .or_else(|| next.floors.get(floor_id)?.building_id.clone())
    };

    let nodes = graph.nodes.map_changed(|_, node| {
        let result = changed(node, |n| {
            if n.building_id.is_none() {
                n.building_id = building_of(&n.floor_id);
            }
        });
        count += usize::from(result.is_some());
        result
    });
    let spaces = graph.spaces.map_changed(|_, space| {
        let result = changed(space, |s| {
            if s.building_id.is_none() {
                s.building_id = building_of(&s.floor_id);
            }
        });
        count += usize::from(result.is_some());
        result
    });
    let edges = graph.edges.map_changed(|_, edge| {
        let result = changed(edge, |e| {
            if e.is_vertical.is_none() {
                e.is_vertical = Some(spans_floors(graph, e));
            }
        });
        count += usize::from(result.is_some());
        result
    });

    next.nodes = nodes;
    next.spaces = spaces;
    next.edges = edges;
    (next, count)
}

/// Endpoints are known and sit on different floors.
fn spans_floors(graph: &Graph, edge: &Edge) -> bool {
    match (node_floor(graph, &edge.source), node_floor(graph, &edge.target)) {
        (Some(a), Some(b)) => a != b,
        _ => false,
    }
}

fn node_floor<'g>(graph: &'g Graph, id: &NodeId) -> Option<&'g FloorId> {
    graph.node(id)?.floor_id.as_ref()
}

// ============================================================================
// STAGE 3: GEOMETRIC COMPUTATION
// ============================================================================

/// Derive edge distances and space membership.
pub fn compute_geometry(graph: &Graph) -> (Graph, usize) {
    let mut count = 0;
    let mut next = graph.clone();

    next.edges = graph.edges.map_changed(|_, edge| {
        let result = changed(edge, |e| {
            if e.distance.is_none() {
                e.distance = endpoint_distance(graph, e);
            }
        });
        count += usize::from(result.is_some());
        result
    });

    next.spaces = graph.spaces.map_changed(|_, space| {
        let result = changed(space, |s| {
            if s.node_ids.is_none() {
                s.node_ids = contained_nodes(graph, s);
            }
        });
        count += usize::from(result.is_some());
        result
    });

    (next, count)
}

/// Euclidean distance between an edge's endpoint positions.
pub fn endpoint_distance(graph: &Graph, edge: &Edge) -> Option<f64> {
    let a = graph.node(&edge.source)?.position?;
    let b = graph.node(&edge.target)?.position?;
    Some(a.distance(b))
}

/// Nodes on the space's floor whose position lies inside its polygon.
///
/// `None` when the space has no usable polygon, so membership stays
/// undetermined rather than empty.
fn contained_nodes(graph: &Graph, space: &Space) -> Option<Vec<NodeId>> {
    let outline = space.polygon.as_ref().filter(|p| p.len() >= 3)?;
    Some(
        graph
            .nodes
            .iter()
            .filter(|(_, node)| node.floor_id == space.floor_id)
            .filter(|(_, node)| {
                node.position
                    .is_some_and(|p| polygon::contains_point(outline, p))
            })
            .map(|(id, _)| id.clone())
            .collect(),
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use nav_types::{Building, SpaceId};
    use pretty_assertions::assert_eq;
    use proptest::prelude::*;

    fn two_floor_graph() -> Graph {
        let mut g = Graph::new();
        g.buildings.insert(
            BuildingId::from("b1"),
            Building::new("b1").with_floors(["f1", "f2"]),
        );
        g.floors.insert(FloorId::from("f1"), Floor::new("f1").at_level(0));
        g.floors.insert(FloorId::from("f2"), Floor::new("f2").at_level(1));
        g.floors.insert(FloorId::from("f0"), Floor::new("f0").at_level(-1));
        g.nodes.insert(NodeId::from("a"), Node::new("a").at(0.0, 0.0).on_floor("f1"));
        g.nodes.insert(NodeId::from("b"), Node::new("b").at(3.0, 4.0).on_floor("f1"));
        g.nodes.insert(NodeId::from("c"), Node::new("c").at(3.0, 4.0).on_floor("f2"));
        g.nodes.insert(NodeId::from("loose"), Node::new("loose"));
        g.edges.insert("ab".into(), Edge::new("ab", "a", "b"));
        g.edges.insert("bc".into(), Edge::new("bc", "b", "c"));
        g.edges.insert("given".into(), Edge::new("given", "a", "b").with_distance(99.0));
        g
    }

    #[test]
    fn fills_defaults_without_overwriting() {
        let g = autocomplete(&two_floor_graph());

        let loose = g.node(&NodeId::from("loose")).unwrap();
        assert_eq!(loose.kind, Some(NodeKind::Other));
        assert_eq!(loose.position, Some(Vec2::ZERO));

        let ab = g.edge(&"ab".into()).unwrap();
        assert_eq!(ab.direction, Some(EdgeDirection::Bidirectional));
        assert_eq!(ab.width, Some(DEFAULT_EDGE_WIDTH));
        assert_eq!(ab.has_steps, Some(false));

        let given = g.edge(&"given".into()).unwrap();
        assert_eq!(given.distance, Some(99.0));
    }

    #[test]
    fn floor_names_follow_levels() {
        let g = autocomplete(&two_floor_graph());
        assert_eq!(g.floor(&"f1".into()).unwrap().name.as_deref(), Some("1F"));
        assert_eq!(g.floor(&"f2".into()).unwrap().name.as_deref(), Some("2F"));
        assert_eq!(g.floor(&"f0".into()).unwrap().name.as_deref(), Some("B1"));
    }

    #[test]
    fn infers_buildings_and_vertical_edges() {
        let g = autocomplete(&two_floor_graph());
        assert_eq!(
            g.floor(&"f1".into()).unwrap().building_id,
            Some(BuildingId::from("b1"))
        );
        assert_eq!(
            g.node(&"a".into()).unwrap().building_id,
            Some(BuildingId::from("b1"))
        );
        // f0 is not in any building's floor list
        assert_eq!(g.floor(&"f0".into()).unwrap().building_id, None);
        assert_eq!(g.node(&"loose".into()).unwrap().building_id, None);

        assert_eq!(g.edge(&"ab".into()).unwrap().is_vertical, Some(false));
        assert_eq!(g.edge(&"bc".into()).unwrap().is_vertical, Some(true));
    }

    #[test]
    fn node_building_falls_back_to_floor_field() {
        let mut g = Graph::new();
        g.floors.insert("f9".into(), Floor::new("f9").in_building("b9"));
        g.nodes.insert("n".into(), Node::new("n").on_floor("f9"));
        let g = autocomplete(&g);
        assert_eq!(
            g.node(&"n".into()).unwrap().building_id,
            Some(BuildingId::from("b9"))
        );
    }

    #[test]
    fn computes_euclidean_distance() {
        let g = autocomplete(&two_floor_graph());
        assert_eq!(g.edge(&"ab".into()).unwrap().distance, Some(5.0));
        assert_eq!(g.edge(&"bc".into()).unwrap().distance, Some(0.0));
    }

    #[test]
    fn infers_space_membership_on_same_floor() {
        let mut g = two_floor_graph();
        g.spaces.insert(
            SpaceId::from("room"),
            Space::new("room")
                .on_floor("f1")
                .with_polygon(&[(-1.0, -1.0), (2.0, -1.0), (2.0, 2.0), (-1.0, 2.0)]),
        );
        g.spaces.insert(SpaceId::from("blank"), Space::new("blank").on_floor("f1"));
        let g = autocomplete(&g);

        let room = g.spaces.get(&"room".into()).unwrap();
        assert_eq!(room.node_ids, Some(vec![NodeId::from("a")]));
        assert_eq!(room.building_id, Some(BuildingId::from("b1")));
        assert_eq!(g.spaces.get(&"blank".into()).unwrap().node_ids, None);
    }

    #[test]
    fn second_run_changes_nothing() {
        let once = autocomplete(&two_floor_graph());
        let twice = autocomplete(&once);
        assert!(once.same_entities(&twice));
        // Nothing changed, so every store is still shared.
        assert!(once.nodes.ptr_eq(&twice.nodes));
        assert!(once.edges.ptr_eq(&twice.edges));
        assert!(once.floors.ptr_eq(&twice.floors));
    }

    #[test]
    fn input_snapshot_is_untouched() {
        let raw = two_floor_graph();
        let before = raw.clone();
        let _ = autocomplete(&raw);
        assert!(raw.same_entities(&before));
        assert_eq!(raw.edge(&"ab".into()).unwrap().distance, None);
    }

    fn arb_graph() -> impl Strategy<Value = Graph> {
        let node = (
            proptest::option::of((-50.0f64..50.0, -50.0f64..50.0)),
            proptest::option::of(0usize..3),
            proptest::option::of(Just(NodeKind::Staircase)),
        );
        let edge = (0usize..6, 0usize..6, proptest::option::of(0.0f64..30.0), any::<bool>());
        (
            proptest::collection::vec(node, 1..6),
            proptest::collection::vec(edge, 0..8),
            proptest::option::of(-2i32..3),
        )
            .prop_map(|(nodes, edges, level)| {
                let mut g = Graph::new();
                let mut building = Building::new("b");
                building.floor_ids = Some(vec!["f0".into(), "f1".into()]);
                g.buildings.insert("b".into(), building);
                for f in 0..3 {
                    let mut floor = Floor::new(format!("f{f}"));
                    floor.level = level.map(|l| l + f as i32);
                    g.floors.insert(floor.id.clone(), floor);
                }
                let count = nodes.len();
                for (i, (pos, floor, kind)) in nodes.into_iter().enumerate() {
                    let mut n = Node::new(format!("n{i}"));
                    n.position = pos.map(|(x, y)| Vec2::new(x, y));
                    n.floor_id = floor.map(|f| FloorId::from(format!("f{f}")));
                    n.kind = kind;
                    g.nodes.insert(n.id.clone(), n);
                }
                for (i, (s, t, d, outdoor)) in edges.into_iter().enumerate() {
                    let mut e = Edge::new(format!("e{i}"), format!("n{}", s % count), format!("n{}", t % count));
                    e.distance = d;
                    if outdoor {
                        e.is_outdoor = Some(true);
                    }
                    g.edges.insert(e.id.clone(), e);
                }
                g.spaces.insert(
                    "s".into(),
                    Space::new("s").on_floor("f0").with_polygon(&[
                        (-10.0, -10.0),
                        (10.0, -10.0),
                        (10.0, 10.0),
                        (-10.0, 10.0),
                    ]),
                );
                g
            })
    }

    proptest! {
        #[test]
        fn pipeline_is_idempotent(graph in arb_graph()) {
            let once = autocomplete(&graph);
            let twice = autocomplete(&once);
            prop_assert!(once.same_entities(&twice));
        }
    }
}
