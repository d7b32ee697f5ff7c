//! Graph Lifecycle Integration Tests
//!
//! Exercises a map from first node to saved file:
//! 1. Snapshots stay untouched by later mutations
//! 2. Rejections leave the caller's snapshot usable
//! 3. Validation reports on hand-built broken graphs
//! 4. JSON persistence keeps completed defaults

use indoor_nav::mutation::{
    add_building, add_edge, add_floor, add_node, add_space, delete_floor, delete_node,
    link_vertical, update_node, VerticalLinkOptions,
};
use indoor_nav::persistence;
use indoor_nav::validation::{validate, RuleId, Severity};
use indoor_nav::{
    Building, Edge, EdgeDirection, Floor, Graph, Node, NodeId, NodeKind, Space, SpaceId, Vec2,
};
use pretty_assertions::assert_eq;

fn office_floor() -> Graph {
    let g = Graph::new();
    let g = add_building(&g, Building::new("hq")).unwrap();
    let g = add_floor(&g, Floor::new("ground").in_building("hq")).unwrap();
    let g = add_node(&g, Node::new("door").at(0.0, 0.0).on_floor("ground")).unwrap();
    let g = add_node(&g, Node::new("desk").at(3.0, 4.0).on_floor("ground")).unwrap();
    let g = add_edge(&g, Edge::new("door-desk", "door", "desk")).unwrap();
    add_space(
        &g,
        Space::new("office")
            .with_polygon(&[(-1.0, -1.0), (5.0, -1.0), (5.0, 5.0), (-1.0, 5.0)])
            .on_floor("ground"),
    )
    .unwrap()
}

#[test]
fn pipeline_completes_every_entity() {
    let g = office_floor();

    let building = g.buildings.get(&"hq".into()).unwrap();
    assert_eq!(building.name.as_deref(), Some("Untitled Building"));

    let floor = g.floor(&"ground".into()).unwrap();
    assert_eq!(floor.level, Some(0));
    assert_eq!(floor.name.as_deref(), Some("1F"));

    let edge = g.edge(&"door-desk".into()).unwrap();
    assert_eq!(edge.distance, Some(5.0));
    assert_eq!(edge.direction, Some(EdgeDirection::Bidirectional));
    assert_eq!(edge.is_vertical, Some(false));

    let space = g.spaces.get(&SpaceId::from("office")).unwrap();
    let mut members = space.node_ids.clone().unwrap_or_default();
    members.sort();
    assert_eq!(members, vec![NodeId::from("desk"), NodeId::from("door")]);

    assert!(validate(&g).is_valid);
}

#[test]
fn earlier_snapshots_survive_later_mutations() {
    let before = office_floor();
    let moved = update_node(&before, &"desk".into(), |n| {
        n.position = Some(Vec2::new(6.0, 8.0));
    })
    .unwrap();
    let removed = delete_node(&moved, &"door".into()).unwrap();

    // The first snapshot still has both nodes, the edge and its distance.
    assert_eq!(before.nodes.len(), 2);
    assert_eq!(before.edge(&"door-desk".into()).unwrap().distance, Some(5.0));
    assert_eq!(
        before.node(&"desk".into()).unwrap().position,
        Some(Vec2::new(3.0, 4.0))
    );
    assert!(before.nodes.get_arc(&"door".into()).is_some());

    assert_eq!(
        moved.node(&"desk".into()).unwrap().position,
        Some(Vec2::new(6.0, 8.0))
    );
    assert_eq!(moved.edges.len(), 1);
    // The derived distance follows the new position.
    assert_eq!(moved.edge(&"door-desk".into()).unwrap().distance, Some(10.0));
    // Untouched entities are shared, not copied.
    assert!(std::sync::Arc::ptr_eq(
        before.nodes.get_arc(&"door".into()).unwrap(),
        moved.nodes.get_arc(&"door".into()).unwrap()
    ));

    assert_eq!(removed.nodes.len(), 1);
    assert!(removed.edges.is_empty());
    let space = removed.spaces.get(&SpaceId::from("office")).unwrap();
    assert!(!space.node_ids.iter().flatten().any(|n| n.as_str() == "door"));
}

#[test]
fn rejections_keep_the_snapshot_usable() {
    let g = office_floor();

    let err = add_node(&g, Node::new("door")).unwrap_err();
    assert_eq!(err.code(), "DUPLICATE_ID");

    let err = add_edge(&g, Edge::new("loop", "desk", "desk")).unwrap_err();
    assert_eq!(err.code(), "SELF_LOOP");

    let err = add_edge(&g, Edge::new("dangling", "desk", "nowhere")).unwrap_err();
    assert_eq!(err.code(), "MISSING_ENDPOINT");

    let bowtie = Space::new("bowtie").with_polygon(&[(0.0, 0.0), (2.0, 2.0), (2.0, 0.0), (0.0, 2.0)]);
    let err = add_space(&g, bowtie).unwrap_err();
    assert_eq!(err.code(), "SELF_INTERSECTING_POLYGON");

    let err = delete_floor(&g, &"ground".into()).unwrap_err();
    assert_eq!(err.code(), "REFERENCE_IN_USE");

    // Still the same graph, and still mutable.
    assert_eq!(g.nodes.len(), 2);
    assert!(add_node(&g, Node::new("printer").on_floor("ground")).is_ok());
}

#[test]
fn single_node_is_isolated() {
    let g = add_node(&Graph::new(), Node::new("lonely")).unwrap();
    let report = validate(&g);
    assert!(!report.is_valid);
    assert_eq!(report.issues.len(), 1);
    let issue = &report.issues[0];
    assert_eq!(issue.rule_id, RuleId::IsolatedNode);
    assert_eq!(issue.severity, Severity::Error);
    assert_eq!(issue.target_ids, vec!["lonely".to_string()]);
}

#[test]
fn parallel_edges_warn_once() {
    let g = Graph::new();
    let g = add_node(&g, Node::new("a")).unwrap();
    let g = add_node(&g, Node::new("b")).unwrap();
    let g = add_edge(&g, Edge::new("e1", "a", "b")).unwrap();
    let g = add_edge(&g, Edge::new("e2", "b", "a")).unwrap();

    let report = validate(&g);
    assert!(report.is_valid);
    assert_eq!(report.summary.errors, 0);
    assert_eq!(report.summary.warnings, 1);
    let issue = report.by_rule(RuleId::DuplicateEdge).next().unwrap();
    assert_eq!(issue.target_ids, vec!["e1".to_string(), "e2".to_string()]);
}

#[test]
fn bowtie_space_is_reported() {
    // Mutations reject a bowtie, so build the graph directly.
    let mut g = Graph::new();
    g.spaces.insert(
        "bowtie".into(),
        Space::new("bowtie").with_polygon(&[(0.0, 0.0), (2.0, 2.0), (2.0, 0.0), (0.0, 2.0)]),
    );
    let report = validate(&g);
    assert!(!report.is_valid);
    assert_eq!(report.summary.errors, 1);
    assert_eq!(report.issues[0].rule_id, RuleId::SelfIntersection);
    assert_eq!(report.issues[0].target_ids, vec!["bowtie".to_string()]);
}

#[test]
fn unlinked_connector_is_advisory() {
    let g = office_floor();
    let g = add_node(
        &g,
        Node::new("lift").at(1.0, 1.0).on_floor("ground").with_kind(NodeKind::Elevator),
    )
    .unwrap();
    let g = add_edge(&g, Edge::new("door-lift", "door", "lift")).unwrap();

    let report = validate(&g);
    assert!(report.is_valid);
    assert_eq!(report.by_rule(RuleId::UnlinkedConnector).count(), 1);

    let g = add_floor(&g, Floor::new("first").at_level(1).in_building("hq")).unwrap();
    let g = add_node(
        &g,
        Node::new("lift-1").on_floor("first").with_kind(NodeKind::Elevator),
    )
    .unwrap();
    let g = link_vertical(&g, &"lift".into(), &"lift-1".into(), VerticalLinkOptions::default())
        .unwrap();
    let report = validate(&g);
    assert_eq!(report.by_rule(RuleId::UnlinkedConnector).count(), 0);
    assert_eq!(report.by_rule(RuleId::BrokenVerticalLink).count(), 0);
}

#[test]
fn validation_is_repeatable() {
    let mut g = office_floor();
    g.edges.insert("ghost".into(), Edge::new("ghost", "door", "nobody"));
    g.nodes.insert("stray".into(), Node::new("stray").on_floor("attic"));
    let first = validate(&g);
    assert_eq!(validate(&g), first);
    let rules: Vec<RuleId> = first.issues.iter().map(|i| i.rule_id).collect();
    assert_eq!(
        rules,
        vec![RuleId::EdgeReference, RuleId::IsolatedNode, RuleId::DanglingReference]
    );
}

#[test]
fn saved_file_reloads_with_defaults() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("office.json");
    let g = office_floor();

    persistence::save_file(&g, &path).unwrap();
    let back = persistence::load_file(&path).unwrap();
    assert!(g.same_entities(&back));
    assert_eq!(back.edge(&"door-desk".into()).unwrap().distance, Some(5.0));
    assert_eq!(back.floor(&"ground".into()).unwrap().name.as_deref(), Some("1F"));

    let json = std::fs::read_to_string(&path).unwrap();
    let value: serde_json::Value = serde_json::from_str(&json).unwrap();
    assert_eq!(value["edges"]["door-desk"]["direction"], "bidirectional");
    assert_eq!(value["buildings"]["hq"]["floorIds"][0], "ground");
}
