//! Validation engine.
//!
//! A read-only scan of one snapshot. Each rule appends issues in store
//! (identity) order, so the same graph always yields the same report:
//!
//! 1. ER-1 edge endpoints exist
//! 2. SL-1 no self-loops
//! 3. DE-1 no parallel edges (advisory)
//! 4. NI-1 no isolated nodes
//! 5. VL-1 vertical connectors are linked (advisory)
//! 6. VL-2 vertical links resolve (advisory)
//! 7. SI-1 space polygons are simple
//! 8. RF-1 floor and building references resolve (advisory)

mod report;

pub use report::{
    Policy, RuleId, Severity, ValidationFailed, ValidationIssue, ValidationReport,
    ValidationSummary,
};

use nav_types::geometry::polygon;
use nav_types::{EdgeId, Graph, NodeId};
use std::collections::{BTreeMap, BTreeSet};
use std::fmt;

/// Scan a snapshot and report every rule violation.
pub fn validate(graph: &Graph) -> ValidationReport {
    let mut issues = Vec::new();

    check_edge_references(graph, &mut issues);
    check_self_loops(graph, &mut issues);
    check_duplicate_edges(graph, &mut issues);
    check_isolated_nodes(graph, &mut issues);
    check_vertical_connectors(graph, &mut issues);
    check_vertical_links(graph, &mut issues);
    check_space_polygons(graph, &mut issues);
    check_floor_references(graph, &mut issues);

    let report = ValidationReport::from_issues(issues);
    tracing::debug!(
        errors = report.summary.errors,
        warnings = report.summary.warnings,
        "validation finished"
    );
    report
}

/// Validate and fail on any error-severity issue.
pub fn ensure_valid(graph: &Graph) -> Result<ValidationReport, ValidationFailed> {
    validate(graph).ensure_valid()
}

fn check_edge_references(graph: &Graph, issues: &mut Vec<ValidationIssue>) {
    for edge in graph.edges.values() {
        let missing: Vec<&NodeId> = [&edge.source, &edge.target]
            .into_iter()
            .filter(|n| !graph.nodes.contains_key(n))
            .collect();
        if missing.is_empty() {
            continue;
        }
        let names = missing
            .iter()
            .map(|n| format!("'{n}'"))
            .collect::<Vec<_>>()
            .join(", ");
        let targets =
            std::iter::once(edge.id.to_string()).chain(missing.iter().map(|n| n.to_string()));
        issues.push(ValidationIssue::new(
            RuleId::EdgeReference,
            format!("Edge '{}' references missing node(s) {names}", edge.id),
            targets,
        ));
    }
}

fn check_self_loops(graph: &Graph, issues: &mut Vec<ValidationIssue>) {
    for edge in graph.edges.values().filter(|e| e.is_self_loop()) {
        issues.push(ValidationIssue::new(
            RuleId::SelfLoop,
            format!("Edge '{}' connects node '{}' to itself", edge.id, edge.source),
            [edge.id.to_string(), edge.source.to_string()],
        ));
    }
}

fn check_duplicate_edges(graph: &Graph, issues: &mut Vec<ValidationIssue>) {
    let mut pairs: BTreeMap<(&NodeId, &NodeId), Vec<&EdgeId>> = BTreeMap::new();
    for edge in graph.edges.values().filter(|e| !e.is_self_loop()) {
        pairs.entry(edge.unordered_pair()).or_default().push(&edge.id);
    }

    for ((a, b), edges) in pairs.into_iter().filter(|(_, edges)| edges.len() > 1) {
        issues.push(ValidationIssue::new(
            RuleId::DuplicateEdge,
            format!("{} edges connect '{a}' and '{b}'", edges.len()),
            edges,
        ));
    }
}

fn check_isolated_nodes(graph: &Graph, issues: &mut Vec<ValidationIssue>) {
    let connected: BTreeSet<&NodeId> = graph
        .edges
        .values()
        .flat_map(|e| [&e.source, &e.target])
        .collect();

    for id in graph.nodes.keys().filter(|id| !connected.contains(id)) {
        issues.push(ValidationIssue::new(
            RuleId::IsolatedNode,
            format!("Node '{id}' is not connected to any edge"),
            [id],
        ));
    }
}

fn check_vertical_connectors(graph: &Graph, issues: &mut Vec<ValidationIssue>) {
    let on_vertical_edge: BTreeSet<&NodeId> = graph
        .edges
        .values()
        .filter(|e| e.is_vertical == Some(true))
        .flat_map(|e| [&e.source, &e.target])
        .collect();

    for node in graph.nodes.values() {
        let kind = node.kind_or_default();
        if !kind.is_vertical_connector()
            || !node.vertical_links.is_empty()
            || on_vertical_edge.contains(&node.id)
        {
            continue;
        }
        issues.push(ValidationIssue::new(
            RuleId::UnlinkedConnector,
            format!(
                "{} node '{}' has no vertical link or vertical edge",
                kind.as_str(),
                node.id
            ),
            [&node.id],
        ));
    }
}

fn check_vertical_links(graph: &Graph, issues: &mut Vec<ValidationIssue>) {
    for node in graph.nodes.values() {
        for target in node.vertical_links.targets() {
            if graph.nodes.contains_key(target) {
                continue;
            }
            issues.push(ValidationIssue::new(
                RuleId::BrokenVerticalLink,
                format!("Node '{}' has a vertical link to missing node '{target}'", node.id),
                [&node.id, target],
            ));
        }
    }
}

fn check_space_polygons(graph: &Graph, issues: &mut Vec<ValidationIssue>) {
    for space in graph.spaces.values() {
        let Some(outline) = &space.polygon else {
            continue;
        };
        if polygon::is_self_intersecting(outline) {
            issues.push(ValidationIssue::new(
                RuleId::SelfIntersection,
                format!("Space '{}' polygon intersects itself", space.id),
                [&space.id],
            ));
        }
    }
}

fn check_floor_references(graph: &Graph, issues: &mut Vec<ValidationIssue>) {
    let mut dangling = |owner: &str, id: &dyn fmt::Display, what: &str, target: &dyn fmt::Display| {
        issues.push(ValidationIssue::new(
            RuleId::DanglingReference,
            format!("{owner} '{id}' references missing {what} '{target}'"),
            [id.to_string(), target.to_string()],
        ));
    };

    for node in graph.nodes.values() {
        if let Some(floor) = node.floor_id.as_ref().filter(|f| !graph.floors.contains_key(f)) {
            dangling("Node", &node.id, "floor", floor);
        }
        if let Some(b) = node.building_id.as_ref().filter(|b| !graph.buildings.contains_key(b)) {
            dangling("Node", &node.id, "building", b);
        }
    }
    for space in graph.spaces.values() {
        if let Some(floor) = space.floor_id.as_ref().filter(|f| !graph.floors.contains_key(f)) {
            dangling("Space", &space.id, "floor", floor);
        }
        if let Some(b) = space.building_id.as_ref().filter(|b| !graph.buildings.contains_key(b)) {
            dangling("Space", &space.id, "building", b);
        }
    }
    for floor in graph.floors.values() {
        if let Some(b) = floor.building_id.as_ref().filter(|b| !graph.buildings.contains_key(b)) {
            dangling("Floor", &floor.id, "building", b);
        }
    }
    for building in graph.buildings.values() {
        for floor in building.floor_ids.iter().flatten() {
            if !graph.floors.contains_key(floor) {
                dangling("Building", &building.id, "floor", floor);
            }
        }
    }
}
