//! Floor-change extraction for presentation.

use nav_types::{FloorId, Graph, NodeId, NodeKind};
use serde::{Deserialize, Serialize};

/// One change of floor along a route.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FloorTransition {
    /// Node where the floor change starts.
    pub node_id: NodeId,
    pub from_floor: FloorId,
    pub to_floor: FloorId,
    pub description: String,
}

/// Transitions for each consecutive pair of route nodes on different known
/// floors, in route order.
pub fn floor_transitions(graph: &Graph, route: &[NodeId]) -> Vec<FloorTransition> {
    route
        .windows(2)
        .filter_map(|pair| {
            let from = graph.node(&pair[0])?;
            let to = graph.node(&pair[1])?;
            let (from_floor, to_floor) = (from.floor_id.as_ref()?, to.floor_id.as_ref()?);
            if from_floor == to_floor {
                return None;
            }

            let connector = [from.kind, to.kind]
                .into_iter()
                .flatten()
                .find(NodeKind::is_vertical_connector);
            let action = match connector {
                Some(NodeKind::Elevator) => "Take the elevator",
                Some(NodeKind::Staircase) => "Take the stairs",
                _ => "Change floors",
            };
            let description = format!(
                "{action} from {} to {}",
                floor_label(graph, from_floor),
                floor_label(graph, to_floor)
            );

            Some(FloorTransition {
                node_id: from.id.clone(),
                from_floor: from_floor.clone(),
                to_floor: to_floor.clone(),
                description,
            })
        })
        .collect()
}

fn floor_label(graph: &Graph, floor: &FloorId) -> String {
    graph
        .floor(floor)
        .map_or_else(|| floor.to_string(), |f| f.display_name())
}
