//! Indoor navigation core.
//!
//! Constraint-aware routing over multi-floor, multi-building indoor maps,
//! plus the machinery that keeps the underlying spatial graph sound:
//!
//! - [`autocomplete`] fills defaults, infers relations and derives geometry
//! - [`mutation`] is the only write path; every operation returns a new
//!   snapshot
//! - [`validation`] scans a snapshot for rule violations
//! - [`cost`] turns edges into costs under a routing profile and context
//! - [`routing`] runs A*, Yen alternatives and floor-transition extraction
//! - [`persistence`] and [`config`] handle JSON snapshots and YAML settings
//!
//! Records, identifiers and the geometry kernel live in `nav_types` and are
//! re-exported here.
//!
//! # Example
//!
//! ```
//! use indoor_nav::mutation::{add_edge, add_node};
//! use indoor_nav::routing::{find_route, RouteRequest};
//! use indoor_nav::{Edge, Graph, Node};
//!
//! let g = Graph::new();
//! let g = add_node(&g, Node::new("a").at(0.0, 0.0)).unwrap();
//! let g = add_node(&g, Node::new("b").at(3.0, 4.0)).unwrap();
//! let g = add_edge(&g, Edge::new("ab", "a", "b")).unwrap();
//!
//! let routes = find_route(&g, &RouteRequest::new("a", "b")).unwrap();
//! assert_eq!(routes.primary.total_cost, 5.0);
//! ```

pub mod autocomplete;
pub mod config;
pub mod cost;
pub mod mutation;
pub mod persistence;
pub mod routing;
pub mod validation;

pub use nav_types::geometry;
pub use nav_types::{
    BackgroundImage, Building, BuildingId, Edge, EdgeDirection, EdgeId, Floor, FloorId, Graph,
    Mat3, Node, NodeId, NodeKind, ProfileId, PropertyBag, Space, SpaceId, SpaceKind, Store, Vec2,
    VerticalLinks, SCHEMA_VERSION,
};

pub use autocomplete::autocomplete;
pub use config::{ConfigError, RouterConfig};
pub use cost::{RouteContext, RoutingProfile, Weather};
pub use mutation::MutationError;
pub use persistence::PersistError;
pub use routing::{find_route, RouteError, RouteRequest, RouteResponse, RouteSet, Router};
pub use validation::{validate, ValidationReport};
