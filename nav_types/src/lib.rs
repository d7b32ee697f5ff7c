//! Indoor Navigation Types - Level 1 Foundation Types
//!
//! This crate contains the data structures that every other part of the
//! indoor navigation core is built on:
//!
//! - Typed identifiers, one newtype per entity kind
//! - Entity records (`Node`, `Edge`, `Space`, `Floor`, `Building`)
//! - The `Graph` snapshot with copy-on-write entity stores
//! - The geometry kernel (vectors, affine matrices, polygons)
//!
//! ## Architecture Level: LEVEL 1 (Foundation)
//!
//! This crate depends on nothing else in the workspace. The defaulting
//! pipeline, mutation manager, validation engine and router all live one
//! level up in `indoor-nav`.
//!
//! ## Rules
//!
//! 1. **NO GRAPH ALGORITHMS** - records, stores and pure geometry only
//! 2. **EVERYTHING OPTIONAL EXCEPT IDENTITY** - partial input is completed later
//! 3. **SERIALIZABLE** - all records round-trip through the persisted JSON format
//! 4. **THREAD SAFE** - snapshots are `Send + Sync` and cheap to clone

pub mod geometry;
mod ids;
mod schema;
mod store;

pub use geometry::{GeometryError, Mat3, Vec2};
pub use ids::{BuildingId, EdgeId, FloorId, NodeId, ProfileId, SpaceId};
pub use schema::{
    BackgroundImage, Building, Edge, EdgeDirection, Floor, Graph, Node, NodeKind, PropertyBag,
    Space, SpaceKind, VerticalLinks,
};
pub use store::Store;

/// Schema version written into every new graph.
pub const SCHEMA_VERSION: &str = "1.0.0";

/// Major schema version this crate can read.
pub const SUPPORTED_MAJOR_VERSION: u64 = 1;
