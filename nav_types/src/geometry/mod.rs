//! Geometry kernel.
//!
//! Stateless 2D vector algebra, 3x3 affine transforms and polygon
//! operations. Nothing here knows about the graph model; validation and the
//! defaulting pipeline call into these functions.

mod matrix;
pub mod polygon;
mod vector;

pub use matrix::Mat3;
pub use vector::Vec2;

use thiserror::Error;

/// Tolerance used for boundary and collinearity tests.
pub const EPSILON: f64 = 1e-9;

/// Geometry failures.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum GeometryError {
    /// Matrix cannot be inverted.
    #[error("Singular matrix: determinant {determinant} is too close to zero")]
    SingularMatrix { determinant: f64 },
}
