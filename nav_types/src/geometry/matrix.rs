//! 3x3 affine transform.

use super::{GeometryError, Vec2};
use serde::{Deserialize, Serialize};

/// Row-major 3x3 affine matrix.
///
/// ```text
/// | m[0] m[1] m[2] |     | a b tx |
/// | m[3] m[4] m[5] |  =  | c d ty |
/// | m[6] m[7] m[8] |     | 0 0 1  |
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Mat3 {
    pub m: [f64; 9],
}

impl Default for Mat3 {
    fn default() -> Self {
        Self::IDENTITY
    }
}

impl Mat3 {
    pub const IDENTITY: Mat3 = Mat3 {
        m: [1.0, 0.0, 0.0, 0.0, 1.0, 0.0, 0.0, 0.0, 1.0],
    };

    pub fn identity() -> Self {
        Self::IDENTITY
    }

    pub fn translate(offset: Vec2) -> Self {
        Self {
            m: [1.0, 0.0, offset.x, 0.0, 1.0, offset.y, 0.0, 0.0, 1.0],
        }
    }

    pub fn scale(sx: f64, sy: f64) -> Self {
        Self {
            m: [sx, 0.0, 0.0, 0.0, sy, 0.0, 0.0, 0.0, 1.0],
        }
    }

    /// Counter-clockwise rotation by `radians` about the origin.
    pub fn rotate(radians: f64) -> Self {
        let (s, c) = radians.sin_cos();
        Self {
            m: [c, -s, 0.0, s, c, 0.0, 0.0, 0.0, 1.0],
        }
    }

    /// `self * other`: applying the result equals applying `other` first,
    /// then `self`.
    pub fn compose(&self, other: &Mat3) -> Mat3 {
        let a = &self.m;
        let b = &other.m;
        let mut out = [0.0; 9];
        for row in 0..3 {
            for col in 0..3 {
                out[row * 3 + col] = (0..3).map(|k| a[row * 3 + k] * b[k * 3 + col]).sum();
            }
        }
        Mat3 { m: out }
    }

    pub fn determinant(&self) -> f64 {
        let m = &self.m;
        m[0] * (m[4] * m[8] - m[5] * m[7]) - m[1] * (m[3] * m[8] - m[5] * m[6])
            + m[2] * (m[3] * m[7] - m[4] * m[6])
    }

    /// Inverse of an affine transform.
    pub fn invert(&self) -> Result<Mat3, GeometryError> {
        let m = &self.m;
        let det = m[0] * m[4] - m[1] * m[3];
        if det.abs() < super::EPSILON {
            return Err(GeometryError::SingularMatrix { determinant: det });
        }
        let inv_det = 1.0 / det;
        let a = m[4] * inv_det;
        let b = -m[1] * inv_det;
        let c = -m[3] * inv_det;
        let d = m[0] * inv_det;
        let tx = -(a * m[2] + b * m[5]);
        let ty = -(c * m[2] + d * m[5]);
        Ok(Mat3 {
            m: [a, b, tx, c, d, ty, 0.0, 0.0, 1.0],
        })
    }

    /// Transform a point (translation applies).
    pub fn apply_point(&self, p: Vec2) -> Vec2 {
        let m = &self.m;
        Vec2::new(m[0] * p.x + m[1] * p.y + m[2], m[3] * p.x + m[4] * p.y + m[5])
    }

    /// Transform a direction (translation ignored).
    pub fn apply_direction(&self, v: Vec2) -> Vec2 {
        let m = &self.m;
        Vec2::new(m[0] * v.x + m[1] * v.y, m[3] * v.x + m[4] * v.y)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::f64::consts::FRAC_PI_2;

    fn approx(a: Vec2, b: Vec2) -> bool {
        (a.x - b.x).abs() < 1e-9 && (a.y - b.y).abs() < 1e-9
    }

    #[test]
    fn identity_is_noop() {
        let p = Vec2::new(3.0, -4.0);
        assert_eq!(Mat3::identity().apply_point(p), p);
    }

    #[test]
    fn translate_moves_points_not_directions() {
        let t = Mat3::translate(Vec2::new(5.0, 1.0));
        assert_eq!(t.apply_point(Vec2::new(1.0, 1.0)), Vec2::new(6.0, 2.0));
        assert_eq!(t.apply_direction(Vec2::new(1.0, 1.0)), Vec2::new(1.0, 1.0));
    }

    #[test]
    fn rotate_quarter_turn() {
        let r = Mat3::rotate(FRAC_PI_2);
        assert!(approx(r.apply_point(Vec2::new(1.0, 0.0)), Vec2::new(0.0, 1.0)));
    }

    #[test]
    fn compose_applies_right_first() {
        let t = Mat3::translate(Vec2::new(10.0, 0.0));
        let s = Mat3::scale(2.0, 2.0);
        // scale then translate
        let m = t.compose(&s);
        assert_eq!(m.apply_point(Vec2::new(1.0, 1.0)), Vec2::new(12.0, 2.0));
    }

    #[test]
    fn invert_round_trips() {
        let m = Mat3::translate(Vec2::new(3.0, -2.0))
            .compose(&Mat3::rotate(0.7))
            .compose(&Mat3::scale(2.0, 0.5));
        let inv = m.invert().unwrap();
        let p = Vec2::new(4.0, 9.0);
        assert!(approx(inv.apply_point(m.apply_point(p)), p));
        assert!((m.compose(&inv).determinant() - 1.0).abs() < 1e-9);
    }

    #[test]
    fn singular_matrix_fails() {
        let m = Mat3::scale(0.0, 1.0);
        assert!(matches!(m.invert(), Err(GeometryError::SingularMatrix { .. })));
    }
}
