#![warn(missing_docs)]

//! Math types for the ldpov scene converter.
//!
//! Thin wrappers around nalgebra for the affine placements used by brick
//! models: points, vectors, 3x4 transforms in LDraw layout, determinants
//! and singular-matrix repair.

use nalgebra::{Matrix3, Matrix4, Vector3, Vector4};

/// A point in 3D space.
pub type Point3 = nalgebra::Point3<f64>;

/// A vector in 3D space.
pub type Vec3 = Vector3<f64>;

/// Axes shorter than this are treated as zero-length during correction.
pub const SINGULAR_EPSILON: f64 = 1e-12;

/// Diagonal bias added when replacing degenerate axes is not enough.
const DIAGONAL_NUDGE: f64 = 1e-3;

/// An affine transform stored as a 4x4 matrix (column-vector convention).
///
/// Only the upper 3x4 block is ever populated; the last row stays `0 0 0 1`.
#[derive(Debug, Clone, PartialEq)]
pub struct Transform {
    /// The underlying 4x4 matrix.
    pub matrix: Matrix4<f64>,
}

impl Transform {
    /// Identity transform.
    pub fn identity() -> Self {
        Self {
            matrix: Matrix4::identity(),
        }
    }

    /// Translation by `(dx, dy, dz)`.
    pub fn translation(dx: f64, dy: f64, dz: f64) -> Self {
        let mut m = Matrix4::identity();
        m[(0, 3)] = dx;
        m[(1, 3)] = dy;
        m[(2, 3)] = dz;
        Self { matrix: m }
    }

    /// Non-uniform scale by `(sx, sy, sz)`.
    pub fn scale(sx: f64, sy: f64, sz: f64) -> Self {
        let mut m = Matrix4::identity();
        m[(0, 0)] = sx;
        m[(1, 1)] = sy;
        m[(2, 2)] = sz;
        Self { matrix: m }
    }

    /// Rotation about the X axis by `angle` radians.
    pub fn rotation_x(angle: f64) -> Self {
        let (s, c) = angle.sin_cos();
        let mut m = Matrix4::identity();
        m[(1, 1)] = c;
        m[(1, 2)] = -s;
        m[(2, 1)] = s;
        m[(2, 2)] = c;
        Self { matrix: m }
    }

    /// Rotation about the Y axis by `angle` radians.
    pub fn rotation_y(angle: f64) -> Self {
        let (s, c) = angle.sin_cos();
        let mut m = Matrix4::identity();
        m[(0, 0)] = c;
        m[(0, 2)] = s;
        m[(2, 0)] = -s;
        m[(2, 2)] = c;
        Self { matrix: m }
    }

    /// Rotation about the Z axis by `angle` radians.
    pub fn rotation_z(angle: f64) -> Self {
        let (s, c) = angle.sin_cos();
        let mut m = Matrix4::identity();
        m[(0, 0)] = c;
        m[(0, 1)] = -s;
        m[(1, 0)] = s;
        m[(1, 1)] = c;
        Self { matrix: m }
    }

    /// Build a transform from the twelve numbers of an LDraw placement,
    /// `x y z a b c d e f g h i`, meaning
    /// `p' = [a b c; d e f; g h i] * p + (x, y, z)`.
    pub fn from_ldraw(v: &[f64; 12]) -> Self {
        let [x, y, z, a, b, c, d, e, f, g, h, i] = *v;
        Self {
            matrix: Matrix4::new(
                a, b, c, x, //
                d, e, f, y, //
                g, h, i, z, //
                0.0, 0.0, 0.0, 1.0,
            ),
        }
    }

    /// The twelve LDraw numbers `x y z a b c d e f g h i` of this transform.
    pub fn to_ldraw(&self) -> [f64; 12] {
        let m = &self.matrix;
        [
            m[(0, 3)],
            m[(1, 3)],
            m[(2, 3)],
            m[(0, 0)],
            m[(0, 1)],
            m[(0, 2)],
            m[(1, 0)],
            m[(1, 1)],
            m[(1, 2)],
            m[(2, 0)],
            m[(2, 1)],
            m[(2, 2)],
        ]
    }

    /// Place `self` inside `parent`: the result applies `self` first and
    /// `parent` second (`parent * self` in column-vector terms).
    pub fn compose(&self, parent: &Transform) -> Self {
        Self {
            matrix: parent.matrix * self.matrix,
        }
    }

    /// Copy of this transform with `(dx, dy, dz)` added to its translation.
    pub fn translated(&self, dx: f64, dy: f64, dz: f64) -> Self {
        let mut m = self.matrix;
        m[(0, 3)] += dx;
        m[(1, 3)] += dy;
        m[(2, 3)] += dz;
        Self { matrix: m }
    }

    /// Transform a point.
    pub fn apply_point(&self, p: &Point3) -> Point3 {
        let v = self.matrix * Vector4::new(p.x, p.y, p.z, 1.0);
        Point3::new(v.x, v.y, v.z)
    }

    /// The 3x3 rotation/scale block.
    pub fn linear(&self) -> Matrix3<f64> {
        self.matrix.fixed_view::<3, 3>(0, 0).into_owned()
    }

    /// Determinant of the 3x3 rotation/scale block.
    pub fn determinant(&self) -> f64 {
        self.linear().determinant()
    }

    /// True when the transform mirrors space (negative determinant).
    pub fn is_mirroring(&self) -> bool {
        self.determinant() < 0.0
    }

    /// True when the transform collapses space onto a plane, line or point.
    ///
    /// Only an exactly zero determinant counts; a tiny but regular scale is
    /// left alone.
    pub fn is_singular(&self) -> bool {
        self.determinant() == 0.0
    }

    /// A nearby non-singular transform.
    ///
    /// Zero-length axes of the linear block are replaced by the unit normal
    /// of the two remaining axes (or by the matching basis axis when those
    /// are degenerate too). If the block is still singular afterwards the
    /// diagonal is nudged. Translation is kept as is. A transform that is
    /// already regular is returned unchanged.
    pub fn corrected(&self) -> Self {
        if !self.is_singular() {
            return self.clone();
        }

        let mut m = self.matrix;
        for axis in 0..3 {
            let col: Vec3 = m.fixed_view::<3, 1>(0, axis).into_owned();
            if col.norm() >= SINGULAR_EPSILON {
                continue;
            }
            let a: Vec3 = m.fixed_view::<3, 1>(0, (axis + 1) % 3).into_owned();
            let b: Vec3 = m.fixed_view::<3, 1>(0, (axis + 2) % 3).into_owned();
            let normal = a.cross(&b);
            let replacement = if normal.norm() >= SINGULAR_EPSILON {
                normal.normalize()
            } else {
                let mut unit = Vec3::zeros();
                unit[axis] = 1.0;
                unit
            };
            m.fixed_view_mut::<3, 1>(0, axis).copy_from(&replacement);
        }

        let mut fixed = Self { matrix: m };
        if fixed.determinant().abs() < SINGULAR_EPSILON {
            for axis in 0..3 {
                fixed.matrix[(axis, axis)] += DIAGONAL_NUDGE;
            }
        }
        fixed
    }

    /// The twelve numbers of a POV-Ray `matrix <...>` modifier.
    ///
    /// POV-Ray multiplies row vectors, so the first nine numbers are the
    /// images of the X, Y and Z axes and the last three the translation.
    pub fn pov_matrix(&self) -> [f64; 12] {
        let m = &self.matrix;
        [
            m[(0, 0)],
            m[(1, 0)],
            m[(2, 0)],
            m[(0, 1)],
            m[(1, 1)],
            m[(2, 1)],
            m[(0, 2)],
            m[(1, 2)],
            m[(2, 2)],
            m[(0, 3)],
            m[(1, 3)],
            m[(2, 3)],
        ]
    }
}

impl Default for Transform {
    fn default() -> Self {
        Self::identity()
    }
}
