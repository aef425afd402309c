//! Column-major 4x4 matrices
//!
//! Storage is `cols[col][row]`, the layout shaders expect. Matrices act on
//! column vectors, so `a * b` applies `b` first. [`Mat4::compose`] spells the
//! application order out: `compose(a, b)` applies `a`, then `b`.

use crate::quat::Quat;
use crate::types::{Vec3, Vec4};
use bytemuck::{Pod, Zeroable};
use serde::{Deserialize, Serialize};
use std::ops::Mul;

/// Determinants at or below this magnitude are treated as singular
pub const SINGULAR_EPSILON: f32 = 1e-12;

/// A 4x4 matrix stored column-major
#[repr(C)]
#[derive(Clone, Copy, Debug, PartialEq, Pod, Zeroable, Serialize, Deserialize)]
pub struct Mat4 {
    pub cols: [[f32; 4]; 4],
}

impl Default for Mat4 {
    fn default() -> Self {
        Self::IDENTITY
    }
}

impl Mat4 {
    pub const IDENTITY: Self = Self {
        cols: [
            [1.0, 0.0, 0.0, 0.0],
            [0.0, 1.0, 0.0, 0.0],
            [0.0, 0.0, 1.0, 0.0],
            [0.0, 0.0, 0.0, 1.0],
        ],
    };

    pub const ZERO: Self = Self {
        cols: [[0.0; 4]; 4],
    };

    pub const fn from_cols(cols: [[f32; 4]; 4]) -> Self {
        Self { cols }
    }

    pub fn from_cols_array(arr: &[f32; 16]) -> Self {
        let mut cols = [[0.0f32; 4]; 4];
        for (col, chunk) in cols.iter_mut().zip(arr.chunks_exact(4)) {
            col.copy_from_slice(chunk);
        }
        Self { cols }
    }

    /// Flatten to 16 scalars, column after column
    pub fn to_cols_array(&self) -> [f32; 16] {
        let mut out = [0.0f32; 16];
        for (chunk, col) in out.chunks_exact_mut(4).zip(self.cols.iter()) {
            chunk.copy_from_slice(col);
        }
        out
    }

    /// Element at `row`, `col` (both zero based)
    pub fn get(&self, row: usize, col: usize) -> f32 {
        self.cols[col][row]
    }

    pub fn set(&mut self, row: usize, col: usize, value: f32) {
        self.cols[col][row] = value;
    }

    pub fn from_scale(scale: Vec3) -> Self {
        Self::from_cols([
            [scale.x, 0.0, 0.0, 0.0],
            [0.0, scale.y, 0.0, 0.0],
            [0.0, 0.0, scale.z, 0.0],
            [0.0, 0.0, 0.0, 1.0],
        ])
    }

    pub fn from_translation(translation: Vec3) -> Self {
        Self::from_cols([
            [1.0, 0.0, 0.0, 0.0],
            [0.0, 1.0, 0.0, 0.0],
            [0.0, 0.0, 1.0, 0.0],
            [translation.x, translation.y, translation.z, 1.0],
        ])
    }

    /// Rotation about the X axis (right-handed, radians)
    pub fn from_rotation_x(angle: f32) -> Self {
        let (s, c) = angle.sin_cos();
        Self::from_cols([
            [1.0, 0.0, 0.0, 0.0],
            [0.0, c, s, 0.0],
            [0.0, -s, c, 0.0],
            [0.0, 0.0, 0.0, 1.0],
        ])
    }

    /// Rotation about the Y axis (right-handed, radians)
    pub fn from_rotation_y(angle: f32) -> Self {
        let (s, c) = angle.sin_cos();
        Self::from_cols([
            [c, 0.0, -s, 0.0],
            [0.0, 1.0, 0.0, 0.0],
            [s, 0.0, c, 0.0],
            [0.0, 0.0, 0.0, 1.0],
        ])
    }

    /// Rotation about the Z axis (right-handed, radians)
    pub fn from_rotation_z(angle: f32) -> Self {
        let (s, c) = angle.sin_cos();
        Self::from_cols([
            [c, s, 0.0, 0.0],
            [-s, c, 0.0, 0.0],
            [0.0, 0.0, 1.0, 0.0],
            [0.0, 0.0, 0.0, 1.0],
        ])
    }

    pub fn from_quat(rotation: Quat) -> Self {
        rotation.to_mat4()
    }

    /// `T * R * S`: scale, then rotate, then translate
    pub fn from_translation_rotation_scale(translation: Vec3, rotation: Quat, scale: Vec3) -> Self {
        let mut m = rotation.to_mat4();
        for (col, s) in m.cols.iter_mut().zip([scale.x, scale.y, scale.z]) {
            for v in col.iter_mut().take(3) {
                *v *= s;
            }
        }
        m.cols[3] = [translation.x, translation.y, translation.z, 1.0];
        m
    }

    /// Standard matrix product `self * rhs` (applies `rhs` first)
    pub fn mul_mat4(&self, rhs: &Mat4) -> Mat4 {
        let mut out = [[0.0f32; 4]; 4];
        for (col, out_col) in out.iter_mut().enumerate() {
            for (row, v) in out_col.iter_mut().enumerate() {
                *v = (0..4).map(|k| self.cols[k][row] * rhs.cols[col][k]).sum();
            }
        }
        Mat4 { cols: out }
    }

    /// Apply `first`, then `second`.
    ///
    /// Hierarchies compose local-to-parent before parent-to-world:
    /// `world = compose(local, parent_world)`.
    pub fn compose(first: &Mat4, second: &Mat4) -> Mat4 {
        second.mul_mat4(first)
    }

    pub fn transform_vec4(&self, v: Vec4) -> Vec4 {
        let input = v.to_array();
        let mut out = [0.0f32; 4];
        for (row, o) in out.iter_mut().enumerate() {
            *o = (0..4).map(|col| self.cols[col][row] * input[col]).sum();
        }
        Vec4::from_array(out)
    }

    /// Transform a position (w = 1); the result is not divided by w
    pub fn transform_point3(&self, p: Vec3) -> Vec3 {
        self.transform_vec4(Vec4::from_point(p)).xyz()
    }

    pub fn transpose(&self) -> Mat4 {
        let mut out = [[0.0f32; 4]; 4];
        for (col, out_col) in out.iter_mut().enumerate() {
            for (row, v) in out_col.iter_mut().enumerate() {
                *v = self.cols[row][col];
            }
        }
        Mat4 { cols: out }
    }

    pub fn translation(&self) -> Vec3 {
        Vec3::new(self.cols[3][0], self.cols[3][1], self.cols[3][2])
    }

    pub fn determinant(&self) -> f32 {
        let c = Cofactors::new(self);
        c.determinant()
    }

    /// Closed-form cofactor inverse.
    ///
    /// A singular matrix divides by a zero determinant and produces non-finite
    /// components; use [`Mat4::try_inverse`] where that must be detected.
    pub fn inverse(&self) -> Mat4 {
        let c = Cofactors::new(self);
        let inv_det = 1.0 / c.determinant();
        c.adjugate_scaled(inv_det)
    }

    /// Inverse, or `None` when the matrix is singular or non-finite
    pub fn try_inverse(&self) -> Option<Mat4> {
        let c = Cofactors::new(self);
        let det = c.determinant();
        if !det.is_finite() || det.abs() <= SINGULAR_EPSILON {
            return None;
        }
        let inv = c.adjugate_scaled(1.0 / det);
        inv.is_finite().then_some(inv)
    }

    pub fn is_finite(&self) -> bool {
        self.cols.iter().flatten().all(|v| v.is_finite())
    }

    pub fn approx_eq(&self, other: &Mat4, epsilon: f32) -> bool {
        self.cols
            .iter()
            .flatten()
            .zip(other.cols.iter().flatten())
            .all(|(a, b)| (a - b).abs() <= epsilon)
    }
}

impl Mul for Mat4 {
    type Output = Mat4;
    fn mul(self, rhs: Mat4) -> Mat4 {
        self.mul_mat4(&rhs)
    }
}

/// 2x2 sub-determinants shared by the determinant and the adjugate
struct Cofactors {
    a: [[f32; 4]; 4],
    s: [f32; 6],
    c: [f32; 6],
}

impl Cofactors {
    fn new(m: &Mat4) -> Self {
        // a[row][col]
        let a = m.transpose().cols;
        let s = [
            a[0][0] * a[1][1] - a[1][0] * a[0][1],
            a[0][0] * a[1][2] - a[1][0] * a[0][2],
            a[0][0] * a[1][3] - a[1][0] * a[0][3],
            a[0][1] * a[1][2] - a[1][1] * a[0][2],
            a[0][1] * a[1][3] - a[1][1] * a[0][3],
            a[0][2] * a[1][3] - a[1][2] * a[0][3],
        ];
        let c = [
            a[2][0] * a[3][1] - a[3][0] * a[2][1],
            a[2][0] * a[3][2] - a[3][0] * a[2][2],
            a[2][0] * a[3][3] - a[3][0] * a[2][3],
            a[2][1] * a[3][2] - a[3][1] * a[2][2],
            a[2][1] * a[3][3] - a[3][1] * a[2][3],
            a[2][2] * a[3][3] - a[3][2] * a[2][3],
        ];
        Self { a, s, c }
    }

    fn determinant(&self) -> f32 {
        let (s, c) = (&self.s, &self.c);
        s[0] * c[5] - s[1] * c[4] + s[2] * c[3] + s[3] * c[2] - s[4] * c[1] + s[5] * c[0]
    }

    fn adjugate_scaled(&self, k: f32) -> Mat4 {
        let (a, s, c) = (&self.a, &self.s, &self.c);
        // b[row][col]
        let b = [
            [
                a[1][1] * c[5] - a[1][2] * c[4] + a[1][3] * c[3],
                -a[0][1] * c[5] + a[0][2] * c[4] - a[0][3] * c[3],
                a[3][1] * s[5] - a[3][2] * s[4] + a[3][3] * s[3],
                -a[2][1] * s[5] + a[2][2] * s[4] - a[2][3] * s[3],
            ],
            [
                -a[1][0] * c[5] + a[1][2] * c[2] - a[1][3] * c[1],
                a[0][0] * c[5] - a[0][2] * c[2] + a[0][3] * c[1],
                -a[3][0] * s[5] + a[3][2] * s[2] - a[3][3] * s[1],
                a[2][0] * s[5] - a[2][2] * s[2] + a[2][3] * s[1],
            ],
            [
                a[1][0] * c[4] - a[1][1] * c[2] + a[1][3] * c[0],
                -a[0][0] * c[4] + a[0][1] * c[2] - a[0][3] * c[0],
                a[3][0] * s[4] - a[3][1] * s[2] + a[3][3] * s[0],
                -a[2][0] * s[4] + a[2][1] * s[2] - a[2][3] * s[0],
            ],
            [
                -a[1][0] * c[3] + a[1][1] * c[1] - a[1][2] * c[0],
                a[0][0] * c[3] - a[0][1] * c[1] + a[0][2] * c[0],
                -a[3][0] * s[3] + a[3][1] * s[1] - a[3][2] * s[0],
                a[2][0] * s[3] - a[2][1] * s[1] + a[2][2] * s[0],
            ],
        ];
        let mut out = Mat4::ZERO;
        for (row, b_row) in b.iter().enumerate() {
            for (col, v) in b_row.iter().enumerate() {
                out.cols[col][row] = v * k;
            }
        }
        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::f32::consts::FRAC_PI_2;

    fn sample_matrix() -> Mat4 {
        Mat4::from_translation_rotation_scale(
            Vec3::new(1.0, -2.0, 3.5),
            Quat::from_axis_angle(Vec3::new(1.0, 2.0, 0.5), 0.8),
            Vec3::new(2.0, 0.5, 1.5),
        )
    }

    #[test]
    fn layout_is_column_major() {
        let arr: [f32; 16] = std::array::from_fn(|i| i as f32 + 1.0);
        let m = Mat4::from_cols_array(&arr);
        assert_eq!(m.get(0, 0), 1.0);
        assert_eq!(m.get(0, 1), 5.0);
        assert_eq!(m.get(0, 3), 13.0);
        assert_eq!(m.to_cols_array(), arr);
    }

    #[test]
    fn translation_moves_points_not_directions() {
        let m = Mat4::from_translation(Vec3::new(1.0, 2.0, 3.0));
        let p = m.transform_point3(Vec3::ZERO);
        assert!(p.approx_eq(&Vec3::new(1.0, 2.0, 3.0), 1e-6));
        let d = m.transform_vec4(Vec4::from_direction(Vec3::X));
        assert!(d.xyz().approx_eq(&Vec3::X, 1e-6));
    }

    #[test]
    fn compose_applies_first_then_second() {
        let rotate = Mat4::from_rotation_z(FRAC_PI_2);
        let translate = Mat4::from_translation(Vec3::new(5.0, 0.0, 0.0));
        // Rotate X onto Y, then move along X
        let m = Mat4::compose(&rotate, &translate);
        let p = m.transform_point3(Vec3::X);
        assert!(p.approx_eq(&Vec3::new(5.0, 1.0, 0.0), 1e-5), "{:?}", p);
    }

    #[test]
    fn axis_rotations_are_right_handed() {
        let x = Mat4::from_rotation_x(FRAC_PI_2).transform_point3(Vec3::Y);
        assert!(x.approx_eq(&Vec3::Z, 1e-6));
        let y = Mat4::from_rotation_y(FRAC_PI_2).transform_point3(Vec3::Z);
        assert!(y.approx_eq(&Vec3::X, 1e-6));
        let z = Mat4::from_rotation_z(FRAC_PI_2).transform_point3(Vec3::X);
        assert!(z.approx_eq(&Vec3::Y, 1e-6));
    }

    #[test]
    fn scale_fills_diagonal() {
        let m = Mat4::from_scale(Vec3::new(2.0, 3.0, 4.0));
        assert_eq!(m.get(0, 0), 2.0);
        assert_eq!(m.get(1, 1), 3.0);
        assert_eq!(m.get(2, 2), 4.0);
        assert!((m.determinant() - 24.0).abs() < 1e-5);
    }

    #[test]
    fn inverse_of_translation_negates_offset() {
        let m = Mat4::from_translation(Vec3::new(0.0, 3.0, -1.0));
        let inv = m.inverse();
        assert!(inv.approx_eq(&Mat4::from_translation(Vec3::new(0.0, -3.0, 1.0)), 1e-6));
    }

    #[test]
    fn inverse_times_matrix_is_identity() {
        let m = sample_matrix();
        assert!((m * m.inverse()).approx_eq(&Mat4::IDENTITY, 1e-5));
        assert!((m.inverse() * m).approx_eq(&Mat4::IDENTITY, 1e-5));
    }

    #[test]
    fn inverse_matches_glam() {
        let m = sample_matrix();
        let ours = m.inverse();
        let theirs = glam::Mat4::from(m).inverse();
        assert!(ours.approx_eq(&Mat4::from(theirs), 1e-5));
        assert!((m.determinant() - glam::Mat4::from(m).determinant()).abs() < 1e-4);
    }

    #[test]
    fn singular_inverse_is_non_finite() {
        let flat = Mat4::from_scale(Vec3::new(1.0, 0.0, 1.0));
        assert!(!flat.inverse().is_finite());
        assert!(flat.try_inverse().is_none());
        assert!(Mat4::IDENTITY.try_inverse().is_some());
    }

    #[test]
    fn transpose_swaps_rows_and_columns() {
        let m = sample_matrix();
        let t = m.transpose();
        for row in 0..4 {
            for col in 0..4 {
                assert_eq!(m.get(row, col), t.get(col, row));
            }
        }
        assert_eq!(t.transpose(), m);
    }
}
