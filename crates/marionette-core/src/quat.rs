//! Rotation quaternions (xyzw)

use crate::mat4::Mat4;
use crate::types::{lerp, Vec3};
use serde::{Deserialize, Serialize};
use std::ops::Neg;

/// A rotation quaternion stored as `x, y, z, w`
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct Quat {
    pub x: f32,
    pub y: f32,
    pub z: f32,
    pub w: f32,
}

impl Default for Quat {
    fn default() -> Self {
        Self::IDENTITY
    }
}

impl Quat {
    pub const IDENTITY: Self = Self {
        x: 0.0,
        y: 0.0,
        z: 0.0,
        w: 1.0,
    };

    /// Build a quaternion and normalize it.
    /// A zero quaternion is left as is.
    pub fn new(x: f32, y: f32, z: f32, w: f32) -> Self {
        let mut q = Self::from_xyzw(x, y, z, w);
        q.normalize();
        q
    }

    /// Build a quaternion without normalizing
    pub const fn from_xyzw(x: f32, y: f32, z: f32, w: f32) -> Self {
        Self { x, y, z, w }
    }

    pub fn from_array(arr: [f32; 4]) -> Self {
        Self::new(arr[0], arr[1], arr[2], arr[3])
    }

    pub fn to_array(&self) -> [f32; 4] {
        [self.x, self.y, self.z, self.w]
    }

    /// Rotation of `angle` radians about `axis` (need not be unit length)
    pub fn from_axis_angle(axis: Vec3, angle: f32) -> Self {
        let axis = axis.normalized();
        let (s, c) = (angle * 0.5).sin_cos();
        Self::new(axis.x * s, axis.y * s, axis.z * s, c)
    }

    pub fn length(&self) -> f32 {
        self.dot(self).sqrt()
    }

    pub fn normalize(&mut self) {
        let magnitude = self.length();
        if magnitude > 0.0 {
            self.x /= magnitude;
            self.y /= magnitude;
            self.z /= magnitude;
            self.w /= magnitude;
        }
    }

    pub fn normalized(mut self) -> Self {
        self.normalize();
        self
    }

    pub fn dot(&self, other: &Self) -> f32 {
        self.x * other.x + self.y * other.y + self.z * other.z + self.w * other.w
    }

    pub fn is_finite(&self) -> bool {
        self.x.is_finite() && self.y.is_finite() && self.z.is_finite() && self.w.is_finite()
    }

    /// True when both quaternions describe the same rotation (`q` and `-q` match)
    pub fn same_rotation(&self, other: &Self, epsilon: f32) -> bool {
        (self.dot(other).abs() - 1.0).abs() <= epsilon
    }

    /// Rotation matrix for a unit quaternion
    pub fn to_mat4(&self) -> Mat4 {
        let (x, y, z, w) = (self.x, self.y, self.z, self.w);
        let xx = x * x;
        let xy = x * y;
        let xz = x * z;
        let xw = x * w;
        let yy = y * y;
        let yz = y * z;
        let yw = y * w;
        let zz = z * z;
        let zw = z * w;

        // Column-major: m[col][row]
        Mat4::from_cols([
            [1.0 - 2.0 * (yy + zz), 2.0 * (xy + zw), 2.0 * (xz - yw), 0.0],
            [2.0 * (xy - zw), 1.0 - 2.0 * (xx + zz), 2.0 * (yz + xw), 0.0],
            [2.0 * (xz + yw), 2.0 * (yz - xw), 1.0 - 2.0 * (xx + yy), 0.0],
            [0.0, 0.0, 0.0, 1.0],
        ])
    }

    /// Extract the rotation of the upper 3x3 block.
    ///
    /// When the trace is positive the direct formula is used; otherwise the
    /// branch is keyed on the largest diagonal element so the divisor stays
    /// away from zero.
    pub fn from_mat4(m: &Mat4) -> Self {
        let m00 = m.get(0, 0);
        let m11 = m.get(1, 1);
        let m22 = m.get(2, 2);
        let trace = m00 + m11 + m22;

        if trace > 0.0 {
            let w4 = (trace + 1.0).sqrt() * 2.0;
            Self::new(
                (m.get(2, 1) - m.get(1, 2)) / w4,
                (m.get(0, 2) - m.get(2, 0)) / w4,
                (m.get(1, 0) - m.get(0, 1)) / w4,
                w4 / 4.0,
            )
        } else if m00 > m11 && m00 > m22 {
            let x4 = (1.0 + m00 - m11 - m22).sqrt() * 2.0;
            Self::new(
                x4 / 4.0,
                (m.get(0, 1) + m.get(1, 0)) / x4,
                (m.get(0, 2) + m.get(2, 0)) / x4,
                (m.get(2, 1) - m.get(1, 2)) / x4,
            )
        } else if m11 > m22 {
            let y4 = (1.0 + m11 - m00 - m22).sqrt() * 2.0;
            Self::new(
                (m.get(0, 1) + m.get(1, 0)) / y4,
                y4 / 4.0,
                (m.get(1, 2) + m.get(2, 1)) / y4,
                (m.get(0, 2) - m.get(2, 0)) / y4,
            )
        } else {
            let z4 = (1.0 + m22 - m00 - m11).sqrt() * 2.0;
            Self::new(
                (m.get(0, 2) + m.get(2, 0)) / z4,
                (m.get(1, 2) + m.get(2, 1)) / z4,
                z4 / 4.0,
                (m.get(1, 0) - m.get(0, 1)) / z4,
            )
        }
    }

    /// Normalized component-wise lerp along the shorter arc.
    ///
    /// This approximates slerp: the angular speed is not constant across `step`,
    /// but the endpoints and the path are the same.
    pub fn interpolate(a: &Quat, b: &Quat, step: f32) -> Quat {
        let b = if a.dot(b) < 0.0 { -*b } else { *b };
        Quat::new(
            lerp(a.x, b.x, step),
            lerp(a.y, b.y, step),
            lerp(a.z, b.z, step),
            lerp(a.w, b.w, step),
        )
    }
}

impl Neg for Quat {
    type Output = Self;
    fn neg(self) -> Self {
        Self::from_xyzw(-self.x, -self.y, -self.z, -self.w)
    }
}
