//! Geometry utilities.
//!
//! World-space vectors, the distance flavours the agent compares against
//! its thresholds (horizontal, vertical, full 3D), look angles, and a small
//! dense linear solver used by the position estimator.
//!
//! Unlike a lockstep simulation, the agent consumes floating-point range
//! measurements from its host, so all geometry here is `f64`. Determinism is
//! preserved by never depending on iteration order or system randomness.

use serde::{Deserialize, Serialize};

use crate::error::{AgentError, Result};

/// Relative pivot tolerance for [`solve_linear_system`].
///
/// A pivot smaller than `PIVOT_EPSILON * max|a_ij|` is treated as zero.
pub const PIVOT_EPSILON: f64 = 1e-9;

/// 3D world-space vector.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Vec3 {
    /// X coordinate.
    pub x: f64,
    /// Y coordinate.
    pub y: f64,
    /// Z coordinate (up).
    pub z: f64,
}

impl Vec3 {
    /// Zero vector.
    pub const ZERO: Self = Self::new(0.0, 0.0, 0.0);

    /// Unit up vector.
    pub const UP: Self = Self::new(0.0, 0.0, 1.0);

    /// Create a new vector.
    #[must_use]
    pub const fn new(x: f64, y: f64, z: f64) -> Self {
        Self { x, y, z }
    }

    /// Horizontal (XY-plane) distance.
    #[must_use]
    pub fn distance_2d(self, other: Self) -> f64 {
        let dx = self.x - other.x;
        let dy = self.y - other.y;
        (dx * dx + dy * dy).sqrt()
    }

    /// Absolute vertical distance.
    #[must_use]
    pub fn distance_z(self, other: Self) -> f64 {
        (self.z - other.z).abs()
    }

    /// Full 3D distance.
    #[must_use]
    pub fn distance(self, other: Self) -> f64 {
        (self - other).length()
    }

    /// Squared length.
    #[must_use]
    pub fn length_squared(self) -> f64 {
        self.dot(self)
    }

    /// Length.
    #[must_use]
    pub fn length(self) -> f64 {
        self.length_squared().sqrt()
    }

    /// Dot product.
    #[must_use]
    pub fn dot(self, other: Self) -> f64 {
        self.x * other.x + self.y * other.y + self.z * other.z
    }

    /// Unit vector in the same direction, or zero for a zero vector.
    #[must_use]
    pub fn normalize(self) -> Self {
        let len = self.length();
        if len <= f64::EPSILON {
            return Self::ZERO;
        }
        self * (1.0 / len)
    }

    /// Same vector with its Z component dropped.
    #[must_use]
    pub fn flattened(self) -> Self {
        Self::new(self.x, self.y, 0.0)
    }

    /// True if every component is finite.
    #[must_use]
    pub fn is_finite(self) -> bool {
        self.x.is_finite() && self.y.is_finite() && self.z.is_finite()
    }
}

impl std::ops::Add for Vec3 {
    type Output = Self;

    fn add(self, rhs: Self) -> Self::Output {
        Self::new(self.x + rhs.x, self.y + rhs.y, self.z + rhs.z)
    }
}

impl std::ops::Sub for Vec3 {
    type Output = Self;

    fn sub(self, rhs: Self) -> Self::Output {
        Self::new(self.x - rhs.x, self.y - rhs.y, self.z - rhs.z)
    }
}

impl std::ops::Mul<f64> for Vec3 {
    type Output = Self;

    fn mul(self, rhs: f64) -> Self::Output {
        Self::new(self.x * rhs, self.y * rhs, self.z * rhs)
    }
}

impl std::ops::Neg for Vec3 {
    type Output = Self;

    fn neg(self) -> Self::Output {
        Self::new(-self.x, -self.y, -self.z)
    }
}

/// Facing angles in degrees.
///
/// `pitch` follows the usual shooter convention: positive looks down.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct LookAngles {
    /// Heading around the Z axis, in degrees.
    pub yaw: f64,
    /// Elevation, positive is downward, in degrees.
    pub pitch: f64,
}

/// Compute the look angles from `from` toward `to`.
#[must_use]
pub fn look_angles(from: Vec3, to: Vec3) -> LookAngles {
    let d = to - from;
    let horizontal = (d.x * d.x + d.y * d.y).sqrt();
    LookAngles {
        yaw: d.y.atan2(d.x).to_degrees(),
        pitch: (-d.z).atan2(horizontal).to_degrees(),
    }
}

/// Solve the 3×3 system `a · x = b`.
///
/// Gaussian elimination with partial pivoting: at each step the row with
/// the largest-magnitude entry in the pivot column is swapped up, then
/// back-substitution recovers `x`.
///
/// # Errors
///
/// Returns [`AgentError::SingularSystem`] if a pivot falls below
/// [`PIVOT_EPSILON`] relative to the largest coefficient, or if any input is
/// not finite.
pub fn solve_linear_system(mut a: [[f64; 3]; 3], mut b: [f64; 3]) -> Result<[f64; 3]> {
    let scale = a
        .iter()
        .flatten()
        .fold(0.0_f64, |acc, v| acc.max(v.abs()));
    if !scale.is_finite() || scale == 0.0 || b.iter().any(|v| !v.is_finite()) {
        return Err(AgentError::SingularSystem {
            column: 0,
            pivot: 0.0,
        });
    }
    let tolerance = PIVOT_EPSILON * scale;

    for col in 0..3 {
        let pivot_row = (col..3)
            .max_by(|&i, &j| a[i][col].abs().total_cmp(&a[j][col].abs()))
            .unwrap_or(col);
        let pivot = a[pivot_row][col].abs();
        if pivot < tolerance {
            return Err(AgentError::SingularSystem { column: col, pivot });
        }
        if pivot_row != col {
            a.swap(pivot_row, col);
            b.swap(pivot_row, col);
        }

        for row in (col + 1)..3 {
            let factor = a[row][col] / a[col][col];
            for k in col..3 {
                a[row][k] -= factor * a[col][k];
            }
            b[row] -= factor * b[col];
        }
    }

    let mut x = [0.0; 3];
    for row in (0..3).rev() {
        let tail: f64 = ((row + 1)..3).map(|k| a[row][k] * x[k]).sum();
        x[row] = (b[row] - tail) / a[row][row];
    }
    Ok(x)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn approx(a: f64, b: f64) -> bool {
        (a - b).abs() < 1e-9
    }

    #[test]
    fn test_distances() {
        let a = Vec3::new(0.0, 0.0, 0.0);
        let b = Vec3::new(3.0, 4.0, 12.0);
        assert!(approx(a.distance_2d(b), 5.0));
        assert!(approx(a.distance_z(b), 12.0));
        assert!(approx(a.distance(b), 13.0));
    }

    #[test]
    fn test_normalize_zero() {
        assert_eq!(Vec3::ZERO.normalize(), Vec3::ZERO);
        let n = Vec3::new(0.0, 3.0, 4.0).normalize();
        assert!(approx(n.length(), 1.0));
    }

    #[test]
    fn test_look_angles() {
        let from = Vec3::ZERO;
        let east = look_angles(from, Vec3::new(10.0, 0.0, 0.0));
        assert!(approx(east.yaw, 0.0));
        assert!(approx(east.pitch, 0.0));

        let north = look_angles(from, Vec3::new(0.0, 10.0, 0.0));
        assert!(approx(north.yaw, 90.0));

        let below = look_angles(from, Vec3::new(10.0, 0.0, -10.0));
        assert!(approx(below.pitch, 45.0));
    }

    #[test]
    fn test_solve_identity() {
        let a = [[1.0, 0.0, 0.0], [0.0, 1.0, 0.0], [0.0, 0.0, 1.0]];
        let x = solve_linear_system(a, [1.0, 2.0, 3.0]).unwrap();
        assert_eq!(x, [1.0, 2.0, 3.0]);
    }

    #[test]
    fn test_solve_needs_pivoting() {
        // Zero in the leading position forces a row swap.
        let a = [[0.0, 2.0, 1.0], [1.0, 1.0, 1.0], [2.0, 1.0, 3.0]];
        let expected = [1.0, -2.0, 3.0];
        let b = [
            a[0][0] * expected[0] + a[0][1] * expected[1] + a[0][2] * expected[2],
            a[1][0] * expected[0] + a[1][1] * expected[1] + a[1][2] * expected[2],
            a[2][0] * expected[0] + a[2][1] * expected[1] + a[2][2] * expected[2],
        ];
        let x = solve_linear_system(a, b).unwrap();
        for (got, want) in x.iter().zip(expected) {
            assert!(approx(*got, want), "got {got}, want {want}");
        }
    }

    #[test]
    fn test_solve_singular() {
        let a = [[1.0, 2.0, 3.0], [2.0, 4.0, 6.0], [1.0, 0.0, 1.0]];
        let err = solve_linear_system(a, [1.0, 2.0, 3.0]).unwrap_err();
        assert!(matches!(err, AgentError::SingularSystem { .. }));
    }

    #[test]
    fn test_solve_zero_matrix() {
        let err = solve_linear_system([[0.0; 3]; 3], [0.0; 3]).unwrap_err();
        assert!(matches!(err, AgentError::SingularSystem { column: 0, .. }));
    }
}
