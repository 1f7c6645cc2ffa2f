//! Math utilities and types
//!
//! Provides the vector types shared by the collision code and the
//! tolerances used wherever a float comparison has to survive rounding
//! error on box boundaries.

pub use nalgebra::{Vector2, Vector3};

/// 2D vector type
pub type Vec2 = Vector2<f32>;

/// 3D vector type
pub type Vec3 = Vector3<f32>;

/// Axis of a 3D coordinate system
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Axis {
    /// The X axis
    X,
    /// The Y axis
    Y,
    /// The Z axis
    Z,
}

impl Axis {
    /// Component index of this axis in a `Vec3`
    pub const fn index(self) -> usize {
        match self {
            Self::X => 0,
            Self::Y => 1,
            Self::Z => 2,
        }
    }
}

/// Math constants
pub mod constants {
    /// Default tolerance for geometric comparisons
    pub const EPSILON: f32 = 1.0e-3;

    /// Tolerance for determinants and near-zero denominators
    pub const DETERMINANT_EPSILON: f32 = 1.0e-6;
}
