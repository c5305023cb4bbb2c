//! Map-space points and the small amount of vector math generation needs.
use serde::{Deserialize, Serialize};

/// A point in map space. `z` is altitude for air waypoints and zero on the ground.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Point {
    pub x: f64,
    pub y: f64,
    #[serde(default)]
    pub z: f64,
}

impl Point {
    #[must_use]
    pub const fn new(x: f64, y: f64, z: f64) -> Self {
        Self { x, y, z }
    }

    #[must_use]
    pub const fn ground(x: f64, y: f64) -> Self {
        Self { x, y, z: 0.0 }
    }

    #[must_use]
    pub fn distance(&self, other: &Self) -> f64 {
        let dz = self.z - other.z;
        self.planar_distance(other).hypot(dz)
    }

    #[must_use]
    pub fn planar_distance(&self, other: &Self) -> f64 {
        (self.x - other.x).hypot(self.y - other.y)
    }

    #[must_use]
    pub const fn with_altitude(self, z: f64) -> Self {
        Self { z, ..self }
    }

    /// Linear interpolation in the map plane, keeping `self.z`.
    #[must_use]
    pub fn lerp(&self, other: &Self, t: f64) -> Self {
        Self {
            x: (other.x - self.x).mul_add(t, self.x),
            y: (other.y - self.y).mul_add(t, self.y),
            z: self.z,
        }
    }

    #[must_use]
    pub fn offset(&self, direction: Vector2, distance: f64) -> Self {
        Self {
            x: direction.x.mul_add(distance, self.x),
            y: direction.y.mul_add(distance, self.y),
            z: self.z,
        }
    }

    /// Planar vector from `self` towards `other`.
    #[must_use]
    pub fn towards(&self, other: &Self) -> Vector2 {
        Vector2 {
            x: other.x - self.x,
            y: other.y - self.y,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Vector2 {
    pub x: f64,
    pub y: f64,
}

impl Vector2 {
    #[must_use]
    pub const fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }

    #[must_use]
    pub fn length(self) -> f64 {
        self.x.hypot(self.y)
    }

    /// Unit vector in the same direction; the zero vector stays zero.
    #[must_use]
    pub fn normalized(self) -> Self {
        let len = self.length();
        if len <= f64::EPSILON {
            return Self::default();
        }
        Self {
            x: self.x / len,
            y: self.y / len,
        }
    }

    /// Left-hand normal.
    #[must_use]
    pub const fn perpendicular(self) -> Self {
        Self {
            x: -self.y,
            y: self.x,
        }
    }

    #[must_use]
    pub fn add(self, other: Self) -> Self {
        Self {
            x: self.x + other.x,
            y: self.y + other.y,
        }
    }
}
