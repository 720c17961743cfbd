//! Minimal world-space geometry shared by tasks and controllers.

use serde::{Deserialize, Serialize};

/// A position or direction in world space.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Vec3 {
    pub x: f64,
    pub y: f64,
    pub z: f64,
}

impl Vec3 {
    pub const fn new(x: f64, y: f64, z: f64) -> Self {
        Self { x, y, z }
    }

    pub fn add(self, other: Vec3) -> Vec3 {
        Vec3::new(self.x + other.x, self.y + other.y, self.z + other.z)
    }

    pub fn sub(self, other: Vec3) -> Vec3 {
        Vec3::new(self.x - other.x, self.y - other.y, self.z - other.z)
    }

    pub fn scale(self, factor: f64) -> Vec3 {
        Vec3::new(self.x * factor, self.y * factor, self.z * factor)
    }

    pub fn length(self) -> f64 {
        self.squared_length().sqrt()
    }

    pub fn squared_length(self) -> f64 {
        self.x * self.x + self.y * self.y + self.z * self.z
    }

    /// Squared distance to another point. Distance comparisons throughout
    /// the crate are done in squared space to avoid the root.
    pub fn squared_distance(self, other: Vec3) -> f64 {
        self.sub(other).squared_length()
    }

    pub fn distance(self, other: Vec3) -> f64 {
        self.squared_distance(other).sqrt()
    }

    /// Unit vector in the same direction, or zero if this is zero.
    pub fn normalized(self) -> Vec3 {
        let len = self.length();
        if len == 0.0 {
            Vec3::default()
        } else {
            self.scale(1.0 / len)
        }
    }
}

impl std::fmt::Display for Vec3 {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "({:.2}, {:.2}, {:.2})", self.x, self.y, self.z)
    }
}

/// An integer block coordinate.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct BlockPos {
    pub x: i32,
    pub y: i32,
    pub z: i32,
}

impl BlockPos {
    pub const fn new(x: i32, y: i32, z: i32) -> Self {
        Self { x, y, z }
    }

    /// Block containing the given world-space point.
    pub fn of_floored(pos: Vec3) -> Self {
        Self {
            x: pos.x.floor() as i32,
            y: pos.y.floor() as i32,
            z: pos.z.floor() as i32,
        }
    }

    /// Center of this block in world space.
    pub fn center(self) -> Vec3 {
        Vec3::new(self.x as f64 + 0.5, self.y as f64 + 0.5, self.z as f64 + 0.5)
    }

    /// Bottom center of this block, where an actor stands on it.
    pub fn bottom_center(self) -> Vec3 {
        Vec3::new(self.x as f64 + 0.5, self.y as f64, self.z as f64 + 0.5)
    }

    pub fn up(self) -> Self {
        Self::new(self.x, self.y + 1, self.z)
    }

    pub fn down(self) -> Self {
        Self::new(self.x, self.y - 1, self.z)
    }

    pub fn offset(self, dx: i32, dy: i32, dz: i32) -> Self {
        Self::new(self.x + dx, self.y + dy, self.z + dz)
    }
}

impl std::fmt::Display for BlockPos {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "[{}, {}, {}]", self.x, self.y, self.z)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn squared_distance_matches_distance() {
        let a = Vec3::new(0.0, 0.0, 0.0);
        let b = Vec3::new(3.0, 4.0, 0.0);
        assert_eq!(a.squared_distance(b), 25.0);
        assert_eq!(a.distance(b), 5.0);
    }

    #[test]
    fn normalized_zero_is_zero() {
        assert_eq!(Vec3::default().normalized(), Vec3::default());
        let unit = Vec3::new(0.0, 0.0, 2.0).normalized();
        assert!((unit.length() - 1.0).abs() < 1e-9);
    }

    #[test]
    fn floored_block_and_centers() {
        let pos = BlockPos::of_floored(Vec3::new(1.9, -0.1, 3.2));
        assert_eq!(pos, BlockPos::new(1, -1, 3));
        assert_eq!(BlockPos::new(1, 2, 3).center(), Vec3::new(1.5, 2.5, 3.5));
        assert_eq!(BlockPos::new(1, 2, 3).bottom_center(), Vec3::new(1.5, 2.0, 3.5));
    }
}
