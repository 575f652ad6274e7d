//! Point and coordinate types for the navigation grid.

use serde::{Deserialize, Serialize};
use std::ops::{Add, Mul, Sub};

/// Packed cell identity: `(gx, gy)` folded into a single `u64`.
///
/// Used wherever cells are stored in sets or shipped between agents
/// (search ledgers, gossip batches). Pack/unpack via
/// [`GridCoord::key`] and [`GridCoord::from_key`].
pub type CellKey = u64;

/// Offsets of the 8 compass neighbors. The first four entries are the
/// cardinals; slots 4..8 are the diagonals. Neighbor-mask bits follow
/// this order.
pub const NEIGHBOR_8: [(i32, i32); 8] = [
    (0, 1),   // N
    (1, 0),   // E
    (0, -1),  // S
    (-1, 0),  // W
    (1, 1),   // NE
    (1, -1),  // SE
    (-1, -1), // SW
    (-1, 1),  // NW
];

/// For each diagonal slot (4..8), the two cardinal slots it passes
/// between. A diagonal step is only legal when both of these side
/// cells are walkable.
pub const DIAGONAL_SIDES: [(usize, usize); 4] = [
    (0, 1), // NE cuts between N and E
    (1, 2), // SE cuts between E and S
    (2, 3), // SW cuts between S and W
    (3, 0), // NW cuts between W and N
];

/// Grid coordinates (integer cell indices)
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub struct GridCoord {
    /// X coordinate (column index)
    pub x: i32,
    /// Y coordinate (row index)
    pub y: i32,
}

impl GridCoord {
    /// Create a new grid coordinate
    #[inline]
    pub fn new(x: i32, y: i32) -> Self {
        Self { x, y }
    }

    /// Pack into a [`CellKey`]
    #[inline]
    pub fn key(&self) -> CellKey {
        ((self.x as u32 as u64) << 32) | (self.y as u32 as u64)
    }

    /// Unpack from a [`CellKey`]
    #[inline]
    pub fn from_key(key: CellKey) -> Self {
        Self {
            x: (key >> 32) as u32 as i32,
            y: key as u32 as i32,
        }
    }

    /// Manhattan distance to another coordinate
    #[inline]
    pub fn manhattan_distance(&self, other: &GridCoord) -> i32 {
        (self.x - other.x).abs() + (self.y - other.y).abs()
    }

    /// Chebyshev distance (max of x and y distance) - used for 8-connected grids
    #[inline]
    pub fn chebyshev_distance(&self, other: &GridCoord) -> i32 {
        (self.x - other.x).abs().max((self.y - other.y).abs())
    }

    /// Neighbor in compass slot `i` (see [`NEIGHBOR_8`])
    #[inline]
    pub fn neighbor(&self, slot: usize) -> GridCoord {
        let (dx, dy) = NEIGHBOR_8[slot];
        GridCoord::new(self.x + dx, self.y + dy)
    }

    /// Get the 4 cardinal neighbors (N, E, S, W)
    #[inline]
    pub fn neighbors_4(&self) -> [GridCoord; 4] {
        [
            GridCoord::new(self.x, self.y + 1),
            GridCoord::new(self.x + 1, self.y),
            GridCoord::new(self.x, self.y - 1),
            GridCoord::new(self.x - 1, self.y),
        ]
    }

    /// Get the 8 compass neighbors, cardinals first
    #[inline]
    pub fn neighbors_8(&self) -> [GridCoord; 8] {
        let mut out = [GridCoord::default(); 8];
        for (i, (dx, dy)) in NEIGHBOR_8.iter().enumerate() {
            out[i] = GridCoord::new(self.x + dx, self.y + dy);
        }
        out
    }
}

impl Add for GridCoord {
    type Output = Self;

    #[inline]
    fn add(self, other: Self) -> Self {
        GridCoord::new(self.x + other.x, self.y + other.y)
    }
}

impl Sub for GridCoord {
    type Output = Self;

    #[inline]
    fn sub(self, other: Self) -> Self {
        GridCoord::new(self.x - other.x, self.y - other.y)
    }
}

/// World coordinates (meters, f32)
#[derive(Clone, Copy, Debug, PartialEq, Default, Serialize, Deserialize)]
pub struct WorldPoint {
    /// X coordinate in meters
    pub x: f32,
    /// Y coordinate in meters
    pub y: f32,
}

impl WorldPoint {
    /// Create a new world point
    #[inline]
    pub fn new(x: f32, y: f32) -> Self {
        Self { x, y }
    }

    /// Zero point (origin)
    pub const ZERO: WorldPoint = WorldPoint { x: 0.0, y: 0.0 };

    /// Euclidean distance to another point
    #[inline]
    pub fn distance(&self, other: &WorldPoint) -> f32 {
        let dx = self.x - other.x;
        let dy = self.y - other.y;
        (dx * dx + dy * dy).sqrt()
    }

    /// Squared distance (faster, avoids sqrt)
    #[inline]
    pub fn distance_squared(&self, other: &WorldPoint) -> f32 {
        let dx = self.x - other.x;
        let dy = self.y - other.y;
        dx * dx + dy * dy
    }

    /// Angle from this point to another (radians, CCW from +X)
    #[inline]
    pub fn angle_to(&self, other: &WorldPoint) -> f32 {
        let dx = other.x - self.x;
        let dy = other.y - self.y;
        dy.atan2(dx)
    }

    /// Create a point at a given angle and distance from this point
    #[inline]
    pub fn point_at(&self, angle: f32, distance: f32) -> WorldPoint {
        WorldPoint::new(
            self.x + distance * angle.cos(),
            self.y + distance * angle.sin(),
        )
    }

    /// Length (magnitude) of this point as a vector from origin
    #[inline]
    pub fn length(&self) -> f32 {
        (self.x * self.x + self.y * self.y).sqrt()
    }

    /// Normalize to unit length
    #[inline]
    pub fn normalize(&self) -> WorldPoint {
        let len = self.length();
        if len > 0.0 {
            WorldPoint::new(self.x / len, self.y / len)
        } else {
            *self
        }
    }

    /// Dot product with another point (as vectors)
    #[inline]
    pub fn dot(&self, other: &WorldPoint) -> f32 {
        self.x * other.x + self.y * other.y
    }
}

impl Add for WorldPoint {
    type Output = Self;

    #[inline]
    fn add(self, other: Self) -> Self {
        WorldPoint::new(self.x + other.x, self.y + other.y)
    }
}

impl Sub for WorldPoint {
    type Output = Self;

    #[inline]
    fn sub(self, other: Self) -> Self {
        WorldPoint::new(self.x - other.x, self.y - other.y)
    }
}

impl Mul<f32> for WorldPoint {
    type Output = Self;

    #[inline]
    fn mul(self, scalar: f32) -> Self {
        WorldPoint::new(self.x * scalar, self.y * scalar)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_key_roundtrip() {
        for coord in [
            GridCoord::new(0, 0),
            GridCoord::new(17, 42),
            GridCoord::new(-3, 9),
            GridCoord::new(-1000, -1000),
        ] {
            assert_eq!(GridCoord::from_key(coord.key()), coord);
        }
    }

    #[test]
    fn test_key_distinct() {
        // (1, 0) and (0, 1) must not collide
        assert_ne!(GridCoord::new(1, 0).key(), GridCoord::new(0, 1).key());
    }

    #[test]
    fn test_neighbor_slots_match_table() {
        let c = GridCoord::new(5, 5);
        for slot in 0..8 {
            let (dx, dy) = NEIGHBOR_8[slot];
            assert_eq!(c.neighbor(slot), GridCoord::new(5 + dx, 5 + dy));
        }
    }

    #[test]
    fn test_diagonal_sides_are_adjacent_cardinals() {
        let c = GridCoord::new(0, 0);
        for (diag, (a, b)) in DIAGONAL_SIDES.iter().enumerate() {
            let target = c.neighbor(diag + 4);
            let side_a = c.neighbor(*a);
            let side_b = c.neighbor(*b);
            // The diagonal target is exactly one step from each side cell
            assert_eq!(target.chebyshev_distance(&side_a), 1);
            assert_eq!(target.chebyshev_distance(&side_b), 1);
        }
    }

    #[test]
    fn test_world_point_distance() {
        let a = WorldPoint::new(0.0, 0.0);
        let b = WorldPoint::new(3.0, 4.0);
        assert!((a.distance(&b) - 5.0).abs() < 1e-6);
    }

    #[test]
    fn test_world_point_angle() {
        let origin = WorldPoint::ZERO;
        let east = WorldPoint::new(1.0, 0.0);
        let north = WorldPoint::new(0.0, 1.0);

        assert!((origin.angle_to(&east) - 0.0).abs() < 1e-6);
        assert!((origin.angle_to(&north) - std::f32::consts::FRAC_PI_2).abs() < 1e-6);
    }

    #[test]
    fn test_point_at_inverts_angle() {
        let origin = WorldPoint::new(2.0, -1.0);
        let p = origin.point_at(1.1, 3.0);
        assert!((origin.distance(&p) - 3.0).abs() < 1e-5);
        assert!((origin.angle_to(&p) - 1.1).abs() < 1e-5);
    }
}
