//! Axis-aligned bounding box for spatial operations.

use serde::{Deserialize, Serialize};

use super::point::WorldPoint;

/// Axis-aligned bounding box.
///
/// Represents a rectangular region in 2D world space: the navigable
/// extent of a grid, or the region argument of an invalidation call.
#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct Bounds {
    /// Minimum corner (smallest x and y values).
    pub min: WorldPoint,
    /// Maximum corner (largest x and y values).
    pub max: WorldPoint,
}

impl Bounds {
    /// Create a new bounding box from min and max corners.
    #[inline]
    pub const fn new(min: WorldPoint, max: WorldPoint) -> Self {
        Self { min, max }
    }

    /// Create an empty (invalid) bounding box.
    ///
    /// The empty bounds has min > max, so it will expand to fit any point.
    #[inline]
    pub fn empty() -> Self {
        Self {
            min: WorldPoint::new(f32::INFINITY, f32::INFINITY),
            max: WorldPoint::new(f32::NEG_INFINITY, f32::NEG_INFINITY),
        }
    }

    /// Check if the bounds are empty (invalid or zero-area).
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.min.x >= self.max.x || self.min.y >= self.max.y
    }

    /// Width of the bounding box (x extent).
    #[inline]
    pub fn width(&self) -> f32 {
        self.max.x - self.min.x
    }

    /// Height of the bounding box (y extent).
    #[inline]
    pub fn height(&self) -> f32 {
        self.max.y - self.min.y
    }

    /// Center of the bounding box.
    #[inline]
    pub fn center(&self) -> WorldPoint {
        WorldPoint::new(
            (self.min.x + self.max.x) * 0.5,
            (self.min.y + self.max.y) * 0.5,
        )
    }

    /// Check if a point is inside (min-inclusive, max-exclusive).
    #[inline]
    pub fn contains(&self, point: WorldPoint) -> bool {
        point.x >= self.min.x && point.x < self.max.x && point.y >= self.min.y && point.y < self.max.y
    }

    /// Grow the bounds to include a point.
    pub fn expand_to_include(&mut self, point: WorldPoint) {
        self.min.x = self.min.x.min(point.x);
        self.min.y = self.min.y.min(point.y);
        self.max.x = self.max.x.max(point.x);
        self.max.y = self.max.y.max(point.y);
    }

    /// Grow the bounds outward by a margin on every side.
    pub fn inflated(&self, margin: f32) -> Bounds {
        Bounds::new(
            WorldPoint::new(self.min.x - margin, self.min.y - margin),
            WorldPoint::new(self.max.x + margin, self.max.y + margin),
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_bounds() {
        let b = Bounds::empty();
        assert!(b.is_empty());
        assert!(!b.contains(WorldPoint::ZERO));
    }

    #[test]
    fn test_zero_area_is_empty() {
        let b = Bounds::new(WorldPoint::new(1.0, 1.0), WorldPoint::new(1.0, 5.0));
        assert!(b.is_empty());
    }

    #[test]
    fn test_contains() {
        let b = Bounds::new(WorldPoint::ZERO, WorldPoint::new(10.0, 8.0));
        assert!(b.contains(WorldPoint::new(5.0, 4.0)));
        assert!(b.contains(WorldPoint::ZERO));
        assert!(!b.contains(WorldPoint::new(10.0, 4.0))); // max-exclusive
        assert!(!b.contains(WorldPoint::new(-0.1, 4.0)));
    }

    #[test]
    fn test_expand_to_include() {
        let mut b = Bounds::empty();
        b.expand_to_include(WorldPoint::new(1.0, 1.0));
        b.expand_to_include(WorldPoint::new(-2.0, 3.0));
        assert_eq!(b.min, WorldPoint::new(-2.0, 1.0));
        assert_eq!(b.max, WorldPoint::new(1.0, 3.0));
    }

    #[test]
    fn test_inflated() {
        let b = Bounds::new(WorldPoint::ZERO, WorldPoint::new(2.0, 2.0)).inflated(1.0);
        assert_eq!(b.min, WorldPoint::new(-1.0, -1.0));
        assert_eq!(b.max, WorldPoint::new(3.0, 3.0));
    }
}
