//! Environment seams: the collision-query primitive and the spatial
//! node contract.
//!
//! Everything the navigation core knows about world geometry flows
//! through [`ObstacleField::disc_blocked`]. The host supplies an
//! implementation backed by whatever physics or geometry store it has;
//! the grid caches the answers.

use super::bounds::Bounds;
use super::point::WorldPoint;

/// Collision-query primitive over the obstacle geometry.
///
/// This is the single physical query the rest of the system is built
/// on, and the dominant cost center. Implementations should answer
/// quickly but may be arbitrarily expensive; [`crate::grid::NavGrid`]
/// caches results with a TTL so repeated queries are cheap.
pub trait ObstacleField {
    /// Does a disc of `radius` centered at `center` intersect any
    /// obstacle geometry?
    fn disc_blocked(&self, center: WorldPoint, radius: f32) -> bool;

    /// Navigable extent of the environment. Grid construction fails on
    /// empty bounds.
    fn bounds(&self) -> Bounds;
}

/// Anything that occupies a position in the world.
///
/// Peer selection for coverage gossip and other spatial lookups go
/// through this trait rather than poking at concrete agent types.
pub trait SpatialNode {
    /// Current world position.
    fn position(&self) -> WorldPoint;
}

impl SpatialNode for WorldPoint {
    #[inline]
    fn position(&self) -> WorldPoint {
        *self
    }
}

/// A minimal [`ObstacleField`] over axis-aligned rectangular obstacles.
///
/// Useful for tests, demos, and hosts whose geometry really is a pile
/// of boxes. The outer bounds are walled implicitly: a disc poking
/// outside them counts as blocked.
#[derive(Clone, Debug, Default)]
pub struct RectWorld {
    bounds: Bounds,
    obstacles: Vec<Bounds>,
}

impl RectWorld {
    /// Create an open world with the given outer bounds.
    pub fn new(bounds: Bounds) -> Self {
        Self {
            bounds,
            obstacles: Vec::new(),
        }
    }

    /// Add a rectangular obstacle.
    pub fn add_obstacle(&mut self, rect: Bounds) {
        self.obstacles.push(rect);
    }

    /// Number of obstacles.
    pub fn obstacle_count(&self) -> usize {
        self.obstacles.len()
    }

    fn disc_hits_rect(center: WorldPoint, radius: f32, rect: &Bounds) -> bool {
        // Strict interior overlap: a disc exactly tangent to the
        // rectangle edge still fits
        let cx = center.x.clamp(rect.min.x, rect.max.x);
        let cy = center.y.clamp(rect.min.y, rect.max.y);
        center.distance_squared(&WorldPoint::new(cx, cy)) < radius * radius
    }
}

impl ObstacleField for RectWorld {
    fn disc_blocked(&self, center: WorldPoint, radius: f32) -> bool {
        // Outer walls
        if center.x - radius < self.bounds.min.x
            || center.y - radius < self.bounds.min.y
            || center.x + radius > self.bounds.max.x
            || center.y + radius > self.bounds.max.y
        {
            return true;
        }
        self.obstacles
            .iter()
            .any(|rect| Self::disc_hits_rect(center, radius, rect))
    }

    fn bounds(&self) -> Bounds {
        self.bounds
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn open_world() -> RectWorld {
        RectWorld::new(Bounds::new(WorldPoint::ZERO, WorldPoint::new(10.0, 10.0)))
    }

    #[test]
    fn test_open_interior_is_free() {
        let world = open_world();
        assert!(!world.disc_blocked(WorldPoint::new(5.0, 5.0), 0.5));
    }

    #[test]
    fn test_outer_walls_block() {
        let world = open_world();
        assert!(world.disc_blocked(WorldPoint::new(0.2, 5.0), 0.5));
        assert!(world.disc_blocked(WorldPoint::new(5.0, 9.9), 0.5));
    }

    #[test]
    fn test_obstacle_blocks_disc_overlap() {
        let mut world = open_world();
        world.add_obstacle(Bounds::new(
            WorldPoint::new(4.0, 4.0),
            WorldPoint::new(6.0, 6.0),
        ));
        // Center inside the box
        assert!(world.disc_blocked(WorldPoint::new(5.0, 5.0), 0.1));
        // Disc grazing the edge
        assert!(world.disc_blocked(WorldPoint::new(6.3, 5.0), 0.4));
        // Clear of the box
        assert!(!world.disc_blocked(WorldPoint::new(7.0, 5.0), 0.4));
    }

    #[test]
    fn test_larger_disc_blocked_when_smaller_is() {
        let mut world = open_world();
        world.add_obstacle(Bounds::new(
            WorldPoint::new(4.0, 4.0),
            WorldPoint::new(6.0, 6.0),
        ));
        let probe = WorldPoint::new(6.5, 5.0);
        for r in [0.1f32, 0.3, 0.6, 1.0] {
            if world.disc_blocked(probe, r) {
                // Every larger radius must also be blocked
                assert!(world.disc_blocked(probe, r + 0.2));
            }
        }
    }
}
