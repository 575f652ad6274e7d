//! Fundamental types shared by every navigation component.
//!
//! - [`WorldPoint`] / [`GridCoord`]: continuous vs. integer coordinates
//! - [`CellKey`]: packed cell identity for ledgers and sharing
//! - [`Bounds`]: axis-aligned world regions
//! - [`ObstacleField`]: the collision-query seam to the host environment
//! - [`SpatialNode`]: the position contract for agents and peers

mod bounds;
mod field;
mod point;

pub use bounds::Bounds;
pub use field::{ObstacleField, RectWorld, SpatialNode};
pub use point::{CellKey, GridCoord, WorldPoint, DIAGONAL_SIDES, NEIGHBOR_8};
