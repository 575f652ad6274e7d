//! Path planner configuration.

use serde::{Deserialize, Serialize};

use crate::config::defaults;

/// A* planner settings
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct PlannerConfig {
    /// Heuristic scale; 1.0 keeps A* admissible, higher trades path
    /// quality for fewer expansions
    #[serde(default = "defaults::heuristic_weight")]
    pub heuristic_weight: f32,

    /// Hard cap on expanded nodes per query; exhaustion fails the query
    #[serde(default = "defaults::max_nodes_per_path")]
    pub max_nodes_per_path: usize,

    /// Ring radius (cells) searched when snapping an endpoint to the
    /// nearest walkable cell
    #[serde(default = "defaults::snap_radius_cells")]
    pub snap_radius_cells: i32,
}

impl Default for PlannerConfig {
    fn default() -> Self {
        Self {
            heuristic_weight: defaults::heuristic_weight(),
            max_nodes_per_path: defaults::max_nodes_per_path(),
            snap_radius_cells: defaults::snap_radius_cells(),
        }
    }
}
