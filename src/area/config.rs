//! Area graph configuration.

use serde::{Deserialize, Serialize};

use crate::config::defaults;

/// AreaGraph settings
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct AreaGraphConfig {
    /// Clearance radius the topology is sampled at
    #[serde(default = "defaults::area_clearance")]
    pub clearance: f32,

    /// A cell is a portal candidate when its narrower axis free-run is
    /// at most this many cells
    #[serde(default = "defaults::portal_max_width")]
    pub portal_max_width: i32,

    /// ...and its longer axis free-run is at least this many cells.
    /// Filters out single-cell pinches and small pockets that are not
    /// real chokepoints.
    #[serde(default = "defaults::portal_min_run")]
    pub portal_min_run: i32,

    /// Expansion cap for `nearest_unsearched` breadth-first search
    #[serde(default = "defaults::bfs_expansion_cap")]
    pub bfs_expansion_cap: usize,
}

impl Default for AreaGraphConfig {
    fn default() -> Self {
        Self {
            clearance: defaults::area_clearance(),
            portal_max_width: defaults::portal_max_width(),
            portal_min_run: defaults::portal_min_run(),
            bfs_expansion_cap: defaults::bfs_expansion_cap(),
        }
    }
}
