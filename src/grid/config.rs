//! Walkability grid configuration.

use serde::{Deserialize, Serialize};

use crate::config::defaults;

/// NavGrid settings
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct NavGridConfig {
    /// Cell edge length in meters
    #[serde(default = "defaults::cell_size")]
    pub cell_size: f32,

    /// Minimum clearance radius every walkability probe uses, even when
    /// the caller asks for less
    #[serde(default = "defaults::base_radius")]
    pub base_radius: f32,

    /// Extra buffer added to `base_radius` for the baked (build-time)
    /// walkability pass
    #[serde(default = "defaults::baked_buffer")]
    pub baked_buffer: f32,

    /// Lifetime of cached walkability answers (seconds)
    #[serde(default = "defaults::cache_ttl_s")]
    pub cache_ttl_s: f64,

    /// Cells processed per prewarm tick
    #[serde(default = "defaults::prewarm_cells_per_tick")]
    pub prewarm_cells_per_tick: usize,
}

impl Default for NavGridConfig {
    fn default() -> Self {
        Self {
            cell_size: defaults::cell_size(),
            base_radius: defaults::base_radius(),
            baked_buffer: defaults::baked_buffer(),
            cache_ttl_s: defaults::cache_ttl_s(),
            prewarm_cells_per_tick: defaults::prewarm_cells_per_tick(),
        }
    }
}
