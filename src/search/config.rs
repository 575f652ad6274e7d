//! Search memory configuration.

use serde::{Deserialize, Serialize};

use crate::config::defaults;

/// Frontier and cone-marking settings
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct SearchConfig {
    /// Frontier candidates scored per `next_search_point` call
    #[serde(default = "defaults::candidate_batch")]
    pub candidate_batch: usize,

    /// Hops shorter than this are penalized (meters)
    #[serde(default = "defaults::min_hop_distance")]
    pub min_hop_distance: f32,

    /// Hops longer than this are penalized (meters)
    #[serde(default = "defaults::max_hop_distance")]
    pub max_hop_distance: f32,

    /// Penalty per meter under the minimum hop distance
    #[serde(default = "defaults::close_penalty")]
    pub close_penalty: f32,

    /// Penalty per meter over the maximum hop distance
    #[serde(default = "defaults::far_penalty")]
    pub far_penalty: f32,

    /// Random score jitter breaking ties between equal candidates
    #[serde(default = "defaults::score_jitter")]
    pub score_jitter: f32,

    /// Ring samples taken when reseeding an empty frontier
    #[serde(default = "defaults::ring_points")]
    pub ring_points: usize,

    /// Uniform interior samples taken when reseeding
    #[serde(default = "defaults::interior_points")]
    pub interior_points: usize,

    /// Search radius (meters) around the anchor at plan start
    #[serde(default = "defaults::initial_radius")]
    pub initial_radius: f32,

    /// Radius multiplier applied on each reseed
    #[serde(default = "defaults::radius_growth")]
    pub radius_growth: f32,

    /// Radius growth ceiling (meters)
    #[serde(default = "defaults::max_radius")]
    pub max_radius: f32,

    /// Rays swept by the budgeted cone-marking tier
    #[serde(default = "defaults::cone_rays")]
    pub cone_rays: usize,
}

impl Default for SearchConfig {
    fn default() -> Self {
        Self {
            candidate_batch: defaults::candidate_batch(),
            min_hop_distance: defaults::min_hop_distance(),
            max_hop_distance: defaults::max_hop_distance(),
            close_penalty: defaults::close_penalty(),
            far_penalty: defaults::far_penalty(),
            score_jitter: defaults::score_jitter(),
            ring_points: defaults::ring_points(),
            interior_points: defaults::interior_points(),
            initial_radius: defaults::initial_radius(),
            radius_growth: defaults::radius_growth(),
            max_radius: defaults::max_radius(),
            cone_rays: defaults::cone_rays(),
        }
    }
}
