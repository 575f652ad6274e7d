//! Decentralized coverage sharing between nearby agents.
//!
//! No coordinator exists: each agent occasionally "opens a window" and
//! pushes a capped batch of its searched-cell keys to one randomly
//! chosen peer within radius. The receiver accepts or ignores the
//! batch based on its own obedience probability. Both probabilities
//! derive from a per-agent skill parameter, so capable agents both
//! teach and listen more.

use rand::rngs::SmallRng;
use rand::Rng;

use serde::{Deserialize, Serialize};

use crate::config::defaults;
use crate::core::{SpatialNode, WorldPoint};

/// Tunables governing when an agent shares and accepts coverage.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct GossipPolicy {
    /// Agent capability in [0, 1]; scales both probabilities
    #[serde(default = "defaults::skill")]
    pub skill: f32,

    /// Base probability of opening a share window per opportunity
    #[serde(default = "defaults::share_base")]
    pub share_base: f32,

    /// Base probability of accepting an incoming batch
    #[serde(default = "defaults::obedience_base")]
    pub obedience_base: f32,

    /// Maximum keys pushed per share window
    #[serde(default = "defaults::batch_cap")]
    pub batch_cap: usize,

    /// Maximum keys accepted per incoming batch
    #[serde(default = "defaults::ingest_cap")]
    pub ingest_cap: usize,

    /// Peers beyond this distance (meters) are never chosen
    #[serde(default = "defaults::peer_radius")]
    pub peer_radius: f32,
}

impl Default for GossipPolicy {
    fn default() -> Self {
        Self {
            skill: defaults::skill(),
            share_base: defaults::share_base(),
            obedience_base: defaults::obedience_base(),
            batch_cap: defaults::batch_cap(),
            ingest_cap: defaults::ingest_cap(),
            peer_radius: defaults::peer_radius(),
        }
    }
}

impl GossipPolicy {
    /// Probability of opening a share window this opportunity.
    pub fn share_probability(&self) -> f32 {
        (self.share_base * (0.5 + self.skill)).clamp(0.0, 1.0)
    }

    /// Probability of accepting an incoming batch.
    pub fn accept_probability(&self) -> f32 {
        (self.obedience_base * (0.5 + self.skill * 0.5)).clamp(0.0, 1.0)
    }

    /// Roll the share probability.
    pub fn open_share_window(&self, rng: &mut SmallRng) -> bool {
        rng.gen::<f32>() < self.share_probability()
    }
}

/// Index of a uniformly chosen peer within `radius` of `origin`, or
/// None when no peer is close enough.
pub fn pick_nearby_peer<P: SpatialNode>(
    origin: WorldPoint,
    peers: &[P],
    radius: f32,
    rng: &mut SmallRng,
) -> Option<usize> {
    let r2 = radius * radius;
    let nearby: Vec<usize> = peers
        .iter()
        .enumerate()
        .filter(|(_, p)| origin.distance_squared(&p.position()) <= r2)
        .map(|(i, _)| i)
        .collect();
    if nearby.is_empty() {
        None
    } else {
        Some(nearby[rng.gen_range(0..nearby.len())])
    }
}
