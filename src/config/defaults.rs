//! Default value functions for serde deserialization.

// ── grid ────────────────────────────────────────────────────────────

pub fn cell_size() -> f32 {
    0.5
}

pub fn base_radius() -> f32 {
    0.3
}

pub fn baked_buffer() -> f32 {
    0.2
}

pub fn cache_ttl_s() -> f64 {
    3.0
}

pub fn prewarm_cells_per_tick() -> usize {
    64
}

// ── area graph ──────────────────────────────────────────────────────

pub fn area_clearance() -> f32 {
    0.3
}

pub fn portal_max_width() -> i32 {
    2
}

pub fn portal_min_run() -> i32 {
    3
}

pub fn bfs_expansion_cap() -> usize {
    2048
}

// ── planner ─────────────────────────────────────────────────────────

pub fn heuristic_weight() -> f32 {
    1.0
}

pub fn max_nodes_per_path() -> usize {
    2048
}

pub fn snap_radius_cells() -> i32 {
    3
}

// ── scheduler ───────────────────────────────────────────────────────

pub fn slot_count() -> usize {
    16
}

pub fn requests_per_second() -> f64 {
    60.0
}

pub fn burst_cap() -> u32 {
    8
}

pub fn tick_budget_ms() -> f64 {
    2.0
}

pub fn max_dispatches_per_tick() -> usize {
    8
}

pub fn pressure_threshold() -> f32 {
    0.8
}

pub fn prefer_mailbox() -> bool {
    true
}

pub fn long_request_distance() -> f32 {
    20.0
}

pub fn prewarm_ring() -> i32 {
    2
}

pub fn backlog_warn_threshold() -> usize {
    128
}

pub fn rays_per_tick() -> u32 {
    256
}

// ── search memory ───────────────────────────────────────────────────

pub fn candidate_batch() -> usize {
    4
}

pub fn min_hop_distance() -> f32 {
    1.5
}

pub fn max_hop_distance() -> f32 {
    12.0
}

pub fn close_penalty() -> f32 {
    2.0
}

pub fn far_penalty() -> f32 {
    0.5
}

pub fn score_jitter() -> f32 {
    0.25
}

pub fn ring_points() -> usize {
    12
}

pub fn interior_points() -> usize {
    6
}

pub fn initial_radius() -> f32 {
    4.0
}

pub fn radius_growth() -> f32 {
    1.5
}

pub fn max_radius() -> f32 {
    40.0
}

pub fn cone_rays() -> usize {
    16
}

// ── gossip ──────────────────────────────────────────────────────────

pub fn skill() -> f32 {
    0.5
}

pub fn share_base() -> f32 {
    0.4
}

pub fn obedience_base() -> f32 {
    0.8
}

pub fn batch_cap() -> usize {
    32
}

pub fn ingest_cap() -> usize {
    64
}

pub fn peer_radius() -> f32 {
    15.0
}
