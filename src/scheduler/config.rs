//! Request scheduler configuration.

use serde::{Deserialize, Serialize};

use crate::config::defaults;

/// Scheduler settings
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct SchedulerConfig {
    /// Number of distribution slots work is spread across
    #[serde(default = "defaults::slot_count")]
    pub slot_count: usize,

    /// Token-bucket refill rate (dispatches per second of wall clock)
    #[serde(default = "defaults::requests_per_second")]
    pub requests_per_second: f64,

    /// Maximum tokens the bucket can hold (burst cap)
    #[serde(default = "defaults::burst_cap")]
    pub burst_cap: u32,

    /// Elapsed-time budget per tick (milliseconds of real work)
    #[serde(default = "defaults::tick_budget_ms")]
    pub tick_budget_ms: f64,

    /// Hard cap on dispatches per tick
    #[serde(default = "defaults::max_dispatches_per_tick")]
    pub max_dispatches_per_tick: usize,

    /// Skip the whole tick when reported physics pressure exceeds this
    #[serde(default = "defaults::pressure_threshold")]
    pub pressure_threshold: f32,

    /// Serve mailbox (named requester) entries before anonymous ones
    #[serde(default = "defaults::prefer_mailbox")]
    pub prefer_mailbox: bool,

    /// Endpoint separation (meters) beyond which a request counts as
    /// "long" and triggers an endpoint prewarm before dispatch
    #[serde(default = "defaults::long_request_distance")]
    pub long_request_distance: f32,

    /// Prewarm block ring radius (cells) around long-request endpoints
    #[serde(default = "defaults::prewarm_ring")]
    pub prewarm_ring: i32,

    /// Pending-request count above which a soft overload warning is
    /// logged (never blocks or drops)
    #[serde(default = "defaults::backlog_warn_threshold")]
    pub backlog_warn_threshold: usize,

    /// Shared per-tick ray/probe budget handed to agents
    #[serde(default = "defaults::rays_per_tick")]
    pub rays_per_tick: u32,
}

impl Default for SchedulerConfig {
    fn default() -> Self {
        Self {
            slot_count: defaults::slot_count(),
            requests_per_second: defaults::requests_per_second(),
            burst_cap: defaults::burst_cap(),
            tick_budget_ms: defaults::tick_budget_ms(),
            max_dispatches_per_tick: defaults::max_dispatches_per_tick(),
            pressure_threshold: defaults::pressure_threshold(),
            prefer_mailbox: defaults::prefer_mailbox(),
            long_request_distance: defaults::long_request_distance(),
            prewarm_ring: defaults::prewarm_ring(),
            backlog_warn_threshold: defaults::backlog_warn_threshold(),
            rays_per_tick: defaults::rays_per_tick(),
        }
    }
}
