//! Fairness- and rate-limited path request scheduling.
//!
//! Hundreds of agents may want a path on the same frame; computing them
//! all would blow the frame budget, and most of them will be
//! superseded before they are ever used. [`RequestScheduler`]
//! serializes the demand:
//!
//! - **Mailboxes**: one pending request per named requester; a newer
//!   submission overwrites (coalesces) the older one, so stale requests
//!   are never computed.
//! - **Slots**: requesters hash into a fixed number of distribution
//!   slots; each tick drains one rotating slot, spreading work instead
//!   of bursting it.
//! - **Token bucket**: dispatches are paid for from a bucket refilled
//!   by wall-clock time and capped at a burst maximum, making
//!   throughput frame-rate independent.
//! - **Back-pressure**: a tick is skipped entirely while the host
//!   reports physics pressure above threshold.
//!
//! Anonymous requests (`requester_id < 0`) never coalesce and keep
//! strict FIFO order within their slot. No ordering holds across
//! slots; that trade buys fairness and bounded latency.

mod budget;
mod config;

pub use budget::FrameBudget;
pub use config::SchedulerConfig;

use std::collections::{HashMap, VecDeque};
use std::time::Instant;

use log::{debug, trace, warn};

use crate::area::AreaGraph;
use crate::core::WorldPoint;
use crate::grid::NavGrid;
use crate::planner::{PathPlanner, PathResult};

/// Result delivery callback; invoked synchronously during a drain.
pub type PathCallback = Box<dyn FnOnce(&PathResult)>;

/// A pending path request.
pub struct PathRequest {
    /// Start position in world space.
    pub start: WorldPoint,
    /// Goal position in world space.
    pub goal: WorldPoint,
    /// Clearance radius of the requesting agent.
    pub clearance: f32,
    /// Non-negative ids coalesce per requester; negative ids are
    /// anonymous FIFO requests.
    pub requester_id: i64,
    /// Receives the outcome, success or failure.
    pub callback: PathCallback,
}

impl PathRequest {
    /// Create a request for a named requester (coalescable).
    pub fn new(
        start: WorldPoint,
        goal: WorldPoint,
        clearance: f32,
        requester_id: i64,
        callback: PathCallback,
    ) -> Self {
        Self {
            start,
            goal,
            clearance,
            requester_id,
            callback,
        }
    }

    /// Create an anonymous request (strict FIFO, never coalesced).
    pub fn anonymous(
        start: WorldPoint,
        goal: WorldPoint,
        clearance: f32,
        callback: PathCallback,
    ) -> Self {
        Self::new(start, goal, clearance, -1, callback)
    }
}

/// Counters for scheduler observability.
#[derive(Clone, Copy, Debug, Default)]
pub struct SchedulerStats {
    /// Requests dispatched to the planner.
    pub dispatched: u64,
    /// Mailbox submissions that overwrote a pending request.
    pub coalesced: u64,
    /// Ticks skipped due to physics back-pressure.
    pub skipped_ticks: u64,
}

/// One distribution slot: coalescing mailboxes plus an anonymous FIFO.
#[derive(Default)]
struct Slot {
    mailboxes: HashMap<i64, PathRequest>,
    anonymous: VecDeque<PathRequest>,
}

impl Slot {
    fn pending(&self) -> usize {
        self.mailboxes.len() + self.anonymous.len()
    }

    fn pop_mailbox(&mut self) -> Option<PathRequest> {
        let key = self.mailboxes.keys().next().copied()?;
        self.mailboxes.remove(&key)
    }

    fn pop(&mut self, prefer_mailbox: bool) -> Option<PathRequest> {
        if prefer_mailbox {
            self.pop_mailbox().or_else(|| self.anonymous.pop_front())
        } else {
            self.anonymous.pop_front().or_else(|| self.pop_mailbox())
        }
    }
}

/// Serializes path requests from many agents under a combined token
/// bucket, per-tick time budget, and burst cap.
pub struct RequestScheduler {
    config: SchedulerConfig,
    slots: Vec<Slot>,
    cursor: usize,
    tokens: f64,
    last_refill_s: Option<f64>,
    stats: SchedulerStats,
    frame_budget: FrameBudget,
}

impl RequestScheduler {
    /// Create a scheduler with the given settings.
    pub fn new(config: SchedulerConfig) -> Self {
        let slot_count = config.slot_count.max(1);
        let tokens = config.burst_cap as f64;
        let frame_budget = FrameBudget::new(config.rays_per_tick);
        Self {
            config,
            slots: (0..slot_count).map(|_| Slot::default()).collect(),
            cursor: 0,
            tokens,
            last_refill_s: None,
            stats: SchedulerStats::default(),
            frame_budget,
        }
    }

    /// Create with default settings.
    pub fn with_defaults() -> Self {
        Self::new(SchedulerConfig::default())
    }

    /// Shared per-tick work budget for agents (reset at each tick).
    pub fn frame_budget(&self) -> &FrameBudget {
        &self.frame_budget
    }

    /// Dispatch counters.
    pub fn stats(&self) -> SchedulerStats {
        self.stats
    }

    /// Requests waiting across all slots.
    pub fn pending_count(&self) -> usize {
        self.slots.iter().map(Slot::pending).sum()
    }

    /// Queue a request. Named requesters coalesce to the newest
    /// submission; anonymous requests append to their slot's FIFO.
    pub fn submit(&mut self, request: PathRequest) {
        let slot_idx = if request.requester_id >= 0 {
            self.slot_of_id(request.requester_id)
        } else {
            self.slot_of_position(request.start)
        };
        let slot = &mut self.slots[slot_idx];
        if request.requester_id >= 0 {
            if slot
                .mailboxes
                .insert(request.requester_id, request)
                .is_some()
            {
                self.stats.coalesced += 1;
                trace!("[Scheduler] coalesced request in slot {}", slot_idx);
            }
        } else {
            slot.anonymous.push_back(request);
        }
    }

    fn slot_of_id(&self, id: i64) -> usize {
        // Multiplicative hash; deterministic spread without pulling in
        // a hasher
        let h = (id as u64).wrapping_mul(0x9E37_79B9_7F4A_7C15);
        (h >> 32) as usize % self.slots.len()
    }

    fn slot_of_position(&self, pos: WorldPoint) -> usize {
        let qx = (pos.x * 4.0).floor() as i64;
        let qy = (pos.y * 4.0).floor() as i64;
        let h = ((qx as u64) ^ (qy as u64).rotate_left(32)).wrapping_mul(0x9E37_79B9_7F4A_7C15);
        (h >> 32) as usize % self.slots.len()
    }

    /// Drain one scheduling tick: refill tokens from elapsed wall
    /// clock, honor back-pressure, and dispatch from the current
    /// rotating slot under the token/time/count limits. Returns the
    /// number of requests dispatched.
    pub fn tick(
        &mut self,
        grid: &mut NavGrid,
        areas: &mut AreaGraph,
        planner: &PathPlanner,
        now_s: f64,
        physics_pressure: f32,
    ) -> usize {
        self.frame_budget.reset();
        self.refill(now_s);

        if physics_pressure > self.config.pressure_threshold {
            self.stats.skipped_ticks += 1;
            debug!(
                "[Scheduler] skipping tick: physics pressure {:.2} > {:.2}",
                physics_pressure, self.config.pressure_threshold
            );
            return 0;
        }

        let pending = self.pending_count();
        if pending > self.config.backlog_warn_threshold {
            warn!(
                "[Scheduler] backlog {} exceeds warning threshold {}",
                pending, self.config.backlog_warn_threshold
            );
        }

        let slot_idx = self.cursor % self.slots.len();
        self.cursor = self.cursor.wrapping_add(1);

        let tick_start = Instant::now();
        let mut dispatched = 0usize;

        while self.tokens >= 1.0 && dispatched < self.config.max_dispatches_per_tick {
            if tick_start.elapsed().as_secs_f64() * 1000.0 > self.config.tick_budget_ms {
                trace!("[Scheduler] tick time budget exhausted");
                break;
            }
            let Some(request) = self.slots[slot_idx].pop(self.config.prefer_mailbox) else {
                break;
            };

            if request.start.distance(&request.goal) > self.config.long_request_distance {
                // First-use cache misses on a long path are the
                // expensive case; warm both ends before planning
                let ring = self.config.prewarm_ring;
                grid.prewarm_around(request.start, ring, request.clearance, now_s);
                grid.prewarm_around(request.goal, ring, request.clearance, now_s);
                areas.ensure_built(grid, now_s);
            }

            let result =
                planner.find_path(grid, request.start, request.goal, request.clearance, now_s);
            (request.callback)(&result);

            self.tokens -= 1.0;
            dispatched += 1;
            self.stats.dispatched += 1;
        }

        dispatched
    }

    fn refill(&mut self, now_s: f64) {
        if let Some(last) = self.last_refill_s {
            let dt = (now_s - last).max(0.0);
            self.tokens = (self.tokens + dt * self.config.requests_per_second)
                .min(self.config.burst_cap as f64);
        }
        self.last_refill_s = Some(now_s);
    }
}
