//! Shared navigation core for crowds of autonomous agents on a 2D
//! obstacle field.
//!
//! The stack, bottom to top:
//!
//! - [`grid::NavGrid`] — clearance-aware walkability sampled from an
//!   [`core::ObstacleField`], with TTL-cached cell and neighbor-mask
//!   queries and a resumable cache prewarm task.
//! - [`area::AreaGraph`] — walkable space decomposed into areas joined
//!   by narrow portal passages, with next-hop routing between areas
//!   and bounded nearest-unsearched queries.
//! - [`planner::PathPlanner`] — bounded-expansion A* over the grid.
//! - [`scheduler::RequestScheduler`] — coalescing mailboxes,
//!   distribution slots and a token bucket serializing path demand
//!   from many agents under a per-tick time budget.
//! - [`search::SearchMemory`] — per-agent coverage ledger with
//!   frontier-driven exploration suggestions and gossip sharing.
//!
//! Time is passed in explicitly (`now_s` seconds) so cache expiry and
//! rate limiting are deterministic under test. All state is in-memory
//! and rebuilt per session; [`config::MargaConfig`] carries the
//! tunables and loads from YAML.

pub mod area;
pub mod config;
pub mod core;
pub mod error;
pub mod grid;
pub mod planner;
pub mod scheduler;
pub mod search;

pub use area::{AreaEdge, AreaGraph, AreaGraphConfig};
pub use config::MargaConfig;
pub use core::{Bounds, CellKey, GridCoord, ObstacleField, RectWorld, SpatialNode, WorldPoint};
pub use error::{NavError, Result};
pub use grid::{NavGrid, NavGridConfig, PrewarmStatus, PrewarmTask};
pub use planner::{PathFailure, PathPlanner, PathResult, PlannerConfig};
pub use scheduler::{
    FrameBudget, PathCallback, PathRequest, RequestScheduler, SchedulerConfig, SchedulerStats,
};
pub use search::{pick_nearby_peer, GossipPolicy, SearchConfig, SearchMemory};
