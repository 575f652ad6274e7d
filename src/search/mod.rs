//! Per-agent exploration coverage ledger.
//!
//! [`SearchMemory`] records which grid cells an agent has visually
//! covered and suggests where to look next. Suggestion comes from a
//! frontier queue of known-reachable-but-unsearched cells: candidates
//! are scored by distance band (too close and too far both penalized)
//! with random jitter as a tie break, the winner is marked searched
//! and its unsearched walkable neighbors join the queue. When the
//! frontier drains, the search radius around the anchor grows and the
//! queue is reseeded from a jittered ring plus random interior points.
//!
//! Cone marking has two cost tiers: a dense sweep for a deliberate
//! look-around dwell (optionally occluded by line of sight) and a
//! budgeted ray sweep for continuous marking while moving, drawing
//! permits from the scheduler's shared [`FrameBudget`].
//!
//! A ledger is owned by exactly one agent. Gossip transfers copies of
//! keys, never shared state; see [`gossip`] for the policy side.

mod config;
mod gossip;

pub use config::SearchConfig;
pub use gossip::{pick_nearby_peer, GossipPolicy};

use std::collections::{HashMap, HashSet, VecDeque};
use std::f32::consts::{PI, TAU};

use log::trace;
use rand::rngs::SmallRng;
use rand::{Rng, SeedableRng};

use crate::area::AreaGraph;
use crate::core::{CellKey, GridCoord, WorldPoint};
use crate::grid::NavGrid;
use crate::scheduler::FrameBudget;

/// Coverage ledger and frontier-based exploration planner for one
/// agent.
pub struct SearchMemory {
    config: SearchConfig,
    searched: HashSet<CellKey>,
    /// Insertion-ordered copy of `searched` for sharing samples.
    recency: Vec<CellKey>,
    frontier: VecDeque<CellKey>,
    area_hits: HashMap<i32, u32>,
    anchor: WorldPoint,
    radius: f32,
    rng: SmallRng,
}

impl SearchMemory {
    /// Create an empty ledger. The same seed replays the same plan.
    pub fn new(config: SearchConfig, seed: u64) -> Self {
        let radius = config.initial_radius;
        Self {
            config,
            searched: HashSet::new(),
            recency: Vec::new(),
            frontier: VecDeque::new(),
            area_hits: HashMap::new(),
            anchor: WorldPoint::ZERO,
            radius,
            rng: SmallRng::seed_from_u64(seed),
        }
    }

    /// Create with default settings.
    pub fn with_defaults(seed: u64) -> Self {
        Self::new(SearchConfig::default(), seed)
    }

    /// Begin a fresh exploration episode centered on `anchor`. Drops
    /// all coverage state from the previous episode.
    pub fn reset_plan(&mut self, anchor: WorldPoint) {
        self.searched.clear();
        self.recency.clear();
        self.frontier.clear();
        self.area_hits.clear();
        self.anchor = anchor;
        self.radius = self.config.initial_radius;
    }

    /// Has this cell been covered?
    #[inline]
    pub fn is_searched(&self, key: CellKey) -> bool {
        self.searched.contains(&key)
    }

    /// Cells covered so far.
    #[inline]
    pub fn searched_count(&self) -> usize {
        self.searched.len()
    }

    /// Cells currently queued as frontier.
    #[inline]
    pub fn frontier_len(&self) -> usize {
        self.frontier.len()
    }

    /// Fraction of an area's walkable cells this agent has covered,
    /// in [0, 1]. Unknown areas report 0.
    pub fn local_coverage(&self, area_id: i32, areas: &AreaGraph) -> f32 {
        let total = areas.walkable_cell_count(area_id);
        if total == 0 {
            return 0.0;
        }
        let hits = self.area_hits.get(&area_id).copied().unwrap_or(0);
        (hits as f32 / total as f32).min(1.0)
    }

    /// Suggest the next world point to search, or None when nothing
    /// reachable remains unsearched near the anchor.
    pub fn next_search_point(
        &mut self,
        grid: &mut NavGrid,
        areas: &AreaGraph,
        from: WorldPoint,
        clearance: f32,
        now_s: f64,
    ) -> Option<WorldPoint> {
        if self.frontier.is_empty() {
            self.reseed(grid, clearance, now_s);
            if self.frontier.is_empty() {
                trace!("[SearchMemory] reseed produced no frontier candidates");
                return None;
            }
        }

        // Score a bounded batch; losers go back in the queue
        let mut winner: Option<(CellKey, f32)> = None;
        let mut losers: Vec<CellKey> = Vec::new();
        let mut pulled = 0;
        while pulled < self.config.candidate_batch {
            let Some(key) = self.frontier.pop_front() else {
                break;
            };
            if self.searched.contains(&key) {
                continue; // stale entry, drop it
            }
            pulled += 1;
            let center = grid.grid_to_world(GridCoord::from_key(key));
            let score = self.score_candidate(from, center);
            match winner {
                Some((_, best_score)) if score >= best_score => losers.push(key),
                Some((best_key, _)) => {
                    losers.push(best_key);
                    winner = Some((key, score));
                }
                None => winner = Some((key, score)),
            }
        }
        for key in losers {
            self.frontier.push_back(key);
        }

        let (key, _) = winner?;
        let coord = GridCoord::from_key(key);
        self.mark_key(key, areas);
        self.enqueue_neighbors(grid, coord, clearance, now_s);
        Some(grid.grid_to_world(coord))
    }

    fn score_candidate(&mut self, from: WorldPoint, candidate: WorldPoint) -> f32 {
        let d = from.distance(&candidate);
        let mut score = self.rng.gen::<f32>() * self.config.score_jitter;
        if d < self.config.min_hop_distance {
            score += (self.config.min_hop_distance - d) * self.config.close_penalty;
        } else if d > self.config.max_hop_distance {
            score += (d - self.config.max_hop_distance) * self.config.far_penalty;
        }
        score
    }

    /// Grow the radius and refill the frontier from a jittered ring
    /// plus uniform interior samples. The anchor cell itself is always
    /// offered so a fresh plan has at least one candidate.
    fn reseed(&mut self, grid: &mut NavGrid, clearance: f32, now_s: f64) {
        self.try_enqueue(grid, grid.world_to_grid(self.anchor), clearance, now_s);

        for i in 0..self.config.ring_points {
            let base = i as f32 / self.config.ring_points as f32 * TAU;
            let angle = base + self.rng.gen::<f32>() * TAU / self.config.ring_points as f32;
            let dist = self.radius * (0.8 + self.rng.gen::<f32>() * 0.2);
            let point = self.anchor.point_at(angle, dist);
            self.try_enqueue(grid, grid.world_to_grid(point), clearance, now_s);
        }
        for _ in 0..self.config.interior_points {
            let angle = self.rng.gen::<f32>() * TAU;
            // sqrt for area-uniform samples inside the disc
            let dist = self.radius * self.rng.gen::<f32>().sqrt();
            let point = self.anchor.point_at(angle, dist);
            self.try_enqueue(grid, grid.world_to_grid(point), clearance, now_s);
        }

        self.radius = (self.radius * self.config.radius_growth).min(self.config.max_radius);
        trace!(
            "[SearchMemory] reseeded frontier: {} candidates, radius now {:.1}",
            self.frontier.len(),
            self.radius
        );
    }

    fn try_enqueue(&mut self, grid: &mut NavGrid, coord: GridCoord, clearance: f32, now_s: f64) {
        let key = coord.key();
        if !self.searched.contains(&key)
            && !self.frontier.contains(&key)
            && grid.is_walkable(coord, clearance, now_s)
        {
            self.frontier.push_back(key);
        }
    }

    fn enqueue_neighbors(
        &mut self,
        grid: &mut NavGrid,
        coord: GridCoord,
        clearance: f32,
        now_s: f64,
    ) {
        let mask = grid.neighbors_mask(coord, clearance, now_s);
        for slot in 0..8 {
            if mask & (1 << slot) == 0 {
                continue;
            }
            let neighbor = coord.neighbor(slot);
            let key = neighbor.key();
            if !self.searched.contains(&key) && !self.frontier.contains(&key) {
                self.frontier.push_back(key);
            }
        }
    }

    /// Mark one cell searched and count its area hit. Idempotent.
    fn mark_key(&mut self, key: CellKey, areas: &AreaGraph) -> bool {
        if !self.searched.insert(key) {
            return false;
        }
        self.recency.push(key);
        let area = areas.area_id_at(GridCoord::from_key(key));
        if area >= 0 {
            *self.area_hits.entry(area).or_insert(0) += 1;
        }
        true
    }

    /// Dense cone sweep: mark every cell whose center lies within
    /// `radius` of `origin` and within `half_angle` of `heading`.
    /// With `check_los` set, cells hidden behind geometry are skipped.
    /// Returns the number of newly marked cells.
    pub fn mark_cone(
        &mut self,
        grid: &mut NavGrid,
        areas: &AreaGraph,
        origin: WorldPoint,
        heading: f32,
        radius: f32,
        half_angle: f32,
        check_los: bool,
    ) -> usize {
        let cell = grid.cell_size();
        let min = grid.world_to_grid(WorldPoint::new(origin.x - radius, origin.y - radius));
        let max = grid.world_to_grid(WorldPoint::new(origin.x + radius, origin.y + radius));
        let r2 = radius * radius;

        let mut marked = 0;
        for gy in min.y..=max.y {
            for gx in min.x..=max.x {
                let coord = GridCoord::new(gx, gy);
                if !grid.is_valid_coord(coord) || !grid.baked_walkable(coord) {
                    continue;
                }
                let center = grid.grid_to_world(coord);
                if origin.distance_squared(&center) > r2 {
                    continue;
                }
                // Cells straddling the origin always count
                if origin.distance(&center) > cell {
                    let delta = wrap_angle(origin.angle_to(&center) - heading);
                    if delta.abs() > half_angle {
                        continue;
                    }
                    if check_los && !grid.segment_clear(origin, center) {
                        continue;
                    }
                }
                if self.mark_key(coord.key(), areas) {
                    marked += 1;
                }
            }
        }
        marked
    }

    /// Cheap cone tier: sweep `cone_rays` rays across the cone,
    /// marching each in cell-size steps and marking the cells under
    /// it. Each ray costs one permit from `budget`; the sweep stops
    /// early when the shared budget runs out. Returns newly marked
    /// cells.
    pub fn mark_cone_budgeted(
        &mut self,
        grid: &mut NavGrid,
        areas: &AreaGraph,
        origin: WorldPoint,
        heading: f32,
        radius: f32,
        half_angle: f32,
        budget: &FrameBudget,
    ) -> usize {
        let rays = self.config.cone_rays.max(1);
        let step = grid.cell_size();
        let mut marked = 0;
        for i in 0..rays {
            if !budget.try_take(1) {
                trace!("[SearchMemory] ray budget exhausted after {} rays", i);
                break;
            }
            let t = if rays == 1 {
                0.5
            } else {
                i as f32 / (rays - 1) as f32
            };
            let angle = heading - half_angle + t * 2.0 * half_angle;
            let mut dist = step * 0.5;
            while dist <= radius {
                let coord = grid.world_to_grid(origin.point_at(angle, dist));
                if !grid.baked_walkable(coord) {
                    break; // ray blocked
                }
                if self.mark_key(coord.key(), areas) {
                    marked += 1;
                }
                dist += step;
            }
        }
        marked
    }

    /// Sample up to `count` searched keys for a gossip push:
    /// newest-first, or strided evenly over the whole history.
    pub fn sample_for_sharing(&self, count: usize, by_recency: bool) -> Vec<CellKey> {
        if count == 0 || self.recency.is_empty() {
            return Vec::new();
        }
        if by_recency {
            self.recency.iter().rev().take(count).copied().collect()
        } else {
            let stride = (self.recency.len() / count).max(1);
            self.recency.iter().step_by(stride).take(count).copied().collect()
        }
    }

    /// Accept up to `cap` shared keys into the ledger, counting area
    /// hits for each new one. Returns how many were new.
    pub fn ingest_shared(&mut self, areas: &AreaGraph, keys: &[CellKey], cap: usize) -> usize {
        let mut accepted = 0;
        for &key in keys.iter().take(cap) {
            if self.mark_key(key, areas) {
                accepted += 1;
            }
        }
        accepted
    }
}

/// Normalize an angle difference to (-PI, PI].
fn wrap_angle(mut a: f32) -> f32 {
    while a > PI {
        a -= TAU;
    }
    while a <= -PI {
        a += TAU;
    }
    a
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::area::AreaGraphConfig;
    use crate::core::{Bounds, RectWorld};
    use crate::grid::NavGridConfig;

    fn grid_config() -> NavGridConfig {
        NavGridConfig {
            cell_size: 1.0,
            base_radius: 0.3,
            baked_buffer: 0.1,
            cache_ttl_s: 600.0,
            prewarm_cells_per_tick: 64,
        }
    }

    /// Open 8x8 room, one area, no portals.
    fn open_room() -> (NavGrid, AreaGraph) {
        let world = RectWorld::new(Bounds::new(WorldPoint::ZERO, WorldPoint::new(8.0, 8.0)));
        let mut grid = NavGrid::new(Box::new(world), grid_config()).unwrap();
        let mut areas = AreaGraph::new(AreaGraphConfig::default());
        areas.build(&mut grid, 0.0);
        (grid, areas)
    }

    #[test]
    fn test_reset_plan_clears_ledger() {
        let (mut grid, areas) = open_room();
        let mut memory = SearchMemory::with_defaults(7);
        memory.reset_plan(WorldPoint::new(4.0, 4.0));
        memory
            .next_search_point(&mut grid, &areas, WorldPoint::new(4.0, 4.0), 0.3, 0.0)
            .unwrap();
        assert!(memory.searched_count() > 0);

        memory.reset_plan(WorldPoint::new(2.0, 2.0));
        assert_eq!(memory.searched_count(), 0);
        assert_eq!(memory.frontier_len(), 0);
    }

    #[test]
    fn test_next_search_point_marks_and_expands() {
        let (mut grid, areas) = open_room();
        let mut memory = SearchMemory::with_defaults(7);
        let from = WorldPoint::new(4.0, 4.0);
        memory.reset_plan(from);

        let p = memory
            .next_search_point(&mut grid, &areas, from, 0.3, 0.0)
            .unwrap();
        let key = grid.world_to_grid(p).key();
        assert!(memory.is_searched(key));
        // The winner's walkable neighbors were enqueued
        assert!(memory.frontier_len() > 0);
    }

    #[test]
    fn test_determinism_under_fixed_seed() {
        let run = || {
            let (mut grid, areas) = open_room();
            let mut memory = SearchMemory::with_defaults(42);
            let from = WorldPoint::new(4.0, 4.0);
            memory.reset_plan(from);
            let mut points = Vec::new();
            for _ in 0..20 {
                match memory.next_search_point(&mut grid, &areas, from, 0.3, 0.0) {
                    Some(p) => points.push((p.x.to_bits(), p.y.to_bits())),
                    None => break,
                }
            }
            points
        };
        assert_eq!(run(), run());
    }

    #[test]
    fn test_coverage_converges_to_full() {
        let (mut grid, areas) = open_room();
        let mut memory = SearchMemory::with_defaults(3);
        let from = WorldPoint::new(4.0, 4.0);
        memory.reset_plan(from);
        let area = areas.area_id_at(grid.world_to_grid(from));
        assert!(area >= 0);

        // 8x8 = 64 cells; generous iteration cap
        for _ in 0..500 {
            if memory
                .next_search_point(&mut grid, &areas, from, 0.3, 0.0)
                .is_none()
            {
                break;
            }
        }
        assert!(
            (memory.local_coverage(area, &areas) - 1.0).abs() < 1e-6,
            "coverage {}",
            memory.local_coverage(area, &areas)
        );
        // Exhausted: no candidates remain
        assert!(memory
            .next_search_point(&mut grid, &areas, from, 0.3, 0.0)
            .is_none());
    }

    #[test]
    fn test_coverage_zero_for_unknown_area() {
        let (_grid, areas) = open_room();
        let memory = SearchMemory::with_defaults(1);
        assert_eq!(memory.local_coverage(-1, &areas), 0.0);
        assert_eq!(memory.local_coverage(99, &areas), 0.0);
    }

    #[test]
    fn test_mark_cone_dense() {
        let (mut grid, areas) = open_room();
        let mut memory = SearchMemory::with_defaults(1);
        memory.reset_plan(WorldPoint::new(1.5, 4.5));

        // Cone pointing east (+x), 90 degrees wide, 4m deep
        let marked = memory.mark_cone(
            &mut grid,
            &areas,
            WorldPoint::new(1.5, 4.5),
            0.0,
            4.0,
            PI / 4.0,
            false,
        );
        assert!(marked > 0);
        // A cell straight ahead is covered
        assert!(memory.is_searched(GridCoord::new(4, 4).key()));
        // A cell behind and to the side of the origin is not
        assert!(!memory.is_searched(GridCoord::new(0, 2).key()));
        // Marking again adds nothing
        let again = memory.mark_cone(
            &mut grid,
            &areas,
            WorldPoint::new(1.5, 4.5),
            0.0,
            4.0,
            PI / 4.0,
            false,
        );
        assert_eq!(again, 0);
    }

    #[test]
    fn test_mark_cone_respects_line_of_sight() {
        // Wall between the viewer and the far half of the room
        let mut world = RectWorld::new(Bounds::new(WorldPoint::ZERO, WorldPoint::new(12.0, 8.0)));
        world.add_obstacle(Bounds::new(
            WorldPoint::new(5.0, 0.0),
            WorldPoint::new(6.0, 8.0),
        ));
        let mut grid = NavGrid::new(Box::new(world), grid_config()).unwrap();
        let mut areas = AreaGraph::new(AreaGraphConfig::default());
        areas.build(&mut grid, 0.0);

        let mut memory = SearchMemory::with_defaults(1);
        memory.reset_plan(WorldPoint::new(1.5, 4.5));
        memory.mark_cone(
            &mut grid,
            &areas,
            WorldPoint::new(1.5, 4.5),
            0.0,
            10.0,
            PI / 3.0,
            true,
        );
        // Near side visible, far side of the wall occluded
        assert!(memory.is_searched(GridCoord::new(3, 4).key()));
        assert!(!memory.is_searched(GridCoord::new(8, 4).key()));
    }

    #[test]
    fn test_mark_cone_budgeted_stops_at_budget() {
        let (mut grid, areas) = open_room();
        let mut memory = SearchMemory::with_defaults(1);
        memory.reset_plan(WorldPoint::new(4.5, 4.5));

        // Zero permits: nothing marked
        let empty = FrameBudget::new(0);
        let marked = memory.mark_cone_budgeted(
            &mut grid,
            &areas,
            WorldPoint::new(4.5, 4.5),
            0.0,
            3.0,
            PI / 4.0,
            &empty,
        );
        assert_eq!(marked, 0);

        // Ample permits: the cone gets covered and the rays were paid for
        let budget = FrameBudget::new(100);
        let marked = memory.mark_cone_budgeted(
            &mut grid,
            &areas,
            WorldPoint::new(4.5, 4.5),
            0.0,
            3.0,
            PI / 4.0,
            &budget,
        );
        assert!(marked > 0);
        assert_eq!(
            budget.remaining(),
            100 - SearchConfig::default().cone_rays as u32
        );
    }

    #[test]
    fn test_sharing_samples_and_ingest() {
        let (mut grid, areas) = open_room();
        let mut scout = SearchMemory::with_defaults(5);
        scout.reset_plan(WorldPoint::new(4.0, 4.0));
        for _ in 0..10 {
            scout
                .next_search_point(&mut grid, &areas, WorldPoint::new(4.0, 4.0), 0.3, 0.0)
                .unwrap();
        }

        let newest = scout.sample_for_sharing(4, true);
        assert_eq!(newest.len(), 4);
        let strided = scout.sample_for_sharing(4, false);
        assert_eq!(strided.len(), 4);
        // Newest-first sample ends with the most recent key
        assert!(newest.iter().all(|k| scout.is_searched(*k)));

        let mut listener = SearchMemory::with_defaults(6);
        listener.reset_plan(WorldPoint::new(1.0, 1.0));
        let accepted = listener.ingest_shared(&areas, &newest, 64);
        assert_eq!(accepted, 4);
        assert_eq!(listener.searched_count(), 4);
        // Re-ingesting the same keys accepts nothing new
        assert_eq!(listener.ingest_shared(&areas, &newest, 64), 0);
    }

    #[test]
    fn test_ingest_respects_cap() {
        let (_grid, areas) = open_room();
        let mut memory = SearchMemory::with_defaults(9);
        let keys: Vec<CellKey> = (0..10)
            .map(|i| GridCoord::new(i, 0).key())
            .collect();
        assert_eq!(memory.ingest_shared(&areas, &keys, 3), 3);
        assert_eq!(memory.searched_count(), 3);
    }

    #[test]
    fn test_ingested_keys_count_area_hits() {
        let (mut grid, areas) = open_room();
        let from = WorldPoint::new(4.0, 4.0);
        let area = areas.area_id_at(grid.world_to_grid(from));

        let mut memory = SearchMemory::with_defaults(9);
        let keys = vec![grid.world_to_grid(from).key()];
        memory.ingest_shared(&areas, &keys, 64);
        assert!(memory.local_coverage(area, &areas) > 0.0);
    }

    #[test]
    fn test_wrap_angle() {
        assert!((wrap_angle(0.0)).abs() < 1e-6);
        assert!((wrap_angle(TAU + 0.5) - 0.5).abs() < 1e-5);
        assert!((wrap_angle(-TAU - 0.5) + 0.5).abs() < 1e-5);
        assert!(wrap_angle(PI + 0.1) < 0.0);
    }
}
