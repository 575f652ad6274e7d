//! Bounded-expansion A* path planner.
//!
//! Searches the clearance-filtered 8-neighborhood exposed by
//! [`NavGrid`], with Euclidean distance as both edge cost and (scaled)
//! heuristic. Expansion is hard-capped so worst-case latency is bounded
//! regardless of world size; hitting the cap is reported as a failure,
//! the same as a provably unreachable goal.
//!
//! Corner-cutting never needs checking here: the grid's neighbor masks
//! already exclude diagonal steps whose side cells are blocked.

mod config;

pub use config::PlannerConfig;

use std::cmp::Ordering;
use std::collections::{BinaryHeap, HashMap, HashSet};

use log::{debug, trace};

use crate::core::{GridCoord, WorldPoint};
use crate::grid::NavGrid;

/// A node in the A* open set.
#[derive(Clone, Debug)]
struct OpenNode {
    coord: GridCoord,
    g_cost: f32,
    f_cost: f32,
}

impl Eq for OpenNode {}

impl PartialEq for OpenNode {
    fn eq(&self, other: &Self) -> bool {
        self.coord == other.coord
    }
}

impl Ord for OpenNode {
    fn cmp(&self, other: &Self) -> Ordering {
        // Reverse ordering for min-heap behavior
        other
            .f_cost
            .partial_cmp(&self.f_cost)
            .unwrap_or(Ordering::Equal)
    }
}

impl PartialOrd for OpenNode {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

/// Reason a path query failed.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum PathFailure {
    /// Start resolves to no walkable cell at the requested clearance.
    StartBlocked,
    /// Goal resolves to no walkable cell at the requested clearance.
    GoalBlocked,
    /// Search space exhausted without reaching the goal.
    NoPath,
    /// Expansion cap hit before reaching the goal. Treated like NoPath
    /// by callers; kept distinct for diagnostics.
    BudgetExhausted,
}

/// Result of a path query.
#[derive(Clone, Debug)]
pub struct PathResult {
    /// Path as grid coordinates, start cell first (empty on failure,
    /// and also on the trivial start==goal success).
    pub path: Vec<GridCoord>,
    /// Path as world positions (cell centers).
    pub waypoints: Vec<WorldPoint>,
    /// Total path cost in meters.
    pub cost: f32,
    /// Nodes expanded during the search.
    pub nodes_expanded: usize,
    /// None on success.
    pub failure: Option<PathFailure>,
}

impl PathResult {
    fn failed(reason: PathFailure, nodes_expanded: usize) -> Self {
        Self {
            path: Vec::new(),
            waypoints: Vec::new(),
            cost: f32::INFINITY,
            nodes_expanded,
            failure: Some(reason),
        }
    }

    fn trivial() -> Self {
        Self {
            path: Vec::new(),
            waypoints: Vec::new(),
            cost: 0.0,
            nodes_expanded: 0,
            failure: None,
        }
    }

    /// Did the query succeed?
    #[inline]
    pub fn succeeded(&self) -> bool {
        self.failure.is_none()
    }

    /// Path length in meters, summed over waypoints.
    pub fn length_meters(&self) -> f32 {
        if self.waypoints.len() < 2 {
            return 0.0;
        }
        let mut total = 0.0;
        for i in 1..self.waypoints.len() {
            total += self.waypoints[i - 1].distance(&self.waypoints[i]);
        }
        total
    }
}

/// Bounded-expansion A* planner.
#[derive(Clone, Debug)]
pub struct PathPlanner {
    config: PlannerConfig,
}

impl PathPlanner {
    /// Create a planner with the given settings.
    pub fn new(config: PlannerConfig) -> Self {
        Self { config }
    }

    /// Create with default settings.
    pub fn with_defaults() -> Self {
        Self::new(PlannerConfig::default())
    }

    /// Find a path between two world positions at the given clearance.
    ///
    /// Both endpoints are snapped to the nearest walkable cell within
    /// `snap_radius_cells`. Identical resolved cells are an immediate
    /// empty-path success.
    pub fn find_path(
        &self,
        grid: &mut NavGrid,
        start: WorldPoint,
        goal: WorldPoint,
        clearance: f32,
        now_s: f64,
    ) -> PathResult {
        trace!(
            "[Planner] find_path ({:.1},{:.1}) -> ({:.1},{:.1}) r={:.2}",
            start.x, start.y, goal.x, goal.y, clearance
        );

        let Some(start_cell) = self.snap(grid, start, clearance, now_s) else {
            debug!("[Planner] FAILED: StartBlocked at ({:.1},{:.1})", start.x, start.y);
            return PathResult::failed(PathFailure::StartBlocked, 0);
        };
        let Some(goal_cell) = self.snap(grid, goal, clearance, now_s) else {
            debug!("[Planner] FAILED: GoalBlocked at ({:.1},{:.1})", goal.x, goal.y);
            return PathResult::failed(PathFailure::GoalBlocked, 0);
        };

        if start_cell == goal_cell {
            return PathResult::trivial();
        }

        let goal_world = grid.grid_to_world(goal_cell);
        let mut open = BinaryHeap::new();
        let mut closed: HashSet<GridCoord> = HashSet::new();
        let mut came_from: HashMap<GridCoord, GridCoord> = HashMap::new();
        let mut g_scores: HashMap<GridCoord, f32> = HashMap::new();

        let h_start = self.heuristic(grid, start_cell, goal_world);
        open.push(OpenNode {
            coord: start_cell,
            g_cost: 0.0,
            f_cost: h_start,
        });
        g_scores.insert(start_cell, 0.0);

        let mut nodes_expanded = 0usize;

        while let Some(current) = open.pop() {
            nodes_expanded += 1;
            if nodes_expanded > self.config.max_nodes_per_path {
                debug!(
                    "[Planner] FAILED: BudgetExhausted after {} nodes",
                    nodes_expanded
                );
                return PathResult::failed(PathFailure::BudgetExhausted, nodes_expanded);
            }

            if current.coord == goal_cell {
                return self.reconstruct(grid, came_from, goal_cell, current.g_cost, nodes_expanded);
            }

            if !closed.insert(current.coord) {
                continue;
            }

            let current_world = grid.grid_to_world(current.coord);
            let mask = grid.neighbors_mask(current.coord, clearance, now_s);
            for slot in 0..8 {
                if mask & (1 << slot) == 0 {
                    continue;
                }
                let neighbor = current.coord.neighbor(slot);
                if closed.contains(&neighbor) {
                    continue;
                }
                let neighbor_world = grid.grid_to_world(neighbor);
                let tentative_g = current.g_cost + current_world.distance(&neighbor_world);

                let known_g = g_scores.get(&neighbor).copied().unwrap_or(f32::INFINITY);
                if tentative_g < known_g {
                    came_from.insert(neighbor, current.coord);
                    g_scores.insert(neighbor, tentative_g);
                    let h = self.heuristic(grid, neighbor, goal_world);
                    open.push(OpenNode {
                        coord: neighbor,
                        g_cost: tentative_g,
                        f_cost: tentative_g + h,
                    });
                }
            }
        }

        debug!("[Planner] FAILED: NoPath after {} nodes", nodes_expanded);
        PathResult::failed(PathFailure::NoPath, nodes_expanded)
    }

    /// Nearest walkable cell to a world position, searched in growing
    /// Chebyshev rings. None when nothing walkable is within range.
    fn snap(
        &self,
        grid: &mut NavGrid,
        pos: WorldPoint,
        clearance: f32,
        now_s: f64,
    ) -> Option<GridCoord> {
        let center = grid.world_to_grid(pos);
        if grid.is_walkable(center, clearance, now_s) {
            return Some(center);
        }
        for ring in 1..=self.config.snap_radius_cells {
            let mut best: Option<(f32, GridCoord)> = None;
            for dy in -ring..=ring {
                for dx in -ring..=ring {
                    if dx.abs() != ring && dy.abs() != ring {
                        continue; // interior already visited
                    }
                    let coord = GridCoord::new(center.x + dx, center.y + dy);
                    if !grid.is_walkable(coord, clearance, now_s) {
                        continue;
                    }
                    let d = pos.distance_squared(&grid.grid_to_world(coord));
                    if best.map(|(bd, _)| d < bd).unwrap_or(true) {
                        best = Some((d, coord));
                    }
                }
            }
            if let Some((_, coord)) = best {
                return Some(coord);
            }
        }
        None
    }

    fn heuristic(&self, grid: &NavGrid, from: GridCoord, goal_world: WorldPoint) -> f32 {
        grid.grid_to_world(from).distance(&goal_world) * self.config.heuristic_weight
    }

    fn reconstruct(
        &self,
        grid: &NavGrid,
        came_from: HashMap<GridCoord, GridCoord>,
        goal: GridCoord,
        cost: f32,
        nodes_expanded: usize,
    ) -> PathResult {
        let mut path = Vec::new();
        let mut current = goal;
        while let Some(&prev) = came_from.get(&current) {
            path.push(current);
            current = prev;
        }
        path.push(current);
        path.reverse();

        let waypoints: Vec<WorldPoint> = path.iter().map(|c| grid.grid_to_world(*c)).collect();

        trace!(
            "[Planner] SUCCESS: {} cells, cost={:.2}, nodes_expanded={}",
            path.len(),
            cost,
            nodes_expanded
        );

        PathResult {
            path,
            waypoints,
            cost,
            nodes_expanded,
            failure: None,
        }
    }
}
