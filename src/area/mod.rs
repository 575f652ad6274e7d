//! Topological decomposition of walkable space.
//!
//! [`AreaGraph`] classifies every grid cell as wall, portal, or member
//! of an "area" — a maximal 4-connected region of walkable, non-portal
//! cells. Portals are narrow chokepoint cells found by measuring free
//! runs along both axes; they act as barriers during the flood fill,
//! and afterwards every portal that borders two distinct areas
//! contributes an edge (with world-space anchor points) to a small
//! adjacency graph.
//!
//! The graph is rebuilt from scratch when geometry changes; nothing is
//! patched incrementally. Build cost is one walkability sample per
//! cell plus linear passes, so rebuilds are cheap relative to the
//! collision queries they trigger.

mod config;

pub use config::AreaGraphConfig;

use std::collections::VecDeque;

use log::{debug, trace, warn};

use crate::core::{CellKey, GridCoord, WorldPoint};
use crate::grid::NavGrid;

/// Classification of one grid cell.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum CellClass {
    /// Not walkable at the sampled clearance.
    Wall,
    /// Walkable but flagged as a narrow chokepoint; belongs to no area.
    Portal,
    /// Member of the area with this id.
    Area(u32),
}

/// An edge between two areas that share at least one bordering portal.
#[derive(Clone, Debug)]
pub struct AreaEdge {
    /// Lower area id.
    pub a: u32,
    /// Higher area id.
    pub b: u32,
    /// World positions of the area-side cells touching the shared
    /// portal(s); usable as approach points when transitioning.
    pub anchors: Vec<WorldPoint>,
}

/// Area/portal topology over the navigation grid.
pub struct AreaGraph {
    config: AreaGraphConfig,
    built: bool,
    /// Set when the last build attempt found nothing to build; cleared
    /// by `invalidate` so a later rebuild can try again.
    build_failed: bool,

    // Grid geometry captured at build time
    width: usize,
    height: usize,
    origin: WorldPoint,
    cell_size: f32,

    class: Vec<CellClass>,
    /// Member cell indices per area.
    area_cells: Vec<Vec<u32>>,
    edges: Vec<AreaEdge>,
    /// Edge indices incident to each area.
    area_edges: Vec<Vec<usize>>,

    // Reusable scratch for bounded BFS (no per-call allocation)
    scratch_queue: VecDeque<u32>,
    visited_stamp: Vec<u32>,
    stamp: u32,
}

impl AreaGraph {
    /// Create an unbuilt graph. Topology appears on the first build or
    /// lazily on the first position query.
    pub fn new(config: AreaGraphConfig) -> Self {
        Self {
            config,
            built: false,
            build_failed: false,
            width: 0,
            height: 0,
            origin: WorldPoint::ZERO,
            cell_size: 1.0,
            class: Vec::new(),
            area_cells: Vec::new(),
            edges: Vec::new(),
            area_edges: Vec::new(),
            scratch_queue: VecDeque::new(),
            visited_stamp: Vec::new(),
            stamp: 0,
        }
    }

    /// Has a successful build happened?
    #[inline]
    pub fn is_built(&self) -> bool {
        self.built
    }

    /// Number of areas.
    #[inline]
    pub fn area_count(&self) -> usize {
        self.area_cells.len()
    }

    /// Number of portal cells.
    pub fn portal_count(&self) -> usize {
        self.class
            .iter()
            .filter(|c| **c == CellClass::Portal)
            .count()
    }

    /// Drop all topology. The next query or build starts fresh.
    pub fn invalidate(&mut self) {
        self.built = false;
        self.build_failed = false;
        self.class.clear();
        self.area_cells.clear();
        self.edges.clear();
        self.area_edges.clear();
    }

    /// Build (or rebuild) topology from the grid at the configured
    /// clearance.
    pub fn build(&mut self, grid: &mut NavGrid, now_s: f64) {
        self.invalidate();

        let width = grid.width();
        let height = grid.height();
        let cells = width * height;
        if cells == 0 {
            warn!("[AreaGraph] grid has no cells; leaving topology unbuilt");
            self.build_failed = true;
            return;
        }

        // 1. Sample walkability once per cell
        let mut walkable = vec![false; cells];
        for y in 0..height {
            for x in 0..width {
                let coord = GridCoord::new(x as i32, y as i32);
                walkable[y * width + x] = grid.is_walkable(coord, self.config.clearance, now_s);
            }
        }
        if !walkable.iter().any(|w| *w) {
            warn!("[AreaGraph] no walkable cells at clearance {:.2}; leaving topology unbuilt",
                self.config.clearance);
            self.build_failed = true;
            return;
        }

        self.width = width;
        self.height = height;
        self.origin = grid.origin();
        self.cell_size = grid.cell_size();

        // 2. Free runs along each axis
        let run_x = axis_runs(&walkable, width, height, true);
        let run_y = axis_runs(&walkable, width, height, false);

        // 3. Portal flags
        self.class = vec![CellClass::Wall; cells];
        for i in 0..cells {
            if !walkable[i] {
                continue;
            }
            let narrow = run_x[i].min(run_y[i]);
            let long = run_x[i].max(run_y[i]);
            if narrow <= self.config.portal_max_width && long >= self.config.portal_min_run {
                self.class[i] = CellClass::Portal;
            } else {
                // Area id assigned by the flood fill below
                self.class[i] = CellClass::Area(u32::MAX);
            }
        }

        // 4. Flood fill non-portal walkable cells into areas
        self.flood_fill();

        // 5. Portal-bordering area pairs become edges with anchors
        self.link_areas();

        self.built = true;
        self.visited_stamp = vec![0; cells];
        self.stamp = 0;
        debug!(
            "[AreaGraph] built: {} areas, {} portal cells, {} edges",
            self.area_cells.len(),
            self.portal_count(),
            self.edges.len()
        );
    }

    /// Build lazily if nothing is built yet and the last attempt did
    /// not already fail.
    pub fn ensure_built(&mut self, grid: &mut NavGrid, now_s: f64) {
        if !self.built && !self.build_failed {
            self.build(grid, now_s);
        }
    }

    fn flood_fill(&mut self) {
        let width = self.width as i32;
        let height = self.height as i32;
        let mut queue = VecDeque::new();
        for start in 0..self.class.len() {
            if self.class[start] != CellClass::Area(u32::MAX) {
                continue;
            }
            let id = self.area_cells.len() as u32;
            let mut members = Vec::new();
            self.class[start] = CellClass::Area(id);
            queue.push_back(start as u32);
            while let Some(idx) = queue.pop_front() {
                members.push(idx);
                let x = (idx as i32) % width;
                let y = (idx as i32) / width;
                for (dx, dy) in [(0, 1), (1, 0), (0, -1), (-1, 0)] {
                    let nx = x + dx;
                    let ny = y + dy;
                    if nx < 0 || ny < 0 || nx >= width || ny >= height {
                        continue;
                    }
                    let ni = (ny * width + nx) as usize;
                    if self.class[ni] == CellClass::Area(u32::MAX) {
                        self.class[ni] = CellClass::Area(id);
                        queue.push_back(ni as u32);
                    }
                }
            }
            self.area_cells.push(members);
        }
        self.area_edges = vec![Vec::new(); self.area_cells.len()];
    }

    fn link_areas(&mut self) {
        let width = self.width as i32;
        let height = self.height as i32;
        for i in 0..self.class.len() {
            if self.class[i] != CellClass::Portal {
                continue;
            }
            let x = (i as i32) % width;
            let y = (i as i32) / width;
            // Collect (area id, bordering cell) for the 4 orthogonal sides
            let mut sides: Vec<(u32, GridCoord)> = Vec::with_capacity(4);
            for (dx, dy) in [(0, 1), (1, 0), (0, -1), (-1, 0)] {
                let nx = x + dx;
                let ny = y + dy;
                if nx < 0 || ny < 0 || nx >= width || ny >= height {
                    continue;
                }
                if let CellClass::Area(id) = self.class[(ny * width + nx) as usize] {
                    sides.push((id, GridCoord::new(nx, ny)));
                }
            }
            for (si, (a, ca)) in sides.iter().enumerate() {
                for (b, cb) in sides.iter().skip(si + 1) {
                    if a == b {
                        continue;
                    }
                    let (lo, hi) = if a < b { (*a, *b) } else { (*b, *a) };
                    let edge_idx = self.find_or_add_edge(lo, hi);
                    let anchor_a = self.cell_center(*ca);
                    let anchor_b = self.cell_center(*cb);
                    let edge = &mut self.edges[edge_idx];
                    push_unique_anchor(&mut edge.anchors, anchor_a);
                    push_unique_anchor(&mut edge.anchors, anchor_b);
                }
            }
        }
    }

    fn find_or_add_edge(&mut self, a: u32, b: u32) -> usize {
        if let Some(idx) = self
            .edges
            .iter()
            .position(|e| e.a == a && e.b == b)
        {
            return idx;
        }
        let idx = self.edges.len();
        self.edges.push(AreaEdge {
            a,
            b,
            anchors: Vec::new(),
        });
        self.area_edges[a as usize].push(idx);
        self.area_edges[b as usize].push(idx);
        idx
    }

    // ── coordinate helpers over the captured geometry ───────────────

    #[inline]
    fn cell_center(&self, coord: GridCoord) -> WorldPoint {
        WorldPoint::new(
            self.origin.x + (coord.x as f32 + 0.5) * self.cell_size,
            self.origin.y + (coord.y as f32 + 0.5) * self.cell_size,
        )
    }

    #[inline]
    fn coord_of(&self, pos: WorldPoint) -> GridCoord {
        GridCoord::new(
            ((pos.x - self.origin.x) / self.cell_size).floor() as i32,
            ((pos.y - self.origin.y) / self.cell_size).floor() as i32,
        )
    }

    #[inline]
    fn index_of(&self, coord: GridCoord) -> Option<usize> {
        (coord.x >= 0
            && coord.y >= 0
            && (coord.x as usize) < self.width
            && (coord.y as usize) < self.height)
            .then(|| coord.y as usize * self.width + coord.x as usize)
    }

    // ── queries ─────────────────────────────────────────────────────

    /// Area id at a grid coordinate, or −1 for wall/portal/out of
    /// bounds/unbuilt. Never triggers a build.
    pub fn area_id_at(&self, coord: GridCoord) -> i32 {
        match self.index_of(coord).map(|i| self.class[i]) {
            Some(CellClass::Area(id)) => id as i32,
            _ => -1,
        }
    }

    /// Is the cell at a grid coordinate a portal? Never builds.
    pub fn is_portal_at(&self, coord: GridCoord) -> bool {
        matches!(
            self.index_of(coord).map(|i| self.class[i]),
            Some(CellClass::Portal)
        )
    }

    /// Area id at a world position; −1 for wall, portal, or out of
    /// bounds. Builds lazily on first use.
    pub fn area_id_strict(&mut self, grid: &mut NavGrid, pos: WorldPoint, now_s: f64) -> i32 {
        self.ensure_built(grid, now_s);
        self.area_id_at(self.coord_of(pos))
    }

    /// Is the cell at a world position a portal? Builds lazily.
    pub fn is_portal(&mut self, grid: &mut NavGrid, pos: WorldPoint, now_s: f64) -> bool {
        self.ensure_built(grid, now_s);
        self.is_portal_at(self.coord_of(pos))
    }

    /// Walkable (member) cell count of an area, 0 when unknown.
    pub fn walkable_cell_count(&self, area_id: i32) -> usize {
        if area_id < 0 {
            return 0;
        }
        self.area_cells
            .get(area_id as usize)
            .map(|cells| cells.len())
            .unwrap_or(0)
    }

    /// Do two distinct areas share at least one bordering portal?
    pub fn adjacent(&self, a: i32, b: i32) -> bool {
        if a < 0 || b < 0 || a == b {
            return false;
        }
        let (lo, hi) = if a < b { (a as u32, b as u32) } else { (b as u32, a as u32) };
        self.edges.iter().any(|e| e.a == lo && e.b == hi)
    }

    /// World anchor to aim for when moving from `from_area` toward
    /// `to_area`: the anchor nearest `from_pos` on the first hop's
    /// edge of the shortest area-graph route. Fails (None) when the
    /// graph is unbuilt, an id is unknown, the areas are identical, or
    /// no route exists.
    pub fn next_hop_toward(
        &self,
        from_area: i32,
        to_area: i32,
        from_pos: WorldPoint,
    ) -> Option<WorldPoint> {
        if !self.built || from_area < 0 || to_area < 0 || from_area == to_area {
            return None;
        }
        let from = from_area as usize;
        let to = to_area as usize;
        if from >= self.area_cells.len() || to >= self.area_cells.len() {
            return None;
        }

        // BFS over the (typically tiny) area graph
        let mut parent: Vec<Option<usize>> = vec![None; self.area_cells.len()];
        let mut visited = vec![false; self.area_cells.len()];
        let mut queue = VecDeque::new();
        visited[from] = true;
        queue.push_back(from);
        while let Some(area) = queue.pop_front() {
            if area == to {
                break;
            }
            for &edge_idx in &self.area_edges[area] {
                let edge = &self.edges[edge_idx];
                let other = if edge.a as usize == area {
                    edge.b as usize
                } else {
                    edge.a as usize
                };
                if !visited[other] {
                    visited[other] = true;
                    parent[other] = Some(area);
                    queue.push_back(other);
                }
            }
        }
        if !visited[to] {
            trace!("[AreaGraph] areas {} and {} are disconnected", from_area, to_area);
            return None;
        }

        // Walk back to the area directly after `from` on the route
        let mut hop = to;
        while let Some(p) = parent[hop] {
            if p == from {
                break;
            }
            hop = p;
        }

        let (lo, hi) = if from < hop {
            (from as u32, hop as u32)
        } else {
            (hop as u32, from as u32)
        };
        let edge = self.edges.iter().find(|e| e.a == lo && e.b == hi)?;
        edge.anchors
            .iter()
            .min_by(|p, q| {
                from_pos
                    .distance_squared(p)
                    .partial_cmp(&from_pos.distance_squared(q))
                    .unwrap_or(std::cmp::Ordering::Equal)
            })
            .copied()
    }

    /// Nearest member cell of `area_id` (by BFS hops from the cell at
    /// `from`) for which `searched` returns false. Expansion is capped
    /// by `bfs_expansion_cap` and scratch buffers are reused, so the
    /// query allocates nothing in steady state.
    pub fn nearest_unsearched<F>(
        &mut self,
        area_id: i32,
        from: WorldPoint,
        searched: F,
    ) -> Option<WorldPoint>
    where
        F: Fn(CellKey) -> bool,
    {
        if !self.built || area_id < 0 || area_id as usize >= self.area_cells.len() {
            return None;
        }
        let id = area_id as u32;
        let width = self.width as i32;
        let height = self.height as i32;

        // Start from the query cell if it belongs to the area,
        // otherwise from the nearest member cell.
        let start_coord = self.coord_of(from);
        let start = if let (true, Some(idx)) = (
            self.area_id_at(start_coord) == area_id,
            self.index_of(start_coord),
        ) {
            idx as u32
        } else {
            let mut best = None;
            let mut best_d = f32::INFINITY;
            for &idx in &self.area_cells[area_id as usize] {
                let coord = GridCoord::new(idx as i32 % width, idx as i32 / width);
                let d = from.distance_squared(&self.cell_center(coord));
                if d < best_d {
                    best_d = d;
                    best = Some(idx);
                }
            }
            best?
        };

        self.stamp = self.stamp.wrapping_add(1);
        if self.stamp == 0 {
            // Stamp wrapped; resync the visited buffer
            self.visited_stamp.iter_mut().for_each(|s| *s = 0);
            self.stamp = 1;
        }
        let stamp = self.stamp;

        self.scratch_queue.clear();
        self.scratch_queue.push_back(start);
        self.visited_stamp[start as usize] = stamp;

        let mut expanded = 0usize;
        while let Some(idx) = self.scratch_queue.pop_front() {
            expanded += 1;
            if expanded > self.config.bfs_expansion_cap {
                trace!(
                    "[AreaGraph] nearest_unsearched hit expansion cap {}",
                    self.config.bfs_expansion_cap
                );
                return None;
            }
            let x = idx as i32 % width;
            let y = idx as i32 / width;
            let coord = GridCoord::new(x, y);
            if !searched(coord.key()) {
                return Some(self.cell_center(coord));
            }
            for (dx, dy) in [(0, 1), (1, 0), (0, -1), (-1, 0)] {
                let nx = x + dx;
                let ny = y + dy;
                if nx < 0 || ny < 0 || nx >= width || ny >= height {
                    continue;
                }
                let ni = (ny * width + nx) as usize;
                if self.visited_stamp[ni] != stamp && self.class[ni] == CellClass::Area(id) {
                    self.visited_stamp[ni] = stamp;
                    self.scratch_queue.push_back(ni as u32);
                }
            }
        }
        None
    }
}

/// Contiguous free-run length per cell along one axis: for each
/// walkable cell, how many walkable cells (itself included) the
/// maximal run through it contains. Two sweeps per line, one from each
/// direction.
fn axis_runs(walkable: &[bool], width: usize, height: usize, along_x: bool) -> Vec<i32> {
    let mut runs = vec![0i32; walkable.len()];
    let (lines, line_len) = if along_x {
        (height, width)
    } else {
        (width, height)
    };
    let index = |line: usize, pos: usize| -> usize {
        if along_x {
            line * width + pos
        } else {
            pos * width + line
        }
    };
    for line in 0..lines {
        // Forward sweep: run length ending at each cell
        let mut count = 0i32;
        for pos in 0..line_len {
            let i = index(line, pos);
            count = if walkable[i] { count + 1 } else { 0 };
            runs[i] = count;
        }
        // Backward sweep: propagate the full run length to every member
        let mut count = 0i32;
        for pos in (0..line_len).rev() {
            let i = index(line, pos);
            if walkable[i] {
                count = count.max(runs[i]);
                runs[i] = count;
            } else {
                count = 0;
            }
        }
    }
    runs
}

fn push_unique_anchor(anchors: &mut Vec<WorldPoint>, anchor: WorldPoint) {
    const EPS: f32 = 1e-4;
    if !anchors.iter().any(|a| a.distance_squared(&anchor) < EPS) {
        anchors.push(anchor);
    }
}
