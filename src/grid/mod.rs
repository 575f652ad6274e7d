//! Clearance-aware walkability grid.
//!
//! [`NavGrid`] lays a uniform cell grid over the environment bounds and
//! answers "can an agent of clearance radius `r` stand here / step
//! there" questions. Every answer ultimately comes from
//! [`ObstacleField::disc_blocked`], the single (expensive) collision
//! primitive, so the grid keeps two caches in front of it:
//!
//! 1. a raw walkability cache keyed by `(cell, clearance bucket)` with
//!    time-based expiry, and
//! 2. a derived 8-bit neighbor mask per `(cell, clearance bucket)`
//!    encoding which compass steps are legal, with diagonal bits
//!    guarded against corner-cutting.
//!
//! Invalidation is deliberately conservative: any environment-change
//! notification clears both caches wholesale. The quantized cache key
//! is not reversible to a world region, so partial invalidation is not
//! attempted.

mod config;
mod prewarm;

pub use config::NavGridConfig;
pub use prewarm::{PrewarmStatus, PrewarmTask};

use std::collections::HashMap;

use log::{debug, warn};

use crate::core::{Bounds, GridCoord, ObstacleField, WorldPoint, DIAGONAL_SIDES, NEIGHBOR_8};
use crate::error::{NavError, Result};

/// Cached walkability answer with its write timestamp.
#[derive(Clone, Copy, Debug)]
struct WalkEntry {
    walkable: bool,
    written_at: f64,
}

/// Cached neighbor mask with its write timestamp.
#[derive(Clone, Copy, Debug)]
struct MaskEntry {
    mask: u8,
    written_at: f64,
}

/// Clearance-parameterized walkability grid over a bounded region.
///
/// Time is supplied by the caller as `now_s` (seconds on any monotonic
/// scale); the grid never reads a clock itself, which keeps cache
/// expiry deterministic in tests.
pub struct NavGrid {
    field: Box<dyn ObstacleField>,
    config: NavGridConfig,
    width: usize,
    height: usize,
    origin: WorldPoint,
    /// Build-time walkability at `base_radius + baked_buffer`.
    /// Coarse and generous; used for debug output and cheap pre-filters
    /// only, never for clearance-correct queries.
    baked: Vec<bool>,
    walk_cache: HashMap<(GridCoord, u8), WalkEntry>,
    mask_cache: HashMap<(GridCoord, u8), MaskEntry>,
}

impl NavGrid {
    /// Build a grid over `field.bounds()`.
    ///
    /// Fails with [`NavError::Config`] on a non-positive cell size or
    /// empty field bounds; those are programming errors, not runtime
    /// conditions.
    pub fn new(field: Box<dyn ObstacleField>, config: NavGridConfig) -> Result<Self> {
        if config.cell_size <= 0.0 {
            return Err(NavError::Config(format!(
                "cell_size must be positive, got {}",
                config.cell_size
            )));
        }
        let bounds = field.bounds();
        if bounds.is_empty() {
            return Err(NavError::Config("obstacle field has empty bounds".into()));
        }

        let width = (bounds.width() / config.cell_size).ceil() as usize;
        let height = (bounds.height() / config.cell_size).ceil() as usize;
        let mut grid = Self {
            field,
            config,
            width,
            height,
            origin: bounds.min,
            baked: Vec::new(),
            walk_cache: HashMap::new(),
            mask_cache: HashMap::new(),
        };
        grid.bake();
        grid.log_if_degenerate();
        debug!(
            "[NavGrid] built {}x{} cells over ({:.1},{:.1})..({:.1},{:.1})",
            grid.width, grid.height, bounds.min.x, bounds.min.y, bounds.max.x, bounds.max.y
        );
        Ok(grid)
    }

    /// Recompute dimensions and baked walkability from the field, and
    /// drop all caches. Called by the owner after geometry changes.
    pub fn rebuild(&mut self) -> Result<()> {
        let bounds = self.field.bounds();
        if bounds.is_empty() {
            return Err(NavError::Config("obstacle field has empty bounds".into()));
        }
        self.width = (bounds.width() / self.config.cell_size).ceil() as usize;
        self.height = (bounds.height() / self.config.cell_size).ceil() as usize;
        self.origin = bounds.min;
        self.bake();
        self.log_if_degenerate();
        self.walk_cache.clear();
        self.mask_cache.clear();
        Ok(())
    }

    fn bake(&mut self) {
        let radius = self.config.base_radius + self.config.baked_buffer;
        let mut baked = vec![false; self.width * self.height];
        for y in 0..self.height {
            for x in 0..self.width {
                let coord = GridCoord::new(x as i32, y as i32);
                let center = self.grid_to_world(coord);
                baked[y * self.width + x] = !self.field.disc_blocked(center, radius);
            }
        }
        self.baked = baked;
    }

    // ── metadata ────────────────────────────────────────────────────

    /// Grid width in cells
    #[inline]
    pub fn width(&self) -> usize {
        self.width
    }

    /// Grid height in cells
    #[inline]
    pub fn height(&self) -> usize {
        self.height
    }

    /// Cell edge length in meters
    #[inline]
    pub fn cell_size(&self) -> f32 {
        self.config.cell_size
    }

    /// World coordinates of the grid's minimum corner
    #[inline]
    pub fn origin(&self) -> WorldPoint {
        self.origin
    }

    /// Half a cell edge; the quantum for clearance buckets
    #[inline]
    pub fn node_radius(&self) -> f32 {
        self.config.cell_size * 0.5
    }

    /// Cells-per-tick budget for background prewarm
    #[inline]
    pub fn prewarm_batch(&self) -> usize {
        self.config.prewarm_cells_per_tick
    }

    // ── coordinate transforms ───────────────────────────────────────

    /// Convert world coordinates to grid coordinates (may be out of bounds)
    #[inline]
    pub fn world_to_grid(&self, point: WorldPoint) -> GridCoord {
        GridCoord::new(
            ((point.x - self.origin.x) / self.config.cell_size).floor() as i32,
            ((point.y - self.origin.y) / self.config.cell_size).floor() as i32,
        )
    }

    /// Convert grid coordinates to world coordinates (cell center)
    #[inline]
    pub fn grid_to_world(&self, coord: GridCoord) -> WorldPoint {
        WorldPoint::new(
            self.origin.x + (coord.x as f32 + 0.5) * self.config.cell_size,
            self.origin.y + (coord.y as f32 + 0.5) * self.config.cell_size,
        )
    }

    /// Check if grid coordinates are within bounds
    #[inline]
    pub fn is_valid_coord(&self, coord: GridCoord) -> bool {
        coord.x >= 0
            && coord.y >= 0
            && (coord.x as usize) < self.width
            && (coord.y as usize) < self.height
    }

    /// Cell containing a world point, or None when out of bounds
    #[inline]
    pub fn cell_at(&self, point: WorldPoint) -> Option<GridCoord> {
        let coord = self.world_to_grid(point);
        self.is_valid_coord(coord).then_some(coord)
    }

    #[inline]
    fn coord_to_index(&self, coord: GridCoord) -> Option<usize> {
        self.is_valid_coord(coord)
            .then(|| coord.y as usize * self.width + coord.x as usize)
    }

    // ── clearance buckets ───────────────────────────────────────────

    /// Bucket a continuous clearance radius into a small integer
    /// category. The probe radius actually tested is
    /// `bucket * node_radius`, so all radii in a bucket share one
    /// cached answer.
    #[inline]
    pub fn clearance_bucket(&self, clearance: f32) -> u8 {
        let effective = clearance.max(self.config.base_radius);
        let bucket = (effective / self.node_radius()).ceil();
        bucket.clamp(1.0, u8::MAX as f32) as u8
    }

    /// Probe radius for a clearance bucket
    #[inline]
    pub fn bucket_radius(&self, bucket: u8) -> f32 {
        bucket as f32 * self.node_radius()
    }

    // ── walkability ─────────────────────────────────────────────────

    /// Build-time walkability flag (generous buffer, coarse/debug use)
    #[inline]
    pub fn baked_walkable(&self, coord: GridCoord) -> bool {
        self.coord_to_index(coord)
            .map(|i| self.baked[i])
            .unwrap_or(false)
    }

    /// Is the cell walkable for an agent of the given clearance radius?
    ///
    /// Cached per `(cell, clearance bucket)` with TTL expiry against
    /// `now_s`. Out-of-bounds cells are never walkable.
    pub fn is_walkable(&mut self, coord: GridCoord, clearance: f32, now_s: f64) -> bool {
        let bucket = self.clearance_bucket(clearance);
        self.is_walkable_bucket(coord, bucket, now_s)
    }

    fn is_walkable_bucket(&mut self, coord: GridCoord, bucket: u8, now_s: f64) -> bool {
        if !self.is_valid_coord(coord) {
            return false;
        }
        let ttl = self.config.cache_ttl_s;
        if let Some(entry) = self.walk_cache.get(&(coord, bucket)) {
            if now_s - entry.written_at <= ttl {
                return entry.walkable;
            }
        }
        let center = self.grid_to_world(coord);
        let walkable = !self.field.disc_blocked(center, self.bucket_radius(bucket));
        self.walk_cache.insert(
            (coord, bucket),
            WalkEntry {
                walkable,
                written_at: now_s,
            },
        );
        walkable
    }

    /// 8-bit reachability mask for the cell's compass neighbors.
    ///
    /// Bit `i` follows [`NEIGHBOR_8`] order: cardinals in bits 0..4,
    /// diagonals in bits 4..8. A diagonal bit is only set when the
    /// diagonal target *and* both orthogonal side cells are each
    /// independently walkable, so paths can never cut corners.
    pub fn neighbors_mask(&mut self, coord: GridCoord, clearance: f32, now_s: f64) -> u8 {
        let bucket = self.clearance_bucket(clearance);
        if let Some(entry) = self.mask_cache.get(&(coord, bucket)) {
            if now_s - entry.written_at <= self.config.cache_ttl_s {
                return entry.mask;
            }
        }
        let mask = self.compute_mask(coord, bucket, now_s);
        self.mask_cache.insert(
            (coord, bucket),
            MaskEntry {
                mask,
                written_at: now_s,
            },
        );
        mask
    }

    fn compute_mask(&mut self, coord: GridCoord, bucket: u8, now_s: f64) -> u8 {
        let mut cardinal = [false; 4];
        let mut mask = 0u8;
        for slot in 0..4 {
            let target = coord.neighbor(slot);
            if self.is_walkable_bucket(target, bucket, now_s) {
                cardinal[slot] = true;
                mask |= 1 << slot;
            }
        }
        for (i, (a, b)) in DIAGONAL_SIDES.iter().enumerate() {
            let slot = i + 4;
            if !cardinal[*a] || !cardinal[*b] {
                continue;
            }
            let target = coord.neighbor(slot);
            if self.is_walkable_bucket(target, bucket, now_s) {
                mask |= 1 << slot;
            }
        }
        mask
    }

    /// Reachable neighbor cells, filtered by clearance, at most 8.
    pub fn neighbors(&mut self, coord: GridCoord, clearance: f32, now_s: f64) -> Vec<GridCoord> {
        let mask = self.neighbors_mask(coord, clearance, now_s);
        let mut out = Vec::with_capacity(mask.count_ones() as usize);
        for slot in 0..8 {
            if mask & (1 << slot) != 0 {
                out.push(coord.neighbor(slot));
            }
        }
        out
    }

    // ── invalidation ────────────────────────────────────────────────

    /// Drop all cached walkability and neighbor data.
    ///
    /// The region argument is accepted for forward compatibility but
    /// the clear is always wholesale: the quantized cache key cannot be
    /// mapped back to a world region, so conservative-but-correct wins.
    pub fn invalidate(&mut self, region: Option<Bounds>) {
        if let Some(r) = region {
            debug!(
                "[NavGrid] invalidate requested for ({:.1},{:.1})..({:.1},{:.1}); clearing all caches",
                r.min.x, r.min.y, r.max.x, r.max.y
            );
        }
        let dropped = self.walk_cache.len() + self.mask_cache.len();
        self.walk_cache.clear();
        self.mask_cache.clear();
        if dropped > 0 {
            debug!("[NavGrid] dropped {} cached entries", dropped);
        }
    }

    /// Number of live walkability cache entries (diagnostics)
    pub fn walk_cache_len(&self) -> usize {
        self.walk_cache.len()
    }

    /// Number of live neighbor-mask cache entries (diagnostics)
    pub fn mask_cache_len(&self) -> usize {
        self.mask_cache.len()
    }

    // ── prewarm and probes ──────────────────────────────────────────

    /// Populate neighbor masks in a `(2*ring+1)²` block of cells around
    /// a world position. Used by the scheduler ahead of long dispatches
    /// so the first real query doesn't pay a cache-miss spike.
    pub fn prewarm_around(&mut self, center: WorldPoint, ring: i32, clearance: f32, now_s: f64) {
        let c = self.world_to_grid(center);
        for dy in -ring..=ring {
            for dx in -ring..=ring {
                let coord = GridCoord::new(c.x + dx, c.y + dy);
                if self.is_valid_coord(coord) {
                    self.neighbors_mask(coord, clearance, now_s);
                }
            }
        }
    }

    /// Check a straight segment for obstruction by sampling thin probe
    /// discs every half cell. Used for cheap line-of-sight tests.
    pub fn segment_clear(&self, from: WorldPoint, to: WorldPoint) -> bool {
        let length = from.distance(&to);
        let step = self.node_radius();
        if length <= step {
            return true;
        }
        let probe = self.config.cell_size * 0.25;
        let steps = (length / step).ceil() as usize;
        let dir = (to - from).normalize();
        for i in 1..steps {
            let p = from + dir * (i as f32 * step);
            if self.field.disc_blocked(p, probe) {
                return false;
            }
        }
        true
    }

    /// ASCII rendering of baked walkability ('.' free, '#' blocked),
    /// row-major with y increasing downward. Debug aid.
    pub fn ascii_map(&self) -> String {
        let mut out = String::with_capacity((self.width + 1) * self.height);
        for y in (0..self.height).rev() {
            for x in 0..self.width {
                let walkable = self.baked[y * self.width + x];
                out.push(if walkable { '.' } else { '#' });
            }
            out.push('\n');
        }
        out
    }

    fn log_if_degenerate(&self) {
        if self.baked.iter().all(|w| !w) {
            warn!("[NavGrid] no walkable cells at baked clearance; check geometry and radii");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::RectWorld;
    use std::cell::Cell as StdCell;

    /// Counts collision queries so cache behavior is observable.
    struct CountingField {
        inner: RectWorld,
        queries: std::rc::Rc<StdCell<usize>>,
    }

    impl ObstacleField for CountingField {
        fn disc_blocked(&self, center: WorldPoint, radius: f32) -> bool {
            self.queries.set(self.queries.get() + 1);
            self.inner.disc_blocked(center, radius)
        }

        fn bounds(&self) -> Bounds {
            self.inner.bounds()
        }
    }

    fn open_world(size: f32) -> RectWorld {
        RectWorld::new(Bounds::new(WorldPoint::ZERO, WorldPoint::new(size, size)))
    }

    fn small_config() -> NavGridConfig {
        NavGridConfig {
            cell_size: 1.0,
            base_radius: 0.3,
            baked_buffer: 0.1,
            cache_ttl_s: 10.0,
            prewarm_cells_per_tick: 16,
        }
    }

    #[test]
    fn test_construction_rejects_bad_cell_size() {
        let mut config = small_config();
        config.cell_size = 0.0;
        let result = NavGrid::new(Box::new(open_world(10.0)), config);
        assert!(matches!(result, Err(NavError::Config(_))));
    }

    #[test]
    fn test_construction_rejects_empty_bounds() {
        let world = RectWorld::new(Bounds::empty());
        let result = NavGrid::new(Box::new(world), small_config());
        assert!(matches!(result, Err(NavError::Config(_))));
    }

    #[test]
    fn test_world_grid_roundtrip() {
        let grid = NavGrid::new(Box::new(open_world(10.0)), small_config()).unwrap();
        let coord = GridCoord::new(3, 7);
        let center = grid.grid_to_world(coord);
        assert_eq!(grid.world_to_grid(center), coord);
    }

    #[test]
    fn test_clearance_bucket_quantization() {
        let grid = NavGrid::new(Box::new(open_world(10.0)), small_config()).unwrap();
        // node_radius = 0.5; base_radius = 0.3 -> floor on effective radius
        assert_eq!(grid.clearance_bucket(0.0), 1);
        assert_eq!(grid.clearance_bucket(0.5), 1);
        assert_eq!(grid.clearance_bucket(0.51), 2);
        assert_eq!(grid.clearance_bucket(1.0), 2);
        assert_eq!(grid.clearance_bucket(1.01), 3);
    }

    #[test]
    fn test_walkability_cached_until_ttl() {
        let queries = std::rc::Rc::new(StdCell::new(0));
        let field = CountingField {
            inner: open_world(10.0),
            queries: queries.clone(),
        };
        let mut grid = NavGrid::new(Box::new(field), small_config()).unwrap();
        let after_bake = queries.get();

        let coord = GridCoord::new(5, 5);
        grid.is_walkable(coord, 0.4, 0.0);
        let after_first = queries.get();
        assert_eq!(after_first, after_bake + 1);

        // Repeated queries inside the TTL hit the cache
        grid.is_walkable(coord, 0.4, 5.0);
        grid.is_walkable(coord, 0.45, 9.0); // same bucket
        assert_eq!(queries.get(), after_first);

        // Past the TTL the entry is recomputed
        grid.is_walkable(coord, 0.4, 11.0);
        assert_eq!(queries.get(), after_first + 1);
    }

    #[test]
    fn test_invalidate_clears_caches() {
        let mut grid = NavGrid::new(Box::new(open_world(10.0)), small_config()).unwrap();
        grid.neighbors_mask(GridCoord::new(5, 5), 0.4, 0.0);
        assert!(grid.walk_cache_len() > 0);
        assert!(grid.mask_cache_len() > 0);

        grid.invalidate(Some(Bounds::new(
            WorldPoint::ZERO,
            WorldPoint::new(1.0, 1.0),
        )));
        assert_eq!(grid.walk_cache_len(), 0);
        assert_eq!(grid.mask_cache_len(), 0);
    }

    #[test]
    fn test_out_of_bounds_never_walkable() {
        let mut grid = NavGrid::new(Box::new(open_world(10.0)), small_config()).unwrap();
        assert!(!grid.is_walkable(GridCoord::new(-1, 0), 0.4, 0.0));
        assert!(!grid.is_walkable(GridCoord::new(0, 100), 0.4, 0.0));
    }

    #[test]
    fn test_no_corner_cutting_in_mask() {
        // Wall column through x=5 ending near y=6.2: stepping around
        // its top corner diagonally must stay illegal.
        let mut world = open_world(12.0);
        world.add_obstacle(Bounds::new(
            WorldPoint::new(5.0, 0.0),
            WorldPoint::new(6.0, 6.2),
        ));
        let mut grid = NavGrid::new(Box::new(world), small_config()).unwrap();

        // Cell just left of the wall, level with the wall's top end
        let coord = grid.world_to_grid(WorldPoint::new(4.5, 6.5));
        let mask = grid.neighbors_mask(coord, 0.3, 0.0);

        // E neighbor sits on the wall corner and is blocked, so both
        // diagonals through E (NE, SE) must be clear of the mask.
        assert_eq!(mask & (1 << 1), 0, "E should be blocked");
        assert_eq!(mask & (1 << 4), 0, "NE must not be reachable");
        assert_eq!(mask & (1 << 5), 0, "SE must not be reachable");
        // N and W stay open
        assert_ne!(mask & (1 << 0), 0);
        assert_ne!(mask & (1 << 3), 0);
    }

    #[test]
    fn test_diagonals_open_in_free_space() {
        let mut grid = NavGrid::new(Box::new(open_world(10.0)), small_config()).unwrap();
        let mask = grid.neighbors_mask(GridCoord::new(5, 5), 0.3, 0.0);
        assert_eq!(mask, 0xFF);
        assert_eq!(grid.neighbors(GridCoord::new(5, 5), 0.3, 0.0).len(), 8);
    }

    #[test]
    fn test_clearance_monotonicity_per_cell() {
        let mut world = open_world(10.0);
        world.add_obstacle(Bounds::new(
            WorldPoint::new(4.0, 4.0),
            WorldPoint::new(5.0, 5.0),
        ));
        let mut grid = NavGrid::new(Box::new(world), small_config()).unwrap();
        for y in 0..10 {
            for x in 0..10 {
                let c = GridCoord::new(x, y);
                // Walkable at a large clearance implies walkable at a
                // smaller one
                if grid.is_walkable(c, 1.0, 0.0) {
                    assert!(grid.is_walkable(c, 0.4, 0.0), "cell ({x},{y})");
                }
            }
        }
    }

    #[test]
    fn test_segment_clear() {
        let mut world = open_world(10.0);
        world.add_obstacle(Bounds::new(
            WorldPoint::new(4.0, 0.0),
            WorldPoint::new(5.0, 10.0),
        ));
        let grid = NavGrid::new(Box::new(world), small_config()).unwrap();
        assert!(grid.segment_clear(WorldPoint::new(1.0, 1.0), WorldPoint::new(1.0, 8.0)));
        assert!(!grid.segment_clear(WorldPoint::new(1.0, 5.0), WorldPoint::new(9.0, 5.0)));
    }

    #[test]
    fn test_ascii_map_dimensions() {
        let grid = NavGrid::new(Box::new(open_world(10.0)), small_config()).unwrap();
        let art = grid.ascii_map();
        assert_eq!(art.lines().count(), grid.height());
        assert!(art.lines().all(|l| l.len() == grid.width()));
    }
}
