//! Cooperative cache prewarm.
//!
//! [`PrewarmTask`] walks the whole grid in small batches, populating
//! neighbor masks for a declared set of clearance radii before first
//! use. It is a resumable task with an explicit cursor: the host drives
//! it with [`PrewarmTask::tick`] once per frame and it does at most
//! `prewarm_cells_per_tick` cells of work before yielding, so it never
//! stalls a frame. There is no cancellation beyond not ticking it.

use log::debug;

use crate::core::GridCoord;

use super::NavGrid;

/// Progress report from a prewarm tick.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum PrewarmStatus {
    /// More cells remain; call `tick` again next frame.
    InProgress,
    /// Every cell/radius pair has been visited.
    Done,
}

/// Resumable background task that fills the neighbor-mask cache.
#[derive(Clone, Debug)]
pub struct PrewarmTask {
    /// Clearance radii to warm, one full grid pass each.
    radii: Vec<f32>,
    /// Linear cursor over `cells × radii`.
    cursor: usize,
}

impl PrewarmTask {
    /// Create a task covering the given clearance radii.
    pub fn new(radii: Vec<f32>) -> Self {
        Self { radii, cursor: 0 }
    }

    /// Restart from the beginning (e.g. after an invalidation).
    pub fn reset(&mut self) {
        self.cursor = 0;
    }

    /// Fraction of the total work already done, in [0, 1].
    pub fn progress(&self, grid: &NavGrid) -> f32 {
        let total = self.total_steps(grid);
        if total == 0 {
            return 1.0;
        }
        (self.cursor.min(total) as f32) / total as f32
    }

    fn total_steps(&self, grid: &NavGrid) -> usize {
        grid.width() * grid.height() * self.radii.len()
    }

    /// Do one bounded batch of warming work.
    pub fn tick(&mut self, grid: &mut NavGrid, now_s: f64) -> PrewarmStatus {
        let total = self.total_steps(grid);
        if self.cursor >= total {
            return PrewarmStatus::Done;
        }
        let cells = grid.width() * grid.height();
        let budget = grid.prewarm_batch().max(1);
        let end = (self.cursor + budget).min(total);
        while self.cursor < end {
            let radius_idx = self.cursor / cells;
            let cell_idx = self.cursor % cells;
            let coord = GridCoord::new(
                (cell_idx % grid.width()) as i32,
                (cell_idx / grid.width()) as i32,
            );
            grid.neighbors_mask(coord, self.radii[radius_idx], now_s);
            self.cursor += 1;
        }
        if self.cursor >= total {
            debug!(
                "[Prewarm] complete: {} cells x {} radii",
                cells,
                self.radii.len()
            );
            PrewarmStatus::Done
        } else {
            PrewarmStatus::InProgress
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::{Bounds, RectWorld, WorldPoint};
    use crate::grid::NavGridConfig;

    fn grid(cells_per_tick: usize) -> NavGrid {
        let world = RectWorld::new(Bounds::new(WorldPoint::ZERO, WorldPoint::new(8.0, 8.0)));
        let config = NavGridConfig {
            cell_size: 1.0,
            base_radius: 0.3,
            baked_buffer: 0.1,
            cache_ttl_s: 60.0,
            prewarm_cells_per_tick: cells_per_tick,
        };
        NavGrid::new(Box::new(world), config).unwrap()
    }

    #[test]
    fn test_prewarm_completes_in_bounded_ticks() {
        let mut g = grid(16);
        let mut task = PrewarmTask::new(vec![0.3, 0.8]);
        // 8x8 cells x 2 radii = 128 steps, 16 per tick = 8 ticks
        let mut ticks = 0;
        while task.tick(&mut g, 0.0) == PrewarmStatus::InProgress {
            ticks += 1;
            assert!(ticks < 100, "prewarm failed to terminate");
        }
        assert_eq!(ticks, 7); // 8th tick reports Done
        assert!(task.progress(&g) >= 1.0);
        // Every cell/bucket pair is now cached
        assert_eq!(g.mask_cache_len(), 8 * 8 * 2);
    }

    #[test]
    fn test_prewarm_is_resumable() {
        let mut g = grid(10);
        let mut task = PrewarmTask::new(vec![0.3]);
        assert_eq!(task.tick(&mut g, 0.0), PrewarmStatus::InProgress);
        let after_one = task.progress(&g);
        assert!(after_one > 0.0 && after_one < 1.0);

        assert_eq!(task.tick(&mut g, 0.0), PrewarmStatus::InProgress);
        assert!(task.progress(&g) > after_one);
    }

    #[test]
    fn test_reset_restarts() {
        let mut g = grid(64);
        let mut task = PrewarmTask::new(vec![0.3]);
        assert_eq!(task.tick(&mut g, 0.0), PrewarmStatus::Done);
        task.reset();
        assert_eq!(task.progress(&g), 0.0);
    }

    #[test]
    fn test_done_is_sticky() {
        let mut g = grid(64);
        let mut task = PrewarmTask::new(vec![0.3]);
        assert_eq!(task.tick(&mut g, 0.0), PrewarmStatus::Done);
        assert_eq!(task.tick(&mut g, 0.0), PrewarmStatus::Done);
    }
}
