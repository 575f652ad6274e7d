//! Shared per-tick work budget.
//!
//! A frame-scoped pool of work permits (ray casts, probe queries)
//! shared by every agent. The scheduler owns one, resets it at the top
//! of each tick, and hands out `&FrameBudget` to consumers — an
//! explicit injectable service rather than ambient global counters.
//! Interior mutability is a plain `Cell` because the whole core runs on
//! one logical thread per tick.

use std::cell::Cell;

/// Frame-scoped counter of remaining work permits.
#[derive(Debug)]
pub struct FrameBudget {
    per_tick: u32,
    remaining: Cell<u32>,
}

impl FrameBudget {
    /// Create a budget refilled to `per_tick` permits on each reset.
    pub fn new(per_tick: u32) -> Self {
        Self {
            per_tick,
            remaining: Cell::new(per_tick),
        }
    }

    /// Refill to the full per-tick amount. Called once per tick.
    pub fn reset(&self) {
        self.remaining.set(self.per_tick);
    }

    /// Take `n` permits if available. Returns false (taking nothing)
    /// when fewer than `n` remain.
    pub fn try_take(&self, n: u32) -> bool {
        let left = self.remaining.get();
        if left >= n {
            self.remaining.set(left - n);
            true
        } else {
            false
        }
    }

    /// Permits left this tick.
    pub fn remaining(&self) -> u32 {
        self.remaining.get()
    }

    /// Permits granted per tick.
    pub fn per_tick(&self) -> u32 {
        self.per_tick
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_take_until_exhausted() {
        let budget = FrameBudget::new(5);
        assert!(budget.try_take(3));
        assert_eq!(budget.remaining(), 2);
        assert!(!budget.try_take(3));
        assert_eq!(budget.remaining(), 2); // failed take leaves it alone
        assert!(budget.try_take(2));
        assert!(!budget.try_take(1));
    }

    #[test]
    fn test_reset_refills() {
        let budget = FrameBudget::new(4);
        assert!(budget.try_take(4));
        budget.reset();
        assert_eq!(budget.remaining(), 4);
    }
}
