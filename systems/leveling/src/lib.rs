#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Pure leveling system that raises terrain until every neighbouring pair is safe.
//!
//! A run repeatedly secures the tallest remaining cell. Once a cell is the
//! tallest unsecured one, nothing can force it higher, so its height is final
//! and the only work left is to lift any neighbour sitting more than one unit
//! below it. Lifted neighbours move buckets in [`HeightBuckets`] and are
//! revisited when they become the tallest cell themselves.

mod buckets;

pub use buckets::HeightBuckets;

use rabbit_house_core::{HeightGrid, Location, MAX_NEIGHBOR_DELTA};

/// Summary of a completed leveling run.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct LevelingOutcome {
    total_added: u64,
    secured: usize,
    raises: usize,
    peak: u32,
}

impl LevelingOutcome {
    /// Total height added across every cell during the run.
    #[must_use]
    pub const fn total_added(&self) -> u64 {
        self.total_added
    }

    /// Number of cells secured from the tallest bucket.
    ///
    /// Cells at height zero are never secured because they cannot lift anything.
    #[must_use]
    pub const fn secured(&self) -> usize {
        self.secured
    }

    /// Number of individual neighbour raises applied.
    #[must_use]
    pub const fn raises(&self) -> usize {
        self.raises
    }

    /// Tallest height present when the run started.
    #[must_use]
    pub const fn peak(&self) -> u32 {
        self.peak
    }
}

/// Raises the grid in place until it is safe and returns the height added.
pub fn level(grid: &mut HeightGrid) -> u64 {
    Leveling::default().run(grid).total_added()
}

/// Leveling system that drives a single grid from its initial heights to a safe state.
#[derive(Debug, Default)]
pub struct Leveling;

impl Leveling {
    /// Creates a new leveling system instance.
    #[must_use]
    pub const fn new() -> Self {
        Self
    }

    /// Levels the grid in place and reports what the run did.
    ///
    /// The grid is borrowed exclusively for the whole run; the bucket store is
    /// created here and dropped before returning, so nothing carries over
    /// between grids.
    pub fn run(&self, grid: &mut HeightGrid) -> LevelingOutcome {
        let mut run = LevelingRun::seed(grid);

        while let Some(location) = run.next_tallest() {
            run.secure(location);
        }

        let outcome = run.outcome;
        log::debug!(
            "leveled {}x{} grid: peak {}, secured {}, raises {}, added {}",
            grid.rows(),
            grid.columns(),
            outcome.peak,
            outcome.secured,
            outcome.raises,
            outcome.total_added,
        );
        outcome
    }
}

struct LevelingRun<'grid> {
    grid: &'grid mut HeightGrid,
    buckets: HeightBuckets,
    outcome: LevelingOutcome,
}

impl<'grid> LevelingRun<'grid> {
    fn seed(grid: &'grid mut HeightGrid) -> Self {
        let mut buckets = HeightBuckets::new();
        for location in grid.locations() {
            if let Some(height) = grid.get(location) {
                let _ = buckets.insert(height, location);
            }
        }

        let outcome = LevelingOutcome {
            peak: buckets.max_height(),
            ..LevelingOutcome::default()
        };

        Self {
            grid,
            buckets,
            outcome,
        }
    }

    /// Tallest unsecured cell, or `None` once only zero-height cells remain.
    fn next_tallest(&self) -> Option<Location> {
        if self.buckets.max_height() == 0 {
            return None;
        }

        let location = self
            .buckets
            .peek_max()
            .expect("a non-zero maximum implies a populated bucket");
        Some(location)
    }

    fn secure(&mut self, location: Location) {
        let height = self.buckets.max_height();
        debug_assert_eq!(self.grid.get(location), Some(height));

        for neighbor in self.grid.neighbors(location) {
            self.raise_if_unsafe(height, neighbor);
        }

        let removed = self.buckets.remove(height, location);
        assert!(removed, "secured cell {location:?} missing from bucket {height}");
        self.outcome.secured += 1;
        log::trace!("secured {location:?} at height {height}");
    }

    fn raise_if_unsafe(&mut self, height: u32, neighbor: Location) {
        let Some(neighbor_height) = self.grid.get(neighbor) else {
            return;
        };

        let gap = height.saturating_sub(neighbor_height);
        if gap <= MAX_NEIGHBOR_DELTA {
            return;
        }

        let target = height - MAX_NEIGHBOR_DELTA;
        let _ = self.grid.set(neighbor, target);
        self.outcome.total_added += u64::from(gap - MAX_NEIGHBOR_DELTA);
        self.outcome.raises += 1;

        let moved = self.buckets.remove(neighbor_height, neighbor);
        assert!(moved, "raised cell {neighbor:?} missing from bucket {neighbor_height}");
        let _ = self.buckets.insert(target, neighbor);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn grid(rows: &[&[u32]]) -> HeightGrid {
        HeightGrid::from_rows(rows.iter().map(|row| row.to_vec()).collect())
            .expect("valid grid")
    }

    #[test]
    fn lifts_single_low_neighbour() {
        let mut heights = grid(&[&[5, 1]]);

        assert_eq!(level(&mut heights), 3);
        assert_eq!(heights.cells(), &[5, 4]);
    }

    #[test]
    fn raised_neighbour_is_revisited_as_tallest() {
        let mut heights = grid(&[&[5, 1, 1]]);

        let outcome = Leveling::new().run(&mut heights);

        assert_eq!(outcome.total_added(), 5);
        assert_eq!(outcome.raises(), 2);
        assert_eq!(outcome.peak(), 5);
        assert_eq!(heights.cells(), &[5, 4, 3]);
    }

    #[test]
    fn flat_grid_needs_nothing() {
        let mut heights = grid(&[&[2, 2], &[2, 2]]);

        let outcome = Leveling::new().run(&mut heights);

        assert_eq!(outcome.total_added(), 0);
        assert_eq!(outcome.raises(), 0);
        assert_eq!(outcome.secured(), 4);
        assert_eq!(heights.cells(), &[2, 2, 2, 2]);
    }

    #[test]
    fn single_cell_needs_nothing() {
        let mut heights = grid(&[&[7]]);

        assert_eq!(level(&mut heights), 0);
        assert_eq!(heights.cells(), &[7]);
    }

    #[test]
    fn peak_lifts_both_sides() {
        let mut heights = grid(&[&[0], &[5], &[0]]);

        assert_eq!(level(&mut heights), 8);
        assert_eq!(heights.cells(), &[4, 5, 4]);
    }

    #[test]
    fn all_zero_grid_secures_nothing() {
        let mut heights = grid(&[&[0, 0, 0]]);

        let outcome = Leveling::new().run(&mut heights);

        assert_eq!(outcome, LevelingOutcome::default());
    }

    #[test]
    fn adjacent_difference_of_one_is_left_alone() {
        let mut heights = grid(&[&[3, 2, 1, 0]]);

        assert_eq!(level(&mut heights), 0);
        assert_eq!(heights.cells(), &[3, 2, 1, 0]);
    }

    #[test]
    fn two_peaks_share_a_valley() {
        let mut heights = grid(&[&[6, 0, 0, 0, 6]]);

        assert_eq!(level(&mut heights), 5 + 4 + 5);
        assert_eq!(heights.cells(), &[6, 5, 4, 5, 6]);
    }
}
