//! Height-indexed priority store used by the leveling run.

use std::collections::{BTreeMap, BTreeSet};

use rabbit_house_core::Location;

/// Buckets of grid locations keyed by the height they currently hold.
///
/// The store never reads the grid. Callers keep it consistent by removing a
/// location from its old bucket before inserting it at a new height. Empty
/// buckets are dropped eagerly so the tallest key is always populated, and the
/// cached maximum falls back to zero once nothing remains.
#[derive(Clone, Debug, Default)]
pub struct HeightBuckets {
    buckets: BTreeMap<u32, BTreeSet<Location>>,
    max_height: u32,
    len: usize,
}

impl HeightBuckets {
    /// Creates an empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds the location to the bucket for `height`.
    ///
    /// Returns `false` when the location was already present in that bucket.
    pub fn insert(&mut self, height: u32, location: Location) -> bool {
        if !self.buckets.entry(height).or_default().insert(location) {
            return false;
        }

        self.len += 1;
        if height > self.max_height {
            self.max_height = height;
        }
        true
    }

    /// Removes the location from the bucket for `height`.
    ///
    /// Returns `false` when the location was not stored at that height. When
    /// the tallest bucket empties, the maximum drops to the next populated
    /// height, or zero when the store is exhausted.
    pub fn remove(&mut self, height: u32, location: Location) -> bool {
        let Some(bucket) = self.buckets.get_mut(&height) else {
            return false;
        };

        if !bucket.remove(&location) {
            return false;
        }

        self.len -= 1;
        if bucket.is_empty() {
            let _ = self.buckets.remove(&height);
            if height == self.max_height {
                self.max_height = self.buckets.keys().next_back().copied().unwrap_or(0);
            }
        }
        true
    }

    /// Location chosen from the tallest bucket, or `None` when the store is empty.
    ///
    /// Ties resolve to the lowest row-major location so runs are reproducible.
    #[must_use]
    pub fn peek_max(&self) -> Option<Location> {
        self.buckets
            .get(&self.max_height)
            .and_then(|bucket| bucket.first().copied())
    }

    /// Tallest height with a populated bucket, or zero when empty.
    #[must_use]
    pub const fn max_height(&self) -> u32 {
        self.max_height
    }

    /// Reports whether the location is stored in the bucket for `height`.
    #[must_use]
    pub fn contains(&self, height: u32, location: Location) -> bool {
        self.buckets
            .get(&height)
            .is_some_and(|bucket| bucket.contains(&location))
    }

    /// Number of locations across every bucket.
    #[must_use]
    pub const fn len(&self) -> usize {
        self.len
    }

    /// Reports whether every bucket has been drained.
    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.len == 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn insert_tracks_running_maximum() {
        let mut buckets = HeightBuckets::new();

        assert!(buckets.insert(3, Location::new(0, 0)));
        assert!(buckets.insert(7, Location::new(0, 1)));
        assert!(buckets.insert(5, Location::new(0, 2)));

        assert_eq!(buckets.max_height(), 7);
        assert_eq!(buckets.peek_max(), Some(Location::new(0, 1)));
        assert_eq!(buckets.len(), 3);
    }

    #[test]
    fn duplicate_insert_is_ignored() {
        let mut buckets = HeightBuckets::new();

        assert!(buckets.insert(4, Location::new(1, 1)));
        assert!(!buckets.insert(4, Location::new(1, 1)));
        assert_eq!(buckets.len(), 1);
    }

    #[test]
    fn removing_last_tallest_member_falls_to_next_bucket() {
        let mut buckets = HeightBuckets::new();
        let _ = buckets.insert(2, Location::new(0, 0));
        let _ = buckets.insert(9, Location::new(0, 1));
        let _ = buckets.insert(9, Location::new(1, 0));

        assert!(buckets.remove(9, Location::new(0, 1)));
        assert_eq!(buckets.max_height(), 9, "bucket still holds a member");

        assert!(buckets.remove(9, Location::new(1, 0)));
        assert_eq!(buckets.max_height(), 2);
        assert_eq!(buckets.peek_max(), Some(Location::new(0, 0)));
    }

    #[test]
    fn removing_lower_bucket_keeps_maximum() {
        let mut buckets = HeightBuckets::new();
        let _ = buckets.insert(2, Location::new(0, 0));
        let _ = buckets.insert(6, Location::new(0, 1));

        assert!(buckets.remove(2, Location::new(0, 0)));
        assert_eq!(buckets.max_height(), 6);
        assert!(!buckets.contains(2, Location::new(0, 0)));
    }

    #[test]
    fn remove_rejects_wrong_height() {
        let mut buckets = HeightBuckets::new();
        let _ = buckets.insert(4, Location::new(0, 0));

        assert!(!buckets.remove(3, Location::new(0, 0)));
        assert!(!buckets.remove(4, Location::new(0, 1)));
        assert!(buckets.contains(4, Location::new(0, 0)));
    }

    #[test]
    fn draining_resets_maximum_to_zero() {
        let mut buckets = HeightBuckets::new();
        let _ = buckets.insert(5, Location::new(0, 0));

        assert!(buckets.remove(5, Location::new(0, 0)));
        assert!(buckets.is_empty());
        assert_eq!(buckets.max_height(), 0);
        assert_eq!(buckets.peek_max(), None);
    }

    #[test]
    fn ties_resolve_to_lowest_row_major_location() {
        let mut buckets = HeightBuckets::new();
        let _ = buckets.insert(3, Location::new(2, 0));
        let _ = buckets.insert(3, Location::new(0, 4));
        let _ = buckets.insert(3, Location::new(0, 1));

        assert_eq!(buckets.peek_max(), Some(Location::new(0, 1)));
    }

    #[test]
    fn moving_a_location_between_buckets() {
        let mut buckets = HeightBuckets::new();
        let cell = Location::new(1, 2);
        let _ = buckets.insert(1, cell);
        let _ = buckets.insert(6, Location::new(0, 0));

        assert!(buckets.remove(1, cell));
        assert!(buckets.insert(5, cell));

        assert!(buckets.contains(5, cell));
        assert!(!buckets.contains(1, cell));
        assert_eq!(buckets.len(), 2);
        assert_eq!(buckets.max_height(), 6);
    }
}
