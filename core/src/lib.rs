#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Core vocabulary shared across the Rabbit House leveling workspace.
//!
//! This crate defines the grid surface that connects the command-line adapter
//! and the leveling system. Adapters parse text into [`HeightGrid`] values, the
//! leveling system raises cells in place until the grid is safe, and adapters
//! read the final heights back out. Cells are always addressed through
//! [`Location`] values; heights are never stored outside the grid.

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Largest height difference tolerated between orthogonally adjacent cells.
pub const MAX_NEIGHBOR_DELTA: u32 = 1;

/// Location of a single grid cell expressed as row and column coordinates.
///
/// Locations order row-major: rows compare first, then columns.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Location {
    row: u32,
    column: u32,
}

impl Location {
    /// Creates a new grid cell location.
    #[must_use]
    pub const fn new(row: u32, column: u32) -> Self {
        Self { row, column }
    }

    /// Zero-based row index of the cell.
    #[must_use]
    pub const fn row(&self) -> u32 {
        self.row
    }

    /// Zero-based column index of the cell.
    #[must_use]
    pub const fn column(&self) -> u32 {
        self.column
    }

    /// Computes the Manhattan distance between two locations.
    #[must_use]
    pub fn manhattan_distance(self, other: Location) -> u32 {
        self.row().abs_diff(other.row()) + self.column().abs_diff(other.column())
    }
}

/// Reasons a height grid could not be constructed.
#[derive(Clone, Debug, PartialEq, Eq, Error)]
pub enum GridError {
    /// The grid would contain no rows or no columns.
    #[error("grid must contain at least one row and one column")]
    Empty,
    /// A row did not match the width established by the first row.
    #[error("row {row} has {found} cells but the grid is {expected} columns wide")]
    RaggedRow {
        /// Zero-based index of the offending row.
        row: usize,
        /// Number of columns established by the first row.
        expected: usize,
        /// Number of cells present in the offending row.
        found: usize,
    },
    /// A flat cell buffer did not match the declared dimensions.
    #[error("expected {expected} cells for the declared dimensions but found {found}")]
    CellCountMismatch {
        /// Number of cells implied by the dimensions.
        expected: usize,
        /// Number of cells supplied.
        found: usize,
    },
    /// The dimensions cannot be addressed with 32-bit coordinates.
    #[error("grid dimensions exceed the addressable range")]
    TooLarge,
}

/// Rectangular terrain of non-negative heights stored in row-major order.
///
/// Dimensions are fixed at construction; only individual heights change
/// afterwards. Every constructor guarantees at least one row and one column.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "GridParts")]
pub struct HeightGrid {
    rows: u32,
    columns: u32,
    heights: Vec<u32>,
}

#[derive(Deserialize)]
struct GridParts {
    rows: u32,
    columns: u32,
    heights: Vec<u32>,
}

impl TryFrom<GridParts> for HeightGrid {
    type Error = GridError;

    fn try_from(parts: GridParts) -> Result<Self, Self::Error> {
        Self::from_cells(parts.rows, parts.columns, parts.heights)
    }
}

impl HeightGrid {
    /// Builds a grid from nested rows, rejecting empty or ragged input.
    pub fn from_rows(rows: Vec<Vec<u32>>) -> Result<Self, GridError> {
        let expected = rows.first().map_or(0, Vec::len);
        if expected == 0 {
            return Err(GridError::Empty);
        }

        let mut heights = Vec::with_capacity(rows.len().saturating_mul(expected));
        for (index, row) in rows.iter().enumerate() {
            if row.len() != expected {
                return Err(GridError::RaggedRow {
                    row: index,
                    expected,
                    found: row.len(),
                });
            }
            heights.extend_from_slice(row);
        }

        let row_count = u32::try_from(rows.len()).map_err(|_| GridError::TooLarge)?;
        let column_count = u32::try_from(expected).map_err(|_| GridError::TooLarge)?;
        Self::from_cells(row_count, column_count, heights)
    }

    /// Builds a grid from a flat row-major buffer.
    pub fn from_cells(rows: u32, columns: u32, heights: Vec<u32>) -> Result<Self, GridError> {
        if rows == 0 || columns == 0 {
            return Err(GridError::Empty);
        }

        let expected = usize::try_from(rows)
            .ok()
            .zip(usize::try_from(columns).ok())
            .and_then(|(rows, columns)| rows.checked_mul(columns))
            .ok_or(GridError::TooLarge)?;

        if heights.len() != expected {
            return Err(GridError::CellCountMismatch {
                expected,
                found: heights.len(),
            });
        }

        Ok(Self {
            rows,
            columns,
            heights,
        })
    }

    /// Number of rows contained in the grid.
    #[must_use]
    pub const fn rows(&self) -> u32 {
        self.rows
    }

    /// Number of columns contained in the grid.
    #[must_use]
    pub const fn columns(&self) -> u32 {
        self.columns
    }

    /// Total number of cells in the grid.
    #[must_use]
    pub fn len(&self) -> usize {
        self.heights.len()
    }

    /// Always `false`; kept for parity with [`HeightGrid::len`].
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.heights.is_empty()
    }

    /// Dense heights stored in row-major order.
    #[must_use]
    pub fn cells(&self) -> &[u32] {
        &self.heights
    }

    /// Heights of a single row, if the row exists.
    #[must_use]
    pub fn row(&self, row: u32) -> Option<&[u32]> {
        if row >= self.rows {
            return None;
        }

        let width = usize::try_from(self.columns).ok()?;
        let start = usize::try_from(row).ok()?.checked_mul(width)?;
        self.heights.get(start..start.checked_add(width)?)
    }

    /// Iterates over the rows of the grid from top to bottom.
    pub fn iter_rows(&self) -> impl Iterator<Item = &[u32]> + '_ {
        let width = usize::try_from(self.columns).unwrap_or(usize::MAX);
        self.heights.chunks(width)
    }

    /// Reports whether the location lies within the grid.
    #[must_use]
    pub const fn contains(&self, location: Location) -> bool {
        location.row < self.rows && location.column < self.columns
    }

    /// Height stored at the location, if it lies within the grid.
    #[must_use]
    pub fn get(&self, location: Location) -> Option<u32> {
        self.index(location)
            .and_then(|offset| self.heights.get(offset).copied())
    }

    /// Replaces the height at the location, returning the previous value.
    ///
    /// Returns `None` without modifying the grid when the location lies
    /// outside the grid.
    pub fn set(&mut self, location: Location, height: u32) -> Option<u32> {
        let offset = self.index(location)?;
        let slot = self.heights.get_mut(offset)?;
        Some(std::mem::replace(slot, height))
    }

    /// Iterates over every location in row-major order.
    pub fn locations(&self) -> impl Iterator<Item = Location> {
        let columns = self.columns;
        (0..self.rows).flat_map(move |row| (0..columns).map(move |column| Location::new(row, column)))
    }

    /// Orthogonal neighbours of the location that lie within the grid.
    ///
    /// Neighbours are yielded in up, right, down, left order. Bounds are checked
    /// before a location is produced, so every yielded location is valid.
    pub fn neighbors(&self, location: Location) -> impl Iterator<Item = Location> {
        neighbors(location, self.rows, self.columns)
    }

    /// Sum of all heights in the grid.
    #[must_use]
    pub fn total_height(&self) -> u64 {
        self.heights.iter().map(|&height| u64::from(height)).sum()
    }

    /// Tallest height present in the grid.
    #[must_use]
    pub fn peak(&self) -> u32 {
        self.heights.iter().copied().max().unwrap_or(0)
    }

    /// First adjacent pair whose heights differ by more than one, scanning row-major.
    ///
    /// Only right and down neighbours are inspected so each pair is visited once.
    #[must_use]
    pub fn first_unsafe_pair(&self) -> Option<(Location, Location)> {
        self.locations().find_map(|location| {
            let height = self.get(location)?;
            let right = Location::new(location.row, location.column.checked_add(1)?);
            let down = Location::new(location.row.checked_add(1)?, location.column);

            [right, down].into_iter().find_map(|neighbor| {
                let other = self.get(neighbor)?;
                (height.abs_diff(other) > MAX_NEIGHBOR_DELTA).then_some((location, neighbor))
            })
        })
    }

    /// Reports whether every orthogonally adjacent pair differs by at most one.
    #[must_use]
    pub fn is_safe(&self) -> bool {
        self.first_unsafe_pair().is_none()
    }

    fn index(&self, location: Location) -> Option<usize> {
        if !self.contains(location) {
            return None;
        }

        let width = usize::try_from(self.columns).ok()?;
        let row = usize::try_from(location.row).ok()?;
        let column = usize::try_from(location.column).ok()?;
        row.checked_mul(width)?.checked_add(column)
    }
}

fn neighbors(location: Location, rows: u32, columns: u32) -> impl Iterator<Item = Location> {
    let mut candidates = [None; 4];
    let mut count = 0;

    if let Some(row) = location.row().checked_sub(1) {
        candidates[count] = Some(Location::new(row, location.column()));
        count += 1;
    }

    if let Some(column) = location.column().checked_add(1) {
        if column < columns {
            candidates[count] = Some(Location::new(location.row(), column));
            count += 1;
        }
    }

    if let Some(row) = location.row().checked_add(1) {
        if row < rows {
            candidates[count] = Some(Location::new(row, location.column()));
            count += 1;
        }
    }

    if let Some(column) = location.column().checked_sub(1) {
        candidates[count] = Some(Location::new(location.row(), column));
        count += 1;
    }

    candidates.into_iter().take(count).flatten()
}
