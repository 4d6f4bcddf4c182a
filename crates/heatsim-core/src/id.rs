//! Strongly-typed identifiers: worker ranks, grid coordinates and message tags.

use std::fmt;

/// Linear identity of a worker within a job.
///
/// Ranks are dense in `0..size`. Rank 0 is the coordinator.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Rank(pub usize);

impl Rank {
    /// The coordinator rank: owns the partition table and performs image I/O.
    pub const COORDINATOR: Rank = Rank(0);

    /// Whether this rank is the coordinator.
    pub fn is_coordinator(self) -> bool {
        self == Self::COORDINATOR
    }
}

impl fmt::Display for Rank {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<usize> for Rank {
    fn from(v: usize) -> Self {
        Self(v)
    }
}

/// Position of a worker on the 2D process grid.
///
/// `x` runs along the horizontal decomposition (`0..dims.x`), `y` along
/// the vertical one (`0..dims.y`).
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct GridCoord {
    /// Column of the process grid.
    pub x: usize,
    /// Row of the process grid.
    pub y: usize,
}

impl GridCoord {
    /// Construct a grid coordinate.
    pub fn new(x: usize, y: usize) -> Self {
        Self { x, y }
    }
}

impl fmt::Display for GridCoord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({}, {})", self.x, self.y)
    }
}

/// Decomposition factors of the process grid: `x` columns by `y` rows.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct Dims {
    /// Number of column bands (horizontal decomposition).
    pub x: usize,
    /// Number of row bands (vertical decomposition).
    pub y: usize,
}

impl Dims {
    /// Construct decomposition factors.
    pub fn new(x: usize, y: usize) -> Self {
        Self { x, y }
    }

    /// Number of workers the grid requires.
    pub fn count(&self) -> usize {
        self.x * self.y
    }

    /// Whether `coord` lies on this grid.
    pub fn contains(&self, coord: GridCoord) -> bool {
        coord.x < self.x && coord.y < self.y
    }
}

impl fmt::Display for Dims {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}x{}", self.x, self.y)
    }
}

/// Message tag used to match sends with receives.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Tag(pub u32);

impl fmt::Display for Tag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<u32> for Tag {
    fn from(v: u32) -> Self {
        Self(v)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn coordinator_is_rank_zero() {
        assert!(Rank(0).is_coordinator());
        assert!(!Rank(3).is_coordinator());
    }

    #[test]
    fn dims_count_and_contains() {
        let d = Dims::new(3, 2);
        assert_eq!(d.count(), 6);
        assert!(d.contains(GridCoord::new(2, 1)));
        assert!(!d.contains(GridCoord::new(3, 0)));
        assert!(!d.contains(GridCoord::new(0, 2)));
    }

    #[test]
    fn display_formats() {
        assert_eq!(Dims::new(4, 2).to_string(), "4x2");
        assert_eq!(GridCoord::new(1, 3).to_string(), "(1, 3)");
        assert_eq!(Rank(7).to_string(), "7");
        assert_eq!(Tag(12).to_string(), "12");
    }
}
