//! Periodic 2D Cartesian process topology.

use heatsim_core::{ConfigError, Dims, GridCoord, Rank};
use smallvec::SmallVec;

/// One of the four cardinal exchange directions.
///
/// North is towards row `y - 1`, south towards `y + 1`, west towards
/// column `x - 1`, east towards `x + 1`.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Direction {
    /// Towards the previous process row.
    North,
    /// Towards the next process row.
    South,
    /// Towards the next process column.
    East,
    /// Towards the previous process column.
    West,
}

impl Direction {
    /// All four directions in exchange order.
    pub const ALL: [Direction; 4] = [
        Direction::North,
        Direction::South,
        Direction::East,
        Direction::West,
    ];

    /// The direction pointing back.
    pub fn opposite(self) -> Self {
        match self {
            Self::North => Self::South,
            Self::South => Self::North,
            Self::East => Self::West,
            Self::West => Self::East,
        }
    }

    /// `(dx, dy)` step on the process grid.
    pub fn offset(self) -> (isize, isize) {
        match self {
            Self::North => (0, -1),
            Self::South => (0, 1),
            Self::East => (1, 0),
            Self::West => (-1, 0),
        }
    }

    fn index(self) -> usize {
        match self {
            Self::North => 0,
            Self::South => 1,
            Self::East => 2,
            Self::West => 3,
        }
    }
}

/// Wrap an axis value onto `0..len` (periodic boundary).
fn wrap(val: isize, len: usize) -> usize {
    let n = len as isize;
    (((val % n) + n) % n) as usize
}

/// A worker's view of the periodic process grid.
///
/// Ranks are laid out row-major over `(x, y)` with `y` varying fastest,
/// i.e. `rank = x * dims.y + y`. Every axis wraps, so the grid is a torus:
/// workers on an edge exchange with the worker on the opposite edge, and a
/// 1×1 grid is its own neighbour in all four directions.
///
/// # Examples
///
/// ```
/// use heatsim_core::{Dims, GridCoord, Rank};
/// use heatsim_space::{CartTopology, Direction};
///
/// let topo = CartTopology::new(Dims::new(3, 2), 6, Rank(0)).unwrap();
/// assert_eq!(topo.coord(), GridCoord::new(0, 0));
/// // North of row 0 wraps to row 1.
/// assert_eq!(topo.neighbour(Direction::North), Rank(1));
/// // West of column 0 wraps to column 2.
/// assert_eq!(topo.neighbour(Direction::West), Rank(4));
/// ```
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct CartTopology {
    dims: Dims,
    rank: Rank,
    coord: GridCoord,
    neighbours: [Rank; 4],
}

impl CartTopology {
    /// Build the descriptor for `rank` in a job of `size` workers.
    ///
    /// Fails if either factor is zero, if `dims.x * dims.y != size`, or if
    /// `rank` is not in `0..size`. All are fatal configuration errors.
    pub fn new(dims: Dims, size: usize, rank: Rank) -> Result<Self, ConfigError> {
        if dims.x == 0 {
            return Err(ConfigError::ZeroDimension { axis: "dimx" });
        }
        if dims.y == 0 {
            return Err(ConfigError::ZeroDimension { axis: "dimy" });
        }
        if dims.x.checked_mul(dims.y) != Some(size) {
            return Err(ConfigError::DecompositionMismatch {
                dims,
                workers: size,
            });
        }
        if rank.0 >= size {
            return Err(ConfigError::RankOutOfRange { rank, size });
        }
        let coord = GridCoord::new(rank.0 / dims.y, rank.0 % dims.y);
        let mut neighbours = [rank; 4];
        for dir in Direction::ALL {
            let n = shift_coord(dims, coord, dir);
            neighbours[dir.index()] = Rank(n.x * dims.y + n.y);
        }
        Ok(Self {
            dims,
            rank,
            coord,
            neighbours,
        })
    }

    /// The process grid.
    pub fn dims(&self) -> Dims {
        self.dims
    }

    /// Number of workers in the job.
    pub fn size(&self) -> usize {
        self.dims.count()
    }

    /// This worker's rank.
    pub fn rank(&self) -> Rank {
        self.rank
    }

    /// This worker's position on the process grid.
    pub fn coord(&self) -> GridCoord {
        self.coord
    }

    /// Rank of the neighbour in `dir`, with wraparound.
    pub fn neighbour(&self, dir: Direction) -> Rank {
        self.neighbours[dir.index()]
    }

    /// All four neighbours, in [`Direction::ALL`] order.
    pub fn neighbours(&self) -> SmallVec<[(Direction, Rank); 4]> {
        Direction::ALL
            .iter()
            .map(|&d| (d, self.neighbour(d)))
            .collect()
    }

    /// Rank owning `coord`, or `None` if it is off the grid.
    pub fn rank_at(&self, coord: GridCoord) -> Option<Rank> {
        self.dims
            .contains(coord)
            .then(|| Rank(coord.x * self.dims.y + coord.y))
    }

    /// Grid position of `rank`, or `None` if it is not in the job.
    pub fn coord_of(&self, rank: Rank) -> Option<GridCoord> {
        (rank.0 < self.size()).then(|| GridCoord::new(rank.0 / self.dims.y, rank.0 % self.dims.y))
    }

    /// Every `(rank, coord)` pair of the job in rank order.
    pub fn ranks(&self) -> impl Iterator<Item = (Rank, GridCoord)> + '_ {
        (0..self.size()).map(move |r| {
            let rank = Rank(r);
            (rank, GridCoord::new(r / self.dims.y, r % self.dims.y))
        })
    }
}

fn shift_coord(dims: Dims, coord: GridCoord, dir: Direction) -> GridCoord {
    let (dx, dy) = dir.offset();
    GridCoord::new(
        wrap(coord.x as isize + dx, dims.x),
        wrap(coord.y as isize + dy, dims.y),
    )
}
