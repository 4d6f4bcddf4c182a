//! Coordinator-side decomposition of a global field into per-worker tiles.
//!
//! # Band rule
//!
//! An axis of `len` cells is cut into `parts` contiguous bands of
//! `len / parts` cells; the first `len % parts` bands take one extra cell.
//! [`band`] is the single source of truth for this rule and is used by both
//! [`PartitionTable::split`] and [`PartitionTable::merge`].

use std::error::Error;
use std::fmt;

use heatsim_core::{ConfigError, Dims, Field, FieldError, GridCoord};

/// `(start, size)` of band `index` when `len` cells are cut into `parts`.
///
/// # Panics
///
/// Panics if `parts` is zero.
///
/// # Examples
///
/// ```
/// use heatsim_space::band;
///
/// // 10 cells over 4 bands: 3, 3, 2, 2.
/// assert_eq!(band(10, 4, 0), (0, 3));
/// assert_eq!(band(10, 4, 1), (3, 3));
/// assert_eq!(band(10, 4, 2), (6, 2));
/// assert_eq!(band(10, 4, 3), (8, 2));
/// ```
pub fn band(len: usize, parts: usize, index: usize) -> (usize, usize) {
    let base = len / parts;
    let rem = len % parts;
    let size = base + usize::from(index < rem);
    let start = index * base + index.min(rem);
    (start, size)
}

/// Errors from building a [`PartitionTable`].
#[derive(Clone, Debug, PartialEq)]
pub enum PartitionError {
    /// The process grid cannot tile the field.
    Config(ConfigError),
    /// A tile could not be allocated or copied.
    Field(FieldError),
}

impl fmt::Display for PartitionError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Config(e) => write!(f, "partition: {e}"),
            Self::Field(e) => write!(f, "partition: {e}"),
        }
    }
}

impl Error for PartitionError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Config(e) => Some(e),
            Self::Field(e) => Some(e),
        }
    }
}

impl From<ConfigError> for PartitionError {
    fn from(e: ConfigError) -> Self {
        Self::Config(e)
    }
}

impl From<FieldError> for PartitionError {
    fn from(e: FieldError) -> Self {
        Self::Field(e)
    }
}

/// Rectangle of the global field owned by one tile.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct TileBounds {
    /// First global column.
    pub x: usize,
    /// First global row.
    pub y: usize,
    /// Columns in the tile.
    pub width: usize,
    /// Rows in the tile.
    pub height: usize,
}

/// One unpadded [`Field`] per process-grid coordinate.
///
/// Held only by the coordinator. Tiles are stored in rank order
/// (`x * dims.y + y`), matching the topology's rank layout.
#[derive(Clone, Debug, PartialEq)]
pub struct PartitionTable {
    dims: Dims,
    width: usize,
    height: usize,
    tiles: Vec<Field>,
}

impl PartitionTable {
    /// Check that `dims` can tile a `width × height` field without leaving
    /// any worker an empty tile.
    pub fn check(width: usize, height: usize, dims: Dims) -> Result<(), ConfigError> {
        if dims.x == 0 {
            return Err(ConfigError::ZeroDimension { axis: "dimx" });
        }
        if dims.y == 0 {
            return Err(ConfigError::ZeroDimension { axis: "dimy" });
        }
        if width < dims.x || height < dims.y {
            return Err(ConfigError::FieldTooSmall {
                width,
                height,
                dims,
            });
        }
        Ok(())
    }

    /// Split `global` into `dims.x` column bands by `dims.y` row bands.
    pub fn split(global: &Field, dims: Dims) -> Result<Self, PartitionError> {
        let (width, height) = global.shape();
        Self::check(width, height, dims)?;
        let mut tiles = Vec::with_capacity(dims.count());
        for cx in 0..dims.x {
            let (x0, tw) = band(width, dims.x, cx);
            for cy in 0..dims.y {
                let (y0, th) = band(height, dims.y, cy);
                let mut tile = Field::new(tw, th).map_err(FieldError::from)?;
                for ty in 0..th {
                    tile.interior_row_mut(ty)
                        .copy_from_slice(&global.interior_row(y0 + ty)[x0..x0 + tw]);
                }
                tiles.push(tile);
            }
        }
        Ok(Self {
            dims,
            width,
            height,
            tiles,
        })
    }

    /// Copy every tile back into its rectangle of `global`.
    ///
    /// Call only once every tile holds its final values.
    pub fn merge(&self, global: &mut Field) -> Result<(), FieldError> {
        if global.shape() != (self.width, self.height) {
            return Err(FieldError::ShapeMismatch {
                expected: (self.width, self.height),
                actual: global.shape(),
            });
        }
        for (coord, tile) in self.iter() {
            let b = self.bounds(coord)?;
            for ty in 0..b.height {
                global.interior_row_mut(b.y + ty)[b.x..b.x + b.width]
                    .copy_from_slice(tile.interior_row(ty));
            }
        }
        Ok(())
    }

    fn index(&self, coord: GridCoord) -> Result<usize, FieldError> {
        if !self.dims.contains(coord) {
            return Err(FieldError::CoordOutOfBounds {
                coord,
                dims: self.dims,
            });
        }
        Ok(coord.x * self.dims.y + coord.y)
    }

    /// Tile owned by the worker at `coord`.
    pub fn tile(&self, coord: GridCoord) -> Result<&Field, FieldError> {
        let i = self.index(coord)?;
        Ok(&self.tiles[i])
    }

    /// Mutable tile owned by the worker at `coord`.
    pub fn tile_mut(&mut self, coord: GridCoord) -> Result<&mut Field, FieldError> {
        let i = self.index(coord)?;
        Ok(&mut self.tiles[i])
    }

    /// Global rectangle covered by the tile at `coord`.
    pub fn bounds(&self, coord: GridCoord) -> Result<TileBounds, FieldError> {
        self.index(coord)?;
        let (x, width) = band(self.width, self.dims.x, coord.x);
        let (y, height) = band(self.height, self.dims.y, coord.y);
        Ok(TileBounds {
            x,
            y,
            width,
            height,
        })
    }

    /// Tiles with their grid coordinates, in rank order.
    pub fn iter(&self) -> impl Iterator<Item = (GridCoord, &Field)> {
        let dy = self.dims.y;
        self.tiles
            .iter()
            .enumerate()
            .map(move |(i, t)| (GridCoord::new(i / dy, i % dy), t))
    }

    /// The process grid.
    pub fn dims(&self) -> Dims {
        self.dims
    }

    /// `(width, height)` of the global field.
    pub fn global_shape(&self) -> (usize, usize) {
        (self.width, self.height)
    }

    /// Sum of all tile areas. Equals `width * height` by construction.
    pub fn total_area(&self) -> usize {
        self.tiles.iter().map(Field::len).sum()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn numbered(width: usize, height: usize) -> Field {
        let data = (0..width * height).map(|i| i as f64).collect();
        Field::from_vec(width, height, data).unwrap()
    }

    #[test]
    fn remainder_goes_to_first_bands() {
        assert_eq!(band(7, 3, 0), (0, 3));
        assert_eq!(band(7, 3, 1), (3, 2));
        assert_eq!(band(7, 3, 2), (5, 2));
        assert_eq!(band(8, 1, 0), (0, 8));
    }

    #[test]
    fn split_copies_the_right_rectangles() {
        let global = numbered(5, 3);
        let table = PartitionTable::split(&global, Dims::new(2, 1)).unwrap();
        let left = table.tile(GridCoord::new(0, 0)).unwrap();
        let right = table.tile(GridCoord::new(1, 0)).unwrap();
        assert_eq!(left.shape(), (3, 3));
        assert_eq!(right.shape(), (2, 3));
        assert_eq!(left.interior_row(1), &[5.0, 6.0, 7.0]);
        assert_eq!(right.interior_row(2), &[13.0, 14.0]);
    }

    #[test]
    fn merge_inverts_split() {
        let global = numbered(9, 7);
        let table = PartitionTable::split(&global, Dims::new(4, 3)).unwrap();
        let mut out = Field::new(9, 7).unwrap();
        table.merge(&mut out).unwrap();
        assert_eq!(out, global);
    }

    #[test]
    fn merge_sees_tile_updates() {
        let global = Field::new(4, 4).unwrap();
        let mut table = PartitionTable::split(&global, Dims::new(2, 2)).unwrap();
        table.tile_mut(GridCoord::new(1, 0)).unwrap().fill(3.0);
        let mut out = Field::new(4, 4).unwrap();
        table.merge(&mut out).unwrap();
        assert_eq!(out.get(3, 0), 3.0);
        assert_eq!(out.get(2, 1), 3.0);
        assert_eq!(out.get(1, 1), 0.0);
        assert_eq!(out.get(3, 2), 0.0);
    }

    #[test]
    fn tile_lookup_outside_grid_fails() {
        let table = PartitionTable::split(&numbered(4, 4), Dims::new(2, 2)).unwrap();
        assert!(matches!(
            table.tile(GridCoord::new(2, 0)),
            Err(FieldError::CoordOutOfBounds { .. })
        ));
        assert!(table.bounds(GridCoord::new(0, 2)).is_err());
    }

    #[test]
    fn split_rejects_grid_wider_than_field() {
        assert_eq!(
            PartitionTable::split(&numbered(2, 8), Dims::new(3, 1)),
            Err(PartitionError::Config(ConfigError::FieldTooSmall {
                width: 2,
                height: 8,
                dims: Dims::new(3, 1)
            }))
        );
    }

    #[test]
    fn merge_rejects_wrong_global_shape() {
        let table = PartitionTable::split(&numbered(4, 4), Dims::new(2, 2)).unwrap();
        let mut out = Field::new(4, 5).unwrap();
        assert!(matches!(
            table.merge(&mut out),
            Err(FieldError::ShapeMismatch { .. })
        ));
    }

    proptest! {
        #[test]
        fn tiles_cover_every_cell_exactly_once(
            width in 1usize..40,
            height in 1usize..40,
            dx in 1usize..6,
            dy in 1usize..6,
        ) {
            prop_assume!(width >= dx && height >= dy);
            let table = PartitionTable::split(&numbered(width, height), Dims::new(dx, dy)).unwrap();
            prop_assert_eq!(table.total_area(), width * height);

            let mut owners = vec![0u32; width * height];
            for (coord, tile) in table.iter() {
                let b = table.bounds(coord).unwrap();
                prop_assert_eq!(tile.shape(), (b.width, b.height));
                prop_assert!(b.width >= 1 && b.height >= 1);
                for y in b.y..b.y + b.height {
                    for x in b.x..b.x + b.width {
                        owners[y * width + x] += 1;
                    }
                }
            }
            prop_assert!(owners.iter().all(|&n| n == 1));
        }
    }
}
