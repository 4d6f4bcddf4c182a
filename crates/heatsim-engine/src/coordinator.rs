//! Coordinator-only state.

use heatsim_core::{Dims, Field, FieldError, GridCoord};
use heatsim_space::{PartitionError, PartitionTable, TileBounds};

/// The partition table and the global output buffer, held by rank 0 only.
///
/// Workers without a `Coordinator` have no way to reach either, which keeps
/// decomposition and reassembly on one rank.
#[derive(Debug)]
pub struct Coordinator {
    table: PartitionTable,
    global: Field,
}

impl Coordinator {
    /// Split `global` over the `dims` process grid.
    ///
    /// The same buffer later receives the merged result.
    pub fn new(global: Field, dims: Dims) -> Result<Self, PartitionError> {
        let table = PartitionTable::split(&global, dims)?;
        Ok(Self { table, global })
    }

    /// Tile destined for the worker at `coord`.
    pub fn tile(&self, coord: GridCoord) -> Result<&Field, FieldError> {
        self.table.tile(coord)
    }

    /// Global rectangle of the tile at `coord`.
    pub fn bounds(&self, coord: GridCoord) -> Result<TileBounds, FieldError> {
        self.table.bounds(coord)
    }

    /// Overwrite the stored tile at `coord` with `result`'s interior.
    pub fn store(&mut self, coord: GridCoord, result: &Field) -> Result<(), FieldError> {
        result.copy_into(self.table.tile_mut(coord)?)
    }

    /// Merge every stored tile into the global field and return it.
    pub fn assemble(self) -> Result<Field, FieldError> {
        let Self { table, mut global } = self;
        table.merge(&mut global)?;
        Ok(global)
    }

    /// The process grid.
    pub fn dims(&self) -> Dims {
        self.table.dims()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn stored_tiles_show_up_in_the_assembled_field() {
        let global = Field::filled(4, 2, 1.0).unwrap();
        let mut c = Coordinator::new(global, Dims::new(2, 1)).unwrap();
        assert_eq!(c.bounds(GridCoord::new(1, 0)).unwrap().x, 2);

        let result = Field::filled(2, 2, 9.0).unwrap().repad(1).unwrap();
        c.store(GridCoord::new(1, 0), &result).unwrap();
        let out = c.assemble().unwrap();
        assert_eq!(out.interior_row(0), &[1.0, 1.0, 9.0, 9.0]);
        assert_eq!(out.interior_row(1), &[1.0, 1.0, 9.0, 9.0]);
    }

    #[test]
    fn wrong_tile_shape_is_rejected() {
        let mut c = Coordinator::new(Field::new(4, 4).unwrap(), Dims::new(2, 2)).unwrap();
        let wrong = Field::new(3, 2).unwrap();
        assert!(matches!(
            c.store(GridCoord::new(0, 0), &wrong),
            Err(FieldError::ShapeMismatch { .. })
        ));
    }
}
