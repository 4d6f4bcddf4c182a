//! Deterministic input fields.

use heatsim_core::{Dims, Field, GridCoord};
use heatsim_space::PartitionTable;

/// Sample `i` (row-major) holds `i as f64`.
pub fn numbered(width: usize, height: usize) -> Field {
    let data = (0..width * height).map(|i| i as f64).collect();
    Field::from_vec(width, height, data).expect("numbered fixture")
}

/// Every sample holds `value`.
pub fn constant(width: usize, height: usize, value: f64) -> Field {
    Field::filled(width, height, value).expect("constant fixture")
}

/// Zero everywhere except `value` at `(x, y)`.
pub fn hot_spot(width: usize, height: usize, x: usize, y: usize, value: f64) -> Field {
    let mut f = Field::new(width, height).expect("hot spot fixture");
    f.set(x, y, value);
    f
}

/// A smooth-ish pseudo-random pattern in `[0, max)`, stable across runs.
pub fn pattern(width: usize, height: usize, max: f64) -> Field {
    let data = (0..width * height)
        .map(|i| ((i * 7919 + 104_729) % 1000) as f64 / 1000.0 * max)
        .collect();
    Field::from_vec(width, height, data).expect("pattern fixture")
}

/// Each tile of the `dims` decomposition filled with `100 * (rank + 1)`,
/// so every tile is distinguishable from its neighbours.
pub fn per_tile(width: usize, height: usize, dims: Dims) -> Field {
    let mut f = Field::new(width, height).expect("per-tile fixture");
    let table = PartitionTable::split(&f, dims).expect("per-tile decomposition");
    for cx in 0..dims.x {
        for cy in 0..dims.y {
            let b = table
                .bounds(GridCoord::new(cx, cy))
                .expect("tile in grid");
            let value = 100.0 * (cx * dims.y + cy + 1) as f64;
            for y in b.y..b.y + b.height {
                for x in b.x..b.x + b.width {
                    f.set(x, y, value);
                }
            }
        }
    }
    f
}
