//! Benchmark profiles for heatsim.
//!
//! - [`reference_profile`]: 256x256 field on a 2x2 grid, 20 iterations
//! - [`stress_profile`]: 1024x1024 field on a 4x4 grid, 20 iterations
//! - [`seeded_field`]: deterministic input temperatures

#![forbid(unsafe_code)]
#![deny(rustdoc::broken_intra_doc_links)]

use heatsim_core::{Dims, Field};
use heatsim_engine::SimConfig;
use heatsim_kernel::ForcingPolicy;
use rand::prelude::*;
use rand_chacha::ChaCha8Rng;

/// Hottest input temperature used by the profiles.
pub const PEAK: f64 = 1000.0;

/// A `width × height` field of temperatures in `[0, PEAK)` from a ChaCha8
/// stream seeded with `seed`.
pub fn seeded_field(width: usize, height: usize, seed: u64) -> Field {
    let mut rng = ChaCha8Rng::seed_from_u64(seed);
    let data = (0..width * height)
        .map(|_| rng.random_range(0.0..PEAK))
        .collect();
    Field::from_vec(width, height, data).expect("seeded field shape")
}

/// 256x256 (64K cells) on 4 workers.
pub fn reference_profile(seed: u64) -> (SimConfig, Field) {
    let config = SimConfig {
        dims: Dims::new(2, 2),
        iterations: 20,
        forcing: ForcingPolicy::Max,
        ..SimConfig::default()
    };
    (config, seeded_field(256, 256, seed))
}

/// 1024x1024 (1M cells) on 16 workers.
pub fn stress_profile(seed: u64) -> (SimConfig, Field) {
    let config = SimConfig {
        dims: Dims::new(4, 4),
        iterations: 20,
        forcing: ForcingPolicy::Max,
        ..SimConfig::default()
    };
    (config, seeded_field(1024, 1024, seed))
}
