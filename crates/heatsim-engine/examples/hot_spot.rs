//! Diffuse a single hot cell on a 2x2 worker grid and print the result.
//!
//! Run with: `cargo run -p heatsim-engine --example hot_spot`

use heatsim_core::{Dims, Field};
use heatsim_engine::{run_job, SimConfig};
use heatsim_kernel::ForcingPolicy;

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let mut input = Field::new(8, 6)?;
    input.set(1, 1, 1000.0);

    let config = SimConfig {
        dims: Dims::new(2, 2),
        iterations: 4,
        forcing: ForcingPolicy::None,
        ..SimConfig::default()
    };
    let output = run_job(&config, input, config.dims.count())?;

    println!("{output}");
    println!("total heat: {:.3}", output.interior_sum());
    Ok(())
}
