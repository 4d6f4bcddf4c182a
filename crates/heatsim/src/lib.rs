//! heatsim: distributed 2D heat diffusion on a periodic process grid.
//!
//! This is the facade crate. It re-exports the sub-crates, and adds the
//! PNG input/output and command-line layers used by the `heatsim` binary.
//!
//! # Quick start
//!
//! ```rust
//! use heatsim::prelude::*;
//!
//! let mut input = Field::new(8, 8).unwrap();
//! input.set(3, 3, MAX_TEMP);
//! let config = SimConfig {
//!     dims: Dims::new(2, 2),
//!     iterations: 10,
//!     ..SimConfig::default()
//! };
//! let output = run_job(&config, input, 4).unwrap();
//! assert_eq!(output.shape(), (8, 8));
//! ```
//!
//! # Modules
//!
//! | Module | Sub-crate | Contents |
//! |--------|-----------|----------|
//! | [`types`] | `heatsim-core` | Ids, padded fields, error taxonomy |
//! | [`space`] | `heatsim-space` | Periodic topology, tile decomposition |
//! | [`comm`] | `heatsim-comm` | Tagged non-blocking message passing |
//! | [`kernel`] | `heatsim-kernel` | Stencils and forcing policies |
//! | [`engine`] | `heatsim-engine` | Scatter, halo exchange, iteration, gather |

#![deny(missing_docs)]
#![deny(rustdoc::broken_intra_doc_links)]
#![forbid(unsafe_code)]

pub mod cli;
pub mod image_io;

/// Core types and errors (`heatsim-core`).
pub use heatsim_core as types;

/// Process-grid topology and tile decomposition (`heatsim-space`).
pub use heatsim_space as space;

/// Message passing between workers (`heatsim-comm`).
///
/// [`comm::ChannelComm`] runs every worker in this process; with the `mpi`
/// feature, `comm::MpiComm` runs one process per worker.
pub use heatsim_comm as comm;

/// Stencil kernels and forcing policies (`heatsim-kernel`).
pub use heatsim_kernel as kernel;

/// The distributed job runner (`heatsim-engine`).
pub use heatsim_engine as engine;

/// Temperature represented by a full-intensity pixel.
pub const MAX_TEMP: f64 = 1000.0;

/// Output path used when none is given.
pub const DEFAULT_OUTPUT: &str = "heatsim.png";

/// Common imports for typical heatsim usage.
pub mod prelude {
    pub use crate::MAX_TEMP;

    // Core types and errors
    pub use heatsim_core::{ConfigError, Dims, Field, GridCoord, Rank, TransportError};

    // Topology
    pub use heatsim_space::{CartTopology, Direction, PartitionTable};

    // Kernels
    pub use heatsim_kernel::{ExplicitDiffusion, FivePointMean, ForcingPolicy, Kernel, KernelChoice};

    // Engine
    pub use heatsim_engine::{
        run_job, run_job_with_kernel, run_rank, ErrorKind, Operation, SimConfig, SimError,
    };
}
