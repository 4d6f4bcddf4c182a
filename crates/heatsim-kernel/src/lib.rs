//! Per-tile numerics for heatsim.
//!
//! A worker step is two local operations around the halo exchange:
//!
//! 1. [`ForcingPolicy::apply`] folds the fixed source field into `current`.
//! 2. [`Kernel::apply`] reads `current` (ghosts included) and writes every
//!    interior cell of `next`.
//!
//! Neither touches the network; both are pure functions of their inputs.

#![deny(missing_docs)]
#![deny(rustdoc::broken_intra_doc_links)]
#![forbid(unsafe_code)]

pub mod forcing;
pub mod kernel;

pub use forcing::ForcingPolicy;
pub use kernel::{ExplicitDiffusion, FivePointMean, Kernel, KernelChoice};
