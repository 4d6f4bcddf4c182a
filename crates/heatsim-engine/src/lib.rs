//! Distributed heat-diffusion job runner.
//!
//! A job is `dims.x * dims.y` workers on a periodic process grid. Rank 0
//! doubles as the coordinator: it splits the global field into tiles,
//! scatters them, takes part in the iteration like every other worker, and
//! finally gathers and reassembles the result.
//!
//! Each worker runs
//!
//! ```text
//! Init → { ForceSource → Exchange → Diffuse → Swap } × N → Done
//! ```
//!
//! on its own tile, touching its neighbours only through the four-way
//! [halo exchange](halo::exchange). [`run_job`] wires this up in-process,
//! one thread per worker over [`ChannelComm`](heatsim_comm::ChannelComm);
//! [`run_rank`] is the per-process entry point for jobs whose workers are
//! separate processes (one per MPI rank), over any
//! [`Communicator`](heatsim_comm::Communicator).

#![deny(missing_docs)]
#![deny(rustdoc::broken_intra_doc_links)]
#![forbid(unsafe_code)]

pub mod config;
pub mod coordinator;
pub mod error;
pub mod halo;
pub mod job;
pub mod protocol;
pub mod transport;
pub mod worker;

pub use config::SimConfig;
pub use coordinator::Coordinator;
pub use error::{ErrorKind, Operation, SimError};
pub use job::{run_job, run_job_with_kernel, run_rank, run_worker};
pub use worker::{Phase, Worker};
