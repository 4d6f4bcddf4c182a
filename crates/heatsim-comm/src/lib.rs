//! Message passing between heatsim workers.
//!
//! Workers never share buffers. Every transfer moves an owned [`Payload`]
//! from one rank's endpoint to another's, matched by `(source, tag)` the
//! way point-to-point MPI messages are.
//!
//! - [`Communicator`]: the transport seam. Non-blocking `isend`/`irecv`
//!   return [`Request`] handles; one [`wait_all`](Communicator::wait_all)
//!   completes a batch of them.
//! - [`ChannelComm`]: in-process backend, one endpoint per worker thread,
//!   built on crossbeam channels.
//! - `MpiComm` (feature `mpi`): one OS process per worker over MPI, for
//!   jobs started with `mpirun -n <dimx*dimy>`.
//!
//! Any failure is fatal. [`Communicator::abort`] broadcasts a job-wide
//! abort that fails every pending and future receive on every endpoint.

#![deny(missing_docs)]
#![deny(rustdoc::broken_intra_doc_links)]
#![forbid(unsafe_code)]

pub mod channel;
pub mod communicator;
pub mod payload;
#[cfg(feature = "mpi")]
pub mod mpi_comm;
pub mod request;
mod wire;

pub use channel::ChannelComm;
#[cfg(feature = "mpi")]
pub use mpi_comm::MpiComm;
pub use communicator::{Communicator, BARRIER_ARRIVE, BARRIER_RELEASE};
pub use payload::Payload;
pub use request::{Request, Requests};
