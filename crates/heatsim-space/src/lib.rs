//! Process-grid topology and domain decomposition for heatsim.
//!
//! - [`CartTopology`]: a periodic (toroidal) 2D arrangement of workers,
//!   resolving each worker's grid coordinate and its four neighbours.
//! - [`PartitionTable`]: the coordinator-side split of a global field into
//!   one tile per worker, and the inverse merge.
//!
//! Both share the band rule in [`partition::band`], so decomposition and
//! reassembly agree on every tile boundary.

#![deny(missing_docs)]
#![deny(rustdoc::broken_intra_doc_links)]
#![forbid(unsafe_code)]

pub mod partition;
pub mod topology;

pub use partition::{band, PartitionError, PartitionTable, TileBounds};
pub use topology::{CartTopology, Direction};
