//! Core types for the heatsim distributed stencil solver.
//!
//! This is the leaf crate with zero internal dependencies. It defines
//! the padded [`Field`] buffer, the strongly-typed identifiers shared by
//! the topology and transport layers, and the fatal error taxonomy.

#![deny(missing_docs)]
#![deny(rustdoc::broken_intra_doc_links)]
#![forbid(unsafe_code)]

pub mod error;
pub mod field;
pub mod id;

pub use error::{ConfigError, FieldError, ResourceError, TransportError};
pub use field::{Field, StridedView, StridedViewMut};
pub use id::{Dims, GridCoord, Rank, Tag};
