//! Fixtures and a single-field reference solver for heatsim tests.
//!
//! - [`fixtures`]: deterministic input fields.
//! - [`reference_run`]: the whole-field toroidal solver distributed runs
//!   are checked against.
//! - [`on_each_rank`]: run a closure on every rank of an in-process grid.

#![forbid(unsafe_code)]
#![allow(missing_docs)]
#![deny(rustdoc::broken_intra_doc_links)]

pub mod fixtures;
mod grid;
mod reference;

pub use grid::on_each_rank;
pub use reference::{reference_run, wrap_ghosts};
