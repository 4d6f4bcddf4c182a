//! Error types for heatsim.
//!
//! Every category here is fatal to a distributed run: there is no
//! recoverable path once a worker fails, so the job runner converts any
//! of these into a job-wide abort. They are organized by subsystem:
//! configuration, transport, resource allocation and field shape checks.

use std::error::Error;
use std::fmt;

use crate::id::{Dims, GridCoord, Rank, Tag};

/// Inconsistent run configuration, detected before any transfer begins.
#[derive(Clone, Debug, PartialEq)]
pub enum ConfigError {
    /// A decomposition factor is zero.
    ZeroDimension {
        /// Which axis (`"dimx"` or `"dimy"`).
        axis: &'static str,
    },
    /// `dims.x * dims.y` does not equal the number of workers.
    DecompositionMismatch {
        /// Requested process grid.
        dims: Dims,
        /// Number of workers actually available.
        workers: usize,
    },
    /// A rank outside `0..size` was used to build a topology.
    RankOutOfRange {
        /// The offending rank.
        rank: Rank,
        /// Number of workers in the job.
        size: usize,
    },
    /// The global field has fewer cells than the process grid on some axis,
    /// which would leave a worker with an empty tile.
    FieldTooSmall {
        /// Global field width.
        width: usize,
        /// Global field height.
        height: usize,
        /// Requested process grid.
        dims: Dims,
    },
    /// Ghost padding is not supported by the exchange protocol.
    UnsupportedPadding {
        /// The configured padding.
        padding: usize,
    },
    /// A kernel coefficient is out of its stable range.
    InvalidKernel {
        /// Description of the violated constraint.
        reason: String,
    },
    /// The forcing policy name is not recognised.
    InvalidForcing {
        /// The rejected name.
        name: String,
    },
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::ZeroDimension { axis } => write!(f, "{axis} must be greater than 0"),
            Self::DecompositionMismatch { dims, workers } => write!(
                f,
                "2D decomposition {dims} needs {} workers, job has {workers}",
                dims.count()
            ),
            Self::RankOutOfRange { rank, size } => {
                write!(f, "rank {rank} out of range for job of size {size}")
            }
            Self::FieldTooSmall {
                width,
                height,
                dims,
            } => write!(
                f,
                "field {width}x{height} cannot be split over a {dims} process grid"
            ),
            Self::UnsupportedPadding { padding } => {
                write!(f, "halo padding {padding} unsupported, expected 1")
            }
            Self::InvalidKernel { reason } => write!(f, "invalid kernel: {reason}"),
            Self::InvalidForcing { name } => {
                write!(f, "unknown forcing policy '{name}' (expected min, max, add or none)")
            }
        }
    }
}

impl Error for ConfigError {}

/// Failure of a send, receive, barrier or topology lookup.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum TransportError {
    /// The peer's endpoint is gone (its worker exited or panicked).
    Disconnected {
        /// The unreachable peer.
        peer: Rank,
    },
    /// Another worker signalled a job-wide abort.
    Aborted {
        /// Rank that raised the abort.
        origin: Rank,
        /// Diagnostic supplied by the aborting worker.
        reason: String,
    },
    /// A message was addressed to a rank outside the job.
    NoSuchRank {
        /// The invalid destination or source.
        rank: Rank,
        /// Number of workers in the job.
        size: usize,
    },
    /// A received buffer does not have the length the receiver expected.
    SizeMismatch {
        /// Tag of the offending message.
        tag: Tag,
        /// Expected number of samples.
        expected: usize,
        /// Number of samples actually received.
        actual: usize,
    },
    /// A received payload has the wrong kind (extent vs. samples).
    UnexpectedPayload {
        /// Tag of the offending message.
        tag: Tag,
        /// The payload kind the receiver expected.
        expected: &'static str,
    },
    /// A coordinator-only operation was invoked without a coordinator.
    MissingCoordinator {
        /// The rank that expected to hold the partition table.
        rank: Rank,
    },
    /// A tag does not fit the transport's tag range.
    TagOutOfRange {
        /// The unrepresentable tag.
        tag: Tag,
    },
    /// A message could not be decoded into a payload.
    Malformed {
        /// Sender of the message.
        source: Rank,
        /// Tag of the message.
        tag: Tag,
    },
}

impl fmt::Display for TransportError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Disconnected { peer } => write!(f, "peer {peer} disconnected"),
            Self::Aborted { origin, reason } => {
                write!(f, "job aborted by rank {origin}: {reason}")
            }
            Self::NoSuchRank { rank, size } => {
                write!(f, "rank {rank} does not exist in a job of size {size}")
            }
            Self::SizeMismatch {
                tag,
                expected,
                actual,
            } => write!(
                f,
                "message tag {tag}: expected {expected} samples, received {actual}"
            ),
            Self::UnexpectedPayload { tag, expected } => {
                write!(f, "message tag {tag}: expected {expected} payload")
            }
            Self::MissingCoordinator { rank } => {
                write!(f, "rank {rank} has no partition table")
            }
            Self::TagOutOfRange { tag } => write!(f, "message tag {tag} is out of range"),
            Self::Malformed { source, tag } => {
                write!(f, "malformed message from rank {source} with tag {tag}")
            }
        }
    }
}

impl Error for TransportError {}

/// Allocation failure for a tile or transfer buffer.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum ResourceError {
    /// The padded buffer size does not fit in `usize`.
    SizeOverflow {
        /// Requested interior width.
        width: usize,
        /// Requested interior height.
        height: usize,
        /// Requested ghost padding.
        padding: usize,
    },
    /// The allocator refused the buffer.
    AllocationFailed {
        /// Number of samples requested.
        samples: usize,
    },
    /// A worker thread could not be spawned.
    WorkerSpawnFailed {
        /// Rank the worker would have run.
        rank: Rank,
        /// Description from the OS.
        reason: String,
    },
}

impl fmt::Display for ResourceError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::SizeOverflow {
                width,
                height,
                padding,
            } => write!(
                f,
                "field {width}x{height} with padding {padding} overflows usize"
            ),
            Self::AllocationFailed { samples } => {
                write!(f, "failed to allocate {samples} samples")
            }
            Self::WorkerSpawnFailed { rank, reason } => {
                write!(f, "failed to spawn worker {rank}: {reason}")
            }
        }
    }
}

impl Error for ResourceError {}

/// Shape or index errors on [`Field`](crate::Field) operations.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum FieldError {
    /// Two fields that must share a shape do not.
    ShapeMismatch {
        /// `(width, height)` of the destination.
        expected: (usize, usize),
        /// `(width, height)` of the source.
        actual: (usize, usize),
    },
    /// A backing buffer has the wrong number of samples.
    LengthMismatch {
        /// Samples required by the shape.
        expected: usize,
        /// Samples supplied.
        actual: usize,
    },
    /// A row/column index falls outside the field, ghosts included.
    IndexOutOfBounds {
        /// The offending index.
        index: isize,
        /// Human-readable description of the valid range.
        bounds: String,
    },
    /// A grid coordinate is outside the process grid.
    CoordOutOfBounds {
        /// The offending coordinate.
        coord: GridCoord,
        /// The process grid.
        dims: Dims,
    },
    /// Buffer allocation failed while reshaping a field.
    Resource(ResourceError),
}

impl fmt::Display for FieldError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::ShapeMismatch { expected, actual } => write!(
                f,
                "shape mismatch: expected {}x{}, got {}x{}",
                expected.0, expected.1, actual.0, actual.1
            ),
            Self::LengthMismatch { expected, actual } => {
                write!(f, "buffer holds {actual} samples, shape needs {expected}")
            }
            Self::IndexOutOfBounds { index, bounds } => {
                write!(f, "index {index} out of bounds: {bounds}")
            }
            Self::CoordOutOfBounds { coord, dims } => {
                write!(f, "grid coordinate {coord} outside {dims} process grid")
            }
            Self::Resource(e) => write!(f, "{e}"),
        }
    }
}

impl Error for FieldError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Resource(e) => Some(e),
            _ => None,
        }
    }
}

impl From<ResourceError> for FieldError {
    fn from(e: ResourceError) -> Self {
        Self::Resource(e)
    }
}
