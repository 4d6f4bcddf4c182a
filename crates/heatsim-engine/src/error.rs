//! Job-level error reporting.
//!
//! Worker code returns subsystem errors; [`SimError`] pins each one to the
//! rank that hit it and the [`Operation`] it was performing, so a failed
//! job can say exactly where it broke.

use std::error::Error;
use std::fmt;

use heatsim_core::{ConfigError, FieldError, Rank, ResourceError, TransportError};
use heatsim_space::PartitionError;

/// The step a worker was performing when it failed.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Operation {
    /// Checking the configuration before start.
    Validate,
    /// Starting a worker thread.
    Spawn,
    /// Resolving the worker's place on the process grid.
    Topology,
    /// Splitting the global field into tiles (coordinator).
    Decompose,
    /// Distributing or receiving tiles.
    Scatter,
    /// Folding the source field into the tile.
    ForceSource,
    /// Exchanging halo rows and columns.
    Exchange,
    /// Running the stencil kernel.
    Diffuse,
    /// Collecting final tiles (barrier included).
    Gather,
    /// Reassembling the global field (coordinator).
    Merge,
    /// Collecting a worker's outcome.
    Join,
}

impl Operation {
    /// Lowercase name for logs and messages.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Validate => "validate",
            Self::Spawn => "spawn",
            Self::Topology => "topology",
            Self::Decompose => "decompose",
            Self::Scatter => "scatter",
            Self::ForceSource => "force-source",
            Self::Exchange => "exchange",
            Self::Diffuse => "diffuse",
            Self::Gather => "gather",
            Self::Merge => "merge",
            Self::Join => "join",
        }
    }
}

impl fmt::Display for Operation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// What went wrong.
#[derive(Clone, Debug, PartialEq)]
pub enum ErrorKind {
    /// Inconsistent configuration.
    Config(ConfigError),
    /// A transfer failed or the job was aborted.
    Transport(TransportError),
    /// An allocation failed.
    Resource(ResourceError),
    /// A field shape or index check failed.
    Field(FieldError),
    /// The worker panicked.
    Panicked {
        /// The panic payload, if it was a string.
        message: String,
    },
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Config(e) => write!(f, "configuration: {e}"),
            Self::Transport(e) => write!(f, "transport: {e}"),
            Self::Resource(e) => write!(f, "resource: {e}"),
            Self::Field(e) => write!(f, "field: {e}"),
            Self::Panicked { message } => write!(f, "worker panicked: {message}"),
        }
    }
}

impl From<ConfigError> for ErrorKind {
    fn from(e: ConfigError) -> Self {
        Self::Config(e)
    }
}

impl From<TransportError> for ErrorKind {
    fn from(e: TransportError) -> Self {
        Self::Transport(e)
    }
}

impl From<ResourceError> for ErrorKind {
    fn from(e: ResourceError) -> Self {
        Self::Resource(e)
    }
}

impl From<FieldError> for ErrorKind {
    fn from(e: FieldError) -> Self {
        match e {
            FieldError::Resource(r) => Self::Resource(r),
            other => Self::Field(other),
        }
    }
}

impl From<PartitionError> for ErrorKind {
    fn from(e: PartitionError) -> Self {
        match e {
            PartitionError::Config(c) => c.into(),
            PartitionError::Field(f) => f.into(),
        }
    }
}

/// A fatal job error, attributed to a rank and an operation.
#[derive(Clone, Debug, PartialEq)]
pub struct SimError {
    /// Rank that reported the error.
    pub rank: Rank,
    /// What that rank was doing.
    pub operation: Operation,
    /// The underlying failure.
    pub kind: ErrorKind,
}

impl SimError {
    /// Attribute `kind` to `rank` performing `operation`.
    pub fn new(rank: Rank, operation: Operation, kind: impl Into<ErrorKind>) -> Self {
        Self {
            rank,
            operation,
            kind: kind.into(),
        }
    }

    /// Whether this error is only the echo of another worker's abort.
    ///
    /// When several workers fail, the one that is *not* an abort echo is
    /// the root cause.
    pub fn is_abort(&self) -> bool {
        matches!(
            self.kind,
            ErrorKind::Transport(TransportError::Aborted { .. })
        )
    }
}

impl fmt::Display for SimError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "rank {}: {} failed: {}", self.rank, self.operation, self.kind)
    }
}

impl Error for SimError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match &self.kind {
            ErrorKind::Config(e) => Some(e),
            ErrorKind::Transport(e) => Some(e),
            ErrorKind::Resource(e) => Some(e),
            ErrorKind::Field(e) => Some(e),
            ErrorKind::Panicked { .. } => None,
        }
    }
}

/// Attach a rank and operation to a subsystem result.
pub(crate) trait During<T> {
    fn during(self, rank: Rank, operation: Operation) -> Result<T, SimError>;
}

impl<T, E: Into<ErrorKind>> During<T> for Result<T, E> {
    fn during(self, rank: Rank, operation: Operation) -> Result<T, SimError> {
        self.map_err(|e| SimError::new(rank, operation, e))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use heatsim_core::Dims;

    #[test]
    fn display_names_rank_and_operation() {
        let e = SimError::new(
            Rank(0),
            Operation::Validate,
            ConfigError::DecompositionMismatch {
                dims: Dims::new(2, 2),
                workers: 3,
            },
        );
        assert_eq!(
            e.to_string(),
            "rank 0: validate failed: configuration: 2D decomposition 2x2 needs 4 workers, job has 3"
        );
        assert!(e.source().is_some());
    }

    #[test]
    fn field_allocation_failures_surface_as_resource_errors() {
        let kind = ErrorKind::from(FieldError::Resource(ResourceError::AllocationFailed {
            samples: 64,
        }));
        assert_eq!(
            kind,
            ErrorKind::Resource(ResourceError::AllocationFailed { samples: 64 })
        );
    }

    #[test]
    fn abort_echoes_are_recognised() {
        let echo = SimError::new(
            Rank(2),
            Operation::Exchange,
            TransportError::Aborted {
                origin: Rank(1),
                reason: "boom".into(),
            },
        );
        assert!(echo.is_abort());
        let cause = SimError::new(
            Rank(1),
            Operation::Exchange,
            TransportError::Disconnected { peer: Rank(0) },
        );
        assert!(!cause.is_abort());
    }

    #[test]
    fn during_wraps_errors_in_place() {
        let r: Result<(), TransportError> = Err(TransportError::NoSuchRank {
            rank: Rank(9),
            size: 4,
        });
        let e = r.during(Rank(3), Operation::Scatter).unwrap_err();
        assert_eq!(e.rank, Rank(3));
        assert_eq!(e.operation, Operation::Scatter);
    }
}
