//! Run configuration and startup validation.

use heatsim_core::{ConfigError, Dims};
use heatsim_kernel::{ForcingPolicy, KernelChoice};
use heatsim_space::PartitionTable;

/// Iterations run when none are requested.
pub const DEFAULT_ITERATIONS: u64 = 100;

/// Everything a job needs besides the input field and the worker count.
#[derive(Clone, Debug, PartialEq)]
pub struct SimConfig {
    /// Process grid. Default: 1×1.
    pub dims: Dims,
    /// Number of stencil iterations. Default: 100.
    pub iterations: u64,
    /// Ghost ring width of every tile. Only 1 is supported.
    pub padding: usize,
    /// How the source field is folded in each iteration. Default: `Min`.
    pub forcing: ForcingPolicy,
    /// Stencil update. Default: five-point mean.
    pub kernel: KernelChoice,
}

impl Default for SimConfig {
    fn default() -> Self {
        Self {
            dims: Dims::new(1, 1),
            iterations: DEFAULT_ITERATIONS,
            padding: 1,
            forcing: ForcingPolicy::default(),
            kernel: KernelChoice::default(),
        }
    }
}

impl SimConfig {
    /// Check the configuration against the number of workers.
    ///
    /// Pure validation; runs before any worker starts or any message is
    /// sent.
    pub fn validate(&self, workers: usize) -> Result<(), ConfigError> {
        if self.dims.x == 0 {
            return Err(ConfigError::ZeroDimension { axis: "dimx" });
        }
        if self.dims.y == 0 {
            return Err(ConfigError::ZeroDimension { axis: "dimy" });
        }
        if self.dims.x.checked_mul(self.dims.y) != Some(workers) {
            return Err(ConfigError::DecompositionMismatch {
                dims: self.dims,
                workers,
            });
        }
        if self.padding != 1 {
            return Err(ConfigError::UnsupportedPadding {
                padding: self.padding,
            });
        }
        self.kernel.build()?;
        Ok(())
    }

    /// [`validate`](Self::validate) plus the check that a
    /// `width × height` field gives every worker a non-empty tile.
    pub fn validate_for_field(
        &self,
        workers: usize,
        width: usize,
        height: usize,
    ) -> Result<(), ConfigError> {
        self.validate(workers)?;
        PartitionTable::check(width, height, self.dims)
    }
}
