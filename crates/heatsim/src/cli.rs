//! Command-line options and logging setup for the `heatsim` binary.

use std::path::PathBuf;

use clap::{Parser, ValueEnum};
use heatsim_core::Dims;
use heatsim_engine::config::DEFAULT_ITERATIONS;
use heatsim_engine::SimConfig;
use heatsim_kernel::{ForcingPolicy, KernelChoice};
use tracing_subscriber::EnvFilter;

use crate::DEFAULT_OUTPUT;

/// Where the workers of a job run.
#[derive(ValueEnum, Clone, Copy, Debug, PartialEq, Eq)]
pub enum Backend {
    /// One process per worker over MPI; start with `mpirun -n <dimx*dimy>`.
    Mpi,
    /// One thread per worker inside this process.
    Threads,
}

impl Backend {
    /// Name used on the command line.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Mpi => "mpi",
            Self::Threads => "threads",
        }
    }
}

impl Default for Backend {
    /// `mpi` in builds with the `mpi` feature, `threads` otherwise.
    fn default() -> Self {
        if cfg!(feature = "mpi") {
            Self::Mpi
        } else {
            Self::Threads
        }
    }
}

/// heatsim command-line arguments.
#[derive(Parser, Debug, Clone, PartialEq)]
#[command(
    name = "heatsim",
    version,
    about = "Distributed 2D heat diffusion on a periodic process grid"
)]
pub struct Cli {
    /// Number of iterations to perform.
    #[arg(long = "iter", default_value_t = DEFAULT_ITERATIONS)]
    pub iterations: u64,

    /// 2D decomposition in the x dimension.
    #[arg(long, default_value_t = 1)]
    pub dimx: usize,

    /// 2D decomposition in the y dimension.
    #[arg(long, default_value_t = 1)]
    pub dimy: usize,

    /// PNG input file; its red channel is the heat source.
    #[arg(long)]
    pub input: PathBuf,

    /// PNG output file.
    #[arg(long, default_value = DEFAULT_OUTPUT)]
    pub output: PathBuf,

    /// Print options and per-worker context, and log at debug level.
    #[arg(short, long)]
    pub verbose: bool,

    /// Worker backend.
    #[arg(long, value_enum, default_value_t = Backend::default())]
    pub backend: Backend,

    /// Worker count for the threads backend; defaults to dimx * dimy.
    /// MPI jobs take their size from the launcher.
    #[arg(long)]
    pub workers: Option<usize>,

    /// Source forcing policy: min, max, add or none.
    #[arg(long, default_value_t = ForcingPolicy::Min)]
    pub forcing: ForcingPolicy,

    /// Use explicit diffusion with this coefficient instead of the
    /// five-point mean.
    #[arg(long)]
    pub alpha: Option<f64>,
}

impl Cli {
    /// The process grid requested.
    pub fn dims(&self) -> Dims {
        Dims::new(self.dimx, self.dimy)
    }

    /// Number of workers to start.
    pub fn workers(&self) -> usize {
        self.workers
            .unwrap_or_else(|| self.dimx.saturating_mul(self.dimy))
    }

    /// Job configuration described by these arguments.
    pub fn to_config(&self) -> SimConfig {
        SimConfig {
            dims: self.dims(),
            iterations: self.iterations,
            forcing: self.forcing,
            kernel: match self.alpha {
                Some(alpha) => KernelChoice::ExplicitDiffusion { alpha },
                None => KernelChoice::FivePointMean,
            },
            ..SimConfig::default()
        }
    }

    /// The option table printed in verbose mode.
    pub fn dump_opts(&self) -> String {
        let rows = [
            ("option", "value".to_string()),
            ("dimx", self.dimx.to_string()),
            ("dimy", self.dimy.to_string()),
            ("iter", self.iterations.to_string()),
            ("input", self.input.display().to_string()),
            ("output", self.output.display().to_string()),
            ("backend", self.backend.as_str().to_string()),
            ("workers", self.workers().to_string()),
            ("forcing", self.forcing.to_string()),
            ("verbose", u8::from(self.verbose).to_string()),
        ];
        rows.iter()
            .map(|(name, value)| format!("{name:>10} {value}\n"))
            .collect()
    }
}

/// Install the global `tracing` subscriber.
///
/// `RUST_LOG` wins when set; otherwise the level is `info`, or `debug`
/// when `verbose`. Calling this twice is harmless.
pub fn init_tracing(verbose: bool) {
    let default = if verbose { "debug" } else { "info" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_thread_names(true)
        .with_target(false)
        .try_init();
}
