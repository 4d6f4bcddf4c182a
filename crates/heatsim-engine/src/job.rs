//! Job startup, per-rank driver, and failure propagation.
//!
//! Any error on any rank is fatal to the whole job. The failing rank
//! broadcasts an abort so that peers blocked in a wait return instead of
//! hanging; those peers then report an abort echo, and the job runner
//! reports the root cause instead.

use std::panic::{self, AssertUnwindSafe};
use std::sync::Arc;
use std::thread;

use heatsim_comm::{ChannelComm, Communicator};
use heatsim_core::{ConfigError, Field, Rank, ResourceError, TransportError};
use heatsim_kernel::Kernel;
use heatsim_space::{CartTopology, Direction};
use tracing::{debug, error, info, info_span, Span};

use crate::config::SimConfig;
use crate::coordinator::Coordinator;
use crate::error::{During, ErrorKind, Operation, SimError};
use crate::transport;
use crate::worker::Worker;

/// Run one rank of a job to completion over any [`Communicator`].
///
/// Rank 0 must be given the global input field and returns the result;
/// every other rank passes `None` and returns `None`. On failure this
/// rank's error is returned after an abort has been raised on `comm`.
pub fn run_worker<C: Communicator>(
    comm: &mut C,
    config: &SimConfig,
    kernel: Arc<dyn Kernel>,
    global: Option<Field>,
) -> Result<Option<Field>, SimError> {
    let span = info_span!(
        "worker",
        rank = comm.rank().0,
        cx = tracing::field::Empty,
        cy = tracing::field::Empty
    );
    let _enter = span.enter();

    let result = drive(comm, config, kernel, global, &span);
    match &result {
        Err(e) if !e.is_abort() => {
            error!(error = %e, "worker failed");
            comm.abort(&e.to_string());
        }
        Err(e) => debug!(error = %e, "stopping on abort"),
        Ok(_) => debug!("worker finished"),
    }
    result
}

fn drive<C: Communicator>(
    comm: &mut C,
    config: &SimConfig,
    kernel: Arc<dyn Kernel>,
    global: Option<Field>,
    span: &Span,
) -> Result<Option<Field>, SimError> {
    let rank = comm.rank();
    let topo = CartTopology::new(config.dims, comm.size(), rank).during(rank, Operation::Topology)?;
    span.record("cx", topo.coord().x);
    span.record("cy", topo.coord().y);
    debug!(
        north = %topo.neighbour(Direction::North),
        south = %topo.neighbour(Direction::South),
        west = %topo.neighbour(Direction::West),
        east = %topo.neighbour(Direction::East),
        "worker context"
    );

    let coordinator = match global {
        Some(field) if rank.is_coordinator() => {
            info!(
                dims = %config.dims,
                width = field.width(),
                height = field.height(),
                "decomposing field"
            );
            Some(Coordinator::new(field, config.dims).during(rank, Operation::Decompose)?)
        }
        _ => None,
    };

    let tile = transport::scatter(comm, &topo, coordinator.as_ref(), config.padding)?;
    let mut worker =
        Worker::new(topo, kernel, config.forcing, tile).during(rank, Operation::Scatter)?;
    worker.run(comm, config.iterations)?;
    transport::gather(comm, worker.topology(), coordinator, worker.current())
}

/// Run this process's rank of a job whose workers are separate processes.
///
/// Every rank checks `config` against the job size before any transfer, so
/// a decomposition mismatch fails on every process alike and nothing is
/// aborted. The coordinator, which alone holds `global`, also checks the
/// field shape; a failure there is raised as an abort because no other
/// rank can see it.
pub fn run_rank<C: Communicator>(
    comm: &mut C,
    config: &SimConfig,
    global: Option<Field>,
) -> Result<Option<Field>, SimError> {
    let rank = comm.rank();
    let workers = comm.size();
    config.validate(workers).during(rank, Operation::Validate)?;
    let kernel = config.kernel.build().during(rank, Operation::Validate)?;
    check_padding(config, kernel.as_ref(), rank)?;
    if let Some(field) = &global {
        let (width, height) = field.shape();
        if let Err(e) = config
            .validate_for_field(workers, width, height)
            .during(rank, Operation::Validate)
        {
            error!(error = %e, "rejecting input field");
            comm.abort(&e.to_string());
            return Err(e);
        }
        info!(
            workers,
            dims = %config.dims,
            width,
            height,
            iterations = config.iterations,
            kernel = kernel.name(),
            forcing = %config.forcing,
            "starting job"
        );
    }
    run_worker(comm, config, kernel, global)
}

fn check_padding(config: &SimConfig, kernel: &dyn Kernel, rank: Rank) -> Result<(), SimError> {
    if kernel.required_padding() > config.padding {
        return Err(SimError::new(
            rank,
            Operation::Validate,
            ConfigError::UnsupportedPadding {
                padding: config.padding,
            },
        ));
    }
    Ok(())
}

/// [`run_worker`] for an in-process endpoint, turning a panic into an
/// error and an abort so that no peer is left waiting.
fn run_guarded(
    mut comm: ChannelComm,
    config: &SimConfig,
    kernel: Arc<dyn Kernel>,
    global: Option<Field>,
) -> Result<Option<Field>, SimError> {
    let rank = comm.rank();
    let outcome = panic::catch_unwind(AssertUnwindSafe(|| {
        run_worker(&mut comm, config, kernel, global)
    }));
    outcome.unwrap_or_else(|payload| {
        let message = payload
            .downcast_ref::<&str>()
            .map(|s| s.to_string())
            .or_else(|| payload.downcast_ref::<String>().cloned())
            .unwrap_or_else(|| "unknown panic payload".to_string());
        let err = SimError::new(rank, Operation::Join, ErrorKind::Panicked { message });
        comm.abort(&err.to_string());
        Err(err)
    })
}

/// The error to report for a failed job: the first one that is not an
/// abort echo, or the first one.
fn root_cause(errors: Vec<SimError>) -> Option<SimError> {
    let pos = errors.iter().position(|e| !e.is_abort()).unwrap_or(0);
    errors.into_iter().nth(pos)
}

/// Run a whole job in-process with the kernel named by `config`.
///
/// See [`run_job_with_kernel`].
pub fn run_job(config: &SimConfig, global: Field, workers: usize) -> Result<Field, SimError> {
    let kernel = config
        .kernel
        .build()
        .during(Rank::COORDINATOR, Operation::Validate)?;
    run_job_with_kernel(config, global, workers, kernel)
}

/// Run a whole job in-process: `workers` threads, one rank each, with rank
/// 0 on the calling thread.
///
/// The configuration is validated against `workers` and the field shape
/// before any thread starts. Returns the reassembled field after
/// `config.iterations` iterations.
pub fn run_job_with_kernel(
    config: &SimConfig,
    global: Field,
    workers: usize,
    kernel: Arc<dyn Kernel>,
) -> Result<Field, SimError> {
    let root = Rank::COORDINATOR;
    let (width, height) = global.shape();
    config
        .validate_for_field(workers, width, height)
        .during(root, Operation::Validate)?;
    check_padding(config, kernel.as_ref(), root)?;
    info!(
        workers,
        dims = %config.dims,
        width,
        height,
        iterations = config.iterations,
        kernel = kernel.name(),
        forcing = %config.forcing,
        "starting job"
    );

    let mut comms = ChannelComm::universe(workers).into_iter();
    let root_comm = comms
        .next()
        .ok_or(TransportError::NoSuchRank {
            rank: root,
            size: workers,
        })
        .during(root, Operation::Spawn)?;

    thread::scope(|scope| {
        let mut handles = Vec::with_capacity(workers.saturating_sub(1));
        let mut root_comm = root_comm;
        for comm in comms {
            let rank = comm.rank();
            let kernel = Arc::clone(&kernel);
            let spawned = thread::Builder::new()
                .name(format!("heatsim-worker-{}", rank.0))
                .spawn_scoped(scope, move || run_guarded(comm, config, kernel, None));
            match spawned {
                Ok(handle) => handles.push((rank, handle)),
                Err(e) => {
                    let err = SimError::new(
                        rank,
                        Operation::Spawn,
                        ResourceError::WorkerSpawnFailed {
                            rank,
                            reason: e.to_string(),
                        },
                    );
                    error!(error = %err, "aborting job");
                    root_comm.abort(&err.to_string());
                    return Err(err);
                }
            }
        }

        let outcome = run_guarded(root_comm, config, Arc::clone(&kernel), Some(global));

        let mut errors = Vec::new();
        let mut result = None;
        match outcome {
            Ok(field) => result = field,
            Err(e) => errors.push(e),
        }
        for (rank, handle) in handles {
            match handle.join() {
                Ok(Ok(_)) => {}
                Ok(Err(e)) => errors.push(e),
                Err(_) => errors.push(SimError::new(
                    rank,
                    Operation::Join,
                    ErrorKind::Panicked {
                        message: "worker thread panicked".to_string(),
                    },
                )),
            }
        }

        if let Some(err) = root_cause(errors) {
            error!(error = %err, "job failed");
            return Err(err);
        }
        let field = result
            .ok_or(TransportError::MissingCoordinator { rank: root })
            .during(root, Operation::Gather)?;
        info!("job complete");
        Ok(field)
    })
}
