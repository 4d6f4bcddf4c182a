//! Per-worker iteration state.

use std::mem;
use std::sync::Arc;

use heatsim_comm::Communicator;
use heatsim_core::{Field, ResourceError};
use heatsim_kernel::{ForcingPolicy, Kernel};
use heatsim_space::CartTopology;
use tracing::{debug, trace};

use crate::error::{During, Operation, SimError};
use crate::halo;

/// Where a worker is in its run.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Phase {
    /// Tile received, no iteration started.
    Init,
    /// Folding the source into `current`.
    ForceSource,
    /// Refreshing ghosts of `current`.
    Exchange,
    /// Writing `next` from `current`.
    Diffuse,
    /// Exchanging the two generations.
    Swap,
    /// All iterations finished; `current` holds the result.
    Done,
}

/// One worker's tiles and the loop that advances them.
///
/// Owns two padded generations, `current` and `next`, plus the ghost-free
/// `source` tile captured at scatter time. Ghosts are refreshed every
/// iteration, so nothing outside this worker ever touches its buffers.
pub struct Worker {
    topo: CartTopology,
    kernel: Arc<dyn Kernel>,
    forcing: ForcingPolicy,
    source: Field,
    current: Field,
    next: Field,
    iteration: u64,
    phase: Phase,
}

impl Worker {
    /// Start from the scattered, padded `tile`.
    pub fn new(
        topo: CartTopology,
        kernel: Arc<dyn Kernel>,
        forcing: ForcingPolicy,
        tile: Field,
    ) -> Result<Self, ResourceError> {
        let source = tile.repad(0)?;
        let next = Field::with_padding(tile.width(), tile.height(), tile.padding())?;
        Ok(Self {
            topo,
            kernel,
            forcing,
            source,
            current: tile,
            next,
            iteration: 0,
            phase: Phase::Init,
        })
    }

    /// Run one `ForceSource → Exchange → Diffuse → Swap` cycle.
    pub fn step<C: Communicator>(&mut self, comm: &mut C) -> Result<(), SimError> {
        let rank = self.topo.rank();

        self.phase = Phase::ForceSource;
        self.forcing
            .apply(&mut self.current, &self.source)
            .during(rank, Operation::ForceSource)?;

        self.phase = Phase::Exchange;
        halo::exchange(comm, &self.topo, &mut self.current)?;

        self.phase = Phase::Diffuse;
        self.kernel
            .apply(&self.current, &mut self.next)
            .during(rank, Operation::Diffuse)?;

        self.phase = Phase::Swap;
        mem::swap(&mut self.current, &mut self.next);
        self.iteration += 1;
        Ok(())
    }

    /// Run `iterations` cycles, then mark the worker done.
    pub fn run<C: Communicator>(&mut self, comm: &mut C, iterations: u64) -> Result<(), SimError> {
        for _ in 0..iterations {
            self.step(comm)?;
            debug!(iteration = self.iteration, "iteration complete");
            trace!("tile after iteration {}:\n{}", self.iteration, self.current);
        }
        self.phase = Phase::Done;
        Ok(())
    }

    /// The freshest generation.
    pub fn current(&self) -> &Field {
        &self.current
    }

    /// The fixed source tile.
    pub fn source(&self) -> &Field {
        &self.source
    }

    /// Iterations completed so far.
    pub fn iteration(&self) -> u64 {
        self.iteration
    }

    /// Current phase.
    pub fn phase(&self) -> Phase {
        self.phase
    }

    /// This worker's place on the process grid.
    pub fn topology(&self) -> &CartTopology {
        &self.topo
    }

    /// Consume the worker, keeping the freshest generation.
    pub fn into_current(self) -> Field {
        self.current
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use heatsim_comm::ChannelComm;
    use heatsim_core::{Dims, Rank};
    use heatsim_kernel::FivePointMean;

    fn solo(tile: Field, forcing: ForcingPolicy) -> (ChannelComm, Worker) {
        let comm = ChannelComm::universe(1).pop().unwrap();
        let topo = CartTopology::new(Dims::new(1, 1), 1, Rank(0)).unwrap();
        let worker = Worker::new(topo, Arc::new(FivePointMean), forcing, tile).unwrap();
        (comm, worker)
    }

    fn hot_spot() -> Field {
        let mut f = Field::with_padding(5, 5, 1).unwrap();
        f.set(2, 2, 500.0);
        f
    }

    #[test]
    fn zero_iterations_leave_the_tile_alone() {
        let (mut comm, mut w) = solo(hot_spot(), ForcingPolicy::Min);
        assert_eq!(w.phase(), Phase::Init);
        w.run(&mut comm, 0).unwrap();
        assert_eq!(w.phase(), Phase::Done);
        assert_eq!(w.iteration(), 0);
        assert_eq!(w.current(), &hot_spot());
    }

    #[test]
    fn split_runs_match_a_single_run() {
        let (mut comm_a, mut a) = solo(hot_spot(), ForcingPolicy::Max);
        a.run(&mut comm_a, 3).unwrap();
        a.run(&mut comm_a, 4).unwrap();

        let (mut comm_b, mut b) = solo(hot_spot(), ForcingPolicy::Max);
        b.run(&mut comm_b, 7).unwrap();

        assert_eq!(a.iteration(), 7);
        assert_eq!(a.current().interior_to_vec(), b.current().interior_to_vec());
    }

    #[test]
    fn step_spreads_heat_to_neighbours() {
        let (mut comm, mut w) = solo(hot_spot(), ForcingPolicy::None);
        w.step(&mut comm).unwrap();
        assert_eq!(w.phase(), Phase::Swap);
        assert_eq!(w.current().get(2, 2), 100.0);
        assert_eq!(w.current().get(2, 1), 100.0);
        assert_eq!(w.current().get(1, 1), 0.0);
        assert_eq!(w.current().interior_sum(), 500.0);
    }

    #[test]
    fn max_forcing_keeps_the_source_hot() {
        let (mut comm, mut w) = solo(hot_spot(), ForcingPolicy::Max);
        w.run(&mut comm, 2).unwrap();
        // The source is re-imposed before each step, so after the second
        // step the centre is the mean around a 500 peak again.
        assert!(w.current().get(2, 2) > 100.0);
        assert_eq!(w.source().get(2, 2), 500.0);
    }
}
