//! Multi-process [`Communicator`] backend over MPI.
//!
//! One OS process per worker, started by `mpirun`/`mpiexec`. Sends are
//! queued at post time and issued as immediate MPI sends when the batch is
//! waited on; receives are completed in request order inside the same
//! wait, while those sends are in flight. Every rank posts its whole batch
//! of sends before blocking on a receive, so a halo exchange cannot
//! deadlock however large the strips are.
//!
//! Messages to self never reach MPI; they are parked locally the way
//! [`ChannelComm`](crate::ChannelComm) parks them.
//!
//! [`abort`](Communicator::abort) is `MPI_Abort` on the world
//! communicator: it terminates every process of the job.

use std::collections::VecDeque;

use heatsim_core::{Rank, Tag, TransportError};
use indexmap::IndexMap;
use mpi::environment::Universe;
use mpi::topology::SimpleCommunicator;
use mpi::traits::{
    Communicator as MpiCommunicator, CommunicatorCollectives, Destination, Source,
};
use tracing::{error, trace};

use crate::communicator::{check_rank, Communicator};
use crate::payload::Payload;
use crate::request::{Request, Requests};
use crate::wire;

/// Exit status of every process after an abort.
pub const ABORT_EXIT_CODE: i32 = 1;

/// This process's endpoint of an MPI job.
///
/// Owns the MPI environment; dropping it finalizes MPI.
pub struct MpiComm {
    world: SimpleCommunicator,
    rank: Rank,
    size: usize,
    /// Posted sends not yet issued, per `(dest, tag)` in post order.
    outgoing: IndexMap<(Rank, Tag), VecDeque<Vec<u64>>>,
    /// Messages this rank sent to itself.
    local: IndexMap<(Rank, Tag), VecDeque<Payload>>,
    // Declared last so MPI is finalized after the communicator is dropped.
    _universe: Universe,
}

impl MpiComm {
    /// Initialize MPI and return this process's endpoint.
    ///
    /// `None` if MPI was already initialized in this process.
    pub fn initialize() -> Option<MpiComm> {
        let universe = mpi::initialize()?;
        let world = universe.world();
        let rank = Rank(usize::try_from(world.rank()).unwrap_or(0));
        let size = usize::try_from(world.size()).unwrap_or(0);
        Some(MpiComm {
            world,
            rank,
            size,
            outgoing: IndexMap::new(),
            local: IndexMap::new(),
            _universe: universe,
        })
    }

    fn mpi_tag(tag: Tag) -> Result<mpi::Tag, TransportError> {
        mpi::Tag::try_from(tag.0).map_err(|_| TransportError::TagOutOfRange { tag })
    }

    fn mpi_rank(&self, rank: Rank) -> Result<mpi::Rank, TransportError> {
        mpi::Rank::try_from(rank.0).map_err(|_| TransportError::NoSuchRank {
            rank,
            size: self.size,
        })
    }

    fn take_outgoing(&mut self, dest: Rank, tag: Tag) -> Option<Vec<u64>> {
        let queue = self.outgoing.get_mut(&(dest, tag))?;
        let words = queue.pop_front();
        if queue.is_empty() {
            self.outgoing.swap_remove(&(dest, tag));
        }
        words
    }

    fn take_local(&mut self, tag: Tag) -> Option<Payload> {
        let key = (self.rank, tag);
        let queue = self.local.get_mut(&key)?;
        let payload = queue.pop_front();
        if queue.is_empty() {
            self.local.swap_remove(&key);
        }
        payload
    }
}

impl Communicator for MpiComm {
    fn rank(&self) -> Rank {
        self.rank
    }

    fn size(&self) -> usize {
        self.size
    }

    fn isend(&mut self, dest: Rank, tag: Tag, payload: Payload) -> Result<Request, TransportError> {
        check_rank(dest, self.size)?;
        if dest == self.rank {
            self.local.entry((dest, tag)).or_default().push_back(payload);
        } else {
            Self::mpi_tag(tag)?;
            self.outgoing
                .entry((dest, tag))
                .or_default()
                .push_back(wire::encode(&payload));
        }
        Ok(Request::Send { dest, tag })
    }

    fn irecv(&mut self, source: Rank, tag: Tag) -> Result<Request, TransportError> {
        check_rank(source, self.size)?;
        Self::mpi_tag(tag)?;
        Ok(Request::Recv { source, tag })
    }

    fn wait_all(&mut self, requests: Requests) -> Result<Vec<Option<Payload>>, TransportError> {
        let mut sends = Vec::new();
        let mut recvs = Vec::new();
        for request in &requests {
            match *request {
                Request::Send { dest, tag } if dest != self.rank => {
                    let words = self
                        .take_outgoing(dest, tag)
                        .ok_or(TransportError::Disconnected { peer: dest })?;
                    sends.push((self.mpi_rank(dest)?, Self::mpi_tag(tag)?, words));
                }
                Request::Recv { source, tag } if source != self.rank => {
                    recvs.push((self.mpi_rank(source)?, Self::mpi_tag(tag)?));
                }
                _ => {}
            }
        }

        let world = &self.world;
        let arrived: Vec<Vec<u64>> = mpi::request::scope(|scope| {
            let in_flight: Vec<_> = sends
                .iter()
                .map(|(dest, tag, words)| {
                    world
                        .process_at_rank(*dest)
                        .immediate_send_with_tag(scope, &words[..], *tag)
                })
                .collect();
            let arrived: Vec<Vec<u64>> = recvs
                .iter()
                .map(|&(source, tag)| {
                    world
                        .process_at_rank(source)
                        .receive_vec_with_tag::<u64>(tag)
                        .0
                })
                .collect();
            for send in in_flight {
                send.wait();
            }
            arrived
        });

        let mut arrived = arrived.into_iter();
        let mut done = Vec::with_capacity(requests.len());
        for request in requests {
            match request {
                Request::Send { .. } => done.push(None),
                Request::Recv { source, tag } if source == self.rank => {
                    let payload = self
                        .take_local(tag)
                        .ok_or(TransportError::Disconnected { peer: source })?;
                    done.push(Some(payload));
                }
                Request::Recv { source, tag } => {
                    let words = arrived
                        .next()
                        .ok_or(TransportError::Disconnected { peer: source })?;
                    trace!(rank = %self.rank, source = %source, tag = %tag, words = words.len(), "received");
                    let payload =
                        wire::decode(&words).ok_or(TransportError::Malformed { source, tag })?;
                    done.push(Some(payload));
                }
            }
        }
        Ok(done)
    }

    fn abort(&mut self, reason: &str) {
        error!(rank = %self.rank, reason, "aborting every process of the job");
        self.world.abort(ABORT_EXIT_CODE)
    }

    fn barrier(&mut self) -> Result<(), TransportError> {
        self.world.barrier();
        Ok(())
    }
}
