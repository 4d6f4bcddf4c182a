//! The [`Communicator`] trait.

use heatsim_core::{Rank, Tag, TransportError};
use smallvec::smallvec;

use crate::payload::Payload;
use crate::request::{Request, Requests};

/// Tag reserved for barrier arrival messages.
pub const BARRIER_ARRIVE: Tag = Tag(u32::MAX - 1);
/// Tag reserved for barrier release messages.
pub const BARRIER_RELEASE: Tag = Tag(u32::MAX);

/// Point-to-point transport between the workers of one job.
///
/// # Contract
///
/// - Messages between one `(source, dest)` pair with the same tag are
///   received in the order they were sent.
/// - `isend` never blocks; the payload is owned by the transport once
///   posted.
/// - `wait_all` completes requests in the order given and returns one
///   entry per request: `Some(payload)` for receives, `None` for sends.
/// - After [`abort`](Self::abort) on any endpoint, every endpoint's
///   outstanding and future receives fail with
///   [`TransportError::Aborted`].
///
/// # Examples
///
/// ```
/// use heatsim_comm::{ChannelComm, Communicator, Payload};
/// use heatsim_core::{Rank, Tag};
/// use smallvec::smallvec;
///
/// let mut comm = ChannelComm::universe(1).pop().unwrap();
/// let recv = comm.irecv(Rank(0), Tag(7)).unwrap();
/// let send = comm.isend(Rank(0), Tag(7), Payload::Extent(42)).unwrap();
/// let done = comm.wait_all(smallvec![recv, send]).unwrap();
/// assert_eq!(done[0], Some(Payload::Extent(42)));
/// assert_eq!(done[1], None);
/// ```
pub trait Communicator {
    /// This endpoint's rank.
    fn rank(&self) -> Rank;

    /// Number of workers in the job.
    fn size(&self) -> usize;

    /// Post a send of `payload` to `dest` under `tag`.
    fn isend(&mut self, dest: Rank, tag: Tag, payload: Payload) -> Result<Request, TransportError>;

    /// Post a receive of `tag` from `source`.
    fn irecv(&mut self, source: Rank, tag: Tag) -> Result<Request, TransportError>;

    /// Block until every request in `requests` has completed.
    fn wait_all(&mut self, requests: Requests) -> Result<Vec<Option<Payload>>, TransportError>;

    /// Signal a job-wide abort with a diagnostic.
    fn abort(&mut self, reason: &str);

    /// Complete a single request.
    fn wait(&mut self, request: Request) -> Result<Option<Payload>, TransportError> {
        Ok(self.wait_all(smallvec![request])?.pop().flatten())
    }

    /// Block until every worker of the job has entered the barrier.
    ///
    /// Linear fan-in to rank 0 followed by a fan-out release.
    fn barrier(&mut self) -> Result<(), TransportError> {
        let root = Rank::COORDINATOR;
        if self.rank() == root {
            let mut arrivals = Requests::new();
            for r in 1..self.size() {
                arrivals.push(self.irecv(Rank(r), BARRIER_ARRIVE)?);
            }
            self.wait_all(arrivals)?;
            let mut releases = Requests::new();
            for r in 1..self.size() {
                releases.push(self.isend(Rank(r), BARRIER_RELEASE, Payload::Extent(0))?);
            }
            self.wait_all(releases)?;
        } else {
            let release = self.irecv(root, BARRIER_RELEASE)?;
            let arrive = self.isend(root, BARRIER_ARRIVE, Payload::Extent(0))?;
            self.wait_all(smallvec![release, arrive])?;
        }
        Ok(())
    }
}

/// Check that `rank` addresses a worker of a job of `size`.
pub(crate) fn check_rank(rank: Rank, size: usize) -> Result<(), TransportError> {
    if rank.0 >= size {
        return Err(TransportError::NoSuchRank { rank, size });
    }
    Ok(())
}
