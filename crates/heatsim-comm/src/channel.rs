//! In-process [`Communicator`] backend over crossbeam channels.
//!
//! Each endpoint owns one unbounded inbox and a sender into every other
//! endpoint's inbox. Sends are eager: the payload is moved into the
//! destination inbox at post time, so a send request is complete as soon
//! as it is returned. Receives are matched lazily at wait time; messages
//! that arrive for a different `(source, tag)` are parked in an
//! unexpected-message queue, preserving per-pair FIFO order.
//!
//! Messages to self bypass the channels and land directly in the
//! unexpected queue, which is what makes a 1×1 process grid exchange with
//! itself.

use std::collections::VecDeque;

use crossbeam_channel::{unbounded, Receiver, Sender};
use heatsim_core::{Rank, Tag, TransportError};
use indexmap::IndexMap;
use tracing::{trace, warn};

use crate::communicator::{check_rank, Communicator};
use crate::payload::Payload;
use crate::request::{Request, Requests};

/// What travels through an inbox.
enum Envelope {
    Message {
        source: Rank,
        tag: Tag,
        payload: Payload,
    },
    Abort {
        origin: Rank,
        reason: String,
    },
}

/// One worker's endpoint of an in-process job.
///
/// Endpoints are created together by [`ChannelComm::universe`] and then
/// moved, one each, onto the worker threads.
pub struct ChannelComm {
    rank: Rank,
    /// Sender into every other endpoint's inbox; `None` at our own index.
    outboxes: Vec<Option<Sender<Envelope>>>,
    inbox: Receiver<Envelope>,
    unexpected: IndexMap<(Rank, Tag), VecDeque<Payload>>,
    /// Set once an abort was raised or received; sticky.
    aborted: Option<TransportError>,
}

impl ChannelComm {
    /// Create the `size` connected endpoints of a job, in rank order.
    pub fn universe(size: usize) -> Vec<ChannelComm> {
        let (senders, receivers): (Vec<_>, Vec<_>) = (0..size).map(|_| unbounded()).unzip();
        receivers
            .into_iter()
            .enumerate()
            .map(|(r, inbox)| ChannelComm {
                rank: Rank(r),
                outboxes: senders
                    .iter()
                    .enumerate()
                    .map(|(d, tx)| (d != r).then(|| tx.clone()))
                    .collect(),
                inbox,
                unexpected: IndexMap::new(),
                aborted: None,
            })
            .collect()
    }

    fn check_aborted(&self) -> Result<(), TransportError> {
        match &self.aborted {
            Some(e) => Err(e.clone()),
            None => Ok(()),
        }
    }

    fn park(&mut self, source: Rank, tag: Tag, payload: Payload) {
        self.unexpected
            .entry((source, tag))
            .or_default()
            .push_back(payload);
    }

    fn take_parked(&mut self, source: Rank, tag: Tag) -> Option<Payload> {
        let queue = self.unexpected.get_mut(&(source, tag))?;
        let payload = queue.pop_front();
        if queue.is_empty() {
            self.unexpected.swap_remove(&(source, tag));
        }
        payload
    }

    /// Error for a send to `peer` that found its inbox closed.
    ///
    /// A peer that aborted broadcast the abort before its endpoint went
    /// away, so the abort is already in our inbox and is the better report.
    fn send_failed(&mut self, peer: Rank) -> TransportError {
        while let Ok(envelope) = self.inbox.try_recv() {
            match envelope {
                Envelope::Message {
                    source,
                    tag,
                    payload,
                } => self.park(source, tag, payload),
                Envelope::Abort { origin, reason } => {
                    let err = TransportError::Aborted { origin, reason };
                    self.aborted = Some(err.clone());
                    return err;
                }
            }
        }
        TransportError::Disconnected { peer }
    }

    /// Block until the next message from `source` with `tag` arrives.
    fn match_message(&mut self, source: Rank, tag: Tag) -> Result<Payload, TransportError> {
        self.check_aborted()?;
        if let Some(payload) = self.take_parked(source, tag) {
            return Ok(payload);
        }
        loop {
            match self.inbox.recv() {
                Ok(Envelope::Message {
                    source: s,
                    tag: t,
                    payload,
                }) => {
                    if s == source && t == tag {
                        return Ok(payload);
                    }
                    trace!(rank = %self.rank, source = %s, tag = %t, "parked unexpected message");
                    self.park(s, t, payload);
                }
                Ok(Envelope::Abort { origin, reason }) => {
                    let err = TransportError::Aborted { origin, reason };
                    self.aborted = Some(err.clone());
                    return Err(err);
                }
                // Every other endpoint is gone; nothing can arrive any more.
                Err(_) => return Err(TransportError::Disconnected { peer: source }),
            }
        }
    }
}

impl Communicator for ChannelComm {
    fn rank(&self) -> Rank {
        self.rank
    }

    fn size(&self) -> usize {
        self.outboxes.len()
    }

    fn isend(&mut self, dest: Rank, tag: Tag, payload: Payload) -> Result<Request, TransportError> {
        self.check_aborted()?;
        check_rank(dest, self.size())?;
        if dest == self.rank {
            self.park(dest, tag, payload);
        } else if let Some(tx) = &self.outboxes[dest.0] {
            let sent = tx.send(Envelope::Message {
                source: self.rank,
                tag,
                payload,
            });
            if sent.is_err() {
                return Err(self.send_failed(dest));
            }
        }
        Ok(Request::Send { dest, tag })
    }

    fn irecv(&mut self, source: Rank, tag: Tag) -> Result<Request, TransportError> {
        self.check_aborted()?;
        check_rank(source, self.size())?;
        Ok(Request::Recv { source, tag })
    }

    fn wait_all(&mut self, requests: Requests) -> Result<Vec<Option<Payload>>, TransportError> {
        let mut done = Vec::with_capacity(requests.len());
        for request in requests {
            match request {
                Request::Send { .. } => done.push(None),
                Request::Recv { source, tag } => {
                    done.push(Some(self.match_message(source, tag)?));
                }
            }
        }
        Ok(done)
    }

    fn abort(&mut self, reason: &str) {
        if self.aborted.is_some() {
            return;
        }
        warn!(rank = %self.rank, reason, "raising job-wide abort");
        for tx in self.outboxes.iter().flatten() {
            // A peer that already exited cannot be notified and does not need to be.
            let _ = tx.send(Envelope::Abort {
                origin: self.rank,
                reason: reason.to_string(),
            });
        }
        self.aborted = Some(TransportError::Aborted {
            origin: self.rank,
            reason: reason.to_string(),
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;
    use smallvec::smallvec;
    use std::thread;

    #[test]
    fn self_messages_are_delivered_in_order() {
        let mut c = ChannelComm::universe(1).pop().unwrap();
        let _ = c.isend(Rank(0), Tag(1), Payload::Extent(1)).unwrap();
        let _ = c.isend(Rank(0), Tag(1), Payload::Extent(2)).unwrap();
        let a = c.irecv(Rank(0), Tag(1)).unwrap();
        let b = c.irecv(Rank(0), Tag(1)).unwrap();
        let done = c.wait_all(smallvec![a, b]).unwrap();
        assert_eq!(done, vec![Some(Payload::Extent(1)), Some(Payload::Extent(2))]);
    }

    #[test]
    fn receives_match_by_tag_not_arrival_order() {
        let mut comms = ChannelComm::universe(2);
        let mut one = comms.pop().unwrap();
        let mut zero = comms.pop().unwrap();
        let _ = one.isend(Rank(0), Tag(5), Payload::Extent(5)).unwrap();
        let _ = one.isend(Rank(0), Tag(6), Payload::Extent(6)).unwrap();

        let six = zero.irecv(Rank(1), Tag(6)).unwrap();
        let five = zero.irecv(Rank(1), Tag(5)).unwrap();
        let done = zero.wait_all(smallvec![six, five]).unwrap();
        assert_eq!(done, vec![Some(Payload::Extent(6)), Some(Payload::Extent(5))]);
        assert!(zero.unexpected.is_empty());
    }

    #[test]
    fn unknown_rank_is_rejected() {
        let mut c = ChannelComm::universe(2).remove(0);
        assert_eq!(
            c.isend(Rank(2), Tag(0), Payload::Extent(0)),
            Err(TransportError::NoSuchRank {
                rank: Rank(2),
                size: 2
            })
        );
        assert!(c.irecv(Rank(9), Tag(0)).is_err());
    }

    #[test]
    fn abort_unblocks_a_waiting_peer() {
        let mut comms = ChannelComm::universe(2);
        let mut one = comms.pop().unwrap();
        let mut zero = comms.pop().unwrap();

        let waiter = thread::spawn(move || {
            let req = zero.irecv(Rank(1), Tag(3)).unwrap();
            zero.wait(req)
        });
        one.abort("tile allocation failed");

        let err = waiter.join().unwrap().unwrap_err();
        assert_eq!(
            err,
            TransportError::Aborted {
                origin: Rank(1),
                reason: "tile allocation failed".into()
            }
        );
        // The aborting endpoint refuses further traffic too.
        assert!(one.isend(Rank(0), Tag(0), Payload::Extent(0)).is_err());
    }

    #[test]
    fn receive_fails_once_all_peers_are_gone() {
        let mut comms = ChannelComm::universe(2);
        drop(comms.pop());
        let mut zero = comms.pop().unwrap();
        let req = zero.irecv(Rank(1), Tag(0)).unwrap();
        assert_eq!(
            zero.wait(req),
            Err(TransportError::Disconnected { peer: Rank(1) })
        );
        assert_eq!(
            zero.isend(Rank(1), Tag(0), Payload::Extent(0)),
            Err(TransportError::Disconnected { peer: Rank(1) })
        );
    }

    #[test]
    fn send_to_an_aborted_peer_reports_the_abort() {
        let mut comms = ChannelComm::universe(2);
        let mut one = comms.pop().unwrap();
        let mut zero = comms.pop().unwrap();
        one.abort("out of memory");
        drop(one);
        assert_eq!(
            zero.isend(Rank(1), Tag(0), Payload::Extent(0)),
            Err(TransportError::Aborted {
                origin: Rank(1),
                reason: "out of memory".into()
            })
        );
    }

    #[test]
    fn barrier_releases_every_worker() {
        let handles: Vec<_> = ChannelComm::universe(4)
            .into_iter()
            .map(|mut c| {
                thread::spawn(move || {
                    c.barrier()?;
                    c.barrier()?;
                    Ok::<_, TransportError>(c.rank())
                })
            })
            .collect();
        let mut ranks: Vec<Rank> = handles
            .into_iter()
            .map(|h| h.join().unwrap().unwrap())
            .collect();
        ranks.sort();
        assert_eq!(ranks, vec![Rank(0), Rank(1), Rank(2), Rank(3)]);
    }

    proptest! {
        #[test]
        fn per_tag_order_survives_interleaving(tags in prop::collection::vec(0u32..4, 1..40)) {
            let mut comms = ChannelComm::universe(2);
            let mut one = comms.pop().unwrap();
            let mut zero = comms.pop().unwrap();
            for (seq, &t) in tags.iter().enumerate() {
                let _ = one.isend(Rank(0), Tag(t), Payload::Extent(seq)).unwrap();
            }
            // Drain tag by tag, highest first, so most messages get parked.
            for t in (0..4u32).rev() {
                let expected: Vec<usize> = tags
                    .iter()
                    .enumerate()
                    .filter(|(_, &x)| x == t)
                    .map(|(seq, _)| seq)
                    .collect();
                for seq in expected {
                    let req = zero.irecv(Rank(1), Tag(t)).unwrap();
                    prop_assert_eq!(zero.wait(req).unwrap(), Some(Payload::Extent(seq)));
                }
            }
            prop_assert!(zero.unexpected.is_empty());
        }
    }
}
