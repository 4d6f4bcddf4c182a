//! Handles for in-flight transfers.

use heatsim_core::{Rank, Tag};
use smallvec::SmallVec;

/// A posted, not yet completed, transfer.
///
/// Requests carry no buffer: a completed receive hands its [`Payload`]
/// back from [`wait_all`](crate::Communicator::wait_all), so the caller
/// keeps full ownership of its tile while transfers are outstanding.
///
/// [`Payload`]: crate::Payload
#[must_use = "a request does nothing until it is waited on"]
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Request {
    /// A send of `tag` to `dest`.
    Send {
        /// Destination rank.
        dest: Rank,
        /// Message tag.
        tag: Tag,
    },
    /// A receive of `tag` from `source`.
    Recv {
        /// Source rank.
        source: Rank,
        /// Message tag.
        tag: Tag,
    },
}

impl Request {
    /// Whether this request will yield a payload when completed.
    pub fn is_recv(&self) -> bool {
        matches!(self, Self::Recv { .. })
    }

    /// The message tag.
    pub fn tag(&self) -> Tag {
        match *self {
            Self::Send { tag, .. } | Self::Recv { tag, .. } => tag,
        }
    }
}

/// An ordered batch of requests completed by a single wait.
///
/// Inline capacity covers one halo exchange (four receives, four sends).
pub type Requests = SmallVec<[Request; 8]>;
