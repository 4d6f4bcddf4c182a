//! Tile distribution and collection between the coordinator and workers.

use heatsim_comm::{Communicator, Payload, Requests};
use heatsim_core::{ConfigError, Field, GridCoord, Rank, Tag, TransportError};
use heatsim_space::CartTopology;
use tracing::debug;

use crate::coordinator::Coordinator;
use crate::error::{During, Operation, SimError};
use crate::protocol::{scatter_tag, ScatterPart, GATHER};

fn missing(slot: Option<Payload>, tag: Tag, expected: &'static str) -> Result<Payload, TransportError> {
    slot.ok_or(TransportError::UnexpectedPayload { tag, expected })
}

/// Distribute tiles and return this worker's padded tile.
///
/// The coordinator posts width, height, padding and data sends for every
/// other rank and completes them with a single wait, then keeps its own
/// tile. Every other worker receives the three extents, sizes its buffer
/// from them, and then receives the data.
pub fn scatter<C: Communicator>(
    comm: &mut C,
    topo: &CartTopology,
    coordinator: Option<&Coordinator>,
    padding: usize,
) -> Result<Field, SimError> {
    let rank = comm.rank();
    let op = Operation::Scatter;
    if !rank.is_coordinator() {
        return receive_tile(comm, padding);
    }
    let coordinator = coordinator
        .ok_or(TransportError::MissingCoordinator { rank })
        .during(rank, op)?;

    let mut requests = Requests::with_capacity(4 * topo.size().saturating_sub(1));
    for (dest, at) in topo.ranks().skip(1) {
        let tile = coordinator.tile(at).during(rank, op)?;
        let (width, height) = tile.shape();
        let data = tile.repad(padding).during(rank, op)?.into_padded_vec();
        debug!(dest = %dest, coord = %at, width, height, "sending tile");
        let parts = [
            (ScatterPart::Width, Payload::Extent(width)),
            (ScatterPart::Height, Payload::Extent(height)),
            (ScatterPart::Padding, Payload::Extent(padding)),
            (ScatterPart::Data, Payload::Samples(data)),
        ];
        for (part, payload) in parts {
            requests.push(
                comm.isend(dest, scatter_tag(dest, part), payload)
                    .during(rank, op)?,
            );
        }
    }
    comm.wait_all(requests).during(rank, op)?;

    coordinator
        .tile(GridCoord::new(0, 0))
        .during(rank, op)?
        .repad(padding)
        .during(rank, op)
}

fn receive_tile<C: Communicator>(comm: &mut C, padding: usize) -> Result<Field, SimError> {
    let rank = comm.rank();
    let op = Operation::Scatter;
    let root = Rank::COORDINATOR;
    let tags = [
        scatter_tag(rank, ScatterPart::Width),
        scatter_tag(rank, ScatterPart::Height),
        scatter_tag(rank, ScatterPart::Padding),
    ];
    let mut requests = Requests::new();
    for tag in tags {
        requests.push(comm.irecv(root, tag).during(rank, op)?);
    }
    let mut done = comm.wait_all(requests).during(rank, op)?.into_iter();
    let mut extents = [0usize; 3];
    for (slot, tag) in extents.iter_mut().zip(tags) {
        *slot = missing(done.next().flatten(), tag, "extent")
            .and_then(|p| p.into_extent(tag))
            .during(rank, op)?;
    }
    let [width, height, got_padding] = extents;
    if got_padding != padding {
        return Err(SimError::new(
            rank,
            op,
            ConfigError::UnsupportedPadding {
                padding: got_padding,
            },
        ));
    }

    let samples = Field::padded_len(width, height, padding).during(rank, op)?;
    let tag = scatter_tag(rank, ScatterPart::Data);
    let req = comm.irecv(root, tag).during(rank, op)?;
    let data = missing(comm.wait(req).during(rank, op)?, tag, "samples")
        .and_then(|p| p.into_samples(tag, samples))
        .during(rank, op)?;
    debug!(width, height, "received tile");
    Field::from_padded_vec(width, height, padding, data).during(rank, op)
}

/// Collect every worker's final tile on the coordinator.
///
/// All workers first meet at a barrier. Returns the reassembled global
/// field on the coordinator and `None` elsewhere.
pub fn gather<C: Communicator>(
    comm: &mut C,
    topo: &CartTopology,
    coordinator: Option<Coordinator>,
    tile: &Field,
) -> Result<Option<Field>, SimError> {
    let rank = comm.rank();
    let op = Operation::Gather;
    comm.barrier().during(rank, op)?;

    if !rank.is_coordinator() {
        let req = comm
            .isend(Rank::COORDINATOR, GATHER, Payload::Samples(tile.interior_to_vec()))
            .during(rank, op)?;
        comm.wait(req).during(rank, op)?;
        return Ok(None);
    }
    let mut coordinator = coordinator
        .ok_or(TransportError::MissingCoordinator { rank })
        .during(rank, op)?;

    let mut requests = Requests::with_capacity(topo.size().saturating_sub(1));
    let mut sources = Vec::with_capacity(topo.size().saturating_sub(1));
    for (source, at) in topo.ranks().skip(1) {
        requests.push(comm.irecv(source, GATHER).during(rank, op)?);
        sources.push((source, at));
    }
    let done = comm.wait_all(requests).during(rank, op)?;

    coordinator
        .store(GridCoord::new(0, 0), tile)
        .during(rank, op)?;
    for ((source, at), slot) in sources.into_iter().zip(done) {
        let b = coordinator.bounds(at).during(rank, op)?;
        let data = missing(slot, GATHER, "samples")
            .and_then(|p| p.into_samples(GATHER, b.width * b.height))
            .during(rank, op)?;
        let part = Field::from_vec(b.width, b.height, data).during(rank, op)?;
        coordinator.store(at, &part).during(rank, op)?;
        debug!(source = %source, coord = %at, "collected tile");
    }
    coordinator
        .assemble()
        .during(rank, Operation::Merge)
        .map(Some)
}
