//! Four-way ghost exchange between neighbouring tiles.
//!
//! For each direction `d` a worker sends its boundary strip on side `d` to
//! `neighbour(d)` tagged with `d`, and fills its ghost strip on side `d`
//! with what `neighbour(d)` sent the opposite way. Rows are contiguous
//! `width`-sample strips; columns are `height`-sample strips with stride
//! `padded_width`. Corner ghosts are never written.

use heatsim_comm::{Communicator, Payload, Requests};
use heatsim_core::{Field, FieldError, StridedViewMut, TransportError};
use heatsim_space::{CartTopology, Direction};

use crate::error::{During, Operation, SimError};
use crate::protocol::halo_tag;

/// Copy of the interior strip adjacent to side `dir`.
fn boundary(tile: &Field, dir: Direction) -> Result<Vec<f64>, FieldError> {
    let (width, height) = tile.shape();
    let view = match dir {
        Direction::North => tile.row(0)?,
        Direction::South => tile.row(height as isize - 1)?,
        Direction::West => tile.column(0)?,
        Direction::East => tile.column(width as isize - 1)?,
    };
    Ok(view.to_vec())
}

/// The ghost strip just outside side `dir`.
fn ghost(tile: &mut Field, dir: Direction) -> Result<StridedViewMut<'_>, FieldError> {
    let (width, height) = tile.shape();
    match dir {
        Direction::North => tile.row_mut(-1),
        Direction::South => tile.row_mut(height as isize),
        Direction::West => tile.column_mut(-1),
        Direction::East => tile.column_mut(width as isize),
    }
}

/// Refresh every edge ghost cell of `tile` from the neighbouring tiles.
///
/// Posts four receives, then four sends, then completes all eight with a
/// single wait. Fails if `tile` has no ghost ring or if a neighbour's strip
/// has the wrong length.
pub fn exchange<C: Communicator>(
    comm: &mut C,
    topo: &CartTopology,
    tile: &mut Field,
) -> Result<(), SimError> {
    let rank = comm.rank();
    let op = Operation::Exchange;

    let mut requests = Requests::new();
    for dir in Direction::ALL {
        let tag = halo_tag(dir.opposite());
        requests.push(comm.irecv(topo.neighbour(dir), tag).during(rank, op)?);
    }
    for dir in Direction::ALL {
        let strip = boundary(tile, dir).during(rank, op)?;
        requests.push(
            comm.isend(topo.neighbour(dir), halo_tag(dir), Payload::Samples(strip))
                .during(rank, op)?,
        );
    }
    let done = comm.wait_all(requests).during(rank, op)?;

    for (dir, slot) in Direction::ALL.into_iter().zip(done) {
        let tag = halo_tag(dir.opposite());
        let mut view = ghost(tile, dir).during(rank, op)?;
        let strip = slot
            .ok_or(TransportError::UnexpectedPayload {
                tag,
                expected: "samples",
            })
            .and_then(|p| p.into_samples(tag, view.len()))
            .during(rank, op)?;
        view.copy_from_slice(&strip).during(rank, op)?;
    }
    Ok(())
}
