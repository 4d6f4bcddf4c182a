//! Message tags of the job protocol.
//!
//! Tags only need to be unique per `(source, dest)` pair among messages
//! that can be outstanding at the same time. Scatter tags of high ranks do
//! overlap the halo range numerically, but every scatter message is sent
//! and matched before the same pair exchanges halos, and per-tag delivery
//! is FIFO.

use heatsim_core::{Rank, Tag};
use heatsim_space::Direction;

/// One of the four messages that carry a tile to its worker.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ScatterPart {
    /// Tile width.
    Width = 0,
    /// Tile height.
    Height = 1,
    /// Ghost ring width.
    Padding = 2,
    /// The padded sample buffer.
    Data = 3,
}

/// Tag of `part` of the tile sent to `dest`: `4 * dest + part`.
pub fn scatter_tag(dest: Rank, part: ScatterPart) -> Tag {
    Tag((dest.0 as u32).wrapping_mul(4).wrapping_add(part as u32))
}

/// Tag of every final tile sent back to the coordinator.
pub const GATHER: Tag = Tag(3);

/// Tag of a halo strip travelling in `dir`.
///
/// A strip travelling north is a worker's top row; its receiver takes it
/// from its *south* neighbour into the ghost row below its interior.
pub fn halo_tag(dir: Direction) -> Tag {
    match dir {
        Direction::North => Tag(10),
        Direction::South => Tag(11),
        Direction::East => Tag(12),
        Direction::West => Tag(13),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn scatter_tags_pack_four_per_rank() {
        assert_eq!(scatter_tag(Rank(1), ScatterPart::Width), Tag(4));
        assert_eq!(scatter_tag(Rank(1), ScatterPart::Data), Tag(7));
        assert_eq!(scatter_tag(Rank(3), ScatterPart::Padding), Tag(14));
    }

    #[test]
    fn halo_tags_are_distinct_per_direction() {
        let tags: Vec<Tag> = Direction::ALL.iter().map(|&d| halo_tag(d)).collect();
        assert_eq!(tags, vec![Tag(10), Tag(11), Tag(12), Tag(13)]);
        assert_ne!(GATHER, halo_tag(Direction::North));
    }
}
