//! Owned message bodies.

use heatsim_core::{Tag, TransportError};

/// The body of one message.
///
/// Tile dimensions travel as [`Extent`](Payload::Extent), sample buffers
/// as [`Samples`](Payload::Samples). Receivers state which one they expect
/// and get a [`TransportError::UnexpectedPayload`] otherwise.
#[derive(Clone, Debug, PartialEq)]
pub enum Payload {
    /// A single size or count (tile width, height, padding).
    Extent(usize),
    /// A run of samples (a tile buffer, a boundary row or column).
    Samples(Vec<f64>),
}

impl Payload {
    /// Name of the payload kind, for diagnostics.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Extent(_) => "extent",
            Self::Samples(_) => "samples",
        }
    }

    /// Unwrap an [`Extent`](Payload::Extent) received under `tag`.
    pub fn into_extent(self, tag: Tag) -> Result<usize, TransportError> {
        match self {
            Self::Extent(n) => Ok(n),
            Self::Samples(_) => Err(TransportError::UnexpectedPayload {
                tag,
                expected: "extent",
            }),
        }
    }

    /// Unwrap [`Samples`](Payload::Samples) received under `tag`, checking
    /// that exactly `expected` samples arrived.
    pub fn into_samples(self, tag: Tag, expected: usize) -> Result<Vec<f64>, TransportError> {
        match self {
            Self::Samples(v) if v.len() == expected => Ok(v),
            Self::Samples(v) => Err(TransportError::SizeMismatch {
                tag,
                expected,
                actual: v.len(),
            }),
            Self::Extent(_) => Err(TransportError::UnexpectedPayload {
                tag,
                expected: "samples",
            }),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn extent_unwraps() {
        assert_eq!(Payload::Extent(12).into_extent(Tag(0)), Ok(12));
        assert_eq!(
            Payload::Samples(vec![]).into_extent(Tag(4)),
            Err(TransportError::UnexpectedPayload {
                tag: Tag(4),
                expected: "extent"
            })
        );
    }

    #[test]
    fn samples_length_is_checked() {
        assert_eq!(
            Payload::Samples(vec![1.0, 2.0]).into_samples(Tag(3), 2),
            Ok(vec![1.0, 2.0])
        );
        assert_eq!(
            Payload::Samples(vec![1.0]).into_samples(Tag(3), 2),
            Err(TransportError::SizeMismatch {
                tag: Tag(3),
                expected: 2,
                actual: 1
            })
        );
        assert!(Payload::Extent(1).into_samples(Tag(3), 1).is_err());
    }
}
