//! Flat word encoding of a [`Payload`] for transports that move raw
//! buffers between processes.
//!
//! A message is a `u64` vector: a kind word, then the body. Extents are
//! carried as-is, samples as their IEEE-754 bit patterns, so both survive
//! the trip exactly.

#![cfg_attr(not(feature = "mpi"), allow(dead_code))]

use crate::payload::Payload;

const EXTENT: u64 = 0;
const SAMPLES: u64 = 1;

/// Encode `payload` into its wire words.
pub(crate) fn encode(payload: &Payload) -> Vec<u64> {
    match payload {
        Payload::Extent(n) => vec![EXTENT, *n as u64],
        Payload::Samples(v) => {
            let mut words = Vec::with_capacity(v.len() + 1);
            words.push(SAMPLES);
            words.extend(v.iter().map(|s| s.to_bits()));
            words
        }
    }
}

/// Decode wire words; `None` if they do not form a payload.
pub(crate) fn decode(words: &[u64]) -> Option<Payload> {
    match words.split_first()? {
        (&EXTENT, [n]) => usize::try_from(*n).ok().map(Payload::Extent),
        (&SAMPLES, body) => Some(Payload::Samples(
            body.iter().map(|&w| f64::from_bits(w)).collect(),
        )),
        _ => None,
    }
}
