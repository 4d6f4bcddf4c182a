use heatsim_core::Field;
use heatsim_kernel::{ForcingPolicy, Kernel};

/// Fill the one-cell ghost ring of `field` from its own opposite edges.
///
/// This is what a 1×1 process grid's halo exchange produces; corners are
/// left alone.
pub fn wrap_ghosts(field: &mut Field) {
    let (w, h) = field.shape();
    let (w, h) = (w as isize, h as isize);
    let top = field.row(0).expect("top row").to_vec();
    let bottom = field.row(h - 1).expect("bottom row").to_vec();
    let left = field.column(0).expect("left column").to_vec();
    let right = field.column(w - 1).expect("right column").to_vec();
    field
        .row_mut(-1)
        .and_then(|mut v| v.copy_from_slice(&bottom))
        .expect("north ghost");
    field
        .row_mut(h)
        .and_then(|mut v| v.copy_from_slice(&top))
        .expect("south ghost");
    field
        .column_mut(-1)
        .and_then(|mut v| v.copy_from_slice(&right))
        .expect("west ghost");
    field
        .column_mut(w)
        .and_then(|mut v| v.copy_from_slice(&left))
        .expect("east ghost");
}

/// Run `iterations` steps of `kernel` on the whole of `input` with
/// periodic boundaries, forcing from `input` each step.
///
/// Returns the unpadded result. A distributed run over any process grid
/// must reproduce this bit for bit.
pub fn reference_run(
    input: &Field,
    kernel: &dyn Kernel,
    forcing: ForcingPolicy,
    iterations: u64,
) -> Field {
    let source = input.repad(0).expect("source copy");
    let mut current = input.repad(1).expect("padded input");
    let mut next = current.clone();
    for _ in 0..iterations {
        forcing
            .apply(&mut current, &source)
            .expect("forcing shapes agree");
        wrap_ghosts(&mut current);
        kernel.apply(&current, &mut next).expect("kernel step");
        std::mem::swap(&mut current, &mut next);
    }
    current.repad(0).expect("unpadded result")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fixtures;
    use heatsim_kernel::FivePointMean;

    #[test]
    fn zero_iterations_return_the_input() {
        let input = fixtures::numbered(4, 3);
        assert_eq!(reference_run(&input, &FivePointMean, ForcingPolicy::Min, 0), input);
    }

    #[test]
    fn reference_conserves_heat_without_forcing() {
        let input = fixtures::hot_spot(6, 6, 0, 0, 360.0);
        let out = reference_run(&input, &FivePointMean, ForcingPolicy::None, 5);
        assert!((out.interior_sum() - 360.0).abs() < 1e-9);
        // Heat wrapped across the corner.
        assert!(out.get(5, 5) > 0.0);
    }
}
