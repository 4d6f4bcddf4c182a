//! The [`Kernel`] trait and the built-in five-point stencils.

use std::sync::Arc;

use heatsim_core::{ConfigError, Field, FieldError};

/// A stencil update from one tile generation to the next.
///
/// # Contract
///
/// - `apply` reads only `current` (interior and ghost ring) and writes
///   every interior cell of `next`. Ghosts of `next` are left alone; the
///   next exchange overwrites them.
/// - `apply` is deterministic. Two calls on equal inputs produce
///   bit-identical outputs, which is what lets a distributed run be checked
///   against a single-field reference.
/// - `&self`: kernels are stateless and shared by every worker of a job.
///
/// # Examples
///
/// ```
/// use heatsim_core::Field;
/// use heatsim_kernel::{FivePointMean, Kernel};
///
/// let current = Field::filled(4, 4, 2.0).unwrap().repad(1).unwrap();
/// let mut next = Field::with_padding(4, 4, 1).unwrap();
/// // Ghosts of `current` are still zero, so edge cells lose heat.
/// FivePointMean.apply(&current, &mut next).unwrap();
/// assert_eq!(next.get(1, 1), 2.0);
/// assert_eq!(next.get(0, 1), 1.6);
/// ```
pub trait Kernel: Send + Sync {
    /// Short name for logs.
    fn name(&self) -> &str;

    /// Ghost-ring width this kernel reads past each tile edge.
    fn required_padding(&self) -> usize {
        1
    }

    /// Compute `next` from `current`.
    fn apply(&self, current: &Field, next: &mut Field) -> Result<(), FieldError>;
}

/// Check the shapes a five-point stencil needs.
fn check_stencil(kernel: &dyn Kernel, current: &Field, next: &Field) -> Result<(), FieldError> {
    if current.shape() != next.shape() {
        return Err(FieldError::ShapeMismatch {
            expected: current.shape(),
            actual: next.shape(),
        });
    }
    let need = kernel.required_padding();
    if current.padding() < need {
        return Err(FieldError::IndexOutOfBounds {
            index: -(need as isize),
            bounds: format!("ghost ring of width {}", current.padding()),
        });
    }
    Ok(())
}

/// Apply `f(c, n, s, e, w)` to every interior cell.
#[inline]
fn five_point(current: &Field, next: &mut Field, f: impl Fn(f64, f64, f64, f64, f64) -> f64) {
    for y in 0..current.height() {
        let yi = y as isize;
        let row = next.interior_row_mut(y);
        for (x, out) in row.iter_mut().enumerate() {
            let xi = x as isize;
            *out = f(
                current.sample(xi, yi),
                current.sample(xi, yi - 1),
                current.sample(xi, yi + 1),
                current.sample(xi + 1, yi),
                current.sample(xi - 1, yi),
            );
        }
    }
}

/// Mean of a cell and its four neighbours.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct FivePointMean;

impl Kernel for FivePointMean {
    fn name(&self) -> &str {
        "five_point_mean"
    }

    fn apply(&self, current: &Field, next: &mut Field) -> Result<(), FieldError> {
        check_stencil(self, current, next)?;
        five_point(current, next, |c, n, s, e, w| (c + n + s + e + w) / 5.0);
        Ok(())
    }
}

/// Forward-Euler step of the heat equation on a unit grid:
/// `c + alpha * (n + s + e + w - 4c)`.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct ExplicitDiffusion {
    alpha: f64,
}

impl ExplicitDiffusion {
    /// Largest coefficient for which the explicit scheme is stable.
    pub const MAX_ALPHA: f64 = 0.25;

    /// Build a kernel with diffusion coefficient `alpha`.
    ///
    /// Fails unless `0 < alpha <= 0.25`.
    pub fn new(alpha: f64) -> Result<Self, ConfigError> {
        if !alpha.is_finite() || alpha <= 0.0 || alpha > Self::MAX_ALPHA {
            return Err(ConfigError::InvalidKernel {
                reason: format!("alpha must be in (0, {}], got {alpha}", Self::MAX_ALPHA),
            });
        }
        Ok(Self { alpha })
    }

    /// The diffusion coefficient.
    pub fn alpha(&self) -> f64 {
        self.alpha
    }
}

impl Kernel for ExplicitDiffusion {
    fn name(&self) -> &str {
        "explicit_diffusion"
    }

    fn apply(&self, current: &Field, next: &mut Field) -> Result<(), FieldError> {
        check_stencil(self, current, next)?;
        let alpha = self.alpha;
        five_point(current, next, |c, n, s, e, w| {
            c + alpha * (n + s + e + w - 4.0 * c)
        });
        Ok(())
    }
}

/// Kernel selection as it appears in configuration.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub enum KernelChoice {
    /// [`FivePointMean`].
    #[default]
    FivePointMean,
    /// [`ExplicitDiffusion`] with the given coefficient.
    ExplicitDiffusion {
        /// Diffusion coefficient, `0 < alpha <= 0.25`.
        alpha: f64,
    },
}

impl KernelChoice {
    /// Instantiate the selected kernel, ready to share across workers.
    pub fn build(self) -> Result<Arc<dyn Kernel>, ConfigError> {
        match self {
            Self::FivePointMean => Ok(Arc::new(FivePointMean)),
            Self::ExplicitDiffusion { alpha } => Ok(Arc::new(ExplicitDiffusion::new(alpha)?)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn padded(width: usize, height: usize, data: Vec<f64>) -> Field {
        Field::from_vec(width, height, data).unwrap().repad(1).unwrap()
    }

    fn wrap_ghosts(f: &mut Field) {
        let (w, h) = f.shape();
        let top = f.row(0).unwrap().to_vec();
        let bottom = f.row(h as isize - 1).unwrap().to_vec();
        f.row_mut(h as isize).unwrap().copy_from_slice(&top).unwrap();
        f.row_mut(-1).unwrap().copy_from_slice(&bottom).unwrap();
        let left = f.column(0).unwrap().to_vec();
        let right = f.column(w as isize - 1).unwrap().to_vec();
        f.column_mut(w as isize).unwrap().copy_from_slice(&left).unwrap();
        f.column_mut(-1).unwrap().copy_from_slice(&right).unwrap();
    }

    #[test]
    fn mean_averages_cell_and_neighbours() {
        let current = padded(3, 3, vec![0.0, 1.0, 0.0, 2.0, 5.0, 4.0, 0.0, 3.0, 0.0]);
        let mut next = Field::with_padding(3, 3, 1).unwrap();
        FivePointMean.apply(&current, &mut next).unwrap();
        assert_eq!(next.get(1, 1), 3.0);
        // Corner (0, 0): itself 0, south 2, east 1, ghosts 0.
        assert_eq!(next.get(0, 0), 0.6);
    }

    #[test]
    fn constant_field_is_a_fixed_point_under_wrap() {
        let mut current = Field::filled(5, 4, 7.5).unwrap().repad(1).unwrap();
        wrap_ghosts(&mut current);
        let mut next = Field::with_padding(5, 4, 1).unwrap();
        FivePointMean.apply(&current, &mut next).unwrap();
        assert!(next.interior_to_vec().iter().all(|&v| v == 7.5));

        let k = ExplicitDiffusion::new(0.2).unwrap();
        k.apply(&current, &mut next).unwrap();
        assert!(next.interior_to_vec().iter().all(|&v| v == 7.5));
    }

    #[test]
    fn explicit_diffusion_spreads_a_point() {
        let mut data = vec![0.0; 9];
        data[4] = 1.0;
        let current = padded(3, 3, data);
        let mut next = Field::with_padding(3, 3, 1).unwrap();
        ExplicitDiffusion::new(0.25).unwrap().apply(&current, &mut next).unwrap();
        assert_eq!(next.get(1, 1), 0.0);
        assert_eq!(next.get(1, 0), 0.25);
        assert_eq!(next.get(0, 1), 0.25);
        assert_eq!(next.get(0, 0), 0.0);
    }

    #[test]
    fn alpha_outside_stable_range_is_rejected() {
        for alpha in [0.0, -0.1, 0.3, f64::NAN] {
            assert!(matches!(
                ExplicitDiffusion::new(alpha),
                Err(ConfigError::InvalidKernel { .. })
            ));
        }
        assert_eq!(ExplicitDiffusion::new(0.25).unwrap().alpha(), 0.25);
    }

    #[test]
    fn unpadded_input_is_rejected() {
        let current = Field::new(3, 3).unwrap();
        let mut next = Field::new(3, 3).unwrap();
        assert!(matches!(
            FivePointMean.apply(&current, &mut next),
            Err(FieldError::IndexOutOfBounds { .. })
        ));
    }

    #[test]
    fn shape_mismatch_is_rejected() {
        let current = Field::with_padding(3, 3, 1).unwrap();
        let mut next = Field::with_padding(3, 4, 1).unwrap();
        assert!(matches!(
            FivePointMean.apply(&current, &mut next),
            Err(FieldError::ShapeMismatch { .. })
        ));
    }

    #[test]
    fn choice_builds_named_kernels() {
        assert_eq!(KernelChoice::default().build().unwrap().name(), "five_point_mean");
        let k = KernelChoice::ExplicitDiffusion { alpha: 0.1 }.build().unwrap();
        assert_eq!(k.name(), "explicit_diffusion");
        assert!(KernelChoice::ExplicitDiffusion { alpha: 1.0 }.build().is_err());
    }

    proptest! {
        #[test]
        fn wrapped_kernels_conserve_heat(
            data in prop::collection::vec(0.0f64..1000.0, 24),
            alpha in 0.01f64..0.25,
        ) {
            let mut current = padded(6, 4, data);
            wrap_ghosts(&mut current);
            let before = current.interior_sum();
            let mut next = Field::with_padding(6, 4, 1).unwrap();

            FivePointMean.apply(&current, &mut next).unwrap();
            prop_assert!((next.interior_sum() - before).abs() < 1e-6);

            ExplicitDiffusion::new(alpha).unwrap().apply(&current, &mut next).unwrap();
            prop_assert!((next.interior_sum() - before).abs() < 1e-6);
        }
    }
}
