//! Padded scalar field storage and stride-aware row/column views.
//!
//! A [`Field`] owns `width × height` interior samples surrounded by
//! `padding` ghost rows and columns on every side, stored row-major in one
//! contiguous buffer of `padded_width × padded_height` samples:
//!
//! ```text
//!   padding
//!   ┌─┬──────────────┬─┐
//!   │g│ ghost row -1 │g│
//!   ├─┼──────────────┼─┤
//!   │ │              │ │   interior (x, y) lives at
//!   │ │   interior   │ │   (y + padding) * padded_width + (x + padding)
//!   │ │              │ │
//!   ├─┼──────────────┼─┤
//!   │g│ ghost row  h │g│
//!   └─┴──────────────┴─┘
//! ```
//!
//! Ghost cells start at zero and are written only by the halo exchange.
//! Row and column views address the ghost ring with signed indices
//! (`-padding .. len + padding`), so exchange code never computes offsets.

use std::fmt;

use crate::error::{FieldError, ResourceError};

/// A rectangular buffer of `f64` samples with a ghost-cell border.
#[derive(Clone, Debug, PartialEq)]
pub struct Field {
    width: usize,
    height: usize,
    padding: usize,
    data: Vec<f64>,
}

fn padded_len(width: usize, height: usize, padding: usize) -> Result<usize, ResourceError> {
    let border = padding.checked_mul(2);
    let pw = border.and_then(|b| b.checked_add(width));
    let ph = border.and_then(|b| b.checked_add(height));
    pw.zip(ph)
        .and_then(|(w, h)| w.checked_mul(h))
        .ok_or(ResourceError::SizeOverflow {
            width,
            height,
            padding,
        })
}

fn zeroed(samples: usize) -> Result<Vec<f64>, ResourceError> {
    let mut data = Vec::new();
    data.try_reserve_exact(samples)
        .map_err(|_| ResourceError::AllocationFailed { samples })?;
    data.resize(samples, 0.0);
    Ok(data)
}

impl Field {
    /// Create a zero-filled field without ghost cells.
    pub fn new(width: usize, height: usize) -> Result<Self, ResourceError> {
        Self::with_padding(width, height, 0)
    }

    /// Create a zero-filled field with `padding` ghost cells on every side.
    pub fn with_padding(width: usize, height: usize, padding: usize) -> Result<Self, ResourceError> {
        let data = zeroed(padded_len(width, height, padding)?)?;
        Ok(Self {
            width,
            height,
            padding,
            data,
        })
    }

    /// Backing-buffer length of a `width × height` field with `padding`
    /// ghost cells per side, or an overflow error.
    pub fn padded_len(width: usize, height: usize, padding: usize) -> Result<usize, ResourceError> {
        padded_len(width, height, padding)
    }

    /// Create an unpadded field with every sample set to `value`.
    pub fn filled(width: usize, height: usize, value: f64) -> Result<Self, ResourceError> {
        let mut field = Self::new(width, height)?;
        field.fill(value);
        Ok(field)
    }

    /// Wrap a row-major buffer of `width * height` samples (no padding).
    pub fn from_vec(width: usize, height: usize, data: Vec<f64>) -> Result<Self, FieldError> {
        Self::from_padded_vec(width, height, 0, data)
    }

    /// Wrap a row-major buffer that already includes the ghost border.
    pub fn from_padded_vec(
        width: usize,
        height: usize,
        padding: usize,
        data: Vec<f64>,
    ) -> Result<Self, FieldError> {
        let expected = padded_len(width, height, padding)?;
        if data.len() != expected {
            return Err(FieldError::LengthMismatch {
                expected,
                actual: data.len(),
            });
        }
        Ok(Self {
            width,
            height,
            padding,
            data,
        })
    }

    /// Copy the interior into a fresh buffer with a different ghost border.
    ///
    /// The new ghost ring is zero. Re-padding to 0 strips the ghosts,
    /// which is how a stencil-ready tile is reduced back to its payload.
    pub fn repad(&self, padding: usize) -> Result<Self, ResourceError> {
        let mut out = Self::with_padding(self.width, self.height, padding)?;
        for y in 0..self.height {
            out.interior_row_mut(y).copy_from_slice(self.interior_row(y));
        }
        Ok(out)
    }

    /// Interior width in samples.
    pub fn width(&self) -> usize {
        self.width
    }

    /// Interior height in samples.
    pub fn height(&self) -> usize {
        self.height
    }

    /// Ghost border width on every side.
    pub fn padding(&self) -> usize {
        self.padding
    }

    /// Width of one buffer row, ghosts included.
    pub fn padded_width(&self) -> usize {
        self.width + 2 * self.padding
    }

    /// Number of buffer rows, ghosts included.
    pub fn padded_height(&self) -> usize {
        self.height + 2 * self.padding
    }

    /// Number of interior samples.
    pub fn len(&self) -> usize {
        self.width * self.height
    }

    /// Whether the interior holds no samples.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// `(width, height)` of the interior.
    pub fn shape(&self) -> (usize, usize) {
        (self.width, self.height)
    }

    #[inline]
    fn offset(&self, x: usize, y: usize) -> usize {
        debug_assert!(
            x < self.width && y < self.height,
            "({x}, {y}) outside {}x{} interior",
            self.width,
            self.height
        );
        (y + self.padding) * self.padded_width() + (x + self.padding)
    }

    #[inline]
    fn signed_offset(&self, x: isize, y: isize) -> usize {
        let p = self.padding as isize;
        debug_assert!(
            x >= -p && x < self.width as isize + p && y >= -p && y < self.height as isize + p,
            "({x}, {y}) outside padded {}x{} field",
            self.padded_width(),
            self.padded_height()
        );
        (y + p) as usize * self.padded_width() + (x + p) as usize
    }

    /// Interior sample at `(x, y)`.
    #[inline]
    pub fn get(&self, x: usize, y: usize) -> f64 {
        self.data[self.offset(x, y)]
    }

    /// Overwrite the interior sample at `(x, y)`.
    #[inline]
    pub fn set(&mut self, x: usize, y: usize, value: f64) {
        let i = self.offset(x, y);
        self.data[i] = value;
    }

    /// Sample at interior-relative `(x, y)`, reaching into the ghost ring
    /// for indices in `-padding..0` and `len..len + padding`.
    ///
    /// Reserved for stencil kernels, which read one cell past each edge.
    #[inline]
    pub fn sample(&self, x: isize, y: isize) -> f64 {
        self.data[self.signed_offset(x, y)]
    }

    /// Multiply every interior sample by `scalar`. Ghosts are untouched.
    pub fn multiply_all(&mut self, scalar: f64) {
        for y in 0..self.height {
            for v in self.interior_row_mut(y) {
                *v *= scalar;
            }
        }
    }

    /// Set every interior sample to `value`. Ghosts are untouched.
    pub fn fill(&mut self, value: f64) {
        for y in 0..self.height {
            self.interior_row_mut(y).fill(value);
        }
    }

    /// Copy this field's interior into `dest`, which must have the same
    /// interior shape. Padding may differ; `dest`'s ghosts are untouched.
    pub fn copy_into(&self, dest: &mut Field) -> Result<(), FieldError> {
        if self.shape() != dest.shape() {
            return Err(FieldError::ShapeMismatch {
                expected: dest.shape(),
                actual: self.shape(),
            });
        }
        for y in 0..self.height {
            dest.interior_row_mut(y)
                .copy_from_slice(self.interior_row(y));
        }
        Ok(())
    }

    /// Combine `other` into this field cell by cell: `self = f(self, other)`.
    ///
    /// Both fields must share an interior shape. Ghosts are untouched.
    pub fn zip_apply(
        &mut self,
        other: &Field,
        f: impl Fn(f64, f64) -> f64,
    ) -> Result<(), FieldError> {
        if self.shape() != other.shape() {
            return Err(FieldError::ShapeMismatch {
                expected: self.shape(),
                actual: other.shape(),
            });
        }
        for y in 0..self.height {
            let src = other.interior_row(y);
            for (dst, &s) in self.interior_row_mut(y).iter_mut().zip(src) {
                *dst = f(*dst, s);
            }
        }
        Ok(())
    }

    /// Contiguous interior samples of row `y`.
    pub fn interior_row(&self, y: usize) -> &[f64] {
        let start = self.offset(0, y);
        &self.data[start..start + self.width]
    }

    /// Mutable contiguous interior samples of row `y`.
    pub fn interior_row_mut(&mut self, y: usize) -> &mut [f64] {
        let start = self.offset(0, y);
        let width = self.width;
        &mut self.data[start..start + width]
    }

    fn check_index(&self, index: isize, len: usize, axis: &str) -> Result<(), FieldError> {
        let p = self.padding as isize;
        if index < -p || index >= len as isize + p {
            return Err(FieldError::IndexOutOfBounds {
                index,
                bounds: format!("{axis} in [{}, {})", -p, len as isize + p),
            });
        }
        Ok(())
    }

    /// View of row `y` across the interior columns (`width` samples, stride 1).
    ///
    /// `y` may address ghost rows: `-1` is the ghost row above the interior,
    /// `height` the one below.
    pub fn row(&self, y: isize) -> Result<StridedView<'_>, FieldError> {
        self.check_index(y, self.height, "row")?;
        Ok(StridedView {
            data: &self.data,
            start: self.signed_offset(0, y),
            len: self.width,
            stride: 1,
        })
    }

    /// Mutable view of row `y`; see [`row`](Self::row).
    pub fn row_mut(&mut self, y: isize) -> Result<StridedViewMut<'_>, FieldError> {
        self.check_index(y, self.height, "row")?;
        let start = self.signed_offset(0, y);
        let len = self.width;
        Ok(StridedViewMut {
            data: &mut self.data,
            start,
            len,
            stride: 1,
        })
    }

    /// View of column `x` across the interior rows (`height` samples,
    /// stride `padded_width`).
    ///
    /// `x` may address ghost columns: `-1` is the ghost column left of the
    /// interior, `width` the one to its right.
    pub fn column(&self, x: isize) -> Result<StridedView<'_>, FieldError> {
        self.check_index(x, self.width, "column")?;
        Ok(StridedView {
            data: &self.data,
            start: self.signed_offset(x, 0),
            len: self.height,
            stride: self.padded_width(),
        })
    }

    /// Mutable view of column `x`; see [`column`](Self::column).
    pub fn column_mut(&mut self, x: isize) -> Result<StridedViewMut<'_>, FieldError> {
        self.check_index(x, self.width, "column")?;
        let start = self.signed_offset(x, 0);
        let len = self.height;
        let stride = self.padded_width();
        Ok(StridedViewMut {
            data: &mut self.data,
            start,
            len,
            stride,
        })
    }

    /// Interior samples in row-major order, ghosts stripped.
    pub fn interior_to_vec(&self) -> Vec<f64> {
        let mut out = Vec::with_capacity(self.len());
        for y in 0..self.height {
            out.extend_from_slice(self.interior_row(y));
        }
        out
    }

    /// The whole backing buffer, ghosts included.
    pub fn as_padded_slice(&self) -> &[f64] {
        &self.data
    }

    /// Consume the field, returning the backing buffer (ghosts included).
    pub fn into_padded_vec(self) -> Vec<f64> {
        self.data
    }

    /// Sum of the interior samples.
    pub fn interior_sum(&self) -> f64 {
        (0..self.height)
            .map(|y| self.interior_row(y).iter().sum::<f64>())
            .sum()
    }
}

/// Grid dump, ghost ring included, one buffer row per line.
impl fmt::Display for Field {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(
            f,
            "width={} height={} padding={}",
            self.width, self.height, self.padding
        )?;
        for row in self.data.chunks(self.padded_width().max(1)) {
            for v in row {
                write!(f, "{v:9.3}")?;
            }
            writeln!(f)?;
        }
        Ok(())
    }
}

/// Read-only run of `len` samples taken every `stride` buffer elements.
#[derive(Clone, Copy, Debug)]
pub struct StridedView<'a> {
    data: &'a [f64],
    start: usize,
    len: usize,
    stride: usize,
}

impl<'a> StridedView<'a> {
    /// Number of samples in the view.
    pub fn len(&self) -> usize {
        self.len
    }

    /// Whether the view is empty.
    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Element stride in the backing buffer (1 for rows).
    pub fn stride(&self) -> usize {
        self.stride
    }

    /// Sample `i` of the view.
    pub fn get(&self, i: usize) -> Option<f64> {
        (i < self.len).then(|| self.data[self.start + i * self.stride])
    }

    /// Iterate the samples in order.
    pub fn iter(&self) -> impl Iterator<Item = f64> + 'a {
        let data: &'a [f64] = self.data;
        data[self.start..]
            .iter()
            .step_by(self.stride.max(1))
            .take(self.len)
            .copied()
    }

    /// The samples as a slice, if the view is contiguous.
    pub fn as_contiguous(&self) -> Option<&'a [f64]> {
        let data: &'a [f64] = self.data;
        (self.stride == 1).then(|| &data[self.start..self.start + self.len])
    }

    /// Gather the samples into an owned buffer.
    pub fn to_vec(&self) -> Vec<f64> {
        match self.as_contiguous() {
            Some(s) => s.to_vec(),
            None => self.iter().collect(),
        }
    }
}

/// Mutable counterpart of [`StridedView`].
#[derive(Debug)]
pub struct StridedViewMut<'a> {
    data: &'a mut [f64],
    start: usize,
    len: usize,
    stride: usize,
}

impl StridedViewMut<'_> {
    /// Number of samples in the view.
    pub fn len(&self) -> usize {
        self.len
    }

    /// Whether the view is empty.
    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Element stride in the backing buffer.
    pub fn stride(&self) -> usize {
        self.stride
    }

    /// Overwrite sample `i`. Returns `false` if `i` is out of range.
    pub fn set(&mut self, i: usize, value: f64) -> bool {
        if i >= self.len {
            return false;
        }
        self.data[self.start + i * self.stride] = value;
        true
    }

    /// Scatter `src` into the view; `src.len()` must equal the view length.
    pub fn copy_from_slice(&mut self, src: &[f64]) -> Result<(), FieldError> {
        if src.len() != self.len {
            return Err(FieldError::LengthMismatch {
                expected: self.len,
                actual: src.len(),
            });
        }
        if self.stride == 1 {
            self.data[self.start..self.start + self.len].copy_from_slice(src);
        } else {
            for (i, &v) in src.iter().enumerate() {
                self.data[self.start + i * self.stride] = v;
            }
        }
        Ok(())
    }

    /// Set every sample of the view to `value`.
    pub fn fill(&mut self, value: f64) {
        for i in 0..self.len {
            self.data[self.start + i * self.stride] = value;
        }
    }
}
