//! PNG input and output.
//!
//! Input temperatures come from the red channel: a red value of 255 is
//! [`MAX_TEMP`], 0 is zero. Output is an 8-bit grayscale image on the same
//! scale, with temperatures outside `[0, MAX_TEMP]` clamped.

use std::error::Error;
use std::fmt;
use std::path::{Path, PathBuf};

use heatsim_core::{Field, FieldError};
use image::{GrayImage, ImageFormat, Luma, RgbImage};
use tracing::debug;

use crate::MAX_TEMP;

/// Failure to read or write an image.
#[derive(Debug)]
pub enum ImageError {
    /// The file could not be opened or decoded.
    Load {
        /// The input path.
        path: PathBuf,
        /// Decoder error.
        source: image::ImageError,
    },
    /// The file could not be encoded or written.
    Save {
        /// The output path.
        path: PathBuf,
        /// Encoder error.
        source: image::ImageError,
    },
    /// The image has no pixels.
    Empty {
        /// The input path.
        path: PathBuf,
    },
    /// The pixel buffer did not fit a field.
    Field(FieldError),
}

impl fmt::Display for ImageError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Load { path, source } => write!(f, "cannot load {}: {source}", path.display()),
            Self::Save { path, source } => write!(f, "cannot save {}: {source}", path.display()),
            Self::Empty { path } => write!(f, "{} has no pixels", path.display()),
            Self::Field(e) => write!(f, "image does not fit a field: {e}"),
        }
    }
}

impl Error for ImageError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Load { source, .. } | Self::Save { source, .. } => Some(source),
            Self::Field(e) => Some(e),
            Self::Empty { .. } => None,
        }
    }
}

impl From<FieldError> for ImageError {
    fn from(e: FieldError) -> Self {
        Self::Field(e)
    }
}

/// Temperatures from the red channel of `image`, scaled to `MAX_TEMP`.
pub fn field_from_rgb(image: &RgbImage) -> Result<Field, FieldError> {
    let (width, height) = image.dimensions();
    let data = image
        .pixels()
        .map(|p| f64::from(p.0[0]) / 255.0 * MAX_TEMP)
        .collect();
    Field::from_vec(width as usize, height as usize, data)
}

/// Grayscale rendering of `field`'s interior, `MAX_TEMP` as white.
pub fn field_to_gray(field: &Field) -> GrayImage {
    let (width, height) = field.shape();
    GrayImage::from_fn(width as u32, height as u32, |x, y| {
        let t = field.get(x as usize, y as usize) / MAX_TEMP;
        Luma([(t.clamp(0.0, 1.0) * 255.0).round() as u8])
    })
}

/// Load a PNG and convert its red channel to a temperature field.
pub fn load_png(path: &Path) -> Result<Field, ImageError> {
    let image = image::open(path)
        .map_err(|source| ImageError::Load {
            path: path.to_path_buf(),
            source,
        })?
        .to_rgb8();
    if image.width() == 0 || image.height() == 0 {
        return Err(ImageError::Empty {
            path: path.to_path_buf(),
        });
    }
    debug!(path = %path.display(), width = image.width(), height = image.height(), "loaded input");
    Ok(field_from_rgb(&image)?)
}

/// Save `field` as an 8-bit grayscale PNG.
pub fn save_png(field: &Field, path: &Path) -> Result<(), ImageError> {
    field_to_gray(field)
        .save_with_format(path, ImageFormat::Png)
        .map_err(|source| ImageError::Save {
            path: path.to_path_buf(),
            source,
        })?;
    debug!(path = %path.display(), "wrote output");
    Ok(())
}
