//! How the fixed source field is folded into a tile each iteration.

use std::fmt;
use std::str::FromStr;

use heatsim_core::{ConfigError, Field, FieldError};

/// Cell-wise combination of `current` with the source tile, applied before
/// every exchange.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum ForcingPolicy {
    /// `current = min(current, source)`: the source caps each cell.
    #[default]
    Min,
    /// `current = max(current, source)`: the source is a floor, so hot
    /// cells of the input stay hot.
    Max,
    /// `current = current + source`: constant injection.
    Add,
    /// Leave `current` alone; the source only seeds the first generation.
    None,
}

impl ForcingPolicy {
    /// Every policy, in declaration order.
    pub const ALL: [ForcingPolicy; 4] = [Self::Min, Self::Max, Self::Add, Self::None];

    /// Fold `source` into `current`. Shapes must match; ghosts are untouched.
    pub fn apply(self, current: &mut Field, source: &Field) -> Result<(), FieldError> {
        match self {
            Self::Min => current.zip_apply(source, f64::min),
            Self::Max => current.zip_apply(source, f64::max),
            Self::Add => current.zip_apply(source, |c, s| c + s),
            Self::None => {
                if current.shape() != source.shape() {
                    return Err(FieldError::ShapeMismatch {
                        expected: current.shape(),
                        actual: source.shape(),
                    });
                }
                Ok(())
            }
        }
    }

    /// Lowercase name, as accepted by [`FromStr`].
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Min => "min",
            Self::Max => "max",
            Self::Add => "add",
            Self::None => "none",
        }
    }
}

impl fmt::Display for ForcingPolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ForcingPolicy {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|p| p.as_str().eq_ignore_ascii_case(s))
            .ok_or_else(|| ConfigError::InvalidForcing {
                name: s.to_string(),
            })
    }
}
