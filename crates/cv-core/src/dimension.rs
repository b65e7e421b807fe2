use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::{ComplexityError, Result};

/// One of the four fixed axes of a complexity vector.
///
/// Ordering follows the canonical component order (alg, info, dyn, geom),
/// which is also the order the demonstration cycle improves them in.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum Dimension {
    #[serde(rename = "alg")]
    Algorithmic,
    #[serde(rename = "info")]
    Information,
    #[serde(rename = "dyn")]
    Dynamical,
    #[serde(rename = "geom")]
    Geometric,
}

impl Dimension {
    pub const ALL: [Dimension; 4] = [
        Dimension::Algorithmic,
        Dimension::Information,
        Dimension::Dynamical,
        Dimension::Geometric,
    ];

    /// Short wire key: `alg`, `info`, `dyn`, `geom`.
    pub fn key(self) -> &'static str {
        match self {
            Self::Algorithmic => "alg",
            Self::Information => "info",
            Self::Dynamical => "dyn",
            Self::Geometric => "geom",
        }
    }

    /// Human-readable name for display.
    pub fn label(self) -> &'static str {
        match self {
            Self::Algorithmic => "algorithmic",
            Self::Information => "information",
            Self::Dynamical => "dynamical",
            Self::Geometric => "geometric",
        }
    }

    pub fn index(self) -> usize {
        match self {
            Self::Algorithmic => 0,
            Self::Information => 1,
            Self::Dynamical => 2,
            Self::Geometric => 3,
        }
    }

    pub fn from_index(idx: usize) -> Result<Self> {
        Self::ALL
            .get(idx)
            .copied()
            .ok_or(ComplexityError::DimensionIndex(idx))
    }
}

impl FromStr for Dimension {
    type Err = ComplexityError;

    /// Accepts either the wire key or the long label, case-insensitively.
    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_lowercase().as_str() {
            "alg" | "algorithmic" => Ok(Self::Algorithmic),
            "info" | "information" => Ok(Self::Information),
            "dyn" | "dynamical" => Ok(Self::Dynamical),
            "geom" | "geometric" => Ok(Self::Geometric),
            _ => Err(ComplexityError::UnknownDimension(s.to_string())),
        }
    }
}

impl fmt::Display for Dimension {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.key())
    }
}
