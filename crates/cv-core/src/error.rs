use std::fmt;

use crate::dimension::Dimension;

#[derive(Debug)]
pub enum ComplexityError {
    /// A component fell outside [0, 1].
    OutOfRange { dimension: Dimension, value: f64 },
    /// A component was NaN or infinite.
    NotFinite { dimension: Dimension, value: f64 },
    WrongLength { expected: usize, got: usize },
    UnknownDimension(String),
    DimensionIndex(usize),
    InvalidWeights(String),
    InvalidDelta { dimension: Dimension, value: f64 },
    InterpolationOutOfRange(f64),
    InvalidConfig(String),
    ScenarioNotFound(String),
    InvalidData(String),
}

impl fmt::Display for ComplexityError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ComplexityError::OutOfRange { dimension, value } => {
                write!(f, "{} = {value} is outside [0, 1]", dimension.key())
            }
            ComplexityError::NotFinite { dimension, value } => {
                write!(f, "{} = {value} is not a finite number", dimension.key())
            }
            ComplexityError::WrongLength { expected, got } => {
                write!(f, "expected {expected} components, got {got}")
            }
            ComplexityError::UnknownDimension(key) => write!(f, "unknown dimension '{key}'"),
            ComplexityError::DimensionIndex(idx) => {
                write!(f, "dimension index {idx} out of range (0..=3)")
            }
            ComplexityError::InvalidWeights(msg) => write!(f, "invalid weights: {msg}"),
            ComplexityError::InvalidDelta { dimension, value } => {
                write!(f, "invalid delta for {}: {value}", dimension.key())
            }
            ComplexityError::InterpolationOutOfRange(t) => {
                write!(f, "interpolation factor {t} is outside [0, 1]")
            }
            ComplexityError::InvalidConfig(msg) => write!(f, "invalid config: {msg}"),
            ComplexityError::ScenarioNotFound(name) => write!(f, "scenario '{name}' not found"),
            ComplexityError::InvalidData(msg) => write!(f, "invalid data: {msg}"),
        }
    }
}

impl std::error::Error for ComplexityError {}

impl From<serde_json::Error> for ComplexityError {
    fn from(e: serde_json::Error) -> Self {
        ComplexityError::InvalidData(e.to_string())
    }
}

pub type Result<T> = std::result::Result<T, ComplexityError>;
