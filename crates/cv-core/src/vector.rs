use std::fmt;
use std::ops::Index;

use serde::{Deserialize, Serialize};

use crate::constants::{DEFAULT_INITIAL, EPSILON};
use crate::dimension::Dimension;
use crate::error::{ComplexityError, Result};

/// A point in the four-dimensional complexity space.
///
/// Every component is a finite real in [0, 1]. Arithmetic saturates at the
/// boundary: `add`, `subtract` and `scale` clamp their results, so information
/// past the edge is silently lost. Serialized as `[alg, info, dyn, geom]`;
/// deserialization goes through the same validation as construction.
#[derive(Clone, Copy, Debug, Serialize, Deserialize)]
#[serde(try_from = "[f64; 4]", into = "[f64; 4]")]
pub struct ComplexityVector {
    components: [f64; 4],
}

impl PartialEq for ComplexityVector {
    fn eq(&self, other: &Self) -> bool {
        self.equals(other, EPSILON)
    }
}

impl ComplexityVector {
    pub fn new(alg: f64, info: f64, dynamical: f64, geom: f64) -> Result<Self> {
        Self::from_array([alg, info, dynamical, geom])
    }

    /// Validate and wrap an `[alg, info, dyn, geom]` array.
    pub fn from_array(components: [f64; 4]) -> Result<Self> {
        for dim in Dimension::ALL {
            validate_component(dim, components[dim.index()])?;
        }
        Ok(Self { components })
    }

    /// Build from an ordered sequence, which must hold exactly four values.
    pub fn from_slice(values: &[f64]) -> Result<Self> {
        let components: [f64; 4] =
            values
                .try_into()
                .map_err(|_| ComplexityError::WrongLength {
                    expected: 4,
                    got: values.len(),
                })?;
        Self::from_array(components)
    }

    /// The canonical starting vector for a fresh session.
    pub fn initial() -> Self {
        Self {
            components: DEFAULT_INITIAL,
        }
    }

    /// All four components at zero.
    pub fn zero() -> Self {
        Self {
            components: [0.0; 4],
        }
    }

    /// Build from arbitrary reals, clamping each into [0, 1]. NaN maps to 0.
    pub(crate) fn saturating(components: [f64; 4]) -> Self {
        Self {
            components: components.map(clamp_unit),
        }
    }

    pub fn get(&self, dimension: Dimension) -> f64 {
        self.components[dimension.index()]
    }

    /// Keyed lookup by wire key or label. Unknown keys are an error, not a sentinel.
    pub fn get_by_key(&self, key: &str) -> Result<f64> {
        Ok(self.get(key.parse()?))
    }

    /// Replace one component. The vector is untouched if `value` is invalid.
    pub fn set(&mut self, dimension: Dimension, value: f64) -> Result<()> {
        validate_component(dimension, value)?;
        self.components[dimension.index()] = value;
        Ok(())
    }

    pub fn set_by_key(&mut self, key: &str, value: f64) -> Result<()> {
        self.set(key.parse()?, value)
    }

    pub fn alg(&self) -> f64 {
        self.components[0]
    }

    pub fn info(&self) -> f64 {
        self.components[1]
    }

    pub fn dynamical(&self) -> f64 {
        self.components[2]
    }

    pub fn geom(&self) -> f64 {
        self.components[3]
    }

    /// Component-wise sum, clamped into [0, 1].
    pub fn add(&self, other: &Self) -> Self {
        self.zip_with(other, |a, b| a + b)
    }

    /// Component-wise difference, clamped into [0, 1].
    pub fn subtract(&self, other: &Self) -> Self {
        self.zip_with(other, |a, b| a - b)
    }

    /// Component-wise multiply by `factor`, clamped into [0, 1].
    pub fn scale(&self, factor: f64) -> Self {
        Self::saturating(self.components.map(|c| c * factor))
    }

    /// Euclidean norm of the four components.
    pub fn magnitude(&self) -> f64 {
        self.components.iter().map(|c| c * c).sum::<f64>().sqrt()
    }

    /// True when every component differs by less than `tolerance`.
    pub fn equals(&self, other: &Self, tolerance: f64) -> bool {
        self.components
            .iter()
            .zip(other.components.iter())
            .all(|(a, b)| (a - b).abs() < tolerance)
    }

    /// Raw (unclamped) per-dimension difference `other - self`.
    pub fn delta_to(&self, other: &Self) -> [f64; 4] {
        std::array::from_fn(|i| other.components[i] - self.components[i])
    }

    pub fn to_array(self) -> [f64; 4] {
        self.components
    }

    /// Iterate `(dimension, value)` pairs in canonical order.
    pub fn iter(&self) -> impl Iterator<Item = (Dimension, f64)> + '_ {
        Dimension::ALL.into_iter().map(|d| (d, self.get(d)))
    }

    fn zip_with(&self, other: &Self, f: impl Fn(f64, f64) -> f64) -> Self {
        Self::saturating(std::array::from_fn(|i| {
            f(self.components[i], other.components[i])
        }))
    }
}

impl TryFrom<[f64; 4]> for ComplexityVector {
    type Error = ComplexityError;

    fn try_from(components: [f64; 4]) -> Result<Self> {
        Self::from_array(components)
    }
}

impl From<ComplexityVector> for [f64; 4] {
    fn from(v: ComplexityVector) -> Self {
        v.components
    }
}

impl AsRef<[f64]> for ComplexityVector {
    fn as_ref(&self) -> &[f64] {
        &self.components
    }
}

impl Index<Dimension> for ComplexityVector {
    type Output = f64;

    fn index(&self, dimension: Dimension) -> &f64 {
        &self.components[dimension.index()]
    }
}

impl fmt::Display for ComplexityVector {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let [a, i, d, g] = self.components;
        write!(f, "[{a:.3}, {i:.3}, {d:.3}, {g:.3}]")
    }
}

fn validate_component(dimension: Dimension, value: f64) -> Result<()> {
    if !value.is_finite() {
        return Err(ComplexityError::NotFinite { dimension, value });
    }
    if !(0.0..=1.0).contains(&value) {
        return Err(ComplexityError::OutOfRange { dimension, value });
    }
    Ok(())
}

pub(crate) fn clamp_unit(value: f64) -> f64 {
    if value.is_nan() {
        0.0
    } else {
        value.clamp(0.0, 1.0)
    }
}
