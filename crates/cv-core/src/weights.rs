use std::ops::Index;

use serde::{Deserialize, Serialize};

use crate::constants::{DEFAULT_DELTA, DEFAULT_WEIGHTS, EPSILON};
use crate::dimension::Dimension;
use crate::error::{ComplexityError, Result};

/// Four non-negative weights used to project a vector onto a scalar.
///
/// A `Weights` value is always valid (finite, non-negative, positive sum) but
/// is not necessarily normalized; see [`Weights::normalized`]. The session
/// state only ever stores normalized weights.
#[derive(Clone, Copy, Debug, Serialize, Deserialize)]
#[serde(try_from = "[f64; 4]", into = "[f64; 4]")]
pub struct Weights {
    values: [f64; 4],
}

impl PartialEq for Weights {
    fn eq(&self, other: &Self) -> bool {
        self.values
            .iter()
            .zip(other.values.iter())
            .all(|(a, b)| (a - b).abs() < EPSILON)
    }
}

impl Default for Weights {
    fn default() -> Self {
        Self::equal()
    }
}

impl Weights {
    pub fn new(values: [f64; 4]) -> Result<Self> {
        for (dim, w) in Dimension::ALL.iter().zip(values.iter()) {
            if !w.is_finite() || *w < 0.0 {
                return Err(ComplexityError::InvalidWeights(format!(
                    "{} weight must be finite and non-negative, got {w}",
                    dim.key()
                )));
            }
        }
        let sum: f64 = values.iter().sum();
        if sum <= 0.0 {
            return Err(ComplexityError::InvalidWeights(
                "weights must have a positive sum".to_string(),
            ));
        }
        Ok(Self { values })
    }

    /// Exactly four entries are required.
    pub fn from_slice(values: &[f64]) -> Result<Self> {
        let values: [f64; 4] = values
            .try_into()
            .map_err(|_| ComplexityError::WrongLength {
                expected: 4,
                got: values.len(),
            })?;
        Self::new(values)
    }

    pub fn equal() -> Self {
        Self {
            values: DEFAULT_WEIGHTS,
        }
    }

    pub fn sum(&self) -> f64 {
        self.values.iter().sum()
    }

    pub fn is_normalized(&self) -> bool {
        (self.sum() - 1.0).abs() <= EPSILON
    }

    /// Divide through by the true sum. Already-normalized weights come back unchanged.
    pub fn normalized(&self) -> Self {
        if self.is_normalized() {
            return *self;
        }
        let sum = self.sum();
        Self {
            values: self.values.map(|w| w / sum),
        }
    }

    pub fn get(&self, dimension: Dimension) -> f64 {
        self.values[dimension.index()]
    }

    pub fn to_array(self) -> [f64; 4] {
        self.values
    }
}

impl TryFrom<[f64; 4]> for Weights {
    type Error = ComplexityError;

    fn try_from(values: [f64; 4]) -> Result<Self> {
        Self::new(values)
    }
}

impl From<Weights> for [f64; 4] {
    fn from(w: Weights) -> Self {
        w.values
    }
}

impl Index<Dimension> for Weights {
    type Output = f64;

    fn index(&self, dimension: Dimension) -> &f64 {
        &self.values[dimension.index()]
    }
}

/// Per-dimension improvement step sizes, each in [0, 1].
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "RawDeltas")]
pub struct Deltas {
    alg: f64,
    info: f64,
    #[serde(rename = "dyn")]
    dynamical: f64,
    geom: f64,
}

/// Unvalidated mirror used so deserialized deltas pass through `Deltas::new`.
#[derive(Deserialize)]
struct RawDeltas {
    #[serde(default = "default_delta")]
    alg: f64,
    #[serde(default = "default_delta")]
    info: f64,
    #[serde(rename = "dyn", default = "default_delta")]
    dynamical: f64,
    #[serde(default = "default_delta")]
    geom: f64,
}

fn default_delta() -> f64 {
    DEFAULT_DELTA
}

impl TryFrom<RawDeltas> for Deltas {
    type Error = ComplexityError;

    fn try_from(raw: RawDeltas) -> Result<Self> {
        Self::new([raw.alg, raw.info, raw.dynamical, raw.geom])
    }
}

impl Default for Deltas {
    fn default() -> Self {
        Self::uniform(DEFAULT_DELTA)
    }
}

impl Deltas {
    pub fn new(values: [f64; 4]) -> Result<Self> {
        for dim in Dimension::ALL {
            validate_delta(dim, values[dim.index()])?;
        }
        let [alg, info, dynamical, geom] = values;
        Ok(Self {
            alg,
            info,
            dynamical,
            geom,
        })
    }

    fn uniform(step: f64) -> Self {
        Self {
            alg: step,
            info: step,
            dynamical: step,
            geom: step,
        }
    }

    pub fn get(&self, dimension: Dimension) -> f64 {
        match dimension {
            Dimension::Algorithmic => self.alg,
            Dimension::Information => self.info,
            Dimension::Dynamical => self.dynamical,
            Dimension::Geometric => self.geom,
        }
    }

    fn slot_mut(&mut self, dimension: Dimension) -> &mut f64 {
        match dimension {
            Dimension::Algorithmic => &mut self.alg,
            Dimension::Information => &mut self.info,
            Dimension::Dynamical => &mut self.dynamical,
            Dimension::Geometric => &mut self.geom,
        }
    }

    /// Return a copy with `partial` merged in. All entries are validated
    /// before any is applied.
    pub fn merged<I>(&self, partial: I) -> Result<Self>
    where
        I: IntoIterator<Item = (Dimension, f64)>,
    {
        let updates: Vec<(Dimension, f64)> = partial.into_iter().collect();
        for &(dim, value) in &updates {
            validate_delta(dim, value)?;
        }
        let mut merged = *self;
        for (dim, value) in updates {
            *merged.slot_mut(dim) = value;
        }
        Ok(merged)
    }

    /// Sum of all four step sizes.
    pub fn total(&self) -> f64 {
        self.alg + self.info + self.dynamical + self.geom
    }

    pub fn to_array(self) -> [f64; 4] {
        [self.alg, self.info, self.dynamical, self.geom]
    }
}

fn validate_delta(dimension: Dimension, value: f64) -> Result<()> {
    if !value.is_finite() || !(0.0..=1.0).contains(&value) {
        return Err(ComplexityError::InvalidDelta { dimension, value });
    }
    Ok(())
}
