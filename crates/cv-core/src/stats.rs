use serde::Serialize;

use crate::constants::BALANCE_RANGE;
use crate::dimension::Dimension;
use crate::vector::ComplexityVector;

/// Summary statistics over the four components of one vector.
#[derive(Clone, Copy, Debug, PartialEq, Serialize)]
pub struct Statistics {
    pub mean: f64,
    pub max: f64,
    pub min: f64,
    pub range: f64,
    /// Population variance.
    pub variance: f64,
    /// First dimension achieving the maximum.
    pub dominant: Dimension,
    /// First dimension achieving the minimum.
    pub weakest: Dimension,
    pub balanced: bool,
}

impl Statistics {
    pub fn of(vector: &ComplexityVector) -> Self {
        let values = vector.to_array();
        let mean = values.iter().sum::<f64>() / 4.0;
        let variance = values.iter().map(|v| (v - mean).powi(2)).sum::<f64>() / 4.0;

        let mut dominant = Dimension::Algorithmic;
        let mut weakest = Dimension::Algorithmic;
        for dim in Dimension::ALL {
            // strict comparisons keep the first index on ties
            if vector.get(dim) > vector.get(dominant) {
                dominant = dim;
            }
            if vector.get(dim) < vector.get(weakest) {
                weakest = dim;
            }
        }

        let max = vector.get(dominant);
        let min = vector.get(weakest);
        let range = max - min;

        Self {
            mean,
            max,
            min,
            range,
            variance,
            dominant,
            weakest,
            balanced: range < BALANCE_RANGE,
        }
    }
}
