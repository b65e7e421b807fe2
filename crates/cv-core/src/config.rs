use serde::{Deserialize, Serialize};

use crate::constants::DEFAULT_MAX_HISTORY;
use crate::error::{ComplexityError, Result};
use crate::vector::ComplexityVector;
use crate::weights::{Deltas, Weights};

/// Session configuration. Every field has a default, so an empty document
/// (TOML or JSON) yields a usable config.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct StateConfig {
    pub max_history: usize,
    pub weights: Weights,
    pub deltas: Deltas,
    /// Vector used for a fresh session and for `reset(None)`.
    pub initial: ComplexityVector,
}

impl Default for StateConfig {
    fn default() -> Self {
        Self {
            max_history: DEFAULT_MAX_HISTORY,
            weights: Weights::equal(),
            deltas: Deltas::default(),
            initial: ComplexityVector::initial(),
        }
    }
}

impl StateConfig {
    pub fn validate(&self) -> Result<()> {
        if self.max_history == 0 {
            return Err(ComplexityError::InvalidConfig(
                "max_history must be at least 1".to_string(),
            ));
        }
        Ok(())
    }
}
