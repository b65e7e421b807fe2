use serde::{Deserialize, Serialize};

use crate::error::{ComplexityError, Result};
use crate::vector::ComplexityVector;

const BUILTIN_SCENARIOS: &str = include_str!("../data/scenarios.json");

/// A named starting point.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Scenario {
    pub name: String,
    #[serde(default)]
    pub description: String,
    pub initial: ComplexityVector,
}

/// A scenario document: `{ "scenarios": [ { name, description?, initial } ] }`.
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct ScenarioSet {
    pub scenarios: Vec<Scenario>,
}

impl ScenarioSet {
    pub fn from_json(json: &str) -> Result<Self> {
        Ok(serde_json::from_str(json)?)
    }

    /// Case-insensitive lookup by name.
    pub fn find(&self, name: &str) -> Result<&Scenario> {
        let name = name.trim();
        self.scenarios
            .iter()
            .find(|s| s.name.eq_ignore_ascii_case(name))
            .ok_or_else(|| ComplexityError::ScenarioNotFound(name.to_string()))
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.scenarios.iter().map(|s| s.name.as_str())
    }

    pub fn len(&self) -> usize {
        self.scenarios.len()
    }

    pub fn is_empty(&self) -> bool {
        self.scenarios.is_empty()
    }
}

/// Presets shipped with the crate.
pub fn builtin_scenarios() -> Result<ScenarioSet> {
    ScenarioSet::from_json(BUILTIN_SCENARIOS)
}
