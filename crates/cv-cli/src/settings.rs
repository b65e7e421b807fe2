use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use cv_core::{
    ComplexityState, ComplexityVector, ScenarioSet, StateConfig, Weights, builtin_scenarios,
};

/// Environment variable naming a TOML session config.
pub const CONFIG_ENV: &str = "CV_CONFIG";

/// Resolve the session config: `--config`, then `CV_CONFIG`, then defaults.
///
/// A path that is named but unreadable is an error, not a silent fallback.
pub fn load_config(explicit: Option<&Path>) -> Result<StateConfig> {
    let path = explicit
        .map(Path::to_path_buf)
        .or_else(|| std::env::var_os(CONFIG_ENV).map(PathBuf::from));

    let Some(path) = path else {
        tracing::debug!("no config file, using defaults");
        return Ok(StateConfig::default());
    };

    let text = std::fs::read_to_string(&path)
        .with_context(|| format!("failed to read config {}", path.display()))?;
    let config: StateConfig = toml::from_str(&text)
        .with_context(|| format!("failed to parse config {}", path.display()))?;
    config
        .validate()
        .with_context(|| format!("invalid config {}", path.display()))?;

    tracing::debug!(path = %path.display(), max_history = config.max_history, "loaded config");
    Ok(config)
}

/// Build a fresh session from config plus an optional weights override.
pub fn open_state(config: StateConfig, weights: Option<Weights>) -> Result<ComplexityState> {
    let mut config = config;
    if let Some(weights) = weights {
        config.weights = weights;
    }
    ComplexityState::with_config(config).context("failed to create session")
}

pub fn load_scenarios(file: Option<&Path>) -> Result<ScenarioSet> {
    match file {
        Some(path) => {
            let text = std::fs::read_to_string(path)
                .with_context(|| format!("failed to read scenarios {}", path.display()))?;
            ScenarioSet::from_json(&text)
                .with_context(|| format!("failed to parse scenarios {}", path.display()))
        }
        None => builtin_scenarios().context("built-in scenarios are malformed"),
    }
}

// ---------------------------------------------------------------------------
// clap value parsers
// ---------------------------------------------------------------------------

/// Split `"0.8,0.4,0.6,0.3"` (commas and/or whitespace) into numbers.
fn parse_components(s: &str) -> std::result::Result<Vec<f64>, String> {
    s.split(|c: char| c == ',' || c.is_whitespace())
        .filter(|part| !part.is_empty())
        .map(|part| {
            part.parse::<f64>()
                .map_err(|_| format!("'{part}' is not a number"))
        })
        .collect()
}

pub fn parse_vector(s: &str) -> std::result::Result<ComplexityVector, String> {
    let values = parse_components(s)?;
    ComplexityVector::from_slice(&values).map_err(|e| e.to_string())
}

/// Weights are normalized on parse, like every other path into a session.
pub fn parse_weights(s: &str) -> std::result::Result<Weights, String> {
    let values = parse_components(s)?;
    Weights::from_slice(&values)
        .map(|w| w.normalized())
        .map_err(|e| e.to_string())
}
