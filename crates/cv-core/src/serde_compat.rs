//! JSON wire format for session export/import.
//!
//! The wire format uses camelCase field names and stores vectors and weights
//! as `[alg, info, dyn, geom]` arrays. Arrays are kept raw on the wire and
//! validated during conversion so that a bad payload is rejected as a whole,
//! before any session state is touched.

use std::collections::VecDeque;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::{ComplexityError, Result};
use crate::math::scalar_average;
use crate::state::{ComplexityState, HistoryEntry};
use crate::time::millis_to_iso8601;
use crate::vector::ComplexityVector;
use crate::weights::{Deltas, Weights};

pub const CURRENT_VERSION: &str = "1.0";

// --- Wire format types ---

#[derive(Serialize, Deserialize, Debug, Clone)]
pub struct SessionExport {
    #[serde(default = "default_version")]
    pub version: String,
    pub vector: [f64; 4],
    pub weights: [f64; 4],
    #[serde(default)]
    pub deltas: Deltas,
    #[serde(default)]
    pub history: Vec<WireHistoryEntry>,
    pub metadata: WireMetadata,
}

#[derive(Serialize, Deserialize, Debug, Clone)]
pub struct WireHistoryEntry {
    pub vector: [f64; 4],
    pub label: String,
    pub timestamp: u64,
    /// Older payloads omit the scalar; it is recomputed on import.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub scalar: Option<f64>,
}

#[derive(Serialize, Deserialize, Debug, Clone)]
pub struct WireMetadata {
    #[serde(rename = "sessionId", default)]
    pub session_id: String,
    #[serde(rename = "startTime")]
    pub start_time: u64,
    #[serde(rename = "startedAt", default)]
    pub started_at: String,
    #[serde(rename = "operationCount", default)]
    pub operation_count: u64,
    #[serde(
        rename = "currentScenario",
        default,
        skip_serializing_if = "Option::is_none"
    )]
    pub current_scenario: Option<String>,
}

fn default_version() -> String {
    CURRENT_VERSION.to_string()
}

/// A fully validated import, ready to be swapped into a state.
pub(crate) struct ValidatedSession {
    pub vector: ComplexityVector,
    pub weights: Weights,
    pub deltas: Deltas,
    pub history: VecDeque<HistoryEntry>,
    pub session_id: Uuid,
    pub started_at: u64,
    pub operation_count: u64,
    pub current_scenario: Option<String>,
}

// --- Conversion: Domain → Wire ---

impl SessionExport {
    pub fn from_state(state: &ComplexityState) -> Self {
        SessionExport {
            version: CURRENT_VERSION.to_string(),
            vector: state.current().to_array(),
            weights: state.weights().to_array(),
            deltas: *state.deltas(),
            history: state
                .history()
                .iter()
                .map(|entry| WireHistoryEntry {
                    vector: entry.vector.to_array(),
                    label: entry.label.clone(),
                    timestamp: entry.timestamp,
                    scalar: Some(entry.scalar),
                })
                .collect(),
            metadata: WireMetadata {
                session_id: state.session_id().to_string(),
                start_time: state.started_at(),
                started_at: millis_to_iso8601(state.started_at()),
                operation_count: state.operation_count(),
                current_scenario: state.current_scenario().map(str::to_string),
            },
        }
    }

    // --- Conversion: Wire → Domain ---

    /// Validate every vector and weight, keeping the newest `max_history`
    /// history entries.
    pub(crate) fn validate(self, max_history: usize) -> Result<ValidatedSession> {
        let vector = ComplexityVector::from_array(self.vector)
            .map_err(|e| ComplexityError::InvalidData(format!("vector: {e}")))?;
        let weights = Weights::new(self.weights)
            .map_err(|e| ComplexityError::InvalidData(format!("weights: {e}")))?
            .normalized();

        let mut history = VecDeque::with_capacity(self.history.len().min(max_history));
        let total = self.history.len();
        for (i, wire) in self.history.into_iter().enumerate() {
            let snapshot = ComplexityVector::from_array(wire.vector)
                .map_err(|e| ComplexityError::InvalidData(format!("history[{i}]: {e}")))?;
            let scalar = match wire.scalar {
                Some(s) if s.is_finite() => s,
                _ => scalar_average(&snapshot, &weights).value,
            };
            history.push_back(HistoryEntry {
                vector: snapshot,
                label: wire.label,
                timestamp: wire.timestamp,
                scalar,
            });
            // every entry is validated; only the newest `max_history` are kept
            if history.len() > max_history {
                history.pop_front();
            }
        }
        if total > max_history {
            tracing::debug!(
                dropped = total - max_history,
                max_history,
                "dropped oldest imported history entries"
            );
        }

        let session_id =
            Uuid::parse_str(&self.metadata.session_id).unwrap_or_else(|_| Uuid::new_v4());

        Ok(ValidatedSession {
            vector,
            weights,
            deltas: self.deltas,
            history,
            session_id,
            started_at: self.metadata.start_time,
            operation_count: self.metadata.operation_count,
            current_scenario: self.metadata.current_scenario,
        })
    }
}

/// Serialize a session to the JSON wire format.
pub fn export_json(state: &ComplexityState) -> Result<String> {
    Ok(serde_json::to_string_pretty(&SessionExport::from_state(state))?)
}

/// Parse a JSON export and load it into `state`. On error the state is unchanged.
pub fn import_json(state: &mut ComplexityState, json: &str) -> Result<()> {
    let wire: SessionExport = serde_json::from_str(json)?;
    state.import(wire)
}
