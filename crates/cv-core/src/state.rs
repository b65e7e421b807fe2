use std::collections::VecDeque;
use std::fmt;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::config::StateConfig;
use crate::dimension::Dimension;
use crate::error::Result;
use crate::event::StateEvent;
use crate::math::{SignalLossReport, apply_improvement, calculate_signal_loss, scalar_average};
use crate::observer::{Observer, ObserverRegistry, ObserverResult, SubscriptionId};
use crate::scenario::Scenario;
use crate::serde_compat::SessionExport;
use crate::stats::Statistics;
use crate::time::now_unix_millis;
use crate::vector::ComplexityVector;
use crate::weights::{Deltas, Weights};

pub const DEFAULT_LABEL: &str = "update";
pub const RESET_LABEL: &str = "reset";

/// A past current vector and the operation that replaced it.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct HistoryEntry {
    pub vector: ComplexityVector,
    pub label: String,
    /// Unix milliseconds at which the transition happened.
    pub timestamp: u64,
    /// Scalar value of `vector` under the weights in force at the time.
    pub scalar: f64,
}

/// The single mutable session object.
///
/// Holds the current vector, a FIFO-bounded undo history, the scalar weights
/// and per-dimension step sizes, and the observer registry. Fields are only
/// reachable through methods; every vector transition goes through
/// `update_vector` (or `undo`/`import`), logs history, bumps the operation
/// counter and then notifies observers.
pub struct ComplexityState {
    current: ComplexityVector,
    initial: ComplexityVector,
    history: VecDeque<HistoryEntry>,
    max_history: usize,
    weights: Weights,
    deltas: Deltas,
    observers: ObserverRegistry,
    operation_count: u64,
    session_id: Uuid,
    started_at: u64,
    current_scenario: Option<String>,
}

impl Default for ComplexityState {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for ComplexityState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ComplexityState")
            .field("current", &self.current)
            .field("history_len", &self.history.len())
            .field("max_history", &self.max_history)
            .field("weights", &self.weights)
            .field("deltas", &self.deltas)
            .field("observers", &self.observers.len())
            .field("operation_count", &self.operation_count)
            .field("session_id", &self.session_id)
            .finish_non_exhaustive()
    }
}

impl ComplexityState {
    pub fn new() -> Self {
        Self::from_valid_config(StateConfig::default())
    }

    pub fn with_config(config: StateConfig) -> Result<Self> {
        config.validate()?;
        Ok(Self::from_valid_config(config))
    }

    fn from_valid_config(config: StateConfig) -> Self {
        Self {
            current: config.initial,
            initial: config.initial,
            history: VecDeque::with_capacity(config.max_history.min(128)),
            max_history: config.max_history,
            weights: config.weights.normalized(),
            deltas: config.deltas,
            observers: ObserverRegistry::default(),
            operation_count: 0,
            session_id: Uuid::new_v4(),
            started_at: now_unix_millis(),
            current_scenario: None,
        }
    }

    // --- Accessors ---

    pub fn current(&self) -> ComplexityVector {
        self.current
    }

    pub fn history(&self) -> &VecDeque<HistoryEntry> {
        &self.history
    }

    pub fn max_history(&self) -> usize {
        self.max_history
    }

    pub fn weights(&self) -> &Weights {
        &self.weights
    }

    pub fn deltas(&self) -> &Deltas {
        &self.deltas
    }

    pub fn operation_count(&self) -> u64 {
        self.operation_count
    }

    pub fn session_id(&self) -> Uuid {
        self.session_id
    }

    /// Session start, Unix milliseconds.
    pub fn started_at(&self) -> u64 {
        self.started_at
    }

    pub fn current_scenario(&self) -> Option<&str> {
        self.current_scenario.as_deref()
    }

    pub fn observer_count(&self) -> usize {
        self.observers.len()
    }

    /// Scalar projection of the current vector under the session weights.
    pub fn scalar(&self) -> f64 {
        scalar_average(&self.current, &self.weights).value
    }

    pub fn statistics(&self) -> Statistics {
        Statistics::of(&self.current)
    }

    /// Signal loss between the most recent snapshot and the current vector.
    pub fn last_signal_loss(&self) -> Option<SignalLossReport> {
        self.history
            .back()
            .map(|prev| calculate_signal_loss(&prev.vector, &self.current, &self.weights))
    }

    // --- Transitions ---

    /// Replace the current vector, recording the old one in history.
    pub fn update_vector(&mut self, vector: ComplexityVector, label: Option<&str>) {
        let label = label.unwrap_or(DEFAULT_LABEL).to_string();
        let timestamp = now_unix_millis();

        self.push_history(HistoryEntry {
            vector: self.current,
            label: label.clone(),
            timestamp,
            scalar: self.scalar(),
        });
        self.current = vector;
        self.operation_count += 1;

        self.notify(StateEvent::VectorUpdate {
            vector,
            label,
            timestamp,
        });
    }

    /// `update_vector` from raw components; nothing changes if they are invalid.
    pub fn update_from_slice(&mut self, components: &[f64], label: Option<&str>) -> Result<()> {
        let vector = ComplexityVector::from_slice(components)?;
        self.update_vector(vector, label);
        Ok(())
    }

    /// Move one dimension by `delta` (clamped) as a labelled transition.
    pub fn improve(&mut self, dimension: Dimension, delta: f64) -> Result<()> {
        let next = apply_improvement(&self.current, dimension, delta)?;
        let label = format!("improve {} {delta:+.2}", dimension.key());
        self.update_vector(next, Some(&label));
        Ok(())
    }

    pub fn improve_index(&mut self, index: usize, delta: f64) -> Result<()> {
        self.improve(Dimension::from_index(index)?, delta)
    }

    /// Improve one dimension by its configured step size.
    pub fn step(&mut self, dimension: Dimension) -> Result<()> {
        self.improve(dimension, self.deltas.get(dimension))
    }

    /// Restore the most recent snapshot. `false` when there is nothing to undo.
    pub fn undo(&mut self) -> bool {
        let Some(entry) = self.history.pop_back() else {
            return false;
        };
        self.current = entry.vector;
        self.operation_count += 1;

        self.notify(StateEvent::Undo {
            vector: entry.vector,
            timestamp: now_unix_millis(),
        });
        true
    }

    /// Clear history and counters, then move to `initial` (or the configured
    /// starting vector) through a regular update.
    pub fn reset(&mut self, initial: Option<ComplexityVector>) {
        tracing::debug!(dropped = self.history.len(), "resetting session");
        self.history.clear();
        self.operation_count = 0;
        self.current_scenario = None;
        let target = initial.unwrap_or(self.initial);
        self.update_vector(target, Some(RESET_LABEL));
    }

    /// Replace the weights, normalized to sum 1. History is untouched.
    pub fn update_weights(&mut self, weights: &[f64]) -> Result<()> {
        let raw = Weights::from_slice(weights)?;
        if !raw.is_normalized() {
            tracing::debug!(sum = raw.sum(), "normalizing updated weights");
        }
        self.weights = raw.normalized();
        self.notify(StateEvent::WeightsUpdate {
            weights: self.weights,
        });
        Ok(())
    }

    /// Merge per-dimension step sizes. All-or-nothing.
    pub fn update_deltas<I>(&mut self, partial: I) -> Result<()>
    where
        I: IntoIterator<Item = (Dimension, f64)>,
    {
        self.deltas = self.deltas.merged(partial)?;
        self.notify(StateEvent::DeltasUpdate {
            deltas: self.deltas,
        });
        Ok(())
    }

    /// Move to a scenario's initial vector and remember its name.
    pub fn load_scenario(&mut self, scenario: &Scenario) {
        self.current_scenario = Some(scenario.name.clone());
        let label = format!("scenario {}", scenario.name);
        self.update_vector(scenario.initial, Some(&label));
    }

    /// Forget the active scenario name, returning it.
    pub fn clear_scenario(&mut self) -> Option<String> {
        self.current_scenario.take()
    }

    // --- Observers ---

    /// Register a callback. Callbacks run in subscription order.
    pub fn subscribe<F>(&mut self, observer: F) -> SubscriptionId
    where
        F: Fn(&StateEvent, &ComplexityState) -> ObserverResult + 'static,
    {
        self.observers.subscribe(Box::new(observer))
    }

    /// Register a trait-object observer.
    pub fn subscribe_observer(&mut self, observer: Box<dyn Observer>) -> SubscriptionId {
        self.observers.subscribe(observer)
    }

    pub fn unsubscribe(&mut self, id: SubscriptionId) -> bool {
        self.observers.unsubscribe(id)
    }

    // --- Export / import ---

    pub fn export(&self) -> SessionExport {
        SessionExport::from_state(self)
    }

    pub fn export_json(&self) -> Result<String> {
        crate::serde_compat::export_json(self)
    }

    /// Load a full session. Validates the whole payload first; on error the
    /// state is left exactly as it was. Observers are kept.
    pub fn import(&mut self, data: SessionExport) -> Result<()> {
        let session = data.validate(self.max_history)?;

        self.current = session.vector;
        self.weights = session.weights;
        self.deltas = session.deltas;
        self.history = session.history;
        self.session_id = session.session_id;
        self.started_at = session.started_at;
        self.operation_count = session.operation_count;
        self.current_scenario = session.current_scenario;
        tracing::debug!(
            history = self.history.len(),
            operations = self.operation_count,
            "imported session"
        );

        self.notify(StateEvent::Import {
            vector: self.current,
            timestamp: now_unix_millis(),
        });
        Ok(())
    }

    pub fn import_json(&mut self, json: &str) -> Result<()> {
        crate::serde_compat::import_json(self, json)
    }

    // --- Internals ---

    fn push_history(&mut self, entry: HistoryEntry) {
        self.history.push_back(entry);
        while self.history.len() > self.max_history {
            if let Some(evicted) = self.history.pop_front() {
                tracing::debug!(label = %evicted.label, "evicted oldest history entry");
            }
        }
    }

    fn notify(&self, event: StateEvent) {
        self.observers.dispatch(&event, self);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ComplexityError;
    use std::cell::RefCell;
    use std::rc::Rc;

    fn v(a: f64, b: f64, c: f64, d: f64) -> ComplexityVector {
        ComplexityVector::new(a, b, c, d).unwrap()
    }

    fn recorder(state: &mut ComplexityState) -> Rc<RefCell<Vec<StateEvent>>> {
        let events = Rc::new(RefCell::new(Vec::new()));
        let sink = Rc::clone(&events);
        state.subscribe(move |event: &StateEvent, _: &ComplexityState| -> ObserverResult {
            sink.borrow_mut().push(event.clone());
            Ok(())
        });
        events
    }

    #[test]
    fn test_new_state_defaults() {
        let state = ComplexityState::new();
        assert_eq!(state.current(), ComplexityVector::initial());
        assert!(state.history().is_empty());
        assert_eq!(state.operation_count(), 0);
        assert!((state.scalar() - 0.525).abs() < 1e-12);
    }

    #[test]
    fn test_update_vector_logs_history_and_notifies() {
        let mut state = ComplexityState::new();
        let events = recorder(&mut state);
        let before = state.current();

        state.update_vector(v(0.1, 0.2, 0.3, 0.4), Some("manual"));

        assert_eq!(state.current(), v(0.1, 0.2, 0.3, 0.4));
        assert_eq!(state.operation_count(), 1);
        let entry = &state.history()[0];
        assert_eq!(entry.vector, before);
        assert_eq!(entry.label, "manual");
        assert!((entry.scalar - 0.525).abs() < 1e-12);

        let events = events.borrow();
        assert_eq!(events.len(), 1);
        match &events[0] {
            StateEvent::VectorUpdate { vector, label, timestamp } => {
                assert_eq!(*vector, v(0.1, 0.2, 0.3, 0.4));
                assert_eq!(label, "manual");
                assert_eq!(*timestamp, entry.timestamp);
            }
            other => panic!("unexpected event {other:?}"),
        }
    }

    #[test]
    fn test_default_label() {
        let mut state = ComplexityState::new();
        state.update_vector(v(0.1, 0.2, 0.3, 0.4), None);
        assert_eq!(state.history()[0].label, DEFAULT_LABEL);
    }

    #[test]
    fn test_update_from_slice_rejects_bad_data() {
        let mut state = ComplexityState::new();
        let events = recorder(&mut state);
        assert!(state.update_from_slice(&[0.1, 0.2], None).is_err());
        assert!(state.update_from_slice(&[0.1, 0.2, 0.3, 9.0], None).is_err());
        assert_eq!(state.operation_count(), 0);
        assert!(state.history().is_empty());
        assert!(events.borrow().is_empty());
    }

    #[test]
    fn test_observer_sees_committed_state() {
        let mut state = ComplexityState::new();
        let seen = Rc::new(RefCell::new(None));
        let sink = Rc::clone(&seen);
        state.subscribe(move |_: &StateEvent, s: &ComplexityState| -> ObserverResult {
            *sink.borrow_mut() = Some((s.current(), s.history().len(), s.operation_count()));
            Ok(())
        });

        state.update_vector(v(0.2, 0.2, 0.2, 0.2), None);
        assert_eq!(*seen.borrow(), Some((v(0.2, 0.2, 0.2, 0.2), 1, 1)));
    }

    #[test]
    fn test_improve_clamps_and_labels() {
        let mut state = ComplexityState::new();
        state.improve(Dimension::Algorithmic, 0.5).unwrap();
        assert_eq!(state.current().alg(), 1.0);
        assert_eq!(state.history()[0].label, "improve alg +0.50");
    }

    #[test]
    fn test_improve_index_out_of_range() {
        let mut state = ComplexityState::new();
        assert!(matches!(
            state.improve_index(7, 0.1),
            Err(ComplexityError::DimensionIndex(7))
        ));
        assert_eq!(state.operation_count(), 0);
    }

    #[test]
    fn test_step_uses_configured_delta() {
        let mut state = ComplexityState::new();
        state.update_deltas([(Dimension::Information, 0.3)]).unwrap();
        state.step(Dimension::Information).unwrap();
        assert!((state.current().info() - 0.7).abs() < 1e-12);
    }

    #[test]
    fn test_undo_empty_history() {
        let mut state = ComplexityState::new();
        let events = recorder(&mut state);
        let before = state.current();

        assert!(!state.undo());
        assert_eq!(state.current(), before);
        assert_eq!(state.operation_count(), 0);
        assert!(events.borrow().is_empty());
    }

    #[test]
    fn test_undo_restores_previous() {
        let mut state = ComplexityState::new();
        let events = recorder(&mut state);
        let original = state.current();

        state.improve(Dimension::Dynamical, 0.2).unwrap();
        assert!(state.undo());

        assert_eq!(state.current(), original);
        assert!(state.history().is_empty());
        assert_eq!(state.operation_count(), 2);
        assert_eq!(events.borrow().last().unwrap().kind(), "undo");
    }

    #[test]
    fn test_history_bounded_fifo() {
        let config = StateConfig {
            max_history: 3,
            ..StateConfig::default()
        };
        let mut state = ComplexityState::with_config(config).unwrap();

        for i in 0..5 {
            let x = 0.1 * (i + 1) as f64;
            state.update_vector(v(x, x, x, x), Some(&format!("op{i}")));
        }

        assert_eq!(state.history().len(), 3);
        let labels: Vec<&str> = state.history().iter().map(|e| e.label.as_str()).collect();
        assert_eq!(labels, vec!["op2", "op3", "op4"]);
    }

    #[test]
    fn test_reset_clears_then_updates() {
        let mut state = ComplexityState::new();
        state.improve(Dimension::Algorithmic, 0.1).unwrap();
        state.improve(Dimension::Information, 0.1).unwrap();
        let before_reset = state.current();

        state.reset(Some(v(0.5, 0.5, 0.5, 0.5)));

        assert_eq!(state.current(), v(0.5, 0.5, 0.5, 0.5));
        assert_eq!(state.operation_count(), 1);
        assert_eq!(state.history().len(), 1);
        assert_eq!(state.history()[0].vector, before_reset);
        assert_eq!(state.history()[0].label, RESET_LABEL);
    }

    #[test]
    fn test_reset_to_configured_initial() {
        let mut state = ComplexityState::new();
        state.update_vector(v(0.0, 0.0, 0.0, 0.0), None);
        state.reset(None);
        assert_eq!(state.current(), ComplexityVector::initial());
    }

    #[test]
    fn test_update_weights_normalizes_without_history() {
        let mut state = ComplexityState::new();
        let events = recorder(&mut state);

        state.update_weights(&[2.0, 1.0, 1.0, 0.0]).unwrap();

        assert!(state.weights().is_normalized());
        assert!((state.weights().get(Dimension::Algorithmic) - 0.5).abs() < 1e-12);
        assert!(state.history().is_empty());
        assert_eq!(events.borrow()[0].kind(), "weightsUpdate");
    }

    #[test]
    fn test_update_weights_wrong_length() {
        let mut state = ComplexityState::new();
        assert!(matches!(
            state.update_weights(&[0.5, 0.5, 0.0]),
            Err(ComplexityError::WrongLength { expected: 4, got: 3 })
        ));
        assert_eq!(*state.weights(), Weights::equal());
    }

    #[test]
    fn test_update_deltas_partial_merge() {
        let mut state = ComplexityState::new();
        let events = recorder(&mut state);

        state.update_deltas([(Dimension::Geometric, 0.25)]).unwrap();

        assert_eq!(state.deltas().get(Dimension::Geometric), 0.25);
        assert_eq!(state.deltas().get(Dimension::Algorithmic), 0.1);
        match &events.borrow()[0] {
            StateEvent::DeltasUpdate { deltas } => {
                assert_eq!(deltas.get(Dimension::Geometric), 0.25)
            }
            other => panic!("unexpected event {other:?}"),
        }
    }

    #[test]
    fn test_failing_observer_does_not_block_others() {
        let mut state = ComplexityState::new();
        state.subscribe(|_: &StateEvent, _: &ComplexityState| -> ObserverResult {
            Err("renderer offline".into())
        });
        let events = recorder(&mut state);

        state.improve(Dimension::Geometric, 0.1).unwrap();

        assert_eq!(events.borrow().len(), 1);
        assert_eq!(state.operation_count(), 1);
    }

    #[test]
    fn test_unsubscribe_stops_notifications() {
        let mut state = ComplexityState::new();
        let count = Rc::new(RefCell::new(0));
        let c = Rc::clone(&count);
        let id = state.subscribe(move |_: &StateEvent, _: &ComplexityState| -> ObserverResult {
            *c.borrow_mut() += 1;
            Ok(())
        });

        state.improve(Dimension::Algorithmic, 0.05).unwrap();
        assert!(state.unsubscribe(id));
        state.improve(Dimension::Algorithmic, 0.05).unwrap();

        assert_eq!(*count.borrow(), 1);
        assert_eq!(state.observer_count(), 0);
    }

    #[test]
    fn test_scenario_load_and_clear() {
        let mut state = ComplexityState::new();
        let scenario = Scenario {
            name: "balanced".to_string(),
            description: String::new(),
            initial: v(0.5, 0.5, 0.5, 0.5),
        };

        state.load_scenario(&scenario);
        assert_eq!(state.current(), v(0.5, 0.5, 0.5, 0.5));
        assert_eq!(state.current_scenario(), Some("balanced"));
        assert_eq!(state.history()[0].label, "scenario balanced");

        assert_eq!(state.clear_scenario().as_deref(), Some("balanced"));
        assert_eq!(state.current_scenario(), None);
    }

    #[test]
    fn test_last_signal_loss() {
        let mut state = ComplexityState::new();
        assert!(state.last_signal_loss().is_none());

        state.update_vector(v(0.5, 0.5, 0.5, 0.5), None);
        state.update_vector(v(0.65, 0.35, 0.5, 0.5), None);

        let report = state.last_signal_loss().unwrap();
        assert_eq!(report.loss_type, crate::math::LossType::Cancellation);
    }

    #[test]
    fn test_import_notifies_and_keeps_observers() {
        let mut source = ComplexityState::new();
        source.improve(Dimension::Algorithmic, 0.1).unwrap();
        let payload = source.export();

        let mut target = ComplexityState::new();
        let events = recorder(&mut target);
        target.import(payload).unwrap();

        assert_eq!(target.current(), source.current());
        assert_eq!(target.observer_count(), 1);
        assert_eq!(events.borrow()[0].kind(), "import");
    }

    #[test]
    fn test_import_respects_local_history_bound() {
        let mut source = ComplexityState::new();
        for _ in 0..5 {
            source.improve(Dimension::Information, 0.01).unwrap();
        }
        let payload = source.export();

        let config = StateConfig {
            max_history: 2,
            ..StateConfig::default()
        };
        let mut target = ComplexityState::with_config(config).unwrap();
        target.import(payload).unwrap();

        assert_eq!(target.history().len(), 2);
        assert_eq!(target.history().back(), source.history().back());
    }

    #[test]
    fn test_with_config_rejects_zero_history() {
        let config = StateConfig {
            max_history: 0,
            ..StateConfig::default()
        };
        assert!(ComplexityState::with_config(config).is_err());
    }
}
