//! The impossibility cycle: improve every dimension in turn, then return.
//!
//! The cycle starts at an initial vector, improves alg, info, dyn and geom
//! cumulatively by their deltas, and finally resets to an exact copy of the
//! initial vector. The reset stands for a structural (geometric) change that
//! a scalar summary cannot tell apart from regression: the scalar climbs for
//! four steps and then falls straight back to where it began.

use serde::Serialize;

use crate::dimension::Dimension;
use crate::math::{scalar_average, shift};
use crate::state::ComplexityState;
use crate::vector::ComplexityVector;
use crate::weights::{Deltas, Weights};

pub const INITIAL_LABEL: &str = "initial";
pub const RETURN_LABEL: &str = "geometric reset";

/// Scalar and vector at the start of the cycle versus its pre-return peak.
#[derive(Clone, Copy, Debug, PartialEq, Serialize)]
pub struct ParadoxSummary {
    pub initial_scalar: f64,
    pub peak_scalar: f64,
    pub final_scalar: f64,
    pub initial_vector: ComplexityVector,
    pub peak_vector: ComplexityVector,
    /// Sum of the four step sizes applied on the way up.
    pub total_delta: f64,
}

#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct CycleStep {
    pub index: usize,
    pub label: String,
    pub vector: ComplexityVector,
    pub scalar: f64,
}

/// Six recorded states with a label and scalar value for each.
#[derive(Clone, Debug, Serialize)]
pub struct ImpossibilityCycle {
    pub states: Vec<ComplexityVector>,
    pub labels: Vec<String>,
    pub scalars: Vec<f64>,
    pub paradox: ParadoxSummary,
}

impl ImpossibilityCycle {
    pub fn len(&self) -> usize {
        self.states.len()
    }

    pub fn is_empty(&self) -> bool {
        self.states.is_empty()
    }

    pub fn step(&self, index: usize) -> Option<CycleStep> {
        Some(CycleStep {
            index,
            label: self.labels.get(index)?.clone(),
            vector: *self.states.get(index)?,
            scalar: *self.scalars.get(index)?,
        })
    }

    pub fn steps(&self) -> impl Iterator<Item = CycleStep> + '_ {
        (0..self.len()).filter_map(|i| self.step(i))
    }
}

pub fn generate_cycle(
    initial: &ComplexityVector,
    deltas: &Deltas,
    weights: &Weights,
) -> ImpossibilityCycle {
    let mut states = vec![*initial];
    let mut labels = vec![INITIAL_LABEL.to_string()];

    let mut current = *initial;
    for dim in Dimension::ALL {
        let delta = deltas.get(dim);
        current = shift(&current, dim, delta);
        states.push(current);
        labels.push(format!("improve {} +{delta:.2}", dim.key()));
    }

    states.push(*initial);
    labels.push(RETURN_LABEL.to_string());

    let scalars: Vec<f64> = states
        .iter()
        .map(|s| scalar_average(s, weights).value)
        .collect();

    let peak = Dimension::ALL.len();
    let paradox = ParadoxSummary {
        initial_scalar: scalars[0],
        peak_scalar: scalars[peak],
        final_scalar: scalars[peak + 1],
        initial_vector: *initial,
        peak_vector: states[peak],
        total_delta: deltas.total(),
    };

    ImpossibilityCycle {
        states,
        labels,
        scalars,
        paradox,
    }
}

/// Steps a cycle into a `ComplexityState` one state at a time.
///
/// Each step goes through `update_vector`, so observers see every transition.
/// A halted player yields nothing until `restart`, which begins again from
/// the first state; there is no resuming from the middle.
pub struct CyclePlayer {
    cycle: ImpossibilityCycle,
    position: usize,
    halted: bool,
}

impl CyclePlayer {
    pub fn new(cycle: ImpossibilityCycle) -> Self {
        Self {
            cycle,
            position: 0,
            halted: false,
        }
    }

    pub fn cycle(&self) -> &ImpossibilityCycle {
        &self.cycle
    }

    pub fn position(&self) -> usize {
        self.position
    }

    pub fn is_halted(&self) -> bool {
        self.halted
    }

    pub fn is_finished(&self) -> bool {
        self.position >= self.cycle.len()
    }

    /// Apply the next state. `None` once halted or finished.
    pub fn advance(&mut self, state: &mut ComplexityState) -> Option<CycleStep> {
        if self.halted {
            return None;
        }
        let step = self.cycle.step(self.position)?;
        state.update_vector(step.vector, Some(&step.label));
        self.position += 1;
        Some(step)
    }

    pub fn halt(&mut self) {
        if !self.halted {
            tracing::debug!(position = self.position, "cycle halted");
        }
        self.halted = true;
    }

    pub fn restart(&mut self) {
        self.position = 0;
        self.halted = false;
    }

    /// Play every remaining step. Returns how many were applied.
    pub fn run_to_end(&mut self, state: &mut ComplexityState) -> usize {
        let mut applied = 0;
        while self.advance(state).is_some() {
            applied += 1;
        }
        applied
    }
}
