//! Complexity-vector kernel.
//!
//! Models the complexity of a system as a point in the unit hypercube over
//! four dimensions (algorithmic, information, dynamical, geometric) and shows
//! what a single weighted scalar hides: signal loss, Pareto structure, and
//! the impossibility cycle where four improvements compose into a round trip.
//!
//! Zero I/O. The kernel never touches files, terminals or clocks beyond
//! timestamping history; transport and rendering live in the caller.

pub mod config;
pub mod constants;
pub mod cycle;
pub mod dimension;
pub mod error;
pub mod event;
pub mod math;
pub mod observer;
pub mod scenario;
pub mod serde_compat;
pub mod state;
pub mod stats;
pub mod time;
pub mod vector;
pub mod weights;

pub use config::StateConfig;
pub use constants::{DEFAULT_MAX_HISTORY, EPSILON, SIGNAL_THRESHOLD};
pub use cycle::{CyclePlayer, CycleStep, ImpossibilityCycle, ParadoxSummary, generate_cycle};
pub use dimension::Dimension;
pub use error::{ComplexityError, Result};
pub use event::StateEvent;
pub use math::{
    DistanceMetric, LossType, ParetoPoint, ProjectionMethod, ScalarAverage, SignalLossReport,
    apply_improvement, calculate_signal_loss, compute_distance, compute_pareto_frontier,
    interpolate, project_to_3d, random_vectors, scalar_average,
};
pub use observer::{Observer, ObserverError, ObserverResult, SubscriptionId};
pub use scenario::{Scenario, ScenarioSet, builtin_scenarios};
pub use serde_compat::{CURRENT_VERSION, SessionExport, export_json, import_json};
pub use state::{ComplexityState, HistoryEntry};
pub use stats::Statistics;
pub use vector::ComplexityVector;
pub use weights::{Deltas, Weights};
