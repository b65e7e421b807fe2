use serde::Serialize;

use crate::vector::ComplexityVector;
use crate::weights::{Deltas, Weights};

/// Notification fanned out to observers after a state transition commits.
#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum StateEvent {
    VectorUpdate {
        vector: ComplexityVector,
        label: String,
        timestamp: u64,
    },
    Undo {
        vector: ComplexityVector,
        timestamp: u64,
    },
    WeightsUpdate {
        weights: Weights,
    },
    DeltasUpdate {
        deltas: Deltas,
    },
    Import {
        vector: ComplexityVector,
        timestamp: u64,
    },
}

impl StateEvent {
    pub fn kind(&self) -> &'static str {
        match self {
            Self::VectorUpdate { .. } => "vectorUpdate",
            Self::Undo { .. } => "undo",
            Self::WeightsUpdate { .. } => "weightsUpdate",
            Self::DeltasUpdate { .. } => "deltasUpdate",
            Self::Import { .. } => "import",
        }
    }

    /// The vector carried by the event, if this kind carries one.
    pub fn vector(&self) -> Option<ComplexityVector> {
        match self {
            Self::VectorUpdate { vector, .. }
            | Self::Undo { vector, .. }
            | Self::Import { vector, .. } => Some(*vector),
            Self::WeightsUpdate { .. } | Self::DeltasUpdate { .. } => None,
        }
    }
}
