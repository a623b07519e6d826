//! Error types for crnsim.
//!
//! All errors are strongly typed using thiserror. Validation errors come from
//! bad caller input at construction or mutation time; execution errors come
//! from stepping a simulation.

use thiserror::Error;

use crate::entity::EntityId;
use crate::reaction::ReactionId;

/// Validation errors that occur during input validation.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ValidationError {
    #[error("Invalid population count {value}: must be a non-negative integer")]
    InvalidCount {
        value: f64,
    },

    #[error("Invalid rate constant {value}: must be finite and >= 0")]
    InvalidRateConstant {
        value: f64,
    },

    #[error("Invalid wait bounds: {reason}")]
    InvalidWaitBounds {
        reason: String,
    },

    #[error("Entity {id} is not part of this network")]
    UnknownEntity {
        id: EntityId,
    },

    #[error("Reaction network has no reactions")]
    EmptyNetwork,

    #[error("Invalid scripted samples: {reason}")]
    InvalidSamples {
        reason: String,
    },

    #[error("Invalid ensemble configuration: {reason}")]
    InvalidEnsembleConfig {
        reason: String,
    },
}

/// Execution errors that occur while stepping a simulation.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ExecutionError {
    #[error("Reaction {reaction} fired without enough of entity {entity} (count {count}, needed {needed})")]
    InsufficientPopulation {
        reaction: ReactionId,
        entity: EntityId,
        count: u64,
        needed: u64,
    },

    #[error("Population of entity {entity} would overflow")]
    PopulationOverflow {
        entity: EntityId,
    },

    #[error("No reaction could be selected with total propensity {total}")]
    NoReactionSelected { total: f64 },
}

/// Top-level error type for crnsim.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum CrnError {
    #[error("Validation error: {0}")]
    Validation(#[from] ValidationError),

    #[error("Execution error: {0}")]
    Execution(#[from] ExecutionError),
}

impl CrnError {
    /// Returns true if this is a validation error.
    #[must_use]
    pub const fn is_validation(&self) -> bool {
        matches!(self, Self::Validation(_))
    }

    /// Returns true if this is an execution error.
    #[must_use]
    pub const fn is_execution(&self) -> bool {
        matches!(self, Self::Execution(_))
    }

    /// Returns true if this error means the engine broke one of its own
    /// invariants (a reaction was selected that could not fire).
    ///
    /// These are programming errors, not recoverable conditions.
    #[must_use]
    pub const fn is_invariant_violation(&self) -> bool {
        matches!(
            self,
            Self::Execution(
                ExecutionError::InsufficientPopulation { .. }
                    | ExecutionError::NoReactionSelected { .. }
            )
        )
    }
}

/// Result type alias for crnsim operations.
pub type CrnResult<T> = Result<T, CrnError>;
