//! # crnsim - Stochastic chemical reaction network simulation
//!
//! crnsim simulates well-mixed chemical reaction networks with the Gillespie
//! stochastic simulation algorithm. Populations are integers, reactions fire
//! one at a time after exponentially distributed waiting times, and the random
//! source is always injected so runs replay exactly.
//!
//! ## Core Concepts
//!
//! - **Entity**: a named species with a non-negative integer population
//! - **Reaction**: `X + Y -> 2Z` with a rate constant and a propensity
//! - **ReactionNetwork**: the entities and reactions of one simulation run
//! - **Gillespie**: the stepper that samples, selects and fires reactions
//! - **ApproximateMajority**: the three-reaction consensus network
//! - **Ensemble**: many independent approximate-majority runs, classified
//!
//! ## Usage
//!
//! ```rust
//! use crnsim::{approximate_majority, seeded, StepResult};
//!
//! let mut am = approximate_majority::build(10, 5, 0, 1.0, seeded(42))?;
//! while let StepResult::Fired { .. } = am.step_exact()? {}
//!
//! let p = am.populations();
//! assert_eq!(p.total(), 15);
//! assert!(p.a == 15 || p.b == 15 || p.c == 15);
//! # Ok::<(), crnsim::CrnError>(())
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]

pub mod approximate_majority;
pub mod ensemble;
pub mod entity;
pub mod error;
pub mod gillespie;
pub mod network;
pub mod random;
pub mod reaction;

// Re-export primary types at crate root for convenience
pub use approximate_majority::{
    ApproximateMajority, ApproximateMajorityConfig, Populations, Reactions, Species,
};
pub use ensemble::{Ensemble, EnsembleConfig, EnsembleSummary, RunOutcome, RunReport};
pub use entity::{Entity, EntityId};
pub use error::{CrnError, CrnResult, ExecutionError, ValidationError};
pub use gillespie::{EngineState, Gillespie, RunProgress, StepResult, WaitBounds};
pub use network::ReactionNetwork;
pub use random::{derive_seed, seeded, RandomSource, RngSource, ScriptedSource, SeededSource};
pub use reaction::{EntityChange, Reaction, ReactionEvent, ReactionId};
