//! The approximate-majority consensus network.
//!
//! Three species and three reactions:
//!
//! ```text
//! A + B -> 2C
//! A + C -> 2A
//! B + C -> 2B
//! ```
//!
//! The network is absorbing: it ends with only A, only B, or (from a
//! symmetric start that annihilates completely) only C. Which of A and B wins
//! is a statistical property; it usually matches the initial majority, more
//! reliably the larger the initial gap.

use serde::{Deserialize, Serialize};

use crate::entity::EntityId;
use crate::error::{CrnResult, ValidationError};
use crate::gillespie::{Gillespie, RunProgress, StepResult, WaitBounds};
use crate::network::ReactionNetwork;
use crate::random::{seeded, RandomSource, SeededSource};
use crate::reaction::ReactionId;

/// Default rate constant for all three reactions.
pub const DEFAULT_RATE_CONSTANT: f64 = 1e-5;

/// Starting populations and rate for an approximate-majority run.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ApproximateMajorityConfig {
    /// Initial population of A.
    pub count_a: u64,
    /// Initial population of B.
    pub count_b: u64,
    /// Initial population of C.
    #[serde(default)]
    pub count_c: u64,
    /// Rate constant shared by the three reactions.
    #[serde(default = "default_rate_constant")]
    pub rate_constant: f64,
}

fn default_rate_constant() -> f64 {
    DEFAULT_RATE_CONSTANT
}

impl Default for ApproximateMajorityConfig {
    fn default() -> Self {
        Self {
            count_a: 10,
            count_b: 5,
            count_c: 0,
            rate_constant: DEFAULT_RATE_CONSTANT,
        }
    }
}

impl ApproximateMajorityConfig {
    /// Validate configuration.
    pub fn validate(&self) -> Result<(), ValidationError> {
        if !self.rate_constant.is_finite() || self.rate_constant < 0.0 {
            return Err(ValidationError::InvalidRateConstant {
                value: self.rate_constant,
            });
        }
        Ok(())
    }

    /// Sum of the three starting populations.
    #[must_use]
    pub fn total_population(&self) -> u64 {
        self.count_a
            .saturating_add(self.count_b)
            .saturating_add(self.count_c)
    }
}

/// Entity ids of the three species.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Species {
    /// A.
    pub a: EntityId,
    /// B.
    pub b: EntityId,
    /// C, the undecided species.
    pub c: EntityId,
}

/// Reaction ids, in engine order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Reactions {
    /// `A + B -> 2C`.
    pub ab_to_c: ReactionId,
    /// `A + C -> 2A`.
    pub ac_to_a: ReactionId,
    /// `B + C -> 2B`.
    pub bc_to_b: ReactionId,
}

/// Current A/B/C populations.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Populations {
    /// Count of A.
    pub a: u64,
    /// Count of B.
    pub b: u64,
    /// Count of C.
    pub c: u64,
}

impl Populations {
    /// `a + b + c`.
    #[must_use]
    pub const fn total(&self) -> u64 {
        self.a.saturating_add(self.b).saturating_add(self.c)
    }
}

/// A wired approximate-majority network and its engine.
#[derive(Debug, Clone)]
pub struct ApproximateMajority<S> {
    engine: Gillespie<S>,
    species: Species,
    reactions: Reactions,
}

/// Builds the network with the given populations and rate.
///
/// Entities are created in the order A, B, C and reactions in the order
/// `AB -> 2C`, `AC -> 2A`, `BC -> 2B`.
///
/// # Examples
///
/// ```
/// use crnsim::approximate_majority::build;
/// use crnsim::seeded;
///
/// let mut am = build(1, 1, 0, 1.0, seeded(1)).unwrap();
/// let reactions = am.reactions();
/// assert_eq!(am.step_exact().unwrap().reaction(), Some(reactions.ab_to_c));
/// assert_eq!(am.populations().c, 2);
/// ```
pub fn build<S: RandomSource>(
    count_a: u64,
    count_b: u64,
    count_c: u64,
    rate_constant: f64,
    source: S,
) -> CrnResult<ApproximateMajority<S>> {
    ApproximateMajority::from_config(
        ApproximateMajorityConfig {
            count_a,
            count_b,
            count_c,
            rate_constant,
        },
        source,
    )
}

impl ApproximateMajority<SeededSource> {
    /// Builds from `config` with a ChaCha source seeded by `seed`.
    pub fn seeded(config: ApproximateMajorityConfig, seed: u64) -> CrnResult<Self> {
        Self::from_config(config, seeded(seed))
    }
}

impl<S: RandomSource> ApproximateMajority<S> {
    /// Builds from `config`.
    pub fn from_config(config: ApproximateMajorityConfig, source: S) -> CrnResult<Self> {
        config.validate()?;

        let mut network = ReactionNetwork::new();
        let a = network.add_entity("A", config.count_a);
        let b = network.add_entity("B", config.count_b);
        let c = network.add_entity("C", config.count_c);

        let k = config.rate_constant;
        let reactions = Reactions {
            ab_to_c: network.add_reaction(a, b, c, k)?,
            ac_to_a: network.add_reaction(a, c, a, k)?,
            bc_to_b: network.add_reaction(b, c, b, k)?,
        };

        Ok(Self {
            engine: Gillespie::new(network, source)?,
            species: Species { a, b, c },
            reactions,
        })
    }

    /// Advances by one reaction.
    pub fn step(&mut self, bounds: WaitBounds) -> CrnResult<StepResult> {
        self.engine.step(bounds)
    }

    /// Advances by one reaction without clamping.
    pub fn step_exact(&mut self) -> CrnResult<StepResult> {
        self.engine.step_exact()
    }

    /// Steps until terminal or `max_steps` reactions fired.
    pub fn run_until_finished(
        &mut self,
        max_steps: u64,
        bounds: WaitBounds,
    ) -> CrnResult<RunProgress> {
        self.engine.run_until_finished(max_steps, bounds)
    }

    /// Current populations.
    #[must_use]
    pub fn populations(&self) -> Populations {
        let network = self.engine.network();
        Populations {
            a: network.count(self.species.a).unwrap_or(0),
            b: network.count(self.species.b).unwrap_or(0),
            c: network.count(self.species.c).unwrap_or(0),
        }
    }

    /// Species ids.
    #[must_use]
    pub const fn species(&self) -> Species {
        self.species
    }

    /// Reaction ids.
    #[must_use]
    pub const fn reactions(&self) -> Reactions {
        self.reactions
    }

    /// The underlying engine.
    #[must_use]
    pub const fn engine(&self) -> &Gillespie<S> {
        &self.engine
    }

    /// Consumes the wrapper, returning the engine.
    pub fn into_engine(self) -> Gillespie<S> {
        self.engine
    }
}
