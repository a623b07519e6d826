//! Gillespie stochastic simulation engine.
//!
//! Each [`Gillespie::step`] samples an exponential waiting time from the total
//! propensity, picks a reaction by inverse-CDF sampling over the propensities
//! in reaction order, and fires it. The engine owns its network and its random
//! source; pacing and rendering belong to the caller.

pub mod bounds;

pub use bounds::WaitBounds;

use serde::{Deserialize, Serialize};
use tracing::{debug, trace};

use crate::entity::EntityId;
use crate::error::{CrnResult, ExecutionError, ValidationError};
use crate::network::ReactionNetwork;
use crate::random::{seeded, RandomSource, SeededSource};
use crate::reaction::ReactionId;

/// Added to the first uniform draw so `ln(1/u)` stays finite.
pub const VERY_SMALL: f64 = 1e-10;

/// Whether any reaction can currently fire.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EngineState {
    /// Total propensity is positive.
    Active,
    /// Total propensity is zero; no reaction can fire.
    Terminal,
}

/// Outcome of one [`Gillespie::step`].
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum StepResult {
    /// Nothing could fire. No state was changed.
    Finished,
    /// `reaction` fired after `wait_time`.
    Fired {
        /// The reaction that fired.
        reaction: ReactionId,
        /// Waiting time before the firing (clamped if bounds were given).
        wait_time: f64,
    },
}

impl StepResult {
    /// Returns true if the network was terminal.
    #[must_use]
    pub const fn is_finished(&self) -> bool {
        matches!(self, Self::Finished)
    }

    /// The reaction that fired, if any.
    #[must_use]
    pub const fn reaction(&self) -> Option<ReactionId> {
        match self {
            Self::Finished => None,
            Self::Fired { reaction, .. } => Some(*reaction),
        }
    }

    /// The waiting time, if a reaction fired.
    #[must_use]
    pub const fn wait_time(&self) -> Option<f64> {
        match self {
            Self::Finished => None,
            Self::Fired { wait_time, .. } => Some(*wait_time),
        }
    }
}

/// Result of [`Gillespie::run_until_finished`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct RunProgress {
    /// Reactions fired during the call.
    pub fired: u64,
    /// Whether the network reached the terminal state.
    pub finished: bool,
}

/// The stochastic stepper.
///
/// # Examples
///
/// ```
/// use crnsim::{Gillespie, ReactionNetwork, StepResult};
///
/// let mut network = ReactionNetwork::new();
/// let a = network.add_entity("A", 1);
/// let b = network.add_entity("B", 1);
/// let c = network.add_entity("C", 0);
/// let ab = network.add_reaction(a, b, c, 1.0).unwrap();
///
/// let mut engine = Gillespie::seeded(network, 7).unwrap();
/// assert_eq!(engine.step_exact().unwrap().reaction(), Some(ab));
/// assert_eq!(engine.step_exact().unwrap(), StepResult::Finished);
/// assert_eq!(engine.count(c), Some(2));
/// ```
#[derive(Debug, Clone)]
pub struct Gillespie<S> {
    network: ReactionNetwork,
    source: S,
    state: EngineState,
    steps: u64,
    elapsed: f64,
}

impl Gillespie<SeededSource> {
    /// Creates an engine driven by a ChaCha generator seeded with `seed`.
    pub fn seeded(network: ReactionNetwork, seed: u64) -> CrnResult<Self> {
        Self::new(network, seeded(seed))
    }
}

impl<S: RandomSource> Gillespie<S> {
    /// Creates an engine over `network`, drawing from `source`.
    ///
    /// Fails with [`ValidationError::EmptyNetwork`] if the network has no
    /// reactions.
    pub fn new(network: ReactionNetwork, source: S) -> CrnResult<Self> {
        if network.is_empty() {
            return Err(ValidationError::EmptyNetwork.into());
        }
        let state = state_for(network.sum_propensities());
        Ok(Self {
            network,
            source,
            state,
            steps: 0,
            elapsed: 0.0,
        })
    }

    /// Advances the simulation by one reaction.
    ///
    /// Total propensity is recomputed on every call. When it is zero the
    /// result is [`StepResult::Finished`] and neither the network nor the
    /// random source is touched.
    pub fn step(&mut self, bounds: WaitBounds) -> CrnResult<StepResult> {
        bounds.validate()?;
        if self.network.is_empty() {
            return Err(ValidationError::EmptyNetwork.into());
        }

        let propensities = self.network.all_propensities();
        let total: f64 = propensities.iter().sum();
        if total <= 0.0 {
            if self.state == EngineState::Active {
                debug!(
                    steps = self.steps,
                    elapsed = self.elapsed,
                    "reaction network reached terminal state"
                );
            }
            self.state = EngineState::Terminal;
            return Ok(StepResult::Finished);
        }
        self.state = EngineState::Active;

        let u1 = self.source.next_f64() + VERY_SMALL;
        let wait_time = bounds.clamp(((1.0 / total) * (1.0 / u1).ln()).max(0.0));

        let u2 = self.source.next_f64();
        let index = select(&propensities, total, u2)
            .ok_or(ExecutionError::NoReactionSelected { total })?;

        self.network.fire_at(index)?;
        let reaction = self.network.reactions()[index].id();

        self.steps += 1;
        self.elapsed += wait_time;
        trace!(%reaction, wait_time, total, "reaction fired");

        Ok(StepResult::Fired {
            reaction,
            wait_time,
        })
    }

    /// [`step`](Self::step) without clamping: the exact simulation.
    pub fn step_exact(&mut self) -> CrnResult<StepResult> {
        self.step(WaitBounds::unbounded())
    }

    /// Steps until the network is terminal or `max_steps` reactions fired.
    pub fn run_until_finished(
        &mut self,
        max_steps: u64,
        bounds: WaitBounds,
    ) -> CrnResult<RunProgress> {
        let mut fired = 0;
        while fired < max_steps {
            if self.step(bounds)?.is_finished() {
                return Ok(RunProgress {
                    fired,
                    finished: true,
                });
            }
            fired += 1;
        }
        // The cap may land exactly on the terminal state.
        let finished = self.network.sum_propensities() <= 0.0;
        if finished {
            self.state = EngineState::Terminal;
        }
        Ok(RunProgress { fired, finished })
    }

    /// Current total propensity.
    #[must_use]
    pub fn total_propensity(&self) -> f64 {
        self.network.sum_propensities()
    }

    /// State observed by the most recent step (or at construction).
    #[must_use]
    pub const fn state(&self) -> EngineState {
        self.state
    }

    /// Reactions fired so far.
    #[must_use]
    pub const fn steps(&self) -> u64 {
        self.steps
    }

    /// Simulated time: the sum of all returned waiting times.
    #[must_use]
    pub const fn elapsed(&self) -> f64 {
        self.elapsed
    }

    /// Read access to the network.
    #[must_use]
    pub const fn network(&self) -> &ReactionNetwork {
        &self.network
    }

    /// Current count of an entity.
    #[must_use]
    pub fn count(&self, id: EntityId) -> Option<u64> {
        self.network.count(id)
    }

    /// Consumes the engine, returning the network and the random source.
    pub fn into_parts(self) -> (ReactionNetwork, S) {
        (self.network, self.source)
    }
}

fn state_for(total: f64) -> EngineState {
    if total > 0.0 {
        EngineState::Active
    } else {
        EngineState::Terminal
    }
}

/// Inverse-CDF selection over `propensities`.
///
/// Returns the first reaction with positive propensity whose cumulative
/// normalised propensity reaches `u`. Rounding can leave the final cumulative
/// sum just below `u`; the last positive reaction is chosen then.
fn select(propensities: &[f64], total: f64, u: f64) -> Option<usize> {
    let mut cumulative = 0.0;
    let mut last_positive = None;
    for (index, &p) in propensities.iter().enumerate() {
        if p <= 0.0 {
            continue;
        }
        last_positive = Some(index);
        cumulative += p / total;
        if cumulative >= u {
            return Some(index);
        }
    }
    last_positive
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::random::ScriptedSource;

    fn ab_network(a: u64, b: u64) -> (ReactionNetwork, [EntityId; 3]) {
        let mut network = ReactionNetwork::new();
        let ea = network.add_entity("A", a);
        let eb = network.add_entity("B", b);
        let ec = network.add_entity("C", 0);
        network.add_reaction(ea, eb, ec, 1.0).unwrap();
        (network, [ea, eb, ec])
    }

    #[test]
    fn test_empty_network_is_rejected() {
        let err = Gillespie::seeded(ReactionNetwork::new(), 1).unwrap_err();
        assert!(err.is_validation());
    }

    #[test]
    fn test_select_skips_zero_propensity() {
        assert_eq!(select(&[0.0, 2.0, 2.0], 4.0, 0.0), Some(1));
        assert_eq!(select(&[0.0, 2.0, 2.0], 4.0, 0.5), Some(1));
        assert_eq!(select(&[0.0, 2.0, 2.0], 4.0, 0.51), Some(2));
        assert_eq!(select(&[1.0, 0.0, 3.0], 4.0, 0.999), Some(2));
        assert_eq!(select(&[0.0, 0.0], 1.0, 0.5), None);
    }

    #[test]
    fn test_select_falls_back_on_rounding_shortfall() {
        // Cumulative sum ends just below u.
        let p = [0.1, 0.2, 0.0];
        let total = 0.3 + 1e-12;
        assert_eq!(select(&p, total, 0.999_999_999_999), Some(1));
    }

    #[test]
    fn test_wait_time_formula() {
        let (network, _) = ab_network(2, 2);
        // total = 4; u1 = 0.5 + 1e-10
        let source = ScriptedSource::new(vec![0.5, 0.0]).unwrap();
        let mut engine = Gillespie::new(network, source).unwrap();
        let wait = engine.step_exact().unwrap().wait_time().unwrap();
        let expected = 0.25 * (1.0 / (0.5 + VERY_SMALL)).ln();
        assert!((wait - expected).abs() < 1e-12);
        assert!((engine.elapsed() - expected).abs() < 1e-12);
    }

    #[test]
    fn test_zero_draw_gives_finite_wait() {
        let (network, _) = ab_network(3, 3);
        let source = ScriptedSource::new(vec![0.0]).unwrap();
        let mut engine = Gillespie::new(network, source).unwrap();
        let wait = engine.step_exact().unwrap().wait_time().unwrap();
        assert!(wait.is_finite());
        assert!(wait > 0.0);
    }

    #[test]
    fn test_bounds_clamp_wait_time() {
        let (network, _) = ab_network(5, 5);
        let mut engine = Gillespie::seeded(network, 3).unwrap();
        let bounds = WaitBounds::new(Some(0.5), Some(0.75)).unwrap();
        while let StepResult::Fired { wait_time, .. } = engine.step(bounds).unwrap() {
            assert!((0.5..=0.75).contains(&wait_time));
        }
    }

    #[test]
    fn test_invalid_bounds_do_not_mutate() {
        let (network, [a, _, _]) = ab_network(2, 2);
        let mut engine = Gillespie::seeded(network, 3).unwrap();
        let bad = WaitBounds {
            min: Some(2.0),
            max: Some(1.0),
        };
        assert!(engine.step(bad).unwrap_err().is_validation());
        assert_eq!(engine.count(a), Some(2));
        assert_eq!(engine.steps(), 0);
    }

    #[test]
    fn test_terminal_step_draws_nothing() {
        let (network, [a, b, c]) = ab_network(0, 4);
        let source = ScriptedSource::new(vec![0.3]).unwrap();
        let mut engine = Gillespie::new(network, source).unwrap();
        assert_eq!(engine.state(), EngineState::Terminal);

        assert_eq!(engine.step_exact().unwrap(), StepResult::Finished);
        assert_eq!(engine.count(a), Some(0));
        assert_eq!(engine.count(b), Some(4));
        assert_eq!(engine.count(c), Some(0));

        let (_, source) = engine.into_parts();
        assert_eq!(source.drawn(), 0);
    }

    #[test]
    fn test_state_transitions_to_terminal() {
        let (network, _) = ab_network(1, 1);
        let mut engine = Gillespie::seeded(network, 11).unwrap();
        assert_eq!(engine.state(), EngineState::Active);
        assert!(!engine.step_exact().unwrap().is_finished());
        assert_eq!(engine.state(), EngineState::Active);
        assert!(engine.step_exact().unwrap().is_finished());
        assert_eq!(engine.state(), EngineState::Terminal);
        assert_eq!(engine.steps(), 1);
    }

    #[test]
    fn test_run_until_finished_reports_cap() {
        let (network, _) = ab_network(10, 10);
        let mut engine = Gillespie::seeded(network, 5).unwrap();
        let progress = engine.run_until_finished(3, WaitBounds::unbounded()).unwrap();
        assert_eq!(progress.fired, 3);
        assert!(!progress.finished);

        let progress = engine.run_until_finished(100, WaitBounds::unbounded()).unwrap();
        assert_eq!(progress.fired, 7);
        assert!(progress.finished);
    }

    #[test]
    fn test_run_until_finished_cap_on_terminal_state() {
        let (network, _) = ab_network(2, 2);
        let mut engine = Gillespie::seeded(network, 5).unwrap();
        let progress = engine.run_until_finished(2, WaitBounds::unbounded()).unwrap();
        assert_eq!(progress.fired, 2);
        assert!(progress.finished);
        assert_eq!(engine.state(), EngineState::Terminal);
    }

    #[test]
    fn test_step_result_serialization() {
        let fired = StepResult::Fired {
            reaction: ReactionId::from_raw(4),
            wait_time: 0.5,
        };
        let json = serde_json::to_value(fired).unwrap();
        assert_eq!(json["status"], "fired");
        assert_eq!(json["reaction"], 4);

        let finished = serde_json::to_value(StepResult::Finished).unwrap();
        assert_eq!(finished["status"], "finished");
    }
}
