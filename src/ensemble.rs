//! Many independent approximate-majority trajectories.
//!
//! Every run builds a fresh network and its own ChaCha source seeded from
//! [`derive_seed`]`(config.seed, run_index)`; runs share no state. Each run is
//! stepped until the network is terminal or the per-run step cap is hit, then
//! classified by comparing the final A and B counts.

use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::approximate_majority::{ApproximateMajority, ApproximateMajorityConfig, Populations};
use crate::error::{CrnResult, ValidationError};
use crate::gillespie::StepResult;
use crate::random::derive_seed;

/// Upper limit on `max_steps_per_run`; the averaged trajectory keeps one
/// entry per step.
pub const MAX_STEPS_PER_RUN: u64 = 1_000_000;

/// Ensemble parameters.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct EnsembleConfig {
    /// Network shared by every run (each run gets its own copy).
    #[serde(flatten)]
    pub network: ApproximateMajorityConfig,
    /// Number of runs.
    pub runs: usize,
    /// Step cap per run; runs still active at the cap are incomplete.
    pub max_steps_per_run: u64,
    /// Base seed; run `i` uses `derive_seed(seed, i)`.
    #[serde(default)]
    pub seed: u64,
}

impl Default for EnsembleConfig {
    fn default() -> Self {
        Self {
            network: ApproximateMajorityConfig::default(),
            runs: 100,
            max_steps_per_run: 10_000,
            seed: 0,
        }
    }
}

impl EnsembleConfig {
    /// Validate configuration.
    pub fn validate(&self) -> Result<(), ValidationError> {
        self.network.validate()?;
        if self.runs == 0 {
            return Err(ValidationError::InvalidEnsembleConfig {
                reason: "runs must be > 0".to_string(),
            });
        }
        if self.max_steps_per_run == 0 {
            return Err(ValidationError::InvalidEnsembleConfig {
                reason: "max_steps_per_run must be > 0".to_string(),
            });
        }
        if self.max_steps_per_run > MAX_STEPS_PER_RUN {
            return Err(ValidationError::InvalidEnsembleConfig {
                reason: format!("max_steps_per_run must be <= {MAX_STEPS_PER_RUN}"),
            });
        }
        Ok(())
    }
}

/// Classification of a finished (or capped) run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RunOutcome {
    /// Final A count exceeds final B count.
    AMajority,
    /// Final B count exceeds final A count.
    BMajority,
    /// Cap reached before termination, or A and B ended equal.
    Incomplete,
}

impl RunOutcome {
    /// Classifies final populations.
    ///
    /// A run that did not finish is incomplete regardless of its counts. A
    /// finished run with `a == b` can only have both at zero (everything
    /// annihilated into C) and is also incomplete.
    #[must_use]
    pub fn classify(populations: Populations, finished: bool) -> Self {
        if !finished {
            return Self::Incomplete;
        }
        match populations.a.cmp(&populations.b) {
            std::cmp::Ordering::Greater => Self::AMajority,
            std::cmp::Ordering::Less => Self::BMajority,
            std::cmp::Ordering::Equal => Self::Incomplete,
        }
    }
}

/// One run's result.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RunReport {
    /// Run index within the ensemble.
    pub index: usize,
    /// Seed the run's source was built from.
    pub seed: u64,
    /// Outcome.
    pub outcome: RunOutcome,
    /// Whether the network reached the terminal state.
    pub finished: bool,
    /// Reactions fired.
    pub steps: u64,
    /// Simulated time.
    pub elapsed: f64,
    /// Populations at the end of the run.
    pub final_populations: Populations,
}

/// Aggregate over all runs.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EnsembleSummary {
    /// Runs performed.
    pub runs: usize,
    /// Runs ending with A in the majority.
    pub a_majority: usize,
    /// Runs ending with B in the majority.
    pub b_majority: usize,
    /// Runs that hit the cap or ended tied.
    pub incomplete: usize,
    /// Mean `[a, b, c]` over all runs after `k` step calls (index 0 is the
    /// starting state). Finished runs contribute their terminal counts.
    pub average: Vec<[f64; 3]>,
    /// Per-run reports, in run order.
    pub reports: Vec<RunReport>,
}

impl EnsembleSummary {
    /// Fraction of runs won by A.
    #[must_use]
    #[allow(clippy::cast_precision_loss)]
    pub fn a_fraction(&self) -> f64 {
        self.a_majority as f64 / self.runs as f64
    }

    /// Fraction of runs won by B.
    #[must_use]
    #[allow(clippy::cast_precision_loss)]
    pub fn b_fraction(&self) -> f64 {
        self.b_majority as f64 / self.runs as f64
    }
}

/// Runner for an ensemble of independent trajectories.
#[derive(Debug, Clone)]
pub struct Ensemble {
    config: EnsembleConfig,
}

impl Ensemble {
    /// Creates a runner after validating `config`.
    pub fn new(config: EnsembleConfig) -> Result<Self, ValidationError> {
        config.validate()?;
        Ok(Self { config })
    }

    /// The configuration.
    #[must_use]
    pub const fn config(&self) -> &EnsembleConfig {
        &self.config
    }

    /// Runs a single trajectory with index `index`.
    pub fn run_one(&self, index: usize) -> CrnResult<RunReport> {
        self.run_tracked(index, &mut |_: usize, _: Populations| {})
    }

    /// Runs every trajectory and aggregates them.
    #[allow(clippy::cast_precision_loss, clippy::cast_possible_truncation)]
    pub fn run(&self) -> CrnResult<EnsembleSummary> {
        let steps = self.config.max_steps_per_run as usize;
        // Summed as f64: counts near u64::MAX would overflow an integer sum.
        let mut sums = vec![[0f64; 3]; steps + 1];
        let mut reports = Vec::with_capacity(self.config.runs);

        for index in 0..self.config.runs {
            let report = self.run_tracked(index, &mut |k: usize, p: Populations| {
                let slot = &mut sums[k];
                slot[0] += p.a as f64;
                slot[1] += p.b as f64;
                slot[2] += p.c as f64;
            })?;
            reports.push(report);
        }

        let count = |outcome: RunOutcome| reports.iter().filter(|r| r.outcome == outcome).count();
        let a_majority = count(RunOutcome::AMajority);
        let b_majority = count(RunOutcome::BMajority);
        let incomplete = count(RunOutcome::Incomplete);

        let runs = self.config.runs as f64;
        let average = sums
            .iter()
            .map(|s| [s[0] / runs, s[1] / runs, s[2] / runs])
            .collect();

        info!(
            runs = self.config.runs,
            a_majority, b_majority, incomplete, "ensemble complete"
        );

        Ok(EnsembleSummary {
            runs: self.config.runs,
            a_majority,
            b_majority,
            incomplete,
            average,
            reports,
        })
    }

    /// Runs trajectory `index`, calling `observe(k, populations)` for every
    /// `k` in `0..=max_steps_per_run`.
    #[allow(clippy::cast_possible_truncation)]
    fn run_tracked(
        &self,
        index: usize,
        observe: &mut dyn FnMut(usize, Populations),
    ) -> CrnResult<RunReport> {
        let seed = derive_seed(self.config.seed, index as u64);
        let mut am = ApproximateMajority::seeded(self.config.network, seed)?;
        let cap = self.config.max_steps_per_run as usize;

        observe(0, am.populations());
        let mut finished = false;
        for k in 1..=cap {
            if !finished && am.step_exact()? == StepResult::Finished {
                finished = true;
            }
            observe(k, am.populations());
        }
        // A run whose last permitted step emptied the network is finished.
        if !finished {
            finished = am.engine().total_propensity() <= 0.0;
        }

        let final_populations = am.populations();
        let outcome = RunOutcome::classify(final_populations, finished);
        let engine = am.engine();
        debug!(index, seed, ?outcome, steps = engine.steps(), "run complete");

        Ok(RunReport {
            index,
            seed,
            outcome,
            finished,
            steps: engine.steps(),
            elapsed: engine.elapsed(),
            final_populations,
        })
    }
}
