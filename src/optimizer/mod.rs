//! The sequential model-based optimization loop.
//!
//! A run moves through four phases:
//!
//! 1. **Init**: validate the configuration and domain, start an empty history.
//! 2. **Warmup**: evaluate `warmup_count` uniformly random points.
//! 3. **Iterate**: `max_iterations` times, refit the surrogate on the whole
//!    history, propose the acquisition maximizer, evaluate it, append it.
//! 4. **Done**: return the [`Outcome`].
//!
//! Iterations are strictly sequential: each proposal depends on every
//! observation before it. The objective is the only blocking call.
//!
//! Scores are recorded exactly as the objective returns them. Before each
//! fit they are mapped into a maximization frame (negated when minimizing)
//! and standardized to zero mean and unit variance, which makes `jitter`
//! independent of the objective's scale.

mod config;
mod outcome;
mod random_search;

use std::sync::Arc;

pub use config::RunConfig;
pub use outcome::{Outcome, Termination};
pub use random_search::RandomSearch;

use crate::acquisition::{Acquisition, ExpectedImprovement};
use crate::domain::{Domain, Point};
use crate::error::{Error, Result, RunError};
use crate::history::{History, Observation};
use crate::objective::Objective;
use crate::proposer::CandidateProposer;
use crate::surrogate::{GaussianProcess, Surrogate, standardization};

/// Phase of a run.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum Phase {
    Init,
    Warmup,
    Iterate,
    Done(Termination),
}

/// Bayesian optimizer: surrogate + acquisition + run configuration.
///
/// An `Optimizer` holds no per-run state. Every call to [`run`](Self::run)
/// starts from an empty history and, with a fixed seed, repeats exactly.
///
/// # Examples
///
/// ```
/// use smbo::prelude::*;
///
/// let domain = Domain::new(vec![
///     Dimension::continuous("learning_rate", 0.01, 0.3),
///     Dimension::discrete("max_depth", 2, 8),
/// ])
/// .unwrap();
///
/// let optimizer = Optimizer::builder()
///     .warmup_count(4)
///     .max_iterations(8)
///     .seed(42)
///     .build();
///
/// let outcome = optimizer
///     .run(&domain, |p: &Point| {
///         let (lr, depth) = (p[0], p[1]);
///         Ok::<_, Error>(-(lr - 0.1).powi(2) - 0.01 * (depth - 5.0).powi(2))
///     })
///     .unwrap();
///
/// assert_eq!(outcome.history.len(), 12);
/// let best = outcome.best_point().unwrap();
/// assert!(domain.contains(best));
/// ```
pub struct Optimizer {
    config: RunConfig,
    surrogate: Arc<dyn Surrogate>,
    acquisition: Arc<dyn Acquisition>,
}

impl Optimizer {
    /// Creates an optimizer with default settings: GP surrogate, Expected
    /// Improvement, 5 warmup points, 20 iterations, maximizing.
    #[must_use]
    pub fn new() -> Self {
        Self::from_config(RunConfig::default())
    }

    /// Creates an optimizer from a run configuration, with the default
    /// surrogate and acquisition.
    #[must_use]
    pub fn from_config(config: RunConfig) -> Self {
        Self {
            config,
            surrogate: Arc::new(GaussianProcess::new()),
            acquisition: Arc::new(ExpectedImprovement),
        }
    }

    /// Returns a builder for configuring an `Optimizer`.
    #[must_use]
    pub fn builder() -> OptimizerBuilder {
        OptimizerBuilder::default()
    }

    /// Returns the run configuration.
    #[must_use]
    pub fn config(&self) -> &RunConfig {
        &self.config
    }

    /// Runs the optimization loop on `domain`.
    ///
    /// The objective's [`before_evaluation`](Objective::before_evaluation)
    /// hook can stop the run between evaluations; the outcome is then
    /// [`Termination::Interrupted`] with everything observed so far.
    ///
    /// # Errors
    ///
    /// Returns a [`RunError`] holding the partial history if:
    /// - the configuration is invalid ([`Error::InvalidConfig`]),
    /// - the domain has no dimensions ([`Error::EmptyDomain`]),
    /// - the objective fails or returns a non-finite score
    ///   ([`Error::ObjectiveEvaluation`]),
    /// - the surrogate cannot be fitted ([`Error::InsufficientData`] when
    ///   `warmup_count` is zero, [`Error::SurrogateFit`]).
    pub fn run<O: Objective>(
        &self,
        domain: &Domain,
        objective: O,
    ) -> core::result::Result<Outcome, RunError> {
        #[cfg(feature = "tracing")]
        let _span = tracing::info_span!(
            "optimize",
            dims = domain.len(),
            warmup = self.config.warmup_count,
            max_iterations = self.config.max_iterations,
            direction = ?self.config.direction(),
        )
        .entered();

        let mut history = History::with_capacity(self.config.direction(), self.config.budget());
        match self.drive(domain, &objective, &mut history) {
            Ok(termination) => {
                trace_info!(evaluations = history.len(), ?termination, "optimization finished");
                Ok(Outcome::new(history, termination))
            }
            Err(error) => {
                trace_info!(evaluations = history.len(), %error, "optimization aborted");
                Err(RunError::new(error, history))
            }
        }
    }

    fn drive<O: Objective>(
        &self,
        domain: &Domain,
        objective: &O,
        history: &mut History,
    ) -> Result<Termination> {
        let proposer =
            CandidateProposer::from_seed(self.config.n_candidates, self.config.random_seed);
        let mut phase = Phase::Init;
        let mut iteration = 0;

        loop {
            phase = match phase {
                Phase::Init => {
                    self.config.validate()?;
                    if domain.is_empty() {
                        return Err(Error::EmptyDomain);
                    }
                    Phase::Warmup
                }
                Phase::Warmup => {
                    if history.len() >= self.config.warmup_count {
                        trace_info!(evaluations = history.len(), "warmup complete");
                        Phase::Iterate
                    } else if objective.before_evaluation(history).is_break() {
                        Phase::Done(Termination::Interrupted)
                    } else {
                        let point = proposer.sample_uniform(domain);
                        record(objective, point, history)?;
                        Phase::Warmup
                    }
                }
                Phase::Iterate => {
                    if iteration >= self.config.max_iterations {
                        Phase::Done(Termination::Completed)
                    } else if objective.before_evaluation(history).is_break() {
                        Phase::Done(Termination::Interrupted)
                    } else {
                        trace_debug!(iteration, "fitting surrogate");
                        let point = self.suggest(domain, &proposer, history)?;
                        record(objective, point, history)?;
                        iteration += 1;
                        Phase::Iterate
                    }
                }
                Phase::Done(termination) => return Ok(termination),
            };
        }
    }

    /// Fits the surrogate on `history` and proposes the next point.
    fn suggest(
        &self,
        domain: &Domain,
        proposer: &CandidateProposer,
        history: &History,
    ) -> Result<Point> {
        let training = maximization_frame(history);
        let posterior = self.surrogate.fit(domain, &training)?;
        let best = training
            .iter()
            .map(|o| o.score)
            .fold(f64::NEG_INFINITY, f64::max);
        proposer.propose(
            domain,
            posterior.as_ref(),
            self.acquisition.as_ref(),
            best,
            self.config.jitter,
        )
    }
}

impl Default for Optimizer {
    fn default() -> Self {
        Self::new()
    }
}

/// Builder for configuring an [`Optimizer`].
///
/// Defaults follow [`RunConfig::default`], with a [`GaussianProcess`]
/// surrogate and [`ExpectedImprovement`] acquisition.
///
/// # Examples
///
/// ```
/// use smbo::prelude::*;
///
/// let optimizer = Optimizer::builder()
///     .minimize()
///     .warmup_count(10)
///     .max_iterations(40)
///     .jitter(0.01)
///     .n_candidates(5000)
///     .surrogate(KernelRegression::new())
///     .acquisition(UpperConfidenceBound::new(1.5))
///     .seed(7)
///     .build();
///
/// assert_eq!(optimizer.config().direction(), Direction::Minimize);
/// ```
#[derive(Default)]
pub struct OptimizerBuilder {
    config: RunConfig,
    surrogate: Option<Arc<dyn Surrogate>>,
    acquisition: Option<Arc<dyn Acquisition>>,
}

impl OptimizerBuilder {
    /// Replaces the whole run configuration.
    #[must_use]
    pub fn config(mut self, config: RunConfig) -> Self {
        self.config = config;
        self
    }

    /// Sets the number of random warmup evaluations.
    ///
    /// Default: 5.
    #[must_use]
    pub fn warmup_count(mut self, n: usize) -> Self {
        self.config.warmup_count = n;
        self
    }

    /// Sets the number of surrogate-guided evaluations after warmup.
    ///
    /// Default: 20.
    #[must_use]
    pub fn max_iterations(mut self, n: usize) -> Self {
        self.config.max_iterations = n;
        self
    }

    /// Sets the exploration jitter, in standard deviations of the scores.
    ///
    /// Default: 0.05.
    #[must_use]
    pub fn jitter(mut self, jitter: f64) -> Self {
        self.config.jitter = jitter;
        self
    }

    /// Maximize the objective (the default).
    #[must_use]
    pub fn maximize(mut self) -> Self {
        self.config.maximize = true;
        self
    }

    /// Minimize the objective.
    #[must_use]
    pub fn minimize(mut self) -> Self {
        self.config.maximize = false;
        self
    }

    /// Sets the number of random candidates scored per proposal.
    ///
    /// Default: 2000.
    #[must_use]
    pub fn n_candidates(mut self, n: usize) -> Self {
        self.config.n_candidates = n;
        self
    }

    /// Sets the random seed for reproducibility.
    #[must_use]
    pub fn seed(mut self, seed: u64) -> Self {
        self.config.random_seed = Some(seed);
        self
    }

    /// Sets the surrogate model.
    ///
    /// Default: [`GaussianProcess`].
    #[must_use]
    pub fn surrogate(mut self, surrogate: impl Surrogate + 'static) -> Self {
        self.surrogate = Some(Arc::new(surrogate));
        self
    }

    /// Sets the acquisition function.
    ///
    /// Default: [`ExpectedImprovement`].
    #[must_use]
    pub fn acquisition(mut self, acquisition: impl Acquisition + 'static) -> Self {
        self.acquisition = Some(Arc::new(acquisition));
        self
    }

    /// Builds the configured [`Optimizer`].
    #[must_use]
    pub fn build(self) -> Optimizer {
        Optimizer {
            config: self.config,
            surrogate: self
                .surrogate
                .unwrap_or_else(|| Arc::new(GaussianProcess::new())),
            acquisition: self
                .acquisition
                .unwrap_or_else(|| Arc::new(ExpectedImprovement)),
        }
    }
}

/// Evaluates the objective at `point` and appends the observation.
///
/// A failed or non-finite evaluation leaves `history` untouched.
pub(crate) fn record<O: Objective>(
    objective: &O,
    point: Point,
    history: &mut History,
) -> Result<()> {
    let evaluation = history.len() + 1;
    let score = objective
        .evaluate(&point)
        .map_err(|e| Error::ObjectiveEvaluation {
            evaluation,
            message: e.to_string(),
        })?;
    if !score.is_finite() {
        return Err(Error::ObjectiveEvaluation {
            evaluation,
            message: format!("non-finite score {score}"),
        });
    }

    #[cfg(feature = "tracing")]
    {
        let improved = history
            .best_score()
            .is_none_or(|best| history.direction().is_better(score, best));
        tracing::debug!(evaluation, score, "evaluation complete");
        if improved {
            tracing::info!(evaluation, score, "new best value found");
        }
    }

    history.push(Observation::new(point, score));
    Ok(())
}

/// Maps history scores into the standardized maximization frame.
fn maximization_frame(history: &History) -> Vec<Observation> {
    let direction = history.direction();
    let scores: Vec<f64> = history
        .iter()
        .map(|o| direction.to_maximization(o.score))
        .collect();
    let (mean, std) = standardization(&scores);
    history
        .iter()
        .zip(scores)
        .map(|(o, s)| Observation::new(o.point.clone(), (s - mean) / std))
        .collect()
}
