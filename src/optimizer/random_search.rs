use crate::domain::Domain;
use crate::error::{Error, Result, RunError};
use crate::history::History;
use crate::objective::Objective;
use crate::rng_util;
use crate::types::Direction;

use super::{Outcome, Termination, record};

/// Uniform random search: the baseline every model-based run should beat.
///
/// Evaluates `n_evaluations` independent uniform points and reports them
/// through the same [`Outcome`] / [`RunError`] surface as
/// [`Optimizer`](super::Optimizer), so the two can be compared directly.
///
/// # Examples
///
/// ```
/// use smbo::prelude::*;
///
/// let domain = Domain::new(vec![Dimension::continuous("x", -1.0, 1.0)]).unwrap();
/// let outcome = RandomSearch::new(30)
///     .minimize()
///     .seed(5)
///     .run(&domain, |p: &Point| Ok::<_, Error>(p[0].abs()))
///     .unwrap();
///
/// assert_eq!(outcome.history.len(), 30);
/// assert!(outcome.best_score().unwrap() < 0.5);
/// ```
#[derive(Clone, Debug)]
pub struct RandomSearch {
    n_evaluations: usize,
    direction: Direction,
    seed: Option<u64>,
}

impl RandomSearch {
    /// Creates a maximizing random search with `n_evaluations` evaluations.
    #[must_use]
    pub fn new(n_evaluations: usize) -> Self {
        Self {
            n_evaluations,
            direction: Direction::Maximize,
            seed: None,
        }
    }

    /// Minimize the objective instead.
    #[must_use]
    pub fn minimize(mut self) -> Self {
        self.direction = Direction::Minimize;
        self
    }

    /// Sets the random seed for reproducibility.
    #[must_use]
    pub fn seed(mut self, seed: u64) -> Self {
        self.seed = Some(seed);
        self
    }

    /// Evaluates uniform random points of `domain`.
    ///
    /// # Errors
    ///
    /// Returns a [`RunError`] with the partial history if the domain is
    /// empty or the objective fails.
    pub fn run<O: Objective>(
        &self,
        domain: &Domain,
        objective: O,
    ) -> core::result::Result<Outcome, RunError> {
        let mut history = History::with_capacity(self.direction, self.n_evaluations);
        match self.drive(domain, &objective, &mut history) {
            Ok(termination) => Ok(Outcome::new(history, termination)),
            Err(error) => {
                trace_info!(evaluations = history.len(), %error, "random search aborted");
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
        if domain.is_empty() {
            return Err(Error::EmptyDomain);
        }
        let mut rng = rng_util::rng_from_seed(self.seed);
        for _ in 0..self.n_evaluations {
            if objective.before_evaluation(history).is_break() {
                return Ok(Termination::Interrupted);
            }
            record(objective, domain.sample(&mut rng), history)?;
        }
        Ok(Termination::Completed)
    }
}
