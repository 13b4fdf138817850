use crate::acquisition::DEFAULT_JITTER;
use crate::error::{Error, Result};
use crate::proposer::DEFAULT_N_CANDIDATES;
use crate::types::Direction;

/// Settings for a single optimization run.
///
/// Every field has a default, so partial configurations (for example a
/// JSON object naming only `max_iterations`) are valid with the `serde`
/// feature.
///
/// # Examples
///
/// ```
/// use smbo::{Optimizer, RunConfig};
///
/// let config = RunConfig {
///     max_iterations: 30,
///     random_seed: Some(42),
///     ..RunConfig::default()
/// };
/// let optimizer = Optimizer::from_config(config);
/// assert_eq!(optimizer.config().warmup_count, 5);
/// ```
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(
    feature = "serde",
    derive(serde::Serialize, serde::Deserialize),
    serde(default)
)]
pub struct RunConfig {
    /// Uniformly random evaluations before the surrogate is used.
    pub warmup_count: usize,
    /// Surrogate-guided evaluations after warmup.
    pub max_iterations: usize,
    /// Exploration margin subtracted from the improvement threshold, in
    /// standard deviations of the observed scores.
    pub jitter: f64,
    /// Maximize (`true`) or minimize (`false`) the objective.
    pub maximize: bool,
    /// Seed for warmup sampling and candidate proposal; random if `None`.
    pub random_seed: Option<u64>,
    /// Random candidates scored per proposal.
    pub n_candidates: usize,
}

impl Default for RunConfig {
    fn default() -> Self {
        Self {
            warmup_count: 5,
            max_iterations: 20,
            jitter: DEFAULT_JITTER,
            maximize: true,
            random_seed: None,
            n_candidates: DEFAULT_N_CANDIDATES,
        }
    }
}

impl RunConfig {
    /// Returns the optimization direction implied by `maximize`.
    #[must_use]
    pub fn direction(&self) -> Direction {
        if self.maximize {
            Direction::Maximize
        } else {
            Direction::Minimize
        }
    }

    /// Total evaluations a run performs if nothing stops it early.
    #[must_use]
    pub fn budget(&self) -> usize {
        self.warmup_count.saturating_add(self.max_iterations)
    }

    /// Checks value ranges that the type system does not.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidConfig`] if `jitter` is negative or not finite.
    pub fn validate(&self) -> Result<()> {
        if !self.jitter.is_finite() || self.jitter < 0.0 {
            return Err(Error::InvalidConfig("jitter must be finite and non-negative"));
        }
        Ok(())
    }
}
