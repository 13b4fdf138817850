//! Candidate proposal by random multi-start acquisition maximization.

use parking_lot::Mutex;

use crate::acquisition::Acquisition;
use crate::domain::{Domain, Point};
use crate::error::{Error, Result};
use crate::rng_util;
use crate::surrogate::Posterior;

/// Default number of random candidates scored per proposal.
pub const DEFAULT_N_CANDIDATES: usize = 2000;

/// Proposes the next point to evaluate.
///
/// Draws `n_candidates` uniform points from the domain (integer-valued on
/// discrete dimensions), scores each with the acquisition function and
/// returns the highest-scoring one. The first candidate reaching the
/// maximum wins ties, so proposals are reproducible for a fixed seed.
///
/// Random search over candidates is adequate for the low-dimensional
/// domains (up to about ten dimensions) this crate targets and is not
/// trapped by the acquisition surface's many local optima.
///
/// # Examples
///
/// ```
/// use smbo::acquisition::ExpectedImprovement;
/// use smbo::proposer::CandidateProposer;
/// use smbo::surrogate::{Posterior, Prediction};
/// use smbo::{Dimension, Domain};
///
/// struct Peak;
/// impl Posterior for Peak {
///     fn predict(&self, p: &[f64]) -> Prediction {
///         Prediction::new(-(p[0] - 3.0).powi(2), 0.1)
///     }
/// }
///
/// let domain = Domain::new(vec![Dimension::discrete("n", 0, 6)]).unwrap();
/// let proposer = CandidateProposer::with_seed(500, 1);
/// let next = proposer
///     .propose(&domain, &Peak, &ExpectedImprovement, 0.0, 0.0)
///     .unwrap();
/// assert_eq!(next[0], 3.0);
/// ```
pub struct CandidateProposer {
    n_candidates: usize,
    rng: Mutex<fastrand::Rng>,
}

impl CandidateProposer {
    /// Creates a proposer with a random seed.
    ///
    /// `n_candidates` below one is treated as one.
    #[must_use]
    pub fn new(n_candidates: usize) -> Self {
        Self::from_seed(n_candidates, None)
    }

    /// Creates a proposer with a fixed seed for reproducibility.
    #[must_use]
    pub fn with_seed(n_candidates: usize, seed: u64) -> Self {
        Self::from_seed(n_candidates, Some(seed))
    }

    pub(crate) fn from_seed(n_candidates: usize, seed: Option<u64>) -> Self {
        Self {
            n_candidates: n_candidates.max(1),
            rng: Mutex::new(rng_util::rng_from_seed(seed)),
        }
    }

    /// Returns the number of candidates scored per proposal.
    #[must_use]
    pub fn n_candidates(&self) -> usize {
        self.n_candidates
    }

    /// Returns the candidate maximizing `acquisition`.
    ///
    /// # Errors
    ///
    /// Returns [`Error::EmptyDomain`] if the domain has no dimensions.
    pub fn propose(
        &self,
        domain: &Domain,
        posterior: &dyn Posterior,
        acquisition: &dyn Acquisition,
        best: f64,
        jitter: f64,
    ) -> Result<Point> {
        if domain.is_empty() {
            return Err(Error::EmptyDomain);
        }

        let mut rng = self.rng.lock();
        let mut best_point = domain.sample(&mut rng);
        let mut best_score = acquisition.score(best_point.as_slice(), posterior, best, jitter);

        for _ in 1..self.n_candidates {
            let candidate = domain.sample(&mut rng);
            let score = acquisition.score(candidate.as_slice(), posterior, best, jitter);
            // NaN never wins; a NaN incumbent is replaced by anything that is not.
            if score > best_score || (best_score.is_nan() && !score.is_nan()) {
                best_score = score;
                best_point = candidate;
            }
        }

        trace_debug!(acquisition = best_score, "proposed candidate");
        Ok(best_point)
    }

    /// Draws one uniform point, sharing this proposer's RNG stream.
    pub(crate) fn sample_uniform(&self, domain: &Domain) -> Point {
        domain.sample(&mut self.rng.lock())
    }
}
