//! Acquisition functions: scoring candidates from a surrogate's prediction.
//!
//! All functions work in the maximization frame: larger predicted means
//! are better and `best` is the largest (standardized) score observed so
//! far. Scores are pure functions of their inputs.
//!
//! | Acquisition | Formula |
//! |-------------|---------|
//! | [`ExpectedImprovement`] | `imp Φ(imp/σ) + σ φ(imp/σ)`, `imp = μ - best - jitter` |
//! | [`ProbabilityOfImprovement`] | `Φ(imp/σ)` |
//! | [`UpperConfidenceBound`] | `μ + κσ` |

use crate::surrogate::{MIN_STD_DEV, Posterior, Prediction};

/// Default exploration jitter subtracted from the improvement threshold.
pub const DEFAULT_JITTER: f64 = 0.05;

/// Scores a candidate point by how promising it is to evaluate next.
pub trait Acquisition: Send + Sync {
    /// Scores a prediction relative to the best score so far.
    fn evaluate(&self, prediction: Prediction, best: f64, jitter: f64) -> f64;

    /// Predicts at `point` with `posterior` and scores the prediction.
    fn score(&self, point: &[f64], posterior: &dyn Posterior, best: f64, jitter: f64) -> f64 {
        self.evaluate(posterior.predict(point), best, jitter)
    }
}

/// Expected Improvement over `best + jitter`.
///
/// Degrades to the plain improvement `max(μ - best - jitter, 0)` when the
/// standard deviation is at the floor, so a certain non-improving point
/// scores exactly zero.
///
/// # Examples
///
/// ```
/// use smbo::acquisition::{Acquisition, ExpectedImprovement};
/// use smbo::surrogate::Prediction;
///
/// let ei = ExpectedImprovement;
/// assert_eq!(ei.evaluate(Prediction::new(0.9, 0.0), 1.0, 0.05), 0.0);
/// assert!(ei.evaluate(Prediction::new(0.9, 0.5), 1.0, 0.05) > 0.0);
/// ```
#[derive(Clone, Copy, Debug, Default)]
pub struct ExpectedImprovement;

impl Acquisition for ExpectedImprovement {
    fn evaluate(&self, prediction: Prediction, best: f64, jitter: f64) -> f64 {
        let Prediction { mean, std_dev } = prediction;
        let improvement = mean - best - jitter;
        if std_dev <= MIN_STD_DEV {
            return improvement.max(0.0);
        }
        let z = improvement / std_dev;
        let ei = improvement * norm_cdf(z) + std_dev * norm_pdf(z);
        if ei.is_nan() { 0.0 } else { ei.max(0.0) }
    }
}

/// Probability that a point improves on `best + jitter`.
#[derive(Clone, Copy, Debug, Default)]
pub struct ProbabilityOfImprovement;

impl Acquisition for ProbabilityOfImprovement {
    fn evaluate(&self, prediction: Prediction, best: f64, jitter: f64) -> f64 {
        let improvement = prediction.mean - best - jitter;
        if prediction.std_dev <= MIN_STD_DEV {
            return if improvement > 0.0 { 1.0 } else { 0.0 };
        }
        norm_cdf(improvement / prediction.std_dev)
    }
}

/// Optimistic bound `μ + κσ`. Ignores `best` and `jitter`.
#[derive(Clone, Copy, Debug)]
pub struct UpperConfidenceBound {
    kappa: f64,
}

impl UpperConfidenceBound {
    /// Creates a UCB acquisition with exploration weight `kappa`.
    ///
    /// Negative or non-finite weights are treated as zero (pure exploitation).
    #[must_use]
    pub fn new(kappa: f64) -> Self {
        Self {
            kappa: if kappa.is_finite() { kappa.max(0.0) } else { 0.0 },
        }
    }

    /// Returns the exploration weight.
    #[must_use]
    pub fn kappa(&self) -> f64 {
        self.kappa
    }
}

impl Default for UpperConfidenceBound {
    fn default() -> Self {
        Self::new(2.0)
    }
}

impl Acquisition for UpperConfidenceBound {
    fn evaluate(&self, prediction: Prediction, _best: f64, _jitter: f64) -> f64 {
        prediction.mean + self.kappa * prediction.std_dev
    }
}

// ---------------------------------------------------------------------------
// Normal distribution helpers
// ---------------------------------------------------------------------------

/// Standard normal PDF.
fn norm_pdf(x: f64) -> f64 {
    const INV_SQRT_2PI: f64 = 0.398_942_280_401_432_7;
    INV_SQRT_2PI * (-0.5 * x * x).exp()
}

/// Standard normal CDF (Abramowitz-Stegun 26.2.17, |error| < 7.5e-8).
fn norm_cdf(x: f64) -> f64 {
    if x < -8.0 {
        return 0.0;
    }
    if x > 8.0 {
        return 1.0;
    }

    let t = 1.0 / (1.0 + 0.231_641_9 * x.abs());
    let poly = t
        * (0.319_381_530
            + t * (-0.356_563_782 + t * (1.781_477_937 + t * (-1.821_255_978 + t * 1.330_274_429))));
    let upper = 1.0 - norm_pdf(x) * poly;

    if x >= 0.0 { upper } else { 1.0 - upper }
}
