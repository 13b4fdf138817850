//! Gaussian Process surrogate with a Matérn 5/2 kernel.
//!
//! Inputs are mapped to the unit cube using the domain bounds, targets are
//! standardized, and the posterior is computed exactly through a Cholesky
//! factorization of `K + σ²I`. ARD lengthscales start from the
//! per-dimension standard deviation of the training inputs; a small grid of
//! floors is applied on top and the candidate with the highest log marginal
//! likelihood wins. The floors keep a tight cluster of inputs (random warmup
//! points that land close together) from collapsing the lengthscale.
//!
//! Predictive uncertainty is close to `sqrt(noise_variance)` (in target
//! units) at training points and grows to the prior standard deviation of
//! the targets far away from them.
//!
//! # Configuration
//!
//! | Option | Default | Description |
//! |--------|---------|-------------|
//! | `noise_variance` | 1e-6 | Added to the kernel diagonal (standardized units) |
//! | `max_train_points` | 100 | Most recent observations used for the fit |

use nalgebra::{DMatrix, DVector, Dyn, linalg::Cholesky};

use super::{Posterior, Prediction, Surrogate, standardization};
use crate::domain::Domain;
use crate::error::{Error, Result};
use crate::history::Observation;

/// Default observation noise variance.
const DEFAULT_NOISE_VAR: f64 = 1e-6;
/// Default cap on training points, bounding the O(n³) fit.
const DEFAULT_MAX_TRAIN_POINTS: usize = 100;
/// Lengthscale floors tried during the fit, in unit-cube coordinates.
const LENGTHSCALE_FLOORS: [f64; 6] = [0.05, 0.1, 0.2, 0.3, 0.5, 1.0];
/// How many times the noise is inflated when the factorization fails.
const MAX_JITTER_ATTEMPTS: usize = 5;
/// Precomputed √5 constant.
const SQRT_5: f64 = 2.236_067_977_499_79;

/// Gaussian Process regression surrogate.
///
/// # Examples
///
/// ```
/// use smbo::surrogate::{GaussianProcess, Surrogate};
///
/// let gp = GaussianProcess::builder()
///     .noise_variance(1e-4)
///     .max_train_points(50)
///     .build();
/// ```
#[derive(Clone, Debug)]
pub struct GaussianProcess {
    noise_variance: f64,
    max_train_points: usize,
}

impl GaussianProcess {
    /// Creates a GP with default settings.
    #[must_use]
    pub fn new() -> Self {
        Self {
            noise_variance: DEFAULT_NOISE_VAR,
            max_train_points: DEFAULT_MAX_TRAIN_POINTS,
        }
    }

    /// Creates a builder for configuring a `GaussianProcess`.
    #[must_use]
    pub fn builder() -> GaussianProcessBuilder {
        GaussianProcessBuilder::default()
    }
}

impl Default for GaussianProcess {
    fn default() -> Self {
        Self::new()
    }
}

/// Builder for configuring a [`GaussianProcess`].
#[derive(Debug, Clone, Default)]
pub struct GaussianProcessBuilder {
    noise_variance: Option<f64>,
    max_train_points: Option<usize>,
}

impl GaussianProcessBuilder {
    /// Sets the noise variance added to the kernel diagonal.
    ///
    /// Larger values make the GP smoother. Non-positive or non-finite
    /// values fall back to the default.
    ///
    /// Default: 1e-6 (near-noiseless).
    #[must_use]
    pub fn noise_variance(mut self, v: f64) -> Self {
        self.noise_variance = Some(v);
        self
    }

    /// Sets how many of the most recent observations are used for fitting.
    ///
    /// Default: 100. Zero is treated as one.
    #[must_use]
    pub fn max_train_points(mut self, n: usize) -> Self {
        self.max_train_points = Some(n);
        self
    }

    /// Builds the configured [`GaussianProcess`].
    #[must_use]
    pub fn build(self) -> GaussianProcess {
        let noise_variance = self
            .noise_variance
            .filter(|v| v.is_finite() && *v > 0.0)
            .unwrap_or(DEFAULT_NOISE_VAR);
        GaussianProcess {
            noise_variance,
            max_train_points: self
                .max_train_points
                .unwrap_or(DEFAULT_MAX_TRAIN_POINTS)
                .max(1),
        }
    }
}

/// A fitted GP ready for predictions.
struct GpPosterior {
    domain: Domain,
    /// Cholesky factor L of K + σ²I.
    cholesky: Cholesky<f64, Dyn>,
    /// α = (K + σ²I)^{-1} y.
    alpha: DVector<f64>,
    /// Training inputs in the unit cube.
    x_train: Vec<Vec<f64>>,
    lengthscales: Vec<f64>,
    y_mean: f64,
    y_std: f64,
}

/// One factorized lengthscale setting considered during a fit.
struct Candidate {
    log_likelihood: f64,
    lengthscales: Vec<f64>,
    cholesky: Cholesky<f64, Dyn>,
    alpha: DVector<f64>,
}

impl Surrogate for GaussianProcess {
    #[allow(clippy::cast_precision_loss)]
    fn fit(&self, domain: &Domain, observations: &[Observation]) -> Result<Box<dyn Posterior>> {
        if observations.is_empty() {
            return Err(Error::InsufficientData);
        }

        let start = observations.len().saturating_sub(self.max_train_points);
        let recent = &observations[start..];

        let x_train: Vec<Vec<f64>> = recent
            .iter()
            .map(|o| domain.to_unit(o.point.as_slice()))
            .collect();
        let y: Vec<f64> = recent.iter().map(|o| o.score).collect();
        if y.iter().any(|v| !v.is_finite()) {
            return Err(Error::SurrogateFit("non-finite score in training data".into()));
        }

        let (y_mean, y_std) = standardization(&y);
        let y_standardized = DVector::from_iterator(y.len(), y.iter().map(|&v| (v - y_mean) / y_std));

        let Candidate {
            lengthscales,
            cholesky,
            alpha,
            ..
        } = self.select_lengthscales(&x_train, &y_standardized, domain.len())?;
        trace_debug!(?lengthscales, "selected lengthscales");

        Ok(Box::new(GpPosterior {
            domain: domain.clone(),
            cholesky,
            alpha,
            x_train,
            lengthscales,
            y_mean,
            y_std,
        }))
    }
}

impl GaussianProcess {
    /// Picks the floored lengthscales with the highest marginal likelihood.
    fn select_lengthscales(
        &self,
        x_train: &[Vec<f64>],
        y_standardized: &DVector<f64>,
        n_dims: usize,
    ) -> Result<Candidate> {
        let spread = input_spread(x_train, n_dims);
        let mut best: Option<Candidate> = None;
        let mut previous: Option<Vec<f64>> = None;
        for floor in LENGTHSCALE_FLOORS {
            let lengthscales: Vec<f64> = spread.iter().map(|s| s.max(floor)).collect();
            if previous.as_ref() == Some(&lengthscales) {
                continue;
            }
            previous = Some(lengthscales.clone());

            let Some(cholesky) = self.factorize(x_train, &lengthscales) else {
                continue;
            };
            let alpha = cholesky.solve(y_standardized);
            let lml = log_marginal_likelihood(&cholesky, &alpha, y_standardized);
            if best
                .as_ref()
                .is_none_or(|b| lml > b.log_likelihood || b.log_likelihood.is_nan())
            {
                best = Some(Candidate {
                    log_likelihood: lml,
                    lengthscales,
                    cholesky,
                    alpha,
                });
            }
        }
        best.ok_or_else(|| {
            Error::SurrogateFit("kernel matrix not positive definite for any lengthscale".into())
        })
    }

    /// Factorizes `K + σ²I`, inflating the noise tenfold on each failure.
    fn factorize(&self, x_train: &[Vec<f64>], lengthscales: &[f64]) -> Option<Cholesky<f64, Dyn>> {
        let mut noise = self.noise_variance;
        for _ in 0..=MAX_JITTER_ATTEMPTS {
            if let Some(c) = Cholesky::new(kernel_matrix(x_train, lengthscales, noise)) {
                return Some(c);
            }
            trace_debug!(noise, "cholesky failed, inflating noise");
            noise *= 10.0;
        }
        None
    }
}

impl Posterior for GpPosterior {
    fn predict(&self, point: &[f64]) -> Prediction {
        let x = self.domain.to_unit(point);
        let k_star = DVector::from_fn(self.x_train.len(), |i, _| {
            matern52(&x, &self.x_train[i], &self.lengthscales)
        });

        // Mean: k*^T α
        let mean = k_star.dot(&self.alpha);

        // Variance: k(x*, x*) - k*^T (K + σ²I)^{-1} k*, with k(x*, x*) = 1
        let v = self.cholesky.solve(&k_star);
        let var = (1.0 - k_star.dot(&v)).max(0.0);

        Prediction::new(
            self.y_mean + mean * self.y_std,
            var.sqrt() * self.y_std,
        )
    }
}

/// Per-dimension population standard deviation of the inputs.
#[allow(clippy::cast_precision_loss)]
fn input_spread(x_train: &[Vec<f64>], n_dims: usize) -> Vec<f64> {
    let n = x_train.len() as f64;
    (0..n_dims)
        .map(|j| {
            let mean = x_train.iter().map(|x| x[j]).sum::<f64>() / n;
            let var = x_train.iter().map(|x| (x[j] - mean).powi(2)).sum::<f64>() / n;
            var.sqrt()
        })
        .collect()
}

/// `log p(y | X)` up to the constant: `-½ yᵀα - Σ ln L_ii`.
fn log_marginal_likelihood(
    cholesky: &Cholesky<f64, Dyn>,
    alpha: &DVector<f64>,
    y: &DVector<f64>,
) -> f64 {
    let log_det_half: f64 = cholesky.l_dirty().diagonal().iter().map(|d| d.ln()).sum();
    -0.5 * y.dot(alpha) - log_det_half
}

/// Matérn 5/2 kernel with ARD lengthscales and unit signal variance.
///
/// `k(x1, x2) = (1 + √5 r + 5/3 r²) exp(-√5 r)`
/// where `r = sqrt(Σ ((x1_i - x2_i) / l_i)²)`
fn matern52(x1: &[f64], x2: &[f64], lengthscales: &[f64]) -> f64 {
    let r_sq: f64 = x1
        .iter()
        .zip(x2)
        .zip(lengthscales)
        .map(|((a, b), l)| ((a - b) / l).powi(2))
        .sum();
    let sqrt5_r = SQRT_5 * r_sq.sqrt();
    (1.0 + sqrt5_r + 5.0 / 3.0 * r_sq) * (-sqrt5_r).exp()
}

/// Build the kernel matrix `K + σ²I`.
fn kernel_matrix(x: &[Vec<f64>], lengthscales: &[f64], noise_var: f64) -> DMatrix<f64> {
    let n = x.len();
    DMatrix::from_fn(n, n, |i, j| {
        let k = matern52(&x[i], &x[j], lengthscales);
        if i == j { k + noise_var } else { k }
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{Dimension, Point};

    fn unit_domain() -> Domain {
        Domain::new(vec![Dimension::continuous("x", 0.0, 1.0)]).unwrap()
    }

    fn observations(points: &[(f64, f64)]) -> Vec<Observation> {
        points
            .iter()
            .map(|&(x, y)| Observation::new(Point::new(vec![x]), y))
            .collect()
    }

    #[test]
    fn test_fit_empty_is_insufficient_data() {
        let err = GaussianProcess::new().fit(&unit_domain(), &[]).err();
        assert_eq!(err, Some(Error::InsufficientData));
    }

    #[test]
    fn test_interpolates_training_points() {
        let obs = observations(&[(0.1, 1.0), (0.5, -2.0), (0.9, 0.5)]);
        let post = GaussianProcess::new().fit(&unit_domain(), &obs).unwrap();
        for o in &obs {
            let p = post.predict(o.point.as_slice());
            assert!((p.mean - o.score).abs() < 1e-2, "{} vs {}", p.mean, o.score);
            assert!(p.std_dev < 1e-2);
        }
    }

    #[test]
    fn test_uncertainty_grows_away_from_data() {
        let domain = Domain::new(vec![Dimension::continuous("x", 0.0, 10.0)]).unwrap();
        let obs = observations(&[(1.0, 0.0), (1.5, 1.0), (2.0, 0.5)]);
        let post = GaussianProcess::new().fit(&domain, &obs).unwrap();

        let near = post.predict(&[1.5]).std_dev;
        let mid = post.predict(&[4.0]).std_dev;
        let far = post.predict(&[9.5]).std_dev;
        assert!(near < mid, "near {near} mid {mid}");
        assert!(mid <= far, "mid {mid} far {far}");
    }

    #[test]
    fn test_single_observation() {
        let obs = observations(&[(0.3, 2.0)]);
        let post = GaussianProcess::new().fit(&unit_domain(), &obs).unwrap();
        let p = post.predict(&[0.3]);
        assert!((p.mean - 2.0).abs() < 1e-3);
        assert!(post.predict(&[0.9]).std_dev > p.std_dev);
    }

    #[test]
    fn test_duplicate_points_fit() {
        let obs = observations(&[(0.4, 1.0), (0.4, 1.0), (0.4, 1.0), (0.7, 0.0)]);
        assert!(GaussianProcess::new().fit(&unit_domain(), &obs).is_ok());
    }

    #[test]
    fn test_max_train_points_keeps_most_recent() {
        let gp = GaussianProcess::builder().max_train_points(2).build();
        let obs = observations(&[(0.1, 100.0), (0.5, 1.0), (0.9, 2.0)]);
        let post = gp.fit(&unit_domain(), &obs).unwrap();
        // The dropped observation at 0.1 has no pull on the prediction there.
        assert!(post.predict(&[0.1]).mean < 10.0);
    }

    #[test]
    fn test_non_finite_scores_rejected() {
        let obs = observations(&[(0.1, f64::NAN)]);
        let err = GaussianProcess::new().fit(&unit_domain(), &obs).err();
        assert!(matches!(err, Some(Error::SurrogateFit(_))));
    }

    #[test]
    fn test_clustered_inputs_keep_lengthscale_floor() {
        let x_train: Vec<Vec<f64>> = vec![vec![0.0071], vec![0.0082], vec![0.02]];
        let y: Vec<f64> = x_train.iter().map(|x| -(x[0] - 0.7).powi(2)).collect();
        let (mean, std) = standardization(&y);
        let y = DVector::from_iterator(3, y.iter().map(|v| (v - mean) / std));

        let spread = input_spread(&x_train, 1)[0];
        let chosen = GaussianProcess::new()
            .select_lengthscales(&x_train, &y, 1)
            .unwrap();
        assert!(spread < 0.01);
        assert!(chosen.lengthscales[0] >= LENGTHSCALE_FLOORS[0]);
        assert!(chosen.log_likelihood.is_finite());
    }

    #[test]
    fn test_lengthscale_never_below_input_spread() {
        let x_train = vec![vec![0.1, 0.5], vec![0.5, 0.5], vec![0.9, 0.52]];
        let y = DVector::from_vec(vec![-1.0, 0.5, 0.5]);
        let spread = input_spread(&x_train, 2);
        let chosen = GaussianProcess::new()
            .select_lengthscales(&x_train, &y, 2)
            .unwrap();
        for (l, s) in chosen.lengthscales.iter().zip(&spread) {
            assert!(l >= s && *l >= LENGTHSCALE_FLOORS[0], "{l} vs spread {s}");
        }
    }

    #[test]
    fn test_matern_at_zero_distance_is_one() {
        assert!((matern52(&[0.2, 0.3], &[0.2, 0.3], &[0.5, 0.5]) - 1.0).abs() < 1e-12);
        assert!(matern52(&[0.0], &[1.0], &[0.1]) < 1e-3);
    }
}
