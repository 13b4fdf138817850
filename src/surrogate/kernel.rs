//! Nadaraya–Watson kernel regression surrogate.

use super::{Posterior, Prediction, Surrogate, standardization};
use crate::domain::Domain;
use crate::error::{Error, Result};
use crate::history::Observation;

const DEFAULT_BANDWIDTH: f64 = 0.15;

/// Kernel-smoothed estimator with distance-driven uncertainty.
///
/// The mean is a Gaussian-kernel weighted average of the observed scores,
/// shrunk toward the overall mean where the data is sparse. The standard
/// deviation is `sqrt(var * (1 - coverage))`, where `coverage` is the
/// largest kernel weight of any training point: zero on top of an
/// observation, the full score variance far from every observation.
///
/// Fitting is linear in the number of observations, which makes this a
/// cheap alternative to [`GaussianProcess`](super::GaussianProcess) for
/// long runs.
///
/// # Examples
///
/// ```
/// use smbo::prelude::*;
///
/// let optimizer = Optimizer::builder()
///     .surrogate(KernelRegression::with_bandwidth(0.2))
///     .build();
/// ```
#[derive(Clone, Copy, Debug)]
pub struct KernelRegression {
    bandwidth: f64,
}

impl KernelRegression {
    /// Creates an estimator with the default bandwidth (0.15, unit-cube units).
    #[must_use]
    pub fn new() -> Self {
        Self {
            bandwidth: DEFAULT_BANDWIDTH,
        }
    }

    /// Creates an estimator with the given bandwidth in unit-cube units.
    ///
    /// Non-positive or non-finite bandwidths fall back to the default.
    #[must_use]
    pub fn with_bandwidth(bandwidth: f64) -> Self {
        let bandwidth = if bandwidth.is_finite() && bandwidth > 0.0 {
            bandwidth
        } else {
            DEFAULT_BANDWIDTH
        };
        Self { bandwidth }
    }

    /// Returns the kernel bandwidth.
    #[must_use]
    pub fn bandwidth(&self) -> f64 {
        self.bandwidth
    }
}

impl Default for KernelRegression {
    fn default() -> Self {
        Self::new()
    }
}

struct KernelPosterior {
    domain: Domain,
    x_train: Vec<Vec<f64>>,
    y_train: Vec<f64>,
    bandwidth: f64,
    y_mean: f64,
    y_var: f64,
}

impl Surrogate for KernelRegression {
    fn fit(&self, domain: &Domain, observations: &[Observation]) -> Result<Box<dyn Posterior>> {
        if observations.is_empty() {
            return Err(Error::InsufficientData);
        }
        let y_train: Vec<f64> = observations.iter().map(|o| o.score).collect();
        if y_train.iter().any(|v| !v.is_finite()) {
            return Err(Error::SurrogateFit("non-finite score in training data".into()));
        }
        let (y_mean, y_std) = standardization(&y_train);

        Ok(Box::new(KernelPosterior {
            domain: domain.clone(),
            x_train: observations
                .iter()
                .map(|o| domain.to_unit(o.point.as_slice()))
                .collect(),
            y_train,
            bandwidth: self.bandwidth,
            y_mean,
            y_var: y_std * y_std,
        }))
    }
}

impl Posterior for KernelPosterior {
    fn predict(&self, point: &[f64]) -> Prediction {
        let x = self.domain.to_unit(point);
        let two_h_sq = 2.0 * self.bandwidth * self.bandwidth;

        let mut weight_sum = 0.0;
        let mut weighted = 0.0;
        let mut coverage: f64 = 0.0;
        for (xi, &yi) in self.x_train.iter().zip(&self.y_train) {
            let d_sq: f64 = x.iter().zip(xi).map(|(a, b)| (a - b).powi(2)).sum();
            let w = (-d_sq / two_h_sq).exp();
            weight_sum += w;
            weighted += w * yi;
            coverage = coverage.max(w);
        }

        let local = if weight_sum > f64::MIN_POSITIVE {
            weighted / weight_sum
        } else {
            self.y_mean
        };
        let mean = self.y_mean + coverage * (local - self.y_mean);
        let std_dev = (self.y_var * (1.0 - coverage)).max(0.0).sqrt();

        Prediction::new(mean, std_dev)
    }
}
