//! Surrogate models: cheap probabilistic stand-ins for the objective.
//!
//! A [`Surrogate`] is a fitting strategy; fitting it on observations yields
//! a [`Posterior`] that answers `predict(point) -> (mean, std_dev)`. The
//! optimization loop refits from the full history every iteration, so a
//! posterior is never updated in place.
//!
//! | Surrogate | Model | Notes |
//! |-----------|-------|-------|
//! | [`GaussianProcess`] | GP, Matérn 5/2 kernel, ARD lengthscales | Default. O(n³) fit, capped at 100 points |
//! | [`KernelRegression`] | Nadaraya–Watson, Gaussian kernel | O(n) fit, cheap, cruder uncertainty |
//!
//! Custom surrogates (random forests, ensembles) implement the same pair of
//! traits:
//!
//! ```
//! use smbo::Result;
//! use smbo::history::Observation;
//! use smbo::surrogate::{Posterior, Prediction, Surrogate};
//! use smbo::{Domain, Error};
//!
//! /// Predicts the mean score everywhere with unit uncertainty.
//! struct Flat;
//!
//! struct FlatPosterior(f64);
//!
//! impl Posterior for FlatPosterior {
//!     fn predict(&self, _point: &[f64]) -> Prediction {
//!         Prediction::new(self.0, 1.0)
//!     }
//! }
//!
//! impl Surrogate for Flat {
//!     fn fit(&self, _domain: &Domain, observations: &[Observation]) -> Result<Box<dyn Posterior>> {
//!         if observations.is_empty() {
//!             return Err(Error::InsufficientData);
//!         }
//!         let mean = observations.iter().map(|o| o.score).sum::<f64>() / observations.len() as f64;
//!         Ok(Box::new(FlatPosterior(mean)))
//!     }
//! }
//! ```

mod gp;
mod kernel;

pub use gp::{GaussianProcess, GaussianProcessBuilder};
pub use kernel::KernelRegression;

use crate::domain::Domain;
use crate::error::Result;
use crate::history::Observation;

/// Lower bound on every predicted standard deviation.
///
/// Keeps acquisition functions away from division by zero at training points.
pub const MIN_STD_DEV: f64 = 1e-9;

/// Predictive mean and standard deviation at a point.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Prediction {
    /// Predicted objective value.
    pub mean: f64,
    /// Predictive standard deviation, at least [`MIN_STD_DEV`].
    pub std_dev: f64,
}

impl Prediction {
    /// Creates a prediction, clamping `std_dev` to [`MIN_STD_DEV`].
    ///
    /// A NaN `std_dev` is treated as the floor.
    #[must_use]
    pub fn new(mean: f64, std_dev: f64) -> Self {
        Self {
            mean,
            std_dev: if std_dev.is_nan() {
                MIN_STD_DEV
            } else {
                std_dev.max(MIN_STD_DEV)
            },
        }
    }
}

/// A fitted surrogate, able to predict at arbitrary points.
pub trait Posterior {
    /// Predicts the objective at `point` (domain coordinates, domain order).
    fn predict(&self, point: &[f64]) -> Prediction;
}

/// A strategy for fitting a [`Posterior`] to observations.
///
/// Implementations must be `Send + Sync` so an
/// [`Optimizer`](crate::Optimizer) can be shared across threads.
pub trait Surrogate: Send + Sync {
    /// Fits a posterior to `observations`, whose points lie in `domain`.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InsufficientData`](crate::Error::InsufficientData)
    /// if `observations` is empty, or
    /// [`Error::SurrogateFit`](crate::Error::SurrogateFit) if the model
    /// cannot be fitted.
    fn fit(&self, domain: &Domain, observations: &[Observation]) -> Result<Box<dyn Posterior>>;
}

/// Sample mean and standard deviation of `values` (n − 1 denominator).
///
/// A single value (or a constant set) gets a standard deviation of 1 so
/// dividing by it is always safe.
#[allow(clippy::cast_precision_loss)]
pub(crate) fn standardization(values: &[f64]) -> (f64, f64) {
    let n = values.len();
    if n == 0 {
        return (0.0, 1.0);
    }
    let mean = values.iter().sum::<f64>() / n as f64;
    if n == 1 {
        return (mean, 1.0);
    }
    let var = values.iter().map(|&v| (v - mean).powi(2)).sum::<f64>() / (n - 1) as f64;
    let std = var.sqrt();
    if std < 1e-10 { (mean, 1.0) } else { (mean, std) }
}
