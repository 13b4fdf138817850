#![forbid(unsafe_code)]
#![deny(clippy::all)]
#![deny(unreachable_pub)]
#![deny(clippy::correctness)]
#![deny(clippy::suspicious)]
#![deny(clippy::style)]
#![deny(clippy::complexity)]
#![deny(clippy::perf)]
#![deny(clippy::pedantic)]
#![deny(clippy::std_instead_of_core)]

//! Sequential model-based (Bayesian) optimization for expensive black-box
//! objectives over box-bounded domains of continuous and discrete
//! dimensions. Typical use: tuning a handful of hyperparameters where each
//! evaluation (a cross-validated model fit, a simulation) is costly.
//!
//! # Getting Started
//!
//! ```
//! use smbo::prelude::*;
//!
//! let domain = Domain::new(vec![Dimension::continuous("x", 0.0, 1.0)]).unwrap();
//!
//! let outcome = Optimizer::builder()
//!     .warmup_count(3)
//!     .max_iterations(10)
//!     .seed(42)
//!     .build()
//!     .run(&domain, |p: &Point| Ok::<_, Error>(-(p[0] - 0.7).powi(2)))
//!     .unwrap();
//!
//! let best = outcome.best().unwrap();
//! println!("x = {:.4}, f(x) = {:.5}", best.point[0], best.score);
//! ```
//!
//! # Core Concepts
//!
//! | Type | Role |
//! |------|------|
//! | [`Domain`] | Ordered continuous / discrete dimensions defining the search box. |
//! | [`Objective`] | The expensive function; any `Fn(&Point) -> Result<f64, E>` works. |
//! | [`Surrogate`](surrogate::Surrogate) | Probabilistic model fitted to the history ([`GaussianProcess`](surrogate::GaussianProcess), [`KernelRegression`](surrogate::KernelRegression)). |
//! | [`Acquisition`](acquisition::Acquisition) | Scores candidates from the surrogate ([`ExpectedImprovement`](acquisition::ExpectedImprovement) by default). |
//! | [`CandidateProposer`](proposer::CandidateProposer) | Random multi-start maximizer of the acquisition. |
//! | [`Optimizer`] | Warmup, then fit → propose → evaluate until the budget is spent. |
//! | [`RandomSearch`] | Uniform random baseline with the same result surface. |
//! | [`Outcome`] / [`RunError`] | Full [`History`](history::History) plus the best observation, or the failure with the partial history. |
//!
//! # Feature Flags
//!
//! | Flag | What it enables | Default |
//! |------|----------------|---------|
//! | `serde` | `Serialize`/`Deserialize` on public types, [`Outcome::save`]/[`Outcome::load`], JSON domain files | off |
//! | `tracing` | Structured log events via [`tracing`](https://docs.rs/tracing) at run start, warmup end, new best, abort | off |

/// Emit a `tracing::info!` event when the `tracing` feature is enabled.
/// No-op otherwise.
#[cfg(feature = "tracing")]
macro_rules! trace_info {
    ($($arg:tt)*) => { tracing::info!($($arg)*) };
}

#[cfg(not(feature = "tracing"))]
macro_rules! trace_info {
    ($($arg:tt)*) => {};
}

/// Emit a `tracing::debug!` event when the `tracing` feature is enabled.
/// No-op otherwise.
#[cfg(feature = "tracing")]
macro_rules! trace_debug {
    ($($arg:tt)*) => { tracing::debug!($($arg)*) };
}

#[cfg(not(feature = "tracing"))]
macro_rules! trace_debug {
    ($($arg:tt)*) => {};
}

pub mod acquisition;
mod domain;
mod error;
pub mod history;
mod objective;
mod optimizer;
pub mod proposer;
mod rng_util;
pub mod surrogate;
mod types;

pub use domain::{Dimension, DimensionKind, Domain, Point};
pub use error::{Error, Result, RunError};
pub use history::{History, Observation};
pub use objective::Objective;
pub use optimizer::{Optimizer, OptimizerBuilder, Outcome, RandomSearch, RunConfig, Termination};
pub use types::Direction;

/// Convenient wildcard import for the most common types.
///
/// ```
/// use smbo::prelude::*;
/// ```
pub mod prelude {
    pub use crate::acquisition::{
        Acquisition, ExpectedImprovement, ProbabilityOfImprovement, UpperConfidenceBound,
    };
    pub use crate::domain::{Dimension, DimensionKind, Domain, Point};
    pub use crate::error::{Error, Result, RunError};
    pub use crate::history::{History, Observation};
    pub use crate::objective::Objective;
    pub use crate::optimizer::{
        Optimizer, OptimizerBuilder, Outcome, RandomSearch, RunConfig, Termination,
    };
    pub use crate::proposer::CandidateProposer;
    pub use crate::surrogate::{GaussianProcess, KernelRegression, Posterior, Prediction, Surrogate};
    pub use crate::types::Direction;
}
