//! The [`Objective`] trait defines what gets optimized.
//!
//! For simple closures, pass them directly to
//! [`Optimizer::run`](crate::Optimizer::run):
//!
//! ```
//! use smbo::prelude::*;
//!
//! let domain = Domain::new(vec![Dimension::continuous("x", -5.0, 5.0)]).unwrap();
//! let optimizer = Optimizer::builder().minimize().max_iterations(5).seed(1).build();
//!
//! let outcome = optimizer
//!     .run(&domain, |p: &Point| Ok::<_, Error>((p[0] - 1.0).powi(2)))
//!     .unwrap();
//! assert_eq!(outcome.history.len(), 10);
//! ```
//!
//! For early stopping, implement [`Objective`] on a struct and override
//! [`before_evaluation`](Objective::before_evaluation):
//!
//! ```
//! use std::ops::ControlFlow;
//!
//! use smbo::prelude::*;
//!
//! struct StopAtTarget;
//!
//! impl Objective for StopAtTarget {
//!     type Error = Error;
//!
//!     fn evaluate(&self, point: &Point) -> Result<f64> {
//!         Ok(-(point[0] - 0.5).abs())
//!     }
//!
//!     fn before_evaluation(&self, history: &History) -> ControlFlow<()> {
//!         match history.best_score() {
//!             Some(best) if best > -0.01 => ControlFlow::Break(()),
//!             _ => ControlFlow::Continue(()),
//!         }
//!     }
//! }
//!
//! let domain = Domain::new(vec![Dimension::continuous("x", 0.0, 1.0)]).unwrap();
//! let outcome = Optimizer::builder()
//!     .max_iterations(200)
//!     .seed(3)
//!     .build()
//!     .run(&domain, StopAtTarget)
//!     .unwrap();
//! assert_eq!(outcome.termination, Termination::Interrupted);
//! assert!(outcome.best_score().unwrap() > -0.01);
//! ```

use core::ops::ControlFlow;

use crate::domain::Point;
use crate::history::History;

/// An expensive, deterministic black-box function to optimize.
///
/// Evaluation is synchronous and has no timeout; wrap the objective
/// yourself if you need one. Any error aborts the run and is reported
/// together with the observations collected so far.
pub trait Objective {
    /// The error type returned by [`evaluate`](Objective::evaluate).
    type Error: ToString;

    /// Evaluates the objective at `point`.
    ///
    /// `point` always lies in the run's domain, with integer values on
    /// discrete dimensions.
    ///
    /// # Errors
    ///
    /// Any error whose type implements `ToString`; the run stops and
    /// reports it as [`Error::ObjectiveEvaluation`](crate::Error::ObjectiveEvaluation).
    fn evaluate(&self, point: &Point) -> Result<f64, Self::Error>;

    /// Called before every evaluation, warmup included.
    ///
    /// Return `ControlFlow::Break(())` to stop the run; the outcome then
    /// holds the observations made so far.
    ///
    /// Default: always continues.
    fn before_evaluation(&self, _history: &History) -> ControlFlow<()> {
        ControlFlow::Continue(())
    }
}

impl<F, E> Objective for F
where
    F: Fn(&Point) -> Result<f64, E>,
    E: ToString,
{
    type Error = E;

    fn evaluate(&self, point: &Point) -> Result<f64, E> {
        self(point)
    }
}
