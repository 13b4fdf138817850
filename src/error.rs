use crate::history::History;

/// Errors produced while configuring or running an optimization.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum Error {
    /// Returned when a dimension has malformed bounds or a bad name.
    #[error("invalid domain: dimension '{name}': {reason}")]
    InvalidDomain {
        /// The name of the offending dimension.
        name: String,
        /// Why the dimension was rejected.
        reason: String,
    },

    /// Returned when a surrogate is fitted without any observations.
    #[error("surrogate fit requires at least one observation")]
    InsufficientData,

    /// Returned when the domain has no dimensions to search.
    #[error("domain has no dimensions")]
    EmptyDomain,

    /// Returned when the external objective fails (or yields a non-finite score).
    #[error("objective evaluation #{evaluation} failed: {message}")]
    ObjectiveEvaluation {
        /// One-based index of the failed evaluation within the run.
        evaluation: usize,
        /// The objective's error message.
        message: String,
    },

    /// Returned when the surrogate cannot be fitted to the observations.
    #[error("surrogate fit failed: {0}")]
    SurrogateFit(String),

    /// Returned when a run configuration value is out of range.
    #[error("invalid configuration: {0}")]
    InvalidConfig(&'static str),
}

pub type Result<T> = core::result::Result<T, Error>;

/// A failed run together with the observations collected before the failure.
///
/// Nothing recorded before the failure is discarded: `history` holds every
/// successful evaluation in order, and no placeholder is appended for the
/// evaluation that failed.
///
/// # Examples
///
/// ```
/// use smbo::prelude::*;
///
/// let domain = Domain::new(vec![Dimension::continuous("x", 0.0, 1.0)]).unwrap();
/// let optimizer = Optimizer::builder().warmup_count(3).max_iterations(2).seed(7).build();
///
/// let err = optimizer
///     .run(&domain, |p: &Point| {
///         if p[0] > 2.0 { Ok(0.0) } else { Err("simulation diverged") }
///     })
///     .unwrap_err();
///
/// assert!(matches!(err.error, Error::ObjectiveEvaluation { evaluation: 1, .. }));
/// assert!(err.history.is_empty());
/// ```
#[derive(Debug, Clone, thiserror::Error)]
#[error("optimization aborted after {} evaluations: {error}", .history.len())]
pub struct RunError {
    /// The error that stopped the run.
    #[source]
    pub error: Error,
    /// Observations recorded before the failure.
    pub history: History,
}

impl RunError {
    pub(crate) fn new(error: Error, history: History) -> Self {
        Self { error, history }
    }

    /// Consumes the error and returns the partial history.
    #[must_use]
    pub fn into_history(self) -> History {
        self.history
    }
}
