//! Observations and the append-only history of a run.

use crate::domain::Point;
use crate::types::Direction;

/// Cap on up-front allocation for a run's history.
const MAX_PREALLOCATED: usize = 1024;

/// A single evaluated point and the score the objective returned for it.
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Observation {
    /// The evaluated point.
    pub point: Point,
    /// The objective's score, as returned (not sign-flipped).
    pub score: f64,
}

impl Observation {
    /// Creates a new observation.
    #[must_use]
    pub fn new(point: Point, score: f64) -> Self {
        Self { point, score }
    }
}

/// Ordered record of every observation made during a run.
///
/// The history only ever grows, by one entry per evaluation, and only the
/// optimization loop appends to it. Everything else reads it.
///
/// Scores are stored as the objective returned them; [`History::best`]
/// interprets them according to the run's [`Direction`].
#[derive(Clone, Debug, Default, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct History {
    direction: Direction,
    observations: Vec<Observation>,
}

impl History {
    /// Creates an empty history for a run in `direction`.
    #[must_use]
    pub fn new(direction: Direction) -> Self {
        Self {
            direction,
            observations: Vec::new(),
        }
    }

    /// Preallocates for `capacity` observations, capped at `MAX_PREALLOCATED`.
    pub(crate) fn with_capacity(direction: Direction, capacity: usize) -> Self {
        Self {
            direction,
            observations: Vec::with_capacity(capacity.min(MAX_PREALLOCATED)),
        }
    }

    pub(crate) fn push(&mut self, observation: Observation) {
        self.observations.push(observation);
    }

    /// Returns the run's optimization direction.
    #[must_use]
    pub fn direction(&self) -> Direction {
        self.direction
    }

    /// Returns the number of observations.
    #[must_use]
    pub fn len(&self) -> usize {
        self.observations.len()
    }

    /// Returns `true` if nothing has been evaluated yet.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.observations.is_empty()
    }

    /// Returns all observations in evaluation order.
    #[must_use]
    pub fn observations(&self) -> &[Observation] {
        &self.observations
    }

    /// Iterates over observations in evaluation order.
    pub fn iter(&self) -> core::slice::Iter<'_, Observation> {
        self.observations.iter()
    }

    /// Returns the most recent observation.
    #[must_use]
    pub fn last(&self) -> Option<&Observation> {
        self.observations.last()
    }

    /// Returns the best observation so far. Ties go to the earliest.
    #[must_use]
    pub fn best(&self) -> Option<&Observation> {
        self.observations.iter().fold(None, |best, obs| match best {
            Some(b) if !self.direction.is_better(obs.score, b.score) => Some(b),
            _ => Some(obs),
        })
    }

    /// Returns the best score so far.
    #[must_use]
    pub fn best_score(&self) -> Option<f64> {
        self.best().map(|o| o.score)
    }

    /// Returns the running best score after each evaluation.
    ///
    /// This is the convergence curve usually plotted to compare search
    /// strategies. It is monotone in the run's direction.
    #[must_use]
    pub fn best_trajectory(&self) -> Vec<f64> {
        let mut trajectory = Vec::with_capacity(self.observations.len());
        for obs in &self.observations {
            let next = match trajectory.last() {
                Some(&best) if !self.direction.is_better(obs.score, best) => best,
                _ => obs.score,
            };
            trajectory.push(next);
        }
        trajectory
    }
}

impl<'a> IntoIterator for &'a History {
    type Item = &'a Observation;
    type IntoIter = core::slice::Iter<'a, Observation>;

    fn into_iter(self) -> Self::IntoIter {
        self.observations.iter()
    }
}
