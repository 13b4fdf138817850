//! Search domain: ordered, box-bounded dimensions and the points inside them.
//!
//! A [`Domain`] is an ordered list of [`Dimension`]s. The order is fixed for
//! the lifetime of a run and defines the coordinate order of every [`Point`].
//!
//! # Example
//!
//! ```
//! use smbo::{Dimension, Domain};
//!
//! let domain = Domain::new(vec![
//!     Dimension::continuous("learning_rate", 0.01, 0.3),
//!     Dimension::discrete("max_depth", 2, 10),
//!     Dimension::discrete("n_estimators", 50, 500),
//! ])
//! .unwrap();
//!
//! assert_eq!(domain.len(), 3);
//! assert_eq!(domain.index_of("max_depth"), Some(1));
//! ```

use core::ops::Index;
use std::collections::HashSet;

use crate::error::{Error, Result};
use crate::rng_util;

/// The kind and bounds of a single dimension.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum DimensionKind {
    /// A real interval `[low, high]`.
    Continuous {
        /// Lower bound (inclusive).
        low: f64,
        /// Upper bound (inclusive).
        high: f64,
    },
    /// An integer range `low..=high`.
    Discrete {
        /// Lower bound (inclusive).
        low: i64,
        /// Upper bound (inclusive).
        high: i64,
    },
}

/// A named dimension of the search domain.
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(
    feature = "serde",
    derive(serde::Serialize, serde::Deserialize),
    serde(try_from = "wire::DimensionSpec", into = "wire::DimensionSpec")
)]
pub struct Dimension {
    name: String,
    kind: DimensionKind,
}

impl Dimension {
    /// Creates a continuous dimension over `[low, high]`.
    ///
    /// Bounds are checked when the dimension is added to a [`Domain`].
    pub fn continuous(name: impl Into<String>, low: f64, high: f64) -> Self {
        Self {
            name: name.into(),
            kind: DimensionKind::Continuous { low, high },
        }
    }

    /// Creates a discrete dimension over the integers `low..=high`.
    pub fn discrete(name: impl Into<String>, low: i64, high: i64) -> Self {
        Self {
            name: name.into(),
            kind: DimensionKind::Discrete { low, high },
        }
    }

    /// Returns the dimension's name.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Returns the dimension's kind and bounds.
    #[must_use]
    pub fn kind(&self) -> DimensionKind {
        self.kind
    }

    /// Returns `true` for integer-valued dimensions.
    #[must_use]
    pub fn is_discrete(&self) -> bool {
        matches!(self.kind, DimensionKind::Discrete { .. })
    }

    /// Returns the bounds as reals.
    #[must_use]
    #[allow(clippy::cast_precision_loss)]
    pub fn bounds(&self) -> (f64, f64) {
        match self.kind {
            DimensionKind::Continuous { low, high } => (low, high),
            DimensionKind::Discrete { low, high } => (low as f64, high as f64),
        }
    }

    /// Returns `true` if `value` lies within bounds (and is an integer for
    /// discrete dimensions).
    #[must_use]
    pub fn contains(&self, value: f64) -> bool {
        let (low, high) = self.bounds();
        let in_range = value >= low && value <= high;
        if self.is_discrete() {
            in_range && value.fract() == 0.0
        } else {
            in_range
        }
    }

    /// Clamps `value` into bounds, rounding to the nearest integer for
    /// discrete dimensions.
    #[must_use]
    pub fn snap(&self, value: f64) -> f64 {
        let (low, high) = self.bounds();
        let value = if self.is_discrete() {
            value.round()
        } else {
            value
        };
        value.clamp(low, high)
    }

    /// Maps `value` to `[0, 1]` relative to this dimension's bounds.
    pub(crate) fn to_unit(&self, value: f64) -> f64 {
        let (low, high) = self.bounds();
        // Halved so `high - low` stays finite for bounds near `f64::MAX`.
        (value * 0.5 - low * 0.5) / (high * 0.5 - low * 0.5)
    }

    fn validate(&self) -> Result<()> {
        let invalid = |reason: String| Error::InvalidDomain {
            name: self.name.clone(),
            reason,
        };
        if self.name.trim().is_empty() {
            return Err(invalid("name must not be empty".into()));
        }
        match self.kind {
            DimensionKind::Continuous { low, high } => {
                if !low.is_finite() || !high.is_finite() {
                    return Err(invalid(format!(
                        "bounds must be finite, got [{low}, {high}]"
                    )));
                }
                if low >= high {
                    return Err(invalid(format!(
                        "lower bound {low} must be less than upper bound {high}"
                    )));
                }
            }
            DimensionKind::Discrete { low, high } => {
                if low >= high {
                    return Err(invalid(format!(
                        "lower bound {low} must be less than upper bound {high}"
                    )));
                }
            }
        }
        Ok(())
    }

    #[allow(clippy::cast_precision_loss)]
    fn sample(&self, rng: &mut fastrand::Rng) -> f64 {
        match self.kind {
            DimensionKind::Continuous { low, high } => rng_util::f64_range(rng, low, high),
            DimensionKind::Discrete { low, high } => rng.i64(low..=high) as f64,
        }
    }
}

/// An ordered, validated list of dimensions.
#[derive(Clone, Debug, Default, PartialEq)]
#[cfg_attr(
    feature = "serde",
    derive(serde::Serialize, serde::Deserialize),
    serde(try_from = "Vec<Dimension>", into = "Vec<Dimension>")
)]
pub struct Domain {
    dimensions: Vec<Dimension>,
}

impl Domain {
    /// Creates a domain from an ordered list of dimensions.
    ///
    /// An empty list is accepted here; runs and proposals reject it with
    /// [`Error::EmptyDomain`].
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidDomain`] if a dimension has non-finite bounds,
    /// `low >= high`, an empty name, or a name used by an earlier dimension.
    pub fn new(dimensions: Vec<Dimension>) -> Result<Self> {
        let mut seen = HashSet::with_capacity(dimensions.len());
        for dim in &dimensions {
            dim.validate()?;
            if !seen.insert(dim.name.as_str()) {
                return Err(Error::InvalidDomain {
                    name: dim.name.clone(),
                    reason: "duplicate dimension name".into(),
                });
            }
        }
        Ok(Self { dimensions })
    }

    /// Returns the dimensions in coordinate order.
    #[must_use]
    pub fn dimensions(&self) -> &[Dimension] {
        &self.dimensions
    }

    /// Returns the number of dimensions.
    #[must_use]
    pub fn len(&self) -> usize {
        self.dimensions.len()
    }

    /// Returns `true` if the domain has no dimensions.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.dimensions.is_empty()
    }

    /// Returns the coordinate index of the dimension called `name`.
    #[must_use]
    pub fn index_of(&self, name: &str) -> Option<usize> {
        self.dimensions.iter().position(|d| d.name == name)
    }

    /// Looks up the coordinate of `point` for the dimension called `name`.
    #[must_use]
    pub fn value(&self, point: &Point, name: &str) -> Option<f64> {
        self.index_of(name).and_then(|i| point.get(i))
    }

    /// Returns `true` if `point` has one in-bounds coordinate per dimension.
    #[must_use]
    pub fn contains(&self, point: &Point) -> bool {
        point.len() == self.len()
            && self
                .dimensions
                .iter()
                .zip(point.iter())
                .all(|(d, &v)| d.contains(v))
    }

    /// Builds a point from raw coordinates, clamping each into bounds and
    /// rounding discrete coordinates to the nearest integer.
    ///
    /// Missing trailing coordinates take the dimension's lower bound;
    /// surplus coordinates are dropped.
    #[must_use]
    pub fn snap(&self, coords: &[f64]) -> Point {
        Point(
            self.dimensions
                .iter()
                .enumerate()
                .map(|(i, d)| coords.get(i).map_or(d.bounds().0, |&v| d.snap(v)))
                .collect(),
        )
    }

    /// Draws a point uniformly at random, respecting bounds and types.
    pub(crate) fn sample(&self, rng: &mut fastrand::Rng) -> Point {
        Point(self.dimensions.iter().map(|d| d.sample(rng)).collect())
    }

    /// Maps a point into the unit cube.
    pub(crate) fn to_unit(&self, coords: &[f64]) -> Vec<f64> {
        self.dimensions
            .iter()
            .zip(coords)
            .map(|(d, &v)| d.to_unit(v))
            .collect()
    }
}

impl TryFrom<Vec<Dimension>> for Domain {
    type Error = Error;

    fn try_from(dimensions: Vec<Dimension>) -> Result<Self> {
        Self::new(dimensions)
    }
}

impl From<Domain> for Vec<Dimension> {
    fn from(domain: Domain) -> Self {
        domain.dimensions
    }
}

/// A location in the domain: one coordinate per dimension, in domain order.
#[derive(Clone, Debug, Default, PartialEq)]
#[cfg_attr(
    feature = "serde",
    derive(serde::Serialize, serde::Deserialize),
    serde(transparent)
)]
pub struct Point(Vec<f64>);

impl Point {
    /// Creates a point from raw coordinates without checking bounds.
    ///
    /// Use [`Domain::snap`] to build a point that is guaranteed to be valid.
    #[must_use]
    pub fn new(coords: Vec<f64>) -> Self {
        Self(coords)
    }

    /// Returns the number of coordinates.
    #[must_use]
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Returns `true` if the point has no coordinates.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Returns coordinate `index`, if present.
    #[must_use]
    pub fn get(&self, index: usize) -> Option<f64> {
        self.0.get(index).copied()
    }

    /// Iterates over the coordinates.
    pub fn iter(&self) -> core::slice::Iter<'_, f64> {
        self.0.iter()
    }

    /// Returns the coordinates as a slice.
    #[must_use]
    pub fn as_slice(&self) -> &[f64] {
        &self.0
    }

    /// Consumes the point and returns its coordinates.
    #[must_use]
    pub fn into_inner(self) -> Vec<f64> {
        self.0
    }
}

impl Index<usize> for Point {
    type Output = f64;

    fn index(&self, index: usize) -> &f64 {
        &self.0[index]
    }
}

impl AsRef<[f64]> for Point {
    fn as_ref(&self) -> &[f64] {
        &self.0
    }
}

impl From<Vec<f64>> for Point {
    fn from(coords: Vec<f64>) -> Self {
        Self(coords)
    }
}

impl<'a> IntoIterator for &'a Point {
    type Item = &'a f64;
    type IntoIter = core::slice::Iter<'a, f64>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.iter()
    }
}

/// Wire form of a dimension: `{name, kind, lower, upper}`.
#[cfg(feature = "serde")]
mod wire {
    use serde::{Deserialize, Serialize};

    use super::{Dimension, DimensionKind};
    use crate::error::Error;

    #[derive(Serialize, Deserialize)]
    #[serde(rename_all = "lowercase")]
    pub(super) enum Kind {
        Continuous,
        Discrete,
    }

    #[derive(Serialize, Deserialize)]
    pub(super) struct DimensionSpec {
        name: String,
        kind: Kind,
        lower: f64,
        upper: f64,
    }

    impl TryFrom<DimensionSpec> for Dimension {
        type Error = Error;

        #[allow(clippy::cast_possible_truncation)]
        fn try_from(spec: DimensionSpec) -> Result<Self, Error> {
            match spec.kind {
                Kind::Continuous => Ok(Dimension::continuous(spec.name, spec.lower, spec.upper)),
                Kind::Discrete => {
                    let integral = |v: f64| v.is_finite() && v.fract() == 0.0;
                    if !integral(spec.lower) || !integral(spec.upper) {
                        return Err(Error::InvalidDomain {
                            name: spec.name,
                            reason: format!(
                                "discrete bounds must be integers, got [{}, {}]",
                                spec.lower, spec.upper
                            ),
                        });
                    }
                    Ok(Dimension::discrete(
                        spec.name,
                        spec.lower as i64,
                        spec.upper as i64,
                    ))
                }
            }
        }
    }

    impl From<Dimension> for DimensionSpec {
        #[allow(clippy::cast_precision_loss)]
        fn from(dim: Dimension) -> Self {
            let (kind, lower, upper) = match dim.kind {
                DimensionKind::Continuous { low, high } => (Kind::Continuous, low, high),
                DimensionKind::Discrete { low, high } => (Kind::Discrete, low as f64, high as f64),
            };
            Self {
                name: dim.name,
                kind,
                lower,
                upper,
            }
        }
    }
}
