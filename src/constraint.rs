//! Constraint handlers
//!
//! A constraint handler tests feasibility of search points and, optionally,
//! repairs infeasible ones. Handlers are shared: one handler may back several
//! objective functions and serve concurrent evaluations, so they are handed out
//! as [`SharedConstraintHandler`] rather than owned copies.

use crate::error::{ObjectiveError, ObjectiveResult};
use crate::types::RealVector;
use ndarray::Zip;
use rand::Rng;
use serde::{Deserialize, Serialize};
use std::fmt::Debug;
use std::sync::Arc;

/// Feasibility oracle for points of type `P`.
pub trait ConstraintHandler<P>: Send + Sync + Debug {
    /// Whether `point` lies in the feasible region.
    fn is_feasible(&self, point: &P) -> bool;

    /// Whether [`ConstraintHandler::closest_feasible`] returns a repaired point.
    fn can_provide_closest_feasible(&self) -> bool {
        false
    }

    /// Closest feasible point to `point`, if this handler can repair points.
    fn closest_feasible(&self, _point: &P) -> Option<P> {
        None
    }
}

/// Shared, reference-counted constraint handler
pub type SharedConstraintHandler<P> = Arc<dyn ConstraintHandler<P>>;

/// Per-coordinate lower and upper bounds.
///
/// Bounds may be infinite, so half-bounded coordinates such as `[0, inf)` are
/// allowed. Deserialization goes through the same validation as `new`.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "BoxBounds")]
pub struct BoxConstraints {
    lower: RealVector,
    upper: RealVector,
}

#[derive(Deserialize)]
struct BoxBounds {
    lower: RealVector,
    upper: RealVector,
}

impl TryFrom<BoxBounds> for BoxConstraints {
    type Error = ObjectiveError;

    fn try_from(bounds: BoxBounds) -> ObjectiveResult<Self> {
        Self::new(bounds.lower, bounds.upper)
    }
}

impl BoxConstraints {
    pub fn new(lower: RealVector, upper: RealVector) -> ObjectiveResult<Self> {
        if lower.len() != upper.len() {
            return Err(ObjectiveError::InvalidBounds(format!(
                "lower has {} entries, upper has {}",
                lower.len(),
                upper.len()
            )));
        }
        for (i, (lo, hi)) in lower.iter().zip(upper.iter()).enumerate() {
            if lo.is_nan() || hi.is_nan() || lo > hi {
                return Err(ObjectiveError::InvalidBounds(format!(
                    "coordinate {}: lower {} exceeds upper {}",
                    i, lo, hi
                )));
            }
        }
        Ok(Self { lower, upper })
    }

    /// Same bounds `[lower, upper]` on every coordinate.
    pub fn uniform(dim: usize, lower: f64, upper: f64) -> ObjectiveResult<Self> {
        Self::new(
            RealVector::from_elem(dim, lower),
            RealVector::from_elem(dim, upper),
        )
    }

    pub fn dimension(&self) -> usize {
        self.lower.len()
    }

    pub fn lower(&self) -> &RealVector {
        &self.lower
    }

    pub fn upper(&self) -> &RealVector {
        &self.upper
    }

    /// Draw a point uniformly from the box.
    ///
    /// Coordinates whose range is unbounded or too wide to sample take the
    /// value closest to zero inside their bounds.
    pub fn sample<R: Rng>(&self, rng: &mut R) -> RealVector {
        let mut point = RealVector::zeros(self.dimension());
        for i in 0..self.dimension() {
            let (lo, hi) = (self.lower[i], self.upper[i]);
            point[i] = if lo < hi && (hi - lo).is_finite() {
                rng.gen_range(lo..hi)
            } else {
                0.0f64.clamp(lo, hi)
            };
        }
        point
    }

    /// Componentwise clamp into the box.
    pub fn clamp(&self, point: &RealVector) -> RealVector {
        let mut repaired = point.clone();
        Zip::from(&mut repaired)
            .and(&self.lower)
            .and(&self.upper)
            .for_each(|x, &lo, &hi| *x = (*x).clamp(lo, hi));
        repaired
    }
}

impl ConstraintHandler<RealVector> for BoxConstraints {
    fn is_feasible(&self, point: &RealVector) -> bool {
        point.len() == self.dimension()
            && point
                .iter()
                .zip(self.lower.iter().zip(self.upper.iter()))
                .all(|(x, (lo, hi))| x >= lo && x <= hi)
    }

    fn can_provide_closest_feasible(&self) -> bool {
        true
    }

    fn closest_feasible(&self, point: &RealVector) -> Option<RealVector> {
        if point.len() != self.dimension() {
            return None;
        }
        Some(self.clamp(point))
    }
}
