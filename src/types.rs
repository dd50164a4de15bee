//! Core type definitions: search points, result types and derivative shapes
//!
//! The first-order derivative type is chosen from the result type at compile
//! time: a scalar objective has a gradient vector, a vector-valued
//! (multi-objective) function has a Jacobian matrix.

use ndarray::{Array1, Array2};
use serde::{Deserialize, Serialize};
use std::fmt::Debug;

/// Dense real vector
pub type RealVector = Array1<f64>;

/// Dense real matrix
pub type RealMatrix = Array2<f64>;

/// A point of the search space.
pub trait SearchPoint: Clone + Debug {
    /// Number of variables in this point.
    fn dimension(&self) -> usize;
}

impl SearchPoint for RealVector {
    fn dimension(&self) -> usize {
        self.len()
    }
}

impl SearchPoint for Vec<f64> {
    fn dimension(&self) -> usize {
        self.len()
    }
}

/// The codomain of an objective function.
pub trait ObjectiveValue: Clone + Debug {
    /// Gradient for scalar results, Jacobian for vector results.
    type FirstOrderDerivative: Clone + Debug;

    /// Number of objective components carried by this value.
    fn num_objectives(&self) -> usize;

    /// Quiet-NaN result with `num_objectives` components.
    fn undefined(num_objectives: usize) -> Self;

    /// NaN-filled first derivative for `num_objectives` outputs over
    /// `num_variables` inputs.
    fn undefined_derivative(num_objectives: usize, num_variables: usize)
        -> Self::FirstOrderDerivative;

    /// `(rows, cols)` of a first derivative. A gradient reports `(1, n)`.
    fn derivative_shape(derivative: &Self::FirstOrderDerivative) -> (usize, usize);

    /// True if any component is NaN.
    fn is_undefined(&self) -> bool;
}

impl ObjectiveValue for f64 {
    type FirstOrderDerivative = RealVector;

    fn num_objectives(&self) -> usize {
        1
    }

    fn undefined(_num_objectives: usize) -> Self {
        f64::NAN
    }

    fn undefined_derivative(_num_objectives: usize, num_variables: usize) -> RealVector {
        Array1::from_elem(num_variables, f64::NAN)
    }

    fn derivative_shape(derivative: &RealVector) -> (usize, usize) {
        (1, derivative.len())
    }

    fn is_undefined(&self) -> bool {
        self.is_nan()
    }
}

impl ObjectiveValue for RealVector {
    type FirstOrderDerivative = RealMatrix;

    fn num_objectives(&self) -> usize {
        self.len()
    }

    fn undefined(num_objectives: usize) -> Self {
        Array1::from_elem(num_objectives, f64::NAN)
    }

    fn undefined_derivative(num_objectives: usize, num_variables: usize) -> RealMatrix {
        Array2::from_elem((num_objectives, num_variables), f64::NAN)
    }

    fn derivative_shape(derivative: &RealMatrix) -> (usize, usize) {
        derivative.dim()
    }

    fn is_undefined(&self) -> bool {
        self.iter().any(|v| v.is_nan())
    }
}

/// First-order derivative type of result type `V`.
pub type FirstOrderDerivative<V> = <V as ObjectiveValue>::FirstOrderDerivative;

/// First derivative together with the Hessian.
///
/// The Hessian is square with the dimension of the search point.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct SecondDerivative<D> {
    pub gradient: D,
    pub hessian: RealMatrix,
}

impl<D> SecondDerivative<D> {
    pub fn new(gradient: D, hessian: RealMatrix) -> Self {
        Self { gradient, hessian }
    }
}

impl<D: Clone + Debug> SecondDerivative<D> {
    /// NaN-filled second derivative for result type `V`.
    pub fn undefined<V>(num_objectives: usize, num_variables: usize) -> Self
    where
        V: ObjectiveValue<FirstOrderDerivative = D>,
    {
        Self {
            gradient: V::undefined_derivative(num_objectives, num_variables),
            hessian: Array2::from_elem((num_variables, num_variables), f64::NAN),
        }
    }
}
