//! Objective functions built from closures
//!
//! [`SimpleObjective`] wraps plain closures over [`RealVector`] points. Each
//! builder step that supplies an operation also advertises the matching
//! capability flag, so the flags never claim more than the closures provide.

use crate::constraint::{BoxConstraints, SharedConstraintHandler};
use crate::error::{ObjectiveError, ObjectiveResult};
use crate::features::Features;
use crate::objective::{ObjectiveBase, ObjectiveFunction};
use crate::types::{FirstOrderDerivative, ObjectiveValue, RealMatrix, RealVector, SecondDerivative};
use rand::thread_rng;
use std::fmt;
use std::sync::Arc;

type ValueFn<V> = Box<dyn Fn(&RealVector) -> V + Send + Sync>;
type DerivativeFn<V> = Box<dyn Fn(&RealVector) -> FirstOrderDerivative<V> + Send + Sync>;
type HessianFn = Box<dyn Fn(&RealVector) -> RealMatrix + Send + Sync>;

/// An objective function defined by closures.
///
/// Closures are `Fn + Send + Sync`, so every instance advertises
/// `IS_THREAD_SAFE` in addition to `HAS_VALUE`.
pub struct SimpleObjective<V: ObjectiveValue = f64> {
    base: ObjectiveBase,
    dim: usize,
    num_objectives: usize,
    value: ValueFn<V>,
    derivative: Option<DerivativeFn<V>>,
    hessian: Option<HessianFn>,
    bounds: Option<Arc<BoxConstraints>>,
    start: Option<RealVector>,
}

impl SimpleObjective<f64> {
    /// Single-objective function over `dim` variables.
    pub fn new<F>(name: impl Into<String>, dim: usize, value: F) -> Self
    where
        F: Fn(&RealVector) -> f64 + Send + Sync + 'static,
    {
        Self::from_parts(name, dim, 1, Box::new(value))
    }
}

impl SimpleObjective<RealVector> {
    /// Multi-objective function over `dim` variables with `num_objectives` outputs.
    pub fn multi<F>(name: impl Into<String>, dim: usize, num_objectives: usize, value: F) -> Self
    where
        F: Fn(&RealVector) -> RealVector + Send + Sync + 'static,
    {
        Self::from_parts(name, dim, num_objectives, Box::new(value))
    }
}

impl<V: ObjectiveValue + 'static> SimpleObjective<V> {
    fn from_parts(name: impl Into<String>, dim: usize, num_objectives: usize, value: ValueFn<V>) -> Self {
        Self {
            base: ObjectiveBase::new(name).with_features(Features::IS_THREAD_SAFE),
            dim,
            num_objectives,
            value,
            derivative: None,
            hessian: None,
            bounds: None,
            start: None,
        }
    }

    /// Gradient (scalar result) or Jacobian (vector result) closure.
    pub fn with_gradient<G>(mut self, derivative: G) -> Self
    where
        G: Fn(&RealVector) -> FirstOrderDerivative<V> + Send + Sync + 'static,
    {
        self.derivative = Some(Box::new(derivative));
        self.base.add_features(Features::HAS_FIRST_DERIVATIVE);
        self
    }

    /// Hessian closure. Second-derivative results reuse the gradient closure,
    /// so a gradient must be supplied first.
    pub fn with_hessian<H>(mut self, hessian: H) -> ObjectiveResult<Self>
    where
        H: Fn(&RealVector) -> RealMatrix + Send + Sync + 'static,
    {
        if self.derivative.is_none() {
            return Err(ObjectiveError::MissingFeature {
                function: self.base.name().to_string(),
                feature: Features::HAS_FIRST_DERIVATIVE,
            });
        }
        self.hessian = Some(Box::new(hessian));
        self.base.add_features(Features::HAS_SECOND_DERIVATIVE);
        Ok(self)
    }

    pub fn with_starting_point(mut self, start: RealVector) -> ObjectiveResult<Self> {
        self.check_len(start.len())?;
        self.start = Some(start);
        self.base.add_features(Features::CAN_PROPOSE_STARTING_POINT);
        Ok(self)
    }

    /// Restrict the search space to a box.
    ///
    /// The box serves as shared constraint handler and repairs points by
    /// clamping. Without an explicit starting point, starting points are drawn
    /// uniformly from the box.
    pub fn with_bounds(mut self, bounds: impl Into<Arc<BoxConstraints>>) -> ObjectiveResult<Self> {
        let bounds = bounds.into();
        self.check_len(bounds.dimension())?;
        self.bounds = Some(bounds);
        self.base.add_features(
            Features::IS_CONSTRAINED
                | Features::HAS_CONSTRAINT_HANDLER
                | Features::CAN_PROVIDE_CLOSEST_FEASIBLE
                | Features::CAN_PROPOSE_STARTING_POINT,
        );
        Ok(self)
    }

    /// Declare the value closure stochastic.
    pub fn noisy(mut self) -> Self {
        self.base.add_features(Features::IS_NOISY);
        self
    }

    fn check_len(&self, got: usize) -> ObjectiveResult<()> {
        if got == self.dim {
            return Ok(());
        }
        Err(ObjectiveError::DimensionMismatch {
            function: self.base.name().to_string(),
            expected: self.dim,
            got,
        })
    }

    fn gradient_at(&self, point: &RealVector) -> ObjectiveResult<FirstOrderDerivative<V>> {
        let Some(derivative) = &self.derivative else {
            return Ok(V::undefined_derivative(self.num_objectives, self.dim));
        };
        let gradient = derivative(point);
        let (rows, cols) = V::derivative_shape(&gradient);
        if rows != self.num_objectives || cols != self.dim {
            return Err(ObjectiveError::DimensionMismatch {
                function: self.base.name().to_string(),
                expected: self.num_objectives * self.dim,
                got: rows * cols,
            });
        }
        Ok(gradient)
    }
}

impl<V: ObjectiveValue + 'static> ObjectiveFunction for SimpleObjective<V> {
    type SearchPoint = RealVector;
    type Value = V;

    fn base(&self) -> &ObjectiveBase {
        &self.base
    }

    fn number_of_variables(&self) -> usize {
        self.dim
    }

    fn number_of_objectives(&self) -> usize {
        self.num_objectives
    }

    fn eval(&self, point: &RealVector) -> ObjectiveResult<V> {
        let value = (self.value)(point);
        if value.num_objectives() != self.num_objectives {
            return Err(ObjectiveError::DimensionMismatch {
                function: self.base.name().to_string(),
                expected: self.num_objectives,
                got: value.num_objectives(),
            });
        }
        Ok(value)
    }

    fn eval_derivative(&self, point: &RealVector) -> ObjectiveResult<(V, FirstOrderDerivative<V>)> {
        Ok((self.eval(point)?, self.gradient_at(point)?))
    }

    fn eval_second_derivative(
        &self,
        point: &RealVector,
    ) -> ObjectiveResult<(V, SecondDerivative<FirstOrderDerivative<V>>)> {
        let value = self.eval(point)?;
        let gradient = self.gradient_at(point)?;
        let hessian = match &self.hessian {
            Some(hessian) => {
                let hessian = hessian(point);
                if hessian.dim() != (self.dim, self.dim) {
                    return Err(ObjectiveError::DimensionMismatch {
                        function: self.base.name().to_string(),
                        expected: self.dim * self.dim,
                        got: hessian.len(),
                    });
                }
                hessian
            }
            None => RealMatrix::from_elem((self.dim, self.dim), f64::NAN),
        };
        Ok((value, SecondDerivative::new(gradient, hessian)))
    }

    fn starting_point(&self) -> ObjectiveResult<RealVector> {
        if let Some(start) = &self.start {
            return Ok(start.clone());
        }
        match &self.bounds {
            Some(bounds) => Ok(bounds.sample(&mut thread_rng())),
            None => Err(ObjectiveError::MissingFeature {
                function: self.base.name().to_string(),
                feature: Features::CAN_PROPOSE_STARTING_POINT,
            }),
        }
    }

    fn constraint_handler(&self) -> Option<SharedConstraintHandler<RealVector>> {
        self.bounds.clone().map(|bounds| bounds as SharedConstraintHandler<RealVector>)
    }

    fn closest_feasible_point(&self, point: &RealVector) -> ObjectiveResult<RealVector> {
        match &self.bounds {
            Some(bounds) => Ok(bounds.clamp(point)),
            None => Err(ObjectiveError::MissingFeature {
                function: self.base.name().to_string(),
                feature: Features::CAN_PROVIDE_CLOSEST_FEASIBLE,
            }),
        }
    }
}

impl<V: ObjectiveValue> fmt::Debug for SimpleObjective<V> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SimpleObjective")
            .field("base", &self.base)
            .field("dim", &self.dim)
            .field("num_objectives", &self.num_objectives)
            .field("bounds", &self.bounds)
            .field("start", &self.start)
            .finish()
    }
}
