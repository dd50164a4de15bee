//! The objective function abstraction
//!
//! Concrete problems implement [`ObjectiveFunction`]: they embed an
//! [`ObjectiveBase`] holding their name, capability flags and evaluation
//! counter, and fill in the hooks their flags advertise.
//!
//! Algorithms use [`ObjectiveExt`], which every objective function gets for
//! free. It checks the guarding capability flag and the point dimension before
//! each call, and counts exactly one evaluation per evaluation call whatever
//! the derivative order. Because it is blanket-implemented, a concrete
//! function cannot override the accounting.

use crate::budget::EvaluationBudget;
use crate::constraint::SharedConstraintHandler;
use crate::counter::EvaluationCounter;
use crate::error::{ObjectiveError, ObjectiveResult};
use crate::features::Features;
use crate::types::{FirstOrderDerivative, ObjectiveValue, SearchPoint, SecondDerivative};
use rayon::prelude::*;
use tracing::{debug, trace, warn};

/// State shared by every objective function: name, capabilities and counter.
///
/// A fresh base only advertises [`Features::HAS_VALUE`]. Concrete functions
/// add their own flags in their constructors.
#[derive(Debug, Clone)]
pub struct ObjectiveBase {
    name: String,
    features: Features,
    counter: EvaluationCounter,
}

impl ObjectiveBase {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            features: Features::HAS_VALUE,
            counter: EvaluationCounter::new(),
        }
    }

    /// Builder form of [`ObjectiveBase::add_features`].
    pub fn with_features(mut self, features: Features) -> Self {
        self.features |= features;
        self
    }

    pub fn add_features(&mut self, features: Features) {
        self.features.insert(features);
    }

    pub fn remove_features(&mut self, features: Features) {
        self.features.remove(features);
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn features(&self) -> Features {
        self.features
    }

    pub fn counter(&self) -> &EvaluationCounter {
        &self.counter
    }
}

/// Contract implemented by concrete objective functions.
///
/// Only `eval` is mandatory. The remaining hooks must be overridden exactly
/// when the matching flag is advertised; the defaults of the derivative hooks
/// return NaN-filled results, the others fail.
pub trait ObjectiveFunction {
    /// Domain of the function.
    type SearchPoint: SearchPoint;
    /// Codomain: `f64` for single-objective, `RealVector` for multi-objective.
    type Value: ObjectiveValue;

    fn base(&self) -> &ObjectiveBase;

    /// Dimension every search point must have.
    fn number_of_variables(&self) -> usize;

    fn number_of_objectives(&self) -> usize {
        1
    }

    /// Function value at `point`.
    fn eval(&self, point: &Self::SearchPoint) -> ObjectiveResult<Self::Value>;

    /// Value and first derivative at `point`.
    fn eval_derivative(
        &self,
        _point: &Self::SearchPoint,
    ) -> ObjectiveResult<(Self::Value, FirstOrderDerivative<Self::Value>)> {
        let m = self.number_of_objectives();
        Ok((
            Self::Value::undefined(m),
            Self::Value::undefined_derivative(m, self.number_of_variables()),
        ))
    }

    /// Value, first derivative and Hessian at `point`.
    fn eval_second_derivative(
        &self,
        _point: &Self::SearchPoint,
    ) -> ObjectiveResult<(Self::Value, SecondDerivative<FirstOrderDerivative<Self::Value>>)> {
        let m = self.number_of_objectives();
        Ok((
            Self::Value::undefined(m),
            SecondDerivative::undefined::<Self::Value>(m, self.number_of_variables()),
        ))
    }

    fn starting_point(&self) -> ObjectiveResult<Self::SearchPoint> {
        Err(missing_feature(self.base(), Features::CAN_PROPOSE_STARTING_POINT))
    }

    fn constraint_handler(&self) -> Option<SharedConstraintHandler<Self::SearchPoint>> {
        None
    }

    /// Repair `point` into the closest feasible point. Must be idempotent.
    fn closest_feasible_point(&self, _point: &Self::SearchPoint) -> ObjectiveResult<Self::SearchPoint> {
        Err(missing_feature(self.base(), Features::CAN_PROVIDE_CLOSEST_FEASIBLE))
    }
}

fn missing_feature(base: &ObjectiveBase, feature: Features) -> ObjectiveError {
    ObjectiveError::MissingFeature {
        function: base.name().to_string(),
        feature,
    }
}

/// Checked interface used by optimization algorithms.
pub trait ObjectiveExt: ObjectiveFunction {
    fn name(&self) -> &str {
        self.base().name()
    }

    fn has_value(&self) -> bool {
        self.base().features().contains(Features::HAS_VALUE)
    }

    fn has_first_derivative(&self) -> bool {
        self.base().features().contains(Features::HAS_FIRST_DERIVATIVE)
    }

    fn has_second_derivative(&self) -> bool {
        self.base().features().contains(Features::HAS_SECOND_DERIVATIVE)
    }

    fn can_propose_starting_point(&self) -> bool {
        self.base().features().contains(Features::CAN_PROPOSE_STARTING_POINT)
    }

    fn is_constrained(&self) -> bool {
        self.base().features().contains(Features::IS_CONSTRAINED)
    }

    fn has_constraint_handler(&self) -> bool {
        self.base().features().contains(Features::HAS_CONSTRAINT_HANDLER)
    }

    fn can_provide_closest_feasible(&self) -> bool {
        self.base().features().contains(Features::CAN_PROVIDE_CLOSEST_FEASIBLE)
    }

    fn is_thread_safe(&self) -> bool {
        self.base().features().contains(Features::IS_THREAD_SAFE)
    }

    fn is_noisy(&self) -> bool {
        self.base().features().contains(Features::IS_NOISY)
    }

    /// Evaluate the function at `point`. Counts one evaluation.
    fn evaluate(&self, point: &Self::SearchPoint) -> ObjectiveResult<Self::Value> {
        self.require(Features::HAS_VALUE)?;
        self.check_dimension(point)?;
        let count = self.base().counter().increment();
        trace!("Evaluating {} (evaluation {})", self.name(), count);
        self.eval(point)
    }

    /// Value and first derivative at `point`. Counts one evaluation.
    fn evaluate_derivative(
        &self,
        point: &Self::SearchPoint,
    ) -> ObjectiveResult<(Self::Value, FirstOrderDerivative<Self::Value>)> {
        self.require(Features::HAS_FIRST_DERIVATIVE)?;
        self.check_dimension(point)?;
        let count = self.base().counter().increment();
        trace!("Evaluating first derivative of {} (evaluation {})", self.name(), count);
        self.eval_derivative(point)
    }

    /// Value, first derivative and Hessian at `point`. Counts one evaluation.
    fn evaluate_second_derivative(
        &self,
        point: &Self::SearchPoint,
    ) -> ObjectiveResult<(Self::Value, SecondDerivative<FirstOrderDerivative<Self::Value>>)> {
        self.require(Features::HAS_SECOND_DERIVATIVE)?;
        self.check_dimension(point)?;
        let count = self.base().counter().increment();
        trace!("Evaluating second derivative of {} (evaluation {})", self.name(), count);
        self.eval_second_derivative(point)
    }

    /// Evaluate every point, in parallel when the function is thread safe.
    ///
    /// The counter grows by exactly `points.len()` when all points are valid.
    /// Nothing is evaluated if any point has the wrong dimension.
    fn evaluate_batch(&self, points: &[Self::SearchPoint]) -> ObjectiveResult<Vec<Self::Value>>
    where
        Self: Sync,
        Self::SearchPoint: Sync,
        Self::Value: Send,
    {
        self.require(Features::HAS_VALUE)?;
        for point in points {
            self.check_dimension(point)?;
        }
        if self.is_thread_safe() {
            debug!("Evaluating {} points of {} in parallel", points.len(), self.name());
            points.par_iter().map(|p| self.evaluate(p)).collect()
        } else {
            debug!("Evaluating {} points of {} sequentially", points.len(), self.name());
            points.iter().map(|p| self.evaluate(p)).collect()
        }
    }

    /// A sensible initial point. Not an evaluation.
    fn propose_starting_point(&self) -> ObjectiveResult<Self::SearchPoint> {
        self.require(Features::CAN_PROPOSE_STARTING_POINT)?;
        self.starting_point()
    }

    /// The shared constraint handler.
    fn get_constraint_handler(&self) -> ObjectiveResult<SharedConstraintHandler<Self::SearchPoint>> {
        self.require(Features::HAS_CONSTRAINT_HANDLER)?;
        self.constraint_handler().ok_or_else(|| {
            let err = ObjectiveError::NoConstraintHandler(self.name().to_string());
            warn!("{}", err);
            err
        })
    }

    /// The feasible point closest to `point`. Not an evaluation.
    fn closest_feasible(&self, point: &Self::SearchPoint) -> ObjectiveResult<Self::SearchPoint> {
        self.require(Features::CAN_PROVIDE_CLOSEST_FEASIBLE)?;
        self.check_dimension(point)?;
        self.closest_feasible_point(point)
    }

    /// Feasibility of `point`. Unconstrained functions accept every point.
    fn is_feasible(&self, point: &Self::SearchPoint) -> ObjectiveResult<bool> {
        self.check_dimension(point)?;
        if !self.is_constrained() {
            return Ok(true);
        }
        Ok(self.get_constraint_handler()?.is_feasible(point))
    }

    fn evaluation_counter(&self) -> u64 {
        self.base().counter().get()
    }

    fn reset_evaluation_counter(&self) {
        let previous = self.base().counter().reset();
        debug!("Reset evaluation counter of {} (was {})", self.name(), previous);
    }

    fn budget_exhausted(&self, budget: &EvaluationBudget) -> bool {
        budget.is_exhausted(self.evaluation_counter())
    }

    #[doc(hidden)]
    fn require(&self, feature: Features) -> ObjectiveResult<()> {
        if self.base().features().contains(feature) {
            return Ok(());
        }
        let err = missing_feature(self.base(), feature);
        warn!("{}", err);
        Err(err)
    }

    #[doc(hidden)]
    fn check_dimension(&self, point: &Self::SearchPoint) -> ObjectiveResult<()> {
        let expected = self.number_of_variables();
        let got = point.dimension();
        if expected == got {
            return Ok(());
        }
        let err = ObjectiveError::DimensionMismatch {
            function: self.name().to_string(),
            expected,
            got,
        };
        warn!("{}", err);
        Err(err)
    }
}

impl<F: ObjectiveFunction + ?Sized> ObjectiveExt for F {}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::constraint::BoxConstraints;
    use crate::types::RealVector;
    use ndarray::array;
    use std::sync::Arc;

    /// f(x) = sum(x_i^2), nothing but a value.
    struct Sphere {
        base: ObjectiveBase,
        dim: usize,
    }

    impl Sphere {
        fn new(dim: usize) -> Self {
            Self {
                base: ObjectiveBase::new("Sphere"),
                dim,
            }
        }
    }

    impl ObjectiveFunction for Sphere {
        type SearchPoint = RealVector;
        type Value = f64;

        fn base(&self) -> &ObjectiveBase {
            &self.base
        }

        fn number_of_variables(&self) -> usize {
            self.dim
        }

        fn eval(&self, point: &RealVector) -> ObjectiveResult<f64> {
            Ok(point.dot(point))
        }
    }

    /// Advertises a first derivative it never implements.
    struct Liar {
        base: ObjectiveBase,
    }

    impl ObjectiveFunction for Liar {
        type SearchPoint = RealVector;
        type Value = f64;

        fn base(&self) -> &ObjectiveBase {
            &self.base
        }

        fn number_of_variables(&self) -> usize {
            2
        }

        fn eval(&self, _point: &RealVector) -> ObjectiveResult<f64> {
            Ok(0.0)
        }
    }

    /// Unit box, repaired by clamping through a shared handler.
    struct Boxed {
        base: ObjectiveBase,
        bounds: Arc<BoxConstraints>,
    }

    impl ObjectiveFunction for Boxed {
        type SearchPoint = RealVector;
        type Value = f64;

        fn base(&self) -> &ObjectiveBase {
            &self.base
        }

        fn number_of_variables(&self) -> usize {
            self.bounds.dimension()
        }

        fn eval(&self, point: &RealVector) -> ObjectiveResult<f64> {
            Ok(point.sum())
        }

        fn constraint_handler(&self) -> Option<SharedConstraintHandler<RealVector>> {
            let handler: SharedConstraintHandler<RealVector> = self.bounds.clone();
            Some(handler)
        }

        fn closest_feasible_point(&self, point: &RealVector) -> ObjectiveResult<RealVector> {
            Ok(self.bounds.clamp(point))
        }
    }

    fn boxed() -> Boxed {
        Boxed {
            base: ObjectiveBase::new("Boxed").with_features(
                Features::IS_CONSTRAINED
                    | Features::HAS_CONSTRAINT_HANDLER
                    | Features::CAN_PROVIDE_CLOSEST_FEASIBLE,
            ),
            bounds: Arc::new(BoxConstraints::uniform(2, 0.0, 1.0).unwrap()),
        }
    }

    #[test]
    fn test_base_defaults_to_value_only() {
        let sphere = Sphere::new(2);
        assert!(sphere.has_value());
        assert!(!sphere.has_first_derivative());
        assert!(!sphere.has_second_derivative());
        assert!(!sphere.can_propose_starting_point());
        assert!(!sphere.is_constrained());
        assert!(!sphere.has_constraint_handler());
        assert!(!sphere.can_provide_closest_feasible());
        assert!(!sphere.is_thread_safe());
        assert!(!sphere.is_noisy());
        assert_eq!(sphere.evaluation_counter(), 0);
    }

    #[test]
    fn test_evaluate_counts_each_call() {
        let sphere = Sphere::new(2);
        for _ in 0..5 {
            assert_eq!(sphere.evaluate(&array![1.0, 2.0]).unwrap(), 5.0);
        }
        assert_eq!(sphere.evaluation_counter(), 5);

        sphere.reset_evaluation_counter();
        assert_eq!(sphere.evaluation_counter(), 0);
    }

    #[test]
    fn test_wrong_dimension_is_rejected_without_counting() {
        let sphere = Sphere::new(3);
        let err = sphere.evaluate(&array![1.0]).unwrap_err();
        assert_eq!(
            err,
            ObjectiveError::DimensionMismatch {
                function: "Sphere".to_string(),
                expected: 3,
                got: 1,
            }
        );
        assert_eq!(sphere.evaluation_counter(), 0);
    }

    #[test]
    fn test_unadvertised_operations_fail_loudly() {
        let sphere = Sphere::new(2);
        let point = array![0.0, 0.0];

        let err = sphere.evaluate_derivative(&point).unwrap_err();
        assert!(matches!(
            err,
            ObjectiveError::MissingFeature { feature, .. } if feature == Features::HAS_FIRST_DERIVATIVE
        ));
        assert!(sphere.evaluate_second_derivative(&point).is_err());
        assert!(sphere.propose_starting_point().is_err());
        assert!(sphere.get_constraint_handler().is_err());
        assert!(sphere.closest_feasible(&point).is_err());
        assert_eq!(sphere.evaluation_counter(), 0);
    }

    #[test]
    fn test_unimplemented_derivative_yields_nan_sentinel() {
        let liar = Liar {
            base: ObjectiveBase::new("Liar")
                .with_features(Features::HAS_FIRST_DERIVATIVE | Features::HAS_SECOND_DERIVATIVE),
        };
        let (value, gradient) = liar.evaluate_derivative(&array![1.0, 1.0]).unwrap();
        assert!(value.is_nan());
        assert_eq!(gradient.len(), 2);
        assert!(gradient.iter().all(|g| g.is_nan()));

        let (_, second) = liar.evaluate_second_derivative(&array![1.0, 1.0]).unwrap();
        assert_eq!(second.hessian.dim(), (2, 2));
        assert_eq!(liar.evaluation_counter(), 2);
    }

    #[test]
    fn test_constraint_cooperation() {
        let f = boxed();
        assert!(f.is_constrained());
        assert!(f.is_feasible(&array![0.5, 0.5]).unwrap());
        assert!(!f.is_feasible(&array![1.5, 0.5]).unwrap());

        let repaired = f.closest_feasible(&array![1.5, -0.5]).unwrap();
        assert_eq!(repaired, array![1.0, 0.0]);
        assert_eq!(f.closest_feasible(&repaired).unwrap(), repaired);

        let handler = f.get_constraint_handler().unwrap();
        assert!(handler.can_provide_closest_feasible());
        assert_eq!(f.evaluation_counter(), 0);
    }

    #[test]
    fn test_handler_flag_without_handler() {
        let f = Sphere {
            base: ObjectiveBase::new("Broken")
                .with_features(Features::IS_CONSTRAINED | Features::HAS_CONSTRAINT_HANDLER),
            dim: 1,
        };
        assert_eq!(
            f.get_constraint_handler().unwrap_err(),
            ObjectiveError::NoConstraintHandler("Broken".to_string())
        );
    }

    #[test]
    fn test_unconstrained_points_are_feasible() {
        let sphere = Sphere::new(2);
        assert!(sphere.is_feasible(&array![1e9, -1e9]).unwrap());
    }

    #[test]
    fn test_evaluate_batch_counts_every_point() {
        let mut sphere = Sphere::new(2);
        let points = vec![array![1.0, 0.0], array![0.0, 2.0], array![1.0, 1.0]];
        assert_eq!(sphere.evaluate_batch(&points).unwrap(), vec![1.0, 4.0, 2.0]);
        assert_eq!(sphere.evaluation_counter(), 3);

        sphere.base.add_features(Features::IS_THREAD_SAFE);
        assert_eq!(sphere.evaluate_batch(&points).unwrap(), vec![1.0, 4.0, 2.0]);
        assert_eq!(sphere.evaluation_counter(), 6);

        let bad = vec![array![1.0, 0.0], array![1.0]];
        assert!(sphere.evaluate_batch(&bad).is_err());
        assert_eq!(sphere.evaluation_counter(), 6);
    }

    #[test]
    fn test_budget_exhaustion() {
        let sphere = Sphere::new(1);
        let budget = EvaluationBudget::limited(2);
        assert!(!sphere.budget_exhausted(&budget));
        sphere.evaluate(&array![1.0]).unwrap();
        sphere.evaluate(&array![1.0]).unwrap();
        assert!(sphere.budget_exhausted(&budget));
    }
}
