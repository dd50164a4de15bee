//! Samyama Objective
//!
//! The objective function contract targeted by the Samyama optimization
//! algorithms. An objective function is evaluated at a search point, may be
//! differentiable to first or second order, may be constrained and may be
//! noisy. Algorithms discover at runtime which of these operations an instance
//! supports through its capability flags instead of calling and failing.
//!
//! # Components
//!
//! - Capability flag set: [`Features`]
//! - Evaluation protocol: [`ObjectiveFunction`] (implemented by problems) and
//!   [`ObjectiveExt`] (used by algorithms)
//! - Constraint cooperation: [`ConstraintHandler`], [`BoxConstraints`]
//! - Evaluation accounting: [`EvaluationCounter`], [`EvaluationBudget`]
//!
//! # Example
//!
//! ```
//! use ndarray::array;
//! use samyama_objective::{ObjectiveExt, RealVector, SimpleObjective};
//!
//! let sphere = SimpleObjective::new("Sphere", 3, |x: &RealVector| x.dot(x))
//!     .with_gradient(|x: &RealVector| 2.0 * x);
//!
//! assert!(sphere.has_first_derivative());
//! let (value, gradient) = sphere.evaluate_derivative(&array![1.0, 1.0, 1.0]).unwrap();
//! assert_eq!(value, 3.0);
//! assert_eq!(gradient.len(), 3);
//! assert_eq!(sphere.evaluation_counter(), 1);
//! ```

pub mod budget;
pub mod constraint;
pub mod counter;
pub mod error;
pub mod features;
pub mod objective;
pub mod simple;
pub mod types;

pub use budget::EvaluationBudget;
pub use constraint::{BoxConstraints, ConstraintHandler, SharedConstraintHandler};
pub use counter::EvaluationCounter;
pub use error::{ObjectiveError, ObjectiveResult};
pub use features::Features;
pub use objective::{ObjectiveBase, ObjectiveExt, ObjectiveFunction};
pub use simple::SimpleObjective;
pub use types::{
    FirstOrderDerivative, ObjectiveValue, RealMatrix, RealVector, SearchPoint, SecondDerivative,
};

/// Initialize the objective layer
pub fn init() {
    tracing::info!("Samyama Objective Layer Initialized");
}
