//! learners — nuisance regression methods used during cross-fitting.
//!
//! The estimators are generic over [`Learner`]; this module ships a
//! [`LinearRegression`] (OLS / ridge) and a [`MeanRegressor`] baseline.
//! External learners implement the two traits and can report failures
//! through [`LearnerError::Backend`].

pub mod errors;
pub mod linear;
pub mod mean;
pub mod traits;

pub use self::errors::{LearnerError, LearnerResult};
pub use self::linear::{FittedLinearModel, LinearRegression};
pub use self::mean::MeanRegressor;
pub use self::traits::{FittedLearner, Learner};
