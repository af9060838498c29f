//! learners::traits — the fit/predict contract for nuisance learners.
//!
//! Purpose
//! -------
//! Define the seam between the cross-fitting engine and whatever regression
//! method estimates the nuisance functions. The engine only ever calls
//! [`Learner::fit`] on a fold's training rows and [`FittedLearner::predict`]
//! on the same fold's scoring rows.
//!
//! Conventions
//! -----------
//! - Learners are configuration objects; fitting never mutates them, so one
//!   learner can be fit concurrently on many folds. Both traits therefore
//!   require `Send + Sync`.
//! - Features arrive as `n × p` views (rows = observations); targets as
//!   length-`n` views. `p` may be zero.
use crate::learners::errors::LearnerResult;
use ndarray::{Array1, ArrayView1, ArrayView2};

/// A regression method that can be trained on a subset of the data.
pub trait Learner: Send + Sync + std::fmt::Debug {
    /// Short label used in logs and summaries.
    fn name(&self) -> String;

    /// Fit on `x` (`n × p`) and `y` (`n`), returning a predictor.
    fn fit(
        &self, x: ArrayView2<'_, f64>, y: ArrayView1<'_, f64>,
    ) -> LearnerResult<Box<dyn FittedLearner>>;
}

/// A trained predictor produced by [`Learner::fit`].
pub trait FittedLearner: Send + Sync {
    /// Predict one value per row of `x`.
    fn predict(&self, x: ArrayView2<'_, f64>) -> LearnerResult<Array1<f64>>;
}
