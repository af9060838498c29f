//! learners::mean — constant (training-mean) regressor.
//!
//! Useful as a baseline nuisance learner and for data without covariates.
use crate::learners::{
    errors::{LearnerError, LearnerResult},
    traits::{FittedLearner, Learner},
};
use ndarray::{Array1, ArrayView1, ArrayView2};

/// Predicts the mean of the training targets for every row.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct MeanRegressor;

#[derive(Debug, Clone, Copy, PartialEq)]
struct FittedMean {
    value: f64,
}

impl Learner for MeanRegressor {
    fn name(&self) -> String {
        "MeanRegressor".to_string()
    }

    fn fit(
        &self, x: ArrayView2<'_, f64>, y: ArrayView1<'_, f64>,
    ) -> LearnerResult<Box<dyn FittedLearner>> {
        if y.is_empty() {
            return Err(LearnerError::EmptyTrainingSet);
        }
        if x.nrows() != y.len() {
            return Err(LearnerError::DimensionMismatch {
                what: "feature rows",
                expected: y.len(),
                found: x.nrows(),
            });
        }
        let value = y.sum() / y.len() as f64;
        Ok(Box::new(FittedMean { value }))
    }
}

impl FittedLearner for FittedMean {
    fn predict(&self, x: ArrayView2<'_, f64>) -> LearnerResult<Array1<f64>> {
        Ok(Array1::from_elem(x.nrows(), self.value))
    }
}
