//! estimation::nuisance — cross-fitted nuisance predictions.
//!
//! Purpose
//! -------
//! For every fold of a cluster split, fit a learner on the fold's training
//! rows and predict on its scoring rows, then scatter the predictions back
//! into observation order. The training rows never share a cluster id with
//! the scoring rows, so every prediction is out-of-fold in both cluster
//! dimensions.
//!
//! Key behaviors
//! -------------
//! - Folds are independent: with `parallel = true` they are fit concurrently
//!   through rayon; the only synchronization is the final collect.
//! - Results are identical for parallel and sequential execution because
//!   each fold writes a disjoint set of observations.
//! - Every observation must receive exactly one prediction.
use crate::{
    estimation::errors::{DmlError, DmlResult},
    learners::{Learner, LearnerError},
    resampling::{ClusterFold, ClusterSplit},
};
use ndarray::{Array1, ArrayView1, ArrayView2, Axis};
use rayon::prelude::*;

/// Out-of-fold predictions of `target` from `x` over all folds of `split`.
///
/// Parameters
/// ----------
/// - `learner`: nuisance learner; fit once per fold.
/// - `nuisance`: label for diagnostics (e.g. `"ml_l"`).
/// - `x`: `n × p` features.
/// - `target`: length-`n` regression target.
/// - `split`: the cross-fitting split.
/// - `parallel`: fit folds concurrently.
///
/// Errors
/// ------
/// - `DmlError::FoldLearner` if the learner fails in any fold.
/// - `DmlError::IncompletePredictions` if an observation is predicted zero
///   or multiple times.
pub fn crossfit_predict(
    learner: &dyn Learner, nuisance: &'static str, x: ArrayView2<'_, f64>,
    target: ArrayView1<'_, f64>, split: &ClusterSplit, parallel: bool,
) -> DmlResult<Array1<f64>> {
    let n_obs = target.len();
    for (what, found) in [("feature rows", x.nrows()), ("split observations", split.n_obs())] {
        if found != n_obs {
            return Err(LearnerError::DimensionMismatch { what, expected: n_obs, found }.into());
        }
    }

    let fold_predictions: Vec<Array1<f64>> = if parallel {
        split
            .folds()
            .par_iter()
            .map(|fold| predict_fold(learner, nuisance, x, target, fold))
            .collect::<DmlResult<Vec<_>>>()?
    } else {
        split
            .folds()
            .iter()
            .map(|fold| predict_fold(learner, nuisance, x, target, fold))
            .collect::<DmlResult<Vec<_>>>()?
    };

    let mut predictions = Array1::<f64>::zeros(n_obs);
    let mut filled = vec![0usize; n_obs];
    for (fold, preds) in split.folds().iter().zip(&fold_predictions) {
        for (&t, &p) in fold.test().iter().zip(preds.iter()) {
            predictions[t] = p;
            filled[t] += 1;
        }
    }
    if let Some((obs, &count)) = filled.iter().enumerate().find(|&(_, &c)| c != 1) {
        return Err(DmlError::IncompletePredictions { obs, count });
    }

    Ok(predictions)
}

fn predict_fold(
    learner: &dyn Learner, nuisance: &'static str, x: ArrayView2<'_, f64>,
    target: ArrayView1<'_, f64>, fold: &ClusterFold,
) -> DmlResult<Array1<f64>> {
    let wrap = |source: LearnerError| DmlError::FoldLearner { nuisance, fold: fold.key(), source };

    let x_train = x.select(Axis(0), fold.train());
    let y_train = target.select(Axis(0), fold.train());
    let fitted = learner.fit(x_train.view(), y_train.view()).map_err(wrap)?;

    let x_test = x.select(Axis(0), fold.test());
    let preds = fitted.predict(x_test.view()).map_err(wrap)?;
    if preds.len() != fold.test().len() {
        return Err(wrap(LearnerError::DimensionMismatch {
            what: "predictions",
            expected: fold.test().len(),
            found: preds.len(),
        }));
    }
    Ok(preds)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::learners::{LinearRegression, MeanRegressor};
    use crate::resampling::ClusterResampling;
    use approx::assert_relative_eq;
    use ndarray::Array2;

    fn grid_codes(n: usize, m: usize) -> (Vec<usize>, Vec<usize>) {
        let first = (0..n * m).map(|t| t / m).collect();
        let second = (0..n * m).map(|t| t % m).collect();
        (first, second)
    }

    #[test]
    // Purpose
    // -------
    // Predictions must be out-of-fold: a mean learner predicts the mean of
    // the training rows only.
    //
    // Given
    // -----
    // - A 6×6 grid, K = 2, target equal to the observation index.
    //
    // Expect
    // ------
    // - Each prediction equals the mean target over its fold's train rows.
    fn mean_learner_predicts_training_mean_per_fold() {
        // Arrange
        let (first, second) = grid_codes(6, 6);
        let codes = [first.as_slice(), second.as_slice()];
        let split = ClusterResampling::new(2, 1, Some(5))
            .expect("valid config")
            .split(&codes, &[6, 6])
            .expect("split succeeds")
            .remove(0);
        let x = Array2::<f64>::zeros((36, 1));
        let target = Array1::from_iter((0..36).map(|t| t as f64));

        // Act
        let preds = crossfit_predict(&MeanRegressor, "ml_l", x.view(), target.view(), &split, false)
            .expect("cross-fitting succeeds");

        // Assert
        for fold in split.folds() {
            let train_mean = fold.train().iter().map(|&t| t as f64).sum::<f64>()
                / fold.train().len() as f64;
            for &t in fold.test() {
                assert_relative_eq!(preds[t], train_mean, epsilon = 1e-12);
            }
        }
    }

    #[test]
    fn parallel_and_sequential_agree() {
        let (first, second) = grid_codes(8, 5);
        let codes = [first.as_slice(), second.as_slice()];
        let split = ClusterResampling::new(3, 1, Some(9))
            .expect("valid config")
            .split(&codes, &[8, 5])
            .expect("split succeeds")
            .remove(0);
        let x = Array2::from_shape_fn((40, 2), |(t, j)| ((t * (j + 3)) % 7) as f64);
        let target = Array1::from_iter((0..40).map(|t| (t % 9) as f64 - 4.0));
        let learner = LinearRegression::ols();

        let seq = crossfit_predict(&learner, "ml_m", x.view(), target.view(), &split, false)
            .expect("sequential succeeds");
        let par = crossfit_predict(&learner, "ml_m", x.view(), target.view(), &split, true)
            .expect("parallel succeeds");

        assert_eq!(seq, par);
    }
}
