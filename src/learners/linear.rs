//! learners::linear — least-squares and ridge regression via nalgebra.
//!
//! Purpose
//! -------
//! Provide the default nuisance learner: a linear model with optional
//! intercept and optional ridge penalty on the slopes.
//!
//! Key behaviors
//! -------------
//! - With an intercept, features and target are centered before solving, so
//!   the intercept is never penalized.
//! - Normal equations `(XᵀX + λI) β = Xᵀy` are solved by Cholesky; if the
//!   Gram matrix is not positive definite (collinear columns, `λ = 0`), an
//!   SVD least-squares solve returns the minimum-norm solution instead.
//!
//! Invariants & assumptions
//! ------------------------
//! - `λ` is finite and non-negative.
//! - Zero-column feature matrices are allowed; the model is then the
//!   intercept alone (or zero).
use crate::learners::{
    errors::{LearnerError, LearnerResult},
    traits::{FittedLearner, Learner},
};
use nalgebra::{DMatrix, DVector};
use ndarray::{Array1, Array2, ArrayView1, ArrayView2, Axis};

const SVD_EPS: f64 = 1e-12;

/// LinearRegression — ordinary least squares with optional ridge penalty.
///
/// Fields
/// ------
/// - `fit_intercept`: whether to estimate an unpenalized intercept.
/// - `ridge_penalty`: `λ ≥ 0` added to the diagonal of the Gram matrix.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LinearRegression {
    pub fit_intercept: bool,
    pub ridge_penalty: f64,
}

impl LinearRegression {
    /// Construct a linear learner.
    ///
    /// Errors
    /// ------
    /// - `LearnerError::InvalidPenalty` if `ridge_penalty` is negative or
    ///   non-finite.
    pub fn new(fit_intercept: bool, ridge_penalty: f64) -> LearnerResult<Self> {
        if !ridge_penalty.is_finite() || ridge_penalty < 0.0 {
            return Err(LearnerError::InvalidPenalty { value: ridge_penalty });
        }
        Ok(LinearRegression { fit_intercept, ridge_penalty })
    }

    /// Plain OLS with intercept.
    pub fn ols() -> Self {
        LinearRegression { fit_intercept: true, ridge_penalty: 0.0 }
    }

    /// Ridge regression with intercept.
    pub fn ridge(ridge_penalty: f64) -> LearnerResult<Self> {
        Self::new(true, ridge_penalty)
    }

    /// Fit and return the concrete model, exposing its coefficients.
    ///
    /// Errors
    /// ------
    /// - `LearnerError::EmptyTrainingSet` for zero rows.
    /// - `LearnerError::DimensionMismatch` if `x` and `y` disagree in rows.
    /// - `LearnerError::SingularSystem` if both solves fail or yield
    ///   non-finite coefficients.
    pub fn fit_linear(
        &self, x: ArrayView2<'_, f64>, y: ArrayView1<'_, f64>,
    ) -> LearnerResult<FittedLinearModel> {
        let n = y.len();
        if n == 0 {
            return Err(LearnerError::EmptyTrainingSet);
        }
        if x.nrows() != n {
            return Err(LearnerError::DimensionMismatch {
                what: "feature rows",
                expected: n,
                found: x.nrows(),
            });
        }
        let p = x.ncols();

        let (x_mean, y_mean) = if self.fit_intercept {
            let x_mean = x.mean_axis(Axis(0)).unwrap_or_else(|| Array1::zeros(p));
            (x_mean, y.sum() / n as f64)
        } else {
            (Array1::zeros(p), 0.0)
        };
        if p == 0 {
            return Ok(FittedLinearModel { coefficients: Array1::zeros(0), intercept: y_mean });
        }

        let xc: Array2<f64> = &x - &x_mean;
        let yc: Array1<f64> = y.mapv(|v| v - y_mean);

        let mut gram = xc.t().dot(&xc);
        for j in 0..p {
            gram[[j, j]] += self.ridge_penalty;
        }
        let rhs = xc.t().dot(&yc);

        let beta = solve_normal_equations(&gram, &rhs)?;
        if beta.iter().any(|b| !b.is_finite()) {
            return Err(LearnerError::SingularSystem);
        }
        let intercept = y_mean - x_mean.dot(&beta);

        Ok(FittedLinearModel { coefficients: beta, intercept })
    }
}

impl Default for LinearRegression {
    fn default() -> Self {
        Self::ols()
    }
}

impl Learner for LinearRegression {
    fn name(&self) -> String {
        if self.ridge_penalty > 0.0 {
            format!("Ridge(lambda={})", self.ridge_penalty)
        } else {
            "LinearRegression".to_string()
        }
    }

    fn fit(
        &self, x: ArrayView2<'_, f64>, y: ArrayView1<'_, f64>,
    ) -> LearnerResult<Box<dyn FittedLearner>> {
        Ok(Box::new(self.fit_linear(x, y)?))
    }
}

/// A fitted linear model `ŷ = intercept + x·β`.
#[derive(Debug, Clone, PartialEq)]
pub struct FittedLinearModel {
    coefficients: Array1<f64>,
    intercept: f64,
}

impl FittedLinearModel {
    pub fn coefficients(&self) -> &Array1<f64> {
        &self.coefficients
    }

    pub fn intercept(&self) -> f64 {
        self.intercept
    }
}

impl FittedLearner for FittedLinearModel {
    fn predict(&self, x: ArrayView2<'_, f64>) -> LearnerResult<Array1<f64>> {
        if x.ncols() != self.coefficients.len() {
            return Err(LearnerError::DimensionMismatch {
                what: "feature columns",
                expected: self.coefficients.len(),
                found: x.ncols(),
            });
        }
        let pred = x.dot(&self.coefficients) + self.intercept;
        if let Some((index, &value)) = pred.iter().enumerate().find(|(_, v)| !v.is_finite()) {
            return Err(LearnerError::NonFinitePrediction { index, value });
        }
        Ok(pred)
    }
}

/// Solve `gram · β = rhs`; Cholesky first, SVD least squares as fallback.
fn solve_normal_equations(gram: &Array2<f64>, rhs: &Array1<f64>) -> LearnerResult<Array1<f64>> {
    let p = rhs.len();
    let a = DMatrix::from_fn(p, p, |i, j| gram[[i, j]]);
    let b = DVector::from_fn(p, |i, _| rhs[i]);

    let solution = match a.clone().cholesky() {
        Some(chol) => chol.solve(&b),
        None => a.svd(true, true).solve(&b, SVD_EPS).map_err(|_| LearnerError::SingularSystem)?,
    };
    Ok(Array1::from_iter(solution.iter().copied()))
}
