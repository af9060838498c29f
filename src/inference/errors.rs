//! Unified error handling for inference routines.
//!
//! This module defines `InferenceError`, the central error type used by the
//! cluster-robust variance estimator, confidence intervals, and aggregation
//! across repetitions. It groups degenerate-fold and degenerate-Jacobian
//! failures with shape checks and invalid summary inputs. An alias
//! `InferenceResult<T>` standardizes the return type across inference code.

#[cfg(feature = "python-bindings")]
use pyo3::{PyErr, exceptions::PyValueError};

/// Unified error type for inference routines.
///
/// Covers empty cluster folds, a vanishing Jacobian, non-finite variance
/// components, and invalid confidence levels. Readable diagnostics come
/// through `Display`.
#[derive(Debug, Clone, PartialEq)]
pub enum InferenceError {
    // ---- Fold structure ----
    /// A fold holds no clusters in one dimension, so its weights are undefined.
    EmptyClusterFold { fold: (usize, usize), dim: usize },

    /// Score vectors or cluster codes disagree with the split.
    LengthMismatch { what: &'static str, expected: usize, found: usize },

    /// A cluster code lies outside `0..n_clusters` for its dimension.
    CodeOutOfRange { dim: usize, obs: usize, code: usize },

    // ---- Numerical degeneracies ----
    /// Ĵ is zero or non-finite; the sandwich cannot be formed.
    DegenerateJacobian { j_hat: f64 },

    /// A variance component or summary came out NaN or ±∞.
    NonFinite { what: &'static str, value: f64 },

    /// Standard error must be finite and non-negative.
    InvalidStandardError { se: f64 },

    // ---- Summaries ----
    /// Confidence level must lie strictly inside (0, 1).
    InvalidLevel { level: f64 },

    /// Aggregation across repetitions got no values.
    EmptyRepetitions,

    /// Wrapper for statrs::distribution::NormalError.
    InvalidNormalParam,
}

pub type InferenceResult<T> = Result<T, InferenceError>;

impl From<statrs::distribution::NormalError> for InferenceError {
    fn from(_: statrs::distribution::NormalError) -> Self {
        InferenceError::InvalidNormalParam
    }
}

impl std::error::Error for InferenceError {}

impl std::fmt::Display for InferenceError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            // ---- Fold structure ----
            InferenceError::EmptyClusterFold { fold, dim } => write!(
                f,
                "Inference Error: fold {:?} has no clusters in dimension {}",
                fold, dim
            ),
            InferenceError::LengthMismatch { what, expected, found } => {
                write!(f, "Inference Error: {} has length {}, expected {}", what, found, expected)
            }
            InferenceError::CodeOutOfRange { dim, obs, code } => write!(
                f,
                "Inference Error: cluster code {} of observation {} is out of range in dimension {}",
                code, obs, dim
            ),

            // ---- Numerical degeneracies ----
            InferenceError::DegenerateJacobian { j_hat } => {
                write!(f, "Inference Error: degenerate Jacobian (J_hat = {})", j_hat)
            }
            InferenceError::NonFinite { what, value } => {
                write!(f, "Inference Error: {} is non-finite ({})", what, value)
            }
            InferenceError::InvalidStandardError { se } => {
                write!(f, "Inference Error: standard error {} must be finite and >= 0", se)
            }

            // ---- Summaries ----
            InferenceError::InvalidLevel { level } => {
                write!(f, "Inference Error: confidence level {} must lie in (0, 1)", level)
            }
            InferenceError::EmptyRepetitions => {
                write!(f, "Inference Error: no repetitions to aggregate")
            }
            InferenceError::InvalidNormalParam => {
                write!(f, "Inference Error: invalid normal distribution parameters")
            }
        }
    }
}

#[cfg(feature = "python-bindings")]
impl From<InferenceError> for PyErr {
    fn from(err: InferenceError) -> PyErr {
        PyValueError::new_err(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use statrs::distribution::Normal;

    #[test]
    fn invalid_normal_parameters_convert() {
        let err: InferenceError = Normal::new(0.0, -1.0).map(|_| ()).unwrap_err().into();
        assert_eq!(err, InferenceError::InvalidNormalParam);
    }

    #[test]
    fn every_variant_renders_with_prefix() {
        let errors = [
            InferenceError::EmptyClusterFold { fold: (0, 1), dim: 1 },
            InferenceError::LengthMismatch { what: "psi", expected: 4, found: 3 },
            InferenceError::CodeOutOfRange { dim: 0, obs: 2, code: 7 },
            InferenceError::DegenerateJacobian { j_hat: 0.0 },
            InferenceError::NonFinite { what: "gamma_hat", value: f64::NAN },
            InferenceError::InvalidStandardError { se: -1.0 },
            InferenceError::InvalidLevel { level: 1.5 },
            InferenceError::EmptyRepetitions,
            InferenceError::InvalidNormalParam,
        ];
        for err in &errors {
            // No catch-all arm: a new variant must be added here too.
            match err {
                InferenceError::EmptyClusterFold { .. }
                | InferenceError::LengthMismatch { .. }
                | InferenceError::CodeOutOfRange { .. }
                | InferenceError::DegenerateJacobian { .. }
                | InferenceError::NonFinite { .. }
                | InferenceError::InvalidStandardError { .. }
                | InferenceError::InvalidLevel { .. }
                | InferenceError::EmptyRepetitions
                | InferenceError::InvalidNormalParam => {}
            }
            assert!(err.to_string().starts_with("Inference Error: "));
        }
    }
}
