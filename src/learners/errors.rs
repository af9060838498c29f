//! learners::errors — failures of nuisance learners.
//!
//! This module defines `LearnerError`, returned by every `fit` and `predict`
//! call on the learner traits. Built-in learners use the specific variants;
//! external learners can forward arbitrary failures through
//! `LearnerError::Backend`, which also receives `anyhow::Error` via `From`.

#[cfg(feature = "python-bindings")]
use pyo3::{PyErr, exceptions::PyValueError};

pub type LearnerResult<T> = Result<T, LearnerError>;

/// Unified error type for nuisance learners.
#[derive(Debug, Clone, PartialEq)]
pub enum LearnerError {
    // ---- Inputs ----
    /// `fit` was called without any training rows.
    EmptyTrainingSet,

    /// Feature or target dimensions disagree.
    DimensionMismatch { what: &'static str, expected: usize, found: usize },

    /// Ridge penalty must be finite and non-negative.
    InvalidPenalty { value: f64 },

    // ---- Numerics ----
    /// Normal equations could not be solved.
    SingularSystem,

    /// A prediction came out NaN or ±∞.
    NonFinitePrediction { index: usize, value: f64 },

    // ---- External learners ----
    Backend(String),
}

impl From<anyhow::Error> for LearnerError {
    fn from(err: anyhow::Error) -> Self {
        LearnerError::Backend(err.to_string())
    }
}

impl std::error::Error for LearnerError {}

impl std::fmt::Display for LearnerError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            // ---- Inputs ----
            LearnerError::EmptyTrainingSet => {
                write!(f, "Learner Error: cannot fit on an empty training set")
            }
            LearnerError::DimensionMismatch { what, expected, found } => {
                write!(f, "Learner Error: {what} has size {found}, expected {expected}")
            }
            LearnerError::InvalidPenalty { value } => write!(
                f,
                "Learner Error: ridge penalty {value} must be finite and non-negative"
            ),

            // ---- Numerics ----
            LearnerError::SingularSystem => {
                write!(f, "Learner Error: normal equations are singular")
            }
            LearnerError::NonFinitePrediction { index, value } => {
                write!(f, "Learner Error: non-finite prediction {value} at row {index}")
            }

            // ---- External learners ----
            LearnerError::Backend(msg) => write!(f, "Learner Error: {msg}"),
        }
    }
}

#[cfg(feature = "python-bindings")]
impl From<LearnerError> for PyErr {
    fn from(err: LearnerError) -> PyErr {
        PyValueError::new_err(err.to_string())
    }
}
