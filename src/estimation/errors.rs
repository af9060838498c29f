//! estimation::errors — umbrella error for the DML estimators.
//!
//! `DmlError` wraps the module-level errors (`DataError`, `ResamplingError`,
//! `LearnerError`, `InferenceError`) via `From`, so estimator code can use
//! `?` throughout, and adds the failures that only arise when the pieces are
//! combined (degenerate moment conditions, incomplete cross-fitting,
//! unsupported configurations).

use crate::{
    data::DataError, inference::InferenceError, learners::LearnerError,
    resampling::ResamplingError,
};
#[cfg(feature = "python-bindings")]
use pyo3::{PyErr, exceptions::PyValueError};

pub type DmlResult<T> = Result<T, DmlError>;

/// Unified error type for DML estimation.
#[derive(Debug, Clone, PartialEq)]
pub enum DmlError {
    // ---- Wrapped module errors ----
    Data(DataError),
    Resampling(ResamplingError),
    Learner(LearnerError),
    Inference(InferenceError),

    /// A learner failed while fitting or predicting inside one fold.
    FoldLearner { nuisance: &'static str, fold: (usize, usize), source: LearnerError },

    // ---- Cross-fitting ----
    /// An observation received no out-of-fold prediction, or more than one.
    IncompletePredictions { obs: usize, count: usize },

    /// Score element vectors differ in length.
    ScoreLengthMismatch { psi_a: usize, psi_b: usize },

    // ---- Moment condition ----
    /// `Σ ψ_a` vanished (or is non-finite) so the moment condition has no
    /// unique root.
    DegenerateScore { denominator: f64 },

    // ---- Configuration ----
    /// The model needs a different number of instruments.
    UnsupportedInstruments { expected: usize, found: usize },

    /// An option string could not be parsed.
    InvalidOption { name: &'static str, value: String },
}

impl From<DataError> for DmlError {
    fn from(err: DataError) -> Self {
        DmlError::Data(err)
    }
}

impl From<ResamplingError> for DmlError {
    fn from(err: ResamplingError) -> Self {
        DmlError::Resampling(err)
    }
}

impl From<LearnerError> for DmlError {
    fn from(err: LearnerError) -> Self {
        DmlError::Learner(err)
    }
}

impl From<InferenceError> for DmlError {
    fn from(err: InferenceError) -> Self {
        DmlError::Inference(err)
    }
}

impl std::error::Error for DmlError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            DmlError::Data(err) => Some(err),
            DmlError::Resampling(err) => Some(err),
            DmlError::Learner(err) => Some(err),
            DmlError::Inference(err) => Some(err),
            DmlError::FoldLearner { source, .. } => Some(source),
            _ => None,
        }
    }
}

impl std::fmt::Display for DmlError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            // ---- Wrapped module errors ----
            DmlError::Data(err) => write!(f, "{err}"),
            DmlError::Resampling(err) => write!(f, "{err}"),
            DmlError::Learner(err) => write!(f, "{err}"),
            DmlError::Inference(err) => write!(f, "{err}"),
            DmlError::FoldLearner { nuisance, fold, source } => {
                write!(f, "DML Error: learner for {nuisance} failed in fold {fold:?}: {source}")
            }

            // ---- Cross-fitting ----
            DmlError::IncompletePredictions { obs, count } => write!(
                f,
                "DML Error: observation {obs} received {count} out-of-fold predictions, expected 1"
            ),
            DmlError::ScoreLengthMismatch { psi_a, psi_b } => {
                write!(f, "DML Error: psi_a has length {psi_a} but psi_b has length {psi_b}")
            }

            // ---- Moment condition ----
            DmlError::DegenerateScore { denominator } => write!(
                f,
                "DML Error: moment condition is degenerate (sum of psi_a = {denominator})"
            ),

            // ---- Configuration ----
            DmlError::UnsupportedInstruments { expected, found } => {
                write!(f, "DML Error: model requires {expected} instrument(s), found {found}")
            }
            DmlError::InvalidOption { name, value } => {
                write!(f, "DML Error: invalid value '{value}' for option {name}")
            }
        }
    }
}

#[cfg(feature = "python-bindings")]
impl From<DmlError> for PyErr {
    fn from(err: DmlError) -> PyErr {
        PyValueError::new_err(err.to_string())
    }
}
