//! resampling::errors — configuration and integrity failures for cluster
//! sample splitting.
//!
//! Purpose
//! -------
//! Collect every way a cluster split can be misconfigured (fold counts,
//! repetitions, cluster dimensions) or internally inconsistent (empty folds,
//! cluster ids appearing on both sides of a fold) into one enum,
//! [`ResamplingError`], with a matching [`ResamplingResult`] alias.
//!
//! Conventions
//! -----------
//! - `dim` payloads are 0-based cluster dimensions; `fold` payloads are the
//!   per-dimension fold indices of the offending fold.
//! - Configuration variants are raised before any randomization or fitting
//!   happens; integrity variants are raised by `validation` when checking
//!   caller-supplied splits.

#[cfg(feature = "python-bindings")]
use pyo3::{PyErr, exceptions::PyValueError};

pub type ResamplingResult<T> = Result<T, ResamplingError>;

/// ResamplingError — invalid configuration or broken cluster split.
#[derive(Debug, Clone, PartialEq)]
pub enum ResamplingError {
    // ---- Configuration ----
    /// Cross-fitting needs at least two folds per dimension.
    InvalidFoldCount { n_folds: usize },

    /// More folds than distinct clusters in a dimension would leave a fold empty.
    TooManyFolds { dim: usize, n_folds: usize, n_clusters: usize },

    /// At least one repetition is required.
    InvalidRepetitions { n_rep: usize },

    /// Only one- and two-way clustering are supported.
    InvalidClusterDims { n_cluster_vars: usize },

    // ---- Shape ----
    /// Cluster code vectors, partitions, or counts disagree in size.
    LengthMismatch { what: &'static str, expected: usize, found: usize },

    /// A cluster code is not below the dimension's cluster count.
    CodeOutOfRange { dim: usize, obs: usize, code: usize, n_clusters: usize },

    // ---- Partition integrity ----
    /// A cluster was assigned to a fold index `>= n_folds`.
    InvalidAssignment { cluster: usize, fold: usize, n_folds: usize },

    /// A partition fold holds no clusters.
    EmptyFold { fold: usize },

    /// A cluster id is missing from, or repeated in, a partition.
    ClusterNotPartitioned { dim: usize, cluster: usize, count: usize },

    // ---- Fold integrity ----
    /// A cluster id is used for both nuisance training and scoring in one fold.
    ClusterLeak { fold: Vec<usize>, dim: usize, cluster: usize },

    /// An observation is scored by zero or several folds in one repetition.
    ObservationNotScoredOnce { obs: usize, count: usize },
}

impl std::error::Error for ResamplingError {}

impl std::fmt::Display for ResamplingError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            // ---- Configuration ----
            ResamplingError::InvalidFoldCount { n_folds } => {
                write!(f, "Resampling Error: n_folds = {n_folds}; at least 2 folds are required")
            }
            ResamplingError::TooManyFolds { dim, n_folds, n_clusters } => write!(
                f,
                "Resampling Error: n_folds = {n_folds} exceeds the {n_clusters} distinct \
                 clusters in cluster dimension {dim}"
            ),
            ResamplingError::InvalidRepetitions { n_rep } => {
                write!(f, "Resampling Error: n_rep = {n_rep}; at least 1 repetition is required")
            }
            ResamplingError::InvalidClusterDims { n_cluster_vars } => write!(
                f,
                "Resampling Error: {n_cluster_vars} cluster dimensions given; only 1 or 2 are supported"
            ),

            // ---- Shape ----
            ResamplingError::LengthMismatch { what, expected, found } => {
                write!(f, "Resampling Error: {what} has length {found}, expected {expected}")
            }
            ResamplingError::CodeOutOfRange { dim, obs, code, n_clusters } => write!(
                f,
                "Resampling Error: observation {obs} has cluster code {code} in dimension {dim} \
                 but only {n_clusters} clusters exist"
            ),

            // ---- Partition integrity ----
            ResamplingError::InvalidAssignment { cluster, fold, n_folds } => write!(
                f,
                "Resampling Error: cluster {cluster} assigned to fold {fold} of {n_folds}"
            ),
            ResamplingError::EmptyFold { fold } => {
                write!(f, "Resampling Error: fold {fold} contains no clusters")
            }
            ResamplingError::ClusterNotPartitioned { dim, cluster, count } => write!(
                f,
                "Resampling Error: cluster {cluster} in dimension {dim} appears in {count} folds \
                 instead of exactly one"
            ),

            // ---- Fold integrity ----
            ResamplingError::ClusterLeak { fold, dim, cluster } => write!(
                f,
                "Resampling Error: cluster {cluster} of dimension {dim} is used for both training \
                 and scoring in fold {fold:?}"
            ),
            ResamplingError::ObservationNotScoredOnce { obs, count } => write!(
                f,
                "Resampling Error: observation {obs} is scored by {count} folds instead of exactly one"
            ),
        }
    }
}

#[cfg(feature = "python-bindings")]
impl From<ResamplingError> for PyErr {
    fn from(err: ResamplingError) -> PyErr {
        PyValueError::new_err(err.to_string())
    }
}
