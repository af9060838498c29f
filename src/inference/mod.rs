//! inference — cluster-robust standard errors and summaries for DML estimates.
//!
//! Purpose
//! -------
//! Provide post-estimation uncertainty quantification on top of cross-fitted
//! scores. This module turns per-observation score values into a sandwich
//! variance that is robust to dependence along one or two cluster
//! dimensions, and then into standard errors, confidence intervals, and
//! p-values.
//!
//! Key behaviors
//! -------------
//! - Define a unified error and result type, [`InferenceError`] and
//!   [`InferenceResult`], for inference-specific failures (empty cluster
//!   folds, degenerate Jacobian, invalid levels).
//! - Estimate Ĵ, Γ̂, σ̂² and the standard error with
//!   [`ClusterVariance::estimate`], using the fold structure of a
//!   [`crate::resampling::ClusterSplit`].
//! - Build normal confidence intervals with [`ConfidenceInterval::normal`]
//!   and test statistics with [`t_stat`] / [`p_value`].
//! - Combine repetitions with [`aggregate_repetitions`] (median rule).
//!
//! Invariants & assumptions
//! ------------------------
//! - Scores are supplied in their linear form `ψ = ψ_a·θ̃ + ψ_b`; `psi` and
//!   `psi_a` share the observation order of the data the split was built on.
//! - The variance scaling factor is `C = min(N, M)` for two-way clustering
//!   and `C = N` for one-way clustering.
//! - All numerical routines return [`InferenceError`] on failure rather
//!   than panicking.
//!
//! Conventions
//! -----------
//! - Functions are pure with respect to I/O: no logging and no global
//!   state. Logging of fitted results happens in `estimation`.
//!
//! Downstream usage
//! ----------------
//! - `estimation` calls [`ClusterVariance::estimate`] once per treatment and
//!   repetition, then [`aggregate_repetitions`] across repetitions.
//! - Library users typically go through `DmlOutcome::confint`, which wraps
//!   [`ConfidenceInterval::normal`].
//!
//! Testing notes
//! -------------
//! - Unit tests cover hand-computed one-way and two-way variance
//!   components, fold-order invariance, interval symmetry, and
//!   aggregation edge cases.

pub mod aggregation;
pub mod confint;
pub mod errors;
pub mod variance;

// ---- Re-exports (primary surface) -----------------------------------------

pub use self::aggregation::aggregate_repetitions;
pub use self::confint::{ConfidenceInterval, normal_quantile, p_value, t_stat};
pub use self::errors::{InferenceError, InferenceResult};
pub use self::variance::ClusterVariance;

// ---- Optional convenience prelude for downstream crates ------------------
//
// Downstream crates can `use rust_dml::inference::prelude::*;` to import the
// primary inference surface in a single line.

pub mod prelude {
    pub use super::aggregation::aggregate_repetitions;
    pub use super::confint::{ConfidenceInterval, normal_quantile, p_value, t_stat};
    pub use super::errors::{InferenceError, InferenceResult};
    pub use super::variance::ClusterVariance;
}
