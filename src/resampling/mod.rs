//! resampling — multiway-cluster sample splitting for cross-fitting.
//!
//! Purpose
//! -------
//! Split clustered observations into cross-fitting folds such that no
//! observation sharing a cluster id (in either dimension) with a fold's
//! score side is ever used to train that fold's nuisance models.
//!
//! Key behaviors
//! -------------
//! - [`ClusterPartition`] partitions the cluster ids of one dimension into
//!   `K` random, non-empty folds.
//! - [`ClusterSplit`] combines one partition per dimension into `K²`
//!   (two-way) or `K` (one-way) [`ClusterFold`]s with observation-level
//!   train/test indices.
//! - [`ClusterResampling`] repeats the procedure `n_rep` times with fresh
//!   randomization.
//! - [`validate_fold_count`] and [`validate_cluster_split`] guard the
//!   configuration and the integrity of caller-supplied splits.
//!
//! Invariants & assumptions
//! ------------------------
//! - `2 ≤ K ≤ min(N, M)`; violations are configuration errors raised before
//!   any fitting.
//! - Within a repetition each observation is scored by exactly one fold.
//!
//! Downstream usage
//! ----------------
//! - `estimation` draws splits through [`ClusterResampling::split_data`] and
//!   iterates folds for nuisance fitting.
//! - `inference` reads per-fold cluster sets for the variance estimator.
//!
//! Testing notes
//! -------------
//! - Each submodule carries unit tests for the invariants above; the
//!   integration suite checks splits end to end through the estimators.

pub mod errors;
pub mod folds;
pub mod partition;
pub mod splitter;
pub mod validation;

// ---- Re-exports (primary surface) -----------------------------------------

pub use self::errors::{ResamplingError, ResamplingResult};
pub use self::folds::{ClusterFold, ClusterSplit};
pub use self::partition::ClusterPartition;
pub use self::splitter::ClusterResampling;
pub use self::validation::{validate_cluster_split, validate_fold_count};
