//! data — validated containers for cluster-robust DML inputs.
//!
//! Purpose
//! -------
//! Provide [`ClusterData`], the single entry point through which outcome,
//! treatment, covariate, instrument, and cluster columns enter the crate,
//! together with its error type [`DataError`].
//!
//! Key behaviors
//! -------------
//! - Validate row counts and finiteness once at construction.
//! - Encode raw cluster labels into dense per-dimension codes used by
//!   `resampling` and `inference`.
//!
//! Downstream usage
//! ----------------
//! - Build a [`ClusterData`] from raw arrays (or via `datasets`) and pass it
//!   to an estimator in `estimation`.

pub mod cluster_data;
pub mod errors;

pub use self::cluster_data::{ClusterData, encode_cluster_column};
pub use self::errors::{DataError, DataResult};
