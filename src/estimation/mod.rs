//! estimation — cross-fitted DML estimators for clustered data.
//!
//! Purpose
//! -------
//! Orchestrate a full double machine learning fit: draw cluster splits,
//! cross-fit the nuisance learners, evaluate the Neyman-orthogonal score,
//! solve the moment condition, and attach cluster-robust inference.
//!
//! Key behaviors
//! -------------
//! - [`DoubleMLPLR`] (partialling out / IV-type) and [`DoubleMLPLIV`]
//!   (partialling out, one instrument) share one fit loop.
//! - [`DmlOptions`] carries the fold count, repetitions, [`DmlProcedure`],
//!   seed, and the parallelism switch.
//! - [`crossfit_predict`] fits one learner per fold, concurrently with
//!   rayon, and returns out-of-fold predictions in observation order.
//! - [`DmlOutcome`] holds aggregated and per-repetition estimates together
//!   with splits, score elements, and variance components.
//!
//! Invariants & assumptions
//! ------------------------
//! - The fold count is checked against every cluster dimension before any
//!   learner is trained.
//! - Nuisance predictions for an observation come from a model trained
//!   without any observation sharing either of its cluster ids.
//!
//! Conventions
//! -----------
//! - Progress is reported through the `log` facade: `info!` per fit and per
//!   treatment, `debug!` per repetition, `warn!` for overridden options.
//!
//! Testing notes
//! -------------
//! - Unit tests fit the estimators on simulated data from `datasets`; the
//!   integration suite under `tests/` covers one-way and two-way pipelines.

mod engine;
pub mod errors;
pub mod nuisance;
pub mod options;
pub mod pliv;
pub mod plr;
pub mod results;
pub mod score;

// ---- Re-exports (primary surface) -----------------------------------------

pub use self::errors::{DmlError, DmlResult};
pub use self::nuisance::crossfit_predict;
pub use self::options::{DmlOptions, DmlProcedure, PlrScore};
pub use self::pliv::DoubleMLPLIV;
pub use self::plr::DoubleMLPLR;
pub use self::results::DmlOutcome;
pub use self::score::ScoreElements;
