//! DML options — configuration for cross-fitted estimation.
//!
//! Purpose
//! -------
//! Collect the knobs shared by every DML estimator in one place: fold count,
//! repetitions, how the moment condition is solved, seeding, and whether
//! folds are fit in parallel.
//!
//! Key behaviors
//! -------------
//! - [`DmlOptions::new`] validates fold count and repetitions up front.
//! - [`DmlOptions::resampling`] turns the options into the
//!   [`ClusterResampling`] used to draw splits.
//! - [`DmlProcedure`] and [`PlrScore`] parse from the strings used on the
//!   Python side (`"dml1"`, `"dml2"`, `"partialling out"`, `"IV-type"`).
//!
//! Invariants & assumptions
//! ------------------------
//! - Whether `n_folds` fits the data (`K ≤ min(N, M)`) is checked against
//!   the data at fit time, still before any learner is trained.
use crate::{
    estimation::errors::{DmlError, DmlResult},
    resampling::{
        ClusterResampling,
        validation::{validate_fold_count, validate_repetitions},
    },
};
use std::str::FromStr;

/// How the moment condition is solved across folds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum DmlProcedure {
    /// Solve per fold, then average the fold estimates.
    Dml1,
    /// Solve once on fold-weighted pooled score sums.
    #[default]
    Dml2,
}

impl FromStr for DmlProcedure {
    type Err = DmlError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "dml1" => Ok(DmlProcedure::Dml1),
            "dml2" => Ok(DmlProcedure::Dml2),
            _ => Err(DmlError::InvalidOption { name: "dml_procedure", value: s.to_string() }),
        }
    }
}

impl std::fmt::Display for DmlProcedure {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            DmlProcedure::Dml1 => write!(f, "dml1"),
            DmlProcedure::Dml2 => write!(f, "dml2"),
        }
    }
}

/// Neyman-orthogonal score of the partially linear regression model.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum PlrScore {
    /// `ψ = (D − m̂)(Y − ℓ̂ − θ(D − m̂))`.
    #[default]
    PartiallingOut,
    /// `ψ = (D − m̂)(Y − ĝ − θD)`.
    IvType,
}

impl FromStr for PlrScore {
    type Err = DmlError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().replace(['_', '-'], " ").as_str() {
            "partialling out" => Ok(PlrScore::PartiallingOut),
            "iv type" => Ok(PlrScore::IvType),
            _ => Err(DmlError::InvalidOption { name: "score", value: s.to_string() }),
        }
    }
}

impl std::fmt::Display for PlrScore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            PlrScore::PartiallingOut => write!(f, "partialling out"),
            PlrScore::IvType => write!(f, "IV-type"),
        }
    }
}

/// DmlOptions — estimation-time configuration for DML estimators.
///
/// Fields
/// ------
/// - `n_folds`: folds per cluster dimension (`K ≥ 2`); two-way clustering
///   yields `K²` folds.
/// - `n_rep`: independent repetitions of the sample split (`≥ 1`).
/// - `procedure`: [`DmlProcedure`] used to solve the moment condition.
/// - `random_seed`: seed for reproducible splits; `None` draws from entropy.
/// - `parallel`: fit folds concurrently with rayon. Results do not depend
///   on this flag.
///
/// Notes
/// -----
/// - `Default` is `K = 5`, one repetition, `dml2`, unseeded, parallel.
#[derive(Debug, Clone, PartialEq)]
pub struct DmlOptions {
    pub n_folds: usize,
    pub n_rep: usize,
    pub procedure: DmlProcedure,
    pub random_seed: Option<u64>,
    pub parallel: bool,
}

impl DmlOptions {
    /// Construct validated options.
    ///
    /// Errors
    /// ------
    /// - `ResamplingError::InvalidFoldCount` if `n_folds < 2`.
    /// - `ResamplingError::InvalidRepetitions` if `n_rep == 0`.
    ///
    /// Examples
    /// --------
    /// ```rust
    /// # use rust_dml::estimation::{DmlOptions, DmlProcedure};
    /// let opts = DmlOptions::new(3, 2, DmlProcedure::Dml2, Some(1234), true).unwrap();
    /// assert_eq!(opts.resampling().n_folds, 3);
    /// assert!(DmlOptions::new(1, 1, DmlProcedure::Dml2, None, true).is_err());
    /// ```
    pub fn new(
        n_folds: usize, n_rep: usize, procedure: DmlProcedure, random_seed: Option<u64>,
        parallel: bool,
    ) -> DmlResult<Self> {
        validate_fold_count(n_folds, usize::MAX, 0)?;
        validate_repetitions(n_rep)?;
        Ok(DmlOptions { n_folds, n_rep, procedure, random_seed, parallel })
    }

    /// Resampling configuration matching these options.
    pub fn resampling(&self) -> ClusterResampling {
        ClusterResampling {
            n_folds: self.n_folds,
            n_rep: self.n_rep,
            random_seed: self.random_seed,
        }
    }
}

impl Default for DmlOptions {
    fn default() -> Self {
        DmlOptions {
            n_folds: 5,
            n_rep: 1,
            procedure: DmlProcedure::Dml2,
            random_seed: None,
            parallel: true,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::resampling::ResamplingError;

    #[test]
    fn default_matches_documented_values() {
        let opts = DmlOptions::default();
        assert_eq!(opts.n_folds, 5);
        assert_eq!(opts.n_rep, 1);
        assert_eq!(opts.procedure, DmlProcedure::Dml2);
        assert!(opts.random_seed.is_none());
        assert!(opts.parallel);
    }

    #[test]
    fn new_rejects_degenerate_configuration() {
        assert_eq!(
            DmlOptions::new(0, 1, DmlProcedure::Dml1, None, false),
            Err(DmlError::Resampling(ResamplingError::InvalidFoldCount { n_folds: 0 }))
        );
        assert_eq!(
            DmlOptions::new(2, 0, DmlProcedure::Dml1, None, false),
            Err(DmlError::Resampling(ResamplingError::InvalidRepetitions { n_rep: 0 }))
        );
    }

    #[test]
    fn option_strings_parse() {
        assert_eq!("dml1".parse::<DmlProcedure>(), Ok(DmlProcedure::Dml1));
        assert_eq!("DML2".parse::<DmlProcedure>(), Ok(DmlProcedure::Dml2));
        assert_eq!("partialling out".parse::<PlrScore>(), Ok(PlrScore::PartiallingOut));
        assert_eq!("IV-type".parse::<PlrScore>(), Ok(PlrScore::IvType));
        assert!("dml3".parse::<DmlProcedure>().is_err());
        assert!(matches!(
            "ATE".parse::<PlrScore>(),
            Err(DmlError::InvalidOption { name: "score", .. })
        ));
    }
}
