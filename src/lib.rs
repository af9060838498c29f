//! rust_dml — multiway-cluster double machine learning with Python bindings.
//!
//! Purpose
//! -------
//! Serve as the crate root for Rust callers and as the PyO3 bridge that exposes
//! cluster-robust DML estimation to Python via the `_rust_dml` extension
//! module. When the `python-bindings` feature is enabled, this module defines
//! the Python-facing classes and submodules used by the `rust_dml` package.
//!
//! Key behaviors
//! -------------
//! - Re-export the core Rust modules as the public crate surface:
//!   `data` (validated clustered samples), `resampling` (one-way / two-way
//!   cluster cross-fitting splits), `learners` (nuisance regressions),
//!   `inference` (cluster-robust variance), `estimation` (PLR / PLIV), and
//!   `datasets` (simulated clustered data).
//! - Define `#[pyclass]` wrappers and the `#[pymodule]` initializer for the
//!   `_rust_dml` Python extension.
//! - Create and register Python submodules (`resampling`, `double_ml`) under
//!   `rust_dml` so that dot-notation imports work as expected.
//!
//! Invariants & assumptions
//! ------------------------
//! - All heavy numerical work is implemented in the inner Rust modules; this
//!   file performs only FFI glue, input validation, and error mapping.
//! - On successful conversion from Python objects to Rust types, the
//!   invariants documented in the core modules are assumed to hold.
//!
//! Conventions
//! -----------
//! - Python-exposed classes live under `_rust_dml.<submodule>` and are
//!   typically wrapped by thin pure-Python facades.
//! - Errors from core Rust code are propagated as rich error types internally
//!   and converted to `PyErr` values at the PyO3 boundary.
//!
//! Downstream usage
//! ----------------
//! - Native Rust code should depend directly on the inner modules and can
//!   ignore the PyO3 items guarded by the `python-bindings` feature.
//!
//! Testing notes
//! -------------
//! - Core numerical behavior is covered by unit tests in the inner modules and
//!   by the integration suite under `tests/`.

pub mod data;
pub mod datasets;
pub mod estimation;
pub mod inference;
pub mod learners;
pub mod resampling;
pub mod utils;

#[cfg(feature = "python-bindings")]
use ndarray::Axis;

#[cfg(feature = "python-bindings")]
use pyo3::{prelude::*, types::PyAny};

#[cfg(feature = "python-bindings")]
use crate::{
    estimation::{DmlOptions, DmlOutcome, DmlProcedure, DoubleMLPLIV, DoubleMLPLR, PlrScore},
    data::encode_cluster_column,
    resampling::{ClusterResampling, validation::validate_cluster_dims},
    utils::{build_learner, extract_cluster_data, extract_cluster_matrix},
};

/// ClusterResampler — Python-facing wrapper for cluster cross-fitting splits.
///
/// Purpose
/// -------
/// Let Python callers inspect the train/test assignment that the estimators
/// use, e.g. to plot the fold grid.
///
/// Parameters
/// ----------
/// Constructed from Python via `ClusterResampler(n_folds=5, n_rep=1,
/// random_seed=None)`.
///
/// Fields
/// ------
/// - `inner`: [`ClusterResampling`]
///   Validated resampling configuration.
#[cfg(feature = "python-bindings")]
#[pyclass(module = "rust_dml.resampling")]
pub struct ClusterResampler {
    inner: ClusterResampling,
}

#[cfg(feature = "python-bindings")]
#[pymethods]
impl ClusterResampler {
    #[new]
    #[pyo3(
        text_signature = "(n_folds=5, n_rep=1, random_seed=None)",
        signature = (n_folds = 5, n_rep = 1, random_seed = None)
    )]
    pub fn new(n_folds: usize, n_rep: usize, random_seed: Option<u64>) -> PyResult<Self> {
        Ok(ClusterResampler { inner: ClusterResampling::new(n_folds, n_rep, random_seed)? })
    }

    /// Draw splits for `clusters` (one or two columns of integer labels).
    ///
    /// Returns one list of `(train, test)` index lists per repetition.
    #[pyo3(text_signature = "(self, clusters, /)")]
    pub fn split<'py>(
        &self, clusters: &Bound<'py, PyAny>,
    ) -> PyResult<Vec<Vec<(Vec<usize>, Vec<usize>)>>> {
        let labels = extract_cluster_matrix(clusters)?;
        validate_cluster_dims(labels.ncols())?;
        let (codes, uniques): (Vec<_>, Vec<_>) =
            labels.axis_iter(Axis(1)).map(encode_cluster_column).unzip();
        let n_clusters: Vec<usize> = uniques.iter().map(Vec::len).collect();
        let code_slices: Vec<&[usize]> = codes.iter().map(Vec::as_slice).collect();
        let splits = self.inner.split(&code_slices, &n_clusters)?;
        Ok(splits.iter().map(|s| s.train_test_pairs()).collect())
    }

    #[getter]
    pub fn n_folds(&self) -> usize {
        self.inner.n_folds
    }

    #[getter]
    pub fn n_rep(&self) -> usize {
        self.inner.n_rep
    }
}

/// PLR — Python-facing wrapper for [`DoubleMLPLR`] with built-in learners.
///
/// Parameters
/// ----------
/// Constructed from Python via `PLR(n_folds=5, n_rep=1, score='partialling
/// out', dml_procedure='dml2', learner='linear', ridge_penalty=None,
/// random_seed=None)`. The same learner family is used for every nuisance
/// function.
///
/// Fields
/// ------
/// - `inner`: [`DoubleMLPLR`]
/// - `outcome`: result of the last `fit`, if any.
#[cfg(feature = "python-bindings")]
#[pyclass(module = "rust_dml.double_ml")]
pub struct PLR {
    inner: DoubleMLPLR,
    outcome: Option<DmlOutcome>,
}

#[cfg(feature = "python-bindings")]
#[pymethods]
impl PLR {
    #[new]
    #[pyo3(
        text_signature = "(n_folds=5, n_rep=1, score='partialling out', dml_procedure='dml2', \
                          learner='linear', ridge_penalty=None, random_seed=None)",
        signature = (
            n_folds = 5,
            n_rep = 1,
            score = None,
            dml_procedure = None,
            learner = None,
            ridge_penalty = None,
            random_seed = None,
        )
    )]
    pub fn new(
        n_folds: usize, n_rep: usize, score: Option<&str>, dml_procedure: Option<&str>,
        learner: Option<&str>, ridge_penalty: Option<f64>, random_seed: Option<u64>,
    ) -> PyResult<Self> {
        let score: PlrScore = score.unwrap_or("partialling out").parse()?;
        let options = python_options(n_folds, n_rep, dml_procedure, random_seed)?;
        let inner = DoubleMLPLR::new(
            build_learner(learner, ridge_penalty)?,
            build_learner(learner, ridge_penalty)?,
            options,
        )
        .with_score(score);
        Ok(PLR { inner, outcome: None })
    }

    /// Fit on outcome `y`, treatment(s) `d`, covariates `x` and `clusters`.
    #[pyo3(
        signature = (y, d, clusters, x = None),
        text_signature = "(self, y, d, clusters, /, x=None)"
    )]
    pub fn fit<'py>(
        &mut self, py: Python<'py>, y: &Bound<'py, PyAny>, d: &Bound<'py, PyAny>,
        clusters: &Bound<'py, PyAny>, x: Option<&Bound<'py, PyAny>>,
    ) -> PyResult<()> {
        let data = extract_cluster_data(py, y, d, x, clusters, None)?;
        self.outcome = Some(self.inner.fit(&data)?);
        Ok(())
    }

    #[getter]
    pub fn coef(&self) -> PyResult<Vec<f64>> {
        Ok(fitted(&self.outcome)?.coef().to_vec())
    }

    #[getter]
    pub fn se(&self) -> PyResult<Vec<f64>> {
        Ok(fitted(&self.outcome)?.se().to_vec())
    }

    #[getter]
    pub fn t_stat(&self) -> PyResult<Vec<f64>> {
        Ok(fitted(&self.outcome)?.t_stat().to_vec())
    }

    #[getter]
    pub fn pvalue(&self) -> PyResult<Vec<f64>> {
        Ok(fitted(&self.outcome)?.p_value()?.to_vec())
    }

    #[pyo3(signature = (level = 0.95), text_signature = "(self, /, level=0.95)")]
    pub fn confint(&self, level: f64) -> PyResult<Vec<(f64, f64)>> {
        confint_pairs(fitted(&self.outcome)?, level)
    }

    #[getter]
    pub fn summary(&self) -> PyResult<String> {
        Ok(fitted(&self.outcome)?.summary()?)
    }
}

/// PLIV — Python-facing wrapper for [`DoubleMLPLIV`] with built-in learners.
///
/// Same constructor arguments as [`PLR`] except `score`; `fit` additionally
/// takes the instrument `z`.
#[cfg(feature = "python-bindings")]
#[pyclass(module = "rust_dml.double_ml")]
pub struct PLIV {
    inner: DoubleMLPLIV,
    outcome: Option<DmlOutcome>,
}

#[cfg(feature = "python-bindings")]
#[pymethods]
impl PLIV {
    #[new]
    #[pyo3(
        text_signature = "(n_folds=5, n_rep=1, dml_procedure='dml2', learner='linear', \
                          ridge_penalty=None, random_seed=None)",
        signature = (
            n_folds = 5,
            n_rep = 1,
            dml_procedure = None,
            learner = None,
            ridge_penalty = None,
            random_seed = None,
        )
    )]
    pub fn new(
        n_folds: usize, n_rep: usize, dml_procedure: Option<&str>, learner: Option<&str>,
        ridge_penalty: Option<f64>, random_seed: Option<u64>,
    ) -> PyResult<Self> {
        let options = python_options(n_folds, n_rep, dml_procedure, random_seed)?;
        let inner = DoubleMLPLIV::new(
            build_learner(learner, ridge_penalty)?,
            build_learner(learner, ridge_penalty)?,
            build_learner(learner, ridge_penalty)?,
            options,
        );
        Ok(PLIV { inner, outcome: None })
    }

    #[pyo3(
        signature = (y, d, z, clusters, x = None),
        text_signature = "(self, y, d, z, clusters, /, x=None)"
    )]
    pub fn fit<'py>(
        &mut self, py: Python<'py>, y: &Bound<'py, PyAny>, d: &Bound<'py, PyAny>,
        z: &Bound<'py, PyAny>, clusters: &Bound<'py, PyAny>, x: Option<&Bound<'py, PyAny>>,
    ) -> PyResult<()> {
        let data = extract_cluster_data(py, y, d, x, clusters, Some(z))?;
        self.outcome = Some(self.inner.fit(&data)?);
        Ok(())
    }

    #[getter]
    pub fn coef(&self) -> PyResult<Vec<f64>> {
        Ok(fitted(&self.outcome)?.coef().to_vec())
    }

    #[getter]
    pub fn se(&self) -> PyResult<Vec<f64>> {
        Ok(fitted(&self.outcome)?.se().to_vec())
    }

    #[getter]
    pub fn t_stat(&self) -> PyResult<Vec<f64>> {
        Ok(fitted(&self.outcome)?.t_stat().to_vec())
    }

    #[getter]
    pub fn pvalue(&self) -> PyResult<Vec<f64>> {
        Ok(fitted(&self.outcome)?.p_value()?.to_vec())
    }

    #[pyo3(signature = (level = 0.95), text_signature = "(self, /, level=0.95)")]
    pub fn confint(&self, level: f64) -> PyResult<Vec<(f64, f64)>> {
        confint_pairs(fitted(&self.outcome)?, level)
    }

    #[getter]
    pub fn summary(&self) -> PyResult<String> {
        Ok(fitted(&self.outcome)?.summary()?)
    }
}

#[cfg(feature = "python-bindings")]
fn python_options(
    n_folds: usize, n_rep: usize, dml_procedure: Option<&str>, random_seed: Option<u64>,
) -> PyResult<DmlOptions> {
    let procedure: DmlProcedure = dml_procedure.unwrap_or("dml2").parse()?;
    Ok(DmlOptions::new(n_folds, n_rep, procedure, random_seed, true)?)
}

#[cfg(feature = "python-bindings")]
fn fitted(outcome: &Option<DmlOutcome>) -> PyResult<&DmlOutcome> {
    outcome
        .as_ref()
        .ok_or_else(|| pyo3::exceptions::PyRuntimeError::new_err("model has not been fitted"))
}

#[cfg(feature = "python-bindings")]
fn confint_pairs(outcome: &DmlOutcome, level: f64) -> PyResult<Vec<(f64, f64)>> {
    Ok(outcome.confint(level)?.into_iter().map(|ci| (ci.lower, ci.upper)).collect())
}

/// _rust_dml — PyO3 module initializer for the Python extension.
///
/// Creates the `resampling` and `double_ml` submodules, attaches them to
/// `_rust_dml`, and registers them in `sys.modules` so they are importable
/// via dotted paths.
#[cfg(feature = "python-bindings")]
#[pymodule]
fn _rust_dml<'py>(_py: Python<'py>, m: &Bound<'py, PyModule>) -> PyResult<()> {
    let resampling_mod = PyModule::new(_py, "resampling")?;
    let double_ml_mod = PyModule::new(_py, "double_ml")?;
    register_resampling(_py, m, &resampling_mod)?;
    register_double_ml(_py, m, &double_ml_mod)?;

    // Manually add submodules into sys.modules to allow for dot notation.
    _py.import("sys")?.getattr("modules")?.set_item("rust_dml.resampling", resampling_mod)?;
    _py.import("sys")?.getattr("modules")?.set_item("rust_dml.double_ml", double_ml_mod)?;
    Ok(())
}

#[cfg(feature = "python-bindings")]
fn register_resampling<'py>(
    _py: Python, rust_dml: &Bound<'py, PyModule>, m: &Bound<'py, PyModule>,
) -> PyResult<()> {
    m.add_class::<ClusterResampler>()?;
    rust_dml.add_submodule(m)?;
    Ok(())
}

#[cfg(feature = "python-bindings")]
fn register_double_ml<'py>(
    _py: Python, rust_dml: &Bound<'py, PyModule>, m: &Bound<'py, PyModule>,
) -> PyResult<()> {
    m.add_class::<PLR>()?;
    m.add_class::<PLIV>()?;
    rust_dml.add_submodule(m)?;
    Ok(())
}
