//! utils — Python-to-Rust conversion helpers for the PyO3 bindings.
//!
//! Every helper accepts numpy arrays, pandas objects (through `to_numpy`),
//! or plain Python sequences, and maps conversion failures to `TypeError` /
//! `ValueError` before any estimation code runs.

#[cfg(feature = "python-bindings")]
use std::sync::Arc;

#[cfg(feature = "python-bindings")]
use ndarray::{Array1, Array2, Axis};

#[cfg(feature = "python-bindings")]
use pyo3::{
    exceptions::{PyTypeError, PyValueError},
    prelude::*,
    types::PyAny,
};

#[cfg(feature = "python-bindings")]
use crate::{
    data::ClusterData,
    learners::{Learner, LinearRegression, MeanRegressor},
};

#[cfg(feature = "python-bindings")]
use numpy::{
    IntoPyArray,    // Vec → PyArray
    PyArrayMethods, // .readonly()
    PyReadonlyArray1, PyReadonlyArray2,
};

/// Extract a contiguous 1-D float64 array from an ndarray, Series, or
/// sequence.
#[cfg(feature = "python-bindings")]
#[inline]
pub fn extract_f64_array<'py>(
    py: Python<'py>, raw_data: &Bound<'py, PyAny>,
) -> PyResult<PyReadonlyArray1<'py, f64>> {
    if let Ok(arr_ro) = raw_data.extract::<PyReadonlyArray1<f64>>() {
        if arr_ro.as_slice().is_ok() {
            return Ok(arr_ro);
        }
    }

    if let Ok(obj) = raw_data.call_method("to_numpy", (false,), None) {
        if let Ok(series_ro) = obj.extract::<PyReadonlyArray1<f64>>() {
            if series_ro.as_slice().is_ok() {
                return Ok(series_ro);
            }
        }
    }

    let vec: Vec<f64> = raw_data.extract().map_err(|_| {
        PyTypeError::new_err("expected a 1-D numpy.ndarray, pandas.Series, or sequence of float64")
    })?;
    Ok(vec.into_pyarray(py).readonly())
}

/// Extract an `n × p` float64 matrix. 1-D inputs become a single column.
#[cfg(feature = "python-bindings")]
pub fn extract_f64_matrix<'py>(
    py: Python<'py>, raw_data: &Bound<'py, PyAny>, name: &str,
) -> PyResult<Array2<f64>> {
    if let Ok(arr_ro) = raw_data.extract::<PyReadonlyArray2<f64>>() {
        return Ok(arr_ro.as_array().to_owned());
    }
    if let Ok(obj) = raw_data.call_method("to_numpy", (), None) {
        if let Ok(frame_ro) = obj.extract::<PyReadonlyArray2<f64>>() {
            return Ok(frame_ro.as_array().to_owned());
        }
    }
    if let Ok(rows) = raw_data.extract::<Vec<Vec<f64>>>() {
        return rows_to_matrix(rows, name);
    }

    let column = extract_f64_array(py, raw_data).map_err(|_| {
        PyTypeError::new_err(format!(
            "{name} must be a 2-D numpy.ndarray, pandas.DataFrame, or sequence of float64"
        ))
    })?;
    Ok(column.as_array().to_owned().insert_axis(Axis(1)))
}

/// Extract cluster labels as an `n × c` int64 matrix (`c ∈ {1, 2}`).
#[cfg(feature = "python-bindings")]
pub fn extract_cluster_matrix(raw_data: &Bound<'_, PyAny>) -> PyResult<Array2<i64>> {
    let source = match raw_data.call_method("to_numpy", (), None) {
        Ok(obj) => obj,
        Err(_) => raw_data.clone(),
    };
    if let Ok(arr_ro) = source.extract::<PyReadonlyArray2<i64>>() {
        return Ok(arr_ro.as_array().to_owned());
    }
    if let Ok(arr_ro) = source.extract::<PyReadonlyArray1<i64>>() {
        return Ok(arr_ro.as_array().to_owned().insert_axis(Axis(1)));
    }
    if let Ok(rows) = source.extract::<Vec<Vec<i64>>>() {
        let n_rows = rows.len();
        let n_cols = rows.first().map_or(0, Vec::len);
        if rows.iter().any(|r| r.len() != n_cols) {
            return Err(PyValueError::new_err("cluster rows must all have the same length"));
        }
        let flat: Vec<i64> = rows.into_iter().flatten().collect();
        return Array2::from_shape_vec((n_rows, n_cols), flat)
            .map_err(|e| PyValueError::new_err(e.to_string()));
    }
    let column: Vec<i64> = source.extract().map_err(|_| {
        PyTypeError::new_err("clusters must be a 1-D or 2-D array or sequence of integers")
    })?;
    Ok(Array1::from(column).insert_axis(Axis(1)))
}

/// Assemble a validated [`ClusterData`] from Python inputs.
///
/// `x = None` means no covariates.
#[cfg(feature = "python-bindings")]
pub fn extract_cluster_data<'py>(
    py: Python<'py>, y: &Bound<'py, PyAny>, d: &Bound<'py, PyAny>,
    x: Option<&Bound<'py, PyAny>>, clusters: &Bound<'py, PyAny>,
    z: Option<&Bound<'py, PyAny>>,
) -> PyResult<ClusterData> {
    let y_arr = extract_f64_array(py, y)?.as_array().to_owned();
    let d_mat = extract_f64_matrix(py, d, "d")?;
    let x_mat = match x {
        Some(raw) => extract_f64_matrix(py, raw, "x")?,
        None => Array2::zeros((y_arr.len(), 0)),
    };
    let z_mat = z.map(|raw| extract_f64_matrix(py, raw, "z")).transpose()?;
    let cluster_mat = extract_cluster_matrix(clusters)?;

    Ok(ClusterData::new(y_arr, d_mat, x_mat, z_mat, cluster_mat)?)
}

/// Build a built-in nuisance learner from its Python name.
///
/// - `"linear"` / `"ols"`: OLS with intercept.
/// - `"ridge"`: ridge with `ridge_penalty` (default 1.0).
/// - `"mean"`: training-mean baseline.
#[cfg(feature = "python-bindings")]
pub fn build_learner(name: Option<&str>, ridge_penalty: Option<f64>) -> PyResult<Arc<dyn Learner>> {
    let name = name.unwrap_or("linear").to_lowercase();
    match name.as_str() {
        "linear" | "ols" => Ok(Arc::new(LinearRegression::ols())),
        "ridge" => Ok(Arc::new(LinearRegression::ridge(ridge_penalty.unwrap_or(1.0))?)),
        "mean" => Ok(Arc::new(MeanRegressor)),
        other => Err(PyValueError::new_err(format!(
            "invalid learner {:?} (expected 'linear', 'ridge', or 'mean')",
            other
        ))),
    }
}

#[cfg(feature = "python-bindings")]
fn rows_to_matrix(rows: Vec<Vec<f64>>, name: &str) -> PyResult<Array2<f64>> {
    let n_rows = rows.len();
    let n_cols = rows.first().map_or(0, Vec::len);
    if rows.iter().any(|r| r.len() != n_cols) {
        return Err(PyValueError::new_err(format!("{name} rows must all have the same length")));
    }
    let flat: Vec<f64> = rows.into_iter().flatten().collect();
    Array2::from_shape_vec((n_rows, n_cols), flat).map_err(|e| PyValueError::new_err(e.to_string()))
}
