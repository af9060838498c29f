//! data::errors — validation failures for cluster data containers.
//!
//! Purpose
//! -------
//! Provide the error enum and result alias used when raw arrays are turned
//! into a validated [`ClusterData`](crate::data::ClusterData). Every check
//! performed at construction time maps to exactly one variant here so that
//! callers (and the Python bindings) can report the offending column and row.
//!
//! Conventions
//! -----------
//! - Row and column indices are 0-based.
//! - `field` payloads name the logical column family (`"y"`, `"d"`, `"x"`,
//!   `"z"`, `"clusters"`), not user-facing column labels.

#[cfg(feature = "python-bindings")]
use pyo3::{PyErr, exceptions::PyValueError};

pub type DataResult<T> = Result<T, DataError>;

/// DataError — invalid inputs for [`ClusterData`](crate::data::ClusterData).
///
/// Variants
/// --------
/// - `EmptyData`
///   The outcome vector has no observations.
/// - `LengthMismatch { field, expected, found }`
///   A column family does not have the same number of rows as `y`.
/// - `NoTreatment`
///   The treatment matrix has zero columns.
/// - `EmptyInstruments`
///   An instrument matrix was supplied but has zero columns.
/// - `NonFiniteValue { field, row, col, value }`
///   A numeric entry is NaN or ±∞.
/// - `InvalidClusterDims { n_cluster_vars }`
///   Only one or two cluster columns are supported.
/// - `TreatmentOutOfRange { index, n_treat }`
///   A treatment column index is not in `0..n_treat`.
/// - `MissingInstrument`
///   An instrument was requested but the data carries none.
/// - `TreatmentNamesMismatch { expected, found }`
///   The number of treatment names differs from the number of columns.
#[derive(Debug, Clone, PartialEq)]
pub enum DataError {
    // ---- Shape ----
    EmptyData,
    LengthMismatch { field: &'static str, expected: usize, found: usize },
    NoTreatment,
    EmptyInstruments,

    // ---- Values ----
    NonFiniteValue { field: &'static str, row: usize, col: usize, value: f64 },

    // ---- Clusters ----
    InvalidClusterDims { n_cluster_vars: usize },

    // ---- Access ----
    TreatmentOutOfRange { index: usize, n_treat: usize },
    MissingInstrument,
    TreatmentNamesMismatch { expected: usize, found: usize },
}

impl std::error::Error for DataError {}

impl std::fmt::Display for DataError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            DataError::EmptyData => write!(f, "Data Error: outcome vector is empty"),
            DataError::LengthMismatch { field, expected, found } => write!(
                f,
                "Data Error: '{field}' has {found} rows but the outcome has {expected}"
            ),
            DataError::NoTreatment => {
                write!(f, "Data Error: at least one treatment column is required")
            }
            DataError::EmptyInstruments => {
                write!(f, "Data Error: instrument matrix was supplied without columns")
            }
            DataError::NonFiniteValue { field, row, col, value } => write!(
                f,
                "Data Error: non-finite value {value} in '{field}' at row {row}, column {col}"
            ),
            DataError::InvalidClusterDims { n_cluster_vars } => write!(
                f,
                "Data Error: {n_cluster_vars} cluster columns given; only one or two are supported"
            ),
            DataError::TreatmentOutOfRange { index, n_treat } => write!(
                f,
                "Data Error: treatment index {index} out of range for {n_treat} treatment columns"
            ),
            DataError::MissingInstrument => {
                write!(f, "Data Error: model requires an instrument but none was supplied")
            }
            DataError::TreatmentNamesMismatch { expected, found } => write!(
                f,
                "Data Error: {found} treatment names given for {expected} treatment columns"
            ),
        }
    }
}

#[cfg(feature = "python-bindings")]
impl From<DataError> for PyErr {
    fn from(err: DataError) -> PyErr {
        PyValueError::new_err(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    // Purpose
    // -------
    // Make sure row/column payloads reach the rendered message.
    //
    // Given
    // -----
    // - A `NonFiniteValue` error at row 7, column 2 of `x`.
    //
    // Expect
    // ------
    // - The message names the field and both indices.
    fn non_finite_value_display_includes_location() {
        // Arrange
        let err = DataError::NonFiniteValue { field: "x", row: 7, col: 2, value: f64::NAN };

        // Act
        let msg = err.to_string();

        // Assert
        assert!(msg.contains("'x'"), "missing field in: {msg}");
        assert!(msg.contains("row 7"), "missing row in: {msg}");
        assert!(msg.contains("column 2"), "missing column in: {msg}");
    }

    #[test]
    fn invalid_cluster_dims_display_includes_count() {
        let msg = DataError::InvalidClusterDims { n_cluster_vars: 3 }.to_string();
        assert!(msg.contains('3'), "missing count in: {msg}");
    }
}
