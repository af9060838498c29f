//! data::cluster_data — validated observation table with cluster labels.
//!
//! Purpose
//! -------
//! Hold the outcome, treatment, covariate, optional instrument, and cluster
//! columns that a cluster-robust DML fit consumes, and translate raw cluster
//! labels into dense integer codes that the resampling and variance code can
//! index directly.
//!
//! Key behaviors
//! -------------
//! - [`ClusterData::new`] validates shapes and finiteness in a single pass
//!   per column family and rejects anything but one or two cluster columns.
//! - Raw `i64` cluster labels are encoded per dimension into codes
//!   `0..n_clusters`, assigned in ascending label order.
//! - [`ClusterData::covariates_for`] builds the covariate matrix used when
//!   estimating the effect of one treatment: `x` followed by every other
//!   treatment column.
//!
//! Invariants & assumptions
//! ------------------------
//! - `n_obs ≥ 1`; all column families share `n_obs` rows.
//! - All numeric entries are finite.
//! - `codes[dim][t] < n_clusters(dim)` for every observation `t`, and each
//!   code in `0..n_clusters(dim)` is used by at least one observation.
//!
//! Conventions
//! -----------
//! - Dimension 0 is the first cluster variable (size N), dimension 1 the
//!   second (size M) when present.
//! - Observations do not need to form a full N×M grid; empty and repeated
//!   cells are both allowed.
//!
//! Testing notes
//! -------------
//! - Unit tests cover the happy path, each validation branch, label
//!   encoding, and covariate augmentation for multi-treatment data.
use crate::data::errors::{DataError, DataResult};
use ndarray::{Array1, Array2, ArrayView1, ArrayView2, Axis, s};

/// `ClusterData` — validated DML data with one or two cluster dimensions.
///
/// Fields
/// ------
/// - `y`: outcome, length `n`.
/// - `d`: treatments, `n × n_treat` with `n_treat ≥ 1`.
/// - `x`: covariates, `n × p` (`p` may be zero).
/// - `z`: optional instruments, `n × n_instr` with `n_instr ≥ 1`.
/// - `clusters`: raw labels, `n × c` with `c ∈ {1, 2}`.
/// - `codes` / `labels`: per-dimension dense codes and the sorted unique
///   labels they index.
/// - `treatment_names`: display names, one per treatment column.
#[derive(Debug, Clone, PartialEq)]
pub struct ClusterData {
    y: Array1<f64>,
    d: Array2<f64>,
    x: Array2<f64>,
    z: Option<Array2<f64>>,
    clusters: Array2<i64>,
    codes: Vec<Vec<usize>>,
    labels: Vec<Vec<i64>>,
    treatment_names: Vec<String>,
}

impl ClusterData {
    /// Construct validated cluster data from raw arrays.
    ///
    /// Parameters
    /// ----------
    /// - `y`: `Array1<f64>`
    ///   Outcome vector; defines `n_obs`.
    /// - `d`: `Array2<f64>`
    ///   Treatment matrix with at least one column.
    /// - `x`: `Array2<f64>`
    ///   Covariate matrix (may have zero columns).
    /// - `z`: `Option<Array2<f64>>`
    ///   Optional instrument matrix.
    /// - `clusters`: `Array2<i64>`
    ///   One or two columns of raw cluster labels.
    ///
    /// Errors
    /// ------
    /// - `DataError::EmptyData`, `DataError::LengthMismatch`,
    ///   `DataError::NoTreatment`, `DataError::EmptyInstruments`,
    ///   `DataError::NonFiniteValue`, `DataError::InvalidClusterDims`.
    ///
    /// Examples
    /// --------
    /// ```rust
    /// # use ndarray::{array, Array2};
    /// # use rust_dml::data::ClusterData;
    /// let y = array![1.0, 2.0, 3.0, 4.0];
    /// let d = array![[0.5], [1.0], [1.5], [2.0]];
    /// let x = Array2::<f64>::zeros((4, 0));
    /// let clusters = array![[10, 7], [10, 8], [20, 7], [20, 8]];
    /// let data = ClusterData::new(y, d, x, None, clusters).unwrap();
    /// assert_eq!(data.n_clusters(0), 2);
    /// assert_eq!(data.cluster_codes(1), &[0, 1, 0, 1]);
    /// ```
    pub fn new(
        y: Array1<f64>, d: Array2<f64>, x: Array2<f64>, z: Option<Array2<f64>>,
        clusters: Array2<i64>,
    ) -> DataResult<Self> {
        let n = y.len();
        if n == 0 {
            return Err(DataError::EmptyData);
        }

        check_rows("d", d.nrows(), n)?;
        check_rows("x", x.nrows(), n)?;
        check_rows("clusters", clusters.nrows(), n)?;
        if d.ncols() == 0 {
            return Err(DataError::NoTreatment);
        }
        if let Some(z_mat) = &z {
            check_rows("z", z_mat.nrows(), n)?;
            if z_mat.ncols() == 0 {
                return Err(DataError::EmptyInstruments);
            }
        }

        let n_cluster_vars = clusters.ncols();
        if !(1..=2).contains(&n_cluster_vars) {
            return Err(DataError::InvalidClusterDims { n_cluster_vars });
        }

        for (row, &value) in y.iter().enumerate() {
            if !value.is_finite() {
                return Err(DataError::NonFiniteValue { field: "y", row, col: 0, value });
            }
        }
        check_finite("d", d.view())?;
        check_finite("x", x.view())?;
        if let Some(z_mat) = &z {
            check_finite("z", z_mat.view())?;
        }

        let (codes, labels): (Vec<_>, Vec<_>) =
            clusters.axis_iter(Axis(1)).map(encode_cluster_column).unzip();
        let treatment_names = default_treatment_names(d.ncols());

        Ok(ClusterData { y, d, x, z, clusters, codes, labels, treatment_names })
    }

    /// Replace the default treatment names (`d` or `d1, d2, …`).
    pub fn with_treatment_names(mut self, names: Vec<String>) -> DataResult<Self> {
        if names.len() != self.n_treat() {
            return Err(DataError::TreatmentNamesMismatch {
                expected: self.n_treat(),
                found: names.len(),
            });
        }
        self.treatment_names = names;
        Ok(self)
    }

    pub fn n_obs(&self) -> usize {
        self.y.len()
    }

    pub fn n_treat(&self) -> usize {
        self.d.ncols()
    }

    pub fn n_covariates(&self) -> usize {
        self.x.ncols()
    }

    /// Number of cluster variables (1 or 2).
    pub fn n_cluster_vars(&self) -> usize {
        self.codes.len()
    }

    /// Number of distinct clusters in dimension `dim`.
    ///
    /// Panics if `dim >= n_cluster_vars()`.
    pub fn n_clusters(&self, dim: usize) -> usize {
        self.labels[dim].len()
    }

    /// Distinct cluster counts for every dimension, in dimension order.
    pub fn n_clusters_per_dim(&self) -> Vec<usize> {
        self.labels.iter().map(Vec::len).collect()
    }

    /// Dense cluster codes of dimension `dim`, one per observation.
    ///
    /// Panics if `dim >= n_cluster_vars()`.
    pub fn cluster_codes(&self, dim: usize) -> &[usize] {
        &self.codes[dim]
    }

    /// Dense cluster codes for every dimension, borrowed.
    pub fn cluster_codes_per_dim(&self) -> Vec<&[usize]> {
        self.codes.iter().map(Vec::as_slice).collect()
    }

    /// Sorted unique raw labels of dimension `dim`; `labels[code]` recovers the
    /// original label of a code.
    pub fn cluster_labels(&self, dim: usize) -> &[i64] {
        &self.labels[dim]
    }

    pub fn raw_clusters(&self) -> ArrayView2<'_, i64> {
        self.clusters.view()
    }

    pub fn y(&self) -> ArrayView1<'_, f64> {
        self.y.view()
    }

    pub fn d(&self) -> ArrayView2<'_, f64> {
        self.d.view()
    }

    pub fn x(&self) -> ArrayView2<'_, f64> {
        self.x.view()
    }

    pub fn z(&self) -> Option<ArrayView2<'_, f64>> {
        self.z.as_ref().map(|z| z.view())
    }

    pub fn treatment_names(&self) -> &[String] {
        &self.treatment_names
    }

    /// Treatment column `index`.
    pub fn treatment(&self, index: usize) -> DataResult<ArrayView1<'_, f64>> {
        if index >= self.n_treat() {
            return Err(DataError::TreatmentOutOfRange { index, n_treat: self.n_treat() });
        }
        Ok(self.d.column(index))
    }

    /// Number of instrument columns (0 when none were supplied).
    pub fn n_instruments(&self) -> usize {
        self.z.as_ref().map_or(0, |z| z.ncols())
    }

    /// Instrument column `index`.
    pub fn instrument(&self, index: usize) -> DataResult<ArrayView1<'_, f64>> {
        match &self.z {
            Some(z) if index < z.ncols() => Ok(z.column(index)),
            _ => Err(DataError::MissingInstrument),
        }
    }

    /// Covariates used when estimating the effect of treatment `index`.
    ///
    /// Returns `x` with every other treatment column appended on the right,
    /// in their original order. For single-treatment data this is a copy of
    /// `x`.
    pub fn covariates_for(&self, index: usize) -> DataResult<Array2<f64>> {
        if index >= self.n_treat() {
            return Err(DataError::TreatmentOutOfRange { index, n_treat: self.n_treat() });
        }
        let n = self.n_obs();
        let p = self.x.ncols();
        let mut out = Array2::<f64>::zeros((n, p + self.n_treat() - 1));
        out.slice_mut(s![.., ..p]).assign(&self.x);

        let mut col = p;
        for other in (0..self.n_treat()).filter(|&j| j != index) {
            out.column_mut(col).assign(&self.d.column(other));
            col += 1;
        }
        Ok(out)
    }
}

// ---- Helper methods ----

fn check_rows(field: &'static str, found: usize, expected: usize) -> DataResult<()> {
    if found != expected {
        return Err(DataError::LengthMismatch { field, expected, found });
    }
    Ok(())
}

fn check_finite(field: &'static str, mat: ArrayView2<'_, f64>) -> DataResult<()> {
    for ((row, col), &value) in mat.indexed_iter() {
        if !value.is_finite() {
            return Err(DataError::NonFiniteValue { field, row, col, value });
        }
    }
    Ok(())
}

/// Map raw labels to dense codes `0..G` in ascending label order.
///
/// Returns `(codes, labels)` with `labels[codes[t]] == column[t]`.
pub fn encode_cluster_column(column: ArrayView1<'_, i64>) -> (Vec<usize>, Vec<i64>) {
    let mut labels: Vec<i64> = column.to_vec();
    labels.sort_unstable();
    labels.dedup();

    // Every raw label is present in `labels`, so the search always hits.
    let codes = column.iter().map(|v| labels.binary_search(v).unwrap_or_default()).collect();
    (codes, labels)
}

fn default_treatment_names(n_treat: usize) -> Vec<String> {
    if n_treat == 1 {
        vec!["d".to_string()]
    } else {
        (1..=n_treat).map(|j| format!("d{j}")).collect()
    }
}
