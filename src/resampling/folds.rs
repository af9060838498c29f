//! resampling::folds — cross-fitting folds derived from cluster partitions.
//!
//! Purpose
//! -------
//! Turn one partition per cluster dimension into the full set of
//! cross-fitting folds of a repetition. For two-way clustering with `K`
//! folds per dimension this yields `K²` folds indexed by `(k, ℓ)`; for
//! one-way clustering `K` folds indexed by `(k, 0)`.
//!
//! Key behaviors
//! -------------
//! - The score (test) side of fold `(k, ℓ)` is `I_k × J_ℓ`: an observation is
//!   scored when its first cluster id is in `I_k` and its second in `J_ℓ`.
//! - The nuisance (train) side is `([N]∖I_k) × ([M]∖J_ℓ)`: an observation is
//!   used for training only when *neither* of its cluster ids is in the
//!   score side. Observations sharing exactly one id with the score side are
//!   used by neither side of that fold.
//! - Observation indices are stored sorted, so that cross-fitted predictions
//!   can be scattered back deterministically.
//!
//! Invariants & assumptions
//! ------------------------
//! - Within a fold, no cluster id of any dimension appears on both sides.
//! - Within a repetition, every observation is in exactly one fold's score
//!   set, because the partitions are exhaustive and disjoint.
//! - Folds are ordered lexicographically by their index, first dimension
//!   outermost.
//!
//! Downstream usage
//! ----------------
//! - `estimation` trains nuisance learners on [`ClusterFold::train`] rows and
//!   predicts [`ClusterFold::test`] rows.
//! - `inference` uses [`ClusterFold::test_clusters`] for the per-fold
//!   normalizations `|I_k|`, `|J_ℓ|` and for same-cluster cross-products.
//! - Callers may inspect the folds for diagnostics or plotting.
use crate::resampling::{
    errors::{ResamplingError, ResamplingResult},
    partition::ClusterPartition,
    validation::validate_cluster_dims,
};

/// `ClusterFold` — one cross-fitting fold of a cluster split.
///
/// Fields
/// ------
/// - `index`: per-dimension fold indices, e.g. `[k, ℓ]` or `[k]`.
/// - `test_clusters` / `train_clusters`: per-dimension sorted cluster ids on
///   the score and nuisance sides.
/// - `test` / `train`: sorted observation indices on each side.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClusterFold {
    index: Vec<usize>,
    test_clusters: Vec<Vec<usize>>,
    train_clusters: Vec<Vec<usize>>,
    test: Vec<usize>,
    train: Vec<usize>,
}

impl ClusterFold {
    /// Per-dimension fold indices (`[k, ℓ]` for two-way, `[k]` for one-way).
    pub fn index(&self) -> &[usize] {
        &self.index
    }

    /// Fold index as `(k, ℓ)`, with `ℓ = 0` for one-way clustering.
    pub fn key(&self) -> (usize, usize) {
        (self.index[0], self.index.get(1).copied().unwrap_or(0))
    }

    /// Observations on the score side.
    pub fn test(&self) -> &[usize] {
        &self.test
    }

    /// Observations on the nuisance-training side.
    pub fn train(&self) -> &[usize] {
        &self.train
    }

    /// Score-side cluster ids of dimension `dim` (`I_k` or `J_ℓ`).
    pub fn test_clusters(&self, dim: usize) -> &[usize] {
        &self.test_clusters[dim]
    }

    /// Nuisance-side cluster ids of dimension `dim`.
    pub fn train_clusters(&self, dim: usize) -> &[usize] {
        &self.train_clusters[dim]
    }

    /// `|I_k|·|J_ℓ|` (two-way) or `|I_k|` (one-way).
    pub fn n_test_cells(&self) -> usize {
        self.test_clusters.iter().map(Vec::len).product()
    }
}

/// `ClusterSplit` — all folds of one cross-fitting repetition.
///
/// Fields
/// ------
/// - `partitions`: one [`ClusterPartition`] per cluster dimension.
/// - `folds`: the product folds, ordered lexicographically by index.
/// - `n_obs`: number of observations the split was built for.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClusterSplit {
    partitions: Vec<ClusterPartition>,
    folds: Vec<ClusterFold>,
    n_obs: usize,
}

impl ClusterSplit {
    /// Derive every fold of a repetition from per-dimension partitions.
    ///
    /// Parameters
    /// ----------
    /// - `partitions`: `Vec<ClusterPartition>`
    ///   One partition per cluster dimension (one or two).
    /// - `codes`: `&[&[usize]]`
    ///   Dense cluster codes per dimension, one entry per observation.
    ///
    /// Returns
    /// -------
    /// `ResamplingResult<ClusterSplit>`
    ///   The split with `Π_dim K_dim` folds.
    ///
    /// Errors
    /// ------
    /// - `ResamplingError::InvalidClusterDims` for zero or more than two
    ///   dimensions.
    /// - `ResamplingError::LengthMismatch` if `codes` and `partitions`
    ///   disagree in dimension count or code vectors differ in length.
    /// - `ResamplingError::CodeOutOfRange` if a code is not covered by its
    ///   dimension's partition.
    ///
    /// Examples
    /// --------
    /// ```rust
    /// # use rust_dml::resampling::{ClusterPartition, ClusterSplit};
    /// // 2×2 grid of cells, one observation each.
    /// let first = vec![0, 0, 1, 1];
    /// let second = vec![0, 1, 0, 1];
    /// let p0 = ClusterPartition::from_assignment(vec![0, 1], 2).unwrap();
    /// let p1 = ClusterPartition::from_assignment(vec![0, 1], 2).unwrap();
    /// let split = ClusterSplit::from_partitions(vec![p0, p1], &[&first[..], &second[..]]).unwrap();
    /// assert_eq!(split.n_folds(), 4);
    /// // Fold (0, 0) scores cell (0, 0) and trains on cell (1, 1) only.
    /// assert_eq!(split.fold(0).test(), &[0]);
    /// assert_eq!(split.fold(0).train(), &[3]);
    /// ```
    pub fn from_partitions(
        partitions: Vec<ClusterPartition>, codes: &[&[usize]],
    ) -> ResamplingResult<Self> {
        validate_cluster_dims(partitions.len())?;
        if codes.len() != partitions.len() {
            return Err(ResamplingError::LengthMismatch {
                what: "cluster code dimensions",
                expected: partitions.len(),
                found: codes.len(),
            });
        }
        let n_obs = codes[0].len();
        for (dim, (dim_codes, partition)) in codes.iter().zip(&partitions).enumerate() {
            if dim_codes.len() != n_obs {
                return Err(ResamplingError::LengthMismatch {
                    what: "cluster codes",
                    expected: n_obs,
                    found: dim_codes.len(),
                });
            }
            let n = partition.n_clusters();
            if let Some((obs, &code)) = dim_codes.iter().enumerate().find(|&(_, &c)| c >= n) {
                return Err(ResamplingError::CodeOutOfRange { dim, obs, code, n_clusters: n });
            }
        }

        // Fold membership of every observation, per dimension.
        let obs_folds: Vec<Vec<usize>> = codes
            .iter()
            .zip(&partitions)
            .map(|(dim_codes, partition)| dim_codes.iter().map(|&c| partition.fold_of(c)).collect())
            .collect();

        let folds = fold_indices(&partitions)
            .into_iter()
            .map(|index| build_fold(index, &partitions, &obs_folds, n_obs))
            .collect();

        Ok(ClusterSplit { partitions, folds, n_obs })
    }

    pub fn n_folds(&self) -> usize {
        self.folds.len()
    }

    pub fn n_obs(&self) -> usize {
        self.n_obs
    }

    pub fn n_cluster_vars(&self) -> usize {
        self.partitions.len()
    }

    pub fn folds(&self) -> &[ClusterFold] {
        &self.folds
    }

    /// Fold `i` in lexicographic order.
    ///
    /// Panics if `i >= n_folds()`.
    pub fn fold(&self, i: usize) -> &ClusterFold {
        &self.folds[i]
    }

    pub fn partitions(&self) -> &[ClusterPartition] {
        &self.partitions
    }

    /// Partition of cluster dimension `dim`.
    pub fn partition(&self, dim: usize) -> &ClusterPartition {
        &self.partitions[dim]
    }

    /// `(train, test)` observation index pairs of every fold, for callers
    /// that want to plot or export the assignment.
    pub fn train_test_pairs(&self) -> Vec<(Vec<usize>, Vec<usize>)> {
        self.folds.iter().map(|f| (f.train.clone(), f.test.clone())).collect()
    }
}

// ---- Helper methods ----

/// Cartesian product of per-dimension fold indices, first dimension outermost.
fn fold_indices(partitions: &[ClusterPartition]) -> Vec<Vec<usize>> {
    partitions.iter().fold(vec![Vec::new()], |acc, partition| {
        acc.into_iter()
            .flat_map(|prefix| {
                (0..partition.n_folds()).map(move |k| {
                    let mut index = prefix.clone();
                    index.push(k);
                    index
                })
            })
            .collect()
    })
}

fn build_fold(
    index: Vec<usize>, partitions: &[ClusterPartition], obs_folds: &[Vec<usize>], n_obs: usize,
) -> ClusterFold {
    let test_clusters: Vec<Vec<usize>> =
        partitions.iter().zip(&index).map(|(p, &k)| p.fold(k).to_vec()).collect();
    let train_clusters: Vec<Vec<usize>> = partitions
        .iter()
        .zip(&index)
        .map(|(p, &k)| (0..p.n_clusters()).filter(|&c| p.fold_of(c) != k).collect())
        .collect();

    let mut test = Vec::new();
    let mut train = Vec::new();
    for obs in 0..n_obs {
        let mut all_in = true;
        let mut none_in = true;
        for (dim_folds, &k) in obs_folds.iter().zip(&index) {
            if dim_folds[obs] == k {
                none_in = false;
            } else {
                all_in = false;
            }
        }
        if all_in {
            test.push(obs);
        } else if none_in {
            train.push(obs);
        }
    }

    ClusterFold { index, test_clusters, train_clusters, test, train }
}
