//! resampling::splitter — repeated multiway-cluster sample splitting.
//!
//! Purpose
//! -------
//! Produce `n_rep` independent cluster splits for cross-fitting. Each
//! repetition draws a fresh random partition per cluster dimension and
//! derives all folds from them.
//!
//! Key behaviors
//! -------------
//! - Validates fold count, repetitions, and cluster codes before drawing
//!   anything, so degenerate partitions (`K > N` or `K > M`) are reported as
//!   configuration errors up front.
//! - Uses a single `StdRng` per call: seeded from `random_seed` when given
//!   (reproducible), from OS entropy otherwise.
//!
//! Invariants & assumptions
//! ------------------------
//! - The same `K` is used for every cluster dimension.
//! - Repetitions are statistically independent; the caller aggregates their
//!   results.
use crate::{
    data::ClusterData,
    resampling::{
        errors::ResamplingResult,
        folds::ClusterSplit,
        partition::ClusterPartition,
        validation::{validate_cluster_codes, validate_fold_count, validate_repetitions},
    },
};
use rand::{SeedableRng, rngs::StdRng};

/// ClusterResampling — configuration of repeated cluster cross-fitting splits.
///
/// Fields
/// ------
/// - `n_folds`: folds per cluster dimension (`K ≥ 2`).
/// - `n_rep`: number of independent repetitions (`≥ 1`).
/// - `random_seed`: optional seed for reproducible splits.
///
/// Notes
/// -----
/// - The `Default` is `K = 5`, one repetition, unseeded.
#[derive(Debug, Clone, PartialEq)]
pub struct ClusterResampling {
    pub n_folds: usize,
    pub n_rep: usize,
    pub random_seed: Option<u64>,
}

impl ClusterResampling {
    /// Construct a resampling configuration.
    ///
    /// Errors
    /// ------
    /// - `ResamplingError::InvalidFoldCount` if `n_folds < 2`.
    /// - `ResamplingError::InvalidRepetitions` if `n_rep == 0`.
    pub fn new(n_folds: usize, n_rep: usize, random_seed: Option<u64>) -> ResamplingResult<Self> {
        validate_fold_count(n_folds, usize::MAX, 0)?;
        validate_repetitions(n_rep)?;
        Ok(ClusterResampling { n_folds, n_rep, random_seed })
    }

    /// Draw `n_rep` cluster splits for the given cluster codes.
    ///
    /// Parameters
    /// ----------
    /// - `codes`: `&[&[usize]]`
    ///   Dense cluster codes per dimension (one or two), one per observation.
    /// - `n_clusters`: `&[usize]`
    ///   Number of distinct clusters per dimension.
    ///
    /// Returns
    /// -------
    /// `ResamplingResult<Vec<ClusterSplit>>`
    ///   One split per repetition, each with `K^dims` folds.
    ///
    /// Errors
    /// ------
    /// - `ResamplingError::TooManyFolds` when `K` exceeds the cluster count of
    ///   any dimension.
    /// - Shape and configuration variants from `validation`.
    ///
    /// Examples
    /// --------
    /// ```rust
    /// # use rust_dml::resampling::ClusterResampling;
    /// let first: Vec<usize> = (0..20).map(|t| t / 4).collect();
    /// let second: Vec<usize> = (0..20).map(|t| t % 4).collect();
    /// let resampling = ClusterResampling::new(2, 3, Some(42)).unwrap();
    /// let splits = resampling.split(&[&first[..], &second[..]], &[5, 4]).unwrap();
    /// assert_eq!(splits.len(), 3);
    /// assert!(splits.iter().all(|s| s.n_folds() == 4));
    /// ```
    pub fn split(
        &self, codes: &[&[usize]], n_clusters: &[usize],
    ) -> ResamplingResult<Vec<ClusterSplit>> {
        validate_fold_count(self.n_folds, usize::MAX, 0)?;
        validate_repetitions(self.n_rep)?;
        validate_cluster_codes(codes, n_clusters)?;
        for (dim, &n) in n_clusters.iter().enumerate() {
            validate_fold_count(self.n_folds, n, dim)?;
        }

        let mut rng = match self.random_seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_entropy(),
        };

        (0..self.n_rep)
            .map(|_| {
                let partitions = n_clusters
                    .iter()
                    .map(|&n| ClusterPartition::random(n, self.n_folds, &mut rng))
                    .collect::<ResamplingResult<Vec<_>>>()?;
                ClusterSplit::from_partitions(partitions, codes)
            })
            .collect()
    }

    /// Draw `n_rep` cluster splits for the cluster columns of `data`.
    pub fn split_data(&self, data: &ClusterData) -> ResamplingResult<Vec<ClusterSplit>> {
        self.split(&data.cluster_codes_per_dim(), &data.n_clusters_per_dim())
    }
}

impl Default for ClusterResampling {
    fn default() -> Self {
        Self { n_folds: 5, n_rep: 1, random_seed: None }
    }
}
