//! resampling::validation — configuration guards and split integrity checks.
//!
//! Purpose
//! -------
//! Centralize the checks that must hold before any cross-fitting work starts
//! (fold counts, repetitions, cluster dimensions) and the structural checks
//! that a finished [`ClusterSplit`] must pass before its folds are used for
//! nuisance training.
//!
//! Key behaviors
//! -------------
//! - [`validate_fold_count`] rejects `K < 2` and `K > N`.
//! - [`validate_cluster_split`] re-derives every invariant of a split from
//!   scratch: exhaustive disjoint partitions, fold count equal to the product
//!   of per-dimension fold counts, no cluster id on both sides of any fold,
//!   and every observation scored exactly once.
//!
//! Conventions
//! -----------
//! - Pure functions; no allocation beyond per-dimension scratch vectors.
//! - Errors are reported via [`ResamplingError`].
use crate::resampling::{
    errors::{ResamplingError, ResamplingResult},
    folds::ClusterSplit,
};

/// Validate a fold count against the number of clusters of one dimension.
///
/// Errors
/// ------
/// - `ResamplingError::InvalidFoldCount` when `n_folds < 2`.
/// - `ResamplingError::TooManyFolds` when `n_folds > n_clusters`.
///
/// Examples
/// --------
/// ```rust
/// # use rust_dml::resampling::{ResamplingError, validate_fold_count};
/// assert!(validate_fold_count(3, 10, 0).is_ok());
/// assert!(matches!(
///     validate_fold_count(11, 10, 1),
///     Err(ResamplingError::TooManyFolds { dim: 1, .. })
/// ));
/// ```
pub fn validate_fold_count(n_folds: usize, n_clusters: usize, dim: usize) -> ResamplingResult<()> {
    if n_folds < 2 {
        return Err(ResamplingError::InvalidFoldCount { n_folds });
    }
    if n_folds > n_clusters {
        return Err(ResamplingError::TooManyFolds { dim, n_folds, n_clusters });
    }
    Ok(())
}

pub fn validate_repetitions(n_rep: usize) -> ResamplingResult<()> {
    if n_rep == 0 {
        return Err(ResamplingError::InvalidRepetitions { n_rep });
    }
    Ok(())
}

pub fn validate_cluster_dims(n_cluster_vars: usize) -> ResamplingResult<()> {
    if !(1..=2).contains(&n_cluster_vars) {
        return Err(ResamplingError::InvalidClusterDims { n_cluster_vars });
    }
    Ok(())
}

/// Validate per-dimension cluster codes: equal lengths and in-range codes.
pub fn validate_cluster_codes(codes: &[&[usize]], n_clusters: &[usize]) -> ResamplingResult<()> {
    validate_cluster_dims(codes.len())?;
    if n_clusters.len() != codes.len() {
        return Err(ResamplingError::LengthMismatch {
            what: "cluster counts",
            expected: codes.len(),
            found: n_clusters.len(),
        });
    }
    let n_obs = codes[0].len();
    for (dim, (dim_codes, &n)) in codes.iter().zip(n_clusters).enumerate() {
        if dim_codes.len() != n_obs {
            return Err(ResamplingError::LengthMismatch {
                what: "cluster codes",
                expected: n_obs,
                found: dim_codes.len(),
            });
        }
        if let Some((obs, &code)) = dim_codes.iter().enumerate().find(|&(_, &c)| c >= n) {
            return Err(ResamplingError::CodeOutOfRange { dim, obs, code, n_clusters: n });
        }
    }
    Ok(())
}

/// Check every structural invariant of a cluster split against the data it
/// is meant for.
///
/// Parameters
/// ----------
/// - `split`: `&ClusterSplit`
///   One repetition of folds, possibly built by the caller.
/// - `codes`: `&[&[usize]]`
///   Dense cluster codes per dimension of the data being fitted.
/// - `n_clusters`: `&[usize]`
///   Distinct cluster count per dimension of the same data.
///
/// Errors
/// ------
/// - Shape variants when dimensions, observation counts, or cluster counts
///   disagree with the data.
/// - `ResamplingError::InvalidFoldCount` / `TooManyFolds` if a partition
///   has fewer than 2 folds or more folds than clusters.
/// - `ResamplingError::ClusterNotPartitioned` if a partition misses or
///   repeats a cluster id.
/// - `ResamplingError::ClusterLeak` if a cluster id sits in both the score
///   and the nuisance side of a fold.
/// - `ResamplingError::ObservationNotScoredOnce` if an observation is not in
///   exactly one fold's score set.
pub fn validate_cluster_split(
    split: &ClusterSplit, codes: &[&[usize]], n_clusters: &[usize],
) -> ResamplingResult<()> {
    validate_cluster_codes(codes, n_clusters)?;
    if split.n_cluster_vars() != codes.len() {
        return Err(ResamplingError::LengthMismatch {
            what: "split cluster dimensions",
            expected: codes.len(),
            found: split.n_cluster_vars(),
        });
    }
    let n_obs = codes[0].len();
    if split.n_obs() != n_obs {
        return Err(ResamplingError::LengthMismatch {
            what: "split observations",
            expected: n_obs,
            found: split.n_obs(),
        });
    }

    // Partitions: exhaustive and disjoint.
    for (dim, (partition, &n)) in split.partitions().iter().zip(n_clusters).enumerate() {
        if partition.n_clusters() != n {
            return Err(ResamplingError::LengthMismatch {
                what: "partition clusters",
                expected: n,
                found: partition.n_clusters(),
            });
        }
        validate_fold_count(partition.n_folds(), n, dim)?;
        let mut counts = vec![0usize; n];
        for fold in partition.folds() {
            for &cluster in fold {
                if cluster >= n {
                    return Err(ResamplingError::ClusterNotPartitioned { dim, cluster, count: 0 });
                }
                counts[cluster] += 1;
            }
        }
        if let Some((cluster, &count)) = counts.iter().enumerate().find(|&(_, &c)| c != 1) {
            return Err(ResamplingError::ClusterNotPartitioned { dim, cluster, count });
        }
    }

    let expected_folds: usize = split.partitions().iter().map(|p| p.n_folds()).product();
    if split.n_folds() != expected_folds {
        return Err(ResamplingError::LengthMismatch {
            what: "folds",
            expected: expected_folds,
            found: split.n_folds(),
        });
    }

    // Folds: no shared cluster ids between score and nuisance sides.
    let mut scored = vec![0usize; n_obs];
    for fold in split.folds() {
        for (dim, (dim_codes, &n)) in codes.iter().zip(n_clusters).enumerate() {
            let mut in_test = vec![false; n];
            for &cluster in fold.test_clusters(dim) {
                in_test[cluster] = true;
            }
            if let Some(&cluster) = fold.train_clusters(dim).iter().find(|&&c| in_test[c]) {
                return Err(ResamplingError::ClusterLeak {
                    fold: fold.index().to_vec(),
                    dim,
                    cluster,
                });
            }
            if let Some(&obs) = fold.train().iter().find(|&&t| in_test[dim_codes[t]]) {
                return Err(ResamplingError::ClusterLeak {
                    fold: fold.index().to_vec(),
                    dim,
                    cluster: dim_codes[obs],
                });
            }
            if let Some(&obs) = fold.test().iter().find(|&&t| !in_test[dim_codes[t]]) {
                return Err(ResamplingError::ClusterLeak {
                    fold: fold.index().to_vec(),
                    dim,
                    cluster: dim_codes[obs],
                });
            }
        }
        for &obs in fold.test() {
            scored[obs] += 1;
        }
    }
    if let Some((obs, &count)) = scored.iter().enumerate().find(|&(_, &c)| c != 1) {
        return Err(ResamplingError::ObservationNotScoredOnce { obs, count });
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::resampling::partition::ClusterPartition;

    // -------------------------------------------------------------------------
    // Scope
    // -----
    // These tests cover:
    // - Each branch of the configuration guards.
    // - `validate_cluster_split` on a valid split and on splits checked
    //   against the wrong data.
    //
    // They intentionally DO NOT cover:
    // - Randomized splitting; see `partition` and `splitter`.
    // -------------------------------------------------------------------------

    fn grid_codes(n: usize, m: usize) -> (Vec<usize>, Vec<usize>) {
        let first = (0..n * m).map(|t| t / m).collect();
        let second = (0..n * m).map(|t| t % m).collect();
        (first, second)
    }

    #[test]
    fn fold_count_guards() {
        assert_eq!(validate_fold_count(2, 2, 0), Ok(()));
        assert_eq!(
            validate_fold_count(0, 5, 0),
            Err(ResamplingError::InvalidFoldCount { n_folds: 0 })
        );
        assert_eq!(
            validate_fold_count(6, 5, 1),
            Err(ResamplingError::TooManyFolds { dim: 1, n_folds: 6, n_clusters: 5 })
        );
        assert_eq!(
            validate_repetitions(0),
            Err(ResamplingError::InvalidRepetitions { n_rep: 0 })
        );
        assert_eq!(
            validate_cluster_dims(3),
            Err(ResamplingError::InvalidClusterDims { n_cluster_vars: 3 })
        );
    }

    #[test]
    fn cluster_codes_out_of_range_are_reported() {
        let first = vec![0, 1, 2];
        let result = validate_cluster_codes(&[first.as_slice()], &[2]);
        assert_eq!(
            result,
            Err(ResamplingError::CodeOutOfRange { dim: 0, obs: 2, code: 2, n_clusters: 2 })
        );
    }

    #[test]
    // Purpose
    // -------
    // A split built from valid partitions passes the full integrity check.
    //
    // Given
    // -----
    // - A 4×3 grid, partitions {0,1}|{2,3} and {0}|{1,2}.
    //
    // Expect
    // ------
    // - `Ok(())`.
    fn validate_cluster_split_accepts_well_formed_split() {
        // Arrange
        let (first, second) = grid_codes(4, 3);
        let p0 = ClusterPartition::from_assignment(vec![0, 0, 1, 1], 2).expect("valid");
        let p1 = ClusterPartition::from_assignment(vec![0, 1, 1], 2).expect("valid");
        let split = ClusterSplit::from_partitions(vec![p0, p1], &[first.as_slice(), second.as_slice()])
            .expect("split builds");

        // Act
        let result = validate_cluster_split(&split, &[first.as_slice(), second.as_slice()], &[4, 3]);

        // Assert
        assert_eq!(result, Ok(()));
    }

    #[test]
    // Purpose
    // -------
    // A split built for other data must be rejected before fitting.
    //
    // Given
    // -----
    // - A split built on a 4×3 grid.
    // - Data whose second dimension has a different cluster layout, so that
    //   observations no longer sit on the side of the fold they were assigned to.
    //
    // Expect
    // ------
    // - A `ClusterLeak` error.
    fn validate_cluster_split_rejects_split_for_other_data() {
        // Arrange
        let (first, second) = grid_codes(4, 3);
        let p0 = ClusterPartition::from_assignment(vec![0, 0, 1, 1], 2).expect("valid");
        let p1 = ClusterPartition::from_assignment(vec![0, 1, 1], 2).expect("valid");
        let split = ClusterSplit::from_partitions(vec![p0, p1], &[first.as_slice(), second.as_slice()])
            .expect("split builds");
        let shuffled_second: Vec<usize> = second.iter().map(|&c| (c + 1) % 3).collect();

        // Act
        let result = validate_cluster_split(&split, &[first.as_slice(), shuffled_second.as_slice()], &[4, 3]);

        // Assert
        match result {
            Err(ResamplingError::ClusterLeak { dim: 1, .. }) => (),
            other => panic!("expected ClusterLeak in dimension 1, got {other:?}"),
        }
    }

    #[test]
    // Purpose
    // -------
    // A caller-built split whose partitions put every cluster in one fold
    // leaves nothing to train on; it must fail as a configuration error.
    //
    // Given
    // -----
    // - A 6×6 grid, both partitions built with a single fold.
    //
    // Expect
    // ------
    // - `InvalidFoldCount { n_folds: 1 }`.
    fn validate_cluster_split_rejects_single_fold_partitions() {
        // Arrange
        let (first, second) = grid_codes(6, 6);
        let p0 = ClusterPartition::from_assignment(vec![0; 6], 1).expect("valid");
        let p1 = ClusterPartition::from_assignment(vec![0; 6], 1).expect("valid");
        let split = ClusterSplit::from_partitions(vec![p0, p1], &[first.as_slice(), second.as_slice()])
            .expect("split builds");

        // Act
        let result = validate_cluster_split(&split, &[first.as_slice(), second.as_slice()], &[6, 6]);

        // Assert
        assert_eq!(result, Err(ResamplingError::InvalidFoldCount { n_folds: 1 }));
    }

    #[test]
    fn validate_cluster_split_rejects_wrong_observation_count() {
        let first = vec![0, 0, 1, 1];
        let part = ClusterPartition::from_assignment(vec![0, 1], 2).expect("valid");
        let split = ClusterSplit::from_partitions(vec![part], &[first.as_slice()]).expect("split builds");
        let longer = vec![0, 0, 1, 1, 1];

        let result = validate_cluster_split(&split, &[longer.as_slice()], &[2]);

        assert_eq!(
            result,
            Err(ResamplingError::LengthMismatch {
                what: "split observations",
                expected: 5,
                found: 4
            })
        );
    }
}
