//! inference::variance — cluster-robust sandwich variance for DML scores.
//!
//! Purpose
//! -------
//! Combine per-fold evaluations of a linear score `ψ = ψ_a·θ + ψ_b` into a
//! variance estimate that is robust to dependence within either cluster
//! dimension.
//!
//! Two-way form, with `K²` folds `(k, ℓ)` scoring `I_k × J_ℓ`:
//!
//! ```text
//! Ĵ  = (1/K²) Σ_{k,ℓ} 1/(|I_k||J_ℓ|) Σ_{score set} ψ_a
//! Γ̂  = (1/K²) Σ_{k,ℓ} c_kℓ [ Σ_{i∈I_k} (Σ_{c₁=i} ψ)² + Σ_{j∈J_ℓ} (Σ_{c₂=j} ψ)² ]
//! c_kℓ = min(|I_k|, |J_ℓ|) / (|I_k||J_ℓ|)²
//! σ̂² = Γ̂ / Ĵ²,   se = √(σ̂² / C),   C = min(N, M)
//! ```
//!
//! One-way form, with `K` folds scoring `I_k`:
//!
//! ```text
//! Ĵ  = (1/K) Σ_k 1/|I_k| Σ_{score set} ψ_a
//! Γ̂  = (1/K) Σ_k 1/|I_k| Σ_{i∈I_k} (Σ_{c₁=i} ψ)²
//! C  = N
//! ```
//!
//! Invariants & assumptions
//! ------------------------
//! - Inner sums run only over the fold's score set, so `(Σ ψ)²` over a
//!   cluster equals the sum of `ψ_s ψ_t` over all pairs sharing that id.
//! - Fold contributions are summed independently; the result does not depend
//!   on fold order beyond floating-point rounding.
//! - Empty cluster folds and `Ĵ = 0` are errors, never divisions by zero.
use crate::{
    inference::errors::{InferenceError, InferenceResult},
    resampling::{ClusterFold, ClusterSplit},
};
use ndarray::ArrayView1;

/// ClusterVariance — components of the cluster-robust sandwich.
///
/// Fields
/// ------
/// - `j_hat`: averaged score Jacobian Ĵ.
/// - `gamma_hat`: averaged cluster outer-product Γ̂.
/// - `sigma2`: `Γ̂ / Ĵ²`.
/// - `scaling_factor`: `C`, the effective number of independent clusters.
/// - `se`: `√(sigma2 / C)`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ClusterVariance {
    pub j_hat: f64,
    pub gamma_hat: f64,
    pub sigma2: f64,
    pub scaling_factor: usize,
    pub se: f64,
}

impl ClusterVariance {
    /// Estimate the variance components over all folds of `split`.
    ///
    /// Parameters
    /// ----------
    /// - `psi`: score values `ψ_a·θ̃ + ψ_b`, one per observation.
    /// - `psi_a`: Jacobian part of the score, one per observation.
    /// - `split`: the cross-fitting split the scores were produced with.
    /// - `codes`: dense cluster codes per dimension.
    /// - `n_clusters`: distinct clusters per dimension.
    ///
    /// Errors
    /// ------
    /// - `InferenceError::LengthMismatch` / `CodeOutOfRange` on shape issues.
    /// - `InferenceError::EmptyClusterFold` if a fold scores no cluster in
    ///   some dimension.
    /// - `InferenceError::DegenerateJacobian` if Ĵ is zero or non-finite.
    /// - `InferenceError::NonFinite` if Γ̂ or σ̂² is non-finite.
    pub fn estimate(
        psi: ArrayView1<'_, f64>, psi_a: ArrayView1<'_, f64>, split: &ClusterSplit,
        codes: &[&[usize]], n_clusters: &[usize],
    ) -> InferenceResult<Self> {
        if codes.len() != split.n_cluster_vars() {
            return Err(InferenceError::LengthMismatch {
                what: "cluster dimensions",
                expected: split.n_cluster_vars(),
                found: codes.len(),
            });
        }
        Self::from_folds(psi, psi_a, split.folds(), codes, n_clusters)
    }

    /// Estimate the variance components from an arbitrary sequence of folds.
    ///
    /// Used by [`ClusterVariance::estimate`]; exposed so callers can check
    /// that reordering folds leaves the result unchanged.
    pub fn from_folds<'a, I>(
        psi: ArrayView1<'_, f64>, psi_a: ArrayView1<'_, f64>, folds: I, codes: &[&[usize]],
        n_clusters: &[usize],
    ) -> InferenceResult<Self>
    where
        I: IntoIterator<Item = &'a ClusterFold>,
    {
        let n_obs = psi.len();
        check_len("psi_a", n_obs, psi_a.len())?;
        check_len("cluster count dimensions", codes.len(), n_clusters.len())?;
        if codes.is_empty() || codes.len() > 2 {
            return Err(InferenceError::LengthMismatch {
                what: "cluster dimensions",
                expected: 2,
                found: codes.len(),
            });
        }
        for dim_codes in codes {
            check_len("cluster codes", n_obs, dim_codes.len())?;
        }

        let mut j_sum = 0.0;
        let mut gamma_sum = 0.0;
        let mut n_folds = 0usize;
        for fold in folds {
            let (j_part, gamma_part) = fold_contribution(fold, psi, psi_a, codes, n_clusters)?;
            j_sum += j_part;
            gamma_sum += gamma_part;
            n_folds += 1;
        }
        if n_folds == 0 {
            return Err(InferenceError::LengthMismatch { what: "folds", expected: 1, found: 0 });
        }

        let j_hat = j_sum / n_folds as f64;
        let gamma_hat = gamma_sum / n_folds as f64;
        if !j_hat.is_finite() || j_hat == 0.0 {
            return Err(InferenceError::DegenerateJacobian { j_hat });
        }
        if !gamma_hat.is_finite() {
            return Err(InferenceError::NonFinite { what: "gamma_hat", value: gamma_hat });
        }

        let sigma2 = gamma_hat / (j_hat * j_hat);
        if !sigma2.is_finite() {
            return Err(InferenceError::NonFinite { what: "sigma2", value: sigma2 });
        }
        let scaling_factor = n_clusters.iter().copied().min().unwrap_or(0);
        if scaling_factor == 0 {
            return Err(InferenceError::LengthMismatch {
                what: "clusters",
                expected: 1,
                found: 0,
            });
        }
        let se = (sigma2 / scaling_factor as f64).sqrt();

        Ok(ClusterVariance { j_hat, gamma_hat, sigma2, scaling_factor, se })
    }
}

fn check_len(what: &'static str, expected: usize, found: usize) -> InferenceResult<()> {
    if expected != found {
        return Err(InferenceError::LengthMismatch { what, expected, found });
    }
    Ok(())
}

/// Unscaled `(Ĵ, Γ̂)` contribution of one fold.
fn fold_contribution(
    fold: &ClusterFold, psi: ArrayView1<'_, f64>, psi_a: ArrayView1<'_, f64>,
    codes: &[&[usize]], n_clusters: &[usize],
) -> InferenceResult<(f64, f64)> {
    let sizes: Vec<usize> = (0..codes.len()).map(|dim| fold.test_clusters(dim).len()).collect();
    if let Some(dim) = sizes.iter().position(|&s| s == 0) {
        return Err(InferenceError::EmptyClusterFold { fold: fold.key(), dim });
    }

    let cells: f64 = sizes.iter().map(|&s| s as f64).product();
    let gamma_weight = match sizes.as_slice() {
        [_] => 1.0 / cells,
        _ => {
            let smallest = sizes.iter().copied().min().unwrap_or(1) as f64;
            smallest / (cells * cells)
        }
    };

    let mut psi_a_sum = 0.0;
    for &t in fold.test() {
        psi_a_sum += psi_a[t];
    }

    let mut outer = 0.0;
    for (dim, dim_codes) in codes.iter().enumerate() {
        let mut cluster_sums = vec![0.0; n_clusters[dim]];
        for &t in fold.test() {
            let code = dim_codes[t];
            let slot = cluster_sums
                .get_mut(code)
                .ok_or(InferenceError::CodeOutOfRange { dim, obs: t, code })?;
            *slot += psi[t];
        }
        outer += fold
            .test_clusters(dim)
            .iter()
            .map(|&c| cluster_sums[c] * cluster_sums[c])
            .sum::<f64>();
    }

    Ok((psi_a_sum / cells, gamma_weight * outer))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::resampling::{ClusterPartition, ClusterResampling};
    use approx::assert_relative_eq;
    use ndarray::Array1;

    // -------------------------------------------------------------------------
    // Scope
    // -----
    // These tests cover:
    // - Hand-computed two-way and one-way components on tiny designs.
    // - Invariance to fold order.
    // - Degenerate Jacobian and shape errors.
    // -------------------------------------------------------------------------

    fn grid_codes(n: usize, m: usize) -> (Vec<usize>, Vec<usize>) {
        let first = (0..n * m).map(|t| t / m).collect();
        let second = (0..n * m).map(|t| t % m).collect();
        (first, second)
    }

    #[test]
    // Purpose
    // -------
    // Check the two-way formulas against a hand computation.
    //
    // Given
    // -----
    // - A 2×2 grid (observation t = 2i + j), K = 2 with I_0 = {0}, I_1 = {1},
    //   J_0 = {0}, J_1 = {1}; each fold scores exactly one cell.
    // - ψ = (1, 2, 3, 4), ψ_a = (−1, −1, −1, −1).
    //
    // Expect
    // ------
    // - Each fold: |I_k| = |J_ℓ| = 1, weight c = 1, Γ part = 2ψ_t².
    // - Γ̂ = 2(1 + 4 + 9 + 16)/4 = 15, Ĵ = −1, σ̂² = 15, C = 2.
    fn two_way_matches_hand_computation() {
        // Arrange
        let (first, second) = grid_codes(2, 2);
        let codes = [first.as_slice(), second.as_slice()];
        let partitions = vec![
            ClusterPartition::from_assignment(vec![0, 1], 2).expect("valid partition"),
            ClusterPartition::from_assignment(vec![0, 1], 2).expect("valid partition"),
        ];
        let split = ClusterSplit::from_partitions(partitions, &codes).expect("valid split");
        let psi = Array1::from(vec![1.0, 2.0, 3.0, 4.0]);
        let psi_a = Array1::from_elem(4, -1.0);

        // Act
        let var = ClusterVariance::estimate(psi.view(), psi_a.view(), &split, &codes, &[2, 2])
            .expect("estimate succeeds");

        // Assert
        assert_relative_eq!(var.j_hat, -1.0, epsilon = 1e-12);
        assert_relative_eq!(var.gamma_hat, 15.0, epsilon = 1e-12);
        assert_relative_eq!(var.sigma2, 15.0, epsilon = 1e-12);
        assert_eq!(var.scaling_factor, 2);
        assert_relative_eq!(var.se, (15.0f64 / 2.0).sqrt(), epsilon = 1e-12);
    }

    #[test]
    // Purpose
    // -------
    // Within-fold pairs sharing a cluster id must enter Γ̂ through the squared
    // cluster sums.
    //
    // Given
    // -----
    // - A 4×4 grid, K = 2 with I_0 = {0,1}, I_1 = {2,3}, J_0 = {0,1},
    //   J_1 = {2,3}; ψ ≡ 1, ψ_a ≡ −2.
    //
    // Expect
    // ------
    // - Every fold scores a 2×2 block: each of the 2 first-dim clusters sums
    //   to 2, likewise for the second dim, so the bracket is 4·4 = 16.
    // - c = 2/16, Γ part = 2, Γ̂ = 2.
    // - Ĵ per fold = (4·(−2))/4 = −2; σ̂² = 2/4 = 0.5.
    fn two_way_accounts_for_shared_clusters() {
        let (first, second) = grid_codes(4, 4);
        let codes = [first.as_slice(), second.as_slice()];
        let partitions = vec![
            ClusterPartition::from_assignment(vec![0, 0, 1, 1], 2).expect("valid partition"),
            ClusterPartition::from_assignment(vec![0, 0, 1, 1], 2).expect("valid partition"),
        ];
        let split = ClusterSplit::from_partitions(partitions, &codes).expect("valid split");
        let psi = Array1::from_elem(16, 1.0);
        let psi_a = Array1::from_elem(16, -2.0);

        let var = ClusterVariance::estimate(psi.view(), psi_a.view(), &split, &codes, &[4, 4])
            .expect("estimate succeeds");

        assert_relative_eq!(var.gamma_hat, 2.0, epsilon = 1e-12);
        assert_relative_eq!(var.j_hat, -2.0, epsilon = 1e-12);
        assert_relative_eq!(var.sigma2, 0.5, epsilon = 1e-12);
    }

    #[test]
    fn one_way_uses_cluster_count_scaling() {
        // Clusters {0,1} and {2}; two observations per cluster.
        let codes_vec = vec![0, 0, 1, 1, 2, 2];
        let codes = [codes_vec.as_slice()];
        let partition = ClusterPartition::from_assignment(vec![0, 0, 1], 2).expect("valid");
        let split = ClusterSplit::from_partitions(vec![partition], &codes).expect("valid split");
        let psi = Array1::from(vec![1.0, 1.0, 2.0, 0.0, -1.0, 3.0]);
        let psi_a = Array1::from_elem(6, -1.0);

        let var = ClusterVariance::estimate(psi.view(), psi_a.view(), &split, &codes, &[3])
            .expect("estimate succeeds");

        // Fold 0: |I| = 2, sums (2, 2) → Γ = 8/2 = 4, J = −4/2 = −2.
        // Fold 1: |I| = 1, sum 2 → Γ = 4, J = −2.
        assert_relative_eq!(var.gamma_hat, 4.0, epsilon = 1e-12);
        assert_relative_eq!(var.j_hat, -2.0, epsilon = 1e-12);
        assert_relative_eq!(var.sigma2, 1.0, epsilon = 1e-12);
        assert_eq!(var.scaling_factor, 3);
    }

    #[test]
    // Purpose
    // -------
    // σ̂² and Ĵ must not depend on the order in which folds are aggregated.
    //
    // Given
    // -----
    // - A random 9×7 split with K = 3 and non-trivial scores.
    //
    // Expect
    // ------
    // - Forward and reversed fold order agree to rounding.
    fn aggregation_is_invariant_to_fold_order() {
        // Arrange
        let (first, second) = grid_codes(9, 7);
        let codes = [first.as_slice(), second.as_slice()];
        let split = ClusterResampling::new(3, 1, Some(11))
            .expect("valid config")
            .split(&codes, &[9, 7])
            .expect("split succeeds")
            .remove(0);
        let psi = Array1::from_iter((0..63).map(|t| ((t * 37 % 11) as f64 - 5.0) / 3.0));
        let psi_a = Array1::from_iter((0..63).map(|t| -1.0 - (t % 5) as f64 / 10.0));

        // Act
        let forward = ClusterVariance::from_folds(
            psi.view(),
            psi_a.view(),
            split.folds().iter(),
            &codes,
            &[9, 7],
        )
        .expect("estimate succeeds");
        let reversed = ClusterVariance::from_folds(
            psi.view(),
            psi_a.view(),
            split.folds().iter().rev(),
            &codes,
            &[9, 7],
        )
        .expect("estimate succeeds");

        // Assert
        assert_relative_eq!(forward.j_hat, reversed.j_hat, max_relative = 1e-12);
        assert_relative_eq!(forward.sigma2, reversed.sigma2, max_relative = 1e-12);
        assert_eq!(forward.scaling_factor, 7);
    }

    #[test]
    fn zero_jacobian_is_an_error() {
        let codes_vec: Vec<usize> = (0..4).collect();
        let codes = [codes_vec.as_slice()];
        let partition = ClusterPartition::from_assignment(vec![0, 0, 1, 1], 2).expect("valid");
        let split = ClusterSplit::from_partitions(vec![partition], &codes).expect("valid split");
        let psi = Array1::from_elem(4, 1.0);
        let psi_a = Array1::zeros(4);

        let result = ClusterVariance::estimate(psi.view(), psi_a.view(), &split, &codes, &[4]);

        assert_eq!(result, Err(InferenceError::DegenerateJacobian { j_hat: 0.0 }));
    }

    #[test]
    fn mismatched_score_length_is_an_error() {
        let codes_vec: Vec<usize> = (0..4).collect();
        let codes = [codes_vec.as_slice()];
        let partition = ClusterPartition::from_assignment(vec![0, 0, 1, 1], 2).expect("valid");
        let split = ClusterSplit::from_partitions(vec![partition], &codes).expect("valid split");
        let psi = Array1::from_elem(4, 1.0);
        let psi_a = Array1::from_elem(3, -1.0);

        assert!(matches!(
            ClusterVariance::estimate(psi.view(), psi_a.view(), &split, &codes, &[4]),
            Err(InferenceError::LengthMismatch { what: "psi_a", .. })
        ));
    }
}
