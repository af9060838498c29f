//! estimation::score — linear score elements and the moment-condition solve.
//!
//! Every supported model has a score that is linear in θ,
//! `ψ(W; θ, η) = ψ_a(W; η)·θ + ψ_b(W; η)`, so the cross-fitted estimate is
//! the root of a (fold-weighted) average of `ψ`. Fold weights follow the
//! cluster structure: a fold scoring `I_k × J_ℓ` gets `1/(|I_k||J_ℓ|)`, a
//! one-way fold `1/|I_k|`.
use crate::{
    estimation::{
        errors::{DmlError, DmlResult},
        options::DmlProcedure,
    },
    resampling::{ClusterFold, ClusterSplit},
};
use ndarray::Array1;

/// ScoreElements — per-observation `ψ_a` and `ψ_b` of one repetition.
#[derive(Debug, Clone, PartialEq)]
pub struct ScoreElements {
    pub psi_a: Array1<f64>,
    pub psi_b: Array1<f64>,
}

impl ScoreElements {
    /// Pair up score elements.
    ///
    /// Errors
    /// ------
    /// - `DmlError::ScoreLengthMismatch` if lengths differ.
    pub fn new(psi_a: Array1<f64>, psi_b: Array1<f64>) -> DmlResult<Self> {
        if psi_a.len() != psi_b.len() {
            return Err(DmlError::ScoreLengthMismatch { psi_a: psi_a.len(), psi_b: psi_b.len() });
        }
        Ok(ScoreElements { psi_a, psi_b })
    }

    pub fn len(&self) -> usize {
        self.psi_a.len()
    }

    pub fn is_empty(&self) -> bool {
        self.psi_a.is_empty()
    }

    /// Score values `ψ_a·θ + ψ_b` at `theta`.
    pub fn psi(&self, theta: f64) -> Array1<f64> {
        &self.psi_a * theta + &self.psi_b
    }

    /// Solve the moment condition over the folds of `split`.
    ///
    /// - `Dml2`: `θ̃ = −Σ_f w_f Σ_{test} ψ_b / Σ_f w_f Σ_{test} ψ_a`.
    /// - `Dml1`: mean over folds of `−Σ_{test} ψ_b / Σ_{test} ψ_a`.
    ///
    /// Errors
    /// ------
    /// - `DmlError::DegenerateScore` if a denominator is zero or non-finite.
    pub fn solve(&self, split: &ClusterSplit, procedure: DmlProcedure) -> DmlResult<f64> {
        match procedure {
            DmlProcedure::Dml2 => {
                let (mut num, mut den) = (0.0, 0.0);
                for fold in split.folds() {
                    let weight = 1.0 / fold.n_test_cells() as f64;
                    let (a, b) = self.fold_sums(fold);
                    den += weight * a;
                    num += weight * b;
                }
                ratio(num, den)
            }
            DmlProcedure::Dml1 => {
                let mut total = 0.0;
                for fold in split.folds() {
                    let (a, b) = self.fold_sums(fold);
                    total += ratio(b, a)?;
                }
                Ok(total / split.n_folds() as f64)
            }
        }
    }

    fn fold_sums(&self, fold: &ClusterFold) -> (f64, f64) {
        fold.test()
            .iter()
            .fold((0.0, 0.0), |(a, b), &t| (a + self.psi_a[t], b + self.psi_b[t]))
    }
}

fn ratio(num: f64, den: f64) -> DmlResult<f64> {
    if den == 0.0 || !den.is_finite() {
        return Err(DmlError::DegenerateScore { denominator: den });
    }
    Ok(-num / den)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::resampling::ClusterPartition;
    use approx::assert_relative_eq;
    use ndarray::array;

    fn one_way_split() -> ClusterSplit {
        // Four clusters of one observation each; folds {0, 1} and {2, 3}.
        let codes: Vec<usize> = (0..4).collect();
        let partition = ClusterPartition::from_assignment(vec![0, 0, 1, 1], 2).expect("valid");
        ClusterSplit::from_partitions(vec![partition], &[codes.as_slice()]).expect("valid split")
    }

    #[test]
    // Purpose
    // -------
    // dml1 and dml2 must follow their weighting rules.
    //
    // Given
    // -----
    // - Folds {0,1} and {2,3}; ψ_a = (−1, −1, −2, −2), ψ_b = (1, 1, 2, 6).
    //
    // Expect
    // ------
    // - dml1: mean(2/2, 8/4) = 1.5.
    // - dml2 (weights 1/2 each): (1 + 4) / (1 + 2) = 5/3.
    fn procedures_follow_weighting_rules() {
        // Arrange
        let split = one_way_split();
        let elements =
            ScoreElements::new(array![-1.0, -1.0, -2.0, -2.0], array![1.0, 1.0, 2.0, 6.0])
                .expect("valid");

        // Act
        let dml1 = elements.solve(&split, DmlProcedure::Dml1).expect("solvable");
        let dml2 = elements.solve(&split, DmlProcedure::Dml2).expect("solvable");

        // Assert
        assert_relative_eq!(dml1, 1.5, epsilon = 1e-12);
        assert_relative_eq!(dml2, 5.0 / 3.0, epsilon = 1e-12);
        let psi = elements.psi(dml2);
        assert_relative_eq!(psi[0], -1.0 * 5.0 / 3.0 + 1.0, epsilon = 1e-12);
    }

    #[test]
    fn zero_denominator_is_an_error() {
        let split = one_way_split();
        let elements =
            ScoreElements::new(array![0.0, 0.0, -1.0, -1.0], array![1.0, 1.0, 1.0, 1.0])
                .expect("valid");
        assert!(matches!(
            elements.solve(&split, DmlProcedure::Dml1),
            Err(DmlError::DegenerateScore { .. })
        ));
        assert!(elements.solve(&split, DmlProcedure::Dml2).is_ok());
    }

    #[test]
    fn mismatched_elements_are_rejected() {
        assert_eq!(
            ScoreElements::new(array![1.0], array![1.0, 2.0]),
            Err(DmlError::ScoreLengthMismatch { psi_a: 1, psi_b: 2 })
        );
    }
}
