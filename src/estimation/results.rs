//! estimation::results — fitted DML estimates and their summaries.
//!
//! [`DmlOutcome`] keeps the aggregated estimates together with everything
//! needed to audit them: per-repetition coefficients and standard errors,
//! the variance components, the score elements, and the splits used.
use crate::{
    estimation::{errors::DmlResult, options::DmlProcedure, score::ScoreElements},
    inference::{ClusterVariance, ConfidenceInterval, p_value, t_stat},
    resampling::ClusterSplit,
};
use ndarray::{Array1, Array2};

/// DmlOutcome — result of fitting a DML model.
///
/// Key behaviors
/// -------------
/// - `coef()` / `se()` hold one entry per treatment column, aggregated over
///   repetitions with the median rule.
/// - `all_coef()` / `all_se()` are `n_treat × n_rep`.
/// - `confint`, `t_stat`, `p_value` use the normal approximation.
/// - `Display` prints a summary table.
#[derive(Debug, Clone, PartialEq)]
pub struct DmlOutcome {
    pub(crate) model: String,
    pub(crate) treatment_names: Vec<String>,
    pub(crate) coef: Array1<f64>,
    pub(crate) se: Array1<f64>,
    pub(crate) all_coef: Array2<f64>,
    pub(crate) all_se: Array2<f64>,
    pub(crate) variances: Vec<Vec<ClusterVariance>>,
    pub(crate) scores: Vec<Vec<ScoreElements>>,
    pub(crate) splits: Vec<ClusterSplit>,
    pub(crate) n_obs: usize,
    pub(crate) n_clusters: Vec<usize>,
    pub(crate) procedure: DmlProcedure,
}

impl DmlOutcome {
    pub fn model(&self) -> &str {
        &self.model
    }

    pub fn treatment_names(&self) -> &[String] {
        &self.treatment_names
    }

    pub fn coef(&self) -> &Array1<f64> {
        &self.coef
    }

    pub fn se(&self) -> &Array1<f64> {
        &self.se
    }

    pub fn all_coef(&self) -> &Array2<f64> {
        &self.all_coef
    }

    pub fn all_se(&self) -> &Array2<f64> {
        &self.all_se
    }

    pub fn n_rep(&self) -> usize {
        self.splits.len()
    }

    pub fn n_obs(&self) -> usize {
        self.n_obs
    }

    pub fn n_clusters(&self) -> &[usize] {
        &self.n_clusters
    }

    pub fn procedure(&self) -> DmlProcedure {
        self.procedure
    }

    /// Splits used for each repetition.
    pub fn splits(&self) -> &[ClusterSplit] {
        &self.splits
    }

    /// Variance components of treatment `treatment` in repetition `rep`.
    pub fn variance(&self, treatment: usize, rep: usize) -> Option<&ClusterVariance> {
        self.variances.get(treatment)?.get(rep)
    }

    /// Score elements of treatment `treatment` in repetition `rep`.
    pub fn score_elements(&self, treatment: usize, rep: usize) -> Option<&ScoreElements> {
        self.scores.get(treatment)?.get(rep)
    }

    pub fn t_stat(&self) -> Array1<f64> {
        Array1::from_iter(self.coef.iter().zip(&self.se).map(|(&c, &s)| t_stat(c, s)))
    }

    /// Two-sided p-values of `H₀: θ = 0`.
    pub fn p_value(&self) -> DmlResult<Array1<f64>> {
        let values =
            self.t_stat().iter().map(|&t| p_value(t)).collect::<Result<Vec<_>, _>>()?;
        Ok(Array1::from(values))
    }

    /// Normal confidence intervals at `level` (e.g. `0.95`), one per
    /// treatment.
    pub fn confint(&self, level: f64) -> DmlResult<Vec<ConfidenceInterval>> {
        let intervals = self
            .coef
            .iter()
            .zip(&self.se)
            .map(|(&c, &s)| ConfidenceInterval::normal(c, s, level))
            .collect::<Result<Vec<_>, _>>()?;
        Ok(intervals)
    }

    /// Render the summary table shown by `Display`.
    pub fn summary(&self) -> DmlResult<String> {
        let t = self.t_stat();
        let p = self.p_value()?;
        let ci = self.confint(0.95)?;
        let width = self.treatment_names.iter().map(|n| n.len()).max().unwrap_or(1).max(4);

        let mut out = format!("DoubleML {} with cluster-robust inference\n", self.model);
        out.push_str(&format!(
            "observations: {}, clusters: {:?}, repetitions: {}, procedure: {}\n",
            self.n_obs,
            self.n_clusters,
            self.n_rep(),
            self.procedure
        ));
        out.push_str(&format!(
            "{:<width$} {:>10} {:>10} {:>9} {:>8} {:>10} {:>10}\n",
            "", "coef", "std err", "t", "P>|t|", "2.5 %", "97.5 %"
        ));
        for (j, name) in self.treatment_names.iter().enumerate() {
            out.push_str(&format!(
                "{:<width$} {:>10.6} {:>10.6} {:>9.4} {:>8.4} {:>10.6} {:>10.6}\n",
                name, self.coef[j], self.se[j], t[j], p[j], ci[j].lower, ci[j].upper
            ));
        }
        Ok(out)
    }
}

impl std::fmt::Display for DmlOutcome {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let summary = self.summary().map_err(|_| std::fmt::Error)?;
        write!(f, "{summary}")
    }
}
