//! estimation::engine — shared fit loop for linear-score DML models.
//!
//! Every estimator provides its score elements for one treatment column and
//! one split; this module owns everything around that: up-front validation,
//! drawing or checking splits, solving the moment condition, the
//! cluster-robust variance, and aggregation across repetitions.
use crate::{
    data::ClusterData,
    estimation::{
        errors::DmlResult, options::DmlOptions, results::DmlOutcome, score::ScoreElements,
    },
    inference::{ClusterVariance, aggregate_repetitions},
    resampling::{ClusterSplit, ResamplingError, validate_cluster_split, validate_fold_count},
};
use log::{debug, info, warn};
use ndarray::{Array1, Array2};

/// A DML model whose score is linear in the target parameter.
pub(crate) trait LinearScoreModel {
    /// Label used in logs and summaries, e.g. `"PLR (partialling out)"`.
    fn model_name(&self) -> String;

    /// Model-specific checks on the data, run before any split is drawn.
    fn check_data(&self, data: &ClusterData) -> DmlResult<()>;

    /// Cross-fitted `ψ_a`, `ψ_b` for treatment column `treatment`.
    fn score_elements(
        &self, data: &ClusterData, treatment: usize, split: &ClusterSplit, parallel: bool,
    ) -> DmlResult<ScoreElements>;
}

/// Fit `model` on `data`, drawing splits from `options` unless `splits` is
/// given.
pub(crate) fn fit_linear_score<M: LinearScoreModel>(
    model: &M, options: &DmlOptions, data: &ClusterData, splits: Option<Vec<ClusterSplit>>,
) -> DmlResult<DmlOutcome> {
    model.check_data(data)?;
    let name = model.model_name();
    let codes = data.cluster_codes_per_dim();
    let n_clusters = data.n_clusters_per_dim();

    let splits = match splits {
        Some(splits) => {
            if splits.is_empty() {
                return Err(ResamplingError::InvalidRepetitions { n_rep: 0 }.into());
            }
            for split in &splits {
                validate_cluster_split(split, &codes, &n_clusters)?;
            }
            if splits.len() != options.n_rep {
                warn!(
                    "{name}: {} supplied splits override n_rep = {}",
                    splits.len(),
                    options.n_rep
                );
            }
            splits
        }
        None => {
            for (dim, &n) in n_clusters.iter().enumerate() {
                validate_fold_count(options.n_folds, n, dim)?;
            }
            options.resampling().split_data(data)?
        }
    };
    let n_rep = splits.len();
    let n_treat = data.n_treat();

    info!(
        "fitting {name}: {} observations, clusters {:?}, {} folds per repetition, {} repetition(s), {}",
        data.n_obs(),
        n_clusters,
        splits[0].n_folds(),
        n_rep,
        options.procedure
    );

    let mut all_coef = Array2::<f64>::zeros((n_treat, n_rep));
    let mut all_se = Array2::<f64>::zeros((n_treat, n_rep));
    let mut coef = Array1::<f64>::zeros(n_treat);
    let mut se = Array1::<f64>::zeros(n_treat);
    let mut variances = Vec::with_capacity(n_treat);
    let mut scores = Vec::with_capacity(n_treat);

    for j in 0..n_treat {
        let mut treat_variances = Vec::with_capacity(n_rep);
        let mut treat_scores = Vec::with_capacity(n_rep);
        for (r, split) in splits.iter().enumerate() {
            let elements = model.score_elements(data, j, split, options.parallel)?;
            let theta = elements.solve(split, options.procedure)?;
            let psi = elements.psi(theta);
            let variance = ClusterVariance::estimate(
                psi.view(),
                elements.psi_a.view(),
                split,
                &codes,
                &n_clusters,
            )?;
            debug!(
                "{name} [{}] repetition {r}: theta = {theta:.6}, se = {:.6}, J_hat = {:.6}",
                data.treatment_names()[j],
                variance.se,
                variance.j_hat
            );
            all_coef[[j, r]] = theta;
            all_se[[j, r]] = variance.se;
            treat_variances.push(variance);
            treat_scores.push(elements);
        }

        let coefs_j = all_coef.row(j).to_vec();
        let ses_j = all_se.row(j).to_vec();
        let (coef_j, se_j) =
            aggregate_repetitions(&coefs_j, &ses_j, treat_variances[0].scaling_factor)?;
        coef[j] = coef_j;
        se[j] = se_j;
        info!("{name} [{}]: coef = {coef_j:.6}, se = {se_j:.6}", data.treatment_names()[j]);

        variances.push(treat_variances);
        scores.push(treat_scores);
    }

    Ok(DmlOutcome {
        model: name,
        treatment_names: data.treatment_names().to_vec(),
        coef,
        se,
        all_coef,
        all_se,
        variances,
        scores,
        splits,
        n_obs: data.n_obs(),
        n_clusters,
        procedure: options.procedure,
    })
}
