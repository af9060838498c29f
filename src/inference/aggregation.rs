//! inference::aggregation — combining estimates across repetitions.
//!
//! With `n_rep` independent splits, the final estimate is the median of the
//! per-repetition coefficients and the standard error folds in the spread
//! of those coefficients around the median:
//!
//! ```text
//! θ  = median_r θ_r
//! se = √( median_r ( C·se_r² + (θ_r − θ)² ) / C )
//! ```
//!
//! where `C` is the variance scaling factor (number of independent
//! clusters). With a single repetition this returns `(θ_1, se_1)`.
use crate::inference::errors::{InferenceError, InferenceResult};

/// Aggregate per-repetition `(coef, se)` pairs into a single estimate.
///
/// Errors
/// ------
/// - `InferenceError::EmptyRepetitions` if `coefs` is empty.
/// - `InferenceError::LengthMismatch` if `coefs` and `ses` differ in length.
/// - `InferenceError::NonFinite` if any input is NaN or ±∞.
/// - `InferenceError::LengthMismatch` for `scaling_factor == 0`.
pub fn aggregate_repetitions(
    coefs: &[f64], ses: &[f64], scaling_factor: usize,
) -> InferenceResult<(f64, f64)> {
    if coefs.is_empty() {
        return Err(InferenceError::EmptyRepetitions);
    }
    if ses.len() != coefs.len() {
        return Err(InferenceError::LengthMismatch {
            what: "standard errors",
            expected: coefs.len(),
            found: ses.len(),
        });
    }
    if scaling_factor == 0 {
        return Err(InferenceError::LengthMismatch { what: "clusters", expected: 1, found: 0 });
    }
    if let Some(&value) = coefs.iter().chain(ses).find(|v| !v.is_finite()) {
        return Err(InferenceError::NonFinite { what: "repetition estimate", value });
    }

    let c = scaling_factor as f64;
    let coef = median(coefs.to_vec());
    let spread: Vec<f64> =
        coefs.iter().zip(ses).map(|(&th, &se)| c * se * se + (th - coef).powi(2)).collect();
    let se = (median(spread) / c).sqrt();

    Ok((coef, se))
}

/// Median of a non-empty, finite sample (mean of the two middle values for
/// even lengths).
fn median(mut values: Vec<f64>) -> f64 {
    values.sort_by(|a, b| a.total_cmp(b));
    let n = values.len();
    if n % 2 == 1 { values[n / 2] } else { 0.5 * (values[n / 2 - 1] + values[n / 2]) }
}
