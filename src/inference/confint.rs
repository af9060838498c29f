//! inference::confint — normal-approximation summaries of a DML estimate.
//!
//! Provides the standard-normal quantile, two-sided confidence intervals
//! `θ̃ ± Φ⁻¹(1 − α/2)·se`, t-statistics, and two-sided p-values. All
//! distribution work goes through `statrs`.
use crate::inference::errors::{InferenceError, InferenceResult};
use statrs::distribution::{ContinuousCDF, Normal};

/// Standard-normal quantile `Φ⁻¹(p)` for `p ∈ (0, 1)`.
///
/// Errors
/// ------
/// - `InferenceError::InvalidLevel` if `p` is outside `(0, 1)`.
pub fn normal_quantile(p: f64) -> InferenceResult<f64> {
    if !(p > 0.0 && p < 1.0) {
        return Err(InferenceError::InvalidLevel { level: p });
    }
    let normal = Normal::new(0.0, 1.0)?;
    Ok(normal.inverse_cdf(p))
}

/// `θ̃ / se`; infinite when `se = 0` and `θ̃ ≠ 0`.
pub fn t_stat(coef: f64, se: f64) -> f64 {
    coef / se
}

/// Two-sided standard-normal p-value `2·(1 − Φ(|t|))`.
///
/// Errors
/// ------
/// - `InferenceError::NonFinite` if `t` is NaN.
pub fn p_value(t: f64) -> InferenceResult<f64> {
    if t.is_nan() {
        return Err(InferenceError::NonFinite { what: "t statistic", value: t });
    }
    let normal = Normal::new(0.0, 1.0)?;
    Ok((2.0 * normal.sf(t.abs())).min(1.0))
}

/// ConfidenceInterval — two-sided normal interval around a point estimate.
///
/// Fields
/// ------
/// - `lower`, `upper`: interval bounds.
/// - `level`: nominal coverage in `(0, 1)`, e.g. `0.95`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ConfidenceInterval {
    pub lower: f64,
    pub upper: f64,
    pub level: f64,
}

impl ConfidenceInterval {
    /// Build `coef ± Φ⁻¹(1 − α/2)·se` with `α = 1 − level`.
    ///
    /// Errors
    /// ------
    /// - `InferenceError::InvalidLevel` unless `0 < level < 1`.
    /// - `InferenceError::InvalidStandardError` if `se` is negative or
    ///   non-finite.
    ///
    /// Examples
    /// --------
    /// ```rust
    /// # use rust_dml::inference::ConfidenceInterval;
    /// let ci = ConfidenceInterval::normal(0.5, 0.1, 0.95).unwrap();
    /// assert!((ci.upper - 0.5 - 0.195996).abs() < 1e-5);
    /// ```
    pub fn normal(coef: f64, se: f64, level: f64) -> InferenceResult<Self> {
        if !(level > 0.0 && level < 1.0) {
            return Err(InferenceError::InvalidLevel { level });
        }
        if !se.is_finite() || se < 0.0 {
            return Err(InferenceError::InvalidStandardError { se });
        }
        let alpha = 1.0 - level;
        let z = normal_quantile(1.0 - alpha / 2.0)?;
        Ok(ConfidenceInterval { lower: coef - z * se, upper: coef + z * se, level })
    }

    pub fn width(&self) -> f64 {
        self.upper - self.lower
    }

    pub fn contains(&self, value: f64) -> bool {
        self.lower <= value && value <= self.upper
    }
}
