//! Weighted summary statistics.
//!
//! Weights need not be normalised but must be non-negative with a positive sum.

use ecsu_core::errors::{ECSUError, ECSUResult};
use ndarray::ArrayView1;

/// Check inputs and return the total weight
fn validate(values: ArrayView1<f64>, weights: ArrayView1<f64>) -> ECSUResult<f64> {
    if values.len() != weights.len() {
        return Err(ECSUError::Error(format!(
            "Values and weights differ in length ({} vs {})",
            values.len(),
            weights.len()
        )));
    }
    if values.is_empty() {
        return Err(ECSUError::Error("No values to summarise".to_string()));
    }
    for (index, (&v, &w)) in values.iter().zip(weights.iter()).enumerate() {
        if !v.is_finite() {
            return Err(ECSUError::InvalidInput {
                index,
                reason: format!("value {} is not finite", v),
            });
        }
        if !(w >= 0.0 && w.is_finite()) {
            return Err(ECSUError::InvalidInput {
                index,
                reason: format!("weight {} is negative or not finite", w),
            });
        }
    }
    let total = weights.sum();
    if total <= 0.0 {
        return Err(ECSUError::Error("Weights sum to zero".to_string()));
    }
    Ok(total)
}

pub fn weighted_mean(values: ArrayView1<f64>, weights: ArrayView1<f64>) -> ECSUResult<f64> {
    let total = validate(values, weights)?;
    Ok(values.dot(&weights) / total)
}

/// Weighted variance about the weighted mean, normalised by the total weight
pub fn weighted_variance(values: ArrayView1<f64>, weights: ArrayView1<f64>) -> ECSUResult<f64> {
    let total = validate(values, weights)?;
    let mean = values.dot(&weights) / total;
    let sum_sq: f64 = values
        .iter()
        .zip(weights.iter())
        .map(|(v, w)| w * (v - mean).powi(2))
        .sum();
    Ok(sum_sq / total)
}

/// Smallest value whose cumulative normalised weight reaches `q`.
///
/// Values with zero weight never enter the result.
pub fn weighted_quantile(
    values: ArrayView1<f64>,
    weights: ArrayView1<f64>,
    q: f64,
) -> ECSUResult<f64> {
    if !(0.0..=1.0).contains(&q) {
        return Err(ECSUError::Error(format!(
            "Quantile must be in [0, 1], got {}",
            q
        )));
    }
    let total = validate(values, weights)?;

    let mut order: Vec<usize> = (0..values.len()).filter(|&i| weights[i] > 0.0).collect();
    order.sort_by(|&i, &j| values[i].total_cmp(&values[j]));

    let mut cumulative = 0.0;
    for &i in &order {
        cumulative += weights[i] / total;
        // Summation drift must not push q = 1 past the last value
        if cumulative >= q - 1e-12 {
            return Ok(values[i]);
        }
    }
    // Non-empty because the total weight is positive
    Ok(values[order[order.len() - 1]])
}

/// Central credible interval containing `level` of the weight
pub fn credible_interval(
    values: ArrayView1<f64>,
    weights: ArrayView1<f64>,
    level: f64,
) -> ECSUResult<(f64, f64)> {
    if !(level > 0.0 && level < 1.0) {
        return Err(ECSUError::Error(format!(
            "Credible level must be in (0, 1), got {}",
            level
        )));
    }
    let tail = 0.5 * (1.0 - level);
    Ok((
        weighted_quantile(values, weights, tail)?,
        weighted_quantile(values, weights, 1.0 - tail)?,
    ))
}

/// Kish effective sample size, $(\sum w)^2 / \sum w^2$
pub fn effective_sample_size(weights: ArrayView1<f64>) -> f64 {
    let sum_sq = weights.dot(&weights);
    if sum_sq > 0.0 {
        weights.sum().powi(2) / sum_sq
    } else {
        0.0
    }
}
