//! Hit-rate weight adjustment
//!
//! Only the "miss" mass (weights on zero multipliers) is rescaled, so the
//! relative shape of the win distribution is preserved.

use crate::error::{PoolError, PoolResult};

/// Rescale zero-multiplier weights so that P(multiplier != 0) equals
/// `hit_rate_target_percent / 100`.
///
/// A target of exactly 0 disables targeting and returns the weights as-is.
pub fn apply_hit_rate(
    multipliers: &[f64],
    weights: &[f64],
    hit_rate_target_percent: f64,
) -> PoolResult<Vec<f64>> {
    if hit_rate_target_percent == 0.0 {
        return Ok(weights.to_vec());
    }

    if multipliers.len() != weights.len() {
        return Err(PoolError::InvalidConfig(format!(
            "multipliers and weights must have same length ({} != {})",
            multipliers.len(),
            weights.len()
        )));
    }

    let desired = hit_rate_target_percent / 100.0;
    if !(desired > 0.0 && desired < 1.0) {
        return Err(PoolError::HitRate(format!(
            "target must be between 0 and 100 (exclusive), got {hit_rate_target_percent}"
        )));
    }

    let (zero_idx, nonzero_idx): (Vec<usize>, Vec<usize>) =
        (0..multipliers.len()).partition(|&i| multipliers[i] == 0.0);

    if zero_idx.is_empty() {
        return Err(PoolError::HitRate(
            "requires a 0 multiplier in base_win_multipliers".into(),
        ));
    }
    if nonzero_idx.is_empty() {
        return Err(PoolError::HitRate(
            "requires at least one non-zero multiplier".into(),
        ));
    }

    let total_nonzero: f64 = nonzero_idx.iter().map(|&i| weights[i]).sum();
    if total_nonzero <= 0.0 {
        return Err(PoolError::HitRate("non-zero weights must sum to > 0".into()));
    }
    let target_zero_total = total_nonzero * (1.0 - desired) / desired;

    let mut updated = weights.to_vec();
    let existing_zero_total: f64 = zero_idx.iter().map(|&i| updated[i]).sum();
    if existing_zero_total > 0.0 {
        let scale = target_zero_total / existing_zero_total;
        for &i in &zero_idx {
            updated[i] *= scale;
        }
    } else {
        let per = target_zero_total / zero_idx.len() as f64;
        for &i in &zero_idx {
            updated[i] = per;
        }
    }

    log::debug!(
        "hit-rate {:.2}%: zero mass {:.4} -> {:.4}",
        hit_rate_target_percent,
        existing_zero_total,
        target_zero_total
    );

    Ok(updated)
}

/// Probability of a nonzero multiplier under `weights`
pub fn hit_probability(multipliers: &[f64], weights: &[f64]) -> f64 {
    let total: f64 = weights.iter().sum();
    if total <= 0.0 {
        return 0.0;
    }
    let hits: f64 = multipliers
        .iter()
        .zip(weights)
        .filter(|(m, _)| **m != 0.0)
        .map(|(_, w)| *w)
        .sum();
    hits / total
}
