//! RTP calibration
//!
//! Two stages:
//!
//! 1. Analytic seed: target / expected return multiplier.
//! 2. Monte-Carlo refinement: bracket + bisection on realized RTP measured
//!    over a fixed batch of draws, so that the cap and cent rounding are
//!    accounted for.
//!
//! Calibration draws come from their own fixed-seed stream, so the
//! effective config does not depend on the pool seed.

use rand::prelude::*;
use serde::{Deserialize, Serialize};

use crate::config::PoolConfig;
use crate::error::PoolResult;
use crate::sampler::{OutcomeSampler, pool_rng};
use crate::ticket::capped_total;

/// Seed of the calibration stream
pub const CALIBRATION_SEED: u64 = 0x00C0_FFEE_CA1B;

/// Calibration tuning
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CalibrationSettings {
    /// Draws per realized-RTP measurement
    pub sample_draws: usize,
    /// Seed of the calibration stream
    pub seed: u64,
    /// Bracket width factor around the analytic seed
    pub bracket_factor: f64,
    /// Maximum bracket adjustments before bisecting
    pub max_bracket_adjustments: u32,
    /// Maximum bisection steps
    pub max_bisection_steps: u32,
    /// Clamp of the analytic seed scale
    pub seed_scale_range: (f64, f64),
    /// Clamp of the final scale
    pub final_scale_range: (f64, f64),
}

impl Default for CalibrationSettings {
    fn default() -> Self {
        Self {
            sample_draws: 12_000,
            seed: CALIBRATION_SEED,
            bracket_factor: 5.0,
            max_bracket_adjustments: 6,
            max_bisection_steps: 14,
            seed_scale_range: (0.01, 100.0),
            final_scale_range: (0.001, 1000.0),
        }
    }
}

impl CalibrationSettings {
    /// Cheap settings for smoke runs
    pub fn quick() -> Self {
        Self {
            sample_draws: 2_000,
            max_bisection_steps: 10,
            ..Default::default()
        }
    }

    pub fn with_sample_draws(mut self, draws: usize) -> Self {
        self.sample_draws = draws;
        self
    }

    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = seed;
        self
    }
}

/// What the calibrator did
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CalibrationReport {
    /// Expected return multiplier before scaling
    pub expected_return: f64,
    /// Analytic first-pass scale
    pub seed_scale: f64,
    /// Converged scale applied to every multiplier table
    pub scale: f64,
    /// Realized RTP (percent) at `scale` over the calibration batch
    pub measured_rtp_percent: f64,
    pub bracket_adjustments: u32,
    pub bisection_steps: u32,
    /// Calibration was not run (target <= 0 or no positive expectation)
    pub skipped: bool,
}

impl CalibrationReport {
    fn skipped(expected_return: f64) -> Self {
        Self {
            expected_return,
            seed_scale: 1.0,
            scale: 1.0,
            measured_rtp_percent: 0.0,
            bracket_adjustments: 0,
            bisection_steps: 0,
            skipped: true,
        }
    }
}

/// Weighted mean of a multiplier table
pub fn weighted_mean(multipliers: &[f64], weights: &[f64]) -> f64 {
    let total: f64 = weights.iter().sum();
    if total <= 0.0 {
        return 0.0;
    }
    multipliers.iter().zip(weights).map(|(m, w)| m * w).sum::<f64>() / total
}

/// Closed-form expected return multiplier, ignoring cap and rounding
pub fn expected_return_multiplier(config: &PoolConfig, base_weights: &[f64]) -> f64 {
    let base = weighted_mean(&config.base_win_multipliers, base_weights);
    let bonus = config.bonus_trigger_percent / 100.0
        * weighted_mean(&config.bonus_win_multipliers, &config.bonus_win_weights);
    let progressive = config.progressive_trigger_percent / 100.0 * config.progressive_win_multiplier;
    base + bonus + progressive
}

/// Realized RTP (percent) of `config` scaled by `scale`, measured over
/// `settings.sample_draws` capped and rounded draws.
pub fn measure_rtp(
    config: &PoolConfig,
    sampler: &OutcomeSampler,
    scale: f64,
    settings: &CalibrationSettings,
) -> f64 {
    let mut rng = pool_rng(settings.seed);
    let mut total_bet = 0.0;
    let mut total_win = 0.0;

    for _ in 0..settings.sample_draws {
        let bet = config.bet_levels.choose(&mut rng).copied().unwrap_or_default();
        let outcome = sampler.sample(&mut rng);
        total_bet += bet;
        total_win += capped_total(
            bet * outcome.total_multiplier() * scale,
            bet,
            config.max_win_multiplier_cap,
        );
    }

    if total_bet > 0.0 {
        total_win / total_bet * 100.0
    } else {
        0.0
    }
}

/// Find the scale that brings realized RTP to `config.rtp_target_percent`
/// and return the effective config with it applied.
pub fn calibrate_rtp(
    config: &PoolConfig,
    base_weights: &[f64],
    settings: &CalibrationSettings,
) -> PoolResult<(PoolConfig, CalibrationReport)> {
    let target = config.rtp_target_percent;
    let expected = expected_return_multiplier(config, base_weights);

    if target <= 0.0 {
        log::debug!("RTP target {target} <= 0, calibration skipped");
        return Ok((config.clone(), CalibrationReport::skipped(expected)));
    }
    if expected <= 0.0 {
        log::warn!("expected return {expected} <= 0, calibration skipped");
        return Ok((config.clone(), CalibrationReport::skipped(expected)));
    }

    let (seed_min, seed_max) = settings.seed_scale_range;
    let seed_scale = (target / 100.0 / expected).clamp(seed_min, seed_max);

    let sampler = OutcomeSampler::new(config, base_weights)?;
    let measure = |scale: f64| measure_rtp(config, &sampler, scale, settings);

    let mut lo = seed_scale / settings.bracket_factor;
    let mut hi = seed_scale * settings.bracket_factor;
    let mut rtp_lo = measure(lo);
    let mut rtp_hi = measure(hi);

    let mut bracket_adjustments = 0;
    while bracket_adjustments < settings.max_bracket_adjustments {
        if rtp_lo > target {
            hi = lo;
            rtp_hi = rtp_lo;
            lo /= settings.bracket_factor;
            rtp_lo = measure(lo);
        } else if rtp_hi < target {
            lo = hi;
            rtp_lo = rtp_hi;
            hi *= settings.bracket_factor;
            rtp_hi = measure(hi);
        } else {
            break;
        }
        bracket_adjustments += 1;
    }
    log::debug!(
        "calibration bracket [{lo:.6}, {hi:.6}] -> [{rtp_lo:.3}%, {rtp_hi:.3}%] after {bracket_adjustments} adjustments"
    );

    let mut bisection_steps = 0;
    while bisection_steps < settings.max_bisection_steps {
        let mid = 0.5 * (lo + hi);
        if measure(mid) < target {
            lo = mid;
        } else {
            hi = mid;
        }
        bisection_steps += 1;
    }

    let (final_min, final_max) = settings.final_scale_range;
    let scale = (0.5 * (lo + hi)).clamp(final_min, final_max);
    let measured_rtp_percent = measure(scale);

    log::info!(
        "calibrated scale {scale:.6} (seed {seed_scale:.6}, expected return {expected:.6}), measured RTP {measured_rtp_percent:.3}% vs target {target:.3}%"
    );

    let report = CalibrationReport {
        expected_return: expected,
        seed_scale,
        scale,
        measured_rtp_percent,
        bracket_adjustments,
        bisection_steps,
        skipped: false,
    };
    Ok((config.scaled(scale), report))
}
