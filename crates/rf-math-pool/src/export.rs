//! Pool generation and manifest
//!
//! ```text
//! PoolConfig ─► validate ─► apply_hit_rate ─► calibrate_rtp
//!                                                  │
//!                                        effective config
//!                                                  │
//!            seed ─► ChaCha8 ─► TicketBuilder × N ─┘
//!                                     │
//!                                retune_pool ─► PoolStats ─► PoolManifest
//! ```

use chrono::{DateTime, SecondsFormat, Utc};
use rand::Rng;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::builder::TicketBuilder;
use crate::calibrate::{CalibrationReport, CalibrationSettings, calibrate_rtp};
use crate::config::{GridSpec, PoolConfig, ReplacementPolicy, SelectionMethod};
use crate::error::{PoolError, PoolResult};
use crate::paylines::{Payline, generate_paylines};
use crate::retune::retune_pool;
use crate::sampler::{OutcomeSampler, pool_rng};
use crate::stats::PoolStats;
use crate::ticket::TicketRow;
use crate::weights::{apply_hit_rate, hit_probability};

/// Manifest schema tag
pub const MANIFEST_SCHEMA: &str = "pool.v1";

pub const CSV_FILE: &str = "math_pool.csv";
pub const JSONL_FILE: &str = "math_pool.jsonl";
pub const MANIFEST_FILE: &str = "manifest.json";

/// How tickets are actually drawn, whatever the recorded selection tags say
pub const GENERATION_SAMPLING: &str = "random_weighted_with_replacement";

/// Namespace for deterministic pool ids
const POOL_ID_NAMESPACE: Uuid = Uuid::NAMESPACE_OID;

// ═══════════════════════════════════════════════════════════════════════════════
// OPTIONS
// ═══════════════════════════════════════════════════════════════════════════════

/// Generation options
#[derive(Debug, Clone)]
pub struct GenerateOptions {
    /// Pool seed; drawn from the thread RNG when absent
    pub seed: Option<u64>,
    /// Fixed manifest timestamp, for reproducible output
    pub created_at: Option<DateTime<Utc>>,
    /// Progress is reported every this many tickets and at the last one
    pub progress_interval: usize,
    pub calibration: CalibrationSettings,
}

impl Default for GenerateOptions {
    fn default() -> Self {
        Self {
            seed: None,
            created_at: None,
            progress_interval: 10_000,
            calibration: CalibrationSettings::default(),
        }
    }
}

impl GenerateOptions {
    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = Some(seed);
        self
    }

    pub fn with_created_at(mut self, created_at: DateTime<Utc>) -> Self {
        self.created_at = Some(created_at);
        self
    }

    pub fn with_calibration(mut self, calibration: CalibrationSettings) -> Self {
        self.calibration = calibration;
        self
    }
}

// ═══════════════════════════════════════════════════════════════════════════════
// MANIFEST
// ═══════════════════════════════════════════════════════════════════════════════

/// Pool manifest, serialized as `manifest.json`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PoolManifest {
    pub schema: String,
    pub pool_id: String,
    pub created_at: String,
    pub meta: PoolMeta,
    pub files: Vec<ArtifactEntry>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PoolMeta {
    pub pool_id: String,
    pub created_at: String,
    pub game_id: String,
    pub game_name: String,
    pub jurisdiction: String,
    pub profile_id: String,
    pub currency: String,
    pub selection_method: SelectionMethod,
    pub replacement_policy: ReplacementPolicy,
    pub generation_sampling: String,
    pub ticket_count: usize,
    /// Decimal string; JSON numbers lose precision above 2^53
    pub seed_u64: String,
    pub wager: WagerMeta,
    pub layout: LayoutMeta,
    pub targets: TargetsMeta,
    pub observed: ObservedMeta,
    pub effective_math: EffectiveMath,
    pub calibration: CalibrationReport,
    pub retune_factor: Option<f64>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WagerMeta {
    pub denom: f64,
    pub entry_levels: Vec<u32>,
    pub bet_levels: Vec<f64>,
    pub coins_per_line: u32,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LayoutMeta {
    pub payline_count: u32,
    pub grid: GridSpec,
    pub paylines: Vec<Payline>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TargetsMeta {
    pub rtp_target_percent: f64,
    pub hit_rate_target_percent: f64,
    pub volatility_target: f64,
    pub max_win_multiplier_cap: u32,
    pub bonus_trigger_percent: f64,
    pub progressive_trigger_percent: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ObservedMeta {
    pub rtp_total_percent: f64,
    pub hit_rate_any_win_percent: f64,
    pub bonus_trigger_rate_percent: f64,
    pub progressive_trigger_rate_percent: f64,
}

impl From<&PoolStats> for ObservedMeta {
    fn from(stats: &PoolStats) -> Self {
        Self {
            rtp_total_percent: stats.rtp(),
            hit_rate_any_win_percent: stats.hit_rate(),
            bonus_trigger_rate_percent: stats.bonus_rate(),
            progressive_trigger_rate_percent: stats.progressive_rate(),
        }
    }
}

/// Tables the tickets were actually drawn from
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EffectiveMath {
    pub base_win_multipliers: Vec<f64>,
    /// After hit-rate adjustment
    pub base_win_weights: Vec<f64>,
    pub bonus_win_multipliers: Vec<f64>,
    pub bonus_win_weights: Vec<f64>,
    pub progressive_win_multiplier: f64,
}

impl EffectiveMath {
    fn new(effective: &PoolConfig, adjusted_base_weights: &[f64]) -> Self {
        Self {
            base_win_multipliers: effective.base_win_multipliers.clone(),
            base_win_weights: adjusted_base_weights.to_vec(),
            bonus_win_multipliers: effective.bonus_win_multipliers.clone(),
            bonus_win_weights: effective.bonus_win_weights.clone(),
            progressive_win_multiplier: effective.progressive_win_multiplier,
        }
    }
}

/// One logical artifact listed in the manifest
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ArtifactEntry {
    pub path: String,
    pub format: String,
    pub rows: usize,
}

// ═══════════════════════════════════════════════════════════════════════════════
// GENERATION
// ═══════════════════════════════════════════════════════════════════════════════

/// A generated pool
#[derive(Debug, Clone)]
pub struct GeneratedPool {
    /// Ordered by ticket id, starting at 1
    pub tickets: Vec<TicketRow>,
    pub manifest: PoolManifest,
    /// Calibrated config the tickets were drawn from
    pub effective_config: PoolConfig,
    pub stats: PoolStats,
}

impl GeneratedPool {
    pub fn seed(&self) -> &str {
        &self.manifest.meta.seed_u64
    }
}

/// Deterministic pool id for (game, seed, ticket count)
pub fn pool_id(game_id: &str, seed: u64, ticket_count: usize) -> Uuid {
    let name = format!("{game_id}:{seed}:{ticket_count}");
    Uuid::new_v5(&POOL_ID_NAMESPACE, name.as_bytes())
}

/// Generate a pool with default options
pub fn generate_pool(config: &PoolConfig, ticket_count: usize, seed: Option<u64>) -> PoolResult<GeneratedPool> {
    let options = GenerateOptions {
        seed,
        ..Default::default()
    };
    generate_pool_with(config, ticket_count, &options, |_, _| {})
}

/// Generate a pool, reporting `(done, total)` through `on_progress`
pub fn generate_pool_with<F>(
    config: &PoolConfig,
    ticket_count: usize,
    options: &GenerateOptions,
    mut on_progress: F,
) -> PoolResult<GeneratedPool>
where
    F: FnMut(usize, usize),
{
    if ticket_count == 0 {
        return Err(PoolError::InvalidTicketCount(ticket_count));
    }
    config.validate()?;

    if config.selection_method == SelectionMethod::Sequential
        || config.replacement_policy == ReplacementPolicy::WithoutReplacement
    {
        log::warn!(
            "selection {} / {} is recorded only; tickets are drawn {}",
            config.selection_method.as_str(),
            config.replacement_policy.as_str(),
            GENERATION_SAMPLING
        );
    }

    let adjusted_weights = apply_hit_rate(
        &config.base_win_multipliers,
        &config.base_win_weights,
        config.hit_rate_target_percent,
    )?;
    if config.targets_hit_rate() {
        log::debug!(
            "base hit probability {:.4} -> {:.4}",
            hit_probability(&config.base_win_multipliers, &config.base_win_weights),
            hit_probability(&config.base_win_multipliers, &adjusted_weights)
        );
    }
    let (effective, calibration) = calibrate_rtp(config, &adjusted_weights, &options.calibration)?;

    let seed = options.seed.unwrap_or_else(|| rand::rng().random());
    log::info!(
        "generating {ticket_count} tickets for {} (seed {seed})",
        config.game_id
    );

    let sampler = OutcomeSampler::new(&effective, &adjusted_weights)?;
    let builder = TicketBuilder::new(&effective, &sampler, seed);
    let mut rng = pool_rng(seed);
    let interval = options.progress_interval.max(1);

    let mut tickets = Vec::with_capacity(ticket_count);
    for i in 1..=ticket_count {
        tickets.push(builder.build(i as u64, &mut rng));
        if i % interval == 0 || i == ticket_count {
            log::debug!("generated {i}/{ticket_count}");
            on_progress(i, ticket_count);
        }
    }

    let cap = config.max_win_multiplier_cap;
    let retuned = retune_pool(tickets, config.rtp_target_percent, cap);
    let stats = PoolStats::from_tickets(&retuned.tickets, cap);

    log::info!(
        "pool {}: RTP {:.3}%, hit rate {:.3}%, max win {:.1}x",
        config.game_id,
        stats.rtp(),
        stats.hit_rate(),
        stats.max_win_ratio
    );

    let created_at = options
        .created_at
        .unwrap_or_else(Utc::now)
        .to_rfc3339_opts(SecondsFormat::Secs, true);
    let pool_id = pool_id(&config.game_id, seed, ticket_count).to_string();

    let meta = PoolMeta {
        pool_id: pool_id.clone(),
        created_at: created_at.clone(),
        game_id: config.game_id.clone(),
        game_name: config.game_name.clone(),
        jurisdiction: config.jurisdiction.clone(),
        profile_id: config.profile_id.clone(),
        currency: config.currency.clone(),
        selection_method: config.selection_method,
        replacement_policy: config.replacement_policy,
        generation_sampling: GENERATION_SAMPLING.to_string(),
        ticket_count,
        seed_u64: seed.to_string(),
        wager: WagerMeta {
            denom: config.denom,
            entry_levels: config.entry_levels.clone(),
            bet_levels: config.bet_levels.clone(),
            coins_per_line: config.coins_per_line,
        },
        layout: LayoutMeta {
            payline_count: config.payline_count,
            grid: config.grid,
            paylines: generate_paylines(config.payline_count, config.grid),
        },
        targets: TargetsMeta {
            rtp_target_percent: config.rtp_target_percent,
            hit_rate_target_percent: config.hit_rate_target_percent,
            volatility_target: config.volatility_target,
            max_win_multiplier_cap: cap,
            bonus_trigger_percent: config.bonus_trigger_percent,
            progressive_trigger_percent: config.progressive_trigger_percent,
        },
        observed: ObservedMeta::from(&stats),
        effective_math: EffectiveMath::new(&effective, &adjusted_weights),
        calibration,
        retune_factor: retuned.factor,
    };

    let files = vec![
        ArtifactEntry {
            path: CSV_FILE.to_string(),
            format: "csv".to_string(),
            rows: ticket_count,
        },
        ArtifactEntry {
            path: JSONL_FILE.to_string(),
            format: "jsonl".to_string(),
            rows: ticket_count,
        },
    ];

    Ok(GeneratedPool {
        tickets: retuned.tickets,
        manifest: PoolManifest {
            schema: MANIFEST_SCHEMA.to_string(),
            pool_id,
            created_at,
            meta,
            files,
        },
        effective_config: effective,
        stats,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn small_config() -> PoolConfig {
        PoolConfig::standard("9462", "Test Game")
            .with_base_table(vec![0.0, 1.0, 2.0, 5.0], vec![55.0, 25.0, 10.0, 5.0])
            .with_progressive(0.0, 0.0)
    }

    fn options(seed: u64) -> GenerateOptions {
        GenerateOptions::default()
            .with_seed(seed)
            .with_created_at(Utc.with_ymd_and_hms(2026, 1, 2, 3, 4, 5).unwrap())
            .with_calibration(CalibrationSettings::quick())
    }

    #[test]
    fn test_zero_tickets_rejected() {
        let err = generate_pool(&small_config(), 0, Some(1)).unwrap_err();
        assert!(matches!(err, PoolError::InvalidTicketCount(0)));
    }

    #[test]
    fn test_invalid_config_rejected_before_work() {
        let config = small_config().with_base_table(vec![0.0, 1.0], vec![1.0]);
        let mut calls = 0;
        let result = generate_pool_with(&config, 10, &options(1), |_, _| calls += 1);
        assert!(matches!(result, Err(PoolError::InvalidConfig(_))));
        assert_eq!(calls, 0);
    }

    #[test]
    fn test_progress_reporting() {
        let mut seen = Vec::new();
        let opts = GenerateOptions {
            progress_interval: 100,
            ..options(7)
        };
        generate_pool_with(&small_config(), 250, &opts, |done, total| seen.push((done, total))).unwrap();
        assert_eq!(seen, vec![(100, 250), (200, 250), (250, 250)]);
    }

    #[test]
    fn test_manifest_shape() {
        let pool = generate_pool_with(&small_config(), 500, &options(42), |_, _| {}).unwrap();
        let manifest = &pool.manifest;

        assert_eq!(manifest.schema, MANIFEST_SCHEMA);
        assert_eq!(manifest.created_at, "2026-01-02T03:04:05Z");
        assert_eq!(manifest.pool_id, pool_id("9462", 42, 500).to_string());
        assert_eq!(manifest.meta.seed_u64, "42");
        assert_eq!(pool.seed(), "42");
        assert_eq!(manifest.meta.layout.paylines.len(), 25);
        assert_eq!(manifest.files.len(), 2);
        assert_eq!(manifest.files[0].path, CSV_FILE);
        assert_eq!(manifest.files[1].rows, 500);
        assert_eq!(pool.tickets.len(), 500);
        assert_eq!(pool.stats.tickets, 500);

        let json = serde_json::to_value(manifest).unwrap();
        assert_eq!(json["meta"]["selection_method"], "random_uniform");
        assert!(json["meta"]["observed"]["rtp_total_percent"].is_number());
        assert!(json["meta"]["effective_math"]["base_win_weights"].is_array());
    }

    #[test]
    fn test_pool_id_is_stable() {
        assert_eq!(pool_id("g", 1, 10), pool_id("g", 1, 10));
        assert_ne!(pool_id("g", 1, 10), pool_id("g", 2, 10));
        assert_ne!(pool_id("g", 1, 10), pool_id("g", 1, 11));
    }

    #[test]
    fn test_random_seed_when_absent() {
        let pool = generate_pool_with(
            &small_config(),
            10,
            &GenerateOptions::default().with_calibration(CalibrationSettings::quick()),
            |_, _| {},
        )
        .unwrap();
        assert!(pool.seed().parse::<u64>().is_ok());
    }
}
