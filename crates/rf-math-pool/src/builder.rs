//! Ticket builder: one sampled outcome in, one payable ticket out

use std::collections::BTreeMap;

use rand::prelude::*;

use crate::config::{GridSpec, PoolConfig};
use crate::sampler::OutcomeSampler;
use crate::ticket::{MainGame, TicketRow, WinLine, capped_total, floor_cents};

/// Most winning lines synthesized for one ticket
pub const MAX_WIN_LINES: u32 = 4;

/// Highest symbol id drawn into the illustrative reel window
pub const WINDOW_SYMBOL_MAX: u8 = 12;

/// Builds tickets for one pool.
///
/// Per ticket the shared stream is consumed as: bet level, entry level,
/// outcome (see [`crate::sampler`]), win lines, reel window.
pub struct TicketBuilder<'a> {
    config: &'a PoolConfig,
    sampler: &'a OutcomeSampler,
    pool_seed: u64,
}

impl<'a> TicketBuilder<'a> {
    /// `config` is the effective (calibrated) config the sampler was built from
    pub fn new(config: &'a PoolConfig, sampler: &'a OutcomeSampler, pool_seed: u64) -> Self {
        Self {
            config,
            sampler,
            pool_seed,
        }
    }

    /// Build ticket `ticket_id` (1-based)
    pub fn build<R: Rng + ?Sized>(&self, ticket_id: u64, rng: &mut R) -> TicketRow {
        debug_assert!(ticket_id >= 1, "ticket ids are 1-based");
        let cfg = self.config;

        let bet_level = cfg.bet_levels.choose(rng).copied().unwrap_or_default();
        let entry_level = cfg.entry_levels.choose(rng).copied().unwrap_or_default();
        let bet_amount = bet_level;

        let outcome = self.sampler.sample(rng);
        let base_win = bet_amount * outcome.base_multiplier;
        let bonus_win = bet_amount * outcome.bonus_multiplier;
        let progressive_win = bet_amount * outcome.progressive_multiplier;

        let total_win = capped_total(
            base_win + bonus_win + progressive_win,
            bet_amount,
            cfg.max_win_multiplier_cap,
        );

        let wls = if total_win > 0.0 && cfg.payline_count > 0 {
            synthesize_win_lines(rng, base_win.min(total_win), cfg.payline_count)
        } else {
            Vec::new()
        };
        let reels = reel_window(rng, cfg.grid);

        let mut metrics = BTreeMap::new();
        metrics.insert("poolSeed".to_string(), self.pool_seed.to_string().into());
        metrics.insert("notes".to_string(), "distribution-template".into());

        TicketRow {
            ticket_id,
            ticket_num: ticket_id.to_string(),
            game_id: cfg.game_id.clone(),
            correlation_id: TicketRow::correlation_id(&cfg.game_id, self.pool_seed, ticket_id),
            jurisdiction: cfg.jurisdiction.clone(),
            profile_id: cfg.profile_id.clone(),
            currency: cfg.currency.clone(),
            entry_level,
            denom: cfg.denom,
            bet_level,
            bet_amount,
            main_game: MainGame {
                reels,
                wls,
                win: total_win,
            },
            base_win,
            bonus_win,
            progressive_win,
            ticket_win: total_win,
            total_win,
            hit: outcome.is_hit(),
            bonus_trigger: outcome.bonus_trigger,
            progressive_trigger: outcome.progressive_trigger,
            metrics,
        }
    }
}

/// Split `amount` across 1..=4 random lines.
///
/// Works in whole cents: each piece but the last is uniform in
/// `[1, remaining]`, the last takes what is left. The pieces never sum to
/// more than `amount`.
pub fn synthesize_win_lines<R: Rng + ?Sized>(rng: &mut R, amount: f64, payline_count: u32) -> Vec<WinLine> {
    if payline_count == 0 {
        return Vec::new();
    }

    let line_hits = rng.random_range(1..=MAX_WIN_LINES).min(payline_count);
    let mut remaining = (floor_cents(amount.max(0.0)) * 100.0).round() as i64;
    let mut lines = Vec::with_capacity(line_hits as usize);

    for k in 0..line_hits {
        if remaining <= 0 {
            break;
        }
        let piece = if k + 1 == line_hits {
            remaining
        } else {
            rng.random_range(1..=remaining)
        };
        remaining -= piece;

        lines.push(WinLine {
            line_index: rng.random_range(0..payline_count),
            symbol_count: rng.random_range(3..=5),
            symbol_id: rng.random_range(1..=9),
            amount: piece as f64 / 100.0,
        });
    }

    lines
}

/// Illustrative reel window, unrelated to the win math
pub fn reel_window<R: Rng + ?Sized>(rng: &mut R, grid: GridSpec) -> Vec<u8> {
    (0..grid.total_positions())
        .map(|_| rng.random_range(1..=WINDOW_SYMBOL_MAX))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sampler::pool_rng;

    fn build_many(config: &PoolConfig, n: u64, seed: u64) -> Vec<TicketRow> {
        let sampler = OutcomeSampler::new(config, &config.base_win_weights).unwrap();
        let builder = TicketBuilder::new(config, &sampler, seed);
        let mut rng = pool_rng(seed);
        (1..=n).map(|id| builder.build(id, &mut rng)).collect()
    }

    #[test]
    fn test_ticket_identity() {
        let config = PoolConfig::standard("9462", "G");
        let tickets = build_many(&config, 3, 42);

        assert_eq!(tickets[0].ticket_id, 1);
        assert_eq!(tickets[2].ticket_num, "3");
        assert_eq!(tickets[1].correlation_id, "9462-42-2");
        assert_eq!(tickets[0].metrics["poolSeed"], serde_json::json!("42"));
        assert_eq!(tickets[0].main_game.reels.len(), 15);
    }

    #[test]
    fn test_cap_applies() {
        let config = PoolConfig::standard("g", "G")
            .with_base_table(vec![0.0, 50.0], vec![1.0, 1.0])
            .with_max_win_cap(2);

        for t in build_many(&config, 500, 5) {
            assert!(t.total_win <= t.bet_amount * 2.0 + 1e-9);
            if t.hit {
                assert_eq!(t.base_win, t.bet_amount * 50.0);
            }
        }
    }

    #[test]
    fn test_lines_never_exceed_base_portion() {
        let config = PoolConfig::standard("g", "G");
        for t in build_many(&config, 2000, 11) {
            let base_portion = t.base_win.min(t.total_win);
            assert!(t.main_game.line_total() <= base_portion + 1e-9);
            assert!(t.main_game.wls.len() <= MAX_WIN_LINES as usize);
            assert!(t.total_win >= 0.0);
            for line in &t.main_game.wls {
                assert!(line.line_index < config.payline_count);
                assert!((3..=5).contains(&line.symbol_count));
                assert!((1..=9).contains(&line.symbol_id));
                assert!(line.amount > 0.0);
            }
        }
    }

    #[test]
    fn test_no_lines_without_paylines() {
        let config = PoolConfig::standard("g", "G").with_paylines(0);
        assert!(build_many(&config, 500, 3).iter().all(|t| t.main_game.wls.is_empty()));
    }

    #[test]
    fn test_single_line_takes_whole_amount() {
        let mut rng = pool_rng(8);
        let lines = synthesize_win_lines(&mut rng, 12.34, 1);
        assert_eq!(lines.len(), 1);
        assert_eq!(lines[0].amount, 12.34);
        assert_eq!(lines[0].line_index, 0);
    }

    #[test]
    fn test_reel_window_range() {
        let mut rng = pool_rng(1);
        let window = reel_window(&mut rng, GridSpec::standard_5x4());
        assert_eq!(window.len(), 20);
        assert!(window.iter().all(|s| (1..=WINDOW_SYMBOL_MAX).contains(s)));
    }
}
