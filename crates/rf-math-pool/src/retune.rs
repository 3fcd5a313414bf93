//! Whole-pool RTP correction
//!
//! Runs after generation on the actual tickets, removing the drift that
//! per-ticket cent rounding and finite sample size leave behind.

use crate::stats::PoolStats;
use crate::ticket::TicketRow;

/// Relative deviation from target tolerated without correction
pub const RETUNE_TOLERANCE: f64 = 0.01;

/// Correction factor needed to move `tickets` to `target_rtp_percent`,
/// or `None` when the pool is already within tolerance (or degenerate).
pub fn retune_factor(tickets: &[TicketRow], target_rtp_percent: f64) -> Option<f64> {
    let (total_bet, total_win) = tickets
        .iter()
        .fold((0.0, 0.0), |(bet, win), t| (bet + t.bet_amount, win + t.total_win));

    if total_bet <= 0.0 || target_rtp_percent <= 0.0 {
        return None;
    }
    let realized = total_win / total_bet * 100.0;
    if realized <= 0.0 {
        return None;
    }

    let factor = target_rtp_percent / realized;
    ((factor - 1.0).abs() > RETUNE_TOLERANCE).then_some(factor)
}

/// Result of one retune pass
#[derive(Debug, Clone)]
pub struct Retuned {
    pub tickets: Vec<TicketRow>,
    /// Factor applied, `None` if the pool was left as-is
    pub factor: Option<f64>,
}

/// Replace every ticket with a corrected revision if the pool's realized
/// RTP is off target by more than [`RETUNE_TOLERANCE`].
pub fn retune_pool(tickets: Vec<TicketRow>, target_rtp_percent: f64, cap_multiplier: u32) -> Retuned {
    let Some(factor) = retune_factor(&tickets, target_rtp_percent) else {
        return Retuned {
            tickets,
            factor: None,
        };
    };

    let before = PoolStats::from_tickets(&tickets, cap_multiplier).rtp();
    let tickets: Vec<TicketRow> = tickets
        .iter()
        .map(|t| t.with_corrected_wins(factor, cap_multiplier))
        .collect();
    let after = PoolStats::from_tickets(&tickets, cap_multiplier).rtp();

    log::info!("retuned pool by {factor:.6}: RTP {before:.3}% -> {after:.3}% (target {target_rtp_percent:.3}%)");

    Retuned {
        tickets,
        factor: Some(factor),
    }
}
