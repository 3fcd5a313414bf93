//! Ticket records and money rounding

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

/// Round a currency amount to cents
pub fn round_cents(amount: f64) -> f64 {
    (amount * 100.0).round() / 100.0
}

/// Largest whole-cent amount not above `amount`
pub fn floor_cents(amount: f64) -> f64 {
    ((amount * 100.0) + 1e-9).floor() / 100.0
}

/// Payable total: pre-cap sum rounded to cents, then capped at
/// `bet × cap_multiplier`.
pub fn capped_total(pre_cap: f64, bet: f64, cap_multiplier: u32) -> f64 {
    let cap = floor_cents(bet * cap_multiplier as f64);
    round_cents(pre_cap.max(0.0)).min(cap)
}

/// One cosmetic winning-line record.
///
/// Serialized as `[line_index, symbol_count, symbol_id, amount]`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(from = "(u32, u8, u8, f64)", into = "(u32, u8, u8, f64)")]
pub struct WinLine {
    pub line_index: u32,
    pub symbol_count: u8,
    pub symbol_id: u8,
    pub amount: f64,
}

impl From<(u32, u8, u8, f64)> for WinLine {
    fn from((line_index, symbol_count, symbol_id, amount): (u32, u8, u8, f64)) -> Self {
        Self {
            line_index,
            symbol_count,
            symbol_id,
            amount,
        }
    }
}

impl From<WinLine> for (u32, u8, u8, f64) {
    fn from(line: WinLine) -> Self {
        (line.line_index, line.symbol_count, line.symbol_id, line.amount)
    }
}

/// Presentation payload consumed by the game client
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MainGame {
    /// Flat reel window, reel-major
    pub reels: Vec<u8>,
    /// Winning lines
    pub wls: Vec<WinLine>,
    /// Payable total
    pub win: f64,
}

impl MainGame {
    /// Sum of all win-line amounts
    pub fn line_total(&self) -> f64 {
        self.wls.iter().map(|l| l.amount).sum()
    }
}

/// One resolved spin outcome.
///
/// Never mutated after creation: corrections go through
/// [`TicketRow::with_corrected_wins`], which returns a new revision.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TicketRow {
    pub ticket_id: u64,
    pub ticket_num: String,
    pub game_id: String,
    pub correlation_id: String,

    pub jurisdiction: String,
    pub profile_id: String,
    pub currency: String,

    #[serde(rename = "entryLevel")]
    pub entry_level: u32,
    pub denom: f64,
    #[serde(rename = "betLevel")]
    pub bet_level: f64,
    pub bet_amount: f64,

    #[serde(rename = "mainGame")]
    pub main_game: MainGame,

    pub base_win: f64,
    pub bonus_win: f64,
    pub progressive_win: f64,
    #[serde(rename = "ticketWin")]
    pub ticket_win: f64,
    #[serde(rename = "totalWin")]
    pub total_win: f64,

    pub hit: bool,
    pub bonus_trigger: bool,
    pub progressive_trigger: bool,

    pub metrics: BTreeMap<String, serde_json::Value>,
}

impl TicketRow {
    /// Correlation id for a ticket of a pool
    pub fn correlation_id(game_id: &str, pool_seed: u64, ticket_id: u64) -> String {
        format!("{game_id}-{pool_seed}-{ticket_id}")
    }

    /// Win-to-bet ratio of the payable total
    pub fn win_ratio(&self) -> f64 {
        if self.bet_amount > 0.0 {
            self.total_win / self.bet_amount
        } else {
            0.0
        }
    }

    /// Pre-cap component sum
    pub fn component_total(&self) -> f64 {
        self.base_win + self.bonus_win + self.progressive_win
    }

    /// New revision with every win component scaled by `factor`.
    ///
    /// Components are rounded to cents and the total is recomputed under
    /// the same cap rule the builder uses. Win-line amounts are kept.
    pub fn with_corrected_wins(&self, factor: f64, cap_multiplier: u32) -> Self {
        let base_win = round_cents(self.base_win * factor);
        let bonus_win = round_cents(self.bonus_win * factor);
        let progressive_win = round_cents(self.progressive_win * factor);
        let total = capped_total(base_win + bonus_win + progressive_win, self.bet_amount, cap_multiplier);

        Self {
            base_win,
            bonus_win,
            progressive_win,
            ticket_win: total,
            total_win: total,
            main_game: MainGame {
                win: total,
                ..self.main_game.clone()
            },
            ..self.clone()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ticket(base: f64, bonus: f64, progressive: f64, bet: f64) -> TicketRow {
        let total = capped_total(base + bonus + progressive, bet, 100);
        TicketRow {
            ticket_id: 1,
            ticket_num: "1".into(),
            game_id: "g".into(),
            correlation_id: TicketRow::correlation_id("g", 42, 1),
            jurisdiction: "ON".into(),
            profile_id: "ON-DEFAULT".into(),
            currency: "CAD".into(),
            entry_level: 1,
            denom: 0.01,
            bet_level: bet,
            bet_amount: bet,
            main_game: MainGame {
                reels: vec![1; 15],
                wls: vec![WinLine::from((0, 3, 1, base))],
                win: total,
            },
            base_win: base,
            bonus_win: bonus,
            progressive_win: progressive,
            ticket_win: total,
            total_win: total,
            hit: base > 0.0,
            bonus_trigger: bonus > 0.0,
            progressive_trigger: progressive > 0.0,
            metrics: BTreeMap::new(),
        }
    }

    #[test]
    fn test_capped_total() {
        assert_eq!(capped_total(12.346, 1.0, 100), 12.35);
        assert_eq!(capped_total(250.0, 2.0, 100), 200.0);
        assert_eq!(capped_total(-1.0, 2.0, 100), 0.0);
    }

    #[test]
    fn test_correlation_id() {
        assert_eq!(TicketRow::correlation_id("9462", 42, 7), "9462-42-7");
    }

    #[test]
    fn test_corrected_wins_is_new_revision() {
        let original = ticket(10.0, 4.0, 0.0, 2.0);
        let corrected = original.with_corrected_wins(0.5, 100);

        assert_eq!(original.total_win, 14.0);
        assert_eq!(corrected.base_win, 5.0);
        assert_eq!(corrected.bonus_win, 2.0);
        assert_eq!(corrected.total_win, 7.0);
        assert_eq!(corrected.ticket_win, 7.0);
        assert_eq!(corrected.main_game.win, 7.0);
        // Cosmetic lines are untouched
        assert_eq!(corrected.main_game.wls, original.main_game.wls);
        assert_eq!(corrected.ticket_id, original.ticket_id);
    }

    #[test]
    fn test_corrected_wins_respects_cap() {
        let corrected = ticket(150.0, 0.0, 0.0, 1.0).with_corrected_wins(1.0, 100);
        assert_eq!(corrected.total_win, 100.0);
        assert_eq!(corrected.base_win, 150.0);
    }

    #[test]
    fn test_wire_names() {
        let value = serde_json::to_value(ticket(1.5, 0.0, 0.0, 1.0)).unwrap();
        assert!(value.get("mainGame").is_some());
        assert!(value.get("totalWin").is_some());
        assert!(value.get("entryLevel").is_some());
        assert_eq!(value["mainGame"]["wls"][0], serde_json::json!([0, 3, 1, 1.5]));
    }
}
