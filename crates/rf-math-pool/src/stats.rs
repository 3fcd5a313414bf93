//! Aggregate pool statistics

use serde::{Deserialize, Serialize};

use crate::ticket::TicketRow;

/// Running totals over a ticket set
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PoolStats {
    pub tickets: u64,
    pub total_bet: f64,
    pub total_win: f64,
    pub hits: u64,
    pub bonus_triggers: u64,
    pub progressive_triggers: u64,
    pub capped: u64,
    pub max_win_ratio: f64,
}

impl PoolStats {
    /// Accumulate over a ticket slice
    pub fn from_tickets(tickets: &[TicketRow], cap_multiplier: u32) -> Self {
        let mut stats = Self::default();
        for ticket in tickets {
            stats.record(ticket, cap_multiplier);
        }
        stats
    }

    /// Add one ticket
    pub fn record(&mut self, ticket: &TicketRow, cap_multiplier: u32) {
        self.tickets += 1;
        self.total_bet += ticket.bet_amount;
        self.total_win += ticket.total_win;

        if ticket.hit {
            self.hits += 1;
        }
        if ticket.bonus_trigger {
            self.bonus_triggers += 1;
        }
        if ticket.progressive_trigger {
            self.progressive_triggers += 1;
        }
        if ticket.component_total() > ticket.bet_amount * cap_multiplier as f64 {
            self.capped += 1;
        }

        let ratio = ticket.win_ratio();
        if ratio > self.max_win_ratio {
            self.max_win_ratio = ratio;
        }
    }

    /// Realized RTP in percent
    pub fn rtp(&self) -> f64 {
        if self.total_bet > 0.0 {
            (self.total_win / self.total_bet) * 100.0
        } else {
            0.0
        }
    }

    /// Any-base-win rate in percent
    pub fn hit_rate(&self) -> f64 {
        self.rate(self.hits)
    }

    /// Bonus trigger rate in percent
    pub fn bonus_rate(&self) -> f64 {
        self.rate(self.bonus_triggers)
    }

    /// Progressive trigger rate in percent
    pub fn progressive_rate(&self) -> f64 {
        self.rate(self.progressive_triggers)
    }

    fn rate(&self, count: u64) -> f64 {
        if self.tickets > 0 {
            (count as f64 / self.tickets as f64) * 100.0
        } else {
            0.0
        }
    }
}
