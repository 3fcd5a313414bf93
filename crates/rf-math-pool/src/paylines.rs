//! Payline layout
//!
//! Deterministic row-per-reel patterns. Win-line records refer to these by
//! index; the layout is published in the manifest so clients can draw them.

use serde::{Deserialize, Serialize};

use crate::config::GridSpec;

/// A payline definition
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Payline {
    /// Payline index (0-based)
    pub index: u32,
    /// Row for each reel (e.g. `[0, 1, 2, 1, 0]` for a "V")
    pub positions: Vec<u8>,
}

impl Payline {
    /// Same row across all reels
    pub fn straight(index: u32, row: u8, reels: u8) -> Self {
        Self {
            index,
            positions: vec![row; reels as usize],
        }
    }

    fn from_fn(index: u32, reels: u8, f: impl Fn(i32) -> i32, rows: u8) -> Self {
        let positions = (0..reels as i32)
            .map(|col| f(col).rem_euclid(rows as i32) as u8)
            .collect();
        Self { index, positions }
    }
}

const V_SHAPE: [u8; 5] = [0, 1, 2, 1, 0];
const INVERTED_V: [u8; 5] = [2, 1, 0, 1, 2];

/// Generate `count` paylines for `grid`.
///
/// Order: middle, top, bottom, V, inverted V (where the grid allows), then
/// a cycle of diagonal / zigzag variants. Patterns may repeat once the
/// grid's distinct shapes run out.
pub fn generate_paylines(count: u32, grid: GridSpec) -> Vec<Payline> {
    let GridSpec { reels, rows } = grid;
    if count == 0 || reels == 0 || rows == 0 {
        return Vec::new();
    }

    let mid = rows / 2;
    let mut base: Vec<Vec<u8>> = vec![vec![mid; reels as usize]];
    if rows >= 2 {
        base.push(vec![0; reels as usize]);
        base.push(vec![rows - 1; reels as usize]);
    }
    if rows >= 3 && reels >= 5 {
        base.push((0..reels as usize).map(|c| V_SHAPE[c % 5]).collect());
        base.push((0..reels as usize).map(|c| INVERTED_V[c % 5]).collect());
    }

    let rows_i = rows as i32;
    let mid_i = mid as i32;

    (0..count)
        .map(|i| {
            if let Some(positions) = base.get(i as usize) {
                return Payline {
                    index: i,
                    positions: positions.clone(),
                };
            }
            match i % 4 {
                0 => Payline::from_fn(i, reels, |col| col, rows),
                1 => Payline::from_fn(i, reels, |col| rows_i - 1 - col, rows),
                2 => Payline::from_fn(i, reels, |col| mid_i + if col % 2 == 0 { 1 } else { -1 }, rows),
                _ => Payline::from_fn(i, reels, |col| mid_i + if col % 3 == 0 { 1 } else { -1 }, rows),
            }
        })
        .collect()
}
