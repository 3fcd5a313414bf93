//! Artifact encoding: CSV, JSONL and the manifest

use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};

use serde::Serialize;

use crate::error::{PoolError, PoolResult};
use crate::export::{CSV_FILE, GeneratedPool, JSONL_FILE, MANIFEST_FILE, PoolManifest};
use crate::ticket::TicketRow;

/// Flat CSV row; nested values are embedded as compact JSON
#[derive(Serialize)]
struct CsvRow<'a> {
    ticket_id: u64,
    ticket_num: &'a str,
    game_id: &'a str,
    correlation_id: &'a str,
    jurisdiction: &'a str,
    profile_id: &'a str,
    currency: &'a str,
    #[serde(rename = "entryLevel")]
    entry_level: u32,
    denom: f64,
    #[serde(rename = "betLevel")]
    bet_level: f64,
    bet_amount: f64,
    #[serde(rename = "mainGame")]
    main_game: String,
    base_win: f64,
    bonus_win: f64,
    progressive_win: f64,
    #[serde(rename = "ticketWin")]
    ticket_win: f64,
    #[serde(rename = "totalWin")]
    total_win: f64,
    hit: bool,
    bonus_trigger: bool,
    progressive_trigger: bool,
    metrics: String,
}

impl<'a> CsvRow<'a> {
    fn new(t: &'a TicketRow) -> PoolResult<Self> {
        Ok(Self {
            ticket_id: t.ticket_id,
            ticket_num: &t.ticket_num,
            game_id: &t.game_id,
            correlation_id: &t.correlation_id,
            jurisdiction: &t.jurisdiction,
            profile_id: &t.profile_id,
            currency: &t.currency,
            entry_level: t.entry_level,
            denom: t.denom,
            bet_level: t.bet_level,
            bet_amount: t.bet_amount,
            main_game: serde_json::to_string(&t.main_game)?,
            base_win: t.base_win,
            bonus_win: t.bonus_win,
            progressive_win: t.progressive_win,
            ticket_win: t.ticket_win,
            total_win: t.total_win,
            hit: t.hit,
            bonus_trigger: t.bonus_trigger,
            progressive_trigger: t.progressive_trigger,
            metrics: serde_json::to_string(&t.metrics)?,
        })
    }
}

/// Encode tickets as CSV with a header row
pub fn tickets_to_csv(tickets: &[TicketRow]) -> PoolResult<Vec<u8>> {
    let mut writer = csv::Writer::from_writer(Vec::new());
    for ticket in tickets {
        writer.serialize(CsvRow::new(ticket)?)?;
    }
    writer
        .into_inner()
        .map_err(|e| PoolError::Serialization(e.to_string()))
}

/// Encode tickets as JSON Lines, one compact object per ticket
pub fn tickets_to_jsonl(tickets: &[TicketRow]) -> PoolResult<Vec<u8>> {
    let mut out = Vec::new();
    for ticket in tickets {
        serde_json::to_writer(&mut out, ticket)?;
        out.push(b'\n');
    }
    Ok(out)
}

/// Pretty-printed manifest
pub fn manifest_to_json(manifest: &PoolManifest) -> PoolResult<Vec<u8>> {
    Ok(serde_json::to_vec_pretty(manifest)?)
}

/// Named output artifacts. Names are unique.
#[derive(Debug, Clone, Default)]
pub struct ArtifactSet {
    artifacts: BTreeMap<String, Vec<u8>>,
}

impl ArtifactSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Encode the three artifacts of a generated pool
    pub fn from_pool(pool: &GeneratedPool) -> PoolResult<Self> {
        let mut set = Self::new();
        set.insert(CSV_FILE, tickets_to_csv(&pool.tickets)?)?;
        set.insert(JSONL_FILE, tickets_to_jsonl(&pool.tickets)?)?;
        set.insert(MANIFEST_FILE, manifest_to_json(&pool.manifest)?)?;
        Ok(set)
    }

    /// Add an artifact; a name already present is an error
    pub fn insert(&mut self, name: impl Into<String>, bytes: Vec<u8>) -> PoolResult<()> {
        let name = name.into();
        if self.artifacts.contains_key(&name) {
            return Err(PoolError::DuplicateArtifact(name));
        }
        self.artifacts.insert(name, bytes);
        Ok(())
    }

    pub fn get(&self, name: &str) -> Option<&[u8]> {
        self.artifacts.get(name).map(Vec::as_slice)
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.artifacts.keys().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.artifacts.len()
    }

    pub fn is_empty(&self) -> bool {
        self.artifacts.is_empty()
    }

    /// Write every artifact into `dir`, creating it if needed
    pub fn write_to_dir(&self, dir: &Path) -> PoolResult<Vec<PathBuf>> {
        fs::create_dir_all(dir)?;
        let mut written = Vec::with_capacity(self.artifacts.len());
        for (name, bytes) in &self.artifacts {
            let path = dir.join(name);
            fs::write(&path, bytes)?;
            log::debug!("wrote {} ({} bytes)", path.display(), bytes.len());
            written.push(path);
        }
        log::info!("wrote {} artifacts to {}", written.len(), dir.display());
        Ok(written)
    }
}
