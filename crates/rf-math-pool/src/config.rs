//! Math pool job configuration

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::{PoolError, PoolResult};

/// Grid specification (reels × rows) of the presentation window
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct GridSpec {
    /// Number of reels (columns)
    pub reels: u8,
    /// Number of visible rows per reel
    pub rows: u8,
}

impl GridSpec {
    /// Standard 5×3
    pub fn standard_5x3() -> Self {
        Self { reels: 5, rows: 3 }
    }

    /// Standard 5×4
    pub fn standard_5x4() -> Self {
        Self { reels: 5, rows: 4 }
    }

    /// Total grid positions
    pub fn total_positions(&self) -> usize {
        self.reels as usize * self.rows as usize
    }
}

impl Default for GridSpec {
    fn default() -> Self {
        Self::standard_5x3()
    }
}

/// How a consumer is expected to pick tickets out of the pool.
///
/// Recorded in the manifest only. Generation always samples outcomes
/// weighted with replacement, whatever is configured here.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SelectionMethod {
    Sequential,
    RandomUniform,
    RandomWeighted,
    RngStream,
}

impl SelectionMethod {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Sequential => "sequential",
            Self::RandomUniform => "random_uniform",
            Self::RandomWeighted => "random_weighted",
            Self::RngStream => "rng_stream",
        }
    }
}

/// Whether a consumer may hand out the same ticket twice.
///
/// Recorded in the manifest only, see [`SelectionMethod`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ReplacementPolicy {
    WithReplacement,
    WithoutReplacement,
}

impl ReplacementPolicy {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::WithReplacement => "with_replacement",
            Self::WithoutReplacement => "without_replacement",
        }
    }
}

/// Complete description of one calibration job.
///
/// Built once from user input and never mutated; every transformation
/// (hit-rate adjustment, RTP scaling) produces a new value.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PoolConfig {
    pub game_id: String,
    pub game_name: String,
    pub jurisdiction: String,
    pub profile_id: String,
    pub currency: String,

    pub selection_method: SelectionMethod,
    pub replacement_policy: ReplacementPolicy,

    /// Currency value of one credit
    pub denom: f64,
    pub entry_levels: Vec<u32>,
    /// Total bet per ticket, in currency
    pub bet_levels: Vec<f64>,
    pub coins_per_line: u32,
    pub payline_count: u32,

    pub rtp_target_percent: f64,
    /// 0 disables hit-rate targeting
    pub hit_rate_target_percent: f64,
    /// Recorded, not enforced
    pub volatility_target: f64,
    /// Maximum payable multiple of bet per ticket
    pub max_win_multiplier_cap: u32,

    pub base_win_multipliers: Vec<f64>,
    pub base_win_weights: Vec<f64>,

    pub bonus_trigger_percent: f64,
    pub bonus_win_multipliers: Vec<f64>,
    pub bonus_win_weights: Vec<f64>,

    pub progressive_trigger_percent: f64,
    pub progressive_win_multiplier: f64,

    /// Illustrative reel window dimensions
    #[serde(default)]
    pub grid: GridSpec,
}

impl PoolConfig {
    /// Wizard defaults: 96% RTP, 35% hit rate, 5000x cap
    pub fn standard(game_id: impl Into<String>, game_name: impl Into<String>) -> Self {
        Self {
            game_id: game_id.into(),
            game_name: game_name.into(),
            jurisdiction: "ON".into(),
            profile_id: "ON-DEFAULT".into(),
            currency: "CAD".into(),
            selection_method: SelectionMethod::RandomUniform,
            replacement_policy: ReplacementPolicy::WithReplacement,
            denom: 0.01,
            entry_levels: vec![1, 2, 3, 5, 10],
            bet_levels: vec![1.0, 2.0, 5.0, 10.0],
            coins_per_line: 1,
            payline_count: 25,
            rtp_target_percent: 96.0,
            hit_rate_target_percent: 35.0,
            volatility_target: 3.0,
            max_win_multiplier_cap: 5000,
            base_win_multipliers: vec![0.0, 1.0, 2.0, 5.0, 10.0, 20.0, 50.0],
            base_win_weights: vec![55.0, 25.0, 10.0, 5.0, 3.0, 1.0, 1.0],
            bonus_trigger_percent: 5.0,
            bonus_win_multipliers: vec![2.0, 5.0, 10.0, 25.0],
            bonus_win_weights: vec![70.0, 20.0, 8.0, 2.0],
            progressive_trigger_percent: 0.1,
            progressive_win_multiplier: 5000.0,
            grid: GridSpec::default(),
        }
    }

    // ═══════════════════════════════════════════════════════════════════════════
    // LOADING
    // ═══════════════════════════════════════════════════════════════════════════

    /// Parse a JSON document
    pub fn from_json_str(json: &str) -> PoolResult<Self> {
        serde_json::from_str(json).map_err(|e| PoolError::Parse(e.to_string()))
    }

    /// Parse a YAML document
    pub fn from_yaml_str(yaml: &str) -> PoolResult<Self> {
        serde_yml::from_str(yaml).map_err(|e| PoolError::Parse(e.to_string()))
    }

    /// Load from a `.json`, `.yaml` or `.yml` file
    pub fn load(path: &Path) -> PoolResult<Self> {
        let text = std::fs::read_to_string(path)?;
        match path.extension().and_then(|e| e.to_str()) {
            Some("json") => Self::from_json_str(&text),
            Some("yaml") | Some("yml") => Self::from_yaml_str(&text),
            other => Err(PoolError::Parse(format!(
                "unsupported config extension {:?} for {}",
                other,
                path.display()
            ))),
        }
    }

    /// Pretty JSON
    pub fn to_json(&self) -> PoolResult<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    /// YAML
    pub fn to_yaml(&self) -> PoolResult<String> {
        serde_yml::to_string(self).map_err(|e| PoolError::Serialization(e.to_string()))
    }

    // ═══════════════════════════════════════════════════════════════════════════
    // VALIDATION
    // ═══════════════════════════════════════════════════════════════════════════

    /// Check every structural invariant of the job.
    ///
    /// Hit-rate feasibility is checked separately by
    /// [`apply_hit_rate`](crate::weights::apply_hit_rate).
    pub fn validate(&self) -> PoolResult<()> {
        if self.game_id.trim().is_empty() {
            return Err(invalid("game_id must not be empty"));
        }

        if self.base_win_multipliers.len() != self.base_win_weights.len() {
            return Err(invalid(format!(
                "base_win_multipliers and base_win_weights must have same length ({} != {})",
                self.base_win_multipliers.len(),
                self.base_win_weights.len()
            )));
        }
        if self.bonus_win_multipliers.len() != self.bonus_win_weights.len() {
            return Err(invalid(format!(
                "bonus_win_multipliers and bonus_win_weights must have same length ({} != {})",
                self.bonus_win_multipliers.len(),
                self.bonus_win_weights.len()
            )));
        }
        if self.base_win_multipliers.is_empty() {
            return Err(invalid("base_win_multipliers must not be empty"));
        }

        check_table("base", &self.base_win_multipliers, &self.base_win_weights)?;
        check_table("bonus", &self.bonus_win_multipliers, &self.bonus_win_weights)?;

        if self.base_win_weights.iter().sum::<f64>() <= 0.0 {
            return Err(invalid("base_win_weights must sum to > 0"));
        }
        if self.bonus_trigger_percent > 0.0 && self.bonus_win_weights.iter().sum::<f64>() <= 0.0 {
            return Err(invalid(
                "bonus_trigger_percent > 0 requires bonus weights summing to > 0",
            ));
        }

        if self.entry_levels.is_empty() {
            return Err(invalid("entry_levels must not be empty"));
        }
        if self.bet_levels.is_empty() {
            return Err(invalid("bet_levels must not be empty"));
        }
        if self.bet_levels.iter().any(|b| !b.is_finite() || *b <= 0.0) {
            return Err(invalid("bet_levels must be positive"));
        }
        if !self.denom.is_finite() || self.denom <= 0.0 {
            return Err(invalid("denom must be positive"));
        }
        if self.max_win_multiplier_cap == 0 {
            return Err(invalid("max_win_multiplier_cap must be >= 1"));
        }

        for (name, value) in [
            ("rtp_target_percent", self.rtp_target_percent),
            ("hit_rate_target_percent", self.hit_rate_target_percent),
            ("bonus_trigger_percent", self.bonus_trigger_percent),
            ("progressive_trigger_percent", self.progressive_trigger_percent),
        ] {
            if !(0.0..=100.0).contains(&value) {
                return Err(invalid(format!("{name} must be within [0, 100] (got {value})")));
            }
        }

        if !self.progressive_win_multiplier.is_finite() || self.progressive_win_multiplier < 0.0 {
            return Err(invalid("progressive_win_multiplier must be >= 0"));
        }
        if self.grid.reels == 0 || self.grid.rows == 0 {
            return Err(invalid("grid must have at least one reel and one row"));
        }

        Ok(())
    }

    /// Is hit-rate targeting requested?
    pub fn targets_hit_rate(&self) -> bool {
        self.hit_rate_target_percent > 0.0
    }

    /// Copy with every multiplier table scaled by `scale`. Zero stays zero.
    pub fn scaled(&self, scale: f64) -> Self {
        let scale_one = |m: f64| if m == 0.0 { 0.0 } else { m * scale };
        Self {
            base_win_multipliers: self.base_win_multipliers.iter().map(|&m| scale_one(m)).collect(),
            bonus_win_multipliers: self.bonus_win_multipliers.iter().map(|&m| scale_one(m)).collect(),
            progressive_win_multiplier: scale_one(self.progressive_win_multiplier),
            ..self.clone()
        }
    }

    // ═══════════════════════════════════════════════════════════════════════════
    // BUILDERS
    // ═══════════════════════════════════════════════════════════════════════════

    pub fn with_rtp_target(mut self, percent: f64) -> Self {
        self.rtp_target_percent = percent;
        self
    }

    pub fn with_hit_rate_target(mut self, percent: f64) -> Self {
        self.hit_rate_target_percent = percent;
        self
    }

    pub fn with_max_win_cap(mut self, cap: u32) -> Self {
        self.max_win_multiplier_cap = cap;
        self
    }

    pub fn with_base_table(mut self, multipliers: Vec<f64>, weights: Vec<f64>) -> Self {
        self.base_win_multipliers = multipliers;
        self.base_win_weights = weights;
        self
    }

    pub fn with_bonus(mut self, trigger_percent: f64, multipliers: Vec<f64>, weights: Vec<f64>) -> Self {
        self.bonus_trigger_percent = trigger_percent;
        self.bonus_win_multipliers = multipliers;
        self.bonus_win_weights = weights;
        self
    }

    pub fn with_progressive(mut self, trigger_percent: f64, multiplier: f64) -> Self {
        self.progressive_trigger_percent = trigger_percent;
        self.progressive_win_multiplier = multiplier;
        self
    }

    pub fn with_bet_levels(mut self, bet_levels: Vec<f64>) -> Self {
        self.bet_levels = bet_levels;
        self
    }

    pub fn with_paylines(mut self, payline_count: u32) -> Self {
        self.payline_count = payline_count;
        self
    }

    pub fn with_grid(mut self, grid: GridSpec) -> Self {
        self.grid = grid;
        self
    }

    pub fn with_selection(mut self, method: SelectionMethod, policy: ReplacementPolicy) -> Self {
        self.selection_method = method;
        self.replacement_policy = policy;
        self
    }
}

fn invalid(msg: impl Into<String>) -> PoolError {
    PoolError::InvalidConfig(msg.into())
}

fn check_table(name: &str, multipliers: &[f64], weights: &[f64]) -> PoolResult<()> {
    if multipliers.iter().any(|m| !m.is_finite() || *m < 0.0) {
        return Err(invalid(format!("{name} multipliers must be finite and >= 0")));
    }
    if weights.iter().any(|w| !w.is_finite() || *w < 0.0) {
        return Err(invalid(format!("{name} weights must be finite and >= 0")));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_standard_config_is_valid() {
        let config = PoolConfig::standard("9462", "NewGame");
        assert!(config.validate().is_ok());
        assert_eq!(config.grid.total_positions(), 15);
    }

    #[test]
    fn test_mismatched_table_lengths() {
        let config = PoolConfig::standard("g", "G").with_base_table(vec![0.0, 1.0], vec![1.0]);
        let err = config.validate().unwrap_err();
        assert!(matches!(err, PoolError::InvalidConfig(_)));
        assert!(err.to_string().contains("same length"));

        let config = PoolConfig::standard("g", "G").with_bonus(5.0, vec![2.0], vec![]);
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_empty_game_id_rejected() {
        let config = PoolConfig::standard("  ", "G");
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_negative_values_rejected() {
        let config = PoolConfig::standard("g", "G").with_base_table(vec![0.0, -1.0], vec![1.0, 1.0]);
        assert!(config.validate().is_err());

        let config = PoolConfig::standard("g", "G").with_base_table(vec![0.0, 1.0], vec![1.0, -1.0]);
        assert!(config.validate().is_err());

        let config = PoolConfig::standard("g", "G").with_bet_levels(vec![]);
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_bonus_requires_weights_when_triggered() {
        let config = PoolConfig::standard("g", "G").with_bonus(5.0, vec![], vec![]);
        assert!(config.validate().is_err());

        let config = PoolConfig::standard("g", "G").with_bonus(0.0, vec![], vec![]);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_scaled_keeps_zero() {
        let config = PoolConfig::standard("g", "G").scaled(2.5);
        assert_eq!(config.base_win_multipliers[0], 0.0);
        assert_eq!(config.base_win_multipliers[1], 2.5);
        assert_eq!(config.bonus_win_multipliers[0], 5.0);
        assert_eq!(config.progressive_win_multiplier, 12_500.0);
        // Weights are not touched
        assert_eq!(config.base_win_weights, PoolConfig::standard("g", "G").base_win_weights);
    }

    #[test]
    fn test_json_and_yaml_roundtrip() {
        let config = PoolConfig::standard("g", "G")
            .with_selection(SelectionMethod::Sequential, ReplacementPolicy::WithoutReplacement);

        let json = config.to_json().unwrap();
        assert!(json.contains("\"sequential\""));
        assert_eq!(PoolConfig::from_json_str(&json).unwrap(), config);

        let yaml = config.to_yaml().unwrap();
        assert_eq!(PoolConfig::from_yaml_str(&yaml).unwrap(), config);
    }

    #[test]
    fn test_load_dispatches_on_extension() {
        let temp_dir = tempfile::TempDir::new().unwrap();
        let config = PoolConfig::standard("g", "G").with_paylines(10);

        let json_path = temp_dir.path().join("game.json");
        std::fs::write(&json_path, config.to_json().unwrap()).unwrap();
        assert_eq!(PoolConfig::load(&json_path).unwrap(), config);

        let yaml_path = temp_dir.path().join("game.yml");
        std::fs::write(&yaml_path, config.to_yaml().unwrap()).unwrap();
        assert_eq!(PoolConfig::load(&yaml_path).unwrap(), config);

        let toml_path = temp_dir.path().join("game.toml");
        std::fs::write(&toml_path, "x = 1").unwrap();
        assert!(matches!(PoolConfig::load(&toml_path), Err(PoolError::Parse(_))));

        let missing = temp_dir.path().join("missing.json");
        assert!(matches!(PoolConfig::load(&missing), Err(PoolError::Io(_))));
    }

    #[test]
    fn test_grid_defaults_when_missing() {
        let mut value = serde_json::to_value(PoolConfig::standard("g", "G")).unwrap();
        value.as_object_mut().unwrap().remove("grid");
        let config: PoolConfig = serde_json::from_value(value).unwrap();
        assert_eq!(config.grid, GridSpec::standard_5x3());
    }

    #[test]
    fn test_unknown_selection_method_fails_to_parse() {
        let json = PoolConfig::standard("g", "G")
            .to_json()
            .unwrap()
            .replace("random_uniform", "shuffled");
        assert!(matches!(PoolConfig::from_json_str(&json), Err(PoolError::Parse(_))));
    }
}
