//! Math pool generator
//!
//! Usage:
//!   mathpool generate --config game.yaml --tickets 100000 --out pool/
//!   mathpool calibrate --config game.json
//!   mathpool preset --format yaml > game.yaml

use std::path::{Path, PathBuf};

use anyhow::{Context, Result, bail};
use clap::{Parser, Subcommand, ValueEnum};
use rf_math_pool::{
    ArtifactSet, CalibrationSettings, GenerateOptions, PoolConfig, apply_hit_rate, calibrate_rtp,
    generate_pool_with,
};

#[derive(Parser)]
#[command(name = "mathpool", about = "Pre-generated slot outcome pools")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Generate a pool and write its artifacts
    Generate {
        /// Pool config (.json, .yaml or .yml); the standard preset if omitted
        #[arg(short, long)]
        config: Option<PathBuf>,
        /// Number of tickets
        #[arg(short, long, default_value_t = 100_000)]
        tickets: usize,
        /// Pool seed; random if omitted
        #[arg(short, long)]
        seed: Option<u64>,
        /// Output directory
        #[arg(short, long, default_value = "math_pool")]
        out: PathBuf,
        /// Use fewer calibration draws
        #[arg(long)]
        quick: bool,
    },
    /// Run hit-rate targeting and RTP calibration only
    Calibrate {
        #[arg(short, long)]
        config: Option<PathBuf>,
        #[arg(long)]
        quick: bool,
    },
    /// Print the standard preset config
    Preset {
        #[arg(long, default_value = "demo")]
        game_id: String,
        #[arg(long, default_value = "Demo Game")]
        game_name: String,
        #[arg(short, long, value_enum, default_value_t = Format::Json)]
        format: Format,
    },
}

#[derive(Clone, Copy, ValueEnum)]
enum Format {
    Json,
    Yaml,
}

fn main() -> Result<()> {
    env_logger::init();
    let cli = Cli::parse();

    match cli.command {
        Commands::Generate {
            config,
            tickets,
            seed,
            out,
            quick,
        } => generate(config.as_deref(), tickets, seed, &out, quick),
        Commands::Calibrate { config, quick } => calibrate(config.as_deref(), quick),
        Commands::Preset {
            game_id,
            game_name,
            format,
        } => preset(game_id, game_name, format),
    }
}

fn load_config(path: Option<&Path>) -> Result<PoolConfig> {
    let config = match path {
        Some(path) => {
            PoolConfig::load(path).with_context(|| format!("Failed to load config: {}", path.display()))?
        }
        None => {
            log::info!("no config given, using the standard preset");
            PoolConfig::standard("demo", "Demo Game")
        }
    };
    config.validate().context("Invalid pool config")?;
    Ok(config)
}

fn calibration_settings(quick: bool) -> CalibrationSettings {
    if quick {
        CalibrationSettings::quick()
    } else {
        CalibrationSettings::default()
    }
}

fn generate(config: Option<&Path>, tickets: usize, seed: Option<u64>, out: &Path, quick: bool) -> Result<()> {
    if tickets == 0 {
        bail!("--tickets must be > 0");
    }
    let config = load_config(config)?;
    let options = GenerateOptions {
        seed,
        calibration: calibration_settings(quick),
        ..Default::default()
    };

    let pool = generate_pool_with(&config, tickets, &options, |done, total| {
        println!("  {done}/{total} tickets");
    })
    .context("Pool generation failed")?;

    let artifacts = ArtifactSet::from_pool(&pool).context("Failed to encode artifacts")?;
    artifacts
        .write_to_dir(out)
        .with_context(|| format!("Failed to write artifacts to {}", out.display()))?;

    let observed = &pool.manifest.meta.observed;
    println!("Pool {} ({} tickets, seed {})", pool.manifest.pool_id, tickets, pool.seed());
    println!("  RTP:         {:.3}%", observed.rtp_total_percent);
    println!("  Hit rate:    {:.3}%", observed.hit_rate_any_win_percent);
    println!("  Bonus:       {:.3}%", observed.bonus_trigger_rate_percent);
    println!("  Progressive: {:.3}%", observed.progressive_trigger_rate_percent);
    println!("  Max win:     {:.1}x", pool.stats.max_win_ratio);
    for name in artifacts.names() {
        println!("  wrote {}", out.join(name).display());
    }
    Ok(())
}

fn calibrate(config: Option<&Path>, quick: bool) -> Result<()> {
    let config = load_config(config)?;
    let weights = apply_hit_rate(
        &config.base_win_multipliers,
        &config.base_win_weights,
        config.hit_rate_target_percent,
    )
    .context("Hit-rate targeting failed")?;
    let (effective, report) =
        calibrate_rtp(&config, &weights, &calibration_settings(quick)).context("Calibration failed")?;

    let summary = serde_json::json!({
        "report": report,
        "base_win_multipliers": effective.base_win_multipliers,
        "base_win_weights": weights,
        "bonus_win_multipliers": effective.bonus_win_multipliers,
        "progressive_win_multiplier": effective.progressive_win_multiplier,
    });
    println!("{}", serde_json::to_string_pretty(&summary)?);
    Ok(())
}

fn preset(game_id: String, game_name: String, format: Format) -> Result<()> {
    let config = PoolConfig::standard(game_id, game_name);
    let text = match format {
        Format::Json => config.to_json()?,
        Format::Yaml => config.to_yaml()?,
    };
    print!("{text}");
    if !text.ends_with('\n') {
        println!();
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_cli_definition() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_generate_writes_artifacts() {
        let temp_dir = tempfile::TempDir::new().unwrap();
        let dir = temp_dir.path().join("pool");
        generate(None, 50, Some(1), &dir, true).unwrap();
        for name in ["manifest.json", "math_pool.csv", "math_pool.jsonl"] {
            assert!(dir.join(name).exists(), "{name} missing");
        }
    }
}
