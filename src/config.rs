use anyhow::{Context, Result};
use serde::Deserialize;
use std::path::{Path, PathBuf};

#[derive(Debug, Deserialize, Clone)]
pub struct Config {
    pub db: DbConfig,
    #[serde(default)]
    pub matching: MatchingConfig,
    #[serde(default)]
    pub credits: CreditsConfig,
}

#[derive(Debug, Deserialize, Clone)]
pub struct DbConfig {
    pub path: PathBuf,
}

#[derive(Debug, Deserialize, Clone)]
pub struct MatchingConfig {
    /// Minimum Jaccard similarity for a corpus document to count as a
    /// match. Compared against the unrounded score.
    #[serde(default = "default_threshold")]
    pub threshold: f64,
}

impl Default for MatchingConfig {
    fn default() -> Self {
        Self {
            threshold: default_threshold(),
        }
    }
}

fn default_threshold() -> f64 {
    0.3
}

#[derive(Debug, Deserialize, Clone)]
pub struct CreditsConfig {
    /// Balance a freshly opened account starts with.
    #[serde(default = "default_initial_balance")]
    pub initial_balance: i64,
    /// Hours between stale-balance resets.
    #[serde(default = "default_reset_period_hours")]
    pub reset_period_hours: i64,
    /// Balance floor restored by a reset; higher balances are kept.
    #[serde(default = "default_reset_floor")]
    pub reset_floor: i64,
}

impl Default for CreditsConfig {
    fn default() -> Self {
        Self {
            initial_balance: default_initial_balance(),
            reset_period_hours: default_reset_period_hours(),
            reset_floor: default_reset_floor(),
        }
    }
}

fn default_initial_balance() -> i64 {
    20
}
fn default_reset_period_hours() -> i64 {
    24
}
fn default_reset_floor() -> i64 {
    20
}

pub fn load_config(path: &Path) -> Result<Config> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read config file: {}", path.display()))?;

    let config: Config = toml::from_str(&content).with_context(|| "Failed to parse config file")?;

    if !(0.0..=1.0).contains(&config.matching.threshold) {
        anyhow::bail!("matching.threshold must be in [0.0, 1.0]");
    }

    if config.credits.initial_balance < 0 {
        anyhow::bail!("credits.initial_balance must be >= 0");
    }

    if config.credits.reset_period_hours < 1 {
        anyhow::bail!("credits.reset_period_hours must be >= 1");
    }

    if config.credits.reset_floor < 0 {
        anyhow::bail!("credits.reset_floor must be >= 0");
    }

    Ok(config)
}
