//! Configuration loading from TOML with environment variable resolution.
//!
//! Reads `config.toml` and deserializes into strongly-typed structs.
//! The authorization token is referenced by env-var name in the config and
//! resolved at runtime; when unset, the saved settings file supplies it.

use anyhow::{Context, Result};
use serde::Deserialize;
use std::fs;
use std::time::Duration;
use tokio::time::{Interval, MissedTickBehavior};

use crate::optimizer::SearchConfig;

/// Top-level application configuration.
#[derive(Debug, Deserialize, Clone)]
pub struct AppConfig {
    pub agent: AgentConfig,
    pub api: ApiConfig,
    #[serde(default)]
    pub optimizer: OptimizerConfig,
}

#[derive(Debug, Deserialize, Clone)]
pub struct AgentConfig {
    pub name: String,
    /// Pause between full scan→plan→buy cycles.
    pub cycle_interval_secs: u64,
    /// Pause after each successful purchase.
    #[serde(default = "default_purchase_delay")]
    pub purchase_delay_secs: u64,
    /// Ask on stdin which plan to buy; otherwise take the top-ranked one.
    #[serde(default = "default_true")]
    pub interactive: bool,
    /// Log purchases instead of sending them.
    #[serde(default)]
    pub dry_run: bool,
    #[serde(default = "default_settings_file")]
    pub settings_file: String,
}

#[derive(Debug, Deserialize, Clone)]
pub struct ApiConfig {
    pub base_url: String,
    /// Env var holding the `Authorization` header value.
    #[serde(default)]
    pub authorization_env: Option<String>,
    #[serde(default = "default_user_agent")]
    pub user_agent: String,
    #[serde(default = "default_timeout")]
    pub timeout_secs: u64,
}

#[derive(Debug, Deserialize, Clone)]
pub struct OptimizerConfig {
    /// Bundles earning this much or less per hour are not worth listing.
    #[serde(default = "default_min_bundle_profit")]
    pub min_bundle_profit: f64,
    /// Optional cap on nodes expanded per search. Off unless set.
    #[serde(default)]
    pub max_expansions: Option<u64>,
}

impl Default for OptimizerConfig {
    fn default() -> Self {
        Self {
            min_bundle_profit: default_min_bundle_profit(),
            max_expansions: None,
        }
    }
}

impl OptimizerConfig {
    pub fn search_config(&self) -> SearchConfig {
        SearchConfig {
            max_expansions: self.max_expansions,
        }
    }
}

fn default_purchase_delay() -> u64 {
    8
}

fn default_true() -> bool {
    true
}

fn default_settings_file() -> String {
    crate::storage::DEFAULT_SETTINGS_FILE.to_string()
}

fn default_user_agent() -> String {
    "Mozilla/5.0 (Android 12; Mobile; rv:102.0) Gecko/102.0 Firefox/102.0".to_string()
}

fn default_timeout() -> u64 {
    30
}

fn default_min_bundle_profit() -> f64 {
    10_000.0
}

impl AppConfig {
    /// Load configuration from a TOML file.
    pub fn load(path: &str) -> Result<Self> {
        let contents = fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {path}"))?;
        Self::parse(&contents).with_context(|| format!("Failed to parse config file: {path}"))
    }

    /// Parse configuration from TOML text.
    pub fn parse(contents: &str) -> Result<Self> {
        let config: AppConfig = toml::from_str(contents)?;
        Ok(config)
    }

    /// Resolve an environment variable name to its value.
    /// Useful for loading secrets referenced in the config.
    pub fn resolve_env(env_name: &str) -> Result<String> {
        std::env::var(env_name)
            .with_context(|| format!("Environment variable not set: {env_name}"))
    }

    pub fn cycle_interval(&self) -> Duration {
        Duration::from_secs(self.agent.cycle_interval_secs)
    }

    pub fn purchase_delay(&self) -> Duration {
        Duration::from_secs(self.agent.purchase_delay_secs)
    }

    /// Cycle timer. A cycle can outlast the interval (cooldown waits), so
    /// missed ticks are delayed rather than fired back to back.
    pub fn cycle_timer(&self) -> Interval {
        let mut interval = tokio::time::interval(self.cycle_interval());
        interval.set_missed_tick_behavior(MissedTickBehavior::Delay);
        interval
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLE: &str = r#"
        [agent]
        name = "UPGRADER-001"
        cycle_interval_secs = 14400

        [api]
        base_url = "https://api.hamsterkombatgame.io"
        authorization_env = "UPGRADER_AUTHORIZATION"
    "#;

    #[test]
    fn test_parse_applies_defaults() {
        let cfg = AppConfig::parse(SAMPLE).unwrap();
        assert_eq!(cfg.agent.name, "UPGRADER-001");
        assert_eq!(cfg.cycle_interval(), Duration::from_secs(4 * 60 * 60));
        assert_eq!(cfg.purchase_delay(), Duration::from_secs(8));
        assert!(cfg.agent.interactive);
        assert!(!cfg.agent.dry_run);
        assert_eq!(cfg.agent.settings_file, "upgrader_settings.json");
        assert_eq!(cfg.api.timeout_secs, 30);
        assert_eq!(cfg.optimizer.min_bundle_profit, 10_000.0);
        assert_eq!(cfg.optimizer.search_config(), SearchConfig::default());
    }

    #[test]
    fn test_parse_optimizer_section() {
        let text = format!("{SAMPLE}\n[optimizer]\nmin_bundle_profit = 500.0\nmax_expansions = 2000\n");
        let cfg = AppConfig::parse(&text).unwrap();
        assert_eq!(cfg.optimizer.min_bundle_profit, 500.0);
        assert_eq!(cfg.optimizer.search_config().max_expansions, Some(2000));
    }

    #[test]
    fn test_parse_missing_section_fails() {
        assert!(AppConfig::parse("[agent]\nname = \"x\"\ncycle_interval_secs = 1\n").is_err());
    }

    #[tokio::test]
    async fn test_cycle_timer_delays_missed_ticks() {
        let cfg = AppConfig::parse(SAMPLE).unwrap();
        let timer = cfg.cycle_timer();
        assert_eq!(timer.period(), cfg.cycle_interval());
        assert_eq!(timer.missed_tick_behavior(), MissedTickBehavior::Delay);
    }

    #[test]
    fn test_load_config() {
        // Requires config.toml in the working directory (cargo runs tests
        // from the crate root, where it is shipped).
        let result = AppConfig::load("config.toml");
        if let Ok(cfg) = result {
            assert_eq!(cfg.agent.name, "UPGRADER-001");
            assert!(cfg.agent.cycle_interval_secs > 0);
            assert!(cfg.optimizer.min_bundle_profit >= 0.0);
        }
    }
}
