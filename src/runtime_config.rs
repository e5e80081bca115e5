// =============================================================================
// Runtime Configuration — server, data-source and ticker-directory settings
// =============================================================================
//
// Loaded once at startup from a JSON file.  All fields carry
// `#[serde(default)]` so that a partial (or empty) file still deserialises;
// a missing file falls back to `AppConfig::default()` in `main`.
//
// Indicator windows are not configurable: the dashboard always uses the
// engine defaults (MA 20, RSI 14, volatility 20, annualisation 252).
// =============================================================================

use std::path::Path;
use std::time::Duration;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use crate::market_data::symbols::DEFAULT_SYMBOL_LIST_URL;
use crate::market_data::yahoo::DEFAULT_BASE_URL;
use crate::market_data::DEFAULT_LOOKBACK_DAYS;

/// Default config file consulted when `ANALYZER_CONFIG` is unset.
pub const DEFAULT_CONFIG_PATH: &str = "analyzer_config.json";

// =============================================================================
// Default-value helpers (required by serde `default = "..."` attribute)
// =============================================================================

fn default_bind_addr() -> String {
    "0.0.0.0:5000".to_string()
}

fn default_lookback_days() -> i64 {
    DEFAULT_LOOKBACK_DAYS
}

fn default_yahoo_base_url() -> String {
    DEFAULT_BASE_URL.to_string()
}

fn default_request_timeout_secs() -> u64 {
    10
}

fn default_symbol_list_url() -> String {
    DEFAULT_SYMBOL_LIST_URL.to_string()
}

fn default_symbol_cache_ttl_secs() -> u64 {
    24 * 60 * 60
}

fn default_fallback_symbols() -> Vec<String> {
    ["AAPL", "AMZN", "GOOGL", "META", "MSFT", "NVDA", "TSLA"]
        .into_iter()
        .map(String::from)
        .collect()
}

// =============================================================================
// AppConfig
// =============================================================================

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppConfig {
    /// Address the HTTP server listens on.
    #[serde(default = "default_bind_addr")]
    pub bind_addr: String,

    /// Calendar days of history requested per analysis.
    #[serde(default = "default_lookback_days")]
    pub lookback_days: i64,

    /// Base URL of the Yahoo Finance chart API.
    #[serde(default = "default_yahoo_base_url")]
    pub yahoo_base_url: String,

    /// Timeout applied to every outbound HTTP request.
    #[serde(default = "default_request_timeout_secs")]
    pub request_timeout_secs: u64,

    /// CSV table of valid tickers (needs a `Symbol` column).
    #[serde(default = "default_symbol_list_url")]
    pub symbol_list_url: String,

    /// How long a fetched ticker list is reused.
    #[serde(default = "default_symbol_cache_ttl_secs")]
    pub symbol_cache_ttl_secs: u64,

    /// Served when the ticker table cannot be fetched.
    #[serde(default = "default_fallback_symbols")]
    pub fallback_symbols: Vec<String>,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            bind_addr: default_bind_addr(),
            lookback_days: default_lookback_days(),
            yahoo_base_url: default_yahoo_base_url(),
            request_timeout_secs: default_request_timeout_secs(),
            symbol_list_url: default_symbol_list_url(),
            symbol_cache_ttl_secs: default_symbol_cache_ttl_secs(),
            fallback_symbols: default_fallback_symbols(),
        }
    }
}

impl AppConfig {
    /// Load configuration from a JSON file at `path`.
    ///
    /// If the file does not exist, returns an error so the caller can fall
    /// back to defaults with a warning.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();

        let content = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read config from {}", path.display()))?;

        let config: Self = serde_json::from_str(&content)
            .with_context(|| format!("failed to parse config from {}", path.display()))?;

        info!(path = %path.display(), bind_addr = %config.bind_addr, "config loaded");
        Ok(config)
    }

    /// Apply `ANALYZER_*` overrides from `lookup` (normally `std::env::var`).
    pub fn apply_env<F>(&mut self, lookup: F)
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(addr) = lookup("ANALYZER_BIND_ADDR").filter(|s| !s.trim().is_empty()) {
            self.bind_addr = addr.trim().to_string();
        }
        if let Some(raw) = lookup("ANALYZER_LOOKBACK_DAYS") {
            match raw.trim().parse::<i64>() {
                Ok(days) if days > 0 => self.lookback_days = days,
                _ => warn!(value = %raw, "ignoring invalid ANALYZER_LOOKBACK_DAYS"),
            }
        }
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs.max(1))
    }

    pub fn symbol_cache_ttl(&self) -> Duration {
        Duration::from_secs(self.symbol_cache_ttl_secs)
    }
}
