// =============================================================================
// Central Application State
// =============================================================================
//
// Shared by every request handler via `Arc<AppState>`.  Holds configuration
// and the two outbound adapters; the indicator engine itself is stateless and
// needs no entry here.
// =============================================================================

use std::sync::Arc;

use anyhow::Result;
use chrono::Utc;

use crate::market_data::{BarSource, DateRange, SymbolDirectory, YahooClient};
use crate::runtime_config::AppConfig;

pub struct AppState {
    pub config: AppConfig,
    pub bar_source: Arc<dyn BarSource>,
    pub symbols: SymbolDirectory,
    /// Instant when the server was started. Used for uptime reporting.
    pub start_time: std::time::Instant,
}

impl AppState {
    /// Wire the production adapters from `config`.
    pub fn new(config: AppConfig) -> Result<Self> {
        let yahoo = YahooClient::new(config.yahoo_base_url.clone(), config.request_timeout())?;
        let symbols = SymbolDirectory::new(
            config.symbol_list_url.clone(),
            config.symbol_cache_ttl(),
            config.fallback_symbols.clone(),
            config.request_timeout(),
        )?;
        Ok(Self::with_adapters(config, Arc::new(yahoo), symbols))
    }

    pub fn with_adapters(config: AppConfig, bar_source: Arc<dyn BarSource>, symbols: SymbolDirectory) -> Self {
        Self {
            config,
            bar_source,
            symbols,
            start_time: std::time::Instant::now(),
        }
    }

    /// The trailing history window for a request made now.
    pub fn request_range(&self) -> DateRange {
        DateRange::trailing(Utc::now(), self.config.lookback_days)
    }

    pub fn uptime_secs(&self) -> u64 {
        self.start_time.elapsed().as_secs()
    }
}

#[cfg(test)]
pub(crate) mod test_support {
    use std::time::Duration;

    use super::*;
    use crate::analysis::test_support::FakeSource;

    /// State backed by a [`FakeSource`] and an unreachable ticker table, so
    /// the directory always serves `fallback`.
    pub fn state_with(source: FakeSource, fallback: &[&str]) -> Arc<AppState> {
        let config = AppConfig {
            symbol_list_url: "http://127.0.0.1:9/constituents.csv".to_string(),
            fallback_symbols: fallback.iter().map(|s| s.to_string()).collect(),
            ..AppConfig::default()
        };
        let symbols = SymbolDirectory::new(
            config.symbol_list_url.clone(),
            Duration::from_secs(60),
            config.fallback_symbols.clone(),
            Duration::from_millis(500),
        )
        .unwrap();
        Arc::new(AppState::with_adapters(config, Arc::new(source), symbols))
    }
}
