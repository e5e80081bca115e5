// =============================================================================
// Market data adapters — daily bar sources and the ticker directory
// =============================================================================

pub mod symbols;
pub mod yahoo;

use async_trait::async_trait;
use chrono::{DateTime, Duration, Utc};
use serde::Serialize;

use crate::error::DataSourceError;
use crate::types::BarSeries;

pub use symbols::{is_valid_symbol, SymbolDirectory};
pub use yahoo::YahooClient;

/// Default trailing window requested from the data source (calendar days).
pub const DEFAULT_LOOKBACK_DAYS: i64 = 365;

/// Inclusive-start / exclusive-end time range for a history request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct DateRange {
    pub start: DateTime<Utc>,
    pub end: DateTime<Utc>,
}

impl DateRange {
    /// The `days` calendar days preceding `now`.
    pub fn trailing(now: DateTime<Utc>, days: i64) -> Self {
        Self {
            start: now - Duration::days(days),
            end: now,
        }
    }
}

/// A remote source of daily OHLCV history.
///
/// Implementations must return bars ascending by date with no duplicates;
/// `BarSeries::new` enforces that before the series leaves the adapter.
#[async_trait]
pub trait BarSource: Send + Sync {
    async fn fetch_daily_bars(&self, symbol: &str, range: DateRange) -> Result<BarSeries, DataSourceError>;
}
