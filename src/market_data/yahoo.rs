// =============================================================================
// Yahoo Finance chart client — daily OHLCV history over HTTPS
// =============================================================================
//
// Uses the public v8 chart endpoint:
//
//   GET /v8/finance/chart/{symbol}?period1=..&period2=..&interval=1d
//
// Response layout (abridged):
//   chart.result[0].timestamp            — bar open times, UNIX seconds
//   chart.result[0].meta.gmtoffset       — exchange offset from UTC, seconds
//   chart.result[0].indicators.quote[0]  — parallel open/high/low/close/volume
//   chart.error                          — { code, description } on failure
//
// Quote arrays may contain nulls (halted days); such rows are skipped.
// =============================================================================

use std::collections::BTreeMap;
use std::time::Duration;

use anyhow::{Context, Result};
use async_trait::async_trait;
use chrono::{DateTime, NaiveDate};
use reqwest::StatusCode;
use serde::Deserialize;
use tracing::{debug, instrument, warn};

use crate::error::DataSourceError;
use crate::market_data::{is_valid_symbol, BarSource, DateRange};
use crate::types::{Bar, BarSeries};

pub const DEFAULT_BASE_URL: &str = "https://query1.finance.yahoo.com";

/// Yahoo rejects requests without a browser-like agent.
const USER_AGENT: &str = "Mozilla/5.0 (X11; Linux x86_64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/124.0 Safari/537.36";

/// Daily-bar client for the Yahoo Finance chart API.
#[derive(Clone)]
pub struct YahooClient {
    base_url: String,
    client: reqwest::Client,
}

impl YahooClient {
    /// Create a client against `base_url` with a per-request `timeout`.
    pub fn new(base_url: impl Into<String>, timeout: Duration) -> Result<Self> {
        let base_url = base_url.into().trim_end_matches('/').to_string();
        let client = reqwest::Client::builder()
            .user_agent(USER_AGENT)
            .timeout(timeout)
            .build()
            .context("failed to build reqwest client for Yahoo")?;

        debug!(base_url = %base_url, "YahooClient initialised");
        Ok(Self { base_url, client })
    }

    /// Yahoo spells share classes with a dash (`BRK.B` -> `BRK-B`).
    fn provider_symbol(symbol: &str) -> String {
        symbol.trim().to_uppercase().replace('.', "-")
    }

    #[instrument(skip(self), name = "yahoo::fetch_chart")]
    async fn fetch_chart(&self, symbol: &str, range: DateRange) -> Result<BarSeries, DataSourceError> {
        if !is_valid_symbol(symbol) {
            return Err(DataSourceError::InvalidSymbol(symbol.to_string()));
        }

        let provider_symbol = Self::provider_symbol(symbol);
        let url = format!("{}/v8/finance/chart/{}", self.base_url, provider_symbol);
        let period1 = range.start.timestamp().to_string();
        let period2 = range.end.timestamp().to_string();

        let resp = self
            .client
            .get(&url)
            .query(&[
                ("period1", period1.as_str()),
                ("period2", period2.as_str()),
                ("interval", "1d"),
                ("events", "history"),
            ])
            .send()
            .await
            .map_err(|e| classify_request_error(symbol, e))?;

        let status = resp.status();
        let body = resp
            .text()
            .await
            .map_err(|e| classify_request_error(symbol, e))?;

        let bars = parse_chart_response(symbol, status, &body)?;
        debug!(symbol, count = bars.len(), "daily bars fetched");

        Ok(BarSeries::new(symbol.to_uppercase(), bars)?)
    }
}

#[async_trait]
impl BarSource for YahooClient {
    async fn fetch_daily_bars(&self, symbol: &str, range: DateRange) -> Result<BarSeries, DataSourceError> {
        self.fetch_chart(symbol, range).await
    }
}

impl std::fmt::Debug for YahooClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("YahooClient")
            .field("base_url", &self.base_url)
            .finish()
    }
}

fn classify_request_error(symbol: &str, err: reqwest::Error) -> DataSourceError {
    if err.is_timeout() {
        warn!(symbol, "Yahoo request timed out");
        DataSourceError::FetchTimeout(symbol.to_string())
    } else {
        DataSourceError::Request(err)
    }
}

// =============================================================================
// Response parsing
// =============================================================================

#[derive(Debug, Deserialize)]
struct ChartEnvelope {
    chart: ChartBody,
}

#[derive(Debug, Deserialize)]
struct ChartBody {
    #[serde(default)]
    result: Option<Vec<ChartResult>>,
    #[serde(default)]
    error: Option<ChartError>,
}

#[derive(Debug, Deserialize)]
struct ChartError {
    code: String,
    #[serde(default)]
    description: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ChartResult {
    #[serde(default)]
    meta: ChartMeta,
    #[serde(default)]
    timestamp: Vec<i64>,
    indicators: ChartIndicators,
}

#[derive(Debug, Default, Deserialize)]
struct ChartMeta {
    #[serde(default)]
    gmtoffset: i64,
}

#[derive(Debug, Deserialize)]
struct ChartIndicators {
    #[serde(default)]
    quote: Vec<Quote>,
}

#[derive(Debug, Default, Deserialize)]
struct Quote {
    #[serde(default)]
    open: Vec<Option<f64>>,
    #[serde(default)]
    high: Vec<Option<f64>>,
    #[serde(default)]
    low: Vec<Option<f64>>,
    #[serde(default)]
    close: Vec<Option<f64>>,
    #[serde(default)]
    volume: Vec<Option<f64>>,
}

/// Turn a raw chart response into ascending, date-unique bars.
///
/// Rows with a missing OHLC value are dropped. When two rows share a
/// calendar date (Yahoo appends a live row for the current session) the
/// later row wins.
fn parse_chart_response(symbol: &str, status: StatusCode, body: &str) -> Result<Vec<Bar>, DataSourceError> {
    let envelope: Option<ChartEnvelope> = serde_json::from_str(body).ok();

    if let Some(err) = envelope.as_ref().and_then(|e| e.chart.error.as_ref()) {
        if status == StatusCode::NOT_FOUND || err.code.eq_ignore_ascii_case("Not Found") {
            return Err(DataSourceError::SymbolNotFound(symbol.to_string()));
        }
        return Err(DataSourceError::Http {
            status: status.as_u16(),
            message: err.description.clone().unwrap_or_else(|| err.code.clone()),
        });
    }

    if status == StatusCode::NOT_FOUND {
        return Err(DataSourceError::SymbolNotFound(symbol.to_string()));
    }
    if !status.is_success() {
        return Err(DataSourceError::Http {
            status: status.as_u16(),
            message: body.chars().take(200).collect(),
        });
    }

    let envelope = envelope.ok_or_else(|| DataSourceError::Malformed("body is not a chart envelope".into()))?;
    let result = envelope
        .chart
        .result
        .and_then(|mut r| if r.is_empty() { None } else { Some(r.swap_remove(0)) })
        .ok_or_else(|| DataSourceError::NoData(symbol.to_string()))?;

    let quote = result.indicators.quote.into_iter().next().unwrap_or_default();
    let offset = result.meta.gmtoffset;

    let mut by_date: BTreeMap<NaiveDate, Bar> = BTreeMap::new();
    let mut skipped = 0usize;

    for (i, &ts) in result.timestamp.iter().enumerate() {
        let field = |v: &[Option<f64>]| v.get(i).copied().flatten();
        let (Some(open), Some(high), Some(low), Some(close)) =
            (field(&quote.open), field(&quote.high), field(&quote.low), field(&quote.close))
        else {
            skipped += 1;
            continue;
        };

        let date = DateTime::from_timestamp(ts + offset, 0)
            .ok_or_else(|| DataSourceError::Malformed(format!("timestamp {ts} out of range")))?
            .date_naive();
        let volume = field(&quote.volume).unwrap_or(0.0).max(0.0) as u64;

        by_date.insert(
            date,
            Bar {
                date,
                open,
                high,
                low,
                close,
                volume,
            },
        );
    }

    if skipped > 0 {
        debug!(symbol, skipped, "dropped rows with missing prices");
    }
    if by_date.is_empty() {
        return Err(DataSourceError::NoData(symbol.to_string()));
    }

    Ok(by_date.into_values().collect())
}
