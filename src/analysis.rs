// =============================================================================
// Analysis pipeline — fetch history, derive indicators, assemble a report
// =============================================================================
//
// The only place where the data source and the indicator engine meet.  The
// bar series is dropped as soon as the report has been built.
// =============================================================================

use chrono::{DateTime, NaiveDate, Utc};
use serde::Serialize;
use thiserror::Error;
use tracing::{info, info_span, warn, Instrument};
use uuid::Uuid;

use crate::error::{DataSourceError, EngineError};
use crate::indicators::{compute_indicators, IndicatorSet, RsiZone};
use crate::market_data::{is_valid_symbol, BarSource, DateRange};
use crate::types::{Bar, BarSeries};

#[derive(Debug, Error)]
pub enum AnalysisError {
    #[error(transparent)]
    DataSource(#[from] DataSourceError),

    #[error("indicator computation failed: {0}")]
    Engine(#[from] EngineError),
}

impl AnalysisError {
    pub fn kind(&self) -> &'static str {
        match self {
            Self::DataSource(e) => e.kind(),
            Self::Engine(_) => "invalid_input",
        }
    }
}

/// Latest readings, for the page header and API consumers.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AnalysisSummary {
    pub last_date: Option<NaiveDate>,
    pub last_close: Option<f64>,
    pub moving_average: Option<f64>,
    pub rsi: Option<f64>,
    pub rsi_zone: Option<RsiZone>,
    pub volatility: Option<f64>,
}

/// Everything the presentation layer needs for one symbol.
#[derive(Debug, Clone, Serialize)]
pub struct AnalysisReport {
    pub id: Uuid,
    pub symbol: String,
    pub generated_at: DateTime<Utc>,
    pub range: DateRange,
    pub bar_count: usize,
    pub bars: Vec<Bar>,
    pub indicators: IndicatorSet,
    pub summary: AnalysisSummary,
}

impl AnalysisReport {
    /// Derive indicators from `series` and summarise them.
    pub fn build(series: BarSeries, range: DateRange) -> Result<Self, EngineError> {
        let indicators = compute_indicators(&series)?;
        debug_assert_eq!(indicators.rsi.len(), series.len());
        let last = series.last();
        let rsi = indicators.rsi.last_defined();

        let summary = AnalysisSummary {
            last_date: last.map(|b| b.date),
            last_close: last.map(|b| b.close),
            moving_average: indicators.moving_average.last_defined(),
            rsi,
            rsi_zone: rsi.map(RsiZone::classify),
            volatility: indicators.volatility.last_defined(),
        };

        Ok(Self {
            id: Uuid::new_v4(),
            symbol: series.symbol().to_string(),
            generated_at: Utc::now(),
            range,
            bar_count: series.len(),
            bars: series.bars().to_vec(),
            indicators,
            summary,
        })
    }

    pub fn dates(&self) -> Vec<NaiveDate> {
        self.bars.iter().map(|b| b.date).collect()
    }

    pub fn closes(&self) -> Vec<Option<f64>> {
        self.bars.iter().map(|b| Some(b.close).filter(|c| c.is_finite())).collect()
    }

    pub fn volumes(&self) -> Vec<Option<f64>> {
        self.bars.iter().map(|b| Some(b.volume as f64)).collect()
    }
}

/// Run the full pipeline for `symbol` over `range`.
pub async fn analyze(source: &dyn BarSource, symbol: &str, range: DateRange) -> Result<AnalysisReport, AnalysisError> {
    let symbol = symbol.trim().to_uppercase();
    if !is_valid_symbol(&symbol) {
        return Err(DataSourceError::InvalidSymbol(symbol).into());
    }

    let request_id = Uuid::new_v4();
    let span = info_span!("analysis", %request_id, symbol = %symbol);

    async move {
        let series = source.fetch_daily_bars(&symbol, range).await.map_err(|e| {
            warn!(error = %e, kind = e.kind(), "bar fetch failed");
            e
        })?;

        if series.symbol() != symbol {
            warn!(returned = %series.symbol(), "data source relabelled symbol");
        }

        if series.is_empty() {
            warn!("data source returned an empty series");
        }
        let report = AnalysisReport::build(series, range)?;
        info!(
            bars = report.bar_count,
            last_close = ?report.summary.last_close,
            rsi = ?report.summary.rsi,
            defined_rsi = report.indicators.rsi.defined_count(),
            "analysis complete"
        );
        Ok::<_, AnalysisError>(report)
    }
    .instrument(span)
    .await
}

#[cfg(test)]
pub(crate) mod test_support {
    use async_trait::async_trait;
    use chrono::Duration;

    use super::*;

    /// In-memory bar source keyed on a single symbol.
    pub struct FakeSource {
        pub symbol: String,
        pub closes: Vec<f64>,
    }

    impl FakeSource {
        pub fn new(symbol: &str, closes: Vec<f64>) -> Self {
            Self {
                symbol: symbol.to_string(),
                closes,
            }
        }
    }

    #[async_trait]
    impl BarSource for FakeSource {
        async fn fetch_daily_bars(&self, symbol: &str, _range: DateRange) -> Result<BarSeries, DataSourceError> {
            if symbol == "SLOW" {
                return Err(DataSourceError::FetchTimeout(symbol.to_string()));
            }
            if symbol != self.symbol {
                return Err(DataSourceError::SymbolNotFound(symbol.to_string()));
            }
            let start = NaiveDate::from_ymd_opt(2024, 1, 1).unwrap();
            let bars = self
                .closes
                .iter()
                .enumerate()
                .map(|(i, &close)| Bar {
                    date: start + Duration::days(i as i64),
                    open: close,
                    high: close * 1.01,
                    low: close * 0.99,
                    close,
                    volume: 1_000_000 + i as u64,
                })
                .collect();
            Ok(BarSeries::new(symbol, bars)?)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::test_support::FakeSource;
    use super::*;

    fn range() -> DateRange {
        DateRange::trailing(Utc::now(), 365)
    }

    #[tokio::test]
    async fn builds_report_with_summary() {
        let closes: Vec<f64> = (1..=40).map(|x| x as f64).collect();
        let source = FakeSource::new("AAPL", closes);
        let report = analyze(&source, "aapl", range()).await.unwrap();

        assert_eq!(report.symbol, "AAPL");
        assert_eq!(report.bar_count, 40);
        assert_eq!(report.bars.len(), 40);
        assert_eq!(report.indicators.rsi.len(), 40);
        assert_eq!(report.summary.last_close, Some(40.0));
        assert_eq!(report.summary.rsi, Some(100.0));
        assert_eq!(report.summary.rsi_zone, Some(RsiZone::Overbought));
        // Mean of 21..=40.
        assert_eq!(report.summary.moving_average, Some(30.5));
        assert!(report.summary.volatility.unwrap() > 0.0);
    }

    #[tokio::test]
    async fn short_history_summary_is_empty() {
        let source = FakeSource::new("NEW", vec![10.0, 11.0]);
        let report = analyze(&source, "NEW", range()).await.unwrap();
        assert_eq!(report.summary.rsi, None);
        assert_eq!(report.summary.rsi_zone, None);
        assert_eq!(report.summary.moving_average, None);
        assert_eq!(report.summary.last_close, Some(11.0));
    }

    #[tokio::test]
    async fn invalid_symbol_short_circuits() {
        let source = FakeSource::new("AAPL", vec![1.0]);
        let err = analyze(&source, "AA PL", range()).await.unwrap_err();
        assert_eq!(err.kind(), "invalid_symbol");
    }

    #[tokio::test]
    async fn source_errors_pass_through() {
        let source = FakeSource::new("AAPL", vec![1.0]);
        let err = analyze(&source, "MSFT", range()).await.unwrap_err();
        assert_eq!(err.kind(), "symbol_not_found");
        let err = analyze(&source, "SLOW", range()).await.unwrap_err();
        assert_eq!(err.kind(), "fetch_timeout");
    }

    #[tokio::test]
    async fn report_serialises_no_value_as_null() {
        let source = FakeSource::new("AAPL", vec![5.0; 25]);
        let report = analyze(&source, "AAPL", range()).await.unwrap();
        let json = serde_json::to_value(&report).unwrap();
        assert_eq!(json["bar_count"], 25);
        assert_eq!(json["bars"].as_array().unwrap().len(), 25);
        assert!(json["indicators"]["rsi"]["points"][20]["value"].is_null());
        assert_eq!(json["indicators"]["volatility"]["points"][24]["value"], 0.0);
        assert_eq!(json["summary"]["rsi_zone"], serde_json::Value::Null);
    }
}
