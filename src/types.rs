// =============================================================================
// Shared types: daily bars, bar series and indicator series
// =============================================================================

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::error::EngineError;

/// One trading day's OHLCV observation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Bar {
    pub date: NaiveDate,
    pub open: f64,
    pub high: f64,
    pub low: f64,
    pub close: f64,
    #[serde(default)]
    pub volume: u64,
}

/// Ascending, date-unique sequence of bars for a single symbol.
///
/// The only way to build one is [`BarSeries::new`], which rejects misordered
/// or duplicate dates, so every consumer can rely on the ordering.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BarSeries {
    symbol: String,
    bars: Vec<Bar>,
}

impl BarSeries {
    /// Validate and wrap `bars`.
    ///
    /// Fails with [`EngineError::NonIncreasingDates`] at the first bar whose
    /// date is not strictly after its predecessor.
    pub fn new(symbol: impl Into<String>, bars: Vec<Bar>) -> Result<Self, EngineError> {
        for (index, pair) in bars.windows(2).enumerate() {
            if pair[1].date <= pair[0].date {
                return Err(EngineError::NonIncreasingDates {
                    index: index + 1,
                    previous: pair[0].date,
                    current: pair[1].date,
                });
            }
        }
        Ok(Self {
            symbol: symbol.into(),
            bars,
        })
    }

    pub fn symbol(&self) -> &str {
        &self.symbol
    }

    pub fn bars(&self) -> &[Bar] {
        &self.bars
    }

    pub fn len(&self) -> usize {
        self.bars.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bars.is_empty()
    }

    pub fn dates(&self) -> Vec<NaiveDate> {
        self.bars.iter().map(|b| b.date).collect()
    }

    /// Closing prices, with non-finite closes mapped to "no value".
    pub fn closes(&self) -> Vec<Option<f64>> {
        self.bars
            .iter()
            .map(|b| Some(b.close).filter(|c| c.is_finite()))
            .collect()
    }

    pub fn last(&self) -> Option<&Bar> {
        self.bars.last()
    }
}

/// A single indicator observation. `value` is `None` where the indicator is
/// undefined (insufficient history or a degenerate ratio).
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct IndicatorPoint {
    pub date: NaiveDate,
    pub value: Option<f64>,
}

/// Indicator values aligned 1:1 by position with the source bar series.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IndicatorSeries {
    pub name: String,
    pub points: Vec<IndicatorPoint>,
}

impl IndicatorSeries {
    /// Zip `dates` with `values`. Non-finite values are stored as `None`.
    pub fn from_values(name: impl Into<String>, dates: &[NaiveDate], values: Vec<Option<f64>>) -> Self {
        debug_assert_eq!(dates.len(), values.len());
        let points = dates
            .iter()
            .zip(values)
            .map(|(&date, value)| IndicatorPoint {
                date,
                value: value.filter(|v| v.is_finite()),
            })
            .collect();
        Self {
            name: name.into(),
            points,
        }
    }

    pub fn len(&self) -> usize {
        self.points.len()
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    pub fn values(&self) -> Vec<Option<f64>> {
        self.points.iter().map(|p| p.value).collect()
    }

    /// Number of positions that carry a value.
    pub fn defined_count(&self) -> usize {
        self.points.iter().filter(|p| p.value.is_some()).count()
    }

    /// Most recent defined value, if any.
    pub fn last_defined(&self) -> Option<f64> {
        self.points.iter().rev().find_map(|p| p.value)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn bar(day: u32, close: f64) -> Bar {
        Bar {
            date: NaiveDate::from_ymd_opt(2024, 3, day).unwrap(),
            open: close,
            high: close,
            low: close,
            close,
            volume: 1_000,
        }
    }

    #[test]
    fn accepts_ascending_dates() {
        let series = BarSeries::new("AAPL", vec![bar(1, 10.0), bar(4, 11.0), bar(5, 12.0)]).unwrap();
        assert_eq!(series.len(), 3);
        assert_eq!(series.symbol(), "AAPL");
        assert_eq!(series.closes(), vec![Some(10.0), Some(11.0), Some(12.0)]);
    }

    #[test]
    fn accepts_empty_series() {
        let series = BarSeries::new("AAPL", Vec::new()).unwrap();
        assert!(series.is_empty());
        assert!(series.last().is_none());
    }

    #[test]
    fn rejects_duplicate_dates() {
        let err = BarSeries::new("AAPL", vec![bar(1, 10.0), bar(2, 11.0), bar(2, 12.0)]).unwrap_err();
        assert_eq!(
            err,
            EngineError::NonIncreasingDates {
                index: 2,
                previous: NaiveDate::from_ymd_opt(2024, 3, 2).unwrap(),
                current: NaiveDate::from_ymd_opt(2024, 3, 2).unwrap(),
            }
        );
    }

    #[test]
    fn rejects_out_of_order_dates() {
        let err = BarSeries::new("AAPL", vec![bar(5, 10.0), bar(4, 11.0)]).unwrap_err();
        assert!(matches!(err, EngineError::NonIncreasingDates { index: 1, .. }));
    }

    #[test]
    fn non_finite_close_is_no_value() {
        let series = BarSeries::new("X", vec![bar(1, f64::NAN), bar(2, 3.0)]).unwrap();
        assert_eq!(series.closes(), vec![None, Some(3.0)]);
    }

    #[test]
    fn indicator_series_drops_non_finite() {
        let dates: Vec<NaiveDate> = (1..=3).map(|d| NaiveDate::from_ymd_opt(2024, 3, d).unwrap()).collect();
        let s = IndicatorSeries::from_values("x", &dates, vec![None, Some(f64::INFINITY), Some(2.0)]);
        assert_eq!(s.values(), vec![None, None, Some(2.0)]);
        assert_eq!(s.defined_count(), 1);
        assert_eq!(s.last_defined(), Some(2.0));
    }

    #[test]
    fn indicator_series_serialises_no_value_as_null() {
        let dates = vec![NaiveDate::from_ymd_opt(2024, 3, 1).unwrap()];
        let s = IndicatorSeries::from_values("ma_20", &dates, vec![None]);
        let json = serde_json::to_value(&s).unwrap();
        assert!(json["points"][0]["value"].is_null());
        assert_eq!(json["points"][0]["date"], "2024-03-01");
    }
}
