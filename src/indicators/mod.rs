// =============================================================================
// Technical Indicators Module
// =============================================================================
//
// Pure, side-effect-free implementations of the three indicators shown on the
// dashboard.  Every function takes a validated `BarSeries` and returns an
// `IndicatorSeries` aligned 1:1 with it; positions without enough history or
// with a degenerate ratio carry `None`, never NaN.
// =============================================================================

pub mod moving_average;
pub mod rsi;
pub mod volatility;
pub mod window;

use serde::Serialize;

pub use moving_average::{compute_moving_average, DEFAULT_MA_WINDOW};
pub use rsi::{compute_rsi, RsiZone, DEFAULT_RSI_WINDOW};
pub use volatility::{compute_volatility, DEFAULT_ANNUALIZATION_FACTOR, DEFAULT_VOLATILITY_WINDOW};

use crate::error::EngineError;
use crate::types::{BarSeries, IndicatorSeries};

/// The three dashboard indicators computed with their default windows.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct IndicatorSet {
    pub moving_average: IndicatorSeries,
    pub rsi: IndicatorSeries,
    pub volatility: IndicatorSeries,
}

/// Compute every indicator for `series` using the default parameters.
pub fn compute_indicators(series: &BarSeries) -> Result<IndicatorSet, EngineError> {
    Ok(IndicatorSet {
        moving_average: compute_moving_average(series, DEFAULT_MA_WINDOW)?,
        rsi: compute_rsi(series, DEFAULT_RSI_WINDOW)?,
        volatility: compute_volatility(series, DEFAULT_VOLATILITY_WINDOW, DEFAULT_ANNUALIZATION_FACTOR)?,
    })
}
