// =============================================================================
// Relative Strength Index (RSI) — simple rolling averages
// =============================================================================
//
// RSI measures the balance of recent up-moves against down-moves.
//
// Step 1 — delta[i] = close[i] - close[i-1]   (delta[0] has no value)
// Step 2 — gain = max(delta, 0),  loss = max(-delta, 0)
// Step 3 — avg_gain / avg_loss = rolling mean over `window` deltas, so the
//          first RSI lands on price position `window`.
// Step 4 — RS  = avg_gain / avg_loss
//          RSI = 100 - 100 / (1 + RS)
//
// Zero average loss:
//   avg_gain > 0  => RSI = 100 (all gains)
//   avg_gain == 0 => no value  (flat window, no strength signal)
//
// Thresholds:  RSI >= 70 => OVERBOUGHT,  RSI <= 30 => OVERSOLD.
// =============================================================================

use serde::{Deserialize, Serialize};

use crate::error::EngineError;
use crate::indicators::window::{mean, pairwise, rolling};
use crate::types::{BarSeries, IndicatorSeries};

/// Default RSI look-back (number of deltas).
pub const DEFAULT_RSI_WINDOW: usize = 14;

/// Upper guide line.
pub const OVERBOUGHT_LEVEL: f64 = 70.0;
/// Lower guide line.
pub const OVERSOLD_LEVEL: f64 = 30.0;

/// Compute the RSI series for `series` with the given `window`.
///
/// The output is aligned with the input; positions `0..window` carry no
/// value, as does every position whose window saw no price movement at all.
pub fn compute_rsi(series: &BarSeries, window: usize) -> Result<IndicatorSeries, EngineError> {
    let deltas = pairwise(&series.closes(), |prev, curr| Some(curr - prev));

    let gains: Vec<Option<f64>> = deltas.iter().map(|d| d.map(|d| d.max(0.0))).collect();
    let losses: Vec<Option<f64>> = deltas.iter().map(|d| d.map(|d| (-d).max(0.0))).collect();

    let avg_gain = rolling(&gains, window, mean)?;
    let avg_loss = rolling(&losses, window, mean)?;

    let values = avg_gain
        .iter()
        .zip(&avg_loss)
        .map(|(g, l)| match (g, l) {
            (Some(g), Some(l)) => rsi_from_averages(*g, *l),
            _ => None,
        })
        .collect();

    Ok(IndicatorSeries::from_values(format!("rsi_{window}"), &series.dates(), values))
}

/// Convert average gain / average loss into an RSI value in [0, 100].
fn rsi_from_averages(avg_gain: f64, avg_loss: f64) -> Option<f64> {
    if avg_loss == 0.0 {
        return if avg_gain > 0.0 { Some(100.0) } else { None };
    }
    let rs = avg_gain / avg_loss;
    let rsi = 100.0 - 100.0 / (1.0 + rs);
    Some(rsi.clamp(0.0, 100.0)).filter(|v| v.is_finite())
}

// =============================================================================
// Zone classification
// =============================================================================

/// Where an RSI reading sits relative to the 70 / 30 guide lines.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum RsiZone {
    Overbought,
    Neutral,
    Oversold,
}

impl RsiZone {
    pub fn classify(value: f64) -> Self {
        if value >= OVERBOUGHT_LEVEL {
            Self::Overbought
        } else if value <= OVERSOLD_LEVEL {
            Self::Oversold
        } else {
            Self::Neutral
        }
    }
}

impl std::fmt::Display for RsiZone {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Overbought => write!(f, "OVERBOUGHT"),
            Self::Neutral => write!(f, "NEUTRAL"),
            Self::Oversold => write!(f, "OVERSOLD"),
        }
    }
}
