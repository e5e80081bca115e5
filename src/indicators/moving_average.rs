// =============================================================================
// Simple Moving Average of closing prices
// =============================================================================

use crate::error::EngineError;
use crate::indicators::window::{mean, rolling};
use crate::types::{BarSeries, IndicatorSeries};

/// Default look-back for the moving average (trading days).
pub const DEFAULT_MA_WINDOW: usize = 20;

/// Arithmetic mean of `close` over the trailing `window` bars.
///
/// Positions `0..window-1` carry no value.
pub fn compute_moving_average(series: &BarSeries, window: usize) -> Result<IndicatorSeries, EngineError> {
    let values = rolling(&series.closes(), window, mean)?;
    Ok(IndicatorSeries::from_values(format!("ma_{window}"), &series.dates(), values))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::indicators::test_support::series_from_closes;

    #[test]
    fn constant_series_is_fixed_point() {
        let series = series_from_closes(&[42.5; 30]);
        let ma = compute_moving_average(&series, DEFAULT_MA_WINDOW).unwrap();
        assert_eq!(ma.len(), 30);
        for (i, p) in ma.points.iter().enumerate() {
            if i < DEFAULT_MA_WINDOW - 1 {
                assert_eq!(p.value, None, "position {i} should be undefined");
            } else {
                assert_eq!(p.value, Some(42.5));
            }
        }
    }

    #[test]
    fn inexact_constants_are_reproduced_exactly() {
        for c in [0.1, 100.1, 1234.567, 1e-7] {
            let ma = compute_moving_average(&series_from_closes(&vec![c; 30]), DEFAULT_MA_WINDOW).unwrap();
            for v in ma.values().iter().skip(DEFAULT_MA_WINDOW - 1) {
                assert_eq!(*v, Some(c), "moving average of constant {c}");
            }
        }
    }

    #[test]
    fn fifteen_point_scenario_window_fourteen() {
        let closes = [10.0, 11.0, 12.0, 11.0, 10.0, 9.0, 10.0, 11.0, 12.0, 13.0, 14.0, 15.0, 16.0, 17.0, 18.0];
        let ma = compute_moving_average(&series_from_closes(&closes), 14).unwrap();
        let values = ma.values();

        assert!(values[..13].iter().all(Option::is_none));
        let first = values[13].unwrap();
        assert!((first - 171.0 / 14.0).abs() < 1e-12);
        let second = values[14].unwrap();
        assert!((second - 179.0 / 14.0).abs() < 1e-12);
        assert_eq!(ma.defined_count(), 2);
    }

    #[test]
    fn short_series_is_all_undefined() {
        let ma = compute_moving_average(&series_from_closes(&[1.0; 19]), 20).unwrap();
        assert_eq!(ma.len(), 19);
        assert_eq!(ma.defined_count(), 0);
    }

    #[test]
    fn empty_and_single_row() {
        assert!(compute_moving_average(&series_from_closes(&[]), 20).unwrap().is_empty());
        let one = compute_moving_average(&series_from_closes(&[5.0]), 20).unwrap();
        assert_eq!(one.values(), vec![None]);
    }

    #[test]
    fn series_name_carries_window() {
        let ma = compute_moving_average(&series_from_closes(&[1.0, 2.0]), 2).unwrap();
        assert_eq!(ma.name, "ma_2");
        assert_eq!(ma.values(), vec![None, Some(1.5)]);
    }

    #[test]
    fn zero_window_is_an_error() {
        let err = compute_moving_average(&series_from_closes(&[1.0]), 0).unwrap_err();
        assert_eq!(err, EngineError::InvalidWindow);
    }
}
