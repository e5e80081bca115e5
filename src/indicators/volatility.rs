// =============================================================================
// Rolling annualised volatility of daily simple returns
// =============================================================================
//
// return[i]     = close[i] / close[i-1] - 1
// volatility[i] = sample_std(return[i-window+1 ..= i]) * sqrt(annualization)
//
// A zero previous close makes that day's return undefined, which in turn
// blanks every window that contains it.
// =============================================================================

use crate::error::EngineError;
use crate::indicators::window::{pairwise, rolling, sample_std_dev};
use crate::types::{BarSeries, IndicatorSeries};

/// Default look-back for the volatility window (returns).
pub const DEFAULT_VOLATILITY_WINDOW: usize = 20;

/// Trading days per year.
pub const DEFAULT_ANNUALIZATION_FACTOR: f64 = 252.0;

/// Daily simple returns aligned with the closes; position 0 has no value.
pub fn daily_returns(closes: &[Option<f64>]) -> Vec<Option<f64>> {
    pairwise(closes, |prev, curr| {
        if prev == 0.0 {
            None
        } else {
            Some(curr / prev - 1.0)
        }
    })
}

/// Rolling sample standard deviation of daily returns scaled by
/// `sqrt(annualization_factor)`.
pub fn compute_volatility(
    series: &BarSeries,
    window: usize,
    annualization_factor: f64,
) -> Result<IndicatorSeries, EngineError> {
    let returns = daily_returns(&series.closes());
    let scale = annualization_factor.sqrt();
    let values = rolling(&returns, window, |w| sample_std_dev(w).map(|sd| sd * scale))?;
    Ok(IndicatorSeries::from_values(
        format!("volatility_{window}"),
        &series.dates(),
        values,
    ))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::indicators::test_support::series_from_closes;

    #[test]
    fn constant_prices_have_zero_volatility() {
        let vol = compute_volatility(&series_from_closes(&[100.0; 10]), 5, DEFAULT_ANNUALIZATION_FACTOR).unwrap();
        let values = vol.values();
        assert!(values[..5].iter().all(Option::is_none));
        for v in &values[5..] {
            assert_eq!(*v, Some(0.0));
        }
    }

    #[test]
    fn uses_sample_estimator() {
        // Returns: +10%, -10%, +10% (approximately). Compare against a direct
        // (n - 1) computation rather than the population formula.
        let closes = [100.0, 110.0, 99.0, 108.9];
        let vol = compute_volatility(&series_from_closes(&closes), 3, 1.0).unwrap();
        let r: [f64; 3] = [0.1, 99.0 / 110.0 - 1.0, 108.9 / 99.0 - 1.0];
        let m = (r[0] + r[1] + r[2]) / 3.0;
        let ss: f64 = r.iter().map(|x| (x - m).powi(2)).sum();
        let sample = (ss / 2.0).sqrt();
        let population = (ss / 3.0).sqrt();

        let got = vol.values()[3].unwrap();
        assert!((got - sample).abs() < 1e-12);
        assert!((got - population).abs() > 1e-4);
    }

    #[test]
    fn annualization_scales_by_square_root() {
        let closes = [100.0, 101.0, 99.5, 102.0, 100.0, 103.0];
        let daily = compute_volatility(&series_from_closes(&closes), 4, 1.0).unwrap();
        let annual = compute_volatility(&series_from_closes(&closes), 4, 252.0).unwrap();
        for (d, a) in daily.values().iter().zip(annual.values()) {
            match (d, a) {
                (Some(d), Some(a)) => assert!((a - d * 252.0_f64.sqrt()).abs() < 1e-12),
                (None, None) => {}
                other => panic!("alignment differs: {other:?}"),
            }
        }
    }

    #[test]
    fn zero_close_blanks_covering_windows() {
        let closes = [10.0, 0.0, 5.0, 6.0, 7.0, 8.0, 9.0];
        let vol = compute_volatility(&series_from_closes(&closes), 2, 1.0).unwrap();
        let values = vol.values();
        // return[2] divides by zero; windows ending at 2 and 3 contain it.
        assert_eq!(values[2], None);
        assert_eq!(values[3], None);
        assert!(values[4].is_some());
        assert!(values.iter().flatten().all(|v| v.is_finite()));
    }

    #[test]
    fn negative_close_does_not_fault() {
        let closes = [10.0, -5.0, 4.0, 6.0];
        let vol = compute_volatility(&series_from_closes(&closes), 2, 1.0).unwrap();
        assert_eq!(vol.len(), 4);
    }

    #[test]
    fn window_of_one_never_defined() {
        let vol = compute_volatility(&series_from_closes(&[1.0, 2.0, 3.0]), 1, 252.0).unwrap();
        assert_eq!(vol.defined_count(), 0);
    }

    #[test]
    fn short_series_is_all_undefined() {
        let vol = compute_volatility(&series_from_closes(&[1.0; 20]), 20, 252.0).unwrap();
        assert_eq!(vol.defined_count(), 0);
        assert!(compute_volatility(&series_from_closes(&[]), 20, 252.0).unwrap().is_empty());
    }

    #[test]
    fn daily_returns_align_with_closes() {
        let r = daily_returns(&[Some(100.0), Some(110.0), Some(0.0), Some(1.0)]);
        assert_eq!(r.len(), 4);
        assert_eq!(r[0], None);
        assert!((r[1].unwrap() - 0.1).abs() < 1e-12);
        assert_eq!(r[2], Some(-1.0));
        assert_eq!(r[3], None);
    }
}
