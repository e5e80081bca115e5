// =============================================================================
// Rolling-window utility shared by every indicator
// =============================================================================
//
// Alignment rule: output position `i` is defined only when `i >= window - 1`
// AND every input in `[i - window + 1, i]` is defined.  An undefined input
// therefore poisons exactly the `window` outputs whose windows contain it.
//
// Each window is aggregated from scratch.  There are no running sums, so an
// all-zero window aggregates to exactly 0.0 (the RSI zero-loss policy depends
// on this).
// =============================================================================

use crate::error::EngineError;

/// Apply `aggregator` over every trailing window of `values`.
///
/// The returned vector has the same length as `values`.  Aggregator results
/// that are `None` or non-finite are stored as `None`.
pub fn rolling<F>(values: &[Option<f64>], window: usize, aggregator: F) -> Result<Vec<Option<f64>>, EngineError>
where
    F: Fn(&[f64]) -> Option<f64>,
{
    if window == 0 {
        return Err(EngineError::InvalidWindow);
    }

    let mut out = Vec::with_capacity(values.len());
    let mut buf: Vec<f64> = Vec::with_capacity(window);

    for i in 0..values.len() {
        if i + 1 < window {
            out.push(None);
            continue;
        }

        buf.clear();
        buf.extend(values[i + 1 - window..=i].iter().map_while(|v| *v));

        let value = if buf.len() == window {
            aggregator(&buf).filter(|v| v.is_finite())
        } else {
            None
        };
        out.push(value);
    }

    Ok(out)
}

/// Position-wise difference `f(values[i-1], values[i])`; position 0 and any
/// pair with an undefined side are `None`.
pub fn pairwise<F>(values: &[Option<f64>], f: F) -> Vec<Option<f64>>
where
    F: Fn(f64, f64) -> Option<f64>,
{
    let mut out = Vec::with_capacity(values.len());
    if values.is_empty() {
        return out;
    }
    out.push(None);
    for pair in values.windows(2) {
        let value = match (pair[0], pair[1]) {
            (Some(prev), Some(curr)) => f(prev, curr).filter(|v| v.is_finite()),
            _ => None,
        };
        out.push(value);
    }
    out
}

/// Arithmetic mean; `None` for an empty slice.
///
/// Accumulated as offsets from the first element, so a constant window
/// returns that constant bit-for-bit.
pub fn mean(values: &[f64]) -> Option<f64> {
    let &first = values.first()?;
    let offset: f64 = values.iter().map(|v| v - first).sum();
    Some(first + offset / values.len() as f64)
}

/// Sample standard deviation with the (n - 1) denominator; `None` when fewer
/// than two observations are available.
pub fn sample_std_dev(values: &[f64]) -> Option<f64> {
    let n = values.len();
    if n < 2 {
        return None;
    }
    let m = mean(values)?;
    let ss: f64 = values.iter().map(|v| (v - m).powi(2)).sum();
    Some((ss / (n - 1) as f64).sqrt())
}
