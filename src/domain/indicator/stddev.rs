//! Rolling Standard Deviation indicator.
//!
//! Sample standard deviation (divides by n-1) over n closing prices.
//! STDDEV(n)[i] = sqrt(sum((C[i-j] - SMA(n)[i])^2 for j in 0..n-1) / (n-1))
//! Warmup: first (n-1) bars are undefined. Requires n >= 2.

use crate::domain::error::SigtraderError;
use crate::domain::indicator::{require_bars, IndicatorSeries, IndicatorType, IndicatorValue};
use crate::domain::ohlcv::PriceSeries;

pub fn calculate_stddev(series: &PriceSeries, period: usize) -> Result<IndicatorSeries, SigtraderError> {
    let indicator_type = IndicatorType::Stddev(period);
    require_sample_window(&indicator_type, period)?;
    require_bars(&indicator_type, series.len(), period)?;

    let values = rolling_sample_std(&series.closes(), period)
        .into_iter()
        .map(|v| v.map(IndicatorValue::Simple));

    Ok(IndicatorSeries::from_options(indicator_type, series, values))
}

pub(crate) fn require_sample_window(
    indicator_type: &IndicatorType,
    period: usize,
) -> Result<(), SigtraderError> {
    if period < 2 {
        return Err(SigtraderError::invalid_parameter(
            indicator_type.to_string(),
            "sample standard deviation needs a window of at least 2",
        ));
    }
    Ok(())
}

/// Trailing sample standard deviation; `None` until `window` values are available.
pub(crate) fn rolling_sample_std(values: &[f64], window: usize) -> Vec<Option<f64>> {
    (0..values.len())
        .map(|i| {
            if i + 1 < window {
                return None;
            }
            let slice = &values[i + 1 - window..=i];
            let mean = slice.iter().sum::<f64>() / window as f64;
            let variance = slice
                .iter()
                .map(|v| {
                    let diff = v - mean;
                    diff * diff
                })
                .sum::<f64>()
                / (window - 1) as f64;
            Some(variance.sqrt())
        })
        .collect()
}
