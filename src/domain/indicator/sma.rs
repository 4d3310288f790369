//! Simple Moving Average indicator.
//!
//! SMA(n)[i] = mean(C[i-n+1..=i])
//! Warmup: first (n-1) bars are undefined.

use crate::domain::error::SigtraderError;
use crate::domain::indicator::{
    require_bars, require_window, IndicatorSeries, IndicatorType, IndicatorValue,
};
use crate::domain::ohlcv::PriceSeries;

pub fn calculate_sma(series: &PriceSeries, period: usize) -> Result<IndicatorSeries, SigtraderError> {
    let indicator_type = IndicatorType::Sma(period);
    require_window(&indicator_type, period)?;
    require_bars(&indicator_type, series.len(), period)?;

    let values = rolling_mean(&series.closes(), period)
        .into_iter()
        .map(|v| v.map(IndicatorValue::Simple));

    Ok(IndicatorSeries::from_options(indicator_type, series, values))
}

/// Trailing arithmetic mean; `None` until `window` values are available.
pub(crate) fn rolling_mean(values: &[f64], window: usize) -> Vec<Option<f64>> {
    (0..values.len())
        .map(|i| {
            if i + 1 < window {
                return None;
            }
            let sum: f64 = values[i + 1 - window..=i].iter().sum();
            Some(sum / window as f64)
        })
        .collect()
}
