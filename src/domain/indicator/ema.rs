//! Exponential Moving Average indicator.
//!
//! alpha = 2/(span+1), seeded with the first price, then
//! EMA[i] = C[i]*alpha + EMA[i-1]*(1-alpha).
//! No warmup: every bar is defined.

use crate::domain::error::SigtraderError;
use crate::domain::indicator::{
    require_bars, require_window, IndicatorSeries, IndicatorType, IndicatorValue,
};
use crate::domain::ohlcv::PriceSeries;

pub fn calculate_ema(series: &PriceSeries, span: usize) -> Result<IndicatorSeries, SigtraderError> {
    let indicator_type = IndicatorType::Ema(span);
    require_window(&indicator_type, span)?;
    require_bars(&indicator_type, series.len(), 1)?;

    let values = ema_values(&series.closes(), span)
        .into_iter()
        .map(|v| Some(IndicatorValue::Simple(v)));

    Ok(IndicatorSeries::from_options(indicator_type, series, values))
}

/// Raw EMA recurrence over `values`. Empty input yields an empty vector.
pub(crate) fn ema_values(values: &[f64], span: usize) -> Vec<f64> {
    let alpha = 2.0 / (span as f64 + 1.0);
    let mut out = Vec::with_capacity(values.len());

    for (i, &value) in values.iter().enumerate() {
        let ema = if i == 0 {
            value
        } else {
            value * alpha + out[i - 1] * (1.0 - alpha)
        };
        out.push(ema);
    }

    out
}
