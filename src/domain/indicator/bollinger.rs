//! Bollinger Bands indicator.
//!
//! Bollinger Bands consist of:
//! - Middle: Simple Moving Average (SMA) over n periods
//! - Upper: Middle + (multiplier × StdDev)
//! - Lower: Middle - (multiplier × StdDev)
//!
//! Where StdDev is the sample standard deviation (divides by N-1).
//!
//! Default parameters: period=20, multiplier=2.0
//! Warmup: first (period-1) bars are undefined.

use crate::domain::error::SigtraderError;
use crate::domain::indicator::sma::rolling_mean;
use crate::domain::indicator::stddev::{require_sample_window, rolling_sample_std};
use crate::domain::indicator::{require_bars, IndicatorSeries, IndicatorType, IndicatorValue};
use crate::domain::ohlcv::PriceSeries;

pub const DEFAULT_PERIOD: usize = 20;
pub const DEFAULT_STDDEV_MULT_X100: u32 = 200;

pub fn calculate_bollinger(
    series: &PriceSeries,
    period: usize,
    stddev_mult_x100: u32,
) -> Result<IndicatorSeries, SigtraderError> {
    let indicator_type = IndicatorType::Bollinger {
        period,
        stddev_mult_x100,
    };
    require_sample_window(&indicator_type, period)?;
    require_bars(&indicator_type, series.len(), period)?;

    let mult = stddev_mult_x100 as f64 / 100.0;
    let closes = series.closes();
    let middles = rolling_mean(&closes, period);
    let stddevs = rolling_sample_std(&closes, period);

    let values = middles
        .into_iter()
        .zip(stddevs)
        .map(|(middle, stddev)| match (middle, stddev) {
            (Some(middle), Some(stddev)) => Some(IndicatorValue::Bollinger {
                upper: middle + mult * stddev,
                middle,
                lower: middle - mult * stddev,
            }),
            _ => None,
        });

    Ok(IndicatorSeries::from_options(indicator_type, series, values))
}
