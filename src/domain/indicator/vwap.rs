//! Rolling Volume-Weighted Average Price.
//!
//! Not session-anchored: over a trailing window of n bars,
//! VWAP(n)[i] = sum(TP × V) / sum(V) where TP = (high + low + close) / 3.
//!
//! Warmup: first (n-1) bars are undefined. A window with zero total volume
//! is also undefined.

use crate::domain::error::SigtraderError;
use crate::domain::indicator::{
    require_bars, require_window, IndicatorSeries, IndicatorType, IndicatorValue,
};
use crate::domain::ohlcv::PriceSeries;

pub const DEFAULT_WINDOW: usize = 14;

pub fn calculate_vwap(series: &PriceSeries, window: usize) -> Result<IndicatorSeries, SigtraderError> {
    let indicator_type = IndicatorType::Vwap(window);
    require_window(&indicator_type, window)?;
    require_bars(&indicator_type, series.len(), window)?;

    let bars = series.bars();
    let values = (0..bars.len()).map(|i| {
        if i + 1 < window {
            return None;
        }
        let slice = &bars[i + 1 - window..=i];
        let volume: f64 = slice.iter().map(|b| b.volume as f64).sum();
        if volume == 0.0 {
            return None;
        }
        let weighted: f64 = slice
            .iter()
            .map(|b| b.typical_price() * b.volume as f64)
            .sum();
        Some(IndicatorValue::Simple(weighted / volume))
    });

    Ok(IndicatorSeries::from_options(indicator_type, series, values))
}
