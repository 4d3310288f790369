//! Support and resistance levels.
//!
//! Resistance candidate = centered rolling max of highs over n bars.
//! Support candidate = centered rolling min of lows over n bars.
//! The centered window for bar i is `[i - n/2, i + (n-1)/2]` and is undefined
//! when it does not fit inside the series.
//!
//! A bar "touches" its level when it lies within 1% of its own centered
//! extreme. A candidate is only reported when the touch count over the
//! trailing n bars reaches `num_touches`.
//!
//! Lookahead: the centered window reads up to `(n-1)/2` future bars, so these
//! levels describe history and are only usable for backtests, never for a
//! decision at the current bar.

use crate::domain::error::SigtraderError;
use crate::domain::indicator::{
    require_bars, require_window, IndicatorSeries, IndicatorType, IndicatorValue,
};
use crate::domain::ohlcv::PriceSeries;

pub const DEFAULT_WINDOW: usize = 20;
pub const DEFAULT_TOUCHES: usize = 2;

const TOUCH_TOLERANCE: f64 = 0.01;

/// Returns `(support, resistance)`.
pub fn calculate_support_resistance(
    series: &PriceSeries,
    window: usize,
    num_touches: usize,
) -> Result<(IndicatorSeries, IndicatorSeries), SigtraderError> {
    let support_type = IndicatorType::Support {
        window,
        touches: num_touches,
    };
    let resistance_type = IndicatorType::Resistance {
        window,
        touches: num_touches,
    };
    require_window(&support_type, window)?;
    require_bars(&support_type, series.len(), window)?;

    let highs = series.highs();
    let lows = series.lows();

    let resistance = confirmed_levels(
        &highs,
        &centered_extreme(&highs, window, f64::max),
        window,
        num_touches,
    );
    let support = confirmed_levels(
        &lows,
        &centered_extreme(&lows, window, f64::min),
        window,
        num_touches,
    );

    Ok((
        IndicatorSeries::from_options(
            support_type,
            series,
            support.into_iter().map(|v| v.map(IndicatorValue::Simple)),
        ),
        IndicatorSeries::from_options(
            resistance_type,
            series,
            resistance.into_iter().map(|v| v.map(IndicatorValue::Simple)),
        ),
    ))
}

fn centered_extreme(values: &[f64], window: usize, pick: fn(f64, f64) -> f64) -> Vec<Option<f64>> {
    let before = window / 2;
    let after = (window - 1) / 2;
    (0..values.len())
        .map(|i| {
            if i < before || i + after >= values.len() {
                return None;
            }
            values[i - before..=i + after]
                .iter()
                .copied()
                .reduce(pick)
        })
        .collect()
}

fn confirmed_levels(
    values: &[f64],
    extremes: &[Option<f64>],
    window: usize,
    num_touches: usize,
) -> Vec<Option<f64>> {
    let touches: Vec<bool> = values
        .iter()
        .zip(extremes)
        .map(|(&v, extreme)| match extreme {
            Some(level) => (v - level).abs() < level.abs() * TOUCH_TOLERANCE,
            None => false,
        })
        .collect();

    (0..values.len())
        .map(|i| {
            let level = extremes[i]?;
            if i + 1 < window {
                return None;
            }
            let count = touches[i + 1 - window..=i].iter().filter(|t| **t).count();
            (count >= num_touches).then_some(level)
        })
        .collect()
}
