//! RSI (Relative Strength Index) indicator.
//!
//! Uses simple rolling means (not Wilder's smoothing) of the last n price changes:
//! - avg_gain = mean(max(delta, 0))
//! - avg_loss = mean(max(-delta, 0))
//!
//! Formula: RSI = 100 - (100 / (1 + avg_gain / avg_loss))
//! If avg_loss == 0: RSI = 100 when avg_gain > 0, RSI = 50 on a flat window.
//!
//! The first bar counts as an unchanged price, so the first n - 1 bars are
//! undefined and n bars are enough.

use crate::domain::error::SigtraderError;
use crate::domain::indicator::{
    require_bars, require_window, IndicatorSeries, IndicatorType, IndicatorValue,
};
use crate::domain::ohlcv::PriceSeries;

pub const DEFAULT_PERIOD: usize = 10;

pub fn calculate_rsi(series: &PriceSeries, period: usize) -> Result<IndicatorSeries, SigtraderError> {
    let indicator_type = IndicatorType::Rsi(period);
    require_window(&indicator_type, period)?;
    require_bars(&indicator_type, series.len(), period)?;

    let closes = series.closes();
    let mut gains = vec![0.0; closes.len()];
    let mut losses = vec![0.0; closes.len()];
    for i in 1..closes.len() {
        let change = closes[i] - closes[i - 1];
        gains[i] = change.max(0.0);
        losses[i] = (-change).max(0.0);
    }

    let values = (0..closes.len()).map(|i| {
        if i + 1 < period {
            return None;
        }
        let window = i + 1 - period..=i;
        let avg_gain = gains[window.clone()].iter().sum::<f64>() / period as f64;
        let avg_loss = losses[window].iter().sum::<f64>() / period as f64;
        Some(IndicatorValue::Simple(rsi_from_averages(avg_gain, avg_loss)))
    });

    Ok(IndicatorSeries::from_options(indicator_type, series, values))
}

fn rsi_from_averages(avg_gain: f64, avg_loss: f64) -> f64 {
    if avg_loss == 0.0 {
        if avg_gain > 0.0 { 100.0 } else { 50.0 }
    } else {
        100.0 - (100.0 / (1.0 + avg_gain / avg_loss))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::indicator::test_support::series_from_closes;
    use proptest::prelude::*;

    #[test]
    fn rsi_warmup_period() {
        let closes: Vec<f64> = (1..=15).map(|i| 100.0 + (i as f64 % 5.0) * 2.0).collect();
        let series = series_from_closes(&closes);
        let rsi = calculate_rsi(&series, 14).unwrap();

        assert_eq!(rsi.len(), 15);
        for i in 0..13 {
            assert!(rsi.simple_at(i).is_none(), "Bar {} should be undefined", i);
        }
        assert!(rsi.simple_at(13).is_some(), "Bar 13 should be defined");
    }

    #[test]
    fn rsi_all_gains_no_losses() {
        let closes: Vec<f64> = (0..15).map(|i| 100.0 + i as f64).collect();
        let rsi = calculate_rsi(&series_from_closes(&closes), 14).unwrap();
        assert!((rsi.simple_at(14).unwrap() - 100.0).abs() < f64::EPSILON);
    }

    #[test]
    fn rsi_all_losses_no_gains() {
        let closes: Vec<f64> = (0..15).map(|i| 100.0 - i as f64).collect();
        let rsi = calculate_rsi(&series_from_closes(&closes), 14).unwrap();
        assert!(rsi.simple_at(14).unwrap().abs() < f64::EPSILON);
    }

    #[test]
    fn rsi_flat_window_is_neutral() {
        let rsi = calculate_rsi(&series_from_closes(&[100.0; 12]), 10).unwrap();
        assert!((rsi.simple_at(11).unwrap() - 50.0).abs() < f64::EPSILON);
    }

    #[test]
    fn rsi_known_calculation() {
        // deltas over the window: +2, -1, +2, -1 -> avg_gain 1.0, avg_loss 0.5
        let series = series_from_closes(&[100.0, 102.0, 101.0, 103.0, 102.0]);
        let rsi = calculate_rsi(&series, 4).unwrap();
        let expected = 100.0 - 100.0 / (1.0 + 1.0 / 0.5);
        assert!((rsi.simple_at(4).unwrap() - expected).abs() < 1e-9);
    }

    #[test]
    fn rsi_uses_only_last_period_changes() {
        // The large early drop falls out of the 2-bar window.
        let series = series_from_closes(&[200.0, 100.0, 101.0, 102.0]);
        let rsi = calculate_rsi(&series, 2).unwrap();
        assert!((rsi.simple_at(3).unwrap() - 100.0).abs() < f64::EPSILON);
    }

    #[test]
    fn rsi_requires_period_bars() {
        let series = series_from_closes(&[1.0; 9]);
        let err = calculate_rsi(&series, 10).unwrap_err();
        assert!(matches!(
            err,
            SigtraderError::InsufficientData {
                bars: 9,
                minimum: 10,
                ..
            }
        ));
    }

    #[test]
    fn rsi_defined_on_last_bar_of_exact_period() {
        // First bar counts as no change: nine gains over a ten-bar window.
        let closes: Vec<f64> = (0..10).map(|i| 100.0 + i as f64).collect();
        let rsi = calculate_rsi(&series_from_closes(&closes), 10).unwrap();
        assert!(rsi.simple_at(8).is_none());
        assert!((rsi.simple_at(9).unwrap() - 100.0).abs() < f64::EPSILON);
    }

    #[test]
    fn rsi_zero_period() {
        let series = series_from_closes(&[100.0, 101.0]);
        assert!(matches!(
            calculate_rsi(&series, 0),
            Err(SigtraderError::InvalidParameter { .. })
        ));
    }

    #[test]
    fn rsi_indicator_type() {
        let series = series_from_closes(&[100.0; 20]);
        let rsi = calculate_rsi(&series, 14).unwrap();
        assert_eq!(rsi.indicator_type, IndicatorType::Rsi(14));
    }

    proptest! {
        #[test]
        fn rsi_stays_in_range(
            closes in prop::collection::vec(1.0f64..1_000.0, 12..60),
            period in 1usize..11,
        ) {
            let rsi = calculate_rsi(&series_from_closes(&closes), period).unwrap();
            for i in 0..rsi.len() {
                if let Some(v) = rsi.simple_at(i) {
                    prop_assert!((0.0..=100.0).contains(&v), "RSI {} out of range", v);
                }
            }
        }
    }
}
