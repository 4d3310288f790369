//! Signal-generating strategies.
//!
//! Each variant computes its indicators into an [`IndicatorFrame`] and maps
//! every bar to a [`Signal`]. Signals are level based: a bar emits BUY or SELL
//! whenever its condition holds, not only on the bar where it starts to hold.
//! When both conditions hold on one bar, SELL wins.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use tracing::debug;

use super::error::SigtraderError;
use super::indicator::{
    bollinger, calculate_bollinger, calculate_macd, calculate_rsi, calculate_sma,
    calculate_support_resistance, calculate_vwap, macd, rsi, support_resistance, vwap,
    IndicatorFrame, IndicatorSeries,
};
use super::ohlcv::PriceSeries;
use super::signal::Signal;

/// Strategy selector, parsed from config or the command line.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum StrategyKind {
    Ma,
    Rsi,
    Macd,
    Bb,
    Vwap,
    Sr,
}

impl StrategyKind {
    pub const ALL: [StrategyKind; 6] = [
        StrategyKind::Ma,
        StrategyKind::Rsi,
        StrategyKind::Macd,
        StrategyKind::Bb,
        StrategyKind::Vwap,
        StrategyKind::Sr,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            StrategyKind::Ma => "MA",
            StrategyKind::Rsi => "RSI",
            StrategyKind::Macd => "MACD",
            StrategyKind::Bb => "BB",
            StrategyKind::Vwap => "VWAP",
            StrategyKind::Sr => "SR",
        }
    }
}

impl fmt::Display for StrategyKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for StrategyKind {
    type Err = SigtraderError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let wanted = s.trim();
        StrategyKind::ALL
            .into_iter()
            .find(|kind| kind.as_str().eq_ignore_ascii_case(wanted))
            .ok_or_else(|| SigtraderError::UnknownStrategy {
                name: wanted.to_string(),
            })
    }
}

/// A configured strategy.
#[derive(Debug, Clone, PartialEq)]
pub enum Strategy {
    MaCrossover {
        short_window: usize,
        long_window: usize,
    },
    Rsi {
        period: usize,
        overbought: f64,
        oversold: f64,
    },
    Macd {
        fast: usize,
        slow: usize,
        signal: usize,
    },
    Bollinger {
        window: usize,
        num_std: f64,
    },
    Vwap {
        window: usize,
    },
    SupportResistance {
        window: usize,
        num_touches: usize,
    },
}

/// Everything a strategy run produces for one symbol.
#[derive(Debug, Clone, PartialEq)]
pub struct StrategyOutput {
    pub kind: StrategyKind,
    pub frame: IndicatorFrame,
    pub signals: Vec<Signal>,
}

impl Strategy {
    /// The strategy with its stock parameters.
    pub fn default_for(kind: StrategyKind) -> Self {
        match kind {
            StrategyKind::Ma => Strategy::MaCrossover {
                short_window: 20,
                long_window: 50,
            },
            StrategyKind::Rsi => Strategy::Rsi {
                period: rsi::DEFAULT_PERIOD,
                overbought: 65.0,
                oversold: 35.0,
            },
            StrategyKind::Macd => Strategy::Macd {
                fast: macd::DEFAULT_FAST,
                slow: macd::DEFAULT_SLOW,
                signal: macd::DEFAULT_SIGNAL,
            },
            StrategyKind::Bb => Strategy::Bollinger {
                window: bollinger::DEFAULT_PERIOD,
                num_std: bollinger::DEFAULT_STDDEV_MULT_X100 as f64 / 100.0,
            },
            StrategyKind::Vwap => Strategy::Vwap {
                window: vwap::DEFAULT_WINDOW,
            },
            StrategyKind::Sr => Strategy::SupportResistance {
                window: support_resistance::DEFAULT_WINDOW,
                num_touches: support_resistance::DEFAULT_TOUCHES,
            },
        }
    }

    pub fn kind(&self) -> StrategyKind {
        match self {
            Strategy::MaCrossover { .. } => StrategyKind::Ma,
            Strategy::Rsi { .. } => StrategyKind::Rsi,
            Strategy::Macd { .. } => StrategyKind::Macd,
            Strategy::Bollinger { .. } => StrategyKind::Bb,
            Strategy::Vwap { .. } => StrategyKind::Vwap,
            Strategy::SupportResistance { .. } => StrategyKind::Sr,
        }
    }

    /// Parameter checks that do not depend on the price series.
    pub fn validate(&self) -> Result<(), SigtraderError> {
        let fail = |reason: &str| Err(SigtraderError::invalid_parameter(self.kind().as_str(), reason));
        match *self {
            Strategy::Rsi {
                overbought,
                oversold,
                ..
            } => {
                if !(0.0..=100.0).contains(&oversold) || !(0.0..=100.0).contains(&overbought) {
                    return fail("RSI thresholds must lie in [0, 100]");
                }
                if oversold >= overbought {
                    return fail("oversold threshold must be below overbought");
                }
            }
            Strategy::Bollinger { num_std, .. } => {
                if !num_std.is_finite() || num_std <= 0.0 || num_std > MAX_NUM_STD {
                    return fail("num_std must be a positive number up to 1000");
                }
                if (num_std * 100.0 - (num_std * 100.0).round()).abs() > 1e-6 {
                    return fail("num_std is limited to two decimal places");
                }
            }
            _ => {}
        }
        Ok(())
    }

    /// Compute indicators and one signal per bar.
    pub fn generate(&self, series: &PriceSeries) -> Result<StrategyOutput, SigtraderError> {
        self.validate()?;
        let closes = series.closes();
        let mut frame = IndicatorFrame::new(series.clone());

        let signals: Vec<Signal> = match *self {
            Strategy::MaCrossover {
                short_window,
                long_window,
            } => {
                let short = calculate_sma(series, short_window)?;
                let long = calculate_sma(series, long_window)?;
                let signals = (0..series.len())
                    .map(|i| match (short.simple_at(i), long.simple_at(i)) {
                        (Some(s), Some(l)) => level_signal(s > l, s < l),
                        _ => Signal::Hold,
                    })
                    .collect();
                frame.push(short);
                frame.push(long);
                signals
            }
            Strategy::Rsi {
                period,
                overbought,
                oversold,
            } => {
                let rsi = calculate_rsi(series, period)?;
                let signals = (0..series.len())
                    .map(|i| match rsi.simple_at(i) {
                        Some(v) => level_signal(v < oversold, v > overbought),
                        None => Signal::Hold,
                    })
                    .collect();
                frame.push(rsi);
                signals
            }
            Strategy::Macd { fast, slow, signal } => {
                let macd = calculate_macd(series, fast, slow, signal)?;
                let signals = (0..series.len())
                    .map(|i| match macd.histogram_at(i) {
                        Some(h) => level_signal(h > 0.0, h < 0.0),
                        None => Signal::Hold,
                    })
                    .collect();
                frame.push(macd);
                signals
            }
            Strategy::Bollinger { window, num_std } => {
                let bands = calculate_bollinger(series, window, stddev_mult_x100(num_std))?;
                let signals = closes
                    .iter()
                    .enumerate()
                    .map(|(i, &close)| match bands.bands_at(i) {
                        Some((upper, _, lower)) => level_signal(close < lower, close > upper),
                        None => Signal::Hold,
                    })
                    .collect();
                frame.push(bands);
                signals
            }
            Strategy::Vwap { window } => {
                let vwap = calculate_vwap(series, window)?;
                let signals = closes
                    .iter()
                    .enumerate()
                    .map(|(i, &close)| match vwap.simple_at(i) {
                        Some(v) => level_signal(close > v, close < v),
                        None => Signal::Hold,
                    })
                    .collect();
                frame.push(vwap);
                signals
            }
            Strategy::SupportResistance {
                window,
                num_touches,
            } => {
                let (support, resistance) =
                    calculate_support_resistance(series, window, num_touches)?;
                let signals = closes
                    .iter()
                    .enumerate()
                    .map(|(i, &close)| {
                        let buy = near(&support, i, |level| close < level * 1.02);
                        let sell = near(&resistance, i, |level| close > level * 0.98);
                        level_signal(buy, sell)
                    })
                    .collect();
                frame.push(support);
                frame.push(resistance);
                signals
            }
        };

        debug!(
            symbol = series.symbol(),
            strategy = %self.kind(),
            bars = series.len(),
            buys = signals.iter().filter(|s| **s == Signal::Buy).count(),
            sells = signals.iter().filter(|s| **s == Signal::Sell).count(),
            "generated signals"
        );

        Ok(StrategyOutput {
            kind: self.kind(),
            frame,
            signals,
        })
    }
}

/// Largest band multiplier accepted; keeps the hundredths key within `u32`.
const MAX_NUM_STD: f64 = 1000.0;

/// `num_std` in hundredths. Only exact for values `validate` accepts.
fn stddev_mult_x100(num_std: f64) -> u32 {
    (num_std * 100.0).round() as u32
}

fn level_signal(buy: bool, sell: bool) -> Signal {
    if sell {
        Signal::Sell
    } else if buy {
        Signal::Buy
    } else {
        Signal::Hold
    }
}

fn near(levels: &IndicatorSeries, index: usize, test: impl Fn(f64) -> bool) -> bool {
    levels.simple_at(index).is_some_and(test)
}
