//! Technical indicator implementations.
//!
//! This module provides types for representing indicator values and series:
//! - `IndicatorPoint`: A single point in an indicator time series
//! - `IndicatorValue`: Enum for different indicator output shapes
//! - `IndicatorType`: Enum for indicator identity + parameters (serves as HashMap key)
//! - `IndicatorSeries`: A time series of indicator values, one point per bar
//! - `IndicatorFrame`: A price series together with the indicators computed on it
//!
//! Warm-up policy: every calculator fails with `InsufficientData` when the
//! series is shorter than its lookback, and reports `None` for the bars inside
//! the warm-up otherwise. Values at bar `i` only use bars `<= i`, except for
//! support/resistance which uses a centered window.

pub mod bollinger;
pub mod ema;
pub mod macd;
pub mod rsi;
pub mod sma;
pub mod stddev;
pub mod support_resistance;
pub mod vwap;

pub use bollinger::calculate_bollinger;
pub use ema::calculate_ema;
pub use macd::calculate_macd;
pub use rsi::calculate_rsi;
pub use sma::calculate_sma;
pub use stddev::calculate_stddev;
pub use support_resistance::calculate_support_resistance;
pub use vwap::calculate_vwap;

use chrono::NaiveDateTime;
use std::fmt;

use crate::domain::error::SigtraderError;
use crate::domain::ohlcv::PriceSeries;

#[derive(Debug, Clone, PartialEq)]
pub struct IndicatorPoint {
    pub timestamp: NaiveDateTime,
    pub value: Option<IndicatorValue>,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum IndicatorValue {
    Simple(f64),
    Macd {
        line: f64,
        signal: f64,
        histogram: f64,
    },
    Bollinger {
        upper: f64,
        middle: f64,
        lower: f64,
    },
}

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum IndicatorType {
    Sma(usize),
    Ema(usize),
    Rsi(usize),
    Stddev(usize),
    Vwap(usize),
    Macd {
        fast: usize,
        slow: usize,
        signal: usize,
    },
    Bollinger {
        period: usize,
        stddev_mult_x100: u32,
    },
    Support {
        window: usize,
        touches: usize,
    },
    Resistance {
        window: usize,
        touches: usize,
    },
}

impl fmt::Display for IndicatorType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            IndicatorType::Sma(period) => write!(f, "SMA({})", period),
            IndicatorType::Ema(span) => write!(f, "EMA({})", span),
            IndicatorType::Rsi(period) => write!(f, "RSI({})", period),
            IndicatorType::Stddev(period) => write!(f, "STDDEV({})", period),
            IndicatorType::Vwap(window) => write!(f, "VWAP({})", window),
            IndicatorType::Macd { fast, slow, signal } => {
                write!(f, "MACD({},{},{})", fast, slow, signal)
            }
            IndicatorType::Bollinger {
                period,
                stddev_mult_x100,
            } => {
                let mult = *stddev_mult_x100 as f64 / 100.0;
                write!(f, "BOLLINGER({},{})", period, mult)
            }
            IndicatorType::Support { window, touches } => {
                write!(f, "SUPPORT({},{})", window, touches)
            }
            IndicatorType::Resistance { window, touches } => {
                write!(f, "RESISTANCE({},{})", window, touches)
            }
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct IndicatorSeries {
    pub indicator_type: IndicatorType,
    pub values: Vec<IndicatorPoint>,
}

impl IndicatorSeries {
    pub(crate) fn from_options(
        indicator_type: IndicatorType,
        series: &PriceSeries,
        values: impl IntoIterator<Item = Option<IndicatorValue>>,
    ) -> Self {
        let values = series
            .bars()
            .iter()
            .zip(values)
            .map(|(bar, value)| IndicatorPoint {
                timestamp: bar.timestamp,
                value,
            })
            .collect();
        Self {
            indicator_type,
            values,
        }
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// Scalar value at `index`, `None` during warm-up or for multi-valued indicators.
    pub fn simple_at(&self, index: usize) -> Option<f64> {
        match self.values.get(index)?.value? {
            IndicatorValue::Simple(v) => Some(v),
            _ => None,
        }
    }

    /// MACD histogram at `index`.
    pub fn histogram_at(&self, index: usize) -> Option<f64> {
        match self.values.get(index)?.value? {
            IndicatorValue::Macd { histogram, .. } => Some(histogram),
            _ => None,
        }
    }

    /// Bollinger `(upper, middle, lower)` at `index`.
    pub fn bands_at(&self, index: usize) -> Option<(f64, f64, f64)> {
        match self.values.get(index)?.value? {
            IndicatorValue::Bollinger {
                upper,
                middle,
                lower,
            } => Some((upper, middle, lower)),
            _ => None,
        }
    }

    /// Flatten into named scalar columns for charting.
    ///
    /// MACD yields `line`, `signal`, `histogram`; Bollinger yields `upper`,
    /// `middle`, `lower` and `width`.
    pub fn columns(&self) -> Vec<IndicatorColumn> {
        match self.indicator_type {
            IndicatorType::Macd { .. } => vec![
                self.column("line", |v| match v {
                    IndicatorValue::Macd { line, .. } => Some(*line),
                    _ => None,
                }),
                self.column("signal", |v| match v {
                    IndicatorValue::Macd { signal, .. } => Some(*signal),
                    _ => None,
                }),
                self.column("histogram", |v| match v {
                    IndicatorValue::Macd { histogram, .. } => Some(*histogram),
                    _ => None,
                }),
            ],
            IndicatorType::Bollinger { .. } => vec![
                self.column("upper", |v| match v {
                    IndicatorValue::Bollinger { upper, .. } => Some(*upper),
                    _ => None,
                }),
                self.column("middle", |v| match v {
                    IndicatorValue::Bollinger { middle, .. } => Some(*middle),
                    _ => None,
                }),
                self.column("lower", |v| match v {
                    IndicatorValue::Bollinger { lower, .. } => Some(*lower),
                    _ => None,
                }),
                self.column("width", |v| match v {
                    IndicatorValue::Bollinger { upper, lower, .. } => Some(upper - lower),
                    _ => None,
                }),
            ],
            _ => vec![self.column("", |v| match v {
                IndicatorValue::Simple(x) => Some(*x),
                _ => None,
            })],
        }
    }

    fn column<F>(&self, suffix: &str, extract: F) -> IndicatorColumn
    where
        F: Fn(&IndicatorValue) -> Option<f64>,
    {
        let name = if suffix.is_empty() {
            self.indicator_type.to_string()
        } else {
            format!("{}.{}", self.indicator_type, suffix)
        };
        IndicatorColumn {
            name,
            values: self
                .values
                .iter()
                .map(|p| p.value.as_ref().and_then(&extract))
                .collect(),
        }
    }
}

/// A named scalar column aligned 1:1 with the bars of a frame.
#[derive(Debug, Clone, PartialEq)]
pub struct IndicatorColumn {
    pub name: String,
    pub values: Vec<Option<f64>>,
}

/// A price series and the indicators a strategy computed on it.
#[derive(Debug, Clone, PartialEq)]
pub struct IndicatorFrame {
    pub series: PriceSeries,
    pub indicators: Vec<IndicatorSeries>,
}

impl IndicatorFrame {
    pub fn new(series: PriceSeries) -> Self {
        Self {
            series,
            indicators: Vec::new(),
        }
    }

    pub fn push(&mut self, indicator: IndicatorSeries) {
        self.indicators.push(indicator);
    }

    pub fn get(&self, indicator_type: &IndicatorType) -> Option<&IndicatorSeries> {
        self.indicators
            .iter()
            .find(|s| &s.indicator_type == indicator_type)
    }

    pub fn columns(&self) -> Vec<IndicatorColumn> {
        self.indicators.iter().flat_map(|s| s.columns()).collect()
    }
}

/// Fail with `InvalidParameter` for a zero window.
pub(crate) fn require_window(
    indicator_type: &IndicatorType,
    window: usize,
) -> Result<(), SigtraderError> {
    if window == 0 {
        return Err(SigtraderError::invalid_parameter(
            indicator_type.to_string(),
            "window must be at least 1",
        ));
    }
    Ok(())
}

/// Fail with `InsufficientData` when fewer than `minimum` bars are available.
pub(crate) fn require_bars(
    indicator_type: &IndicatorType,
    bars: usize,
    minimum: usize,
) -> Result<(), SigtraderError> {
    if bars < minimum || bars == 0 {
        return Err(SigtraderError::insufficient(
            indicator_type.to_string(),
            bars,
            minimum.max(1),
        ));
    }
    Ok(())
}
