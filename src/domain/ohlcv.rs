//! OHLCV bar and validated price series.

use chrono::NaiveDateTime;

use super::error::SigtraderError;

#[derive(Debug, Clone, PartialEq)]
pub struct OhlcvBar {
    pub timestamp: NaiveDateTime,
    pub open: f64,
    pub high: f64,
    pub low: f64,
    pub close: f64,
    pub volume: u64,
}

impl OhlcvBar {
    /// (high + low + close) / 3
    pub fn typical_price(&self) -> f64 {
        (self.high + self.low + self.close) / 3.0
    }

    fn check_range(&self) -> Result<(), String> {
        if self.high < self.open.max(self.close).max(self.low) {
            return Err(format!(
                "bar at {}: high {} below open/close/low",
                self.timestamp, self.high
            ));
        }
        if self.low > self.open.min(self.close).min(self.high) {
            return Err(format!(
                "bar at {}: low {} above open/close/high",
                self.timestamp, self.low
            ));
        }
        Ok(())
    }
}

/// Ordered bars for one symbol.
///
/// Construction enforces strictly increasing timestamps and the
/// `low <= open, close <= high` range of every bar.
#[derive(Debug, Clone, PartialEq)]
pub struct PriceSeries {
    symbol: String,
    bars: Vec<OhlcvBar>,
}

impl PriceSeries {
    pub fn new(symbol: impl Into<String>, bars: Vec<OhlcvBar>) -> Result<Self, SigtraderError> {
        for bar in &bars {
            bar.check_range()
                .map_err(|reason| SigtraderError::InvalidSeries { reason })?;
        }
        for pair in bars.windows(2) {
            if pair[1].timestamp <= pair[0].timestamp {
                return Err(SigtraderError::InvalidSeries {
                    reason: format!(
                        "timestamps not strictly increasing: {} then {}",
                        pair[0].timestamp, pair[1].timestamp
                    ),
                });
            }
        }
        Ok(Self {
            symbol: symbol.into(),
            bars,
        })
    }

    pub fn symbol(&self) -> &str {
        &self.symbol
    }

    pub fn bars(&self) -> &[OhlcvBar] {
        &self.bars
    }

    pub fn len(&self) -> usize {
        self.bars.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bars.is_empty()
    }

    pub fn last(&self) -> Option<&OhlcvBar> {
        self.bars.last()
    }

    pub fn closes(&self) -> Vec<f64> {
        self.bars.iter().map(|b| b.close).collect()
    }

    pub fn highs(&self) -> Vec<f64> {
        self.bars.iter().map(|b| b.high).collect()
    }

    pub fn lows(&self) -> Vec<f64> {
        self.bars.iter().map(|b| b.low).collect()
    }
}
