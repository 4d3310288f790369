//! CSV file price data adapter.
//!
//! One file per symbol and interval, `<dir>/<SYMBOL>_<interval>.csv`, with a
//! `timestamp,open,high,low,close,volume` header. Timestamps are either
//! `YYYY-MM-DD` or `YYYY-MM-DD HH:MM:SS`.

use crate::domain::error::SigtraderError;
use crate::domain::ohlcv::{OhlcvBar, PriceSeries};
use crate::domain::period::{validate_interval, Lookback};
use crate::ports::data_port::{LivePricePort, PriceHistoryPort};
use chrono::{NaiveDate, NaiveDateTime};
use serde::Deserialize;
use std::fs;
use std::path::PathBuf;
use tracing::debug;

pub struct CsvAdapter {
    base_path: PathBuf,
    live_interval: String,
}

#[derive(Debug, Deserialize)]
struct CsvRow {
    timestamp: String,
    open: f64,
    high: f64,
    low: f64,
    close: f64,
    volume: u64,
}

impl CsvAdapter {
    pub fn new(base_path: PathBuf) -> Self {
        Self {
            base_path,
            live_interval: "1d".to_string(),
        }
    }

    /// Interval whose file answers live-price requests (default `1d`).
    pub fn with_live_interval(mut self, interval: impl Into<String>) -> Self {
        self.live_interval = interval.into();
        self
    }

    fn csv_path(&self, symbol: &str, interval: &str) -> PathBuf {
        self.base_path.join(format!("{}_{}.csv", symbol, interval))
    }

    fn read_bars(&self, symbol: &str, interval: &str) -> Result<Vec<OhlcvBar>, SigtraderError> {
        let unavailable = |reason: String| SigtraderError::DataUnavailable {
            symbol: symbol.to_string(),
            reason,
        };

        let path = self.csv_path(symbol, interval);
        let content = fs::read_to_string(&path)
            .map_err(|e| unavailable(format!("failed to read {}: {}", path.display(), e)))?;

        let mut rdr = csv::ReaderBuilder::new()
            .trim(csv::Trim::All)
            .from_reader(content.as_bytes());
        let mut bars = Vec::new();

        for (line, result) in rdr.deserialize::<CsvRow>().enumerate() {
            let row = result.map_err(|e| unavailable(format!("CSV parse error: {}", e)))?;
            let timestamp = parse_timestamp(&row.timestamp).ok_or_else(|| {
                unavailable(format!(
                    "invalid timestamp '{}' on data row {}",
                    row.timestamp,
                    line + 1
                ))
            })?;
            bars.push(OhlcvBar {
                timestamp,
                open: row.open,
                high: row.high,
                low: row.low,
                close: row.close,
                volume: row.volume,
            });
        }

        if bars.is_empty() {
            return Err(unavailable(format!("{} has no rows", path.display())));
        }

        bars.sort_by_key(|b| b.timestamp);
        Ok(bars)
    }
}

fn parse_timestamp(raw: &str) -> Option<NaiveDateTime> {
    NaiveDateTime::parse_from_str(raw, "%Y-%m-%d %H:%M:%S")
        .or_else(|_| NaiveDateTime::parse_from_str(raw, "%Y-%m-%dT%H:%M:%S"))
        .ok()
        .or_else(|| {
            NaiveDate::parse_from_str(raw, "%Y-%m-%d")
                .ok()
                .and_then(|d| d.and_hms_opt(0, 0, 0))
        })
}

impl PriceHistoryPort for CsvAdapter {
    fn fetch(
        &self,
        symbol: &str,
        period: &str,
        interval: &str,
    ) -> Result<PriceSeries, SigtraderError> {
        validate_interval(interval)?;
        let lookback: Lookback = period.parse()?;
        let mut bars = self.read_bars(symbol, interval)?;

        if let Some(cutoff) = bars.last().and_then(|b| lookback.cutoff(b.timestamp)) {
            bars.retain(|b| b.timestamp >= cutoff);
        }
        debug!(symbol, period, interval, bars = bars.len(), "loaded price history");

        PriceSeries::new(symbol, bars)
    }
}

impl LivePricePort for CsvAdapter {
    fn fetch_live(&self, symbol: &str) -> Result<f64, SigtraderError> {
        let bars = self.read_bars(symbol, &self.live_interval)?;
        bars.last()
            .map(|b| b.close)
            .ok_or_else(|| SigtraderError::DataUnavailable {
                symbol: symbol.to_string(),
                reason: "no bars".to_string(),
            })
    }
}
