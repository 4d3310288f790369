#![allow(dead_code)]

use chrono::{Duration, NaiveDate, NaiveDateTime};
use sigtrader::domain::backtest::BacktestConfig;
use sigtrader::domain::error::SigtraderError;
use sigtrader::domain::execution::ExecutionConfig;
pub use sigtrader::domain::ohlcv::{OhlcvBar, PriceSeries};
use sigtrader::domain::strategy::Strategy;
use sigtrader::ports::data_port::{LivePricePort, PriceHistoryPort};
use std::collections::HashMap;

pub struct MockDataPort {
    pub data: HashMap<String, Vec<OhlcvBar>>,
    pub live: HashMap<String, f64>,
}

impl MockDataPort {
    pub fn new() -> Self {
        Self {
            data: HashMap::new(),
            live: HashMap::new(),
        }
    }

    pub fn with_bars(mut self, symbol: &str, bars: Vec<OhlcvBar>) -> Self {
        self.data.insert(symbol.to_string(), bars);
        self
    }

    pub fn with_closes(self, symbol: &str, closes: &[f64]) -> Self {
        self.with_bars(symbol, bars_from_closes(closes))
    }

    pub fn with_live(mut self, symbol: &str, price: f64) -> Self {
        self.live.insert(symbol.to_string(), price);
        self
    }
}

impl PriceHistoryPort for MockDataPort {
    fn fetch(
        &self,
        symbol: &str,
        _period: &str,
        _interval: &str,
    ) -> Result<PriceSeries, SigtraderError> {
        let bars = self
            .data
            .get(symbol)
            .cloned()
            .ok_or_else(|| SigtraderError::DataUnavailable {
                symbol: symbol.to_string(),
                reason: "not in mock".to_string(),
            })?;
        PriceSeries::new(symbol, bars)
    }
}

impl LivePricePort for MockDataPort {
    fn fetch_live(&self, symbol: &str) -> Result<f64, SigtraderError> {
        self.live
            .get(symbol)
            .copied()
            .ok_or_else(|| SigtraderError::DataUnavailable {
                symbol: symbol.to_string(),
                reason: "no live quote".to_string(),
            })
    }
}

pub fn day(offset: i64) -> NaiveDateTime {
    NaiveDate::from_ymd_opt(2024, 1, 1)
        .unwrap()
        .and_hms_opt(0, 0, 0)
        .unwrap()
        + Duration::days(offset)
}

pub fn make_bar(offset: i64, close: f64) -> OhlcvBar {
    OhlcvBar {
        timestamp: day(offset),
        open: close,
        high: close,
        low: close,
        close,
        volume: 1_000,
    }
}

pub fn bars_from_closes(closes: &[f64]) -> Vec<OhlcvBar> {
    closes
        .iter()
        .enumerate()
        .map(|(i, &close)| make_bar(i as i64, close))
        .collect()
}

pub fn series(symbol: &str, closes: &[f64]) -> PriceSeries {
    PriceSeries::new(symbol, bars_from_closes(closes)).unwrap()
}

/// Flat at 100, up 6 per bar from bar 10 to 130 at bar 15, back down to 100
/// at bar 20, flat until bar 59.
pub fn ramp_closes() -> Vec<f64> {
    (0..60)
        .map(|i| match i {
            10..=15 => 100.0 + 6.0 * (i - 10) as f64,
            16..=20 => 130.0 - 6.0 * (i - 15) as f64,
            _ => 100.0,
        })
        .collect()
}

pub fn ma_config(initial_capital: f64) -> BacktestConfig {
    BacktestConfig {
        initial_capital,
        execution: ExecutionConfig::default(),
        strategy: Strategy::MaCrossover {
            short_window: 5,
            long_window: 10,
        },
        period: "max".to_string(),
        interval: "1d".to_string(),
        risk_free_rate: 0.0,
        market_symbol: None,
    }
}

pub fn symbols(list: &[&str]) -> Vec<String> {
    list.iter().map(|s| s.to_string()).collect()
}
