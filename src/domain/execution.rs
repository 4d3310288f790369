//! Trade simulation.
//!
//! A per-symbol FLAT/LONG state machine driven by the signal series:
//! - BUY while not long: buy `floor(cash * allocation_fraction / close)` shares
//!   if that is at least one share.
//! - SELL while holding shares: sell the whole position at the close.
//! - Anything else is a no-op.
//!
//! Cash is shared by every symbol simulated against the same
//! [`SimulatorState`], so the order symbols are processed in decides how much
//! each BUY can allocate.

use std::collections::BTreeMap;

use chrono::NaiveDateTime;
use tracing::{debug, warn};

use super::error::SigtraderError;
use super::ledger::TradeRecord;
use super::ohlcv::{OhlcvBar, PriceSeries};
use super::position::Position;
use super::signal::Signal;

#[derive(Debug, Clone, PartialEq)]
pub struct ExecutionConfig {
    /// Share of current cash committed by each BUY.
    pub allocation_fraction: f64,
}

impl Default for ExecutionConfig {
    fn default() -> Self {
        ExecutionConfig {
            allocation_fraction: 0.10,
        }
    }
}

/// Cash, positions and the trade ledger of one simulation run.
#[derive(Debug, Clone, PartialEq)]
pub struct SimulatorState {
    pub cash: f64,
    pub initial_capital: f64,
    pub positions: BTreeMap<String, Position>,
    pub ledger: Vec<TradeRecord>,
}

impl SimulatorState {
    pub fn new(initial_capital: f64) -> Self {
        SimulatorState {
            cash: initial_capital,
            initial_capital,
            positions: BTreeMap::new(),
            ledger: Vec::new(),
        }
    }

    pub fn position(&self, symbol: &str) -> Option<&Position> {
        self.positions.get(symbol)
    }

    pub fn shares(&self, symbol: &str) -> u64 {
        self.position(symbol).map_or(0, |p| p.shares)
    }
}

/// A bar whose trade was rejected and skipped.
#[derive(Debug, Clone, PartialEq)]
pub struct SkippedBar {
    pub symbol: String,
    pub timestamp: NaiveDateTime,
    pub price: f64,
    pub reason: String,
}

/// Outcome of simulating one symbol.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct SymbolRun {
    pub trades: usize,
    pub skipped: Vec<SkippedBar>,
}

/// Apply one signal at one bar.
///
/// Returns the trade made, if any. Fails with `InvalidPrice` only when the
/// signal would have traded at a non-positive or non-finite close; the state
/// is left untouched in that case.
pub fn apply_signal(
    state: &mut SimulatorState,
    symbol: &str,
    bar: &OhlcvBar,
    signal: Signal,
    config: &ExecutionConfig,
) -> Result<Option<TradeRecord>, SigtraderError> {
    let price = bar.close;
    let check_price = || {
        if price.is_finite() && price > 0.0 {
            Ok(())
        } else {
            Err(SigtraderError::InvalidPrice {
                symbol: symbol.to_string(),
                timestamp: bar.timestamp,
                price,
            })
        }
    };

    let trade = match signal {
        Signal::Hold => None,
        Signal::Buy => {
            if state.position(symbol).is_some_and(Position::is_long) {
                return Ok(None);
            }
            check_price()?;
            let shares = (state.cash * config.allocation_fraction / price).floor();
            if shares < 1.0 {
                debug!(symbol, cash = state.cash, price, "allocation too small for one share");
                return Ok(None);
            }
            let trade = TradeRecord::buy(bar.timestamp, symbol, shares as u64, price);
            state.cash -= shares * price;
            state
                .positions
                .entry(symbol.to_string())
                .or_insert_with(|| Position::flat(symbol))
                .open(shares as u64);
            Some(trade)
        }
        Signal::Sell => {
            if state.shares(symbol) == 0 {
                return Ok(None);
            }
            check_price()?;
            let Some(position) = state.positions.get_mut(symbol) else {
                return Ok(None);
            };
            let shares = position.close();
            let trade = TradeRecord::sell(bar.timestamp, symbol, shares, price);
            state.cash += shares as f64 * price;
            Some(trade)
        }
    };

    if let Some(trade) = &trade {
        debug!(
            symbol,
            side = ?trade.side,
            shares = trade.shares,
            price,
            cash = state.cash,
            "trade executed"
        );
        state.ledger.push(trade.clone());
    }
    Ok(trade)
}

/// Run the state machine over every bar of one symbol.
///
/// Bars rejected with `InvalidPrice` are logged, recorded in
/// [`SymbolRun::skipped`] and the run continues.
pub fn simulate_symbol(
    state: &mut SimulatorState,
    series: &PriceSeries,
    signals: &[Signal],
    config: &ExecutionConfig,
) -> Result<SymbolRun, SigtraderError> {
    if signals.len() != series.len() {
        return Err(SigtraderError::invalid_parameter(
            format!("simulate {}", series.symbol()),
            format!(
                "{} signals for {} bars",
                signals.len(),
                series.len()
            ),
        ));
    }

    let symbol = series.symbol();
    let mut run = SymbolRun::default();
    for (bar, &signal) in series.bars().iter().zip(signals) {
        match apply_signal(state, symbol, bar, signal, config) {
            Ok(Some(_)) => run.trades += 1,
            Ok(None) => {}
            Err(err @ SigtraderError::InvalidPrice { .. }) => {
                warn!(symbol, timestamp = %bar.timestamp, error = %err, "skipping bar");
                run.skipped.push(SkippedBar {
                    symbol: symbol.to_string(),
                    timestamp: bar.timestamp,
                    price: bar.close,
                    reason: err.to_string(),
                });
            }
            Err(err) => return Err(err),
        }
    }
    Ok(run)
}
