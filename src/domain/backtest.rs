//! Multi-symbol backtest run.
//!
//! Symbols are processed sequentially in the order given, all against one
//! [`SimulatorState`]. A failure for one symbol (missing data, too few bars)
//! is recorded and the run moves on to the next symbol.

use std::collections::HashMap;

use tracing::{info, warn};

use super::error::SigtraderError;
use super::execution::{simulate_symbol, ExecutionConfig, SimulatorState, SymbolRun};
use super::metrics::RiskMetrics;
use super::ohlcv::PriceSeries;
use super::portfolio::{snapshot, snapshot_live, PortfolioSnapshot};
use super::strategy::{Strategy, StrategyOutput};
use crate::ports::data_port::{LivePricePort, PriceHistoryPort};

#[derive(Debug, Clone, PartialEq)]
pub struct BacktestConfig {
    pub initial_capital: f64,
    pub execution: ExecutionConfig,
    pub strategy: Strategy,
    pub period: String,
    pub interval: String,
    pub risk_free_rate: f64,
    /// Benchmark used for beta; no beta when unset.
    pub market_symbol: Option<String>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct SymbolReport {
    pub symbol: String,
    pub output: StrategyOutput,
    pub run: SymbolRun,
    /// `None` when the series is too short or holds unusable prices.
    pub risk: Option<RiskMetrics>,
}

#[derive(Debug)]
pub struct SymbolFailure {
    pub symbol: String,
    pub error: SigtraderError,
}

#[derive(Debug)]
pub struct BacktestResult {
    pub state: SimulatorState,
    pub reports: Vec<SymbolReport>,
    pub failures: Vec<SymbolFailure>,
}

impl BacktestResult {
    /// Last close of every successfully processed symbol.
    pub fn last_prices(&self) -> HashMap<String, f64> {
        self.reports
            .iter()
            .filter_map(|r| {
                r.output
                    .frame
                    .series
                    .last()
                    .map(|bar| (r.symbol.clone(), bar.close))
            })
            .collect()
    }

    /// Portfolio valued at each symbol's last close.
    pub fn snapshot(&self) -> PortfolioSnapshot {
        snapshot(&self.state, &self.last_prices())
    }

    /// Holdings valued at current quotes from `live`.
    pub fn live_snapshot(&self, live: &dyn LivePricePort) -> PortfolioSnapshot {
        snapshot_live(&self.state, live)
    }
}

/// Run `config.strategy` over every symbol.
///
/// Fails only for run-wide problems (bad capital or strategy parameters);
/// per-symbol problems end up in [`BacktestResult::failures`].
pub fn run_backtest(
    data: &dyn PriceHistoryPort,
    symbols: &[String],
    config: &BacktestConfig,
) -> Result<BacktestResult, SigtraderError> {
    if !(config.initial_capital.is_finite() && config.initial_capital > 0.0) {
        return Err(SigtraderError::invalid_parameter(
            "backtest",
            format!("initial capital {} must be positive", config.initial_capital),
        ));
    }
    let fraction = config.execution.allocation_fraction;
    if !(fraction > 0.0 && fraction <= 1.0) {
        return Err(SigtraderError::invalid_parameter(
            "backtest",
            format!("allocation fraction {} must be in (0, 1]", fraction),
        ));
    }
    config.strategy.validate()?;

    let market = config.market_symbol.as_deref().and_then(|symbol| {
        data.fetch(symbol, &config.period, &config.interval)
            .map_err(|err| warn!(symbol, error = %err, "benchmark unavailable, beta disabled"))
            .ok()
    });

    let mut state = SimulatorState::new(config.initial_capital);
    let mut reports = Vec::new();
    let mut failures = Vec::new();

    for symbol in symbols {
        match run_symbol(data, symbol, config, market.as_ref(), &mut state) {
            Ok(report) => {
                info!(
                    symbol = %symbol,
                    trades = report.run.trades,
                    skipped = report.run.skipped.len(),
                    cash = state.cash,
                    "symbol processed"
                );
                reports.push(report);
            }
            Err(error) => {
                warn!(symbol = %symbol, error = %error, "symbol failed");
                failures.push(SymbolFailure {
                    symbol: symbol.clone(),
                    error,
                });
            }
        }
    }

    Ok(BacktestResult {
        state,
        reports,
        failures,
    })
}

fn run_symbol(
    data: &dyn PriceHistoryPort,
    symbol: &str,
    config: &BacktestConfig,
    market: Option<&PriceSeries>,
    state: &mut SimulatorState,
) -> Result<SymbolReport, SigtraderError> {
    let series = data.fetch(symbol, &config.period, &config.interval)?;
    if series.is_empty() {
        return Err(SigtraderError::DataUnavailable {
            symbol: symbol.to_string(),
            reason: "no bars returned".to_string(),
        });
    }

    let output = config.strategy.generate(&series)?;
    let run = simulate_symbol(state, &series, &output.signals, &config.execution)?;

    let risk = match RiskMetrics::compute(&series, market, config.risk_free_rate) {
        Ok(risk) => Some(risk),
        Err(err) => {
            warn!(symbol, error = %err, "risk metrics unavailable");
            None
        }
    };

    Ok(SymbolReport {
        symbol: symbol.to_string(),
        output,
        run,
        risk,
    })
}
