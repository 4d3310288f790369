//! Configuration validation.
//!
//! Reads every run setting through [`ConfigPort`], applies command-line
//! overrides and checks all values before a run starts.

use std::fmt::Display;
use std::path::PathBuf;
use std::str::FromStr;

use crate::domain::backtest::BacktestConfig;
use crate::domain::error::SigtraderError;
use crate::domain::execution::ExecutionConfig;
use crate::domain::period::{validate_interval, Lookback};
use crate::domain::strategy::{Strategy, StrategyKind};
use crate::domain::universe::parse_symbols;
use crate::ports::config_port::ConfigPort;

pub const DEFAULT_INITIAL_CAPITAL: f64 = 10_000.0;
pub const DEFAULT_PERIOD: &str = "1mo";
pub const DEFAULT_INTERVAL: &str = "1d";
pub const DEFAULT_RISK_FREE_RATE: f64 = 0.01;
pub const DEFAULT_CSV_DIR: &str = "data";
pub const DEFAULT_TRADE_LOG: &str = "trade_log.json";

/// Values given on the command line take precedence over the file.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RunOverrides {
    pub strategy: Option<String>,
    pub symbols: Option<String>,
    pub trade_log: Option<PathBuf>,
}

/// A fully validated run.
#[derive(Debug, Clone, PartialEq)]
pub struct RunSettings {
    pub symbols: Vec<String>,
    pub backtest: BacktestConfig,
    pub csv_dir: PathBuf,
    pub trade_log: PathBuf,
}

pub fn validate_run_config(config: &dyn ConfigPort) -> Result<(), SigtraderError> {
    load_run_settings(config, &RunOverrides::default()).map(|_| ())
}

pub fn load_run_settings(
    config: &dyn ConfigPort,
    overrides: &RunOverrides,
) -> Result<RunSettings, SigtraderError> {
    let symbols = load_symbols(config, overrides)?;

    let strategy_name = overrides
        .strategy
        .clone()
        .or_else(|| config.get_string("run", "strategy"))
        .ok_or_else(|| missing("run", "strategy"))?;
    let kind: StrategyKind = strategy_name.parse()?;
    let strategy = load_strategy(config, kind)?;

    let initial_capital = parse_value(config, "run", "initial_capital", DEFAULT_INITIAL_CAPITAL)?;
    if !(initial_capital.is_finite() && initial_capital > 0.0) {
        return Err(invalid("run", "initial_capital", "initial_capital must be positive"));
    }

    let allocation_fraction = parse_value(
        config,
        "run",
        "allocation_fraction",
        ExecutionConfig::default().allocation_fraction,
    )?;
    if !(allocation_fraction > 0.0 && allocation_fraction <= 1.0) {
        return Err(invalid(
            "run",
            "allocation_fraction",
            "allocation_fraction must be in (0, 1]",
        ));
    }

    let risk_free_rate = parse_value(config, "run", "risk_free_rate", DEFAULT_RISK_FREE_RATE)?;
    if !(0.0..1.0).contains(&risk_free_rate) {
        return Err(invalid(
            "run",
            "risk_free_rate",
            "risk_free_rate must be between 0 and 1",
        ));
    }

    let period = config
        .get_string("run", "period")
        .unwrap_or_else(|| DEFAULT_PERIOD.to_string());
    period
        .parse::<Lookback>()
        .map_err(|e| invalid("run", "period", e))?;

    let interval = config
        .get_string("run", "interval")
        .unwrap_or_else(|| DEFAULT_INTERVAL.to_string());
    validate_interval(&interval).map_err(|e| invalid("run", "interval", e))?;

    let market_symbol = match config.get_string("run", "market_symbol") {
        Some(raw) => {
            let mut parsed =
                parse_symbols(&raw).map_err(|e| invalid("run", "market_symbol", e))?;
            if parsed.len() != 1 {
                return Err(invalid("run", "market_symbol", "expected a single symbol"));
            }
            parsed.pop()
        }
        None => None,
    };

    let csv_dir = config
        .get_string("data", "csv_dir")
        .unwrap_or_else(|| DEFAULT_CSV_DIR.to_string());
    let trade_log = overrides.trade_log.clone().unwrap_or_else(|| {
        config
            .get_string("output", "trade_log")
            .unwrap_or_else(|| DEFAULT_TRADE_LOG.to_string())
            .into()
    });

    Ok(RunSettings {
        symbols,
        backtest: BacktestConfig {
            initial_capital,
            execution: ExecutionConfig {
                allocation_fraction,
            },
            strategy,
            period,
            interval,
            risk_free_rate,
            market_symbol,
        },
        csv_dir: csv_dir.into(),
        trade_log,
    })
}

fn load_symbols(
    config: &dyn ConfigPort,
    overrides: &RunOverrides,
) -> Result<Vec<String>, SigtraderError> {
    let raw = overrides
        .symbols
        .clone()
        .or_else(|| config.get_string("run", "symbols"))
        .ok_or_else(|| missing("run", "symbols"))?;
    parse_symbols(&raw).map_err(|e| invalid("run", "symbols", e))
}

/// Parameters for `kind` from its section, stock values for absent keys.
pub fn load_strategy(
    config: &dyn ConfigPort,
    kind: StrategyKind,
) -> Result<Strategy, SigtraderError> {
    let strategy = match Strategy::default_for(kind) {
        Strategy::MaCrossover {
            short_window,
            long_window,
        } => {
            let short_window = parse_window(config, "ma", "short_window", short_window)?;
            let long_window = parse_window(config, "ma", "long_window", long_window)?;
            if short_window >= long_window {
                return Err(invalid(
                    "ma",
                    "short_window",
                    "short_window must be below long_window",
                ));
            }
            Strategy::MaCrossover {
                short_window,
                long_window,
            }
        }
        Strategy::Rsi {
            period,
            overbought,
            oversold,
        } => Strategy::Rsi {
            period: parse_window(config, "rsi", "period", period)?,
            overbought: parse_value(config, "rsi", "overbought", overbought)?,
            oversold: parse_value(config, "rsi", "oversold", oversold)?,
        },
        Strategy::Macd { fast, slow, signal } => {
            let fast = parse_window(config, "macd", "fast", fast)?;
            let slow = parse_window(config, "macd", "slow", slow)?;
            if fast >= slow {
                return Err(invalid("macd", "fast", "fast must be below slow"));
            }
            Strategy::Macd {
                fast,
                slow,
                signal: parse_window(config, "macd", "signal", signal)?,
            }
        }
        Strategy::Bollinger { window, num_std } => Strategy::Bollinger {
            window: parse_window(config, "bollinger", "window", window)?,
            num_std: parse_value(config, "bollinger", "num_std", num_std)?,
        },
        Strategy::Vwap { window } => Strategy::Vwap {
            window: parse_window(config, "vwap", "window", window)?,
        },
        Strategy::SupportResistance {
            window,
            num_touches,
        } => Strategy::SupportResistance {
            window: parse_window(config, "sr", "window", window)?,
            num_touches: parse_window(config, "sr", "num_touches", num_touches)?,
        },
    };

    strategy.validate().map_err(|e| match e {
        SigtraderError::InvalidParameter { reason, .. } => SigtraderError::ConfigInvalid {
            section: section_for(kind).to_string(),
            key: "parameters".to_string(),
            reason,
        },
        other => other,
    })?;
    Ok(strategy)
}

fn section_for(kind: StrategyKind) -> &'static str {
    match kind {
        StrategyKind::Ma => "ma",
        StrategyKind::Rsi => "rsi",
        StrategyKind::Macd => "macd",
        StrategyKind::Bb => "bollinger",
        StrategyKind::Vwap => "vwap",
        StrategyKind::Sr => "sr",
    }
}

fn parse_value<T>(
    config: &dyn ConfigPort,
    section: &str,
    key: &str,
    default: T,
) -> Result<T, SigtraderError>
where
    T: FromStr,
    T::Err: Display,
{
    match config.get_string(section, key) {
        None => Ok(default),
        Some(raw) => raw
            .parse()
            .map_err(|e| invalid(section, key, format!("'{}': {}", raw, e))),
    }
}

fn parse_window(
    config: &dyn ConfigPort,
    section: &str,
    key: &str,
    default: usize,
) -> Result<usize, SigtraderError> {
    let value = parse_value(config, section, key, default)?;
    if value == 0 {
        return Err(invalid(section, key, format!("{} must be at least 1", key)));
    }
    Ok(value)
}

fn missing(section: &str, key: &str) -> SigtraderError {
    SigtraderError::ConfigMissing {
        section: section.to_string(),
        key: key.to_string(),
    }
}

fn invalid(section: &str, key: &str, reason: impl Display) -> SigtraderError {
    SigtraderError::ConfigInvalid {
        section: section.to_string(),
        key: key.to_string(),
        reason: reason.to_string(),
    }
}
