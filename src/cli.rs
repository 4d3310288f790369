//! CLI definition and dispatch.

use clap::{Parser, Subcommand};
use std::io;
use std::path::{Path, PathBuf};
use std::process::ExitCode;

use crate::adapters::csv_adapter::CsvAdapter;
use crate::adapters::file_config_adapter::FileConfigAdapter;
use crate::adapters::json_ledger_adapter::JsonLedgerAdapter;
use crate::domain::backtest::{run_backtest, BacktestResult};
use crate::domain::config_validation::{load_run_settings, RunOverrides, RunSettings};
use crate::domain::error::SigtraderError;
use crate::domain::ledger::TradeRecord;
use crate::domain::metrics::{format_currency, format_percentage, TradeMetrics};
use crate::domain::strategy::StrategyOutput;
use crate::ports::data_port::{LivePricePort, PriceHistoryPort};
use crate::ports::ledger_port::TradeLogPort;

#[derive(Parser, Debug)]
#[command(name = "sigtrader", about = "Indicator signals and trade simulation")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Simulate a strategy over the configured symbols
    Run {
        #[arg(short, long)]
        config: PathBuf,
        /// MA, RSI, MACD, BB, VWAP or SR
        #[arg(short, long)]
        strategy: Option<String>,
        /// Comma separated symbol list
        #[arg(long)]
        symbols: Option<String>,
        #[arg(long)]
        trade_log: Option<PathBuf>,
    },
    /// Write indicator columns and signals for one symbol as CSV
    Signals {
        #[arg(short, long)]
        config: PathBuf,
        #[arg(long)]
        symbol: String,
        #[arg(short, long)]
        strategy: Option<String>,
    },
    /// Summarise a saved trade log
    Metrics {
        #[arg(long)]
        trade_log: PathBuf,
    },
    /// Validate a run configuration
    Validate {
        #[arg(short, long)]
        config: PathBuf,
    },
}

pub fn run(cli: Cli) -> ExitCode {
    match cli.command {
        Command::Run {
            config,
            strategy,
            symbols,
            trade_log,
        } => run_simulation(
            &config,
            RunOverrides {
                strategy,
                symbols,
                trade_log,
            },
        ),
        Command::Signals {
            config,
            symbol,
            strategy,
        } => run_signals(&config, &symbol, strategy),
        Command::Metrics { trade_log } => run_metrics(&trade_log),
        Command::Validate { config } => run_validate(&config),
    }
}

pub fn load_config(path: &Path) -> Result<FileConfigAdapter, ExitCode> {
    FileConfigAdapter::from_file(path).map_err(|e| {
        eprintln!("error: {e}");
        ExitCode::from(&e)
    })
}

fn load_settings(config_path: &Path, overrides: &RunOverrides) -> Result<RunSettings, ExitCode> {
    eprintln!("Loading config from {}", config_path.display());
    let adapter = load_config(config_path)?;
    load_run_settings(&adapter, overrides).map_err(|e| {
        eprintln!("error: {e}");
        ExitCode::from(&e)
    })
}

fn run_simulation(config_path: &Path, overrides: RunOverrides) -> ExitCode {
    let settings = match load_settings(config_path, &overrides) {
        Ok(s) => s,
        Err(code) => return code,
    };
    let bt = &settings.backtest;

    eprintln!(
        "Running {} on {} symbols ({} at {})",
        bt.strategy.kind(),
        settings.symbols.len(),
        bt.period,
        bt.interval,
    );

    let data = CsvAdapter::new(settings.csv_dir.clone());
    let result = match run_backtest(&data, &settings.symbols, bt) {
        Ok(r) => r,
        Err(e) => {
            eprintln!("error: {e}");
            return (&e).into();
        }
    };

    print_status(&result, &data);

    let log = JsonLedgerAdapter::new(&settings.trade_log);
    if let Err(e) = log.save(&result.state.ledger) {
        eprintln!("error: {e}");
        return (&e).into();
    }
    eprintln!("\nTrade log written to: {}", log.path().display());

    if result.reports.is_empty() {
        eprintln!("error: no symbols could be processed");
        return ExitCode::from(5);
    }
    ExitCode::SUCCESS
}

fn print_status(result: &BacktestResult, live: &dyn LivePricePort) {
    let snapshot = result.live_snapshot(live);

    println!("=== Portfolio ===");
    println!("Cash:             {}", format_currency(snapshot.cash));
    for (symbol, shares) in &snapshot.positions {
        println!("  {}: {} shares", symbol, shares);
    }
    println!("Total Value:      {}", format_currency(snapshot.total_value));
    if !snapshot.unpriced.is_empty() {
        println!("Unpriced:         {}", snapshot.unpriced.join(", "));
    }

    println!("\n=== Per-Symbol Summary ===");
    for report in &result.reports {
        println!(
            "  {}:  {} bars, {} trades",
            report.symbol,
            report.output.frame.series.len(),
            report.run.trades,
        );
        if let Some(risk) = &report.risk {
            println!(
                "    return {}, volatility {}, max drawdown {}",
                format_percentage(risk.total_return),
                format_percentage(risk.volatility),
                format_percentage(risk.max_drawdown),
            );
            let sharpe = risk
                .sharpe_ratio
                .map_or_else(|| "n/a".to_string(), |s| format!("{:.2}", s));
            match risk.beta {
                Some(beta) => println!("    sharpe {}, beta {:.2}", sharpe, beta),
                None => println!("    sharpe {}", sharpe),
            }
        }
        for skipped in &report.run.skipped {
            println!(
                "    skipped {} at {}: {}",
                skipped.timestamp, skipped.price, skipped.reason
            );
        }
    }
    for failure in &result.failures {
        println!("  {}:  failed ({})", failure.symbol, failure.error);
    }

    println!();
    print_trade_metrics(&result.state.ledger);
}

fn print_trade_metrics(ledger: &[TradeRecord]) {
    println!("=== Trades ===");
    match TradeMetrics::compute(ledger) {
        Some(m) => {
            println!("Total Trades:     {}", m.total_trades);
            println!("Profitable:       {}", m.profitable_trades);
            println!("Total Profit:     {}", format_currency(m.total_profit));
            println!("Avg Per Trade:    {}", format_currency(m.avg_profit_per_trade));
            println!("Win Rate:         {}", format_percentage(m.win_rate * 100.0));
        }
        None => println!("No trades recorded"),
    }
}

fn run_signals(config_path: &Path, symbol: &str, strategy: Option<String>) -> ExitCode {
    let overrides = RunOverrides {
        strategy,
        symbols: Some(symbol.to_string()),
        trade_log: None,
    };
    let settings = match load_settings(config_path, &overrides) {
        Ok(s) => s,
        Err(code) => return code,
    };
    let bt = &settings.backtest;

    let data = CsvAdapter::new(settings.csv_dir.clone());
    let result = settings
        .symbols
        .first()
        .ok_or_else(|| SigtraderError::invalid_parameter("signals", "no symbol given"))
        .and_then(|symbol| data.fetch(symbol, &bt.period, &bt.interval))
        .and_then(|series| bt.strategy.generate(&series))
        .and_then(|output| write_signals_csv(&output, io::stdout()));

    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("error: {e}");
            (&e).into()
        }
    }
}

/// One row per bar: timestamp, close, every indicator column, signal.
pub fn write_signals_csv<W: io::Write>(
    output: &StrategyOutput,
    writer: W,
) -> Result<(), SigtraderError> {
    let csv_error = |e: csv::Error| SigtraderError::Io(e.into());
    let columns = output.frame.columns();
    let mut wtr = csv::Writer::from_writer(writer);

    let mut header = vec!["timestamp".to_string(), "close".to_string()];
    header.extend(columns.iter().map(|c| c.name.clone()));
    header.push("signal".to_string());
    wtr.write_record(&header).map_err(csv_error)?;

    for (i, (bar, signal)) in output
        .frame
        .series
        .bars()
        .iter()
        .zip(&output.signals)
        .enumerate()
    {
        let mut row = vec![bar.timestamp.to_string(), bar.close.to_string()];
        row.extend(columns.iter().map(|c| {
            c.values
                .get(i)
                .copied()
                .flatten()
                .map(|v| v.to_string())
                .unwrap_or_default()
        }));
        row.push(signal.to_string());
        wtr.write_record(&row).map_err(csv_error)?;
    }

    wtr.flush()?;
    Ok(())
}

fn run_metrics(trade_log: &Path) -> ExitCode {
    let log = JsonLedgerAdapter::new(trade_log);
    match log.load() {
        Ok(ledger) => {
            print_trade_metrics(&ledger);
            ExitCode::SUCCESS
        }
        Err(e) => {
            eprintln!("error: {e}");
            (&e).into()
        }
    }
}

fn run_validate(config_path: &Path) -> ExitCode {
    let settings = match load_settings(config_path, &RunOverrides::default()) {
        Ok(s) => s,
        Err(code) => return code,
    };
    let bt = &settings.backtest;

    eprintln!("\nStrategy:  {:?}", bt.strategy);
    eprintln!("Symbols:   {}", settings.symbols.join(", "));
    eprintln!("Capital:   {}", format_currency(bt.initial_capital));
    eprintln!(
        "Allocation: {}",
        format_percentage(bt.execution.allocation_fraction * 100.0)
    );
    eprintln!("History:   {} at {}", bt.period, bt.interval);
    if let Some(market) = &bt.market_symbol {
        eprintln!("Benchmark: {}", market);
    }
    eprintln!("Data:      {}", settings.csv_dir.display());
    eprintln!("Trade log: {}", settings.trade_log.display());

    eprintln!("\nConfiguration is valid.");
    ExitCode::SUCCESS
}
