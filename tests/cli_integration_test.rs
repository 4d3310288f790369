//! CLI integration tests.
//!
//! Tests cover:
//! - Argument parsing for every subcommand
//! - `run` against CSV files on disk, writing the JSON trade log
//! - `validate` and `metrics` exit statuses
//! - `write_signals_csv` output shape for each strategy

mod common;

use clap::Parser;
use common::*;
use sigtrader::cli::{self, write_signals_csv, Cli, Command};
use sigtrader::domain::error::SigtraderError;
use sigtrader::domain::ledger::TradeSide;
use sigtrader::domain::strategy::{Strategy, StrategyKind};
use std::fs;
use std::path::Path;
use std::process::ExitCode;
use tempfile::TempDir;

// ExitCode has no PartialEq; compare the debug form.
fn same_code(a: ExitCode, b: ExitCode) -> bool {
    format!("{:?}", a) == format!("{:?}", b)
}

fn write_csv(dir: &Path, symbol: &str, closes: &[f64]) {
    let mut content = String::from("timestamp,open,high,low,close,volume\n");
    for bar in bars_from_closes(closes) {
        content.push_str(&format!(
            "{},{},{},{},{},{}\n",
            bar.timestamp.date(),
            bar.open,
            bar.high,
            bar.low,
            bar.close,
            bar.volume
        ));
    }
    fs::write(dir.join(format!("{}_1d.csv", symbol)), content).unwrap();
}

fn write_ini(dir: &Path, run_section: &str) -> std::path::PathBuf {
    let path = dir.join("run.ini");
    let content = format!(
        "[run]\n{}\nperiod = max\n\n[data]\ncsv_dir = {}\n\n[output]\ntrade_log = {}\n\n[ma]\nshort_window = 5\nlong_window = 10\n",
        run_section,
        dir.display(),
        dir.join("trades.json").display()
    );
    fs::write(&path, content).unwrap();
    path
}

fn parse(args: &[&str]) -> Cli {
    let mut argv = vec!["sigtrader"];
    argv.extend_from_slice(args);
    Cli::try_parse_from(argv).unwrap()
}

mod parsing {
    use super::*;

    #[test]
    fn signals_requires_symbol() {
        assert!(Cli::try_parse_from(["sigtrader", "signals", "--config", "x.ini"]).is_err());
    }

    #[test]
    fn metrics_takes_trade_log() {
        match parse(&["metrics", "--trade-log", "t.json"]).command {
            Command::Metrics { trade_log } => assert_eq!(trade_log, Path::new("t.json")),
            other => panic!("unexpected {:?}", other),
        }
    }

    #[test]
    fn unknown_subcommand_rejected() {
        assert!(Cli::try_parse_from(["sigtrader", "serve"]).is_err());
    }
}

mod run_command {
    use super::*;

    #[test]
    fn run_writes_trade_log() {
        let dir = TempDir::new().unwrap();
        write_csv(dir.path(), "AAA", &ramp_closes());
        let ini = write_ini(dir.path(), "symbols = AAA\nstrategy = MA");

        let code = cli::run(parse(&["run", "--config", ini.to_str().unwrap()]));
        assert!(same_code(code, ExitCode::SUCCESS));

        let text = fs::read_to_string(dir.path().join("trades.json")).unwrap();
        let trades: Vec<sigtrader::domain::ledger::TradeRecord> =
            serde_json::from_str(&text).unwrap();
        assert_eq!(trades.len(), 2);
        assert_eq!(trades[0].side, TradeSide::Buy);
        assert_eq!(trades[1].side, TradeSide::Sell);
    }

    #[test]
    fn trade_log_flag_overrides_config() {
        let dir = TempDir::new().unwrap();
        write_csv(dir.path(), "AAA", &ramp_closes());
        let ini = write_ini(dir.path(), "symbols = AAA\nstrategy = MA");
        let alt = dir.path().join("nested").join("alt.json");

        let code = cli::run(parse(&[
            "run",
            "--config",
            ini.to_str().unwrap(),
            "--trade-log",
            alt.to_str().unwrap(),
        ]));
        assert!(same_code(code, ExitCode::SUCCESS));
        assert!(alt.exists());
        assert!(!dir.path().join("trades.json").exists());
    }

    #[test]
    fn unknown_strategy_exit_code() {
        let dir = TempDir::new().unwrap();
        let ini = write_ini(dir.path(), "symbols = AAA\nstrategy = MA");

        let code = cli::run(parse(&[
            "run",
            "--config",
            ini.to_str().unwrap(),
            "--strategy",
            "ichimoku",
        ]));
        assert!(same_code(code, ExitCode::from(3)));
    }

    #[test]
    fn no_processable_symbol_is_data_error() {
        let dir = TempDir::new().unwrap();
        let ini = write_ini(dir.path(), "symbols = NODATA\nstrategy = MA");

        let code = cli::run(parse(&["run", "--config", ini.to_str().unwrap()]));
        assert!(same_code(code, ExitCode::from(5)));
    }

    #[test]
    fn missing_config_file_is_config_error() {
        let dir = TempDir::new().unwrap();
        let absent = dir.path().join("absent.ini");
        let code = cli::run(parse(&["run", "--config", absent.to_str().unwrap()]));
        assert!(same_code(code, ExitCode::from(2)));
    }
}

mod other_commands {
    use super::*;

    #[test]
    fn validate_accepts_good_config() {
        let dir = TempDir::new().unwrap();
        let ini = write_ini(dir.path(), "symbols = AAA,MSFT\nstrategy = rsi");
        let code = cli::run(parse(&["validate", "--config", ini.to_str().unwrap()]));
        assert!(same_code(code, ExitCode::SUCCESS));
    }

    #[test]
    fn validate_rejects_bad_capital() {
        let dir = TempDir::new().unwrap();
        let ini = write_ini(
            dir.path(),
            "symbols = AAA\nstrategy = MA\ninitial_capital = -5",
        );
        let code = cli::run(parse(&["validate", "--config", ini.to_str().unwrap()]));
        assert!(same_code(code, ExitCode::from(2)));
    }

    #[test]
    fn metrics_on_missing_log_succeeds() {
        let dir = TempDir::new().unwrap();
        let log = dir.path().join("none.json");
        let code = cli::run(parse(&["metrics", "--trade-log", log.to_str().unwrap()]));
        assert!(same_code(code, ExitCode::SUCCESS));
    }

    #[test]
    fn metrics_on_malformed_log_fails() {
        let dir = TempDir::new().unwrap();
        let log = dir.path().join("bad.json");
        fs::write(&log, "[{").unwrap();
        let code = cli::run(parse(&["metrics", "--trade-log", log.to_str().unwrap()]));
        assert!(same_code(code, ExitCode::from(1)));
    }
}

mod signals_output {
    use super::*;

    #[test]
    fn one_row_per_bar_for_every_strategy() {
        let closes: Vec<f64> = (0..80)
            .map(|i| 100.0 + 8.0 * (i as f64 / 5.0).sin())
            .collect();
        let series = series("AAA", &closes);

        for kind in StrategyKind::ALL {
            let output = Strategy::default_for(kind).generate(&series).unwrap();
            let mut buf = Vec::new();
            write_signals_csv(&output, &mut buf).unwrap();

            let mut rdr = csv::Reader::from_reader(buf.as_slice());
            let header = rdr.headers().unwrap().clone();
            assert_eq!(&header[0], "timestamp");
            assert_eq!(&header[header.len() - 1], "signal");

            let rows: Vec<csv::StringRecord> = rdr.records().map(|r| r.unwrap()).collect();
            assert_eq!(rows.len(), closes.len(), "{}", kind);
            for row in &rows {
                assert!(matches!(&row[row.len() - 1], "BUY" | "SELL" | "HOLD"));
            }
        }
    }

    struct BrokenPipe;

    impl std::io::Write for BrokenPipe {
        fn write(&mut self, _: &[u8]) -> std::io::Result<usize> {
            Err(std::io::Error::new(std::io::ErrorKind::BrokenPipe, "closed"))
        }

        fn flush(&mut self) -> std::io::Result<()> {
            Ok(())
        }
    }

    #[test]
    fn write_failure_is_io_error() {
        let output = Strategy::default_for(StrategyKind::Ma)
            .generate(&series("AAA", &ramp_closes()))
            .unwrap();

        let err = write_signals_csv(&output, BrokenPipe).unwrap_err();
        assert!(matches!(err, SigtraderError::Io(_)));
        assert!(same_code((&err).into(), ExitCode::from(1)));
    }

    #[test]
    fn bollinger_columns_include_width() {
        let closes: Vec<f64> = (0..30).map(|i| 50.0 + (i % 4) as f64).collect();
        let output = Strategy::default_for(StrategyKind::Bb)
            .generate(&series("AAA", &closes))
            .unwrap();

        let mut buf = Vec::new();
        write_signals_csv(&output, &mut buf).unwrap();
        let mut rdr = csv::Reader::from_reader(buf.as_slice());
        let header = rdr.headers().unwrap().clone();

        assert!(header.iter().any(|h| h.ends_with(".width")));
        assert!(header.iter().any(|h| h.ends_with(".upper")));
    }
}
