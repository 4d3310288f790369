//! Core domain types and logic.

pub mod ohlcv;
pub mod indicator;
pub mod signal;
pub mod strategy;
pub mod position;
pub mod ledger;
pub mod execution;
pub mod portfolio;
pub mod metrics;
pub mod backtest;
pub mod period;
pub mod universe;
pub mod config_validation;
pub mod error;
