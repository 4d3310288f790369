//! Domain error types.

use chrono::NaiveDateTime;

/// Top-level error type for sigtrader.
#[derive(Debug, thiserror::Error)]
pub enum SigtraderError {
    #[error("insufficient data for {operation}: have {bars} bars, need {minimum}")]
    InsufficientData {
        operation: String,
        bars: usize,
        minimum: usize,
    },

    #[error("invalid price {price} for {symbol} at {timestamp}")]
    InvalidPrice {
        symbol: String,
        timestamp: NaiveDateTime,
        price: f64,
    },

    #[error("unknown strategy: {name} (expected one of MA, RSI, MACD, BB, VWAP, SR)")]
    UnknownStrategy { name: String },

    #[error("data unavailable for {symbol}: {reason}")]
    DataUnavailable { symbol: String, reason: String },

    #[error("invalid price series: {reason}")]
    InvalidSeries { reason: String },

    #[error("invalid parameter for {operation}: {reason}")]
    InvalidParameter { operation: String, reason: String },

    #[error("config parse error in {file}: {reason}")]
    ConfigParse { file: String, reason: String },

    #[error("missing config key [{section}] {key}")]
    ConfigMissing { section: String, key: String },

    #[error("invalid config value [{section}] {key}: {reason}")]
    ConfigInvalid {
        section: String,
        key: String,
        reason: String,
    },

    #[error("trade log error in {path}: {reason}")]
    TradeLog { path: String, reason: String },

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

impl SigtraderError {
    pub(crate) fn insufficient(operation: impl Into<String>, bars: usize, minimum: usize) -> Self {
        SigtraderError::InsufficientData {
            operation: operation.into(),
            bars,
            minimum,
        }
    }

    pub(crate) fn invalid_parameter(operation: impl Into<String>, reason: impl Into<String>) -> Self {
        SigtraderError::InvalidParameter {
            operation: operation.into(),
            reason: reason.into(),
        }
    }
}

impl From<&SigtraderError> for std::process::ExitCode {
    fn from(err: &SigtraderError) -> Self {
        let code: u8 = match err {
            SigtraderError::Io(_) | SigtraderError::TradeLog { .. } => 1,
            SigtraderError::ConfigParse { .. }
            | SigtraderError::ConfigMissing { .. }
            | SigtraderError::ConfigInvalid { .. } => 2,
            SigtraderError::UnknownStrategy { .. } => 3,
            SigtraderError::InvalidParameter { .. } => 4,
            SigtraderError::InsufficientData { .. }
            | SigtraderError::InvalidPrice { .. }
            | SigtraderError::DataUnavailable { .. }
            | SigtraderError::InvalidSeries { .. } => 5,
        };
        std::process::ExitCode::from(code)
    }
}
