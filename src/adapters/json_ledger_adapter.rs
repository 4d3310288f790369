//! JSON trade log adapter.
//!
//! The ledger is stored as a pretty-printed JSON array of trade records.

use crate::domain::error::SigtraderError;
use crate::domain::ledger::TradeRecord;
use crate::ports::ledger_port::TradeLogPort;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use tracing::debug;

pub struct JsonLedgerAdapter {
    path: PathBuf,
}

impl JsonLedgerAdapter {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn error(&self, reason: impl ToString) -> SigtraderError {
        SigtraderError::TradeLog {
            path: self.path.display().to_string(),
            reason: reason.to_string(),
        }
    }
}

impl TradeLogPort for JsonLedgerAdapter {
    /// Creates parent directories if needed and replaces any previous log.
    fn save(&self, trades: &[TradeRecord]) -> Result<(), SigtraderError> {
        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent).map_err(|e| self.error(e))?;
        }
        let json = serde_json::to_string_pretty(trades).map_err(|e| self.error(e))?;
        std::fs::write(&self.path, json).map_err(|e| self.error(e))?;
        debug!(path = %self.path.display(), trades = trades.len(), "trade log saved");
        Ok(())
    }

    fn load(&self) -> Result<Vec<TradeRecord>, SigtraderError> {
        match std::fs::read_to_string(&self.path) {
            Ok(content) => serde_json::from_str(&content).map_err(|e| self.error(e)),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(Vec::new()),
            Err(e) => Err(self.error(e)),
        }
    }
}
