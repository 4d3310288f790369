//! Trade log persistence port.

use crate::domain::error::SigtraderError;
use crate::domain::ledger::TradeRecord;

pub trait TradeLogPort {
    fn save(&self, trades: &[TradeRecord]) -> Result<(), SigtraderError>;

    /// Previously saved trades; an empty ledger when nothing was saved yet.
    fn load(&self) -> Result<Vec<TradeRecord>, SigtraderError>;
}
