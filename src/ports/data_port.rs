//! Market data port traits.

use crate::domain::error::SigtraderError;
use crate::domain::ohlcv::PriceSeries;

/// Historical bars for a symbol.
pub trait PriceHistoryPort {
    /// Bars covering `period` (e.g. `1mo`, `1y`, `max`) at `interval` (e.g. `1d`).
    ///
    /// Fails with `DataUnavailable` when the source has nothing for the symbol.
    fn fetch(&self, symbol: &str, period: &str, interval: &str)
        -> Result<PriceSeries, SigtraderError>;
}

/// Latest traded price for a symbol.
pub trait LivePricePort {
    fn fetch_live(&self, symbol: &str) -> Result<f64, SigtraderError>;
}
