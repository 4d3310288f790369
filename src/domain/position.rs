//! Per-symbol share position. Long only: a sell always closes the whole position.

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Direction {
    #[default]
    Flat,
    Long,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Position {
    pub symbol: String,
    pub shares: u64,
    pub direction: Direction,
}

impl Position {
    pub fn flat(symbol: impl Into<String>) -> Self {
        Position {
            symbol: symbol.into(),
            shares: 0,
            direction: Direction::Flat,
        }
    }

    pub fn is_long(&self) -> bool {
        self.direction == Direction::Long
    }

    pub fn is_flat(&self) -> bool {
        self.direction == Direction::Flat
    }

    pub fn market_value(&self, price: f64) -> f64 {
        self.shares as f64 * price
    }

    pub(crate) fn open(&mut self, shares: u64) {
        self.shares += shares;
        self.direction = Direction::Long;
    }

    /// Zero the position, returning the shares that were held.
    pub(crate) fn close(&mut self) -> u64 {
        let shares = self.shares;
        self.shares = 0;
        self.direction = Direction::Flat;
        shares
    }
}
