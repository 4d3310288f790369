//! Trade records produced by the simulator.

use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum TradeSide {
    Buy,
    Sell,
}

/// One fill. BUY records carry `cost`, SELL records carry `proceeds`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TradeRecord {
    pub timestamp: NaiveDateTime,
    pub symbol: String,
    pub side: TradeSide,
    pub shares: u64,
    pub price: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cost: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub proceeds: Option<f64>,
}

impl TradeRecord {
    pub fn buy(timestamp: NaiveDateTime, symbol: impl Into<String>, shares: u64, price: f64) -> Self {
        TradeRecord {
            timestamp,
            symbol: symbol.into(),
            side: TradeSide::Buy,
            shares,
            price,
            cost: Some(shares as f64 * price),
            proceeds: None,
        }
    }

    pub fn sell(timestamp: NaiveDateTime, symbol: impl Into<String>, shares: u64, price: f64) -> Self {
        TradeRecord {
            timestamp,
            symbol: symbol.into(),
            side: TradeSide::Sell,
            shares,
            price,
            cost: None,
            proceeds: Some(shares as f64 * price),
        }
    }

    /// Cash moved by this trade: negative for a buy, positive for a sell.
    pub fn cash_flow(&self) -> f64 {
        self.proceeds.unwrap_or(0.0) - self.cost.unwrap_or(0.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn ts() -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2024, 2, 5)
            .unwrap()
            .and_hms_opt(0, 0, 0)
            .unwrap()
    }

    #[test]
    fn buy_carries_cost() {
        let trade = TradeRecord::buy(ts(), "AAPL", 10, 150.0);
        assert_eq!(trade.side, TradeSide::Buy);
        assert_eq!(trade.cost, Some(1500.0));
        assert!(trade.proceeds.is_none());
        assert!((trade.cash_flow() + 1500.0).abs() < f64::EPSILON);
    }

    #[test]
    fn sell_carries_proceeds() {
        let trade = TradeRecord::sell(ts(), "AAPL", 10, 160.0);
        assert_eq!(trade.proceeds, Some(1600.0));
        assert!(trade.cost.is_none());
        assert!((trade.cash_flow() - 1600.0).abs() < f64::EPSILON);
    }

    #[test]
    fn json_omits_absent_fields() {
        let json = serde_json::to_string(&TradeRecord::buy(ts(), "AAPL", 2, 10.0)).unwrap();
        assert!(json.contains("\"side\":\"BUY\""));
        assert!(json.contains("\"cost\":20.0"));
        assert!(json.contains("\"timestamp\":\"2024-02-05T00:00:00\""));
        assert!(!json.contains("proceeds"));
    }
}
