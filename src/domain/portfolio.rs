//! Mark-to-market portfolio snapshot.

use std::collections::{BTreeMap, HashMap};

use serde::{Deserialize, Serialize};
use tracing::warn;

use super::execution::SimulatorState;
use crate::ports::data_port::LivePricePort;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PortfolioSnapshot {
    pub cash: f64,
    /// Shares per held symbol.
    pub positions: BTreeMap<String, u64>,
    /// Cash plus the value of every priced holding.
    pub total_value: f64,
    /// Held symbols left out of `total_value` for lack of a usable price.
    pub unpriced: Vec<String>,
}

/// Value `state` at `prices`.
///
/// A held symbol with a missing or non-positive price is logged and left out
/// of the total rather than failing the snapshot.
pub fn snapshot(state: &SimulatorState, prices: &HashMap<String, f64>) -> PortfolioSnapshot {
    value_holdings(state, |symbol| match prices.get(symbol) {
        Some(&price) if price.is_finite() && price > 0.0 => Ok(price),
        Some(&price) => Err(format!("unusable price {}", price)),
        None => Err("no current price".to_string()),
    })
}

/// Value `state` at prices fetched from `live`, one request per held symbol.
pub fn snapshot_live(state: &SimulatorState, live: &dyn LivePricePort) -> PortfolioSnapshot {
    value_holdings(state, |symbol| match live.fetch_live(symbol) {
        Ok(price) if price.is_finite() && price > 0.0 => Ok(price),
        Ok(price) => Err(format!("unusable price {}", price)),
        Err(err) => Err(err.to_string()),
    })
}

fn value_holdings<F>(state: &SimulatorState, mut price_of: F) -> PortfolioSnapshot
where
    F: FnMut(&str) -> Result<f64, String>,
{
    let mut positions = BTreeMap::new();
    let mut unpriced = Vec::new();
    let mut total_value = state.cash;

    for (symbol, position) in state.positions.iter().filter(|(_, p)| p.shares > 0) {
        positions.insert(symbol.clone(), position.shares);
        match price_of(symbol) {
            Ok(price) => total_value += position.market_value(price),
            Err(reason) => {
                warn!(symbol = %symbol, shares = position.shares, %reason, "excluding holding from portfolio value");
                unpriced.push(symbol.clone());
            }
        }
    }

    PortfolioSnapshot {
        cash: state.cash,
        positions,
        total_value,
        unpriced,
    }
}
