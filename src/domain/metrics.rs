//! Risk and performance metrics.
//!
//! Statistics use the sample (n-1) estimators and 252 trading periods per
//! year. Ratios whose denominator is zero are `None` rather than NaN.

use std::collections::HashMap;

use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};
use tracing::warn;

use super::error::SigtraderError;
use super::ledger::{TradeRecord, TradeSide};
use super::ohlcv::PriceSeries;

const TRADING_DAYS_PER_YEAR: f64 = 252.0;

/// (last / first - 1) × 100.
pub fn total_return(prices: &[f64]) -> Result<f64, SigtraderError> {
    if prices.len() < 2 {
        return Err(SigtraderError::insufficient("total_return", prices.len(), 2));
    }
    let first = prices[0];
    let last = prices[prices.len() - 1];
    if first <= 0.0 {
        return Err(SigtraderError::invalid_parameter(
            "total_return",
            format!("first price {} is not positive", first),
        ));
    }
    Ok((last / first - 1.0) * 100.0)
}

/// Simple per-period returns; one shorter than `prices`.
pub fn pct_returns(prices: &[f64]) -> Vec<f64> {
    prices.windows(2).map(|w| w[1] / w[0] - 1.0).collect()
}

/// Annualised standard deviation of returns, in percent.
pub fn volatility(returns: &[f64]) -> Result<f64, SigtraderError> {
    require_returns("volatility", returns)?;
    Ok(sample_std(returns) * TRADING_DAYS_PER_YEAR.sqrt() * 100.0)
}

/// Deepest fall from a running peak, in percent. Never positive; 0 for an
/// empty or never-falling series.
pub fn max_drawdown(prices: &[f64]) -> f64 {
    let mut peak = f64::NEG_INFINITY;
    prices.iter().fold(0.0_f64, |worst, &price| {
        peak = peak.max(price);
        if peak > 0.0 {
            worst.min((price / peak - 1.0) * 100.0)
        } else {
            worst
        }
    })
}

/// √252 × mean(r − rf) / stdev(r − rf). `None` when returns do not vary.
pub fn sharpe_ratio(returns: &[f64], risk_free_rate: f64) -> Result<Option<f64>, SigtraderError> {
    require_returns("sharpe_ratio", returns)?;
    let excess: Vec<f64> = returns.iter().map(|r| r - risk_free_rate).collect();
    let std = sample_std(&excess);
    if std == 0.0 {
        return Ok(None);
    }
    Ok(Some(TRADING_DAYS_PER_YEAR.sqrt() * mean(&excess) / std))
}

/// cov(r, m) / var(m). `None` when the market returns do not vary.
pub fn beta(returns: &[f64], market_returns: &[f64]) -> Result<Option<f64>, SigtraderError> {
    if returns.len() != market_returns.len() {
        return Err(SigtraderError::invalid_parameter(
            "beta",
            format!(
                "{} returns against {} market returns",
                returns.len(),
                market_returns.len()
            ),
        ));
    }
    require_returns("beta", returns)?;
    let market_var = sample_cov(market_returns, market_returns);
    if market_var == 0.0 {
        return Ok(None);
    }
    Ok(Some(sample_cov(returns, market_returns) / market_var))
}

fn require_returns(operation: &str, returns: &[f64]) -> Result<(), SigtraderError> {
    if returns.len() < 2 {
        return Err(SigtraderError::insufficient(operation, returns.len(), 2));
    }
    Ok(())
}

fn mean(values: &[f64]) -> f64 {
    values.iter().sum::<f64>() / values.len() as f64
}

fn sample_cov(a: &[f64], b: &[f64]) -> f64 {
    let (mean_a, mean_b) = (mean(a), mean(b));
    a.iter()
        .zip(b)
        .map(|(x, y)| (x - mean_a) * (y - mean_b))
        .sum::<f64>()
        / (a.len() - 1) as f64
}

fn sample_std(values: &[f64]) -> f64 {
    sample_cov(values, values).sqrt()
}

/// Price-based risk summary for one symbol.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RiskMetrics {
    pub total_return: f64,
    pub volatility: f64,
    pub max_drawdown: f64,
    pub sharpe_ratio: Option<f64>,
    /// Only present when a market series was supplied.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub beta: Option<f64>,
}

impl RiskMetrics {
    /// Metrics over the closes of `series`.
    ///
    /// With a `market` series, beta pairs each series' own bar-to-bar returns
    /// on the timestamps where both have one. A market series that cannot
    /// produce a beta (bad closes, too little overlap) is logged and leaves
    /// `beta` unset; the other metrics are unaffected.
    pub fn compute(
        series: &PriceSeries,
        market: Option<&PriceSeries>,
        risk_free_rate: f64,
    ) -> Result<Self, SigtraderError> {
        require_positive_closes(series)?;
        let closes = series.closes();
        let returns = pct_returns(&closes);

        let beta = market.and_then(|market| match market_beta(series, market) {
            Ok(beta) => beta,
            Err(err) => {
                warn!(
                    symbol = series.symbol(),
                    market = market.symbol(),
                    error = %err,
                    "beta unavailable"
                );
                None
            }
        });

        Ok(RiskMetrics {
            total_return: total_return(&closes)?,
            volatility: volatility(&returns)?,
            max_drawdown: max_drawdown(&closes),
            sharpe_ratio: sharpe_ratio(&returns, risk_free_rate)?,
            beta,
        })
    }
}

fn market_beta(series: &PriceSeries, market: &PriceSeries) -> Result<Option<f64>, SigtraderError> {
    require_positive_closes(market)?;
    let (own, benchmark) = align_returns(series, market);
    beta(&own, &benchmark)
}

fn require_positive_closes(series: &PriceSeries) -> Result<(), SigtraderError> {
    match series.bars().iter().find(|b| !(b.close.is_finite() && b.close > 0.0)) {
        Some(bar) => Err(SigtraderError::InvalidPrice {
            symbol: series.symbol().to_string(),
            timestamp: bar.timestamp,
            price: bar.close,
        }),
        None => Ok(()),
    }
}

/// Return over each bar's own predecessor, keyed by the later bar's timestamp.
fn returns_by_time(series: &PriceSeries) -> impl Iterator<Item = (NaiveDateTime, f64)> + '_ {
    series
        .bars()
        .windows(2)
        .map(|w| (w[1].timestamp, w[1].close / w[0].close - 1.0))
}

/// Per-series returns paired on timestamp; unmatched returns are dropped.
fn align_returns(series: &PriceSeries, market: &PriceSeries) -> (Vec<f64>, Vec<f64>) {
    let market_by_time: HashMap<_, _> = returns_by_time(market).collect();
    returns_by_time(series)
        .filter_map(|(t, r)| market_by_time.get(&t).map(|&m| (r, m)))
        .unzip()
}

/// Ledger statistics.
///
/// Profit is lot-agnostic: a SELL is profitable when its own proceeds exceed
/// its own cost field, which SELL records never carry, so every SELL with
/// positive proceeds counts and `total_profit` is the sum of SELL proceeds.
/// It is an approximation, not FIFO/LIFO lot matching.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TradeMetrics {
    pub total_trades: usize,
    pub profitable_trades: usize,
    pub total_profit: f64,
    pub avg_profit_per_trade: f64,
    pub win_rate: f64,
}

impl TradeMetrics {
    /// `None` for an empty ledger.
    pub fn compute(ledger: &[TradeRecord]) -> Option<Self> {
        if ledger.is_empty() {
            return None;
        }
        let sells = ledger.iter().filter(|t| t.side == TradeSide::Sell);
        let margin = |t: &TradeRecord| t.proceeds.unwrap_or(0.0) - t.cost.unwrap_or(0.0);

        let profitable_trades = sells.clone().filter(|t| margin(*t) > 0.0).count();
        let total_profit: f64 = sells.map(margin).sum();
        let total_trades = ledger.len();

        Some(TradeMetrics {
            total_trades,
            profitable_trades,
            total_profit,
            avg_profit_per_trade: total_profit / total_trades as f64,
            win_rate: profitable_trades as f64 / total_trades as f64,
        })
    }
}

/// `$1,234.56`
pub fn format_currency(amount: f64) -> String {
    let formatted = format!("{:.2}", amount.abs());
    let (whole, cents) = formatted.split_once('.').unwrap_or((formatted.as_str(), "00"));
    let mut grouped = String::with_capacity(whole.len() + whole.len() / 3);
    for (i, digit) in whole.chars().enumerate() {
        if i > 0 && (whole.len() - i) % 3 == 0 {
            grouped.push(',');
        }
        grouped.push(digit);
    }
    let sign = if amount < 0.0 && formatted != "0.00" { "-" } else { "" };
    format!("${}{}.{}", sign, grouped, cents)
}

/// `12.34%`
pub fn format_percentage(value: f64) -> String {
    format!("{:.2}%", value)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::indicator::test_support::series_from_closes;
    use crate::domain::ohlcv::OhlcvBar;
    use approx::assert_relative_eq;
    use chrono::{Duration, NaiveDate, NaiveDateTime};
    use proptest::prelude::*;

    fn ts(day: i64) -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2024, 1, 1)
            .unwrap()
            .and_hms_opt(0, 0, 0)
            .unwrap()
            + Duration::days(day)
    }

    fn series_on_days(symbol: &str, rows: &[(i64, f64)]) -> PriceSeries {
        let bars = rows
            .iter()
            .map(|&(day, close)| OhlcvBar {
                timestamp: ts(day),
                open: close,
                high: close,
                low: close,
                close,
                volume: 10,
            })
            .collect();
        PriceSeries::new(symbol, bars).unwrap()
    }

    #[test]
    fn total_return_basic() {
        assert_relative_eq!(total_return(&[100.0, 90.0, 110.0]).unwrap(), 10.0, epsilon = 1e-9);
    }

    #[test]
    fn total_return_needs_two_prices() {
        assert!(matches!(
            total_return(&[100.0]),
            Err(SigtraderError::InsufficientData { .. })
        ));
    }

    #[test]
    fn pct_returns_drops_first_bar() {
        let r = pct_returns(&[100.0, 110.0, 99.0]);
        assert_eq!(r.len(), 2);
        assert_relative_eq!(r[0], 0.1, epsilon = 1e-12);
        assert_relative_eq!(r[1], -0.1, epsilon = 1e-12);
    }

    #[test]
    fn volatility_known_value() {
        // sample std of [0.01, -0.01] = sqrt(0.0002)
        let v = volatility(&[0.01, -0.01]).unwrap();
        assert_relative_eq!(v, 0.0002_f64.sqrt() * 252.0_f64.sqrt() * 100.0, epsilon = 1e-9);
    }

    #[test]
    fn volatility_needs_two_returns() {
        assert!(volatility(&[0.01]).is_err());
    }

    #[test]
    fn max_drawdown_monotonic_is_zero() {
        assert_eq!(max_drawdown(&[1.0, 2.0, 3.0, 4.0]), 0.0);
    }

    #[test]
    fn max_drawdown_peak_to_trough() {
        let dd = max_drawdown(&[100.0, 120.0, 90.0, 130.0, 117.0]);
        assert_relative_eq!(dd, -25.0, epsilon = 1e-9);
    }

    #[test]
    fn max_drawdown_empty() {
        assert_eq!(max_drawdown(&[]), 0.0);
    }

    #[test]
    fn sharpe_constant_returns_is_undefined() {
        assert_eq!(sharpe_ratio(&[0.01, 0.01, 0.01], 0.0).unwrap(), None);
    }

    #[test]
    fn sharpe_known_value() {
        let returns = [0.02, 0.0];
        // excess mean 0.0, so the ratio is zero
        let s = sharpe_ratio(&returns, 0.01).unwrap().unwrap();
        assert!(s.abs() < 1e-12);

        let s = sharpe_ratio(&returns, 0.0).unwrap().unwrap();
        let expected = 252.0_f64.sqrt() * 0.01 / 0.0002_f64.sqrt();
        assert_relative_eq!(s, expected, epsilon = 1e-9);
    }

    #[test]
    fn beta_of_market_against_itself_is_one() {
        let m = [0.01, -0.02, 0.03, 0.0];
        assert_relative_eq!(beta(&m, &m).unwrap().unwrap(), 1.0, epsilon = 1e-12);
    }

    #[test]
    fn beta_scales_with_leverage() {
        let m = [0.01, -0.02, 0.03, 0.0];
        let r: Vec<f64> = m.iter().map(|x| 2.0 * x).collect();
        assert_relative_eq!(beta(&r, &m).unwrap().unwrap(), 2.0, epsilon = 1e-12);
    }

    #[test]
    fn beta_flat_market_is_undefined() {
        assert_eq!(beta(&[0.01, 0.02], &[0.0, 0.0]).unwrap(), None);
    }

    #[test]
    fn beta_rejects_mismatched_lengths() {
        assert!(matches!(
            beta(&[0.01, 0.02, 0.03], &[0.0, 0.01]),
            Err(SigtraderError::InvalidParameter { .. })
        ));
    }

    #[test]
    fn risk_metrics_without_market() {
        let series = series_from_closes(&[100.0, 110.0, 99.0, 120.0]);
        let m = RiskMetrics::compute(&series, None, 0.01).unwrap();
        assert_relative_eq!(m.total_return, 20.0, epsilon = 1e-9);
        assert_relative_eq!(m.max_drawdown, -10.0, epsilon = 1e-9);
        assert!(m.sharpe_ratio.is_some());
        assert!(m.beta.is_none());
    }

    #[test]
    fn risk_metrics_pairs_returns_by_timestamp() {
        let stock = series_on_days("AAA", &[(0, 100.0), (1, 102.0), (2, 101.0), (4, 105.0)]);
        // The extra market bar on day 3 shapes the market's day-4 return.
        let market = series_on_days(
            "SPY",
            &[(0, 100.0), (1, 102.0), (2, 101.0), (3, 200.0), (4, 105.0)],
        );
        let m = RiskMetrics::compute(&stock, Some(&market), 0.0).unwrap();

        let own = [0.02, 101.0 / 102.0 - 1.0, 105.0 / 101.0 - 1.0];
        let bench = [0.02, 101.0 / 102.0 - 1.0, 105.0 / 200.0 - 1.0];
        let expected = beta(&own, &bench).unwrap().unwrap();
        assert_relative_eq!(m.beta.unwrap(), expected, epsilon = 1e-12);
    }

    #[test]
    fn risk_metrics_identical_market_beta_is_one() {
        let closes = [(0, 100.0), (1, 102.0), (2, 101.0), (3, 104.0)];
        let stock = series_on_days("AAA", &closes);
        let market = series_on_days("SPY", &closes);
        let m = RiskMetrics::compute(&stock, Some(&market), 0.0).unwrap();
        assert_relative_eq!(m.beta.unwrap(), 1.0, epsilon = 1e-12);
    }

    #[test]
    fn risk_metrics_keep_own_values_when_market_does_not_overlap() {
        let stock = series_on_days(
            "AAA",
            &[(0, 100.0), (1, 110.0), (2, 99.0), (3, 120.0)],
        );
        let market = series_on_days("SPY", &[(10, 100.0), (11, 101.0), (12, 99.0)]);

        let with_market = RiskMetrics::compute(&stock, Some(&market), 0.01).unwrap();
        let alone = RiskMetrics::compute(&stock, None, 0.01).unwrap();

        assert!(with_market.beta.is_none());
        assert_eq!(with_market, alone);
    }

    #[test]
    fn risk_metrics_ignore_bad_market_close() {
        let stock = series_on_days("AAA", &[(0, 100.0), (1, 110.0), (2, 99.0)]);
        let market = series_on_days("SPY", &[(0, 100.0), (1, 0.0), (2, 99.0)]);
        let m = RiskMetrics::compute(&stock, Some(&market), 0.0).unwrap();
        assert!(m.beta.is_none());
        assert_relative_eq!(m.total_return, -1.0, epsilon = 1e-9);
    }

    #[test]
    fn risk_metrics_rejects_non_positive_close() {
        let series = series_from_closes(&[100.0, 0.0, 120.0]);
        assert!(matches!(
            RiskMetrics::compute(&series, None, 0.0),
            Err(SigtraderError::InvalidPrice { .. })
        ));
    }

    #[test]
    fn trade_metrics_empty_ledger() {
        assert_eq!(TradeMetrics::compute(&[]), None);
    }

    #[test]
    fn trade_metrics_lot_agnostic() {
        let ledger = vec![
            TradeRecord::buy(ts(0), "AAPL", 10, 100.0),
            TradeRecord::sell(ts(1), "AAPL", 10, 90.0),
            TradeRecord::buy(ts(2), "MSFT", 5, 200.0),
        ];
        let m = TradeMetrics::compute(&ledger).unwrap();

        assert_eq!(m.total_trades, 3);
        // the SELL carries no cost field, so its proceeds count as profit
        assert_eq!(m.profitable_trades, 1);
        assert_relative_eq!(m.total_profit, 900.0, epsilon = 1e-9);
        assert_relative_eq!(m.avg_profit_per_trade, 300.0, epsilon = 1e-9);
        assert_relative_eq!(m.win_rate, 1.0 / 3.0, epsilon = 1e-12);
    }

    #[test]
    fn currency_formatting() {
        assert_eq!(format_currency(1234.5), "$1,234.50");
        assert_eq!(format_currency(0.0), "$0.00");
        assert_eq!(format_currency(999.999), "$1,000.00");
        assert_eq!(format_currency(1_000_000.0), "$1,000,000.00");
        assert_eq!(format_currency(-42.1), "$-42.10");
    }

    #[test]
    fn percentage_formatting() {
        assert_eq!(format_percentage(12.345_6), "12.35%");
        assert_eq!(format_percentage(-3.0), "-3.00%");
    }

    proptest! {
        #[test]
        fn drawdown_never_positive(prices in prop::collection::vec(0.01f64..1_000.0, 0..100)) {
            prop_assert!(max_drawdown(&prices) <= 0.0);
        }
    }
}
