//! History period and bar interval selectors.

use std::str::FromStr;

use chrono::{Datelike, Duration, NaiveDate, NaiveDateTime};

use super::error::SigtraderError;

/// Bar intervals a price source may be asked for.
pub const INTERVALS: [&str; 13] = [
    "1m", "2m", "5m", "15m", "30m", "60m", "90m", "1h", "1d", "5d", "1wk", "1mo", "3mo",
];

pub fn validate_interval(interval: &str) -> Result<(), SigtraderError> {
    if INTERVALS.contains(&interval) {
        Ok(())
    } else {
        Err(SigtraderError::invalid_parameter(
            "interval",
            format!("'{}' is not one of {}", interval, INTERVALS.join(", ")),
        ))
    }
}

/// How far back a history request reaches: `Nd`, `Nwk`, `Nmo`, `Ny`, `ytd`
/// or `max`. Months count as 30 days and years as 365.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Lookback {
    Days(i64),
    YearToDate,
    Max,
}

impl Lookback {
    /// Earliest timestamp kept when the newest bar is at `latest`.
    /// `None` means no lower bound.
    pub fn cutoff(&self, latest: NaiveDateTime) -> Option<NaiveDateTime> {
        match self {
            Lookback::Days(days) => Some(latest - Duration::days(*days)),
            Lookback::YearToDate => NaiveDate::from_ymd_opt(latest.year(), 1, 1)
                .and_then(|d| d.and_hms_opt(0, 0, 0)),
            Lookback::Max => None,
        }
    }
}

impl FromStr for Lookback {
    type Err = SigtraderError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim().to_ascii_lowercase();
        match s.as_str() {
            "ytd" => return Ok(Lookback::YearToDate),
            "max" => return Ok(Lookback::Max),
            _ => {}
        }

        let split = s.find(|c: char| !c.is_ascii_digit()).unwrap_or(s.len());
        let (count, unit) = s.split_at(split);
        let days_per_unit = match unit {
            "d" => Some(1),
            "wk" => Some(7),
            "mo" => Some(30),
            "y" => Some(365),
            _ => None,
        };
        match (count.parse::<i64>(), days_per_unit) {
            (Ok(n), Some(per)) if n > 0 => Ok(Lookback::Days(n * per)),
            _ => Err(SigtraderError::invalid_parameter(
                "period",
                format!("'{}' is not Nd, Nwk, Nmo, Ny, ytd or max", s),
            )),
        }
    }
}
