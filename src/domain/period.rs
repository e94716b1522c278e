//! Lookback period selection.

use chrono::{Months, NaiveDate};
use std::fmt;
use std::str::FromStr;

/// How far back a page looks: a whole number of years, or all available
/// history.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Lookback {
    Years(u32),
    Max,
}

/// Periods offered by the page selectors.
pub const PERIOD_CHOICES: [&str; 9] = [
    "5y", "10y", "15y", "20y", "25y", "30y", "35y", "40y", "max",
];

#[derive(Debug, Clone, thiserror::Error)]
#[error("invalid lookback period: {0:?} (expected e.g. \"10y\" or \"max\")")]
pub struct PeriodParseError(String);

impl Lookback {
    /// Widen the window by `years`. Dividend analysis fetches one extra
    /// year so partial-year counts and the growth baseline sit outside the
    /// displayed window.
    pub fn with_headroom(self, years: u32) -> Lookback {
        match self {
            Lookback::Years(n) => Lookback::Years(n + years),
            Lookback::Max => Lookback::Max,
        }
    }

    /// Window start relative to the series end; `None` means unbounded.
    pub fn start_from(self, end: NaiveDate) -> Option<NaiveDate> {
        match self {
            Lookback::Years(n) => end.checked_sub_months(Months::new(n * 12)),
            Lookback::Max => None,
        }
    }
}

impl FromStr for Lookback {
    type Err = PeriodParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim().to_lowercase();
        if s == "max" {
            return Ok(Lookback::Max);
        }
        let years = s
            .strip_suffix('y')
            .and_then(|n| n.parse::<u32>().ok())
            .filter(|&n| n > 0)
            .ok_or_else(|| PeriodParseError(s.clone()))?;
        Ok(Lookback::Years(years))
    }
}

impl fmt::Display for Lookback {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Lookback::Years(n) => write!(f, "{}y", n),
            Lookback::Max => write!(f, "max"),
        }
    }
}
