//! Saved portfolio model.
//!
//! A named set of ETF and stock holdings, keyed by fund name and ticker,
//! valued in the user's base currency. Serializable so the web adapter can
//! keep portfolios in the browser session; the domain type knows nothing
//! about cookies.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use crate::domain::error::FinboardError;

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SavedPortfolio {
    pub etf_holdings: BTreeMap<String, f64>,
    pub stock_holdings: BTreeMap<String, f64>,
}

impl SavedPortfolio {
    pub fn is_empty(&self) -> bool {
        self.etf_holdings.is_empty() && self.stock_holdings.is_empty()
    }
}

/// Parse one `NAME=VALUE` holding entry (CLI flags and form lines).
pub fn parse_holding(entry: &str) -> Result<(String, f64), FinboardError> {
    let (name, value) = entry.split_once('=').ok_or_else(|| {
        FinboardError::HoldingEntry {
            reason: format!("{:?} (expected NAME=VALUE)", entry),
        }
    })?;

    let name = name.trim();
    if name.is_empty() {
        return Err(FinboardError::HoldingEntry {
            reason: format!("{:?} has an empty name", entry),
        });
    }

    let value: f64 = value
        .trim()
        .parse()
        .map_err(|_| FinboardError::HoldingEntry {
            reason: format!("{:?} has a non-numeric value", entry),
        })?;
    if !value.is_finite() || value < 0.0 {
        return Err(FinboardError::HoldingEntry {
            reason: format!("{:?} has a negative value", entry),
        });
    }

    Ok((name.to_string(), value))
}

/// Parse a batch of entries into a holdings map. Blank entries are skipped;
/// duplicates are rejected.
pub fn parse_holdings<'a>(
    entries: impl IntoIterator<Item = &'a str>,
) -> Result<BTreeMap<String, f64>, FinboardError> {
    let mut holdings = BTreeMap::new();
    for entry in entries {
        if entry.trim().is_empty() {
            continue;
        }
        let (name, value) = parse_holding(entry)?;
        if holdings.insert(name.clone(), value).is_some() {
            return Err(FinboardError::HoldingEntry {
                reason: format!("duplicate entry for {:?}", name),
            });
        }
    }
    Ok(holdings)
}
