//! Daily price bar representation.

use chrono::NaiveDate;

/// One trading day for one ticker. `dividend` is the per-share amount that
/// went ex on this day, 0 if none. `adjusted_close` embeds reinvested
/// dividends and split adjustments.
#[derive(Debug, Clone, PartialEq)]
pub struct PriceBar {
    pub date: NaiveDate,
    pub close: f64,
    pub adjusted_close: f64,
    pub dividend: f64,
}

impl PriceBar {
    pub fn pays_dividend(&self) -> bool {
        self.dividend > 0.0
    }

    /// Usable for return/yield math: finite and strictly positive prices.
    pub fn has_valid_prices(&self) -> bool {
        self.close.is_finite()
            && self.close > 0.0
            && self.adjusted_close.is_finite()
            && self.adjusted_close > 0.0
    }
}

/// Sort by date and drop duplicate dates, keeping the first occurrence.
/// Adapters call this so the domain can assume a strictly increasing series.
pub fn normalize_bars(mut bars: Vec<PriceBar>) -> Vec<PriceBar> {
    bars.sort_by_key(|b| b.date);
    bars.dedup_by_key(|b| b.date);
    bars
}

#[cfg(test)]
mod tests {
    use super::*;

    fn bar(date: &str, close: f64) -> PriceBar {
        PriceBar {
            date: NaiveDate::parse_from_str(date, "%Y-%m-%d").unwrap(),
            close,
            adjusted_close: close,
            dividend: 0.0,
        }
    }

    #[test]
    fn pays_dividend() {
        let mut b = bar("2024-01-15", 100.0);
        assert!(!b.pays_dividend());
        b.dividend = 0.62;
        assert!(b.pays_dividend());
    }

    #[test]
    fn valid_prices_rejects_zero_and_nan() {
        assert!(bar("2024-01-15", 100.0).has_valid_prices());
        assert!(!bar("2024-01-15", 0.0).has_valid_prices());
        assert!(!bar("2024-01-15", -1.0).has_valid_prices());
        assert!(!bar("2024-01-15", f64::NAN).has_valid_prices());
    }

    #[test]
    fn normalize_sorts_by_date() {
        let bars = vec![bar("2024-01-17", 3.0), bar("2024-01-15", 1.0), bar("2024-01-16", 2.0)];
        let bars = normalize_bars(bars);
        let closes: Vec<f64> = bars.iter().map(|b| b.close).collect();
        assert_eq!(closes, vec![1.0, 2.0, 3.0]);
    }

    #[test]
    fn normalize_drops_duplicate_dates_keeping_first() {
        let bars = vec![bar("2024-01-15", 1.0), bar("2024-01-15", 99.0), bar("2024-01-16", 2.0)];
        let bars = normalize_bars(bars);
        assert_eq!(bars.len(), 2);
        assert_eq!(bars[0].close, 1.0);
    }
}
