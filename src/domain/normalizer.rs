//! Dividend/return normalization over a daily price series.
//!
//! Orchestrates [`crate::domain::dividends`] and aligns the sparse
//! per-event yearly run-rate onto every trading day.

use chrono::NaiveDate;

use crate::domain::dividends::{self, DividendPoint};
use crate::domain::error::FinboardError;
use crate::domain::price_bar::PriceBar;

/// Tunables for the dividend normalization. One struct, passed explicitly;
/// page variants differ only in the values they carry.
#[derive(Debug, Clone)]
pub struct NormalizerConfig {
    /// Events in the centered rolling-median window.
    pub smoothing_window: usize,
    /// Forward-fill stops this many calendar days after the last event, so
    /// a suspended dividend does not appear to run forever.
    pub staleness_cap_days: i64,
    /// Minimum dividend events required to smooth and annualize.
    pub min_events: usize,
}

impl Default for NormalizerConfig {
    fn default() -> Self {
        Self {
            smoothing_window: 5,
            staleness_cap_days: 300,
            min_events: 2,
        }
    }
}

/// One trading day carrying the forward-filled yearly run-rate.
#[derive(Debug, Clone)]
pub struct DailyDividendPoint {
    pub date: NaiveDate,
    pub close: f64,
    pub yearly_dividend: f64,
    /// `yearly_dividend / close`; `None` where the close is non-positive.
    pub dividend_yield: Option<f64>,
}

#[derive(Debug, Clone)]
pub struct NormalizedDividends {
    pub events: Vec<DividendPoint>,
    pub daily: Vec<DailyDividendPoint>,
}

/// Run the full dividend normalization for one ticker's history.
pub fn normalize(
    ticker: &str,
    bars: &[PriceBar],
    config: &NormalizerConfig,
) -> Result<NormalizedDividends, FinboardError> {
    if bars.is_empty() {
        return Err(FinboardError::UnknownTicker {
            ticker: ticker.to_string(),
        });
    }

    let events = dividends::extract_events(bars);
    if events.len() < config.min_events {
        return Err(FinboardError::InsufficientData {
            ticker: ticker.to_string(),
            events: events.len(),
            minimum: config.min_events,
        });
    }

    let points = dividends::annualize(&events, config.smoothing_window);
    let daily = forward_fill(bars, &points, config.staleness_cap_days);

    Ok(NormalizedDividends {
        events: points,
        daily,
    })
}

/// Carry each event's yearly value onto subsequent trading days until the
/// next event, stopping `cap_days` after it. Days before the first event
/// are trimmed; days past the cap are excluded until a new event arrives.
fn forward_fill(
    bars: &[PriceBar],
    points: &[DividendPoint],
    cap_days: i64,
) -> Vec<DailyDividendPoint> {
    let mut daily = Vec::with_capacity(bars.len());
    let mut next = 0usize;
    let mut current: Option<&DividendPoint> = None;

    for bar in bars {
        while next < points.len() && points[next].date <= bar.date {
            current = Some(&points[next]);
            next += 1;
        }
        let Some(point) = current else {
            continue;
        };
        if bar.date.signed_duration_since(point.date).num_days() > cap_days {
            continue;
        }

        let dividend_yield = (bar.close > 0.0).then(|| point.yearly / bar.close);
        daily.push(DailyDividendPoint {
            date: bar.date,
            close: bar.close,
            yearly_dividend: point.yearly,
            dividend_yield,
        });
    }

    daily
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use chrono::Duration;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    /// Weekday-less daily series from `start` for `days` days, with
    /// dividends on the given dates.
    fn daily_bars(start: NaiveDate, days: i64, dividends: &[(NaiveDate, f64)]) -> Vec<PriceBar> {
        (0..days)
            .map(|offset| {
                let day = start + Duration::days(offset);
                let dividend = dividends
                    .iter()
                    .find(|(d, _)| *d == day)
                    .map(|(_, amount)| *amount)
                    .unwrap_or(0.0);
                PriceBar {
                    date: day,
                    close: 100.0,
                    adjusted_close: 100.0,
                    dividend,
                }
            })
            .collect()
    }

    fn quarterly_dividends(start_year: i32, years: i32, amount: f64) -> Vec<(NaiveDate, f64)> {
        let mut out = Vec::new();
        for year in start_year..start_year + years {
            for month in [2, 5, 8, 11] {
                out.push((date(year, month, 15), amount));
            }
        }
        out
    }

    #[test]
    fn normalize_empty_series_is_unknown_ticker() {
        let err = normalize("XYZ", &[], &NormalizerConfig::default()).unwrap_err();
        assert!(matches!(err, FinboardError::UnknownTicker { .. }));
    }

    #[test]
    fn normalize_requires_min_events() {
        let bars = daily_bars(date(2023, 1, 1), 400, &[(date(2023, 3, 10), 0.5)]);
        let err = normalize("ONE", &bars, &NormalizerConfig::default()).unwrap_err();
        assert!(matches!(
            err,
            FinboardError::InsufficientData {
                events: 1,
                minimum: 2,
                ..
            }
        ));
    }

    #[test]
    fn daily_series_starts_at_first_event() {
        let dividends = quarterly_dividends(2022, 2, 0.5);
        let bars = daily_bars(date(2022, 1, 1), 730, &dividends);
        let normalized = normalize("Q", &bars, &NormalizerConfig::default()).unwrap();

        assert_eq!(normalized.daily.first().unwrap().date, date(2022, 2, 15));
    }

    #[test]
    fn forward_fill_carries_value_between_events() {
        let dividends = quarterly_dividends(2022, 2, 0.5);
        let bars = daily_bars(date(2022, 1, 1), 730, &dividends);
        let normalized = normalize("Q", &bars, &NormalizerConfig::default()).unwrap();

        let mid = normalized
            .daily
            .iter()
            .find(|p| p.date == date(2022, 4, 1))
            .unwrap();
        assert_relative_eq!(mid.yearly_dividend, 2.0);
    }

    #[test]
    fn forward_fill_stops_at_staleness_cap() {
        // Two events 500 days apart; the gap exceeds the 300-day cap.
        let dividends = vec![(date(2022, 2, 15), 0.5), (date(2023, 6, 30), 0.5)];
        let bars = daily_bars(date(2022, 1, 1), 700, &dividends);
        let normalized = normalize("GAP", &bars, &NormalizerConfig::default()).unwrap();

        let capped = date(2022, 2, 15) + Duration::days(300);
        let stale_day = capped + Duration::days(1);
        assert!(normalized.daily.iter().any(|p| p.date == capped));
        assert!(!normalized.daily.iter().any(|p| p.date == stale_day));
        // Fill resumes at the second event.
        assert!(normalized.daily.iter().any(|p| p.date == date(2023, 6, 30)));
    }

    #[test]
    fn yield_recomputes_exactly_from_stored_columns() {
        let dividends = quarterly_dividends(2022, 2, 0.5);
        let bars = daily_bars(date(2022, 1, 1), 730, &dividends);
        let normalized = normalize("Q", &bars, &NormalizerConfig::default()).unwrap();

        for point in &normalized.daily {
            let expected = point.yearly_dividend / point.close;
            assert_eq!(point.dividend_yield, Some(expected));
        }
    }

    #[test]
    fn zero_close_yields_no_yield_but_does_not_crash() {
        let dividends = quarterly_dividends(2022, 2, 0.5);
        let mut bars = daily_bars(date(2022, 1, 1), 730, &dividends);
        let idx = bars.iter().position(|b| b.date == date(2022, 3, 1)).unwrap();
        bars[idx].close = 0.0;

        let normalized = normalize("Z", &bars, &NormalizerConfig::default()).unwrap();
        let broken = normalized
            .daily
            .iter()
            .find(|p| p.date == date(2022, 3, 1))
            .unwrap();
        assert_eq!(broken.dividend_yield, None);
    }
}
