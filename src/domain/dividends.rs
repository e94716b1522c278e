//! Dividend event extraction and annualization.
//!
//! Turns the irregular dividend payments embedded in a daily price series
//! into a per-event annualized series: at most one event per calendar
//! month, a payment frequency snapped to a supported count per year, a
//! rolling-median smoothed amount, and a yearly run-rate.

use chrono::{Datelike, NaiveDate};
use std::collections::BTreeMap;

use crate::domain::price_bar::PriceBar;

/// Payment frequencies the annualization supports.
pub const SUPPORTED_FREQUENCIES: [u32; 5] = [0, 1, 2, 4, 12];

/// A single dividend payment after per-month collapsing.
#[derive(Debug, Clone, PartialEq)]
pub struct DividendEvent {
    pub date: NaiveDate,
    pub amount: f64,
}

/// One event of the annualized series.
#[derive(Debug, Clone)]
pub struct DividendPoint {
    pub date: NaiveDate,
    /// Raw per-event amount.
    pub amount: f64,
    /// Rolling-median amount; equals `amount` where the window is
    /// incomplete at the series edges.
    pub smoothed: f64,
    /// Payments per year, snapped to [`SUPPORTED_FREQUENCIES`].
    pub annual_count: u32,
    /// Annualized run-rate in effect at this event.
    pub yearly: f64,
}

/// Bars with a payment, collapsed to at most one event per calendar month.
/// When several payments land in the same month the earliest is kept.
pub fn extract_events(bars: &[PriceBar]) -> Vec<DividendEvent> {
    let mut events: Vec<DividendEvent> = Vec::new();
    let mut last_month: Option<(i32, u32)> = None;

    for bar in bars {
        if !bar.pays_dividend() {
            continue;
        }
        let month = (bar.date.year(), bar.date.month());
        if last_month == Some(month) {
            continue;
        }
        last_month = Some(month);
        events.push(DividendEvent {
            date: bar.date,
            amount: bar.dividend,
        });
    }

    events
}

/// Snap an events-per-year count to the nearest supported frequency.
/// Fixed breakpoints, not rounding: 3 through 8 read as quarterly, 9 and
/// up as monthly.
pub fn frequency_bucket(count: usize) -> u32 {
    match count {
        0 => 0,
        1 => 1,
        2 => 2,
        3..=8 => 4,
        _ => 12,
    }
}

/// Events per calendar year. The first and last years in range are usually
/// partial, so each takes the adjacent year's count; a single-year series
/// keeps its raw count.
fn counts_by_year(events: &[DividendEvent]) -> BTreeMap<i32, usize> {
    let mut counts: BTreeMap<i32, usize> = BTreeMap::new();
    for event in events {
        *counts.entry(event.date.year()).or_insert(0) += 1;
    }

    let years: Vec<i32> = counts.keys().copied().collect();
    if years.len() >= 2 {
        let second = counts[&years[1]];
        counts.insert(years[0], second);
        let penultimate = counts[&years[years.len() - 2]];
        counts.insert(years[years.len() - 1], penultimate);
    }

    counts
}

/// Sum of event amounts per calendar year.
fn sums_by_year(events: &[DividendEvent]) -> BTreeMap<i32, f64> {
    let mut sums: BTreeMap<i32, f64> = BTreeMap::new();
    for event in events {
        *sums.entry(event.date.year()).or_insert(0.0) += event.amount;
    }
    sums
}

/// Centered rolling median over `window` events. Where the window is
/// incomplete at the series edges the raw amount stands, so edge events are
/// never dropped. Even windows behave as the next odd size.
fn smooth(events: &[DividendEvent], window: usize) -> Vec<f64> {
    let half = window / 2;
    events
        .iter()
        .enumerate()
        .map(|(i, event)| {
            if half == 0 || i < half || i + half >= events.len() {
                return event.amount;
            }
            let mut values: Vec<f64> = events[i - half..=i + half]
                .iter()
                .map(|e| e.amount)
                .collect();
            values.sort_by(|a, b| a.total_cmp(b));
            values[half]
        })
        .collect()
}

/// Build the annualized series. Low-frequency payers (mapped count below
/// quarterly) use the raw calendar-year sum, which a 5-event median would
/// over- or under-smooth; the rest use `smoothed × count`.
pub fn annualize(events: &[DividendEvent], smoothing_window: usize) -> Vec<DividendPoint> {
    let counts = counts_by_year(events);
    let sums = sums_by_year(events);
    let smoothed = smooth(events, smoothing_window);

    events
        .iter()
        .zip(smoothed)
        .map(|(event, smoothed)| {
            let year = event.date.year();
            let annual_count = frequency_bucket(counts.get(&year).copied().unwrap_or(0));
            let yearly = if annual_count <= 3 {
                sums.get(&year).copied().unwrap_or(0.0)
            } else {
                smoothed * f64::from(annual_count)
            };
            DividendPoint {
                date: event.date,
                amount: event.amount,
                smoothed,
                annual_count,
                yearly,
            }
        })
        .collect()
}
