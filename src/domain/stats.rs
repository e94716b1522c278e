//! Summary statistics over the normalized series.

use chrono::Duration;

use crate::domain::dividends::DividendPoint;

const DAYS_PER_YEAR: f64 = 365.2425;

/// Median via the interpolated quantile.
pub fn median(values: &[f64]) -> Option<f64> {
    quantile(values, 0.5)
}

/// Linearly interpolated quantile for `q` in `[0, 1]`.
pub fn quantile(values: &[f64], q: f64) -> Option<f64> {
    if values.is_empty() || !(0.0..=1.0).contains(&q) {
        return None;
    }
    let mut sorted = values.to_vec();
    sorted.sort_by(|a, b| a.total_cmp(b));

    let pos = q * (sorted.len() - 1) as f64;
    let lo = pos.floor() as usize;
    let hi = pos.ceil() as usize;
    if lo == hi {
        Some(sorted[lo])
    } else {
        Some(sorted[lo] + (sorted[hi] - sorted[lo]) * (pos - lo as f64))
    }
}

/// Growth of the yearly dividend run-rate over the series.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DividendGrowth {
    /// Total growth from the baseline event to the last.
    pub growth: f64,
    /// Compound annual growth rate over the same span.
    pub cagr: f64,
}

/// Growth from the first event at least one full year into the series to
/// the last event. The one-year skip keeps a partial first calendar year
/// from setting an inflated or deflated baseline.
pub fn dividend_growth(points: &[DividendPoint]) -> Option<DividendGrowth> {
    let first = points.first()?;
    let cutoff = first.date + Duration::days(365);
    let baseline = points.iter().find(|p| p.date > cutoff)?;
    let last = points.last()?;

    if last.date <= baseline.date || baseline.yearly <= 0.0 {
        return None;
    }

    let growth = last.yearly / baseline.yearly - 1.0;
    let years = last.date.signed_duration_since(baseline.date).num_days() as f64 / DAYS_PER_YEAR;
    if years <= 0.0 {
        return None;
    }
    let cagr = (1.0 + growth).powf(1.0 / years) - 1.0;

    Some(DividendGrowth { growth, cagr })
}

/// Decile quantiles (0%, 10%, …, 100%) of the daily yield series, for the
/// yield percentile chart.
pub fn yield_deciles(yields: &[f64]) -> Option<Vec<f64>> {
    if yields.is_empty() {
        return None;
    }
    Some(
        (0..=10)
            .filter_map(|decile| quantile(yields, f64::from(decile) / 10.0))
            .collect(),
    )
}

/// Fraction of observed values at or below `value`.
pub fn percentile_rank(values: &[f64], value: f64) -> Option<f64> {
    if values.is_empty() {
        return None;
    }
    let at_or_below = values.iter().filter(|&&v| v <= value).count();
    Some(at_or_below as f64 / values.len() as f64)
}
