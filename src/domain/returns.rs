//! Price and total return series with drawdowns.

use chrono::NaiveDate;

use crate::domain::price_bar::PriceBar;

/// Returns and drawdowns for one trading day, all relative to the first
/// valid bar of the window. Total return uses the adjusted close, which
/// already embeds reinvested dividends.
#[derive(Debug, Clone)]
pub struct ReturnPoint {
    pub date: NaiveDate,
    pub price_return: f64,
    pub total_return: f64,
    pub price_drawdown: f64,
    pub total_drawdown: f64,
}

/// Compute the return series. Bars with a non-positive or non-finite price
/// are excluded points; they neither crash the computation nor reset the
/// running peaks.
pub fn compute_returns(bars: &[PriceBar]) -> Vec<ReturnPoint> {
    let mut points = Vec::with_capacity(bars.len());
    let mut base: Option<(f64, f64)> = None;
    let mut peak_close = f64::NEG_INFINITY;
    let mut peak_adjusted = f64::NEG_INFINITY;

    for bar in bars {
        if !bar.has_valid_prices() {
            continue;
        }
        let (base_close, base_adjusted) = *base.get_or_insert((bar.close, bar.adjusted_close));
        peak_close = peak_close.max(bar.close);
        peak_adjusted = peak_adjusted.max(bar.adjusted_close);

        points.push(ReturnPoint {
            date: bar.date,
            price_return: bar.close / base_close - 1.0,
            total_return: bar.adjusted_close / base_adjusted - 1.0,
            price_drawdown: bar.close / peak_close - 1.0,
            total_drawdown: bar.adjusted_close / peak_adjusted - 1.0,
        });
    }

    points
}

/// Deepest price and total drawdown over the series.
pub fn max_drawdowns(points: &[ReturnPoint]) -> (f64, f64) {
    points.iter().fold((0.0_f64, 0.0_f64), |(price, total), p| {
        (price.min(p.price_drawdown), total.min(p.total_drawdown))
    })
}
