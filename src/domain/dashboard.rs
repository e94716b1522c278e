//! Per-page orchestration: fetch, normalize, summarize.
//!
//! Each view is one fetch plus one computation pass, request-scoped, with
//! no shared mutable state. The web and CLI adapters only render what
//! these functions return.

use crate::domain::dividends::DividendPoint;
use crate::domain::error::FinboardError;
use crate::domain::normalizer::{self, DailyDividendPoint, NormalizedDividends, NormalizerConfig};
use crate::domain::period::Lookback;
use crate::domain::returns::{self, ReturnPoint};
use crate::domain::stats::{self, DividendGrowth};
use crate::ports::data_port::MarketDataPort;

/// Extra history fetched for dividend analysis so the partial first year
/// and the growth baseline sit outside the displayed window.
const DIVIDEND_HEADROOM_YEARS: u32 = 1;

/// Everything the dividends page shows for one ticker.
#[derive(Debug, Clone)]
pub struct DividendView {
    pub ticker: String,
    pub period: Lookback,
    pub events: Vec<DividendPoint>,
    pub daily: Vec<DailyDividendPoint>,
    pub latest_yearly: f64,
    pub current_yield: Option<f64>,
    pub median_yield: Option<f64>,
    pub growth: Option<DividendGrowth>,
    pub yield_deciles: Option<Vec<f64>>,
    pub yield_percentile: Option<f64>,
}

pub fn dividend_view(
    data: &dyn MarketDataPort,
    ticker: &str,
    period: Lookback,
    config: &NormalizerConfig,
) -> Result<DividendView, FinboardError> {
    let bars = data.fetch_history(ticker, period.with_headroom(DIVIDEND_HEADROOM_YEARS))?;
    if bars.is_empty() {
        return Err(FinboardError::UnknownTicker {
            ticker: ticker.to_string(),
        });
    }

    let NormalizedDividends { events, mut daily } = normalizer::normalize(ticker, &bars, config)?;

    // The headroom year only warms up the forward fill and year counts;
    // the displayed series is the requested window.
    if let Some(last) = bars.last() {
        if let Some(start) = period.start_from(last.date) {
            daily.retain(|p| p.date >= start);
        }
    }

    let yields: Vec<f64> = daily.iter().filter_map(|p| p.dividend_yield).collect();
    let latest_yearly = daily.last().map(|p| p.yearly_dividend).unwrap_or(0.0);
    let current_yield = daily.last().and_then(|p| p.dividend_yield);

    Ok(DividendView {
        ticker: ticker.to_string(),
        period,
        latest_yearly,
        current_yield,
        median_yield: stats::median(&yields),
        growth: stats::dividend_growth(&events),
        yield_deciles: stats::yield_deciles(&yields),
        yield_percentile: current_yield.and_then(|y| stats::percentile_rank(&yields, y)),
        events,
        daily,
    })
}

/// Everything the total-return page shows for one ticker.
#[derive(Debug, Clone)]
pub struct ReturnView {
    pub ticker: String,
    pub period: Lookback,
    pub points: Vec<ReturnPoint>,
    pub price_return: f64,
    pub total_return: f64,
    pub max_price_drawdown: f64,
    pub max_total_drawdown: f64,
}

pub fn return_view(
    data: &dyn MarketDataPort,
    ticker: &str,
    period: Lookback,
) -> Result<ReturnView, FinboardError> {
    let bars = data.fetch_history(ticker, period)?;
    let points = returns::compute_returns(&bars);
    let Some(last) = points.last() else {
        return Err(FinboardError::UnknownTicker {
            ticker: ticker.to_string(),
        });
    };

    let (price_return, total_return) = (last.price_return, last.total_return);
    let (max_price_drawdown, max_total_drawdown) = returns::max_drawdowns(&points);

    Ok(ReturnView {
        ticker: ticker.to_string(),
        period,
        price_return,
        total_return,
        max_price_drawdown,
        max_total_drawdown,
        points,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::price_bar::PriceBar;
    use approx::assert_relative_eq;
    use chrono::{Datelike, Duration, NaiveDate};

    /// Fixed in-memory data source: five years of flat $100 closes with
    /// quarterly $0.50 dividends, regardless of the requested window.
    struct FlatQuarterly;

    impl MarketDataPort for FlatQuarterly {
        fn fetch_history(
            &self,
            ticker: &str,
            _lookback: Lookback,
        ) -> Result<Vec<PriceBar>, FinboardError> {
            if ticker == "NOPE" {
                return Ok(Vec::new());
            }
            let start = NaiveDate::from_ymd_opt(2019, 1, 1).unwrap();
            Ok((0..365 * 5)
                .map(|offset| {
                    let date = start + Duration::days(offset);
                    let dividend = if date.day() == 15 && [2, 5, 8, 11].contains(&date.month()) {
                        0.5
                    } else {
                        0.0
                    };
                    PriceBar {
                        date,
                        close: 100.0,
                        adjusted_close: 100.0,
                        dividend,
                    }
                })
                .collect())
        }
    }

    #[test]
    fn dividend_view_flat_quarterly() {
        let view = dividend_view(
            &FlatQuarterly,
            "FLAT",
            Lookback::Years(3),
            &NormalizerConfig::default(),
        )
        .unwrap();

        assert_relative_eq!(view.latest_yearly, 2.0);
        assert_relative_eq!(view.current_yield.unwrap(), 0.02);
        assert_relative_eq!(view.median_yield.unwrap(), 0.02);
        assert!(view.events.iter().all(|e| e.annual_count == 4));
    }

    #[test]
    fn dividend_view_trims_to_requested_window() {
        let view = dividend_view(
            &FlatQuarterly,
            "FLAT",
            Lookback::Years(2),
            &NormalizerConfig::default(),
        )
        .unwrap();

        let last = NaiveDate::from_ymd_opt(2019, 1, 1).unwrap() + Duration::days(365 * 5 - 1);
        let window_start = Lookback::Years(2).start_from(last).unwrap();
        assert!(view.daily.first().unwrap().date >= window_start);
    }

    #[test]
    fn dividend_view_unknown_ticker() {
        let err = dividend_view(
            &FlatQuarterly,
            "NOPE",
            Lookback::Years(5),
            &NormalizerConfig::default(),
        )
        .unwrap_err();
        assert!(matches!(err, FinboardError::UnknownTicker { .. }));
    }

    #[test]
    fn return_view_flat_series() {
        let view = return_view(&FlatQuarterly, "FLAT", Lookback::Years(5)).unwrap();
        assert_relative_eq!(view.price_return, 0.0);
        assert_relative_eq!(view.total_return, 0.0);
        assert_relative_eq!(view.max_price_drawdown, 0.0);
        assert_relative_eq!(view.points[0].price_return, 0.0);
    }

    #[test]
    fn return_view_unknown_ticker() {
        let err = return_view(&FlatQuarterly, "NOPE", Lookback::Years(5)).unwrap_err();
        assert!(matches!(err, FinboardError::UnknownTicker { .. }));
    }
}
