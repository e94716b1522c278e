//! Market data access port trait.

use crate::domain::error::FinboardError;
use crate::domain::period::Lookback;
use crate::domain::price_bar::PriceBar;

pub trait MarketDataPort {
    /// Daily history for one ticker over the lookback window, sorted by
    /// date with no duplicate days.
    fn fetch_history(&self, ticker: &str, lookback: Lookback)
    -> Result<Vec<PriceBar>, FinboardError>;
}

impl<P: MarketDataPort + ?Sized> MarketDataPort for Box<P> {
    fn fetch_history(
        &self,
        ticker: &str,
        lookback: Lookback,
    ) -> Result<Vec<PriceBar>, FinboardError> {
        (**self).fetch_history(ticker, lookback)
    }
}
