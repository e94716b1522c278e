//! Fund holdings dataset port trait.

use crate::domain::allocation::{Holding, StockPosition};
use crate::domain::error::FinboardError;

pub trait HoldingsPort {
    /// Distinct fund names, in dataset order.
    fn list_funds(&self) -> Result<Vec<String>, FinboardError>;

    /// Rows of one fund; `UnknownFund` if the dataset has no such fund.
    fn fund_holdings(&self, fund: &str) -> Result<Vec<Holding>, FinboardError>;

    /// Every row of the dataset.
    fn all_holdings(&self) -> Result<Vec<Holding>, FinboardError>;

    /// Individual positions available for portfolio aggregation. Default:
    /// none configured.
    fn stock_positions(&self) -> Result<Vec<StockPosition>, FinboardError> {
        Ok(Vec::new())
    }
}
