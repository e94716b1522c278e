//! CSV fund-holdings dataset adapter.
//!
//! Reads the static reference dataset the allocation pages work from:
//! a funds file with columns `Fund,Ticker,Name,Sector,Asset Class,
//! Location,Weight (%)` and an optional individual-positions file with
//! columns `Ticker,Name,Sector,Asset Class,Location`.

use std::path::PathBuf;

use crate::domain::allocation::{Holding, StockPosition};
use crate::domain::error::FinboardError;
use crate::ports::holdings_port::HoldingsPort;

pub struct HoldingsCsvAdapter {
    funds_path: PathBuf,
    stocks_path: Option<PathBuf>,
}

impl HoldingsCsvAdapter {
    pub fn new(funds_path: PathBuf, stocks_path: Option<PathBuf>) -> Self {
        Self {
            funds_path,
            stocks_path,
        }
    }

    fn reader(path: &PathBuf) -> Result<csv::Reader<std::fs::File>, FinboardError> {
        csv::Reader::from_path(path).map_err(|e| FinboardError::Holdings {
            reason: format!("failed to open {}: {}", path.display(), e),
        })
    }
}

fn header_index(headers: &csv::StringRecord, name: &str) -> Result<usize, FinboardError> {
    headers
        .iter()
        .position(|h| h.trim() == name)
        .ok_or_else(|| FinboardError::Holdings {
            reason: format!("missing column {:?}", name),
        })
}

fn field(record: &csv::StringRecord, index: usize) -> String {
    record.get(index).unwrap_or_default().trim().to_string()
}

impl HoldingsPort for HoldingsCsvAdapter {
    fn list_funds(&self) -> Result<Vec<String>, FinboardError> {
        let mut funds = Vec::new();
        for holding in self.all_holdings()? {
            if !funds.contains(&holding.fund) {
                funds.push(holding.fund);
            }
        }
        Ok(funds)
    }

    fn fund_holdings(&self, fund: &str) -> Result<Vec<Holding>, FinboardError> {
        let holdings: Vec<Holding> = self
            .all_holdings()?
            .into_iter()
            .filter(|h| h.fund == fund)
            .collect();
        if holdings.is_empty() {
            return Err(FinboardError::UnknownFund(fund.to_string()));
        }
        Ok(holdings)
    }

    fn all_holdings(&self) -> Result<Vec<Holding>, FinboardError> {
        let mut rdr = Self::reader(&self.funds_path)?;
        let headers = rdr
            .headers()
            .map_err(|e| FinboardError::Holdings {
                reason: format!("failed to read header: {}", e),
            })?
            .clone();

        let fund = header_index(&headers, "Fund")?;
        let ticker = header_index(&headers, "Ticker")?;
        let name = header_index(&headers, "Name")?;
        let sector = header_index(&headers, "Sector")?;
        let asset_class = header_index(&headers, "Asset Class")?;
        let region = header_index(&headers, "Location")?;
        let weight = header_index(&headers, "Weight (%)")?;

        let mut holdings = Vec::new();
        for result in rdr.records() {
            let record = result.map_err(|e| FinboardError::Holdings {
                reason: format!("CSV parse error: {}", e),
            })?;

            let weight_str = field(&record, weight);
            let weight_pct: f64 =
                weight_str
                    .parse()
                    .map_err(|_| FinboardError::Holdings {
                        reason: format!("invalid weight {:?}", weight_str),
                    })?;

            holdings.push(Holding {
                fund: field(&record, fund),
                ticker: field(&record, ticker),
                name: field(&record, name),
                sector: field(&record, sector),
                asset_class: field(&record, asset_class),
                region: field(&record, region),
                weight_pct,
            });
        }

        Ok(holdings)
    }

    fn stock_positions(&self) -> Result<Vec<StockPosition>, FinboardError> {
        let Some(path) = &self.stocks_path else {
            return Ok(Vec::new());
        };

        let mut rdr = Self::reader(path)?;
        let headers = rdr
            .headers()
            .map_err(|e| FinboardError::Holdings {
                reason: format!("failed to read header: {}", e),
            })?
            .clone();

        let ticker = header_index(&headers, "Ticker")?;
        let name = header_index(&headers, "Name")?;
        let sector = header_index(&headers, "Sector")?;
        let asset_class = header_index(&headers, "Asset Class")?;
        let region = header_index(&headers, "Location")?;

        let mut positions = Vec::new();
        for result in rdr.records() {
            let record = result.map_err(|e| FinboardError::Holdings {
                reason: format!("CSV parse error: {}", e),
            })?;
            positions.push(StockPosition {
                ticker: field(&record, ticker),
                name: field(&record, name),
                sector: field(&record, sector),
                asset_class: field(&record, asset_class),
                region: field(&record, region),
            });
        }

        Ok(positions)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    const FUNDS_CSV: &str = "\
Fund,Ticker,Name,Sector,Asset Class,Location,Weight (%)
Core World,AAPL,Apple Inc,Information Technology,Equity,United States,4.5
Core World,ASML,ASML Holding,Information Technology,Equity,Netherlands,1.1
Core Europe,ASML,ASML Holding,Information Technology,Equity,Netherlands,3.9
Core Europe,NESN,Nestle SA,Consumer Staples,Equity,Switzerland,3.1
";

    const STOCKS_CSV: &str = "\
Ticker,Name,Sector,Asset Class,Location
MC,LVMH,Consumer Discretionary,Equity,France
AI,Air Liquide,Materials,Equity,France
";

    fn setup() -> (TempDir, HoldingsCsvAdapter) {
        let dir = TempDir::new().unwrap();
        let funds = dir.path().join("funds.csv");
        let stocks = dir.path().join("stocks.csv");
        fs::write(&funds, FUNDS_CSV).unwrap();
        fs::write(&stocks, STOCKS_CSV).unwrap();
        let adapter = HoldingsCsvAdapter::new(funds, Some(stocks));
        (dir, adapter)
    }

    #[test]
    fn list_funds_keeps_dataset_order() {
        let (_dir, adapter) = setup();
        assert_eq!(
            adapter.list_funds().unwrap(),
            vec!["Core World", "Core Europe"]
        );
    }

    #[test]
    fn fund_holdings_filters_by_fund() {
        let (_dir, adapter) = setup();
        let holdings = adapter.fund_holdings("Core Europe").unwrap();
        assert_eq!(holdings.len(), 2);
        assert_eq!(holdings[0].ticker, "ASML");
        assert_eq!(holdings[0].weight_pct, 3.9);
        assert_eq!(holdings[1].region, "Switzerland");
    }

    #[test]
    fn unknown_fund_is_an_error() {
        let (_dir, adapter) = setup();
        let err = adapter.fund_holdings("Nope").unwrap_err();
        assert!(matches!(err, FinboardError::UnknownFund(_)));
    }

    #[test]
    fn stock_positions_load() {
        let (_dir, adapter) = setup();
        let stocks = adapter.stock_positions().unwrap();
        assert_eq!(stocks.len(), 2);
        assert_eq!(stocks[0].ticker, "MC");
        assert_eq!(stocks[1].sector, "Materials");
    }

    #[test]
    fn stocks_file_is_optional() {
        let dir = TempDir::new().unwrap();
        let funds = dir.path().join("funds.csv");
        fs::write(&funds, FUNDS_CSV).unwrap();
        let adapter = HoldingsCsvAdapter::new(funds, None);
        assert!(adapter.stock_positions().unwrap().is_empty());
    }

    #[test]
    fn missing_column_is_a_holdings_error() {
        let dir = TempDir::new().unwrap();
        let funds = dir.path().join("funds.csv");
        fs::write(&funds, "Fund,Ticker\nF,A\n").unwrap();
        let adapter = HoldingsCsvAdapter::new(funds, None);

        let err = adapter.all_holdings().unwrap_err();
        assert!(matches!(err, FinboardError::Holdings { .. }));
    }
}
