//! CSV file price-history adapter.
//!
//! One file per ticker under a base directory, `{TICKER}.csv`, columns
//! `date,close,adj_close,dividend`.

use std::fs;
use std::io::ErrorKind;
use std::path::PathBuf;

use chrono::NaiveDate;

use crate::domain::error::FinboardError;
use crate::domain::period::Lookback;
use crate::domain::price_bar::{self, PriceBar};
use crate::ports::data_port::MarketDataPort;

pub struct CsvPriceAdapter {
    base_path: PathBuf,
}

impl CsvPriceAdapter {
    pub fn new(base_path: PathBuf) -> Self {
        Self { base_path }
    }

    fn csv_path(&self, ticker: &str) -> PathBuf {
        self.base_path.join(format!("{}.csv", ticker.to_uppercase()))
    }

    /// Tickers with a history file under the base directory.
    pub fn list_tickers(&self) -> Result<Vec<String>, FinboardError> {
        let entries = fs::read_dir(&self.base_path)?;
        let mut tickers = Vec::new();

        for entry in entries {
            let name = entry?.file_name();
            let name = name.to_string_lossy();
            if let Some(ticker) = name.strip_suffix(".csv") {
                tickers.push(ticker.to_string());
            }
        }

        tickers.sort();
        Ok(tickers)
    }
}

fn column<'a>(
    record: &'a csv::StringRecord,
    index: usize,
    name: &str,
    ticker: &str,
) -> Result<&'a str, FinboardError> {
    record.get(index).ok_or_else(|| FinboardError::DataSource {
        ticker: ticker.to_string(),
        reason: format!("missing {} column", name),
    })
}

fn parse_field(value: &str, name: &str, ticker: &str) -> Result<f64, FinboardError> {
    value.parse().map_err(|_| FinboardError::DataSource {
        ticker: ticker.to_string(),
        reason: format!("invalid {} value {:?}", name, value),
    })
}

impl MarketDataPort for CsvPriceAdapter {
    fn fetch_history(
        &self,
        ticker: &str,
        lookback: Lookback,
    ) -> Result<Vec<PriceBar>, FinboardError> {
        let path = self.csv_path(ticker);
        let content = fs::read_to_string(&path).map_err(|e| {
            if e.kind() == ErrorKind::NotFound {
                FinboardError::UnknownTicker {
                    ticker: ticker.to_string(),
                }
            } else {
                FinboardError::DataSource {
                    ticker: ticker.to_string(),
                    reason: format!("failed to read {}: {}", path.display(), e),
                }
            }
        })?;

        let mut rdr = csv::Reader::from_reader(content.as_bytes());
        let mut bars = Vec::new();

        for result in rdr.records() {
            let record = result.map_err(|e| FinboardError::DataSource {
                ticker: ticker.to_string(),
                reason: format!("CSV parse error: {}", e),
            })?;

            let date_str = column(&record, 0, "date", ticker)?;
            let date = NaiveDate::parse_from_str(date_str, "%Y-%m-%d").map_err(|e| {
                FinboardError::DataSource {
                    ticker: ticker.to_string(),
                    reason: format!("invalid date {:?}: {}", date_str, e),
                }
            })?;

            let close = parse_field(column(&record, 1, "close", ticker)?, "close", ticker)?;
            let adjusted_close = parse_field(
                column(&record, 2, "adj_close", ticker)?,
                "adj_close",
                ticker,
            )?;
            let dividend = parse_field(
                column(&record, 3, "dividend", ticker)?,
                "dividend",
                ticker,
            )?;

            bars.push(PriceBar {
                date,
                close,
                adjusted_close,
                dividend,
            });
        }

        let bars = price_bar::normalize_bars(bars);

        // The file holds full history; the lookback window is taken
        // relative to its last bar.
        if let Some(start) = bars.last().and_then(|last| lookback.start_from(last.date)) {
            return Ok(bars.into_iter().filter(|b| b.date >= start).collect());
        }
        Ok(bars)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn setup_test_data() -> (TempDir, PathBuf) {
        let dir = TempDir::new().unwrap();
        let path = dir.path().to_path_buf();

        let csv_content = "date,close,adj_close,dividend\n\
            2014-01-15,80.0,60.0,0.0\n\
            2022-01-17,100.0,90.0,0.0\n\
            2022-02-15,101.0,91.5,0.62\n\
            2022-03-15,102.0,93.0,0.0\n";

        fs::write(path.join("MSFT.csv"), csv_content).unwrap();
        fs::write(path.join("EMPTY.csv"), "date,close,adj_close,dividend\n").unwrap();

        (dir, path)
    }

    #[test]
    fn fetch_history_parses_bars() {
        let (_dir, path) = setup_test_data();
        let adapter = CsvPriceAdapter::new(path);

        let bars = adapter.fetch_history("MSFT", Lookback::Max).unwrap();
        assert_eq!(bars.len(), 4);
        assert_eq!(bars[2].date, NaiveDate::from_ymd_opt(2022, 2, 15).unwrap());
        assert_eq!(bars[2].close, 101.0);
        assert_eq!(bars[2].adjusted_close, 91.5);
        assert_eq!(bars[2].dividend, 0.62);
    }

    #[test]
    fn fetch_history_is_case_insensitive_on_ticker() {
        let (_dir, path) = setup_test_data();
        let adapter = CsvPriceAdapter::new(path);
        assert_eq!(adapter.fetch_history("msft", Lookback::Max).unwrap().len(), 4);
    }

    #[test]
    fn fetch_history_applies_lookback_window() {
        let (_dir, path) = setup_test_data();
        let adapter = CsvPriceAdapter::new(path);

        // Last bar is 2022-03-15; a 5y window excludes the 2014 bar.
        let bars = adapter.fetch_history("MSFT", Lookback::Years(5)).unwrap();
        assert_eq!(bars.len(), 3);
        assert_eq!(bars[0].date, NaiveDate::from_ymd_opt(2022, 1, 17).unwrap());
    }

    #[test]
    fn missing_file_is_unknown_ticker() {
        let (_dir, path) = setup_test_data();
        let adapter = CsvPriceAdapter::new(path);

        let err = adapter.fetch_history("XYZ", Lookback::Max).unwrap_err();
        assert!(matches!(err, FinboardError::UnknownTicker { .. }));
    }

    #[test]
    fn malformed_row_is_a_data_source_error() {
        let dir = TempDir::new().unwrap();
        fs::write(
            dir.path().join("BAD.csv"),
            "date,close,adj_close,dividend\n2022-01-17,abc,90.0,0.0\n",
        )
        .unwrap();
        let adapter = CsvPriceAdapter::new(dir.path().to_path_buf());

        let err = adapter.fetch_history("BAD", Lookback::Max).unwrap_err();
        assert!(matches!(err, FinboardError::DataSource { .. }));
    }

    #[test]
    fn empty_file_returns_no_bars() {
        let (_dir, path) = setup_test_data();
        let adapter = CsvPriceAdapter::new(path);
        assert!(adapter.fetch_history("EMPTY", Lookback::Max).unwrap().is_empty());
    }

    #[test]
    fn list_tickers_sorted() {
        let (_dir, path) = setup_test_data();
        let adapter = CsvPriceAdapter::new(path);
        assert_eq!(adapter.list_tickers().unwrap(), vec!["EMPTY", "MSFT"]);
    }
}
