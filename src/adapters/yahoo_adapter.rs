//! Yahoo Finance chart API adapter.
//!
//! Fetches daily close, adjusted close and dividend events from the v8
//! chart endpoint. One request per (ticker, lookback); no caching here —
//! wrap in [`crate::adapters::sqlite_cache_adapter`] for that.

use chrono::{DateTime, Utc};
use serde_json::Value;

use crate::domain::error::FinboardError;
use crate::domain::period::Lookback;
use crate::domain::price_bar::{self, PriceBar};
use crate::ports::data_port::MarketDataPort;

const BASE_URL: &str = "https://query1.finance.yahoo.com/v8/finance/chart";
const USER_AGENT: &str = "Mozilla/5.0 (Macintosh; Intel Mac OS X 10_15_7) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/120.0.0.0 Safari/537.36";

const SECONDS_PER_YEAR: f64 = 365.2425 * 86_400.0;

pub struct YahooAdapter {
    client: reqwest::blocking::Client,
    base_url: String,
}

impl YahooAdapter {
    pub fn new() -> Result<Self, FinboardError> {
        Self::with_base_url(BASE_URL.to_string())
    }

    pub fn with_base_url(base_url: String) -> Result<Self, FinboardError> {
        let client = reqwest::blocking::Client::builder()
            .user_agent(USER_AGENT)
            .build()
            .map_err(|e| FinboardError::DataSource {
                ticker: String::new(),
                reason: format!("failed to build HTTP client: {}", e),
            })?;
        Ok(Self { client, base_url })
    }

    fn history_url(&self, ticker: &str, lookback: Lookback) -> String {
        let now = Utc::now().timestamp();
        let period1 = match lookback {
            Lookback::Max => 0,
            Lookback::Years(n) => now - (f64::from(n) * SECONDS_PER_YEAR) as i64,
        };
        format!(
            "{}/{}?period1={}&period2={}&interval=1d&events=div",
            self.base_url,
            urlencoding::encode(ticker),
            period1,
            now
        )
    }
}

impl MarketDataPort for YahooAdapter {
    fn fetch_history(
        &self,
        ticker: &str,
        lookback: Lookback,
    ) -> Result<Vec<PriceBar>, FinboardError> {
        let url = self.history_url(ticker, lookback);
        log::debug!("fetching {} history ({}) from {}", ticker, lookback, url);

        let response =
            self.client
                .get(&url)
                .send()
                .map_err(|e| FinboardError::DataSource {
                    ticker: ticker.to_string(),
                    reason: format!("request failed: {}", e),
                })?;

        let status = response.status();
        if status == reqwest::StatusCode::NOT_FOUND {
            return Err(FinboardError::UnknownTicker {
                ticker: ticker.to_string(),
            });
        }
        if !status.is_success() {
            return Err(FinboardError::DataSource {
                ticker: ticker.to_string(),
                reason: format!("HTTP {}", status),
            });
        }

        let data: Value = response.json().map_err(|e| FinboardError::DataSource {
            ticker: ticker.to_string(),
            reason: format!("invalid JSON: {}", e),
        })?;

        parse_chart(ticker, &data)
    }
}

fn parse_chart(ticker: &str, data: &Value) -> Result<Vec<PriceBar>, FinboardError> {
    let chart = data.get("chart").ok_or_else(|| FinboardError::DataSource {
        ticker: ticker.to_string(),
        reason: "missing chart object".into(),
    })?;

    // Yahoo reports bad symbols inside the payload, not via the status.
    if let Some(error) = chart.get("error").filter(|e| !e.is_null()) {
        let description = error
            .get("description")
            .and_then(|d| d.as_str())
            .unwrap_or("no description");
        log::debug!("chart error for {}: {}", ticker, description);
        return Err(FinboardError::UnknownTicker {
            ticker: ticker.to_string(),
        });
    }

    let result = chart
        .get("result")
        .and_then(|r| r.get(0))
        .ok_or_else(|| FinboardError::UnknownTicker {
            ticker: ticker.to_string(),
        })?;

    let timestamps = result
        .get("timestamp")
        .and_then(|t| t.as_array())
        .ok_or_else(|| FinboardError::UnknownTicker {
            ticker: ticker.to_string(),
        })?;

    let closes = result
        .get("indicators")
        .and_then(|i| i.get("quote"))
        .and_then(|q| q.get(0))
        .and_then(|q| q.get("close"))
        .and_then(|c| c.as_array())
        .ok_or_else(|| FinboardError::DataSource {
            ticker: ticker.to_string(),
            reason: "missing close series".into(),
        })?;

    let adjusted = result
        .get("indicators")
        .and_then(|i| i.get("adjclose"))
        .and_then(|a| a.get(0))
        .and_then(|a| a.get("adjclose"))
        .and_then(|a| a.as_array());

    let dividends = parse_dividends(result);

    let mut bars = Vec::with_capacity(timestamps.len());
    for (i, ts) in timestamps.iter().enumerate() {
        // Holidays and half-days come through as nulls.
        let Some(ts) = ts.as_i64() else { continue };
        let Some(close) = closes.get(i).and_then(Value::as_f64) else {
            continue;
        };
        let Some(date) = DateTime::from_timestamp(ts, 0).map(|dt| dt.date_naive()) else {
            continue;
        };
        let adjusted_close = adjusted
            .and_then(|a| a.get(i))
            .and_then(Value::as_f64)
            .unwrap_or(close);
        let dividend = dividends
            .iter()
            .find(|(d, _)| *d == date)
            .map(|(_, amount)| *amount)
            .unwrap_or(0.0);

        bars.push(PriceBar {
            date,
            close,
            adjusted_close,
            dividend,
        });
    }

    let bars = price_bar::normalize_bars(bars);
    if bars.is_empty() {
        return Err(FinboardError::UnknownTicker {
            ticker: ticker.to_string(),
        });
    }

    log::debug!("{}: {} bars, {} dividend events", ticker, bars.len(), dividends.len());
    Ok(bars)
}

fn parse_dividends(result: &Value) -> Vec<(chrono::NaiveDate, f64)> {
    let mut dividends = Vec::new();

    let Some(events) = result
        .get("events")
        .and_then(|e| e.get("dividends"))
        .and_then(|d| d.as_object())
    else {
        return dividends;
    };

    for entry in events.values() {
        let Some(ts) = entry.get("date").and_then(|d| d.as_i64()) else {
            continue;
        };
        let Some(amount) = entry.get("amount").and_then(|a| a.as_f64()) else {
            continue;
        };
        if let Some(date) = DateTime::from_timestamp(ts, 0).map(|dt| dt.date_naive()) {
            dividends.push((date, amount));
        }
    }

    dividends.sort_by_key(|(date, _)| *date);
    dividends
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;
    use serde_json::json;

    fn ts(date: &str) -> i64 {
        NaiveDate::parse_from_str(date, "%Y-%m-%d")
            .unwrap()
            .and_hms_opt(14, 30, 0)
            .unwrap()
            .and_utc()
            .timestamp()
    }

    fn payload() -> Value {
        json!({
            "chart": {
                "result": [{
                    "timestamp": [ts("2024-01-15"), ts("2024-01-16"), ts("2024-01-17")],
                    "indicators": {
                        "quote": [{"close": [100.0, null, 102.0]}],
                        "adjclose": [{"adjclose": [90.0, null, 92.0]}]
                    },
                    "events": {
                        "dividends": {
                            "1705329000": {"amount": 0.62, "date": ts("2024-01-15")}
                        }
                    }
                }],
                "error": null
            }
        })
    }

    #[test]
    fn parse_chart_builds_bars() {
        let bars = parse_chart("MSFT", &payload()).unwrap();
        assert_eq!(bars.len(), 2);
        assert_eq!(bars[0].date, NaiveDate::from_ymd_opt(2024, 1, 15).unwrap());
        assert_eq!(bars[0].close, 100.0);
        assert_eq!(bars[0].adjusted_close, 90.0);
        assert_eq!(bars[0].dividend, 0.62);
        assert_eq!(bars[1].dividend, 0.0);
    }

    #[test]
    fn null_closes_are_skipped() {
        let bars = parse_chart("MSFT", &payload()).unwrap();
        assert!(bars.iter().all(|b| b.date != NaiveDate::from_ymd_opt(2024, 1, 16).unwrap()));
    }

    #[test]
    fn chart_error_is_unknown_ticker() {
        let data = json!({
            "chart": {
                "result": null,
                "error": {"code": "Not Found", "description": "No data found"}
            }
        });
        let err = parse_chart("NOPE", &data).unwrap_err();
        assert!(matches!(err, FinboardError::UnknownTicker { .. }));
    }

    #[test]
    fn missing_adjclose_falls_back_to_close() {
        let data = json!({
            "chart": {
                "result": [{
                    "timestamp": [ts("2024-01-15")],
                    "indicators": {"quote": [{"close": [100.0]}]}
                }],
                "error": null
            }
        });
        let bars = parse_chart("MSFT", &data).unwrap();
        assert_eq!(bars[0].adjusted_close, 100.0);
    }

    #[test]
    fn empty_result_is_unknown_ticker() {
        let data = json!({"chart": {"result": [], "error": null}});
        assert!(matches!(
            parse_chart("NOPE", &data).unwrap_err(),
            FinboardError::UnknownTicker { .. }
        ));
    }

    #[test]
    fn history_url_uses_encoded_ticker_and_window() {
        let adapter = YahooAdapter::with_base_url("http://localhost/chart".into()).unwrap();
        let url = adapter.history_url("^GSPC", Lookback::Max);
        assert!(url.starts_with("http://localhost/chart/%5EGSPC?period1=0&period2="));
        assert!(url.ends_with("&interval=1d&events=div"));
    }
}
