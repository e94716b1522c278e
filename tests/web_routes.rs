#![cfg(feature = "web")]

//! Router-level tests: requests in, rendered HTML out, no real network.

use axum::Router;
use axum::body::Body;
use axum::http::{Request, StatusCode, header};
use chrono::{Datelike, Duration, NaiveDate};
use http_body_util::BodyExt;
use std::sync::Arc;
use tower::util::ServiceExt;

use finboard::adapters::chart_svg::ChartTheme;
use finboard::adapters::web::{AppState, build_router};
use finboard::domain::allocation::{Holding, StockPosition};
use finboard::domain::error::FinboardError;
use finboard::domain::normalizer::NormalizerConfig;
use finboard::domain::period::Lookback;
use finboard::domain::price_bar::PriceBar;
use finboard::ports::data_port::MarketDataPort;
use finboard::ports::holdings_port::HoldingsPort;

/// Four years of flat $100 closes with quarterly $0.50 dividends.
struct StubData;

impl MarketDataPort for StubData {
    fn fetch_history(
        &self,
        ticker: &str,
        _lookback: Lookback,
    ) -> Result<Vec<PriceBar>, FinboardError> {
        if ticker == "NOPE" {
            return Err(FinboardError::UnknownTicker {
                ticker: ticker.to_string(),
            });
        }
        let start = NaiveDate::from_ymd_opt(2020, 1, 1).unwrap();
        Ok((0..365 * 4)
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

struct StubHoldings;

fn holding(fund: &str, ticker: &str, sector: &str, weight: f64) -> Holding {
    Holding {
        fund: fund.to_string(),
        ticker: ticker.to_string(),
        name: format!("{} Inc", ticker),
        sector: sector.to_string(),
        asset_class: "Equity".to_string(),
        region: "United States".to_string(),
        weight_pct: weight,
    }
}

impl HoldingsPort for StubHoldings {
    fn list_funds(&self) -> Result<Vec<String>, FinboardError> {
        Ok(vec!["Core World".to_string()])
    }

    fn fund_holdings(&self, fund: &str) -> Result<Vec<Holding>, FinboardError> {
        if fund != "Core World" {
            return Err(FinboardError::UnknownFund(fund.to_string()));
        }
        self.all_holdings()
    }

    fn all_holdings(&self) -> Result<Vec<Holding>, FinboardError> {
        Ok(vec![
            holding("Core World", "AAPL", "Information Technology", 60.0),
            holding("Core World", "JNJ", "Health Care", 40.0),
        ])
    }

    fn stock_positions(&self) -> Result<Vec<StockPosition>, FinboardError> {
        Ok(vec![StockPosition {
            ticker: "MC".to_string(),
            name: "LVMH".to_string(),
            sector: "Consumer Discretionary".to_string(),
            asset_class: "Equity".to_string(),
            region: "France".to_string(),
        }])
    }
}

fn router() -> Router {
    build_router(AppState {
        data_port: Arc::new(StubData),
        holdings_port: Arc::new(StubHoldings),
        normalizer: NormalizerConfig::default(),
        theme: ChartTheme::default(),
    })
}

async fn body_text(response: axum::response::Response) -> String {
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    String::from_utf8(bytes.to_vec()).unwrap()
}

fn form_post(uri: &str, body: &str) -> Request<Body> {
    Request::builder()
        .method("POST")
        .uri(uri)
        .header(header::CONTENT_TYPE, "application/x-www-form-urlencoded")
        .header("HX-Request", "true")
        .body(Body::from(body.to_string()))
        .unwrap()
}

#[tokio::test]
async fn index_renders() {
    let response = router()
        .oneshot(Request::builder().uri("/").body(Body::empty()).unwrap())
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    assert!(body_text(response).await.contains("Finboard"));
}

#[tokio::test]
async fn unknown_route_is_404() {
    let response = router()
        .oneshot(Request::builder().uri("/nope").body(Body::empty()).unwrap())
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn dividends_run_renders_report() {
    let response = router()
        .oneshot(form_post("/dividends/run", "ticker=FLAT&period=3y"))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let body = body_text(response).await;
    assert!(body.contains("FLAT dividends (3y)"));
    assert!(body.contains("Annual dividends"));
    assert!(body.contains("$2.00"));
    assert!(body.contains("<svg"));
}

#[tokio::test]
async fn dividends_run_unknown_ticker_is_422() {
    let response = router()
        .oneshot(form_post("/dividends/run", "ticker=NOPE&period=5y"))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);
}

#[tokio::test]
async fn dividends_run_bad_period_is_400() {
    let response = router()
        .oneshot(form_post("/dividends/run", "ticker=FLAT&period=forever"))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn returns_run_renders_report() {
    let response = router()
        .oneshot(form_post("/returns/run", "ticker=FLAT&period=3y"))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let body = body_text(response).await;
    assert!(body.contains("FLAT returns (3y)"));
    assert!(body.contains("Max total drawdown"));
}

#[tokio::test]
async fn funds_show_renders_breakdown() {
    let response = router()
        .oneshot(form_post("/funds/show", "fund=Core+World"))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let body = body_text(response).await;
    assert!(body.contains("Core World"));
    assert!(body.contains("Information Technology"));
    assert!(body.contains("Top 10 concentration"));
}

#[tokio::test]
async fn funds_show_unknown_fund_is_422() {
    let response = router()
        .oneshot(form_post("/funds/show", "fund=Nope"))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);
}

#[tokio::test]
async fn portfolio_run_aggregates() {
    let body = "name=&etfs=Core+World%3D1000&stocks=MC%3D500";
    let response = router()
        .oneshot(form_post("/portfolio/run", body))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let text = body_text(response).await;
    assert!(text.contains("Aggregated portfolio"));
    assert!(text.contains("$1500.00"));
    assert!(text.contains("MC"));
}

#[tokio::test]
async fn portfolio_run_unknown_fund_is_422() {
    let response = router()
        .oneshot(form_post("/portfolio/run", "name=&etfs=Nope%3D100&stocks="))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);
}

#[tokio::test]
async fn portfolio_run_requires_holdings() {
    let response = router()
        .oneshot(form_post("/portfolio/run", "name=&etfs=&stocks="))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}
