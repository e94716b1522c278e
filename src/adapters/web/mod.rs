//! Web dashboard adapter.
//!
//! Axum server with an HTMX frontend: one page per analysis (dividends,
//! total return, fund composition, portfolio aggregation). Portfolios are
//! saved per browser session via a signed session cookie.

mod error;
mod handlers;
mod templates;

pub use error::WebError;
pub use handlers::*;
pub use templates::*;

use axum::{
    Router,
    routing::{get, post},
};
use std::sync::Arc;
use time::Duration;
use tower_sessions::{Expiry, MemoryStore, SessionManagerLayer, cookie::Key};

use crate::adapters::chart_svg::ChartTheme;
use crate::domain::normalizer::NormalizerConfig;
use crate::ports::data_port::MarketDataPort;
use crate::ports::holdings_port::HoldingsPort;

pub struct AppState {
    pub data_port: Arc<dyn MarketDataPort + Send + Sync>,
    pub holdings_port: Arc<dyn HoldingsPort + Send + Sync>,
    pub normalizer: NormalizerConfig,
    pub theme: ChartTheme,
}

pub fn build_router(state: AppState) -> Router {
    let session_layer = SessionManagerLayer::new(MemoryStore::default())
        .with_secure(false)
        .with_signed(Key::generate())
        .with_expiry(Expiry::OnInactivity(Duration::days(30)));

    Router::new()
        .route("/", get(handlers::index))
        .route("/dividends", get(handlers::dividends_page))
        .route("/dividends/run", post(handlers::dividends_run))
        .route("/returns", get(handlers::returns_page))
        .route("/returns/run", post(handlers::returns_run))
        .route("/funds", get(handlers::funds_page))
        .route("/funds/show", post(handlers::funds_show))
        .route("/portfolio", get(handlers::portfolio_page))
        .route("/portfolio/run", post(handlers::portfolio_run))
        .route("/portfolio/save", post(handlers::portfolio_save))
        .route("/portfolio/delete", post(handlers::portfolio_delete))
        .fallback(handlers::not_found)
        .layer(session_layer)
        .with_state(Arc::new(state))
}

fn is_htmx_request(headers: &axum::http::HeaderMap) -> bool {
    headers.get("HX-Request").is_some()
}
