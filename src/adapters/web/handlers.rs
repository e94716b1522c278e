//! HTTP request handlers for the web adapter.

use axum::{
    Form,
    extract::{Query, State},
    http::{HeaderMap, StatusCode},
    response::{Html, IntoResponse, Response},
};
use std::collections::BTreeMap;
use std::sync::Arc;
use tower_sessions::Session;

use crate::adapters::chart_svg;
use crate::domain::dashboard;
use crate::domain::error::FinboardError;
use crate::domain::period::{Lookback, PERIOD_CHOICES};
use crate::domain::allocation;
use crate::domain::portfolio::{SavedPortfolio, parse_holdings};

use super::templates::{
    DividendReportTemplate, DividendsPageTemplate, ErrorTemplate, EventRow, FundReportTemplate,
    FundsPageTemplate, HoldingRow, IndexTemplate, LineRow, PortfolioPageTemplate,
    PortfolioReportTemplate, ReturnReportTemplate, ReturnsPageTemplate, StockRow,
};
use super::{AppState, WebError, is_htmx_request};

const SESSION_PORTFOLIOS_KEY: &str = "portfolios";

type SavedPortfolios = BTreeMap<String, SavedPortfolio>;

/// Render a full page. Fragments are hand-built; full pages go through
/// askama so they pick up the base layout.
fn render_full<T: askama::Template>(template: T) -> Result<Response, WebError> {
    let html = template
        .render()
        .map_err(|e| WebError::internal(e.to_string()))?;
    Ok(Html(html).into_response())
}

fn fmt_money(value: f64) -> String {
    format!("${:.2}", value)
}

fn fmt_pct(value: f64) -> String {
    format!("{:.2}%", value * 100.0)
}

fn fmt_signed_pct(value: f64) -> String {
    format!("{:+.1}%", value * 100.0)
}

fn fmt_opt(value: Option<String>) -> String {
    value.unwrap_or_else(|| "n/a".to_string())
}

fn periods() -> Vec<String> {
    PERIOD_CHOICES.iter().map(|p| p.to_string()).collect()
}

fn parse_period(input: &str) -> Result<Lookback, WebError> {
    input
        .parse()
        .map_err(|e: crate::domain::period::PeriodParseError| WebError::bad_request(e.to_string()))
}

fn clean_ticker(input: &str) -> Result<String, WebError> {
    let ticker = input.trim().to_uppercase();
    if ticker.is_empty() {
        return Err(WebError::bad_request("ticker is required"));
    }
    Ok(ticker)
}

pub async fn index(headers: HeaderMap) -> Result<Response, WebError> {
    let template = IndexTemplate;
    if is_htmx_request(&headers) {
        Ok(Html(template.fragment()).into_response())
    } else {
        render_full(template)
    }
}

pub async fn not_found() -> WebError {
    WebError::new(StatusCode::NOT_FOUND, "page not found")
}

pub async fn dividends_page(
    State(_state): State<Arc<AppState>>,
    headers: HeaderMap,
) -> Result<Response, WebError> {
    let template = DividendsPageTemplate {
        periods: periods(),
        default_period: "15y".to_string(),
    };
    if is_htmx_request(&headers) {
        Ok(Html(template.fragment()).into_response())
    } else {
        render_full(template)
    }
}

#[derive(Debug, serde::Deserialize)]
pub struct TickerPeriodForm {
    pub ticker: String,
    pub period: String,
}

pub async fn dividends_run(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    Form(form): Form<TickerPeriodForm>,
) -> Result<Response, WebError> {
    let ticker = clean_ticker(&form.ticker)?;
    let period = parse_period(&form.period)?;

    let data_port = state.data_port.clone();
    let config = state.normalizer.clone();
    let blocking_ticker = ticker.clone();
    let view = tokio::task::spawn_blocking(move || {
        dashboard::dividend_view(data_port.as_ref(), &blocking_ticker, period, &config)
    })
    .await
    .map_err(|e| WebError::internal(e.to_string()))??;

    let chart_svg = chart_svg::dividend_chart(&view.daily, &state.theme);
    let events: Vec<EventRow> = view
        .events
        .iter()
        .map(|e| EventRow {
            date: e.date.to_string(),
            amount: format!("${:.4}", e.amount),
            smoothed: format!("${:.4}", e.smoothed),
            frequency: e.annual_count.to_string(),
            yearly: fmt_money(e.yearly),
        })
        .collect();

    let template = DividendReportTemplate {
        ticker: view.ticker,
        period: view.period.to_string(),
        annual_dividends: fmt_money(view.latest_yearly),
        current_yield: fmt_opt(view.current_yield.map(fmt_pct)),
        median_yield: fmt_opt(view.median_yield.map(fmt_pct)),
        dividend_cagr: fmt_opt(view.growth.map(|g| fmt_signed_pct(g.cagr))),
        yield_percentile: fmt_opt(
            view.yield_percentile
                .map(|p| format!("top {:.0}%", (1.0 - p) * 100.0)),
        ),
        chart_svg,
        events,
    };

    if is_htmx_request(&headers) {
        Ok(Html(template.fragment()).into_response())
    } else {
        render_full(template)
    }
}

pub async fn returns_page(
    State(_state): State<Arc<AppState>>,
    headers: HeaderMap,
) -> Result<Response, WebError> {
    let template = ReturnsPageTemplate {
        periods: periods(),
        default_period: "5y".to_string(),
    };
    if is_htmx_request(&headers) {
        Ok(Html(template.fragment()).into_response())
    } else {
        render_full(template)
    }
}

pub async fn returns_run(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    Form(form): Form<TickerPeriodForm>,
) -> Result<Response, WebError> {
    let ticker = clean_ticker(&form.ticker)?;
    let period = parse_period(&form.period)?;

    let data_port = state.data_port.clone();
    let blocking_ticker = ticker.clone();
    let view = tokio::task::spawn_blocking(move || {
        dashboard::return_view(data_port.as_ref(), &blocking_ticker, period)
    })
    .await
    .map_err(|e| WebError::internal(e.to_string()))??;

    let template = ReturnReportTemplate {
        ticker: view.ticker,
        period: view.period.to_string(),
        price_return: fmt_signed_pct(view.price_return),
        total_return: fmt_signed_pct(view.total_return),
        max_price_drawdown: fmt_signed_pct(view.max_price_drawdown),
        max_total_drawdown: fmt_signed_pct(view.max_total_drawdown),
        return_svg: chart_svg::return_chart(&view.points, &state.theme),
        drawdown_svg: chart_svg::drawdown_chart(&view.points, &state.theme),
    };

    if is_htmx_request(&headers) {
        Ok(Html(template.fragment()).into_response())
    } else {
        render_full(template)
    }
}

pub async fn funds_page(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
) -> Result<Response, WebError> {
    let funds = state.holdings_port.list_funds()?;
    let template = FundsPageTemplate { funds };
    if is_htmx_request(&headers) {
        Ok(Html(template.fragment()).into_response())
    } else {
        render_full(template)
    }
}

#[derive(Debug, serde::Deserialize)]
pub struct FundForm {
    pub fund: String,
}

pub async fn funds_show(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    Form(form): Form<FundForm>,
) -> Result<Response, WebError> {
    let mut holdings = state.holdings_port.fund_holdings(&form.fund)?;
    let breakdown = allocation::fund_breakdown(&holdings);

    holdings.sort_by(|a, b| b.weight_pct.total_cmp(&a.weight_pct));
    let rows: Vec<HoldingRow> = holdings
        .iter()
        .map(|h| HoldingRow {
            ticker: h.ticker.clone(),
            name: h.name.clone(),
            sector: h.sector.clone(),
            region: h.region.clone(),
            weight: format!("{:.2}%", h.weight_pct),
        })
        .collect();

    let template = FundReportTemplate {
        fund: form.fund,
        top10: format!("{:.0}%", breakdown.top10_concentration),
        largest_sector: fmt_opt(
            breakdown
                .largest_sector()
                .map(|r| format!("{} ({:.0}%)", r.label, r.weight_pct)),
        ),
        largest_region: fmt_opt(
            breakdown
                .largest_region()
                .map(|r| format!("{} ({:.0}%)", r.label, r.weight_pct)),
        ),
        sectors_svg: chart_svg::allocation_chart(&breakdown.sectors, "Sectors", &state.theme),
        regions_svg: chart_svg::allocation_chart(&breakdown.regions, "Regions", &state.theme),
        asset_classes_svg: chart_svg::allocation_chart(
            &breakdown.asset_classes,
            "Asset classes",
            &state.theme,
        ),
        holdings: rows,
    };

    if is_htmx_request(&headers) {
        Ok(Html(template.fragment()).into_response())
    } else {
        render_full(template)
    }
}

#[derive(Debug, serde::Deserialize)]
pub struct PortfolioLoadQuery {
    pub load: Option<String>,
}

async fn saved_portfolios(session: &Session) -> Result<SavedPortfolios, WebError> {
    session
        .get::<SavedPortfolios>(SESSION_PORTFOLIOS_KEY)
        .await
        .map_err(|e| WebError::internal(e.to_string()))
        .map(Option::unwrap_or_default)
}

fn holdings_lines(holdings: &BTreeMap<String, f64>) -> String {
    holdings
        .iter()
        .map(|(name, value)| format!("{}={}", name, value))
        .collect::<Vec<_>>()
        .join("\n")
}

pub async fn portfolio_page(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    session: Session,
    Query(query): Query<PortfolioLoadQuery>,
) -> Result<Response, WebError> {
    let funds = state.holdings_port.list_funds()?;
    let stocks: Vec<StockRow> = state
        .holdings_port
        .stock_positions()?
        .iter()
        .map(|s| StockRow {
            ticker: s.ticker.clone(),
            name: s.name.clone(),
        })
        .collect();

    let saved = saved_portfolios(&session).await?;
    let loaded = query
        .load
        .as_ref()
        .and_then(|name| saved.get(name).map(|p| (name.clone(), p.clone())));

    let (portfolio_name, etf_lines, stock_lines) = match loaded {
        Some((name, portfolio)) => (
            name,
            holdings_lines(&portfolio.etf_holdings),
            holdings_lines(&portfolio.stock_holdings),
        ),
        None => (String::new(), String::new(), String::new()),
    };

    let template = PortfolioPageTemplate {
        funds,
        stocks,
        saved: saved.keys().cloned().collect(),
        portfolio_name,
        etf_lines,
        stock_lines,
    };

    if is_htmx_request(&headers) {
        Ok(Html(template.fragment()).into_response())
    } else {
        render_full(template)
    }
}

#[derive(Debug, serde::Deserialize)]
pub struct PortfolioForm {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub etfs: String,
    #[serde(default)]
    pub stocks: String,
}

fn parse_portfolio_form(form: &PortfolioForm) -> Result<SavedPortfolio, WebError> {
    let etf_holdings =
        parse_holdings(form.etfs.lines()).map_err(|e| WebError::bad_request(e.to_string()))?;
    let stock_holdings = parse_holdings(form.stocks.lines())
        .map_err(|e| WebError::bad_request(e.to_string()))?;
    Ok(SavedPortfolio {
        etf_holdings,
        stock_holdings,
    })
}

pub async fn portfolio_run(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    Form(form): Form<PortfolioForm>,
) -> Result<Response, WebError> {
    let portfolio = parse_portfolio_form(&form)?;
    if portfolio.is_empty() {
        return Err(WebError::bad_request("no holdings entered"));
    }

    let holdings = state.holdings_port.all_holdings()?;
    let stocks = state.holdings_port.stock_positions()?;

    let funds = state.holdings_port.list_funds()?;
    for name in portfolio.etf_holdings.keys() {
        if !funds.contains(name) {
            return Err(FinboardError::UnknownFund(name.clone()).into());
        }
    }
    for ticker in portfolio.stock_holdings.keys() {
        if !stocks.iter().any(|s| &s.ticker == ticker) {
            return Err(WebError::bad_request(format!("unknown stock: {}", ticker)));
        }
    }

    let aggregated = allocation::aggregate_portfolio(
        &holdings,
        &portfolio.etf_holdings,
        &stocks,
        &portfolio.stock_holdings,
    );

    let lines: Vec<LineRow> = aggregated
        .lines
        .iter()
        .map(|l| LineRow {
            ticker: l.ticker.clone(),
            name: l.name.clone(),
            sector: l.sector.clone(),
            region: l.region.clone(),
            value: fmt_money(l.value),
            weight: format!("{:.2}%", l.weight_pct),
        })
        .collect();

    let template = PortfolioReportTemplate {
        total_value: fmt_money(aggregated.total_value),
        top10: format!("{:.0}%", aggregated.breakdown.top10_concentration),
        largest_sector: fmt_opt(
            aggregated
                .breakdown
                .largest_sector()
                .map(|r| format!("{} ({:.0}%)", r.label, r.weight_pct)),
        ),
        largest_region: fmt_opt(
            aggregated
                .breakdown
                .largest_region()
                .map(|r| format!("{} ({:.0}%)", r.label, r.weight_pct)),
        ),
        sectors_svg: chart_svg::allocation_chart(
            &aggregated.breakdown.sectors,
            "Sectors",
            &state.theme,
        ),
        regions_svg: chart_svg::allocation_chart(
            &aggregated.breakdown.regions,
            "Regions",
            &state.theme,
        ),
        lines,
    };

    if is_htmx_request(&headers) {
        Ok(Html(template.fragment()).into_response())
    } else {
        render_full(template)
    }
}

pub async fn portfolio_save(
    session: Session,
    Form(form): Form<PortfolioForm>,
) -> Result<Response, WebError> {
    let name = form.name.trim().to_string();
    if name.is_empty() {
        return Err(WebError::bad_request("portfolio name is required"));
    }
    let portfolio = parse_portfolio_form(&form)?;

    let mut saved = saved_portfolios(&session).await?;
    saved.insert(name.clone(), portfolio);
    session
        .insert(SESSION_PORTFOLIOS_KEY, saved)
        .await
        .map_err(|e| WebError::internal(e.to_string()))?;

    Ok(Html(format!(
        "<div id=\"report-content\"><p>Saved portfolio \"{}\".</p></div>",
        name
    ))
    .into_response())
}

pub async fn portfolio_delete(
    session: Session,
    Form(form): Form<PortfolioForm>,
) -> Result<Response, WebError> {
    let name = form.name.trim().to_string();
    if name.is_empty() {
        return Err(WebError::bad_request("portfolio name is required"));
    }

    let mut saved = saved_portfolios(&session).await?;
    if saved.remove(&name).is_none() {
        let message = format!("no saved portfolio named \"{}\"", name);
        let template = ErrorTemplate {
            message: &message,
            status: StatusCode::UNPROCESSABLE_ENTITY.as_u16(),
        };
        return Ok((
            StatusCode::UNPROCESSABLE_ENTITY,
            Html(template.fragment()),
        )
            .into_response());
    }
    session
        .insert(SESSION_PORTFOLIOS_KEY, saved)
        .await
        .map_err(|e| WebError::internal(e.to_string()))?;

    Ok(Html(format!(
        "<div id=\"report-content\"><p>Deleted portfolio \"{}\".</p></div>",
        name
    ))
    .into_response())
}
