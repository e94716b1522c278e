//! CLI definition and dispatch.

use clap::{Parser, Subcommand};
use std::path::PathBuf;
use std::process::ExitCode;

use crate::adapters::chart_svg::ChartTheme;
use crate::adapters::csv_adapter::CsvPriceAdapter;
use crate::adapters::file_config_adapter::FileConfigAdapter;
use crate::adapters::holdings_csv_adapter::HoldingsCsvAdapter;
use crate::domain::allocation;
use crate::domain::dashboard;
use crate::domain::error::FinboardError;
use crate::domain::normalizer::NormalizerConfig;
use crate::domain::period::Lookback;
use crate::domain::portfolio::parse_holdings;
use crate::ports::config_port::ConfigPort;
use crate::ports::data_port::MarketDataPort;
use crate::ports::holdings_port::HoldingsPort;

#[derive(Parser, Debug)]
#[command(name = "finboard", about = "Personal finance dashboard")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Dividend history, smoothed run-rate and yield for a ticker
    Dividends {
        #[arg(long)]
        ticker: String,
        #[arg(long, default_value = "15y")]
        period: Lookback,
        #[arg(short, long)]
        config: Option<PathBuf>,
    },
    /// Price return, total return and drawdown for a ticker
    Returns {
        #[arg(long)]
        ticker: String,
        #[arg(long, default_value = "5y")]
        period: Lookback,
        #[arg(short, long)]
        config: Option<PathBuf>,
    },
    /// Sector / region / asset-class breakdown of a fund
    Fund {
        #[arg(long)]
        name: String,
        #[arg(short, long)]
        config: PathBuf,
    },
    /// List funds available in the holdings dataset
    ListFunds {
        #[arg(short, long)]
        config: PathBuf,
    },
    /// Aggregate a portfolio of ETFs and individual stocks
    Portfolio {
        /// ETF holding as FUND=VALUE, repeatable
        #[arg(long = "etf")]
        etfs: Vec<String>,
        /// Stock holding as TICKER=VALUE, repeatable
        #[arg(long = "stock")]
        stocks: Vec<String>,
        #[arg(short, long)]
        config: PathBuf,
    },
    /// Start the web dashboard
    Serve {
        #[arg(short, long)]
        config: Option<PathBuf>,
    },
}

pub fn run(cli: Cli) -> ExitCode {
    match cli.command {
        Command::Dividends {
            ticker,
            period,
            config,
        } => run_dividends(&ticker, period, config.as_ref()),
        Command::Returns {
            ticker,
            period,
            config,
        } => run_returns(&ticker, period, config.as_ref()),
        Command::Fund { name, config } => run_fund(&name, &config),
        Command::ListFunds { config } => run_list_funds(&config),
        Command::Portfolio {
            etfs,
            stocks,
            config,
        } => run_portfolio(&etfs, &stocks, &config),
        Command::Serve { config } => run_serve(config.as_ref()),
    }
}

pub fn load_config(path: &PathBuf) -> Result<FileConfigAdapter, ExitCode> {
    FileConfigAdapter::from_file(path).map_err(|e| {
        let err = FinboardError::ConfigParse {
            file: path.display().to_string(),
            reason: e.to_string(),
        };
        eprintln!("error: {err}");
        ExitCode::from(&err)
    })
}

fn load_optional_config(path: Option<&PathBuf>) -> Result<Option<FileConfigAdapter>, ExitCode> {
    match path {
        Some(path) => load_config(path).map(Some),
        None => Ok(None),
    }
}

pub fn build_normalizer_config(config: Option<&dyn ConfigPort>) -> NormalizerConfig {
    let defaults = NormalizerConfig::default();
    let Some(config) = config else {
        return defaults;
    };
    NormalizerConfig {
        smoothing_window: config
            .get_int("dashboard", "smoothing_window", defaults.smoothing_window as i64)
            .max(1) as usize,
        staleness_cap_days: config
            .get_int("dashboard", "staleness_cap_days", defaults.staleness_cap_days)
            .max(0),
        min_events: config
            .get_int("dashboard", "min_events", defaults.min_events as i64)
            .max(1) as usize,
    }
}

pub fn build_theme(config: Option<&dyn ConfigPort>) -> ChartTheme {
    let mut theme = ChartTheme::default();
    if let Some(config) = config {
        if let Some(color) = config.get_string("dashboard", "primary_color") {
            theme.primary_color = color;
        }
        if let Some(color) = config.get_string("dashboard", "secondary_color") {
            theme.secondary_color = color;
        }
    }
    theme
}

fn default_source() -> &'static str {
    if cfg!(feature = "yahoo") { "yahoo" } else { "csv" }
}

fn build_yahoo_port() -> Result<Box<dyn MarketDataPort + Send + Sync>, FinboardError> {
    #[cfg(feature = "yahoo")]
    {
        use crate::adapters::yahoo_adapter::YahooAdapter;
        Ok(Box::new(YahooAdapter::new()?))
    }
    #[cfg(not(feature = "yahoo"))]
    {
        Err(FinboardError::ConfigInvalid {
            section: "data".into(),
            key: "source".into(),
            reason: "this build has no yahoo support (enable the `yahoo` feature)".into(),
        })
    }
}

fn wrap_cache(
    port: Box<dyn MarketDataPort + Send + Sync>,
    config: Option<&FileConfigAdapter>,
) -> Result<Box<dyn MarketDataPort + Send + Sync>, FinboardError> {
    let Some(path) = config.and_then(|c| c.get_string("data", "cache_path")) else {
        return Ok(port);
    };
    #[cfg(feature = "sqlite")]
    {
        use crate::adapters::sqlite_cache_adapter::SqliteCacheAdapter;
        let ttl = config
            .map(|c| c.get_int("data", "cache_ttl_hours", 24))
            .unwrap_or(24);
        Ok(Box::new(SqliteCacheAdapter::new(port, &path, ttl)?))
    }
    #[cfg(not(feature = "sqlite"))]
    {
        log::warn!("cache_path {path} ignored: built without the sqlite feature");
        Ok(port)
    }
}

pub fn build_data_port(
    config: Option<&FileConfigAdapter>,
) -> Result<Box<dyn MarketDataPort + Send + Sync>, FinboardError> {
    let source = config
        .and_then(|c| c.get_string("data", "source"))
        .unwrap_or_else(|| default_source().to_string());

    let port: Box<dyn MarketDataPort + Send + Sync> = match source.as_str() {
        "yahoo" => build_yahoo_port()?,
        "csv" => {
            let dir = config
                .and_then(|c| c.get_string("data", "csv_dir"))
                .ok_or_else(|| FinboardError::ConfigMissing {
                    section: "data".into(),
                    key: "csv_dir".into(),
                })?;
            Box::new(CsvPriceAdapter::new(PathBuf::from(dir)))
        }
        other => {
            return Err(FinboardError::ConfigInvalid {
                section: "data".into(),
                key: "source".into(),
                reason: format!("unknown source {:?} (expected yahoo or csv)", other),
            });
        }
    };

    wrap_cache(port, config)
}

pub fn build_holdings_port(
    config: &FileConfigAdapter,
    config_path: &PathBuf,
) -> Result<HoldingsCsvAdapter, FinboardError> {
    let funds_path =
        config
            .get_string("data", "holdings_path")
            .ok_or_else(|| FinboardError::ConfigMissing {
                section: "data".into(),
                key: "holdings_path".into(),
            })?;
    let stocks_path = config.get_string("data", "stocks_path").map(PathBuf::from);

    // Relative paths resolve against the config file's directory.
    let base = config_path.parent().unwrap_or(std::path::Path::new("."));
    Ok(HoldingsCsvAdapter::new(
        base.join(funds_path),
        stocks_path.map(|p| base.join(p)),
    ))
}

fn fmt_opt_pct(value: Option<f64>) -> String {
    match value {
        Some(v) => format!("{:.2}%", v * 100.0),
        None => "n/a".to_string(),
    }
}

fn run_dividends(ticker: &str, period: Lookback, config_path: Option<&PathBuf>) -> ExitCode {
    let config = match load_optional_config(config_path) {
        Ok(c) => c,
        Err(code) => return code,
    };

    let data_port = match build_data_port(config.as_ref()) {
        Ok(p) => p,
        Err(e) => {
            eprintln!("error: {e}");
            return (&e).into();
        }
    };
    let normalizer = build_normalizer_config(config.as_ref().map(|c| c as &dyn ConfigPort));

    let ticker = ticker.trim().to_uppercase();
    eprintln!("Fetching {} history ({})...", ticker, period);

    let view = match dashboard::dividend_view(&data_port, &ticker, period, &normalizer) {
        Ok(v) => v,
        Err(e) => {
            eprintln!("error: {e}");
            return (&e).into();
        }
    };

    println!("=== {} dividends ({}) ===", view.ticker, view.period);
    println!("Annual dividends:  ${:.2}", view.latest_yearly);
    println!("Current yield:     {}", fmt_opt_pct(view.current_yield));
    println!("Median yield:      {}", fmt_opt_pct(view.median_yield));
    match view.growth {
        Some(growth) => {
            println!("Dividend growth:   {:+.1}%", growth.growth * 100.0);
            println!("Dividend CAGR:     {:+.1}%", growth.cagr * 100.0);
        }
        None => println!("Dividend growth:   n/a"),
    }
    if let Some(percentile) = view.yield_percentile {
        println!("Yield percentile:  top {:.0}%", (1.0 - percentile) * 100.0);
    }

    println!("\nDate        Amount    Smoothed  /yr  Yearly");
    for event in &view.events {
        println!(
            "{}  {:>8.4}  {:>8.4}  {:>3}  {:>6.2}",
            event.date, event.amount, event.smoothed, event.annual_count, event.yearly
        );
    }

    ExitCode::SUCCESS
}

fn run_returns(ticker: &str, period: Lookback, config_path: Option<&PathBuf>) -> ExitCode {
    let config = match load_optional_config(config_path) {
        Ok(c) => c,
        Err(code) => return code,
    };

    let data_port = match build_data_port(config.as_ref()) {
        Ok(p) => p,
        Err(e) => {
            eprintln!("error: {e}");
            return (&e).into();
        }
    };

    let ticker = ticker.trim().to_uppercase();
    eprintln!("Fetching {} history ({})...", ticker, period);

    let view = match dashboard::return_view(&data_port, &ticker, period) {
        Ok(v) => v,
        Err(e) => {
            eprintln!("error: {e}");
            return (&e).into();
        }
    };

    println!("=== {} returns ({}) ===", view.ticker, view.period);
    println!("Price return:       {:+.2}%", view.price_return * 100.0);
    println!("Total return:       {:+.2}%", view.total_return * 100.0);
    println!("Max price drawdown: {:+.1}%", view.max_price_drawdown * 100.0);
    println!("Max total drawdown: {:+.1}%", view.max_total_drawdown * 100.0);
    println!("Trading days:       {}", view.points.len());

    ExitCode::SUCCESS
}

fn run_fund(name: &str, config_path: &PathBuf) -> ExitCode {
    let config = match load_config(config_path) {
        Ok(c) => c,
        Err(code) => return code,
    };
    let holdings_port = match build_holdings_port(&config, config_path) {
        Ok(p) => p,
        Err(e) => {
            eprintln!("error: {e}");
            return (&e).into();
        }
    };

    let holdings = match holdings_port.fund_holdings(name) {
        Ok(h) => h,
        Err(e) => {
            eprintln!("error: {e}");
            return (&e).into();
        }
    };
    let breakdown = allocation::fund_breakdown(&holdings);

    println!("=== {} ===", name);
    println!("Positions:            {}", holdings.len());
    println!("Top 10 concentration: {:.0}%", breakdown.top10_concentration);

    for (title, rows) in [
        ("Sectors", &breakdown.sectors),
        ("Asset classes", &breakdown.asset_classes),
        ("Regions", &breakdown.regions),
    ] {
        println!("\n{}:", title);
        for row in rows {
            println!("  {:<28} {:>5.1}%", row.label, row.weight_pct);
        }
    }

    ExitCode::SUCCESS
}

fn run_list_funds(config_path: &PathBuf) -> ExitCode {
    let config = match load_config(config_path) {
        Ok(c) => c,
        Err(code) => return code,
    };
    let holdings_port = match build_holdings_port(&config, config_path) {
        Ok(p) => p,
        Err(e) => {
            eprintln!("error: {e}");
            return (&e).into();
        }
    };

    match holdings_port.list_funds() {
        Ok(funds) => {
            for fund in &funds {
                println!("{}", fund);
            }
            eprintln!("{} funds found", funds.len());
            ExitCode::SUCCESS
        }
        Err(e) => {
            eprintln!("error: {e}");
            (&e).into()
        }
    }
}

fn run_portfolio(etfs: &[String], stocks: &[String], config_path: &PathBuf) -> ExitCode {
    let config = match load_config(config_path) {
        Ok(c) => c,
        Err(code) => return code,
    };
    let holdings_port = match build_holdings_port(&config, config_path) {
        Ok(p) => p,
        Err(e) => {
            eprintln!("error: {e}");
            return (&e).into();
        }
    };

    let etf_values = match parse_holdings(etfs.iter().map(String::as_str)) {
        Ok(v) => v,
        Err(e) => {
            eprintln!("error: {e}");
            return (&e).into();
        }
    };
    let stock_values = match parse_holdings(stocks.iter().map(String::as_str)) {
        Ok(v) => v,
        Err(e) => {
            eprintln!("error: {e}");
            return (&e).into();
        }
    };

    if etf_values.is_empty() && stock_values.is_empty() {
        eprintln!("error: no holdings given (use --etf FUND=VALUE / --stock TICKER=VALUE)");
        return ExitCode::from(4);
    }

    let (holdings, positions) = match (holdings_port.all_holdings(), holdings_port.stock_positions())
    {
        (Ok(h), Ok(p)) => (h, p),
        (Err(e), _) | (_, Err(e)) => {
            eprintln!("error: {e}");
            return (&e).into();
        }
    };

    for name in etf_values.keys() {
        if !holdings.iter().any(|h| &h.fund == name) {
            let e = FinboardError::UnknownFund(name.clone());
            eprintln!("error: {e}");
            return (&e).into();
        }
    }

    let aggregated =
        allocation::aggregate_portfolio(&holdings, &etf_values, &positions, &stock_values);

    println!("=== Aggregated portfolio ===");
    println!("Total value:          {:.2}", aggregated.total_value);
    println!(
        "Top 10 concentration: {:.0}%",
        aggregated.breakdown.top10_concentration
    );

    println!("\nPositions:");
    println!("{:<8} {:<28} {:>10} {:>7}", "Ticker", "Name", "Value", "Weight");
    for line in &aggregated.lines {
        println!(
            "{:<8} {:<28} {:>10.2} {:>6.2}%",
            line.ticker, line.name, line.value, line.weight_pct
        );
    }

    for (title, rows) in [
        ("Sectors", &aggregated.breakdown.sectors),
        ("Regions", &aggregated.breakdown.regions),
    ] {
        println!("\n{}:", title);
        for row in rows {
            println!("  {:<28} {:>5.1}%", row.label, row.weight_pct);
        }
    }

    ExitCode::SUCCESS
}

fn run_serve(config_path: Option<&PathBuf>) -> ExitCode {
    #[cfg(feature = "web")]
    {
        use crate::adapters::web::{AppState, build_router};
        use std::net::SocketAddr;
        use std::sync::Arc;

        let config = match load_optional_config(config_path) {
            Ok(c) => c,
            Err(code) => return code,
        };

        let data_port = match build_data_port(config.as_ref()) {
            Ok(p) => p,
            Err(e) => {
                eprintln!("error: {e}");
                return (&e).into();
            }
        };

        let holdings_port: Arc<dyn crate::ports::holdings_port::HoldingsPort + Send + Sync> =
            match (config.as_ref(), config_path) {
                (Some(config), Some(path)) => match build_holdings_port(config, path) {
                    Ok(p) => Arc::new(p),
                    Err(e) => {
                        eprintln!("error: {e}");
                        return (&e).into();
                    }
                },
                _ => Arc::new(EmptyHoldings),
            };

        let addr: SocketAddr = config
            .as_ref()
            .and_then(|c| c.get_string("server", "listen"))
            .unwrap_or_else(|| "127.0.0.1:3000".to_string())
            .parse()
            .unwrap_or_else(|_| "127.0.0.1:3000".parse().unwrap());

        let state = AppState {
            data_port: Arc::from(data_port),
            holdings_port,
            normalizer: build_normalizer_config(config.as_ref().map(|c| c as &dyn ConfigPort)),
            theme: build_theme(config.as_ref().map(|c| c as &dyn ConfigPort)),
        };

        log::info!("starting web server on {}", addr);
        eprintln!("Listening on http://{}", addr);

        let router = build_router(state);

        tokio::runtime::Runtime::new()
            .expect("failed to start tokio runtime")
            .block_on(async {
                let listener = tokio::net::TcpListener::bind(addr)
                    .await
                    .expect("failed to bind listen address");
                axum::serve(listener, router).await.expect("server error");
            });

        ExitCode::SUCCESS
    }

    #[cfg(not(feature = "web"))]
    {
        let _ = config_path;
        eprintln!("error: web feature is required for serve");
        ExitCode::from(1)
    }
}

/// Stand-in holdings port when no dataset is configured: the fund pages
/// report an empty dataset instead of failing at startup.
#[cfg(feature = "web")]
struct EmptyHoldings;

#[cfg(feature = "web")]
impl HoldingsPort for EmptyHoldings {
    fn list_funds(&self) -> Result<Vec<String>, FinboardError> {
        Ok(Vec::new())
    }

    fn fund_holdings(
        &self,
        fund: &str,
    ) -> Result<Vec<crate::domain::allocation::Holding>, FinboardError> {
        Err(FinboardError::UnknownFund(fund.to_string()))
    }

    fn all_holdings(&self) -> Result<Vec<crate::domain::allocation::Holding>, FinboardError> {
        Ok(Vec::new())
    }
}
