//! HTML templates using Askama.
//!
//! Each page has a full template for direct navigation and a hand-built
//! `fragment()` used for HTMX partial swaps.

use askama::Template;

#[derive(Template)]
#[template(path = "index.html")]
pub struct IndexTemplate;

impl IndexTemplate {
    pub fn fragment(&self) -> String {
        String::from(
            "<div id=\"content\"><h1>Finboard</h1>\
             <p>Dividend run-rates, total returns and portfolio composition.</p>\
             <ul>\
             <li><a href=\"/dividends\">Dividends</a></li>\
             <li><a href=\"/returns\">Total return</a></li>\
             <li><a href=\"/funds\">Fund analyzer</a></li>\
             <li><a href=\"/portfolio\">Portfolio</a></li>\
             </ul></div>",
        )
    }
}

#[derive(Template)]
#[template(path = "dividends.html")]
pub struct DividendsPageTemplate {
    pub periods: Vec<String>,
    pub default_period: String,
}

impl DividendsPageTemplate {
    pub fn fragment(&self) -> String {
        let mut html = String::from("<div id=\"content\"><h1>Dividends</h1>");
        html.push_str("<form hx-post=\"/dividends/run\" hx-target=\".report-container\">");
        html.push_str("<label>Ticker: <input name=\"ticker\" value=\"MSFT\"></label>");
        html.push_str("<label>Period: <select name=\"period\">");
        for period in &self.periods {
            if *period == self.default_period {
                html.push_str(&format!(
                    "<option value=\"{p}\" selected>{p}</option>",
                    p = period
                ));
            } else {
                html.push_str(&format!("<option value=\"{p}\">{p}</option>", p = period));
            }
        }
        html.push_str("</select></label>");
        html.push_str("<button type=\"submit\">Show</button></form>");
        html.push_str("<div class=\"report-container\"></div></div>");
        html
    }
}

pub struct EventRow {
    pub date: String,
    pub amount: String,
    pub smoothed: String,
    pub frequency: String,
    pub yearly: String,
}

#[derive(Template)]
#[template(path = "dividend_report.html")]
pub struct DividendReportTemplate {
    pub ticker: String,
    pub period: String,
    pub annual_dividends: String,
    pub current_yield: String,
    pub median_yield: String,
    pub dividend_cagr: String,
    pub yield_percentile: String,
    pub chart_svg: String,
    pub events: Vec<EventRow>,
}

impl DividendReportTemplate {
    pub fn fragment(&self) -> String {
        let mut html = format!(
            "<div id=\"report-content\"><h2>{} dividends ({})</h2>",
            self.ticker, self.period
        );

        html.push_str("<table class=\"metrics\">");
        html.push_str(&format!(
            "<tr><td>Annual dividends</td><td>{}</td></tr>",
            self.annual_dividends
        ));
        html.push_str(&format!(
            "<tr><td>Current yield</td><td>{}</td></tr>",
            self.current_yield
        ));
        html.push_str(&format!(
            "<tr><td>Median yield</td><td>{}</td></tr>",
            self.median_yield
        ));
        html.push_str(&format!(
            "<tr><td>Dividend CAGR</td><td>{}</td></tr>",
            self.dividend_cagr
        ));
        html.push_str(&format!(
            "<tr><td>Yield percentile</td><td>{}</td></tr>",
            self.yield_percentile
        ));
        html.push_str("</table>");

        html.push_str(&format!("<div class=\"chart\">{}</div>", self.chart_svg));

        if !self.events.is_empty() {
            html.push_str("<h3>Dividend events</h3><table>");
            html.push_str(
                "<tr><th>Date</th><th>Amount</th><th>Smoothed</th><th>Per year</th><th>Yearly</th></tr>",
            );
            for event in &self.events {
                html.push_str(&format!(
                    "<tr><td>{}</td><td>{}</td><td>{}</td><td>{}</td><td>{}</td></tr>",
                    event.date, event.amount, event.smoothed, event.frequency, event.yearly
                ));
            }
            html.push_str("</table>");
        }

        html.push_str("</div>");
        html
    }
}

#[derive(Template)]
#[template(path = "returns.html")]
pub struct ReturnsPageTemplate {
    pub periods: Vec<String>,
    pub default_period: String,
}

impl ReturnsPageTemplate {
    pub fn fragment(&self) -> String {
        let mut html = String::from("<div id=\"content\"><h1>Total return</h1>");
        html.push_str("<form hx-post=\"/returns/run\" hx-target=\".report-container\">");
        html.push_str("<label>Ticker: <input name=\"ticker\" value=\"AAPL\"></label>");
        html.push_str("<label>Period: <select name=\"period\">");
        for period in &self.periods {
            if *period == self.default_period {
                html.push_str(&format!(
                    "<option value=\"{p}\" selected>{p}</option>",
                    p = period
                ));
            } else {
                html.push_str(&format!("<option value=\"{p}\">{p}</option>", p = period));
            }
        }
        html.push_str("</select></label>");
        html.push_str("<button type=\"submit\">Show</button></form>");
        html.push_str("<div class=\"report-container\"></div></div>");
        html
    }
}

#[derive(Template)]
#[template(path = "return_report.html")]
pub struct ReturnReportTemplate {
    pub ticker: String,
    pub period: String,
    pub price_return: String,
    pub total_return: String,
    pub max_price_drawdown: String,
    pub max_total_drawdown: String,
    pub return_svg: String,
    pub drawdown_svg: String,
}

impl ReturnReportTemplate {
    pub fn fragment(&self) -> String {
        let mut html = format!(
            "<div id=\"report-content\"><h2>{} returns ({})</h2>",
            self.ticker, self.period
        );

        html.push_str("<table class=\"metrics\">");
        html.push_str(&format!(
            "<tr><td>Price return</td><td>{}</td></tr>",
            self.price_return
        ));
        html.push_str(&format!(
            "<tr><td>Total return</td><td>{}</td></tr>",
            self.total_return
        ));
        html.push_str(&format!(
            "<tr><td>Max price drawdown</td><td>{}</td></tr>",
            self.max_price_drawdown
        ));
        html.push_str(&format!(
            "<tr><td>Max total drawdown</td><td>{}</td></tr>",
            self.max_total_drawdown
        ));
        html.push_str("</table>");

        html.push_str(&format!("<div class=\"chart\">{}</div>", self.return_svg));
        html.push_str(&format!("<div class=\"chart\">{}</div>", self.drawdown_svg));
        html.push_str("</div>");
        html
    }
}

#[derive(Template)]
#[template(path = "funds.html")]
pub struct FundsPageTemplate {
    pub funds: Vec<String>,
}

impl FundsPageTemplate {
    pub fn fragment(&self) -> String {
        let mut html = String::from("<div id=\"content\"><h1>Fund analyzer</h1>");
        html.push_str("<form hx-post=\"/funds/show\" hx-target=\".report-container\">");
        html.push_str("<label>Fund: <select name=\"fund\">");
        for fund in &self.funds {
            html.push_str(&format!("<option value=\"{f}\">{f}</option>", f = fund));
        }
        html.push_str("</select></label>");
        html.push_str("<button type=\"submit\">Show</button></form>");
        html.push_str("<div class=\"report-container\"></div></div>");
        html
    }
}

pub struct HoldingRow {
    pub ticker: String,
    pub name: String,
    pub sector: String,
    pub region: String,
    pub weight: String,
}

#[derive(Template)]
#[template(path = "fund_report.html")]
pub struct FundReportTemplate {
    pub fund: String,
    pub top10: String,
    pub largest_sector: String,
    pub largest_region: String,
    pub sectors_svg: String,
    pub regions_svg: String,
    pub asset_classes_svg: String,
    pub holdings: Vec<HoldingRow>,
}

impl FundReportTemplate {
    pub fn fragment(&self) -> String {
        let mut html = format!("<div id=\"report-content\"><h2>{}</h2>", self.fund);

        html.push_str("<table class=\"metrics\">");
        html.push_str(&format!(
            "<tr><td>Top 10 concentration</td><td>{}</td></tr>",
            self.top10
        ));
        html.push_str(&format!(
            "<tr><td>Largest sector</td><td>{}</td></tr>",
            self.largest_sector
        ));
        html.push_str(&format!(
            "<tr><td>Largest region</td><td>{}</td></tr>",
            self.largest_region
        ));
        html.push_str("</table>");

        for svg in [&self.sectors_svg, &self.asset_classes_svg, &self.regions_svg] {
            html.push_str(&format!("<div class=\"chart\">{}</div>", svg));
        }

        html.push_str("<h3>Holdings</h3><table>");
        html.push_str("<tr><th>Ticker</th><th>Name</th><th>Sector</th><th>Region</th><th>Weight</th></tr>");
        for row in &self.holdings {
            html.push_str(&format!(
                "<tr><td>{}</td><td>{}</td><td>{}</td><td>{}</td><td>{}</td></tr>",
                row.ticker, row.name, row.sector, row.region, row.weight
            ));
        }
        html.push_str("</table></div>");
        html
    }
}

pub struct StockRow {
    pub ticker: String,
    pub name: String,
}

#[derive(Template)]
#[template(path = "portfolio.html")]
pub struct PortfolioPageTemplate {
    pub funds: Vec<String>,
    pub stocks: Vec<StockRow>,
    pub saved: Vec<String>,
    pub portfolio_name: String,
    pub etf_lines: String,
    pub stock_lines: String,
}

impl PortfolioPageTemplate {
    pub fn fragment(&self) -> String {
        let mut html = String::from("<div id=\"content\"><h1>Portfolio</h1>");

        if !self.saved.is_empty() {
            html.push_str("<p>Saved portfolios: ");
            for name in &self.saved {
                html.push_str(&format!(
                    "<a href=\"/portfolio?load={n}\">{n}</a> ",
                    n = name
                ));
            }
            html.push_str("</p>");
        }

        html.push_str("<form hx-post=\"/portfolio/run\" hx-target=\".report-container\">");
        html.push_str(&format!(
            "<label>Name: <input name=\"name\" value=\"{}\"></label>",
            self.portfolio_name
        ));
        html.push_str(&format!(
            "<label>ETF holdings (one FUND=VALUE per line):<br>\
             <textarea name=\"etfs\" rows=\"4\">{}</textarea></label>",
            self.etf_lines
        ));
        html.push_str(&format!(
            "<label>Stock holdings (one TICKER=VALUE per line):<br>\
             <textarea name=\"stocks\" rows=\"4\">{}</textarea></label>",
            self.stock_lines
        ));
        html.push_str("<button type=\"submit\">Show portfolio</button> ");
        html.push_str("<button type=\"submit\" hx-post=\"/portfolio/save\">Save</button> ");
        html.push_str("<button type=\"submit\" hx-post=\"/portfolio/delete\">Delete</button>");
        html.push_str("</form>");
        html.push_str("<div class=\"report-container\"></div></div>");
        html
    }
}

pub struct LineRow {
    pub ticker: String,
    pub name: String,
    pub sector: String,
    pub region: String,
    pub value: String,
    pub weight: String,
}

#[derive(Template)]
#[template(path = "portfolio_report.html")]
pub struct PortfolioReportTemplate {
    pub total_value: String,
    pub top10: String,
    pub largest_sector: String,
    pub largest_region: String,
    pub sectors_svg: String,
    pub regions_svg: String,
    pub lines: Vec<LineRow>,
}

impl PortfolioReportTemplate {
    pub fn fragment(&self) -> String {
        let mut html = String::from("<div id=\"report-content\"><h2>Aggregated portfolio</h2>");

        html.push_str("<table class=\"metrics\">");
        html.push_str(&format!(
            "<tr><td>Total value</td><td>{}</td></tr>",
            self.total_value
        ));
        html.push_str(&format!(
            "<tr><td>Top 10 concentration</td><td>{}</td></tr>",
            self.top10
        ));
        html.push_str(&format!(
            "<tr><td>Largest sector</td><td>{}</td></tr>",
            self.largest_sector
        ));
        html.push_str(&format!(
            "<tr><td>Largest region</td><td>{}</td></tr>",
            self.largest_region
        ));
        html.push_str("</table>");

        html.push_str(&format!("<div class=\"chart\">{}</div>", self.sectors_svg));
        html.push_str(&format!("<div class=\"chart\">{}</div>", self.regions_svg));

        html.push_str("<h3>Positions</h3><table>");
        html.push_str(
            "<tr><th>Ticker</th><th>Name</th><th>Sector</th><th>Region</th><th>Value</th><th>Weight</th></tr>",
        );
        for line in &self.lines {
            html.push_str(&format!(
                "<tr><td>{}</td><td>{}</td><td>{}</td><td>{}</td><td>{}</td><td>{}</td></tr>",
                line.ticker, line.name, line.sector, line.region, line.value, line.weight
            ));
        }
        html.push_str("</table></div>");
        html
    }
}

#[derive(Template)]
#[template(path = "error.html")]
pub struct ErrorTemplate<'a> {
    pub message: &'a str,
    pub status: u16,
}

impl<'a> ErrorTemplate<'a> {
    pub fn fragment(&self) -> String {
        format!(
            "<div id=\"error\" class=\"error\"><h1>Error {}</h1><p>{}</p></div>",
            self.status, self.message
        )
    }
}
