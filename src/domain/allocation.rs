//! Fund holdings breakdowns and portfolio aggregation.

use std::collections::BTreeMap;

/// One row of the static fund-holdings dataset.
#[derive(Debug, Clone, PartialEq)]
pub struct Holding {
    pub fund: String,
    pub ticker: String,
    pub name: String,
    pub sector: String,
    pub asset_class: String,
    pub region: String,
    pub weight_pct: f64,
}

/// An individual position from the stocks dataset; carries no weight of
/// its own, the holder assigns it a value.
#[derive(Debug, Clone, PartialEq)]
pub struct StockPosition {
    pub ticker: String,
    pub name: String,
    pub sector: String,
    pub asset_class: String,
    pub region: String,
}

#[derive(Debug, Clone, PartialEq)]
pub struct BreakdownRow {
    pub label: String,
    pub weight_pct: f64,
}

/// Weight sums along each grouping dimension, descending, plus the share
/// of the ten largest positions.
#[derive(Debug, Clone)]
pub struct FundBreakdown {
    pub top10_concentration: f64,
    pub sectors: Vec<BreakdownRow>,
    pub regions: Vec<BreakdownRow>,
    pub asset_classes: Vec<BreakdownRow>,
}

impl FundBreakdown {
    pub fn largest_sector(&self) -> Option<&BreakdownRow> {
        self.sectors.first()
    }

    pub fn largest_region(&self) -> Option<&BreakdownRow> {
        self.regions.first()
    }
}

fn grouped(entries: impl Iterator<Item = (String, f64)>) -> Vec<BreakdownRow> {
    let mut sums: BTreeMap<String, f64> = BTreeMap::new();
    for (label, weight) in entries {
        *sums.entry(label).or_insert(0.0) += weight;
    }
    let mut rows: Vec<BreakdownRow> = sums
        .into_iter()
        .map(|(label, weight_pct)| BreakdownRow { label, weight_pct })
        .collect();
    rows.sort_by(|a, b| b.weight_pct.total_cmp(&a.weight_pct));
    rows
}

fn breakdown(entries: &[(String, String, String, f64)]) -> FundBreakdown {
    let mut weights: Vec<f64> = entries.iter().map(|(_, _, _, w)| *w).collect();
    weights.sort_by(|a, b| b.total_cmp(a));
    let top10_concentration = weights.iter().take(10).sum();

    FundBreakdown {
        top10_concentration,
        sectors: grouped(entries.iter().map(|(s, _, _, w)| (s.clone(), *w))),
        regions: grouped(entries.iter().map(|(_, r, _, w)| (r.clone(), *w))),
        asset_classes: grouped(entries.iter().map(|(_, _, a, w)| (a.clone(), *w))),
    }
}

/// Breakdown of a single fund's holdings by their dataset weights.
pub fn fund_breakdown(holdings: &[Holding]) -> FundBreakdown {
    let entries: Vec<(String, String, String, f64)> = holdings
        .iter()
        .map(|h| {
            (
                h.sector.clone(),
                h.region.clone(),
                h.asset_class.clone(),
                h.weight_pct,
            )
        })
        .collect();
    breakdown(&entries)
}

/// One merged position of an aggregated portfolio.
#[derive(Debug, Clone)]
pub struct PortfolioLine {
    pub ticker: String,
    pub name: String,
    pub sector: String,
    pub asset_class: String,
    pub region: String,
    pub value: f64,
    pub weight_pct: f64,
}

#[derive(Debug, Clone)]
pub struct AggregatedPortfolio {
    /// Merged positions, sorted by value descending.
    pub lines: Vec<PortfolioLine>,
    pub total_value: f64,
    pub breakdown: FundBreakdown,
}

/// Combine ETF holdings with individual stock positions into one weighted
/// table. Each ETF row contributes `weight_pct × fund_value / 100`; each
/// stock contributes its full value. Rows merge by ticker, keeping the
/// first row's labels, and weights are recomputed over the total.
pub fn aggregate_portfolio(
    holdings: &[Holding],
    fund_values: &BTreeMap<String, f64>,
    stocks: &[StockPosition],
    stock_values: &BTreeMap<String, f64>,
) -> AggregatedPortfolio {
    let mut merged: BTreeMap<String, PortfolioLine> = BTreeMap::new();

    for holding in holdings {
        let Some(fund_value) = fund_values.get(&holding.fund) else {
            continue;
        };
        let value = holding.weight_pct * fund_value / 100.0;
        merged
            .entry(holding.ticker.clone())
            .and_modify(|line| line.value += value)
            .or_insert_with(|| PortfolioLine {
                ticker: holding.ticker.clone(),
                name: holding.name.clone(),
                sector: holding.sector.clone(),
                asset_class: holding.asset_class.clone(),
                region: holding.region.clone(),
                value,
                weight_pct: 0.0,
            });
    }

    for stock in stocks {
        let Some(&value) = stock_values.get(&stock.ticker) else {
            continue;
        };
        merged
            .entry(stock.ticker.clone())
            .and_modify(|line| line.value += value)
            .or_insert_with(|| PortfolioLine {
                ticker: stock.ticker.clone(),
                name: stock.name.clone(),
                sector: stock.sector.clone(),
                asset_class: stock.asset_class.clone(),
                region: stock.region.clone(),
                value,
                weight_pct: 0.0,
            });
    }

    let total_value: f64 = merged.values().map(|line| line.value).sum();
    if total_value <= 0.0 {
        return AggregatedPortfolio {
            lines: Vec::new(),
            total_value: 0.0,
            breakdown: breakdown(&[]),
        };
    }

    let mut lines: Vec<PortfolioLine> = merged.into_values().collect();
    for line in &mut lines {
        line.weight_pct = line.value / total_value * 100.0;
    }
    lines.sort_by(|a, b| b.value.total_cmp(&a.value));

    let entries: Vec<(String, String, String, f64)> = lines
        .iter()
        .map(|l| {
            (
                l.sector.clone(),
                l.region.clone(),
                l.asset_class.clone(),
                l.weight_pct,
            )
        })
        .collect();
    let breakdown = breakdown(&entries);

    AggregatedPortfolio {
        lines,
        total_value,
        breakdown,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    fn holding(fund: &str, ticker: &str, sector: &str, region: &str, weight: f64) -> Holding {
        Holding {
            fund: fund.into(),
            ticker: ticker.into(),
            name: format!("{} Inc", ticker),
            sector: sector.into(),
            asset_class: "Equity".into(),
            region: region.into(),
            weight_pct: weight,
        }
    }

    fn stock(ticker: &str, sector: &str, region: &str) -> StockPosition {
        StockPosition {
            ticker: ticker.into(),
            name: format!("{} Inc", ticker),
            sector: sector.into(),
            asset_class: "Equity".into(),
            region: region.into(),
        }
    }

    #[test]
    fn fund_breakdown_groups_and_sorts() {
        let holdings = vec![
            holding("F", "AAA", "Tech", "US", 40.0),
            holding("F", "BBB", "Tech", "Europe", 25.0),
            holding("F", "CCC", "Health", "US", 35.0),
        ];
        let breakdown = fund_breakdown(&holdings);

        assert_eq!(breakdown.sectors[0].label, "Tech");
        assert_relative_eq!(breakdown.sectors[0].weight_pct, 65.0);
        assert_eq!(breakdown.largest_region().unwrap().label, "US");
        assert_relative_eq!(breakdown.largest_region().unwrap().weight_pct, 75.0);
    }

    #[test]
    fn top10_concentration_uses_ten_largest() {
        let holdings: Vec<Holding> = (0..15)
            .map(|i| holding("F", &format!("T{i:02}"), "Tech", "US", 15.0 - i as f64))
            .collect();
        let breakdown = fund_breakdown(&holdings);

        // 15 + 14 + … + 6
        assert_relative_eq!(breakdown.top10_concentration, 105.0);
    }

    #[test]
    fn aggregate_spreads_fund_value_by_weight() {
        let holdings = vec![
            holding("World", "AAA", "Tech", "US", 60.0),
            holding("World", "BBB", "Health", "Europe", 40.0),
        ];
        let fund_values = BTreeMap::from([("World".to_string(), 1000.0)]);
        let portfolio =
            aggregate_portfolio(&holdings, &fund_values, &[], &BTreeMap::new());

        assert_relative_eq!(portfolio.total_value, 1000.0);
        assert_eq!(portfolio.lines[0].ticker, "AAA");
        assert_relative_eq!(portfolio.lines[0].value, 600.0);
        assert_relative_eq!(portfolio.lines[0].weight_pct, 60.0);
    }

    #[test]
    fn aggregate_merges_overlapping_tickers() {
        let holdings = vec![
            holding("FundA", "AAA", "Tech", "US", 50.0),
            holding("FundA", "BBB", "Health", "US", 50.0),
            holding("FundB", "AAA", "Tech", "US", 100.0),
        ];
        let fund_values = BTreeMap::from([
            ("FundA".to_string(), 1000.0),
            ("FundB".to_string(), 500.0),
        ]);
        let stocks = vec![stock("AAA", "Tech", "US")];
        let stock_values = BTreeMap::from([("AAA".to_string(), 250.0)]);

        let portfolio = aggregate_portfolio(&holdings, &fund_values, &stocks, &stock_values);

        // AAA: 500 (FundA) + 500 (FundB) + 250 (direct) = 1250 of 1750.
        assert_relative_eq!(portfolio.total_value, 1750.0);
        let aaa = &portfolio.lines[0];
        assert_eq!(aaa.ticker, "AAA");
        assert_relative_eq!(aaa.value, 1250.0);
        assert_relative_eq!(aaa.weight_pct, 1250.0 / 1750.0 * 100.0);
    }

    #[test]
    fn aggregate_weights_sum_to_hundred() {
        let holdings = vec![
            holding("F", "AAA", "Tech", "US", 30.0),
            holding("F", "BBB", "Health", "Europe", 70.0),
        ];
        let fund_values = BTreeMap::from([("F".to_string(), 730.0)]);
        let stocks = vec![stock("CCC", "Energy", "Asia")];
        let stock_values = BTreeMap::from([("CCC".to_string(), 270.0)]);

        let portfolio = aggregate_portfolio(&holdings, &fund_values, &stocks, &stock_values);
        let weight_sum: f64 = portfolio.lines.iter().map(|l| l.weight_pct).sum();
        assert_relative_eq!(weight_sum, 100.0, epsilon = 1e-9);
    }

    #[test]
    fn aggregate_empty_values_is_empty_not_nan() {
        let holdings = vec![holding("F", "AAA", "Tech", "US", 100.0)];
        let portfolio =
            aggregate_portfolio(&holdings, &BTreeMap::new(), &[], &BTreeMap::new());
        assert!(portfolio.lines.is_empty());
        assert_eq!(portfolio.total_value, 0.0);
    }

    #[test]
    fn aggregate_ignores_funds_without_values() {
        let holdings = vec![
            holding("Selected", "AAA", "Tech", "US", 100.0),
            holding("Other", "BBB", "Health", "US", 100.0),
        ];
        let fund_values = BTreeMap::from([("Selected".to_string(), 100.0)]);
        let portfolio =
            aggregate_portfolio(&holdings, &fund_values, &[], &BTreeMap::new());

        assert_eq!(portfolio.lines.len(), 1);
        assert_eq!(portfolio.lines[0].ticker, "AAA");
    }
}
