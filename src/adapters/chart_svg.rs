//! SVG chart rendering.
//!
//! Pure string builders: series in, `<svg>` markup out. All styling comes
//! from an explicit [`ChartTheme`] passed by the caller; there is no
//! global theme state.

use chrono::NaiveDate;

use crate::domain::allocation::BreakdownRow;
use crate::domain::normalizer::DailyDividendPoint;
use crate::domain::returns::ReturnPoint;

/// Colors and dimensions for every chart. One instance is built at startup
/// and passed through to each renderer.
#[derive(Debug, Clone)]
pub struct ChartTheme {
    pub width: f64,
    pub height: f64,
    pub margin_left: f64,
    pub margin_right: f64,
    pub margin_top: f64,
    pub margin_bottom: f64,
    pub primary_color: String,
    pub secondary_color: String,
    pub axis_color: String,
    pub grid_color: String,
    pub background: String,
    pub font_family: String,
}

impl Default for ChartTheme {
    fn default() -> Self {
        Self {
            width: 760.0,
            height: 300.0,
            margin_left: 60.0,
            margin_right: 60.0,
            margin_top: 30.0,
            margin_bottom: 40.0,
            primary_color: "#3B97F3".into(),
            secondary_color: "#F27716".into(),
            axis_color: "#666".into(),
            grid_color: "#ccc".into(),
            background: "white".into(),
            font_family: "Lato, sans-serif".into(),
        }
    }
}

impl ChartTheme {
    fn plot_width(&self) -> f64 {
        self.width - self.margin_left - self.margin_right
    }

    fn plot_height(&self) -> f64 {
        self.height - self.margin_top - self.margin_bottom
    }
}

fn open_svg(theme: &ChartTheme, title: &str) -> String {
    let mut svg = format!(
        r##"<svg width="{w}" height="{h}" viewBox="0 0 {w} {h}" font-family="{font}" xmlns="http://www.w3.org/2000/svg">"##,
        w = theme.width,
        h = theme.height,
        font = theme.font_family
    );
    svg.push_str(&format!(
        "\n  <rect width=\"100%\" height=\"100%\" fill=\"{}\"/>\n",
        theme.background
    ));
    svg.push_str(&format!(
        "  <text x=\"{}\" y=\"15\" text-anchor=\"end\" font-size=\"12\" fill=\"{}\">{}</text>\n",
        theme.width - theme.margin_right,
        theme.axis_color,
        title
    ));
    svg
}

fn push_frame(svg: &mut String, theme: &ChartTheme) {
    svg.push_str(&format!(
        "  <line x1=\"{}\" y1=\"{}\" x2=\"{}\" y2=\"{}\" stroke=\"{}\" stroke-width=\"1\"/>\n",
        theme.margin_left,
        theme.margin_top,
        theme.margin_left,
        theme.height - theme.margin_bottom,
        theme.grid_color
    ));
    svg.push_str(&format!(
        "  <line x1=\"{}\" y1=\"{}\" x2=\"{}\" y2=\"{}\" stroke=\"{}\" stroke-width=\"1\"/>\n",
        theme.margin_left,
        theme.height - theme.margin_bottom,
        theme.width - theme.margin_right,
        theme.height - theme.margin_bottom,
        theme.grid_color
    ));
}

fn push_date_labels(svg: &mut String, theme: &ChartTheme, dates: &[NaiveDate]) {
    let (Some(first), Some(last)) = (dates.first(), dates.last()) else {
        return;
    };
    let mid = dates[dates.len() / 2];

    for (x, date) in [
        (theme.margin_left, first),
        (theme.margin_left + theme.plot_width() / 2.0, &mid),
        (theme.width - theme.margin_right, last),
    ] {
        svg.push_str(&format!(
            "  <text x=\"{}\" y=\"{}\" text-anchor=\"middle\" font-size=\"10\" fill=\"{}\">{}</text>\n",
            x,
            theme.height - 5.0,
            theme.axis_color,
            date
        ));
    }
}

fn push_axis_label(svg: &mut String, theme: &ChartTheme, y: f64, text: &str, anchor_left: bool) {
    let (x, anchor) = if anchor_left {
        (theme.margin_left - 5.0, "end")
    } else {
        (theme.width - theme.margin_right + 5.0, "start")
    };
    svg.push_str(&format!(
        "  <text x=\"{}\" y=\"{}\" text-anchor=\"{}\" font-size=\"10\" fill=\"{}\">{}</text>\n",
        x, y, anchor, theme.axis_color, text
    ));
}

fn line_path<F>(values: &[f64], x_scale: F, y_scale: impl Fn(f64) -> f64, step: bool) -> String
where
    F: Fn(usize) -> f64,
{
    let mut path = String::new();
    let mut prev_y = 0.0;
    for (i, &value) in values.iter().enumerate() {
        let x = x_scale(i);
        let y = y_scale(value);
        if i == 0 {
            path.push_str(&format!("M {:.1} {:.1}", x, y));
        } else if step {
            // step-after: hold the previous value until this x.
            path.push_str(&format!(" L {:.1} {:.1} L {:.1} {:.1}", x, prev_y, x, y));
        } else {
            path.push_str(&format!(" L {:.1} {:.1}", x, y));
        }
        prev_y = y;
    }
    path
}

fn min_max(values: impl Iterator<Item = f64>) -> (f64, f64) {
    values.fold((f64::INFINITY, f64::NEG_INFINITY), |(min, max), v| {
        (min.min(v), max.max(v))
    })
}

/// Yearly dividend run-rate (step line, left axis) layered with the close
/// price (line, right axis).
pub fn dividend_chart(daily: &[DailyDividendPoint], theme: &ChartTheme) -> String {
    if daily.len() < 2 {
        return String::new();
    }

    let (div_min, div_max) = min_max(daily.iter().map(|p| p.yearly_dividend));
    let (close_min, close_max) = min_max(daily.iter().map(|p| p.close));
    let div_range = (div_max - div_min).max(1e-9);
    let close_range = (close_max - close_min).max(1e-9);

    let x_scale = |i: usize| -> f64 {
        theme.margin_left + (i as f64 / (daily.len() - 1) as f64) * theme.plot_width()
    };
    let div_y = |v: f64| -> f64 {
        theme.margin_top + theme.plot_height() - ((v - div_min) / div_range) * theme.plot_height()
    };
    let close_y = |v: f64| -> f64 {
        theme.margin_top + theme.plot_height()
            - ((v - close_min) / close_range) * theme.plot_height()
    };

    let dividends: Vec<f64> = daily.iter().map(|p| p.yearly_dividend).collect();
    let closes: Vec<f64> = daily.iter().map(|p| p.close).collect();
    let dates: Vec<NaiveDate> = daily.iter().map(|p| p.date).collect();

    let mut svg = open_svg(theme, "Yearly dividends / price ($)");
    push_frame(&mut svg, theme);
    push_axis_label(&mut svg, theme, theme.margin_top + 5.0, &format!("${:.2}", div_max), true);
    push_axis_label(
        &mut svg,
        theme,
        theme.height - theme.margin_bottom - 5.0,
        &format!("${:.2}", div_min),
        true,
    );
    push_axis_label(&mut svg, theme, theme.margin_top + 5.0, &format!("${:.0}", close_max), false);
    push_axis_label(
        &mut svg,
        theme,
        theme.height - theme.margin_bottom - 5.0,
        &format!("${:.0}", close_min),
        false,
    );
    push_date_labels(&mut svg, theme, &dates);

    svg.push_str(&format!(
        "  <path d=\"{}\" fill=\"none\" stroke=\"{}\" stroke-width=\"1.5\"/>\n",
        line_path(&closes, x_scale, close_y, false),
        theme.secondary_color
    ));
    svg.push_str(&format!(
        "  <path d=\"{}\" fill=\"none\" stroke=\"{}\" stroke-width=\"2\"/>\n",
        line_path(&dividends, x_scale, div_y, true),
        theme.primary_color
    ));
    svg.push_str("</svg>");
    svg
}

/// Price return and total return as percentage lines sharing one axis.
pub fn return_chart(points: &[ReturnPoint], theme: &ChartTheme) -> String {
    if points.len() < 2 {
        return String::new();
    }

    let (min, max) = min_max(
        points
            .iter()
            .flat_map(|p| [p.price_return, p.total_return]),
    );
    let range = (max - min).max(1e-9);

    let x_scale = |i: usize| -> f64 {
        theme.margin_left + (i as f64 / (points.len() - 1) as f64) * theme.plot_width()
    };
    let y_scale = |v: f64| -> f64 {
        theme.margin_top + theme.plot_height() - ((v - min) / range) * theme.plot_height()
    };

    let price: Vec<f64> = points.iter().map(|p| p.price_return).collect();
    let total: Vec<f64> = points.iter().map(|p| p.total_return).collect();
    let dates: Vec<NaiveDate> = points.iter().map(|p| p.date).collect();

    let mut svg = open_svg(theme, "Return (%)");
    push_frame(&mut svg, theme);
    push_axis_label(&mut svg, theme, theme.margin_top + 5.0, &format!("{:.0}%", max * 100.0), true);
    push_axis_label(
        &mut svg,
        theme,
        theme.height - theme.margin_bottom - 5.0,
        &format!("{:.0}%", min * 100.0),
        true,
    );
    push_date_labels(&mut svg, theme, &dates);

    svg.push_str(&format!(
        "  <path d=\"{}\" fill=\"none\" stroke=\"{}\" stroke-width=\"1.5\"/>\n",
        line_path(&price, x_scale, y_scale, false),
        theme.secondary_color
    ));
    svg.push_str(&format!(
        "  <path d=\"{}\" fill=\"none\" stroke=\"{}\" stroke-width=\"2\"/>\n",
        line_path(&total, x_scale, y_scale, false),
        theme.primary_color
    ));
    svg.push_str("</svg>");
    svg
}

/// Total drawdown as a filled area with the price drawdown line on top.
/// Zero sits at the top edge; the deepest drawdown sets the scale.
pub fn drawdown_chart(points: &[ReturnPoint], theme: &ChartTheme) -> String {
    if points.len() < 2 {
        return String::new();
    }

    let deepest = points
        .iter()
        .flat_map(|p| [p.price_drawdown, p.total_drawdown])
        .fold(0.0_f64, f64::min)
        .min(-0.01);

    let x_scale = |i: usize| -> f64 {
        theme.margin_left + (i as f64 / (points.len() - 1) as f64) * theme.plot_width()
    };
    let y_scale =
        |dd: f64| -> f64 { theme.margin_top + (dd / deepest) * theme.plot_height() };

    let total: Vec<f64> = points.iter().map(|p| p.total_drawdown).collect();
    let price: Vec<f64> = points.iter().map(|p| p.price_drawdown).collect();
    let dates: Vec<NaiveDate> = points.iter().map(|p| p.date).collect();

    let mut area = line_path(&total, x_scale, y_scale, false);
    area.push_str(&format!(
        " L {:.1} {:.1} L {:.1} {:.1} Z",
        x_scale(points.len() - 1),
        y_scale(0.0),
        x_scale(0),
        y_scale(0.0)
    ));

    let mut svg = open_svg(theme, "Drawdown (%)");
    push_frame(&mut svg, theme);
    push_axis_label(&mut svg, theme, theme.margin_top + 5.0, "0%", true);
    push_axis_label(
        &mut svg,
        theme,
        theme.height - theme.margin_bottom - 5.0,
        &format!("{:.1}%", deepest * 100.0),
        true,
    );
    push_date_labels(&mut svg, theme, &dates);

    svg.push_str(&format!(
        "  <path d=\"{}\" fill=\"{}\" fill-opacity=\"0.35\" stroke=\"none\"/>\n",
        area, theme.primary_color
    ));
    svg.push_str(&format!(
        "  <path d=\"{}\" fill=\"none\" stroke=\"{}\" stroke-width=\"1.5\"/>\n",
        line_path(&price, x_scale, y_scale, false),
        theme.secondary_color
    ));
    svg.push_str("</svg>");
    svg
}

/// Horizontal bars for one allocation breakdown, largest weight first.
pub fn allocation_chart(rows: &[BreakdownRow], title: &str, theme: &ChartTheme) -> String {
    if rows.is_empty() {
        return String::new();
    }

    let bar_height = 18.0;
    let gap = 6.0;
    let label_width = 160.0;
    let height = theme.margin_top + rows.len() as f64 * (bar_height + gap) + 10.0;
    let max_weight = rows
        .iter()
        .map(|r| r.weight_pct)
        .fold(f64::NEG_INFINITY, f64::max)
        .max(1e-9);
    let bar_area = theme.width - label_width - theme.margin_right - 60.0;

    let mut svg = format!(
        r##"<svg width="{w}" height="{h}" viewBox="0 0 {w} {h}" font-family="{font}" xmlns="http://www.w3.org/2000/svg">"##,
        w = theme.width,
        h = height,
        font = theme.font_family
    );
    svg.push_str(&format!(
        "\n  <rect width=\"100%\" height=\"100%\" fill=\"{}\"/>\n",
        theme.background
    ));
    svg.push_str(&format!(
        "  <text x=\"{}\" y=\"15\" text-anchor=\"end\" font-size=\"12\" fill=\"{}\">{}</text>\n",
        theme.width - theme.margin_right,
        theme.axis_color,
        title
    ));

    for (i, row) in rows.iter().enumerate() {
        let y = theme.margin_top + i as f64 * (bar_height + gap);
        let width = row.weight_pct / max_weight * bar_area;
        svg.push_str(&format!(
            "  <text x=\"{}\" y=\"{}\" text-anchor=\"end\" font-size=\"11\" fill=\"{}\">{}</text>\n",
            label_width - 8.0,
            y + bar_height - 5.0,
            theme.axis_color,
            row.label
        ));
        svg.push_str(&format!(
            "  <rect x=\"{}\" y=\"{}\" width=\"{:.1}\" height=\"{}\" fill=\"{}\"/>\n",
            label_width, y, width, bar_height, theme.primary_color
        ));
        svg.push_str(&format!(
            "  <text x=\"{:.1}\" y=\"{}\" font-size=\"11\" fill=\"{}\">{:.1}%</text>\n",
            label_width + width + 6.0,
            y + bar_height - 5.0,
            theme.axis_color,
            row.weight_pct
        ));
    }

    svg.push_str("</svg>");
    svg
}
