//! Inline SVG charts for the HTML report and the dashboard.
//!
//! Every function returns an empty string when there is nothing to plot so
//! callers can show a placeholder instead.

use chrono::NaiveDate;

use crate::domain::distribution::HistogramBin;
use crate::domain::monthly::MonthlyReturnRow;
use crate::domain::series::SeriesPoint;

const CHART_WIDTH: f64 = 800.0;
const CHART_HEIGHT: f64 = 300.0;
const MARGIN_LEFT: f64 = 60.0;
const MARGIN_RIGHT: f64 = 20.0;
const MARGIN_TOP: f64 = 30.0;
const MARGIN_BOTTOM: f64 = 40.0;

const HEATMAP_CELL_HEIGHT: f64 = 24.0;

pub const EQUITY_COLOR: &str = "#1f77b4";
pub const BENCHMARK_COLOR: &str = "#ff7f0e";
pub const DRAWDOWN_FILL: &str = "rgba(255,0,0,0.3)";
pub const HISTOGRAM_COLOR: &str = "skyblue";
pub const MISSING_CELL_COLOR: &str = "#eeeeee";

const MONTH_LABELS: [&str; 12] = [
    "Jan", "Feb", "Mar", "Apr", "May", "Jun", "Jul", "Aug", "Sep", "Oct", "Nov", "Dec",
];

fn plot_width() -> f64 {
    CHART_WIDTH - MARGIN_LEFT - MARGIN_RIGHT
}

fn plot_height() -> f64 {
    CHART_HEIGHT - MARGIN_TOP - MARGIN_BOTTOM
}

fn svg_open(svg: &mut String, width: f64, height: f64, title: &str) {
    svg.push_str(&format!(
        r##"<svg width="{w}" height="{h}" viewBox="0 0 {w} {h}" xmlns="http://www.w3.org/2000/svg" role="img" aria-label="{title}">"##,
        w = width,
        h = height,
        title = title
    ));
    svg.push_str("\n  <rect width=\"100%\" height=\"100%\" fill=\"white\"/>\n");
    svg.push_str(&format!(
        "  <text x=\"{}\" y=\"18\" font-size=\"13\" font-weight=\"bold\" fill=\"#333\">{}</text>\n",
        MARGIN_LEFT, title
    ));
}

fn axes(svg: &mut String) {
    svg.push_str(&format!(
        "  <line x1=\"{}\" y1=\"{}\" x2=\"{}\" y2=\"{}\" stroke=\"#ccc\" stroke-width=\"1\"/>\n",
        MARGIN_LEFT,
        MARGIN_TOP,
        MARGIN_LEFT,
        CHART_HEIGHT - MARGIN_BOTTOM
    ));
    svg.push_str(&format!(
        "  <line x1=\"{}\" y1=\"{}\" x2=\"{}\" y2=\"{}\" stroke=\"#ccc\" stroke-width=\"1\"/>\n",
        MARGIN_LEFT,
        CHART_HEIGHT - MARGIN_BOTTOM,
        CHART_WIDTH - MARGIN_RIGHT,
        CHART_HEIGHT - MARGIN_BOTTOM
    ));
}

fn text(svg: &mut String, x: f64, y: f64, anchor: &str, label: &str) {
    svg.push_str(&format!(
        "  <text x=\"{:.1}\" y=\"{:.1}\" text-anchor=\"{}\" font-size=\"10\" fill=\"#666\">{}</text>\n",
        x, y, anchor, label
    ));
}

/// Labels at the top, middle and bottom of the y axis.
fn y_labels(svg: &mut String, min: f64, max: f64, fmt: fn(f64) -> String) {
    let x = MARGIN_LEFT - 5.0;
    text(svg, x, MARGIN_TOP + 5.0, "end", &fmt(max));
    text(svg, x, MARGIN_TOP + plot_height() / 2.0, "end", &fmt((max + min) / 2.0));
    text(svg, x, CHART_HEIGHT - MARGIN_BOTTOM - 5.0, "end", &fmt(min));
}

fn x_date_labels(svg: &mut String, start: NaiveDate, end: NaiveDate) {
    let mid = start + (end - start) / 2;
    let y = CHART_HEIGHT - MARGIN_BOTTOM + 15.0;
    text(svg, MARGIN_LEFT, y, "start", &start.to_string());
    text(svg, MARGIN_LEFT + plot_width() / 2.0, y, "middle", &mid.to_string());
    text(svg, CHART_WIDTH - MARGIN_RIGHT, y, "end", &end.to_string());
}

fn fmt_value(v: f64) -> String {
    if v.abs() >= 1000.0 {
        format!("{:.0}", v)
    } else {
        format!("{:.2}", v)
    }
}

fn fmt_pct(v: f64) -> String {
    format!("{:.1}%", v * 100.0)
}

/// Maps dates onto the plot's x range.
struct DateScale {
    start: NaiveDate,
    days: f64,
}

impl DateScale {
    fn new(start: NaiveDate, end: NaiveDate) -> Self {
        Self {
            start,
            days: ((end - start).num_days() as f64).max(1.0),
        }
    }

    fn x(&self, date: NaiveDate) -> f64 {
        MARGIN_LEFT + (date - self.start).num_days() as f64 / self.days * plot_width()
    }
}

fn y_scale(min: f64, max: f64) -> impl Fn(f64) -> f64 {
    let range = if max > min { max - min } else { 1.0 };
    move |v| MARGIN_TOP + plot_height() - ((v - min) / range) * plot_height()
}

fn line_path(points: &[SeriesPoint], xs: &DateScale, y: &impl Fn(f64) -> f64) -> String {
    let mut path = String::new();
    for (i, p) in points.iter().filter(|p| p.value.is_finite()).enumerate() {
        let cmd = if i == 0 { "M" } else { " L" };
        path.push_str(&format!("{} {:.1} {:.1}", cmd, xs.x(p.date), y(p.value)));
    }
    path
}

fn date_bounds(points: &[SeriesPoint]) -> Option<(NaiveDate, NaiveDate)> {
    let start = points.iter().map(|p| p.date).min()?;
    let end = points.iter().map(|p| p.date).max()?;
    Some((start, end))
}

fn value_bounds(points: &[SeriesPoint]) -> (f64, f64) {
    points
        .iter()
        .map(|p| p.value)
        .filter(|v| v.is_finite())
        .fold((f64::INFINITY, f64::NEG_INFINITY), |(lo, hi), v| {
            (lo.min(v), hi.max(v))
        })
}

/// Portfolio equity line, with an optional dashed benchmark line on the same
/// axes.
pub fn equity_svg(equity: &[SeriesPoint], benchmark: Option<&[SeriesPoint]>) -> String {
    let benchmark = benchmark.unwrap_or(&[]);
    let all: Vec<SeriesPoint> = equity.iter().chain(benchmark).copied().collect();
    let Some((start, end)) = date_bounds(equity) else {
        return String::new();
    };
    let (min, max) = value_bounds(&all);
    if !min.is_finite() || !max.is_finite() {
        return String::new();
    }

    let xs = DateScale::new(start, end);
    let y = y_scale(min, max);

    let mut svg = String::new();
    svg_open(&mut svg, CHART_WIDTH, CHART_HEIGHT, "Cumulative Returns");
    axes(&mut svg);
    y_labels(&mut svg, min, max, fmt_value);
    x_date_labels(&mut svg, start, end);

    svg.push_str(&format!(
        "  <path d=\"{}\" fill=\"none\" stroke=\"{}\" stroke-width=\"2\"/>\n",
        line_path(equity, &xs, &y),
        EQUITY_COLOR
    ));
    if !benchmark.is_empty() {
        svg.push_str(&format!(
            "  <path d=\"{}\" fill=\"none\" stroke=\"{}\" stroke-width=\"1.5\" stroke-dasharray=\"6 4\"/>\n",
            line_path(benchmark, &xs, &y),
            BENCHMARK_COLOR
        ));
        legend(&mut svg, &[("Portfolio", EQUITY_COLOR), ("Benchmark", BENCHMARK_COLOR)]);
    }
    svg.push_str("</svg>");
    svg
}

fn legend(svg: &mut String, entries: &[(&str, &str)]) {
    let mut x = CHART_WIDTH - MARGIN_RIGHT - 180.0;
    for (label, color) in entries {
        svg.push_str(&format!(
            "  <rect x=\"{:.1}\" y=\"10\" width=\"12\" height=\"3\" fill=\"{}\"/>\n",
            x, color
        ));
        svg.push_str(&format!(
            "  <text x=\"{:.1}\" y=\"15\" font-size=\"10\" fill=\"#333\">{}</text>\n",
            x + 16.0,
            label
        ));
        x += 90.0;
    }
}

/// Underwater chart: filled area between zero and the drawdown.
pub fn drawdown_svg(drawdowns: &[SeriesPoint]) -> String {
    let Some((start, end)) = date_bounds(drawdowns) else {
        return String::new();
    };
    let (min, _) = value_bounds(drawdowns);
    let min = if min.is_finite() { min.min(0.0) } else { 0.0 };

    let xs = DateScale::new(start, end);
    let y = y_scale(min, 0.0);

    let mut area = format!("M {:.1} {:.1}", xs.x(start), y(0.0));
    for p in drawdowns.iter().filter(|p| p.value.is_finite()) {
        area.push_str(&format!(" L {:.1} {:.1}", xs.x(p.date), y(p.value)));
    }
    area.push_str(&format!(" L {:.1} {:.1} Z", xs.x(end), y(0.0)));

    let mut svg = String::new();
    svg_open(&mut svg, CHART_WIDTH, CHART_HEIGHT, "Drawdown");
    axes(&mut svg);
    y_labels(&mut svg, min, 0.0, fmt_pct);
    x_date_labels(&mut svg, start, end);
    svg.push_str(&format!(
        "  <path d=\"{}\" fill=\"{}\" stroke=\"red\" stroke-width=\"1\"/>\n",
        area, DRAWDOWN_FILL
    ));
    svg.push_str("</svg>");
    svg
}

/// Red-yellow-green diverging color, centred on zero and saturating at
/// `±scale`.
pub fn heatmap_color(value: f64, scale: f64) -> String {
    const RED: (f64, f64, f64) = (215.0, 48.0, 39.0);
    const YELLOW: (f64, f64, f64) = (255.0, 255.0, 191.0);
    const GREEN: (f64, f64, f64) = (26.0, 152.0, 80.0);

    let t = if scale > 0.0 {
        (value / scale).clamp(-1.0, 1.0)
    } else {
        0.0
    };
    let (from, to, f) = if t < 0.0 {
        (YELLOW, RED, -t)
    } else {
        (YELLOW, GREEN, t)
    };
    let mix = |a: f64, b: f64| (a + (b - a) * f).round() as u8;
    format!(
        "#{:02x}{:02x}{:02x}",
        mix(from.0, to.0),
        mix(from.1, to.1),
        mix(from.2, to.2)
    )
}

/// Year by month grid of monthly returns.
pub fn monthly_heatmap_svg(rows: &[MonthlyReturnRow]) -> String {
    if rows.is_empty() {
        return String::new();
    }

    let scale = rows
        .iter()
        .flat_map(|r| r.months.iter().flatten())
        .map(|v| v.abs())
        .filter(|v| v.is_finite())
        .fold(0.0_f64, f64::max);

    let cell_width = plot_width() / 12.0;
    let height = MARGIN_TOP + 20.0 + rows.len() as f64 * HEATMAP_CELL_HEIGHT + 10.0;

    let mut svg = String::new();
    svg_open(&mut svg, CHART_WIDTH, height, "Monthly Returns (%)");

    let header_y = MARGIN_TOP + 12.0;
    for (i, month) in MONTH_LABELS.iter().enumerate() {
        text(
            &mut svg,
            MARGIN_LEFT + (i as f64 + 0.5) * cell_width,
            header_y,
            "middle",
            month,
        );
    }

    for (row_idx, row) in rows.iter().enumerate() {
        let top = MARGIN_TOP + 20.0 + row_idx as f64 * HEATMAP_CELL_HEIGHT;
        text(
            &mut svg,
            MARGIN_LEFT - 8.0,
            top + HEATMAP_CELL_HEIGHT / 2.0 + 4.0,
            "end",
            &row.year.to_string(),
        );
        for (col, value) in row.months.iter().enumerate() {
            let x = MARGIN_LEFT + col as f64 * cell_width;
            let fill = match value {
                Some(v) if v.is_finite() => heatmap_color(*v, scale),
                _ => MISSING_CELL_COLOR.to_string(),
            };
            svg.push_str(&format!(
                "  <rect x=\"{:.1}\" y=\"{:.1}\" width=\"{:.1}\" height=\"{:.1}\" fill=\"{}\" stroke=\"white\"/>\n",
                x, top, cell_width, HEATMAP_CELL_HEIGHT, fill
            ));
            if let Some(v) = value {
                svg.push_str(&format!(
                    "  <text x=\"{:.1}\" y=\"{:.1}\" text-anchor=\"middle\" font-size=\"10\" fill=\"#222\">{:.1}</text>\n",
                    x + cell_width / 2.0,
                    top + HEATMAP_CELL_HEIGHT / 2.0 + 4.0,
                    v * 100.0
                ));
            }
        }
    }
    svg.push_str("</svg>");
    svg
}

/// Histogram of periodic returns in percent.
pub fn distribution_svg(bins: &[HistogramBin]) -> String {
    let (Some(first), Some(last)) = (bins.first(), bins.last()) else {
        return String::new();
    };
    let max_count = bins.iter().map(|b| b.count).max().unwrap_or(0).max(1) as f64;
    let bar_width = plot_width() / bins.len() as f64;

    let mut svg = String::new();
    svg_open(&mut svg, CHART_WIDTH, CHART_HEIGHT, "Return Distribution");
    axes(&mut svg);
    y_labels(&mut svg, 0.0, max_count, |v| format!("{:.0}", v));

    for (i, bin) in bins.iter().enumerate() {
        let h = bin.count as f64 / max_count * plot_height();
        svg.push_str(&format!(
            "  <rect x=\"{:.1}\" y=\"{:.1}\" width=\"{:.1}\" height=\"{:.1}\" fill=\"{}\" stroke=\"white\" stroke-width=\"0.5\"/>\n",
            MARGIN_LEFT + i as f64 * bar_width,
            CHART_HEIGHT - MARGIN_BOTTOM - h,
            bar_width,
            h,
            HISTOGRAM_COLOR
        ));
    }

    let y = CHART_HEIGHT - MARGIN_BOTTOM + 15.0;
    text(&mut svg, MARGIN_LEFT, y, "start", &fmt_pct(first.lower));
    text(
        &mut svg,
        CHART_WIDTH - MARGIN_RIGHT,
        y,
        "end",
        &fmt_pct(last.upper),
    );
    svg.push_str("</svg>");
    svg
}
