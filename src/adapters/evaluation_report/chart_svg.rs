//! SVG comparison chart: enhanced, classical and buy & hold equity on one
//! set of axes.

use crate::domain::comparison::ComparisonPoint;

const CHART_WIDTH: f64 = 900.0;
const CHART_HEIGHT: f64 = 450.0;
const MARGIN_LEFT: f64 = 80.0;
const MARGIN_RIGHT: f64 = 20.0;
const MARGIN_TOP: f64 = 50.0;
const MARGIN_BOTTOM: f64 = 40.0;

struct Series {
    label: &'static str,
    color: &'static str,
    value: fn(&ComparisonPoint) -> f64,
}

fn enhanced(p: &ComparisonPoint) -> f64 {
    p.enhanced
}

fn classical(p: &ComparisonPoint) -> f64 {
    p.classical
}

fn buy_and_hold(p: &ComparisonPoint) -> f64 {
    p.buy_and_hold
}

static SERIES: [Series; 3] = [
    Series {
        label: "Enhanced",
        color: "#2563eb",
        value: enhanced,
    },
    Series {
        label: "Classical",
        color: "#dc2626",
        value: classical,
    },
    Series {
        label: "Buy & Hold",
        color: "#6b7280",
        value: buy_and_hold,
    },
];

fn escape(text: &str) -> String {
    text.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
}

fn fmt_money(value: f64) -> String {
    if value >= 0.0 {
        format!("{:.0}", value)
    } else {
        format!("-{:.0}", value.abs())
    }
}

pub fn comparison_chart(ticker: &str, points: &[ComparisonPoint]) -> String {
    let title = format!("{}: Strategy Comparison", escape(ticker));

    let mut svg = String::new();
    svg.push_str(&format!(
        r##"<svg width="{}" height="{}" viewBox="0 0 {} {}" xmlns="http://www.w3.org/2000/svg">"##,
        CHART_WIDTH, CHART_HEIGHT, CHART_WIDTH, CHART_HEIGHT
    ));
    svg.push_str("\n  <rect width=\"100%\" height=\"100%\" fill=\"white\"/>\n");
    svg.push_str(&format!(
        "  <text x=\"{}\" y=\"22\" text-anchor=\"middle\" font-size=\"16\" fill=\"#111\">{}</text>\n",
        CHART_WIDTH / 2.0,
        title
    ));

    if points.is_empty() {
        svg.push_str(&format!(
            "  <text x=\"{}\" y=\"{}\" text-anchor=\"middle\" font-size=\"12\" fill=\"#666\">No equity data available.</text>\n",
            CHART_WIDTH / 2.0,
            CHART_HEIGHT / 2.0
        ));
        svg.push_str("</svg>\n");
        return svg;
    }

    let values = || {
        points
            .iter()
            .flat_map(|p| SERIES.iter().map(move |s| (s.value)(p)))
            .filter(|v| v.is_finite())
    };
    let min_value = values().fold(f64::INFINITY, f64::min);
    let max_value = values().fold(f64::NEG_INFINITY, f64::max);
    let range = if max_value > min_value {
        max_value - min_value
    } else {
        1.0
    };

    let plot_width = CHART_WIDTH - MARGIN_LEFT - MARGIN_RIGHT;
    let plot_height = CHART_HEIGHT - MARGIN_TOP - MARGIN_BOTTOM;

    let x_scale =
        |i: usize| -> f64 { MARGIN_LEFT + (i as f64 / (points.len() - 1).max(1) as f64) * plot_width };
    let y_scale =
        |v: f64| -> f64 { MARGIN_TOP + plot_height - ((v - min_value) / range) * plot_height };

    // axes
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

    for (fraction, value) in [
        (0.0, max_value),
        (0.5, (max_value + min_value) / 2.0),
        (1.0, min_value),
    ] {
        svg.push_str(&format!(
            "  <text x=\"{}\" y=\"{:.1}\" text-anchor=\"end\" font-size=\"10\" fill=\"#666\">{}</text>\n",
            MARGIN_LEFT - 5.0,
            MARGIN_TOP + fraction * plot_height + 4.0,
            fmt_money(value)
        ));
    }
    svg.push_str(&format!(
        "  <text x=\"15\" y=\"{}\" text-anchor=\"middle\" font-size=\"11\" fill=\"#666\" transform=\"rotate(-90 15 {})\">Portfolio Value</text>\n",
        MARGIN_TOP + plot_height / 2.0,
        MARGIN_TOP + plot_height / 2.0
    ));

    let mid = points.len() / 2;
    for (x, date) in [
        (MARGIN_LEFT, points[0].date),
        (MARGIN_LEFT + plot_width / 2.0, points[mid].date),
        (CHART_WIDTH - MARGIN_RIGHT, points[points.len() - 1].date),
    ] {
        svg.push_str(&format!(
            "  <text x=\"{}\" y=\"{}\" text-anchor=\"middle\" font-size=\"10\" fill=\"#666\">{}</text>\n",
            x,
            CHART_HEIGHT - 10.0,
            date
        ));
    }

    for series in &SERIES {
        let mut path_data = String::new();
        for (i, point) in points.iter().enumerate() {
            let value = (series.value)(point);
            if !value.is_finite() {
                continue;
            }
            let command = if path_data.is_empty() { "M" } else { " L" };
            path_data.push_str(&format!(
                "{} {:.1} {:.1}",
                command,
                x_scale(i),
                y_scale(value)
            ));
        }
        svg.push_str(&format!(
            "  <path d=\"{}\" fill=\"none\" stroke=\"{}\" stroke-width=\"1.5\"/>\n",
            path_data, series.color
        ));
    }

    // legend, top left inside the plot
    for (i, series) in SERIES.iter().enumerate() {
        let y = MARGIN_TOP + 10.0 + i as f64 * 16.0;
        svg.push_str(&format!(
            "  <line x1=\"{}\" y1=\"{}\" x2=\"{}\" y2=\"{}\" stroke=\"{}\" stroke-width=\"2\"/>\n",
            MARGIN_LEFT + 10.0,
            y,
            MARGIN_LEFT + 30.0,
            y,
            series.color
        ));
        svg.push_str(&format!(
            "  <text x=\"{}\" y=\"{}\" font-size=\"11\" fill=\"#111\">{}</text>\n",
            MARGIN_LEFT + 36.0,
            y + 4.0,
            escape(series.label)
        ));
    }

    svg.push_str("</svg>\n");
    svg
}
