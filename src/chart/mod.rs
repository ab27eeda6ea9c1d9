//! SVG pie-chart export for coverage results.
//!
//! Produces a standalone SVG document (no scripts, no external assets) that
//! browsers, image viewers and document converters can open directly.

use std::f64::consts::PI;
use std::fmt::Write as _;

use chrono::{DateTime, Utc};

use crate::types::{AutomationStatus, CoverageResult};

const WIDTH: f64 = 480.0;
const HEIGHT: f64 = 360.0;
const CX: f64 = 150.0;
const CY: f64 = 190.0;
const RADIUS: f64 = 120.0;
const LEGEND_X: f64 = 300.0;
const LEGEND_Y: f64 = 150.0;
const LEGEND_ROW: f64 = 28.0;
const NO_DATA_FILL: &str = "#d0d4d9";

/// Slice order, clockwise from twelve o'clock.
const CATEGORIES: [AutomationStatus; 3] = [
    AutomationStatus::Yes,
    AutomationStatus::Candidate,
    AutomationStatus::No,
];

/// Presentation options for [`render_pie_svg`].
#[derive(Debug, Clone, Default)]
pub struct ChartOptions {
    pub title: String,
    /// Footer timestamp; omitted when `None`.
    pub generated_at: Option<DateTime<Utc>>,
}

impl ChartOptions {
    pub fn titled(title: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            generated_at: None,
        }
    }

    pub fn with_timestamp(mut self, at: DateTime<Utc>) -> Self {
        self.generated_at = Some(at);
        self
    }
}

/// Fill color for a category.
pub fn category_color(status: AutomationStatus) -> &'static str {
    match status {
        AutomationStatus::Yes => "#27ae60",
        AutomationStatus::Candidate => "#f39c12",
        AutomationStatus::No => "#e74c3c",
    }
}

/// Render `result` as a pie chart with a legend.
pub fn render_pie_svg(result: &CoverageResult, options: &ChartOptions) -> String {
    let mut out = String::with_capacity(2048);
    let _ = write!(
        out,
        "<svg xmlns=\"http://www.w3.org/2000/svg\" width=\"{WIDTH}\" height=\"{HEIGHT}\" \
         viewBox=\"0 0 {WIDTH} {HEIGHT}\" font-family=\"system-ui, -apple-system, sans-serif\">"
    );
    out.push_str("<rect width=\"100%\" height=\"100%\" fill=\"#ffffff\"/>");

    if !options.title.is_empty() {
        let _ = write!(
            out,
            "<text x=\"{}\" y=\"36\" text-anchor=\"middle\" font-size=\"20\" font-weight=\"700\" fill=\"#222\">",
            WIDTH / 2.0
        );
        svg_escape_into(&mut out, &options.title);
        out.push_str("</text>");
    }

    let counts = result.total_counts;
    let total = counts.total();

    out.push_str("<g class=\"slices\">");
    if total == 0 {
        let _ = write!(
            out,
            "<circle cx=\"{CX}\" cy=\"{CY}\" r=\"{RADIUS}\" fill=\"{NO_DATA_FILL}\"/>\
             <text x=\"{CX}\" y=\"{CY}\" text-anchor=\"middle\" dominant-baseline=\"middle\" \
             font-size=\"16\" fill=\"#555\">No data</text>"
        );
    } else {
        let mut start = 0.0_f64;
        for status in CATEGORIES {
            let count = counts.get(status);
            if count == 0 {
                continue;
            }
            let fraction = count as f64 / total as f64;
            push_slice(&mut out, start, fraction, category_color(status));
            start += fraction;
        }
    }
    out.push_str("</g>");

    out.push_str("<g class=\"legend\">");
    for (row, status) in CATEGORIES.into_iter().enumerate() {
        let y = LEGEND_Y + row as f64 * LEGEND_ROW;
        let percentage = match status {
            AutomationStatus::Yes => &result.percentages.yes,
            AutomationStatus::Candidate => &result.percentages.candidate,
            AutomationStatus::No => &result.percentages.no,
        };
        let _ = write!(
            out,
            "<rect x=\"{LEGEND_X}\" y=\"{:.1}\" width=\"14\" height=\"14\" fill=\"{}\"/>\
             <text x=\"{:.1}\" y=\"{:.1}\" font-size=\"13\" fill=\"#222\">{}: {} ({}%)</text>",
            y - 11.0,
            category_color(status),
            LEGEND_X + 22.0,
            y,
            status.label(),
            counts.get(status),
            percentage,
        );
    }
    out.push_str("</g>");

    if let Some(at) = options.generated_at {
        let _ = write!(
            out,
            "<text x=\"{}\" y=\"{}\" text-anchor=\"end\" font-size=\"10\" fill=\"#888\">Generated {}</text>",
            WIDTH - 12.0,
            HEIGHT - 10.0,
            at.format("%Y-%m-%d %H:%M UTC")
        );
    }

    out.push_str("</svg>");
    out
}

/// Append one slice covering `fraction` of the circle, starting `start` of
/// the way round from twelve o'clock.
fn push_slice(out: &mut String, start: f64, fraction: f64, fill: &str) {
    if fraction >= 1.0 {
        let _ = write!(
            out,
            "<circle cx=\"{CX}\" cy=\"{CY}\" r=\"{RADIUS}\" fill=\"{fill}\"/>"
        );
        return;
    }

    let (x1, y1) = point_at(start);
    let (x2, y2) = point_at(start + fraction);
    let large_arc = u8::from(fraction > 0.5);
    let _ = write!(
        out,
        "<path d=\"M {CX} {CY} L {x1:.2} {y1:.2} A {RADIUS} {RADIUS} 0 {large_arc} 1 {x2:.2} {y2:.2} Z\" \
         fill=\"{fill}\" stroke=\"#ffffff\" stroke-width=\"1\"/>"
    );
}

fn point_at(turns: f64) -> (f64, f64) {
    let angle = turns * 2.0 * PI - PI / 2.0;
    (CX + RADIUS * angle.cos(), CY + RADIUS * angle.sin())
}

/// SVG-escape a string into the output buffer.
fn svg_escape_into(out: &mut String, s: &str) {
    for c in s.chars() {
        match c {
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '&' => out.push_str("&amp;"),
            '"' => out.push_str("&quot;"),
            _ => out.push(c),
        }
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
