// =============================================================================
// Charts — SVG rendering of price and indicator series
// =============================================================================
//
// Every chart is an explicit `Chart` value that owns its data and, while
// rendering, its own `Canvas`.  There is no shared "current figure":
// `render(self)` consumes the chart, so the canvas is released on every path
// out of the call.
//
// Undefined indicator values are never drawn; lines break around them.
// =============================================================================

pub mod canvas;

use chrono::NaiveDate;
use serde::Serialize;

use crate::analysis::AnalysisReport;
use crate::indicators::rsi::{OVERBOUGHT_LEVEL, OVERSOLD_LEVEL};
use canvas::{Canvas, Stroke, DEFAULT_HEIGHT, DEFAULT_WIDTH};

/// Escape text for inclusion in SVG/HTML content or attribute values.
pub fn escape_text(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            _ => out.push(c),
        }
    }
    out
}

#[derive(Debug, Clone)]
struct LineSeries {
    label: String,
    values: Vec<Option<f64>>,
    color: &'static str,
}

#[derive(Debug, Clone, Copy)]
struct Guide {
    level: f64,
    color: &'static str,
}

/// A single chart description.  Build it up, then call [`Chart::render`].
#[derive(Debug, Clone)]
pub struct Chart {
    title: String,
    dates: Vec<NaiveDate>,
    lines: Vec<LineSeries>,
    guides: Vec<Guide>,
    bars: Option<(Vec<Option<f64>>, &'static str)>,
    legend: bool,
    width: f64,
    height: f64,
}

impl Chart {
    pub fn new(title: impl Into<String>, dates: Vec<NaiveDate>) -> Self {
        Self {
            title: title.into(),
            dates,
            lines: Vec::new(),
            guides: Vec::new(),
            bars: None,
            legend: false,
            width: DEFAULT_WIDTH,
            height: DEFAULT_HEIGHT,
        }
    }

    pub fn line(mut self, label: impl Into<String>, values: Vec<Option<f64>>, color: &'static str) -> Self {
        self.lines.push(LineSeries {
            label: label.into(),
            values,
            color,
        });
        self
    }

    /// Dashed horizontal reference line at `level`.
    pub fn guide(mut self, level: f64, color: &'static str) -> Self {
        self.guides.push(Guide { level, color });
        self
    }

    pub fn bars(mut self, values: Vec<Option<f64>>, color: &'static str) -> Self {
        self.bars = Some((values, color));
        self
    }

    pub fn with_legend(mut self) -> Self {
        self.legend = true;
        self
    }

    /// Value range covering every defined point and guide level.
    fn value_range(&self) -> Option<(f64, f64)> {
        let line_values = self.lines.iter().flat_map(|l| l.values.iter().flatten().copied());
        let bar_values = self.bars.iter().flat_map(|(v, _)| v.iter().flatten().copied());
        let data: Vec<f64> = line_values.chain(bar_values).filter(|v| v.is_finite()).collect();
        if data.is_empty() {
            return None;
        }

        let mut lo = data.iter().copied().fold(f64::INFINITY, f64::min);
        let mut hi = data.iter().copied().fold(f64::NEG_INFINITY, f64::max);
        for g in &self.guides {
            lo = lo.min(g.level);
            hi = hi.max(g.level);
        }
        if self.bars.is_some() {
            lo = lo.min(0.0);
        }
        Some((lo, hi))
    }

    /// Draw the chart onto a fresh canvas and return the SVG document.
    pub fn render(self) -> String {
        let Some((lo, hi)) = self.value_range() else {
            let mut canvas = Canvas::new(self.width, self.height, self.dates.len(), 0.0, 1.0);
            canvas.title(&self.title);
            canvas.axes(&self.dates);
            canvas.note("no data available");
            return canvas.finish();
        };

        let mut canvas = Canvas::new(self.width, self.height, self.dates.len(), lo, hi);
        canvas.title(&self.title);
        canvas.axes(&self.dates);

        if let Some((values, color)) = &self.bars {
            canvas.bars(values, color);
        }
        for guide in &self.guides {
            canvas.hline(guide.level, Stroke::dashed(guide.color, 0.5));
        }
        for series in &self.lines {
            canvas.line(&series.values, Stroke::solid(series.color));
        }
        if self.legend {
            let entries: Vec<(&str, &str)> = self
                .lines
                .iter()
                .map(|l| (l.label.as_str(), l.color))
                .collect();
            canvas.legend(&entries);
        }

        canvas.finish()
    }
}

/// The four dashboard charts for one analysis, as inline SVG documents.
#[derive(Debug, Clone, Serialize)]
pub struct DashboardCharts {
    pub close_price: String,
    pub rsi: String,
    pub volatility: String,
    pub volume: String,
}

impl DashboardCharts {
    pub fn from_report(report: &AnalysisReport) -> Self {
        let dates = report.dates();
        let ind = &report.indicators;

        let close_price = Chart::new("Closing Price and Moving Average", dates.clone())
            .line("Close Price", report.closes(), "#1f77b4")
            .line("20-Day Moving Average", ind.moving_average.values(), "#ff7f0e")
            .with_legend()
            .render();

        let rsi = Chart::new("Relative Strength Index", dates.clone())
            .guide(OVERBOUGHT_LEVEL, "red")
            .guide(OVERSOLD_LEVEL, "green")
            .line("RSI", ind.rsi.values(), "#1f77b4")
            .render();

        let volatility = Chart::new("Volatility (20-day rolling std dev)", dates.clone())
            .line("Volatility", ind.volatility.values(), "#1f77b4")
            .render();

        let volume = Chart::new("Trading Volume", dates)
            .bars(report.volumes(), "gray")
            .render();

        Self {
            close_price,
            rsi,
            volatility,
            volume,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn days(n: usize) -> Vec<NaiveDate> {
        let start = NaiveDate::from_ymd_opt(2024, 1, 1).unwrap();
        (0..n).map(|i| start + chrono::Duration::days(i as i64)).collect()
    }

    #[test]
    fn escapes_markup() {
        assert_eq!(escape_text("<a href=\"x\">&'"), "&lt;a href=&quot;x&quot;&gt;&amp;&#39;");
    }

    #[test]
    fn leading_gap_is_not_drawn_as_zero() {
        let svg = Chart::new("t", days(4))
            .line("ma", vec![None, None, Some(10.0), Some(12.0)], "blue")
            .render();
        assert_eq!(svg.matches("<polyline").count(), 1);
        // Only the defined tail produces points.
        let points = svg.split("points=\"").nth(1).unwrap().split('"').next().unwrap();
        assert_eq!(points.split(' ').count(), 2);
    }

    #[test]
    fn empty_chart_renders_note() {
        let svg = Chart::new("Relative Strength Index", days(3))
            .line("RSI", vec![None, None, None], "blue")
            .render();
        assert!(svg.contains("no data available"));
        assert!(!svg.contains("<polyline"));
    }

    #[test]
    fn guides_widen_range_and_render_dashed() {
        let svg = Chart::new("RSI", days(3))
            .guide(70.0, "red")
            .guide(30.0, "green")
            .line("RSI", vec![None, Some(50.0), Some(55.0)], "blue")
            .render();
        assert_eq!(svg.matches("stroke-dasharray").count(), 2);
        assert!(svg.contains("stroke=\"red\""));
    }

    #[test]
    fn volume_bars_skip_missing() {
        let svg = Chart::new("Trading Volume", days(3))
            .bars(vec![Some(100.0), None, Some(300.0)], "gray")
            .render();
        assert_eq!(svg.matches("fill=\"gray\"").count(), 2);
    }

    #[test]
    fn titles_are_escaped() {
        let svg = Chart::new("A&B <chart>", days(1)).line("x", vec![Some(1.0)], "blue").render();
        assert!(svg.contains("A&amp;B &lt;chart&gt;"));
    }
}
