// =============================================================================
// Canvas — one SVG drawing surface owned by exactly one chart
// =============================================================================
//
// A canvas maps series positions onto the x axis and values onto the y axis
// of a fixed-size plot area.  It is created by `Chart::render`, drawn on, and
// consumed by `finish`; nothing about it outlives the render call.
// =============================================================================

use chrono::NaiveDate;

use super::escape_text;

pub const DEFAULT_WIDTH: f64 = 1000.0;
pub const DEFAULT_HEIGHT: f64 = 500.0;

const MARGIN_LEFT: f64 = 70.0;
const MARGIN_RIGHT: f64 = 20.0;
const MARGIN_TOP: f64 = 40.0;
const MARGIN_BOTTOM: f64 = 40.0;

const Y_TICKS: usize = 5;
const X_LABELS: usize = 6;

/// Stroke styling for lines and guides.
#[derive(Debug, Clone, Copy)]
pub struct Stroke<'a> {
    pub color: &'a str,
    pub width: f64,
    pub dashed: bool,
    pub opacity: f64,
}

impl<'a> Stroke<'a> {
    pub fn solid(color: &'a str) -> Self {
        Self {
            color,
            width: 1.5,
            dashed: false,
            opacity: 1.0,
        }
    }

    pub fn dashed(color: &'a str, opacity: f64) -> Self {
        Self {
            color,
            width: 1.0,
            dashed: true,
            opacity,
        }
    }

    fn attrs(&self) -> String {
        let dash = if self.dashed { " stroke-dasharray=\"6 4\"" } else { "" };
        format!(
            "stroke=\"{}\" stroke-width=\"{}\" stroke-opacity=\"{}\"{}",
            escape_text(self.color),
            self.width,
            self.opacity,
            dash
        )
    }
}

/// Fixed-size drawing surface with a linear value scale.
#[derive(Debug)]
pub struct Canvas {
    width: f64,
    height: f64,
    positions: usize,
    y_min: f64,
    y_max: f64,
    buf: String,
}

impl Canvas {
    /// Open a canvas for `positions` x slots spanning `[y_min, y_max]`.
    ///
    /// A degenerate value range is widened so the scale stays invertible.
    pub fn new(width: f64, height: f64, positions: usize, y_min: f64, y_max: f64) -> Self {
        let (y_min, y_max) = if (y_max - y_min).abs() < f64::EPSILON {
            let pad = if y_min.abs() > 1.0 { y_min.abs() * 0.05 } else { 1.0 };
            (y_min - pad, y_max + pad)
        } else {
            (y_min, y_max)
        };

        let mut buf = String::with_capacity(16 * 1024);
        buf.push_str(&format!(
            "<svg xmlns=\"http://www.w3.org/2000/svg\" viewBox=\"0 0 {width} {height}\" width=\"{width}\" height=\"{height}\" font-family=\"sans-serif\" font-size=\"12\">"
        ));
        buf.push_str(&format!(
            "<rect x=\"0\" y=\"0\" width=\"{width}\" height=\"{height}\" fill=\"white\"/>"
        ));

        Self {
            width,
            height,
            positions,
            y_min,
            y_max,
            buf,
        }
    }

    fn plot_width(&self) -> f64 {
        self.width - MARGIN_LEFT - MARGIN_RIGHT
    }

    fn plot_height(&self) -> f64 {
        self.height - MARGIN_TOP - MARGIN_BOTTOM
    }

    /// Horizontal pixel for series position `i` (slot centre).
    pub fn x(&self, i: usize) -> f64 {
        let slots = self.positions.max(1) as f64;
        MARGIN_LEFT + (i as f64 + 0.5) * self.plot_width() / slots
    }

    /// Vertical pixel for `value`.
    pub fn y(&self, value: f64) -> f64 {
        let t = (value - self.y_min) / (self.y_max - self.y_min);
        MARGIN_TOP + (1.0 - t) * self.plot_height()
    }

    pub fn title(&mut self, text: &str) {
        self.buf.push_str(&format!(
            "<text x=\"{}\" y=\"{}\" text-anchor=\"middle\" font-size=\"16\">{}</text>",
            self.width / 2.0,
            MARGIN_TOP / 2.0 + 5.0,
            escape_text(text)
        ));
    }

    /// Frame, y-axis ticks and a handful of date labels along the x axis.
    pub fn axes(&mut self, dates: &[NaiveDate]) {
        let left = MARGIN_LEFT;
        let top = MARGIN_TOP;
        let right = self.width - MARGIN_RIGHT;
        let bottom = self.height - MARGIN_BOTTOM;

        self.buf.push_str(&format!(
            "<rect x=\"{left}\" y=\"{top}\" width=\"{}\" height=\"{}\" fill=\"none\" stroke=\"#444\"/>",
            right - left,
            bottom - top
        ));

        for k in 0..=Y_TICKS {
            let value = self.y_min + (self.y_max - self.y_min) * k as f64 / Y_TICKS as f64;
            let y = self.y(value);
            self.buf.push_str(&format!(
                "<line x1=\"{left}\" y1=\"{y:.2}\" x2=\"{right}\" y2=\"{y:.2}\" stroke=\"#ddd\"/>\
                 <text x=\"{}\" y=\"{:.2}\" text-anchor=\"end\">{}</text>",
                left - 6.0,
                y + 4.0,
                format_tick(value)
            ));
        }

        if dates.is_empty() {
            return;
        }
        let step = (dates.len() / X_LABELS).max(1);
        for i in (0..dates.len()).step_by(step) {
            self.buf.push_str(&format!(
                "<text x=\"{:.2}\" y=\"{}\" text-anchor=\"middle\">{}</text>",
                self.x(i),
                bottom + 18.0,
                dates[i].format("%Y-%m-%d")
            ));
        }
    }

    /// Draw `values` as a polyline.  Each run of consecutive defined values
    /// becomes its own segment, so undefined positions leave a visible gap.
    pub fn line(&mut self, values: &[Option<f64>], stroke: Stroke<'_>) {
        let attrs = stroke.attrs();
        for run in defined_runs(values) {
            let points: Vec<String> = run
                .iter()
                .map(|&(i, v)| format!("{:.2},{:.2}", self.x(i), self.y(v)))
                .collect();
            if points.len() == 1 {
                let (i, v) = run[0];
                self.buf.push_str(&format!(
                    "<circle cx=\"{:.2}\" cy=\"{:.2}\" r=\"1.5\" fill=\"{}\"/>",
                    self.x(i),
                    self.y(v),
                    escape_text(stroke.color)
                ));
            } else {
                self.buf.push_str(&format!(
                    "<polyline fill=\"none\" {attrs} points=\"{}\"/>",
                    points.join(" ")
                ));
            }
        }
    }

    /// Horizontal guide line across the plot area at `level`.
    pub fn hline(&mut self, level: f64, stroke: Stroke<'_>) {
        let y = self.y(level);
        self.buf.push_str(&format!(
            "<line x1=\"{}\" y1=\"{y:.2}\" x2=\"{}\" y2=\"{y:.2}\" {}/>",
            MARGIN_LEFT,
            self.width - MARGIN_RIGHT,
            stroke.attrs()
        ));
    }

    /// Vertical bars from the value-axis floor; undefined positions are skipped.
    pub fn bars(&mut self, values: &[Option<f64>], color: &str) {
        let slot = self.plot_width() / self.positions.max(1) as f64;
        let bar_width = (slot * 0.8).max(0.5);
        let floor = self.y(self.y_min.max(0.0));
        for (i, v) in values.iter().enumerate() {
            let Some(v) = v else { continue };
            let top = self.y(*v);
            self.buf.push_str(&format!(
                "<rect x=\"{:.2}\" y=\"{:.2}\" width=\"{:.2}\" height=\"{:.2}\" fill=\"{}\"/>",
                self.x(i) - bar_width / 2.0,
                top.min(floor),
                bar_width,
                (floor - top).abs(),
                escape_text(color)
            ));
        }
    }

    /// Legend box in the upper-left corner of the plot area.
    pub fn legend(&mut self, entries: &[(&str, &str)]) {
        for (k, (label, color)) in entries.iter().enumerate() {
            let y = MARGIN_TOP + 16.0 + k as f64 * 18.0;
            self.buf.push_str(&format!(
                "<line x1=\"{}\" y1=\"{y}\" x2=\"{}\" y2=\"{y}\" stroke=\"{}\" stroke-width=\"2\"/>\
                 <text x=\"{}\" y=\"{}\">{}</text>",
                MARGIN_LEFT + 10.0,
                MARGIN_LEFT + 34.0,
                escape_text(color),
                MARGIN_LEFT + 40.0,
                y + 4.0,
                escape_text(label)
            ));
        }
    }

    /// Centered note, used when a chart has nothing to draw.
    pub fn note(&mut self, text: &str) {
        self.buf.push_str(&format!(
            "<text x=\"{}\" y=\"{}\" text-anchor=\"middle\" fill=\"#888\">{}</text>",
            self.width / 2.0,
            self.height / 2.0,
            escape_text(text)
        ));
    }

    /// Close the document and hand back the SVG markup.
    pub fn finish(mut self) -> String {
        self.buf.push_str("</svg>");
        self.buf
    }
}

/// Split `values` into maximal runs of defined `(position, value)` pairs.
pub fn defined_runs(values: &[Option<f64>]) -> Vec<Vec<(usize, f64)>> {
    let mut runs = Vec::new();
    let mut current = Vec::new();
    for (i, v) in values.iter().enumerate() {
        match v {
            Some(v) if v.is_finite() => current.push((i, *v)),
            _ => {
                if !current.is_empty() {
                    runs.push(std::mem::take(&mut current));
                }
            }
        }
    }
    if !current.is_empty() {
        runs.push(current);
    }
    runs
}

fn format_tick(value: f64) -> String {
    let abs = value.abs();
    if abs >= 1e9 {
        format!("{:.1}B", value / 1e9)
    } else if abs >= 1e6 {
        format!("{:.1}M", value / 1e6)
    } else if abs >= 1e4 {
        format!("{:.0}K", value / 1e3)
    } else if abs >= 10.0 {
        format!("{value:.0}")
    } else {
        format!("{value:.2}")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn runs_split_at_gaps() {
        let runs = defined_runs(&[None, Some(1.0), Some(2.0), None, Some(3.0), Some(f64::NAN), Some(4.0)]);
        assert_eq!(runs, vec![vec![(1, 1.0), (2, 2.0)], vec![(4, 3.0)], vec![(6, 4.0)]]);
        assert!(defined_runs(&[None, None]).is_empty());
    }

    #[test]
    fn scale_maps_range_onto_plot_area() {
        let c = Canvas::new(200.0, 180.0, 10, 0.0, 100.0);
        assert!((c.y(100.0) - MARGIN_TOP).abs() < 1e-9);
        assert!((c.y(0.0) - (180.0 - MARGIN_BOTTOM)).abs() < 1e-9);
        assert!(c.x(0) > MARGIN_LEFT);
        assert!(c.x(9) < 200.0 - MARGIN_RIGHT);
    }

    #[test]
    fn flat_range_is_widened() {
        let c = Canvas::new(200.0, 180.0, 3, 0.0, 0.0);
        assert!(c.y(0.0).is_finite());
        assert!((c.y(0.0) - (MARGIN_TOP + (180.0 - MARGIN_TOP - MARGIN_BOTTOM) / 2.0)).abs() < 1e-9);
    }

    #[test]
    fn line_with_gap_emits_two_polylines() {
        let mut c = Canvas::new(200.0, 180.0, 5, 0.0, 10.0);
        c.line(&[Some(1.0), Some(2.0), None, Some(3.0), Some(4.0)], Stroke::solid("blue"));
        let svg = c.finish();
        assert_eq!(svg.matches("<polyline").count(), 2);
        assert!(svg.ends_with("</svg>"));
    }

    #[test]
    fn tick_formatting() {
        assert_eq!(format_tick(2_500_000.0), "2.5M");
        assert_eq!(format_tick(150.0), "150");
        assert_eq!(format_tick(0.25), "0.25");
    }
}
