// =============================================================================
// HTML pages — symbol picker, analysis dashboard, error page
// =============================================================================
//
// Pages are assembled from strings; every interpolated value goes through
// `escape_text`.  Charts arrive as complete SVG documents and are inlined.
// =============================================================================

use crate::analysis::AnalysisReport;
use crate::charts::{escape_text, DashboardCharts};

const STYLE: &str = "body{font-family:sans-serif;margin:2rem auto;max-width:1040px;color:#222}\
h1{font-size:1.6rem}figure{margin:1.5rem 0}table{border-collapse:collapse}\
td,th{padding:.25rem .75rem;border-bottom:1px solid #ddd;text-align:left}\
.error{color:#b00020}";

fn layout(title: &str, body: &str) -> String {
    format!(
        "<!DOCTYPE html>\n<html lang=\"en\">\n<head>\n<meta charset=\"utf-8\">\n<title>{}</title>\n<style>{}</style>\n</head>\n<body>\n{}\n</body>\n</html>\n",
        escape_text(title),
        STYLE,
        body
    )
}

/// Symbol picker posting to `/analyze`.
pub fn index_page(symbols: &[String]) -> String {
    let options: String = symbols
        .iter()
        .map(|s| {
            let s = escape_text(s);
            format!("<option value=\"{s}\">{s}</option>")
        })
        .collect();

    let body = format!(
        "<h1>Stock Analysis</h1>\n\
         <form method=\"post\" action=\"/analyze\">\n\
         <label for=\"symbol\">Select a stock symbol:</label>\n\
         <select name=\"symbol\" id=\"symbol\">{options}</select>\n\
         <button type=\"submit\">Analyze</button>\n\
         </form>"
    );
    layout("Stock Analysis", &body)
}

fn fmt_opt(value: Option<f64>, decimals: usize) -> String {
    value.map_or_else(|| "n/a".to_string(), |v| format!("{v:.decimals$}"))
}

/// Dashboard for one symbol: summary table plus the four charts.
pub fn analysis_page(report: &AnalysisReport, charts: &DashboardCharts) -> String {
    let s = &report.summary;
    let symbol = escape_text(&report.symbol);
    let zone = s.rsi_zone.map_or_else(|| "n/a".to_string(), |z| z.to_string());
    let last_date = s.last_date.map_or_else(|| "n/a".to_string(), |d| d.to_string());

    let body = format!(
        "<h1>Analysis for {symbol}</h1>\n\
         <p><a href=\"/\">Back</a></p>\n\
         <table>\n\
         <tr><th>Last session</th><td>{last_date}</td></tr>\n\
         <tr><th>Close</th><td>{close}</td></tr>\n\
         <tr><th>20-day MA</th><td>{ma}</td></tr>\n\
         <tr><th>RSI (14)</th><td>{rsi} ({zone})</td></tr>\n\
         <tr><th>Volatility (20d, annualised)</th><td>{vol}</td></tr>\n\
         <tr><th>Bars</th><td>{bars}</td></tr>\n\
         </table>\n\
         <figure>{close_chart}</figure>\n\
         <figure>{rsi_chart}</figure>\n\
         <figure>{vol_chart}</figure>\n\
         <figure>{volume_chart}</figure>",
        close = fmt_opt(s.last_close, 2),
        ma = fmt_opt(s.moving_average, 2),
        rsi = fmt_opt(s.rsi, 1),
        vol = fmt_opt(s.volatility, 4),
        bars = report.bar_count,
        close_chart = charts.close_price,
        rsi_chart = charts.rsi,
        vol_chart = charts.volatility,
        volume_chart = charts.volume,
    );
    layout(&format!("Analysis for {}", report.symbol), &body)
}

/// Error page shown when an analysis cannot be produced.
pub fn error_page(symbol: &str, message: &str) -> String {
    let body = format!(
        "<h1>Analysis for {}</h1>\n<p class=\"error\">{}</p>\n<p><a href=\"/\">Back</a></p>",
        escape_text(symbol),
        escape_text(message)
    );
    layout("Analysis failed", &body)
}
