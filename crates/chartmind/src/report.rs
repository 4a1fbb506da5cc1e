//! Report formatting for terminal and machine consumers

use crate::session::{FetchOutcome, SessionReport};
use comfy_table::{ContentArrangement, Table, presets::UTF8_FULL};
use serde_json::{Value, json};

pub trait Formatter: Send + Sync {
    fn format_fetch(&self, outcome: &FetchOutcome) -> String;
    fn format_report(&self, report: &SessionReport) -> String;
    fn format_error(&self, error: &str) -> String;
}

/// Summary table with one row per ticker
pub fn summary_table(report: &SessionReport) -> Table {
    let mut table = Table::new();
    table
        .load_preset(UTF8_FULL)
        .set_content_arrangement(ContentArrangement::Dynamic)
        .set_header(vec!["Stock", "Recommendation"]);
    for (ticker, action) in report.summary() {
        table.add_row(vec![ticker, action]);
    }
    table
}

/// Plain text for an interactive terminal
pub struct TerminalFormatter;

impl Formatter for TerminalFormatter {
    fn format_fetch(&self, outcome: &FetchOutcome) -> String {
        let mut lines: Vec<String> = outcome.warnings.iter().map(|w| format!("⚠ {w}")).collect();
        lines.push(outcome.success_message());
        lines.join("\n")
    }

    fn format_report(&self, report: &SessionReport) -> String {
        let mut output = format!(
            "Session #{} | {} | Indicators: {}\n",
            report.generation, report.range, report.indicators
        );

        for warning in &report.fetch_warnings {
            output.push_str(&format!("⚠ {warning}\n"));
        }

        for ticker in &report.reports {
            output.push_str(&format!("\n## Analysis for {}\n\n", ticker.ticker));
            for warning in &ticker.warnings {
                output.push_str(&format!("⚠ {warning}\n"));
            }
            output.push_str(&format!("Recommendation: {}\n\n", ticker.result.action));
            output.push_str("Detailed Justification:\n");
            output.push_str(&ticker.result.justification);
            output.push('\n');
        }

        output.push_str("\n## Overall Structured Recommendations Summary\n\n");
        output.push_str(&summary_table(report).to_string());
        output.push('\n');
        output
    }

    fn format_error(&self, error: &str) -> String {
        format!("❌ Error: {error}")
    }
}

/// Pretty-printed JSON, chart bytes left out
pub struct JsonFormatter;

impl JsonFormatter {
    pub fn report_value(report: &SessionReport) -> Value {
        let tickers: Vec<Value> = report
            .reports
            .iter()
            .map(|t| {
                json!({
                    "ticker": t.ticker,
                    "action": t.result.action,
                    "justification": t.result.justification,
                    "bars": t.figure.candles.len(),
                    "overlays": t.figure.overlays.iter().map(|o| o.label.as_str()).collect::<Vec<_>>(),
                    "chart_bytes": t.chart.bytes.len(),
                    "warnings": t.warnings,
                })
            })
            .collect();

        json!({
            "generation": report.generation,
            "start": report.range.start().to_string(),
            "end": report.range.end().to_string(),
            "indicators": report.indicators,
            "warnings": report.fetch_warnings,
            "results": tickers,
        })
    }
}

impl Formatter for JsonFormatter {
    fn format_fetch(&self, outcome: &FetchOutcome) -> String {
        json!({
            "generation": outcome.generation,
            "loaded": outcome.loaded,
            "warnings": outcome.warnings,
        })
        .to_string()
    }

    fn format_report(&self, report: &SessionReport) -> String {
        serde_json::to_string_pretty(&Self::report_value(report))
            .unwrap_or_else(|e| self.format_error(&e.to_string()))
    }

    fn format_error(&self, error: &str) -> String {
        json!({ "error": error }).to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::chart::{ChartRenderer, RenderedChart};
    use crate::indicators::{Indicator, IndicatorSelection};
    use crate::recommendation::AnalysisResult;
    use crate::series::{DateRange, test_support::series_from_closes};
    use crate::session::TickerReport;
    use chrono::NaiveDate;

    fn report() -> SessionReport {
        let series = series_from_closes(&[10.0, 11.0, 12.0], 100);
        let ticker = |symbol: &str, action: &str| TickerReport {
            ticker: symbol.to_string(),
            figure: ChartRenderer::default().figure(symbol, &series, &[]),
            chart: RenderedChart::png(vec![0; 16]),
            result: AnalysisResult::new(symbol, action, format!("{symbol} note")),
            warnings: Vec::new(),
        };

        SessionReport {
            generation: 3,
            range: DateRange::new(
                NaiveDate::from_ymd_opt(2024, 1, 1).unwrap(),
                NaiveDate::from_ymd_opt(2025, 1, 1).unwrap(),
            )
            .unwrap(),
            indicators: IndicatorSelection::new([Indicator::Sma20, Indicator::Vwap]),
            fetch_warnings: vec!["No data found for MSFT.".to_string()],
            reports: vec![ticker("AAPL", "Buy"), ticker("GOOG", "Hold")],
        }
    }

    #[test]
    fn test_summary_table_rows_in_order() {
        let rendered = summary_table(&report()).to_string();
        let aapl = rendered.find("AAPL").unwrap();
        let goog = rendered.find("GOOG").unwrap();
        assert!(rendered.contains("Recommendation"));
        assert!(aapl < goog);
    }

    #[test]
    fn test_terminal_report() {
        let text = TerminalFormatter.format_report(&report());
        assert!(text.starts_with("Session #3 | 2024-01-01 to 2025-01-01 | Indicators: 20-Day SMA, VWAP"));
        assert!(text.contains("⚠ No data found for MSFT."));
        assert!(text.contains("## Analysis for AAPL"));
        assert!(text.contains("Detailed Justification:\nGOOG note"));
        assert!(text.find("Analysis for AAPL").unwrap() < text.find("Analysis for GOOG").unwrap());
    }

    #[test]
    fn test_terminal_fetch() {
        let outcome = FetchOutcome {
            generation: 1,
            loaded: vec!["AAPL".to_string()],
            warnings: vec!["No data found for ZZZZ.".to_string()],
        };
        assert_eq!(
            TerminalFormatter.format_fetch(&outcome),
            "⚠ No data found for ZZZZ.\nStock data loaded successfully for: AAPL"
        );
    }

    #[test]
    fn test_json_report() {
        let value = JsonFormatter::report_value(&report());
        assert_eq!(value["generation"], 3);
        assert_eq!(value["indicators"], json!(["sma20", "vwap"]));
        assert_eq!(value["results"][1]["action"], "Hold");
        assert_eq!(value["results"][0]["bars"], 3);
        assert_eq!(value["results"][0]["chart_bytes"], 16);

        let parsed: Value = serde_json::from_str(&JsonFormatter.format_report(&report())).unwrap();
        assert_eq!(parsed, value);
    }

    #[test]
    fn test_format_error() {
        assert_eq!(TerminalFormatter.format_error("boom"), "❌ Error: boom");
        assert_eq!(JsonFormatter.format_error("boom"), r#"{"error":"boom"}"#);
    }
}
