use super::anomaly::{Anomaly, AnomalyReport};
use itertools::Itertools;

const HEADERS: [&str; 5] = ["KIND", "NODE TYPE", "NODE", "RULE / PATH", "MESSAGE"];

/// Renders an `AnomalyReport` for humans or machines.
pub struct ReportFormatter;

impl ReportFormatter {
    /// Formats the report as an aligned plain-text table followed by per-kind totals.
    pub fn format_table(report: &AnomalyReport) -> String {
        if report.is_empty() {
            return "No anomalies recorded.".to_string();
        }

        let rows: Vec<[String; 5]> = report.iter().map(Self::row).collect();
        let mut widths = HEADERS.map(str::len);
        for row in &rows {
            for (width, cell) in widths.iter_mut().zip(row.iter()) {
                *width = (*width).max(cell.chars().count());
            }
        }

        let render = |cells: [&str; 5]| {
            cells
                .iter()
                .zip(widths.iter())
                .map(|(cell, width)| format!("{:<width$}", cell, width = *width))
                .join("  ")
                .trim_end()
                .to_string()
        };

        let mut lines = vec![render(HEADERS)];
        lines.extend(rows.iter().map(|row| render(row.each_ref().map(String::as_str))));
        lines.push(String::new());
        lines.push(
            report
                .count_by_kind()
                .into_iter()
                .map(|(kind, count)| format!("{}: {}", kind, count))
                .join(", "),
        );
        lines.join("\n")
    }

    /// Formats the report records as a pretty-printed JSON array.
    pub fn format_json(report: &AnomalyReport) -> String {
        let records: Vec<&Anomaly> = report.iter().collect();
        serde_json::to_string_pretty(&records).unwrap_or_else(|_| "[]".to_string())
    }

    fn row(anomaly: &Anomaly) -> [String; 5] {
        let dash = || "-".to_string();
        [
            anomaly.kind.to_string(),
            anomaly.context.node_type.clone().unwrap_or_else(dash),
            anomaly.context.node_id.clone().unwrap_or_else(dash),
            anomaly.context.rule_or_path.clone().unwrap_or_else(dash),
            anomaly.message.clone(),
        ]
    }
}
