//! Text summary builder for CLI output.
//!
//! Formats the correction report as human-readable lines for text mode.

use crate::model::{FieldStats, Report, TimingStats};

/// Pre-formatted lines for text output.
pub(crate) struct TextSummary {
    pub lines: Vec<String>,
}

fn stats_line(label: &str, before: Option<&FieldStats>, after: Option<&FieldStats>) -> Option<String> {
    let (b, a) = (before?, after?);
    Some(format!(
        "{label}: avg {:.2} -> {:.2}  med {:.2} -> {:.2}  p25 {:.2} -> {:.2}  p75 {:.2} -> {:.2}  max {:.2} -> {:.2}",
        b.mean, a.mean, b.median, a.median, b.p25, a.p25, b.p75, a.p75, b.max, a.max
    ))
}

fn push_stats(lines: &mut Vec<String>, before: &TimingStats, after: &TimingStats) {
    let rows = [
        ("clientTime", before.client_time.as_ref(), after.client_time.as_ref()),
        ("serverTime", before.server_time.as_ref(), after.server_time.as_ref()),
        ("totalTime ", before.total_time.as_ref(), after.total_time.as_ref()),
    ];
    for (label, b, a) in rows {
        if let Some(line) = stats_line(label, b, a) {
            lines.push(line);
        }
    }
}

/// Build a text summary from a finished correction run.
pub(crate) fn build_text_summary(report: &Report) -> TextSummary {
    let mut lines = Vec::new();
    let summary = &report.summary;

    lines.push(format!("Input:  {}", report.input.display()));
    match report.output.as_deref() {
        Some(p) => lines.push(format!("Output: {}", p.display())),
        None => lines.push("Output: (dry run, nothing written)".to_string()),
    }
    lines.push(format!(
        "Thresholds: clientTime {} / serverTime {}",
        report.config.client_threshold, report.config.server_threshold
    ));
    lines.push(format!("Rows: {}", summary.rows));
    lines.push(format!("clientTime rows modified: {}", summary.client_corrections));
    lines.push(format!("serverTime rows modified: {}", summary.server_corrections));
    lines.push(format!("Total rows modified: {}", summary.rows_modified));
    if summary.has_unresolved() {
        lines.push(format!(
            "Unresolved outliers (no valid neighbour): clientTime {} / serverTime {}",
            summary.client_unresolved, summary.server_unresolved
        ));
    }

    push_stats(&mut lines, &report.before, &report.after);

    TextSummary { lines }
}
