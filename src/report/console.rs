use std::path::Path;

use crate::report::stats::{FieldSummary, RunStats};
use crate::spider::config::SpiderConfig;

// ============================================================================
// Console reporter: formatted terminal output
// ============================================================================

/// Banner printed before a run starts.
pub fn format_banner(title: &str, package: &str, target: usize) -> String {
    let rule = "=".repeat(title.chars().count().max(24) + 8);
    format!(
        "{rule}\n=== {title} ===\n{rule}\nApp: {package}\nTarget: {target} records\nPress Ctrl-C to stop at any time.\n"
    )
}

/// Format run statistics for terminal output.
///
/// Produces output like:
/// ```text
/// === Run Statistics: Jobs ===
///
/// Outcome                  completed (target reached)
/// Rounds                   7
/// Total job title          104
/// Unique records           104
/// Distinct job title       104
///
/// Elapsed                  41.3s
///
/// ✓ Saved 104 records to ./jobs_20250101_120000.json
/// ```
pub fn format_console_report(
    title: &str,
    stats: &RunStats,
    saved_to: Option<&Path>,
    persist_error: Option<&str>,
) -> String {
    let mut out = String::new();

    out.push_str(&format!("=== Run Statistics: {} ===\n\n", title));

    let mut rows: Vec<(String, String)> = vec![
        ("Outcome".into(), stats.outcome.to_string()),
        ("Rounds".into(), stats.rounds.to_string()),
        (
            format!("Total {}", stats.primary_field),
            stats.total_records.to_string(),
        ),
        ("Unique records".into(), stats.unique_fingerprints.to_string()),
    ];
    for (field, distinct) in &stats.distinct_key_values {
        if *distinct > 0 {
            rows.push((format!("Distinct {}", field), distinct.to_string()));
        }
    }
    rows.push((
        "Elapsed".into(),
        format!("{:.1}s", stats.elapsed_ms as f64 / 1000.0),
    ));

    for (label, value) in rows {
        out.push_str(&format!("{:<24} {}\n", label, value));
    }

    out.push('\n');
    match (saved_to, persist_error) {
        (_, Some(error)) => out.push_str(&format!("\u{2717} Save failed: {}\n", error)),
        (Some(path), None) => out.push_str(&format!(
            "\u{2713} Saved {} records to {}\n",
            stats.total_records,
            path.display()
        )),
        (None, None) => out.push_str("No data to save\n"),
    }

    out
}

/// Describe what a run with `config` would do.
pub fn format_plan(config: &SpiderConfig) -> String {
    let mut out = String::new();
    out.push_str(&format!("=== Plan: {} ===\n\n", config.title));
    out.push_str(&format!("App:              {}\n", config.package));

    let strategy = config.strategy();
    match &config.container {
        Some(container) => out.push_str(&format!(
            "Strategy:         {} (container {})\n",
            strategy.name(),
            container
        )),
        None => out.push_str(&format!("Strategy:         {}\n", strategy.name())),
    }

    out.push_str("Fields:\n");
    for (i, (name, locator)) in config.fields.iter().enumerate() {
        let marker = if i == 0 { " (primary)" } else { "" };
        out.push_str(&format!("  - {}{}: {}\n", name, marker, locator));
    }
    out.push_str(&format!(
        "Dedup keys:       {}\n",
        config.resolved_key_fields().join(", ")
    ));
    out.push_str(&format!("Target:           {}\n", config.target));
    out.push_str(&format!(
        "Settle delay:     {:.1}s\n",
        config.settle_delay.as_secs_f64()
    ));
    out.push_str(&format!("Max empty rounds: {}\n", config.max_empty_rounds));
    out
}

/// Per-field breakdown of a saved output file.
pub fn format_field_summary(source: &str, total: usize, summaries: &[FieldSummary]) -> String {
    let mut out = String::new();
    out.push_str(&format!("=== {}: {} records ===\n", source, total));

    for summary in summaries {
        out.push_str(&format!(
            "\n{} ({} filled, {} distinct)\n",
            summary.field, summary.filled, summary.distinct
        ));
        for (value, count) in &summary.top {
            out.push_str(&format!("  {:>5}  {}\n", count, value));
        }
    }

    out
}
