use std::fs;
use std::path::Path;

use app_spider::extract::field_spec::Record;
use app_spider::output::json::{
    JsonFileSink, RecordSink, output_filename, read_records, write_records,
};
use app_spider::report::console::{format_console_report, format_field_summary};
use app_spider::report::stats::{RunStats, distinct_values, summarize_fields, top_values};
use app_spider::spider::session::{FailurePhase, RunFailure, RunOutcome};
use chrono::{TimeZone, Utc};
use pretty_assertions::assert_eq;
use tempfile::tempdir;

fn job(title: &str, company: &str, salary: &str) -> Record {
    Record::new()
        .with("职位名称", title)
        .with("公司名称", company)
        .with("薪资", salary)
}

fn jobs() -> Vec<Record> {
    vec![
        job("后端工程师", "字节跳动", "20-30K"),
        job("前端工程师", "字节跳动", "18-25K"),
        job("数据分析师", "美团", ""),
    ]
}

// =========================================================================
// File naming
// =========================================================================

#[test]
fn output_filename_uses_prefix_and_timestamp() {
    let at = Utc.with_ymd_and_hms(2025, 1, 2, 3, 4, 5).unwrap();
    assert_eq!(output_filename("data", &at), "data_20250102_030405.json");
    assert_eq!(output_filename("jobs", &at), "jobs_20250102_030405.json");
}

#[test]
fn fixed_file_name_overrides_timestamp() {
    let sink = JsonFileSink::new("/tmp/out", "data").with_file_name("latest.json");
    let path = sink.target_path(&chrono::Local::now());
    assert_eq!(path, Path::new("/tmp/out/latest.json"));
}

#[test]
fn timestamped_name_lands_in_output_dir() {
    let sink = JsonFileSink::new("/tmp/out", "jobs");
    let path = sink.target_path(&chrono::Local::now());
    let name = path.file_name().unwrap().to_string_lossy().to_string();

    assert_eq!(path.parent(), Some(Path::new("/tmp/out")));
    assert!(name.starts_with("jobs_"));
    assert!(name.ends_with(".json"));
    assert_eq!(name.len(), "jobs_20250102_030405.json".len());
}

// =========================================================================
// JSON persistence
// =========================================================================

#[test]
fn records_survive_a_write_and_read() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("jobs.json");

    write_records(&path, &jobs()).unwrap();
    let back = read_records(&path).unwrap();

    assert_eq!(back, jobs());
}

#[test]
fn non_ascii_text_is_written_unescaped() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("jobs.json");

    write_records(&path, &jobs()).unwrap();
    let raw = fs::read_to_string(&path).unwrap();

    assert!(raw.contains("\"职位名称\": \"后端工程师\""));
    assert!(!raw.contains("\\u"), "Text must not be escaped");
    assert!(raw.ends_with("]\n"));
}

#[test]
fn field_order_follows_the_field_spec() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("jobs.json");

    write_records(&path, &[job("后端工程师", "字节跳动", "20-30K")]).unwrap();
    let raw = fs::read_to_string(&path).unwrap();

    let title = raw.find("职位名称").unwrap();
    let company = raw.find("公司名称").unwrap();
    let salary = raw.find("薪资").unwrap();
    assert!(title < company && company < salary);
}

#[test]
fn sink_writes_file_and_reports_path() {
    let dir = tempdir().unwrap();
    let mut sink = JsonFileSink::new(dir.path(), "jobs").with_file_name("run.json");

    let saved = sink.persist(&jobs()).unwrap();

    let path = dir.path().join("run.json");
    assert_eq!(saved.as_deref(), Some(path.as_path()));
    assert_eq!(read_records(&path).unwrap().len(), 3);
}

#[test]
fn sink_skips_empty_record_list() {
    let dir = tempdir().unwrap();
    let mut sink = JsonFileSink::new(dir.path(), "jobs");

    let saved = sink.persist(&[]).unwrap();

    assert_eq!(saved, None);
    assert_eq!(fs::read_dir(dir.path()).unwrap().count(), 0);
}

#[test]
fn sink_reports_unwritable_directory() {
    let dir = tempdir().unwrap();
    let mut sink = JsonFileSink::new(dir.path().join("missing"), "jobs");

    let err = sink.persist(&jobs()).unwrap_err();

    assert!(err.to_string().contains("missing"));
}

#[test]
fn reading_malformed_file_fails() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("broken.json");
    fs::write(&path, "[{\"a\": ").unwrap();

    assert!(read_records(&path).is_err());
}

// =========================================================================
// Statistics
// =========================================================================

#[test]
fn distinct_values_ignores_empty() {
    assert_eq!(distinct_values(&jobs(), "公司名称"), 2);
    assert_eq!(distinct_values(&jobs(), "薪资"), 2);
    assert_eq!(distinct_values(&jobs(), "不存在"), 0);
}

#[test]
fn top_values_ranks_by_count_then_value() {
    let records = vec![
        Record::new().with("shop", "b"),
        Record::new().with("shop", "a"),
        Record::new().with("shop", "c"),
        Record::new().with("shop", "c"),
        Record::new().with("shop", ""),
    ];

    assert_eq!(
        top_values(&records, "shop", 2),
        vec![("c".to_string(), 2), ("a".to_string(), 1)]
    );
}

#[test]
fn summarize_fields_covers_every_field_in_order() {
    let summaries = summarize_fields(&jobs(), 1);

    let fields: Vec<&str> = summaries.iter().map(|s| s.field.as_str()).collect();
    assert_eq!(fields, vec!["职位名称", "公司名称", "薪资"]);

    let salary = &summaries[2];
    assert_eq!(salary.filled, 2);
    assert_eq!(salary.distinct, 2);

    let company = &summaries[1];
    assert_eq!(company.top, vec![("字节跳动".to_string(), 2)]);
}

#[test]
fn stats_compute_counts_key_values() {
    let keys = vec!["职位名称".to_string(), "公司名称".to_string()];
    let stats = RunStats::compute(RunOutcome::Stopped, "职位名称", 4, &jobs(), 3, &keys, 1500);

    assert_eq!(stats.total_records, 3);
    assert_eq!(stats.rounds, 4);
    assert_eq!(
        stats.distinct_key_values,
        vec![("职位名称".to_string(), 3), ("公司名称".to_string(), 2)]
    );
}

// =========================================================================
// Console report
// =========================================================================

fn stats(outcome: RunOutcome, records: &[Record]) -> RunStats {
    let keys = vec!["职位名称".to_string()];
    RunStats::compute(outcome, "职位名称", 3, records, records.len(), &keys, 12_340)
}

#[test]
fn console_report_shows_counts_and_saved_path() {
    let out = format_console_report(
        "招聘",
        &stats(RunOutcome::Completed, &jobs()),
        Some(Path::new("./data_20250102_030405.json")),
        None,
    );

    assert!(out.starts_with("=== Run Statistics: 招聘 ==="));
    assert!(out.contains("completed (target reached)"));
    assert!(out.contains("Total 职位名称"));
    assert!(out.contains("Distinct 职位名称"));
    assert!(out.contains("12.3s"));
    assert!(out.contains("Saved 3 records to ./data_20250102_030405.json"));
}

#[test]
fn console_report_without_records_says_so() {
    let out = format_console_report("招聘", &stats(RunOutcome::Stopped, &[]), None, None);

    assert!(out.contains("No data to save"));
    assert!(!out.contains("Distinct"), "Zero distinct counts are hidden");
}

#[test]
fn console_report_shows_failure_and_save_error() {
    let outcome = RunOutcome::Failed(RunFailure {
        phase: FailurePhase::Extract,
        message: "bridge I/O error: broken pipe".into(),
    });
    let out = format_console_report(
        "招聘",
        &stats(outcome, &jobs()),
        None,
        Some("failed to write 'out.json': permission denied"),
    );

    assert!(out.contains("failed during Extract: bridge I/O error: broken pipe"));
    assert!(out.contains("Save failed: failed to write 'out.json'"));
}

#[test]
fn field_summary_lists_top_values() {
    let summaries = summarize_fields(&jobs(), 5);
    let out = format_field_summary("jobs.json", 3, &summaries);

    assert!(out.starts_with("=== jobs.json: 3 records ==="));
    assert!(out.contains("公司名称 (3 filled, 2 distinct)"));
    assert!(out.contains("      2  字节跳动"));
}
