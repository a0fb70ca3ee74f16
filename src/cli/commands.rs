use std::path::Path;

use crate::cli::config::{RunOverrides, load_spider_file};
use crate::device::session::BridgeConnector;
use crate::output::json::read_records;
use crate::report::console::{format_banner, format_console_report, format_field_summary, format_plan};
use crate::report::stats::summarize_fields;
use crate::spider::cancel::CancelToken;
use crate::spider::controller::Spider;
use crate::spider::session::RunOutcome;

// ============================================================================
// run subcommand
// ============================================================================

/// Run a spider file against the connected device.
pub fn cmd_run(
    config_path: &str,
    overrides: &RunOverrides,
    cancel: CancelToken,
) -> Result<RunOutcome, Box<dyn std::error::Error>> {
    let mut file = load_spider_file(config_path)?;
    file.apply(overrides);
    let config = file.to_config()?;
    let mut sink = file.sink();

    println!("{}", format_banner(&config.title, &config.package, config.target));

    let mut spider = Spider::new(config)?.with_cancel_token(cancel);
    if let Some(trace) = &file.trace {
        spider = spider.with_trace(trace.clone());
    }

    let mut connector = BridgeConnector::new(file.bridge.clone());
    let report = spider.run(&mut connector, &mut (), &mut sink);

    print!(
        "{}",
        format_console_report(
            &spider.config().title,
            &report.stats,
            report.saved_to.as_deref(),
            report.persist_error.as_deref(),
        )
    );

    Ok(report.outcome)
}

// ============================================================================
// check subcommand
// ============================================================================

pub fn cmd_check(config_path: &str) -> Result<(), Box<dyn std::error::Error>> {
    let file = load_spider_file(config_path)?;
    let config = file.to_config()?;
    print!("{}", format_plan(&config));

    let sink = file.sink();
    println!(
        "Output:           {}",
        sink.target_path(&chrono::Local::now()).display()
    );
    Ok(())
}

// ============================================================================
// show subcommand
// ============================================================================

pub fn cmd_show(path: &Path, top: usize) -> Result<(), Box<dyn std::error::Error>> {
    let records = read_records(path)?;
    let summaries = summarize_fields(&records, top);
    print!(
        "{}",
        format_field_summary(&path.display().to_string(), records.len(), &summaries)
    );
    Ok(())
}
