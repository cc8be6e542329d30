//! # Headline Scraper
//!
//! Fetches news headlines from RSS/Atom feeds and HTML pages and writes them
//! to timestamped text and JSON files.
//!
//! ## Usage
//!
//! ```sh
//! headline_scraper -c scraper.json -o both -d ./out
//! ```
//!
//! ## Architecture
//!
//! The application is a linear pipeline run once per invocation:
//! 1. **Fetching**: GET each target with timeout and bounded retries
//! 2. **Extraction**: pull titles out of feed items or CSS-selected elements
//! 3. **Output**: write `news_headlines_<YYYYMMDD_HHMMSS>.txt` / `.json`
//!
//! ## Exit status
//!
//! - `0`: at least one target succeeded and at least one file was written
//! - `1`: every target failed
//! - `2`: invalid configuration, or no output file could be written
//!
//! Logs go to stdout; `--log-file` additionally appends them to a file.

use std::error::Error;
use std::process::ExitCode;

use clap::Parser;
use tracing::{debug, error, info, instrument};

mod cli;
mod config;
mod error;
mod extract;
mod fetch;
mod logging;
mod models;
mod outputs;
mod pipeline;
mod utils;

use cli::Cli;
use config::{Config, load_config};
use models::RunReport;
use outputs::{WriteOutcome, write_report};
use pipeline::Pipeline;
use utils::timestamped_namer;

const EXIT_SUCCESS: u8 = 0;
const EXIT_ALL_TARGETS_FAILED: u8 = 1;
const EXIT_CONFIG_OR_OUTPUT: u8 = 2;

/// Map a finished run to the process exit status.
///
/// Every target failing takes precedence over output failures.
fn exit_status(report: &RunReport, outcome: &WriteOutcome) -> u8 {
    if report.all_failed() {
        EXIT_ALL_TARGETS_FAILED
    } else if outcome.all_failed() {
        EXIT_CONFIG_OR_OUTPUT
    } else {
        EXIT_SUCCESS
    }
}

fn print_summary(report: &RunReport, outcome: &WriteOutcome) {
    println!("\n=== SCRAPING SUMMARY ===");
    println!("Sources processed: {}", report.outcomes.len());
    println!("Total headlines collected: {}", report.headlines.len());
    for target_outcome in &report.outcomes {
        match &target_outcome.result {
            Ok(count) => println!("  - {}: {} headlines", target_outcome.target, count),
            Err(e) => println!("  - {}: FAILED ({})", target_outcome.target, e),
        }
    }
    for path in &outcome.written {
        println!("Output file: {}", path.display());
    }
    for failure in &outcome.failed {
        println!("Output failed: {failure}");
    }
}

#[tokio::main]
#[instrument]
async fn main() -> Result<ExitCode, Box<dyn Error>> {
    let args = Cli::parse();

    // --- Tracing init ---
    if let Err(e) = logging::init(args.log_file.as_deref()) {
        eprintln!("cannot open log file: {e}");
        return Ok(ExitCode::from(EXIT_CONFIG_OR_OUTPUT));
    }

    let start_time = std::time::Instant::now();
    info!("headline_scraper starting up");
    debug!(?args, "Parsed CLI arguments");

    // ---- Configuration ----
    let mut config = match &args.config {
        Some(path) => match load_config(path) {
            Ok(config) => config,
            Err(e) => {
                error!(error = %e, "Failed to load configuration");
                return Ok(ExitCode::from(EXIT_CONFIG_OR_OUTPUT));
            }
        },
        None => Config::default(),
    };
    args.apply(&mut config);

    let prepared = config.validate().and_then(|()| {
        Ok((
            config.targets()?,
            config.fetch_policy()?,
            config.extract_options()?,
            config.request_delay()?,
        ))
    });
    let (targets, policy, options, request_delay) = match prepared {
        Ok(prepared) => prepared,
        Err(e) => {
            error!(error = %e, "Invalid configuration");
            return Ok(ExitCode::from(EXIT_CONFIG_OR_OUTPUT));
        }
    };
    info!(
        targets = targets.len(),
        timeout = ?policy.timeout,
        max_retries = policy.max_retries,
        output_format = ?config.output_format,
        "Configuration ready"
    );

    // ---- Fetch and extract ----
    let fetcher = fetch::http_fetcher(&policy)?;
    let pipeline = Pipeline::new(fetcher, options, request_delay);
    let report = pipeline.run(&targets).await;

    // ---- Output ----
    let namer = timestamped_namer(&config.output_dir, &report.generated_at);
    let outcome = write_report(&report, &config.output_format.formats(), namer).await;

    print_summary(&report, &outcome);

    let elapsed = start_time.elapsed();
    info!(
        ?elapsed,
        headlines = report.headlines.len(),
        succeeded = report.succeeded(),
        failed = report.failed(),
        files_written = outcome.written.len(),
        "Execution complete"
    );

    let status = exit_status(&report, &outcome);
    match status {
        EXIT_ALL_TARGETS_FAILED => error!("Every target failed"),
        EXIT_CONFIG_OR_OUTPUT => error!("No output file could be written"),
        _ => {}
    }
    Ok(ExitCode::from(status))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::{FetchError, FetchErrorKind, TargetError, WriteError};
    use crate::models::{Headline, Target, TargetOutcome};
    use chrono::Local;
    use std::path::PathBuf;

    fn outcome_for(url: &str, result: Result<usize, TargetError>) -> TargetOutcome {
        TargetOutcome {
            target: Target::inferred(url).unwrap(),
            result,
        }
    }

    fn fetch_failure(url: &str) -> TargetError {
        TargetError::Fetch(FetchError {
            kind: FetchErrorKind::Timeout,
            target: url.to_string(),
            attempts: 4,
            message: "timed out".to_string(),
        })
    }

    fn report(results: Vec<(&str, Result<usize, TargetError>)>) -> RunReport {
        let mut report = RunReport::new(Local::now());
        for (url, result) in results {
            if let Ok(count) = result {
                for i in 0..count {
                    report
                        .headlines
                        .push(Headline::new(&format!("Headline {i}"), url).unwrap());
                }
            }
            report.outcomes.push(outcome_for(url, result));
        }
        report
    }

    fn written() -> WriteOutcome {
        WriteOutcome {
            written: vec![PathBuf::from("news_headlines_20240101_000000.txt")],
            failed: Vec::new(),
        }
    }

    fn nothing_written() -> WriteOutcome {
        let io = std::io::Error::new(std::io::ErrorKind::PermissionDenied, "denied");
        WriteOutcome {
            written: Vec::new(),
            failed: vec![WriteError::io("/ro/news_headlines.txt", &io)],
        }
    }

    #[test]
    fn test_every_target_failing_exits_1() {
        let report = report(vec![
            ("https://a.example/rss", Err(fetch_failure("https://a.example/rss"))),
            ("https://b.example/news", Err(fetch_failure("https://b.example/news"))),
        ]);
        assert_eq!(exit_status(&report, &written()), EXIT_ALL_TARGETS_FAILED);
        assert_eq!(exit_status(&report, &nothing_written()), EXIT_ALL_TARGETS_FAILED);
    }

    #[test]
    fn test_every_output_failing_exits_2() {
        let report = report(vec![
            ("https://a.example/rss", Ok(3)),
            ("https://b.example/news", Err(fetch_failure("https://b.example/news"))),
        ]);
        assert_eq!(exit_status(&report, &nothing_written()), EXIT_CONFIG_OR_OUTPUT);
    }

    #[test]
    fn test_partial_success_exits_0() {
        let report = report(vec![
            ("https://a.example/rss", Ok(3)),
            ("https://b.example/news", Err(fetch_failure("https://b.example/news"))),
        ]);
        assert_eq!(exit_status(&report, &written()), EXIT_SUCCESS);
    }

    #[test]
    fn test_zero_headlines_from_a_successful_target_exits_0() {
        let report = report(vec![("https://a.example/news", Ok(0))]);
        assert!(report.headlines.is_empty());
        assert_eq!(exit_status(&report, &written()), EXIT_SUCCESS);
    }
}
