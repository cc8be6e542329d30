//! Sequential fetch → extract pipeline over all configured targets.
//!
//! Targets are processed one at a time in configured order. A failing target
//! is logged and recorded in the [`RunReport`]; it never stops the remaining
//! targets. Headlines are accumulated in target order, so the report handed
//! to the sink is deterministic.

use std::time::Duration;

use chrono::Local;
use futures::stream::{self, StreamExt};
use tokio::time::sleep;
use tracing::{debug, error, info, instrument, warn};

use crate::error::TargetError;
use crate::extract::{ExtractOptions, extract};
use crate::fetch::{FetchAsync, RetryFetch};
use crate::models::{Headline, RunReport, Target, TargetOutcome};
use crate::utils::truncate_for_log;

/// Drives every Target through fetch and extract, one at a time.
pub struct Pipeline<T> {
    fetcher: RetryFetch<T>,
    options: ExtractOptions,
    /// Pause inserted between consecutive targets.
    request_delay: Duration,
}

impl<T> Pipeline<T>
where
    T: FetchAsync,
{
    /// Build a pipeline from a retrying fetcher and compiled extraction options.
    pub fn new(fetcher: RetryFetch<T>, options: ExtractOptions, request_delay: Duration) -> Self {
        Self {
            fetcher,
            options,
            request_delay,
        }
    }

    /// Fetch and extract a single target. Extraction failures are not retried.
    #[instrument(level = "info", skip_all, fields(url = %target))]
    pub async fn process(&self, target: &Target) -> Result<Vec<Headline>, TargetError> {
        let fetched = self.fetcher.fetch(target).await?;
        debug!(
            status = fetched.status,
            content_type = ?fetched.content_type,
            attempts = fetched.attempts,
            "Fetched payload"
        );
        let content_type = fetched.content_type.as_deref();
        extract(&fetched.payload, content_type, &fetched.target, &self.options).map_err(|e| {
            debug!(
                preview = %truncate_for_log(&String::from_utf8_lossy(&fetched.payload), 300),
                "Payload failed extraction"
            );
            TargetError::from(e)
        })
    }

    /// Run every target and collect the results into one report.
    #[instrument(level = "info", skip_all, fields(targets = targets.len()))]
    pub async fn run(&self, targets: &[Target]) -> RunReport {
        let mut report = RunReport::new(Local::now());
        info!("Starting headline scraping");

        let results: Vec<(&Target, Result<Vec<Headline>, TargetError>)> =
            stream::iter(targets.iter().enumerate())
                .then(|(i, target)| async move {
                    if i > 0 && !self.request_delay.is_zero() {
                        sleep(self.request_delay).await;
                    }
                    info!(index = i, url = %target, kind = %target.kind(), "Scraping target");
                    (target, self.process(target).await)
                })
                .collect()
                .await;

        for (target, result) in results {
            let result = match result {
                Ok(headlines) => {
                    info!(url = %target, count = headlines.len(), "Target succeeded");
                    let count = headlines.len();
                    report.headlines.extend(headlines);
                    Ok(count)
                }
                Err(e) => {
                    match &e {
                        TargetError::Fetch(_) => error!(url = %target, error = %e, "Target failed to fetch; skipping"),
                        TargetError::Extract(_) => warn!(url = %target, error = %e, "Target failed to extract; skipping"),
                    }
                    Err(e)
                }
            };
            report.outcomes.push(TargetOutcome {
                target: target.clone(),
                result,
            });
        }

        info!(
            total_headlines = report.headlines.len(),
            succeeded = report.succeeded(),
            failed = report.failed(),
            "Scraping completed"
        );
        report
    }
}
