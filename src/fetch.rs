//! HTTP fetching with bounded retry and exponential backoff.
//!
//! The module uses a trait-based design so the retry policy can be driven by
//! any transport:
//! - [`FetchAsync`]: one GET attempt against a [`Target`]
//! - [`HttpFetcher`]: the `reqwest` implementation used by the binary
//! - [`RetryFetch`]: decorator that adds retries to any `FetchAsync`
//!
//! # Retry Strategy
//!
//! - `1 + max_retries` attempts in total
//! - network errors, timeouts and non-2xx statuses are all retried
//! - delay starts at `retry_delay` and doubles per retry, capped at 30 seconds
//! - 0-250ms of random jitter is added unless `retry_delay` is zero

use std::fmt;
use std::time::{Duration, Instant};

use rand::{Rng, rng};
use reqwest::header::{ACCEPT, ACCEPT_LANGUAGE, CONTENT_TYPE, HeaderMap, HeaderValue};
use tokio::time::sleep;
use tracing::{debug, error, info, instrument, warn};

use crate::config::DEFAULT_USER_AGENT;
use crate::error::{AttemptError, FetchError, FetchErrorKind};
use crate::models::{FetchResult, Target};

const MAX_BACKOFF: Duration = Duration::from_secs(30);

/// Timeout and retry settings for fetching.
#[derive(Debug, Clone, PartialEq)]
pub struct FetchPolicy {
    pub timeout: Duration,
    pub max_retries: u32,
    pub retry_delay: Duration,
    pub user_agent: String,
}

impl Default for FetchPolicy {
    fn default() -> Self {
        Self {
            timeout: Duration::from_secs(10),
            max_retries: 3,
            retry_delay: Duration::from_secs(2),
            user_agent: DEFAULT_USER_AGENT.to_string(),
        }
    }
}

/// A successful (2xx) response body, before retry bookkeeping.
#[derive(Debug)]
pub struct RawResponse {
    pub status: u16,
    pub content_type: Option<String>,
    pub payload: Vec<u8>,
}

/// One GET attempt against a Target.
pub trait FetchAsync {
    async fn fetch_once(&self, target: &Target) -> Result<RawResponse, AttemptError>;
}

/// `reqwest`-backed transport with browser-like headers.
#[derive(Debug, Clone)]
pub struct HttpFetcher {
    client: reqwest::Client,
}

impl HttpFetcher {
    /// Build the `reqwest` client for `policy`.
    ///
    /// The client sends the configured User-Agent plus `Accept` headers that
    /// cover both feeds and pages, applies `policy.timeout` to every request,
    /// and follows redirects.
    pub fn new(policy: &FetchPolicy) -> Result<Self, reqwest::Error> {
        let mut headers = HeaderMap::new();
        headers.insert(
            ACCEPT,
            HeaderValue::from_static(
                "text/html,application/xhtml+xml,application/rss+xml,application/atom+xml,application/xml;q=0.9,*/*;q=0.8",
            ),
        );
        headers.insert(ACCEPT_LANGUAGE, HeaderValue::from_static("en-US,en;q=0.5"));

        let client = reqwest::Client::builder()
            .user_agent(policy.user_agent.as_str())
            .default_headers(headers)
            .timeout(policy.timeout)
            .build()?;
        Ok(Self { client })
    }
}

impl FetchAsync for HttpFetcher {
    #[instrument(level = "debug", skip_all, fields(url = %target))]
    async fn fetch_once(&self, target: &Target) -> Result<RawResponse, AttemptError> {
        let response = self
            .client
            .get(target.url().clone())
            .send()
            .await
            .map_err(|e| AttemptError::from_reqwest(&e))?;

        let status = response.status();
        if !status.is_success() {
            return Err(AttemptError::new(
                FetchErrorKind::HttpStatus(status.as_u16()),
                status.canonical_reason().unwrap_or("unexpected status"),
            ));
        }

        let content_type = response
            .headers()
            .get(CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .map(str::to_string);
        let payload = response
            .bytes()
            .await
            .map_err(|e| AttemptError::from_reqwest(&e))?
            .to_vec();

        debug!(status = status.as_u16(), bytes = payload.len(), "Received response");
        Ok(RawResponse {
            status: status.as_u16(),
            content_type,
            payload,
        })
    }
}

/// Adds bounded retries with exponential backoff to any [`FetchAsync`].
///
/// The delay before retry `n` (1-based) is:
/// ```text
/// delay = min(base_delay * 2^(n-1), 30s) + random_jitter(0..=250ms)
/// ```
pub struct RetryFetch<T> {
    inner: T,
    max_retries: u32,
    base_delay: Duration,
    max_delay: Duration,
}

impl<T> RetryFetch<T>
where
    T: FetchAsync,
{
    /// Creates a new retry wrapper around a transport.
    ///
    /// # Arguments
    ///
    /// * `inner` - The transport performing single attempts
    /// * `max_retries` - Retries after the first failed attempt
    /// * `base_delay` - Delay before the first retry; zero disables sleeping
    ///
    /// # Example
    ///
    /// ```ignore
    /// let fetcher = RetryFetch::new(HttpFetcher::new(&policy)?, 3, Duration::from_secs(2));
    /// let fetched = fetcher.fetch(&target).await?;
    /// ```
    pub fn new(inner: T, max_retries: u32, base_delay: Duration) -> Self {
        Self {
            inner,
            max_retries,
            base_delay,
            max_delay: MAX_BACKOFF,
        }
    }

    fn backoff(&self, retry: u32) -> Duration {
        if self.base_delay.is_zero() {
            return Duration::ZERO;
        }
        let factor = 1u32.checked_shl(retry.saturating_sub(1)).unwrap_or(u32::MAX);
        let delay = self.base_delay.saturating_mul(factor).min(self.max_delay);
        let jitter_ms: u64 = rng().random_range(0..=250);
        delay + Duration::from_millis(jitter_ms)
    }

    /// Fetch a Target, retrying failed attempts until the bound is reached.
    #[instrument(level = "info", skip_all, fields(url = %target, kind = %target.kind()))]
    pub async fn fetch(&self, target: &Target) -> Result<FetchResult, FetchError> {
        let total_t0 = Instant::now();
        let mut attempts = 0u32;

        loop {
            attempts += 1;
            match self.inner.fetch_once(target).await {
                Ok(raw) => {
                    info!(
                        attempts,
                        bytes = raw.payload.len(),
                        elapsed_ms_total = total_t0.elapsed().as_millis(),
                        "Fetched target"
                    );
                    return Ok(FetchResult {
                        target: target.clone(),
                        status: raw.status,
                        content_type: raw.content_type,
                        payload: raw.payload,
                        attempts,
                    });
                }
                Err(e) => {
                    let retries_used = attempts - 1;
                    if retries_used >= self.max_retries {
                        error!(
                            attempts,
                            max_retries = self.max_retries,
                            elapsed_ms_total = total_t0.elapsed().as_millis(),
                            error = %e,
                            "fetch exhausted retries"
                        );
                        return Err(FetchError {
                            kind: e.kind,
                            target: target.to_string(),
                            attempts,
                            message: e.message,
                        });
                    }

                    let delay = self.backoff(attempts);
                    warn!(
                        attempt = attempts,
                        max_retries = self.max_retries,
                        ?delay,
                        error = %e,
                        "fetch attempt failed; backing off"
                    );
                    if !delay.is_zero() {
                        sleep(delay).await;
                    }
                }
            }
        }
    }
}

impl<T> fmt::Debug for RetryFetch<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RetryFetch")
            .field("max_retries", &self.max_retries)
            .field("base_delay", &self.base_delay)
            .field("max_delay", &self.max_delay)
            .finish()
    }
}

/// Build the production fetcher for a policy.
///
/// # Returns
///
/// An [`HttpFetcher`] wrapped in [`RetryFetch`] with the policy's retry bound
/// and base delay, or the `reqwest` error if the client cannot be built.
pub fn http_fetcher(policy: &FetchPolicy) -> Result<RetryFetch<HttpFetcher>, reqwest::Error> {
    Ok(RetryFetch::new(
        HttpFetcher::new(policy)?,
        policy.max_retries,
        policy.retry_delay,
    ))
}
