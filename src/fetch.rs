//! HTTP fetching with timeouts, retries and a per-batch cooldown
//!
//! Two fetch flavours exist:
//! - **Batch fetches** ([`fetch_with_retry`]), used by prefetch workers: short
//!   timeout, fixed-delay retries on transport errors.
//! - **Single-shot fetches** ([`fetch_once`]), used when a page was never
//!   scheduled for prefetching: one attempt with a longer timeout.
//!
//! Both degrade to an empty body; the caller decides whether an empty body
//! is worth a warning.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::{Client, header};
use tokio::time::sleep;
use tracing::{debug, warn};

use crate::error::FetchError;

const USER_AGENT: &str =
    "Mozilla/5.0 (X11; Ubuntu; Linux x86_64; rv:109.0) Gecko/20100101 Firefox/112.0";

/// Source of page bodies
///
/// [`HttpFetcher`] is the production implementation; tests substitute
/// scripted fetchers to exercise retry and prefetch behaviour offline.
#[async_trait]
pub trait Fetcher: Send + Sync {
    /// GET `url`, returning the body of a successful response
    async fn get(&self, url: &str, timeout: Duration) -> Result<String, FetchError>;

    /// HEAD `url` following redirects, returning the final status code
    async fn head(&self, url: &str, timeout: Duration) -> Result<u16, FetchError>;
}

/// Timeouts, retry bounds and cooldown for page fetches
#[derive(Debug, Clone)]
pub struct FetchPolicy {
    /// Timeout of one batch attempt
    pub attempt_timeout: Duration,
    /// Attempts after the first one, for transport failures only
    pub max_retries: usize,
    /// Fixed pause between attempts
    pub retry_delay: Duration,
    /// Failed URLs in one batch that trigger a cooldown
    pub cooldown_threshold: u32,
    /// Pause taken once the threshold is reached
    pub cooldown: Duration,
    /// Timeout of a single-shot fetch
    pub direct_timeout: Duration,
    /// Timeout for the first page of a collection and for existence probes
    pub probe_timeout: Duration,
}

impl Default for FetchPolicy {
    fn default() -> Self {
        Self {
            attempt_timeout: Duration::from_secs(5),
            max_retries: 3,
            retry_delay: Duration::from_secs(5),
            cooldown_threshold: 3,
            cooldown: Duration::from_secs(10),
            direct_timeout: Duration::from_secs(20),
            probe_timeout: Duration::from_secs(15),
        }
    }
}

/// Failure counter shared by every URL of one worker's batch
///
/// Each URL that ultimately failed counts once. Reaching the threshold asks
/// for a pause and restarts the count at 1, so the next cooldown comes after
/// `threshold - 1` further failures.
#[derive(Debug, Clone)]
pub struct Cooldown {
    failures: u32,
    threshold: u32,
    pause: Duration,
}

impl Cooldown {
    pub fn new(threshold: u32, pause: Duration) -> Self {
        Self {
            failures: 0,
            threshold: threshold.max(1),
            pause,
        }
    }

    /// Record the outcome of one URL; returns the pause to take, if any
    pub fn record(&mut self, failed: bool) -> Option<Duration> {
        if failed {
            self.failures += 1;
        }
        if self.failures >= self.threshold {
            self.failures = 1;
            Some(self.pause)
        } else {
            None
        }
    }

    /// Current failure count
    pub fn failures(&self) -> u32 {
        self.failures
    }
}

impl From<&FetchPolicy> for Cooldown {
    fn from(policy: &FetchPolicy) -> Self {
        Cooldown::new(policy.cooldown_threshold, policy.cooldown)
    }
}

/// Fetch `url`, retrying transport failures with a fixed delay
pub async fn fetch_with_retry(
    fetcher: &dyn Fetcher,
    url: &str,
    policy: &FetchPolicy,
) -> Result<String, FetchError> {
    let mut attempt = 0;
    loop {
        match fetcher.get(url, policy.attempt_timeout).await {
            Ok(body) => return Ok(body),
            Err(err) if err.is_transient() && attempt < policy.max_retries => {
                attempt += 1;
                debug!(
                    url,
                    attempt,
                    max_attempts = policy.max_retries + 1,
                    error = %err,
                    "retrying page fetch"
                );
                sleep(policy.retry_delay).await;
            }
            Err(err) => return Err(err),
        }
    }
}

/// Single attempt with the long timeout; failures become an empty body
pub async fn fetch_once(fetcher: &dyn Fetcher, url: &str, timeout: Duration) -> String {
    match fetcher.get(url, timeout).await {
        Ok(body) => body,
        Err(err) => {
            debug!(url, error = %err, "direct fetch failed");
            String::new()
        }
    }
}

/// Run one worker's batch: fetch every URL in order, pausing on repeated failures
///
/// `on_page` receives each URL with its body, or the empty string when every
/// attempt failed.
pub async fn fetch_batch<F>(
    fetcher: &dyn Fetcher,
    urls: &[String],
    policy: &FetchPolicy,
    mut on_page: F,
) where
    F: FnMut(&str, String),
{
    let mut cooldown = Cooldown::from(policy);
    for url in urls {
        let result = fetch_with_retry(fetcher, url, policy).await;
        let failed = result.is_err();
        let body = result.unwrap_or_else(|err| {
            debug!(url = url.as_str(), error = %err, "giving up on page");
            String::new()
        });
        on_page(url, body);
        if let Some(pause) = cooldown.record(failed) {
            warn!(
                pause_secs = pause.as_secs(),
                "several pages failed, pausing before continuing"
            );
            sleep(pause).await;
        }
    }
}

/// Production fetcher backed by `reqwest`
#[derive(Debug, Clone)]
pub struct HttpFetcher {
    client: Client,
}

impl HttpFetcher {
    pub fn new() -> Result<Self, reqwest::Error> {
        let mut headers = header::HeaderMap::new();
        headers.insert(
            header::ACCEPT,
            header::HeaderValue::from_static(
                "text/html,application/xhtml+xml,application/xml;q=0.9,*/*;q=0.8",
            ),
        );
        headers.insert(
            header::ACCEPT_LANGUAGE,
            header::HeaderValue::from_static("en-US,en;q=0.5"),
        );
        headers.insert(header::DNT, header::HeaderValue::from_static("1"));
        headers.insert(
            header::UPGRADE_INSECURE_REQUESTS,
            header::HeaderValue::from_static("1"),
        );

        let client = Client::builder()
            .user_agent(USER_AGENT)
            .default_headers(headers)
            .gzip(true)
            .build()?;

        Ok(Self { client })
    }
}

#[async_trait]
impl Fetcher for HttpFetcher {
    async fn get(&self, url: &str, timeout: Duration) -> Result<String, FetchError> {
        let response = self
            .client
            .get(url)
            .timeout(timeout)
            .send()
            .await
            .map_err(|err| FetchError::transport(url, err))?;

        let status = response.status();
        if !status.is_success() {
            return Err(FetchError::Status {
                url: url.to_string(),
                status: status.as_u16(),
            });
        }

        response.text().await.map_err(|err| FetchError::Body {
            url: url.to_string(),
            source: Box::new(err),
        })
    }

    async fn head(&self, url: &str, timeout: Duration) -> Result<u16, FetchError> {
        let response = self
            .client
            .head(url)
            .timeout(timeout)
            .send()
            .await
            .map_err(|err| FetchError::transport(url, err))?;
        Ok(response.status().as_u16())
    }
}
