//! Single-request execution with timeout, retry, and body guarding.
//!
//! [`RequestExecutor::execute`] runs one GET with up to `max_retries`
//! additional attempts. Each attempt has its own deadline. Retryable
//! failures back off exponentially; HTTP 429 waits for the server's
//! `Retry-After` instead when it is short enough.

use std::time::Duration;

use chrono::Utc;
use planscope_core::PlanningConfig;
use reqwest::header::{HeaderMap, HeaderValue, CONTENT_TYPE, RETRY_AFTER};
use reqwest::{Client, Response, StatusCode, Url};
use serde::de::DeserializeOwned;

use crate::error::{classify, parse_retry_after, BuildError, ErrorDetails, ErrorKind, Failure};
use crate::network::NetworkStatus;

const BODY_PREVIEW_CHARS: usize = 100;

/// Backoff schedule shared by every request an executor makes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    pub initial_delay: Duration,
    pub max_delay: Duration,
    /// Longest `Retry-After` the executor will sleep through before giving up.
    pub rate_limit_ceiling: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            initial_delay: Duration::from_millis(1_000),
            max_delay: Duration::from_millis(8_000),
            rate_limit_ceiling: Duration::from_millis(30_000),
        }
    }
}

impl RetryPolicy {
    #[must_use]
    pub fn from_config(config: &PlanningConfig) -> Self {
        Self {
            initial_delay: Duration::from_millis(config.initial_retry_delay_ms),
            max_delay: Duration::from_millis(config.max_retry_delay_ms),
            rate_limit_ceiling: Duration::from_millis(config.rate_limit_ceiling_ms),
        }
    }

    /// Delay after the failed attempt with zero-based index `attempt`:
    /// `min(initial_delay * 2^attempt, max_delay)`.
    #[must_use]
    pub fn backoff_delay(&self, attempt: u32) -> Duration {
        let factor = 1u32.checked_shl(attempt).unwrap_or(u32::MAX);
        self.initial_delay.saturating_mul(factor).min(self.max_delay)
    }
}

/// Per-call request settings.
#[derive(Debug, Clone)]
pub struct RequestOptions {
    pub headers: HeaderMap,
    pub timeout: Duration,
    pub max_retries: u32,
}

impl RequestOptions {
    #[must_use]
    pub fn new(timeout: Duration, max_retries: u32) -> Self {
        Self {
            headers: HeaderMap::new(),
            timeout,
            max_retries,
        }
    }

    #[must_use]
    pub fn accept_json(mut self) -> Self {
        self.headers.insert(
            reqwest::header::ACCEPT,
            HeaderValue::from_static("application/json"),
        );
        self
    }
}

/// Executes HTTP GETs on behalf of the planning sources.
///
/// Cloning is cheap; clones share the connection pool and the network
/// signal.
#[derive(Debug, Clone)]
pub struct RequestExecutor {
    client: Client,
    network: NetworkStatus,
    policy: RetryPolicy,
}

impl RequestExecutor {
    /// Creates an executor with its own `reqwest::Client`.
    ///
    /// # Errors
    ///
    /// Returns [`BuildError::Http`] if the underlying client cannot be
    /// constructed.
    pub fn new(
        user_agent: &str,
        network: NetworkStatus,
        policy: RetryPolicy,
    ) -> Result<Self, BuildError> {
        let client = Client::builder()
            .connect_timeout(Duration::from_secs(10))
            .user_agent(user_agent)
            .build()?;
        Ok(Self::with_client(client, network, policy))
    }

    #[must_use]
    pub fn with_client(client: Client, network: NetworkStatus, policy: RetryPolicy) -> Self {
        Self {
            client,
            network,
            policy,
        }
    }

    #[must_use]
    pub fn network(&self) -> &NetworkStatus {
        &self.network
    }

    #[must_use]
    pub fn policy(&self) -> RetryPolicy {
        self.policy
    }

    /// Issues a GET to `url`, retrying transient failures.
    ///
    /// Attempts run with index `0..=max_retries`. A 2xx response is returned
    /// as soon as it arrives; its body is not read here, but reading it
    /// later is still bounded by the same per-attempt timeout.
    ///
    /// # Errors
    ///
    /// - [`ErrorKind::Offline`] immediately, without a request, when the
    ///   network signal reports offline.
    /// - [`ErrorKind::RateLimit`] when a 429 cannot be waited out.
    /// - Any other classified failure once it is non-retryable or the
    ///   retry budget is spent.
    pub async fn execute(
        &self,
        url: &Url,
        options: &RequestOptions,
    ) -> Result<Response, ErrorDetails> {
        if !self.network.is_online() {
            return Err(ErrorDetails::offline());
        }

        let mut attempt = 0u32;
        // Rate-limit waits consume retry budget but not backoff steps.
        let mut backoff_step = 0u32;
        loop {
            let request = self
                .client
                .get(url.clone())
                .headers(options.headers.clone())
                .timeout(options.timeout)
                .send();

            let err = match tokio::time::timeout(options.timeout, request).await {
                Ok(Ok(response)) => {
                    let status = response.status();
                    if status.is_success() {
                        return Ok(response);
                    }

                    let retry_after = response
                        .headers()
                        .get(RETRY_AFTER)
                        .and_then(|v| v.to_str().ok())
                        .map(str::to_owned);
                    let err = self.classify(Failure::Status {
                        status,
                        retry_after: retry_after.as_deref(),
                    });

                    if status == StatusCode::TOO_MANY_REQUESTS {
                        let wait = retry_after
                            .as_deref()
                            .and_then(|v| parse_retry_after(v, Utc::now()))
                            .map(Duration::from_millis);
                        match wait {
                            Some(wait)
                                if attempt < options.max_retries
                                    && wait < self.policy.rate_limit_ceiling =>
                            {
                                tracing::warn!(
                                    url = %url,
                                    attempt,
                                    max_retries = options.max_retries,
                                    wait_ms = u64::try_from(wait.as_millis()).unwrap_or(u64::MAX),
                                    "rate limited; waiting for Retry-After"
                                );
                                tokio::time::sleep(wait).await;
                                attempt += 1;
                                continue;
                            }
                            _ => return Err(err),
                        }
                    }
                    err
                }
                Ok(Err(e)) => self.classify(Failure::Transport(&e)),
                Err(_) => self.classify(Failure::Timeout(options.timeout)),
            };

            if !err.retryable || err.kind == ErrorKind::Offline || attempt >= options.max_retries {
                return Err(err);
            }

            let delay = self.policy.backoff_delay(backoff_step);
            tracing::warn!(
                url = %url,
                attempt,
                max_retries = options.max_retries,
                delay_ms = u64::try_from(delay.as_millis()).unwrap_or(u64::MAX),
                kind = %err.kind,
                error = %err.message,
                "transient request failure; retrying after backoff"
            );
            tokio::time::sleep(delay).await;
            attempt += 1;
            backoff_step += 1;
        }
    }

    /// Reads a successful response body as JSON of type `T`.
    ///
    /// HTML (by content type or by leading markup), empty bodies, and
    /// malformed JSON are all [`ErrorKind::Parse`]; decoding is never
    /// attempted on something that looks like an HTML page.
    ///
    /// # Errors
    ///
    /// Returns a classified [`ErrorDetails`]; transport failures while
    /// reading the body keep their transport classification, and a body
    /// that stalls past the request timeout is [`ErrorKind::Timeout`].
    pub async fn decode_json<T: DeserializeOwned>(
        &self,
        response: Response,
        source: &str,
    ) -> Result<T, ErrorDetails> {
        let content_type = response
            .headers()
            .get(CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .map(str::to_ascii_lowercase)
            .unwrap_or_default();

        if content_type.contains("text/html") {
            return Err(self.classify(Failure::Parse(format!(
                "{source} returned HTML content-type ({content_type})"
            ))));
        }

        let body = response
            .text()
            .await
            .map_err(|e| self.classify(Failure::Transport(&e)))?;
        let trimmed = body.trim();

        if looks_like_html(trimmed) {
            return Err(self.classify(Failure::Parse(format!(
                "{source} returned an HTML document: {}",
                preview(trimmed)
            ))));
        }

        if trimmed.is_empty() {
            return Err(self.classify(Failure::Parse(format!(
                "{source} returned an empty body"
            ))));
        }

        serde_json::from_str::<T>(trimmed).map_err(|e| {
            let message = if trimmed.starts_with('<') {
                format!("{source} returned markup: {}", preview(trimmed))
            } else {
                format!("{source} returned malformed JSON: {e}")
            };
            self.classify(Failure::Parse(message))
        })
    }

    fn classify(&self, failure: Failure<'_>) -> ErrorDetails {
        classify(failure, self.network.is_online())
    }
}

fn looks_like_html(body: &str) -> bool {
    let head: String = body.chars().take(16).collect::<String>().to_ascii_lowercase();
    head.starts_with("<!doctype") || head.starts_with("<html")
}

fn preview(body: &str) -> String {
    body.chars().take(BODY_PREVIEW_CHARS).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn backoff_schedule_matches_defaults() {
        let policy = RetryPolicy::default();
        assert_eq!(policy.backoff_delay(0), Duration::from_millis(1_000));
        assert_eq!(policy.backoff_delay(1), Duration::from_millis(2_000));
        assert_eq!(policy.backoff_delay(2), Duration::from_millis(4_000));
        assert_eq!(policy.backoff_delay(3), Duration::from_millis(8_000));
        assert_eq!(policy.backoff_delay(4), Duration::from_millis(8_000));
    }

    #[test]
    fn total_backoff_for_three_retries_is_seven_seconds() {
        let policy = RetryPolicy::default();
        let total: Duration = (0..3).map(|i| policy.backoff_delay(i)).sum();
        assert_eq!(total, Duration::from_millis(7_000));
    }

    #[test]
    fn backoff_saturates_on_huge_attempts() {
        let policy = RetryPolicy::default();
        assert_eq!(policy.backoff_delay(40), policy.max_delay);
        assert_eq!(policy.backoff_delay(u32::MAX), policy.max_delay);
    }

    #[test]
    fn policy_from_config() {
        let config = PlanningConfig {
            initial_retry_delay_ms: 10,
            max_retry_delay_ms: 40,
            rate_limit_ceiling_ms: 500,
            ..PlanningConfig::default()
        };
        let policy = RetryPolicy::from_config(&config);
        assert_eq!(policy.initial_delay, Duration::from_millis(10));
        assert_eq!(policy.backoff_delay(5), Duration::from_millis(40));
        assert_eq!(policy.rate_limit_ceiling, Duration::from_millis(500));
    }

    #[test]
    fn html_detection_is_case_insensitive() {
        assert!(looks_like_html("<!DOCTYPE html><html></html>"));
        assert!(looks_like_html("<!doctype html>"));
        assert!(looks_like_html("<HTML lang=\"en\">"));
        assert!(!looks_like_html("{\"records\": []}"));
        assert!(!looks_like_html("<?xml version=\"1.0\"?>"));
    }

    #[test]
    fn preview_is_bounded_and_char_safe() {
        let long = "é".repeat(500);
        assert_eq!(preview(&long).chars().count(), BODY_PREVIEW_CHARS);
    }
}
