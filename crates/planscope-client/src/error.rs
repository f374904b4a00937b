//! Failure classification for the retrieval layer.
//!
//! Every failure the layer can observe is first described as a [`Failure`]
//! and then mapped by [`classify`] onto exactly one [`ErrorDetails`]. The
//! mapping follows a fixed priority: offline, rate limit, server error,
//! client error, timeout, transport, parse, unknown.

use std::time::Duration;

use chrono::{DateTime, Utc};
use reqwest::StatusCode;
use serde::Serialize;
use thiserror::Error;

/// Retry delay assumed when a 429 carries no usable `Retry-After`.
pub const DEFAULT_RETRY_AFTER_MS: u64 = 60_000;

const OFFLINE_MESSAGE: &str = "You appear to be offline. Showing cached data if available.";
const TIMEOUT_MESSAGE: &str =
    "The request took too long. The server might be busy - please try again.";
const RATE_LIMIT_MESSAGE: &str = "Too many requests. Please wait a moment and try again.";
const NETWORK_MESSAGE: &str =
    "Unable to connect to the server. Please check your internet connection.";
const SERVER_ERROR_MESSAGE: &str =
    "The planning data service is temporarily unavailable. Please try again later.";
const CLIENT_ERROR_MESSAGE: &str = "Unable to fetch planning data. The request was invalid.";
const PARSE_MESSAGE: &str = "Received invalid data from the server. Please try again.";
const UNKNOWN_MESSAGE: &str = "An unexpected error occurred. Please try again.";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ErrorKind {
    Offline,
    Timeout,
    RateLimit,
    Network,
    ApiError,
    Parse,
    Unknown,
}

impl std::fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ErrorKind::Offline => write!(f, "OFFLINE"),
            ErrorKind::Timeout => write!(f, "TIMEOUT"),
            ErrorKind::RateLimit => write!(f, "RATE_LIMIT"),
            ErrorKind::Network => write!(f, "NETWORK"),
            ErrorKind::ApiError => write!(f, "API_ERROR"),
            ErrorKind::Parse => write!(f, "PARSE"),
            ErrorKind::Unknown => write!(f, "UNKNOWN"),
        }
    }
}

/// A classified failure.
///
/// `message` is diagnostic and may contain URLs or upstream text; it belongs
/// in logs. `user_message` is one of a fixed set of sentences and is safe to
/// display.
#[derive(Debug, Clone, PartialEq, Eq, Error, Serialize)]
#[serde(rename_all = "camelCase")]
#[error("{kind}: {message}")]
pub struct ErrorDetails {
    pub kind: ErrorKind,
    pub message: String,
    pub user_message: &'static str,
    pub retryable: bool,
    pub retry_after_ms: Option<u64>,
    /// HTTP status of the response that caused the failure, if any.
    pub status: Option<u16>,
}

impl ErrorDetails {
    fn new(kind: ErrorKind, message: impl Into<String>, retryable: bool) -> Self {
        let user_message = match kind {
            ErrorKind::Offline => OFFLINE_MESSAGE,
            ErrorKind::Timeout => TIMEOUT_MESSAGE,
            ErrorKind::RateLimit => RATE_LIMIT_MESSAGE,
            ErrorKind::Network => NETWORK_MESSAGE,
            ErrorKind::ApiError if retryable => SERVER_ERROR_MESSAGE,
            ErrorKind::ApiError => CLIENT_ERROR_MESSAGE,
            ErrorKind::Parse => PARSE_MESSAGE,
            ErrorKind::Unknown => UNKNOWN_MESSAGE,
        };
        Self {
            kind,
            message: message.into(),
            user_message,
            retryable,
            retry_after_ms: None,
            status: None,
        }
    }

    #[must_use]
    pub fn offline() -> Self {
        Self::new(ErrorKind::Offline, "device is offline", true)
    }
}

/// Raw description of something that went wrong, before classification.
#[derive(Debug)]
pub enum Failure<'a> {
    /// A non-2xx response.
    Status {
        status: StatusCode,
        retry_after: Option<&'a str>,
    },
    /// The attempt exceeded its deadline and was cancelled.
    Timeout(Duration),
    /// The HTTP client failed before or while exchanging bytes.
    Transport(&'a reqwest::Error),
    /// The body was not the expected structure.
    Parse(String),
    Other(String),
}

/// Maps a failure onto exactly one [`ErrorDetails`].
///
/// `online` is the current network-availability signal; when it is `false`
/// the result is always [`ErrorKind::Offline`].
#[must_use]
pub fn classify(failure: Failure<'_>, online: bool) -> ErrorDetails {
    if !online {
        return ErrorDetails::offline();
    }

    match failure {
        Failure::Status {
            status,
            retry_after,
        } => classify_status(status, retry_after),
        Failure::Timeout(after) => ErrorDetails::new(
            ErrorKind::Timeout,
            format!("request timed out after {}ms", after.as_millis()),
            true,
        ),
        Failure::Transport(err) => classify_transport(err),
        Failure::Parse(message) => ErrorDetails::new(ErrorKind::Parse, message, true),
        Failure::Other(message) => ErrorDetails::new(ErrorKind::Unknown, message, true),
    }
}

fn classify_status(status: StatusCode, retry_after: Option<&str>) -> ErrorDetails {
    let mut details = if status == StatusCode::TOO_MANY_REQUESTS {
        let mut details = ErrorDetails::new(ErrorKind::RateLimit, "rate limit exceeded", true);
        details.retry_after_ms = Some(
            retry_after
                .and_then(|value| parse_retry_after(value, Utc::now()))
                .unwrap_or(DEFAULT_RETRY_AFTER_MS),
        );
        details
    } else if status.is_server_error() {
        ErrorDetails::new(ErrorKind::ApiError, format!("API returned {status}"), true)
    } else if status.is_client_error() {
        ErrorDetails::new(ErrorKind::ApiError, format!("API returned {status}"), false)
    } else {
        ErrorDetails::new(
            ErrorKind::Unknown,
            format!("unexpected HTTP status {status}"),
            true,
        )
    };
    details.status = Some(status.as_u16());
    details
}

fn classify_transport(err: &reqwest::Error) -> ErrorDetails {
    if err.is_timeout() {
        return ErrorDetails::new(ErrorKind::Timeout, err.to_string(), true);
    }
    if err.is_decode() {
        return ErrorDetails::new(ErrorKind::Parse, err.to_string(), true);
    }
    if let Some(status) = err.status() {
        return classify_status(status, None);
    }
    if err.is_builder() {
        return ErrorDetails::new(ErrorKind::Unknown, err.to_string(), true);
    }
    ErrorDetails::new(ErrorKind::Network, err.to_string(), true)
}

/// Parses a `Retry-After` header value into milliseconds.
///
/// Accepts delta-seconds (fractional values allowed) or an HTTP-date; a date
/// in the past yields `0`. Returns `None` for anything else.
#[must_use]
pub fn parse_retry_after(value: &str, now: DateTime<Utc>) -> Option<u64> {
    let value = value.trim();
    if value.is_empty() {
        return None;
    }

    if let Ok(secs) = value.parse::<f64>() {
        if secs.is_finite() && secs >= 0.0 {
            #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
            return Some((secs * 1_000.0).round() as u64);
        }
        return None;
    }

    let at = DateTime::parse_from_rfc2822(value).ok()?;
    let wait = at.with_timezone(&Utc) - now;
    Some(u64::try_from(wait.num_milliseconds()).unwrap_or(0))
}

/// Errors constructing a client or service.
#[derive(Debug, Error)]
pub enum BuildError {
    #[error("HTTP client construction failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("invalid base URL \"{url}\": {reason}")]
    InvalidBaseUrl { url: String, reason: String },
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn status(code: u16) -> Failure<'static> {
        Failure::Status {
            status: StatusCode::from_u16(code).unwrap(),
            retry_after: None,
        }
    }

    #[test]
    fn offline_takes_priority_over_everything() {
        let details = classify(status(500), false);
        assert_eq!(details.kind, ErrorKind::Offline);
        assert!(details.retryable);
        assert_eq!(details.status, None);
    }

    #[test]
    fn rate_limit_reads_retry_after_seconds() {
        let details = classify(
            Failure::Status {
                status: StatusCode::TOO_MANY_REQUESTS,
                retry_after: Some("2"),
            },
            true,
        );
        assert_eq!(details.kind, ErrorKind::RateLimit);
        assert!(details.retryable);
        assert_eq!(details.retry_after_ms, Some(2_000));
        assert_eq!(details.status, Some(429));
    }

    #[test]
    fn rate_limit_defaults_when_header_unusable() {
        let details = classify(
            Failure::Status {
                status: StatusCode::TOO_MANY_REQUESTS,
                retry_after: Some("soon"),
            },
            true,
        );
        assert_eq!(details.retry_after_ms, Some(DEFAULT_RETRY_AFTER_MS));

        let details = classify(status(429), true);
        assert_eq!(details.retry_after_ms, Some(DEFAULT_RETRY_AFTER_MS));
    }

    #[test]
    fn server_errors_are_retryable() {
        for code in [500, 502, 503, 504] {
            let details = classify(status(code), true);
            assert_eq!(details.kind, ErrorKind::ApiError);
            assert!(details.retryable, "{code} should be retryable");
            assert_eq!(details.user_message, SERVER_ERROR_MESSAGE);
        }
    }

    #[test]
    fn client_errors_are_not_retryable() {
        for code in [400, 401, 403, 404, 422] {
            let details = classify(status(code), true);
            assert_eq!(details.kind, ErrorKind::ApiError);
            assert!(!details.retryable, "{code} should not be retryable");
            assert_eq!(details.user_message, CLIENT_ERROR_MESSAGE);
        }
    }

    #[test]
    fn timeout_is_retryable() {
        let details = classify(Failure::Timeout(Duration::from_millis(1500)), true);
        assert_eq!(details.kind, ErrorKind::Timeout);
        assert!(details.retryable);
        assert!(details.message.contains("1500ms"));
    }

    #[test]
    fn parse_and_other_failures() {
        let parse = classify(Failure::Parse("bad body".to_string()), true);
        assert_eq!(parse.kind, ErrorKind::Parse);
        assert!(parse.retryable);

        let other = classify(Failure::Other("boom".to_string()), true);
        assert_eq!(other.kind, ErrorKind::Unknown);
        assert!(other.retryable);
    }

    #[tokio::test]
    async fn connection_refused_is_network() {
        let err = reqwest::Client::new()
            .get("http://127.0.0.1:1")
            .send()
            .await
            .unwrap_err();
        let details = classify(Failure::Transport(&err), true);
        assert_eq!(details.kind, ErrorKind::Network);
        assert!(details.retryable);
    }

    #[test]
    fn user_message_never_echoes_diagnostics() {
        let body = "<html><body>Traceback at /srv/app/internal.py line 12</body></html>";
        let details = classify(Failure::Parse(body.to_string()), true);
        assert!(!details.user_message.contains("Traceback"));
        assert!(!details.user_message.contains("/srv"));
        assert!(details.message.contains("Traceback"));
    }

    #[test]
    fn display_includes_kind_and_message() {
        let details = classify(status(503), true);
        assert_eq!(details.to_string(), "API_ERROR: API returned 503 Service Unavailable");
    }

    #[test]
    fn parse_retry_after_http_date() {
        let now = Utc.with_ymd_and_hms(2015, 10, 21, 7, 28, 0).unwrap();
        let ms = parse_retry_after("Wed, 21 Oct 2015 07:28:30 GMT", now);
        assert_eq!(ms, Some(30_000));
    }

    #[test]
    fn parse_retry_after_past_date_is_zero() {
        let now = Utc.with_ymd_and_hms(2015, 10, 21, 8, 0, 0).unwrap();
        let ms = parse_retry_after("Wed, 21 Oct 2015 07:28:00 GMT", now);
        assert_eq!(ms, Some(0));
    }

    #[test]
    fn parse_retry_after_rejects_garbage() {
        let now = Utc::now();
        assert_eq!(parse_retry_after("", now), None);
        assert_eq!(parse_retry_after("later", now), None);
        assert_eq!(parse_retry_after("-5", now), None);
        assert_eq!(parse_retry_after(" 3 ", now), Some(3_000));
        assert_eq!(parse_retry_after("1.5", now), Some(1_500));
    }
}
