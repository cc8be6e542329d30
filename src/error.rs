//! Error taxonomy for the fetch → extract → write pipeline.
//!
//! Each stage owns its error type so callers can decide per stage what is
//! retried, what fails a single Target, and what only fails one output format:
//!
//! | Error | Kinds | Retried | Scope of failure |
//! |-------|-------|---------|------------------|
//! | [`FetchError`] | Network, Timeout, HttpStatus | yes, up to `max_retries` | one Target |
//! | [`ExtractError`] | Malformed, NoMatch | never | one Target |
//! | [`WriteError`] | Io, Serialize | never | one output format |
//! | [`ConfigError`] | - | never | the whole run |

use std::fmt;
use std::path::PathBuf;

use thiserror::Error;

/// Classification of a failed fetch attempt.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FetchErrorKind {
    /// Connection, DNS, TLS or body-read failure.
    Network,
    /// The request did not complete within the configured timeout.
    Timeout,
    /// The server answered with a non-2xx status.
    HttpStatus(u16),
}

impl fmt::Display for FetchErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FetchErrorKind::Network => f.write_str("network error"),
            FetchErrorKind::Timeout => f.write_str("timed out"),
            FetchErrorKind::HttpStatus(code) => write!(f, "HTTP status {code}"),
        }
    }
}

/// A single failed attempt, before the retry policy has been applied.
#[derive(Debug, Error)]
#[error("{kind}: {message}")]
pub struct AttemptError {
    pub kind: FetchErrorKind,
    pub message: String,
}

impl AttemptError {
    pub fn new(kind: FetchErrorKind, message: impl fmt::Display) -> Self {
        Self {
            kind,
            message: message.to_string(),
        }
    }

    /// Classify a transport error from `reqwest`.
    pub fn from_reqwest(e: &reqwest::Error) -> Self {
        let kind = if e.is_timeout() {
            FetchErrorKind::Timeout
        } else if let Some(status) = e.status() {
            FetchErrorKind::HttpStatus(status.as_u16())
        } else {
            FetchErrorKind::Network
        };
        Self::new(kind, e)
    }
}

/// Raised once retries for a Target are exhausted.
#[derive(Debug, Error)]
#[error("fetching {target} failed after {attempts} attempt(s): {kind} ({message})")]
pub struct FetchError {
    /// Kind of the last failed attempt.
    pub kind: FetchErrorKind,
    pub target: String,
    pub attempts: u32,
    pub message: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExtractErrorKind {
    /// The payload could not be parsed at all.
    Malformed,
    /// Parsing succeeded but nothing matched and a match was required.
    NoMatch,
}

impl fmt::Display for ExtractErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ExtractErrorKind::Malformed => f.write_str("malformed content"),
            ExtractErrorKind::NoMatch => f.write_str("no headlines matched"),
        }
    }
}

#[derive(Debug, Error)]
#[error("extracting headlines from {target} failed: {kind} ({message})")]
pub struct ExtractError {
    pub kind: ExtractErrorKind,
    pub target: String,
    pub message: String,
}

impl ExtractError {
    pub fn malformed(target: impl Into<String>, message: impl fmt::Display) -> Self {
        Self {
            kind: ExtractErrorKind::Malformed,
            target: target.into(),
            message: message.to_string(),
        }
    }

    pub fn no_match(target: impl Into<String>) -> Self {
        Self {
            kind: ExtractErrorKind::NoMatch,
            target: target.into(),
            message: "extraction produced no headlines".to_string(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WriteErrorKind {
    /// Creating the directory or writing the file failed.
    Io,
    /// The report could not be rendered in the requested format.
    Serialize,
}

impl fmt::Display for WriteErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            WriteErrorKind::Io => f.write_str("I/O error"),
            WriteErrorKind::Serialize => f.write_str("serialization error"),
        }
    }
}

#[derive(Debug, Error)]
#[error("writing {} failed ({kind}): {message}", .path.display())]
pub struct WriteError {
    pub kind: WriteErrorKind,
    pub path: PathBuf,
    pub message: String,
}

impl WriteError {
    /// A filesystem failure at `path`.
    pub fn io(path: impl Into<PathBuf>, e: &std::io::Error) -> Self {
        Self {
            kind: WriteErrorKind::Io,
            path: path.into(),
            message: e.to_string(),
        }
    }

    /// A rendering failure for the file that would have gone to `path`.
    pub fn serialize(path: impl Into<PathBuf>, e: &serde_json::Error) -> Self {
        Self {
            kind: WriteErrorKind::Serialize,
            path: path.into(),
            message: e.to_string(),
        }
    }
}

/// Errors detected while loading or validating configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("cannot read config file {}: {source}", .path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("invalid JSON config: {0}")]
    Json(#[from] serde_json::Error),

    #[error("invalid YAML config: {0}")]
    Yaml(#[from] serde_yaml::Error),

    #[error("invalid target URL '{url}': {reason}")]
    InvalidUrl { url: String, reason: String },

    #[error("invalid CSS selector '{selector}': {message}")]
    Selector { selector: String, message: String },

    #[error("{0}")]
    Invalid(String),
}

impl ConfigError {
    pub fn invalid_url(url: impl Into<String>, reason: impl fmt::Display) -> Self {
        Self::InvalidUrl {
            url: url.into(),
            reason: reason.to_string(),
        }
    }

    pub fn selector(selector: impl Into<String>, message: impl fmt::Display) -> Self {
        Self::Selector {
            selector: selector.into(),
            message: message.to_string(),
        }
    }
}

/// Why a single Target produced no headlines.
#[derive(Debug, Error)]
pub enum TargetError {
    #[error(transparent)]
    Fetch(#[from] FetchError),
    #[error(transparent)]
    Extract(#[from] ExtractError),
}
