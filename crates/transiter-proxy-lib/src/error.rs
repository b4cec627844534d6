use std::fmt;

use thiserror::Error;

/// Convenient result alias for the proxy library.
pub type Result<T> = std::result::Result<T, Error>;

/// Top-level library error type.
#[derive(Debug, Error)]
pub enum Error {
    /// Raised when the upstream client configuration is unusable.
    #[error("invalid upstream configuration: {message}")]
    InvalidConfig { message: String },

    /// A single-call upstream step failed; no partial answer is possible.
    #[error(transparent)]
    Upstream(#[from] UpstreamError),

    /// Wrapper for HTTP client construction errors.
    #[error(transparent)]
    Http(#[from] reqwest::Error),
}

/// Classification of a failed upstream call.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UpstreamErrorKind {
    /// The upstream answered 404 for the requested stop or route.
    NotFound,
    /// The call did not complete within the per-call timeout.
    Timeout,
    /// The response body could not be decoded.
    Malformed,
    /// Connection failure or a 5xx answer.
    Unreachable,
    /// Any other 4xx answer; carries the status code.
    Rejected(u16),
}

impl UpstreamErrorKind {
    /// Whether a second attempt may succeed.
    pub fn is_transient(self) -> bool {
        matches!(self, UpstreamErrorKind::Timeout | UpstreamErrorKind::Unreachable)
    }

    /// Short machine-readable label used in log records.
    pub fn label(self) -> &'static str {
        match self {
            UpstreamErrorKind::NotFound => "not-found",
            UpstreamErrorKind::Timeout => "timeout",
            UpstreamErrorKind::Malformed => "malformed-response",
            UpstreamErrorKind::Unreachable => "unreachable",
            UpstreamErrorKind::Rejected(_) => "rejected",
        }
    }
}

impl fmt::Display for UpstreamErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            UpstreamErrorKind::Rejected(status) => write!(f, "rejected with status {}", status),
            other => f.write_str(other.label()),
        }
    }
}

/// A failed call against the upstream transit service.
#[derive(Debug, Clone, Error)]
#[error("upstream {kind}{}: {message}", format_target(.target))]
pub struct UpstreamError {
    pub kind: UpstreamErrorKind,
    /// Stop or route identifier the call was about, when applicable.
    pub target: Option<String>,
    pub message: String,
}

impl UpstreamError {
    pub fn new(kind: UpstreamErrorKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            target: None,
            message: message.into(),
        }
    }

    pub fn with_target(mut self, target: impl Into<String>) -> Self {
        self.target = Some(target.into());
        self
    }

    pub fn not_found(target: impl Into<String>) -> Self {
        Self::new(UpstreamErrorKind::NotFound, "resource does not exist").with_target(target)
    }

    pub fn is_transient(&self) -> bool {
        self.kind.is_transient()
    }
}

fn format_target(target: &Option<String>) -> String {
    match target {
        Some(id) => format!(" for '{}'", id),
        None => String::new(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn transient_kinds() {
        assert!(UpstreamErrorKind::Timeout.is_transient());
        assert!(UpstreamErrorKind::Unreachable.is_transient());
        assert!(!UpstreamErrorKind::NotFound.is_transient());
        assert!(!UpstreamErrorKind::Malformed.is_transient());
        assert!(!UpstreamErrorKind::Rejected(400).is_transient());
    }

    #[test]
    fn display_includes_target() {
        let err = UpstreamError::not_found("6X");
        let text = err.to_string();
        assert!(text.contains("not-found"));
        assert!(text.contains("'6X'"));

        let err = UpstreamError::new(UpstreamErrorKind::Rejected(400), "bad latitude");
        assert_eq!(err.to_string(), "upstream rejected with status 400: bad latitude");
    }
}
