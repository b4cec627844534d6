//! RFC 9457 Problem Details for resolver failures.
//!
//! AppSync does not expose HTTP status codes to GraphQL clients, but the
//! problem document is still logged. Converted to a Lambda [`Diagnostic`],
//! its kind becomes the GraphQL `errorType` and its `title: detail` rendering
//! the field-scoped error message. See:
//! <https://www.rfc-editor.org/rfc/rfc9457.html>

use http::StatusCode;
use lambda_runtime::Diagnostic;
use serde::{Deserialize, Serialize};

use transiter_proxy_lib::{Error as LibError, UpstreamError, UpstreamErrorKind};

/// Problem type URI for fields this resolver does not handle.
pub const PROBLEM_UNSUPPORTED_FIELD: &str = "/problems/unsupported-field";

/// Problem type URI for missing or malformed query arguments.
pub const PROBLEM_INVALID_ARGUMENT: &str = "/problems/invalid-argument";

/// Problem type URI for an upstream that could not be reached.
pub const PROBLEM_UPSTREAM_UNREACHABLE: &str = "/problems/upstream-unreachable";

/// Problem type URI for an upstream that did not answer within the deadline.
pub const PROBLEM_UPSTREAM_TIMEOUT: &str = "/problems/upstream-timeout";

/// Problem type URI for upstream replies that could not be decoded.
pub const PROBLEM_UPSTREAM_MALFORMED: &str = "/problems/upstream-malformed";

/// Problem type URI for upstream replies refusing the request.
pub const PROBLEM_UPSTREAM_REJECTED: &str = "/problems/upstream-rejected";

/// Problem type URI for internal errors.
pub const PROBLEM_INTERNAL_ERROR: &str = "/problems/internal-error";

/// RFC 9457 Problem Details structure.
///
/// # Example
///
/// ```
/// use transiter_proxy_lambda_shared::{ProblemDetails, PROBLEM_INVALID_ARGUMENT};
///
/// let problem = ProblemDetails::invalid_argument("'lat' must be in [-90, 90]", "req-1");
/// assert_eq!(problem.type_uri, PROBLEM_INVALID_ARGUMENT);
/// assert_eq!(problem.to_string(), "Invalid Argument: 'lat' must be in [-90, 90]");
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProblemDetails {
    /// URI reference identifying the problem type (relative).
    #[serde(rename = "type")]
    pub type_uri: String,

    /// Short, human-readable summary of the problem.
    pub title: String,

    /// Equivalent HTTP status code.
    pub status: u16,

    /// Human-readable explanation specific to this occurrence.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub detail: Option<String>,

    /// The Lambda request id of the failing invocation.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub instance: Option<String>,
}

impl ProblemDetails {
    pub fn new(type_uri: impl Into<String>, title: impl Into<String>, status: StatusCode) -> Self {
        Self {
            type_uri: type_uri.into(),
            title: title.into(),
            status: status.as_u16(),
            detail: None,
            instance: None,
        }
    }

    pub fn with_detail(mut self, detail: impl Into<String>) -> Self {
        self.detail = Some(detail.into());
        self
    }

    pub fn with_request_id(mut self, request_id: impl Into<String>) -> Self {
        self.instance = Some(request_id.into());
        self
    }

    /// The invoked field is not one this resolver serves.
    pub fn unsupported_field(field: &str, request_id: impl Into<String>) -> Self {
        Self::new(
            PROBLEM_UNSUPPORTED_FIELD,
            "Unsupported Field",
            StatusCode::BAD_REQUEST,
        )
        .with_detail(format!("Field '{}' is not resolved by this function", field))
        .with_request_id(request_id)
    }

    pub fn invalid_argument(detail: impl Into<String>, request_id: impl Into<String>) -> Self {
        Self::new(
            PROBLEM_INVALID_ARGUMENT,
            "Invalid Argument",
            StatusCode::BAD_REQUEST,
        )
        .with_detail(detail)
        .with_request_id(request_id)
    }

    pub fn upstream_unreachable(detail: impl Into<String>, request_id: impl Into<String>) -> Self {
        Self::new(
            PROBLEM_UPSTREAM_UNREACHABLE,
            "Upstream Unreachable",
            StatusCode::BAD_GATEWAY,
        )
        .with_detail(detail)
        .with_request_id(request_id)
    }

    pub fn upstream_timeout(detail: impl Into<String>, request_id: impl Into<String>) -> Self {
        Self::new(
            PROBLEM_UPSTREAM_TIMEOUT,
            "Upstream Timeout",
            StatusCode::GATEWAY_TIMEOUT,
        )
        .with_detail(detail)
        .with_request_id(request_id)
    }

    pub fn upstream_malformed(detail: impl Into<String>, request_id: impl Into<String>) -> Self {
        Self::new(
            PROBLEM_UPSTREAM_MALFORMED,
            "Upstream Malformed",
            StatusCode::BAD_GATEWAY,
        )
        .with_detail(detail)
        .with_request_id(request_id)
    }

    pub fn upstream_rejected(detail: impl Into<String>, request_id: impl Into<String>) -> Self {
        Self::new(
            PROBLEM_UPSTREAM_REJECTED,
            "Upstream Rejected",
            StatusCode::BAD_GATEWAY,
        )
        .with_detail(detail)
        .with_request_id(request_id)
    }

    pub fn internal_error(detail: impl Into<String>, request_id: impl Into<String>) -> Self {
        Self::new(
            PROBLEM_INTERNAL_ERROR,
            "Internal Error",
            StatusCode::INTERNAL_SERVER_ERROR,
        )
        .with_detail(detail)
        .with_request_id(request_id)
    }

    /// Short error kind used as the `outcome` of the invocation record.
    pub fn kind(&self) -> &'static str {
        match self.type_uri.as_str() {
            PROBLEM_UNSUPPORTED_FIELD => "UnsupportedField",
            PROBLEM_INVALID_ARGUMENT => "InvalidArgument",
            PROBLEM_UPSTREAM_UNREACHABLE => "UpstreamUnreachable",
            PROBLEM_UPSTREAM_TIMEOUT => "UpstreamTimeout",
            PROBLEM_UPSTREAM_MALFORMED => "UpstreamMalformed",
            PROBLEM_UPSTREAM_REJECTED => "UpstreamRejected",
            _ => "InternalError",
        }
    }
}

impl std::fmt::Display for ProblemDetails {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{}: {}",
            self.title,
            self.detail.as_deref().unwrap_or("")
        )
    }
}

impl std::error::Error for ProblemDetails {}

impl From<ProblemDetails> for Diagnostic {
    fn from(problem: ProblemDetails) -> Self {
        Diagnostic {
            error_type: problem.kind().to_string(),
            error_message: problem.to_string(),
        }
    }
}

/// Map an upstream failure of a whole-query step to its problem kind.
pub fn from_upstream_error(error: &UpstreamError, request_id: &str) -> ProblemDetails {
    let detail = error.to_string();
    match error.kind {
        UpstreamErrorKind::Timeout => ProblemDetails::upstream_timeout(detail, request_id),
        UpstreamErrorKind::Unreachable => ProblemDetails::upstream_unreachable(detail, request_id),
        UpstreamErrorKind::Malformed => ProblemDetails::upstream_malformed(detail, request_id),
        UpstreamErrorKind::NotFound | UpstreamErrorKind::Rejected(_) => {
            ProblemDetails::upstream_rejected(detail, request_id)
        }
    }
}

/// Convert library errors to ProblemDetails.
///
/// The `request_id` must be provided separately since library errors don't have it.
pub fn from_lib_error(error: &LibError, request_id: &str) -> ProblemDetails {
    match error {
        LibError::Upstream(upstream) => from_upstream_error(upstream, request_id),
        LibError::InvalidConfig { message } => ProblemDetails::internal_error(
            format!("Proxy is misconfigured: {}", message),
            request_id,
        ),
        LibError::Http(_) => ProblemDetails::internal_error(error.to_string(), request_id),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_problem_details_new() {
        let problem = ProblemDetails::new(
            PROBLEM_UPSTREAM_TIMEOUT,
            "Upstream Timeout",
            StatusCode::GATEWAY_TIMEOUT,
        );
        assert_eq!(problem.type_uri, PROBLEM_UPSTREAM_TIMEOUT);
        assert_eq!(problem.status, 504);
        assert!(problem.detail.is_none());
    }

    #[test]
    fn test_display_is_title_and_detail() {
        let problem = ProblemDetails::unsupported_field("stationByName", "req-1");
        assert_eq!(
            problem.to_string(),
            "Unsupported Field: Field 'stationByName' is not resolved by this function"
        );
        assert_eq!(problem.kind(), "UnsupportedField");
    }

    #[test]
    fn test_diagnostic_carries_kind_and_message() {
        let diagnostic = Diagnostic::from(ProblemDetails::upstream_timeout(
            "No upstream answer within 100 ms",
            "req-2",
        ));
        assert_eq!(diagnostic.error_type, "UpstreamTimeout");
        assert_eq!(
            diagnostic.error_message,
            "Upstream Timeout: No upstream answer within 100 ms"
        );
    }

    #[test]
    fn test_problem_details_serialization() {
        let problem = ProblemDetails::invalid_argument("'lat' is required", "req-test");
        let json = serde_json::to_string(&problem).unwrap();

        assert!(json.contains("\"type\":\"/problems/invalid-argument\""));
        assert!(json.contains("\"title\":\"Invalid Argument\""));
        assert!(json.contains("\"status\":400"));
        assert!(json.contains("\"instance\":\"req-test\""));
    }

    #[test]
    fn test_upstream_kinds_map_to_problems() {
        let cases = [
            (UpstreamErrorKind::Timeout, "UpstreamTimeout"),
            (UpstreamErrorKind::Unreachable, "UpstreamUnreachable"),
            (UpstreamErrorKind::Malformed, "UpstreamMalformed"),
            (UpstreamErrorKind::NotFound, "UpstreamRejected"),
            (UpstreamErrorKind::Rejected(403), "UpstreamRejected"),
        ];
        for (kind, expected) in cases {
            let problem = from_upstream_error(&UpstreamError::new(kind, "boom"), "req");
            assert_eq!(problem.kind(), expected, "{:?}", kind);
            assert_eq!(problem.instance.as_deref(), Some("req"));
        }
    }

    #[test]
    fn test_from_lib_error_config_is_internal() {
        let error = LibError::InvalidConfig {
            message: "TRANSITER_HOST is empty".to_string(),
        };
        let problem = from_lib_error(&error, "req-cfg");

        assert_eq!(problem.type_uri, PROBLEM_INTERNAL_ERROR);
        assert_eq!(problem.status, 500);
        assert!(problem.detail.unwrap().contains("TRANSITER_HOST"));
    }
}
