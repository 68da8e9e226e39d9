//! Response-body parsers, one per endpoint.
//!
//! Every function here is pure: body in, typed structure out. Optional
//! fields the server omitted (or sent as empty elements) come back as
//! `None`; the parsers never invent placeholder values. Anything that does
//! not match the endpoint's documented shape is a
//! [`Parse`](crate::ApiError::Parse) error.

pub mod json4;
pub mod xml3;

use chrono::{DateTime, Utc};

use dor_types::RepositoryInfo;

use crate::error::{ApiError, ApiResult};

/// Parse a repository timestamp (RFC 3339 with fractional seconds).
pub fn parse_datetime(s: &str) -> ApiResult<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(s)
        .map(|dt| dt.with_timezone(&Utc))
        .map_err(|_| ApiError::Parse(format!("invalid timestamp: {s}")))
}

/// Normalize element text: surrounding whitespace dropped, empty text is an
/// absent value.
pub fn opt_text(s: &str) -> Option<String> {
    let trimmed = s.trim();
    if trimmed.is_empty() {
        None
    } else {
        Some(trimmed.to_string())
    }
}

/// Parse a describe document of either dialect by sniffing the body.
///
/// Generation-3 servers answer the describe endpoint with XML regardless of
/// the Accept header; generation-4 servers answer with JSON. This is the
/// one place the binding has to look before it knows who it is talking to.
pub fn describe_any(body: &str) -> ApiResult<RepositoryInfo> {
    if body.trim_start().starts_with('{') {
        json4::describe(body)
    } else {
        xml3::describe(body)
    }
}
