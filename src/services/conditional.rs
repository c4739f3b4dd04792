//! Conditional request handling for a prepared representation.
//!
//! Evaluates `If-Match`, `If-Unmodified-Since`, `If-None-Match` and
//! `If-Modified-Since` against the ETag and last-modified time and produces a
//! `200 OK`, `304 Not Modified` or `412 Precondition Failed` response.
//! Dates are compared at second precision since that is all HTTP dates carry.

use crate::services::response_builder::{EncodingError, PreparedObject};
use axum::{
    body::Body,
    http::{HeaderMap, HeaderValue, Method, StatusCode, header},
    response::Response,
};
use chrono::{DateTime, Utc};
use httpdate::parse_http_date;
use std::time::UNIX_EPOCH;
use tracing::debug;

/// Outcome of a single precondition header.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum Condition {
    /// Header absent or not applicable.
    None,
    True,
    False,
}

/// Produce the final response for `prepared`, honoring the request's
/// validators. Nothing is sent before this point, so a failure here still
/// results in a clean error response.
pub fn respond(
    method: &Method,
    request: &HeaderMap,
    prepared: PreparedObject,
) -> Result<Response, EncodingError> {
    let mut headers = prepared.headers()?;
    if let Some(modified) = prepared.last_modified {
        headers.insert(
            header::LAST_MODIFIED,
            HeaderValue::from_str(&http_date(modified))?,
        );
    }

    let status = evaluate(method, request, &prepared.etag, prepared.last_modified);

    let body = match status {
        StatusCode::NOT_MODIFIED => {
            debug!("validators matched, not modified");
            headers.remove(header::CONTENT_TYPE);
            headers.remove(header::CONTENT_ENCODING);
            headers.remove(header::LAST_MODIFIED);
            Body::empty()
        }
        StatusCode::PRECONDITION_FAILED => {
            debug!("precondition failed");
            Body::empty()
        }
        _ => Body::from(prepared.body),
    };

    let mut response = Response::new(body);
    *response.status_mut() = status;
    *response.headers_mut() = headers;
    Ok(response)
}

fn evaluate(
    method: &Method,
    request: &HeaderMap,
    etag: &str,
    modified: Option<DateTime<Utc>>,
) -> StatusCode {
    let mut check = if_match(request, etag);
    if check == Condition::None {
        check = if_unmodified_since(request, modified);
    }
    if check == Condition::False {
        return StatusCode::PRECONDITION_FAILED;
    }

    let safe = *method == Method::GET || *method == Method::HEAD;
    match if_none_match(request, etag) {
        Condition::False if safe => StatusCode::NOT_MODIFIED,
        Condition::False => StatusCode::PRECONDITION_FAILED,
        Condition::None if safe && if_modified_since(request, modified) == Condition::False => {
            StatusCode::NOT_MODIFIED
        }
        _ => StatusCode::OK,
    }
}

fn header_str<'h>(request: &'h HeaderMap, name: header::HeaderName) -> Option<&'h str> {
    request
        .get(name)
        .and_then(|value| value.to_str().ok())
        .map(str::trim)
        .filter(|value| !value.is_empty())
}

fn if_match(request: &HeaderMap, etag: &str) -> Condition {
    let Some(value) = header_str(request, header::IF_MATCH) else {
        return Condition::None;
    };
    let matched = value
        .split(',')
        .map(str::trim)
        .any(|candidate| candidate == "*" || strong_match(candidate, etag));
    if matched {
        Condition::True
    } else {
        Condition::False
    }
}

fn if_none_match(request: &HeaderMap, etag: &str) -> Condition {
    let Some(value) = header_str(request, header::IF_NONE_MATCH) else {
        return Condition::None;
    };
    let matched = value
        .split(',')
        .map(str::trim)
        .any(|candidate| candidate == "*" || weak_match(candidate, etag));
    if matched {
        Condition::False
    } else {
        Condition::True
    }
}

fn if_unmodified_since(request: &HeaderMap, modified: Option<DateTime<Utc>>) -> Condition {
    let (Some(value), Some(modified)) = (header_str(request, header::IF_UNMODIFIED_SINCE), modified)
    else {
        return Condition::None;
    };
    let Some(since) = parse_secs(value) else {
        return Condition::None;
    };
    if modified.timestamp() <= since {
        Condition::True
    } else {
        Condition::False
    }
}

fn if_modified_since(request: &HeaderMap, modified: Option<DateTime<Utc>>) -> Condition {
    let (Some(value), Some(modified)) = (header_str(request, header::IF_MODIFIED_SINCE), modified)
    else {
        return Condition::None;
    };
    let Some(since) = parse_secs(value) else {
        return Condition::None;
    };
    if modified.timestamp() <= since {
        Condition::False
    } else {
        Condition::True
    }
}

/// IMF-fixdate rendering of `time`. Unlike `httpdate::fmt_http_date` this
/// accepts any instant, including ones before 1970.
fn http_date(time: DateTime<Utc>) -> String {
    time.format("%a, %d %b %Y %H:%M:%S GMT").to_string()
}

fn parse_secs(value: &str) -> Option<i64> {
    let time = parse_http_date(value).ok()?;
    let secs = time.duration_since(UNIX_EPOCH).ok()?.as_secs();
    i64::try_from(secs).ok()
}

fn strong_match(candidate: &str, etag: &str) -> bool {
    !candidate.starts_with("W/") && !etag.starts_with("W/") && candidate == etag
}

fn weak_match(candidate: &str, etag: &str) -> bool {
    candidate.trim_start_matches("W/") == etag.trim_start_matches("W/")
}
