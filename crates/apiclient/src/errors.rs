//! Error taxonomy for StorageOS API calls.
//!
//! Transport implementations report failures as [`TransportError`], which keeps
//! whatever response metadata (HTTP status plus error payload) was available.
//! [`map_transport_error`] converts those into the closed set of domain kinds
//! in [`ApiError`]. Errors the mapping does not recognise are passed through
//! unchanged as [`ApiError::Transport`]; nothing is swallowed.
//!
//! | Status | Domain kind |
//! |--------|-------------|
//! | 400 | [`ApiError::BadRequest`] |
//! | 401 | [`ApiError::Authentication`] |
//! | 403 | [`ApiError::Unauthorised`] |
//! | 404 | [`ApiError::NotFound`] |
//! | 409 | [`ApiError::Conflict`] |
//! | 412 | [`ApiError::StaleWrite`] |
//! | 422 | [`ApiError::InvalidStateTransition`] |
//! | 451 | [`ApiError::LicenceCapability`] |
//! | 500 | [`ApiError::Server`] |
//! | 503 | [`ApiError::Store`] |

use std::time::Duration;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::ResourceKind;

// ---------------------------------------------------------------------------
// Transport-level errors
// ---------------------------------------------------------------------------

/// Body of an error response, as far as the transport could decode it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum ErrorPayload {
    /// The API's structured `{"error": "..."}` document.
    Structured { error: String },
    /// Anything else; the raw body text.
    Raw(String),
}

impl ErrorPayload {
    /// Human-readable detail carried by the payload. Empty text yields `None`.
    pub fn details(&self) -> Option<&str> {
        let text = match self {
            Self::Structured { error } => error.as_str(),
            Self::Raw(body) => body.trim(),
        };
        if text.is_empty() {
            None
        } else {
            Some(text)
        }
    }
}

/// Failure reported by a [`crate::Transport`] implementation.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TransportError {
    /// The API answered with a non-success status.
    #[error("API responded with status {status}: {}", .payload.details().unwrap_or("no details"))]
    Response {
        /// HTTP status code of the response.
        status: u16,
        /// Decoded error body.
        payload: ErrorPayload,
    },

    /// The request did not produce a response (connection, TLS, timeout).
    #[error("request failed: {message}")]
    Request { message: String },

    /// A response arrived but could not be decoded.
    #[error("failed to decode response: {message}")]
    Decode { message: String },
}

// ---------------------------------------------------------------------------
// Domain errors
// ---------------------------------------------------------------------------

/// Fieldless discriminant of [`ApiError`], for exit-code tables and metrics.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorKind {
    BadRequest,
    Authentication,
    Unauthorised,
    NotFound,
    Conflict,
    StaleWrite,
    InvalidStateTransition,
    LicenceCapability,
    Server,
    Store,
    AmbiguousName,
    DeadlineExceeded,
    Cancelled,
    Transport,
}

/// Every failure a [`crate::Client`] call can produce.
///
/// The first ten variants form the closed taxonomy produced by
/// [`map_transport_error`]. Each carries the detail string extracted from the
/// response payload; `Display` falls back to a fixed message when it is absent.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ApiError {
    /// The request was malformed or failed validation.
    #[error("{}", .details.as_deref().unwrap_or("bad request"))]
    BadRequest { details: Option<String> },

    /// Credentials were missing, expired or invalid.
    #[error("{}", .details.as_deref().unwrap_or("authentication failed"))]
    Authentication { details: Option<String> },

    /// The authenticated user lacks permission for the operation.
    #[error("{}", .details.as_deref().unwrap_or("unauthorised to perform operation"))]
    Unauthorised { details: Option<String> },

    /// A resource involved in the request does not exist.
    #[error("{}", .details.as_deref().unwrap_or("not found"))]
    NotFound { details: Option<String> },

    /// The request conflicts with current state (e.g. a duplicate name).
    #[error("{}", .details.as_deref().unwrap_or("conflict"))]
    Conflict { details: Option<String> },

    /// The supplied version token no longer matches the resource.
    #[error("{}", .details.as_deref().unwrap_or("stale write: resource version does not match"))]
    StaleWrite { details: Option<String> },

    /// The resource is not in a state that permits the operation.
    #[error("{}", .details.as_deref().unwrap_or("invalid state transition"))]
    InvalidStateTransition { details: Option<String> },

    /// The cluster licence does not permit the operation.
    #[error("{}", .details.as_deref().unwrap_or("operation not permitted by licence"))]
    LicenceCapability { details: Option<String> },

    /// The API server failed internally.
    #[error("{}", .details.as_deref().unwrap_or("internal server error"))]
    Server { details: Option<String> },

    /// The API's backing store is unavailable.
    #[error("{}", .details.as_deref().unwrap_or("store unavailable"))]
    Store { details: Option<String> },

    /// Name resolution matched more than one resource.
    #[error("{kind} name {name} is ambiguous: {matches} resources share it")]
    AmbiguousName {
        kind: ResourceKind,
        name: String,
        matches: usize,
    },

    /// The caller's deadline elapsed before the operation finished.
    #[error("timed out performing {operation} after {}s", .timeout.as_secs_f64())]
    DeadlineExceeded {
        operation: &'static str,
        timeout: Duration,
    },

    /// The caller cancelled the operation.
    #[error("{operation} was cancelled")]
    Cancelled { operation: &'static str },

    /// A transport failure the taxonomy does not recognise, unchanged.
    #[error(transparent)]
    Transport(TransportError),
}

impl ApiError {
    /// Returns the discriminant of this error.
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::BadRequest { .. } => ErrorKind::BadRequest,
            Self::Authentication { .. } => ErrorKind::Authentication,
            Self::Unauthorised { .. } => ErrorKind::Unauthorised,
            Self::NotFound { .. } => ErrorKind::NotFound,
            Self::Conflict { .. } => ErrorKind::Conflict,
            Self::StaleWrite { .. } => ErrorKind::StaleWrite,
            Self::InvalidStateTransition { .. } => ErrorKind::InvalidStateTransition,
            Self::LicenceCapability { .. } => ErrorKind::LicenceCapability,
            Self::Server { .. } => ErrorKind::Server,
            Self::Store { .. } => ErrorKind::Store,
            Self::AmbiguousName { .. } => ErrorKind::AmbiguousName,
            Self::DeadlineExceeded { .. } => ErrorKind::DeadlineExceeded,
            Self::Cancelled { .. } => ErrorKind::Cancelled,
            Self::Transport(_) => ErrorKind::Transport,
        }
    }

    /// Builds the [`ApiError::NotFound`] reported when a lookup key matches
    /// nothing.
    pub fn resource_not_found(kind: ResourceKind, key: impl std::fmt::Display) -> Self {
        Self::NotFound {
            details: Some(format!("{kind} {key} not found")),
        }
    }
}

impl From<TransportError> for ApiError {
    fn from(err: TransportError) -> Self {
        map_transport_error(err)
    }
}

/// Maps a transport failure onto the domain taxonomy.
///
/// Pure: the result depends only on `err`. Errors without response metadata,
/// and responses whose status is not in the table, come back as
/// [`ApiError::Transport`] carrying the original error.
pub fn map_transport_error(err: TransportError) -> ApiError {
    let (status, payload) = match &err {
        TransportError::Response { status, payload } => (*status, payload),
        TransportError::Request { .. } | TransportError::Decode { .. } => {
            return ApiError::Transport(err)
        }
    };

    let details = payload.details().map(str::to_owned);

    match status {
        // 4XX
        400 => ApiError::BadRequest { details },
        401 => ApiError::Authentication { details },
        403 => ApiError::Unauthorised { details },
        404 => ApiError::NotFound { details },
        409 => ApiError::Conflict { details },
        412 => ApiError::StaleWrite { details },
        422 => ApiError::InvalidStateTransition { details },
        451 => ApiError::LicenceCapability { details },

        // 5XX
        500 => ApiError::Server { details },
        503 => ApiError::Store { details },

        _ => ApiError::Transport(err),
    }
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;

    fn response(status: u16, error: &str) -> TransportError {
        TransportError::Response {
            status,
            payload: ErrorPayload::Structured {
                error: error.to_string(),
            },
        }
    }

    #[test]
    fn every_mapped_status_yields_its_kind() {
        let table = [
            (400, ErrorKind::BadRequest),
            (401, ErrorKind::Authentication),
            (403, ErrorKind::Unauthorised),
            (404, ErrorKind::NotFound),
            (409, ErrorKind::Conflict),
            (412, ErrorKind::StaleWrite),
            (422, ErrorKind::InvalidStateTransition),
            (451, ErrorKind::LicenceCapability),
            (500, ErrorKind::Server),
            (503, ErrorKind::Store),
        ];

        for (status, want) in table {
            let got = map_transport_error(response(status, "details"));
            assert_eq!(got.kind(), want, "status {status}");
            assert_eq!(got.to_string(), "details", "status {status}");
        }
    }

    #[test]
    fn unmapped_status_is_returned_unchanged() {
        for status in [200, 302, 405, 418, 429, 502, 504] {
            let err = response(status, "teapot");
            assert_eq!(map_transport_error(err.clone()), ApiError::Transport(err));
        }
    }

    #[test]
    fn errors_without_response_metadata_pass_through() {
        let request = TransportError::Request {
            message: "connection refused".into(),
        };
        let decode = TransportError::Decode {
            message: "expected value at line 1".into(),
        };

        assert_eq!(
            map_transport_error(request.clone()),
            ApiError::Transport(request)
        );
        assert_eq!(
            map_transport_error(decode.clone()),
            ApiError::Transport(decode)
        );
    }

    #[test]
    fn raw_payload_is_used_as_details() {
        let err = TransportError::Response {
            status: 409,
            payload: ErrorPayload::Raw("  name already in use\n".into()),
        };
        assert_eq!(
            map_transport_error(err),
            ApiError::Conflict {
                details: Some("name already in use".into())
            }
        );
    }

    #[test]
    fn missing_details_fall_back_to_default_message() {
        let err = TransportError::Response {
            status: 412,
            payload: ErrorPayload::Raw(String::new()),
        };
        let mapped = map_transport_error(err);
        assert_eq!(mapped, ApiError::StaleWrite { details: None });
        assert_eq!(
            mapped.to_string(),
            "stale write: resource version does not match"
        );
        assert_eq!(
            ApiError::NotFound { details: None }.to_string(),
            "not found"
        );
    }

    #[test]
    fn mapping_is_deterministic() {
        let err = response(422, "volume is attached");
        assert_eq!(
            map_transport_error(err.clone()),
            map_transport_error(err)
        );
    }
}
