//! Crate-wide error taxonomy.
//!
//! Every failure this layer can produce is a variant here, and each variant
//! maps to exactly one HTTP status through [`Error::status`]. Nothing in the
//! crate classifies failures by inspecting message text.

use std::time::Duration;

use thiserror::Error;

use crate::http::StatusCode;

/// Failures produced while registering routes, ingesting request bodies,
/// serializing responses, or operating on the record store.
#[derive(Debug, Error)]
pub enum Error {
    /// A route path rejected at registration time.
    #[error("invalid route path {path:?}: {reason}")]
    InvalidPath {
        path: String,
        reason: &'static str,
    },

    /// HTML handed to the response helpers failed the well-formedness check.
    #[error("invalid HTML content: {0}")]
    InvalidHtml(&'static str),

    /// The request body was empty or not syntactically valid JSON.
    #[error("Invalid JSON data: {0}")]
    Parse(String),

    /// The body stream failed at the transport level before completing.
    #[error("Request error: {0}")]
    Transport(String),

    /// The body stream did not complete within the configured window.
    #[error("request body timed out after {0:?}")]
    TimedOut(Duration),

    /// The accumulated body exceeded the configured cap.
    #[error("request body exceeds maximum allowed size of {max_bytes} bytes")]
    TooLarge { max_bytes: usize },

    /// A payload that does not deserialize into the expected record shape.
    #[error("the argument is not a valid {expected}: {reason}")]
    InvalidRecord {
        expected: &'static str,
        reason: String,
    },

    /// A store lookup miss.
    #[error("{entity} with id {id} not found")]
    NotFound { entity: &'static str, id: u64 },

    /// An uncaught failure escaping a route handler.
    #[error("{0}")]
    Handler(String),
}

impl Error {
    /// Shorthand for [`Error::InvalidRecord`].
    pub fn invalid_record(expected: &'static str, reason: impl Into<String>) -> Self {
        Self::InvalidRecord {
            expected,
            reason: reason.into(),
        }
    }

    /// Shorthand for [`Error::NotFound`].
    pub fn not_found(entity: &'static str, id: u64) -> Self {
        Self::NotFound { entity, id }
    }

    /// The HTTP status this failure answers with.
    ///
    /// Client-input failures map to 400; everything else, including store
    /// lookup misses, maps to 500. A miss is deliberately not surfaced as
    /// HTTP 404 — that status is reserved for unregistered paths.
    pub fn status(&self) -> StatusCode {
        match self {
            Self::Parse(_) | Self::InvalidRecord { .. } | Self::TooLarge { .. } => {
                StatusCode::BadRequest
            }
            Self::InvalidPath { .. }
            | Self::InvalidHtml(_)
            | Self::Transport(_)
            | Self::TimedOut(_)
            | Self::NotFound { .. }
            | Self::Handler(_) => StatusCode::InternalServerError,
        }
    }

    /// The symbolic status string carried by error envelopes.
    pub fn status_label(&self) -> &'static str {
        match self.status() {
            StatusCode::BadRequest => "BAD_REQUEST",
            _ => "INTERNAL_SERVER_ERROR",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn client_input_failures_are_400() {
        let errors = [
            Error::Parse("unexpected end of input".to_owned()),
            Error::invalid_record("User", "missing field `email`"),
            Error::TooLarge { max_bytes: 1024 },
        ];
        for err in errors {
            assert_eq!(err.status(), StatusCode::BadRequest);
            assert_eq!(err.status_label(), "BAD_REQUEST");
        }
    }

    #[test]
    fn everything_else_is_500() {
        let errors = [
            Error::Transport("connection reset".to_owned()),
            Error::TimedOut(Duration::from_secs(10)),
            Error::not_found("user", 999),
            Error::Handler("boom".to_owned()),
            Error::InvalidHtml("missing tags"),
        ];
        for err in errors {
            assert_eq!(err.status(), StatusCode::InternalServerError);
            assert_eq!(err.status_label(), "INTERNAL_SERVER_ERROR");
        }
    }

    #[test]
    fn parse_message_names_invalid_json() {
        let err = Error::Parse("expected value at line 1".to_owned());
        assert!(err.to_string().contains("Invalid JSON data"));
    }

    #[test]
    fn transport_message_names_request_error() {
        let err = Error::Transport("connection reset".to_owned());
        assert!(err.to_string().contains("Request error"));
    }

    #[test]
    fn not_found_message() {
        let err = Error::not_found("user", 42);
        assert_eq!(err.to_string(), "user with id 42 not found");
    }

    #[test]
    fn invalid_record_message() {
        let err = Error::invalid_record("User", "missing field `name`");
        assert!(err.to_string().contains("not a valid User"));
    }
}
