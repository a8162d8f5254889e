//! HTTP/1.1 protocol types and parsing.
//!
//! This module provides the primitives the routing layer speaks:
//! [`Method`], [`StatusCode`], [`Headers`], [`Body`], [`Request`], and
//! [`Response`].

use std::fmt;

pub mod body;
pub mod headers;
pub mod request;
pub mod response;

pub use body::{Body, BodySender, ReadLimits};
pub use headers::Headers;
pub use request::Request;
pub use response::Response;

/// The subset of HTTP response status codes this layer emits.
///
/// # Examples
///
/// ```
/// use ruta::http::StatusCode;
///
/// let status = StatusCode::MethodNotAllowed;
/// assert_eq!(status.as_u16(), 405);
/// assert_eq!(status.canonical_reason(), "Method Not Allowed");
/// assert_eq!(StatusCode::from_u16(405), Some(status));
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u16)]
pub enum StatusCode {
    Ok = 200,
    Created = 201,
    BadRequest = 400,
    NotFound = 404,
    MethodNotAllowed = 405,
    PayloadTooLarge = 413,
    InternalServerError = 500,
}

impl StatusCode {
    /// Returns the numeric status code as a `u16`.
    pub fn as_u16(self) -> u16 {
        self as u16
    }

    /// Looks up the variant for a numeric code, if this layer speaks it.
    pub fn from_u16(code: u16) -> Option<Self> {
        match code {
            200 => Some(Self::Ok),
            201 => Some(Self::Created),
            400 => Some(Self::BadRequest),
            404 => Some(Self::NotFound),
            405 => Some(Self::MethodNotAllowed),
            413 => Some(Self::PayloadTooLarge),
            500 => Some(Self::InternalServerError),
            _ => None,
        }
    }

    /// Returns the canonical reason phrase for this status code.
    pub fn canonical_reason(self) -> &'static str {
        match self {
            Self::Ok => "OK",
            Self::Created => "Created",
            Self::BadRequest => "Bad Request",
            Self::NotFound => "Not Found",
            Self::MethodNotAllowed => "Method Not Allowed",
            Self::PayloadTooLarge => "Payload Too Large",
            Self::InternalServerError => "Internal Server Error",
        }
    }
}

impl fmt::Display for StatusCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}", self.as_u16(), self.canonical_reason())
    }
}

impl From<StatusCode> for u16 {
    fn from(code: StatusCode) -> u16 {
        code.as_u16()
    }
}

/// An HTTP request method.
///
/// The four routable methods are unit variants for zero-cost comparison.
/// Anything else arriving on the wire is captured in `Custom`, which can
/// never match a registered route but still participates in the 405 policy.
///
/// # Examples
///
/// ```
/// use ruta::http::Method;
///
/// let method: Method = "GET".parse().unwrap();
/// assert_eq!(method, Method::Get);
/// assert_eq!(method.as_str(), "GET");
///
/// let other: Method = "PATCH".parse().unwrap();
/// assert_eq!(other, Method::Custom("PATCH".to_owned()));
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Method {
    Get,
    Post,
    Put,
    Delete,
    /// Any method outside the routable set.
    Custom(String),
}

impl Method {
    /// Returns the method as a string slice.
    pub fn as_str(&self) -> &str {
        match self {
            Self::Get => "GET",
            Self::Post => "POST",
            Self::Put => "PUT",
            Self::Delete => "DELETE",
            Self::Custom(s) => s.as_str(),
        }
    }
}

impl fmt::Display for Method {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for Method {
    type Err = std::convert::Infallible;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(match s {
            "GET" => Self::Get,
            "POST" => Self::Post,
            "PUT" => Self::Put,
            "DELETE" => Self::Delete,
            other => Self::Custom(other.to_owned()),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn status_round_trips_through_u16() {
        for status in [
            StatusCode::Ok,
            StatusCode::Created,
            StatusCode::BadRequest,
            StatusCode::NotFound,
            StatusCode::MethodNotAllowed,
            StatusCode::PayloadTooLarge,
            StatusCode::InternalServerError,
        ] {
            assert_eq!(StatusCode::from_u16(status.as_u16()), Some(status));
        }
    }

    #[test]
    fn unknown_status_is_none() {
        assert_eq!(StatusCode::from_u16(418), None);
    }

    #[test]
    fn method_parse_and_display() {
        let method: Method = "DELETE".parse().unwrap();
        assert_eq!(method, Method::Delete);
        assert_eq!(method.to_string(), "DELETE");
    }

    #[test]
    fn non_routable_method_is_custom() {
        let method: Method = "OPTIONS".parse().unwrap();
        assert!(matches!(method, Method::Custom(ref s) if s == "OPTIONS"));
    }
}
