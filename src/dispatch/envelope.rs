//! The uniform response payload.
//!
//! Every API handler answers with an [`Envelope`]: `{code, status, data}` on
//! success, `{code, status, errors}` on failure. Construction goes through
//! the typed constructors, so a malformed envelope cannot exist — the shape
//! checks the original duck-typed layer performed at serialization time are
//! enforced here at compile time instead.

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::Error;
use crate::http::StatusCode;

/// The `{code, status, data?, errors?}` payload carried by every API response.
///
/// The `code` field doubles as the wire status: [`send_json`](crate::dispatch::send_json)
/// reads it to set the HTTP status line, there is no independent status
/// parameter.
///
/// # Examples
///
/// ```
/// use ruta::Envelope;
/// use serde_json::json;
///
/// let envelope = Envelope::created(json!({"name": "Ada"}));
/// assert_eq!(envelope.code(), 201);
/// assert_eq!(envelope.status(), "STATUS_CREATED");
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Envelope {
    code: u16,
    status: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    data: Option<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    errors: Option<Vec<String>>,
}

impl Envelope {
    /// A `200 STATUS_OK` envelope carrying `data`.
    ///
    /// Pass [`Value::Null`] to answer with an explicit `"data": null`.
    pub fn ok(data: Value) -> Self {
        Self::success(StatusCode::Ok, "STATUS_OK", data)
    }

    /// A `201 STATUS_CREATED` envelope carrying `data`.
    pub fn created(data: Value) -> Self {
        Self::success(StatusCode::Created, "STATUS_CREATED", data)
    }

    fn success(code: StatusCode, status: &str, data: Value) -> Self {
        Self {
            code: code.as_u16(),
            status: status.to_owned(),
            data: Some(data),
            errors: None,
        }
    }

    /// An error envelope for `error`, classified by its kind.
    ///
    /// The status code and symbolic label come from the total mapping on
    /// [`Error`]; the message becomes the single entry of `errors`.
    pub fn failure(error: &Error) -> Self {
        Self {
            code: error.status().as_u16(),
            status: error.status_label().to_owned(),
            data: None,
            errors: Some(vec![error.to_string()]),
        }
    }

    /// The numeric status code this envelope will be served with.
    pub fn code(&self) -> u16 {
        self.code
    }

    /// The wire status corresponding to [`Envelope::code`].
    pub fn status_code(&self) -> StatusCode {
        StatusCode::from_u16(self.code).unwrap_or(StatusCode::InternalServerError)
    }

    /// The symbolic status string (`STATUS_OK`, `BAD_REQUEST`, …).
    pub fn status(&self) -> &str {
        &self.status
    }

    /// The success payload, if any.
    pub fn data(&self) -> Option<&Value> {
        self.data.as_ref()
    }

    /// The failure messages, if any.
    pub fn errors(&self) -> Option<&[String]> {
        self.errors.as_deref()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn ok_envelope_shape() {
        let envelope = Envelope::ok(json!([1, 2]));
        let text = serde_json::to_string(&envelope).unwrap();
        assert_eq!(
            text,
            r#"{"code":200,"status":"STATUS_OK","data":[1,2]}"#
        );
    }

    #[test]
    fn explicit_null_data_is_serialized() {
        let envelope = Envelope::ok(Value::Null);
        let text = serde_json::to_string(&envelope).unwrap();
        assert!(text.contains(r#""data":null"#));
    }

    #[test]
    fn failure_envelope_carries_the_message() {
        let err = Error::not_found("user", 999);
        let envelope = Envelope::failure(&err);

        assert_eq!(envelope.code(), 500);
        assert_eq!(envelope.status(), "INTERNAL_SERVER_ERROR");
        assert_eq!(envelope.data(), None);
        assert_eq!(
            envelope.errors(),
            Some(&["user with id 999 not found".to_owned()][..])
        );

        let text = serde_json::to_string(&envelope).unwrap();
        assert!(!text.contains("data"));
    }

    #[test]
    fn client_input_failure_is_bad_request() {
        let err = Error::Parse("unexpected end of input".to_owned());
        let envelope = Envelope::failure(&err);
        assert_eq!(envelope.code(), 400);
        assert_eq!(envelope.status(), "BAD_REQUEST");
        assert_eq!(envelope.status_code(), StatusCode::BadRequest);
    }

    #[test]
    fn round_trips_through_serde() {
        let envelope = Envelope::created(json!({"name": "Ada", "email": "ada@example.com"}));
        let text = serde_json::to_string(&envelope).unwrap();
        let parsed: Envelope = serde_json::from_str(&text).unwrap();
        assert_eq!(parsed, envelope);
    }
}
