use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::{Deserialize, Serialize};

use crate::application::{DispatchError, ErrorClass};

const PROBLEM_BASE: &str = "https://mt5-relay.example.com/errors";

/// RFC 9457 problem document.
/// https://www.rfc-editor.org/rfc/rfc9457.html
///
/// Carries `error: true` as an extension member so callers that only test
/// that flag treat transport errors like failed terminal calls.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProblemDetails {
    #[serde(rename = "type")]
    pub type_uri: String,

    pub title: String,

    pub status: u16,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub detail: Option<String>,

    /// The operation path the problem occurred on
    #[serde(skip_serializing_if = "Option::is_none")]
    pub instance: Option<String>,

    pub error: bool,
}

impl ProblemDetails {
    pub fn new(type_uri: impl Into<String>, title: impl Into<String>, status: StatusCode) -> Self {
        Self {
            type_uri: type_uri.into(),
            title: title.into(),
            status: status.as_u16(),
            detail: None,
            instance: None,
            error: true,
        }
    }

    pub fn with_detail(mut self, detail: impl Into<String>) -> Self {
        self.detail = Some(detail.into());
        self
    }

    pub fn with_instance(mut self, instance: impl Into<String>) -> Self {
        self.instance = Some(instance.into());
        self
    }

    fn from_status(slug: &str, status: StatusCode) -> Self {
        Self::new(
            format!("{}/{}", PROBLEM_BASE, slug),
            status.canonical_reason().unwrap_or("Error"),
            status,
        )
    }

    /// 404: no such operation
    pub fn unknown_operation(name: &str) -> Self {
        Self::from_status("unknown-operation", StatusCode::NOT_FOUND)
            .with_detail(format!("Unknown operation '{}'", name))
    }

    /// 400: malformed body or arguments
    pub fn validation_error(detail: impl Into<String>) -> Self {
        Self::from_status("validation", StatusCode::BAD_REQUEST).with_detail(detail)
    }

    /// 500
    pub fn internal_error(detail: impl Into<String>) -> Self {
        Self::from_status("internal", StatusCode::INTERNAL_SERVER_ERROR).with_detail(detail)
    }
}

impl From<DispatchError> for ProblemDetails {
    fn from(err: DispatchError) -> Self {
        match (&err, err.class()) {
            (DispatchError::UnknownOperation(name), _) => Self::unknown_operation(name),
            (_, ErrorClass::Client) => Self::validation_error(err.to_string()),
            (_, ErrorClass::Internal) => Self::internal_error(err.to_string()),
        }
    }
}

impl IntoResponse for ProblemDetails {
    fn into_response(self) -> Response {
        let status = StatusCode::from_u16(self.status).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);

        let mut response = (status, Json(self)).into_response();
        response.headers_mut().insert(
            axum::http::header::CONTENT_TYPE,
            axum::http::HeaderValue::from_static("application/problem+json"),
        );

        response
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_dispatch_error_mapping() {
        let unknown: ProblemDetails = DispatchError::UnknownOperation("nope".into()).into();
        assert_eq!(unknown.status, 404);
        assert_eq!(unknown.title, "Not Found");

        let missing: ProblemDetails = DispatchError::MissingField("symbol").into();
        assert_eq!(missing.status, 400);
        assert_eq!(missing.detail.as_deref(), Some("Missing required field 'symbol'"));

        let internal: ProblemDetails = DispatchError::Internal("boom".into()).into();
        assert_eq!(internal.status, 500);
        assert_eq!(internal.title, "Internal Server Error");
    }

    #[test]
    fn test_serialization_carries_error_flag() {
        let problem = ProblemDetails::validation_error("Request body must be a JSON object")
            .with_instance("/symbol_info");
        let json = serde_json::to_value(&problem).unwrap();

        assert_eq!(json["type"], "https://mt5-relay.example.com/errors/validation");
        assert_eq!(json["status"], 400);
        assert_eq!(json["error"], true);
        assert_eq!(json["instance"], "/symbol_info");
    }
}
