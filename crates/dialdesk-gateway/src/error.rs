// SPDX-FileCopyrightText: 2026 Dialdesk Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Mapping from [`DialdeskError`] to HTTP responses.
//!
//! Every error body carries a `detail` string. Validation failures also
//! list each violated field under `errors`.

use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde::Serialize;

use dialdesk_core::{DialdeskError, FieldError, FieldErrorCode, ValidationErrors};

/// Error body returned by every failing endpoint.
#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub detail: String,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub errors: Vec<FieldError>,
}

/// A handler error. Wraps the service error so `?` works in handlers.
#[derive(Debug)]
pub struct ApiError(pub DialdeskError);

impl ApiError {
    /// A 422 for a single malformed request parameter.
    pub fn invalid_param(field: &str, message: impl Into<String>) -> Self {
        let mut errors = ValidationErrors::new();
        errors.push(field, FieldErrorCode::Malformed, message);
        Self(errors.into())
    }

    pub fn status(&self) -> StatusCode {
        match &self.0 {
            DialdeskError::Validation(_) => StatusCode::UNPROCESSABLE_ENTITY,
            DialdeskError::NotFound { .. } => StatusCode::NOT_FOUND,
            DialdeskError::Conflict { .. }
            | DialdeskError::InvalidTransition(_)
            | DialdeskError::InUse(_) => StatusCode::CONFLICT,
            DialdeskError::Telephony { .. } | DialdeskError::Timeout { .. } => {
                StatusCode::BAD_GATEWAY
            }
            DialdeskError::Config(_)
            | DialdeskError::Storage { .. }
            | DialdeskError::HealthCheckFailed { .. }
            | DialdeskError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl From<DialdeskError> for ApiError {
    fn from(err: DialdeskError) -> Self {
        Self(err)
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        if status.is_server_error() {
            tracing::error!(status = %status, error = %self.0, "request failed");
        }

        let errors = match &self.0 {
            DialdeskError::Validation(v) => v.errors.clone(),
            _ => Vec::new(),
        };
        let detail = if status == StatusCode::INTERNAL_SERVER_ERROR {
            "internal server error".to_string()
        } else {
            self.0.to_string()
        };
        (status, Json(ErrorResponse { detail, errors })).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use dialdesk_core::{CallId, CallStatus, TransitionError};

    #[test]
    fn errors_map_to_status_codes() {
        let cases = [
            (
                DialdeskError::NotFound {
                    entity: "contact",
                    id: 1,
                },
                StatusCode::NOT_FOUND,
            ),
            (
                DialdeskError::Conflict {
                    call_id: CallId(1),
                    expected_revision: 2,
                },
                StatusCode::CONFLICT,
            ),
            (
                TransitionError::NotCancellable {
                    status: CallStatus::Completed,
                }
                .into(),
                StatusCode::CONFLICT,
            ),
            (DialdeskError::InUse("busy".into()), StatusCode::CONFLICT),
            (
                DialdeskError::Telephony {
                    message: "down".into(),
                    source: None,
                },
                StatusCode::BAD_GATEWAY,
            ),
            (
                DialdeskError::Internal("boom".into()),
                StatusCode::INTERNAL_SERVER_ERROR,
            ),
        ];
        for (err, expected) in cases {
            assert_eq!(ApiError(err).status(), expected);
        }
    }

    #[test]
    fn invalid_param_is_unprocessable() {
        let err = ApiError::invalid_param("status", "unknown status 'done'");
        assert_eq!(err.status(), StatusCode::UNPROCESSABLE_ENTITY);
    }

    #[test]
    fn validation_body_lists_fields() {
        let mut errors = ValidationErrors::new();
        errors.push("name", FieldErrorCode::Required, "name is required");
        errors.push("phone", FieldErrorCode::Malformed, "invalid phone number");
        let body = ErrorResponse {
            detail: errors.to_string(),
            errors: errors.errors.clone(),
        };
        let json = serde_json::to_value(&body).unwrap();
        assert_eq!(json["errors"][0]["field"], "name");
        assert_eq!(json["errors"][1]["code"], "malformed");
        assert!(json["detail"].as_str().unwrap().contains("phone"));
    }

    #[test]
    fn non_validation_body_omits_field_list() {
        let body = ErrorResponse {
            detail: "contact 1 not found".to_string(),
            errors: Vec::new(),
        };
        let json = serde_json::to_value(&body).unwrap();
        assert!(json.get("errors").is_none());
    }
}
