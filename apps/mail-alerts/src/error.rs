//! HTTP error responses.

use axum::{
    Json,
    extract::rejection::{JsonRejection, QueryRejection},
    http::StatusCode,
    response::{IntoResponse, Response},
};
use domain_mail_alerts::{AdminNotice, MailAlertError};
use serde::Serialize;
use thiserror::Error;

const INTERNAL_ERROR_MESSAGE: &str = "An internal server error occurred";

/// Error body returned by every endpoint.
///
/// ```json
/// { "code": 1004, "error": "WEBHOOK_NOT_CONFIGURED", "message": "Please configure a webhook URL first." }
/// ```
#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub code: i32,
    pub error: &'static str,
    pub message: String,
}

#[derive(Debug, Error)]
pub enum ApiError {
    #[error(transparent)]
    Domain(#[from] MailAlertError),

    #[error("JSON extraction error: {0}")]
    Json(#[from] JsonRejection),

    #[error("Query extraction error: {0}")]
    Query(#[from] QueryRejection),
}

impl ApiError {
    fn parts(&self) -> (StatusCode, i32, &'static str) {
        match self {
            ApiError::Json(_) | ApiError::Query(_) => (StatusCode::BAD_REQUEST, 1000, "BAD_REQUEST"),
            ApiError::Domain(err) => match err {
                MailAlertError::Validation(_) => (StatusCode::BAD_REQUEST, 1001, "VALIDATION_ERROR"),
                MailAlertError::WebhookNotConfigured => {
                    (StatusCode::CONFLICT, 1004, "WEBHOOK_NOT_CONFIGURED")
                }
                MailAlertError::Dispatch(_) => (StatusCode::BAD_GATEWAY, 1005, "DISPATCH_FAILED"),
                MailAlertError::Transport(_) => (StatusCode::BAD_GATEWAY, 1006, "TRANSPORT_FAILED"),
                MailAlertError::Storage(_) => {
                    (StatusCode::INTERNAL_SERVER_ERROR, 1007, "STORAGE_ERROR")
                }
                MailAlertError::Config(_) | MailAlertError::Internal(_) => {
                    (StatusCode::INTERNAL_SERVER_ERROR, 1099, "INTERNAL_ERROR")
                }
            },
        }
    }

    fn message(&self) -> String {
        match self {
            ApiError::Json(rejection) => rejection.body_text(),
            ApiError::Query(rejection) => rejection.body_text(),
            ApiError::Domain(
                MailAlertError::Storage(_) | MailAlertError::Config(_) | MailAlertError::Internal(_),
            ) => INTERNAL_ERROR_MESSAGE.to_string(),
            ApiError::Domain(err) => AdminNotice::from_error(err).message,
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, code, error) = self.parts();

        if status.is_server_error() {
            tracing::error!(error_code = code, error = %self, "Request failed");
        } else {
            tracing::debug!(error_code = code, error = %self, "Request rejected");
        }

        let body = ErrorResponse {
            code,
            error,
            message: self.message(),
        };

        (status, Json(body)).into_response()
    }
}

pub type ApiResult<T> = Result<T, ApiError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_mapping() {
        let cases = [
            (MailAlertError::Validation("bad".into()), StatusCode::BAD_REQUEST),
            (MailAlertError::WebhookNotConfigured, StatusCode::CONFLICT),
            (MailAlertError::Dispatch("500".into()), StatusCode::BAD_GATEWAY),
            (MailAlertError::Transport("refused".into()), StatusCode::BAD_GATEWAY),
            (MailAlertError::Storage("down".into()), StatusCode::INTERNAL_SERVER_ERROR),
        ];

        for (err, expected) in cases {
            let response = ApiError::from(err).into_response();
            assert_eq!(response.status(), expected);
        }
    }

    #[test]
    fn test_storage_details_are_not_exposed() {
        let err = ApiError::from(MailAlertError::Storage("password=hunter2".into()));
        assert_eq!(err.message(), INTERNAL_ERROR_MESSAGE);
    }

    #[test]
    fn test_operator_notice_is_the_message() {
        let err = ApiError::from(MailAlertError::WebhookNotConfigured);
        assert_eq!(err.message(), "Please configure a webhook URL first.");
    }
}
