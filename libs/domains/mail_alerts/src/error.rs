//! Error types for the mail alerts domain.

use thiserror::Error;

/// Result type for mail alert operations.
pub type MailAlertResult<T> = Result<T, MailAlertError>;

/// Errors that can occur while recording mail outcomes or dispatching alerts.
#[derive(Debug, Error)]
pub enum MailAlertError {
    /// Insert, query or truncate against the log store failed.
    #[error("Storage error: {0}")]
    Storage(String),

    /// The webhook was unreachable, rejected the alert, or the URL is malformed.
    #[error("Dispatch error: {0}")]
    Dispatch(String),

    /// Caller input was rejected before any side effect.
    #[error("Validation error: {0}")]
    Validation(String),

    /// The host mail transport reported a failed send.
    #[error("Transport error: {0}")]
    Transport(String),

    /// A manual alert was requested while no webhook is stored.
    #[error("No webhook URL is configured")]
    WebhookNotConfigured,

    /// Configuration error.
    #[error("Configuration error: {0}")]
    Config(String),

    /// Internal error.
    #[error("Internal error: {0}")]
    Internal(String),
}

impl From<sea_orm::DbErr> for MailAlertError {
    fn from(err: sea_orm::DbErr) -> Self {
        MailAlertError::Storage(err.to_string())
    }
}

impl From<reqwest::Error> for MailAlertError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            MailAlertError::Dispatch(format!("webhook request timed out: {}", err))
        } else if err.is_connect() {
            MailAlertError::Dispatch(format!("webhook unreachable: {}", err))
        } else {
            MailAlertError::Dispatch(err.to_string())
        }
    }
}

impl From<serde_json::Error> for MailAlertError {
    fn from(err: serde_json::Error) -> Self {
        MailAlertError::Internal(format!("JSON serialization error: {}", err))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_db_error_maps_to_storage() {
        let err: MailAlertError = sea_orm::DbErr::Custom("connection refused".to_string()).into();
        assert!(matches!(err, MailAlertError::Storage(_)));
        assert!(err.to_string().contains("connection refused"));
    }

    #[test]
    fn test_not_configured_message() {
        assert_eq!(
            MailAlertError::WebhookNotConfigured.to_string(),
            "No webhook URL is configured"
        );
    }
}
