//! Administrative operations: browsing and clearing the log, webhook settings and
//! manual test sends.

use crate::dispatcher::{DispatchOutcome, FailureAlert, FailureNotifier};
use crate::error::{MailAlertError, MailAlertResult};
use crate::models::{MailAttempt, OutgoingMail};
use crate::repository::{DEFAULT_LIST_LIMIT, MailLogRepository};
use crate::settings::{SettingsStore, normalize_webhook_url};
use crate::transport::MailTransport;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::{info, instrument, warn};
use validator::ValidateEmail;

pub const TEST_EMAIL_SUBJECT: &str = "Test Email from Mail Alerts";
pub const TEST_EMAIL_BODY: &str =
    "This is a test email to verify your mail configuration is working correctly.";
pub const TEST_ALERT_RECIPIENT: &str = "test@example.com";
pub const TEST_ALERT_SUBJECT: &str = "Test Alert from Mail Alerts";
pub const TEST_ALERT_ERROR: &str =
    "This is a test alert to verify your webhook is configured correctly.";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum NoticeLevel {
    Success,
    Error,
}

/// Operator-facing result of an administrative action.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AdminNotice {
    pub level: NoticeLevel,
    pub message: String,
}

impl AdminNotice {
    pub fn success(message: impl Into<String>) -> Self {
        Self {
            level: NoticeLevel::Success,
            message: message.into(),
        }
    }

    pub fn error(message: impl Into<String>) -> Self {
        Self {
            level: NoticeLevel::Error,
            message: message.into(),
        }
    }

    /// Notice shown to the operator when an action fails with `err`.
    pub fn from_error(err: &MailAlertError) -> Self {
        match err {
            MailAlertError::Validation(message) | MailAlertError::Transport(message) => {
                Self::error(message.clone())
            }
            MailAlertError::WebhookNotConfigured => {
                Self::error("Please configure a webhook URL first.")
            }
            MailAlertError::Dispatch(_) => {
                Self::error("Failed to send alert. Please check your webhook URL.")
            }
            other => Self::error(other.to_string()),
        }
    }
}

/// Backing service for the administrative surface.
#[derive(Clone)]
pub struct MailAlertsAdmin {
    repository: Arc<dyn MailLogRepository>,
    settings: Arc<dyn SettingsStore>,
    notifier: Arc<dyn FailureNotifier>,
    transport: Arc<dyn MailTransport>,
}

impl MailAlertsAdmin {
    pub fn new(
        repository: Arc<dyn MailLogRepository>,
        settings: Arc<dyn SettingsStore>,
        notifier: Arc<dyn FailureNotifier>,
        transport: Arc<dyn MailTransport>,
    ) -> Self {
        Self {
            repository,
            settings,
            notifier,
            transport,
        }
    }

    /// Most recent attempts, [`DEFAULT_LIST_LIMIT`] when no limit is given.
    pub async fn recent_logs(&self, limit: Option<u64>) -> MailAlertResult<Vec<MailAttempt>> {
        self.repository
            .list_recent(limit.unwrap_or(DEFAULT_LIST_LIMIT))
            .await
    }

    #[instrument(skip(self))]
    pub async fn clear_logs(&self) -> MailAlertResult<AdminNotice> {
        let removed = self.repository.clear_all().await?;
        info!(removed, "Mail log cleared by operator");
        Ok(AdminNotice::success("Logs cleared!"))
    }

    pub async fn webhook_url(&self) -> MailAlertResult<Option<String>> {
        self.settings.webhook_url().await
    }

    /// Save the webhook URL. A blank value removes it.
    #[instrument(skip(self, raw))]
    pub async fn save_webhook_url(&self, raw: &str) -> MailAlertResult<AdminNotice> {
        match normalize_webhook_url(raw)? {
            Some(url) => self.settings.set_webhook_url(&url).await?,
            None => self.settings.clear_webhook_url().await?,
        }
        Ok(AdminNotice::success("Settings saved!"))
    }

    /// Send a test mail through the host transport. The attempt shows up in the log
    /// like any other send.
    #[instrument(skip(self))]
    pub async fn send_test_email(&self, address: &str) -> MailAlertResult<AdminNotice> {
        let address = address.trim();
        if address.is_empty() || !address.validate_email() {
            return Err(MailAlertError::Validation(
                "Please enter a valid email address.".to_string(),
            ));
        }

        let mail = OutgoingMail::to(address, TEST_EMAIL_SUBJECT, TEST_EMAIL_BODY);
        match self.transport.send(&mail).await {
            Ok(_) => Ok(AdminNotice::success(format!(
                "Test email sent successfully to {}!",
                address
            ))),
            Err(failure) => {
                warn!(error = %failure, "Test email failed");
                Err(MailAlertError::Transport(
                    "Test email failed to send. Check logs below for details.".to_string(),
                ))
            }
        }
    }

    /// Dispatch a synthetic failure alert to the configured webhook.
    #[instrument(skip(self))]
    pub async fn send_test_alert(&self) -> MailAlertResult<AdminNotice> {
        let alert = FailureAlert::new(TEST_ALERT_RECIPIENT, TEST_ALERT_SUBJECT, TEST_ALERT_ERROR);

        match self.notifier.notify_failure(&alert).await? {
            DispatchOutcome::Delivered => Ok(AdminNotice::success("Test alert sent successfully!")),
            DispatchOutcome::Skipped => Err(MailAlertError::WebhookNotConfigured),
        }
    }
}
