//! Webhook alert dispatcher.
//!
//! Posts a Discord-style embed to the configured webhook whenever a send fails.
//! Delivery is best effort: one POST, no retry, success only on `204 No Content`.

use crate::error::{MailAlertError, MailAlertResult};
use crate::models::{NewMailAttempt, SiteIdentity, UNKNOWN};
use crate::settings::SettingsStore;
use async_trait::async_trait;
use chrono::{DateTime, SecondsFormat, Utc};
use reqwest::header::{CONTENT_TYPE, HeaderValue};
use reqwest::{Client, StatusCode, Url};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, info, instrument, warn};

pub const ALERT_TITLE: &str = "📧 Email Failure Alert";
/// Embed accent color (red).
pub const ALERT_COLOR: u32 = 15158332;

/// Data describing one failed send.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FailureAlert {
    pub recipients: String,
    pub subject: String,
    pub error: String,
}

impl FailureAlert {
    pub fn new(
        recipients: impl Into<String>,
        subject: impl Into<String>,
        error: impl Into<String>,
    ) -> Self {
        Self {
            recipients: recipients.into(),
            subject: subject.into(),
            error: error.into(),
        }
    }

    /// Build an alert from a failed attempt. Returns `None` for successful attempts.
    pub fn from_attempt(attempt: &NewMailAttempt) -> Option<Self> {
        if !attempt.is_failure() {
            return None;
        }

        Some(Self::new(
            attempt.recipients.clone(),
            attempt.subject.clone(),
            attempt
                .error_detail
                .clone()
                .unwrap_or_else(|| UNKNOWN.to_string()),
        ))
    }
}

/// What happened to an alert that did not error.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DispatchOutcome {
    /// No webhook is configured.
    Skipped,
    /// The webhook acknowledged with 204.
    Delivered,
}

/// Sink for failure alerts.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait FailureNotifier: Send + Sync {
    async fn notify_failure(&self, alert: &FailureAlert) -> MailAlertResult<DispatchOutcome>;
}

// ============================================================================
// Wire format
// ============================================================================

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WebhookPayload {
    pub embeds: Vec<Embed>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Embed {
    pub title: String,
    pub color: u32,
    pub fields: Vec<EmbedField>,
    pub timestamp: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EmbedField {
    pub name: String,
    pub value: String,
    pub inline: bool,
}

impl EmbedField {
    fn block(name: &str, value: impl Into<String>) -> Self {
        Self {
            name: name.to_string(),
            value: value.into(),
            inline: false,
        }
    }
}

impl WebhookPayload {
    /// Single embed with To, Subject, Error and Site fields, in that order.
    pub fn failure_alert(alert: &FailureAlert, site: &SiteIdentity, at: DateTime<Utc>) -> Self {
        Self {
            embeds: vec![Embed {
                title: ALERT_TITLE.to_string(),
                color: ALERT_COLOR,
                fields: vec![
                    EmbedField::block("To", alert.recipients.clone()),
                    EmbedField::block("Subject", alert.subject.clone()),
                    EmbedField::block("Error", alert.error.clone()),
                    EmbedField::block("Site", site.to_string()),
                ],
                timestamp: at.to_rfc3339_opts(SecondsFormat::Secs, false),
            }],
        }
    }
}

// ============================================================================
// Dispatcher
// ============================================================================

#[derive(Debug, Clone)]
pub struct AlertDispatcherConfig {
    /// Upper bound for a single webhook call.
    pub timeout: Duration,
    pub user_agent: String,
}

impl Default for AlertDispatcherConfig {
    fn default() -> Self {
        Self {
            timeout: Duration::from_secs(10),
            user_agent: format!("mail-alerts/{}", env!("CARGO_PKG_VERSION")),
        }
    }
}

/// Posts failure alerts to the webhook URL held by the settings store.
pub struct AlertDispatcher<S: SettingsStore> {
    settings: Arc<S>,
    client: Client,
    site: SiteIdentity,
}

impl<S: SettingsStore> AlertDispatcher<S> {
    pub fn new(
        settings: Arc<S>,
        site: SiteIdentity,
        config: AlertDispatcherConfig,
    ) -> MailAlertResult<Self> {
        let client = Client::builder()
            .timeout(config.timeout)
            .user_agent(config.user_agent)
            .build()
            .map_err(|e| MailAlertError::Config(format!("Failed to build HTTP client: {}", e)))?;

        Ok(Self {
            settings,
            client,
            site,
        })
    }

    pub fn site(&self) -> &SiteIdentity {
        &self.site
    }

    /// Post one alert to `url`. Anything but `204 No Content` is a dispatch failure.
    pub async fn dispatch_to(&self, url: &str, alert: &FailureAlert) -> MailAlertResult<()> {
        let url = Url::parse(url)
            .map_err(|e| MailAlertError::Dispatch(format!("Malformed webhook URL: {}", e)))?;

        let payload = WebhookPayload::failure_alert(alert, &self.site, Utc::now());
        let body = serde_json::to_vec(&payload)?;

        let response = self
            .client
            .post(url)
            .header(CONTENT_TYPE, HeaderValue::from_static("application/json"))
            .body(body)
            .send()
            .await?;

        let status = response.status();
        if status != StatusCode::NO_CONTENT {
            let body = response.text().await.unwrap_or_default();
            return Err(MailAlertError::Dispatch(format!(
                "Webhook responded with {}: {}",
                status, body
            )));
        }

        debug!("Webhook acknowledged alert");
        Ok(())
    }
}

#[async_trait]
impl<S: SettingsStore> FailureNotifier for AlertDispatcher<S> {
    #[instrument(skip(self, alert), fields(recipients = %alert.recipients))]
    async fn notify_failure(&self, alert: &FailureAlert) -> MailAlertResult<DispatchOutcome> {
        let Some(url) = self.settings.webhook_url().await? else {
            debug!("No webhook configured, skipping alert");
            return Ok(DispatchOutcome::Skipped);
        };

        match self.dispatch_to(&url, alert).await {
            Ok(()) => {
                info!("Failure alert delivered");
                Ok(DispatchOutcome::Delivered)
            }
            Err(e) => {
                warn!(error = %e, "Failure alert not delivered");
                Err(e)
            }
        }
    }
}
