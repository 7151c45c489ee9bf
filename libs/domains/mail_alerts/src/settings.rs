//! Settings store supplying the alert webhook URL.

use crate::entity::app_setting;
use crate::error::{MailAlertError, MailAlertResult};
use async_trait::async_trait;
use chrono::Utc;
use reqwest::Url;
use sea_orm::ActiveValue::Set;
use sea_orm::sea_query::OnConflict;
use sea_orm::{DatabaseConnection, EntityTrait};
use tokio::sync::RwLock;
use tracing::info;

/// Settings key holding the webhook URL.
pub const WEBHOOK_URL_KEY: &str = "mail_alerts_webhook_url";

/// Key-value settings consumed by the alert dispatcher and the admin surface.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait SettingsStore: Send + Sync {
    /// Current webhook URL, if one is stored.
    async fn webhook_url(&self) -> MailAlertResult<Option<String>>;

    /// Store a webhook URL, replacing any previous value.
    async fn set_webhook_url(&self, url: &str) -> MailAlertResult<()>;

    /// Remove the webhook URL, disabling alerts.
    async fn clear_webhook_url(&self) -> MailAlertResult<()>;
}

/// Normalize a webhook URL entered by an operator.
///
/// Whitespace is trimmed and an empty value means "no webhook". Anything else has to
/// be an absolute http(s) URL.
pub fn normalize_webhook_url(raw: &str) -> MailAlertResult<Option<String>> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return Ok(None);
    }

    let url = Url::parse(trimmed)
        .map_err(|e| MailAlertError::Validation(format!("Invalid webhook URL: {}", e)))?;

    match url.scheme() {
        "http" | "https" => Ok(Some(trimmed.to_string())),
        scheme => Err(MailAlertError::Validation(format!(
            "Webhook URL must use http or https, got {}",
            scheme
        ))),
    }
}

/// Settings stored in the `app_settings` table.
pub struct PgSettingsStore {
    db: DatabaseConnection,
}

impl PgSettingsStore {
    pub fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }
}

#[async_trait]
impl SettingsStore for PgSettingsStore {
    async fn webhook_url(&self) -> MailAlertResult<Option<String>> {
        let setting = app_setting::Entity::find_by_id(WEBHOOK_URL_KEY.to_string())
            .one(&self.db)
            .await?;

        Ok(setting
            .map(|s| s.value)
            .filter(|value| !value.trim().is_empty()))
    }

    async fn set_webhook_url(&self, url: &str) -> MailAlertResult<()> {
        let model = app_setting::ActiveModel {
            key: Set(WEBHOOK_URL_KEY.to_string()),
            value: Set(url.to_string()),
            updated_at: Set(Utc::now().into()),
        };

        app_setting::Entity::insert(model)
            .on_conflict(
                OnConflict::column(app_setting::Column::Key)
                    .update_columns([app_setting::Column::Value, app_setting::Column::UpdatedAt])
                    .to_owned(),
            )
            .exec_without_returning(&self.db)
            .await?;

        info!("Stored alert webhook URL");
        Ok(())
    }

    async fn clear_webhook_url(&self) -> MailAlertResult<()> {
        app_setting::Entity::delete_by_id(WEBHOOK_URL_KEY.to_string())
            .exec(&self.db)
            .await?;

        info!("Cleared alert webhook URL");
        Ok(())
    }
}

/// Process-local settings, for hosts without a settings table and for tests.
#[derive(Debug, Default)]
pub struct InMemorySettingsStore {
    webhook_url: RwLock<Option<String>>,
}

impl InMemorySettingsStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_webhook_url(url: impl Into<String>) -> Self {
        Self {
            webhook_url: RwLock::new(Some(url.into())),
        }
    }
}

#[async_trait]
impl SettingsStore for InMemorySettingsStore {
    async fn webhook_url(&self) -> MailAlertResult<Option<String>> {
        Ok(self.webhook_url.read().await.clone())
    }

    async fn set_webhook_url(&self, url: &str) -> MailAlertResult<()> {
        *self.webhook_url.write().await = Some(url.to_string());
        Ok(())
    }

    async fn clear_webhook_url(&self) -> MailAlertResult<()> {
        *self.webhook_url.write().await = None;
        Ok(())
    }
}
