use async_trait::async_trait;
use sea_orm::{
    ActiveModelTrait, DatabaseConnection, EntityTrait, PaginatorTrait, QueryOrder, QuerySelect,
};

use crate::{
    entity::mail_log,
    error::{MailAlertError, MailAlertResult},
    models::{MailAttempt, NewMailAttempt},
    repository::MailLogRepository,
};

pub struct PgMailLogRepository {
    db: DatabaseConnection,
}

impl PgMailLogRepository {
    pub fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }

    pub fn db(&self) -> &DatabaseConnection {
        &self.db
    }
}

#[async_trait]
impl MailLogRepository for PgMailLogRepository {
    async fn append(&self, attempt: NewMailAttempt) -> MailAlertResult<MailAttempt> {
        let outcome = attempt.outcome;
        let active_model: mail_log::ActiveModel = attempt.into();

        let model = active_model
            .insert(&self.db)
            .await
            .map_err(|e| MailAlertError::Storage(format!("Failed to append mail log: {}", e)))?;

        tracing::debug!(mail_log_id = model.id, outcome = %outcome, "Appended mail log");
        Ok(model.into())
    }

    async fn list_recent(&self, limit: u64) -> MailAlertResult<Vec<MailAttempt>> {
        if limit == 0 {
            return Err(MailAlertError::Validation(
                "limit must be greater than zero".to_string(),
            ));
        }

        let models = mail_log::Entity::find()
            .order_by_desc(mail_log::Column::CreatedAt)
            .order_by_desc(mail_log::Column::Id)
            // Postgres binds LIMIT as a signed bigint
            .limit(limit.min(i64::MAX as u64))
            .all(&self.db)
            .await
            .map_err(|e| MailAlertError::Storage(format!("Failed to list mail log: {}", e)))?;

        Ok(models.into_iter().map(Into::into).collect())
    }

    async fn clear_all(&self) -> MailAlertResult<u64> {
        let result = mail_log::Entity::delete_many()
            .exec(&self.db)
            .await
            .map_err(|e| MailAlertError::Storage(format!("Failed to clear mail log: {}", e)))?;

        tracing::info!(rows = result.rows_affected, "Cleared mail log");
        Ok(result.rows_affected)
    }

    async fn count(&self) -> MailAlertResult<u64> {
        let count = mail_log::Entity::find()
            .count(&self.db)
            .await
            .map_err(|e| MailAlertError::Storage(format!("Failed to count mail log: {}", e)))?;

        Ok(count)
    }
}
