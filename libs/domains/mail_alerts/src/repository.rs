use async_trait::async_trait;
use chrono::Utc;
use std::sync::atomic::{AtomicI64, Ordering};
use tokio::sync::RwLock;

use crate::error::{MailAlertError, MailAlertResult};
use crate::models::{MailAttempt, NewMailAttempt};

/// Default page size used by the administrative surface.
pub const DEFAULT_LIST_LIMIT: u64 = 100;

/// Repository trait for the append-only mail log
///
/// Rows are only ever appended or removed all at once; there are no
/// partial deletes and no in-place edits.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait MailLogRepository: Send + Sync {
    /// Insert one attempt; the store assigns `id` and `recorded_at`
    async fn append(&self, attempt: NewMailAttempt) -> MailAlertResult<MailAttempt>;

    /// Most recent attempts first, at most `limit` of them
    async fn list_recent(&self, limit: u64) -> MailAlertResult<Vec<MailAttempt>>;

    /// Delete every attempt, returning how many rows were removed
    async fn clear_all(&self) -> MailAlertResult<u64>;

    /// Count all attempts
    async fn count(&self) -> MailAlertResult<u64>;
}

/// Process-local mail log, for hosts without a database and for tests.
#[derive(Debug, Default)]
pub struct InMemoryMailLogRepository {
    rows: RwLock<Vec<MailAttempt>>,
    next_id: AtomicI64,
}

impl InMemoryMailLogRepository {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl MailLogRepository for InMemoryMailLogRepository {
    async fn append(&self, attempt: NewMailAttempt) -> MailAlertResult<MailAttempt> {
        let mut rows = self.rows.write().await;
        let stored = MailAttempt {
            id: self.next_id.fetch_add(1, Ordering::SeqCst) + 1,
            recipients: attempt.recipients,
            subject: attempt.subject,
            outcome: attempt.outcome,
            error_detail: attempt.error_detail,
            recorded_at: Utc::now(),
        };
        rows.push(stored.clone());
        Ok(stored)
    }

    async fn list_recent(&self, limit: u64) -> MailAlertResult<Vec<MailAttempt>> {
        if limit == 0 {
            return Err(MailAlertError::Validation(
                "limit must be greater than zero".to_string(),
            ));
        }

        let mut rows = self.rows.read().await.clone();
        rows.sort_by(|a, b| b.recorded_at.cmp(&a.recorded_at).then(b.id.cmp(&a.id)));
        rows.truncate(usize::try_from(limit).unwrap_or(usize::MAX));
        Ok(rows)
    }

    async fn clear_all(&self) -> MailAlertResult<u64> {
        let mut rows = self.rows.write().await;
        let removed = rows.len() as u64;
        rows.clear();
        Ok(removed)
    }

    async fn count(&self) -> MailAlertResult<u64> {
        Ok(self.rows.read().await.len() as u64)
    }
}
