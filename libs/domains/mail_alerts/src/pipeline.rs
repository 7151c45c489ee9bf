//! Pipeline wiring host mail events to the log store and the alert dispatcher.
//!
//! ```text
//! send_initiated ──► OutcomeCorrelator ──► send_succeeded / send_failed
//!                                                   │
//!                                          NewMailAttempt
//!                                           │         │
//!                                  MailLogRepository  FailureNotifier (failures only)
//! ```
//!
//! Recording runs on a spawned task so a slow store or webhook never holds up the
//! host's send path, and errors are logged rather than returned to the host.

use crate::correlator::OutcomeCorrelator;
use crate::dispatcher::{DispatchOutcome, FailureAlert, FailureNotifier};
use crate::error::MailAlertResult;
use crate::models::{MailAttempt, NewMailAttempt, OutgoingMail, SendFailure, SendId, SendReceipt};
use crate::repository::MailLogRepository;
use std::sync::Arc;
use std::time::Duration;
use tokio::task::JoinHandle;
use tracing::{error, instrument, warn};

/// What happened to one recorded attempt.
#[derive(Debug)]
pub struct RecordReport {
    pub log: MailAlertResult<MailAttempt>,
    /// `None` for successful sends, which never alert.
    pub alert: Option<MailAlertResult<DispatchOutcome>>,
}

pub struct MailPipeline<R: MailLogRepository + ?Sized, N: FailureNotifier + ?Sized> {
    correlator: Arc<OutcomeCorrelator>,
    repository: Arc<R>,
    notifier: Arc<N>,
}

impl<R: MailLogRepository + ?Sized, N: FailureNotifier + ?Sized> Clone for MailPipeline<R, N> {
    fn clone(&self) -> Self {
        Self {
            correlator: self.correlator.clone(),
            repository: self.repository.clone(),
            notifier: self.notifier.clone(),
        }
    }
}

impl<R, N> MailPipeline<R, N>
where
    R: MailLogRepository + ?Sized + 'static,
    N: FailureNotifier + ?Sized + 'static,
{
    pub fn new(repository: Arc<R>, notifier: Arc<N>) -> Self {
        Self {
            correlator: Arc::new(OutcomeCorrelator::new()),
            repository,
            notifier,
        }
    }

    pub fn correlator(&self) -> &OutcomeCorrelator {
        &self.correlator
    }

    /// Host is about to transmit `mail`.
    pub async fn send_initiated(&self, mail: OutgoingMail) -> SendId {
        self.correlator.register(mail).await
    }

    /// Host reported success for `send_id`.
    ///
    /// Returns the handle of the recording task, or `None` if the ticket was not pending.
    pub async fn send_succeeded(
        &self,
        send_id: SendId,
        receipt: SendReceipt,
    ) -> Option<JoinHandle<RecordReport>> {
        let attempt = self.correlator.resolve_success(send_id, &receipt).await?;
        Some(self.spawn_record(attempt))
    }

    /// Host reported a failure, with or without the ticket from [`Self::send_initiated`].
    ///
    /// Always records, even when the ticket is no longer pending.
    pub async fn send_failed(
        &self,
        send_id: Option<SendId>,
        failure: SendFailure,
    ) -> JoinHandle<RecordReport> {
        let attempt = self.correlator.resolve_failure(send_id, &failure).await;
        self.spawn_record(attempt)
    }

    /// Drop tickets older than `max_age` that never resolved.
    pub async fn prune_stale(&self, max_age: Duration) -> usize {
        self.correlator.prune_stale(max_age).await
    }

    fn spawn_record(&self, attempt: NewMailAttempt) -> JoinHandle<RecordReport> {
        let pipeline = self.clone();
        tokio::spawn(async move { pipeline.record(attempt).await })
    }

    /// Append the attempt and, for failures, alert. Neither step depends on the other.
    #[instrument(skip(self, attempt), fields(outcome = %attempt.outcome))]
    pub async fn record(&self, attempt: NewMailAttempt) -> RecordReport {
        let alert = FailureAlert::from_attempt(&attempt);

        let append = self.repository.append(attempt);
        let notify = async {
            match &alert {
                Some(alert) => Some(self.notifier.notify_failure(alert).await),
                None => None,
            }
        };

        let (log, alert) = tokio::join!(append, notify);

        if let Err(e) = &log {
            error!(error = %e, "Failed to record mail attempt");
        }
        if let Some(Err(e)) = &alert {
            warn!(error = %e, "Failed to dispatch failure alert");
        }

        RecordReport { log, alert }
    }
}
