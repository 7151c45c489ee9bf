//! Outcome correlation between a send request and its completion signal.
//!
//! The host reports success and failure through two unrelated signals. Success only
//! echoes transport data, so the original request is parked here under a [`SendId`]
//! ticket when the send is initiated and consumed when the ticket resolves.

use crate::models::{
    join_recipients, NewMailAttempt, OutgoingMail, SendFailure, SendId, SendReceipt, UNKNOWN,
};
use std::collections::HashMap;
use std::time::Duration;
use tokio::sync::RwLock;
use tokio::time::Instant;
use tracing::{debug, warn};

#[derive(Debug)]
struct PendingSend {
    mail: OutgoingMail,
    registered_at: Instant,
}

/// Request-scoped correlation table: `SendId -> pending request payload`.
#[derive(Debug, Default)]
pub struct OutcomeCorrelator {
    pending: RwLock<HashMap<SendId, PendingSend>>,
}

impl OutcomeCorrelator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Park the request payload and hand back the ticket for its completion signal.
    pub async fn register(&self, mail: OutgoingMail) -> SendId {
        let send_id = SendId::new();
        let pending = PendingSend {
            mail,
            registered_at: Instant::now(),
        };

        self.pending.write().await.insert(send_id, pending);
        debug!(send_id = %send_id, "Registered pending send");

        send_id
    }

    /// Resolve a success signal against the payload captured at initiation.
    ///
    /// Returns `None` when the ticket is unknown or was already resolved.
    pub async fn resolve_success(
        &self,
        send_id: SendId,
        receipt: &SendReceipt,
    ) -> Option<NewMailAttempt> {
        let Some(pending) = self.pending.write().await.remove(&send_id) else {
            warn!(send_id = %send_id, "Success signal for unknown or resolved send");
            return None;
        };

        debug!(
            send_id = %send_id,
            message_id = ?receipt.message_id,
            "Resolved send as success"
        );

        let mail = pending.mail;
        let subject = mail.subject.unwrap_or_else(|| UNKNOWN.to_string());
        Some(NewMailAttempt::succeeded(
            join_recipients(&mail.recipients),
            subject,
        ))
    }

    /// Resolve a failure signal.
    ///
    /// Recipients and subject come from the failure's own metadata; the payload parked
    /// under the ticket is discarded. Every failure produces a record, including one whose
    /// ticket was pruned, already resolved or never issued.
    pub async fn resolve_failure(
        &self,
        send_id: Option<SendId>,
        failure: &SendFailure,
    ) -> NewMailAttempt {
        if let Some(send_id) = send_id {
            if self.pending.write().await.remove(&send_id).is_some() {
                debug!(send_id = %send_id, "Resolved send as failure");
            } else {
                warn!(send_id = %send_id, "Failure signal for unknown send, recording anyway");
            }
        }

        failure_attempt(failure)
    }

    /// Drop tickets whose host never reported an outcome.
    ///
    /// Returns how many entries were removed.
    pub async fn prune_stale(&self, max_age: Duration) -> usize {
        let mut pending = self.pending.write().await;
        let before = pending.len();
        pending.retain(|_, entry| entry.registered_at.elapsed() < max_age);
        let pruned = before - pending.len();

        if pruned > 0 {
            warn!(pruned, "Pruned sends that never reported an outcome");
        }

        pruned
    }

    /// Number of sends still waiting for an outcome.
    pub async fn pending_count(&self) -> usize {
        self.pending.read().await.len()
    }
}

fn failure_attempt(failure: &SendFailure) -> NewMailAttempt {
    let (recipients, subject) = match &failure.metadata {
        Some(metadata) => (
            join_recipients(&metadata.recipients),
            metadata
                .subject
                .clone()
                .unwrap_or_else(|| UNKNOWN.to_string()),
        ),
        None => (UNKNOWN.to_string(), UNKNOWN.to_string()),
    };

    NewMailAttempt::failed(recipients, subject, failure.message.clone())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{FailureMetadata, MailOutcome};

    #[tokio::test]
    async fn test_success_uses_original_payload() {
        let correlator = OutcomeCorrelator::new();
        let mail = OutgoingMail::new(
            vec!["a@x.com".to_string(), "b@x.com".to_string()],
            "Weekly report",
            "body",
        );

        let send_id = correlator.register(mail).await;
        let attempt = correlator
            .resolve_success(send_id, &SendReceipt::default())
            .await
            .unwrap();

        assert_eq!(attempt.recipients, "a@x.com, b@x.com");
        assert_eq!(attempt.subject, "Weekly report");
        assert_eq!(attempt.outcome, MailOutcome::Success);
        assert!(attempt.error_detail.is_none());
    }

    #[tokio::test]
    async fn test_success_resolves_at_most_once() {
        let correlator = OutcomeCorrelator::new();
        let send_id = correlator
            .register(OutgoingMail::to("a@x.com", "Hi", ""))
            .await;

        assert!(correlator
            .resolve_success(send_id, &SendReceipt::default())
            .await
            .is_some());
        assert!(correlator
            .resolve_success(send_id, &SendReceipt::default())
            .await
            .is_none());
        assert_eq!(correlator.pending_count().await, 0);
    }

    #[tokio::test]
    async fn test_success_without_subject_uses_sentinel() {
        let correlator = OutcomeCorrelator::new();
        let send_id = correlator
            .register(OutgoingMail {
                recipients: vec![],
                subject: None,
                body: String::new(),
            })
            .await;

        let attempt = correlator
            .resolve_success(send_id, &SendReceipt::default())
            .await
            .unwrap();
        assert_eq!(attempt.recipients, UNKNOWN);
        assert_eq!(attempt.subject, UNKNOWN);
    }

    #[tokio::test]
    async fn test_failure_without_metadata_uses_sentinels() {
        let correlator = OutcomeCorrelator::new();

        let attempt = correlator
            .resolve_failure(None, &SendFailure::new("SMTP timeout"))
            .await;

        assert_eq!(attempt.recipients, "unknown");
        assert_eq!(attempt.subject, "unknown");
        assert_eq!(attempt.outcome, MailOutcome::Failure);
        assert_eq!(attempt.error_detail.as_deref(), Some("SMTP timeout"));
    }

    #[tokio::test]
    async fn test_failure_reads_metadata_not_parked_payload() {
        let correlator = OutcomeCorrelator::new();
        let send_id = correlator
            .register(OutgoingMail::to("parked@x.com", "Parked", ""))
            .await;
        let failure = SendFailure::new("Mailbox full").with_metadata(FailureMetadata {
            recipients: vec!["c@x.com".to_string()],
            subject: Some("Invoice".to_string()),
        });

        let attempt = correlator
            .resolve_failure(Some(send_id), &failure)
            .await;

        assert_eq!(attempt.recipients, "c@x.com");
        assert_eq!(attempt.subject, "Invoice");
        assert_eq!(correlator.pending_count().await, 0);
    }

    #[tokio::test]
    async fn test_failure_without_ticket_always_records() {
        let correlator = OutcomeCorrelator::new();
        let failure = SendFailure::new("boom");

        let first = correlator.resolve_failure(None, &failure).await;
        let second = correlator.resolve_failure(None, &failure).await;
        assert_eq!(first, second);
        assert_eq!(first.error_detail.as_deref(), Some("boom"));
    }

    #[tokio::test]
    async fn test_failure_with_unknown_ticket_is_recorded() {
        let correlator = OutcomeCorrelator::new();

        let attempt = correlator
            .resolve_failure(Some(SendId::new()), &SendFailure::new("SMTP timeout"))
            .await;

        assert_eq!(attempt.outcome, MailOutcome::Failure);
        assert_eq!(attempt.recipients, UNKNOWN);
        assert_eq!(attempt.error_detail.as_deref(), Some("SMTP timeout"));
    }

    #[tokio::test]
    async fn test_failure_after_success_is_still_recorded() {
        let correlator = OutcomeCorrelator::new();
        let send_id = correlator
            .register(OutgoingMail::to("a@x.com", "Hi", ""))
            .await;
        correlator
            .resolve_success(send_id, &SendReceipt::default())
            .await
            .unwrap();

        let attempt = correlator
            .resolve_failure(Some(send_id), &SendFailure::new("late"))
            .await;
        assert_eq!(attempt.error_detail.as_deref(), Some("late"));
    }

    #[tokio::test(start_paused = true)]
    async fn test_failure_after_prune_is_recorded() {
        let correlator = OutcomeCorrelator::new();
        let send_id = correlator
            .register(OutgoingMail::to("a@x.com", "Hi", ""))
            .await;

        tokio::time::advance(Duration::from_secs(7200)).await;
        assert_eq!(correlator.prune_stale(Duration::from_secs(3600)).await, 1);

        let failure = SendFailure::new("SMTP timeout").with_metadata(FailureMetadata {
            recipients: vec!["a@x.com".to_string()],
            subject: Some("Hi".to_string()),
        });
        let attempt = correlator.resolve_failure(Some(send_id), &failure).await;

        assert_eq!(attempt.recipients, "a@x.com");
        assert_eq!(attempt.subject, "Hi");
        assert_eq!(attempt.outcome, MailOutcome::Failure);
    }

    #[tokio::test(start_paused = true)]
    async fn test_prune_stale_drops_old_entries_only() {
        let correlator = OutcomeCorrelator::new();
        correlator.register(OutgoingMail::to("old@x.com", "Old", "")).await;

        tokio::time::advance(Duration::from_secs(120)).await;
        let fresh = correlator
            .register(OutgoingMail::to("new@x.com", "New", ""))
            .await;

        let pruned = correlator.prune_stale(Duration::from_secs(60)).await;
        assert_eq!(pruned, 1);
        assert_eq!(correlator.pending_count().await, 1);
        assert!(correlator
            .resolve_success(fresh, &SendReceipt::default())
            .await
            .is_some());
    }

    #[tokio::test]
    async fn test_concurrent_sends_are_independent() {
        let correlator = std::sync::Arc::new(OutcomeCorrelator::new());

        let mut handles = Vec::new();
        for i in 0..16 {
            let correlator = correlator.clone();
            handles.push(tokio::spawn(async move {
                let address = format!("user{}@x.com", i);
                let send_id = correlator
                    .register(OutgoingMail::to(address.clone(), "Hi", ""))
                    .await;
                let attempt = correlator
                    .resolve_success(send_id, &SendReceipt::default())
                    .await
                    .unwrap();
                assert_eq!(attempt.recipients, address);
            }));
        }

        for handle in handles {
            handle.await.unwrap();
        }
        assert_eq!(correlator.pending_count().await, 0);
    }
}
