//! Data models for the mail alerts domain.

use chrono::{DateTime, Utc};
use sea_orm::{DeriveActiveEnum, EnumIter, sea_query::StringLen};
use serde::{Deserialize, Serialize};
use strum::{Display, EnumString};
use thiserror::Error;
use uuid::Uuid;

/// Placeholder stored when the host gives no recipient or subject data.
pub const UNKNOWN: &str = "unknown";

// ============================================================================
// Log Records
// ============================================================================

/// Terminal outcome of a send attempt.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Hash,
    Serialize,
    Deserialize,
    Display,
    EnumString,
    DeriveActiveEnum,
    EnumIter,
)]
#[sea_orm(rs_type = "String", db_type = "String(StringLen::N(20))")]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum MailOutcome {
    /// The host reported the mail as sent.
    #[sea_orm(string_value = "success")]
    Success,
    /// The host reported the mail as failed.
    #[sea_orm(string_value = "failed")]
    #[serde(rename = "failed")]
    #[strum(to_string = "failed")]
    Failure,
}

/// A persisted send attempt.
///
/// Records are immutable: the store only appends and truncates.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MailAttempt {
    /// Identifier assigned by the store.
    pub id: i64,
    /// Recipients joined with `", "`.
    pub recipients: String,
    pub subject: String,
    pub outcome: MailOutcome,
    /// Present only for [`MailOutcome::Failure`].
    pub error_detail: Option<String>,
    /// Assigned by the store at insert time.
    pub recorded_at: DateTime<Utc>,
}

/// A send attempt ready to be appended to the log store.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewMailAttempt {
    pub recipients: String,
    pub subject: String,
    pub outcome: MailOutcome,
    pub error_detail: Option<String>,
}

impl NewMailAttempt {
    /// Build a successful attempt. Successful attempts never carry error detail.
    pub fn succeeded(recipients: impl Into<String>, subject: impl Into<String>) -> Self {
        Self {
            recipients: recipients.into(),
            subject: subject.into(),
            outcome: MailOutcome::Success,
            error_detail: None,
        }
    }

    /// Build a failed attempt with the host's error message.
    pub fn failed(
        recipients: impl Into<String>,
        subject: impl Into<String>,
        error_detail: impl Into<String>,
    ) -> Self {
        Self {
            recipients: recipients.into(),
            subject: subject.into(),
            outcome: MailOutcome::Failure,
            error_detail: Some(error_detail.into()),
        }
    }

    pub fn is_failure(&self) -> bool {
        self.outcome == MailOutcome::Failure
    }
}

// ============================================================================
// Host Mail Lifecycle
// ============================================================================

/// Correlation ticket handed to the host when a send is initiated.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SendId(Uuid);

impl SendId {
    pub fn new() -> Self {
        Self(Uuid::now_v7())
    }

    pub fn as_uuid(&self) -> Uuid {
        self.0
    }
}

impl Default for SendId {
    fn default() -> Self {
        Self::new()
    }
}

impl From<Uuid> for SendId {
    fn from(id: Uuid) -> Self {
        Self(id)
    }
}

impl std::fmt::Display for SendId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        self.0.fmt(f)
    }
}

/// The request payload the host exposes before transmitting a mail.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct OutgoingMail {
    pub recipients: Vec<String>,
    pub subject: Option<String>,
    #[serde(default)]
    pub body: String,
}

impl OutgoingMail {
    pub fn new(recipients: Vec<String>, subject: impl Into<String>, body: impl Into<String>) -> Self {
        Self {
            recipients,
            subject: Some(subject.into()),
            body: body.into(),
        }
    }

    /// Single-recipient shorthand.
    pub fn to(address: impl Into<String>, subject: impl Into<String>, body: impl Into<String>) -> Self {
        Self::new(vec![address.into()], subject, body)
    }
}

/// Raw data the host echoes back on success.
///
/// Hosts typically only return transport-level identifiers here, which is why the
/// correlator keeps the original [`OutgoingMail`] around.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SendReceipt {
    pub message_id: Option<String>,
    pub raw: Option<String>,
}

/// Recipient and subject data a host may attach to a failure.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct FailureMetadata {
    #[serde(default)]
    pub recipients: Vec<String>,
    pub subject: Option<String>,
}

/// The opaque error object a host reports when a send fails.
#[derive(Debug, Clone, PartialEq, Eq, Error, Serialize, Deserialize)]
#[error("{message}")]
pub struct SendFailure {
    pub message: String,
    pub metadata: Option<FailureMetadata>,
}

impl SendFailure {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            metadata: None,
        }
    }

    pub fn with_metadata(mut self, metadata: FailureMetadata) -> Self {
        self.metadata = Some(metadata);
        self
    }

    /// Attach the outgoing mail's recipients and subject unless metadata is already present.
    pub fn or_metadata_from(mut self, mail: &OutgoingMail) -> Self {
        if self.metadata.is_none() {
            self.metadata = Some(FailureMetadata {
                recipients: mail.recipients.clone(),
                subject: mail.subject.clone(),
            });
        }
        self
    }
}

// ============================================================================
// Alerting
// ============================================================================

/// Identity of the site that produced an alert, rendered as `name (url)`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SiteIdentity {
    pub name: String,
    pub url: String,
}

impl SiteIdentity {
    pub fn new(name: impl Into<String>, url: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            url: url.into(),
        }
    }
}

impl std::fmt::Display for SiteIdentity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} ({})", self.name, self.url)
    }
}

/// Join recipients for storage, falling back to [`UNKNOWN`] when nothing usable is left.
pub fn join_recipients(recipients: &[String]) -> String {
    let joined = recipients
        .iter()
        .map(|r| r.trim())
        .filter(|r| !r.is_empty())
        .collect::<Vec<_>>()
        .join(", ");

    if joined.is_empty() {
        UNKNOWN.to_string()
    } else {
        joined
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::str::FromStr;

    #[test]
    fn test_outcome_string_forms() {
        assert_eq!(MailOutcome::Success.to_string(), "success");
        assert_eq!(MailOutcome::Failure.to_string(), "failed");
        assert_eq!(MailOutcome::from_str("failed").unwrap(), MailOutcome::Failure);
        assert_eq!(
            serde_json::to_value(MailOutcome::Failure).unwrap(),
            serde_json::json!("failed")
        );
    }

    #[test]
    fn test_join_recipients() {
        let recipients = vec!["a@x.com".to_string(), "b@x.com".to_string()];
        assert_eq!(join_recipients(&recipients), "a@x.com, b@x.com");
        assert_eq!(join_recipients(&[]), UNKNOWN);
        assert_eq!(join_recipients(&["  ".to_string()]), UNKNOWN);
    }

    #[test]
    fn test_success_has_no_error_detail() {
        let attempt = NewMailAttempt::succeeded("a@x.com", "Hello");
        assert_eq!(attempt.outcome, MailOutcome::Success);
        assert!(attempt.error_detail.is_none());
        assert!(!attempt.is_failure());
    }

    #[test]
    fn test_or_metadata_from_keeps_existing_metadata() {
        let mail = OutgoingMail::to("a@x.com", "Hello", "body");
        let failure = SendFailure::new("boom").with_metadata(FailureMetadata {
            recipients: vec!["b@x.com".to_string()],
            subject: None,
        });

        let failure = failure.or_metadata_from(&mail);
        let metadata = failure.metadata.unwrap();
        assert_eq!(metadata.recipients, vec!["b@x.com".to_string()]);
        assert!(metadata.subject.is_none());
    }

    #[test]
    fn test_site_identity_display() {
        let site = SiteIdentity::new("My Blog", "https://blog.example.com");
        assert_eq!(site.to_string(), "My Blog (https://blog.example.com)");
    }
}
