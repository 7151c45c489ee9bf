//! Mail Alerts Domain
//!
//! Records the outcome of every outbound mail and raises a webhook alert when a send
//! fails.
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────┐
//! │  Host transport │  ← send initiated / succeeded / failed
//! └────────┬────────┘
//!          │
//! ┌────────▼────────┐
//! │   Correlator    │  ← SendId → original request payload
//! └────────┬────────┘
//!          │ NewMailAttempt
//! ┌────────▼────────┐
//! │    Pipeline     │  ← append + alert, independently
//! └───┬─────────┬───┘
//!     │         │
//! ┌───▼────┐ ┌──▼──────────────┐
//! │Mail log│ │ Alert dispatcher│  ← POST embed, 204 = delivered
//! └────────┘ └─────────────────┘
//! ```
//!
//! # Usage
//!
//! ```rust,no_run
//! use domain_mail_alerts::{
//!     AlertDispatcher, AlertDispatcherConfig, MailPipeline, OutgoingMail, PgMailLogRepository,
//!     PgSettingsStore, SendFailure, SiteIdentity,
//! };
//! use sea_orm::Database;
//! use std::sync::Arc;
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let db = Database::connect("postgres://...").await?;
//!
//! let dispatcher = AlertDispatcher::new(
//!     Arc::new(PgSettingsStore::new(db.clone())),
//!     SiteIdentity::new("My Blog", "https://blog.example.com"),
//!     AlertDispatcherConfig::default(),
//! )?;
//! let pipeline = MailPipeline::new(Arc::new(PgMailLogRepository::new(db)), Arc::new(dispatcher));
//!
//! let send_id = pipeline
//!     .send_initiated(OutgoingMail::to("a@x.com", "Hello", "body"))
//!     .await;
//! pipeline
//!     .send_failed(Some(send_id), SendFailure::new("SMTP timeout"))
//!     .await;
//! # Ok(())
//! # }
//! ```

pub mod admin;
pub mod correlator;
pub mod dispatcher;
pub mod entity;
pub mod error;
pub mod models;
pub mod pipeline;
pub mod postgres;
pub mod repository;
pub mod settings;
pub mod transport;

pub use admin::{AdminNotice, MailAlertsAdmin, NoticeLevel};
pub use correlator::OutcomeCorrelator;
pub use dispatcher::{
    AlertDispatcher, AlertDispatcherConfig, DispatchOutcome, FailureAlert, FailureNotifier,
    WebhookPayload,
};
pub use error::{MailAlertError, MailAlertResult};
pub use models::{
    FailureMetadata, MailAttempt, MailOutcome, NewMailAttempt, OutgoingMail, SendFailure, SendId,
    SendReceipt, SiteIdentity,
};
pub use pipeline::{MailPipeline, RecordReport};
pub use postgres::PgMailLogRepository;
pub use repository::{DEFAULT_LIST_LIMIT, InMemoryMailLogRepository, MailLogRepository};
pub use settings::{InMemorySettingsStore, PgSettingsStore, SettingsStore};
pub use transport::{InstrumentedTransport, MailTransport};
