//! Shared application state handed to every handler.

use domain_mail_alerts::{
    AlertDispatcher, FailureNotifier, InstrumentedTransport, MailAlertsAdmin, MailLogRepository,
    MailPipeline, MailTransport, PgMailLogRepository, PgSettingsStore, SettingsStore,
};
use sea_orm::DatabaseConnection;
use std::sync::Arc;

use crate::config::Config;
use crate::smtp::SmtpMailer;

pub type Pipeline = MailPipeline<dyn MailLogRepository, dyn FailureNotifier>;

/// Cloned per request; every field is a cheap handle.
#[derive(Clone)]
pub struct AppState {
    pub pipeline: Pipeline,
    pub admin: MailAlertsAdmin,
    pub db: DatabaseConnection,
}

impl AppState {
    /// Wire the Postgres-backed store, the webhook dispatcher and the SMTP transport.
    pub fn build(db: DatabaseConnection, config: &Config) -> eyre::Result<Self> {
        let repository: Arc<dyn MailLogRepository> =
            Arc::new(PgMailLogRepository::new(db.clone()));
        let settings = Arc::new(PgSettingsStore::new(db.clone()));
        let notifier: Arc<dyn FailureNotifier> = Arc::new(AlertDispatcher::new(
            settings.clone(),
            config.site.clone(),
            config.dispatcher.clone(),
        )?);
        let mailer = SmtpMailer::new(&config.smtp)?;

        Ok(Self::from_parts(db, repository, settings, notifier, mailer))
    }

    /// Assemble state from already-built components. Test mail goes through `mailer`
    /// wrapped so that it is logged like any other send.
    pub fn from_parts(
        db: DatabaseConnection,
        repository: Arc<dyn MailLogRepository>,
        settings: Arc<dyn SettingsStore>,
        notifier: Arc<dyn FailureNotifier>,
        mailer: impl MailTransport + 'static,
    ) -> Self {
        let pipeline: Pipeline = MailPipeline::new(repository.clone(), notifier.clone());
        let transport: Arc<dyn MailTransport> =
            Arc::new(InstrumentedTransport::new(mailer, pipeline.clone()));
        let admin = MailAlertsAdmin::new(repository, settings, notifier, transport);

        Self {
            pipeline,
            admin,
            db,
        }
    }
}
