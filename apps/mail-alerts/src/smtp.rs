//! SMTP mail transport used for operator test emails.
//!
//! Intended for a local relay such as Mailpit in development; set `SMTP_USE_TLS` for a
//! real relay.

use async_trait::async_trait;
use core_config::{env_optional, env_or_default, env_parse, ConfigError, FromEnv};
use domain_mail_alerts::{MailTransport, OutgoingMail, SendFailure, SendReceipt};
use lettre::message::{header::ContentType, Mailbox};
use lettre::transport::smtp::authentication::Credentials;
use lettre::{AsyncSmtpTransport, AsyncTransport, Message, Tokio1Executor};
use tracing::{debug, info};

#[derive(Clone, Debug)]
pub struct SmtpConfig {
    pub host: String,
    pub port: u16,
    pub from: String,
    pub username: Option<String>,
    pub password: Option<String>,
    pub use_tls: bool,
}

impl FromEnv for SmtpConfig {
    fn from_env() -> Result<Self, ConfigError> {
        Ok(Self {
            host: env_or_default("SMTP_HOST", "localhost"),
            port: env_parse("SMTP_PORT", 1025)?,
            from: env_or_default("SMTP_FROM", "mail-alerts@localhost"),
            username: env_optional("SMTP_USERNAME"),
            password: env_optional("SMTP_PASSWORD"),
            use_tls: env_parse("SMTP_USE_TLS", false)?,
        })
    }
}

pub struct SmtpMailer {
    transport: AsyncSmtpTransport<Tokio1Executor>,
    from: Mailbox,
}

impl SmtpMailer {
    pub fn new(config: &SmtpConfig) -> eyre::Result<Self> {
        let builder = if config.use_tls {
            AsyncSmtpTransport::<Tokio1Executor>::relay(&config.host)?
        } else {
            AsyncSmtpTransport::<Tokio1Executor>::builder_dangerous(&config.host)
        };
        let mut builder = builder.port(config.port);

        if let (Some(username), Some(password)) = (&config.username, &config.password) {
            builder = builder.credentials(Credentials::new(username.clone(), password.clone()));
        }

        let from = config
            .from
            .parse()
            .map_err(|e| eyre::eyre!("Invalid SMTP_FROM address {:?}: {}", config.from, e))?;

        info!(host = %config.host, port = config.port, tls = config.use_tls, "SMTP transport configured");

        Ok(Self {
            transport: builder.build(),
            from,
        })
    }

    fn build_message(&self, mail: &OutgoingMail) -> Result<Message, SendFailure> {
        let mut builder = Message::builder()
            .from(self.from.clone())
            .subject(mail.subject.clone().unwrap_or_default());

        for recipient in &mail.recipients {
            let to: Mailbox = recipient.parse().map_err(|e| {
                SendFailure::new(format!("Invalid recipient address '{}': {}", recipient, e))
            })?;
            builder = builder.to(to);
        }

        builder
            .header(ContentType::TEXT_PLAIN)
            .body(mail.body.clone())
            .map_err(|e| SendFailure::new(format!("Failed to build message: {}", e)))
    }
}

#[async_trait]
impl MailTransport for SmtpMailer {
    async fn send(&self, mail: &OutgoingMail) -> Result<SendReceipt, SendFailure> {
        let message = self.build_message(mail)?;

        let response = self
            .transport
            .send(message)
            .await
            .map_err(|e| SendFailure::new(format!("SMTP send failed: {}", e)))?;

        let raw = response.message().collect::<Vec<_>>().join(" ");
        debug!(code = %response.code(), "SMTP server accepted message");

        Ok(SendReceipt {
            message_id: None,
            raw: Some(raw),
        })
    }
}
