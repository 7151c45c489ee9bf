use core_config::database::DatabaseConfig;
use core_config::server::ServerConfig;
use core_config::{env_optional, env_or_default, env_parse, ConfigError, FromEnv};
use domain_mail_alerts::{AlertDispatcherConfig, SiteIdentity};
use std::time::Duration;

pub use core_config::Environment;

use crate::smtp::SmtpConfig;

/// How often stale correlation tickets are swept, and how old they must be.
#[derive(Clone, Debug)]
pub struct PruneConfig {
    pub interval: Duration,
    pub max_age: Duration,
}

impl FromEnv for PruneConfig {
    fn from_env() -> Result<Self, ConfigError> {
        let interval: u64 = env_parse("PRUNE_INTERVAL_SECS", 600)?;
        if interval == 0 {
            return Err(ConfigError::ParseError {
                key: "PRUNE_INTERVAL_SECS".to_string(),
                details: "must be greater than zero".to_string(),
            });
        }

        Ok(Self {
            interval: Duration::from_secs(interval),
            max_age: Duration::from_secs(env_parse("PENDING_MAX_AGE_SECS", 3600)?),
        })
    }
}

/// Application configuration, composed from the shared `core_config` pieces
#[derive(Clone, Debug)]
pub struct Config {
    pub environment: Environment,
    pub server: ServerConfig,
    pub database: DatabaseConfig,
    pub site: SiteIdentity,
    pub dispatcher: AlertDispatcherConfig,
    pub smtp: SmtpConfig,
    pub prune: PruneConfig,
    /// Stored as the webhook URL at startup when none is stored yet
    pub seed_webhook_url: Option<String>,
}

impl Config {
    pub fn from_env() -> eyre::Result<Self> {
        let environment = Environment::from_env();
        let server = ServerConfig::from_env()?; // HOST=0.0.0.0, PORT=8080
        let database = DatabaseConfig::from_env()?; // DATABASE_URL is required

        let site = SiteIdentity::new(
            env_or_default("SITE_NAME", "Mail Alerts"),
            env_or_default("SITE_URL", "http://localhost"),
        );

        let dispatcher = AlertDispatcherConfig {
            timeout: Duration::from_secs(env_parse("WEBHOOK_TIMEOUT_SECS", 10)?),
            ..AlertDispatcherConfig::default()
        };

        Ok(Self {
            environment,
            server,
            database,
            site,
            dispatcher,
            smtp: SmtpConfig::from_env()?,
            prune: PruneConfig::from_env()?,
            seed_webhook_url: env_optional("MAIL_ALERTS_WEBHOOK_URL"),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_config_defaults() {
        temp_env::with_vars(
            [
                ("DATABASE_URL", Some("postgres://localhost/mail_alerts")),
                ("SITE_NAME", None),
                ("SITE_URL", None),
                ("WEBHOOK_TIMEOUT_SECS", None),
                ("MAIL_ALERTS_WEBHOOK_URL", None),
                ("PRUNE_INTERVAL_SECS", None),
            ],
            || {
                let config = Config::from_env().unwrap();
                assert_eq!(config.site.to_string(), "Mail Alerts (http://localhost)");
                assert_eq!(config.dispatcher.timeout, Duration::from_secs(10));
                assert_eq!(config.prune.interval, Duration::from_secs(600));
                assert_eq!(config.prune.max_age, Duration::from_secs(3600));
                assert!(config.seed_webhook_url.is_none());
            },
        );
    }

    #[test]
    fn test_config_overrides() {
        temp_env::with_vars(
            [
                ("DATABASE_URL", Some("postgres://localhost/mail_alerts")),
                ("SITE_NAME", Some("My Blog")),
                ("SITE_URL", Some("https://blog.example.com")),
                ("WEBHOOK_TIMEOUT_SECS", Some("3")),
                ("MAIL_ALERTS_WEBHOOK_URL", Some("https://hooks.example.com/a")),
            ],
            || {
                let config = Config::from_env().unwrap();
                assert_eq!(config.site.to_string(), "My Blog (https://blog.example.com)");
                assert_eq!(config.dispatcher.timeout, Duration::from_secs(3));
                assert_eq!(
                    config.seed_webhook_url.as_deref(),
                    Some("https://hooks.example.com/a")
                );
            },
        );
    }

    #[test]
    fn test_config_requires_database_url() {
        temp_env::with_var_unset("DATABASE_URL", || {
            let err = Config::from_env().unwrap_err();
            assert!(err.to_string().contains("DATABASE_URL"));
        });
    }

    #[test]
    fn test_config_rejects_bad_timeout() {
        temp_env::with_vars(
            [
                ("DATABASE_URL", Some("postgres://localhost/mail_alerts")),
                ("WEBHOOK_TIMEOUT_SECS", Some("ten")),
            ],
            || {
                assert!(Config::from_env().is_err());
            },
        );
    }

    #[test]
    fn test_config_rejects_zero_prune_interval() {
        temp_env::with_vars(
            [
                ("DATABASE_URL", Some("postgres://localhost/mail_alerts")),
                ("PRUNE_INTERVAL_SECS", Some("0")),
            ],
            || {
                let err = PruneConfig::from_env().unwrap_err();
                assert!(matches!(
                    err,
                    ConfigError::ParseError { ref key, .. } if key == "PRUNE_INTERVAL_SECS"
                ));
                assert!(Config::from_env().is_err());
            },
        );
    }
}
