use axum::Router;
use axum::routing::{delete, get, post};
use std::time::Duration;
use tower_http::timeout::TimeoutLayer;
use tower_http::trace::TraceLayer;

use crate::state::AppState;

pub mod admin;
pub mod events;
pub mod health;

/// Handlers that outlive this are cut off with 408.
const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

/// Routes under `/api`.
pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/events/initiated", post(events::send_initiated))
        .route("/events/{send_id}/succeeded", post(events::send_succeeded))
        .route("/events/failed", post(events::send_failed))
        .route("/logs", get(admin::list_logs).delete(admin::clear_logs))
        .route(
            "/settings/webhook",
            get(admin::get_webhook).put(admin::save_webhook),
        )
        .route("/test/email", post(admin::send_test_email))
        .route("/test/alert", post(admin::send_test_alert))
}

/// The full application: health probes plus `/api`, with tracing and a request timeout.
pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health::health_handler))
        .route("/ready", get(health::ready_handler))
        .nest("/api", routes())
        .layer(TraceLayer::new_for_http())
        .layer(TimeoutLayer::new(REQUEST_TIMEOUT))
        .with_state(state)
}

#[cfg(test)]
pub(crate) mod test_support {
    use axum::body::Body;
    use axum::http::{Request, Response};
    use domain_mail_alerts::{
        DispatchOutcome, FailureAlert, FailureNotifier, InMemoryMailLogRepository,
        InMemorySettingsStore, MailAlertResult, MailTransport, OutgoingMail, SendFailure,
        SendReceipt,
    };
    use http_body_util::BodyExt;
    use sea_orm::{DatabaseBackend, MockDatabase};
    use std::sync::Arc;
    use std::sync::atomic::{AtomicUsize, Ordering};

    use crate::state::AppState;

    /// Counts alerts and reports a fixed outcome.
    #[derive(Default)]
    pub struct RecordingNotifier {
        pub calls: AtomicUsize,
        pub fail: bool,
        pub configured: bool,
    }

    #[async_trait::async_trait]
    impl FailureNotifier for RecordingNotifier {
        async fn notify_failure(&self, _alert: &FailureAlert) -> MailAlertResult<DispatchOutcome> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            if !self.configured {
                Ok(DispatchOutcome::Skipped)
            } else if self.fail {
                Err(domain_mail_alerts::MailAlertError::Dispatch(
                    "Webhook responded with 500".to_string(),
                ))
            } else {
                Ok(DispatchOutcome::Delivered)
            }
        }
    }

    /// Transport that accepts everything, or refuses everything.
    pub struct StubMailer {
        pub refuse: bool,
    }

    #[async_trait::async_trait]
    impl MailTransport for StubMailer {
        async fn send(&self, _mail: &OutgoingMail) -> Result<SendReceipt, SendFailure> {
            if self.refuse {
                Err(SendFailure::new("Connection refused"))
            } else {
                Ok(SendReceipt::default())
            }
        }
    }

    pub struct TestApp {
        pub state: AppState,
        pub repository: Arc<InMemoryMailLogRepository>,
        pub settings: Arc<InMemorySettingsStore>,
        pub notifier: Arc<RecordingNotifier>,
    }

    impl TestApp {
        pub fn new(notifier: RecordingNotifier, mailer: StubMailer) -> Self {
            let repository = Arc::new(InMemoryMailLogRepository::new());
            let settings = Arc::new(InMemorySettingsStore::new());
            let notifier = Arc::new(notifier);
            let db = MockDatabase::new(DatabaseBackend::Postgres).into_connection();

            let state = AppState::from_parts(
                db,
                repository.clone(),
                settings.clone(),
                notifier.clone(),
                mailer,
            );

            Self {
                state,
                repository,
                settings,
                notifier,
            }
        }

        pub fn router(&self) -> axum::Router {
            super::router(self.state.clone())
        }

        pub fn alerts(&self) -> usize {
            self.notifier.calls.load(Ordering::SeqCst)
        }
    }

    impl Default for TestApp {
        fn default() -> Self {
            Self::new(RecordingNotifier::default(), StubMailer { refuse: false })
        }
    }

    pub fn json_request(method: &str, uri: &str, body: serde_json::Value) -> Request<Body> {
        Request::builder()
            .method(method)
            .uri(uri)
            .header("content-type", "application/json")
            .body(Body::from(body.to_string()))
            .unwrap()
    }

    pub fn empty_request(method: &str, uri: &str) -> Request<Body> {
        Request::builder()
            .method(method)
            .uri(uri)
            .body(Body::empty())
            .unwrap()
    }

    pub async fn json_body(response: Response<Body>) -> serde_json::Value {
        let bytes = response.into_body().collect().await.unwrap().to_bytes();
        serde_json::from_slice(&bytes).unwrap()
    }
}
