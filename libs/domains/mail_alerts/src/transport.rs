//! Host mail transport seam.

use crate::dispatcher::FailureNotifier;
use crate::models::{OutgoingMail, SendFailure, SendReceipt};
use crate::pipeline::MailPipeline;
use crate::repository::MailLogRepository;
use async_trait::async_trait;
use tracing::debug;

/// Something that actually transmits mail.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait MailTransport: Send + Sync {
    async fn send(&self, mail: &OutgoingMail) -> Result<SendReceipt, SendFailure>;
}

/// Transport wrapper that reports every send to a [`MailPipeline`].
///
/// The inner transport's result is returned untouched; recording happens in the
/// background.
pub struct InstrumentedTransport<T, R: MailLogRepository + ?Sized, N: FailureNotifier + ?Sized> {
    inner: T,
    pipeline: MailPipeline<R, N>,
}

impl<T, R, N> InstrumentedTransport<T, R, N>
where
    T: MailTransport,
    R: MailLogRepository + ?Sized + 'static,
    N: FailureNotifier + ?Sized + 'static,
{
    pub fn new(inner: T, pipeline: MailPipeline<R, N>) -> Self {
        Self { inner, pipeline }
    }

    pub fn pipeline(&self) -> &MailPipeline<R, N> {
        &self.pipeline
    }
}

#[async_trait]
impl<T, R, N> MailTransport for InstrumentedTransport<T, R, N>
where
    T: MailTransport,
    R: MailLogRepository + ?Sized + 'static,
    N: FailureNotifier + ?Sized + 'static,
{
    async fn send(&self, mail: &OutgoingMail) -> Result<SendReceipt, SendFailure> {
        let send_id = self.pipeline.send_initiated(mail.clone()).await;

        match self.inner.send(mail).await {
            Ok(receipt) => {
                self.pipeline.send_succeeded(send_id, receipt.clone()).await;
                Ok(receipt)
            }
            Err(failure) => {
                debug!(send_id = %send_id, error = %failure, "Transport reported failure");
                self.pipeline
                    .send_failed(Some(send_id), failure.clone().or_metadata_from(mail))
                    .await;
                Err(failure)
            }
        }
    }
}
