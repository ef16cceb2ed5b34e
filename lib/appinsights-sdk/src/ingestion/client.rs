use std::{sync::Arc, time::Duration};

use reqwest_middleware::ClientWithMiddleware;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, warn};

use crate::{
    client::TelemetryClient,
    connection_string::ConnectionString,
    envelope::{Envelope, EnvelopeContext},
    error::TelemetryError,
    ingestion::{
        buffer::{AddStatus, Buffer},
        builder::AppInsightsClientBuilder,
    },
    telemetry::{EventTelemetry, ExceptionTelemetry},
};

/// Posts batches to the track endpoint. Cheap to clone into a spawned send.
#[derive(Clone)]
pub(crate) struct BatchSender {
    pub(crate) client: ClientWithMiddleware,
    pub(crate) endpoint: Arc<str>,
}

impl BatchSender {
    async fn send(&self, envelopes: &[Envelope]) -> Result<(), TelemetryError> {
        let resp = self
            .client
            .post(&*self.endpoint)
            .json(envelopes)
            .send()
            .await
            .map_err(|e| TelemetryError::Unknown(e.to_string()))?;

        let status = resp.status();
        match status {
            reqwest::StatusCode::OK => Ok(()),
            reqwest::StatusCode::PARTIAL_CONTENT => {
                warn!(
                    "telemetry batch partially accepted: {}",
                    resp.text().await.unwrap_or_default()
                );
                Ok(())
            }
            reqwest::StatusCode::BAD_REQUEST => Err(TelemetryError::BadRequest(
                resp.text().await.unwrap_or_default(),
            )),
            reqwest::StatusCode::UNAUTHORIZED => Err(TelemetryError::Unauthorized),
            reqwest::StatusCode::FORBIDDEN => Err(TelemetryError::Forbidden),
            reqwest::StatusCode::TOO_MANY_REQUESTS => Err(TelemetryError::RateLimited),
            _ => Err(TelemetryError::Unknown(format!(
                "({}) {}",
                status,
                resp.text().await.unwrap_or_default()
            ))),
        }
    }
}

/// Telemetry client that ships records to the Application Insights ingestion endpoint.
///
/// `track_*` queue the record. A full buffer is sent right away on the current Tokio
/// runtime; anything short of that waits for `flush`, driven either by
/// `start_flush_interval` or by the owner.
pub struct AppInsightsClient {
    pub(crate) connection: ConnectionString,
    pub(crate) envelope_context: EnvelopeContext,
    pub(crate) buffer: Buffer<Envelope>,
    pub(crate) sender: BatchSender,
    pub(crate) flush_interval: Duration,
}

impl AppInsightsClient {
    pub fn builder() -> AppInsightsClientBuilder {
        AppInsightsClientBuilder::default()
    }

    pub fn instrumentation_key(&self) -> &str {
        &self.connection.instrumentation_key
    }

    pub fn endpoint(&self) -> &str {
        &self.sender.endpoint
    }

    pub fn pending(&self) -> Result<usize, TelemetryError> {
        self.buffer.len()
    }

    fn enqueue(&self, envelope: Envelope) -> Result<(), TelemetryError> {
        if let AddStatus::Full { drained } = self.buffer.add(envelope)? {
            self.handle_drained(drained)?;
        }
        Ok(())
    }

    fn handle_drained(&self, drained: Vec<Envelope>) -> Result<(), TelemetryError> {
        let Ok(runtime) = tokio::runtime::Handle::try_current() else {
            // Outside a runtime there is nothing to send on; keep the batch for the next flush.
            return self.buffer.requeue(drained);
        };

        let sender = self.sender.clone();
        runtime.spawn(async move {
            debug!("buffer full, sending {} telemetry items", drained.len());
            sender
                .send(&drained)
                .await
                .unwrap_or_else(|e| error!("Failed to send full telemetry buffer: {}", e));
        });
        Ok(())
    }

    /// Sends everything queued so far as one batch.
    pub async fn flush(&self) -> Result<(), TelemetryError> {
        let envelopes = self.buffer.drain()?;
        if envelopes.is_empty() {
            return Ok(());
        }
        debug!("sending {} telemetry items", envelopes.len());
        self.sender.send(&envelopes).await
    }

    /// Flushes every `flush_interval`. Flushes one last time and returns when `token`
    /// is cancelled.
    pub async fn start_flush_interval(&self, token: &CancellationToken) {
        loop {
            tokio::select! {
                _ = token.cancelled() => {
                    self.flush()
                        .await
                        .unwrap_or_else(|e| error!("Failed to flush telemetry during shutdown: {}", e));
                    return;
                }
                _ = tokio::time::sleep(self.flush_interval) => {
                    self.flush()
                        .await
                        .unwrap_or_else(|e| error!("Failed to flush telemetry: {}", e));
                }
            }
        }
    }
}

impl TelemetryClient for AppInsightsClient {
    fn track_event(&self, event: EventTelemetry) -> Result<(), TelemetryError> {
        self.enqueue(self.envelope_context.event(&event))
    }

    fn track_exception(&self, exception: ExceptionTelemetry) -> Result<(), TelemetryError> {
        self.enqueue(self.envelope_context.exception(&exception))
    }
}
