use std::{sync::Arc, time::Duration};

use reqwest::header::{HeaderMap, HeaderValue};
use reqwest_middleware::ClientBuilder;
use reqwest_retry::RetryTransientMiddleware;
use retry_policies::policies::ExponentialBackoff;

use crate::{
    connection_string::ConnectionString,
    envelope::EnvelopeContext,
    error::TelemetryError,
    ingestion::{
        buffer::Buffer,
        client::{AppInsightsClient, BatchSender},
    },
};

pub struct AppInsightsClientBuilder {
    connection_string: Option<String>,
    buffer_size: usize,
    flush_interval: Duration,
    connect_timeout: Duration,
    request_timeout: Duration,
    retry_policy: ExponentialBackoff,
    user_agent: Option<String>,
    role_name: Option<String>,
}

impl Default for AppInsightsClientBuilder {
    fn default() -> Self {
        Self {
            connection_string: None,
            buffer_size: 250,
            flush_interval: Duration::from_secs(15),
            connect_timeout: Duration::from_secs(5),
            request_timeout: Duration::from_secs(15),
            retry_policy: ExponentialBackoff::builder().build_with_max_retries(3),
            user_agent: None,
            role_name: None,
        }
    }
}

fn non_empty_string(value: String) -> Option<String> {
    Some(value).filter(|str| !str.trim().is_empty())
}

impl AppInsightsClientBuilder {
    /// A full connection string (`InstrumentationKey=...;IngestionEndpoint=...`) or a bare instrumentation key.
    pub fn connection_string(mut self, connection_string: impl Into<String>) -> Self {
        self.connection_string = non_empty_string(connection_string.into());
        self
    }
    /// Number of queued items that are sent as a batch without waiting for the interval
    /// Default: 250
    pub fn buffer_size(mut self, buffer_size: usize) -> Self {
        self.buffer_size = buffer_size;
        self
    }
    /// Frequency of flushing the buffer to the ingestion endpoint
    /// Default: 15 seconds
    pub fn flush_interval(mut self, flush_interval: Duration) -> Self {
        self.flush_interval = flush_interval;
        self
    }
    /// A timeout for only the connect phase of a request
    /// Default: 5 seconds
    pub fn connect_timeout(mut self, connect_timeout: Duration) -> Self {
        self.connect_timeout = connect_timeout;
        self
    }
    /// A timeout for the entire request
    /// Default: 15 seconds
    pub fn request_timeout(mut self, request_timeout: Duration) -> Self {
        self.request_timeout = request_timeout;
        self
    }
    /// Retries of a batch after a transient failure, with exponential backoff
    /// Default: 3
    pub fn max_retries(mut self, max_retries: u32) -> Self {
        self.retry_policy = ExponentialBackoff::builder().build_with_max_retries(max_retries);
        self
    }
    /// Overrides reqwest's default User-Agent
    pub fn user_agent(mut self, user_agent: impl Into<String>) -> Self {
        self.user_agent = non_empty_string(user_agent.into());
        self
    }
    /// Value of the `ai.cloud.role` tag on every item
    pub fn role_name(mut self, role_name: impl Into<String>) -> Self {
        self.role_name = non_empty_string(role_name.into());
        self
    }

    pub fn build(self) -> Result<Arc<AppInsightsClient>, TelemetryError> {
        let connection: ConnectionString = self
            .connection_string
            .as_deref()
            .ok_or(TelemetryError::MissingInstrumentationKey)?
            .parse()?;

        let mut default_headers = HeaderMap::new();
        default_headers.insert(
            reqwest::header::CONTENT_TYPE,
            HeaderValue::from_static("application/json"),
        );

        let mut reqwest_agent = reqwest::Client::builder()
            .connect_timeout(self.connect_timeout)
            .timeout(self.request_timeout)
            .default_headers(default_headers);

        if let Some(user_agent) = &self.user_agent {
            reqwest_agent = reqwest_agent.user_agent(user_agent);
        }

        let reqwest_agent = reqwest_agent
            .build()
            .map_err(TelemetryError::HTTPClientCreationError)?;
        let client = ClientBuilder::new(reqwest_agent)
            .with(RetryTransientMiddleware::new_with_policy(self.retry_policy))
            .build();

        Ok(Arc::new(AppInsightsClient {
            sender: BatchSender {
                client,
                endpoint: Arc::from(connection.track_url()),
            },
            envelope_context: EnvelopeContext::new(
                connection.instrumentation_key.clone(),
                self.role_name,
            ),
            connection,
            buffer: Buffer::new(self.buffer_size),
            flush_interval: self.flush_interval,
        }))
    }
}
