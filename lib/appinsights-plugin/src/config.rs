use std::time::Duration;

use appinsights_sdk::{AppInsightsClient, AppInsightsClientBuilder, TelemetryError};
use envconfig::Envconfig;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

#[derive(Envconfig)]
pub struct AppInsightsEnv {
    #[envconfig(from = "APPLICATIONINSIGHTS_CONNECTION_STRING")]
    pub connection_string: Option<String>,
}

#[derive(Debug, thiserror::Error)]
pub enum PluginConfigError {
    #[error("failed to read Application Insights environment variables: {0}")]
    Env(#[from] envconfig::Error),
    #[error("failed to create the Application Insights client: {0}")]
    Client(#[from] TelemetryError),
}

#[derive(Debug, Deserialize, Serialize, JsonSchema, Clone)]
#[serde(deny_unknown_fields)]
pub struct AppInsightsPluginConfig {
    /// The Application Insights connection string, or a bare instrumentation key.
    ///
    /// Can also be set using the `APPLICATIONINSIGHTS_CONNECTION_STRING` environment variable.
    #[serde(default)]
    pub connection_string: Option<String>,
    /// Added as `logName` to every record. Useful when several servers report to the same resource.
    #[serde(default)]
    pub log_name: Option<String>,
    /// Value of the `ai.cloud.role` tag.
    #[serde(default)]
    pub role_name: Option<String>,
    /// Number of queued records that triggers a flush before the interval elapses.
    #[serde(default = "default_buffer_size")]
    pub buffer_size: usize,
    /// How often queued records are sent.
    /// Default: 15s.
    #[serde(
        default = "default_flush_interval",
        deserialize_with = "humantime_serde::deserialize",
        serialize_with = "humantime_serde::serialize"
    )]
    #[schemars(with = "String")]
    pub flush_interval: Duration,
    /// Connection timeout for ingestion requests.
    #[serde(
        default = "default_connect_timeout",
        deserialize_with = "humantime_serde::deserialize",
        serialize_with = "humantime_serde::serialize"
    )]
    #[schemars(with = "String")]
    pub connect_timeout: Duration,
    /// Request timeout for ingestion requests.
    #[serde(
        default = "default_request_timeout",
        deserialize_with = "humantime_serde::deserialize",
        serialize_with = "humantime_serde::serialize"
    )]
    #[schemars(with = "String")]
    pub request_timeout: Duration,
    /// Retries for transient ingestion failures, with exponential backoff.
    #[serde(default = "default_max_retries")]
    pub max_retries: u32,
}

fn default_buffer_size() -> usize {
    250
}

fn default_flush_interval() -> Duration {
    Duration::from_secs(15)
}

fn default_connect_timeout() -> Duration {
    Duration::from_secs(5)
}

fn default_request_timeout() -> Duration {
    Duration::from_secs(15)
}

fn default_max_retries() -> u32 {
    3
}

fn non_blank(value: &Option<String>) -> Option<&str> {
    value
        .as_deref()
        .map(str::trim)
        .filter(|value| !value.is_empty())
}

impl Default for AppInsightsPluginConfig {
    fn default() -> Self {
        Self {
            connection_string: None,
            log_name: None,
            role_name: None,
            buffer_size: default_buffer_size(),
            flush_interval: default_flush_interval(),
            connect_timeout: default_connect_timeout(),
            request_timeout: default_request_timeout(),
            max_retries: default_max_retries(),
        }
    }
}

impl AppInsightsPluginConfig {
    /// The configured connection string, falling back to the environment.
    /// Blank values count as missing.
    pub fn resolve_connection_string(&self, env: &AppInsightsEnv) -> Option<String> {
        non_blank(&self.connection_string)
            .or_else(|| non_blank(&env.connection_string))
            .map(str::to_string)
    }

    pub fn client_builder(&self, connection_string: impl Into<String>) -> AppInsightsClientBuilder {
        let mut builder = AppInsightsClient::builder()
            .connection_string(connection_string)
            .buffer_size(self.buffer_size)
            .flush_interval(self.flush_interval)
            .connect_timeout(self.connect_timeout)
            .request_timeout(self.request_timeout)
            .max_retries(self.max_retries)
            .user_agent(format!("graphql-appinsights-plugin/{}", env!("CARGO_PKG_VERSION")));

        if let Some(role_name) = &self.role_name {
            builder = builder.role_name(role_name);
        }

        builder
    }
}
