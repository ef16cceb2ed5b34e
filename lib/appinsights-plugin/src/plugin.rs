use std::sync::Arc;

use appinsights_sdk::{AppInsightsClient, TelemetryClient, TelemetryError};
use envconfig::Envconfig;
use graphql_plugin_api::{
    async_trait,
    background_tasks::BackgroundTasksManager,
    hooks::{
        on_plugin_init::{OnPluginInitPayload, OnPluginInitResult},
        request_did_start::RequestDidStartResult,
        server_will_start::{ServerWillStartPayload, ServerWillStartResult},
    },
    plugin_trait::GraphQLPlugin,
    request_context::GraphQLRequestContext,
};
use tracing::{debug, error, warn};

use crate::{
    config::{AppInsightsEnv, AppInsightsPluginConfig, PluginConfigError},
    flush_task::AppInsightsFlushTask,
    request::RequestSession,
    scope::TelemetryScope,
    session::ServerSession,
};

pub const PLUGIN_NAME: &str = "appinsights";

/// What the plugin is constructed from.
pub enum ClientInput {
    /// A connection string or bare instrumentation key. The plugin builds and owns the client.
    ConnectionString(String),
    /// A client owned by the caller.
    Client(Arc<dyn TelemetryClient>),
}

impl From<&str> for ClientInput {
    fn from(connection_string: &str) -> Self {
        Self::ConnectionString(connection_string.to_string())
    }
}

impl From<String> for ClientInput {
    fn from(connection_string: String) -> Self {
        Self::ConnectionString(connection_string)
    }
}

impl<T> From<Arc<T>> for ClientInput
where
    T: TelemetryClient + 'static,
{
    fn from(client: Arc<T>) -> Self {
        Self::Client(client)
    }
}

pub enum TelemetryClientSource {
    /// Supplied by the caller, who stays responsible for flushing it.
    Provided(Arc<dyn TelemetryClient>),
    /// Built by the plugin from a connection string.
    Owned(Arc<AppInsightsClient>),
}

impl TelemetryClientSource {
    pub fn client(&self) -> Arc<dyn TelemetryClient> {
        match self {
            Self::Provided(client) => client.clone(),
            Self::Owned(client) => client.clone(),
        }
    }
}

/// Forwards the server and request lifecycle to Application Insights.
///
/// Each server start and each request get their own `requestId`, attached to
/// every record of that scope.
pub struct AppInsightsPlugin {
    source: TelemetryClientSource,
    log_name: Option<Arc<str>>,
}

impl AppInsightsPlugin {
    pub fn new(
        client: impl Into<ClientInput>,
        log_name: Option<String>,
    ) -> Result<Self, TelemetryError> {
        let source = match client.into() {
            ClientInput::ConnectionString(connection_string) => TelemetryClientSource::Owned(
                AppInsightsClient::builder()
                    .connection_string(connection_string)
                    .build()?,
            ),
            ClientInput::Client(client) => TelemetryClientSource::Provided(client),
        };

        Ok(Self {
            source,
            log_name: log_name.map(Arc::from),
        })
    }

    pub fn with_client(client: Arc<dyn TelemetryClient>, log_name: Option<String>) -> Self {
        Self {
            source: TelemetryClientSource::Provided(client),
            log_name: log_name.map(Arc::from),
        }
    }

    pub fn from_connection_string(
        connection_string: &str,
        log_name: Option<String>,
    ) -> Result<Self, TelemetryError> {
        Self::new(connection_string, log_name)
    }

    pub fn client_source(&self) -> &TelemetryClientSource {
        &self.source
    }

    pub fn log_name(&self) -> Option<&str> {
        self.log_name.as_deref()
    }

    /// Registers the periodic flush of an owned client. Provided clients are left alone.
    pub fn register_background_tasks(&self, bg_tasks_manager: &mut BackgroundTasksManager) {
        if let TelemetryClientSource::Owned(client) = &self.source {
            bg_tasks_manager.register_task(AppInsightsFlushTask::new(client.clone()));
        }
    }

    fn scope(&self) -> TelemetryScope {
        TelemetryScope::new(self.source.client(), self.log_name.clone())
    }
}

#[async_trait]
impl GraphQLPlugin for AppInsightsPlugin {
    type Config = AppInsightsPluginConfig;

    fn plugin_name() -> &'static str {
        PLUGIN_NAME
    }

    fn on_plugin_init(mut payload: OnPluginInitPayload<Self>) -> OnPluginInitResult<Self> {
        let config = payload.config()?;
        let env = AppInsightsEnv::init_from_env().map_err(PluginConfigError::from)?;

        let Some(connection_string) = config.resolve_connection_string(&env) else {
            warn!(
                "No Application Insights connection string configured, set 'connection_string' or APPLICATIONINSIGHTS_CONNECTION_STRING. Disabling plugin '{}'",
                PLUGIN_NAME
            );
            return payload.disable_plugin();
        };

        let client = config
            .client_builder(connection_string)
            .build()
            .map_err(PluginConfigError::from)?;
        debug!(
            "Application Insights telemetry goes to {}",
            client.endpoint()
        );

        let plugin = Self {
            source: TelemetryClientSource::Owned(client),
            log_name: config.log_name.map(Arc::from),
        };
        plugin.register_background_tasks(payload.background_tasks());

        payload.initialize_plugin(plugin)
    }

    async fn server_will_start<'exec>(
        &'exec self,
        payload: &'exec ServerWillStartPayload,
    ) -> ServerWillStartResult {
        let session = ServerSession::start(self.scope(), payload)?;
        Ok(Some(Box::new(session)))
    }

    async fn request_did_start<'exec>(
        &'exec self,
        context: &'exec GraphQLRequestContext,
    ) -> RequestDidStartResult {
        let session = RequestSession::start(self.scope(), context)?;
        Ok(Some(Box::new(session)))
    }

    async fn on_shutdown<'exec>(&'exec self) {
        if let TelemetryClientSource::Owned(client) = &self.source {
            if let Err(err) = client.flush().await {
                error!("Failed to flush Application Insights telemetry: {}", err);
            }
        }
    }
}
