use std::sync::Arc;

use tracing::trace;

use crate::{
    hooks::{
        request_did_start::RequestListener,
        server_will_start::{SchemaContext, ServerListener, ServerWillStartPayload},
    },
    plugin_trait::GraphQLPluginBoxed,
    request_context::GraphQLRequestContext,
    BoxError,
};

/// Drives the plugin lifecycle on behalf of a server.
///
/// Plugins are called in order. The first hook error stops the fan-out and is
/// returned to the caller as is.
#[derive(Clone)]
pub struct LifecycleDispatcher {
    plugins: Arc<Vec<GraphQLPluginBoxed>>,
}

impl LifecycleDispatcher {
    pub fn new(plugins: Vec<GraphQLPluginBoxed>) -> Self {
        Self {
            plugins: Arc::new(plugins),
        }
    }

    pub fn plugins(&self) -> &[GraphQLPluginBoxed] {
        &self.plugins
    }

    pub async fn server_will_start(
        &self,
        payload: &ServerWillStartPayload,
    ) -> Result<ServerListeners, BoxError> {
        let mut listeners = Vec::with_capacity(self.plugins.len());
        for plugin in self.plugins.iter() {
            if let Some(listener) = plugin.server_will_start(payload).await? {
                trace!("plugin '{}' listens to the server lifecycle", plugin.name());
                listeners.push(listener);
            }
        }
        Ok(ServerListeners(listeners))
    }

    pub async fn request_did_start(
        &self,
        context: &GraphQLRequestContext,
    ) -> Result<RequestListeners, BoxError> {
        let mut listeners = Vec::with_capacity(self.plugins.len());
        for plugin in self.plugins.iter() {
            if let Some(listener) = plugin.request_did_start(context).await? {
                listeners.push(listener);
            }
        }
        Ok(RequestListeners(listeners))
    }

    pub async fn shutdown(&self) {
        for plugin in self.plugins.iter() {
            trace!("shutting down plugin '{}'", plugin.name());
            plugin.on_shutdown().await;
        }
    }
}

pub struct ServerListeners(Vec<Box<dyn ServerListener>>);

impl ServerListeners {
    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub async fn drain_server(&self) -> Result<(), BoxError> {
        for listener in &self.0 {
            listener.drain_server().await?;
        }
        Ok(())
    }

    pub fn schema_did_load_or_update(&self, context: &SchemaContext) -> Result<(), BoxError> {
        for listener in &self.0 {
            listener.schema_did_load_or_update(context)?;
        }
        Ok(())
    }

    pub async fn server_will_stop(&self) -> Result<(), BoxError> {
        for listener in &self.0 {
            listener.server_will_stop().await?;
        }
        Ok(())
    }
}

pub struct RequestListeners(Vec<Box<dyn RequestListener>>);

impl RequestListeners {
    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub async fn did_resolve_source(&self, context: &GraphQLRequestContext) -> Result<(), BoxError> {
        for listener in &self.0 {
            listener.did_resolve_source(context).await?;
        }
        Ok(())
    }

    pub async fn parsing_did_start(&self, context: &GraphQLRequestContext) -> Result<(), BoxError> {
        for listener in &self.0 {
            listener.parsing_did_start(context).await?;
        }
        Ok(())
    }

    pub async fn validation_did_start(
        &self,
        context: &GraphQLRequestContext,
    ) -> Result<(), BoxError> {
        for listener in &self.0 {
            listener.validation_did_start(context).await?;
        }
        Ok(())
    }

    pub async fn did_resolve_operation(
        &self,
        context: &GraphQLRequestContext,
    ) -> Result<(), BoxError> {
        for listener in &self.0 {
            listener.did_resolve_operation(context).await?;
        }
        Ok(())
    }

    /// Does nothing when the context carries no errors.
    pub async fn did_encounter_errors(
        &self,
        context: &GraphQLRequestContext,
    ) -> Result<(), BoxError> {
        if context.errors.is_empty() {
            return Ok(());
        }
        for listener in &self.0 {
            listener.did_encounter_errors(context).await?;
        }
        Ok(())
    }
}
