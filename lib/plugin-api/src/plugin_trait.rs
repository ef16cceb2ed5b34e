use serde::de::DeserializeOwned;

use crate::{
    hooks::{
        on_plugin_init::{OnPluginInitPayload, OnPluginInitResult},
        request_did_start::RequestDidStartResult,
        server_will_start::{ServerWillStartPayload, ServerWillStartResult},
    },
    request_context::GraphQLRequestContext,
};

/// A plugin observes the server and request lifecycle.
///
/// `server_will_start` runs once per server start and `request_did_start` once per
/// incoming request. Both may hand back a listener that receives the rest of that
/// lifecycle. Returning `Ok(None)` means the plugin is not interested.
#[async_trait::async_trait]
pub trait GraphQLPlugin: Send + Sync + 'static {
    fn plugin_name() -> &'static str;

    type Config: DeserializeOwned + Sync;

    fn on_plugin_init(payload: OnPluginInitPayload<Self>) -> OnPluginInitResult<Self>
    where
        Self: Sized;

    #[inline]
    async fn server_will_start<'exec>(
        &'exec self,
        _payload: &'exec ServerWillStartPayload,
    ) -> ServerWillStartResult {
        Ok(None)
    }
    #[inline]
    async fn request_did_start<'exec>(
        &'exec self,
        _context: &'exec GraphQLRequestContext,
    ) -> RequestDidStartResult {
        Ok(None)
    }
    #[inline]
    async fn on_shutdown<'exec>(&'exec self) {}
}

#[async_trait::async_trait]
pub trait DynGraphQLPlugin: Send + Sync + 'static {
    fn name(&self) -> &'static str;
    async fn server_will_start<'exec>(
        &'exec self,
        payload: &'exec ServerWillStartPayload,
    ) -> ServerWillStartResult;
    async fn request_did_start<'exec>(
        &'exec self,
        context: &'exec GraphQLRequestContext,
    ) -> RequestDidStartResult;
    async fn on_shutdown<'exec>(&'exec self);
}

#[async_trait::async_trait]
impl<P> DynGraphQLPlugin for P
where
    P: GraphQLPlugin,
{
    #[inline]
    fn name(&self) -> &'static str {
        P::plugin_name()
    }
    #[inline]
    async fn server_will_start<'exec>(
        &'exec self,
        payload: &'exec ServerWillStartPayload,
    ) -> ServerWillStartResult {
        GraphQLPlugin::server_will_start(self, payload).await
    }
    #[inline]
    async fn request_did_start<'exec>(
        &'exec self,
        context: &'exec GraphQLRequestContext,
    ) -> RequestDidStartResult {
        GraphQLPlugin::request_did_start(self, context).await
    }
    #[inline]
    async fn on_shutdown<'exec>(&'exec self) {
        GraphQLPlugin::on_shutdown(self).await;
    }
}

pub type GraphQLPluginBoxed = Box<dyn DynGraphQLPlugin>;
