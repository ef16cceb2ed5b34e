use appinsights_sdk::PropertyBag;
use graphql_plugin_api::{
    async_trait,
    hooks::server_will_start::{SchemaContext, ServerListener, ServerWillStartPayload},
    BoxError,
};
use tracing::trace;

use crate::scope::TelemetryScope;

/// Lives from `serviceWillStart` until `serverWillStop` and shares its `requestId`
/// with every server-level record in between.
pub struct ServerSession {
    scope: TelemetryScope,
}

impl ServerSession {
    /// Opens the session and emits `serviceWillStart`.
    pub(crate) fn start(
        scope: TelemetryScope,
        payload: &ServerWillStartPayload,
    ) -> Result<Self, BoxError> {
        trace!(request_id = %scope.request_id(), "serviceWillStart");
        scope.track_event(
            "serviceWillStart",
            PropertyBag::new()
                .with("apolloConfig", &payload.config)?
                .with("schema", &payload.schema)?
                .with("serverlessFramework", &payload.serverless_framework)?,
        )?;

        Ok(Self { scope })
    }
}

#[async_trait]
impl ServerListener for ServerSession {
    async fn drain_server(&self) -> Result<(), BoxError> {
        trace!(request_id = %self.scope.request_id(), "drainServer");
        self.scope.track_event("drainServer", PropertyBag::new())?;
        Ok(())
    }

    fn schema_did_load_or_update(&self, context: &SchemaContext) -> Result<(), BoxError> {
        trace!(request_id = %self.scope.request_id(), "schemaDidLoadOrUpdate");
        self.scope.track_event(
            "schemaDidLoadOrUpdate",
            PropertyBag::new().with("schema", context.api_schema.sdl())?,
        )?;
        Ok(())
    }

    async fn server_will_stop(&self) -> Result<(), BoxError> {
        trace!(request_id = %self.scope.request_id(), "serverWillStop");
        self.scope.track_event("serverWillStop", PropertyBag::new())?;
        Ok(())
    }
}
