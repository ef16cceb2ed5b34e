use appinsights_sdk::{ExceptionDetails, PropertyBag, TelemetryError};
use graphql_plugin_api::{
    async_trait, graphql_error::GraphQLError, hooks::request_did_start::RequestListener,
    request_context::{GraphQLRequestContext, HeaderList}, BoxError,
};
use serde_json::{Map, Value};
use tracing::trace;

use crate::scope::TelemetryScope;

/// Turns the header list into a `name -> value` object.
/// A repeated name keeps its last value, a value that can't be read becomes `null`.
pub fn flatten_headers(headers: Option<&HeaderList>) -> Map<String, Value> {
    let mut flattened = Map::new();
    for (name, value) in headers.into_iter().flat_map(HeaderList::iter) {
        flattened.insert(
            name.to_string(),
            value.map_or(Value::Null, |value| Value::String(value.to_string())),
        );
    }
    flattened
}

/// Telemetry of one GraphQL request, correlated by the `requestId` assigned in `requestDidStart`.
pub struct RequestSession {
    scope: TelemetryScope,
}

impl RequestSession {
    /// Opens the session and emits `requestDidStart`.
    pub(crate) fn start(
        scope: TelemetryScope,
        context: &GraphQLRequestContext,
    ) -> Result<Self, BoxError> {
        trace!(request_id = %scope.request_id(), "requestDidStart");
        scope.track_event(
            "requestDidStart",
            PropertyBag::new()
                .with("metrics", &context.metrics)?
                .with("request", &context.request)?
                .with("headers", &flatten_headers(context.headers()))?
                .with("isDebug", &context.debug)?
                .with("operationName", &context.operation_name)?
                .with("operation", &context.operation)?,
        )?;

        Ok(Self { scope })
    }

    /// `didResolveSource`, `parsingDidStart` and `validationDidStart` share their properties.
    fn track_source_event(
        &self,
        name: &str,
        context: &GraphQLRequestContext,
    ) -> Result<(), TelemetryError> {
        trace!(request_id = %self.scope.request_id(), "{}", name);
        self.scope.track_event(
            name,
            PropertyBag::new()
                .with("source", &context.source)?
                .with("queryHash", &context.query_hash)?
                .with("metrics", &context.metrics)?,
        )
    }

    fn track_error(&self, error: &GraphQLError) -> Result<(), TelemetryError> {
        self.scope.track_exception(
            ExceptionDetails::new("GraphQLError", error.message.as_str()),
            PropertyBag::new()
                .with_opt("path", error.path.as_ref())?
                .with_opt("locations", error.locations.as_ref())?
                .with_opt("extensions", error.extensions.as_ref())?,
        )
    }
}

#[async_trait]
impl RequestListener for RequestSession {
    async fn did_resolve_source(&self, context: &GraphQLRequestContext) -> Result<(), BoxError> {
        self.track_source_event("didResolveSource", context)?;
        Ok(())
    }

    async fn parsing_did_start(&self, context: &GraphQLRequestContext) -> Result<(), BoxError> {
        self.track_source_event("parsingDidStart", context)?;
        Ok(())
    }

    async fn validation_did_start(
        &self,
        context: &GraphQLRequestContext,
    ) -> Result<(), BoxError> {
        self.track_source_event("validationDidStart", context)?;
        Ok(())
    }

    async fn did_resolve_operation(
        &self,
        context: &GraphQLRequestContext,
    ) -> Result<(), BoxError> {
        trace!(request_id = %self.scope.request_id(), "didResolveOperation");
        self.scope.track_event(
            "didResolveOperation",
            PropertyBag::new()
                .with("operationName", &context.operation_name)?
                .with("operation", &context.operation)?,
        )?;
        Ok(())
    }

    async fn did_encounter_errors(
        &self,
        context: &GraphQLRequestContext,
    ) -> Result<(), BoxError> {
        trace!(
            request_id = %self.scope.request_id(),
            "didEncounterErrors ({} errors)",
            context.errors.len()
        );
        for error in &context.errors {
            self.track_error(error)?;
        }
        Ok(())
    }
}
