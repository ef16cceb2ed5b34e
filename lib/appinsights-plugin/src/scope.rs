use std::sync::Arc;

use appinsights_sdk::{
    EventTelemetry, ExceptionDetails, ExceptionTelemetry, PropertyBag, TelemetryClient,
    TelemetryError,
};
use uuid::Uuid;

/// One correlation scope: a server session or a single request.
///
/// Every record sent through a scope carries its `requestId`, and `logName`
/// when one is configured.
pub(crate) struct TelemetryScope {
    client: Arc<dyn TelemetryClient>,
    log_name: Option<Arc<str>>,
    request_id: Uuid,
}

impl TelemetryScope {
    pub fn new(client: Arc<dyn TelemetryClient>, log_name: Option<Arc<str>>) -> Self {
        Self {
            client,
            log_name,
            request_id: Uuid::new_v4(),
        }
    }

    pub fn request_id(&self) -> Uuid {
        self.request_id
    }

    fn tag(&self, properties: PropertyBag) -> Result<PropertyBag, TelemetryError> {
        properties
            .with("requestId", &self.request_id)?
            .with_opt("logName", self.log_name.as_deref())
    }

    pub fn track_event(&self, name: &str, properties: PropertyBag) -> Result<(), TelemetryError> {
        let properties = self.tag(properties)?;
        self.client
            .track_event(EventTelemetry::new(name, properties))
    }

    pub fn track_exception(
        &self,
        exception: ExceptionDetails,
        properties: PropertyBag,
    ) -> Result<(), TelemetryError> {
        let properties = self.tag(properties)?;
        self.client
            .track_exception(ExceptionTelemetry::new(exception, properties))
    }
}
