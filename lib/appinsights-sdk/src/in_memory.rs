use std::sync::Mutex;

use crate::{
    client::TelemetryClient,
    error::TelemetryError,
    telemetry::{EventTelemetry, ExceptionTelemetry},
};

/// Keeps every tracked record in memory instead of sending it.
/// Meant for tests and local development.
#[derive(Default)]
pub struct InMemoryTelemetryClient {
    events: Mutex<Vec<EventTelemetry>>,
    exceptions: Mutex<Vec<ExceptionTelemetry>>,
    failure: Mutex<Option<String>>,
}

impl InMemoryTelemetryClient {
    pub fn new() -> Self {
        Self::default()
    }

    /// A client whose every `track_*` call fails with `message`.
    pub fn failing(message: impl Into<String>) -> Self {
        let client = Self::default();
        client.fail_with(message);
        client
    }

    /// Makes every following `track_*` call fail with `message`.
    pub fn fail_with(&self, message: impl Into<String>) {
        *self.failure.lock().unwrap_or_else(|e| e.into_inner()) = Some(message.into());
    }

    pub fn events(&self) -> Vec<EventTelemetry> {
        self.events
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .clone()
    }

    pub fn exceptions(&self) -> Vec<ExceptionTelemetry> {
        self.exceptions
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .clone()
    }

    pub fn event_names(&self) -> Vec<String> {
        self.events
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .iter()
            .map(|event| event.name.clone())
            .collect()
    }

    fn check_failure(&self) -> Result<(), TelemetryError> {
        match self
            .failure
            .lock()
            .map_err(|e| TelemetryError::Lock(e.to_string()))?
            .as_ref()
        {
            Some(message) => Err(TelemetryError::Unknown(message.clone())),
            None => Ok(()),
        }
    }
}

impl TelemetryClient for InMemoryTelemetryClient {
    fn track_event(&self, event: EventTelemetry) -> Result<(), TelemetryError> {
        self.check_failure()?;
        self.events
            .lock()
            .map_err(|e| TelemetryError::Lock(e.to_string()))?
            .push(event);
        Ok(())
    }

    fn track_exception(&self, exception: ExceptionTelemetry) -> Result<(), TelemetryError> {
        self.check_failure()?;
        self.exceptions
            .lock()
            .map_err(|e| TelemetryError::Lock(e.to_string()))?
            .push(exception);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::InMemoryTelemetryClient;
    use crate::{
        client::TelemetryClient,
        telemetry::{EventTelemetry, PropertyBag},
    };

    #[test]
    fn records_in_order_and_can_fail_on_demand() {
        let client = InMemoryTelemetryClient::new();
        client
            .track_event(EventTelemetry::new("a", PropertyBag::new()))
            .unwrap();
        client
            .track_event(EventTelemetry::new("b", PropertyBag::new()))
            .unwrap();
        assert_eq!(client.event_names(), vec!["a", "b"]);

        let failing = InMemoryTelemetryClient::failing("ingestion offline");
        let err = failing
            .track_event(EventTelemetry::new("a", PropertyBag::new()))
            .unwrap_err();
        assert_eq!(err.to_string(), "unable to send telemetry: ingestion offline");
        assert!(failing.events().is_empty());

        client.fail_with("quota exceeded");
        assert!(client
            .track_event(EventTelemetry::new("c", PropertyBag::new()))
            .is_err());
        assert_eq!(client.event_names(), vec!["a", "b"]);
    }
}
