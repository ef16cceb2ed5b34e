use std::error::Error;

use chrono::{DateTime, Utc};
use serde::Serialize;
use serde_json::{Map, Value};

use crate::error::TelemetryError;

/// Custom properties attached to a telemetry record.
/// Values keep their JSON shape until the record is turned into an envelope.
#[derive(Clone, Debug, Default, PartialEq, Serialize)]
#[serde(transparent)]
pub struct PropertyBag(Map<String, Value>);

impl PropertyBag {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert<V>(&mut self, key: &str, value: &V) -> Result<&mut Self, TelemetryError>
    where
        V: Serialize + ?Sized,
    {
        self.0.insert(key.to_string(), serde_json::to_value(value)?);
        Ok(self)
    }

    pub fn with<V>(mut self, key: &str, value: &V) -> Result<Self, TelemetryError>
    where
        V: Serialize + ?Sized,
    {
        self.insert(key, value)?;
        Ok(self)
    }

    /// Same as `with`, but leaves the key out entirely for `None`.
    pub fn with_opt<V>(self, key: &str, value: Option<&V>) -> Result<Self, TelemetryError>
    where
        V: Serialize + ?Sized,
    {
        match value {
            Some(value) => self.with(key, value),
            None => Ok(self),
        }
    }

    pub fn get(&self, key: &str) -> Option<&Value> {
        self.0.get(key)
    }

    pub fn contains_key(&self, key: &str) -> bool {
        self.0.contains_key(key)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&String, &Value)> {
        self.0.iter()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn into_inner(self) -> Map<String, Value> {
        self.0
    }
}

impl From<Map<String, Value>> for PropertyBag {
    fn from(map: Map<String, Value>) -> Self {
        Self(map)
    }
}

#[derive(Clone, Debug)]
pub struct EventTelemetry {
    pub name: String,
    pub time: DateTime<Utc>,
    pub properties: PropertyBag,
}

impl EventTelemetry {
    /// Creates an event stamped with the current time.
    pub fn new(name: impl Into<String>, properties: PropertyBag) -> Self {
        Self {
            name: name.into(),
            time: Utc::now(),
            properties,
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ExceptionDetails {
    pub type_name: String,
    pub message: String,
    pub stack: Option<String>,
}

impl ExceptionDetails {
    pub fn new(type_name: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            type_name: type_name.into(),
            message: message.into(),
            stack: None,
        }
    }

    pub fn with_stack(mut self, stack: impl Into<String>) -> Self {
        self.stack = Some(stack.into());
        self
    }

    /// Uses the error's type as the type name and its `source()` chain as the stack.
    pub fn from_error<E>(error: &E) -> Self
    where
        E: Error,
    {
        let type_name = std::any::type_name::<E>()
            .rsplit("::")
            .next()
            .unwrap_or("Error");
        let mut details = Self::new(type_name, error.to_string());

        let mut causes = vec![];
        let mut source = error.source();
        while let Some(cause) = source {
            causes.push(format!("caused by: {}", cause));
            source = cause.source();
        }
        if !causes.is_empty() {
            details.stack = Some(causes.join("\n"));
        }

        details
    }
}

#[derive(Clone, Debug)]
pub struct ExceptionTelemetry {
    pub exceptions: Vec<ExceptionDetails>,
    pub time: DateTime<Utc>,
    pub properties: PropertyBag,
}

impl ExceptionTelemetry {
    pub fn new(exception: ExceptionDetails, properties: PropertyBag) -> Self {
        Self {
            exceptions: vec![exception],
            time: Utc::now(),
            properties,
        }
    }

    /// The outermost exception.
    pub fn exception(&self) -> Option<&ExceptionDetails> {
        self.exceptions.first()
    }
}
