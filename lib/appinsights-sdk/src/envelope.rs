use std::collections::BTreeMap;

use chrono::{DateTime, SecondsFormat, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::telemetry::{EventTelemetry, ExceptionTelemetry, PropertyBag};

pub static SDK_VERSION_TAG: &str = "ai.internal.sdkVersion";
pub static CLOUD_ROLE_TAG: &str = "ai.cloud.role";
pub static OPERATION_ID_TAG: &str = "ai.operation.id";

/// Property copied into the `ai.operation.id` tag so the portal groups records of one request.
pub static CORRELATION_PROPERTY: &str = "requestId";

/// One telemetry item in the ingestion wire format.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct Envelope {
    pub name: String,
    pub time: String,
    #[serde(rename = "iKey")]
    pub i_key: String,
    pub tags: BTreeMap<String, String>,
    pub data: EnvelopeData,
}

#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
#[serde(tag = "baseType", content = "baseData")]
pub enum EnvelopeData {
    #[serde(rename = "EventData")]
    Event(EventData),
    #[serde(rename = "ExceptionData")]
    Exception(ExceptionData),
}

#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct EventData {
    pub ver: u8,
    pub name: String,
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub properties: BTreeMap<String, String>,
}

#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct ExceptionData {
    pub ver: u8,
    pub exceptions: Vec<ExceptionDetailsData>,
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub properties: BTreeMap<String, String>,
}

#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct ExceptionDetailsData {
    pub type_name: String,
    pub message: String,
    pub has_full_stack: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub stack: Option<String>,
}

/// Envelope fields shared by every item of one client.
#[derive(Clone, Debug)]
pub struct EnvelopeContext {
    pub instrumentation_key: String,
    pub tags: BTreeMap<String, String>,
}

impl EnvelopeContext {
    pub fn new(instrumentation_key: impl Into<String>, role_name: Option<String>) -> Self {
        let mut tags = BTreeMap::new();
        tags.insert(
            SDK_VERSION_TAG.to_string(),
            format!("rust:{}", env!("CARGO_PKG_VERSION")),
        );
        if let Some(role_name) = role_name {
            tags.insert(CLOUD_ROLE_TAG.to_string(), role_name);
        }
        Self {
            instrumentation_key: instrumentation_key.into(),
            tags,
        }
    }

    fn item_name(&self, kind: &str) -> String {
        format!(
            "Microsoft.ApplicationInsights.{}.{}",
            self.instrumentation_key.replace('-', ""),
            kind
        )
    }

    fn tags_for(&self, properties: &PropertyBag) -> BTreeMap<String, String> {
        let mut tags = self.tags.clone();
        if let Some(Value::String(id)) = properties.get(CORRELATION_PROPERTY) {
            tags.insert(OPERATION_ID_TAG.to_string(), id.clone());
        }
        tags
    }

    pub fn event(&self, event: &EventTelemetry) -> Envelope {
        Envelope {
            name: self.item_name("Event"),
            time: format_time(&event.time),
            i_key: self.instrumentation_key.clone(),
            tags: self.tags_for(&event.properties),
            data: EnvelopeData::Event(EventData {
                ver: 2,
                name: event.name.clone(),
                properties: stringify_properties(&event.properties),
            }),
        }
    }

    pub fn exception(&self, exception: &ExceptionTelemetry) -> Envelope {
        Envelope {
            name: self.item_name("Exception"),
            time: format_time(&exception.time),
            i_key: self.instrumentation_key.clone(),
            tags: self.tags_for(&exception.properties),
            data: EnvelopeData::Exception(ExceptionData {
                ver: 2,
                exceptions: exception
                    .exceptions
                    .iter()
                    .map(|details| ExceptionDetailsData {
                        type_name: details.type_name.clone(),
                        message: details.message.clone(),
                        has_full_stack: false,
                        stack: details.stack.clone(),
                    })
                    .collect(),
                properties: stringify_properties(&exception.properties),
            }),
        }
    }
}

fn format_time(time: &DateTime<Utc>) -> String {
    time.to_rfc3339_opts(SecondsFormat::Millis, true)
}

/// Ingestion only accepts string properties: strings pass through,
/// nulls are dropped and everything else is JSON encoded.
pub fn stringify_properties(properties: &PropertyBag) -> BTreeMap<String, String> {
    properties
        .iter()
        .filter_map(|(key, value)| match value {
            Value::Null => None,
            Value::String(value) => Some((key.clone(), value.clone())),
            other => Some((key.clone(), other.to_string())),
        })
        .collect()
}
