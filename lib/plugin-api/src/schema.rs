use std::{fmt, sync::Arc};

use serde::{Deserialize, Serialize, Serializer};

/// The schema a server exposes, kept as SDL text.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Schema {
    sdl: Arc<str>,
}

impl Schema {
    pub fn new(sdl: impl Into<Arc<str>>) -> Self {
        Self { sdl: sdl.into() }
    }

    pub fn sdl(&self) -> &str {
        &self.sdl
    }
}

impl fmt::Display for Schema {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.sdl)
    }
}

impl Serialize for Schema {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_str(&self.sdl)
    }
}

impl From<&str> for Schema {
    fn from(sdl: &str) -> Self {
        Self::new(sdl)
    }
}

impl From<String> for Schema {
    fn from(sdl: String) -> Self {
        Self::new(sdl)
    }
}

/// Graph identity the server was started with.
#[derive(Clone, Debug, Default, Deserialize, Serialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct ServerConfig {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub graph_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub graph_variant: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub graph_ref: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub key_hash: Option<String>,
}

impl ServerConfig {
    /// Builds a config from a `graph@variant` reference. A reference without `@`
    /// targets the `current` variant.
    pub fn from_graph_ref(graph_ref: &str) -> Self {
        let (graph_id, graph_variant) = graph_ref
            .split_once('@')
            .unwrap_or((graph_ref, "current"));

        Self {
            graph_id: Some(graph_id.to_string()),
            graph_variant: Some(graph_variant.to_string()),
            graph_ref: Some(format!("{}@{}", graph_id, graph_variant)),
            key_hash: None,
        }
    }
}
