use serde::Serialize;
use serde_json::{Map, Value};
use sha2::{Digest, Sha256};

use crate::graphql_error::GraphQLError;

/// Incoming headers in the order the transport delivered them.
/// Names keep the case they arrived with, values that are not valid UTF-8 are `None`.
#[derive(Clone, Debug, Default, Serialize, PartialEq, Eq)]
pub struct HeaderList(Vec<(String, Option<String>)>);

impl HeaderList {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn append(&mut self, name: impl Into<String>, value: Option<String>) {
        self.0.push((name.into(), value));
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, Option<&str>)> {
        self.0
            .iter()
            .map(|(name, value)| (name.as_str(), value.as_deref()))
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl<K, V> FromIterator<(K, V)> for HeaderList
where
    K: Into<String>,
    V: Into<String>,
{
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        Self(
            iter.into_iter()
                .map(|(name, value)| (name.into(), Some(value.into())))
                .collect(),
        )
    }
}

impl From<&http::HeaderMap> for HeaderList {
    fn from(headers: &http::HeaderMap) -> Self {
        Self(
            headers
                .iter()
                .map(|(name, value)| {
                    (
                        name.as_str().to_string(),
                        value.to_str().ok().map(str::to_string),
                    )
                })
                .collect(),
        )
    }
}

#[derive(Clone, Debug, Default, Serialize)]
pub struct HttpRequestInfo {
    pub method: String,
    pub url: String,
    pub headers: HeaderList,
}

impl HttpRequestInfo {
    pub fn from_http<B>(request: &http::Request<B>) -> Self {
        Self {
            method: request.method().to_string(),
            url: request.uri().to_string(),
            headers: request.headers().into(),
        }
    }
}

/// The GraphQL request as received over the wire.
#[derive(Clone, Debug, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GraphQLRequest {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub query: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub operation_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub variables: Option<Map<String, Value>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub extensions: Option<Map<String, Value>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub http: Option<HttpRequestInfo>,
}

impl GraphQLRequest {
    pub fn new(query: impl Into<String>) -> Self {
        Self {
            query: Some(query.into()),
            ..Default::default()
        }
    }

    pub fn with_operation_name(mut self, operation_name: impl Into<String>) -> Self {
        self.operation_name = Some(operation_name.into());
        self
    }

    pub fn with_http(mut self, http: HttpRequestInfo) -> Self {
        self.http = Some(http);
        self
    }
}

/// Per-request flags collected by the server while the request moves through the pipeline.
#[derive(Clone, Debug, Default, Serialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct RequestMetrics {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub captures_traces: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub persisted_query_hit: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub persisted_query_register: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub response_cache_hit: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub forbidden_operation: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub registered_operation: Option<bool>,
}

#[derive(Clone, Copy, Debug, Serialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum OperationKind {
    Query,
    Mutation,
    Subscription,
}

/// The operation selected from the parsed document.
#[derive(Clone, Debug, Serialize, PartialEq, Eq)]
pub struct OperationInfo {
    pub kind: OperationKind,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
}

/// State of a single GraphQL request, filled in by the server as the request progresses.
/// Every request listener receives the same instance.
#[derive(Clone, Debug, Default)]
pub struct GraphQLRequestContext {
    pub request: GraphQLRequest,
    pub metrics: RequestMetrics,
    pub debug: bool,
    /// The query text, available once the source is resolved.
    pub source: Option<String>,
    /// Hex encoded SHA-256 of `source`.
    pub query_hash: Option<String>,
    pub operation_name: Option<String>,
    pub operation: Option<OperationInfo>,
    pub errors: Vec<GraphQLError>,
}

impl GraphQLRequestContext {
    pub fn new(request: GraphQLRequest) -> Self {
        Self {
            operation_name: request.operation_name.clone(),
            request,
            ..Default::default()
        }
    }

    /// Copies the query text into `source` and computes its hash.
    /// Returns `false` when the request carries no query.
    pub fn resolve_source(&mut self) -> bool {
        let Some(query) = self.request.query.as_deref() else {
            return false;
        };

        self.query_hash = Some(hash_query(query));
        self.source = Some(query.to_string());
        true
    }

    pub fn resolve_operation(&mut self, operation: OperationInfo) {
        if operation.name.is_some() {
            self.operation_name = operation.name.clone();
        }
        self.operation = Some(operation);
    }

    pub fn headers(&self) -> Option<&HeaderList> {
        self.request.http.as_ref().map(|http| &http.headers)
    }
}

pub fn hash_query(query: &str) -> String {
    format!("{:x}", Sha256::digest(query.as_bytes()))
}
