use async_trait::async_trait;

use crate::{
    schema::{Schema, ServerConfig},
    BoxError,
};

pub struct ServerWillStartPayload {
    /// Identity of the graph served by this instance.
    pub config: ServerConfig,
    /// The schema the server starts with.
    pub schema: Schema,
    /// Whether the server runs inside a serverless integration (one process per invocation).
    pub serverless_framework: bool,
}

pub struct SchemaContext {
    /// The schema clients can query.
    pub api_schema: Schema,
    /// The full supergraph SDL, when the schema was composed from subgraphs.
    pub core_supergraph_sdl: Option<String>,
}

pub type ServerWillStartResult = Result<Option<Box<dyn ServerListener>>, BoxError>;

/// Returned from `server_will_start`. Lives until the server stops.
#[async_trait]
pub trait ServerListener: Send + Sync {
    /// Called when the server starts draining in-flight requests.
    #[inline]
    async fn drain_server(&self) -> Result<(), BoxError> {
        Ok(())
    }
    /// Called every time a schema is loaded, including the initial one.
    #[inline]
    fn schema_did_load_or_update(&self, _context: &SchemaContext) -> Result<(), BoxError> {
        Ok(())
    }
    #[inline]
    async fn server_will_stop(&self) -> Result<(), BoxError> {
        Ok(())
    }
}
