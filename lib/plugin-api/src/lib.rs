pub mod background_tasks;
pub mod dispatcher;
pub mod graphql_error;
pub mod hooks;
pub mod plugin_trait;
pub mod registry;
pub mod request_context;
pub mod schema;

pub use async_trait::async_trait;
pub use dispatcher::{LifecycleDispatcher, RequestListeners, ServerListeners};
pub use registry::{PluginEntryConfig, PluginRegistry, PluginsConfig};

pub type BoxError = Box<dyn std::error::Error + Send + Sync>;
