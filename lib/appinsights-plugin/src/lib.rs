mod config;
mod flush_task;
mod plugin;
mod request;
mod scope;
mod session;
mod test;

pub use config::{AppInsightsEnv, AppInsightsPluginConfig, PluginConfigError};
pub use flush_task::AppInsightsFlushTask;
pub use plugin::{AppInsightsPlugin, ClientInput, TelemetryClientSource, PLUGIN_NAME};
pub use request::{flatten_headers, RequestSession};
pub use session::ServerSession;
