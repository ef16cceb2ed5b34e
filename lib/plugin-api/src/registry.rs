use std::collections::HashMap;

use serde::Deserialize;
use serde_json::Value;
use tracing::{debug, info, warn};

use crate::{
    background_tasks::BackgroundTasksManager,
    hooks::on_plugin_init::OnPluginInitPayload,
    plugin_trait::{GraphQLPlugin, GraphQLPluginBoxed},
    BoxError,
};

#[derive(Debug, Clone, Deserialize)]
pub struct PluginEntryConfig {
    #[serde(default = "default_enabled")]
    pub enabled: bool,
    #[serde(default)]
    pub config: Value,
}

fn default_enabled() -> bool {
    true
}

/// The `plugins` section of the server configuration, keyed by plugin name.
pub type PluginsConfig = HashMap<String, PluginEntryConfig>;

#[derive(Debug, thiserror::Error)]
pub enum PluginRegistryError {
    #[error("Failed to initialize plugin '{name}': {source}")]
    InitFailed {
        name: &'static str,
        #[source]
        source: BoxError,
    },
}

type PluginFactory = Box<
    dyn Fn(&Value, &mut BackgroundTasksManager) -> Result<Option<GraphQLPluginBoxed>, BoxError>
        + Send
        + Sync,
>;

/// Known plugins, in registration order. Plugins are initialized and invoked in that order.
pub struct PluginRegistry {
    factories: Vec<(&'static str, PluginFactory)>,
}

impl Default for PluginRegistry {
    fn default() -> Self {
        Self::new()
    }
}

impl PluginRegistry {
    pub fn new() -> Self {
        Self { factories: vec![] }
    }

    pub fn register<P: GraphQLPlugin>(mut self) -> Self {
        self.factories.push((
            P::plugin_name(),
            Box::new(|plugin_config, bg_tasks_manager| {
                let payload = OnPluginInitPayload::<P>::new(plugin_config, bg_tasks_manager);
                let plugin = P::on_plugin_init(payload)?;
                Ok(plugin.map(|plugin| Box::new(plugin) as GraphQLPluginBoxed))
            }),
        ));
        self
    }

    pub fn is_registered(&self, name: &str) -> bool {
        self.factories.iter().any(|(known, _)| *known == name)
    }

    /// Runs `on_plugin_init` for every registered plugin that is present and enabled in `plugins_config`.
    /// Configured but unregistered plugins are skipped with a warning,
    /// an initialization error aborts the whole process.
    pub fn initialize_plugins(
        &self,
        plugins_config: &PluginsConfig,
        bg_tasks_manager: &mut BackgroundTasksManager,
    ) -> Result<Vec<GraphQLPluginBoxed>, PluginRegistryError> {
        for plugin_name in plugins_config.keys() {
            if !self.is_registered(plugin_name) {
                warn!(
                    "No plugin found registered '{}', skipping plugin",
                    plugin_name
                );
            }
        }

        let mut plugins: Vec<GraphQLPluginBoxed> = vec![];

        for (plugin_name, factory) in self.factories.iter() {
            let Some(entry) = plugins_config.get(*plugin_name) else {
                continue;
            };
            if !entry.enabled {
                debug!("Plugin '{}' is disabled, skipping plugin", plugin_name);
                continue;
            }

            match factory(&entry.config, bg_tasks_manager) {
                Ok(Some(plugin)) => {
                    info!("Loaded plugin: {}", plugin_name);
                    plugins.push(plugin);
                }
                Ok(None) => {
                    info!("Plugin '{}' disabled itself during init", plugin_name);
                }
                Err(source) => {
                    return Err(PluginRegistryError::InitFailed {
                        name: plugin_name,
                        source,
                    });
                }
            }
        }

        Ok(plugins)
    }
}
