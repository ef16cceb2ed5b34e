use crate::{
    background_tasks::{BackgroundTask, BackgroundTasksManager},
    plugin_trait::GraphQLPlugin,
    BoxError,
};

pub struct OnPluginInitPayload<'a, TPlugin: GraphQLPlugin> {
    config: &'a serde_json::Value,
    bg_tasks_manager: &'a mut BackgroundTasksManager,
    phantom: std::marker::PhantomData<TPlugin>,
}

pub type OnPluginInitResult<TPlugin> = Result<Option<TPlugin>, BoxError>;

impl<'a, TPlugin> OnPluginInitPayload<'a, TPlugin>
where
    TPlugin: GraphQLPlugin,
{
    pub fn new(
        config: &'a serde_json::Value,
        bg_tasks_manager: &'a mut BackgroundTasksManager,
    ) -> Self {
        Self {
            config,
            bg_tasks_manager,
            phantom: std::marker::PhantomData,
        }
    }

    /// Deserializes the plugin's `config` section into `TPlugin::Config`.
    /// A missing section is read as `{}`, so configs made only of defaults need no section at all.
    pub fn config(&self) -> Result<TPlugin::Config, BoxError> {
        match serde_json::from_value(self.config.clone()) {
            Ok(config) => Ok(config),
            Err(err) if self.config.is_null() => {
                serde_json::from_value(serde_json::Value::Object(Default::default()))
                    .map_err(|_| err.into())
            }
            Err(err) => Err(err.into()),
        }
    }

    /// Spawns `task` next to the server. It is cancelled on shutdown.
    pub fn register_background_task<T>(&mut self, task: T)
    where
        T: BackgroundTask + 'static,
    {
        self.bg_tasks_manager.register_task(task)
    }

    pub fn background_tasks(&mut self) -> &mut BackgroundTasksManager {
        self.bg_tasks_manager
    }

    /// Leaves the plugin out of the server without failing startup.
    pub fn disable_plugin(&self) -> OnPluginInitResult<TPlugin> {
        Ok(None)
    }

    pub fn initialize_plugin(&self, plugin: TPlugin) -> OnPluginInitResult<TPlugin> {
        Ok(Some(plugin))
    }

    /// Shortcut for plugins without state.
    pub fn initialize_plugin_with_defaults(&self) -> OnPluginInitResult<TPlugin>
    where
        TPlugin: Default,
    {
        Ok(Some(TPlugin::default()))
    }
}
