use async_trait::async_trait;
use std::future::Future;
use tokio_util::{sync::CancellationToken, task::TaskTracker};
use tracing::info;

#[async_trait]
pub trait BackgroundTask: Send + Sync {
    fn id(&self) -> &str;
    async fn run(&self, token: CancellationToken);
}

/// Owns every long-running task registered by the server or its plugins.
/// Tasks are spawned on the current tokio runtime and share one cancellation token.
pub struct BackgroundTasksManager {
    cancellation_token: CancellationToken,
    tracker: TaskTracker,
}

impl Default for BackgroundTasksManager {
    fn default() -> Self {
        Self::new()
    }
}

impl BackgroundTasksManager {
    pub fn new() -> Self {
        Self {
            cancellation_token: CancellationToken::new(),
            tracker: TaskTracker::new(),
        }
    }

    pub fn register_task<T>(&mut self, task: T)
    where
        T: BackgroundTask + 'static,
    {
        info!("registering background task: {}", task.id());
        let child_token = self.cancellation_token.child_token();

        self.tracker.spawn(async move {
            task.run(child_token).await;
        });
    }

    pub fn register_handle<F>(&mut self, f: F)
    where
        F: Future<Output = ()> + Send + 'static,
    {
        self.tracker.spawn(f);
    }

    pub fn len(&self) -> usize {
        self.tracker.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tracker.is_empty()
    }

    /// Cancels every task and waits until all of them returned.
    pub async fn shutdown(self) {
        info!("shutdown triggered, stopping all background tasks...");

        self.cancellation_token.cancel();
        self.tracker.close();
        self.tracker.wait().await;

        info!("all background tasks have been shut down gracefully.");
    }
}
