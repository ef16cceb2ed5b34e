use std::sync::Arc;

use appinsights_sdk::AppInsightsClient;
use graphql_plugin_api::{async_trait, background_tasks::BackgroundTask};
use tokio_util::sync::CancellationToken;

/// Keeps the ingestion buffer moving for an owned client.
pub struct AppInsightsFlushTask {
    client: Arc<AppInsightsClient>,
}

impl AppInsightsFlushTask {
    pub fn new(client: Arc<AppInsightsClient>) -> Self {
        Self { client }
    }
}

#[async_trait]
impl BackgroundTask for AppInsightsFlushTask {
    fn id(&self) -> &str {
        "appinsights_flush"
    }

    async fn run(&self, token: CancellationToken) {
        self.client.start_flush_interval(&token).await
    }
}
