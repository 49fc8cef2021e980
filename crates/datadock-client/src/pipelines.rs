//! ETL pipeline endpoints and the periodic list refresh.

use std::time::Duration;

use datadock_core::Result;
use datadock_core::model::{EtlPipeline, PipelineDraft, ResourceId};
use serde_json::Value;
use tokio::time::MissedTickBehavior;
use tokio_util::sync::CancellationToken;

use crate::client::{ApiClient, Listing};

/// Tracing target for pipeline operations.
pub const TRACING_TARGET: &str = "datadock_client::pipelines";

/// Refresh interval of the pipelines list.
pub const DEFAULT_WATCH_INTERVAL: Duration = Duration::from_secs(10);

/// Pipeline endpoints under `/api/v1/etl/pipelines`.
#[derive(Debug, Clone, Copy)]
pub struct PipelinesApi<'a> {
    client: &'a ApiClient,
}

impl<'a> PipelinesApi<'a> {
    pub(crate) fn new(client: &'a ApiClient) -> Self {
        Self { client }
    }

    /// Lists pipelines.
    pub async fn list(&self) -> Result<Vec<EtlPipeline>> {
        let listing: Listing<EtlPipeline> = self.client.get(&["etl", "pipelines"]).await?;
        Ok(listing.into_vec())
    }

    /// Fetches one pipeline.
    pub async fn get(&self, id: &ResourceId) -> Result<EtlPipeline> {
        self.client
            .get(&["etl", "pipelines", id.to_string().as_str()])
            .await
    }

    /// Creates a pipeline.
    pub async fn create(&self, draft: &PipelineDraft) -> Result<EtlPipeline> {
        let pipeline: EtlPipeline = self.client.post(&["etl", "pipelines"], draft).await?;

        tracing::info!(
            target: TRACING_TARGET,
            pipeline_id = %pipeline.id,
            "Created pipeline"
        );

        Ok(pipeline)
    }

    /// Updates the fields set in `draft`.
    pub async fn update(&self, id: &ResourceId, draft: &PipelineDraft) -> Result<EtlPipeline> {
        let pipeline: EtlPipeline = self
            .client
            .patch(&["etl", "pipelines", id.to_string().as_str()], draft)
            .await?;

        tracing::info!(
            target: TRACING_TARGET,
            pipeline_id = %id,
            "Updated pipeline"
        );

        Ok(pipeline)
    }

    /// Deletes a pipeline.
    pub async fn delete(&self, id: &ResourceId) -> Result<()> {
        self.client
            .delete(&["etl", "pipelines", id.to_string().as_str()])
            .await?;

        tracing::info!(
            target: TRACING_TARGET,
            pipeline_id = %id,
            "Deleted pipeline"
        );

        Ok(())
    }

    /// Triggers a run. Execution happens on the backend.
    pub async fn run(&self, id: &ResourceId) -> Result<()> {
        self.action(id, "run").await
    }

    /// Pauses a pipeline.
    pub async fn pause(&self, id: &ResourceId) -> Result<()> {
        self.action(id, "pause").await
    }

    async fn action(&self, id: &ResourceId, action: &str) -> Result<()> {
        let _: Option<Value> = self
            .client
            .post_empty(&["etl", "pipelines", id.to_string().as_str(), action])
            .await?;

        tracing::info!(
            target: TRACING_TARGET,
            pipeline_id = %id,
            action,
            "Pipeline action accepted"
        );

        Ok(())
    }

    /// Fetches the list now and then every `interval` until `cancel` fires.
    ///
    /// Fetch errors are logged and polling continues. A zero interval falls
    /// back to [`DEFAULT_WATCH_INTERVAL`].
    pub async fn watch<F>(&self, interval: Duration, cancel: CancellationToken, mut on_update: F)
    where
        F: FnMut(Vec<EtlPipeline>),
    {
        let interval = if interval.is_zero() {
            DEFAULT_WATCH_INTERVAL
        } else {
            interval
        };

        let mut ticker = tokio::time::interval(interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

        tracing::debug!(
            target: TRACING_TARGET,
            interval_ms = interval.as_millis(),
            "Watching pipelines"
        );

        loop {
            tokio::select! {
                biased;
                () = cancel.cancelled() => break,
                _ = ticker.tick() => {}
            }

            let fetched = tokio::select! {
                biased;
                () = cancel.cancelled() => break,
                fetched = self.list() => fetched,
            };

            match fetched {
                Ok(pipelines) => on_update(pipelines),
                Err(error) => tracing::warn!(
                    target: TRACING_TARGET,
                    error = %error,
                    "Failed to refresh pipelines"
                ),
            }
        }

        tracing::debug!(target: TRACING_TARGET, "Stopped watching pipelines");
    }
}
