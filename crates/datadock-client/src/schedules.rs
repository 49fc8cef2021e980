//! Scheduler endpoint. Deployments without the scheduler answer 404.

use datadock_core::model::Schedule;
use datadock_core::{ErrorKind, Result};

use crate::client::{ApiClient, Listing};

/// Tracing target for scheduler operations.
pub const TRACING_TARGET: &str = "datadock_client::schedules";

/// Whether the backend exposes the scheduler, and its schedules if so.
#[derive(Debug, Clone, PartialEq)]
pub enum SchedulerAvailability {
    Available(Vec<Schedule>),
    Unavailable,
}

/// Scheduler endpoints under `/api/v1/etl/schedules`.
#[derive(Debug, Clone, Copy)]
pub struct SchedulesApi<'a> {
    client: &'a ApiClient,
}

impl<'a> SchedulesApi<'a> {
    pub(crate) fn new(client: &'a ApiClient) -> Self {
        Self { client }
    }

    /// Lists schedules, or reports the scheduler as unavailable on 404.
    pub async fn list(&self) -> Result<SchedulerAvailability> {
        match self
            .client
            .get::<Listing<Schedule>>(&["etl", "schedules"])
            .await
        {
            Ok(listing) => Ok(SchedulerAvailability::Available(listing.into_vec())),
            Err(error) if error.kind() == ErrorKind::NotFound => {
                tracing::debug!(target: TRACING_TARGET, "Scheduler is not available");
                Ok(SchedulerAvailability::Unavailable)
            }
            Err(error) => Err(error),
        }
    }
}
