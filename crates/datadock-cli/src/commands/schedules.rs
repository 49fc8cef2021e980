//! `datadock schedules ...`

use anyhow::Context;
use clap::Subcommand;
use datadock_client::{ApiClient, SchedulerAvailability};
use serde_json::json;

use crate::render::{self, Output};

/// Shown when the backend has no scheduler.
const UNAVAILABLE: &str = "Scheduling is not available on this backend";

#[derive(Debug, Clone, Subcommand)]
pub enum SchedulesCommand {
    /// List pipeline schedules
    List,
}

pub async fn run(
    command: &SchedulesCommand,
    client: &ApiClient,
    output: Output,
) -> anyhow::Result<()> {
    match command {
        SchedulesCommand::List => {
            let availability = client
                .schedules()
                .list()
                .await
                .context("failed to list schedules")?;

            match availability {
                SchedulerAvailability::Available(schedules) => output.emit(
                    &json!({ "available": true, "schedules": schedules }),
                    || {
                        if schedules.is_empty() {
                            "No schedules".to_owned()
                        } else {
                            render::schedules_table(&schedules).to_string()
                        }
                    },
                ),
                SchedulerAvailability::Unavailable => output.emit(
                    &json!({ "available": false, "message": UNAVAILABLE }),
                    || UNAVAILABLE.to_owned(),
                ),
            }
        }
    }
}
