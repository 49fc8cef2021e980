//! `datadock pipelines ...`

use std::time::Duration;

use anyhow::Context;
use clap::Subcommand;
use datadock_client::ApiClient;
use datadock_core::Page;
use datadock_core::model::{EtlPipeline, PipelineDraft, ResourceId};

use super::{ListArgs, confirm};
use crate::TRACING_TARGET_COMMAND;
use crate::render::{self, Output};
use crate::signal;

#[derive(Debug, Clone, Subcommand)]
pub enum PipelinesCommand {
    /// List pipelines
    List {
        #[command(flatten)]
        list: ListArgs,

        /// Keep refreshing the list until interrupted
        #[arg(long, short)]
        watch: bool,

        /// Refresh interval in seconds
        #[arg(long, default_value_t = 10, value_name = "SECONDS")]
        interval: u64,
    },

    /// Trigger a pipeline run
    Run {
        /// Pipeline id
        id: ResourceId,
    },

    /// Pause a pipeline
    Pause {
        /// Pipeline id
        id: ResourceId,
    },

    /// Delete a pipeline
    Delete {
        /// Pipeline id
        id: ResourceId,

        /// Skip the confirmation prompt
        #[arg(long, short)]
        yes: bool,
    },

    /// Create a pipeline between two saved connections
    Create {
        /// Pipeline name
        #[arg(long)]
        name: String,

        /// Source connection id
        #[arg(long)]
        source: ResourceId,

        /// Target connection id
        #[arg(long)]
        target: ResourceId,

        /// Description
        #[arg(long)]
        description: Option<String>,

        /// Cron expression
        #[arg(long)]
        schedule: Option<String>,
    },

    /// Change the name, description or schedule of a pipeline
    Edit {
        /// Pipeline id
        id: ResourceId,

        /// New name
        #[arg(long)]
        name: Option<String>,

        /// New description
        #[arg(long)]
        description: Option<String>,

        /// New cron expression
        #[arg(long)]
        schedule: Option<String>,
    },
}

pub async fn run(
    command: &PipelinesCommand,
    client: &ApiClient,
    output: Output,
) -> anyhow::Result<()> {
    let api = client.pipelines();

    match command {
        PipelinesCommand::List {
            list,
            watch: false,
            ..
        } => {
            let pipelines = api.list().await.context("failed to list pipelines")?;
            let page = list.view(pipelines).current();
            output.emit(&page, || render_page(&page))
        }

        PipelinesCommand::List {
            list,
            watch: true,
            interval,
        } => {
            let cancel = signal::cancel_on_interrupt();
            let mut view = list.view(Vec::new());

            api.watch(Duration::from_secs(*interval), cancel, |pipelines| {
                view.replace(pipelines);
                let page = view.current();
                let printed = output.emit(&page, || {
                    format!(
                        "Updated {}\n{}",
                        render::timestamp(Some(jiff::Timestamp::now())),
                        render_page(&page)
                    )
                });
                if let Err(error) = printed {
                    tracing::warn!(
                        target: TRACING_TARGET_COMMAND,
                        error = %error,
                        "Failed to print pipelines"
                    );
                }
            })
            .await;

            Ok(())
        }

        PipelinesCommand::Run { id } => {
            api.run(id)
                .await
                .with_context(|| format!("failed to run pipeline {id}"))?;
            output.message(&format!("Pipeline {id} started"))
        }

        PipelinesCommand::Pause { id } => {
            api.pause(id)
                .await
                .with_context(|| format!("failed to pause pipeline {id}"))?;
            output.message(&format!("Pipeline {id} paused"))
        }

        PipelinesCommand::Delete { id, yes } => {
            if !*yes && !confirm(&format!("Delete pipeline {id}?"))? {
                return output.message("Aborted");
            }

            api.delete(id)
                .await
                .with_context(|| format!("failed to delete pipeline {id}"))?;
            output.message(&format!("Deleted pipeline {id}"))
        }

        PipelinesCommand::Create {
            name,
            source,
            target,
            description,
            schedule,
        } => {
            let draft = create_draft(
                name,
                source,
                target,
                description.as_deref(),
                schedule.as_deref(),
            );
            let pipeline = api
                .create(&draft)
                .await
                .context("failed to create pipeline")?;
            output.emit(&pipeline, || {
                format!("Created pipeline '{}' ({})", pipeline.name, pipeline.id)
            })
        }

        PipelinesCommand::Edit {
            id,
            name,
            description,
            schedule,
        } => {
            let draft = apply_changes(
                PipelineDraft::default(),
                name.as_deref(),
                description.as_deref(),
                schedule.as_deref(),
            );
            if draft.is_empty() {
                anyhow::bail!("nothing to change: pass --name, --description or --schedule");
            }

            let pipeline = api
                .update(id, &draft)
                .await
                .with_context(|| format!("failed to update pipeline {id}"))?;
            output.emit(&pipeline, || {
                format!("Updated pipeline '{}' ({})", pipeline.name, pipeline.id)
            })
        }
    }
}

fn render_page(page: &Page<EtlPipeline>) -> String {
    format!(
        "{}{}",
        render::pipelines_table(&page.items),
        render::page_footer(page, "pipelines")
    )
}

fn create_draft(
    name: &str,
    source: &ResourceId,
    target: &ResourceId,
    description: Option<&str>,
    schedule: Option<&str>,
) -> PipelineDraft {
    let base = PipelineDraft::default()
        .with_name(name)
        .with_endpoints(source.clone(), target.clone());
    apply_changes(base, None, description, schedule)
}

/// Sets the given optional fields on `draft`.
fn apply_changes(
    mut draft: PipelineDraft,
    name: Option<&str>,
    description: Option<&str>,
    schedule: Option<&str>,
) -> PipelineDraft {
    if let Some(name) = name {
        draft = draft.with_name(name);
    }
    if let Some(description) = description {
        draft = draft.with_description(description);
    }
    if let Some(schedule) = schedule {
        draft = draft.with_schedule(schedule);
    }
    draft
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;
    use std::sync::atomic::{AtomicUsize, Ordering};

    use axum::Router;
    use axum::extract::State;
    use axum::routing::patch;
    use clap::Parser;
    use serde_json::{Value, json};

    use super::*;
    use crate::commands::Command;
    use crate::config::Cli;
    use crate::testing;

    fn parse(args: &[&str]) -> PipelinesCommand {
        let cli = Cli::try_parse_from(
            ["datadock", "pipelines"]
                .into_iter()
                .chain(args.iter().copied()),
        )
        .unwrap();
        match cli.command {
            Command::Pipelines(command) => command,
            other => panic!("unexpected command {other:?}"),
        }
    }

    #[test]
    fn test_watch_defaults_to_ten_seconds() {
        let PipelinesCommand::List {
            watch, interval, ..
        } = parse(&["list", "--watch"])
        else {
            panic!("expected list");
        };
        assert!(watch);
        assert_eq!(interval, 10);
    }

    #[test]
    fn test_create_draft_carries_every_field() {
        let draft = create_draft(
            "nightly",
            &ResourceId::Int(1),
            &ResourceId::Text("wh-2".to_owned()),
            None,
            Some("0 2 * * *"),
        );
        assert_eq!(
            serde_json::to_value(&draft).unwrap(),
            json!({
                "name": "nightly",
                "source_connection_id": 1,
                "target_connection_id": "wh-2",
                "schedule": "0 2 * * *"
            })
        );
    }

    #[test]
    fn test_edit_without_flags_is_empty() {
        assert!(apply_changes(PipelineDraft::default(), None, None, None).is_empty());
        let draft = apply_changes(PipelineDraft::default(), None, Some("copies orders"), None);
        assert_eq!(draft.description.as_deref(), Some("copies orders"));
        assert!(draft.name.is_none());
    }

    #[tokio::test]
    async fn test_edit_requires_a_change() {
        let patches = Arc::new(AtomicUsize::new(0));
        let router = Router::new()
            .route(
                "/api/v1/etl/pipelines/{id}",
                patch(
                    |State(patches): State<Arc<AtomicUsize>>,
                     axum::Json(body): axum::Json<Value>| async move {
                        patches.fetch_add(1, Ordering::SeqCst);
                        axum::Json(json!({"id": 3, "name": "nightly", "schedule": body["schedule"]}))
                    },
                ),
            )
            .with_state(patches.clone());
        let client = testing::client_for(router).await;

        let err = run(&parse(&["edit", "3"]), &client, Output::new(true))
            .await
            .unwrap_err();
        assert!(err.to_string().starts_with("nothing to change"));
        assert_eq!(patches.load(Ordering::SeqCst), 0);

        run(
            &parse(&["edit", "3", "--schedule", "0 2 * * *"]),
            &client,
            Output::new(true),
        )
        .await
        .unwrap();
        assert_eq!(patches.load(Ordering::SeqCst), 1);
    }
}
