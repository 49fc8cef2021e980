//! `datadock connections ...`

use anyhow::Context;
use clap::Subcommand;
use datadock_client::{ApiClient, RefreshPolicy};
use datadock_core::model::{ConnectionTestResult, ResourceId};
use datadock_core::{ConnectionWizard, TestStatus};
use serde_json::json;

use super::fields::{FieldArgs, build_payload};
use super::{ListArgs, confirm};
use crate::render::{self, Output};

#[derive(Debug, Clone, Subcommand)]
pub enum ConnectionsCommand {
    /// List saved connections
    List(ListArgs),

    /// Show one connection
    Show {
        /// Connection id
        id: ResourceId,
    },

    /// Create a connection
    Create {
        /// Service id from `datadock catalog list`
        #[arg(long)]
        engine: String,

        #[command(flatten)]
        fields: FieldArgs,

        /// Test the configuration before saving it
        #[arg(long)]
        test: bool,
    },

    /// Test a configuration without saving it
    TestConfig {
        /// Service id from `datadock catalog list`
        #[arg(long)]
        engine: String,

        #[command(flatten)]
        fields: FieldArgs,
    },

    /// Test a saved connection and show its refreshed status
    Test {
        /// Connection id
        id: ResourceId,

        /// Print the test result without waiting for the stored status
        #[arg(long)]
        no_refresh: bool,
    },

    /// Change a saved connection; secrets left out are kept
    Edit {
        /// Connection id
        id: ResourceId,

        #[command(flatten)]
        fields: FieldArgs,
    },

    /// Delete a saved connection
    Delete {
        /// Connection id
        id: ResourceId,

        /// Skip the confirmation prompt
        #[arg(long, short)]
        yes: bool,
    },
}

pub async fn run(
    command: &ConnectionsCommand,
    client: &ApiClient,
    output: Output,
) -> anyhow::Result<()> {
    let api = client.connections();

    match command {
        ConnectionsCommand::List(args) => {
            let connections = api.list().await.context("failed to list connections")?;
            let page = args.view(connections).current();
            output.emit(&page, || {
                format!(
                    "{}{}",
                    render::connections_table(&page.items),
                    render::page_footer(&page, "connections")
                )
            })
        }

        ConnectionsCommand::Show { id } => {
            let connection = api
                .get(id)
                .await
                .with_context(|| format!("failed to fetch connection {id}"))?;
            output.emit(&connection, || render::connection_detail(&connection))
        }

        ConnectionsCommand::Create {
            engine,
            fields,
            test,
        } => {
            let mut wizard = wizard_for(engine, fields)?;
            let payload = build_payload(&wizard)?;

            if *test {
                wizard.begin_test();
                let outcome = api.test_config(&payload).await;
                wizard.finish_test(outcome.map_err(|e| e.display_message()));
                if let TestStatus::Error(message) = wizard.status() {
                    anyhow::bail!("Connection test failed: {message}");
                }
            }

            let saved = api
                .create(&payload)
                .await
                .context("failed to create connection")?;
            output.emit(&saved, || {
                format!("Created connection '{}' ({})", saved.name, saved.id)
            })
        }

        ConnectionsCommand::TestConfig { engine, fields } => {
            let mut wizard = wizard_for(engine, fields)?;
            let payload = build_payload(&wizard)?;

            wizard.begin_test();
            let outcome = api.test_config(&payload).await;
            wizard.finish_test(outcome.map_err(|e| e.display_message()));
            report_status(wizard.status(), output)
        }

        ConnectionsCommand::Test { id, no_refresh } => {
            if *no_refresh {
                let result = api.test(id).await.context("connection test failed")?;
                output.emit(&result, || test_line(&result))?;
                return ensure_passed(&result);
            }

            let outcome = api
                .test_and_refresh(id, RefreshPolicy::default())
                .await
                .context("connection test failed")?;
            let value = json!({
                "result": outcome.result,
                "connection": outcome.connection,
                "refreshed": outcome.refreshed,
            });
            output.emit(&value, || {
                let mut text = test_line(&outcome.result);
                text.push_str(&format!(
                    "\nStatus: {} (last tested {})",
                    outcome.connection.test_status(),
                    render::timestamp(outcome.connection.last_tested_at)
                ));
                if !outcome.refreshed {
                    text.push_str("\nThe stored status has not been updated yet.");
                }
                text
            })?;
            ensure_passed(&outcome.result)
        }

        ConnectionsCommand::Edit { id, fields } => {
            let existing = api
                .get(id)
                .await
                .with_context(|| format!("failed to fetch connection {id}"))?;

            let mut wizard = ConnectionWizard::edit(&existing);
            fields.apply(&mut wizard)?;
            let payload = build_payload(&wizard)?;

            let updated = api
                .update(id, &payload)
                .await
                .with_context(|| format!("failed to update connection {id}"))?;
            output.emit(&updated, || {
                format!("Updated connection '{}' ({})", updated.name, updated.id)
            })
        }

        ConnectionsCommand::Delete { id, yes } => {
            if !*yes && !confirm(&format!("Delete connection {id}?"))? {
                return output.message("Aborted");
            }

            api.delete(id)
                .await
                .with_context(|| format!("failed to delete connection {id}"))?;
            output.message(&format!("Deleted connection {id}"))
        }
    }
}

/// Opens a wizard on `engine` and fills it from the flags.
fn wizard_for(engine: &str, fields: &FieldArgs) -> anyhow::Result<ConnectionWizard> {
    let mut wizard = ConnectionWizard::new();
    wizard.select_by_id(engine).map_err(|e| {
        anyhow::anyhow!(
            "{} (run `datadock catalog list` to see the available services)",
            e.display_message()
        )
    })?;
    fields.apply(&mut wizard)?;
    Ok(wizard)
}

fn test_line(result: &ConnectionTestResult) -> String {
    if result.passed() {
        format!("Test passed: {}", result.display_message())
    } else {
        format!("Test failed: {}", result.display_message())
    }
}

fn ensure_passed(result: &ConnectionTestResult) -> anyhow::Result<()> {
    if result.passed() {
        Ok(())
    } else {
        anyhow::bail!("connection test failed")
    }
}

fn report_status(status: &TestStatus, output: Output) -> anyhow::Result<()> {
    match status {
        TestStatus::Success(message) => output.emit(
            &json!({ "success": true, "message": message }),
            || format!("Test passed: {message}"),
        ),
        TestStatus::Error(message) => {
            output.emit(
                &json!({ "success": false, "message": message }),
                || format!("Test failed: {message}"),
            )?;
            anyhow::bail!("connection test failed")
        }
        TestStatus::Idle | TestStatus::Testing => Ok(()),
    }
}
