#![forbid(unsafe_code)]
#![cfg_attr(docsrs, feature(doc_cfg))]
#![doc = include_str!("../README.md")]

mod commands;
mod config;
mod render;
mod signal;

use std::process;

use anyhow::Context;
use datadock_client::ApiClient;
use tracing_subscriber::EnvFilter;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;

use crate::config::Cli;

// Tracing target constants
pub const TRACING_TARGET_STARTUP: &str = "datadock_cli::startup";
pub const TRACING_TARGET_CONFIG: &str = "datadock_cli::config";
pub const TRACING_TARGET_COMMAND: &str = "datadock_cli::command";

#[tokio::main]
async fn main() {
    let Err(error) = run().await else {
        process::exit(0);
    };

    if tracing::enabled!(target: TRACING_TARGET_COMMAND, tracing::Level::DEBUG) {
        tracing::error!(
            target: TRACING_TARGET_COMMAND,
            error = %format!("{error:#}"),
            "command failed"
        );
    } else {
        eprintln!("Error: {error:#}");
    }

    process::exit(1);
}

/// Main application entry point.
async fn run() -> anyhow::Result<()> {
    let cli = Cli::init();

    init_tracing();
    cli.log();
    cli.validate()?;

    let client = ApiClient::new(cli.api.clone()).context("failed to create API client")?;
    commands::execute(&cli, &client).await
}

/// Initializes tracing with environment-based filtering.
///
/// Output goes to stderr so command output on stdout stays parseable.
fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));

    tracing_subscriber::registry()
        .with(filter)
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();
}
