//! CLI configuration management.
//!
//! ```text
//! Cli
//! ├── api: ApiConfig   # Backend URL, bearer token, HTTP timeout
//! ├── json: bool       # Machine-readable output
//! └── command: Command # catalog | connections | pipelines | schedules
//! ```
//!
//! All configuration can be provided via CLI arguments or environment
//! variables. Use `--help` to see all available options.
//!
//! # Example
//!
//! ```bash
//! datadock --api-url https://etl.example.com connections list
//!
//! # Or via environment variables
//! API_BASE_URL=https://etl.example.com API_TOKEN_FILE=~/.datadock/token \
//!     datadock connections list
//! ```

use std::process;

use anyhow::Context;
use clap::Parser;
use datadock_client::ApiConfig;

use crate::commands::Command;
use crate::{TRACING_TARGET_CONFIG, TRACING_TARGET_STARTUP};

/// Complete CLI configuration.
#[derive(Debug, Clone, Parser)]
#[command(name = "datadock")]
#[command(about = "Console for datadock connections and ETL pipelines")]
#[command(version)]
pub struct Cli {
    /// Backend API access.
    #[clap(flatten)]
    pub api: ApiConfig,

    /// Print JSON instead of tables
    #[arg(long, global = true, env = "DATADOCK_JSON")]
    pub json: bool,

    /// Command to run.
    #[command(subcommand)]
    pub command: Command,
}

impl Cli {
    /// Loads environment variables from .env file (if enabled) and parses CLI arguments.
    ///
    /// The .env file is loaded before clap parses arguments, so its
    /// variables act as defaults for `env`-backed flags.
    pub fn init() -> Self {
        Self::load_dotenv();
        Self::parse()
    }

    /// Loads environment variables from .env file if the dotenv feature is enabled.
    #[cfg(feature = "dotenv")]
    fn load_dotenv() {
        if let Err(err) = dotenvy::dotenv()
            && !err.not_found()
        {
            eprintln!("Warning: failed to load .env file: {err}");
        }
    }

    /// No-op when dotenv feature is disabled.
    #[cfg(not(feature = "dotenv"))]
    fn load_dotenv() {}

    /// Validates all configuration values.
    pub fn validate(&self) -> anyhow::Result<()> {
        self.api.validate().context("invalid API configuration")?;
        Ok(())
    }

    /// Logs configuration at debug level (no sensitive information).
    pub fn log(&self) {
        tracing::debug!(
            target: TRACING_TARGET_STARTUP,
            version = env!("CARGO_PKG_VERSION"),
            pid = process::id(),
            arch = std::env::consts::ARCH,
            os = std::env::consts::OS,
            features = ?Self::enabled_features(),
            "Build information"
        );

        tracing::debug!(
            target: TRACING_TARGET_CONFIG,
            base_url = %self.api.base_url,
            token_source = self.token_source(),
            http_timeout_secs = self.api.effective_timeout().as_secs(),
            user_agent = %self.api.effective_user_agent(),
            json = self.json,
            "API configuration"
        );
    }

    fn token_source(&self) -> &'static str {
        match (&self.api.token_file, &self.api.token) {
            (Some(_), _) => "file",
            (None, Some(_)) => "inline",
            (None, None) => "none",
        }
    }

    /// Returns a list of enabled compile-time features.
    fn enabled_features() -> Vec<&'static str> {
        [cfg!(feature = "dotenv").then_some("dotenv")]
            .into_iter()
            .flatten()
            .collect()
    }
}
