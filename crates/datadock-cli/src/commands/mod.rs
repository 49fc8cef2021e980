//! Subcommands of the `datadock` binary.

mod catalog;
mod connections;
mod fields;
mod pipelines;
mod schedules;

use std::io::{self, BufRead, Write};

use clap::{Args, Subcommand};
use datadock_client::ApiClient;
use datadock_core::listing::DEFAULT_PAGE_SIZE;
use datadock_core::{ListView, Searchable};

pub use self::catalog::CatalogCommand;
pub use self::connections::ConnectionsCommand;
pub use self::pipelines::PipelinesCommand;
pub use self::schedules::SchedulesCommand;
use crate::TRACING_TARGET_COMMAND;
use crate::config::Cli;
use crate::render::Output;

/// Top-level command groups.
#[derive(Debug, Clone, Subcommand)]
pub enum Command {
    /// Browse the catalog of supported database services
    #[command(subcommand)]
    Catalog(CatalogCommand),

    /// Manage database connections
    #[command(subcommand)]
    Connections(ConnectionsCommand),

    /// Manage ETL pipelines
    #[command(subcommand)]
    Pipelines(PipelinesCommand),

    /// Inspect pipeline schedules
    #[command(subcommand)]
    Schedules(SchedulesCommand),
}

impl Command {
    fn name(&self) -> &'static str {
        match self {
            Self::Catalog(_) => "catalog",
            Self::Connections(_) => "connections",
            Self::Pipelines(_) => "pipelines",
            Self::Schedules(_) => "schedules",
        }
    }
}

/// Runs the parsed command against the backend.
pub async fn execute(cli: &Cli, client: &ApiClient) -> anyhow::Result<()> {
    let output = Output::new(cli.json);

    tracing::debug!(
        target: TRACING_TARGET_COMMAND,
        command = cli.command.name(),
        "Running command"
    );

    match &cli.command {
        Command::Catalog(command) => catalog::run(command, output),
        Command::Connections(command) => connections::run(command, client, output).await,
        Command::Pipelines(command) => pipelines::run(command, client, output).await,
        Command::Schedules(command) => schedules::run(command, client, output).await,
    }
}

/// Search and pagination flags shared by list commands.
#[derive(Debug, Clone, Args)]
pub struct ListArgs {
    /// Case-insensitive search text
    #[arg(long, short)]
    pub search: Option<String>,

    /// Page to show, starting at 1
    #[arg(long, default_value_t = 1)]
    pub page: usize,

    /// Rows per page
    #[arg(long, default_value_t = DEFAULT_PAGE_SIZE)]
    pub page_size: usize,
}

impl ListArgs {
    /// Builds the list view positioned at the requested search and page.
    pub fn view<T: Searchable + Clone>(&self, items: Vec<T>) -> ListView<T> {
        let mut view = ListView::new(items).with_page_size(self.page_size);
        if let Some(search) = &self.search {
            view.set_query(search.as_str());
        }
        view.go_to(self.page);
        view
    }
}

/// Asks for confirmation on stdin. Anything but `y`/`yes` declines.
pub fn confirm(prompt: &str) -> anyhow::Result<bool> {
    let stdin = io::stdin();
    confirm_with(prompt, &mut stdin.lock(), &mut io::stderr())
}

fn confirm_with(
    prompt: &str,
    input: &mut impl BufRead,
    prompt_out: &mut impl Write,
) -> anyhow::Result<bool> {
    write!(prompt_out, "{prompt} [y/N] ")?;
    prompt_out.flush()?;

    let mut answer = String::new();
    input.read_line(&mut answer)?;
    Ok(matches!(
        answer.trim().to_ascii_lowercase().as_str(),
        "y" | "yes"
    ))
}

#[cfg(test)]
mod tests {
    use std::io::Cursor;

    use clap::Parser;

    use super::*;

    #[test]
    fn test_confirmation_requires_explicit_yes() {
        let mut prompt = Vec::new();
        assert!(confirm_with("Delete?", &mut Cursor::new("y\n"), &mut prompt).unwrap());
        assert!(confirm_with("Delete?", &mut Cursor::new(" YES "), &mut prompt).unwrap());
        assert!(!confirm_with("Delete?", &mut Cursor::new("\n"), &mut prompt).unwrap());
        assert!(!confirm_with("Delete?", &mut Cursor::new(""), &mut prompt).unwrap());
        assert!(String::from_utf8(prompt).unwrap().starts_with("Delete? [y/N] "));
    }

    #[test]
    fn test_list_args_position_the_view() {
        let cli = Cli::try_parse_from([
            "datadock",
            "connections",
            "list",
            "--search",
            "orders",
            "--page",
            "2",
        ])
        .unwrap();
        let Command::Connections(ConnectionsCommand::List(args)) = cli.command else {
            panic!("expected connections list");
        };
        assert_eq!(args.search.as_deref(), Some("orders"));
        assert_eq!(args.page, 2);
        assert_eq!(args.page_size, DEFAULT_PAGE_SIZE);
    }
}
