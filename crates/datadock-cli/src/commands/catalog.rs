//! `datadock catalog ...`

use clap::Subcommand;
use datadock_core::ServiceCategory;
use datadock_core::catalog;

use crate::render::{self, Output};

#[derive(Debug, Clone, Subcommand)]
pub enum CatalogCommand {
    /// List database services, optionally filtered
    List {
        /// Case-insensitive search over name, display name and type
        #[arg(long, short)]
        search: Option<String>,

        /// Only show one category (relational, warehouse, no_sql, ...)
        #[arg(long, short)]
        category: Option<ServiceCategory>,
    },

    /// List the categories present in the catalog
    Categories,
}

pub fn run(command: &CatalogCommand, output: Output) -> anyhow::Result<()> {
    match command {
        CatalogCommand::List { search, category } => {
            let descriptors = catalog::filter(search.as_deref().unwrap_or_default(), *category);
            output.emit(&descriptors, || {
                if descriptors.is_empty() {
                    "No database services match your search".to_owned()
                } else {
                    render::catalog_table(&descriptors).to_string()
                }
            })
        }

        CatalogCommand::Categories => {
            let categories = catalog::categories();
            output.emit(&categories, || {
                categories
                    .iter()
                    .map(ToString::to_string)
                    .collect::<Vec<_>>()
                    .join("\n")
            })
        }
    }
}
