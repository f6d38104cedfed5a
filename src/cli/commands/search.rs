//! Search command - run a query string against an index

use super::HitOutput;
use crate::cli::output::{colors, print_hits};
use crate::cli::OutputFormat;
use crate::core::search::escape_query;
use crate::core::services::Services;
use crate::core::types::{IndexIdentity, StorageKind};
use clap::Args;
use serde::Serialize;
use std::sync::Arc;

/// Arguments for the search command
#[derive(Args, Debug)]
pub struct SearchArgs {
    /// Index location
    pub index: String,

    /// Query string (supports AND, OR, NOT, phrases, ranges, wildcards)
    pub query: String,

    /// Field searched by terms without a field prefix
    #[arg(long, default_value = "body")]
    pub field: String,

    /// Maximum number of results
    #[arg(long, short = 'k')]
    pub limit: Option<usize>,

    /// Match the query text literally, without query syntax
    #[arg(long)]
    pub literal: bool,
}

/// Search response
#[derive(Debug, Serialize)]
pub struct SearchOutput {
    pub query: String,
    pub index: String,
    pub total_results: usize,
    pub results: Vec<HitOutput>,
}

/// Execute the search command
pub async fn execute(
    args: SearchArgs,
    services: &Arc<Services>,
    kind: StorageKind,
    format: OutputFormat,
) -> Result<(), Box<dyn std::error::Error>> {
    let identity = IndexIdentity::new(kind, &args.index);
    let limit = args
        .limit
        .unwrap_or(services.config.search.default_max_results);

    let query = if args.literal {
        escape_query(&args.query)
    } else {
        args.query.clone()
    };

    let hits = services
        .query
        .search(&identity, &args.field, &query, limit)?;

    let output = SearchOutput {
        query: args.query,
        index: identity.to_string(),
        total_results: hits.len(),
        results: HitOutput::from_hits(hits, 1),
    };

    match format {
        OutputFormat::Human => {
            if output.results.is_empty() {
                println!(
                    "No results found for '{}' in '{}'",
                    colors::label(&output.query),
                    colors::index_name(&output.index)
                );
            } else {
                println!(
                    "Found {} result(s) in '{}':\n",
                    colors::number(&output.total_results.to_string()),
                    colors::index_name(&output.index)
                );
                print_hits(&output.results);
            }
        }
        OutputFormat::Json => {
            println!("{}", serde_json::to_string_pretty(&output)?);
        }
    }

    Ok(())
}
