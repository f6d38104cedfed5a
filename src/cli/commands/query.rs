//! Query command - structured query with filter, sort and paging

use super::HitOutput;
use crate::cli::output::{colors, print_hits};
use crate::cli::OutputFormat;
use crate::core::services::Services;
use crate::core::types::{IndexIdentity, SortSpec, StorageKind, StructuredQuery};
use clap::Args;
use serde::Serialize;
use std::sync::Arc;

/// Arguments for the query command
#[derive(Args, Debug)]
pub struct QueryArgs {
    /// Index location
    pub index: String,

    /// Scored query text; every document matches when omitted
    #[arg(long, short = 'q')]
    pub text: Option<String>,

    /// Non-scoring filter query
    #[arg(long)]
    pub filter: Option<String>,

    /// Sort clause "<field> [asc|desc] [type-hint]", repeatable
    #[arg(long, short = 's')]
    pub sort: Vec<SortSpec>,

    /// Matches to skip
    #[arg(long, default_value = "0", allow_negative_numbers = true)]
    pub skip: i64,

    /// Matches to return
    #[arg(long, allow_negative_numbers = true)]
    pub take: Option<i64>,

    /// Field searched by terms without a field prefix
    #[arg(long, default_value = "body")]
    pub field: String,
}

/// Query response
#[derive(Debug, Serialize)]
pub struct QueryOutput {
    pub index: String,
    pub query: StructuredQuery,
    pub total_results: usize,
    pub results: Vec<HitOutput>,
}

/// Execute the query command
pub async fn execute(
    args: QueryArgs,
    services: &Arc<Services>,
    kind: StorageKind,
    format: OutputFormat,
) -> Result<(), Box<dyn std::error::Error>> {
    let identity = IndexIdentity::new(kind, &args.index);
    let take = args
        .take
        .unwrap_or(services.config.search.default_max_results as i64);

    let query = StructuredQuery {
        free_text: args.text,
        filter: args.filter,
        sort: args.sort,
        skip: args.skip,
        take,
    };

    let hits = services
        .query
        .search_structured(&identity, &args.field, &query)?;

    let first_rank = usize::try_from(query.skip.max(0)).unwrap_or(usize::MAX).saturating_add(1);
    let output = QueryOutput {
        index: identity.to_string(),
        total_results: hits.len(),
        results: HitOutput::from_hits(hits, first_rank),
        query,
    };

    match format {
        OutputFormat::Human => {
            if output.results.is_empty() {
                println!(
                    "No results in '{}'",
                    colors::index_name(&output.index)
                );
            } else {
                println!(
                    "{} result(s) from '{}':\n",
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
