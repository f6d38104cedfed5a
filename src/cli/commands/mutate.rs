//! Mutating commands - add, update, delete and clear
//!
//! Every command commits before it returns.

use super::DocumentInput;
use crate::cli::output::colors;
use crate::cli::OutputFormat;
use crate::core::services::Services;
use crate::core::types::{IndexIdentity, StorageKind, Term};
use clap::Args;
use serde::Serialize;
use std::sync::Arc;

/// Arguments for the add command
#[derive(Args, Debug)]
pub struct AddArgs {
    /// Index location
    pub index: String,

    #[command(flatten)]
    pub input: DocumentInput,
}

/// Arguments for the update command
#[derive(Args, Debug)]
pub struct UpdateArgs {
    /// Index location
    pub index: String,

    /// Documents to replace, as field=value
    #[arg(long, short = 't')]
    pub term: Term,

    #[command(flatten)]
    pub input: DocumentInput,
}

/// Arguments for the delete command
#[derive(Args, Debug)]
pub struct DeleteArgs {
    /// Index location
    pub index: String,

    /// Documents to delete, as field=value
    #[arg(long, short = 't')]
    pub term: Term,
}

/// Arguments for the clear command
#[derive(Args, Debug)]
pub struct ClearArgs {
    /// Index location
    pub index: String,
}

/// Mutation response
#[derive(Debug, Serialize)]
pub struct MutationOutput {
    pub index: String,
    pub operation: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub documents: Option<usize>,
    pub num_docs: u64,
}

/// Execute the add command
pub async fn execute_add(
    args: AddArgs,
    services: &Arc<Services>,
    kind: StorageKind,
    format: OutputFormat,
) -> Result<(), Box<dyn std::error::Error>> {
    let documents = args.input.read()?;
    let identity = IndexIdentity::new(kind, &args.index);

    services.mutation.add_documents(&identity, &documents)?;
    services.mutation.commit(&identity)?;

    report(services, identity, "add", Some(documents.len()), format)
}

/// Execute the update command
pub async fn execute_update(
    args: UpdateArgs,
    services: &Arc<Services>,
    kind: StorageKind,
    format: OutputFormat,
) -> Result<(), Box<dyn std::error::Error>> {
    let mut documents = args.input.read()?;
    if documents.len() != 1 {
        return Err(format!("update takes exactly one document, got {}", documents.len()).into());
    }
    let document = documents.remove(0);
    let identity = IndexIdentity::new(kind, &args.index);

    services
        .mutation
        .update_document(&identity, &args.term, &document)?;
    services.mutation.commit(&identity)?;

    report(services, identity, "update", Some(1), format)
}

/// Execute the delete command
pub async fn execute_delete(
    args: DeleteArgs,
    services: &Arc<Services>,
    kind: StorageKind,
    format: OutputFormat,
) -> Result<(), Box<dyn std::error::Error>> {
    let identity = IndexIdentity::new(kind, &args.index);

    services.mutation.delete_documents(&identity, &args.term)?;
    services.mutation.commit(&identity)?;

    report(services, identity, "delete", None, format)
}

/// Execute the clear command
pub async fn execute_clear(
    args: ClearArgs,
    services: &Arc<Services>,
    kind: StorageKind,
    format: OutputFormat,
) -> Result<(), Box<dyn std::error::Error>> {
    let identity = IndexIdentity::new(kind, &args.index);

    services.mutation.clear_index(&identity)?;
    services.mutation.commit(&identity)?;

    report(services, identity, "clear", None, format)
}

fn report(
    services: &Services,
    identity: IndexIdentity,
    operation: &'static str,
    documents: Option<usize>,
    format: OutputFormat,
) -> Result<(), Box<dyn std::error::Error>> {
    let stats = services.query.stats(&identity)?;
    let output = MutationOutput {
        index: identity.to_string(),
        operation,
        documents,
        num_docs: stats.num_docs,
    };

    match format {
        OutputFormat::Human => {
            let done = match output.documents {
                Some(n) => format!("{} ({n} document(s))", output.operation),
                None => output.operation.to_string(),
            };
            println!(
                "{} {} {}",
                colors::success(&done),
                colors::index_name(&output.index),
                colors::dim(&format!("now holds {} document(s)", output.num_docs))
            );
        }
        OutputFormat::Json => {
            println!("{}", serde_json::to_string_pretty(&output)?);
        }
    }

    Ok(())
}
