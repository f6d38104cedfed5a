//! Info command - show index statistics

use crate::cli::output::{colors, format_bytes};
use crate::cli::OutputFormat;
use crate::core::services::Services;
use crate::core::types::{IndexIdentity, StorageKind};
use clap::Args;
use serde::Serialize;
use std::sync::Arc;

/// Arguments for the info command
#[derive(Args, Debug)]
pub struct InfoArgs {
    /// Index location
    pub index: String,
}

/// Index information response
#[derive(Debug, Serialize)]
pub struct InfoResponse {
    pub version: String,
    pub index: String,
    pub num_docs: u64,
    pub num_segments: usize,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub size_bytes: Option<u64>,
}

/// Execute the info command
pub async fn execute(
    args: InfoArgs,
    services: &Arc<Services>,
    kind: StorageKind,
    format: OutputFormat,
) -> Result<(), Box<dyn std::error::Error>> {
    let identity = IndexIdentity::new(kind, &args.index);
    let stats = services.query.stats(&identity)?;
    let size_bytes = services
        .registry
        .openers()
        .get(kind)?
        .size_bytes(&identity.location);

    let info = InfoResponse {
        version: env!("CARGO_PKG_VERSION").to_string(),
        index: identity.to_string(),
        num_docs: stats.num_docs,
        num_segments: stats.num_segments,
        size_bytes,
    };

    match format {
        OutputFormat::Human => {
            println!("{}", colors::index_name(&info.index));
            println!("  Documents: {}", colors::number(&info.num_docs.to_string()));
            println!(
                "  Segments:  {}",
                colors::number(&info.num_segments.to_string())
            );
            if let Some(bytes) = info.size_bytes {
                println!("  Size:      {}", colors::number(&format_bytes(bytes)));
            }
            println!("{}", colors::dim(&format!("docsearch {}", info.version)));
        }
        OutputFormat::Json => {
            println!("{}", serde_json::to_string_pretty(&info)?);
        }
    }

    Ok(())
}
