//! CLI command implementations
//!
//! Each command module handles argument parsing and execution for a specific CLI command.

pub mod completions;
pub mod config;
pub mod info;
pub mod mutate;
pub mod query;
pub mod search;

// Re-export argument types for use in mod.rs
pub use completions::CompletionsArgs;
pub use config::ConfigArgs;
pub use info::InfoArgs;
pub use mutate::{AddArgs, ClearArgs, DeleteArgs, UpdateArgs};
pub use query::QueryArgs;
pub use search::SearchArgs;

use crate::core::types::{Document, Hit};
use clap::Args;
use serde::Serialize;
use std::io::Read;
use std::path::PathBuf;

/// Where documents for `add` and `update` come from
#[derive(Args, Debug, Default)]
pub struct DocumentInput {
    /// Read documents from a JSON file (object or array of objects)
    #[arg(long, short = 'f', conflicts_with = "json")]
    pub file: Option<PathBuf>,

    /// Inline JSON document(s); stdin is read when neither is given
    #[arg(long)]
    pub json: Option<String>,
}

impl DocumentInput {
    /// Parse the input into documents
    pub fn read(&self) -> Result<Vec<Document>, Box<dyn std::error::Error>> {
        let text = match (&self.file, &self.json) {
            (Some(path), _) => std::fs::read_to_string(path)
                .map_err(|e| format!("Failed to read '{}': {e}", path.display()))?,
            (None, Some(json)) => json.clone(),
            (None, None) => {
                let mut buffer = String::new();
                std::io::stdin().read_to_string(&mut buffer)?;
                buffer
            }
        };

        parse_documents(&text)
    }
}

/// Documents from a JSON object or an array of objects
pub fn parse_documents(text: &str) -> Result<Vec<Document>, Box<dyn std::error::Error>> {
    let value: serde_json::Value = serde_json::from_str(text)?;
    let documents = match &value {
        serde_json::Value::Array(items) => items
            .iter()
            .map(Document::from_json)
            .collect::<Result<Vec<_>, _>>()?,
        _ => vec![Document::from_json(&value)?],
    };

    if documents.is_empty() {
        return Err("No documents in input".into());
    }
    Ok(documents)
}

/// One ranked hit as printed by `search` and `query`
#[derive(Debug, Serialize)]
pub struct HitOutput {
    pub rank: usize,
    pub score: f32,
    pub document_id: u64,
    pub document: serde_json::Value,
}

impl HitOutput {
    pub fn from_hits(hits: Vec<Hit>, first_rank: usize) -> Vec<Self> {
        hits.into_iter()
            .enumerate()
            .map(|(i, hit)| HitOutput {
                rank: first_rank + i,
                score: hit.score,
                document_id: hit.document_id,
                document: hit
                    .document
                    .map(|d| d.to_json())
                    .unwrap_or(serde_json::Value::Null),
            })
            .collect()
    }
}
