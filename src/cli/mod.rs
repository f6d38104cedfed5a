//! CLI adapter for docsearch
//!
//! Provides a command-line interface over the core services. Depends on
//! `core/`; nothing in `core/` depends on it.
//!
//! # Architecture
//!
//! ```text
//!              +------------------+
//!              |     core/        |
//!              |  (domain logic)  |
//!              +--------+---------+
//!                       |
//!                       v
//!              +------------------+
//!              |      cli/        |
//!              | (clap adapter)   |
//!              +------------------+
//! ```

pub mod commands;
pub mod output;

use crate::core::types::StorageKind;
use clap::{Parser, Subcommand};

/// docsearch - indexed document search
///
/// Add JSON documents to named indexes and search them with
/// Lucene-style query strings.
#[derive(Parser, Debug)]
#[command(name = "docsearch")]
#[command(version)]
#[command(about = "Indexed document search", long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Output format
    #[arg(long, global = true, default_value = "human")]
    pub format: OutputFormat,

    /// Storage kind of the index; hosted indexes live only for this process
    #[arg(long, global = true, default_value = "local")]
    pub kind: KindArg,

    #[command(subcommand)]
    pub command: Commands,
}

/// Output format for CLI commands
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, clap::ValueEnum)]
pub enum OutputFormat {
    /// Human-readable output (default)
    #[default]
    Human,
    /// JSON output for scripting
    Json,
}

/// Storage kind selector
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, clap::ValueEnum)]
pub enum KindArg {
    /// Directory on the local filesystem (default)
    #[default]
    Local,
    /// In-process memory
    Hosted,
}

impl From<KindArg> for StorageKind {
    fn from(kind: KindArg) -> Self {
        match kind {
            KindArg::Local => StorageKind::LocalFilesystem,
            KindArg::Hosted => StorageKind::HostedDirectory,
        }
    }
}

/// Available CLI commands
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Add JSON documents to an index
    Add(commands::AddArgs),

    /// Replace the documents matching a term
    Update(commands::UpdateArgs),

    /// Delete the documents matching a term
    Delete(commands::DeleteArgs),

    /// Delete every document of an index
    Clear(commands::ClearArgs),

    /// Search an index with a query string
    Search(commands::SearchArgs),

    /// Structured query with filter, sort and paging
    Query(commands::QueryArgs),

    /// Show index statistics
    Info(commands::InfoArgs),

    /// Show current configuration
    #[command(name = "show-config")]
    ShowConfig(commands::ConfigArgs),

    /// Generate shell completion scripts
    ///
    /// Output completion script to stdout. To install:
    ///
    ///   bash:  docsearch completions bash > ~/.local/share/bash-completion/completions/docsearch
    ///   zsh:   docsearch completions zsh > ~/.zfunc/_docsearch
    ///   fish:  docsearch completions fish > ~/.config/fish/completions/docsearch.fish
    Completions(commands::CompletionsArgs),
}

/// Run the CLI with the provided arguments
///
/// Writer handles are closed before returning, whether or not the
/// command succeeded.
pub async fn run(cli: Cli) -> Result<(), Box<dyn std::error::Error>> {
    use crate::core::config::Config;
    use crate::core::services::Services;
    use std::sync::Arc;

    let format = cli.format;
    let kind = StorageKind::from(cli.kind);

    // Handle completions command early (doesn't need services)
    let command = match cli.command {
        Commands::Completions(args) => return commands::completions::execute(args),
        command => command,
    };

    let config = Config::load()?;
    config.log_config();

    let services = Arc::new(Services::new(config));

    let result = match command {
        Commands::Add(args) => commands::mutate::execute_add(args, &services, kind, format).await,
        Commands::Update(args) => {
            commands::mutate::execute_update(args, &services, kind, format).await
        }
        Commands::Delete(args) => {
            commands::mutate::execute_delete(args, &services, kind, format).await
        }
        Commands::Clear(args) => commands::mutate::execute_clear(args, &services, kind, format).await,
        Commands::Search(args) => commands::search::execute(args, &services, kind, format).await,
        Commands::Query(args) => commands::query::execute(args, &services, kind, format).await,
        Commands::Info(args) => commands::info::execute(args, &services, kind, format).await,
        Commands::ShowConfig(args) => commands::config::execute(args, &services, format).await,
        Commands::Completions(_) => Ok(()),
    };

    if let Err(e) = services.shutdown() {
        output::print_warning(&format!("Failed to close index writers: {e}"));
        if result.is_ok() {
            return Err(e.into());
        }
    }

    result
}
