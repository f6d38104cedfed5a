//! docsearch CLI - command-line interface for docsearch indexes
//!
//! # Examples
//!
//! ```bash
//! # Add documents
//! docsearch add articles --file articles.json
//!
//! # Search
//! docsearch search articles "title:rust AND body:\"error handling\""
//!
//! # Filter, sort and page
//! docsearch query articles --filter "@type:post" --sort "published desc 6" --take 5
//!
//! # Show configuration
//! docsearch show-config
//! ```

use clap::Parser;
use docsearch::cli::output::print_error;
use docsearch::cli::{run, Cli};
use tracing_subscriber::EnvFilter;

fn init_logging() {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("docsearch=info"));

    tracing_subscriber::fmt()
        .with_writer(std::io::stderr) // stdout carries command output
        .with_env_filter(filter)
        .compact()
        .init();
}

#[tokio::main]
async fn main() {
    init_logging();

    let cli = Cli::parse();

    if let Err(e) = run(cli).await {
        print_error(&e.to_string());
        std::process::exit(1);
    }
}
