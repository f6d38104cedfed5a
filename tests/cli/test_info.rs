//! Tests for the info and show-config commands

use crate::cli::test_helpers::{create_cli_test_services, setup_library, KIND};
use docsearch::cli::commands::config::{self, ConfigArgs};
use docsearch::cli::commands::info::{self, InfoArgs};
use docsearch::cli::OutputFormat;

#[tokio::test]
async fn test_info_reports_index() {
    let (services, _temp) = create_cli_test_services();
    setup_library(&services, "library").await;

    for format in [OutputFormat::Human, OutputFormat::Json] {
        let args = InfoArgs {
            index: "library".to_string(),
        };
        let result = info::execute(args, &services, KIND, format).await;
        assert!(result.is_ok(), "Info should succeed: {:?}", result.err());
    }
}

#[tokio::test]
async fn test_info_missing_index() {
    let (services, _temp) = create_cli_test_services();
    let args = InfoArgs {
        index: "missing".to_string(),
    };
    assert!(info::execute(args, &services, KIND, OutputFormat::Human)
        .await
        .is_err());
}

#[tokio::test]
async fn test_show_config() {
    let (services, _temp) = create_cli_test_services();

    let result = config::execute(ConfigArgs { all: true }, &services, OutputFormat::Human).await;
    assert!(result.is_ok(), "Config should succeed: {:?}", result.err());

    let result = config::execute(ConfigArgs { all: false }, &services, OutputFormat::Json).await;
    assert!(result.is_ok());
}

#[test]
fn test_cli_parses_global_flags() {
    use clap::Parser;
    use docsearch::cli::{Cli, Commands, KindArg};

    let cli = Cli::try_parse_from([
        "docsearch",
        "--kind",
        "hosted",
        "query",
        "library",
        "--sort",
        "year desc 6",
        "--skip",
        "-1",
        "--format",
        "json",
    ])
    .unwrap();

    assert_eq!(cli.kind, KindArg::Hosted);
    assert_eq!(cli.format, OutputFormat::Json);
    match cli.command {
        Commands::Query(args) => {
            assert_eq!(args.sort.len(), 1);
            assert_eq!(args.skip, -1);
        }
        other => panic!("unexpected command {other:?}"),
    }
}

#[test]
fn test_cli_rejects_malformed_term() {
    use clap::Parser;
    use docsearch::cli::Cli;

    let result = Cli::try_parse_from(["docsearch", "delete", "library", "--term", "novalue"]);
    assert!(result.is_err());
}
