//! Config command - show current configuration

use crate::cli::OutputFormat;
use crate::core::config::Config;
use crate::core::services::Services;
use clap::Args;
use serde::Serialize;
use std::sync::Arc;

/// Arguments for the show-config command
#[derive(Args, Debug)]
pub struct ConfigArgs {
    /// Also show where configuration files are looked up
    #[arg(long, short = 'a')]
    pub all: bool,
}

/// Configuration response
#[derive(Debug, Serialize)]
pub struct ConfigResponse {
    #[serde(flatten)]
    pub config: Config,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub user_config_file: Option<String>,
}

/// Execute the show-config command
pub async fn execute(
    args: ConfigArgs,
    services: &Arc<Services>,
    format: OutputFormat,
) -> Result<(), Box<dyn std::error::Error>> {
    let response = ConfigResponse {
        config: Config::clone(&services.config),
        user_config_file: if args.all {
            Config::user_config_file().map(|p| p.to_string_lossy().into_owned())
        } else {
            None
        },
    };

    match format {
        OutputFormat::Human => {
            println!("Configuration:");
            print!("{}", toml::to_string_pretty(&response.config)?);
            if let Some(path) = &response.user_config_file {
                println!("\n# user config file: {path}");
            }
        }
        OutputFormat::Json => {
            println!("{}", serde_json::to_string_pretty(&response)?);
        }
    }

    Ok(())
}
