//! Downloads a GraphQL schema in SDL format from a remote endpoint and saves
//! it as `schema.graphql` for code generation.

mod client;
mod commands;
mod config;
mod error;
mod logging;
mod output;

use anyhow::Result;
use clap::builder::{PossibleValuesParser, TypedValueParser};
use clap::{Parser, Subcommand};
use tracing::Level;

use crate::commands::config::{ConfigCommands, handle_config_command};
use crate::commands::download::{DownloadArgs, handle_download_command};
use crate::logging::LEVELS;

#[derive(Parser)]
#[command(name = "sdl-fetch")]
#[command(about = "Download a GraphQL schema in SDL format", long_about = None)]
#[command(version)]
struct Cli {
    /// Log level
    #[arg(
        long = "log",
        short = 'l',
        global = true,
        ignore_case = true,
        value_parser = PossibleValuesParser::new(LEVELS).try_map(|s| s.parse::<Level>())
    )]
    log_level: Option<Level>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Download the schema from the target endpoint
    Download(DownloadArgs),
    /// Manage endpoint profiles
    Config {
        #[command(subcommand)]
        command: ConfigCommands,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    logging::init(cli.log_level);

    match cli.command {
        Commands::Download(args) => {
            handle_download_command(args).await?;
        }
        Commands::Config { command } => {
            handle_config_command(command)?;
        }
    }

    Ok(())
}
