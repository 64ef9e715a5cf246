use anyhow::Result;
use clap::Args;
use std::fs;
use std::path::PathBuf;
use tracing::{debug, info};

use crate::client;
use crate::config::{Config, DownloadTarget, Overrides};
use crate::error::FetchError;
use crate::output::{self, DEFAULT_OUTPUT_DIR};

#[derive(Debug, Args)]
pub struct DownloadArgs {
    /// Target SDL endpoint
    #[arg(long)]
    endpoint: Option<String>,

    /// Endpoint profile from config to use (default profile if omitted)
    #[arg(long)]
    profile: Option<String>,

    /// HTTP header to send, as `Name: value` (repeatable)
    #[arg(short = 'H', long = "header", value_parser = parse_header)]
    headers: Vec<(String, String)>,

    /// Connect timeout in milliseconds (0 for the 5000ms default)
    #[arg(long)]
    connect_timeout: Option<u64>,

    /// Read timeout in milliseconds (0 for the 15000ms default)
    #[arg(long)]
    read_timeout: Option<u64>,

    /// Directory that receives `schema.graphql`
    #[arg(long, default_value = DEFAULT_OUTPUT_DIR)]
    output_dir: PathBuf,
}

impl From<DownloadArgs> for Overrides {
    fn from(args: DownloadArgs) -> Self {
        Self {
            profile: args.profile,
            endpoint: args.endpoint,
            headers: args.headers,
            connect_timeout: args.connect_timeout,
            read_timeout: args.read_timeout,
            output_dir: args.output_dir,
        }
    }
}

pub async fn handle_download_command(args: DownloadArgs) -> Result<()> {
    let overrides = Overrides::from(args);
    let config = if overrides.needs_config() {
        Config::load()?
    } else {
        Config::default()
    };

    let target = DownloadTarget::resolve(overrides, &config)?;
    let path = download(&target).await?;
    println!("Schema written to {}", path.display());

    Ok(())
}

/// Downloads the schema and stores it as `schema.graphql` in the target's
/// output directory. Nothing is written unless the whole body was received.
pub async fn download(target: &DownloadTarget) -> Result<PathBuf, FetchError> {
    debug!(endpoint = %target.endpoint, "starting SDL download");

    let schema = client::fetch(&target.endpoint, &target.headers, target.timeout).await?;

    fs::create_dir_all(&target.output_dir).map_err(|e| FetchError::io(&target.output_dir, e))?;
    let path = target.output_path();
    output::persist(&schema, &path)?;

    debug!(bytes = schema.len(), "successfully downloaded SDL");
    info!(path = %path.display(), "schema written");

    Ok(path)
}

/// Parses a `Name: value` header argument.
pub fn parse_header(raw: &str) -> Result<(String, String), String> {
    let (name, value) = raw
        .split_once(':')
        .ok_or_else(|| format!("expected 'Name: value', got '{raw}'"))?;

    let name = name.trim();
    if name.is_empty() {
        return Err(format!("header name is empty in '{raw}'"));
    }

    Ok((name.to_string(), value.trim().to_string()))
}
