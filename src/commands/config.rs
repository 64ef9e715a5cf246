use anyhow::Result;
use clap::Subcommand;
use std::collections::BTreeMap;

use crate::client::TimeoutConfig;
use crate::commands::download::parse_header;
use crate::config::{Config, EndpointConfig, HeaderScalar};

#[derive(Debug, Subcommand)]
pub enum ConfigCommands {
    /// Add a new endpoint profile
    Add {
        /// Name for this profile
        name: String,
        /// SDL endpoint URL (e.g., `http://localhost:8080/sdl`)
        #[arg(long)]
        endpoint: String,
        /// HTTP header to send, as `Name: value` (repeatable)
        #[arg(short = 'H', long = "header", value_parser = parse_header)]
        headers: Vec<(String, String)>,
        /// Connect timeout in milliseconds
        #[arg(long)]
        connect_timeout: Option<u64>,
        /// Read timeout in milliseconds
        #[arg(long)]
        read_timeout: Option<u64>,
    },
    /// Remove an endpoint profile
    Remove {
        /// Name of the profile to remove
        name: String,
    },
    /// Set the default profile
    Default {
        /// Name of the profile to set as default
        name: String,
    },
    /// List all configured profiles
    List,
}

pub fn handle_config_command(cmd: ConfigCommands) -> Result<()> {
    match cmd {
        ConfigCommands::Add {
            name,
            endpoint,
            headers,
            connect_timeout,
            read_timeout,
        } => {
            let headers: BTreeMap<String, HeaderScalar> = headers
                .into_iter()
                .map(|(k, v)| (k, HeaderScalar::String(v)))
                .collect();
            add_endpoint(
                &name,
                EndpointConfig {
                    url: endpoint,
                    connect_timeout,
                    read_timeout,
                    headers,
                },
            )
        }
        ConfigCommands::Remove { name } => remove_endpoint(&name),
        ConfigCommands::Default { name } => set_default(&name),
        ConfigCommands::List => list_endpoints(),
    }
}

fn add_endpoint(name: &str, endpoint: EndpointConfig) -> Result<()> {
    let mut config = Config::load()?;

    let is_first = config.endpoints.is_empty();
    config.add_endpoint(name.to_string(), endpoint);

    // The first profile becomes the default
    if is_first {
        config.default = Some(name.to_string());
    }

    config.save()?;
    println!("Endpoint '{name}' added successfully.");

    if is_first {
        println!("Set as default endpoint.");
    }

    Ok(())
}

fn remove_endpoint(name: &str) -> Result<()> {
    let mut config = Config::load()?;

    if config.remove_endpoint(name) {
        config.save()?;
        println!("Endpoint '{name}' removed successfully.");
    } else {
        println!("Endpoint '{name}' not found.");
    }

    Ok(())
}

fn set_default(name: &str) -> Result<()> {
    let mut config = Config::load()?;
    config.set_default(name)?;
    config.save()?;
    println!("Default endpoint set to '{name}'.");
    Ok(())
}

fn list_endpoints() -> Result<()> {
    let config = Config::load()?;

    if config.endpoints.is_empty() {
        println!("No endpoints configured.");
        println!("Use 'sdl-fetch config add <name> --endpoint <url>' to add one.");
        return Ok(());
    }

    println!("Configured endpoints:");
    println!();

    for (name, endpoint) in &config.endpoints {
        let default_marker = if config.default.as_deref() == Some(name) {
            " (default)"
        } else {
            ""
        };

        println!("  {name}{default_marker}");
        println!("    URL: {}", endpoint.url);
        let timeout = TimeoutConfig::new(endpoint.connect_timeout, endpoint.read_timeout);
        println!(
            "    Timeouts: connect {}ms, read {}ms",
            timeout.connect_ms, timeout.read_ms
        );
        for header in endpoint.headers.keys() {
            // Values may carry credentials
            println!("    Header: {header}");
        }
        println!();
    }

    Ok(())
}
