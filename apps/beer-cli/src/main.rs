mod commands;
mod config;

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result};
use beer_catalog_client::HttpBeerClient;
use clap::Parser;
use taproom_auth::{StaticTokenProvider, TokenProvider, TokenRegistry};
use tracing_subscriber::EnvFilter;

use crate::commands::Command;

/// Beer catalog client
#[derive(Parser)]
#[command(name = "beer-cli")]
#[command(version, about, long_about = None)]
struct Cli {
    /// Path to YAML configuration file
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Use this bearer token instead of the configured OAuth2 client.
    ///
    /// Prefer `BEER_CATALOG_ACCESS_TOKEN`; a flag value shows up in `ps` and
    /// shell history.
    #[arg(long, env = "BEER_CATALOG_ACCESS_TOKEN", hide_env_values = true)]
    access_token: Option<String>,

    /// Log verbosity level (-v debug for this client, -vv debug, -vvv trace)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,

    #[command(subcommand)]
    command: Command,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    let config = config::load(cli.config.as_deref())?;
    tracing::debug!(
        root_url = %config.root_url,
        registration_id = %config.registration_id,
        "loaded configuration"
    );

    let provider: Arc<dyn TokenProvider> = if let Some(token) = cli.access_token {
        Arc::new(StaticTokenProvider::new(token))
    } else {
        let oauth = config
            .oauth_config()
            .context("OAuth2 client configuration")?;
        let registry = TokenRegistry::from_configs([(config.registration_id.clone(), oauth)])
            .await
            .context("failed to obtain an access token")?;
        Arc::new(registry)
    };

    let client = HttpBeerClient::new(config, provider);
    let output = cli.command.execute(&client).await?;
    println!("{}", serde_json::to_string_pretty(&output)?);
    Ok(())
}

/// `RUST_LOG` wins over `-v`. Output goes to stderr so stdout stays JSON.
fn init_tracing(verbose: u8) {
    let directives =
        std::env::var("RUST_LOG").unwrap_or_else(|_| verbosity_directives(verbose).to_owned());
    let filter = EnvFilter::try_new(&directives).unwrap_or_else(|_| EnvFilter::new("info"));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(verbose >= 2)
        .init();
}

fn verbosity_directives(verbose: u8) -> &'static str {
    match verbose {
        0 => "info",
        1 => "info,beer_catalog_client=debug,taproom_auth=debug,taproom_http=debug",
        2 => "debug",
        _ => "trace",
    }
}
