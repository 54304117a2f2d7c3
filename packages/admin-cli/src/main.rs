//! Federation administration CLI
//!
//! One-off maintenance against a federation API instance. Every command
//! reads `FEDERATION_API_TOKEN` (and a `.env` file) for credentials.

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use federation_client::{ApiClient, ClientConfig};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

mod cmd;

#[derive(Parser)]
#[command(name = "fedadmin")]
#[command(about = "Table-tennis federation administration CLI")]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Delete a league and everything registered under it
    DeleteLeague(cmd::delete_league::DeleteLeagueArgs),

    /// Show the selectable options for an equipment field
    Options {
        /// Field type (racket_brand, racket_model, rubber_brand, rubber_model,
        /// rubber_hardness) or a form select such as drive_rubber_brand
        field: String,
    },

    /// Check whether a custom equipment value duplicates a known one
    CheckCustom {
        /// Field type of the value
        field_type: String,

        /// Value to check
        value: String,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize logging
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info,federation_client=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::DeleteLeague(args) => cmd::delete_league::run(args).await,
        Commands::Options { field } => cmd::options::run(&field).await,
        Commands::CheckCustom { field_type, value } => {
            cmd::check_custom::run(&field_type, &value).await
        }
    }
}

/// Client for the instance named by `FEDERATION_API_URL`.
pub(crate) fn client_from_env() -> Result<(ApiClient, ClientConfig)> {
    let config = ClientConfig::from_env().context("Failed to load configuration")?;
    let client = ApiClient::new(&config).context("Failed to build HTTP client")?;
    Ok((client, config))
}
