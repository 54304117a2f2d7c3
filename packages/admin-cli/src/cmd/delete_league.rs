//! League deletion (cascades to its clubs and members)

use anyhow::{Context, Result};
use clap::Args;
use colored::Colorize;
use dialoguer::{theme::ColorfulTheme, Confirm};
use federation_client::{transport::league_deletion_path, ApiClient, ClientConfig};
use std::env;

#[derive(Args, Debug)]
pub struct DeleteLeagueArgs {
    /// Base URL of the instance to act on
    #[arg(long)]
    pub target: String,

    /// Exact league name
    pub name: String,

    /// Print the request without sending it
    #[arg(long)]
    pub dry_run: bool,

    /// Skip the confirmation prompt
    #[arg(short, long)]
    pub yes: bool,
}

pub async fn run(args: DeleteLeagueArgs) -> Result<()> {
    let name = args.name.trim();
    if name.is_empty() {
        anyhow::bail!("League name must not be empty");
    }

    let mut config = ClientConfig::new(&args.target);
    config.api_token = env::var("FEDERATION_API_TOKEN").ok().filter(|t| !t.is_empty());

    let request = describe_request(&config.api_url, name);
    println!("{} {}", "Target:".bright_cyan(), config.api_url);
    println!("{} {}", "Request:".bright_cyan(), request);

    if args.dry_run {
        println!("{}", "Dry run, nothing sent.".bright_yellow());
        return Ok(());
    }

    if config.api_token.is_none() {
        anyhow::bail!("FEDERATION_API_TOKEN must be set to delete a league");
    }

    if !args.yes {
        let confirmed = Confirm::with_theme(&ColorfulTheme::default())
            .with_prompt(format!(
                "Delete league '{name}' and all of its clubs and members on {}?",
                config.api_url
            ))
            .default(false)
            .interact()?;
        if !confirmed {
            println!("{}", "Aborted.".bright_blue());
            return Ok(());
        }
    }

    let client = ApiClient::new(&config).context("Failed to build HTTP client")?;
    tracing::info!(league = name, target = %config.api_url, "Deleting league");
    let deletion = client
        .delete_league(name)
        .await
        .with_context(|| format!("Failed to delete league '{name}'"))?;

    println!("{} {}", "✓".bright_green(), deletion.message);
    if !deletion.deleted.is_null() {
        println!("{}", deletion.deleted);
    }
    Ok(())
}

fn describe_request(base_url: &str, name: &str) -> String {
    format!("DELETE {}{}", base_url, league_deletion_path(name))
}
