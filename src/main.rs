//! Remote-to-local environment clone tool
//!
//! Downloads the latest backup and distribution of a remote environment,
//! checks the local build against it and loads the backup locally.

// remote2local/src/main.rs
mod cloud;
mod config;
mod errors;
mod parity;
mod restore;
mod transfer;
mod utils;
mod workflow;

#[cfg(test)]
mod test_support;

use anyhow::{Context, Result};
use clap::Parser;
use config::{CloneConfig, Credentials};
use parity::CommandBuild;
use restore::MysqlClient;
use std::process::ExitCode;
use tracing::{debug, warn};
use tracing_subscriber::EnvFilter;
use utils::prompt::{SecretProvider, TerminalPrompt};
use workflow::{CloneOutcome, CloneWorkflow, Toolchain};

/// Exit status when the local build does not match the remote distribution.
const EXIT_PARITY_MISMATCH: u8 = 2;

#[derive(Debug, Parser)]
#[command(
    author,
    version,
    about = "Authenticate, download the latest backup and distribution, run them locally"
)]
struct Args {
    /// Name of the remote environment you wish to clone locally
    #[arg(long = "remoteEnv", visible_alias = "remote-env")]
    remote_env: String,
    /// Name of the client account
    #[arg(long = "clientAccount", visible_alias = "client-account")]
    client_account: String,
    /// Username to authenticate against the mission control cloud API
    #[arg(long)]
    username: String,
}

#[tokio::main]
async fn main() -> ExitCode {
    dotenv::dotenv().ok();
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")))
        .with_writer(std::io::stderr)
        .init();

    let args = Args::parse();
    match run_app(args).await {
        Ok(CloneOutcome::Cloned { .. }) => {
            println!("✅ Clone completed successfully.");
            ExitCode::SUCCESS
        }
        Ok(CloneOutcome::ParityMismatch { .. }) => {
            println!("Exiting program.");
            ExitCode::from(EXIT_PARITY_MISMATCH)
        }
        Err(e) => {
            eprintln!("❌ Error: {:?}", e);
            ExitCode::FAILURE
        }
    }
}

async fn run_app(args: Args) -> Result<CloneOutcome> {
    let prompts = TerminalPrompt;
    println!("type '{}' mission control user password", args.username);
    let password = prompts
        .secret("Password: ")
        .context("Failed to read the mission control password")?;

    let environment = args.remote_env.clone();
    let config = CloneConfig::from_env(Credentials {
        username: args.username,
        password,
        client_account: args.client_account,
        environment: args.remote_env,
    })
    .context("Failed to resolve configuration")?;

    let missing = workflow::missing_prerequisites(&config);
    if !missing.is_empty() {
        warn!(?missing, "prerequisite tools not found");
        println!("⚠️ Not found in PATH: {}. Later steps may fail.", missing.join(", "));
    }

    let build = CommandBuild::new(&config.build.tool, &config.project_dir);
    let database = MysqlClient::new(&config.database);
    let mut clone = CloneWorkflow::new(
        &config,
        Toolchain {
            build: &build,
            database: &database,
            prompts: &prompts,
        },
    )
    .context("Failed to set up the API client")?;

    let outcome = clone
        .run()
        .await
        .with_context(|| format!("Cloning environment '{}' failed", environment));
    debug!(stages = ?clone.stages(), "clone run finished");
    outcome
}
