//! revtrack agent
//!
//! Runs the client revision state machine for one package: resolves the
//! boot revision, reports to the authority on a schedule and applies updates.

use std::path::PathBuf;

use clap::Parser;
use color_eyre::Result;
use kameo::actor::Spawn;
use revtrack_core::{ClientActor, GetStatus, ResolveBoot, SendPhonehome, Start};
use tracing::{error, info, warn};
use tracing_subscriber::EnvFilter;

mod config;
mod factory;
mod transport;

use config::AgentConfig;

#[derive(Parser, Debug)]
#[command(name = "revtrack-agent")]
#[command(version, about = "Report the deployed revision and apply updates", long_about = None)]
struct Args {
    /// Path to the agent configuration file
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Send a single report, print the client status and exit
    #[arg(long)]
    once: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    color_eyre::install()?;
    let args = Args::parse();

    let config = AgentConfig::load_from(args.config.as_deref())?;

    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(&config.log_level))
        .unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt().with_env_filter(filter).init();

    let actor = ClientActor::spawn(factory::build_client_args(&config)?);

    if args.once {
        if let Err(e) = actor.ask(ResolveBoot).await {
            warn!(error = %e, "reporting without a revision");
        }
        match actor.ask(SendPhonehome).await {
            Ok(outcome) => info!(target_revision = ?outcome.target_revision, "phonehome complete"),
            Err(e) => error!(error = %e, "phonehome failed"),
        }
        let status = actor.ask(GetStatus).await?;
        println!("{}", serde_json::to_string_pretty(&status)?);
        actor.stop_gracefully().await?;
        return Ok(());
    }

    match actor.ask(Start).await {
        Ok(revision) => info!(revision = %revision, "agent started"),
        Err(e) => error!(error = %e, "agent started without a boot revision"),
    }

    tokio::signal::ctrl_c().await?;
    info!("shutting down");
    actor.stop_gracefully().await?;
    actor.wait_for_shutdown().await;

    Ok(())
}
