//! `contact-intake` entry point.
//!
//! Loads the config (file, then flags), starts the worker pool and serves
//! until the process is killed.

use anyhow::Context;
use clap::Parser;
use contact_intake_server::Cli;
use contact_intake_server::IntakeServer;

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    contact_intake_server::init_tracing();

    tracing::info!("contact-intake v{} starting", env!("CARGO_PKG_VERSION"));

    let config = cli.resolve().context("failed to load configuration")?;
    let intake = config.build_intake()?;
    tracing::info!("ledger at {}", intake.ledger().path().display());

    let server = IntakeServer::start(&config, intake)?;
    server.wait();

    tracing::info!("contact-intake exiting");
    Ok(())
}
