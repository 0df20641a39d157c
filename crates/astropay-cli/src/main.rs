//! # astropay CLI Entry Point
//!
//! Assembles subcommands and dispatches to handler modules.

use anyhow::Context;
use astropay_client::{AstroPayClient, AstroPayConfig};
use clap::Parser;

/// AstroPay CLI: Card and Direct payments from the command line.
///
/// Credentials come from the `ASTROPAY_*` environment variables. Requests go
/// to the sandbox unless `--production` is given.
#[derive(Parser, Debug)]
#[command(name = "astropay", version, about)]
struct Cli {
    /// Use the production hosts.
    #[arg(long, global = true)]
    production: bool,
    /// Accept any TLS certificate. Insecure.
    #[arg(long, global = true)]
    insecure: bool,
    /// Emit logs as JSON.
    #[arg(long, global = true)]
    json_logs: bool,
    #[command(subcommand)]
    command: Commands,
}

#[derive(clap::Subcommand, Debug)]
enum Commands {
    /// Compute or verify control codes offline.
    Control(astropay_cli::control::ControlArgs),
    /// AstroPay Card operations.
    Card(astropay_cli::card::CardArgs),
    /// AstroPay Direct operations.
    Direct(astropay_cli::direct::DirectArgs),
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let filter = tracing_subscriber::EnvFilter::from_default_env();
    if cli.json_logs {
        tracing_subscriber::fmt()
            .json()
            .with_env_filter(filter)
            .with_writer(std::io::stderr)
            .init();
    } else {
        tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_writer(std::io::stderr)
            .init();
    }

    let output = match &cli.command {
        Commands::Control(args) => astropay_cli::control::run_control(args)?,
        Commands::Card(args) => {
            let client = build_client(&cli)?;
            let resp = astropay_cli::card::run_card(args, &client)?;
            astropay_cli::output::render(&resp)?
        }
        Commands::Direct(args) => {
            let client = build_client(&cli)?;
            let resp = astropay_cli::direct::run_direct(args, &client)?;
            astropay_cli::output::render(&resp)?
        }
    };

    println!("{output}");
    Ok(())
}

fn build_client(cli: &Cli) -> anyhow::Result<AstroPayClient> {
    let config = AstroPayConfig::from_env()
        .context("reading ASTROPAY_* environment")?
        .configure(|c| {
            if cli.production {
                c.sandbox = false;
            }
            if cli.insecure {
                c.verify_tls = false;
            }
        });
    tracing::debug!(
        sandbox = config.sandbox,
        verify_tls = config.verify_tls,
        "AstroPay configuration loaded"
    );
    AstroPayClient::new(&config).context("building AstroPay client")
}
