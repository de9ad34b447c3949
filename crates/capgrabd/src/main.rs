//! capgrabd — the capgrab daemon.
//!
//! Loads `capgrab.toml`, builds a signed OCI client and polls every
//! availability domain until one instance launches.
//!
//! # Usage
//!
//! ```text
//! capgrabd run --config capgrab.toml
//! capgrabd zones --config capgrab.toml
//! capgrabd check-config --config capgrab.toml
//! ```
//!
//! Exits 0 once the instance exists, 130 when interrupted, and 2 when
//! `--max-cycles` runs out.

use std::path::{Path, PathBuf};
use std::process::ExitCode;
use std::sync::Arc;

use anyhow::Context;
use clap::{Parser, Subcommand, ValueEnum};
use tokio::sync::watch;
use tracing::{error, info, warn};

use capgrab_core::CapgrabConfig;
use capgrab_oci::OciClient;
use capgrab_poller::{PacingState, PollOutcome, Poller, enumerate_zones};

const EXIT_GAVE_UP: u8 = 2;
const EXIT_INTERRUPTED: u8 = 130;

#[derive(Parser)]
#[command(name = "capgrabd", about = "Launch an OCI instance as soon as capacity frees up", version)]
struct Cli {
    /// Log output format.
    #[arg(long, value_enum, default_value_t = LogFormat::Text, global = true)]
    log_format: LogFormat,

    #[command(subcommand)]
    command: Command,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, ValueEnum)]
enum LogFormat {
    Text,
    Json,
}

#[derive(Subcommand)]
enum Command {
    /// Poll availability domains until the instance launches.
    Run {
        /// Path to the config file.
        #[arg(short, long, default_value = "capgrab.toml")]
        config: PathBuf,

        /// Give up after this many passes over all zones.
        /// Overrides `pacing.max_cycles`.
        #[arg(long, value_parser = clap::value_parser!(u32).range(1..))]
        max_cycles: Option<u32>,
    },
    /// List the availability domains of the configured compartment.
    Zones {
        #[arg(short, long, default_value = "capgrab.toml")]
        config: PathBuf,
    },
    /// Load the config and API key without calling OCI.
    CheckConfig {
        #[arg(short, long, default_value = "capgrab.toml")]
        config: PathBuf,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<ExitCode> {
    let cli = Cli::parse();
    init_tracing(cli.log_format);

    match cli.command {
        Command::Run { config, max_cycles } => run(&config, max_cycles).await,
        Command::Zones { config } => zones(&config).await,
        Command::CheckConfig { config } => check_config(&config),
    }
}

fn init_tracing(format: LogFormat) {
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info,capgrabd=debug"));

    match format {
        LogFormat::Text => tracing_subscriber::fmt().with_env_filter(filter).init(),
        LogFormat::Json => tracing_subscriber::fmt()
            .json()
            .with_env_filter(filter)
            .init(),
    }
}

fn load_config(path: &Path) -> anyhow::Result<CapgrabConfig> {
    CapgrabConfig::from_file(path).with_context(|| format!("loading {}", path.display()))
}

async fn run(config_path: &Path, max_cycles: Option<u32>) -> anyhow::Result<ExitCode> {
    let config = load_config(config_path)?;
    let request = config.provision_request()?;
    let client = OciClient::from_config(&config).context("building OCI client")?;
    let pacing = PacingState::from_config(&config.pacing);
    let max_cycles = max_cycles.or(config.pacing.max_cycles);

    info!(
        region = %config.oci.region,
        compartment = %request.compartment_id,
        shape = %request.shape,
        ocpus = request.ocpus,
        display_name = %request.display_name,
        "capgrabd starting"
    );

    // ── Shutdown signal ────────────────────────────────────────

    let (shutdown_tx, shutdown_rx) = watch::channel(false);
    tokio::spawn(async move {
        match tokio::signal::ctrl_c().await {
            Ok(()) => {
                info!("shutdown signal received");
                let _ = shutdown_tx.send(true);
            }
            Err(e) => error!(error = %e, "failed to install CTRL+C handler"),
        }
    });

    // ── Poll ───────────────────────────────────────────────────

    let mut poller = Poller::new(Arc::new(client), request, pacing, shutdown_rx)
        .with_max_cycles(max_cycles);

    match poller.run().await {
        PollOutcome::Launched(launch) => {
            println!("{}", launch.instance.id);
            Ok(ExitCode::SUCCESS)
        }
        PollOutcome::Cancelled => {
            warn!("stopped before an instance launched");
            Ok(ExitCode::from(EXIT_INTERRUPTED))
        }
        PollOutcome::GaveUp { cycles } => {
            warn!(cycles, "no capacity found within the cycle limit");
            Ok(ExitCode::from(EXIT_GAVE_UP))
        }
    }
}

async fn zones(config_path: &Path) -> anyhow::Result<ExitCode> {
    let config = load_config(config_path)?;
    let client = OciClient::from_config(&config).context("building OCI client")?;

    let zones = enumerate_zones(&client, config.compartment_id()).await?;
    for zone in &zones {
        println!("{}\t{}", zone.name, zone.id);
    }
    Ok(ExitCode::SUCCESS)
}

fn check_config(config_path: &Path) -> anyhow::Result<ExitCode> {
    let config = load_config(config_path)?;
    let request = config.provision_request()?;
    OciClient::from_config(&config).context("building OCI client")?;

    info!(
        compartment = %request.compartment_id,
        shape = %request.shape,
        identity = %config.identity_endpoint(),
        compute = %config.compute_endpoint(),
        "config ok"
    );
    Ok(ExitCode::SUCCESS)
}
