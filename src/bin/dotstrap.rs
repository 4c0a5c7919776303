// SPDX-FileCopyrightText: 2025 Jason Pena <jasonpena@awkless.com>
// SPDX-License-Identifier: MIT

use dotstrap::{
    config::InstallProfile,
    forecast::{self, WaybarPayload, DAYS_FORECAST},
    install::Installer,
    syscall::SystemExecutor,
};

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use std::{fs::read_to_string, path::PathBuf, process::exit};
use tracing::{error, warn};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

#[derive(Debug, Clone, Parser)]
#[command(
    about,
    override_usage = "\n  dotstrap [options]\n  dotstrap <dotstrap-command> [options]",
    subcommand_help_heading = "Commands",
    version
)]
struct Cli {
    #[command(subcommand)]
    pub command: Option<Command>,
}

impl Cli {
    async fn run(self) -> Result<()> {
        match self.command {
            Some(Command::Install(opts)) => run_install(opts),
            Some(Command::Forecast(opts)) => run_forecast(opts).await,
            None => run_install(InstallOptions::default()),
        }
    }
}

#[derive(Debug, Clone, Subcommand)]
enum Command {
    /// Detect the host, provision the automation stack, and run the playbook.
    #[command(override_usage = "dotstrap install [options]")]
    Install(InstallOptions),

    /// Print a waybar weather payload.
    #[command(override_usage = "dotstrap forecast [options]")]
    Forecast(ForecastOptions),
}

#[derive(Parser, Clone, Debug, Default)]
#[command(author, about, long_about)]
struct InstallOptions {
    /// Path to an install profile to load instead of the built-in defaults.
    #[arg(short, long, value_name = "path")]
    pub config: Option<PathBuf>,

    /// Path to the playbook handed to the playbook runner.
    #[arg(short, long, value_name = "path")]
    pub playbook: Option<PathBuf>,

    /// Path to the inventory file to provision.
    #[arg(short, long, value_name = "path")]
    pub inventory: Option<PathBuf>,

    /// Skip provisioning even on a recognized distribution.
    #[arg(short, long)]
    pub skip_provision: bool,
}

#[derive(Parser, Clone, Debug)]
#[command(author, about, long_about)]
struct ForecastOptions {
    /// Number of upcoming days in the outlook section.
    #[arg(short, long, value_name = "count", default_value_t = DAYS_FORECAST)]
    pub days: usize,
}

#[tokio::main]
async fn main() {
    let layer = fmt::layer().compact().with_target(false).without_time();
    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new("info"))
        .unwrap();
    tracing_subscriber::registry()
        .with(layer)
        .with(filter)
        .init();

    if let Err(error) = run().await {
        error!("{error:?}");
        exit(1);
    }

    exit(0)
}

async fn run() -> Result<()> {
    Cli::parse().run().await
}

fn run_install(opts: InstallOptions) -> Result<()> {
    let mut profile = match &opts.config {
        Some(path) => read_to_string(path)
            .with_context(|| format!("failed to read profile at {:?}", path.display()))?
            .parse::<InstallProfile>()?,
        None => InstallProfile::try_default()?,
    };

    if let Some(playbook) = opts.playbook {
        profile.settings.playbook = playbook;
    }
    if let Some(inventory) = opts.inventory {
        profile.settings.inventory = inventory;
    }

    let installer = Installer::new(profile, SystemExecutor);
    installer.run(opts.skip_provision)?;

    Ok(())
}

async fn run_forecast(opts: ForecastOptions) -> Result<()> {
    // INVARIANT: Waybar rerenders this output on a timer, so emit a
    // placeholder payload and exit zero on any failure.
    let payload = match forecast::report(opts.days).await {
        Ok(payload) => payload,
        Err(error) => {
            warn!("{error}");
            WaybarPayload::unavailable(format!("Failed to fetch weather: {error}"))
        }
    };
    println!("{}", payload.to_json()?);

    Ok(())
}
