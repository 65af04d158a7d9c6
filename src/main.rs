//! # nzsf CLI Entry Point
//!
//! Inspects the recovery machine and dry-runs it against the simulated
//! mount.

use anyhow::Context;
use clap::{Parser, Subcommand};
use nzsf::config::RecoveryConfig;
use nzsf::core::{RecoveryHistory, StateName, Value};
use nzsf::recovery::{recovery_context, recovery_machine, states, Scenario, SimulatedMount};
use nzsf::StateMachine;
use serde::Serialize;
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use tracing_subscriber::EnvFilter;

/// Non-zero-speed fault recovery for telescope mounts.
#[derive(Parser, Debug)]
#[command(name = "nzsf", version, about)]
struct Cli {
    /// JSON configuration file.
    #[arg(long, global = true, env = "NZSF_CONFIG")]
    config: Option<PathBuf>,

    /// Emit logs as JSON lines.
    #[arg(long, global = true)]
    log_json: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Validate the recovery machine and print its transition tables.
    Check,
    /// Run the recovery against a simulated mount.
    Simulate(SimulateArgs),
}

#[derive(clap::Args, Debug)]
struct SimulateArgs {
    /// Starting condition of the simulated mount.
    #[arg(long, value_enum, default_value_t = Scenario::Nominal)]
    scenario: Scenario,

    /// Override the configured error timeout.
    #[arg(long)]
    error_timeout_secs: Option<f64>,

    /// Print the run history as JSON.
    #[arg(long)]
    report_json: bool,
}

#[derive(Serialize)]
struct Report<'a> {
    scenario: Scenario,
    terminal: &'a StateName,
    history: &'a RecoveryHistory,
    commands: Vec<(String, Value)>,
}

const EXIT_FAILURE: u8 = 1;
const EXIT_REC_ERROR: u8 = 2;

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();
    init_tracing(cli.log_json);

    match run(cli).await {
        Ok(code) => code,
        Err(error) => {
            tracing::error!("{error:#}");
            ExitCode::from(EXIT_FAILURE)
        }
    }
}

fn init_tracing(json: bool) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr);
    if json {
        builder.json().init();
    } else {
        builder.init();
    }
}

async fn run(cli: Cli) -> anyhow::Result<ExitCode> {
    let mut config = load_config(cli.config.as_deref())?;

    match cli.command {
        Commands::Check => {
            let machine: StateMachine<SimulatedMount> =
                recovery_machine(&config).context("recovery machine is invalid")?;
            print!("{machine}");
            Ok(ExitCode::SUCCESS)
        }
        Commands::Simulate(args) => {
            if let Some(secs) = args.error_timeout_secs {
                config.engine.error_timeout_secs = secs;
            }
            simulate(&config, args.scenario, args.report_json).await
        }
    }
}

fn load_config(path: Option<&Path>) -> anyhow::Result<RecoveryConfig> {
    match path {
        Some(path) => {
            tracing::debug!(path = %path.display(), "loading configuration");
            Ok(RecoveryConfig::from_path(path)?)
        }
        None => Ok(RecoveryConfig::default()),
    }
}

async fn simulate(
    config: &RecoveryConfig,
    scenario: Scenario,
    report_json: bool,
) -> anyhow::Result<ExitCode> {
    let mount = SimulatedMount::from_config(scenario, &config.simulation);
    let machine = recovery_machine(config).context("recovery machine is invalid")?;
    let mut ctx = recovery_context(mount.clone());

    tracing::info!(%scenario, "simulating recovery");
    let outcome = machine.run(&mut ctx).await;

    tracing::info!(
        terminal = %outcome.terminal,
        waited_secs = outcome.history.time_waited().as_secs_f64(),
        escalations = outcome.history.escalations().count(),
        "recovery finished"
    );
    println!("{}", outcome.terminal);
    if report_json {
        let report = Report {
            scenario,
            terminal: &outcome.terminal,
            history: &outcome.history,
            commands: mount.commands(),
        };
        println!("{}", serde_json::to_string_pretty(&report)?);
    }

    if outcome.ended_on(states::REC_ERROR) {
        Ok(ExitCode::from(EXIT_REC_ERROR))
    } else {
        Ok(ExitCode::SUCCESS)
    }
}
