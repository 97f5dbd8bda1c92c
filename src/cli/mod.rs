//! Top-level CLI parsing and command execution.

use std::net::{IpAddr, SocketAddr};

use clap::{Parser, Subcommand};

use crate::config::Config;
use crate::entities::patient::PatientInput;
use crate::pipeline::Orchestrator;

pub mod health;

#[derive(Parser, Debug)]
#[command(
    name = "trialmatch",
    about = "Match a patient to ClinicalTrials.gov studies and explain their eligibility",
    version,
    after_help = "Set OPENAI_API_KEY to enable AI reasoning; without it a fixed explanation is returned."
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Output as JSON instead of Markdown
    #[arg(short, long, global = true)]
    pub json: bool,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Run the eligibility HTTP server
    Serve {
        /// Host address to bind
        #[arg(long, default_value = "127.0.0.1")]
        host: IpAddr,
        /// Port to listen on
        #[arg(long, default_value = "3000")]
        port: u16,
    },
    /// Run the eligibility pipeline once for a patient
    #[command(after_help = "\
EXAMPLES:
  trialmatch check --age 30 --condition asthma
  trialmatch check --age 52 --condition \"type 2 diabetes\" --json")]
    Check {
        /// Patient age in years
        #[arg(long, value_parser = clap::value_parser!(u32).range(1..))]
        age: u32,
        /// Condition to search trials for
        #[arg(short, long)]
        condition: String,
    },
    /// Check external API connectivity
    Health,
    /// Print version and build information
    Version,
}

impl Commands {
    pub fn serve_addr(&self) -> Option<SocketAddr> {
        match self {
            Self::Serve { host, port } => Some(SocketAddr::new(*host, *port)),
            _ => None,
        }
    }
}

fn version_output() -> String {
    let cargo_version = env!("CARGO_PKG_VERSION");
    let git_tag = option_env!("TRIALMATCH_BUILD_GIT_TAG");
    let git = option_env!("TRIALMATCH_BUILD_GIT_SHA").unwrap_or("unknown");
    let build = option_env!("TRIALMATCH_BUILD_DATE").unwrap_or("unknown");
    let version = git_tag
        .filter(|t| t.starts_with('v') && !t.contains('-'))
        .map(|t| &t[1..])
        .unwrap_or(cargo_version);
    format!("trialmatch {version} (git {git}, build {build})")
}

/// Executes one parsed CLI command and returns rendered output.
///
/// `serve` is handled by the binary and never reaches this function.
///
/// # Errors
///
/// Returns an error if a client cannot be built, rendering fails, or (for
/// `health`) any checked API is unhealthy.
pub async fn run(cli: Cli, config: &Config) -> anyhow::Result<String> {
    match cli.command {
        Commands::Check { age, condition } => {
            let orchestrator = Orchestrator::from_config(config)?;
            let patient = PatientInput::new(age, condition);
            let result = orchestrator.run(&patient).await;
            if cli.json {
                Ok(crate::render::json::to_pretty(&result)?)
            } else {
                Ok(crate::render::markdown::eligibility_markdown(
                    &patient, &result,
                )?)
            }
        }
        Commands::Health => {
            let report = health::check(config).await?;
            let output = if cli.json {
                crate::render::json::to_pretty(&report)?
            } else {
                report.to_markdown()
            };
            if report.all_healthy() {
                Ok(output)
            } else {
                anyhow::bail!("{output}")
            }
        }
        Commands::Version => Ok(version_output()),
        Commands::Serve { .. } => {
            anyhow::bail!("serve should not go through CLI run()")
        }
    }
}
