use clap::Parser;
use tracing_subscriber::EnvFilter;

use trialmatch::cli::{self, Cli};
use trialmatch::config::Config;
use trialmatch::pipeline::Orchestrator;

fn init_tracing(default_level: &str) {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    let config = Config::from_env();

    if let Some(addr) = cli.command.serve_addr() {
        init_tracing("info");
        let orchestrator = Orchestrator::from_config(&config)?;
        return trialmatch::server::serve(addr, orchestrator).await;
    }

    init_tracing("warn");
    match cli::run(cli, &config).await {
        Ok(output) => {
            println!("{output}");
            Ok(())
        }
        Err(err) => {
            eprintln!("{err}");
            std::process::exit(1);
        }
    }
}
