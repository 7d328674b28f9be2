mod cli;
mod config;

use anyhow::Result;
use clap::Parser;
use cli::{Cli, Commands};
use config::CanonConfig;

fn main() -> Result<()> {
    // Logs go to stderr; stdout carries the deduplicated document.
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive(tracing::Level::INFO.into()),
        )
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Dedup(args) => {
            let config = CanonConfig::load_if_present(&cli.config)?;
            cli::dedup::run(args, config)
        }
        Commands::Config(cmd) => cli::config_cmd::run(cmd, &cli.config),
    }
}
