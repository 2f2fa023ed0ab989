use std::process::ExitCode;

use anyhow::Result;
use clap::Parser;

mod cli;
mod config;
mod flows;
mod ptb;
mod sui;

use cli::args::Cli;
use cli::context::init_tracing;
use config::load_config;

async fn run() -> Result<()> {
    let cli = Cli::parse();
    let config = load_config(cli.config.clone())?;
    init_tracing(&config.global.logging)?;
    cli::run(cli, config).await
}

#[tokio::main]
async fn main() -> ExitCode {
    match run().await {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            eprintln!("Error: {err:#}");
            ExitCode::FAILURE
        }
    }
}
