pub mod args;
pub mod commands;
pub mod config;

use anyhow::Result;
use args::Args;
use clap::Parser;
use config::Configuration;
use ocifn_library::logging::start_tracing;
use ocifn_library::transaction::{gen_tid, TransactionId};
use std::process::ExitCode;
use tracing::error;

async fn run(cli: Args, tid: &TransactionId) -> Result<()> {
    let config = match Configuration::boxed(cli.config.as_deref(), cli.overrides()) {
        Ok(c) => c,
        Err(e) => anyhow::bail!("Failed to load configuration: {}", e),
    };
    let _drops = start_tracing(&config.logging, tid)?;
    if let Err(e) = commands::invoke(&cli, &config, &mut std::io::stdout().lock(), tid).await {
        error!(tid=tid, error=%e, "Invocation failed");
        return Err(e);
    }
    Ok(())
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Args::parse();
    let tid = gen_tid();
    match run(cli, &tid).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("{}", e);
            ExitCode::FAILURE
        },
    }
}
