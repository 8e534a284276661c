mod cli;
mod application;
mod domain;
mod data;
mod ml;
mod infra;

use anyhow::Result;
use cli::Cli;
use clap::Parser;

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive("agri_yield=info".parse()?),
        )
        .init();

    let cli = Cli::parse();
    if let Err(err) = cli.run() {
        if let Some(message) = cli::precondition_message(&err) {
            eprintln!("{message}");
            std::process::exit(2);
        }
        return Err(err);
    }
    Ok(())
}
