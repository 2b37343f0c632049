//! docbuild CLI — build every generator project in a repository.
//!
//! Finds project manifests, runs the documentation generator on each, and
//! writes an `index.json` describing the generated output.

mod commands;

use clap::Parser;
use color_eyre::eyre::Result;

use commands::Cli;

#[tokio::main]
async fn main() -> Result<()> {
    color_eyre::install()?;
    let cli = Cli::parse();
    commands::init_tracing(&cli);
    commands::run(cli).await
}
