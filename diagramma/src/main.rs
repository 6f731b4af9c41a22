//! Diagramma binary entry point.

use anyhow::Result;
use clap::Parser;

use diagramma::cli::{execute, Cli};

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    execute(cli).await
}
