//! postpress CLI: publish a markdown blog corpus to a WordPress site.
//!
//! Reads a JSON post index and one markdown file per post, then creates or
//! updates each post over the WordPress REST API, keyed by slug.

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
