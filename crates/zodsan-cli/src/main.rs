//! zodsan CLI entry point.
//!
//! Validate a file of LLM-generated Zod schemas:
//! ```bash
//! zodsan schemas.ts --config medium --json
//! ```

use anyhow::Result;
use clap::Parser;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize tracing (respects RUST_LOG env var)
    tracing_subscriber::registry()
        .with(fmt::layer().with_writer(std::io::stderr))
        .with(EnvFilter::from_default_env())
        .init();

    let cli = zodsan_cli::Cli::parse();
    let code = zodsan_cli::run(cli).await?;
    std::process::exit(code);
}
