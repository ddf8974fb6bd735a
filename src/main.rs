//! Star type comparison - Main Entry Point
//!
//! Runs comparisons from the command line or serves them over HTTP.

use clap::Parser;
use startype::cli::{cmd_compare, cmd_info, cmd_serve, Cli, Commands};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize logging
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "startype=info".into()),
        )
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Compare { data, output, cv_folds, threshold, sequential } => {
            // the comparison is CPU bound; keep it off the async workers
            tokio::task::spawn_blocking(move || {
                cmd_compare(&data, output.as_deref(), cv_folds, threshold, sequential)
            })
            .await??;
        }
        Commands::Info { data } => {
            cmd_info(&data)?;
        }
        Commands::Serve { port, host } => {
            cmd_serve(host, port).await?;
        }
    }

    Ok(())
}
