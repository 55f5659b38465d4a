//! clusterlens - one-shot Kubernetes cluster health analyzer
//!
//! Gathers a snapshot of cluster facts, runs the recommendation rules,
//! and prints tables or writes JSON/CSV/metrics exports.

mod analyzer;
mod cli;
mod config;
mod export;
mod facts;
mod kube;
mod report;

use anyhow::Result;
use clap::{Parser, Subcommand};
use cli::commands::{DatasetArg, ExportArgs, ExportFormat};

/// One-shot Kubernetes cluster health analyzer
#[derive(Parser, Debug)]
#[command(name = "clusterlens")]
#[command(about = "Analyze cluster health and export the findings", long_about = None)]
#[command(version)]
struct Args {
    /// Enable debug logging
    #[arg(long, short = 'd', global = true)]
    debug: bool,

    #[command(subcommand)]
    command: Command,
}

/// Main commands
#[derive(Subcommand, Debug)]
enum Command {
    /// Gather facts and print the health report
    Analyze {
        /// Print only the recommendations table
        #[arg(long)]
        recommendations_only: bool,
    },
    /// Gather facts and write an export file
    Export {
        /// Output format
        #[arg(long, value_enum, default_value_t = ExportFormat::Json)]
        format: ExportFormat,
        /// Dataset for CSV exports
        #[arg(long, value_enum)]
        dataset: Option<DatasetArg>,
        /// Output directory (default from config, falling back to ./exports)
        #[arg(long)]
        output_dir: Option<String>,
        /// Output filename (extension appended when missing)
        #[arg(long)]
        file: Option<String>,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    cli::init_logging(args.debug);

    let config = config::load().unwrap_or_else(|e| {
        tracing::warn!("Falling back to default configuration: {:#}", e);
        config::Config::default()
    });

    tracing::debug!("Initializing Kubernetes client");
    let client = kube::create_client().await?;
    let context = kube::get_context().await?;
    tracing::debug!("Connected to Kubernetes context: {}", context);

    match args.command {
        Command::Analyze {
            recommendations_only,
        } => cli::run_analyze(client, &config, recommendations_only).await,
        Command::Export {
            format,
            dataset,
            output_dir,
            file,
        } => {
            cli::run_export(
                client,
                &config,
                ExportArgs {
                    format,
                    dataset,
                    output_dir,
                    file,
                },
            )
            .await
        }
    }
}
