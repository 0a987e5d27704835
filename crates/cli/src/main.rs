//! House Price Estimator CLI
//!
//! A command-line tool for estimating property prices, either in-process
//! from a pipeline artifact or against a running estimator server.

mod client;
mod commands;
mod output;

use anyhow::Result;
use clap::{Parser, Subcommand};
use commands::{estimate, schema};
use std::path::PathBuf;

/// House Price Estimator CLI
#[derive(Parser)]
#[command(name = "hpe")]
#[command(author, version, about = "CLI for the House Price Estimator", long_about = None)]
pub struct Cli {
    /// Estimator server URL (can also be set via HPE_API_URL env var)
    #[arg(long, env = "HPE_API_URL", default_value = "http://localhost:8080")]
    pub api_url: String,

    /// Output format
    #[arg(long, short, global = true, default_value = "table")]
    pub format: output::OutputFormat,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Estimate the price of one property
    Estimate {
        #[command(flatten)]
        property: estimate::PropertyArgs,

        /// Run the pipeline in-process from this artifact instead of calling the server
        #[arg(long, env = "HPE_ARTIFACT")]
        artifact: Option<PathBuf>,
    },

    /// Show the columns and vocabularies of a pipeline artifact
    Schema {
        /// Path of the pipeline manifest
        #[arg(long, env = "HPE_ARTIFACT")]
        artifact: PathBuf,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    match cli.command {
        Commands::Estimate { property, artifact } => match artifact {
            Some(path) => estimate::estimate_local(&path, &property, cli.format)?,
            None => {
                let client = client::ApiClient::new(&cli.api_url)?;
                estimate::estimate_remote(&client, &property, cli.format).await?;
            }
        },
        Commands::Schema { artifact } => {
            schema::show_schema(&artifact, cli.format)?;
        }
    }

    Ok(())
}
