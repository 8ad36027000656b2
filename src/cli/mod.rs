//! CLI module for Verdant
//!
//! - `serve`: run the HTTP API
//! - `diagnose`: run one image through the pipeline and print the report
//! - `seed`: create the schema and insert reference data

use clap::{Parser, Subcommand};
use std::path::PathBuf;

pub mod diagnose;
pub mod seed;

/// Verdant plant disease diagnosis
#[derive(Parser, Debug)]
#[command(name = "verdant")]
#[command(about = "Plant disease diagnosis service")]
#[command(version)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Option<Commands>,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Start the HTTP server
    Serve,
    /// Diagnose one image and print every tier attempt as JSON
    Diagnose {
        /// Path to a leaf photo
        image: PathBuf,
        /// Translate the result into this language
        #[arg(short, long)]
        language: Option<String>,
    },
    /// Create the database schema and reference data
    Seed,
}

/// Run the CLI command
pub async fn run(cli: Cli) -> anyhow::Result<()> {
    match cli.command {
        Some(Commands::Serve) => crate::server::run().await,
        Some(Commands::Diagnose { image, language }) => {
            diagnose::run(&image, language.as_deref()).await
        }
        Some(Commands::Seed) => seed::run().await,
        None => {
            let mut cmd = <Cli as clap::CommandFactory>::command();
            cmd.print_help()?;
            println!();
            Ok(())
        }
    }
}
