//! Command-line interface wiring for adr-causality.

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};

use crate::{config::Settings, inference::InferenceEngine, store::Store};

pub mod seed;
pub mod serve;

/// Top-level CLI definition.
#[derive(Debug, Parser)]
#[command(author, version, about = "ADR reporting API with model-backed causality assessment", long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    command: Commands,
}

impl Cli {
    /// Parse CLI arguments from the environment.
    pub fn parse() -> Self {
        <Self as Parser>::parse()
    }

    /// Dispatch the selected sub-command.
    pub async fn dispatch(self, settings: Settings) -> Result<()> {
        match self.command {
            Commands::Serve(args) => serve::run(args, settings).await,
            Commands::Seed(args) => seed::run(args, settings).await,
        }
    }
}

/// Supported sub-commands.
#[derive(Debug, Subcommand)]
pub enum Commands {
    /// Serve the JSON API.
    Serve(serve::Args),
    /// Import users and reports from CSV into an empty database.
    Seed(seed::Args),
}

/// Open the store and load every inference artifact; both are fatal on failure.
pub(crate) async fn bootstrap(settings: &Settings) -> Result<(Store, InferenceEngine)> {
    let store = Store::open(&settings.database_path)
        .with_context(|| format!("opening database {}", settings.database_path.display()))?;
    let source = settings
        .artifact_source()
        .context("configuring artifact source")?;
    let engine = InferenceEngine::load(&source, &settings.artifact_paths, &settings.ml_model_id)
        .await
        .context("loading inference artifacts")?;
    Ok((store, engine))
}
