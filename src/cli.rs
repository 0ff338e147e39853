///
/// This module implements the CLI interface for blueprint-planner: command parsing,
/// argument validation and writing the compiled plan.
///
/// All compilation logic lives in the [`blueprint-planner-core`] crate; this module is glue.
///
/// ## How To Use
/// - For command-line users: run the `blueprint-planner` binary with `--help`.
/// - For programmatic/integration use: call [`run`] with a constructed [`Cli`].
///
/// [`blueprint-planner-core`]: ../../blueprint-planner-core/
use crate::blueprint::make_pipeline_plan;
use crate::load_config::load_config;
use crate::resolve::{GitlabClient, OfflineResolver};
use anyhow::Result;
use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// CLI for blueprint-planner: compile blueprint scopes into pipeline plans.
#[derive(Parser)]
#[clap(
    name = "blueprint-planner",
    version,
    about = "Compile blueprint scopes into ordered plugin pipeline plans"
)]
pub struct Cli {
    #[clap(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Compile every scope of a blueprint file into one pipeline plan (JSON)
    Plan {
        /// Path to the YAML blueprint file
        #[clap(long)]
        config: PathBuf,
        /// Write the plan here instead of stdout
        #[clap(long)]
        output: Option<PathBuf>,
        /// Pretty-print the JSON plan
        #[clap(long)]
        pretty: bool,
        /// Never contact GitLab; every scope needs an inline repository
        #[clap(long)]
        offline: bool,
    },
}

/// Extracted async CLI logic entrypoint for integration tests and main()
pub async fn run(cli: Cli) -> Result<()> {
    // Emit a top-level 'trace_initialised' event at the very start
    tracing::info!("trace_initialised");

    match cli.command {
        Commands::Plan {
            config,
            output,
            pretty,
            offline,
        } => {
            let config = load_config(config)?;
            tracing::info!(command = "plan", offline, "Starting blueprint planning");

            let plan = if offline {
                make_pipeline_plan(&config, &OfflineResolver).await?
            } else {
                let client = GitlabClient::new(&config.connection)
                    .map_err(|e| anyhow::anyhow!("Failed to construct GitLab client: {e}"))?;
                make_pipeline_plan(&config, &client).await?
            };

            let json = if pretty {
                serde_json::to_string_pretty(&plan)?
            } else {
                serde_json::to_string(&plan)?
            };

            match output {
                Some(path) => {
                    std::fs::write(&path, json.as_bytes()).map_err(|e| {
                        tracing::error!(error = ?e, output = ?path, "Failed to write plan");
                        anyhow::anyhow!("Failed to write plan to {:?}: {}", path, e)
                    })?;
                    tracing::info!(command = "plan", output = ?path, stages = plan.len(), "Plan written");
                }
                None => {
                    println!("{json}");
                    tracing::info!(command = "plan", stages = plan.len(), "Plan printed");
                }
            }
            Ok(())
        }
    }
}
