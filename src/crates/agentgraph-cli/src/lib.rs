//! # agentgraph-cli
//!
//! Command implementations behind the `agentgraph` binary:
//!
//! ```text
//! agentgraph validate <flow.yaml> [--mermaid]   compile a flow definition's shape
//! agentgraph threads --dir <dir>                list threads in a checkpoint directory
//! agentgraph inspect --dir <dir> <thread>       print a thread's latest checkpoint
//! ```
//!
//! Commands write their report to the given writer, so they can be exercised without a
//! terminal.

use agentgraph_checkpoint::{Checkpointer, FileCheckpointer};
use agentgraph_core::FlowDefinition;
use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand};
use std::io::Write;
use std::path::{Path, PathBuf};

#[derive(Debug, Parser)]
#[command(name = "agentgraph")]
#[command(about = "agentgraph - inspect flows and checkpoints", long_about = None)]
#[command(version)]
pub struct Cli {
    /// Log at debug level unless RUST_LOG says otherwise
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Debug, Subcommand)]
pub enum Commands {
    /// Validate a YAML flow definition
    Validate {
        /// Path to YAML file
        file: PathBuf,

        /// Print the flow as a Mermaid diagram
        #[arg(long)]
        mermaid: bool,
    },

    /// List threads stored in a checkpoint directory
    Threads {
        /// Checkpoint directory
        #[arg(short, long, env = "AGENTGRAPH_CHECKPOINT_DIR")]
        dir: PathBuf,
    },

    /// Print the latest checkpoint of a thread as JSON
    Inspect {
        /// Checkpoint directory
        #[arg(short, long, env = "AGENTGRAPH_CHECKPOINT_DIR")]
        dir: PathBuf,

        /// Thread id
        thread: String,
    },
}

/// Run one command, writing its report to `out`
pub async fn run(command: Commands, out: &mut impl Write) -> Result<()> {
    match command {
        Commands::Validate { file, mermaid } => validate(&file, mermaid, out),
        Commands::Threads { dir } => threads(&dir, out).await,
        Commands::Inspect { dir, thread } => inspect(&dir, &thread, out).await,
    }
}

fn validate(file: &Path, mermaid: bool, out: &mut impl Write) -> Result<()> {
    let flow = FlowDefinition::from_file(file)
        .with_context(|| format!("failed to read flow definition {}", file.display()))?;
    let compiled = flow
        .check()
        .with_context(|| format!("flow '{}' is invalid", flow.name))?;

    tracing::debug!(flow = %flow.name, "Flow definition is valid");
    writeln!(
        out,
        "✓ {} is valid ({} nodes, {} edges)",
        flow.name,
        compiled.node_names().len(),
        flow.edges.len() + usize::from(flow.entry.is_some())
    )?;

    let routers = flow.router_names();
    if !routers.is_empty() {
        writeln!(out, "  routers: {}", routers.join(", "))?;
    }
    if let Some(config) = &flow.config {
        writeln!(out, "  max_steps: {}", config.max_steps)?;
    }
    if mermaid {
        writeln!(out)?;
        writeln!(out, "{}", compiled.to_mermaid())?;
    }
    Ok(())
}

fn open_dir(dir: &Path) -> Result<FileCheckpointer> {
    if !dir.is_dir() {
        bail!("checkpoint directory {} does not exist", dir.display());
    }
    Ok(FileCheckpointer::new(dir))
}

async fn threads(dir: &Path, out: &mut impl Write) -> Result<()> {
    let checkpointer = open_dir(dir)?;
    let threads = checkpointer.threads().await?;
    tracing::debug!(count = threads.len(), dir = %dir.display(), "Listed threads");
    for thread in threads {
        writeln!(out, "{}", thread)?;
    }
    Ok(())
}

async fn inspect(dir: &Path, thread: &str, out: &mut impl Write) -> Result<()> {
    let checkpointer = open_dir(dir)?;
    let Some(checkpoint) = checkpointer.try_load(thread).await? else {
        bail!("no checkpoint for thread '{}' in {}", thread, dir.display());
    };

    writeln!(out, "{}", serde_json::to_string_pretty(&checkpoint)?)?;
    Ok(())
}
