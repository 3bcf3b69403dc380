//! Integration tests for agentgraph-cli

use agentgraph_checkpoint::{Checkpoint, Checkpointer, FileCheckpointer};
use agentgraph_cli::{run, Cli, Commands};
use clap::Parser;
use serde_json::json;
use std::fs;
use std::path::Path;
use std::process::Command;
use tempfile::TempDir;

const VALID_FLOW: &str = r#"name: review
description: Draft and review loop
entry: draft

nodes:
  draft:
    description: "Write a proposal"
  review:
    handler: human_review

edges:
  - from: draft
    to: review
  - from: review
    router: approved
    candidates: [draft, __end__]

config:
  max_steps: 12
"#;

const DANGLING_FLOW: &str = r#"name: broken
entry: a
nodes:
  a: {}
edges:
  - from: a
    to: nowhere
"#;

fn write(dir: &Path, name: &str, content: &str) -> std::path::PathBuf {
    let path = dir.join(name);
    fs::write(&path, content).unwrap();
    path
}

async fn run_to_string(command: Commands) -> anyhow::Result<String> {
    let mut out = Vec::new();
    run(command, &mut out).await?;
    Ok(String::from_utf8(out).unwrap())
}

#[tokio::test]
async fn test_validate_reports_shape() {
    let dir = TempDir::new().unwrap();
    let file = write(dir.path(), "review.yaml", VALID_FLOW);

    let report = run_to_string(Commands::Validate {
        file,
        mermaid: false,
    })
    .await
    .unwrap();

    assert!(report.contains("review is valid (2 nodes, 3 edges)"));
    assert!(report.contains("routers: approved"));
    assert!(report.contains("max_steps: 12"));
}

#[tokio::test]
async fn test_validate_mermaid() {
    let dir = TempDir::new().unwrap();
    let file = write(dir.path(), "review.yaml", VALID_FLOW);

    let report = run_to_string(Commands::Validate {
        file,
        mermaid: true,
    })
    .await
    .unwrap();
    assert!(report.contains("flowchart TD"));
    assert!(report.contains("-.->"));
}

#[tokio::test]
async fn test_validate_rejects_dangling_edge() {
    let dir = TempDir::new().unwrap();
    let file = write(dir.path(), "broken.yaml", DANGLING_FLOW);

    let err = run_to_string(Commands::Validate {
        file,
        mermaid: false,
    })
    .await
    .unwrap_err();
    assert!(format!("{:#}", err).contains("nowhere"));
}

#[tokio::test]
async fn test_threads_and_inspect() {
    let dir = TempDir::new().unwrap();
    let checkpointer = FileCheckpointer::new(dir.path());
    for thread in ["alpha", "user:42"] {
        checkpointer
            .save(Checkpoint::new(thread, "review", json!({"history": []})))
            .await
            .unwrap();
    }
    checkpointer
        .save(
            Checkpoint::new("waiting", "review", json!({"history": []}))
                .with_interrupt(json!({"q": "approve?"})),
        )
        .await
        .unwrap();

    let listed = run_to_string(Commands::Threads {
        dir: dir.path().to_path_buf(),
    })
    .await
    .unwrap();
    let threads: Vec<&str> = listed.lines().collect();
    assert_eq!(threads, vec!["alpha", "user:42", "waiting"]);

    let report = run_to_string(Commands::Inspect {
        dir: dir.path().to_path_buf(),
        thread: "waiting".to_string(),
    })
    .await
    .unwrap();
    let value: serde_json::Value = serde_json::from_str(&report).unwrap();
    assert_eq!(value["thread_id"], "waiting");
    assert_eq!(value["next_node"], "review");
    assert_eq!(value["interrupt"], json!({"q": "approve?"}));
}

#[tokio::test]
async fn test_inspect_missing_thread_fails() {
    let dir = TempDir::new().unwrap();
    let err = run_to_string(Commands::Inspect {
        dir: dir.path().to_path_buf(),
        thread: "ghost".to_string(),
    })
    .await
    .unwrap_err();
    assert!(err.to_string().contains("ghost"));

    let err = run_to_string(Commands::Threads {
        dir: dir.path().join("missing"),
    })
    .await
    .unwrap_err();
    assert!(err.to_string().contains("does not exist"));
}

#[test]
fn test_argument_parsing() {
    let cli = Cli::try_parse_from(["agentgraph", "-v", "inspect", "--dir", "/tmp/cp", "t1"]).unwrap();
    assert!(cli.verbose);
    match cli.command {
        Commands::Inspect { dir, thread } => {
            assert_eq!(dir, Path::new("/tmp/cp"));
            assert_eq!(thread, "t1");
        }
        other => panic!("unexpected command: {:?}", other),
    }

    assert!(Cli::try_parse_from(["agentgraph", "validate"]).is_err());
}

#[test]
fn test_binary_exit_status() {
    let dir = TempDir::new().unwrap();
    let good = write(dir.path(), "good.yaml", VALID_FLOW);
    let bad = write(dir.path(), "bad.yaml", DANGLING_FLOW);

    let status = Command::new(env!("CARGO_BIN_EXE_agentgraph"))
        .arg("validate")
        .arg(&good)
        .status()
        .unwrap();
    assert!(status.success());

    let output = Command::new(env!("CARGO_BIN_EXE_agentgraph"))
        .arg("validate")
        .arg(&bad)
        .output()
        .unwrap();
    assert!(!output.status.success());
    assert!(String::from_utf8_lossy(&output.stderr).contains("broken"));
}
