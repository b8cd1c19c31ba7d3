//! workflow-check: validate and list workflow documents from the command line

use std::path::{Path, PathBuf};
use std::process::ExitCode;

use anyhow::Context;
use clap::{Parser, Subcommand};
use workflow_graph::constants::files;
use workflow_graph::{
    repair_document, EditorConfig, FileRepository, ValidationReport, WorkflowDocument,
    WorkflowGraphStore, WorkflowRepository,
};

#[derive(Parser)]
#[command(name = "workflow-check", about = "Validate workflow graph documents")]
struct Cli {
    /// Editor configuration file
    #[arg(long, global = true, default_value = files::CONFIG_FILE)]
    config: PathBuf,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Validate one or more workflow JSON files
    Validate {
        /// Workflow documents to check
        #[arg(required = true)]
        files: Vec<PathBuf>,

        /// Print one JSON report per file instead of text
        #[arg(long)]
        json: bool,
    },
    /// List the workflows stored in a directory
    List {
        /// Directory to list (defaults to the configured workflow directory)
        dir: Option<PathBuf>,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<ExitCode> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info"))
        .format_timestamp_millis()
        .init();

    let cli = Cli::parse();
    let config = EditorConfig::load(&cli.config)
        .await
        .with_context(|| format!("failed to load config from {}", cli.config.display()))?;

    match cli.command {
        Command::Validate { files, json } => validate_files(&files, json, &config).await,
        Command::List { dir } => {
            let dir = dir.unwrap_or_else(|| config.workflow_dir.clone());
            list_workflows(&dir).await?;
            Ok(ExitCode::SUCCESS)
        }
    }
}

async fn validate_files(
    paths: &[PathBuf],
    json: bool,
    config: &EditorConfig,
) -> anyhow::Result<ExitCode> {
    let mut all_valid = true;

    for path in paths {
        let report = validate_file(path, config).await?;
        all_valid &= report.valid;

        if json {
            let line = serde_json::json!({
                "file": path.display().to_string(),
                "valid": report.valid,
                "errors": report.errors,
            });
            println!("{}", line);
        } else if report.valid {
            println!("{}: ok", path.display());
        } else {
            println!("{}: {} error(s)", path.display(), report.errors.len());
            for error in &report.errors {
                println!("  - {}", error);
            }
        }
    }

    Ok(if all_valid {
        ExitCode::SUCCESS
    } else {
        ExitCode::FAILURE
    })
}

async fn validate_file(path: &Path, config: &EditorConfig) -> anyhow::Result<ValidationReport> {
    let content = tokio::fs::read_to_string(path)
        .await
        .with_context(|| format!("failed to read {}", path.display()))?;
    let doc: WorkflowDocument = serde_json::from_str(&content)
        .with_context(|| format!("{} is not a workflow document", path.display()))?;

    log::debug!(
        "Checking '{}' ({} nodes, {} connections)",
        doc.name,
        doc.nodes.len(),
        doc.connections.len()
    );
    Ok(check_document(doc, config))
}

/// Validate a document as stored, before the store repairs it
///
/// Anything the repair step drops counts as an error, so a corrupt file
/// never passes just because the loaded graph looks fine.
fn check_document(doc: WorkflowDocument, config: &EditorConfig) -> ValidationReport {
    let (doc, issues) = repair_document(doc);
    let store = WorkflowGraphStore::from_document(doc, config);
    ValidationReport::from_checks(&issues, &store.validation_errors())
}

async fn list_workflows(dir: &Path) -> anyhow::Result<()> {
    let repo = FileRepository::new(dir);
    let summaries = repo
        .list()
        .await
        .with_context(|| format!("failed to list {}", dir.display()))?;

    if summaries.is_empty() {
        log::info!("No workflows found in {}", dir.display());
        return Ok(());
    }

    for summary in summaries {
        println!(
            "{}\t{}\t{:?}\t{} nodes\t{} connections\t{}",
            summary.id,
            summary.name,
            summary.status,
            summary.node_count,
            summary.connection_count,
            summary.updated_at.as_deref().unwrap_or("-")
        );
    }
    Ok(())
}
