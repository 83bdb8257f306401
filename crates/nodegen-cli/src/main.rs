//! `nodegen` - validate and run NodeGen workflow graphs from the shell

mod config;

use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::Context;
use clap::{Parser, Subcommand};
use node_engine::{validate_workflow, LogEventSink, Variables, WorkflowEngine, WorkflowGraph};
use nodegen_providers::OpenRouterClient;
use nodegen_workflow_service::{
    FileWorkflowStore, InMemoryWorkflowStore, RunWorkflowRequest, WorkflowService, WorkflowStore,
};
use serde::Serialize;

use crate::config::CliConfig;

#[derive(Parser, Debug)]
#[command(name = "nodegen", version, about = "Run NodeGen workflow graphs")]
struct Cli {
    /// JSON config with provider and engine settings
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Check a graph and print the validation summary
    Validate {
        /// Workflow graph JSON file
        graph: PathBuf,
    },
    /// Validate and execute a graph, printing the execution record
    Run {
        /// Workflow graph JSON file
        graph: PathBuf,
        /// JSON object of global variables to set before the run
        #[arg(long)]
        context_vars: Option<PathBuf>,
        /// Run even when validation reports errors
        #[arg(long)]
        skip_validation: bool,
        /// Save the graph and the run record under this directory
        #[arg(long, env = "NODEGEN_STORE")]
        store: Option<PathBuf>,
    },
    /// Show the run history of a stored workflow
    History {
        workflow_id: String,
        #[arg(long, env = "NODEGEN_STORE")]
        store: PathBuf,
    },
    /// Check the OpenRouter API key and list the curated models
    Models,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info"))
        .format_timestamp_millis()
        .init();

    let cli = Cli::parse();
    let config = CliConfig::load(cli.config.as_deref()).await?;

    let ok = match cli.command {
        Commands::Validate { graph } => validate(&graph).await?,
        Commands::Run {
            graph,
            context_vars,
            skip_validation,
            store,
        } => run(&config, &graph, context_vars.as_deref(), skip_validation, store).await?,
        Commands::History { workflow_id, store } => {
            let records = FileWorkflowStore::new(store).list_executions(&workflow_id).await?;
            print_json(&records)?;
            true
        }
        Commands::Models => models(&config).await?,
    };

    if !ok {
        std::process::exit(1);
    }
    Ok(())
}

async fn read_graph(path: &Path) -> anyhow::Result<WorkflowGraph> {
    let contents = tokio::fs::read_to_string(path)
        .await
        .with_context(|| format!("Failed to read graph {}", path.display()))?;
    serde_json::from_str(&contents).with_context(|| format!("Failed to parse graph {}", path.display()))
}

async fn read_variables(path: &Path) -> anyhow::Result<Variables> {
    let contents = tokio::fs::read_to_string(path)
        .await
        .with_context(|| format!("Failed to read variables {}", path.display()))?;
    serde_json::from_str(&contents)
        .with_context(|| format!("Variables in {} must be a JSON object", path.display()))
}

fn print_json<T: Serialize>(value: &T) -> anyhow::Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

async fn validate(path: &Path) -> anyhow::Result<bool> {
    let summary = validate_workflow(&read_graph(path).await?).summary();
    print_json(&summary)?;
    Ok(summary.valid)
}

async fn run(
    config: &CliConfig,
    graph_path: &Path,
    context_vars: Option<&Path>,
    skip_validation: bool,
    store_dir: Option<PathBuf>,
) -> anyhow::Result<bool> {
    let graph = read_graph(graph_path).await?;
    let variables = match context_vars {
        Some(path) => read_variables(path).await?,
        None => Variables::default(),
    };

    let engine = WorkflowEngine::new(nodegen_providers::capabilities(&config.providers))
        .with_config(config.engine.clone())
        .with_event_sink(Arc::new(LogEventSink));
    let store: Arc<dyn WorkflowStore> = match store_dir {
        Some(dir) => Arc::new(FileWorkflowStore::new(dir)),
        None => Arc::new(InMemoryWorkflowStore::new()),
    };
    let service = WorkflowService::new(store, engine);

    let request = RunWorkflowRequest {
        variables,
        skip_validation,
        ..RunWorkflowRequest::new(graph.id.clone())
    };
    service.save_workflow(&graph).await?;
    let record = service.run_workflow(request).await?;

    print_json(&record)?;
    Ok(record.is_success())
}

async fn models(config: &CliConfig) -> anyhow::Result<bool> {
    #[derive(Serialize)]
    #[serde(rename_all = "camelCase")]
    struct ModelsReport {
        key: nodegen_providers::ApiKeyStatus,
        curated: Vec<CuratedModel>,
    }

    #[derive(Serialize)]
    struct CuratedModel {
        label: &'static str,
        id: &'static str,
    }

    let client = OpenRouterClient::new(config.providers.openrouter.clone());
    let key = client.validate_api_key().await;
    let valid = key.valid;
    let curated = nodegen_providers::openrouter::CURATED_MODELS
        .iter()
        .map(|&(label, id)| CuratedModel { label, id })
        .collect();

    print_json(&ModelsReport { key, curated })?;
    Ok(valid)
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;
    use serde_json::json;

    #[test]
    fn test_cli_definition() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_parse_run_flags() {
        let cli = Cli::try_parse_from([
            "nodegen",
            "run",
            "graph.json",
            "--context-vars",
            "vars.json",
            "--skip-validation",
            "--config",
            "cfg.json",
        ])
        .unwrap();

        assert_eq!(cli.config.as_deref(), Some(Path::new("cfg.json")));
        match cli.command {
            Commands::Run {
                graph,
                context_vars,
                skip_validation,
                ..
            } => {
                assert_eq!(graph, PathBuf::from("graph.json"));
                assert_eq!(context_vars, Some(PathBuf::from("vars.json")));
                assert!(skip_validation);
            }
            other => panic!("unexpected command: {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_validate_reads_editor_graph() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("graph.json");
        let graph = json!({
            "id": "wf",
            "name": "Editor export",
            "nodes": [
                {"id": "a", "type": "input-text", "position": {"x": 0, "y": 0}, "data": {"value": "hi"},
                 "inputs": [], "outputs": ["output"]},
                {"id": "b", "type": "llm-model", "position": {"x": 1, "y": 0}, "data": {},
                 "inputs": ["input"], "outputs": ["output"]},
                {"id": "c", "type": "output-display", "position": {"x": 2, "y": 0}, "data": {},
                 "inputs": ["input"], "outputs": []}
            ],
            "edges": [
                {"id": "e1", "source": "a", "sourceHandle": "output", "target": "b", "targetHandle": "input"},
                {"id": "e2", "source": "b", "sourceHandle": "output", "target": "c", "targetHandle": "input"}
            ]
        });
        std::fs::write(&path, graph.to_string()).unwrap();

        assert!(validate(&path).await.unwrap());
    }

    #[tokio::test]
    async fn test_variables_must_be_an_object() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("vars.json");
        std::fs::write(&path, "[1, 2]").unwrap();
        assert!(read_variables(&path).await.is_err());

        std::fs::write(&path, r#"{"topic": "rust"}"#).unwrap();
        assert_eq!(read_variables(&path).await.unwrap()["topic"], json!("rust"));
    }
}
