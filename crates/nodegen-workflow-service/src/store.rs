//! Workflow and run-history storage
//!
//! The service talks to storage only through [`WorkflowStore`]. Two
//! implementations are provided: an in-memory store for tests and
//! embedding, and a directory of JSON files.

use std::collections::HashMap;
use std::path::{Path, PathBuf};

use async_trait::async_trait;
use node_engine::WorkflowGraph;
use parking_lot::RwLock;
use serde::{Deserialize, Serialize};
use tokio::fs;

use crate::error::{Result, ServiceError};
use crate::flatten::flatten_graph;
use crate::record::ExecutionRecord;

/// Metadata for a stored workflow (for listing)
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WorkflowMetadata {
    pub id: String,
    pub name: String,
    pub node_count: usize,
    pub edge_count: usize,
}

impl From<&WorkflowGraph> for WorkflowMetadata {
    fn from(graph: &WorkflowGraph) -> Self {
        Self {
            id: graph.id.clone(),
            name: graph.name.clone(),
            node_count: graph.nodes.len(),
            edge_count: graph.edges.len(),
        }
    }
}

/// Persistence for workflows and their run history
#[async_trait]
pub trait WorkflowStore: Send + Sync {
    /// Stored graph for `id`, or `WorkflowNotFound`
    async fn load_workflow(&self, id: &str) -> Result<WorkflowGraph>;

    /// Insert or replace a graph; node data is flattened on the way in
    async fn save_workflow(&self, graph: &WorkflowGraph) -> Result<()>;

    /// All stored workflows, ordered by id
    async fn list_workflows(&self) -> Result<Vec<WorkflowMetadata>>;

    async fn save_execution(&self, record: &ExecutionRecord) -> Result<()>;

    /// Runs of `workflow_id`, oldest first
    async fn list_executions(&self, workflow_id: &str) -> Result<Vec<ExecutionRecord>>;
}

fn flattened(graph: &WorkflowGraph) -> WorkflowGraph {
    let mut stored = graph.clone();
    flatten_graph(&mut stored);
    stored
}

fn sort_runs(records: &mut [ExecutionRecord]) {
    records.sort_by(|a, b| a.started_at.cmp(&b.started_at).then_with(|| a.id.cmp(&b.id)));
}

/// Store that keeps everything in memory
#[derive(Default)]
pub struct InMemoryWorkflowStore {
    workflows: RwLock<HashMap<String, WorkflowGraph>>,
    executions: RwLock<Vec<ExecutionRecord>>,
}

impl InMemoryWorkflowStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl WorkflowStore for InMemoryWorkflowStore {
    async fn load_workflow(&self, id: &str) -> Result<WorkflowGraph> {
        self.workflows
            .read()
            .get(id)
            .cloned()
            .ok_or_else(|| ServiceError::WorkflowNotFound(id.to_string()))
    }

    async fn save_workflow(&self, graph: &WorkflowGraph) -> Result<()> {
        self.workflows.write().insert(graph.id.clone(), flattened(graph));
        Ok(())
    }

    async fn list_workflows(&self) -> Result<Vec<WorkflowMetadata>> {
        let mut listed: Vec<WorkflowMetadata> = self.workflows.read().values().map(WorkflowMetadata::from).collect();
        listed.sort_by(|a, b| a.id.cmp(&b.id));
        Ok(listed)
    }

    async fn save_execution(&self, record: &ExecutionRecord) -> Result<()> {
        self.executions.write().push(record.clone());
        Ok(())
    }

    async fn list_executions(&self, workflow_id: &str) -> Result<Vec<ExecutionRecord>> {
        let mut records: Vec<ExecutionRecord> = self
            .executions
            .read()
            .iter()
            .filter(|r| r.workflow_id == workflow_id)
            .cloned()
            .collect();
        sort_runs(&mut records);
        Ok(records)
    }
}

/// Store backed by a directory of JSON files
///
/// Layout: `<root>/workflows/<id>.json` and
/// `<root>/executions/<workflow-id>/<execution-id>.json`.
pub struct FileWorkflowStore {
    root: PathBuf,
}

impl FileWorkflowStore {
    /// Use `root` as the storage directory; it is created on first write
    pub fn new(root: impl AsRef<Path>) -> Self {
        Self {
            root: root.as_ref().to_path_buf(),
        }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    fn workflows_dir(&self) -> PathBuf {
        self.root.join("workflows")
    }

    fn executions_dir(&self, workflow_id: &str) -> PathBuf {
        self.root.join("executions").join(file_stem(workflow_id))
    }

    fn workflow_path(&self, id: &str) -> PathBuf {
        self.workflows_dir().join(format!("{}.json", file_stem(id)))
    }
}

/// Ids come from callers; keep them inside their directory.
///
/// ASCII alphanumerics and `-` pass through; every other byte becomes
/// `_XX` (upper-case hex), so distinct ids never share a file.
fn file_stem(id: &str) -> String {
    let mut stem = String::with_capacity(id.len());
    for byte in id.bytes() {
        if byte.is_ascii_alphanumeric() || byte == b'-' {
            stem.push(char::from(byte));
        } else {
            stem.push_str(&format!("_{:02X}", byte));
        }
    }
    stem
}

/// Parse every `*.json` file in `dir`, skipping unreadable ones
async fn read_json_dir<T: serde::de::DeserializeOwned>(dir: &Path) -> Result<Vec<T>> {
    let mut items = Vec::new();
    if !dir.exists() {
        return Ok(items);
    }

    let mut entries = fs::read_dir(dir).await?;
    while let Some(entry) = entries.next_entry().await? {
        let path = entry.path();
        if path.extension().map_or(true, |e| e != "json") {
            continue;
        }
        let content = fs::read_to_string(&path).await?;
        match serde_json::from_str::<T>(&content) {
            Ok(item) => items.push(item),
            Err(e) => log::warn!("Failed to parse {:?}: {}", path, e),
        }
    }
    Ok(items)
}

#[async_trait]
impl WorkflowStore for FileWorkflowStore {
    async fn load_workflow(&self, id: &str) -> Result<WorkflowGraph> {
        let path = self.workflow_path(id);
        if !path.exists() {
            return Err(ServiceError::WorkflowNotFound(id.to_string()));
        }
        let content = fs::read_to_string(&path).await?;
        Ok(serde_json::from_str(&content)?)
    }

    async fn save_workflow(&self, graph: &WorkflowGraph) -> Result<()> {
        fs::create_dir_all(self.workflows_dir()).await?;
        let path = self.workflow_path(&graph.id);
        let content = serde_json::to_string_pretty(&flattened(graph))?;
        fs::write(&path, content).await?;
        log::debug!("Saved workflow '{}' to {:?}", graph.id, path);
        Ok(())
    }

    async fn list_workflows(&self) -> Result<Vec<WorkflowMetadata>> {
        let graphs: Vec<WorkflowGraph> = read_json_dir(&self.workflows_dir()).await?;
        let mut listed: Vec<WorkflowMetadata> = graphs.iter().map(WorkflowMetadata::from).collect();
        listed.sort_by(|a, b| a.id.cmp(&b.id));
        Ok(listed)
    }

    async fn save_execution(&self, record: &ExecutionRecord) -> Result<()> {
        let dir = self.executions_dir(&record.workflow_id);
        fs::create_dir_all(&dir).await?;
        let path = dir.join(format!("{}.json", file_stem(&record.id)));
        fs::write(&path, serde_json::to_string_pretty(record)?).await?;
        log::debug!("Saved execution '{}' to {:?}", record.id, path);
        Ok(())
    }

    async fn list_executions(&self, workflow_id: &str) -> Result<Vec<ExecutionRecord>> {
        let mut records: Vec<ExecutionRecord> = read_json_dir(&self.executions_dir(workflow_id)).await?;
        sort_runs(&mut records);
        Ok(records)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, Utc};
    use node_engine::{NodeKind, RunStatus, WorkflowBuilder};
    use serde_json::{json, Value};

    fn graph(id: &str) -> WorkflowGraph {
        WorkflowBuilder::new(id, format!("Workflow {}", id))
            .add_node("t", NodeKind::Transform, (0.0, 0.0))
            .with_data(json!({"transformConfig": {"pattern": "\\d+"}, "tags": ["a"]}))
            .add_node("out", NodeKind::OutputSink, (0.0, 0.0))
            .connect("t", "out")
            .build()
    }

    fn record(id: &str, workflow_id: &str, minutes_ago: i64) -> ExecutionRecord {
        let started_at = Utc::now() - Duration::minutes(minutes_ago);
        ExecutionRecord {
            id: id.to_string(),
            workflow_id: workflow_id.to_string(),
            caller_id: Some("user-1".to_string()),
            status: RunStatus::Completed,
            steps: Vec::new(),
            result: Value::Null,
            error: None,
            context_id: "ctx_1".to_string(),
            started_at,
            completed_at: started_at,
        }
    }

    async fn exercise(store: &dyn WorkflowStore) {
        assert!(matches!(
            store.load_workflow("wf-a").await,
            Err(ServiceError::WorkflowNotFound(_))
        ));

        store.save_workflow(&graph("wf-b")).await.unwrap();
        store.save_workflow(&graph("wf-a")).await.unwrap();

        let loaded = store.load_workflow("wf-a").await.unwrap();
        let data = &loaded.find_node("t").unwrap().data;
        assert_eq!(data["transformConfig.pattern"], json!("\\d+"));
        assert_eq!(data["tags"], json!("[\"a\"]"));

        let listed = store.list_workflows().await.unwrap();
        let ids: Vec<&str> = listed.iter().map(|m| m.id.as_str()).collect();
        assert_eq!(ids, vec!["wf-a", "wf-b"]);
        assert_eq!(listed[0].node_count, 2);

        store.save_execution(&record("run-new", "wf-a", 1)).await.unwrap();
        store.save_execution(&record("run-old", "wf-a", 10)).await.unwrap();
        store.save_execution(&record("run-other", "wf-b", 5)).await.unwrap();

        let runs = store.list_executions("wf-a").await.unwrap();
        let ids: Vec<&str> = runs.iter().map(|r| r.id.as_str()).collect();
        assert_eq!(ids, vec!["run-old", "run-new"]);
        assert!(store.list_executions("wf-missing").await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_in_memory_store() {
        exercise(&InMemoryWorkflowStore::new()).await;
    }

    #[tokio::test]
    async fn test_file_store() {
        let dir = tempfile::tempdir().unwrap();
        let store = FileWorkflowStore::new(dir.path());
        exercise(&store).await;

        assert!(dir.path().join("workflows/wf-a.json").exists());
        assert!(dir.path().join("executions/wf-a/run-old.json").exists());
    }

    #[tokio::test]
    async fn test_file_store_skips_corrupt_files() {
        let dir = tempfile::tempdir().unwrap();
        let store = FileWorkflowStore::new(dir.path());
        store.save_workflow(&graph("wf-a")).await.unwrap();
        std::fs::write(dir.path().join("workflows/broken.json"), "{").unwrap();

        let listed = store.list_workflows().await.unwrap();
        assert_eq!(listed.len(), 1);
    }

    #[test]
    fn test_file_stem_keeps_ids_in_directory() {
        assert_eq!(file_stem("../etc/passwd"), "_2E_2E_2Fetc_2Fpasswd");
        assert_eq!(file_stem("wf-1"), "wf-1");
        assert_eq!(file_stem("é"), "_C3_A9");
    }

    #[tokio::test]
    async fn test_file_store_keeps_similar_ids_apart() {
        let dir = tempfile::tempdir().unwrap();
        let store = FileWorkflowStore::new(dir.path());
        store.save_workflow(&graph("a.b")).await.unwrap();
        store.save_workflow(&graph("a_b")).await.unwrap();

        assert_eq!(store.load_workflow("a.b").await.unwrap().id, "a.b");
        assert_eq!(store.load_workflow("a_b").await.unwrap().id, "a_b");
        let ids: Vec<String> = store.list_workflows().await.unwrap().into_iter().map(|m| m.id).collect();
        assert_eq!(ids, vec!["a.b".to_string(), "a_b".to_string()]);
    }
}
