//! Workflow application service
//!
//! Ties a [`WorkflowStore`] to a [`WorkflowEngine`]: graphs are validated
//! before they run, and every run is recorded in the store.

use std::sync::Arc;

use chrono::Utc;
use node_engine::{validate_workflow, ValidationSummary, Variables, WorkflowEngine, WorkflowGraph};
use serde::{Deserialize, Serialize};

use crate::error::{Result, ServiceError};
use crate::record::ExecutionRecord;
use crate::store::{WorkflowMetadata, WorkflowStore};

/// Parameters of a run
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RunWorkflowRequest {
    pub workflow_id: String,
    /// Opaque caller identity, recorded with the run
    #[serde(default)]
    pub caller_id: Option<String>,
    /// Continue an earlier run's context
    #[serde(default)]
    pub context_id: Option<String>,
    /// Global variables to set before the run
    #[serde(default)]
    pub variables: Variables,
    #[serde(default)]
    pub skip_validation: bool,
}

impl RunWorkflowRequest {
    pub fn new(workflow_id: impl Into<String>) -> Self {
        Self {
            workflow_id: workflow_id.into(),
            ..Self::default()
        }
    }
}

/// Validates, runs, and records workflows
pub struct WorkflowService {
    store: Arc<dyn WorkflowStore>,
    engine: WorkflowEngine,
}

impl WorkflowService {
    pub fn new(store: Arc<dyn WorkflowStore>, engine: WorkflowEngine) -> Self {
        Self { store, engine }
    }

    pub fn store(&self) -> &Arc<dyn WorkflowStore> {
        &self.store
    }

    pub fn engine(&self) -> &WorkflowEngine {
        &self.engine
    }

    /// Store `graph` and report its validation state; invalid drafts are kept
    pub async fn save_workflow(&self, graph: &WorkflowGraph) -> Result<ValidationSummary> {
        self.store.save_workflow(graph).await?;
        Ok(validate_workflow(graph).summary())
    }

    pub async fn list_workflows(&self) -> Result<Vec<WorkflowMetadata>> {
        self.store.list_workflows().await
    }

    /// Validate the stored workflow `workflow_id`
    pub async fn validate(&self, workflow_id: &str) -> Result<ValidationSummary> {
        let graph = self.store.load_workflow(workflow_id).await?;
        Ok(validate_workflow(&graph).summary())
    }

    /// Run a stored workflow and record the outcome.
    ///
    /// Node failures are part of the record, not an `Err`; errors are
    /// reserved for runs that never started.
    pub async fn run_workflow(&self, request: RunWorkflowRequest) -> Result<ExecutionRecord> {
        let graph = self.store.load_workflow(&request.workflow_id).await?;
        let record = self.run_graph(&graph, &request).await?;
        self.store.save_execution(&record).await?;
        Ok(record)
    }

    /// Run `graph` without storing it or its record
    pub async fn run_graph(&self, graph: &WorkflowGraph, request: &RunWorkflowRequest) -> Result<ExecutionRecord> {
        if !request.skip_validation {
            let report = validate_workflow(graph);
            for warning in &report.warnings {
                log::warn!("Workflow '{}': {}", graph.id, warning);
            }
            if !report.is_valid() {
                log::warn!("Refusing to run invalid workflow '{}'", graph.id);
                return Err(ServiceError::InvalidWorkflow(report.summary()));
            }
        }

        let context_id = self.seed_context(graph, request).await?;
        let started_at = Utc::now();
        let result = self.engine.execute(graph, context_id.as_deref()).await;

        log::info!(
            "Run {} of workflow '{}' finished: {:?}",
            result.execution_id,
            graph.id,
            result.status
        );
        Ok(ExecutionRecord::from_result(
            graph.id.clone(),
            request.caller_id.clone(),
            started_at,
            &result,
        ))
    }

    /// Resolve the context to run in and apply the request's variables
    async fn seed_context(&self, graph: &WorkflowGraph, request: &RunWorkflowRequest) -> Result<Option<String>> {
        let contexts = self.engine.contexts();
        let context_id = match &request.context_id {
            Some(id) => Some(id.clone()),
            None if !request.variables.is_empty() => Some(contexts.create(&graph.id).await),
            None => None,
        };

        if let Some(id) = &context_id {
            for (name, value) in &request.variables {
                contexts.set_global(id, name, value.clone()).await?;
            }
        }
        Ok(context_id)
    }

    /// Run history of `workflow_id`, oldest first
    pub async fn history(&self, workflow_id: &str) -> Result<Vec<ExecutionRecord>> {
        self.store.list_executions(workflow_id).await
    }

    /// Drop contexts idle past the store's timeout; returns how many went
    pub async fn purge_stale_contexts(&self) -> usize {
        let removed = self.engine.contexts().purge_stale().await;
        if removed > 0 {
            log::info!("Purged {} stale execution contexts", removed);
        }
        removed
    }
}
