//! Workflow orchestrator
//!
//! Walks the graph from its entry nodes (nodes with no declared inputs)
//! downstream, evaluating each reachable node at most once. Before a node
//! runs, every node feeding it runs first, so for any edge A → B the trace
//! lists A before B. Evaluation uses an explicit work stack rather than
//! recursion.
//!
//! A node failure stops the run. The result still carries every step
//! recorded so far, including the failed one.

use std::collections::{HashMap, HashSet};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};

use chrono::Utc;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::capabilities::Capabilities;
use crate::constants::timeouts;
use crate::context::{resolve_template, ExecutionContext};
use crate::context_store::ContextStore;
use crate::error::NodeEngineError;
use crate::events::{EventSink, NullEventSink, WorkflowEvent};
use crate::nodes::{self, NodeRuntime, PortValues};
use crate::resolver::DependencyIndex;
use crate::result::{ExecutionResult, ExecutionStep};
use crate::types::{GraphNode, WorkflowGraph};

/// Engine settings
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EngineConfig {
    /// Seconds allowed for each external capability call; `None` waits indefinitely
    #[serde(default = "default_capability_timeout_secs")]
    pub capability_timeout_secs: Option<u64>,
}

fn default_capability_timeout_secs() -> Option<u64> {
    Some(timeouts::CAPABILITY_SECS)
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            capability_timeout_secs: default_capability_timeout_secs(),
        }
    }
}

impl EngineConfig {
    pub fn capability_timeout(&self) -> Option<Duration> {
        self.capability_timeout_secs.map(Duration::from_secs)
    }

    /// Apply `NODEGEN_CAPABILITY_TIMEOUT_SECS` (`0` disables the bound)
    pub fn with_env_overrides(mut self) -> Self {
        if let Some(secs) = std::env::var("NODEGEN_CAPABILITY_TIMEOUT_SECS")
            .ok()
            .and_then(|v| v.trim().parse::<u64>().ok())
        {
            self.capability_timeout_secs = (secs > 0).then_some(secs);
        }
        self
    }
}

/// Executes workflow graphs against a capability set
pub struct WorkflowEngine {
    capabilities: Capabilities,
    contexts: Arc<ContextStore>,
    event_sink: Arc<dyn EventSink>,
    config: EngineConfig,
}

impl WorkflowEngine {
    /// Create an engine with its own context store and no event sink
    pub fn new(capabilities: Capabilities) -> Self {
        Self {
            capabilities,
            contexts: Arc::new(ContextStore::new()),
            event_sink: Arc::new(NullEventSink),
            config: EngineConfig::default(),
        }
    }

    /// Share a context store with other engines or the host
    pub fn with_context_store(mut self, contexts: Arc<ContextStore>) -> Self {
        self.contexts = contexts;
        self
    }

    pub fn with_event_sink(mut self, event_sink: Arc<dyn EventSink>) -> Self {
        self.event_sink = event_sink;
        self
    }

    pub fn with_config(mut self, config: EngineConfig) -> Self {
        self.config = config;
        self
    }

    /// Store holding contexts for chained runs
    pub fn contexts(&self) -> &Arc<ContextStore> {
        &self.contexts
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    /// Run `graph` in a stored context.
    ///
    /// With `context_id` the run continues that context (and fails if it is
    /// unknown or in use); without it a fresh context is created and kept
    /// in the store under the returned `context_id`.
    pub async fn execute(&self, graph: &WorkflowGraph, context_id: Option<&str>) -> ExecutionResult {
        self.execute_with_abort(graph, context_id, &AtomicBool::new(false))
            .await
    }

    /// [`execute`](Self::execute) with an abort signal checked before each node
    pub async fn execute_with_abort(
        &self,
        graph: &WorkflowGraph,
        context_id: Option<&str>,
        abort: &AtomicBool,
    ) -> ExecutionResult {
        let context_id = match context_id {
            Some(id) => id.to_string(),
            None => self.contexts.create(&graph.id).await,
        };

        match self.contexts.lease(&context_id).await {
            Ok(mut context) => self.execute_in(graph, &mut context, abort).await,
            Err(e) => {
                log::warn!("Run of workflow '{}' rejected: {}", graph.id, e);
                ExecutionResult::failed(new_execution_id(), context_id, None, &e, Vec::new())
            }
        }
    }

    /// Run `graph` against a caller-owned context
    pub async fn execute_in(
        &self,
        graph: &WorkflowGraph,
        context: &mut ExecutionContext,
        abort: &AtomicBool,
    ) -> ExecutionResult {
        let execution_id = new_execution_id();
        let started = Instant::now();
        log::info!(
            "Executing workflow '{}' ({} nodes, {} edges) as {}",
            graph.id,
            graph.nodes.len(),
            graph.edges.len(),
            execution_id
        );
        self.emit(WorkflowEvent::RunStarted {
            workflow_id: graph.id.clone(),
            execution_id: execution_id.clone(),
            context_id: context.id().to_string(),
        });

        let mut run = Run {
            engine: self,
            index: DependencyIndex::build(graph),
            results: HashMap::new(),
            steps: Vec::new(),
            execution_id: execution_id.clone(),
        };
        let outcome = run.traverse(graph, context, abort).await;
        let context_id = context.id().to_string();

        match outcome {
            Ok(()) => {
                let result = graph
                    .designated_output()
                    .and_then(|node| run.results.get(node.id.as_str()))
                    .cloned()
                    .unwrap_or(Value::Null);
                let duration_ms = started.elapsed().as_millis() as u64;
                log::info!(
                    "Workflow '{}' completed: {} steps in {}ms",
                    graph.id,
                    run.steps.len(),
                    duration_ms
                );
                self.emit(WorkflowEvent::RunCompleted {
                    workflow_id: graph.id.clone(),
                    execution_id: execution_id.clone(),
                    duration_ms,
                });
                ExecutionResult::completed(execution_id, context_id, result, run.steps)
            }
            Err(Stop::Cancelled) => {
                log::info!("Workflow '{}' cancelled after {} steps", graph.id, run.steps.len());
                self.emit(WorkflowEvent::RunCancelled {
                    workflow_id: graph.id.clone(),
                    execution_id: execution_id.clone(),
                });
                ExecutionResult::cancelled(execution_id, context_id, run.steps)
            }
            Err(Stop::Failed { node_id, error }) => {
                log::warn!("Workflow '{}' failed at node '{}': {}", graph.id, node_id, error);
                self.emit(WorkflowEvent::RunFailed {
                    workflow_id: graph.id.clone(),
                    execution_id: execution_id.clone(),
                    error: error.to_string(),
                });
                ExecutionResult::failed(execution_id, context_id, Some(node_id), &error, run.steps)
            }
        }
    }

    fn emit(&self, event: WorkflowEvent) {
        if let Err(e) = self.event_sink.send(event) {
            log::warn!("Dropped workflow event: {}", e);
        }
    }
}

fn new_execution_id() -> String {
    format!("run-{}", uuid::Uuid::new_v4())
}

/// Why traversal stopped early
enum Stop {
    Cancelled,
    Failed {
        node_id: String,
        error: NodeEngineError,
    },
}

/// State of one run over a borrowed graph
struct Run<'g, 'e> {
    engine: &'e WorkflowEngine,
    index: DependencyIndex<'g>,
    results: HashMap<&'g str, Value>,
    steps: Vec<ExecutionStep>,
    execution_id: String,
}

impl<'g> Run<'g, '_> {
    /// Evaluate every entry node, then everything downstream of it
    async fn traverse(
        &mut self,
        graph: &'g WorkflowGraph,
        context: &mut ExecutionContext,
        abort: &AtomicBool,
    ) -> Result<(), Stop> {
        let mut visited: HashSet<&'g str> = HashSet::new();

        for entry in graph.entry_nodes() {
            let mut walk = vec![entry];
            while let Some(node) = walk.pop() {
                if !visited.insert(node.id.as_str()) {
                    continue;
                }
                self.evaluate(node, context, abort).await?;

                let downstream: Vec<&'g GraphNode> = self.index.downstream(&node.id).collect();
                walk.extend(
                    downstream
                        .into_iter()
                        .rev()
                        .filter(|next| !visited.contains(next.id.as_str())),
                );
            }
        }
        Ok(())
    }

    /// Evaluate `root` after all of its upstream nodes; cached nodes are skipped
    async fn evaluate(
        &mut self,
        root: &'g GraphNode,
        context: &mut ExecutionContext,
        abort: &AtomicBool,
    ) -> Result<(), Stop> {
        // (node, dependencies already scheduled)
        let mut stack: Vec<(&'g GraphNode, bool)> = vec![(root, false)];
        // Nodes whose dependencies are being evaluated: the current path
        let mut pending: HashSet<&'g str> = HashSet::new();

        while let Some((node, ready)) = stack.pop() {
            let id = node.id.as_str();
            if self.results.contains_key(id) {
                continue;
            }
            if ready {
                pending.remove(id);
                self.run_node(node, context, abort).await?;
                continue;
            }
            if !pending.insert(id) {
                return Err(cycle_at(id));
            }

            stack.push((node, true));
            let upstream: Vec<&'g GraphNode> = self.index.upstream(id).collect();
            for source in upstream.into_iter().rev() {
                if self.results.contains_key(source.id.as_str()) {
                    continue;
                }
                if pending.contains(source.id.as_str()) {
                    return Err(cycle_at(&source.id));
                }
                stack.push((source, false));
            }
        }
        Ok(())
    }

    /// Gather inputs, resolve templates, dispatch, and record the step
    async fn run_node(
        &mut self,
        node: &'g GraphNode,
        context: &mut ExecutionContext,
        abort: &AtomicBool,
    ) -> Result<(), Stop> {
        if abort.load(Ordering::Relaxed) {
            return Err(Stop::Cancelled);
        }

        let mut inputs = PortValues::new();
        for edge in self.index.in_edges(&node.id) {
            if let Some(value) = self.results.get(edge.source.as_str()) {
                inputs.insert(edge.target_handle.clone(), value.clone());
            }
        }
        let variables = context.available_variables(Some(node.id.as_str()));
        for value in inputs.values_mut() {
            if let Value::String(text) = value {
                *text = resolve_template(text, &variables);
            }
        }

        let engine = self.engine;
        engine.emit(WorkflowEvent::NodeStarted {
            node_id: node.id.clone(),
            execution_id: self.execution_id.clone(),
        });
        log::debug!("Evaluating node '{}' ({})", node.id, node.kind);

        let runtime = NodeRuntime {
            capabilities: &engine.capabilities,
            capability_timeout: engine.config.capability_timeout(),
        };
        let started_at = Utc::now();
        let clock = Instant::now();
        let outcome = nodes::evaluate(node, &inputs, context, &runtime).await;
        let duration_ms = clock.elapsed().as_millis() as u64;

        let mut step = ExecutionStep {
            node_id: node.id.clone(),
            node_type: node.kind,
            input: inputs.to_json(),
            output: Value::Null,
            started_at,
            duration_ms,
        };

        match outcome {
            Ok(output) => {
                step.output = output.clone();
                self.steps.push(step);
                engine.emit(WorkflowEvent::NodeCompleted {
                    node_id: node.id.clone(),
                    execution_id: self.execution_id.clone(),
                    output: output.clone(),
                    duration_ms,
                });
                self.results.insert(node.id.as_str(), output);
                Ok(())
            }
            Err(error) => {
                self.steps.push(step);
                engine.emit(WorkflowEvent::NodeFailed {
                    node_id: node.id.clone(),
                    execution_id: self.execution_id.clone(),
                    error: error.to_string(),
                });
                Err(Stop::Failed {
                    node_id: node.id.clone(),
                    error,
                })
            }
        }
    }
}

fn cycle_at(node_id: &str) -> Stop {
    Stop::Failed {
        node_id: node_id.to_string(),
        error: NodeEngineError::CycleDetected(node_id.to_string()),
    }
}
