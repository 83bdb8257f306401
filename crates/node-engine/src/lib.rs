//! Node Engine - Graph-based workflow execution for NodeGen
//!
//! This crate evaluates workflow graphs built in the NodeGen editor:
//! typed nodes connected port-to-port, run in dependency order with a
//! shared variable context. It supports:
//!
//! - Structural validation with cycle and reachability checks
//! - Dependency-ordered evaluation with per-run memoization
//! - `{{name}}` template substitution from context variables
//! - Contexts that persist across runs for chaining workflows
//! - Pluggable chat completion and repository capabilities
//!
//! # Architecture
//!
//! - `WorkflowEngine`: Orchestrates one run and produces an `ExecutionResult`
//! - `ContextStore`: Owns execution contexts between runs
//! - `nodes`: One evaluator per `NodeKind`
//! - `EventSink`: Generic event streaming (not tied to any host)
//!
//! # Example
//!
//! ```ignore
//! use node_engine::{Capabilities, NodeKind, WorkflowBuilder, WorkflowEngine};
//!
//! let graph = WorkflowBuilder::new("wf", "Hello")
//!     .add_node("text", NodeKind::TextInput, (0.0, 0.0))
//!     .with_data(serde_json::json!({"value": "Hello"}))
//!     .add_node("out", NodeKind::OutputSink, (200.0, 0.0))
//!     .connect("text", "out")
//!     .build();
//!
//! let engine = WorkflowEngine::new(Capabilities::unavailable());
//! let result = engine.execute(&graph, None).await;
//! assert_eq!(result.result, "Hello");
//! ```

pub mod builder;
pub mod capabilities;
pub mod coercion;
pub mod constants;
pub mod context;
pub mod context_store;
pub mod descriptor;
pub mod engine;
pub mod error;
pub mod events;
pub mod nodes;
pub mod resolver;
pub mod result;
pub mod types;
pub mod validation;

// Re-export key types
pub use builder::WorkflowBuilder;
pub use capabilities::{
    Capabilities, ChatCompletion, ChatMessage, ChatRole, RepositoryMode, RepositoryRequest, RepositorySource,
};
pub use context::{resolve_template, ExecutionContext, Variables};
pub use context_store::{ContextLease, ContextStore};
pub use descriptor::{all_descriptors, NodeDescriptor};
pub use engine::{EngineConfig, WorkflowEngine};
pub use error::{NodeEngineError, Result};
pub use events::{EventSink, LogEventSink, NullEventSink, VecEventSink, WorkflowEvent};
pub use result::{ExecutionFailure, ExecutionResult, ExecutionStep, RunStatus};
pub use types::{GraphEdge, GraphNode, NodeCategory, NodeId, NodeKind, Position, WorkflowGraph};
pub use validation::{validate_workflow, ValidationError, ValidationReport, ValidationSummary, ValidationWarning};
