//! Host-agnostic workflow services for NodeGen
//!
//! Storage of workflow graphs and run history, and the validate-then-run
//! flow the editor and CLI share.

pub mod error;
pub mod flatten;
pub mod record;
pub mod service;
pub mod store;

pub use error::{Result, ServiceError};
pub use record::ExecutionRecord;
pub use service::{RunWorkflowRequest, WorkflowService};
pub use store::{FileWorkflowStore, InMemoryWorkflowStore, WorkflowMetadata, WorkflowStore};
