//! Handle-keyed registry of live execution contexts
//!
//! Chained runs share variables by passing the same context handle. The
//! store hands out one exclusive lease per handle at a time, and drops
//! contexts nobody has touched for longer than its stale timeout.

use std::collections::HashMap;
use std::ops::{Deref, DerefMut};
use std::sync::Arc;
use std::time::{Duration, Instant};

use serde_json::Value;
use tokio::sync::{Mutex, OwnedMutexGuard, RwLock};

use crate::context::{ExecutionContext, Variables};
use crate::error::{NodeEngineError, Result};

/// Default idle time after which a context is considered stale
pub const DEFAULT_STALE_TIMEOUT: Duration = Duration::from_secs(30 * 60);

struct ContextEntry {
    context: Arc<Mutex<ExecutionContext>>,
    created_at: Instant,
    last_accessed: Instant,
}

impl ContextEntry {
    fn new(context: ExecutionContext) -> Self {
        let now = Instant::now();
        Self {
            context: Arc::new(Mutex::new(context)),
            created_at: now,
            last_accessed: now,
        }
    }

    fn touch(&mut self) {
        self.last_accessed = Instant::now();
    }

    fn is_stale(&self, timeout: Duration) -> bool {
        self.last_accessed.elapsed() > timeout
    }
}

/// Exclusive access to a stored context for the duration of a run
///
/// Dropping the lease releases the handle for the next run.
pub struct ContextLease {
    guard: OwnedMutexGuard<ExecutionContext>,
}

impl Deref for ContextLease {
    type Target = ExecutionContext;

    fn deref(&self) -> &Self::Target {
        &self.guard
    }
}

impl DerefMut for ContextLease {
    fn deref_mut(&mut self) -> &mut Self::Target {
        &mut self.guard
    }
}

/// Registry of execution contexts keyed by handle
pub struct ContextStore {
    contexts: RwLock<HashMap<String, ContextEntry>>,
    stale_timeout: Duration,
}

impl ContextStore {
    /// Create a store with the default stale timeout
    pub fn new() -> Self {
        Self::with_timeout(DEFAULT_STALE_TIMEOUT)
    }

    /// Create a store with a custom stale timeout
    pub fn with_timeout(stale_timeout: Duration) -> Self {
        Self {
            contexts: RwLock::new(HashMap::new()),
            stale_timeout,
        }
    }

    /// Create an empty context and return its handle
    pub async fn create(&self, workflow_id: &str) -> String {
        self.insert(ExecutionContext::new(workflow_id)).await
    }

    /// Register an existing context (e.g. one restored by the caller)
    pub async fn insert(&self, context: ExecutionContext) -> String {
        let id = context.id().to_string();
        self.contexts
            .write()
            .await
            .insert(id.clone(), ContextEntry::new(context));
        log::debug!("Registered execution context {}", id);
        id
    }

    /// Lease a context exclusively.
    ///
    /// Fails with `ContextBusy` while another lease on the same handle is alive.
    pub async fn lease(&self, id: &str) -> Result<ContextLease> {
        let context = {
            let mut contexts = self.contexts.write().await;
            let entry = contexts
                .get_mut(id)
                .ok_or_else(|| NodeEngineError::ContextNotFound(id.to_string()))?;
            entry.touch();
            Arc::clone(&entry.context)
        };

        let guard = context
            .try_lock_owned()
            .map_err(|_| NodeEngineError::ContextBusy(id.to_string()))?;
        Ok(ContextLease { guard })
    }

    /// Run a short closure against a context without holding a lease
    pub async fn with_context<F, R>(&self, id: &str, f: F) -> Result<R>
    where
        F: FnOnce(&mut ExecutionContext) -> R,
    {
        let mut lease = self.lease(id).await?;
        Ok(f(&mut lease))
    }

    pub async fn set_global(&self, id: &str, name: &str, value: Value) -> Result<()> {
        self.with_context(id, |ctx| ctx.set_global(name, value)).await
    }

    pub async fn get_global(&self, id: &str, name: &str) -> Result<Option<Value>> {
        self.with_context(id, |ctx| ctx.get_global(name).cloned()).await
    }

    pub async fn set_node_local(&self, id: &str, node_id: &str, name: &str, value: Value) -> Result<()> {
        self.with_context(id, |ctx| ctx.set_node_local(node_id, name, value))
            .await
    }

    pub async fn get_node_local(&self, id: &str, node_id: &str, name: &str) -> Result<Option<Value>> {
        self.with_context(id, |ctx| ctx.get_node_local(node_id, name).cloned())
            .await
    }

    /// Globals overlaid with the node's locals
    pub async fn available_variables(&self, id: &str, node_id: Option<&str>) -> Result<Variables> {
        self.with_context(id, |ctx| ctx.available_variables(node_id))
            .await
    }

    /// Clone the current state of a context, e.g. for persistence
    pub async fn snapshot(&self, id: &str) -> Result<ExecutionContext> {
        self.with_context(id, |ctx| ctx.clone()).await
    }

    /// Remove a context. A run holding its lease keeps working on its copy.
    pub async fn remove(&self, id: &str) -> bool {
        self.contexts.write().await.remove(id).is_some()
    }

    /// Check if a context exists
    pub async fn contains(&self, id: &str) -> bool {
        self.contexts.read().await.contains_key(id)
    }

    /// Number of live contexts
    pub async fn len(&self) -> usize {
        self.contexts.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.contexts.read().await.is_empty()
    }

    /// Drop contexts idle for longer than the stale timeout.
    ///
    /// Leased contexts are kept. Returns the number removed.
    pub async fn purge_stale(&self) -> usize {
        let mut contexts = self.contexts.write().await;
        let stale_ids: Vec<String> = contexts
            .iter()
            .filter(|(_, entry)| entry.is_stale(self.stale_timeout))
            .filter(|(_, entry)| entry.context.try_lock().is_ok())
            .map(|(id, _)| id.clone())
            .collect();

        for id in &stale_ids {
            if let Some(entry) = contexts.remove(id) {
                log::debug!(
                    "Purged stale execution context {} (age {:?})",
                    id,
                    entry.created_at.elapsed()
                );
            }
        }

        stale_ids.len()
    }
}

impl Default for ContextStore {
    fn default() -> Self {
        Self::new()
    }
}
