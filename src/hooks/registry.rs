//! Hook registry keyed by (operation, phase).

use std::collections::HashMap;
use std::sync::Arc;

use mongodb::bson::Bson;
use parking_lot::RwLock;

use super::hook::{FnHook, Hook, SyncFnHook};
use super::pipeline::HookPipeline;
use super::types::{Operation, Phase};
use crate::engine::error::OdmResult;

type HookKey = (Operation, Phase);

/// Registry holding the hook sequences of one adapter.
///
/// Hooks run in registration order. The same hook may be registered any
/// number of times; each registration runs once per pipeline execution.
/// Executors snapshot the sequence when they start, so registering while
/// an operation is in flight does not affect that operation.
pub struct HookRegistry {
    hooks: RwLock<HashMap<HookKey, Vec<Arc<dyn Hook>>>>,
}

impl HookRegistry {
    /// Creates an empty registry
    pub fn new() -> Self {
        Self {
            hooks: RwLock::new(HashMap::new()),
        }
    }

    /// Appends a hook to the sequence for `(operation, phase)`
    pub fn register(&self, operation: Operation, phase: Phase, hook: Arc<dyn Hook>) {
        tracing::debug!(%operation, %phase, hook = hook.name(), "Registering hook");
        self.hooks
            .write()
            .entry((operation, phase))
            .or_default()
            .push(hook);
    }

    /// Same as [`register`](Self::register), keyed by name (`"find"`, `"before"`, ...)
    pub fn register_named(&self, operation: &str, phase: &str, hook: Arc<dyn Hook>) -> OdmResult<()> {
        let operation = operation.parse::<Operation>()?;
        let phase = phase.parse::<Phase>()?;
        self.register(operation, phase, hook);
        Ok(())
    }

    pub fn before(&self, operation: Operation, hook: impl Hook + 'static) {
        self.register(operation, Phase::Before, Arc::new(hook));
    }

    pub fn after(&self, operation: Operation, hook: impl Hook + 'static) {
        self.register(operation, Phase::After, Arc::new(hook));
    }

    /// Registers an async closure
    pub fn register_fn<F, Fut>(&self, operation: Operation, phase: Phase, name: &str, func: F)
    where
        F: Fn(Bson) -> Fut + Send + Sync + 'static,
        Fut: std::future::Future<Output = OdmResult<Bson>> + Send + 'static,
    {
        self.register(operation, phase, Arc::new(FnHook::new(name, func)));
    }

    /// Registers a closure that returns its value directly
    pub fn register_sync<F>(&self, operation: Operation, phase: Phase, name: &str, func: F)
    where
        F: Fn(Bson) -> OdmResult<Bson> + Send + Sync + 'static,
    {
        self.register(operation, phase, Arc::new(SyncFnHook::new(name, func)));
    }

    /// Removes every hook for `(operation, phase)`, returning how many were removed
    pub fn clear(&self, operation: Operation, phase: Phase) -> usize {
        self.hooks
            .write()
            .remove(&(operation, phase))
            .map(|hooks| hooks.len())
            .unwrap_or(0)
    }

    /// Number of hooks registered for `(operation, phase)`
    pub fn hook_count(&self, operation: Operation, phase: Phase) -> usize {
        self.hooks
            .read()
            .get(&(operation, phase))
            .map(Vec::len)
            .unwrap_or(0)
    }

    /// Names of the hooks for `(operation, phase)`, in execution order
    pub fn list(&self, operation: Operation, phase: Phase) -> Vec<String> {
        self.hooks
            .read()
            .get(&(operation, phase))
            .map(|hooks| hooks.iter().map(|h| h.name().to_string()).collect())
            .unwrap_or_default()
    }

    pub fn is_empty(&self) -> bool {
        self.hooks.read().values().all(Vec::is_empty)
    }

    /// Snapshot of the current sequence for `(operation, phase)`.
    ///
    /// The lock is released before the pipeline runs, so slow hooks never
    /// block registration.
    pub fn pipeline(&self, operation: Operation, phase: Phase) -> HookPipeline {
        let hooks = self
            .hooks
            .read()
            .get(&(operation, phase))
            .cloned()
            .unwrap_or_default();
        HookPipeline::new(operation, phase, hooks)
    }

    /// Runs the `(operation, phase)` sequence over `value`
    pub async fn exec_hooks(&self, operation: Operation, phase: Phase, value: Bson) -> OdmResult<Bson> {
        self.pipeline(operation, phase).run(value).await
    }
}

impl Default for HookRegistry {
    fn default() -> Self {
        Self::new()
    }
}
