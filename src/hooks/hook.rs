//! Core hook trait and closure adapters.

use std::future::Future;

use async_trait::async_trait;
use mongodb::bson::Bson;

use crate::engine::error::OdmResult;

/// A user-supplied step that observes or transforms the value flowing
/// through a pipeline.
///
/// The output of one hook is the input of the next. Returning an error
/// stops the pipeline and fails the enclosing operation.
#[async_trait]
pub trait Hook: Send + Sync {
    /// Name used in logs.
    fn name(&self) -> &str;

    async fn apply(&self, value: Bson) -> OdmResult<Bson>;
}

/// Hook backed by an async closure
pub struct FnHook<F> {
    name: String,
    func: F,
}

impl<F, Fut> FnHook<F>
where
    F: Fn(Bson) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = OdmResult<Bson>> + Send + 'static,
{
    pub fn new(name: impl Into<String>, func: F) -> Self {
        Self {
            name: name.into(),
            func,
        }
    }
}

#[async_trait]
impl<F, Fut> Hook for FnHook<F>
where
    F: Fn(Bson) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = OdmResult<Bson>> + Send + 'static,
{
    fn name(&self) -> &str {
        &self.name
    }

    async fn apply(&self, value: Bson) -> OdmResult<Bson> {
        (self.func)(value).await
    }
}

/// Hook backed by a plain closure that returns its value directly
pub struct SyncFnHook<F> {
    name: String,
    func: F,
}

impl<F> SyncFnHook<F>
where
    F: Fn(Bson) -> OdmResult<Bson> + Send + Sync,
{
    pub fn new(name: impl Into<String>, func: F) -> Self {
        Self {
            name: name.into(),
            func,
        }
    }
}

#[async_trait]
impl<F> Hook for SyncFnHook<F>
where
    F: Fn(Bson) -> OdmResult<Bson> + Send + Sync,
{
    fn name(&self) -> &str {
        &self.name
    }

    async fn apply(&self, value: Bson) -> OdmResult<Bson> {
        (self.func)(value)
    }
}

/// Returns its input unchanged
#[derive(Debug, Clone, Copy, Default)]
pub struct Identity;

#[async_trait]
impl Hook for Identity {
    fn name(&self) -> &str {
        "identity"
    }

    async fn apply(&self, value: Bson) -> OdmResult<Bson> {
        Ok(value)
    }
}
