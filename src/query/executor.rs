// SPDX-License-Identifier: Apache-2.0

//! Executor
//!
//! Runs one [`Command`]:
//! 1. `before` hooks over the input (filter, document or documents)
//! 2. the driver call with the transformed input
//! 3. `after` hooks over the driver's raw result

use std::sync::Arc;

use mongodb::bson::{self, Bson, Document};
use serde::de::DeserializeOwned;
use tracing::Instrument;

use super::command::Command;
use crate::engine::error::{OdmError, OdmResult};
use crate::engine::traits::DocumentStore;
use crate::engine::types::OperationId;
use crate::hooks::{HookPipeline, HookRegistry, Operation, Phase};

/// Deferred, single-use wrapper around a command. Dropping it without
/// calling [`exec`](Self::exec) runs nothing.
#[must_use = "executors do nothing until `exec` is called"]
pub struct Executor {
    store: Arc<dyn DocumentStore>,
    hooks: Arc<HookRegistry>,
    collection: String,
    command: Command,
}

impl Executor {
    pub(crate) fn new(
        store: Arc<dyn DocumentStore>,
        hooks: Arc<HookRegistry>,
        collection: String,
        command: Command,
    ) -> Self {
        Self {
            store,
            hooks,
            collection,
            command,
        }
    }

    pub fn command(&self) -> &Command {
        &self.command
    }

    pub fn collection(&self) -> &str {
        &self.collection
    }

    pub fn operation(&self) -> Operation {
        self.command.operation()
    }

    /// Runs hooks and driver call, resolving with the `after` hooks' output
    pub async fn exec(self) -> OdmResult<Bson> {
        let operation_id = OperationId::new();
        let span = tracing::debug_span!(
            "odm.exec",
            operation_id = %operation_id,
            collection = %self.collection,
            command = self.command.name(),
        );

        self.run().instrument(span).await
    }

    /// Runs the executor and deserializes the output into `T`
    pub async fn exec_as<T: DeserializeOwned>(self) -> OdmResult<T> {
        let value = self.exec().await?;
        bson::from_bson(value).map_err(|e| OdmError::deserialization(e.to_string()))
    }

    async fn run(self) -> OdmResult<Bson> {
        let operation = self.command.operation();

        // Snapshot both sequences up front so the whole call sees one registry state
        let before = self.hooks.pipeline(operation, Phase::Before);
        let after = self.hooks.pipeline(operation, Phase::After);

        let raw = self.dispatch(&before).await?;
        let output = after.run(raw).await?;

        tracing::debug!(before_hooks = before.len(), after_hooks = after.len(), "Operation completed");
        Ok(output)
    }

    async fn dispatch(self, before: &HookPipeline) -> OdmResult<Bson> {
        let Executor {
            store,
            collection,
            command,
            ..
        } = self;
        let collection = collection.as_str();

        match command {
            Command::FindOne { filter, options } => {
                let filter = expect_document("find", before.run(Bson::Document(filter)).await?)?;
                let found = store.find_one(collection, filter, options).await?;
                Ok(found.map(Bson::Document).unwrap_or(Bson::Null))
            }
            Command::Find { filter, options } => {
                let filter = expect_document("find", before.run(Bson::Document(filter)).await?)?;
                let documents = store.find(collection, filter, options).await?;
                Ok(Bson::Array(documents.into_iter().map(Bson::Document).collect()))
            }
            Command::InsertOne { document, options } => {
                let document =
                    expect_document("create", before.run(Bson::Document(document)).await?)?;
                Ok(store.insert_one(collection, document, options).await?.into_bson())
            }
            Command::InsertMany { documents, options } => {
                let input = Bson::Array(documents.into_iter().map(Bson::Document).collect());
                let documents = expect_documents("create", before.run(input).await?)?;
                Ok(store.insert_many(collection, documents, options).await?.into_bson())
            }
            Command::UpdateOne {
                filter,
                update,
                options,
            } => {
                let filter = expect_document("update", before.run(Bson::Document(filter)).await?)?;
                Ok(store
                    .update_one(collection, filter, update, options)
                    .await?
                    .into_bson())
            }
            Command::UpdateMany {
                filter,
                update,
                options,
            } => {
                let filter = expect_document("update", before.run(Bson::Document(filter)).await?)?;
                Ok(store
                    .update_many(collection, filter, update, options)
                    .await?
                    .into_bson())
            }
            Command::DeleteOne { filter, options } => {
                let filter = expect_document("delete", before.run(Bson::Document(filter)).await?)?;
                Ok(store.delete_one(collection, filter, options).await?.into_bson())
            }
            Command::DeleteMany { filter, options } => {
                let filter = expect_document("delete", before.run(Bson::Document(filter)).await?)?;
                Ok(store.delete_many(collection, filter, options).await?.into_bson())
            }
        }
    }
}

impl std::fmt::Debug for Executor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Executor")
            .field("collection", &self.collection)
            .field("command", &self.command)
            .finish()
    }
}

/// The driver needs a document; hooks may have returned anything.
fn expect_document(operation: &'static str, value: Bson) -> OdmResult<Document> {
    match value {
        Bson::Document(document) => Ok(document),
        other => Err(OdmError::invalid_payload(operation, "document", &other)),
    }
}

fn expect_documents(operation: &'static str, value: Bson) -> OdmResult<Vec<Document>> {
    match value {
        Bson::Array(items) => items
            .into_iter()
            .map(|item| match item {
                Bson::Document(document) => Ok(document),
                other => Err(OdmError::invalid_payload(operation, "array of documents", &other)),
            })
            .collect(),
        other => Err(OdmError::invalid_payload(operation, "array of documents", &other)),
    }
}
