//! Driver seam
//!
//! The query façade only talks to a [`DocumentStore`]; the adapter only talks
//! to a [`Connector`]. The MongoDB implementations live in
//! [`crate::engine::drivers::mongodb`].

use std::sync::Arc;

use async_trait::async_trait;
use mongodb::bson::Document;
use mongodb::options::{
    DeleteOptions, FindOneOptions, FindOptions, InsertManyOptions, InsertOneOptions, UpdateOptions,
};

use crate::engine::error::OdmResult;
use crate::engine::types::{DeleteOutcome, InsertManyOutcome, InsertOneOutcome, UpdateOutcome};

/// Collection-level operations of a connected database.
///
/// Options are the driver's own types and are passed through untouched.
#[async_trait]
pub trait DocumentStore: Send + Sync {
    /// Name of the database this store is bound to
    fn database_name(&self) -> &str;

    async fn find_one(
        &self,
        collection: &str,
        filter: Document,
        options: Option<FindOneOptions>,
    ) -> OdmResult<Option<Document>>;

    /// Runs the query and drains the cursor
    async fn find(
        &self,
        collection: &str,
        filter: Document,
        options: Option<FindOptions>,
    ) -> OdmResult<Vec<Document>>;

    async fn insert_one(
        &self,
        collection: &str,
        document: Document,
        options: Option<InsertOneOptions>,
    ) -> OdmResult<InsertOneOutcome>;

    async fn insert_many(
        &self,
        collection: &str,
        documents: Vec<Document>,
        options: Option<InsertManyOptions>,
    ) -> OdmResult<InsertManyOutcome>;

    async fn update_one(
        &self,
        collection: &str,
        filter: Document,
        update: Document,
        options: Option<UpdateOptions>,
    ) -> OdmResult<UpdateOutcome>;

    async fn update_many(
        &self,
        collection: &str,
        filter: Document,
        update: Document,
        options: Option<UpdateOptions>,
    ) -> OdmResult<UpdateOutcome>;

    async fn delete_one(
        &self,
        collection: &str,
        filter: Document,
        options: Option<DeleteOptions>,
    ) -> OdmResult<DeleteOutcome>;

    async fn delete_many(
        &self,
        collection: &str,
        filter: Document,
        options: Option<DeleteOptions>,
    ) -> OdmResult<DeleteOutcome>;

    /// Explicitly creates a collection
    async fn create_collection(&self, name: &str) -> OdmResult<()>;

    /// Closes the underlying connection
    async fn close(&self) -> OdmResult<()>;
}

/// Opens a [`DocumentStore`] for a connection URL
#[async_trait]
pub trait Connector: Send + Sync {
    /// Identifier used in logs (e.g. "mongodb")
    fn driver_id(&self) -> &'static str;

    /// Connects and verifies the server is reachable.
    ///
    /// Network, DNS and authentication failures must surface here rather than
    /// on the first query.
    async fn connect(&self, url: &str, database: &str) -> OdmResult<Arc<dyn DocumentStore>>;
}
