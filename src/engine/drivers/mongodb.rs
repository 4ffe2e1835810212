//! MongoDB Driver
//!
//! Implements [`DocumentStore`] and [`Connector`] using the official MongoDB driver.

use std::sync::Arc;

use async_trait::async_trait;
use futures::TryStreamExt;
use mongodb::bson::{doc, Document};
use mongodb::options::{
    ClientOptions, DeleteOptions, FindOneOptions, FindOptions, InsertManyOptions,
    InsertOneOptions, UpdateOptions,
};
use mongodb::{Client, Collection, Database};

use crate::engine::error::{OdmError, OdmResult};
use crate::engine::traits::{Connector, DocumentStore};
use crate::engine::types::{DeleteOutcome, InsertManyOutcome, InsertOneOutcome, UpdateOutcome};

/// A connected MongoDB database
pub struct MongoStore {
    client: Client,
    database: Database,
}

impl MongoStore {
    pub fn new(client: Client, database: &str) -> Self {
        let database = client.database(database);
        Self { client, database }
    }

    /// The driver handle, for anything the façade does not cover
    pub fn database(&self) -> &Database {
        &self.database
    }

    pub fn client(&self) -> &Client {
        &self.client
    }

    fn collection(&self, name: &str) -> Collection<Document> {
        self.database.collection::<Document>(name)
    }
}

fn log_driver_error(op: &str, collection: &str, err: mongodb::error::Error) -> OdmError {
    tracing::error!("MongoDB: {} on {} failed: {}", op, collection, err);
    OdmError::Driver(err)
}

#[async_trait]
impl DocumentStore for MongoStore {
    fn database_name(&self) -> &str {
        self.database.name()
    }

    async fn find_one(
        &self,
        collection: &str,
        filter: Document,
        options: Option<FindOneOptions>,
    ) -> OdmResult<Option<Document>> {
        self.collection(collection)
            .find_one(filter)
            .with_options(options)
            .await
            .map_err(|e| log_driver_error("findOne", collection, e))
    }

    async fn find(
        &self,
        collection: &str,
        filter: Document,
        options: Option<FindOptions>,
    ) -> OdmResult<Vec<Document>> {
        let cursor = self
            .collection(collection)
            .find(filter)
            .with_options(options)
            .await
            .map_err(|e| log_driver_error("find", collection, e))?;

        cursor
            .try_collect()
            .await
            .map_err(|e| log_driver_error("find", collection, e))
    }

    async fn insert_one(
        &self,
        collection: &str,
        document: Document,
        options: Option<InsertOneOptions>,
    ) -> OdmResult<InsertOneOutcome> {
        let result = self
            .collection(collection)
            .insert_one(document)
            .with_options(options)
            .await
            .map_err(|e| log_driver_error("insertOne", collection, e))?;

        Ok(InsertOneOutcome {
            inserted_id: result.inserted_id,
        })
    }

    async fn insert_many(
        &self,
        collection: &str,
        documents: Vec<Document>,
        options: Option<InsertManyOptions>,
    ) -> OdmResult<InsertManyOutcome> {
        let result = self
            .collection(collection)
            .insert_many(documents)
            .with_options(options)
            .await
            .map_err(|e| log_driver_error("insertMany", collection, e))?;

        let mut ids: Vec<_> = result.inserted_ids.into_iter().collect();
        ids.sort_by_key(|(index, _)| *index);

        Ok(InsertManyOutcome {
            inserted_ids: ids.into_iter().map(|(_, id)| id).collect(),
        })
    }

    async fn update_one(
        &self,
        collection: &str,
        filter: Document,
        update: Document,
        options: Option<UpdateOptions>,
    ) -> OdmResult<UpdateOutcome> {
        let result = self
            .collection(collection)
            .update_one(filter, update)
            .with_options(options)
            .await
            .map_err(|e| log_driver_error("updateOne", collection, e))?;

        Ok(UpdateOutcome {
            matched_count: result.matched_count,
            modified_count: result.modified_count,
            upserted_id: result.upserted_id,
        })
    }

    async fn update_many(
        &self,
        collection: &str,
        filter: Document,
        update: Document,
        options: Option<UpdateOptions>,
    ) -> OdmResult<UpdateOutcome> {
        let result = self
            .collection(collection)
            .update_many(filter, update)
            .with_options(options)
            .await
            .map_err(|e| log_driver_error("updateMany", collection, e))?;

        Ok(UpdateOutcome {
            matched_count: result.matched_count,
            modified_count: result.modified_count,
            upserted_id: result.upserted_id,
        })
    }

    async fn delete_one(
        &self,
        collection: &str,
        filter: Document,
        options: Option<DeleteOptions>,
    ) -> OdmResult<DeleteOutcome> {
        let result = self
            .collection(collection)
            .delete_one(filter)
            .with_options(options)
            .await
            .map_err(|e| log_driver_error("deleteOne", collection, e))?;

        Ok(DeleteOutcome {
            deleted_count: result.deleted_count,
        })
    }

    async fn delete_many(
        &self,
        collection: &str,
        filter: Document,
        options: Option<DeleteOptions>,
    ) -> OdmResult<DeleteOutcome> {
        let result = self
            .collection(collection)
            .delete_many(filter)
            .with_options(options)
            .await
            .map_err(|e| log_driver_error("deleteMany", collection, e))?;

        Ok(DeleteOutcome {
            deleted_count: result.deleted_count,
        })
    }

    async fn create_collection(&self, name: &str) -> OdmResult<()> {
        self.database
            .create_collection(name)
            .await
            .map_err(|e| log_driver_error("createCollection", name, e))
    }

    async fn close(&self) -> OdmResult<()> {
        self.client.clone().shutdown().await;
        Ok(())
    }
}

/// Connects to MongoDB and pings the server before handing out a store
#[derive(Debug, Default, Clone, Copy)]
pub struct MongoConnector;

impl MongoConnector {
    pub fn new() -> Self {
        Self
    }

    async fn create_client_and_ping(url: &str) -> OdmResult<Client> {
        let options = ClientOptions::parse(url).await.map_err(OdmError::connect_error)?;
        let client = Client::with_options(options).map_err(OdmError::connect_error)?;

        client
            .database("admin")
            .run_command(doc! { "ping": 1 })
            .await
            .map_err(OdmError::connect_error)?;

        Ok(client)
    }
}

#[async_trait]
impl Connector for MongoConnector {
    fn driver_id(&self) -> &'static str {
        "mongodb"
    }

    async fn connect(&self, url: &str, database: &str) -> OdmResult<Arc<dyn DocumentStore>> {
        let client = Self::create_client_and_ping(url).await?;
        Ok(Arc::new(MongoStore::new(client, database)))
    }
}
