//! Test doubles for the driver seam.

use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Arc;

use async_trait::async_trait;
use mongodb::bson::{Bson, Document};
use mongodb::options::{
    DeleteOptions, FindOneOptions, FindOptions, InsertManyOptions, InsertOneOptions, UpdateOptions,
};
use parking_lot::Mutex;

use crate::engine::error::{OdmError, OdmResult};
use crate::engine::traits::{Connector, DocumentStore};
use crate::engine::types::{DeleteOutcome, InsertManyOutcome, InsertOneOutcome, UpdateOutcome};

/// A driver call as seen by the store
#[derive(Debug, Clone, PartialEq)]
pub enum StoreCall {
    FindOne { collection: String, filter: Document },
    Find { collection: String, filter: Document },
    InsertOne { collection: String, document: Document },
    InsertMany { collection: String, documents: Vec<Document> },
    UpdateOne { collection: String, filter: Document, update: Document },
    UpdateMany { collection: String, filter: Document, update: Document },
    DeleteOne { collection: String, filter: Document },
    DeleteMany { collection: String, filter: Document },
    CreateCollection { name: String },
}

/// Driver options as received by the store, one entry per call
#[derive(Debug, Clone)]
pub enum StoreOptions {
    FindOne(Option<FindOneOptions>),
    Find(Option<FindOptions>),
    InsertOne(Option<InsertOneOptions>),
    InsertMany(Option<InsertManyOptions>),
    Update(Option<UpdateOptions>),
    Delete(Option<DeleteOptions>),
    None,
}

/// Store that records every call and answers with canned data
pub struct RecordingStore {
    calls: Mutex<Vec<StoreCall>>,
    options: Mutex<Vec<StoreOptions>>,
    documents: Vec<Document>,
    failure: Option<String>,
    next_id: AtomicUsize,
    closed: AtomicBool,
}

impl RecordingStore {
    pub fn new() -> Self {
        Self {
            calls: Mutex::new(Vec::new()),
            options: Mutex::new(Vec::new()),
            documents: Vec::new(),
            failure: None,
            next_id: AtomicUsize::new(0),
            closed: AtomicBool::new(false),
        }
    }

    /// Documents returned by `find`; `find_one` returns the first
    pub fn with_documents(mut self, documents: Vec<Document>) -> Self {
        self.documents = documents;
        self
    }

    /// Every call is recorded, then fails with `message`
    pub fn failing(mut self, message: &str) -> Self {
        self.failure = Some(message.to_string());
        self
    }

    pub fn calls(&self) -> Vec<StoreCall> {
        self.calls.lock().clone()
    }

    pub fn options(&self) -> Vec<StoreOptions> {
        self.options.lock().clone()
    }

    pub fn is_closed(&self) -> bool {
        self.closed.load(Ordering::SeqCst)
    }

    fn record(&self, call: StoreCall, options: StoreOptions) -> OdmResult<()> {
        self.calls.lock().push(call);
        self.options.lock().push(options);
        match &self.failure {
            Some(message) => Err(OdmError::execution(message.clone())),
            None => Ok(()),
        }
    }

    fn next_id(&self) -> Bson {
        Bson::Int32(self.next_id.fetch_add(1, Ordering::SeqCst) as i32)
    }
}

#[async_trait]
impl DocumentStore for RecordingStore {
    fn database_name(&self) -> &str {
        "test"
    }

    async fn find_one(
        &self,
        collection: &str,
        filter: Document,
        options: Option<FindOneOptions>,
    ) -> OdmResult<Option<Document>> {
        self.record(
            StoreCall::FindOne {
                collection: collection.to_string(),
                filter,
            },
            StoreOptions::FindOne(options),
        )?;
        Ok(self.documents.first().cloned())
    }

    async fn find(
        &self,
        collection: &str,
        filter: Document,
        options: Option<FindOptions>,
    ) -> OdmResult<Vec<Document>> {
        self.record(
            StoreCall::Find {
                collection: collection.to_string(),
                filter,
            },
            StoreOptions::Find(options),
        )?;
        Ok(self.documents.clone())
    }

    async fn insert_one(
        &self,
        collection: &str,
        document: Document,
        options: Option<InsertOneOptions>,
    ) -> OdmResult<InsertOneOutcome> {
        self.record(
            StoreCall::InsertOne {
                collection: collection.to_string(),
                document,
            },
            StoreOptions::InsertOne(options),
        )?;
        Ok(InsertOneOutcome {
            inserted_id: self.next_id(),
        })
    }

    async fn insert_many(
        &self,
        collection: &str,
        documents: Vec<Document>,
        options: Option<InsertManyOptions>,
    ) -> OdmResult<InsertManyOutcome> {
        let count = documents.len();
        self.record(
            StoreCall::InsertMany {
                collection: collection.to_string(),
                documents,
            },
            StoreOptions::InsertMany(options),
        )?;
        Ok(InsertManyOutcome {
            inserted_ids: (0..count).map(|_| self.next_id()).collect(),
        })
    }

    async fn update_one(
        &self,
        collection: &str,
        filter: Document,
        update: Document,
        options: Option<UpdateOptions>,
    ) -> OdmResult<UpdateOutcome> {
        self.record(
            StoreCall::UpdateOne {
                collection: collection.to_string(),
                filter,
                update,
            },
            StoreOptions::Update(options),
        )?;
        Ok(UpdateOutcome {
            matched_count: 1,
            modified_count: 1,
            upserted_id: None,
        })
    }

    async fn update_many(
        &self,
        collection: &str,
        filter: Document,
        update: Document,
        options: Option<UpdateOptions>,
    ) -> OdmResult<UpdateOutcome> {
        self.record(
            StoreCall::UpdateMany {
                collection: collection.to_string(),
                filter,
                update,
            },
            StoreOptions::Update(options),
        )?;
        Ok(UpdateOutcome {
            matched_count: 1,
            modified_count: 1,
            upserted_id: None,
        })
    }

    async fn delete_one(
        &self,
        collection: &str,
        filter: Document,
        options: Option<DeleteOptions>,
    ) -> OdmResult<DeleteOutcome> {
        self.record(
            StoreCall::DeleteOne {
                collection: collection.to_string(),
                filter,
            },
            StoreOptions::Delete(options),
        )?;
        Ok(DeleteOutcome { deleted_count: 1 })
    }

    async fn delete_many(
        &self,
        collection: &str,
        filter: Document,
        options: Option<DeleteOptions>,
    ) -> OdmResult<DeleteOutcome> {
        self.record(
            StoreCall::DeleteMany {
                collection: collection.to_string(),
                filter,
            },
            StoreOptions::Delete(options),
        )?;
        Ok(DeleteOutcome { deleted_count: 1 })
    }

    async fn create_collection(&self, name: &str) -> OdmResult<()> {
        self.record(
            StoreCall::CreateCollection {
                name: name.to_string(),
            },
            StoreOptions::None,
        )
    }

    async fn close(&self) -> OdmResult<()> {
        self.closed.store(true, Ordering::SeqCst);
        Ok(())
    }
}

/// Connector handing out one shared [`RecordingStore`]
pub struct MockConnector {
    pub store: Arc<RecordingStore>,
    pub urls: Mutex<Vec<String>>,
    /// Number of upcoming connect attempts that fail
    pub failures_remaining: AtomicUsize,
}

impl MockConnector {
    pub fn new(store: Arc<RecordingStore>) -> Self {
        Self {
            store,
            urls: Mutex::new(Vec::new()),
            failures_remaining: AtomicUsize::new(0),
        }
    }

    pub fn failing_times(self, times: usize) -> Self {
        self.failures_remaining.store(times, Ordering::SeqCst);
        self
    }

    pub fn urls(&self) -> Vec<String> {
        self.urls.lock().clone()
    }
}

#[async_trait]
impl Connector for MockConnector {
    fn driver_id(&self) -> &'static str {
        "mock"
    }

    async fn connect(&self, url: &str, _database: &str) -> OdmResult<Arc<dyn DocumentStore>> {
        self.urls.lock().push(url.to_string());

        let remaining = self.failures_remaining.load(Ordering::SeqCst);
        if remaining > 0 {
            self.failures_remaining.store(remaining - 1, Ordering::SeqCst);
            return Err(OdmError::connection_failed("connection refused"));
        }

        Ok(self.store.clone())
    }
}
