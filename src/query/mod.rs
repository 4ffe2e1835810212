//! Query Façade
//!
//! A [`Query`] is bound to one collection. Every method builds an
//! [`Executor`] and returns immediately; hooks and the driver only run when
//! [`Executor::exec`] is awaited.

pub mod command;
pub mod executor;

pub use command::{Command, Inserts};
pub use executor::Executor;

use std::sync::Arc;

use mongodb::bson::Document;
use mongodb::options::{
    DeleteOptions, FindOneOptions, FindOptions, InsertManyOptions, InsertOneOptions, UpdateOptions,
};

use crate::engine::traits::DocumentStore;
use crate::hooks::HookRegistry;

/// CRUD entry points for one collection
#[derive(Clone)]
pub struct Query {
    store: Arc<dyn DocumentStore>,
    hooks: Arc<HookRegistry>,
    collection: String,
}

impl Query {
    pub fn new(
        store: Arc<dyn DocumentStore>,
        hooks: Arc<HookRegistry>,
        collection: impl Into<String>,
    ) -> Self {
        Self {
            store,
            hooks,
            collection: collection.into(),
        }
    }

    pub fn collection_name(&self) -> &str {
        &self.collection
    }

    fn executor(&self, command: Command) -> Executor {
        Executor::new(
            Arc::clone(&self.store),
            Arc::clone(&self.hooks),
            self.collection.clone(),
            command,
        )
    }

    /// First document matching `filter`; resolves to `null` when none match
    pub fn find_one(
        &self,
        filter: Document,
        options: impl Into<Option<FindOneOptions>>,
    ) -> Executor {
        self.executor(Command::FindOne {
            filter,
            options: options.into(),
        })
    }

    /// All documents matching `filter`, as an array
    pub fn find(&self, filter: Document, options: impl Into<Option<FindOptions>>) -> Executor {
        self.executor(Command::Find {
            filter,
            options: options.into(),
        })
    }

    /// Inserts one document or a batch, depending on the variant, with
    /// default driver options
    pub fn insert(&self, documents: impl Into<Inserts>) -> Executor {
        self.insert_with(documents, None)
    }

    /// [`insert`](Self::insert) with options.
    ///
    /// A single document keeps `bypass_document_validation`, `write_concern`
    /// and `comment`; `ordered` only applies to batches.
    pub fn insert_with(
        &self,
        documents: impl Into<Inserts>,
        options: impl Into<Option<InsertManyOptions>>,
    ) -> Executor {
        let options = options.into();
        match documents.into() {
            Inserts::One(document) => {
                self.insert_one(document, options.map(single_insert_options))
            }
            Inserts::Many(documents) => self.insert_many(documents, options),
        }
    }

    pub fn insert_one(
        &self,
        document: Document,
        options: impl Into<Option<InsertOneOptions>>,
    ) -> Executor {
        self.executor(Command::InsertOne {
            document,
            options: options.into(),
        })
    }

    pub fn insert_many(
        &self,
        documents: Vec<Document>,
        options: impl Into<Option<InsertManyOptions>>,
    ) -> Executor {
        self.executor(Command::InsertMany {
            documents,
            options: options.into(),
        })
    }

    /// Only `filter` goes through the `before` hooks; `update` is passed as given
    pub fn update_one(
        &self,
        filter: Document,
        update: Document,
        options: impl Into<Option<UpdateOptions>>,
    ) -> Executor {
        self.executor(Command::UpdateOne {
            filter,
            update,
            options: options.into(),
        })
    }

    pub fn update_many(
        &self,
        filter: Document,
        update: Document,
        options: impl Into<Option<UpdateOptions>>,
    ) -> Executor {
        self.executor(Command::UpdateMany {
            filter,
            update,
            options: options.into(),
        })
    }

    pub fn delete_one(
        &self,
        filter: Document,
        options: impl Into<Option<DeleteOptions>>,
    ) -> Executor {
        self.executor(Command::DeleteOne {
            filter,
            options: options.into(),
        })
    }

    pub fn delete_many(
        &self,
        filter: Document,
        options: impl Into<Option<DeleteOptions>>,
    ) -> Executor {
        self.executor(Command::DeleteMany {
            filter,
            options: options.into(),
        })
    }
}

fn single_insert_options(options: InsertManyOptions) -> InsertOneOptions {
    let mut single = InsertOneOptions::default();
    single.bypass_document_validation = options.bypass_document_validation;
    single.write_concern = options.write_concern;
    single.comment = options.comment;
    single
}

impl std::fmt::Debug for Query {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Query")
            .field("database", &self.store.database_name())
            .field("collection", &self.collection)
            .finish()
    }
}
