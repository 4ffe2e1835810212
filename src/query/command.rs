//! Pending operations
//!
//! A [`Command`] captures everything needed to run one CRUD call. Nothing
//! is executed until the owning [`Executor`](super::Executor) is run.

use mongodb::bson::Document;
use mongodb::options::{
    DeleteOptions, FindOneOptions, FindOptions, InsertManyOptions, InsertOneOptions, UpdateOptions,
};

use crate::hooks::Operation;

/// One CRUD call, with its input and the driver options passed through verbatim
#[derive(Debug, Clone)]
pub enum Command {
    FindOne {
        filter: Document,
        options: Option<FindOneOptions>,
    },
    Find {
        filter: Document,
        options: Option<FindOptions>,
    },
    InsertOne {
        document: Document,
        options: Option<InsertOneOptions>,
    },
    InsertMany {
        documents: Vec<Document>,
        options: Option<InsertManyOptions>,
    },
    UpdateOne {
        filter: Document,
        update: Document,
        options: Option<UpdateOptions>,
    },
    UpdateMany {
        filter: Document,
        update: Document,
        options: Option<UpdateOptions>,
    },
    DeleteOne {
        filter: Document,
        options: Option<DeleteOptions>,
    },
    DeleteMany {
        filter: Document,
        options: Option<DeleteOptions>,
    },
}

impl Command {
    /// Hook operation this command runs under
    pub fn operation(&self) -> Operation {
        match self {
            Command::FindOne { .. } | Command::Find { .. } => Operation::Find,
            Command::InsertOne { .. } | Command::InsertMany { .. } => Operation::Create,
            Command::UpdateOne { .. } | Command::UpdateMany { .. } => Operation::Update,
            Command::DeleteOne { .. } | Command::DeleteMany { .. } => Operation::Delete,
        }
    }

    /// Driver method name, used in logs
    pub fn name(&self) -> &'static str {
        match self {
            Command::FindOne { .. } => "findOne",
            Command::Find { .. } => "find",
            Command::InsertOne { .. } => "insertOne",
            Command::InsertMany { .. } => "insertMany",
            Command::UpdateOne { .. } => "updateOne",
            Command::UpdateMany { .. } => "updateMany",
            Command::DeleteOne { .. } => "deleteOne",
            Command::DeleteMany { .. } => "deleteMany",
        }
    }
}

/// Documents for [`Query::insert`](super::Query::insert): one document takes
/// the single-insert path, a sequence takes the batch path.
#[derive(Debug, Clone, PartialEq)]
pub enum Inserts {
    One(Document),
    Many(Vec<Document>),
}

impl From<Document> for Inserts {
    fn from(document: Document) -> Self {
        Inserts::One(document)
    }
}

impl From<Vec<Document>> for Inserts {
    fn from(documents: Vec<Document>) -> Self {
        Inserts::Many(documents)
    }
}

impl<const N: usize> From<[Document; N]> for Inserts {
    fn from(documents: [Document; N]) -> Self {
        Inserts::Many(documents.into())
    }
}
