//! Shared data types for the adapter
//!
//! Driver results are normalized into these outcome types so that store
//! implementations do not have to construct the driver's own result structs.

use mongodb::bson::{doc, Bson, Document};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Unique identifier for one executor run, attached to its tracing span
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct OperationId(pub Uuid);

impl OperationId {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for OperationId {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Display for OperationId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Result of a single-document insert
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InsertOneOutcome {
    pub inserted_id: Bson,
}

impl InsertOneOutcome {
    pub fn into_bson(self) -> Bson {
        Bson::Document(doc! { "insertedId": self.inserted_id })
    }
}

/// Result of a batch insert. Ids are ordered by input position.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InsertManyOutcome {
    pub inserted_ids: Vec<Bson>,
}

impl InsertManyOutcome {
    pub fn into_bson(self) -> Bson {
        Bson::Document(doc! { "insertedIds": Bson::Array(self.inserted_ids) })
    }
}

/// Result of an update
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateOutcome {
    pub matched_count: u64,
    pub modified_count: u64,
    #[serde(default)]
    pub upserted_id: Option<Bson>,
}

impl UpdateOutcome {
    pub fn into_bson(self) -> Bson {
        let mut document = Document::new();
        document.insert("matchedCount", count_to_bson(self.matched_count));
        document.insert("modifiedCount", count_to_bson(self.modified_count));
        document.insert("upsertedId", self.upserted_id.unwrap_or(Bson::Null));
        Bson::Document(document)
    }
}

/// Result of a delete
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DeleteOutcome {
    pub deleted_count: u64,
}

impl DeleteOutcome {
    pub fn into_bson(self) -> Bson {
        Bson::Document(doc! { "deletedCount": count_to_bson(self.deleted_count) })
    }
}

/// Counts never exceed i64 in practice; saturate rather than wrap.
fn count_to_bson(count: u64) -> Bson {
    Bson::Int64(i64::try_from(count).unwrap_or(i64::MAX))
}
