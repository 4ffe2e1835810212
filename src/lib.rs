// mongo-odm - Minimal MongoDB document mapper
// Core library

pub mod adapter;
pub mod engine;
pub mod hooks;
pub mod observability;
pub mod query;

#[cfg(test)]
mod testing;

pub use adapter::Adapter;
pub use engine::{AdapterConfig, AuthConfig, OdmError, OdmResult};
pub use hooks::{Hook, HookRegistry, Operation, Phase};
pub use query::{Executor, Inserts, Query};

/// Re-export of the driver's BSON crate, for `doc!` and friends
pub use mongodb::bson;
