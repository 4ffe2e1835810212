//! Lifecycle hooks
//!
//! `before` hooks transform the input of an operation (the filter, or the
//! documents being inserted) before it reaches the driver. `after` hooks
//! transform the driver's raw result before it is returned to the caller.

pub mod hook;
pub mod pipeline;
pub mod registry;
pub mod types;

pub use hook::{FnHook, Hook, Identity, SyncFnHook};
pub use pipeline::HookPipeline;
pub use registry::HookRegistry;
pub use types::{Operation, Phase};
