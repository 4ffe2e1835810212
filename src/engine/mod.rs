// Data Engine Module
// Configuration, connection URLs and the driver seam

pub mod config;
pub mod connection_url;
pub mod drivers;
pub mod error;
pub mod traits;
pub mod types;

pub use config::{AdapterConfig, AuthConfig};
pub use error::{OdmError, OdmResult};
pub use traits::{Connector, DocumentStore};
pub use types::*;
