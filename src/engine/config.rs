// SPDX-License-Identifier: Apache-2.0

//! Adapter configuration
//!
//! Configuration is an in-process object; it can also be read from a JSON
//! file or derived from an existing connection URL.

use std::collections::BTreeMap;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::engine::connection_url::parse_connection_url;
use crate::engine::error::{OdmError, OdmResult};
use crate::observability::Sensitive;

/// Credentials for the MongoDB user
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuthConfig {
    pub user: String,
    #[serde(default)]
    pub password: Option<Sensitive<String>>,
}

impl AuthConfig {
    pub fn new(user: impl Into<String>, password: Option<String>) -> Self {
        Self {
            user: user.into(),
            password: password.map(Sensitive::new),
        }
    }
}

/// Connection settings recognized by the adapter
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct AdapterConfig {
    /// Defaults to `localhost` when unset or empty.
    pub host: Option<String>,
    /// Defaults to `27017` when unset or zero.
    pub port: Option<u16>,
    pub auth: Option<AuthConfig>,
    pub database: Option<String>,
    /// Extra driver options appended to the URL query string.
    pub options: BTreeMap<String, String>,
    /// Splice `auth` into the connection URL. Off by default.
    pub embed_credentials: bool,
}

impl AdapterConfig {
    /// Creates a configuration targeting `database` on the default host and port.
    pub fn for_database(database: impl Into<String>) -> Self {
        Self {
            database: Some(database.into()),
            ..Self::default()
        }
    }

    pub fn with_host(mut self, host: impl Into<String>) -> Self {
        self.host = Some(host.into());
        self
    }

    pub fn with_port(mut self, port: u16) -> Self {
        self.port = Some(port);
        self
    }

    pub fn with_auth(mut self, auth: AuthConfig) -> Self {
        self.auth = Some(auth);
        self
    }

    pub fn with_option(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.options.insert(key.into(), value.into());
        self
    }

    /// Parses a JSON configuration document
    pub fn from_json_str(content: &str) -> OdmResult<Self> {
        serde_json::from_str(content)
            .map_err(|e| OdmError::configuration(format!("Failed to parse config: {}", e)))
    }

    /// Loads a JSON configuration file
    pub fn load(path: impl AsRef<Path>) -> OdmResult<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path).map_err(|e| {
            OdmError::configuration(format!("Failed to read config {}: {}", path.display(), e))
        })?;

        let config = Self::from_json_str(&content)?;
        tracing::debug!("Loaded adapter configuration from {:?}", path);
        Ok(config)
    }

    /// Derives a configuration from a `mongodb://` URL. SRV URLs are rejected.
    pub fn from_url(url: &str) -> OdmResult<Self> {
        parse_connection_url(url).map_err(|e| OdmError::configuration(e.to_string()))
    }

    /// Database name, required before connecting
    pub fn database_name(&self) -> OdmResult<&str> {
        self.database
            .as_deref()
            .map(str::trim)
            .filter(|name| !name.is_empty())
            .ok_or_else(|| OdmError::configuration("A database name is required"))
    }

    /// Checks the settings needed to connect
    pub fn validate(&self) -> OdmResult<()> {
        self.database_name()?;

        if let Some(auth) = &self.auth {
            if auth.user.is_empty() {
                return Err(OdmError::configuration("auth.user must not be empty"));
            }
        }

        Ok(())
    }
}
