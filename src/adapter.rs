// SPDX-License-Identifier: Apache-2.0

//! Adapter
//!
//! Owns the configuration, the hook registry and, once [`Adapter::connect`]
//! succeeds, the single memoized connection every [`Query`] is built on.

use std::sync::Arc;

use parking_lot::RwLock;
use tokio::sync::Mutex;
use tracing::{info, warn};

use crate::engine::config::AdapterConfig;
use crate::engine::connection_url::build_database_url;
use crate::engine::drivers::mongodb::MongoConnector;
use crate::engine::error::{OdmError, OdmResult};
use crate::engine::traits::{Connector, DocumentStore};
use crate::hooks::HookRegistry;
use crate::query::Query;

enum ConnectionState {
    Disconnected,
    Connected(Arc<dyn DocumentStore>),
    Closed,
}

/// Connection lifecycle plus the entry point to per-collection queries
pub struct Adapter {
    config: AdapterConfig,
    hooks: Arc<HookRegistry>,
    connector: Arc<dyn Connector>,
    state: RwLock<ConnectionState>,
    /// Serializes connect attempts so only one connection is ever opened
    connect_lock: Mutex<()>,
}

impl Adapter {
    /// Adapter with its own empty hook registry and the MongoDB connector
    pub fn new(config: AdapterConfig) -> Self {
        Self::with_hooks(config, Arc::new(HookRegistry::new()))
    }

    /// Adapter sharing an existing hook registry
    pub fn with_hooks(config: AdapterConfig, hooks: Arc<HookRegistry>) -> Self {
        Self::with_connector(config, hooks, Arc::new(MongoConnector::new()))
    }

    pub fn with_connector(
        config: AdapterConfig,
        hooks: Arc<HookRegistry>,
        connector: Arc<dyn Connector>,
    ) -> Self {
        Self {
            config,
            hooks,
            connector,
            state: RwLock::new(ConnectionState::Disconnected),
            connect_lock: Mutex::new(()),
        }
    }

    pub fn config(&self) -> &AdapterConfig {
        &self.config
    }

    /// Registry consulted by every query built from this adapter
    pub fn hooks(&self) -> &Arc<HookRegistry> {
        &self.hooks
    }

    /// URL `connect` will use
    pub fn connection_url(&self) -> OdmResult<String> {
        let database = self.config.database_name()?;
        Ok(build_database_url(&self.config, database))
    }

    pub fn is_connected(&self) -> bool {
        matches!(*self.state.read(), ConnectionState::Connected(_))
    }

    /// Opens the connection, or returns immediately if already connected.
    ///
    /// On failure the adapter stays disconnected and `connect` may be called again.
    pub async fn connect(&self) -> OdmResult<&Self> {
        let _guard = self.connect_lock.lock().await;

        {
            let state = self.state.read();
            match &*state {
                ConnectionState::Connected(_) => return Ok(self),
                ConnectionState::Closed => return Err(OdmError::AdapterClosed),
                ConnectionState::Disconnected => {}
            }
        }

        self.config.validate()?;
        let database = self.config.database_name()?;
        let url = build_database_url(&self.config, database);

        let store = self
            .connector
            .connect(&url, database)
            .await
            .map_err(|err| {
                warn!(
                    driver = self.connector.driver_id(),
                    database,
                    "Connection failed: {}",
                    err
                );
                err
            })?;

        *self.state.write() = ConnectionState::Connected(store);
        info!(driver = self.connector.driver_id(), database, "Connected");

        Ok(self)
    }

    /// The connected store (the driver-level database handle)
    pub fn store(&self) -> OdmResult<Arc<dyn DocumentStore>> {
        match &*self.state.read() {
            ConnectionState::Connected(store) => Ok(Arc::clone(store)),
            ConnectionState::Disconnected => Err(OdmError::NotConnected),
            ConnectionState::Closed => Err(OdmError::AdapterClosed),
        }
    }

    /// Query façade for `collection`
    pub fn query(&self, collection: &str) -> OdmResult<Query> {
        Ok(Query::new(self.store()?, Arc::clone(&self.hooks), collection))
    }

    pub async fn create_collection(&self, name: &str) -> OdmResult<()> {
        self.store()?.create_collection(name).await
    }

    /// Closes the connection. The adapter cannot be reconnected afterwards.
    pub async fn close(&self) -> OdmResult<()> {
        let _guard = self.connect_lock.lock().await;

        let store = {
            let mut state = self.state.write();
            match std::mem::replace(&mut *state, ConnectionState::Closed) {
                ConnectionState::Connected(store) => store,
                ConnectionState::Disconnected => {
                    *state = ConnectionState::Disconnected;
                    return Err(OdmError::NotConnected);
                }
                ConnectionState::Closed => return Err(OdmError::AdapterClosed),
            }
        };

        store.close().await?;
        info!(database = store.database_name(), "Connection closed");
        Ok(())
    }
}

impl std::fmt::Debug for Adapter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Adapter")
            .field("config", &self.config)
            .field("driver", &self.connector.driver_id())
            .field("connected", &self.is_connected())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::config::AuthConfig;
    use crate::hooks::{Operation, Phase};
    use crate::testing::{MockConnector, RecordingStore, StoreCall};
    use mongodb::bson::{doc, Bson};

    fn adapter_with(connector: MockConnector, config: AdapterConfig) -> (Adapter, Arc<MockConnector>) {
        let connector = Arc::new(connector);
        let adapter = Adapter::with_connector(
            config,
            Arc::new(HookRegistry::new()),
            connector.clone(),
        );
        (adapter, connector)
    }

    #[tokio::test]
    async fn test_query_before_connect_fails() {
        let store = Arc::new(RecordingStore::new());
        let (adapter, _) = adapter_with(MockConnector::new(store), AdapterConfig::for_database("shop"));

        assert!(matches!(adapter.query("users"), Err(OdmError::NotConnected)));
        assert!(matches!(adapter.close().await, Err(OdmError::NotConnected)));
        assert!(!adapter.is_connected());
    }

    #[tokio::test]
    async fn test_connect_uses_database_url_and_memoizes() {
        let store = Arc::new(RecordingStore::new());
        let config = AdapterConfig::for_database("shop").with_host("db1");
        let (adapter, connector) = adapter_with(MockConnector::new(store), config);

        adapter.connect().await.unwrap();
        adapter.connect().await.unwrap();

        assert!(adapter.is_connected());
        assert_eq!(connector.urls(), vec!["mongodb://db1:27017/shop".to_string()]);
    }

    #[tokio::test]
    async fn test_credentials_are_left_out_by_default() {
        let store = Arc::new(RecordingStore::new());
        let config = AdapterConfig::for_database("shop")
            .with_auth(AuthConfig::new("app", Some("pw".to_string())));
        let (adapter, connector) = adapter_with(MockConnector::new(store), config);

        adapter.connect().await.unwrap();
        assert_eq!(connector.urls(), vec!["mongodb://localhost:27017/shop".to_string()]);
    }

    #[tokio::test]
    async fn test_missing_database_is_a_configuration_error() {
        let store = Arc::new(RecordingStore::new());
        let (adapter, connector) = adapter_with(MockConnector::new(store), AdapterConfig::default());

        let err = adapter.connect().await.unwrap_err();
        assert!(matches!(err, OdmError::Configuration { .. }));
        assert!(connector.urls().is_empty());
    }

    #[tokio::test]
    async fn test_failed_connect_can_be_retried() {
        let store = Arc::new(RecordingStore::new());
        let (adapter, connector) = adapter_with(
            MockConnector::new(store).failing_times(1),
            AdapterConfig::for_database("shop"),
        );

        let err = adapter.connect().await.unwrap_err();
        assert!(err.is_connection_error());
        assert!(!adapter.is_connected());

        adapter.connect().await.unwrap();
        assert!(adapter.is_connected());
        assert_eq!(connector.urls().len(), 2);
    }

    #[tokio::test]
    async fn test_query_runs_registered_hooks() {
        let store = Arc::new(RecordingStore::new());
        let (adapter, _) = adapter_with(MockConnector::new(store.clone()), AdapterConfig::for_database("shop"));
        adapter
            .hooks()
            .register_sync(Operation::Delete, Phase::Before, "soft", |value| {
                let mut filter = value.as_document().cloned().unwrap_or_default();
                filter.insert("archived", false);
                Ok(Bson::Document(filter))
            });

        adapter.connect().await.unwrap();
        adapter
            .query("orders")
            .unwrap()
            .delete_one(doc! { "_id": 7 }, None)
            .exec()
            .await
            .unwrap();

        assert_eq!(
            store.calls(),
            vec![StoreCall::DeleteOne {
                collection: "orders".into(),
                filter: doc! { "_id": 7, "archived": false },
            }]
        );
    }

    #[tokio::test]
    async fn test_create_collection() {
        let store = Arc::new(RecordingStore::new());
        let (adapter, _) = adapter_with(MockConnector::new(store.clone()), AdapterConfig::for_database("shop"));

        adapter.connect().await.unwrap();
        adapter.create_collection("audit").await.unwrap();

        assert_eq!(store.calls(), vec![StoreCall::CreateCollection { name: "audit".into() }]);
    }

    #[tokio::test]
    async fn test_close_is_terminal() {
        let store = Arc::new(RecordingStore::new());
        let (adapter, _) = adapter_with(MockConnector::new(store.clone()), AdapterConfig::for_database("shop"));

        adapter.connect().await.unwrap();
        adapter.close().await.unwrap();

        assert!(store.is_closed());
        assert!(matches!(adapter.query("users"), Err(OdmError::AdapterClosed)));
        assert!(matches!(adapter.connect().await, Err(OdmError::AdapterClosed)));
        assert!(matches!(adapter.close().await, Err(OdmError::AdapterClosed)));
    }

    #[test]
    fn test_connection_url() {
        let adapter = Adapter::new(AdapterConfig::for_database("shop").with_port(27018));
        assert_eq!(adapter.connection_url().unwrap(), "mongodb://localhost:27018/shop");
    }
}
