//! Neo4j connection management and the shared graph client.

use std::sync::Arc;

use graphorm_core::{OrmError, Record, Registry};
use neo4rs::{ConfigBuilder, Graph};

use crate::config::GraphConfig;
use crate::model::Model;
use crate::neo4j::Neo4jStore;
use crate::store::{Executor, GraphStore};

/// Errors from the store side of an operation.
#[derive(Debug, thiserror::Error)]
pub enum GraphError {
    #[error("Neo4j connection error: {0}")]
    Connection(String),

    #[error("Neo4j query error: {0}")]
    Query(#[from] neo4rs::Error),

    #[error("Failed to decode result: {0}")]
    Decode(String),

    #[error("Write transaction timed out after {seconds}s")]
    Timeout { seconds: u64 },

    #[error("Configuration error: {0}")]
    Config(#[from] ::config::ConfigError),
}

impl From<GraphError> for OrmError {
    fn from(err: GraphError) -> Self {
        OrmError::StoreOperationFailed(Box::new(err))
    }
}

/// Thread-safe entry point: a store plus the descriptor registry every
/// [`Model`] it hands out shares.
///
/// Clone is cheap (inner Arcs).
#[derive(Clone)]
pub struct GraphClient {
    pub(crate) executor: Executor,
    registry: Arc<Registry>,
}

impl GraphClient {
    /// Connect to Neo4j with the given configuration.
    pub async fn connect(config: &GraphConfig) -> Result<Self, GraphError> {
        let mut builder = ConfigBuilder::default()
            .uri(&config.uri)
            .user(&config.user)
            .password(&config.password)
            .max_connections(config.max_connections as usize)
            .fetch_size(config.fetch_size);
        if let Some(database) = config.database.as_deref() {
            builder = builder.db(database);
        }
        let neo_config = builder
            .build()
            .map_err(|e| GraphError::Connection(e.to_string()))?;

        let graph = Graph::connect(neo_config)
            .await
            .map_err(|e| GraphError::Connection(e.to_string()))?;

        tracing::info!(
            uri = %config.uri,
            database = config.database.as_deref().unwrap_or("default"),
            "Connected to Neo4j"
        );
        Ok(Self::with_store(Arc::new(Neo4jStore::new(
            graph,
            config.write_timeout(),
        ))))
    }

    /// Build a client over any store implementation.
    pub fn with_store(store: Arc<dyn GraphStore>) -> Self {
        Self {
            executor: Executor::new(store),
            registry: Arc::new(Registry::new()),
        }
    }

    /// Typed operations for `T`, building its descriptor on first use.
    pub fn model<T: Record>(&self) -> Result<Model<T>, OrmError> {
        let descriptor = self.registry.get_or_build::<T>()?;
        Ok(Model::new(self.executor.clone(), descriptor))
    }

    pub fn registry(&self) -> &Arc<Registry> {
        &self.registry
    }
}
