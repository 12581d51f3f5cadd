//! Connection settings.
//!
//! Loaded from (in priority order):
//! 1. Environment variables (`GRAPHORM__NEO4J__URI`, ...)
//! 2. The `[neo4j]` section of an optional config file
//! 3. Defaults

use std::time::Duration;

use serde::Deserialize;

use crate::client::GraphError;

/// Configuration for connecting to Neo4j.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct GraphConfig {
    pub uri: String,
    pub user: String,
    pub password: String,
    /// Target database; the server default when unset.
    pub database: Option<String>,
    pub max_connections: u32,
    pub fetch_size: usize,
    /// Applied to every write transaction. `0` disables the timeout.
    pub write_timeout_secs: u64,
}

impl Default for GraphConfig {
    fn default() -> Self {
        Self {
            uri: "bolt://localhost:7687".to_string(),
            user: "neo4j".to_string(),
            password: "graphorm-dev".to_string(),
            database: None,
            max_connections: 16,
            fetch_size: 256,
            write_timeout_secs: 30,
        }
    }
}

impl GraphConfig {
    /// Layer `<file_prefix>.{toml,json,yaml}` (optional) under `GRAPHORM__` env vars.
    pub fn load(file_prefix: &str) -> Result<Self, GraphError> {
        let cfg = ::config::Config::builder()
            .add_source(::config::File::with_name(file_prefix).required(false))
            .add_source(
                ::config::Environment::with_prefix("GRAPHORM")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()?;

        match cfg.get::<GraphConfig>("neo4j") {
            Ok(loaded) => Ok(loaded),
            Err(::config::ConfigError::NotFound(_)) => Ok(Self::default()),
            Err(e) => Err(e.into()),
        }
    }

    pub fn write_timeout(&self) -> Option<Duration> {
        (self.write_timeout_secs > 0).then(|| Duration::from_secs(self.write_timeout_secs))
    }
}
