//! The execution seam: everything that touches the store goes through
//! [`GraphStore`].

use std::sync::Arc;

use async_trait::async_trait;
use graphorm_core::{PropertyBag, Statement, Value};

use crate::client::GraphError;

/// Whether a statement may write.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AccessMode {
    Read,
    Write,
}

/// A node returned by the store.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct GraphNode {
    pub id: i64,
    pub labels: Vec<String>,
    pub properties: PropertyBag,
}

/// One decoded result column.
#[derive(Debug, Clone, PartialEq)]
pub enum Column {
    Node(GraphNode),
    Value(Value),
}

/// A result row with named columns in statement order.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Row {
    columns: Vec<(String, Column)>,
}

impl Row {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(mut self, name: impl Into<String>, column: Column) -> Self {
        self.columns.push((name.into(), column));
        self
    }

    pub fn get(&self, name: &str) -> Option<&Column> {
        self.columns
            .iter()
            .find(|(column, _)| column == name)
            .map(|(_, value)| value)
    }
}

/// Runs one parameterized statement in its own transaction.
///
/// Implementations must release the transaction on every exit path before
/// returning. Writes are committed on success and rolled back on failure,
/// including a write that outlives the store's write timeout.
#[async_trait]
pub trait GraphStore: Send + Sync {
    async fn run(&self, statement: Statement, access: AccessMode) -> Result<Vec<Row>, GraphError>;
}

/// A store handle that logs every statement it runs.
#[derive(Clone)]
pub(crate) struct Executor {
    store: Arc<dyn GraphStore>,
}

impl Executor {
    pub(crate) fn new(store: Arc<dyn GraphStore>) -> Self {
        Self { store }
    }

    pub(crate) async fn run(
        &self,
        statement: Statement,
        access: AccessMode,
    ) -> Result<Vec<Row>, GraphError> {
        tracing::debug!(
            query = %statement.text,
            params = ?statement.params,
            ?access,
            "Running statement"
        );
        self.store.run(statement, access).await
    }
}
