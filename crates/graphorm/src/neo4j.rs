//! [`GraphStore`] over a pooled `neo4rs::Graph`.

use std::collections::HashMap;
use std::time::Duration;

use async_trait::async_trait;
use graphorm_core::{PropertyBag, Statement, Value};
use neo4rs::{BoltMap, BoltNull, BoltString, BoltType, Graph, Query, Txn};

use crate::client::GraphError;
use crate::store::{AccessMode, Column, GraphNode, GraphStore, Row};

/// The production store. Clone is cheap (inner Arc).
#[derive(Clone)]
pub struct Neo4jStore {
    graph: Graph,
    write_timeout: Option<Duration>,
}

impl Neo4jStore {
    /// `write_timeout` bounds each write statement; `None` disables it.
    pub fn new(graph: Graph, write_timeout: Option<Duration>) -> Self {
        Self {
            graph,
            write_timeout,
        }
    }

    async fn write(&self, query: Query) -> Result<(), GraphError> {
        let txn = self.graph.start_txn().await?;
        write_in(txn, query, self.write_timeout).await
    }

    async fn read(&self, query: Query, columns: &[String]) -> Result<Vec<Row>, GraphError> {
        let mut stream = self.graph.execute(query).await?;
        let mut rows = Vec::new();
        while let Some(row) = stream.next().await? {
            rows.push(decode_row(&row, columns)?);
        }
        Ok(rows)
    }
}

#[async_trait]
impl GraphStore for Neo4jStore {
    async fn run(&self, statement: Statement, access: AccessMode) -> Result<Vec<Row>, GraphError> {
        let columns = statement.columns.clone();
        let query = to_query(statement);
        match access {
            AccessMode::Write => self.write(query).await.map(|()| Vec::new()),
            AccessMode::Read => self.read(query, &columns).await,
        }
    }
}

// ── Write transactions ───────────────────────────────────────────

/// The transaction surface a write needs.
#[async_trait]
pub(crate) trait WriteTxn: Send + Sized {
    async fn run(&mut self, query: Query) -> Result<(), neo4rs::Error>;
    async fn commit(self) -> Result<(), neo4rs::Error>;
    async fn rollback(self) -> Result<(), neo4rs::Error>;
}

#[async_trait]
impl WriteTxn for Txn {
    async fn run(&mut self, query: Query) -> Result<(), neo4rs::Error> {
        Txn::run(self, query).await
    }

    async fn commit(self) -> Result<(), neo4rs::Error> {
        Txn::commit(self).await
    }

    async fn rollback(self) -> Result<(), neo4rs::Error> {
        Txn::rollback(self).await
    }
}

/// Run `query` in `txn`. Commits on success; rolls back on failure or when
/// the statement outlives `timeout`.
pub(crate) async fn write_in<T: WriteTxn>(
    mut txn: T,
    query: Query,
    timeout: Option<Duration>,
) -> Result<(), GraphError> {
    let outcome = match timeout {
        Some(limit) => match tokio::time::timeout(limit, txn.run(query)).await {
            Ok(result) => result.map_err(GraphError::from),
            Err(_) => Err(GraphError::Timeout {
                seconds: limit.as_secs(),
            }),
        },
        None => txn.run(query).await.map_err(GraphError::from),
    };

    if let Err(err) = outcome {
        tracing::warn!(error = %err, "Write failed, rolling back transaction");
        if let Err(rollback) = txn.rollback().await {
            tracing::warn!(error = %rollback, "Rollback failed");
        }
        return Err(err);
    }
    txn.commit().await?;
    Ok(())
}

// ── Outbound ─────────────────────────────────────────────────────

fn to_query(statement: Statement) -> Query {
    statement
        .params
        .into_iter()
        .fold(neo4rs::query(&statement.text), |q, (key, value)| {
            q.param(&key, to_bolt(value))
        })
}

/// Convert a property value into the driver's wire type.
pub fn to_bolt(value: Value) -> BoltType {
    match value {
        Value::Null => BoltType::Null(BoltNull),
        Value::Bool(b) => b.into(),
        Value::Int(i) => i.into(),
        Value::Float(f) => f.into(),
        Value::String(s) => s.into(),
        Value::List(items) => items.into_iter().map(to_bolt).collect::<Vec<_>>().into(),
        Value::Map(bag) => {
            let value: HashMap<BoltString, BoltType> = bag
                .into_iter()
                .map(|(key, value)| (BoltString::from(key), to_bolt(value)))
                .collect();
            BoltType::Map(BoltMap { value })
        }
    }
}

// ── Inbound ──────────────────────────────────────────────────────

fn decode_row(row: &neo4rs::Row, columns: &[String]) -> Result<Row, GraphError> {
    columns.iter().try_fold(Row::new(), |decoded, name| {
        Ok(decoded.with(name.as_str(), decode_column(row, name)?))
    })
}

fn decode_column(row: &neo4rs::Row, name: &str) -> Result<Column, GraphError> {
    if let Ok(node) = row.get::<neo4rs::Node>(name) {
        return decode_node(&node).map(Column::Node);
    }
    row.get::<serde_json::Value>(name)
        .map(|json| Column::Value(Value::from(json)))
        .map_err(|e| GraphError::Decode(format!("column {name}: {e}")))
}

fn decode_node(node: &neo4rs::Node) -> Result<GraphNode, GraphError> {
    let mut properties = PropertyBag::new();
    for key in node.keys() {
        let json: serde_json::Value = node
            .get(key)
            .map_err(|e| GraphError::Decode(format!("property {key}: {e}")))?;
        properties.insert(key.to_string(), Value::from(json));
    }
    Ok(GraphNode {
        id: node.id(),
        labels: node.labels().into_iter().map(str::to_string).collect(),
        properties,
    })
}
