//! Typed handle for one record type.

use std::marker::PhantomData;
use std::sync::Arc;

use graphorm_core::cypher::{ident, NODE_VAR};
use graphorm_core::{
    record, OrmError, PropertyBag, Record, Result, SchemaDescriptor, Statement, Value,
};

use crate::queries::Query;
use crate::store::{AccessMode, Column, Executor, Row};

/// Write and read operations for records of type `T`.
///
/// Obtained from [`GraphClient::model`](crate::GraphClient::model). Clone is cheap.
pub struct Model<T> {
    executor: Executor,
    descriptor: Arc<SchemaDescriptor>,
    _record: PhantomData<fn() -> T>,
}

impl<T> Clone for Model<T> {
    fn clone(&self) -> Self {
        Self {
            executor: self.executor.clone(),
            descriptor: Arc::clone(&self.descriptor),
            _record: PhantomData,
        }
    }
}

impl<T: Record> Model<T> {
    pub(crate) fn new(executor: Executor, descriptor: Arc<SchemaDescriptor>) -> Self {
        Self {
            executor,
            descriptor,
            _record: PhantomData,
        }
    }

    pub fn descriptor(&self) -> &SchemaDescriptor {
        &self.descriptor
    }

    /// Start an empty read.
    pub fn query(&self) -> Query<'_, T> {
        Query::new(self)
    }

    /// Fetch the node whose primary key equals `key`.
    pub async fn find_by_primary_key(&self, key: impl Into<Value>) -> Result<T> {
        let pk = self.descriptor.require_primary_key()?;
        let predicate = format!("{NODE_VAR}.{} = $pk", ident(&pk.property));
        let mut params = PropertyBag::new();
        params.insert("pk".to_string(), key.into());
        self.query().where_raw(predicate, params).find_one().await
    }

    pub(crate) async fn write(&self, statement: Statement) -> Result<()> {
        self.executor.run(statement, AccessMode::Write).await?;
        Ok(())
    }

    pub(crate) async fn read(&self, statement: Statement) -> Result<Vec<Row>> {
        Ok(self.executor.run(statement, AccessMode::Read).await?)
    }

    /// Hydrate a fresh record from the node in a row's `n` column.
    pub(crate) fn hydrate(&self, row: &Row) -> Result<T> {
        match row.get(NODE_VAR) {
            Some(Column::Node(node)) => record::from_property_bag(&self.descriptor, &node.properties),
            Some(Column::Value(value)) => Err(OrmError::UnexpectedResultShape(format!(
                "column {NODE_VAR} holds a {} value, not a node",
                value.kind_name()
            ))),
            None => Err(OrmError::UnexpectedResultShape(format!(
                "row has no column {NODE_VAR}"
            ))),
        }
    }
}
