//! Fluent reads over a [`Model`].

use graphorm_core::cypher::{self, COUNT_COLUMN};
use graphorm_core::{OrmError, PropertyBag, QuerySpec, Record, Result, Value};

use crate::model::Model;
use crate::store::Column;

/// A read under construction.
///
/// Every builder call consumes the query, so a finished query's predicates
/// cannot carry over into the next one. The first builder error is kept and
/// returned by the terminal call.
pub struct Query<'m, T: Record> {
    model: &'m Model<T>,
    spec: Result<QuerySpec>,
}

impl<'m, T: Record> Query<'m, T> {
    pub(crate) fn new(model: &'m Model<T>) -> Self {
        Self {
            model,
            spec: Ok(QuerySpec::new()),
        }
    }

    fn and_then(self, step: impl FnOnce(QuerySpec) -> Result<QuerySpec>) -> Self {
        Self {
            model: self.model,
            spec: self.spec.and_then(step),
        }
    }

    /// Equality on every non-zero mapped field of `record`.
    pub fn where_record(self, record: &T) -> Self {
        let model = self.model;
        self.and_then(|spec| spec.where_record(model.descriptor(), record))
    }

    /// A free-form predicate over `n` with its own parameters.
    pub fn where_raw(self, predicate: impl Into<String>, params: PropertyBag) -> Self {
        self.and_then(|spec| spec.where_raw(predicate, params))
    }

    /// Ascending order on a record field (or a mapped property name).
    pub fn order_by(self, field: &str) -> Self {
        self.ordered(field, false)
    }

    pub fn order_by_desc(self, field: &str) -> Self {
        self.ordered(field, true)
    }

    fn ordered(self, field: &str, descending: bool) -> Self {
        let model = self.model;
        let desc = model.descriptor();
        let property = desc
            .property_of(field)
            .or_else(|| {
                desc.fields()
                    .iter()
                    .find(|m| m.property == field)
                    .map(|m| m.property.as_str())
            })
            .map(str::to_string)
            .ok_or_else(|| {
                OrmError::InvalidInput(format!("{} has no mapped field {field}", desc.type_name()))
            });
        self.and_then(|spec| Ok(spec.order_by(property?, descending)))
    }

    pub fn skip(self, skip: u64) -> Self {
        self.and_then(|spec| Ok(spec.skip(skip)))
    }

    pub fn limit(self, limit: u64) -> Self {
        self.and_then(|spec| Ok(spec.limit(limit)))
    }

    // ── Terminals ────────────────────────────────────────────────

    pub async fn find(self) -> Result<Vec<T>> {
        let mut out = Vec::new();
        self.find_into(&mut out).await?;
        Ok(out)
    }

    /// Hydrate every matching node and append it to `out`.
    pub async fn find_into(self, out: &mut Vec<T>) -> Result<()> {
        let model = self.model;
        let statement = cypher::find(model.descriptor(), &self.spec?);
        let rows = model.read(statement).await?;

        tracing::debug!(label = model.descriptor().label(), rows = rows.len(), "Found nodes");
        out.reserve(rows.len());
        for row in &rows {
            out.push(model.hydrate(row)?);
        }
        Ok(())
    }

    /// The first match, or `NoRecordsFound`.
    pub async fn find_one(self) -> Result<T> {
        let label = self.model.descriptor().label().to_string();
        self.limit(1)
            .find()
            .await?
            .into_iter()
            .next()
            .ok_or(OrmError::NoRecordsFound { label })
    }

    /// Number of matching nodes. Order and paging are ignored.
    pub async fn count(self) -> Result<u64> {
        let model = self.model;
        let statement = cypher::count(model.descriptor(), &self.spec?);
        let rows = model.read(statement).await?;

        let total = rows.first().and_then(|row| row.get(COUNT_COLUMN));
        match total {
            Some(Column::Value(Value::Int(n))) => u64::try_from(*n).map_err(|_| {
                OrmError::UnexpectedResultShape(format!("negative count {n}"))
            }),
            Some(other) => Err(OrmError::UnexpectedResultShape(format!(
                "column {COUNT_COLUMN} is not an integer: {other:?}"
            ))),
            None => Err(OrmError::UnexpectedResultShape(format!(
                "count returned no {COUNT_COLUMN} column"
            ))),
        }
    }
}
