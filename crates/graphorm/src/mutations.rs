//! Batched write operations.
//!
//! Each call synthesizes one statement and runs it in one write transaction.
//! Empty batches return immediately without contacting the store.

use graphorm_core::{cypher, record, OrmError, PropertyBag, Record, Result, Value};

use crate::model::Model;

impl<T: Record> Model<T> {
    // ── Creates ──────────────────────────────────────────────────

    pub async fn create_one(&self, record: &T) -> Result<()> {
        self.create_batch(std::slice::from_ref(record)).await
    }

    /// Insert one new node per record. Generated primary keys are assigned
    /// by the store.
    pub async fn create_batch(&self, records: &[T]) -> Result<()> {
        if records.is_empty() {
            return Ok(());
        }
        let desc = self.descriptor();
        let bags = records
            .iter()
            .map(|r| record::to_property_bag(desc, r))
            .collect::<Result<Vec<_>>>()?;

        tracing::debug!(label = desc.label(), count = bags.len(), "Creating nodes");
        self.write(cypher::create_batch(desc, bags)).await
    }

    // ── Merges ───────────────────────────────────────────────────

    pub async fn merge_one(&self, record: &T) -> Result<()> {
        self.merge_batch(std::slice::from_ref(record)).await
    }

    /// Match-or-create each record by primary key, then overwrite its
    /// non-zero properties. Zero-valued fields leave stored values untouched.
    pub async fn merge_batch(&self, records: &[T]) -> Result<()> {
        if records.is_empty() {
            return Ok(());
        }
        let desc = self.descriptor();
        let pk = desc.require_primary_key()?;
        let bags = records
            .iter()
            .map(|r| {
                let mut bag = record::to_property_bag(desc, r)?;
                // Generated keys are left out of write bags but MERGE still matches on them.
                bag.insert(pk.property.clone(), record::required_primary_key_value(desc, r)?);
                Ok(bag)
            })
            .collect::<Result<Vec<_>>>()?;

        tracing::debug!(label = desc.label(), count = bags.len(), "Merging nodes");
        self.write(cypher::merge_batch(desc, bags)?).await
    }

    // ── Updates ──────────────────────────────────────────────────

    /// Overwrite the non-zero properties of the node matching `record`'s key.
    ///
    /// No matching node is not an error.
    pub async fn update(&self, record: &T) -> Result<()> {
        let desc = self.descriptor();
        let pk = record::required_primary_key_value(desc, record)?;
        let props = record::to_property_bag(desc, record)?;
        self.write(cypher::update(desc, pk, props)?).await
    }

    /// Like [`update`](Self::update), but also removes the properties of
    /// the named fields, whatever the record holds for them.
    pub async fn update_unsetting(&self, record: &T, fields: &[&str]) -> Result<()> {
        let desc = self.descriptor();
        let pk = record::required_primary_key_value(desc, record)?;
        let mut props: PropertyBag = record::to_property_bag(desc, record)?;

        for field in fields {
            let mapping = desc.field(field).ok_or_else(|| {
                OrmError::InvalidInput(format!("{} has no mapped field {field}", desc.type_name()))
            })?;
            if desc.primary_key().is_some_and(|key| key.field == mapping.field) {
                return Err(OrmError::InvalidInput(format!(
                    "primary key field {field} cannot be unset"
                )));
            }
            props.insert(mapping.property.clone(), Value::Null);
        }

        self.write(cypher::update(desc, pk, props)?).await
    }

    // ── Deletes ──────────────────────────────────────────────────

    pub async fn delete_one(&self, record: &T) -> Result<()> {
        self.delete_batch(std::slice::from_ref(record)).await
    }

    /// Detach-delete every node whose key matches one of `records`.
    /// Keys with no stored node are skipped.
    pub async fn delete_batch(&self, records: &[T]) -> Result<()> {
        if records.is_empty() {
            return Ok(());
        }
        let desc = self.descriptor();
        let pks = records
            .iter()
            .map(|r| record::primary_key_value(desc, r))
            .collect::<Result<Vec<_>>>()?;

        tracing::debug!(label = desc.label(), count = pks.len(), "Deleting nodes");
        self.write(cypher::delete_batch(desc, pks)?).await
    }
}
