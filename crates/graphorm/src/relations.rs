//! Batched relate/unrelate between two record types.

use graphorm_core::{cypher, record, Direction, OrmError, Record, Result};

use crate::client::GraphClient;
use crate::store::AccessMode;

/// One relation of type `rel_type` from `start` to `end`.
#[derive(Debug)]
pub struct Relation<'a, S, E> {
    pub start: &'a S,
    pub end: &'a E,
    pub rel_type: &'a str,
}

impl<'a, S, E> Relation<'a, S, E> {
    pub fn new(start: &'a S, end: &'a E, rel_type: &'a str) -> Self {
        Self {
            start,
            end,
            rel_type,
        }
    }
}

/// The one relationship type shared by the whole batch.
fn batch_rel_type<'a, S, E>(relations: &[Relation<'a, S, E>]) -> Result<&'a str> {
    let rel_type = relations[0].rel_type;
    if let Some(other) = relations.iter().find(|r| r.rel_type != rel_type) {
        return Err(OrmError::InvalidInput(format!(
            "relation batch mixes types {rel_type} and {}",
            other.rel_type
        )));
    }
    Ok(rel_type)
}

impl GraphClient {
    /// Merge `(start)-[:T]->(end)` for every pair, creating missing endpoints.
    pub async fn relate<S: Record, E: Record>(&self, relations: &[Relation<'_, S, E>]) -> Result<()> {
        self.relate_directed(Direction::Outgoing, relations).await
    }

    pub async fn relate_directed<S: Record, E: Record>(
        &self,
        direction: Direction,
        relations: &[Relation<'_, S, E>],
    ) -> Result<()> {
        if relations.is_empty() {
            return Ok(());
        }
        let rel_type = batch_rel_type(relations)?;
        let start = self.registry().get_or_build::<S>()?;
        let end = self.registry().get_or_build::<E>()?;

        let pairs = relations
            .iter()
            .map(|r| {
                Ok((
                    record::required_primary_key_value(&start, r.start)?,
                    record::required_primary_key_value(&end, r.end)?,
                ))
            })
            .collect::<Result<Vec<_>>>()?;

        tracing::debug!(
            rel_type,
            start = start.label(),
            end = end.label(),
            count = pairs.len(),
            "Relating nodes"
        );
        let statement = cypher::relate_batch(&start, &end, rel_type, direction, pairs)?;
        self.executor.run(statement, AccessMode::Write).await?;
        Ok(())
    }

    /// Delete `(start)-[:T]->(end)` for every pair. Endpoints are kept and
    /// pairs with no such relation are skipped.
    pub async fn unrelate<S: Record, E: Record>(
        &self,
        relations: &[Relation<'_, S, E>],
    ) -> Result<()> {
        self.unrelate_directed(Direction::Outgoing, relations).await
    }

    pub async fn unrelate_directed<S: Record, E: Record>(
        &self,
        direction: Direction,
        relations: &[Relation<'_, S, E>],
    ) -> Result<()> {
        if relations.is_empty() {
            return Ok(());
        }
        let rel_type = batch_rel_type(relations)?;
        let start = self.registry().get_or_build::<S>()?;
        let end = self.registry().get_or_build::<E>()?;

        let pairs = relations
            .iter()
            .map(|r| {
                Ok((
                    record::primary_key_value(&start, r.start)?,
                    record::primary_key_value(&end, r.end)?,
                ))
            })
            .collect::<Result<Vec<_>>>()?;

        tracing::debug!(rel_type, count = pairs.len(), "Unrelating nodes");
        let statement = cypher::unrelate_batch(&start, &end, rel_type, direction, pairs)?;
        self.executor.run(statement, AccessMode::Write).await?;
        Ok(())
    }
}
