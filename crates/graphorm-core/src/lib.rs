//! graphorm-core: the store-agnostic half of the graphorm object-graph mapper.
//!
//! This crate turns a tagged record type into everything needed to talk to a
//! property-graph store, without ever touching a driver:
//! - Tag grammar parsing (`name:sku;primary;label:Product`)
//! - Schema descriptors and the descriptor registry
//! - The loosely-typed [`Value`] model and field coercion in both directions
//! - Parameterized, batch-oriented Cypher synthesis
//! - The immutable [`QuerySpec`] used by reads

pub mod coerce;
pub mod cypher;
pub mod error;
pub mod query;
pub mod record;
pub mod registry;
pub mod schema;
pub mod tag;
pub mod value;

pub use coerce::{CoerceError, FieldValue};
pub use cypher::{Direction, Statement};
pub use error::{OrmError, Result};
pub use query::{OrderKey, QuerySpec};
pub use record::{FieldSpec, Record};
pub use registry::Registry;
pub use schema::{FieldMapping, SchemaDescriptor};
pub use tag::{format_tag, parse_tag, TagOptions};
pub use value::{PropertyBag, Value};
