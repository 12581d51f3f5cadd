//! graphorm: typed object-graph mapping for Neo4j.
//!
//! Describe a record type once with `#[graph("...")]` field tags, then issue
//! batched create/merge/update/delete/find/relate operations with typed values
//! instead of hand-written Cypher.
//!
//! ```rust,ignore
//! use graphorm::{GraphClient, GraphConfig, Record};
//!
//! #[derive(Debug, Default, Record)]
//! struct Product {
//!     #[graph("name:sku;primary;label:Product")]
//!     sku: String,
//!     #[graph("name:product_name")]
//!     name: String,
//!     #[graph]
//!     price: f64,
//! }
//!
//! let client = GraphClient::connect(&GraphConfig::default()).await?;
//! let products = client.model::<Product>()?;
//! products.merge_one(&Product { sku: "P1001".into(), price: 2.0, ..Default::default() }).await?;
//! let cheap = products.query().where_raw("n.price < $max", params).find().await?;
//! ```

// Lets `#[derive(Record)]` expand to `::graphorm::..` paths inside this crate's own tests.
extern crate self as graphorm;

pub mod client;
pub mod config;
pub mod model;
pub mod mutations;
pub mod neo4j;
pub mod queries;
pub mod relations;
pub mod store;

pub use client::{GraphClient, GraphError};
pub use config::GraphConfig;
pub use model::Model;
pub use neo4j::Neo4jStore;
pub use queries::Query;
pub use relations::Relation;
pub use store::{AccessMode, Column, GraphNode, GraphStore, Row};

pub use graphorm_core::{
    CoerceError, Direction, FieldMapping, FieldSpec, FieldValue, OrderKey, OrmError, PropertyBag,
    QuerySpec, Record, Registry, Result, SchemaDescriptor, Statement, Value,
};
pub use graphorm_derive::Record;
