//! The record contract and the property-bag conversions built on it.
//!
//! A [`Record`] is normally produced by `#[derive(Record)]`, which turns each
//! `#[graph("...")]` field attribute into a [`FieldSpec`] and generates the
//! per-field accessors. Hand-written implementations work the same way.

use crate::coerce::CoerceError;
use crate::error::{OrmError, Result};
use crate::schema::SchemaDescriptor;
use crate::value::{PropertyBag, Value};

/// One declared field: its Rust name and its raw tag, if any.
///
/// Fields with `tag: None` are not mapped at all.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FieldSpec {
    pub name: &'static str,
    pub tag: Option<&'static str>,
}

impl FieldSpec {
    pub const fn new(name: &'static str, tag: Option<&'static str>) -> Self {
        Self { name, tag }
    }
}

/// A record type that maps onto graph nodes.
pub trait Record: Default + Send + Sync + 'static {
    /// The Rust type name; the default node label.
    fn type_name() -> &'static str;

    /// Declared fields in declaration order.
    fn field_specs() -> &'static [FieldSpec];

    /// Outbound value of `field`, or `None` when it holds its zero value or is unknown.
    fn field_value(&self, field: &str) -> std::result::Result<Option<Value>, CoerceError>;

    /// Outbound value of `field` without zero omission. Unknown fields are `Null`.
    fn raw_field_value(&self, field: &str) -> std::result::Result<Value, CoerceError>;

    /// Assign `field` from a store value. Unknown fields are ignored.
    fn set_field_value(&mut self, field: &str, value: Value)
        -> std::result::Result<(), CoerceError>;
}

/// Build the write bag for `record`: every mapped, non-generated, non-zero field.
pub fn to_property_bag<T: Record>(descriptor: &SchemaDescriptor, record: &T) -> Result<PropertyBag> {
    let mut bag = PropertyBag::new();
    for mapping in descriptor.fields().iter().filter(|m| !m.generated) {
        let value = record
            .field_value(mapping.field)
            .map_err(|e| OrmError::field_mismatch(mapping.field, e))?;
        if let Some(value) = value {
            bag.insert(mapping.property.clone(), value);
        }
    }
    Ok(bag)
}

/// Equality-filter bag for `record`: every mapped non-zero field, generated ones included.
pub fn to_filter_bag<T: Record>(descriptor: &SchemaDescriptor, record: &T) -> Result<PropertyBag> {
    let mut bag = PropertyBag::new();
    for mapping in descriptor.fields() {
        let value = record
            .field_value(mapping.field)
            .map_err(|e| OrmError::field_mismatch(mapping.field, e))?;
        if let Some(value) = value {
            bag.insert(mapping.property.clone(), value);
        }
    }
    Ok(bag)
}

/// Hydrate a fresh record from a property bag.
///
/// Properties missing from the bag leave the field at its default.
pub fn from_property_bag<T: Record>(descriptor: &SchemaDescriptor, bag: &PropertyBag) -> Result<T> {
    let mut record = T::default();
    for mapping in descriptor.fields() {
        if let Some(value) = bag.get(&mapping.property) {
            record
                .set_field_value(mapping.field, value.clone())
                .map_err(|e| OrmError::field_mismatch(mapping.field, e))?;
        }
    }
    Ok(record)
}

/// The primary-key value of `record`, bypassing zero omission.
pub fn primary_key_value<T: Record>(descriptor: &SchemaDescriptor, record: &T) -> Result<Value> {
    let pk = descriptor.require_primary_key()?;
    record
        .raw_field_value(pk.field)
        .map_err(|e| OrmError::field_mismatch(pk.field, e))
}

/// The primary-key value of `record`, which must not be the zero value.
pub fn required_primary_key_value<T: Record>(
    descriptor: &SchemaDescriptor,
    record: &T,
) -> Result<Value> {
    let pk = descriptor.require_primary_key()?;
    match record
        .field_value(pk.field)
        .map_err(|e| OrmError::field_mismatch(pk.field, e))?
    {
        Some(value) => Ok(value),
        None => Err(OrmError::MissingPrimaryKey {
            label: descriptor.label().to_string(),
            reason: format!("field {} holds its zero value", pk.field),
        }),
    }
}
