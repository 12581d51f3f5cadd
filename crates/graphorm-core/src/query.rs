//! Immutable read specification.
//!
//! Each builder call consumes the value and returns a new one, so predicates
//! from a finished query can never leak into the next.

use crate::error::{OrmError, Result};
use crate::record::{self, Record};
use crate::schema::SchemaDescriptor;
use crate::value::PropertyBag;

/// One `ORDER BY` key.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OrderKey {
    pub property: String,
    pub descending: bool,
}

/// Predicates, parameters, ordering and paging for a find.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct QuerySpec {
    conditions: Vec<String>,
    params: PropertyBag,
    order_by: Vec<OrderKey>,
    skip: Option<u64>,
    limit: Option<u64>,
}

impl QuerySpec {
    pub fn new() -> Self {
        Self::default()
    }

    /// AND an equality predicate for every non-zero mapped field of `record`.
    ///
    /// Parameters are named `<property>_<n>`; `n` starts at the number of
    /// parameters already bound and is bumped until the name is free.
    pub fn where_record<T: Record>(mut self, descriptor: &SchemaDescriptor, record: &T) -> Result<Self> {
        let bag = record::to_filter_bag(descriptor, record)?;
        if bag.is_empty() {
            return Ok(self);
        }

        let mut predicates = Vec::with_capacity(bag.len());
        for (property, value) in bag {
            let name = self.free_param_name(&property);
            predicates.push(format!(
                "n.{} = ${name}",
                crate::cypher::ident(&property)
            ));
            self.params.insert(name, value);
        }
        self.conditions.push(predicates.join(" AND "));
        Ok(self)
    }

    /// AND a free-form predicate with its own parameters.
    ///
    /// A parameter name that is already bound is rejected.
    pub fn where_raw(mut self, predicate: impl Into<String>, params: PropertyBag) -> Result<Self> {
        if let Some(taken) = params.keys().find(|k| self.params.contains_key(*k)) {
            return Err(OrmError::InvalidInput(format!(
                "query parameter ${taken} is already bound"
            )));
        }
        self.conditions.push(predicate.into());
        self.params.extend(params);
        Ok(self)
    }

    pub fn order_by(mut self, property: impl Into<String>, descending: bool) -> Self {
        self.order_by.push(OrderKey {
            property: property.into(),
            descending,
        });
        self
    }

    pub fn skip(mut self, skip: u64) -> Self {
        self.skip = Some(skip);
        self
    }

    pub fn limit(mut self, limit: u64) -> Self {
        self.limit = Some(limit);
        self
    }

    pub fn conditions(&self) -> &[String] {
        &self.conditions
    }

    pub fn params(&self) -> &PropertyBag {
        &self.params
    }

    pub fn order_by_keys(&self) -> &[OrderKey] {
        &self.order_by
    }

    pub fn skip_count(&self) -> Option<u64> {
        self.skip
    }

    pub fn limit_count(&self) -> Option<u64> {
        self.limit
    }

    fn free_param_name(&self, property: &str) -> String {
        let stem: String = property
            .chars()
            .map(|c| if c.is_ascii_alphanumeric() { c } else { '_' })
            .collect();
        let mut n = self.params.len();
        loop {
            let name = format!("{stem}_{n}");
            if !self.params.contains_key(&name) {
                return name;
            }
            n += 1;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::record::tests::{descriptor, Product};
    use crate::value::Value;

    #[test]
    fn test_where_record_binds_non_zero_fields() {
        let desc = descriptor();
        let spec = QuerySpec::new()
            .where_record(
                &desc,
                &Product {
                    sku: "P1".into(),
                    price: 2.5,
                    ..Default::default()
                },
            )
            .unwrap();

        assert_eq!(spec.conditions(), ["n.price = $price_0 AND n.sku = $sku_1"]);
        assert_eq!(spec.params()["price_0"], Value::Float(2.5));
        assert_eq!(spec.params()["sku_1"], Value::from("P1"));
    }

    #[test]
    fn test_where_record_with_zero_record_is_a_no_op() {
        let spec = QuerySpec::new()
            .where_record(&descriptor(), &Product::default())
            .unwrap();
        assert_eq!(spec, QuerySpec::new());
    }

    #[test]
    fn test_chained_filters_do_not_clobber() {
        let desc = descriptor();
        let a = Product {
            sku: "A".into(),
            ..Default::default()
        };
        let b = Product {
            sku: "B".into(),
            ..Default::default()
        };
        let spec = QuerySpec::new()
            .where_record(&desc, &a)
            .unwrap()
            .where_record(&desc, &b)
            .unwrap();
        assert_eq!(spec.conditions().len(), 2);
        assert_eq!(spec.params().len(), 2);
        assert_eq!(spec.params()["sku_0"], Value::from("A"));
        assert_eq!(spec.params()["sku_1"], Value::from("B"));
    }

    #[test]
    fn test_generated_names_skip_raw_params() {
        let mut raw = PropertyBag::new();
        raw.insert("sku_1".into(), Value::from("X"));
        let spec = QuerySpec::new()
            .where_raw("n.sku <> $sku_1", raw)
            .unwrap()
            .where_record(
                &descriptor(),
                &Product {
                    sku: "Y".into(),
                    ..Default::default()
                },
            )
            .unwrap();
        assert_eq!(spec.params()["sku_1"], Value::from("X"));
        assert_eq!(spec.params()["sku_2"], Value::from("Y"));
    }

    #[test]
    fn test_where_raw_rejects_rebinding() {
        let mut params = PropertyBag::new();
        params.insert("pk".into(), Value::Int(1));
        let spec = QuerySpec::new().where_raw("n.a = $pk", params.clone()).unwrap();
        assert!(matches!(
            spec.where_raw("n.b = $pk", params),
            Err(OrmError::InvalidInput(_))
        ));
    }

    #[test]
    fn test_paging_and_order() {
        let spec = QuerySpec::new().order_by("price", true).skip(4).limit(2);
        assert_eq!(
            spec.order_by_keys(),
            [OrderKey {
                property: "price".into(),
                descending: true
            }]
        );
        assert_eq!(spec.skip_count(), Some(4));
        assert_eq!(spec.limit_count(), Some(2));
    }
}
