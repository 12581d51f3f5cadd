//! Per-type schema descriptors built once from parsed field tags.

use crate::error::{OrmError, Result};
use crate::record::{FieldSpec, Record};
use crate::tag;

/// How one record field maps onto a node property.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldMapping {
    pub field: &'static str,
    pub property: String,
    pub generated: bool,
    pub index: bool,
    pub unique: bool,
}

/// Immutable mapping metadata for one record type.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SchemaDescriptor {
    type_name: &'static str,
    labels: Vec<String>,
    primary_key: Option<usize>,
    fields: Vec<FieldMapping>,
}

impl SchemaDescriptor {
    /// Build the descriptor for `T` from its declared field specs.
    pub fn build<T: Record>() -> Result<Self> {
        Self::from_specs(T::type_name(), T::field_specs())
    }

    /// Build a descriptor from raw field specs.
    ///
    /// Untagged fields are skipped. A second primary-key marker is rejected
    /// rather than silently replacing the first.
    pub fn from_specs(type_name: &'static str, specs: &[FieldSpec]) -> Result<Self> {
        let mut labels: Vec<String> = Vec::new();
        let mut primary_key = None;
        let mut fields = Vec::with_capacity(specs.len());

        for spec in specs {
            let Some(raw) = spec.tag else {
                continue;
            };
            let options = tag::parse_tag(raw);

            for key in [tag::LABEL, tag::TABLE] {
                if let Some(label) = options.get(key) {
                    if !label.is_empty() && !labels.contains(label) {
                        labels.push(label.clone());
                    }
                }
            }

            if options.contains_key(tag::PRIMARY) {
                if let Some(existing) = primary_key {
                    let existing: &FieldMapping = &fields[existing];
                    return Err(OrmError::InvalidSchema {
                        type_name,
                        reason: format!(
                            "fields {} and {} are both marked primary",
                            existing.field, spec.name
                        ),
                    });
                }
                primary_key = Some(fields.len());
            }

            let property = match options.get(tag::NAME) {
                Some(name) if !name.is_empty() => name.clone(),
                _ => spec.name.to_string(),
            };

            fields.push(FieldMapping {
                field: spec.name,
                property,
                generated: options.contains_key(tag::GENERATED),
                index: options.contains_key(tag::INDEX),
                unique: options.contains_key(tag::UNIQUE),
            });
        }

        if labels.is_empty() {
            labels.push(type_name.to_string());
        }

        tracing::debug!(
            type_name,
            labels = ?labels,
            fields = fields.len(),
            "Built schema descriptor"
        );

        Ok(Self {
            type_name,
            labels,
            primary_key,
            fields,
        })
    }

    pub fn type_name(&self) -> &'static str {
        self.type_name
    }

    /// The first declared label.
    pub fn label(&self) -> &str {
        &self.labels[0]
    }

    pub fn labels(&self) -> &[String] {
        &self.labels
    }

    pub fn fields(&self) -> &[FieldMapping] {
        &self.fields
    }

    pub fn field(&self, name: &str) -> Option<&FieldMapping> {
        self.fields.iter().find(|m| m.field == name)
    }

    /// Property name mapped to `field`, if the field is mapped.
    pub fn property_of(&self, field: &str) -> Option<&str> {
        self.field(field).map(|m| m.property.as_str())
    }

    pub fn primary_key(&self) -> Option<&FieldMapping> {
        self.primary_key.map(|i| &self.fields[i])
    }

    /// The primary key, or `MissingPrimaryKey` when none is declared.
    pub fn require_primary_key(&self) -> Result<&FieldMapping> {
        self.primary_key().ok_or_else(|| OrmError::MissingPrimaryKey {
            label: self.label().to_string(),
            reason: format!("{} declares no primary field", self.type_name),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::record::tests::{descriptor, Product};

    #[test]
    fn test_build_from_record() {
        let desc = descriptor();
        assert_eq!(desc.type_name(), "Product");
        assert_eq!(desc.label(), "Product");
        assert_eq!(desc.fields().len(), 5);
        assert_eq!(desc.primary_key().unwrap().field, "sku");
        assert_eq!(desc.property_of("name"), Some("product_name"));
        assert_eq!(desc.property_of("price"), Some("price"));
        assert_eq!(desc.property_of("note"), None);
        assert!(desc.field("id").unwrap().generated);
        assert!(!desc.primary_key().unwrap().generated);
        assert_eq!(SchemaDescriptor::build::<Product>().unwrap(), desc);
    }

    #[test]
    fn test_label_defaults_to_type_name() {
        let specs = [FieldSpec::new("code", Some("primary"))];
        let desc = SchemaDescriptor::from_specs("Warehouse", &specs).unwrap();
        assert_eq!(desc.labels(), ["Warehouse".to_string()]);
    }

    #[test]
    fn test_multiple_labels_and_table_synonym() {
        let specs = [
            FieldSpec::new("id", Some("primary;generated;label:Item")),
            FieldSpec::new("kind", Some("table:Stock;label:Item")),
        ];
        let desc = SchemaDescriptor::from_specs("Item", &specs).unwrap();
        assert_eq!(desc.labels(), ["Item".to_string(), "Stock".to_string()]);
        assert!(desc.primary_key().unwrap().generated);
    }

    #[test]
    fn test_duplicate_primary_key_is_rejected() {
        let specs = [
            FieldSpec::new("a", Some("primary")),
            FieldSpec::new("b", Some("primary")),
        ];
        let err = SchemaDescriptor::from_specs("Twice", &specs).unwrap_err();
        assert!(matches!(err, OrmError::InvalidSchema { type_name: "Twice", .. }));
    }

    #[test]
    fn test_missing_primary_key() {
        let specs = [FieldSpec::new("title", Some("name:title"))];
        let desc = SchemaDescriptor::from_specs("Note", &specs).unwrap();
        assert!(desc.primary_key().is_none());
        assert!(matches!(
            desc.require_primary_key(),
            Err(OrmError::MissingPrimaryKey { .. })
        ));
    }

    #[test]
    fn test_index_markers_are_carried() {
        let specs = [FieldSpec::new("email", Some("unique;index"))];
        let desc = SchemaDescriptor::from_specs("Account", &specs).unwrap();
        let email = desc.field("email").unwrap();
        assert!(email.unique);
        assert!(email.index);
    }
}
