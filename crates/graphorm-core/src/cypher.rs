//! Cypher synthesis for batched writes and filtered reads.
//!
//! Every statement is parameterized: caller data only ever travels in
//! [`Statement::params`]. Labels, property names and relationship types come
//! from descriptors or the caller and are quoted with back-ticks unless they
//! are plain identifiers.

use std::borrow::Cow;

use crate::error::{OrmError, Result};
use crate::query::QuerySpec;
use crate::schema::SchemaDescriptor;
use crate::value::{PropertyBag, Value};

/// Node variable used by every read statement.
pub const NODE_VAR: &str = "n";
/// Column alias of count queries.
pub const COUNT_COLUMN: &str = "total";

/// A query text plus its bound parameters and the columns it returns.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Statement {
    pub text: String,
    pub params: PropertyBag,
    pub columns: Vec<String>,
}

impl Statement {
    pub fn new(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            ..Default::default()
        }
    }

    pub fn param(mut self, key: &str, value: impl Into<Value>) -> Self {
        self.params.insert(key.to_string(), value.into());
        self
    }
}

/// Direction of a relationship relative to the start record.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Direction {
    /// `(a)-[:T]->(b)`
    #[default]
    Outgoing,
    /// `(a)<-[:T]-(b)`
    Incoming,
    /// `(a)-[:T]-(b)`; matches either direction.
    Both,
}

impl Direction {
    fn pattern(self, var: &str, rel_type: &str) -> String {
        match self {
            Self::Outgoing => format!("-[{var}:{rel_type}]->"),
            Self::Incoming => format!("<-[{var}:{rel_type}]-"),
            Self::Both => format!("-[{var}:{rel_type}]-"),
        }
    }
}

/// Quote `name` for use as a label, property key or relationship type.
pub fn ident(name: &str) -> Cow<'_, str> {
    let mut chars = name.chars();
    let plain = chars
        .next()
        .is_some_and(|c| c.is_ascii_alphabetic() || c == '_')
        && chars.all(|c| c.is_ascii_alphanumeric() || c == '_');
    if plain {
        Cow::Borrowed(name)
    } else {
        Cow::Owned(format!("`{}`", name.replace('`', "``")))
    }
}

/// `:A:B` for all of the descriptor's labels.
pub fn label_expr(descriptor: &SchemaDescriptor) -> String {
    descriptor
        .labels()
        .iter()
        .map(|label| format!(":{}", ident(label)))
        .collect()
}

fn primary_property(descriptor: &SchemaDescriptor) -> Result<String> {
    Ok(ident(&descriptor.require_primary_key()?.property).into_owned())
}

fn wrap_props(bags: Vec<PropertyBag>) -> Value {
    Value::List(
        bags.into_iter()
            .map(|props| {
                let mut element = PropertyBag::new();
                element.insert("props".to_string(), Value::Map(props));
                Value::Map(element)
            })
            .collect(),
    )
}

// ── Writes ───────────────────────────────────────────────────────

/// `UNWIND $nodes AS node CREATE (n:L) SET n += node.props`, plus store-side
/// id assignment when the primary key is generated.
pub fn create_batch(descriptor: &SchemaDescriptor, bags: Vec<PropertyBag>) -> Statement {
    let mut text = format!(
        "UNWIND $nodes AS node CREATE (n{}) SET n += node.props",
        label_expr(descriptor)
    );
    if let Some(pk) = descriptor.primary_key().filter(|pk| pk.generated) {
        let prop = ident(&pk.property);
        text.push_str(&format!(" SET n.{prop} = coalesce(n.{prop}, randomUUID())"));
    }
    Statement::new(text).param("nodes", wrap_props(bags))
}

/// `UNWIND $nodes AS node MERGE (n:L {pk: node.props.pk}) SET n += node.props`.
///
/// Every bag must carry a non-null primary-key property.
pub fn merge_batch(descriptor: &SchemaDescriptor, bags: Vec<PropertyBag>) -> Result<Statement> {
    let pk = descriptor.require_primary_key()?;
    if let Some(position) = bags
        .iter()
        .position(|bag| bag.get(&pk.property).map_or(true, Value::is_null))
    {
        return Err(OrmError::MissingPrimaryKey {
            label: descriptor.label().to_string(),
            reason: format!("batch element {position} has no value for {}", pk.field),
        });
    }

    let prop = ident(&pk.property);
    let text = format!(
        "UNWIND $nodes AS node MERGE (n{} {{{prop}: node.props.{prop}}}) SET n += node.props",
        label_expr(descriptor)
    );
    Ok(Statement::new(text).param("nodes", wrap_props(bags)))
}

/// `MATCH (n:L {pk: $pk}) SET n += $props`.
pub fn update(descriptor: &SchemaDescriptor, pk: Value, props: PropertyBag) -> Result<Statement> {
    let prop = primary_property(descriptor)?;
    let text = format!(
        "MATCH (n{} {{{prop}: $pk}}) SET n += $props",
        label_expr(descriptor)
    );
    Ok(Statement::new(text)
        .param("pk", pk)
        .param("props", Value::Map(props)))
}

/// `UNWIND $pks AS pk MATCH (n:L) WHERE n.pk = pk DETACH DELETE n`.
pub fn delete_batch(descriptor: &SchemaDescriptor, pks: Vec<Value>) -> Result<Statement> {
    let prop = primary_property(descriptor)?;
    let text = format!(
        "UNWIND $pks AS pk MATCH (n{}) WHERE n.{prop} = pk DETACH DELETE n",
        label_expr(descriptor)
    );
    Ok(Statement::new(text).param("pks", Value::List(pks)))
}

fn relation_params(pairs: Vec<(Value, Value)>) -> Value {
    Value::List(
        pairs
            .into_iter()
            .map(|(start, end)| {
                let mut element = PropertyBag::new();
                element.insert("startVal".to_string(), start);
                element.insert("endVal".to_string(), end);
                Value::Map(element)
            })
            .collect(),
    )
}

fn checked_rel_type(rel_type: &str) -> Result<Cow<'_, str>> {
    if rel_type.trim().is_empty() {
        return Err(OrmError::InvalidInput(
            "relationship type must not be empty".to_string(),
        ));
    }
    Ok(ident(rel_type))
}

/// Locate-or-create both endpoints by primary key, then merge the relation.
pub fn relate_batch(
    start: &SchemaDescriptor,
    end: &SchemaDescriptor,
    rel_type: &str,
    direction: Direction,
    pairs: Vec<(Value, Value)>,
) -> Result<Statement> {
    let start_pk = primary_property(start)?;
    let end_pk = primary_property(end)?;
    let rel_type = checked_rel_type(rel_type)?;
    let text = format!(
        "UNWIND $rels AS rel \
         MERGE (a{} {{{start_pk}: rel.startVal}}) \
         MERGE (b{} {{{end_pk}: rel.endVal}}) \
         MERGE (a){}(b)",
        label_expr(start),
        label_expr(end),
        direction.pattern("", &rel_type),
    );
    Ok(Statement::new(text).param("rels", relation_params(pairs)))
}

/// Remove the relation between existing endpoints; missing pairs are skipped.
pub fn unrelate_batch(
    start: &SchemaDescriptor,
    end: &SchemaDescriptor,
    rel_type: &str,
    direction: Direction,
    pairs: Vec<(Value, Value)>,
) -> Result<Statement> {
    let start_pk = primary_property(start)?;
    let end_pk = primary_property(end)?;
    let rel_type = checked_rel_type(rel_type)?;
    let text = format!(
        "UNWIND $rels AS rel \
         MATCH (a{} {{{start_pk}: rel.startVal}}){}(b{} {{{end_pk}: rel.endVal}}) \
         DELETE r",
        label_expr(start),
        direction.pattern("r", &rel_type),
        label_expr(end),
    );
    Ok(Statement::new(text).param("rels", relation_params(pairs)))
}

// ── Reads ────────────────────────────────────────────────────────

fn match_where(descriptor: &SchemaDescriptor, spec: &QuerySpec) -> String {
    let mut text = format!("MATCH ({NODE_VAR}{})", label_expr(descriptor));
    if !spec.conditions().is_empty() {
        let predicates = spec
            .conditions()
            .iter()
            .map(|c| format!("({c})"))
            .collect::<Vec<_>>()
            .join(" AND ");
        text.push_str(" WHERE ");
        text.push_str(&predicates);
    }
    text
}

/// `MATCH (n:L) [WHERE ..] RETURN n [ORDER BY ..] [SKIP ..] [LIMIT ..]`.
pub fn find(descriptor: &SchemaDescriptor, spec: &QuerySpec) -> Statement {
    let mut text = match_where(descriptor, spec);
    text.push_str(&format!(" RETURN {NODE_VAR}"));

    if !spec.order_by_keys().is_empty() {
        let keys = spec
            .order_by_keys()
            .iter()
            .map(|key| {
                let direction = if key.descending { "DESC" } else { "ASC" };
                format!("{NODE_VAR}.{} {direction}", ident(&key.property))
            })
            .collect::<Vec<_>>()
            .join(", ");
        text.push_str(" ORDER BY ");
        text.push_str(&keys);
    }
    if let Some(skip) = spec.skip_count() {
        text.push_str(&format!(" SKIP {skip}"));
    }
    if let Some(limit) = spec.limit_count() {
        text.push_str(&format!(" LIMIT {limit}"));
    }

    Statement {
        text,
        params: spec.params().clone(),
        columns: vec![NODE_VAR.to_string()],
    }
}

/// `MATCH (n:L) [WHERE ..] RETURN count(n) AS total`.
pub fn count(descriptor: &SchemaDescriptor, spec: &QuerySpec) -> Statement {
    let mut text = match_where(descriptor, spec);
    text.push_str(&format!(" RETURN count({NODE_VAR}) AS {COUNT_COLUMN}"));
    Statement {
        text,
        params: spec.params().clone(),
        columns: vec![COUNT_COLUMN.to_string()],
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::record::tests::descriptor;
    use crate::record::FieldSpec;

    fn bag(pairs: &[(&str, Value)]) -> PropertyBag {
        pairs
            .iter()
            .map(|(k, v)| ((*k).to_string(), v.clone()))
            .collect()
    }

    fn generated_desc() -> SchemaDescriptor {
        let specs = [
            FieldSpec::new("id", Some("primary;generated;label:Order")),
            FieldSpec::new("total", Some("")),
        ];
        SchemaDescriptor::from_specs("Order", &specs).unwrap()
    }

    fn keyless_desc() -> SchemaDescriptor {
        SchemaDescriptor::from_specs("Note", &[FieldSpec::new("title", Some(""))]).unwrap()
    }

    #[test]
    fn test_ident_quoting() {
        assert_eq!(ident("Product"), "Product");
        assert_eq!(ident("_x1"), "_x1");
        assert_eq!(ident("product name"), "`product name`");
        assert_eq!(ident("1st"), "`1st`");
        assert_eq!(ident("a`b) DETACH DELETE n//"), "`a``b) DETACH DELETE n//`");
    }

    #[test]
    fn test_create_batch() {
        let stmt = create_batch(
            &descriptor(),
            vec![bag(&[("sku", Value::from("P1"))]), bag(&[("sku", Value::from("P2"))])],
        );
        assert_eq!(
            stmt.text,
            "UNWIND $nodes AS node CREATE (n:Product) SET n += node.props"
        );
        let Value::List(nodes) = &stmt.params["nodes"] else {
            panic!("nodes must be a list");
        };
        assert_eq!(nodes.len(), 2);
        let Value::Map(first) = &nodes[0] else {
            panic!("element must be a map");
        };
        assert_eq!(first["props"], Value::Map(bag(&[("sku", Value::from("P1"))])));
    }

    #[test]
    fn test_create_with_generated_primary_key() {
        let stmt = create_batch(&generated_desc(), vec![bag(&[("total", Value::Int(3))])]);
        assert_eq!(
            stmt.text,
            "UNWIND $nodes AS node CREATE (n:Order) SET n += node.props \
             SET n.id = coalesce(n.id, randomUUID())"
        );
    }

    #[test]
    fn test_multiple_labels_are_joined_and_quoted() {
        let specs = [
            FieldSpec::new("id", Some("primary;label:Item")),
            FieldSpec::new("kind", Some("table:Stock Item")),
        ];
        let desc = SchemaDescriptor::from_specs("Item", &specs).unwrap();
        assert_eq!(label_expr(&desc), ":Item:`Stock Item`");

        let bags = vec![bag(&[("id", Value::from("I1"))])];
        assert_eq!(
            create_batch(&desc, bags.clone()).text,
            "UNWIND $nodes AS node CREATE (n:Item:`Stock Item`) SET n += node.props"
        );
        assert_eq!(
            merge_batch(&desc, bags).unwrap().text,
            "UNWIND $nodes AS node MERGE (n:Item:`Stock Item` {id: node.props.id}) SET n += node.props"
        );
        assert_eq!(
            find(&desc, &QuerySpec::new()).text,
            "MATCH (n:Item:`Stock Item`) RETURN n"
        );
        assert_eq!(
            delete_batch(&desc, vec![Value::from("I1")]).unwrap().text,
            "UNWIND $pks AS pk MATCH (n:Item:`Stock Item`) WHERE n.id = pk DETACH DELETE n"
        );
    }

    #[test]
    fn test_merge_batch() {
        let stmt = merge_batch(&descriptor(), vec![bag(&[("sku", Value::from("P1001"))])]).unwrap();
        assert_eq!(
            stmt.text,
            "UNWIND $nodes AS node MERGE (n:Product {sku: node.props.sku}) SET n += node.props"
        );
    }

    #[test]
    fn test_merge_requires_key_in_every_element() {
        let err = merge_batch(
            &descriptor(),
            vec![
                bag(&[("sku", Value::from("P1"))]),
                bag(&[("price", Value::Float(1.0))]),
            ],
        )
        .unwrap_err();
        assert!(matches!(err, OrmError::MissingPrimaryKey { .. }));
        assert!(err.to_string().contains("batch element 1"));
    }

    #[test]
    fn test_update() {
        let stmt = update(
            &descriptor(),
            Value::from("P1"),
            bag(&[("price", Value::Float(2.0))]),
        )
        .unwrap();
        assert_eq!(stmt.text, "MATCH (n:Product {sku: $pk}) SET n += $props");
        assert_eq!(stmt.params["pk"], Value::from("P1"));
        assert!(update(&keyless_desc(), Value::Null, PropertyBag::new()).is_err());
    }

    #[test]
    fn test_delete_batch() {
        let stmt = delete_batch(&descriptor(), vec![Value::from("P1001"), Value::from("P9999")])
            .unwrap();
        assert_eq!(
            stmt.text,
            "UNWIND $pks AS pk MATCH (n:Product) WHERE n.sku = pk DETACH DELETE n"
        );
        assert_eq!(
            stmt.params["pks"],
            Value::from(vec!["P1001", "P9999"])
        );
        assert!(matches!(
            delete_batch(&keyless_desc(), vec![]),
            Err(OrmError::MissingPrimaryKey { .. })
        ));
    }

    #[test]
    fn test_relate_batch() {
        let stmt = relate_batch(
            &descriptor(),
            &generated_desc(),
            "IN_ORDER",
            Direction::Outgoing,
            vec![(Value::from("P1"), Value::from("O1"))],
        )
        .unwrap();
        assert_eq!(
            stmt.text,
            "UNWIND $rels AS rel MERGE (a:Product {sku: rel.startVal}) \
             MERGE (b:Order {id: rel.endVal}) MERGE (a)-[:IN_ORDER]->(b)"
        );
        let Value::List(rels) = &stmt.params["rels"] else {
            panic!("rels must be a list");
        };
        assert_eq!(
            rels[0],
            Value::Map(bag(&[("startVal", Value::from("P1")), ("endVal", Value::from("O1"))]))
        );
    }

    #[test]
    fn test_relate_directions() {
        let incoming = relate_batch(&descriptor(), &descriptor(), "LINKS", Direction::Incoming, vec![])
            .unwrap();
        assert!(incoming.text.ends_with("MERGE (a)<-[:LINKS]-(b)"));
        let both = relate_batch(&descriptor(), &descriptor(), "LINKS", Direction::Both, vec![])
            .unwrap();
        assert!(both.text.ends_with("MERGE (a)-[:LINKS]-(b)"));
    }

    #[test]
    fn test_relate_rejects_bad_input() {
        assert!(matches!(
            relate_batch(&descriptor(), &descriptor(), " ", Direction::Outgoing, vec![]),
            Err(OrmError::InvalidInput(_))
        ));
        assert!(matches!(
            relate_batch(&descriptor(), &keyless_desc(), "X", Direction::Outgoing, vec![]),
            Err(OrmError::MissingPrimaryKey { .. })
        ));
    }

    #[test]
    fn test_unrelate_batch() {
        let stmt = unrelate_batch(
            &descriptor(),
            &generated_desc(),
            "IN ORDER",
            Direction::Outgoing,
            vec![(Value::from("P1"), Value::from("O1"))],
        )
        .unwrap();
        assert_eq!(
            stmt.text,
            "UNWIND $rels AS rel MATCH (a:Product {sku: rel.startVal})-[r:`IN ORDER`]->\
             (b:Order {id: rel.endVal}) DELETE r"
        );
    }

    #[test]
    fn test_find_without_filters() {
        let stmt = find(&descriptor(), &QuerySpec::new());
        assert_eq!(stmt.text, "MATCH (n:Product) RETURN n");
        assert!(stmt.params.is_empty());
        assert_eq!(stmt.columns, vec!["n".to_string()]);
    }

    #[test]
    fn test_find_with_everything() {
        let spec = QuerySpec::new()
            .where_raw("n.price > $min", bag(&[("min", Value::Float(1.0))]))
            .unwrap()
            .where_raw("n.stock IS NOT NULL", PropertyBag::new())
            .unwrap()
            .order_by("price", true)
            .order_by("product_name", false)
            .skip(10)
            .limit(5);
        let stmt = find(&descriptor(), &spec);
        assert_eq!(
            stmt.text,
            "MATCH (n:Product) WHERE (n.price > $min) AND (n.stock IS NOT NULL) RETURN n \
             ORDER BY n.price DESC, n.product_name ASC SKIP 10 LIMIT 5"
        );
        assert_eq!(stmt.params["min"], Value::Float(1.0));
    }

    #[test]
    fn test_count() {
        let stmt = count(&descriptor(), &QuerySpec::new().limit(3));
        assert_eq!(stmt.text, "MATCH (n:Product) RETURN count(n) AS total");
        assert_eq!(stmt.columns, vec!["total".to_string()]);
    }
}
