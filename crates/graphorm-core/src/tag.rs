//! Field tag grammar: `key[:value](;key[:value])*`.
//!
//! Options are separated by `;`. An option is either a bare keyword, stored
//! with an empty value, or a `key:value` pair split on the first `:` only, so
//! values may themselves contain colons. Keys and values are trimmed.
//! Options with an empty key are dropped without an error; the grammar has no
//! way to report them.

use std::collections::BTreeMap;

/// Marks the primary-key field.
pub const PRIMARY: &str = "primary";
/// Marks a field whose value is assigned by the store.
pub const GENERATED: &str = "generated";
/// Adds a node label.
pub const LABEL: &str = "label";
/// Synonym of [`LABEL`].
pub const TABLE: &str = "table";
/// Overrides the property name (defaults to the field name).
pub const NAME: &str = "name";
/// Index marker. Parsed and carried on the descriptor, never enforced.
pub const INDEX: &str = "index";
/// Uniqueness marker. Parsed and carried on the descriptor, never enforced.
pub const UNIQUE: &str = "unique";

/// Parsed tag options, keyed by option name.
pub type TagOptions = BTreeMap<String, String>;

/// Parse a raw tag string into its options.
pub fn parse_tag(tag: &str) -> TagOptions {
    let mut options = TagOptions::new();
    for part in tag.split(';') {
        let (key, value) = match part.split_once(':') {
            Some((key, value)) => (key.trim(), value.trim()),
            None => (part.trim(), ""),
        };
        if key.is_empty() {
            continue;
        }
        options.insert(key.to_string(), value.to_string());
    }
    options
}

/// Serialize options back into tag form. Empty values come out as bare keywords.
pub fn format_tag(options: &TagOptions) -> String {
    options
        .iter()
        .map(|(key, value)| {
            if value.is_empty() {
                key.clone()
            } else {
                format!("{key}:{value}")
            }
        })
        .collect::<Vec<_>>()
        .join(";")
}
