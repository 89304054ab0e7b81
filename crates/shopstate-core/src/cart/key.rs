//! Line identity derivation.
//!
//! A cart line is identified by its product plus the canonical form of its
//! variant attributes, so the same configuration always maps to the same id
//! regardless of the order its attributes were supplied in.

use std::collections::BTreeMap;

use crate::ids::{LineId, ProductId};

/// Separator between the product id and the attribute string.
pub const LINE_ID_SEPARATOR: &str = "::";

/// Attribute string used when a line has no variant attributes.
pub const DEFAULT_ATTRIBUTE_KEY: &str = "default";

/// Variant-axis name to chosen value, e.g. `{"size": "M"}`.
pub type Attributes = BTreeMap<String, String>;

/// Build an attribute map from `(name, value)` pairs in any order.
///
/// Later pairs win when a name repeats.
pub fn attributes<I, K, V>(pairs: I) -> Attributes
where
    I: IntoIterator<Item = (K, V)>,
    K: Into<String>,
    V: Into<String>,
{
    pairs
        .into_iter()
        .map(|(k, v)| (k.into(), v.into()))
        .collect()
}

/// `name:value` pairs sorted by name and joined with `|`.
///
/// Backslashes, `:` and `|` inside names or values are escaped with a backslash.
pub fn canonical_attribute_string(attributes: &Attributes) -> String {
    if attributes.is_empty() {
        return DEFAULT_ATTRIBUTE_KEY.to_string();
    }

    attributes
        .iter()
        .map(|(k, v)| format!("{}:{}", escape(k), escape(v)))
        .collect::<Vec<_>>()
        .join("|")
}

fn escape(part: &str) -> String {
    let mut out = String::with_capacity(part.len());
    for c in part.chars() {
        if matches!(c, '\\' | ':' | '|') {
            out.push('\\');
        }
        out.push(c);
    }
    out
}

/// Derive the line id for a product configuration.
pub fn line_id(product_id: &ProductId, attributes: &Attributes) -> LineId {
    LineId::new(format!(
        "{}{}{}",
        product_id,
        LINE_ID_SEPARATOR,
        canonical_attribute_string(attributes)
    ))
}
