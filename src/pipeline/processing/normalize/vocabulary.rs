//! Header vocabulary: maps free-form column headers onto the eight canonical fields.

use once_cell::sync::Lazy;
use std::collections::HashMap;

use crate::domain::Field;

/// Lookup keyed by the folded header (lowercase, alphanumerics only)
static VOCABULARY: Lazy<HashMap<String, Field>> = Lazy::new(|| {
    let mut map = HashMap::new();
    for field in Field::ALL {
        map.insert(fold(field.as_str()), field);
    }
    // Identifier column is commonly labelled by id or name
    map.insert(fold("region_id"), Field::Region);
    map.insert(fold("region_name"), Field::Region);
    map
});

/// Fold a header so that case, whitespace and separators do not matter
fn fold(header: &str) -> String {
    header
        .chars()
        .filter(|c| c.is_alphanumeric())
        .flat_map(char::to_lowercase)
        .collect()
}

/// Canonicalize a header to a known field, if it names one
pub fn canonical_field(header: &str) -> Option<Field> {
    VOCABULARY.get(&fold(header)).copied()
}
