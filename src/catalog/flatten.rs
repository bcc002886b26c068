//! Flattening of nested CKAN JSON into dotted-path rows.
//!
//! `{"organization": {"title": "SSZ"}}` becomes `{"organization.title": "SSZ"}`.
//! Arrays are kept as values, so `resources` survives as one list-valued field.

use serde_json::{Map, Value};

/// Source path in the flattened package, destination field in [`CatalogRecord`](crate::CatalogRecord).
pub type FieldMapping = (&'static str, &'static str);

/// The reduced field set kept for every catalog record.
pub const CATALOG_FIELDS: &[FieldMapping] = &[
    ("name", "name"),
    ("id", "id"),
    ("title", "title"),
    ("author", "author"),
    ("maintainer", "maintainer"),
    ("maintainer_email", "maintainer_email"),
    ("metadata_created", "metadata_created"),
    ("metadata_modified", "metadata_modified"),
    ("organization.title", "organization"),
    ("organization.name", "organization_name"),
    ("license_title", "license"),
    ("notes", "notes"),
    ("resources", "resources"),
];

/// Flattens an object into dotted paths. Anything other than an object yields an empty map.
pub fn flatten_object(value: &Value) -> Map<String, Value> {
    let mut flat = Map::new();
    if let Value::Object(object) = value {
        for (key, child) in object {
            flatten_into(key.clone(), child, &mut flat);
        }
    }
    flat
}

fn flatten_into(path: String, value: &Value, out: &mut Map<String, Value>) {
    match value {
        // An empty object contributes no columns.
        Value::Object(object) => {
            for (key, child) in object {
                flatten_into(format!("{path}.{key}"), child, out);
            }
        }
        other => {
            out.insert(path, other.clone());
        }
    }
}

/// Picks the mapped fields out of a flattened row and renames them. Missing paths are skipped.
///
/// A path that was flattened further, like a translated `title` spread over
/// `title.de` and `title.fr`, is regrouped into one object.
pub fn select_fields(flat: &Map<String, Value>, fields: &[FieldMapping]) -> Map<String, Value> {
    fields
        .iter()
        .filter_map(|(source, destination)| {
            lookup_path(flat, source).map(|value| (destination.to_string(), value))
        })
        .collect()
}

/// The value at a dotted path, regrouping flattened children when needed.
pub fn lookup_path(flat: &Map<String, Value>, path: &str) -> Option<Value> {
    if let Some(value) = flat.get(path) {
        return Some(value.clone());
    }

    let prefix = format!("{path}.");
    let children: Map<String, Value> = flat
        .iter()
        .filter_map(|(key, value)| {
            key.strip_prefix(&prefix)
                .map(|child| (child.to_string(), value.clone()))
        })
        .collect();
    (!children.is_empty()).then_some(Value::Object(children))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_flatten_nested_objects() {
        let flat = flatten_object(&json!({
            "name": "bev_bestand",
            "organization": { "title": "Statistik Stadt Zürich", "meta": { "level": 2 } },
            "tags": [{ "name": "bevoelkerung" }]
        }));

        assert_eq!(flat["name"], json!("bev_bestand"));
        assert_eq!(flat["organization.title"], json!("Statistik Stadt Zürich"));
        assert_eq!(flat["organization.meta.level"], json!(2));
        assert_eq!(flat["tags"], json!([{ "name": "bevoelkerung" }]));
        assert!(!flat.contains_key("organization"));
    }

    #[test]
    fn test_flatten_drops_empty_objects_and_non_objects() {
        let flat = flatten_object(&json!({ "extras": {}, "n": null }));
        assert_eq!(flat.len(), 1);
        assert_eq!(flat["n"], Value::Null);

        assert!(flatten_object(&json!([1, 2])).is_empty());
        assert!(flatten_object(&json!("x")).is_empty());
    }

    #[test]
    fn test_select_fields_renames_and_skips_missing() {
        let flat = flatten_object(&json!({
            "name": "a",
            "organization": { "title": "Org" },
            "unused": true
        }));
        let row = select_fields(&flat, CATALOG_FIELDS);

        assert_eq!(row["name"], json!("a"));
        assert_eq!(row["organization"], json!("Org"));
        assert!(!row.contains_key("unused"));
        assert!(!row.contains_key("author"));
    }

    #[test]
    fn test_select_fields_regroups_translations() {
        let flat = flatten_object(&json!({
            "name": "baumkataster",
            "title": { "de": "Baumkataster", "fr": "Cadastre des arbres" },
            "organization": { "title": { "de": "Grün Stadt Zürich" }, "name": "gsz" }
        }));
        let row = select_fields(&flat, CATALOG_FIELDS);

        assert_eq!(row["title"], json!({ "de": "Baumkataster", "fr": "Cadastre des arbres" }));
        assert_eq!(row["organization"], json!({ "de": "Grün Stadt Zürich" }));
        assert_eq!(row["organization_name"], json!("gsz"));
    }

    #[test]
    fn test_lookup_path() {
        let flat = flatten_object(&json!({ "a": { "b": 1, "c": { "d": 2 } }, "ab": 3 }));

        assert_eq!(lookup_path(&flat, "a.b"), Some(json!(1)));
        assert_eq!(lookup_path(&flat, "a"), Some(json!({ "b": 1, "c.d": 2 })));
        assert_eq!(lookup_path(&flat, "a.c"), Some(json!({ "d": 2 })));
        assert_eq!(lookup_path(&flat, "x"), None);
    }
}
