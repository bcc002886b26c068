//! The downloadable files ("resources" in CKAN terms) attached to a package.

use crate::types::localized::LocalizedText;
use serde::{Deserialize, Deserializer, Serialize};

/// A single downloadable resource belonging to a package.
///
/// Only the attributes this crate works with are kept. The format tag is
/// compared verbatim, CKAN portals are not consistent about its casing
/// (`"CSV"` next to `"parquet"`), so neither is this crate.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Distribution {
    /// CKAN resource id.
    pub id: Option<String>,
    /// Human readable resource name, plain or translated.
    pub name: Option<LocalizedText>,
    /// Download location.
    #[serde(default, deserialize_with = "string_or_empty")]
    pub url: String,
    /// Format tag as published, e.g. `"CSV"`, `"parquet"` or `"WFS"`.
    #[serde(default, deserialize_with = "string_or_empty")]
    pub format: String,
    pub filename: Option<String>,
    pub resource_type: Option<String>,
    pub package_id: Option<String>,
    pub description: Option<LocalizedText>,
}

impl Distribution {
    /// Whether the format tag equals one of `formats` exactly.
    pub fn has_format(&self, formats: &[&str]) -> bool {
        formats.iter().any(|f| *f == self.format)
    }
}

/// CKAN sends `null` for unset strings; treat it like a missing field.
pub(crate) fn string_or_empty<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(Option::<String>::deserialize(deserializer)?.unwrap_or_default())
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_deserialize_ckan_resource() {
        let resource: Distribution = serde_json::from_value(json!({
            "id": "a1b2",
            "name": "Einwohner nach Quartier",
            "url": "https://data.stadt-zuerich.ch/dataset/x/download/bev.csv",
            "format": "CSV",
            "filename": "bev.csv",
            "resource_type": null,
            "package_id": "p1",
            "size": 1234
        }))
        .unwrap();

        assert_eq!(resource.id.as_deref(), Some("a1b2"));
        assert_eq!(resource.format, "CSV");
        assert_eq!(resource.filename.as_deref(), Some("bev.csv"));
        assert_eq!(resource.resource_type, None);
        assert!(resource.description.is_none());
    }

    #[test]
    fn test_deserialize_translated_resource() {
        let resource: Distribution = serde_json::from_value(json!({
            "format": "WFS",
            "url": "https://example.org/wfs",
            "name": { "de": "Baumkataster", "fr": "Cadastre des arbres" },
            "description": "Standorte"
        }))
        .unwrap();

        assert_eq!(
            resource.name.as_ref().and_then(|n| n.get("fr")),
            Some("Cadastre des arbres")
        );
        assert_eq!(resource.description, Some(LocalizedText::from("Standorte")));
    }

    #[test]
    fn test_null_format_becomes_empty() {
        let resource: Distribution =
            serde_json::from_value(json!({ "url": null, "format": null })).unwrap();
        assert_eq!(resource.format, "");
        assert_eq!(resource.url, "");
    }

    #[test]
    fn test_has_format_is_exact() {
        let resource = Distribution {
            format: "CSV".to_string(),
            ..Default::default()
        };
        assert!(resource.has_format(&["CSV"]));
        assert!(resource.has_format(&["parquet", "CSV"]));
        assert!(!resource.has_format(&["csv"]));
        assert!(!resource.has_format(&[]));
    }
}
