//! Selecting distributions by format tag.

use crate::types::distribution::Distribution;

/// Format tag of comma/semicolon separated files.
pub const CSV_FORMAT: &str = "CSV";
/// Format tag of parquet files. The portal publishes this one in lower case.
pub const PARQUET_FORMAT: &str = "parquet";
/// Format tag of WFS geo services.
pub const WFS_FORMAT: &str = "WFS";
/// Format tag of GeoJSON downloads.
pub const JSON_FORMAT: &str = "JSON";

/// Formats that can be loaded into a `DataFrame`.
pub const TABULAR_FORMATS: &[&str] = &[CSV_FORMAT, PARQUET_FORMAT];

/// Keeps the distributions whose format equals one of `formats`, in their original order.
///
/// Returns `None` instead of an empty list so callers can drop the owning dataset.
pub fn filter_by_format(resources: &[Distribution], formats: &[&str]) -> Option<Vec<Distribution>> {
    let matching: Vec<Distribution> = resources
        .iter()
        .filter(|resource| resource.has_format(formats))
        .cloned()
        .collect();

    if matching.is_empty() {
        None
    } else {
        Some(matching)
    }
}

pub fn csv_distributions(resources: &[Distribution]) -> Option<Vec<Distribution>> {
    filter_by_format(resources, &[CSV_FORMAT])
}

pub fn tabular_distributions(resources: &[Distribution]) -> Option<Vec<Distribution>> {
    filter_by_format(resources, TABULAR_FORMATS)
}

pub fn geo_distributions(resources: &[Distribution]) -> Option<Vec<Distribution>> {
    filter_by_format(resources, &[WFS_FORMAT])
}

#[cfg(test)]
mod tests {
    use super::*;

    fn resource(id: &str, format: &str) -> Distribution {
        Distribution {
            id: Some(id.to_string()),
            url: format!("https://example.org/{id}"),
            format: format.to_string(),
            ..Default::default()
        }
    }

    #[test]
    fn test_csv_filter_keeps_exact_subset_in_order() {
        let resources = vec![
            resource("1", "CSV"),
            resource("2", "JSON"),
            resource("3", "csv"),
            resource("4", "CSV"),
            resource("5", "parquet"),
        ];

        let csv = csv_distributions(&resources).unwrap();

        assert_eq!(csv, vec![resources[0].clone(), resources[3].clone()]);
    }

    #[test]
    fn test_filter_returns_none_when_nothing_matches() {
        let resources = vec![resource("1", "PDF"), resource("2", "WMS")];
        assert_eq!(csv_distributions(&resources), None);
        assert_eq!(csv_distributions(&[]), None);
    }

    #[test]
    fn test_tabular_and_geo_filters() {
        let resources = vec![
            resource("1", "parquet"),
            resource("2", "WFS"),
            resource("3", "CSV"),
        ];

        let tabular = tabular_distributions(&resources).unwrap();
        let ids: Vec<_> = tabular.iter().filter_map(|r| r.id.as_deref()).collect();
        assert_eq!(ids, ["1", "3"]);

        let geo = geo_distributions(&resources).unwrap();
        assert_eq!(geo.len(), 1);
        assert_eq!(geo[0].id.as_deref(), Some("2"));
    }
}
