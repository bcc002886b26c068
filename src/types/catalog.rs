//! The assembled dataset catalog and its records.

use crate::catalog::filter::{csv_distributions, geo_distributions, tabular_distributions};
use crate::catalog::flatten::{flatten_object, select_fields, CATALOG_FIELDS};
use crate::types::distribution::Distribution;
use crate::types::localized::LocalizedText;
use chrono::NaiveDateTime;
use polars::prelude::*;
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;
use std::fmt;

const TIMESTAMP_FORMAT: &str = "%Y-%m-%dT%H:%M:%S%.f";

/// The reduced metadata kept for one dataset of the catalog.
///
/// Produced by flattening a package from the listing endpoint and picking the
/// fields listed in [`CATALOG_FIELDS`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CatalogRecord {
    /// Unique dataset name, the catalog key.
    pub name: String,
    pub id: Option<String>,
    /// Plain or translated title.
    pub title: Option<LocalizedText>,
    pub author: Option<String>,
    pub maintainer: Option<String>,
    pub maintainer_email: Option<String>,
    #[serde(default, deserialize_with = "lenient_timestamp")]
    pub metadata_created: Option<NaiveDateTime>,
    #[serde(default, deserialize_with = "lenient_timestamp")]
    pub metadata_modified: Option<NaiveDateTime>,
    /// Title of the publishing organization.
    pub organization: Option<LocalizedText>,
    /// Slug of the publishing organization.
    pub organization_name: Option<String>,
    pub license: Option<String>,
    pub notes: Option<LocalizedText>,
    /// Distributions of the dataset, in the order the portal lists them.
    #[serde(default, deserialize_with = "resources_or_empty")]
    pub resources: Vec<Distribution>,
}

impl CatalogRecord {
    /// Builds a record from one package object of the listing endpoint.
    pub fn from_package_json(package: &Value) -> Result<Self, serde_json::Error> {
        let flat = flatten_object(package);
        let row = select_fields(&flat, CATALOG_FIELDS);
        serde_json::from_value(Value::Object(row))
    }
}

/// A timestamp the portal cannot be trusted to format consistently; unparsable becomes `None`.
fn lenient_timestamp<'de, D>(deserializer: D) -> Result<Option<NaiveDateTime>, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = Option::<String>::deserialize(deserializer)?;
    Ok(raw.and_then(|s| NaiveDateTime::parse_from_str(&s, TIMESTAMP_FORMAT).ok()))
}

fn resources_or_empty<'de, D>(deserializer: D) -> Result<Vec<Distribution>, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(Option::<Vec<Distribution>>::deserialize(deserializer)?.unwrap_or_default())
}

/// A derived view of the catalog, restricted to datasets with a distribution of some format.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CatalogView {
    /// Datasets with at least one `CSV` distribution.
    Csv,
    /// Datasets with at least one `CSV` or `parquet` distribution.
    Tabular,
    /// Datasets with at least one `WFS` distribution.
    Geo,
}

impl CatalogView {
    /// Applies the view's distribution filter to one resource list.
    pub fn filter(&self, resources: &[Distribution]) -> Option<Vec<Distribution>> {
        match self {
            CatalogView::Csv => csv_distributions(resources),
            CatalogView::Tabular => tabular_distributions(resources),
            CatalogView::Geo => geo_distributions(resources),
        }
    }
}

impl fmt::Display for CatalogView {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            CatalogView::Csv => "csv",
            CatalogView::Tabular => "tabular",
            CatalogView::Geo => "geo",
        };
        write!(f, "{name}")
    }
}

/// All datasets of a portal, unique by name and sorted by it.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Catalog {
    records: Vec<CatalogRecord>,
}

impl Catalog {
    /// Indexes the records by name. When a name repeats, the later record wins.
    pub fn from_records(records: impl IntoIterator<Item = CatalogRecord>) -> Self {
        let by_name: BTreeMap<String, CatalogRecord> = records
            .into_iter()
            .map(|record| (record.name.clone(), record))
            .collect();
        Self {
            records: by_name.into_values().collect(),
        }
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Looks a dataset up by its name.
    pub fn get(&self, name: &str) -> Option<&CatalogRecord> {
        self.records
            .binary_search_by(|record| record.name.as_str().cmp(name))
            .ok()
            .map(|i| &self.records[i])
    }

    pub fn records(&self) -> &[CatalogRecord] {
        &self.records
    }

    pub fn iter(&self) -> impl Iterator<Item = &CatalogRecord> {
        self.records.iter()
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.records.iter().map(|record| record.name.as_str())
    }

    /// Restricts every record to the distributions matching `view` and drops
    /// the records left without any. Surviving records keep their order.
    pub fn filtered(&self, view: CatalogView) -> Catalog {
        let records = self
            .records
            .iter()
            .filter_map(|record| {
                view.filter(&record.resources).map(|resources| CatalogRecord {
                    resources,
                    ..record.clone()
                })
            })
            .collect();
        Catalog { records }
    }

    /// Renders the catalog as a table, one row per dataset.
    ///
    /// Resources are summarised as `resource_count` and a comma separated
    /// `formats` column.
    pub fn to_frame(&self) -> PolarsResult<DataFrame> {
        let names: Vec<&str> = self.names().collect();
        let resource_count: Vec<u32> = self
            .records
            .iter()
            .map(|r| r.resources.len() as u32)
            .collect();
        let formats: Vec<String> = self
            .records
            .iter()
            .map(|r| {
                r.resources
                    .iter()
                    .map(|d| d.format.as_str())
                    .collect::<Vec<_>>()
                    .join(",")
            })
            .collect();

        df!(
            "name" => names,
            "id" => self.text_column(|r| r.id.as_deref()),
            "title" => self.text_column(|r| r.title.as_ref().and_then(LocalizedText::text)),
            "author" => self.text_column(|r| r.author.as_deref()),
            "maintainer" => self.text_column(|r| r.maintainer.as_deref()),
            "maintainer_email" => self.text_column(|r| r.maintainer_email.as_deref()),
            "metadata_created" => self.timestamp_column(|r| r.metadata_created),
            "metadata_modified" => self.timestamp_column(|r| r.metadata_modified),
            "organization" => self.text_column(|r| r.organization.as_ref().and_then(LocalizedText::text)),
            "license" => self.text_column(|r| r.license.as_deref()),
            "resource_count" => resource_count,
            "formats" => formats
        )
    }

    fn text_column(&self, field: fn(&CatalogRecord) -> Option<&str>) -> Vec<Option<&str>> {
        self.records.iter().map(field).collect()
    }

    fn timestamp_column(
        &self,
        field: fn(&CatalogRecord) -> Option<NaiveDateTime>,
    ) -> Vec<Option<String>> {
        self.records
            .iter()
            .map(|r| field(r).map(|t| t.format(TIMESTAMP_FORMAT).to_string()))
            .collect()
    }
}

impl<'a> IntoIterator for &'a Catalog {
    type Item = &'a CatalogRecord;
    type IntoIter = std::slice::Iter<'a, CatalogRecord>;

    fn into_iter(self) -> Self::IntoIter {
        self.records.iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;
    use serde_json::json;

    fn record(name: &str, formats: &[&str]) -> CatalogRecord {
        CatalogRecord::from_package_json(&json!({
            "name": name,
            "resources": formats
                .iter()
                .enumerate()
                .map(|(i, f)| json!({ "id": format!("{name}-{i}"), "format": f, "url": format!("https://example.org/{name}/{i}") }))
                .collect::<Vec<_>>()
        }))
        .unwrap()
    }

    #[test]
    fn test_record_from_package_json() {
        let record = CatalogRecord::from_package_json(&json!({
            "name": "bev_bestand_jahr_od3243",
            "id": "f1",
            "title": "Bevölkerung nach Jahr",
            "author": "Statistik Stadt Zürich",
            "maintainer": "Open Data Zürich",
            "maintainer_email": "opendata@zuerich.ch",
            "metadata_created": "2019-02-25T12:33:21.482163",
            "metadata_modified": "not a date",
            "organization": { "name": "ssz", "title": "Statistik Stadt Zürich" },
            "license_title": "CC0 1.0",
            "num_tags": 4,
            "resources": [{ "id": "r1", "format": "CSV", "url": "https://example.org/bev.csv" }]
        }))
        .unwrap();

        assert_eq!(record.name, "bev_bestand_jahr_od3243");
        assert_eq!(
            record.organization,
            Some(LocalizedText::from("Statistik Stadt Zürich"))
        );
        assert_eq!(record.organization_name.as_deref(), Some("ssz"));
        assert_eq!(record.license.as_deref(), Some("CC0 1.0"));
        assert_eq!(
            record.metadata_created.map(|t| t.date()),
            NaiveDate::from_ymd_opt(2019, 2, 25)
        );
        assert_eq!(record.metadata_modified, None);
        assert_eq!(record.resources.len(), 1);
        assert_eq!(record.resources[0].format, "CSV");
    }

    #[test]
    fn test_record_requires_a_name() {
        assert!(CatalogRecord::from_package_json(&json!({ "title": "nameless" })).is_err());
    }

    #[test]
    fn test_record_with_translated_fields() {
        let record = CatalogRecord::from_package_json(&json!({
            "name": "baumkataster",
            "title": { "de": "Baumkataster", "fr": "Cadastre des arbres" },
            "notes": { "de": "Bäume im öffentlichen Raum", "fr": null },
            "organization": { "name": "gsz", "title": { "de": "Grün Stadt Zürich", "fr": "Grün Stadt Zürich" } },
            "resources": [{ "format": "CSV", "url": "u", "name": { "de": "Datei", "en": "File" } }]
        }))
        .unwrap();

        let title = record.title.as_ref().unwrap();
        assert_eq!(title.text(), Some("Baumkataster"));
        assert_eq!(title.get("fr"), Some("Cadastre des arbres"));
        assert_eq!(record.notes.as_ref().unwrap().languages().collect::<Vec<_>>(), ["de"]);
        assert_eq!(record.organization.as_ref().and_then(|o| o.text()), Some("Grün Stadt Zürich"));
        assert_eq!(record.organization_name.as_deref(), Some("gsz"));
        let resource_name = record.resources[0].name.as_ref().unwrap();
        assert_eq!(resource_name.get("en"), Some("File"));

        let frame = Catalog::from_records([record]).to_frame().unwrap();
        let titles: Vec<_> = frame
            .column("title")
            .unwrap()
            .as_materialized_series()
            .str()
            .unwrap()
            .into_iter()
            .collect();
        assert_eq!(titles, [Some("Baumkataster")]);
    }

    #[test]
    fn test_catalog_sorted_and_unique_by_name() {
        let mut later_c = record("c", &["CSV"]);
        later_c.title = Some(LocalizedText::from("second"));
        let catalog = Catalog::from_records(vec![
            record("c", &["JSON"]),
            record("a", &["CSV"]),
            record("b", &[]),
            later_c,
        ]);

        assert_eq!(catalog.names().collect::<Vec<_>>(), ["a", "b", "c"]);
        assert_eq!(
            catalog.get("c").unwrap().title,
            Some(LocalizedText::from("second"))
        );
        assert!(catalog.get("d").is_none());
    }

    #[test]
    fn test_filtered_views() {
        let catalog = Catalog::from_records(vec![
            record("a", &["CSV", "JSON", "CSV"]),
            record("b", &["parquet"]),
            record("c", &["WFS", "JSON"]),
            record("d", &[]),
        ]);

        let csv = catalog.filtered(CatalogView::Csv);
        assert_eq!(csv.names().collect::<Vec<_>>(), ["a"]);
        let kept: Vec<_> = csv.get("a").unwrap().resources.iter().collect();
        let original = &catalog.get("a").unwrap().resources;
        assert_eq!(kept, [&original[0], &original[2]]);

        let tabular = catalog.filtered(CatalogView::Tabular);
        assert_eq!(tabular.names().collect::<Vec<_>>(), ["a", "b"]);

        let geo = catalog.filtered(CatalogView::Geo);
        assert_eq!(geo.names().collect::<Vec<_>>(), ["c"]);
        assert_eq!(geo.get("c").unwrap().resources.len(), 1);

        // The source catalog is untouched.
        assert_eq!(catalog.len(), 4);
        assert_eq!(catalog.get("a").unwrap().resources.len(), 3);
    }

    #[test]
    fn test_to_frame() {
        let catalog = Catalog::from_records(vec![record("b", &["CSV", "WFS"]), record("a", &[])]);
        let frame = catalog.to_frame().unwrap();

        assert_eq!(frame.shape(), (2, 12));
        let names: Vec<_> = frame
            .column("name")
            .unwrap()
            .as_materialized_series()
            .str()
            .unwrap()
            .into_iter()
            .collect();
        assert_eq!(names, [Some("a"), Some("b")]);
        let formats: Vec<_> = frame
            .column("formats")
            .unwrap()
            .as_materialized_series()
            .str()
            .unwrap()
            .into_iter()
            .collect();
        assert_eq!(formats, [Some(""), Some("CSV,WFS")]);
    }
}
