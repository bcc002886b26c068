//! Full metadata of a single dataset and access to its distributions.

use crate::catalog::filter::{filter_by_format, JSON_FORMAT, TABULAR_FORMATS, WFS_FORMAT};
use crate::catalog::flatten::{flatten_object, lookup_path};
use crate::config::ClientConfig;
use crate::dataset::lazy::Dataset;
use crate::geo::resource::GeoResource;
use crate::geo::wfs::WfsClient;
use crate::types::distribution::Distribution;
use crate::types::localized::LocalizedText;
use polars::prelude::*;
use reqwest::Client;
use serde_json::{Map, Value};
use std::collections::BTreeMap;
use std::sync::Arc;

const GEO_FORMATS: &[&str] = &[WFS_FORMAT, JSON_FORMAT];
const NO_ERROR_MESSAGE: &str = "No error message provided.";

/// Outcome of a `package_show` lookup.
#[derive(Debug)]
pub enum PackageLookup {
    Found(Box<Package>),
    /// Neither an id nor a name was given; no request was made.
    MissingIdentifier,
    /// The portal answered with `success: false`. Holds the portal's message.
    Rejected(String),
}

impl PackageLookup {
    pub fn into_package(self) -> Option<Package> {
        match self {
            PackageLookup::Found(package) => Some(*package),
            _ => None,
        }
    }
}

/// One dataset as returned by `package_show`.
///
/// The complete metadata is kept as a flattened map (`organization.title`,
/// `resources`, ...) next to typed accessors for the commonly used fields.
#[derive(Debug, Clone)]
pub struct Package {
    metadata: Map<String, Value>,
    distributions: Vec<Distribution>,
    distribution_links: Vec<String>,
    client: Client,
    config: Arc<ClientConfig>,
}

impl Package {
    pub(crate) fn from_result(
        result: &Value,
        client: Client,
        config: Arc<ClientConfig>,
    ) -> Result<Self, serde_json::Error> {
        let distributions: Vec<Distribution> = match result.get("resources") {
            Some(resources) if !resources.is_null() => {
                serde_json::from_value(resources.clone())?
            }
            _ => Vec::new(),
        };
        let distribution_links = distributions.iter().map(|d| d.url.clone()).collect();

        Ok(Self {
            metadata: flatten_object(result),
            distributions,
            distribution_links,
            client,
            config,
        })
    }

    /// Flattened metadata, keyed by dotted path.
    pub fn metadata(&self) -> &Map<String, Value> {
        &self.metadata
    }

    /// A metadata value rendered as text, if it is a string.
    pub fn metadata_str(&self, key: &str) -> Option<&str> {
        self.metadata.get(key).and_then(Value::as_str)
    }

    pub fn name(&self) -> &str {
        self.metadata_str("name").unwrap_or_default()
    }

    /// A text field that may be a plain string or translated per language.
    pub fn localized(&self, key: &str) -> Option<LocalizedText> {
        serde_json::from_value(lookup_path(&self.metadata, key)?).ok()
    }

    pub fn title(&self) -> Option<LocalizedText> {
        self.localized("title")
    }

    pub fn notes(&self) -> Option<LocalizedText> {
        self.localized("notes")
    }

    /// Name of the organisation providing the portal.
    pub fn provider(&self) -> &str {
        &self.config.provider
    }

    /// Link to the dataset's page on the portal.
    pub fn portal_url(&self) -> String {
        format!("{}{}", self.config.portal_base, self.name())
    }

    pub fn distributions(&self) -> &[Distribution] {
        &self.distributions
    }

    pub fn distribution_links(&self) -> &[String] {
        &self.distribution_links
    }

    /// One row per distribution.
    pub fn resource_frame(&self) -> PolarsResult<DataFrame> {
        let column = |field: fn(&Distribution) -> Option<&str>| -> Vec<Option<String>> {
            self.distributions
                .iter()
                .map(|d| field(d).map(str::to_string))
                .collect()
        };

        df!(
            "id" => column(|d| d.id.as_deref()),
            "name" => column(|d| d.name.as_ref().and_then(LocalizedText::text)),
            "format" => column(|d| Some(d.format.as_str())),
            "url" => column(|d| Some(d.url.as_str())),
            "filename" => column(|d| d.filename.as_deref()),
            "resource_type" => column(|d| d.resource_type.as_deref()),
            "package_id" => column(|d| d.package_id.as_deref())
        )
    }

    /// Number of distributions per format tag.
    pub fn resource_summary(&self) -> BTreeMap<String, usize> {
        let mut summary = BTreeMap::new();
        for distribution in &self.distributions {
            *summary.entry(distribution.format.clone()).or_insert(0) += 1;
        }
        summary
    }

    /// Distributions in `CSV` or `parquet` format.
    pub fn tabular_resources(&self) -> Vec<Distribution> {
        filter_by_format(&self.distributions, TABULAR_FORMATS).unwrap_or_default()
    }

    /// Distributions in `WFS` or `JSON` format.
    pub fn geo_resources(&self) -> Vec<Distribution> {
        filter_by_format(&self.distributions, GEO_FORMATS).unwrap_or_default()
    }

    /// Any distribution by position, loaded lazily.
    pub fn dataset(&self, index: usize) -> Option<Dataset> {
        let distribution = self.distributions.get(index)?.clone();
        Some(Dataset::new(index, distribution, self.client.clone()))
    }

    /// The `index`-th tabular distribution.
    pub fn tabular_dataset(&self, index: usize) -> Option<Dataset> {
        let distribution = self.tabular_resources().into_iter().nth(index)?;
        Some(Dataset::new(index, distribution, self.client.clone()))
    }

    /// The tabular distribution with resource id `id`.
    pub fn tabular_dataset_by_id(&self, id: &str) -> Option<Dataset> {
        let (index, distribution) = Self::find_by_id(self.tabular_resources(), id)?;
        Some(Dataset::new(index, distribution, self.client.clone()))
    }

    /// The `index`-th geo distribution.
    pub fn geo_resource(&self, index: usize) -> Option<GeoResource> {
        let distribution = self.geo_resources().into_iter().nth(index)?;
        Some(self.wrap_geo(index, distribution))
    }

    /// The geo distribution with resource id `id`.
    pub fn geo_resource_by_id(&self, id: &str) -> Option<GeoResource> {
        let (index, distribution) = Self::find_by_id(self.geo_resources(), id)?;
        Some(self.wrap_geo(index, distribution))
    }

    fn wrap_geo(&self, index: usize, distribution: Distribution) -> GeoResource {
        GeoResource::new(
            index,
            distribution,
            WfsClient::new(self.client.clone()),
            self.config.wfs_base.clone(),
        )
    }

    fn find_by_id(resources: Vec<Distribution>, id: &str) -> Option<(usize, Distribution)> {
        resources
            .into_iter()
            .enumerate()
            .find(|(_, d)| d.id.as_deref() == Some(id))
    }
}

/// The message the portal attached to a failed action.
///
/// CKAN sends `{"error": {"message": "...", "__type": "..."}}`; plain string
/// errors and other shapes are passed on as their JSON text.
pub(crate) fn api_error_message(response: &Value) -> String {
    match response.get("error") {
        None | Some(Value::Null) => NO_ERROR_MESSAGE.to_string(),
        Some(Value::String(message)) => message.clone(),
        Some(error) => match error.get("message").and_then(Value::as_str) {
            Some(message) => message.to_string(),
            None => error.to_string(),
        },
    }
}
