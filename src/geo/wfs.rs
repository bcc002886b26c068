//! Minimal WFS access: list the layers of a service and fetch one as GeoJSON.

use crate::geo::error::GeoError;
use crate::utils::download;
use log::{info, warn};
use quick_xml::events::{BytesStart, Event};
use quick_xml::Reader;
use regex::Regex;
use reqwest::Client;
use serde_json::Value;
use std::sync::LazyLock;

const WFS_VERSION: &str = "1.1.0";
const GEOJSON_OUTPUT_FORMAT: &str = "application/json; subtype=geojson";

static IDENTIFIER_REGEX: LazyLock<Regex> = LazyLock::new(|| {
    #[allow(clippy::unwrap_used)]
    Regex::new(r"/([^/?]+)\?").unwrap()
});

/// Extracts the resource identifier, the path segment directly in front of the query string.
///
/// `https://www.stadt-zuerich.ch/geodaten/download/Gaerten?format=geojson_link`
/// yields `Gaerten`.
pub fn identifier_from_url(url: &str) -> Option<&str> {
    IDENTIFIER_REGEX
        .captures(url)?
        .get(1)
        .map(|identifier| identifier.as_str())
}

/// Maps a geo distribution URL onto the geoportal WFS endpoint serving it.
///
/// URLs that already point at a `/wfs/` endpoint are returned unchanged.
pub fn geoportal_url(url: &str, wfs_base: &str) -> Option<String> {
    match identifier_from_url(url) {
        Some(identifier) => Some(format!("{}/{}", wfs_base.trim_end_matches('/'), identifier)),
        None if url.contains("/wfs/") => Some(url.to_string()),
        None => {
            warn!("Could not extract identifier from url {}", url);
            None
        }
    }
}

/// Names of all `FeatureType`s announced in a GetCapabilities document, in document order.
pub fn parse_feature_type_names(xml: &str) -> Result<Vec<String>, quick_xml::Error> {
    let mut reader = Reader::from_str(xml);
    reader.trim_text(true);

    let mut names = Vec::new();
    let mut open_tags: Vec<String> = Vec::new();

    loop {
        match reader.read_event()? {
            Event::Start(ref e) => open_tags.push(local_name(e)),
            Event::End(_) => {
                open_tags.pop();
            }
            Event::Text(e) => {
                if let [.., parent, tag] = open_tags.as_slice() {
                    if parent == "FeatureType" && tag == "Name" {
                        names.push(e.unescape()?.into_owned());
                    }
                }
            }
            Event::Eof => break,
            _ => {}
        }
    }

    Ok(names)
}

fn local_name(e: &BytesStart) -> String {
    String::from_utf8_lossy(e.local_name().as_ref()).into_owned()
}

/// Issues WFS 1.1.0 requests against geoportal endpoints.
#[derive(Debug, Clone)]
pub struct WfsClient {
    client: Client,
}

impl WfsClient {
    pub fn new(client: Client) -> Self {
        Self { client }
    }

    /// Lists the layers (feature types) the service offers.
    pub async fn layers(&self, service_url: &str) -> Result<Vec<String>, GeoError> {
        let body = download::<GeoError>(
            &self.client,
            service_url,
            &[
                ("service", "WFS"),
                ("version", WFS_VERSION),
                ("request", "GetCapabilities"),
            ],
        )
        .await?;

        let layers = parse_feature_type_names(&String::from_utf8_lossy(&body)).map_err(|source| {
            GeoError::Capabilities {
                url: service_url.to_string(),
                source,
            }
        })?;
        info!("Available layers at {}: {:?}", service_url, layers);
        Ok(layers)
    }

    /// Fetches every feature of `layer` as a GeoJSON feature collection.
    pub async fn features(&self, service_url: &str, layer: &str) -> Result<Value, GeoError> {
        let body = download::<GeoError>(
            &self.client,
            service_url,
            &[
                ("service", "WFS"),
                ("version", WFS_VERSION),
                ("request", "GetFeature"),
                ("typename", layer),
                ("outputFormat", GEOJSON_OUTPUT_FORMAT),
            ],
        )
        .await?;

        serde_json::from_slice(&body).map_err(|e| GeoError::JsonParse(service_url.to_string(), e))
    }
}
