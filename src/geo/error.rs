use crate::utils::HttpFailure;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum GeoError {
    #[error("Network request failed for {0}")]
    NetworkRequest(String, #[source] reqwest::Error),

    #[error("HTTP request failed for {url} with status {status}")]
    HttpStatus {
        url: String,
        status: reqwest::StatusCode,
        #[source]
        source: reqwest::Error,
    },

    #[error("Failed to read WFS response from {0}")]
    ResponseBody(String, #[source] std::io::Error),

    #[error("Failed to parse WFS capabilities from {url}")]
    Capabilities {
        url: String,
        #[source]
        source: quick_xml::Error,
    },

    #[error("Failed to parse GeoJSON from {0}")]
    JsonParse(String, #[source] serde_json::Error),

    #[error("Could not derive a geoportal WFS url from '{0}'")]
    NoGeoportalUrl(String),

    #[error("WFS service at {0} offers no layers")]
    NoLayers(String),
}

impl HttpFailure for GeoError {
    fn network(url: String, source: reqwest::Error) -> Self {
        GeoError::NetworkRequest(url, source)
    }

    fn status(url: String, status: reqwest::StatusCode, source: reqwest::Error) -> Self {
        GeoError::HttpStatus {
            url,
            status,
            source,
        }
    }

    fn body(url: String, source: std::io::Error) -> Self {
        GeoError::ResponseBody(url, source)
    }
}
