use crate::catalog::error::CatalogError;
use crate::dataset::error::DatasetError;
use crate::geo::error::GeoError;
use crate::utils::HttpFailure;
use polars::error::PolarsError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum OpenDataError {
    #[error(transparent)]
    Catalog(#[from] CatalogError),

    #[error(transparent)]
    Dataset(#[from] DatasetError),

    #[error(transparent)]
    Geo(#[from] GeoError),

    #[error("Network request failed for {0}")]
    NetworkRequest(String, #[source] reqwest::Error),

    #[error("HTTP request failed for {url} with status {status}")]
    HttpStatus {
        url: String,
        status: reqwest::StatusCode,
        #[source]
        source: reqwest::Error,
    },

    #[error("Failed to read response from {0}")]
    ResponseBody(String, #[source] std::io::Error),

    #[error("Failed to parse JSON response from {0}")]
    JsonParse(String, #[source] serde_json::Error),

    #[error("Response from {0} reported success but has no result")]
    MissingResult(String),

    #[error("Failed to map package metadata from {0}")]
    PackageMapping(String, #[source] serde_json::Error),

    #[error("Failed processing DataFrame: {0}")]
    Frame(#[from] PolarsError),
}

impl HttpFailure for OpenDataError {
    fn network(url: String, source: reqwest::Error) -> Self {
        OpenDataError::NetworkRequest(url, source)
    }

    fn status(url: String, status: reqwest::StatusCode, source: reqwest::Error) -> Self {
        OpenDataError::HttpStatus {
            url,
            status,
            source,
        }
    }

    fn body(url: String, source: std::io::Error) -> Self {
        OpenDataError::ResponseBody(url, source)
    }
}
