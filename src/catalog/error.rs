use crate::utils::HttpFailure;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum CatalogError {
    #[error("Network request failed for {0}")]
    NetworkRequest(String, #[source] reqwest::Error),

    #[error("HTTP request failed for {url} with status {status}")]
    HttpStatus {
        url: String,
        status: reqwest::StatusCode,
        #[source]
        source: reqwest::Error,
    },

    #[error("Failed to read catalog page from {0}")]
    ResponseBody(String, #[source] std::io::Error),

    #[error("Failed to parse catalog page from {0}")]
    JsonParse(String, #[source] serde_json::Error),

    // The page parsed but has no `result` array, so pagination can't continue
    #[error("Catalog page from {0} has no result list")]
    MissingResult(String),

    #[error("Failed to map package {index} of page at offset {offset}")]
    RecordMapping {
        offset: usize,
        index: usize,
        #[source]
        source: serde_json::Error,
    },
}

impl HttpFailure for CatalogError {
    fn network(url: String, source: reqwest::Error) -> Self {
        CatalogError::NetworkRequest(url, source)
    }

    fn status(url: String, status: reqwest::StatusCode, source: reqwest::Error) -> Self {
        CatalogError::HttpStatus {
            url,
            status,
            source,
        }
    }

    fn body(url: String, source: std::io::Error) -> Self {
        CatalogError::ResponseBody(url, source)
    }
}
