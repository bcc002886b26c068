use crate::utils::HttpFailure;
use polars::error::PolarsError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum DatasetError {
    #[error("Network request failed for {0}")]
    NetworkRequest(String, #[source] reqwest::Error),

    #[error("HTTP request failed for {url} with status {status}")]
    HttpStatus {
        url: String,
        status: reqwest::StatusCode,
        #[source]
        source: reqwest::Error,
    },

    #[error("Data download failed for {0}")]
    DownloadIo(String, #[source] std::io::Error),

    // Errors during parsing (inside blocking task)
    #[error("Parsing error processing CSV data from {url}")]
    CsvRead {
        url: String,
        #[source]
        source: PolarsError,
    },
    #[error("Parsing error processing parquet data from {url}")]
    ParquetRead {
        url: String,
        #[source]
        source: PolarsError,
    },

    #[error("Background task failed to complete")]
    TaskJoin(#[from] tokio::task::JoinError),
}

impl HttpFailure for DatasetError {
    fn network(url: String, source: reqwest::Error) -> Self {
        DatasetError::NetworkRequest(url, source)
    }

    fn status(url: String, status: reqwest::StatusCode, source: reqwest::Error) -> Self {
        DatasetError::HttpStatus {
            url,
            status,
            source,
        }
    }

    fn body(url: String, source: std::io::Error) -> Self {
        DatasetError::DownloadIo(url, source)
    }
}
