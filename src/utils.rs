use futures_util::TryStreamExt;
use log::{info, warn};
use reqwest::{Client, Response, StatusCode};
use tokio::io::AsyncReadExt;
use tokio_util::io::StreamReader;

/// Lets the shared download helpers build the error type of the calling module.
pub(crate) trait HttpFailure: Sized {
    fn network(url: String, source: reqwest::Error) -> Self;

    fn status(url: String, status: StatusCode, source: reqwest::Error) -> Self;

    fn body(url: String, source: std::io::Error) -> Self;
}

/// GETs `url` and returns the full body. Non-2xx statuses are errors.
pub(crate) async fn download<E: HttpFailure>(
    client: &Client,
    url: &str,
    query: &[(&str, &str)],
) -> Result<Vec<u8>, E> {
    info!("Downloading data from {}", url);
    let response = send::<E>(client, url, query).await?;

    let response = match response.error_for_status() {
        Ok(resp) => resp,
        Err(e) => {
            warn!("HTTP error for {}: {:?}", url, e);
            return Err(match e.status() {
                Some(status) => E::status(url.to_string(), status, e),
                None => E::network(url.to_string(), e),
            });
        }
    };

    read_body(response, url).await
}

/// GETs `url` and returns the body whatever the status code.
///
/// CKAN answers failed actions with a JSON body and a 4xx status, so the
/// caller has to look at the payload instead.
pub(crate) async fn download_unchecked<E: HttpFailure>(
    client: &Client,
    url: &str,
    query: &[(&str, &str)],
) -> Result<Vec<u8>, E> {
    let response = send::<E>(client, url, query).await?;
    read_body(response, url).await
}

async fn send<E: HttpFailure>(
    client: &Client,
    url: &str,
    query: &[(&str, &str)],
) -> Result<Response, E> {
    client
        .get(url)
        .query(query)
        .send()
        .await
        .map_err(|e| E::network(url.to_string(), e))
}

async fn read_body<E: HttpFailure>(response: Response, url: &str) -> Result<Vec<u8>, E> {
    let stream = response
        .bytes_stream()
        .map_err(|e| std::io::Error::new(std::io::ErrorKind::Other, e));
    let mut reader = StreamReader::new(stream);
    let mut body = Vec::new();
    reader
        .read_to_end(&mut body)
        .await
        .map_err(|e| E::body(url.to_string(), e))?;
    Ok(body)
}
