use crate::providers::error::ProviderError;
use async_compression::tokio::bufread::GzipDecoder;
use futures_util::TryStreamExt;
use log::{info, warn};
use reqwest::{Client, Response};
use tokio::io::{AsyncReadExt, BufReader};
use tokio_util::io::StreamReader;

async fn send(client: &Client, url: &str) -> Result<Response, ProviderError> {
    let response = client
        .get(url)
        .send()
        .await
        .map_err(|e| ProviderError::NetworkRequest(url.to_string(), e))?;

    match response.error_for_status() {
        Ok(response) => Ok(response),
        Err(e) => {
            warn!("HTTP error for {}: {:?}", url, e);
            Err(if let Some(status) = e.status() {
                ProviderError::HttpStatus {
                    url: url.to_string(),
                    status,
                    source: e,
                }
            } else {
                ProviderError::NetworkRequest(url.to_string(), e)
            })
        }
    }
}

/// Fetches a response body as text.
pub(crate) async fn fetch_text(client: &Client, url: &str) -> Result<String, ProviderError> {
    info!("Requesting {}", url);
    send(client, url)
        .await?
        .text()
        .await
        .map_err(|e| ProviderError::NetworkRequest(url.to_string(), e))
}

/// Downloads a gzip file and decompresses it while streaming.
pub(crate) async fn fetch_gzip(client: &Client, url: &str) -> Result<Vec<u8>, ProviderError> {
    info!("Downloading {}", url);
    let response = send(client, url).await?;

    let stream = response
        .bytes_stream()
        .map_err(|e| std::io::Error::new(std::io::ErrorKind::Other, e));
    let stream_reader = StreamReader::new(stream);
    let mut decoder = GzipDecoder::new(BufReader::new(stream_reader));
    let mut decompressed = Vec::new();
    decoder.read_to_end(&mut decompressed).await?;

    info!(
        "Downloaded and decompressed {} bytes from {}",
        decompressed.len(),
        url
    );
    Ok(decompressed)
}
