use thiserror::Error;

#[derive(Debug, Error)]
pub enum ProviderError {
    #[error("Failed to build HTTP client")]
    ClientBuild(#[source] reqwest::Error),

    #[error("Network request failed for {0}")]
    NetworkRequest(String, #[source] reqwest::Error),

    #[error("HTTP request failed for {url} with status {status}")]
    HttpStatus {
        url: String,
        status: reqwest::StatusCode,
        #[source]
        source: reqwest::Error,
    },

    // Covers errors during download stream processing and decompression
    #[error("Data download or decompression failed")]
    DownloadIo(#[from] std::io::Error),

    #[error("Failed to parse JSON data")]
    JsonParse(#[from] serde_json::Error),

    #[error("Failed to parse CSV data")]
    CsvParse(#[from] csv::Error),

    #[error("Bulk file {url} has no '{column}' column")]
    MissingColumn { url: String, column: &'static str },

    // Covers errors joining tokio blocking tasks
    #[error("Background task failed to complete")]
    TaskJoin(#[from] tokio::task::JoinError),

    #[error("Provider {provider} is unavailable: {message}")]
    Unavailable { provider: String, message: String },
}
