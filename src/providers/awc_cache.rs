//! The aviationweather.gov bulk cache files: gzip compressed snapshots of
//! all current stations and reports worldwide, filtered locally by region.

use crate::providers::awc_api::{parse_station_info, DEFAULT_BASE_URL, DEFAULT_TIMEOUT};
use crate::providers::download::fetch_gzip;
use crate::providers::error::ProviderError;
use crate::providers::{ObservationProvider, StationProvider};
use crate::types::observation::ObservationKind;
use crate::types::region::WeatherRegion;
use crate::types::station::Station;
use async_trait::async_trait;
use bon::bon;
use csv::ReaderBuilder;
use log::debug;
use reqwest::Client;
use std::time::Duration;
use tokio::task;

const HEADER_START: &str = "raw_text";

#[derive(Debug, Clone)]
pub struct AwcCacheProvider {
    client: Client,
    base_url: String,
}

#[bon]
impl AwcCacheProvider {
    /// Creates a provider reading `{base_url}/data/cache/*.gz`.
    #[builder]
    pub fn new(base_url: Option<String>, timeout: Option<Duration>) -> Result<Self, ProviderError> {
        let client = Client::builder()
            .timeout(timeout.unwrap_or(DEFAULT_TIMEOUT))
            .build()
            .map_err(ProviderError::ClientBuild)?;
        Ok(Self {
            client,
            base_url: base_url
                .unwrap_or_else(|| DEFAULT_BASE_URL.to_string())
                .trim_end_matches('/')
                .to_string(),
        })
    }

    fn cache_url(&self, file: &str) -> String {
        format!("{}/data/cache/{}", self.base_url, file)
    }
}

/// Extracts the `raw_text` of every CSV row located inside `region`.
///
/// The files start with a few status lines before the header row, which is
/// recognized by its first column.
pub(crate) fn reports_in_region(
    csv_bytes: &[u8],
    region: &WeatherRegion,
    url: &str,
) -> Result<Vec<String>, ProviderError> {
    let header_start = HEADER_START.as_bytes();
    let Some(header_offset) = (0..csv_bytes.len()).find(|&offset| {
        csv_bytes[offset..].starts_with(header_start)
            && (offset == 0 || csv_bytes[offset - 1] == b'\n')
    }) else {
        return Err(ProviderError::MissingColumn {
            url: url.to_string(),
            column: HEADER_START,
        });
    };

    let mut reader = ReaderBuilder::new()
        .has_headers(true)
        .flexible(true)
        .from_reader(&csv_bytes[header_offset..]);

    let headers = reader.headers()?.clone();
    let column = |name: &'static str| {
        headers
            .iter()
            .position(|header| header == name)
            .ok_or_else(|| ProviderError::MissingColumn {
                url: url.to_string(),
                column: name,
            })
    };
    let (raw_column, latitude_column, longitude_column) =
        (column(HEADER_START)?, column("latitude")?, column("longitude")?);

    let mut reports = Vec::new();
    for (row, record) in reader.records().enumerate() {
        let record = match record {
            Ok(record) => record,
            Err(e) => {
                debug!("Skipping malformed row {} of {}: {}", row + 1, url, e);
                continue;
            }
        };
        let coordinate = |index: usize| record.get(index).and_then(|v| v.trim().parse::<f64>().ok());
        let (Some(latitude), Some(longitude)) =
            (coordinate(latitude_column), coordinate(longitude_column))
        else {
            continue;
        };
        if !region.in_range(latitude, longitude) {
            continue;
        }
        if let Some(raw) = record.get(raw_column).map(str::trim).filter(|raw| !raw.is_empty()) {
            reports.push(raw.to_string());
        }
    }
    Ok(reports)
}

#[async_trait]
impl StationProvider for AwcCacheProvider {
    fn name(&self) -> &str {
        "awc-cache"
    }

    async fn fetch_stations(&self, _region: &WeatherRegion) -> Result<Vec<Station>, ProviderError> {
        let url = self.cache_url("stations.cache.json.gz");
        let bytes = fetch_gzip(&self.client, &url).await?;
        task::spawn_blocking(move || parse_station_info(&bytes)).await?
    }
}

#[async_trait]
impl ObservationProvider for AwcCacheProvider {
    fn name(&self) -> &str {
        "awc-cache"
    }

    async fn fetch_observations(
        &self,
        kind: ObservationKind,
        region: &WeatherRegion,
        history: bool,
    ) -> Result<Vec<String>, ProviderError> {
        if history {
            debug!("Bulk {} file only holds current reports, history ignored", kind);
        }
        let url = self.cache_url(&format!("{}s.cache.csv.gz", kind.path_segment()));
        let bytes = fetch_gzip(&self.client, &url).await?;

        let region = *region;
        task::spawn_blocking(move || reports_in_region(&bytes, &region, &url)).await?
    }
}
