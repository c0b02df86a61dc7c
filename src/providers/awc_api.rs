//! The aviationweather.gov Data API.

use crate::providers::download::fetch_text;
use crate::providers::error::ProviderError;
use crate::providers::{raw_lines, ObservationProvider, StationProvider};
use crate::types::observation::ObservationKind;
use crate::types::region::{Bounds, WeatherRegion};
use crate::types::station::Station;
use async_trait::async_trait;
use bon::bon;
use futures_util::future::try_join_all;
use log::debug;
use reqwest::Client;
use serde::Deserialize;
use std::time::Duration;

pub const DEFAULT_BASE_URL: &str = "https://aviationweather.gov";
pub(crate) const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);
const DEFAULT_HISTORY_HOURS: u32 = 3;

/// Station record as served by the `stationinfo` endpoint and the station
/// bulk cache file.
#[derive(Debug, Deserialize)]
pub(crate) struct StationInfo {
    #[serde(rename = "icaoId")]
    icao_id: Option<String>,
    lat: f64,
    lon: f64,
    elev: Option<f64>,
    site: Option<String>,
    #[serde(rename = "siteType", default)]
    site_type: Option<Vec<String>>,
}

impl StationInfo {
    fn into_station(self) -> Option<Station> {
        let identifier = self.icao_id.filter(|id| !id.trim().is_empty())?;
        let site_type = self.site_type.unwrap_or_default();
        let offers = |kind: &str| site_type.iter().any(|t| t.eq_ignore_ascii_case(kind));

        Some(Station {
            identifier: identifier.trim().to_string(),
            name: self.site,
            latitude: self.lat,
            longitude: self.lon,
            elevation: self.elev.map(|meters| meters.round() as i32),
            has_metar: offers("METAR"),
            has_taf: offers("TAF"),
        })
    }
}

/// Decodes a JSON array of [`StationInfo`] records. Records that do not
/// decode, or have no ICAO identifier, are skipped.
pub(crate) fn parse_station_info(bytes: &[u8]) -> Result<Vec<Station>, ProviderError> {
    let records: Vec<serde_json::Value> = serde_json::from_slice(bytes)?;
    let total = records.len();
    let stations: Vec<Station> = records
        .into_iter()
        .filter_map(|record| match serde_json::from_value::<StationInfo>(record) {
            Ok(info) => info.into_station(),
            Err(e) => {
                debug!("Skipping malformed station record: {}", e);
                None
            }
        })
        .collect();
    if stations.len() < total {
        debug!("Skipped {} of {} station records", total - stations.len(), total);
    }
    Ok(stations)
}

fn bbox(bounds: &Bounds) -> String {
    format!(
        "{:.4},{:.4},{:.4},{:.4}",
        bounds.min_latitude, bounds.min_longitude, bounds.max_latitude, bounds.max_longitude
    )
}

/// Queries the Data API by bounding box for each request.
#[derive(Debug, Clone)]
pub struct AwcApiProvider {
    client: Client,
    base_url: String,
    history_hours: u32,
}

#[bon]
impl AwcApiProvider {
    /// Creates a provider.
    ///
    /// # Optional Builder Methods
    ///
    /// * `.base_url(String)`: API root, defaults to [`DEFAULT_BASE_URL`].
    /// * `.timeout(Duration)`: Per request timeout, defaults to 30 seconds.
    /// * `.history_hours(u32)`: How far back METAR history reaches, defaults to 3.
    ///
    /// # Errors
    ///
    /// Returns [`ProviderError::ClientBuild`] if the HTTP client cannot be set up.
    #[builder]
    pub fn new(
        base_url: Option<String>,
        timeout: Option<Duration>,
        history_hours: Option<u32>,
    ) -> Result<Self, ProviderError> {
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
            history_hours: history_hours.unwrap_or(DEFAULT_HISTORY_HOURS),
        })
    }

    /// One URL per bounding box; regions across the antimeridian need two.
    fn stations_urls(&self, region: &WeatherRegion) -> Vec<String> {
        region
            .bounds()
            .split_antimeridian()
            .iter()
            .map(|bounds| {
                format!(
                    "{}/api/data/stationinfo?bbox={}&format=json",
                    self.base_url,
                    bbox(bounds)
                )
            })
            .collect()
    }

    fn observations_urls(
        &self,
        kind: ObservationKind,
        region: &WeatherRegion,
        history: bool,
    ) -> Vec<String> {
        region
            .bounds()
            .split_antimeridian()
            .iter()
            .map(|bounds| {
                let mut url = format!(
                    "{}/api/data/{}?bbox={}&format=raw",
                    self.base_url,
                    kind.path_segment(),
                    bbox(bounds)
                );
                if history && kind == ObservationKind::Metar {
                    url.push_str(&format!("&hours={}", self.history_hours));
                }
                url
            })
            .collect()
    }
}

#[async_trait]
impl StationProvider for AwcApiProvider {
    fn name(&self) -> &str {
        "awc-api"
    }

    async fn fetch_stations(&self, region: &WeatherRegion) -> Result<Vec<Station>, ProviderError> {
        let requests = self
            .stations_urls(region)
            .into_iter()
            .map(|url| async move {
                let body = fetch_text(&self.client, &url).await?;
                parse_station_info(body.as_bytes())
            });
        Ok(try_join_all(requests).await?.concat())
    }
}

#[async_trait]
impl ObservationProvider for AwcApiProvider {
    fn name(&self) -> &str {
        "awc-api"
    }

    async fn fetch_observations(
        &self,
        kind: ObservationKind,
        region: &WeatherRegion,
        history: bool,
    ) -> Result<Vec<String>, ProviderError> {
        let requests = self
            .observations_urls(kind, region, history)
            .into_iter()
            .map(|url| async move {
                let body = fetch_text(&self.client, &url).await?;
                let reports = raw_lines(&body);
                debug!("{} {} reports from {}", reports.len(), kind, url);
                Ok::<_, ProviderError>(reports)
            });
        Ok(try_join_all(requests).await?.concat())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_station_info() {
        let json = br#"[
            {"icaoId": "EFHK", "iataId": "HEL", "lat": 60.3172, "lon": 24.9633, "elev": 55.4,
             "site": "Helsinki-Vantaa", "country": "FI", "siteType": ["METAR", "TAF"]},
            {"icaoId": "EFNU", "lat": 60.3339, "lon": 24.2964, "elev": 79, "site": "Nummela",
             "siteType": ["METAR"]},
            {"icaoId": null, "lat": 60.0, "lon": 25.0, "elev": null, "site": "Unnamed"},
            {"icaoId": "EFXX", "lat": 61.0, "lon": 25.0},
            {"icaoId": "EFYY", "lat": null, "lon": 25.0, "siteType": ["METAR"]},
            "not a station"
        ]"#;
        let stations = parse_station_info(json).unwrap();

        assert_eq!(stations.len(), 3);
        assert_eq!(stations[0].identifier, "EFHK");
        assert_eq!(stations[0].name.as_deref(), Some("Helsinki-Vantaa"));
        assert_eq!(stations[0].elevation, Some(55));
        assert!(stations[0].has_metar && stations[0].has_taf);
        assert!(stations[1].has_metar && !stations[1].has_taf);
        assert!(!stations[2].has_observations());
    }

    #[test]
    fn test_parse_station_info_rejects_malformed_json() {
        let result = parse_station_info(b"<html>Service unavailable</html>");
        assert!(matches!(result, Err(ProviderError::JsonParse(_))));
    }

    #[test]
    fn test_urls() {
        let provider = AwcApiProvider::builder()
            .base_url("http://localhost:8080/".to_string())
            .history_hours(6)
            .build()
            .unwrap();
        let region = WeatherRegion::new(0.0, 0.0, 111.195);

        assert_eq!(
            provider.stations_urls(&region),
            vec!["http://localhost:8080/api/data/stationinfo?bbox=-1.0000,-1.0000,1.0000,1.0000&format=json"]
        );
        assert_eq!(
            provider.observations_urls(ObservationKind::Metar, &region, true),
            vec!["http://localhost:8080/api/data/metar?bbox=-1.0000,-1.0000,1.0000,1.0000&format=raw&hours=6"]
        );
        // TAFs never ask for history
        assert_eq!(
            provider.observations_urls(ObservationKind::Taf, &region, true),
            vec!["http://localhost:8080/api/data/taf?bbox=-1.0000,-1.0000,1.0000,1.0000&format=raw"]
        );
    }

    #[test]
    fn test_urls_split_at_antimeridian() {
        let provider = AwcApiProvider::builder().build().unwrap();
        let region = WeatherRegion::new(0.0, 180.0, 111.195);

        assert_eq!(
            provider.observations_urls(ObservationKind::Taf, &region, false),
            vec![
                "https://aviationweather.gov/api/data/taf?bbox=-1.0000,179.0000,1.0000,180.0000&format=raw",
                "https://aviationweather.gov/api/data/taf?bbox=-1.0000,-180.0000,1.0000,-179.0000&format=raw",
            ]
        );
    }
}
