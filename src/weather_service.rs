//! The refresh pipeline: fetch from every provider, parse and reconcile,
//! commit to the store and read back.

use crate::config::RegionConfig;
use crate::error::WeatherError;
use crate::interpolation::field::{samples_from_metars, GridProjection, HeatField};
use crate::interpolation::grid::{GridConfig, HeatGrid};
use crate::interpolation::heat_map::HeatMap;
use crate::parser;
use crate::providers::awc_api::AwcApiProvider;
use crate::providers::awc_cache::AwcCacheProvider;
use crate::providers::{ObservationProvider, StationProvider};
use crate::reconcile::Reconciler;
use crate::stations::locate_station::StationLocator;
use crate::store::weather_store::{CollectionKind, WeatherStore};
use crate::types::observation::{Observation, ObservationKind, Observations};
use crate::types::region::WeatherRegion;
use crate::types::station::Station;
use crate::utils::{ensure_cache_dir_exists, get_cache_dir};
use bon::bon;
use chrono::{DateTime, Utc};
use futures_util::future::try_join_all;
use log::{debug, info, warn};
use std::path::PathBuf;
use std::sync::Arc;
use tokio::sync::Mutex;
use tokio::task;

/// Fetches, reconciles and caches stations and observations for the
/// configured [`WeatherRegion`].
///
/// Every refresh asks all providers at once and fails as a whole if any of
/// them fails, leaving the cached data untouched. Reads never touch the
/// network.
///
/// # Examples
///
/// ```rust,no_run
/// # use aviwx::{WeatherError, WeatherRegion, WeatherService};
/// # async fn run() -> Result<(), WeatherError> {
/// let service = WeatherService::new().await?;
/// service.set_region(&WeatherRegion::new(60.17, 24.94, 150.0)).await?;
///
/// let stations = service.refresh_stations().await?;
/// let observations = service.refresh_observations().await?;
/// println!("{} stations, {} metars", stations.len(), observations.metars.len());
/// # Ok(())
/// # }
/// ```
pub struct WeatherService {
    store: WeatherStore,
    region_config: RegionConfig,
    station_providers: Vec<Arc<dyn StationProvider>>,
    observation_providers: Vec<Arc<dyn ObservationProvider>>,
    metar_history: bool,
    // one refresh per collection at a time
    station_refresh: Mutex<()>,
    observation_refresh: Mutex<()>,
}

#[bon]
impl WeatherService {
    /// Opens a service, loading any previously cached data.
    ///
    /// This method uses a builder pattern, finish it with `.call().await`.
    ///
    /// # Optional Builder Methods
    ///
    /// * `.cache_folder(PathBuf)`: Where the store file lives. Defaults to
    ///   `aviwx_cache` in the platform cache directory.
    /// * `.config_folder(PathBuf)`: Where `region.json` lives. Defaults to
    ///   `aviwx` in the platform configuration directory.
    /// * `.station_providers(Vec<Arc<dyn StationProvider>>)` and
    ///   `.observation_providers(Vec<Arc<dyn ObservationProvider>>)`: Data
    ///   sources. Both default to the aviationweather.gov Data API and bulk
    ///   cache files.
    /// * `.metar_history(bool)`: Ask providers for older METARs too.
    ///   Defaults to `true`.
    ///
    /// # Errors
    ///
    /// Returns [`WeatherError::CacheDirResolution`] or
    /// [`WeatherError::Config`] if a default directory cannot be determined,
    /// [`WeatherError::CacheDirCreation`] if the cache directory cannot be
    /// created and [`WeatherError::Store`] if the cached data cannot be read.
    ///
    /// # Examples
    ///
    /// ```rust,no_run
    /// # use aviwx::{WeatherError, WeatherService};
    /// # use std::path::PathBuf;
    /// # async fn run() -> Result<(), WeatherError> {
    /// let service = WeatherService::open()
    ///     .cache_folder(PathBuf::from("/tmp/aviwx/cache"))
    ///     .config_folder(PathBuf::from("/tmp/aviwx/config"))
    ///     .metar_history(false)
    ///     .call()
    ///     .await?;
    /// # Ok(())
    /// # }
    /// ```
    #[builder]
    pub async fn open(
        cache_folder: Option<PathBuf>,
        config_folder: Option<PathBuf>,
        station_providers: Option<Vec<Arc<dyn StationProvider>>>,
        observation_providers: Option<Vec<Arc<dyn ObservationProvider>>>,
        metar_history: Option<bool>,
    ) -> Result<Self, WeatherError> {
        let cache_folder = match cache_folder {
            Some(folder) => folder,
            None => get_cache_dir().map_err(WeatherError::CacheDirResolution)?,
        };
        ensure_cache_dir_exists(&cache_folder)
            .await
            .map_err(|e| WeatherError::CacheDirCreation(cache_folder.clone(), e))?;

        let region_config = match config_folder {
            Some(folder) => RegionConfig::new(&folder),
            None => RegionConfig::default_location()?,
        };

        let (station_providers, observation_providers) =
            match (station_providers, observation_providers) {
                (Some(stations), Some(observations)) => (stations, observations),
                (stations, observations) => {
                    let (api, cache) = default_providers()?;
                    (
                        stations.unwrap_or_else(|| {
                            vec![
                                api.clone() as Arc<dyn StationProvider>,
                                cache.clone() as Arc<dyn StationProvider>,
                            ]
                        }),
                        observations.unwrap_or_else(|| {
                            vec![
                                api as Arc<dyn ObservationProvider>,
                                cache as Arc<dyn ObservationProvider>,
                            ]
                        }),
                    )
                }
            };

        Ok(Self {
            store: WeatherStore::open(&cache_folder).await?,
            region_config,
            station_providers,
            observation_providers,
            metar_history: metar_history.unwrap_or(true),
            station_refresh: Mutex::new(()),
            observation_refresh: Mutex::new(()),
        })
    }

    /// Opens a service with default folders and providers.
    pub async fn new() -> Result<Self, WeatherError> {
        Self::open().call().await
    }

    pub fn region_config(&self) -> &RegionConfig {
        &self.region_config
    }

    /// The configured region.
    ///
    /// # Errors
    ///
    /// [`WeatherError::RegionNotSet`] when no region has been saved.
    pub async fn region(&self) -> Result<WeatherRegion, WeatherError> {
        self.region_config
            .load()
            .await?
            .ok_or(WeatherError::RegionNotSet)
    }

    pub async fn set_region(&self, region: &WeatherRegion) -> Result<(), WeatherError> {
        Ok(self.region_config.save(region).await?)
    }

    /// Fetches stations from every provider without storing them. Only
    /// stations inside `region` that issue METARs or TAFs are returned.
    pub async fn query_stations(
        &self,
        region: &WeatherRegion,
    ) -> Result<Vec<Station>, WeatherError> {
        let requests = self.station_providers.iter().map(|provider| async move {
            provider.fetch_stations(region).await.map_err(|source| {
                warn!("Station provider {} failed: {}", provider.name(), source);
                WeatherError::Transport {
                    provider: provider.name().to_string(),
                    source,
                }
            })
        });
        let batches = try_join_all(requests).await?;

        let fetched: usize = batches.iter().map(Vec::len).sum();
        let stations: Vec<Station> = batches
            .into_iter()
            .flatten()
            .filter(|station| {
                station.has_observations() && region.in_range(station.latitude, station.longitude)
            })
            .collect();
        debug!(
            "{} of {} fetched stations are inside the region",
            stations.len(),
            fetched
        );
        Ok(stations)
    }

    /// Refreshes the station cache for the configured region.
    ///
    /// Fails with [`WeatherError::RegionNotSet`] before any network request
    /// when no region is configured. See [`Self::refresh_stations_at`].
    pub async fn refresh_stations(&self) -> Result<Vec<Station>, WeatherError> {
        let region = self.region().await?;
        self.refresh_stations_at(&region).await
    }

    /// Fetches stations for `region` from every provider and replaces the
    /// whole station collection with the ones inside the region. METARs and
    /// TAFs of stations that are gone are deleted in the same commit.
    ///
    /// # Errors
    ///
    /// [`WeatherError::Transport`] for the first failing provider and
    /// [`WeatherError::Store`] if the new stations cannot be written. In both
    /// cases the cached stations are unchanged.
    pub async fn refresh_stations_at(
        &self,
        region: &WeatherRegion,
    ) -> Result<Vec<Station>, WeatherError> {
        let _refresh = self.station_refresh.lock().await;

        let stations = self.query_stations(region).await?;
        // an observation refresh reconciled against the old stations must not
        // commit after the prune
        let _observations = self.observation_refresh.lock().await;
        let pruned = self
            .store
            .transaction(|tx| {
                tx.replace_all(stations.clone().into());
                tx.prune_orphans()
            })
            .await?;
        info!(
            "Refreshed {} stations, dropped {} orphaned observations",
            stations.len(),
            pruned
        );
        Ok(stations)
    }

    /// Refreshes the observation cache for the configured region.
    ///
    /// Fails with [`WeatherError::RegionNotSet`] before any network request
    /// when no region is configured. See [`Self::refresh_observations_at`].
    pub async fn refresh_observations(&self) -> Result<Observations, WeatherError> {
        let region = self.region().await?;
        self.refresh_observations_at(&region).await
    }

    /// Fetches METARs and TAFs for `region` and replaces the cached ones.
    ///
    /// Every provider is asked for every kind it serves, all at once. Reports
    /// that do not parse or do not belong to exactly one cached station are
    /// dropped. Old METARs and TAFs are deleted and the new ones inserted in a
    /// single commit, and the committed observations are returned.
    ///
    /// # Errors
    ///
    /// [`WeatherError::Transport`] for the first failing provider and
    /// [`WeatherError::Store`] if the commit cannot be written. In both cases
    /// the cached observations are unchanged.
    pub async fn refresh_observations_at(
        &self,
        region: &WeatherRegion,
    ) -> Result<Observations, WeatherError> {
        let _refresh = self.observation_refresh.lock().await;

        let requests = self.observation_providers.iter().flat_map(|provider| {
            provider.kinds().iter().map(move |&kind| async move {
                let history = self.metar_history && kind == ObservationKind::Metar;
                provider
                    .fetch_observations(kind, region, history)
                    .await
                    .map(|reports| (kind, reports))
                    .map_err(|source| {
                        warn!("{} provider {} failed: {}", kind, provider.name(), source);
                        WeatherError::Transport {
                            provider: provider.name().to_string(),
                            source,
                        }
                    })
            })
        });
        let batches = try_join_all(requests).await?;

        let reference = Utc::now();
        let mut parsed: Vec<Observation> = Vec::new();
        for (kind, reports) in batches {
            for raw in reports {
                match parser::parse(kind, &raw, reference) {
                    Ok(observation) => parsed.push(observation),
                    Err(e) => debug!("Dropping {} '{}': {}", kind, raw, e),
                }
            }
        }

        let stations = self.store.stations().await;
        let observations = Reconciler::new(&stations).reconcile(parsed);
        self.store
            .transaction(|tx| {
                tx.delete_all(CollectionKind::Metars);
                tx.delete_all(CollectionKind::Tafs);
                tx.upsert(observations.metars.into());
                tx.upsert(observations.tafs.into());
            })
            .await?;

        let committed = self.store.observations().await;
        info!(
            "Refreshed {} metars and {} tafs",
            committed.metars.len(),
            committed.tafs.len()
        );
        Ok(committed)
    }

    /// Cached observations, METARs by observation time and TAFs by validity
    /// start.
    pub async fn observations(&self) -> Observations {
        self.store.observations().await
    }

    pub async fn station_count(&self) -> usize {
        self.store.count(CollectionKind::Stations).await
    }

    /// Cached stations ordered by identifier.
    pub async fn stations(&self) -> Vec<Station> {
        self.store.stations().await
    }

    pub async fn station(&self, identifier: &str) -> Option<Station> {
        self.store.station(identifier).await
    }

    /// The cached station an observation was reported by.
    pub async fn station_for(&self, observation: &Observation) -> Option<Station> {
        self.store.station_for(observation).await
    }

    /// The cached station closest to a coordinate, within `max_distance_km`.
    pub async fn nearest_station(
        &self,
        latitude: f64,
        longitude: f64,
        max_distance_km: f64,
    ) -> Option<(Station, f64)> {
        StationLocator::new(self.store.stations().await).nearest(
            latitude,
            longitude,
            max_distance_km,
        )
    }

    /// Renders `field` over the configured region from each station's latest
    /// METAR at or before `until`, using the field's default bands.
    pub async fn heat_map(
        &self,
        field: HeatField,
        config: GridConfig,
        until: DateTime<Utc>,
    ) -> Result<HeatGrid, WeatherError> {
        let region = self.region().await?;
        let observations = self.store.observations().await;
        let stations = self.store.stations().await;

        let projection = GridProjection::new(&region, &config);
        let samples = samples_from_metars(
            observations.latest_metars(until),
            &stations,
            field,
            &projection,
        );
        debug!("Rendering {:?} heat map from {} samples", field, samples.len());

        let steps = field.default_steps();
        Ok(task::spawn_blocking(move || HeatMap::render(&samples, &config, &steps)).await?)
    }
}

fn default_providers() -> Result<(Arc<AwcApiProvider>, Arc<AwcCacheProvider>), WeatherError> {
    let api = AwcApiProvider::builder()
        .build()
        .map_err(|source| WeatherError::Transport {
            provider: "awc-api".to_string(),
            source,
        })?;
    let cache = AwcCacheProvider::builder()
        .build()
        .map_err(|source| WeatherError::Transport {
            provider: "awc-cache".to_string(),
            source,
        })?;
    Ok((Arc::new(api), Arc::new(cache)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::interpolation::steps::Band;
    use crate::providers::mock::{StaticReports, StaticStations};
    use chrono::Duration;
    use std::sync::atomic::Ordering;
    use tempfile::TempDir;

    const REGION: WeatherRegion = WeatherRegion {
        latitude: 60.3,
        longitude: 24.9,
        radius_km: 100.0,
    };

    fn day_time(time: DateTime<Utc>) -> String {
        time.format("%d%H%MZ").to_string()
    }

    fn metar(identifier: &str, minutes_ago: i64, temperature: i32) -> String {
        let time = Utc::now() - Duration::minutes(minutes_ago);
        format!(
            "METAR {identifier} {} 24005KT 9999 FEW020 {temperature:02}/00 Q1012",
            day_time(time)
        )
    }

    fn taf(identifier: &str, hours_ahead: i64) -> String {
        let issued = Utc::now() - Duration::minutes(20);
        let from = issued + Duration::hours(hours_ahead);
        let to = from + Duration::hours(24);
        format!(
            "TAF {identifier} {} {}/{} 22010KT 9999 SCT020",
            day_time(issued),
            from.format("%d%H"),
            to.format("%d%H")
        )
    }

    fn stations() -> Vec<Station> {
        vec![
            Station::new("EFHK", 60.32, 24.96, true, true),
            Station::new("EFNU", 60.33, 24.30, true, false),
        ]
    }

    struct Fixture {
        _dir: TempDir,
        service: WeatherService,
        station_providers: Vec<Arc<StaticStations>>,
        report_providers: Vec<Arc<StaticReports>>,
    }

    async fn fixture(
        station_providers: Vec<StaticStations>,
        report_providers: Vec<StaticReports>,
        with_region: bool,
    ) -> Fixture {
        let dir = tempfile::tempdir().unwrap();
        let station_providers: Vec<_> = station_providers.into_iter().map(Arc::new).collect();
        let report_providers: Vec<_> = report_providers.into_iter().map(Arc::new).collect();

        let service = WeatherService::open()
            .cache_folder(dir.path().join("cache"))
            .config_folder(dir.path().join("config"))
            .station_providers(
                station_providers
                    .iter()
                    .map(|p| p.clone() as Arc<dyn StationProvider>)
                    .collect(),
            )
            .observation_providers(
                report_providers
                    .iter()
                    .map(|p| p.clone() as Arc<dyn ObservationProvider>)
                    .collect(),
            )
            .call()
            .await
            .unwrap();
        if with_region {
            service.set_region(&REGION).await.unwrap();
        }

        Fixture {
            _dir: dir,
            service,
            station_providers,
            report_providers,
        }
    }

    #[tokio::test]
    async fn test_missing_region_fails_before_any_request() {
        let f = fixture(
            vec![StaticStations::new("a", stations())],
            vec![StaticReports::new("a", vec![metar("EFHK", 10, 5)], vec![])],
            false,
        )
        .await;

        assert!(matches!(
            f.service.refresh_stations().await,
            Err(WeatherError::RegionNotSet)
        ));
        assert!(matches!(
            f.service.refresh_observations().await,
            Err(WeatherError::RegionNotSet)
        ));
        assert_eq!(f.station_providers[0].calls.load(Ordering::SeqCst), 0);
        assert_eq!(f.report_providers[0].calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_station_refresh_is_idempotent() {
        let f = fixture(vec![StaticStations::new("a", stations())], vec![], true).await;

        let first = f.service.refresh_stations().await.unwrap();
        let stored = f.service.stations().await;
        let second = f.service.refresh_stations().await.unwrap();

        assert_eq!(first, second);
        assert_eq!(f.service.stations().await, stored);
        assert_eq!(f.service.station_count().await, 2);
    }

    #[tokio::test]
    async fn test_station_refresh_filters_region_and_capabilities() {
        let mut listed = stations();
        listed.push(Station::new("ESSA", 59.65, 17.92, true, true));
        listed.push(Station::new("EFHF", 60.25, 25.04, false, false));
        let f = fixture(vec![StaticStations::new("a", listed)], vec![], true).await;

        let kept = f.service.refresh_stations().await.unwrap();
        let ids: Vec<_> = kept.iter().map(|s| s.identifier.as_str()).collect();
        assert_eq!(ids, vec!["EFHK", "EFNU"]);
        assert!(f.service.station("ESSA").await.is_none());
        assert!(f.service.station("EFHF").await.is_none());
    }

    #[tokio::test]
    async fn test_stations_from_all_providers_are_merged() {
        let f = fixture(
            vec![
                StaticStations::new("a", vec![Station::new("A", 60.3, 24.9, true, false)]),
                StaticStations::new("b", vec![Station::new("B", 60.3, 24.9, false, true)]),
            ],
            vec![],
            true,
        )
        .await;

        f.service.refresh_stations().await.unwrap();
        let ids: Vec<_> = f
            .service
            .stations()
            .await
            .into_iter()
            .map(|s| s.identifier)
            .collect();
        assert_eq!(ids, vec!["A", "B"]);
    }

    #[tokio::test]
    async fn test_station_refresh_drops_observations_of_removed_stations() {
        let f = fixture(
            vec![StaticStations::new("a", stations())],
            vec![StaticReports::new(
                "a",
                vec![metar("EFHK", 10, 5), metar("EFNU", 10, 3)],
                vec![taf("EFHK", 1)],
            )],
            true,
        )
        .await;
        f.service.refresh_stations().await.unwrap();
        f.service.refresh_observations().await.unwrap();

        // EFNU is about 50 km from this center
        let smaller = WeatherRegion::new(60.32, 25.2, 20.0);
        let kept = f.service.refresh_stations_at(&smaller).await.unwrap();
        assert_eq!(kept.len(), 1);

        let observations = f.service.observations().await;
        let ids: Vec<_> = observations
            .metars
            .iter()
            .map(|m| m.identifier.as_str())
            .collect();
        assert_eq!(ids, vec!["EFHK"]);
        assert_eq!(observations.tafs.len(), 1);
        for metar in &observations.metars {
            let observation = Observation::Metar(metar.clone());
            assert!(f.service.station_for(&observation).await.is_some());
        }
    }

    #[tokio::test]
    async fn test_failed_station_refresh_keeps_cache() {
        let f = fixture(
            vec![
                StaticStations::new("a", stations()),
                StaticStations::new("b", vec![Station::new("EFTU", 60.51, 22.26, true, true)]),
            ],
            vec![],
            true,
        )
        .await;
        f.service.refresh_stations().await.unwrap();
        let before = f.service.stations().await;

        f.station_providers[1].fail.store(true, Ordering::SeqCst);
        let result = f.service.refresh_stations().await;

        match result {
            Err(WeatherError::Transport { provider, .. }) => assert_eq!(provider, "b"),
            other => panic!("expected transport error, got {other:?}"),
        }
        assert_eq!(f.service.stations().await, before);
    }

    #[tokio::test]
    async fn test_observation_refresh_reconciles_and_orders() {
        let f = fixture(
            vec![StaticStations::new("a", stations())],
            vec![
                StaticReports::new(
                    "a",
                    vec![
                        metar("EFHK", 10, 5),
                        metar("ESSA", 10, 2),
                        "EFHK garbage".to_string(),
                    ],
                    vec![taf("EFHK", 1)],
                ),
                StaticReports::new("b", vec![metar("EFNU", 40, 3), metar("EFHK", 70, 4)], vec![]),
            ],
            true,
        )
        .await;
        f.service.refresh_stations().await.unwrap();

        let observations = f.service.refresh_observations().await.unwrap();
        let metars: Vec<_> = observations
            .metars
            .iter()
            .map(|m| (m.identifier.as_str(), m.temperature))
            .collect();
        assert_eq!(
            metars,
            vec![("EFHK", Some(4)), ("EFNU", Some(3)), ("EFHK", Some(5))]
        );
        assert!(observations
            .metars
            .windows(2)
            .all(|w| w[0].datetime <= w[1].datetime));
        assert_eq!(observations.tafs.len(), 1);
        assert_eq!(f.service.observations().await, observations);

        let resolved = f
            .service
            .station_for(&Observation::Metar(observations.metars[1].clone()))
            .await
            .unwrap();
        assert_eq!(resolved.identifier, "EFNU");

        // history is only requested for metars
        for provider in &f.report_providers {
            assert_eq!(provider.calls.load(Ordering::SeqCst), 2);
            assert_eq!(provider.history_requests.load(Ordering::SeqCst), 1);
        }
    }

    #[tokio::test]
    async fn test_observation_refresh_replaces_previous_rows() {
        let f = fixture(
            vec![StaticStations::new("a", stations())],
            vec![StaticReports::new("a", vec![metar("EFHK", 10, 5)], vec![taf("EFHK", 1)])],
            true,
        )
        .await;
        f.service.refresh_stations().await.unwrap();
        f.service.refresh_observations().await.unwrap();
        let again = f.service.refresh_observations().await.unwrap();

        assert_eq!(again.metars.len(), 1);
        assert_eq!(again.tafs.len(), 1);
    }

    #[tokio::test]
    async fn test_failed_observation_refresh_keeps_cache() {
        let f = fixture(
            vec![StaticStations::new("a", stations())],
            vec![
                StaticReports::new("a", vec![metar("EFHK", 10, 5)], vec![]),
                StaticReports::new("b", vec![metar("EFNU", 10, 3)], vec![]),
            ],
            true,
        )
        .await;
        f.service.refresh_stations().await.unwrap();
        let before = f.service.refresh_observations().await.unwrap();

        f.report_providers[0].fail.store(true, Ordering::SeqCst);
        let result = f.service.refresh_observations().await;

        assert!(matches!(result, Err(WeatherError::Transport { .. })));
        assert_eq!(f.service.observations().await, before);
    }

    #[tokio::test]
    async fn test_observations_before_station_refresh_are_dropped() {
        let f = fixture(
            vec![StaticStations::new("a", stations())],
            vec![StaticReports::new("a", vec![metar("EFHK", 10, 5)], vec![])],
            true,
        )
        .await;

        let observations = f.service.refresh_observations().await.unwrap();
        assert!(observations.is_empty());
    }

    #[tokio::test]
    async fn test_metar_history_can_be_disabled() {
        let dir = tempfile::tempdir().unwrap();
        let reports = Arc::new(StaticReports::new("a", vec![], vec![]));
        let service = WeatherService::open()
            .cache_folder(dir.path().join("cache"))
            .config_folder(dir.path().join("config"))
            .station_providers(vec![])
            .observation_providers(vec![reports.clone() as Arc<dyn ObservationProvider>])
            .metar_history(false)
            .call()
            .await
            .unwrap();

        service.refresh_observations_at(&REGION).await.unwrap();
        assert_eq!(reports.calls.load(Ordering::SeqCst), 2);
        assert_eq!(reports.history_requests.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_nearest_station_and_heat_map() {
        let f = fixture(
            vec![StaticStations::new("a", stations())],
            vec![StaticReports::new(
                "a",
                vec![metar("EFHK", 10, 25), metar("EFNU", 10, 25)],
                vec![],
            )],
            true,
        )
        .await;
        f.service.refresh_stations().await.unwrap();
        f.service.refresh_observations().await.unwrap();

        let (station, _) = f.service.nearest_station(60.3, 24.95, 20.0).await.unwrap();
        assert_eq!(station.identifier, "EFHK");

        let grid = f
            .service
            .heat_map(HeatField::Temperature, GridConfig::new(40, 40, 4), Utc::now())
            .await
            .unwrap();
        assert_eq!(grid.width(), 40);
        assert!(grid.filled() > 0);
        // 25 degrees is between the 30 and 20 degree thresholds
        assert!(grid.cells().iter().flatten().all(|band| *band == Band::Red));
    }
}
