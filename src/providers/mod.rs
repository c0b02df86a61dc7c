//! Data sources for stations and raw observation text.
//!
//! Every source implements [`StationProvider`] and/or [`ObservationProvider`].
//! The [`crate::WeatherService`] fans out to all configured providers at once
//! and only accepts a refresh when every one of them succeeds.

pub mod awc_api;
pub mod awc_cache;
mod download;
pub mod error;

use crate::types::observation::ObservationKind;
use crate::types::region::WeatherRegion;
use crate::types::station::Station;
use async_trait::async_trait;
use error::ProviderError;

/// A source of station metadata.
#[async_trait]
pub trait StationProvider: Send + Sync {
    /// Short name used in logs and errors.
    fn name(&self) -> &str;

    /// Stations in or around `region`. Results outside the region are
    /// filtered out by the caller.
    async fn fetch_stations(&self, region: &WeatherRegion) -> Result<Vec<Station>, ProviderError>;
}

/// A source of raw METAR/TAF text, one report per string.
#[async_trait]
pub trait ObservationProvider: Send + Sync {
    fn name(&self) -> &str;

    /// Observation kinds this provider serves.
    fn kinds(&self) -> &[ObservationKind] {
        &[ObservationKind::Metar, ObservationKind::Taf]
    }

    /// Raw reports of `kind` for `region`. With `history` the provider
    /// returns older reports too, when it can.
    async fn fetch_observations(
        &self,
        kind: ObservationKind,
        region: &WeatherRegion,
        history: bool,
    ) -> Result<Vec<String>, ProviderError>;
}

/// Splits a plain text response into one trimmed report per line.
pub(crate) fn raw_lines(text: &str) -> Vec<String> {
    text.lines()
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .map(str::to_string)
        .collect()
}

#[cfg(test)]
pub(crate) mod mock {
    use super::*;
    use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};

    fn offline(name: &str) -> ProviderError {
        ProviderError::Unavailable {
            provider: name.to_string(),
            message: "offline".to_string(),
        }
    }

    /// Returns a fixed station list, or fails with `Unavailable` while
    /// `fail` is set.
    pub struct StaticStations {
        pub name: String,
        pub stations: Vec<Station>,
        pub fail: AtomicBool,
        pub calls: AtomicUsize,
    }

    impl StaticStations {
        pub fn new(name: &str, stations: Vec<Station>) -> Self {
            Self {
                name: name.to_string(),
                stations,
                fail: AtomicBool::new(false),
                calls: AtomicUsize::new(0),
            }
        }
    }

    #[async_trait]
    impl StationProvider for StaticStations {
        fn name(&self) -> &str {
            &self.name
        }

        async fn fetch_stations(&self, _: &WeatherRegion) -> Result<Vec<Station>, ProviderError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            if self.fail.load(Ordering::SeqCst) {
                return Err(offline(&self.name));
            }
            Ok(self.stations.clone())
        }
    }

    /// Returns fixed raw reports per kind, or fails with `Unavailable` while
    /// `fail` is set.
    pub struct StaticReports {
        pub name: String,
        pub kinds: Vec<ObservationKind>,
        pub metars: Vec<String>,
        pub tafs: Vec<String>,
        pub fail: AtomicBool,
        pub calls: AtomicUsize,
        pub history_requests: AtomicUsize,
    }

    impl StaticReports {
        pub fn new(name: &str, metars: Vec<String>, tafs: Vec<String>) -> Self {
            Self {
                name: name.to_string(),
                kinds: vec![ObservationKind::Metar, ObservationKind::Taf],
                metars,
                tafs,
                fail: AtomicBool::new(false),
                calls: AtomicUsize::new(0),
                history_requests: AtomicUsize::new(0),
            }
        }
    }

    #[async_trait]
    impl ObservationProvider for StaticReports {
        fn name(&self) -> &str {
            &self.name
        }

        fn kinds(&self) -> &[ObservationKind] {
            &self.kinds
        }

        async fn fetch_observations(
            &self,
            kind: ObservationKind,
            _: &WeatherRegion,
            history: bool,
        ) -> Result<Vec<String>, ProviderError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            if history {
                self.history_requests.fetch_add(1, Ordering::SeqCst);
            }
            if self.fail.load(Ordering::SeqCst) {
                return Err(offline(&self.name));
            }
            Ok(match kind {
                ObservationKind::Metar => self.metars.clone(),
                ObservationKind::Taf => self.tafs.clone(),
            })
        }
    }
}
