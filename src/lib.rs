mod config;
mod error;
mod interpolation;
mod parser;
mod providers;
mod reconcile;
mod stations;
mod store;
mod types;
mod utils;
mod weather_service;

pub use error::WeatherError;
pub use weather_service::*;

pub use config::{ConfigError, RegionConfig};
pub use reconcile::Reconciler;
pub use stations::locate_station::StationLocator;

pub use parser::error::ParseError;
pub use parser::parse;

pub use providers::awc_api::AwcApiProvider;
pub use providers::awc_cache::AwcCacheProvider;
pub use providers::error::ProviderError;
pub use providers::{ObservationProvider, StationProvider};

pub use store::{CollectionKind, OrderBy, Rows, StoreError, Transaction, WeatherStore};

pub use types::observation::*;
pub use types::region::{Bounds, WeatherRegion};
pub use types::station::*;

pub use interpolation::{
    samples_from_metars, Backend, Band, GridConfig, GridError, GridProjection, GridStep,
    GridSteps, HeatField, HeatGrid, HeatMap, HeatSample, StepOrder, CEILING_UNLIMITED,
};
