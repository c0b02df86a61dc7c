//! Defines the weather station record shared by providers, the store and the
//! station locator, including the implementations needed for spatial indexing
//! using the `rstar` crate.

use rstar::{PointDistance, RTreeObject, AABB};
use serde::{Deserialize, Serialize};

/// A reporting station as known to one of the data providers.
///
/// The `identifier` (normally the ICAO location indicator, e.g. "EFHK") is the
/// unique key in the [`crate::WeatherStore`]. Observations refer to their
/// station by this identifier only.
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct Station {
    /// Unique station identifier (e.g., "EFHK").
    pub identifier: String,
    /// Human readable site name, if the provider supplies one.
    pub name: Option<String>,
    /// Latitude in decimal degrees (positive for North).
    pub latitude: f64,
    /// Longitude in decimal degrees (positive for East).
    pub longitude: f64,
    /// Elevation above sea level in meters, if available.
    pub elevation: Option<i32>,
    /// The station issues METAR reports.
    pub has_metar: bool,
    /// The station issues TAF forecasts.
    pub has_taf: bool,
}

impl Station {
    /// Creates a station without name or elevation.
    pub fn new(
        identifier: impl Into<String>,
        latitude: f64,
        longitude: f64,
        has_metar: bool,
        has_taf: bool,
    ) -> Self {
        Self {
            identifier: identifier.into(),
            name: None,
            latitude,
            longitude,
            elevation: None,
            has_metar,
            has_taf,
        }
    }

    /// Returns true when the station reports at least one observation type.
    pub fn has_observations(&self) -> bool {
        self.has_metar || self.has_taf
    }
}

// --- R-Tree Implementations ---

impl RTreeObject for Station {
    type Envelope = AABB<[f64; 2]>;

    /// A station is a point, so its envelope is the degenerate box at
    /// (latitude, longitude).
    fn envelope(&self) -> Self::Envelope {
        AABB::from_point([self.latitude, self.longitude])
    }
}

impl PointDistance for Station {
    /// Squared Euclidean distance in degree space. Only used to order R-tree
    /// candidates; real distances are computed with haversine afterwards.
    fn distance_2(&self, point: &[f64; 2]) -> f64 {
        let dx = self.latitude - point[0];
        let dy = self.longitude - point[1];
        dx * dx + dy * dy
    }
}
