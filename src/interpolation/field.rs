//! Turning METARs into heat samples: which quantity to plot, and where each
//! station lands on the grid.

use crate::interpolation::grid::{GridConfig, HeatSample};
use crate::interpolation::steps::{GridSteps, StepOrder};
use crate::types::observation::Metar;
use crate::types::region::{Bounds, WeatherRegion};
use crate::types::station::Station;
use std::collections::HashMap;

/// Ceiling value (hundreds of feet) used when a report states there is no
/// ceiling at all.
pub const CEILING_UNLIMITED: f64 = 999.0;

/// The METAR quantity a heat map is drawn for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum HeatField {
    /// Lowest broken/overcast layer in hundreds of feet.
    Ceiling,
    /// Prevailing visibility in meters.
    Visibility,
    /// Air temperature in degrees Celsius.
    Temperature,
}

impl HeatField {
    /// Extracts the field value from a report, `None` when not reported.
    pub fn value(&self, metar: &Metar) -> Option<f64> {
        match self {
            HeatField::Ceiling => match metar.ceiling_ft() {
                Some(feet) => Some(f64::from(feet) / 100.0),
                None if metar.sky.no_ceiling() => Some(CEILING_UNLIMITED),
                None => None,
            },
            HeatField::Visibility => match metar.sky.visibility_m {
                Some(meters) => Some(f64::from(meters)),
                None if metar.sky.cavok => Some(9999.0),
                None => None,
            },
            HeatField::Temperature => metar.temperature.map(f64::from),
        }
    }

    /// Default bands: flight-category style limits for ceiling and
    /// visibility, 10 degree steps from hot to cold for temperature.
    pub fn default_steps(&self) -> GridSteps {
        match self {
            HeatField::Ceiling => GridSteps::preset(
                [2.0, 5.0, 10.0, 15.0, 50.0, CEILING_UNLIMITED],
                StepOrder::Ascending,
            ),
            HeatField::Visibility => GridSteps::preset(
                [600.0, 1500.0, 3000.0, 5000.0, 8000.0, 9999.0],
                StepOrder::Ascending,
            ),
            HeatField::Temperature => GridSteps::preset(
                [30.0, 20.0, 10.0, 0.0, -10.0, -20.0],
                StepOrder::Descending,
            ),
        }
    }
}

/// Linear mapping from a region's bounding box onto grid cells, north up.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GridProjection {
    bounds: Bounds,
    width: usize,
    height: usize,
}

impl GridProjection {
    pub fn new(region: &WeatherRegion, config: &GridConfig) -> Self {
        Self {
            bounds: region.bounds(),
            width: config.width,
            height: config.height,
        }
    }

    /// Grid cell of a coordinate. Coordinates outside the bounds map outside
    /// the grid. Longitudes are unwrapped into the bounds' span, so a region
    /// across the antimeridian projects continuously.
    pub fn project(&self, latitude: f64, longitude: f64) -> (i32, i32) {
        let longitude = self.bounds.longitude_in_span(longitude).unwrap_or(longitude);
        let lon_span = (self.bounds.max_longitude - self.bounds.min_longitude).max(f64::EPSILON);
        let lat_span = (self.bounds.max_latitude - self.bounds.min_latitude).max(f64::EPSILON);
        let fx = (longitude - self.bounds.min_longitude) / lon_span;
        let fy = (self.bounds.max_latitude - latitude) / lat_span;
        let x = (fx * self.width as f64).floor().min(self.width as f64 - 1.0);
        let y = (fy * self.height as f64).floor().min(self.height as f64 - 1.0);
        (x as i32, y as i32)
    }
}

/// Builds heat samples for `field` from METARs, placing each at its station.
///
/// Reports whose station is unknown or which lack the field are skipped.
pub fn samples_from_metars<'a>(
    metars: impl IntoIterator<Item = &'a Metar>,
    stations: &[Station],
    field: HeatField,
    projection: &GridProjection,
) -> Vec<HeatSample> {
    let positions: HashMap<&str, (f64, f64)> = stations
        .iter()
        .map(|station| {
            (
                station.identifier.as_str(),
                (station.latitude, station.longitude),
            )
        })
        .collect();

    metars
        .into_iter()
        .filter_map(|metar| {
            let (latitude, longitude) = positions.get(metar.identifier.as_str())?;
            let value = field.value(metar)?;
            let (x, y) = projection.project(*latitude, *longitude);
            Some(HeatSample::new(x, y, value))
        })
        .collect()
}
