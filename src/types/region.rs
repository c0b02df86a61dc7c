//! The active weather region: a circle on the globe used both to query the
//! providers (through its bounding box) and to filter what they return.

use haversine::{distance, Location as HaversineLocation, Units};
use serde::{Deserialize, Serialize};

/// Kilometers per degree of latitude on the haversine sphere.
const KM_PER_DEGREE: f64 = 111.195;

/// The geographic area weather is fetched and displayed for.
///
/// A region is a center point and a radius. Membership is decided by the
/// great-circle distance from the center, so the region is round rather than
/// the rectangle reported by [`WeatherRegion::bounds`].
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct WeatherRegion {
    /// Center latitude in decimal degrees.
    pub latitude: f64,
    /// Center longitude in decimal degrees.
    pub longitude: f64,
    /// Radius in kilometers.
    pub radius_km: f64,
}

/// A latitude/longitude rectangle, as accepted by bounding-box queries.
///
/// Longitudes are not wrapped: a box crossing the antimeridian has
/// `min_longitude` below -180 or `max_longitude` above 180. Use
/// [`Bounds::split_antimeridian`] to get boxes inside the -180..180 range.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Bounds {
    pub min_latitude: f64,
    pub min_longitude: f64,
    pub max_latitude: f64,
    pub max_longitude: f64,
}

impl Bounds {
    pub fn contains(&self, latitude: f64, longitude: f64) -> bool {
        (self.min_latitude..=self.max_latitude).contains(&latitude)
            && self.longitude_in_span(longitude).is_some()
    }

    /// The longitude equivalent to `longitude` (shifted by a full turn if
    /// needed) that falls inside the box, or `None`.
    pub fn longitude_in_span(&self, longitude: f64) -> Option<f64> {
        [longitude, longitude - 360.0, longitude + 360.0]
            .into_iter()
            .find(|lon| (self.min_longitude..=self.max_longitude).contains(lon))
    }

    /// One box, or two when this one crosses the antimeridian.
    pub fn split_antimeridian(&self) -> Vec<Bounds> {
        let with_longitudes = |min_longitude: f64, max_longitude: f64| Bounds {
            min_longitude,
            max_longitude,
            ..*self
        };
        if self.min_longitude < -180.0 {
            vec![
                with_longitudes(self.min_longitude + 360.0, 180.0),
                with_longitudes(-180.0, self.max_longitude),
            ]
        } else if self.max_longitude > 180.0 {
            vec![
                with_longitudes(self.min_longitude, 180.0),
                with_longitudes(-180.0, self.max_longitude - 360.0),
            ]
        } else {
            vec![*self]
        }
    }
}

impl WeatherRegion {
    pub fn new(latitude: f64, longitude: f64, radius_km: f64) -> Self {
        Self {
            latitude,
            longitude,
            radius_km,
        }
    }

    /// Great-circle distance in kilometers from the region center.
    pub fn distance_km(&self, latitude: f64, longitude: f64) -> f64 {
        distance(
            HaversineLocation {
                latitude: self.latitude,
                longitude: self.longitude,
            },
            HaversineLocation {
                latitude,
                longitude,
            },
            Units::Kilometers,
        )
    }

    /// Returns true if the coordinate lies within the region radius.
    pub fn in_range(&self, latitude: f64, longitude: f64) -> bool {
        self.distance_km(latitude, longitude) <= self.radius_km
    }

    /// The smallest lat/lon rectangle containing the region circle.
    ///
    /// Near the poles the longitude span is widened to the whole globe. Near
    /// the antimeridian the span runs past ±180, see [`Bounds`].
    pub fn bounds(&self) -> Bounds {
        let radius_km = self.radius_km.max(0.0);
        let dlat = radius_km / KM_PER_DEGREE;
        let min_latitude = (self.latitude - dlat).max(-90.0);
        let max_latitude = (self.latitude + dlat).min(90.0);

        // widest longitude offset of a spherical cap
        let sin_dlon = dlat.to_radians().sin() / self.latitude.to_radians().cos();
        let (min_longitude, max_longitude) =
            if min_latitude <= -90.0 || max_latitude >= 90.0 || !(0.0..1.0).contains(&sin_dlon) {
                (-180.0, 180.0)
            } else {
                let dlon = sin_dlon.asin().to_degrees();
                (self.longitude - dlon, self.longitude + dlon)
            };

        Bounds {
            min_latitude,
            min_longitude,
            max_latitude,
            max_longitude,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_in_range() {
        let helsinki = WeatherRegion::new(60.17, 24.94, 50.0);
        assert!(helsinki.in_range(60.32, 24.96)); // EFHK, ~17 km
        assert!(!helsinki.in_range(61.46, 23.60)); // EFTP, ~160 km
    }

    #[test]
    fn test_bounds_contain_circle() {
        let region = WeatherRegion::new(60.0, 25.0, 100.0);
        let bounds = region.bounds();
        assert!(bounds.min_latitude < 59.2 && bounds.max_latitude > 60.8);
        // 100 km is ~1.8 degrees of longitude at 60N
        assert!(bounds.min_longitude < 23.3 && bounds.max_longitude > 26.7);
        assert!(bounds.contains(60.0, 25.0));
        assert!(!bounds.contains(62.0, 25.0));
    }

    #[test]
    fn test_bounds_across_antimeridian() {
        let bounds = WeatherRegion::new(-17.0, 179.5, 150.0).bounds();
        assert!(bounds.max_longitude > 180.0);
        // Fiji and its neighbours west of the antimeridian
        assert!(bounds.contains(-17.2, -179.8));
        assert!(bounds.contains(-17.7, 178.6));
        assert!(!bounds.contains(-17.0, -175.0));
        let unwrapped = bounds.longitude_in_span(-179.8).unwrap();
        assert!((unwrapped - 180.2).abs() < 1e-9);

        let parts = bounds.split_antimeridian();
        assert_eq!(parts.len(), 2);
        assert_eq!(parts[0].max_longitude, 180.0);
        assert_eq!(parts[1].min_longitude, -180.0);
        assert!(parts[1].contains(-17.2, -179.8));
        assert!(parts
            .iter()
            .all(|p| p.min_longitude >= -180.0 && p.max_longitude <= 180.0));

        let inland = WeatherRegion::new(60.0, 25.0, 100.0).bounds();
        assert_eq!(inland.split_antimeridian(), vec![inland]);
    }

    #[test]
    fn test_bounds_near_pole_span_all_longitudes() {
        let bounds = WeatherRegion::new(89.5, 0.0, 200.0).bounds();
        assert_eq!(bounds.max_latitude, 90.0);
        assert_eq!(bounds.min_longitude, -180.0);
        assert_eq!(bounds.max_longitude, 180.0);
    }
}
