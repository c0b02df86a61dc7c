use crate::types::observation::ObservationKind;
use crate::types::region::WeatherRegion;
use crate::types::station::Station;
use haversine::{distance, Location as HaversineLocation, Units};
use ordered_float::OrderedFloat;
use rstar::{RTree, AABB};
use std::cmp::Ordering;
use std::collections::BinaryHeap;

/// Spatial index over a station set, answering "which stations are near this
/// point" queries (for example when a map tap is resolved to a station).
#[derive(Debug, Clone)]
pub struct StationLocator {
    rtree: RTree<Station>,
}

// Helper struct for BinaryHeap ordering
struct StationCandidate<'a> {
    distance_km: OrderedFloat<f64>,
    station: &'a Station,
}
// Only the distance is compared
impl PartialEq for StationCandidate<'_> {
    fn eq(&self, other: &Self) -> bool {
        self.distance_km == other.distance_km
    }
}
impl Eq for StationCandidate<'_> {}
impl PartialOrd for StationCandidate<'_> {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}
impl Ord for StationCandidate<'_> {
    fn cmp(&self, other: &Self) -> Ordering {
        self.distance_km.cmp(&other.distance_km)
    }
}

fn haversine_km(latitude: f64, longitude: f64, station: &Station) -> f64 {
    distance(
        HaversineLocation {
            latitude,
            longitude,
        },
        HaversineLocation {
            latitude: station.latitude,
            longitude: station.longitude,
        },
        Units::Kilometers,
    )
}

impl StationLocator {
    pub fn new(stations: Vec<Station>) -> Self {
        Self {
            rtree: RTree::bulk_load(stations),
        }
    }

    pub fn len(&self) -> usize {
        self.rtree.size()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// The closest station within `max_distance_km`, with its distance.
    pub fn nearest(
        &self,
        latitude: f64,
        longitude: f64,
        max_distance_km: f64,
    ) -> Option<(Station, f64)> {
        self.query(latitude, longitude, 1, max_distance_km, None)
            .into_iter()
            .next()
    }

    /// Finds up to `n_results` stations within `max_distance_km`, closest
    /// first. With `kind` set, only stations issuing that observation kind
    /// are considered.
    pub fn query(
        &self,
        latitude: f64,
        longitude: f64,
        n_results: usize,
        max_distance_km: f64,
        kind: Option<ObservationKind>,
    ) -> Vec<(Station, f64)> {
        if n_results == 0 {
            return vec![];
        }
        match kind {
            None => self.proximity_query(latitude, longitude, n_results, max_distance_km),
            Some(kind) => {
                self.filtered_heap_query(latitude, longitude, n_results, max_distance_km, kind)
            }
        }
    }

    /// Stations inside the bounding box of the search circle. R-tree order
    /// is by squared degrees, which does not follow great-circle order away
    /// from the equator, so candidates come from the box instead.
    fn candidates(&self, latitude: f64, longitude: f64, max_distance_km: f64) -> Vec<&Station> {
        WeatherRegion::new(latitude, longitude, max_distance_km)
            .bounds()
            .split_antimeridian()
            .iter()
            .flat_map(|bounds| {
                let envelope = AABB::from_corners(
                    [bounds.min_latitude, bounds.min_longitude],
                    [bounds.max_latitude, bounds.max_longitude],
                );
                self.rtree.locate_in_envelope(&envelope)
            })
            .collect()
    }

    /// Nearest stations without filters.
    fn proximity_query(
        &self,
        latitude: f64,
        longitude: f64,
        n_results: usize,
        max_distance_km: f64,
    ) -> Vec<(Station, f64)> {
        let mut stations_with_dist: Vec<(Station, f64)> = self
            .candidates(latitude, longitude, max_distance_km)
            .into_iter()
            .filter_map(|station| {
                let dist_km = haversine_km(latitude, longitude, station);
                (dist_km <= max_distance_km).then(|| (station.to_owned(), dist_km))
            })
            .collect();

        stations_with_dist.sort_by(|a, b| a.1.partial_cmp(&b.1).unwrap_or(Ordering::Equal));
        stations_with_dist.truncate(n_results);
        stations_with_dist
    }

    /// Heap based query for stations offering `kind`.
    fn filtered_heap_query(
        &self,
        latitude: f64,
        longitude: f64,
        n_results: usize,
        max_distance_km: f64,
        kind: ObservationKind,
    ) -> Vec<(Station, f64)> {
        let mut heap: BinaryHeap<StationCandidate<'_>> = BinaryHeap::with_capacity(n_results);

        for station in self.candidates(latitude, longitude, max_distance_km) {
            let offers = match kind {
                ObservationKind::Metar => station.has_metar,
                ObservationKind::Taf => station.has_taf,
            };
            if !offers {
                continue;
            }

            let dist_km = haversine_km(latitude, longitude, station);
            if dist_km > max_distance_km {
                continue;
            }

            let candidate = StationCandidate {
                distance_km: OrderedFloat(dist_km),
                station,
            };
            if heap.len() < n_results {
                heap.push(candidate);
            } else if heap
                .peek()
                .is_some_and(|worst| candidate.distance_km < worst.distance_km)
            {
                // replace the furthest candidate
                heap.pop();
                heap.push(candidate);
            }
        }

        heap.into_sorted_vec()
            .into_iter()
            .map(|c| (c.station.to_owned(), c.distance_km.into_inner()))
            .collect()
    }
}
