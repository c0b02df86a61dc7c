//! Matching parsed observations against the known station set.

use crate::types::observation::{Observation, Observations};
use crate::types::station::Station;
use log::debug;
use std::collections::HashMap;

/// Identity index over a station set.
///
/// An observation is kept only if its identifier matches exactly one station.
/// Observations of unknown stations are dropped, and so are observations
/// whose identifier is ambiguous because it appears on several stations.
#[derive(Debug, Clone)]
pub struct Reconciler<'a> {
    matches: HashMap<&'a str, usize>,
}

impl<'a> Reconciler<'a> {
    pub fn new(stations: &'a [Station]) -> Self {
        let mut matches = HashMap::with_capacity(stations.len());
        for station in stations {
            *matches.entry(station.identifier.as_str()).or_insert(0) += 1;
        }
        Self { matches }
    }

    /// Number of stations carrying `identifier`.
    pub fn match_count(&self, identifier: &str) -> usize {
        self.matches.get(identifier).copied().unwrap_or(0)
    }

    pub fn accepts(&self, observation: &Observation) -> bool {
        self.match_count(observation.identifier()) == 1
    }

    /// Drops unmatched and ambiguous observations and orders the rest:
    /// METARs by observation time, TAFs by validity start. Observations with
    /// equal times keep their input order.
    pub fn reconcile(&self, observations: impl IntoIterator<Item = Observation>) -> Observations {
        let mut metars = Vec::new();
        let mut tafs = Vec::new();
        let mut dropped = 0usize;

        for observation in observations {
            match self.match_count(observation.identifier()) {
                1 => match observation {
                    Observation::Metar(metar) => metars.push(metar),
                    Observation::Taf(taf) => tafs.push(taf),
                },
                0 => {
                    debug!(
                        "Dropping {} of {}: no such station",
                        observation.kind(),
                        observation.identifier()
                    );
                    dropped += 1;
                }
                n => {
                    debug!(
                        "Dropping {} of {}: identifier matches {n} stations",
                        observation.kind(),
                        observation.identifier()
                    );
                    dropped += 1;
                }
            }
        }

        metars.sort_by_key(|metar| metar.datetime);
        tafs.sort_by_key(|taf| taf.from);
        if dropped > 0 {
            debug!(
                "Reconciled {} metars and {} tafs, dropped {dropped}",
                metars.len(),
                tafs.len()
            );
        }
        Observations::new(metars, tafs)
    }
}
