//! Observation records (METAR reports and TAF forecasts) and the ordered
//! [`Observations`] result handed to presentation code.

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

/// The two observation variants the pipeline understands.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ObservationKind {
    /// Routine or special aerodrome weather report.
    Metar,
    /// Terminal aerodrome forecast.
    Taf,
}

impl ObservationKind {
    pub(crate) fn path_segment(&self) -> &'static str {
        match self {
            ObservationKind::Metar => "metar",
            ObservationKind::Taf => "taf",
        }
    }
}

impl fmt::Display for ObservationKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.path_segment())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum WindDirection {
    /// True direction the wind blows from, in degrees.
    Degrees(u16),
    /// `VRB`
    Variable,
}

/// Surface wind, normalized to knots.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Wind {
    pub direction: WindDirection,
    pub speed_kt: u16,
    pub gust_kt: Option<u16>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum CloudCover {
    Few,
    Scattered,
    Broken,
    Overcast,
    /// Sky obscured, height is the vertical visibility.
    VerticalVisibility,
}

impl CloudCover {
    /// Layers that constitute a ceiling.
    pub fn is_ceiling(&self) -> bool {
        matches!(
            self,
            CloudCover::Broken | CloudCover::Overcast | CloudCover::VerticalVisibility
        )
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct CloudLayer {
    pub cover: CloudCover,
    /// Base height above ground in feet, `None` when reported as `///`.
    pub height_ft: Option<i32>,
}

/// Sky condition shared by METAR reports and the TAF base period.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Sky {
    /// Prevailing visibility in meters. `9999` means 10 km or more.
    pub visibility_m: Option<i32>,
    /// `CAVOK` was reported.
    pub cavok: bool,
    /// `SKC`, `CLR`, `NSC` or `NCD` was reported.
    pub clear: bool,
    /// Cloud layers in reported order.
    pub clouds: Vec<CloudLayer>,
}

impl Sky {
    /// Height in feet of the lowest broken, overcast or obscured layer.
    pub fn ceiling_ft(&self) -> Option<i32> {
        self.clouds
            .iter()
            .filter(|layer| layer.cover.is_ceiling())
            .filter_map(|layer| layer.height_ft)
            .min()
    }

    /// True when the report positively states there is no ceiling.
    pub fn no_ceiling(&self) -> bool {
        self.ceiling_ft().is_none()
            && (self.cavok
                || self.clear
                || (!self.clouds.is_empty()
                    && self.clouds.iter().all(|layer| !layer.cover.is_ceiling())))
    }
}

/// A parsed METAR (or SPECI) report.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Metar {
    /// Identifier of the reporting station.
    pub identifier: String,
    /// Observation time.
    pub datetime: DateTime<Utc>,
    /// The report as received from the provider.
    pub raw: String,
    pub wind: Option<Wind>,
    pub sky: Sky,
    /// Air temperature in whole degrees Celsius.
    pub temperature: Option<i32>,
    /// Dew point in whole degrees Celsius.
    pub dew_point: Option<i32>,
    /// Altimeter setting in hPa.
    pub qnh_hpa: Option<i32>,
}

impl Metar {
    pub fn ceiling_ft(&self) -> Option<i32> {
        self.sky.ceiling_ft()
    }
}

/// A parsed TAF. Only the base period (before the first change group) is
/// decoded into fields; the full text stays in `raw`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Taf {
    pub identifier: String,
    /// Issue time.
    pub issued: DateTime<Utc>,
    /// Start of the validity period.
    pub from: DateTime<Utc>,
    /// End of the validity period.
    pub to: DateTime<Utc>,
    pub raw: String,
    pub wind: Option<Wind>,
    pub sky: Sky,
}

impl Taf {
    /// Returns true if `time` falls within the validity period.
    pub fn is_valid_at(&self, time: DateTime<Utc>) -> bool {
        self.from <= time && time < self.to
    }
}

/// Either observation variant.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Observation {
    Metar(Metar),
    Taf(Taf),
}

impl Observation {
    pub fn kind(&self) -> ObservationKind {
        match self {
            Observation::Metar(_) => ObservationKind::Metar,
            Observation::Taf(_) => ObservationKind::Taf,
        }
    }

    pub fn identifier(&self) -> &str {
        match self {
            Observation::Metar(metar) => &metar.identifier,
            Observation::Taf(taf) => &taf.identifier,
        }
    }

    pub fn raw(&self) -> &str {
        match self {
            Observation::Metar(metar) => &metar.raw,
            Observation::Taf(taf) => &taf.raw,
        }
    }

    /// The key observations of this variant are sorted by: observation time
    /// for METARs, validity start for TAFs.
    pub fn ordering_time(&self) -> DateTime<Utc> {
        match self {
            Observation::Metar(metar) => metar.datetime,
            Observation::Taf(taf) => taf.from,
        }
    }
}

impl From<Metar> for Observation {
    fn from(metar: Metar) -> Self {
        Observation::Metar(metar)
    }
}

impl From<Taf> for Observation {
    fn from(taf: Taf) -> Self {
        Observation::Taf(taf)
    }
}

/// Cached observations, METARs ascending by observation time and TAFs
/// ascending by validity start.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Observations {
    pub metars: Vec<Metar>,
    pub tafs: Vec<Taf>,
}

impl Observations {
    pub fn new(metars: Vec<Metar>, tafs: Vec<Taf>) -> Self {
        Self { metars, tafs }
    }

    pub fn is_empty(&self) -> bool {
        self.metars.is_empty() && self.tafs.is_empty()
    }

    /// Most recent METAR of a station.
    pub fn latest_metar(&self, identifier: &str) -> Option<&Metar> {
        self.metars
            .iter()
            .rev()
            .find(|metar| metar.identifier == identifier)
    }

    /// The TAF of a station with the latest validity start.
    pub fn latest_taf(&self, identifier: &str) -> Option<&Taf> {
        self.tafs.iter().rev().find(|taf| taf.identifier == identifier)
    }

    /// Distinct METAR time slots: observation times floored to `step`,
    /// ascending. Returns nothing for a non-positive step.
    pub fn timeslots(&self, step: Duration) -> Vec<DateTime<Utc>> {
        let step_secs = step.num_seconds();
        if step_secs <= 0 {
            return vec![];
        }
        let mut slots: Vec<DateTime<Utc>> = self
            .metars
            .iter()
            .filter_map(|metar| {
                let secs = metar.datetime.timestamp();
                DateTime::from_timestamp(secs - secs.rem_euclid(step_secs), 0)
            })
            .collect();
        slots.sort();
        slots.dedup();
        slots
    }

    /// Each station's most recent METAR observed at or before `until`,
    /// ordered by station identifier.
    pub fn latest_metars(&self, until: DateTime<Utc>) -> Vec<&Metar> {
        let mut latest: BTreeMap<&str, &Metar> = BTreeMap::new();
        // metars are ascending, later entries overwrite earlier ones
        for metar in self.metars.iter().filter(|metar| metar.datetime <= until) {
            latest.insert(metar.identifier.as_str(), metar);
        }
        latest.into_values().collect()
    }
}
