//! Text decoding for raw METAR and TAF reports.

pub mod error;
mod metar;
mod taf;
pub(crate) mod tokens;

use crate::types::observation::{Metar, Observation, ObservationKind, Taf};
use chrono::{DateTime, Utc};
use error::ParseError;

/// Parses a raw report as the given observation kind.
pub fn parse(
    kind: ObservationKind,
    raw: &str,
    reference: DateTime<Utc>,
) -> Result<Observation, ParseError> {
    match kind {
        ObservationKind::Metar => Metar::parse(raw, reference).map(Observation::Metar),
        ObservationKind::Taf => Taf::parse(raw, reference).map(Observation::Taf),
    }
}
