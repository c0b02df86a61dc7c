//! Token level decoding shared by the METAR and TAF parsers.

use crate::parser::error::ParseError;
use crate::types::observation::{CloudCover, CloudLayer, Sky, Wind, WindDirection};
use chrono::{DateTime, Datelike, Duration, NaiveDate, NaiveTime, TimeZone, Utc};

const REPORT_TYPES: [&str; 5] = ["METAR", "SPECI", "TAF", "AMD", "COR"];
const METERS_PER_STATUTE_MILE: f64 = 1609.344;
const KNOTS_PER_MPS: f64 = 1.943_844;
const HPA_PER_INHG: f64 = 33.863_89;

/// Visibility at or above 10 km is reported as this value.
pub const VISIBILITY_MAX_M: i32 = 9999;

/// Splits a report into its identifier and the tokens following it.
pub(crate) fn split_identifier(raw: &str) -> Result<(&str, Vec<&str>), ParseError> {
    let mut tokens = raw
        .split_whitespace()
        .map(|token| token.trim_end_matches('='))
        .skip_while(|token| REPORT_TYPES.contains(token))
        .peekable();

    let first = tokens.peek().copied().ok_or(ParseError::Empty)?;
    if !is_identifier(first) {
        return Err(ParseError::MissingIdentifier(raw.trim().to_string()));
    }
    tokens.next();
    Ok((first, tokens.collect()))
}

fn is_identifier(token: &str) -> bool {
    (3..=5).contains(&token.len())
        && token
            .chars()
            .all(|c| c.is_ascii_uppercase() || c.is_ascii_digit())
        && token.chars().any(|c| c.is_ascii_uppercase())
}

fn digits(token: &str) -> Option<u32> {
    if token.is_empty() || !token.chars().all(|c| c.is_ascii_digit()) {
        return None;
    }
    token.parse().ok()
}

/// `DDHHMMZ` → (day, hour, minute).
pub(crate) fn day_time(token: &str) -> Option<(u32, u32, u32)> {
    let body = token.strip_suffix('Z')?;
    if body.len() != 6 {
        return None;
    }
    Some((
        digits(body.get(0..2)?)?,
        digits(body.get(2..4)?)?,
        digits(body.get(4..6)?)?,
    ))
}

/// `DDHH/DDHH` → ((day, hour), (day, hour)).
pub(crate) fn validity(token: &str) -> Option<((u32, u32), (u32, u32))> {
    let (from, to) = token.split_once('/')?;
    if from.len() != 4 || to.len() != 4 {
        return None;
    }
    Some((
        (digits(from.get(0..2)?)?, digits(from.get(2..4)?)?),
        (digits(to.get(0..2)?)?, digits(to.get(2..4)?)?),
    ))
}

/// Resolves a day-of-month time to the calendar date nearest `anchor`,
/// looking at the anchor's previous, current and next month. Hour 24 is
/// midnight at the end of the day.
pub(crate) fn resolve_day(
    anchor: DateTime<Utc>,
    day: u32,
    hour: u32,
    minute: u32,
) -> Option<DateTime<Utc>> {
    if !(1..=31).contains(&day) || hour > 24 || minute > 59 || (hour == 24 && minute != 0) {
        return None;
    }
    let (rollover, hour) = if hour == 24 { (1, 0) } else { (0, hour) };
    let time = NaiveTime::from_hms_opt(hour, minute, 0)?;

    [-1, 0, 1]
        .into_iter()
        .filter_map(|offset| {
            let month0 = anchor.month0() as i32 + offset;
            let year = anchor.year() + month0.div_euclid(12);
            let month = month0.rem_euclid(12) as u32 + 1;
            let date = NaiveDate::from_ymd_opt(year, month, day)?;
            Some(Utc.from_utc_datetime(&date.and_time(time)) + Duration::days(rollover))
        })
        .min_by_key(|candidate| (*candidate - anchor).num_seconds().abs())
}

/// Wind group such as `24015G25KT`, `VRB03KT` or `09008MPS`.
pub(crate) fn wind(token: &str) -> Option<Wind> {
    let (body, to_knots) = if let Some(body) = token.strip_suffix("KT") {
        (body, 1.0)
    } else if let Some(body) = token.strip_suffix("MPS") {
        (body, KNOTS_PER_MPS)
    } else {
        return None;
    };
    if body.len() < 5 {
        return None;
    }

    let (direction, speed) = (body.get(0..3)?, body.get(3..)?);
    let direction = match direction {
        "VRB" => WindDirection::Variable,
        degrees => WindDirection::Degrees(digits(degrees)? as u16),
    };
    let (speed, gust) = match speed.split_once('G') {
        Some((speed, gust)) => (digits(speed)?, Some(digits(gust)?)),
        None => (digits(speed)?, None),
    };
    let convert = |value: u32| (f64::from(value) * to_knots).round() as u16;

    Some(Wind {
        direction,
        speed_kt: convert(speed),
        gust_kt: gust.map(convert),
    })
}

/// Statute mile visibility, `10SM`, `1/2SM`, `M1/4SM` or `1 1/2SM` (whole
/// part given as `whole`), converted to meters.
fn statute_miles(token: &str, whole: Option<u32>) -> Option<i32> {
    let body = token.strip_suffix("SM")?;
    let body = body.strip_prefix(&['M', 'P'][..]).unwrap_or(body);
    let miles = match body.split_once('/') {
        Some((numerator, denominator)) => {
            let denominator = digits(denominator)?;
            if denominator == 0 {
                return None;
            }
            f64::from(whole.unwrap_or(0)) + f64::from(digits(numerator)?) / f64::from(denominator)
        }
        None => f64::from(digits(body)?),
    };
    Some(((miles * METERS_PER_STATUTE_MILE).round() as i32).min(VISIBILITY_MAX_M))
}

fn cloud_layer(token: &str) -> Option<CloudLayer> {
    let (cover, rest) = if let Some(rest) = token.strip_prefix("VV") {
        (CloudCover::VerticalVisibility, rest)
    } else {
        let cover = match token.get(0..3)? {
            "FEW" => CloudCover::Few,
            "SCT" => CloudCover::Scattered,
            "BKN" => CloudCover::Broken,
            "OVC" => CloudCover::Overcast,
            _ => return None,
        };
        (cover, &token[3..])
    };
    let height = rest.get(0..3)?;
    let height_ft = match height {
        "///" => None,
        hundreds => Some(digits(hundreds)? as i32 * 100),
    };
    // convective suffixes (CB, TCU, ///) are not decoded
    Some(CloudLayer { cover, height_ft })
}

/// One half of a temperature group, `12` or `M05`.
fn celsius(part: &str) -> Option<i32> {
    let (sign, body) = match part.strip_prefix('M') {
        Some(body) => (-1, body),
        None => (1, part),
    };
    if body.len() != 2 {
        return None;
    }
    Some(sign * digits(body)? as i32)
}

fn temperatures(token: &str) -> Option<(i32, Option<i32>)> {
    let (temperature, dew_point) = token.split_once('/')?;
    Some((celsius(temperature)?, celsius(dew_point)))
}

fn pressure(token: &str) -> Option<i32> {
    if let Some(hpa) = token.strip_prefix('Q') {
        return (hpa.len() == 4).then(|| digits(hpa)).flatten().map(|v| v as i32);
    }
    let hundredths = token.strip_prefix('A').filter(|inhg| inhg.len() == 4)?;
    let inhg = f64::from(digits(hundredths)?) / 100.0;
    Some((inhg * HPA_PER_INHG).round() as i32)
}

/// Tokens that end the decoded part of a report.
fn ends_report(token: &str) -> bool {
    matches!(token, "RMK" | "TEMPO" | "BECMG" | "NOSIG" | "INTER")
        || token.starts_with("PROB")
        || (token.starts_with("FM") && token.len() >= 6 && digits(&token[2..]).is_some())
}

/// Weather fields decoded from the body of a report. Unknown tokens are
/// skipped.
#[derive(Debug, Default, Clone, PartialEq)]
pub(crate) struct ReportFields {
    pub wind: Option<Wind>,
    pub sky: Sky,
    pub temperature: Option<i32>,
    pub dew_point: Option<i32>,
    pub qnh_hpa: Option<i32>,
}

impl ReportFields {
    pub fn decode(tokens: &[&str]) -> Self {
        let mut fields = ReportFields::default();
        let mut previous_whole_miles: Option<u32> = None;

        for token in tokens.iter().copied().take_while(|token| !ends_report(token)) {
            let whole_miles = previous_whole_miles.take();

            if let Some(wind) = wind(token) {
                fields.wind.get_or_insert(wind);
            } else if token == "CAVOK" {
                fields.sky.cavok = true;
                fields.sky.visibility_m.get_or_insert(VISIBILITY_MAX_M);
            } else if matches!(token, "SKC" | "CLR" | "NSC" | "NCD") {
                fields.sky.clear = true;
            } else if let Some(layer) = cloud_layer(token) {
                fields.sky.clouds.push(layer);
            } else if let Some(meters) = statute_miles(token, whole_miles) {
                fields.sky.visibility_m.get_or_insert(meters);
            } else if let Some(meters) = meters_visibility(token) {
                fields.sky.visibility_m.get_or_insert(meters);
            } else if let Some((temperature, dew_point)) = temperatures(token) {
                fields.temperature.get_or_insert(temperature);
                if fields.dew_point.is_none() {
                    fields.dew_point = dew_point;
                }
            } else if let Some(qnh) = pressure(token) {
                fields.qnh_hpa.get_or_insert(qnh);
            } else if token.len() == 1 {
                // possible whole statute miles of a `1 1/2SM` group
                previous_whole_miles = digits(token);
            }
        }
        fields
    }
}

/// Four digit visibility in meters, optionally with `NDV`.
fn meters_visibility(token: &str) -> Option<i32> {
    let body = token.strip_suffix("NDV").unwrap_or(token);
    if body.len() != 4 {
        return None;
    }
    digits(body).map(|meters| meters as i32)
}
