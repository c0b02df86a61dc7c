use crate::parser::error::ParseError;
use crate::parser::tokens::{day_time, resolve_day, split_identifier, validity, ReportFields};
use crate::types::observation::Taf;
use chrono::{DateTime, Utc};

impl Taf {
    /// Parses a TAF.
    ///
    /// The issue time resolves against `reference`, the validity start
    /// against the issue time and the validity end against the start. A TAF
    /// without an issue time is treated as issued at its validity start.
    /// Only the base forecast is decoded; change groups are left in `raw`.
    pub fn parse(raw: &str, reference: DateTime<Utc>) -> Result<Self, ParseError> {
        let (identifier, tokens) = split_identifier(raw)?;
        let invalid = |token: &str| ParseError::InvalidTimestamp(token.to_string());

        let mut rest = tokens.as_slice();
        let mut issued = None;
        if let Some((&token, tail)) = rest.split_first() {
            if let Some((day, hour, minute)) = day_time(token) {
                issued = Some(resolve_day(reference, day, hour, minute).ok_or_else(|| invalid(token))?);
                rest = tail;
            }
        }

        let Some((&validity_token, rest)) = rest.split_first() else {
            return Err(missing_validity(identifier));
        };
        let Some(((from_day, from_hour), (to_day, to_hour))) = validity(validity_token) else {
            return Err(missing_validity(identifier));
        };

        let from = resolve_day(issued.unwrap_or(reference), from_day, from_hour, 0)
            .ok_or_else(|| invalid(validity_token))?;
        let to = resolve_day(from, to_day, to_hour, 0).ok_or_else(|| invalid(validity_token))?;

        let fields = ReportFields::decode(rest);
        Ok(Taf {
            identifier: identifier.to_string(),
            issued: issued.unwrap_or(from),
            from,
            to,
            raw: raw.trim().to_string(),
            wind: fields.wind,
            sky: fields.sky,
        })
    }
}

fn missing_validity(identifier: &str) -> ParseError {
    ParseError::MissingTimestamp {
        identifier: identifier.to_string(),
        field: "validity period",
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn at(month: u32, day: u32, hour: u32, minute: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, month, day, hour, minute, 0).unwrap()
    }

    #[test]
    fn test_parse_base_period() {
        let raw = "TAF EFHK 101130Z 1012/1112 22010KT 9999 SCT020 BKN035 \
                   TEMPO 1014/1018 3000 -SN BKN008 \
                   BECMG 1020/1022 VRB03KT";
        let taf = Taf::parse(raw, at(3, 10, 11, 40)).unwrap();

        assert_eq!(taf.identifier, "EFHK");
        assert_eq!(taf.issued, at(3, 10, 11, 30));
        assert_eq!(taf.from, at(3, 10, 12, 0));
        assert_eq!(taf.to, at(3, 11, 12, 0));
        assert_eq!(taf.wind.map(|wind| wind.speed_kt), Some(10));
        // TEMPO conditions do not leak into the base period
        assert_eq!(taf.sky.visibility_m, Some(9999));
        assert_eq!(taf.sky.ceiling_ft(), Some(3500));
        assert!(taf.is_valid_at(at(3, 11, 0, 0)));
        assert!(!taf.is_valid_at(at(3, 11, 12, 0)));
    }

    #[test]
    fn test_validity_end_at_hour_24_across_month_end() {
        let raw = "TAF AMD EFTU 311720Z 3118/0124 19008KT CAVOK";
        let taf = Taf::parse(raw, at(3, 31, 17, 25)).unwrap();
        assert_eq!(taf.from, at(3, 31, 18, 0));
        assert_eq!(taf.to, at(4, 2, 0, 0));
        assert!(taf.sky.cavok);
    }

    #[test]
    fn test_missing_issue_time_uses_validity_start() {
        let taf = Taf::parse("TAF EFOU 1012/1018 BKN004", at(3, 10, 11, 0)).unwrap();
        assert_eq!(taf.issued, taf.from);
        assert_eq!(taf.sky.ceiling_ft(), Some(400));
    }

    #[test]
    fn test_nil_taf_is_an_error() {
        assert_eq!(
            Taf::parse("TAF EFHK 101130Z NIL=", at(3, 10, 11, 40)),
            Err(ParseError::MissingTimestamp {
                identifier: "EFHK".to_string(),
                field: "validity period",
            })
        );
    }
}
