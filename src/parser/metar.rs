use crate::parser::error::ParseError;
use crate::parser::tokens::{day_time, resolve_day, split_identifier, ReportFields};
use crate::types::observation::Metar;
use chrono::{DateTime, Utc};

impl Metar {
    /// Parses a METAR or SPECI report.
    ///
    /// The `DDHHMMZ` observation time only carries the day of month; it is
    /// resolved to the date nearest `reference`, normally the time the report
    /// was fetched.
    ///
    /// # Errors
    ///
    /// Returns a [`ParseError`] when the report has no station identifier or
    /// no observation time. Any other unrecognized group is skipped.
    ///
    /// # Examples
    ///
    /// ```
    /// use aviwx::Metar;
    /// use chrono::{TimeZone, Utc};
    ///
    /// let reference = Utc.with_ymd_and_hms(2024, 3, 10, 10, 35, 0).unwrap();
    /// let metar = Metar::parse("METAR EFHK 101020Z 24005KT 9999 BKN012 M01/M03 Q1002", reference)?;
    ///
    /// assert_eq!(metar.identifier, "EFHK");
    /// assert_eq!(metar.ceiling_ft(), Some(1200));
    /// # Ok::<(), aviwx::ParseError>(())
    /// ```
    pub fn parse(raw: &str, reference: DateTime<Utc>) -> Result<Self, ParseError> {
        let (identifier, tokens) = split_identifier(raw)?;
        let missing_time = || ParseError::MissingTimestamp {
            identifier: identifier.to_string(),
            field: "observation time",
        };

        let time_token = *tokens.first().ok_or_else(missing_time)?;
        let (day, hour, minute) = day_time(time_token).ok_or_else(missing_time)?;
        let datetime = resolve_day(reference, day, hour, minute)
            .ok_or_else(|| ParseError::InvalidTimestamp(time_token.to_string()))?;

        let fields = ReportFields::decode(&tokens[1..]);
        Ok(Metar {
            identifier: identifier.to_string(),
            datetime,
            raw: raw.trim().to_string(),
            wind: fields.wind,
            sky: fields.sky,
            temperature: fields.temperature,
            dew_point: fields.dew_point,
            qnh_hpa: fields.qnh_hpa,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::observation::{CloudCover, WindDirection};
    use chrono::TimeZone;

    fn reference() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 3, 10, 10, 35, 0).unwrap()
    }

    #[test]
    fn test_parse_full_report() {
        let raw = "METAR EFHK 101020Z AUTO 24012G22KT 210V270 6000 -SN FEW006 BKN011 OVC025 M02/M03 Q0997 NOSIG=";
        let metar = Metar::parse(raw, reference()).unwrap();

        assert_eq!(metar.identifier, "EFHK");
        assert_eq!(
            metar.datetime,
            Utc.with_ymd_and_hms(2024, 3, 10, 10, 20, 0).unwrap()
        );
        let wind = metar.wind.unwrap();
        assert_eq!(wind.direction, WindDirection::Degrees(240));
        assert_eq!((wind.speed_kt, wind.gust_kt), (12, Some(22)));
        assert_eq!(metar.sky.visibility_m, Some(6000));
        assert_eq!(metar.sky.clouds[0].cover, CloudCover::Few);
        assert_eq!(metar.ceiling_ft(), Some(1100));
        assert_eq!(metar.temperature, Some(-2));
        assert_eq!(metar.dew_point, Some(-3));
        assert_eq!(metar.qnh_hpa, Some(997));
        assert!(metar.raw.starts_with("METAR EFHK"));
    }

    #[test]
    fn test_parse_us_report() {
        let raw = "KJFK 101051Z 31008KT 10SM FEW250 08/M06 A3012 RMK AO2 SLP199";
        let metar = Metar::parse(raw, reference()).unwrap();
        assert_eq!(metar.identifier, "KJFK");
        assert_eq!(metar.sky.visibility_m, Some(9999));
        assert!(metar.sky.no_ceiling());
        assert_eq!(metar.qnh_hpa, Some(1020));
    }

    #[test]
    fn test_parse_previous_month_report() {
        let reference = Utc.with_ymd_and_hms(2024, 4, 1, 0, 10, 0).unwrap();
        let metar = Metar::parse("EFHK 312350Z CAVOK 03/M01 Q1020", reference).unwrap();
        assert_eq!(
            metar.datetime,
            Utc.with_ymd_and_hms(2024, 3, 31, 23, 50, 0).unwrap()
        );
        assert!(metar.sky.cavok);
    }

    #[test]
    fn test_missing_time_is_an_error() {
        assert_eq!(
            Metar::parse("EFHK 24005KT 9999", reference()),
            Err(ParseError::MissingTimestamp {
                identifier: "EFHK".to_string(),
                field: "observation time",
            })
        );
        assert_eq!(
            Metar::parse("EFHK", reference()),
            Err(ParseError::MissingTimestamp {
                identifier: "EFHK".to_string(),
                field: "observation time",
            })
        );
        assert_eq!(
            Metar::parse("EFHK 102560Z", reference()),
            Err(ParseError::InvalidTimestamp("102560Z".to_string()))
        );
        assert_eq!(Metar::parse("", reference()), Err(ParseError::Empty));
    }
}
