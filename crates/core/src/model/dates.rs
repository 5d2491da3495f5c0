//! Parsing of v1 date and timestamp strings

use chrono::{DateTime, NaiveDate, NaiveDateTime, Utc};

const DATE_FORMATS: [&str; 5] = ["%Y-%m-%d", "%Y/%m/%d", "%d-%b-%Y", "%d/%b/%Y", "%d/%m/%Y"];

const DATETIME_FORMATS: [&str; 4] = [
    "%Y/%m/%d %H:%M:%S %z",
    "%Y-%m-%d %H:%M:%S %z",
    "%d-%b-%Y %H:%M:%S %z",
    "%d-%b-%Y %H:%M %z",
];

const NAIVE_DATETIME_FORMATS: [&str; 3] =
    ["%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%d %H:%M:%S", "%Y/%m/%d %H:%M:%S"];

/// Parse a calendar date in any of the layouts v1 stored
pub fn parse_date(value: &str) -> Option<NaiveDate> {
    let value = value.trim();
    if let Some(date) = DATE_FORMATS
        .iter()
        .find_map(|fmt| NaiveDate::parse_from_str(value, fmt).ok())
    {
        return Some(date);
    }
    // Some forms stored dates as full timestamps
    parse_datetime(value).map(|dt| dt.date_naive())
}

/// Parse a timestamp, normalized to UTC
pub fn parse_datetime(value: &str) -> Option<DateTime<Utc>> {
    let value = value.trim();
    if let Ok(dt) = DateTime::parse_from_rfc3339(value) {
        return Some(dt.with_timezone(&Utc));
    }
    if let Some(dt) = DATETIME_FORMATS
        .iter()
        .find_map(|fmt| DateTime::parse_from_str(value, fmt).ok())
    {
        return Some(dt.with_timezone(&Utc));
    }
    let value = value.trim_end_matches('Z');
    NAIVE_DATETIME_FORMATS
        .iter()
        .find_map(|fmt| NaiveDateTime::parse_from_str(value, fmt).ok())
        .map(|naive| naive.and_utc())
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn test_parse_date_layouts() {
        let expected = NaiveDate::from_ymd_opt(2019, 3, 14);
        assert_eq!(parse_date("2019-03-14"), expected);
        assert_eq!(parse_date("2019/03/14"), expected);
        assert_eq!(parse_date("14-Mar-2019"), expected);
        assert_eq!(parse_date("2019-03-14T08:00:00Z"), expected);
        assert_eq!(parse_date("yesterday"), None);
    }

    #[test]
    fn test_parse_datetime_layouts() {
        let expected = Utc.with_ymd_and_hms(2019, 3, 14, 8, 30, 0).single();
        assert_eq!(parse_datetime("2019-03-14T08:30:00Z"), expected);
        assert_eq!(parse_datetime("2019/03/14 08:30:00 +0000"), expected);
        assert_eq!(parse_datetime("2019-03-14T10:30:00+02:00"), expected);
        assert_eq!(parse_datetime("2019-03-14 08:30:00"), expected);
        assert_eq!(parse_datetime("14-Mar-2019"), None);
    }
}
